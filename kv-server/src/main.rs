use clap::{value_parser, Arg, Command};
use kv_common::config::{Settings, DEFAULT_CONFIG_PATH};
use kv_common::logger;
use kv_server::Server;
use log::{error, info};
use std::path::Path;
use std::process;

fn main() {
    // 解析命令行参数
    let matches = Command::new("KV Store Server")
        .version("1.1")
        .about("A networked key-value store with string, list and hash types")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("配置文件路径")
                .default_value(DEFAULT_CONFIG_PATH),
        )
        .arg(
            Arg::new("host")
                .short('H')
                .long("host")
                .value_name("HOST")
                .help("服务器主机地址"),
        )
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .value_name("PORT")
                .help("服务器端口")
                .value_parser(value_parser!(u16)),
        )
        .get_matches();

    // 加载配置
    let config_path = matches
        .get_one::<String>("config")
        .map(String::as_str)
        .unwrap_or(DEFAULT_CONFIG_PATH);
    let settings = match Settings::load_or_create(Path::new(config_path)) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("加载配置失败: {}", e);
            process::exit(1);
        }
    };

    // 初始化日志
    if let Err(e) = logger::init_logger(&settings.logging.log_file, &settings.logging.level) {
        eprintln!("初始化日志失败: {}", e);
        process::exit(1);
    }

    info!("启动服务器模式");

    // 命令行参数优先于配置文件
    let host = matches
        .get_one::<String>("host")
        .unwrap_or(&settings.server.host);

    let port = matches
        .get_one::<u16>("port")
        .unwrap_or(&settings.server.port);

    run_server(host, *port, &settings);
}

// 启动服务器
fn run_server(host: &str, port: u16, settings: &Settings) {
    let data_file = &settings.persistence.data_file;
    let mut server = Server::new(host.to_string(), port, data_file.clone())
        .with_sync(settings.persistence.sync_on_append);

    info!(
        "服务器配置: 主机={}, 端口={}, 持久化日志={}",
        host, port, data_file
    );

    match server.start() {
        Ok(_) => info!("服务器正常关闭"),
        Err(e) => {
            error!("服务器启动失败: {}", e);
            process::exit(1);
        }
    }
}
