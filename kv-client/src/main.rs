use clap::{value_parser, Arg, Command};
use kv_client::client::{self, Client};
use kv_common::config::{Settings, DEFAULT_CONFIG_PATH};
use kv_common::logger;
use log::{error, info};
use std::path::Path;
use std::process;

fn main() {
    // 解析命令行参数
    let matches = Command::new("KV Store Client")
        .version("1.1")
        .about("A simple key-value store client")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("配置文件路径")
                .num_args(1),
        )
        .arg(
            Arg::new("host")
                .short('H')
                .long("host")
                .value_name("HOST")
                .help("服务器主机地址")
                .num_args(1),
        )
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .value_name("PORT")
                .help("服务器端口")
                .value_parser(value_parser!(u16))
                .num_args(1),
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
    let log_file = settings.logging.log_file.replace("server", "client");
    if let Err(e) = logger::init_logger(&log_file, &settings.logging.level) {
        eprintln!("初始化日志失败: {}", e);
        process::exit(1);
    }

    info!("启动客户端模式");

    // 命令行参数优先于配置文件
    let host = matches
        .get_one::<String>("host")
        .cloned()
        .unwrap_or_else(|| settings.server.host.clone());
    let port = matches
        .get_one::<u16>("port")
        .copied()
        .unwrap_or(settings.server.port);

    run_client(host, port);
}

// 启动客户端
fn run_client(host: String, port: u16) {
    info!("客户端配置: 主机={}, 端口={}", host, port);
    let mut client = Client::new(host, port);

    if let Err(e) = client.connect() {
        error!("客户端连接失败: {}", e);
        eprintln!("Error connecting to server: {}", e);
        process::exit(1);
    }

    match client::run_stdio(&mut client) {
        Ok(()) => info!("客户端正常关闭"),
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    }
}
