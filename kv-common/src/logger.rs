use log::LevelFilter;
use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode, WriteLogger};
use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;

/// 把配置中的级别名转换为过滤级别，无法识别时使用 info
pub fn parse_level(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

/// 同时初始化终端日志和文件日志
pub fn init_logger(log_file: &str, level: &str) -> io::Result<()> {
    // 确保日志目录存在
    if let Some(parent) = Path::new(log_file).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    let file = OpenOptions::new().create(true).append(true).open(log_file)?;
    let level_filter = parse_level(level);

    CombinedLogger::init(vec![
        // 输出到终端的日志
        TermLogger::new(
            level_filter,
            Config::default(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ),
        // 输出到文件的日志
        WriteLogger::new(level_filter, Config::default(), file),
    ])
    .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))
}
