use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// 默认配置文件位置
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

const DEFAULT_CONFIG: &str = r#"[server]
# 服务器IP地址
host = "127.0.0.1"
# 服务器监听端口
port = 6379

[persistence]
# 持久化日志路径，每条被接受的修改追加一行，启动时回放
data_file = "data/appendonly.log"
# 每次追加后是否 fsync
sync_on_append = true

[logging]
# 诊断日志文件路径
log_file = "logs/server.log"
# 日志级别: "error", "warn", "info", "debug", "trace"
level = "info"
"#;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PersistenceConfig {
    pub data_file: String,
    #[serde(default = "default_sync_on_append")]
    pub sync_on_append: bool,
}

fn default_sync_on_append() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub log_file: String,
    pub level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerConfig,
    pub persistence: PersistenceConfig,
    pub logging: LoggingConfig,
}

impl Settings {
    /// 加载指定的配置文件，文件不存在时先写入默认配置
    pub fn load_or_create(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent).map_err(|e| {
                        ConfigError::Message(format!("无法创建配置目录: {}", e))
                    })?;
                }
            }
            fs::write(path, DEFAULT_CONFIG)
                .map_err(|e| ConfigError::Message(format!("无法写入配置文件: {}", e)))?;
        }
        Self::from_path(path)
    }

    /// 加载指定的配置文件，`KV__<SECTION>__<FIELD>` 环境变量覆盖文件中的值
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path))
            .add_source(Environment::with_prefix("KV").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}
