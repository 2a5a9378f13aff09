// 环境变量是进程级的，单独放在一个测试二进制里
use kv_common::config::Settings;
use std::env;
use tempfile::tempdir;

#[test]
fn test_environment_overrides_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("default.toml");

    env::set_var("KV__SERVER__PORT", "7100");
    env::set_var("KV__PERSISTENCE__DATA_FILE", "elsewhere.log");
    let config = Settings::load_or_create(&path);
    env::remove_var("KV__SERVER__PORT");
    env::remove_var("KV__PERSISTENCE__DATA_FILE");

    let config = config.unwrap();
    assert_eq!(config.server.port, 7100);
    assert_eq!(config.persistence.data_file, "elsewhere.log");
    assert_eq!(config.server.host, "127.0.0.1");
}
