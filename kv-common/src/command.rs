use crate::store::{StoreError, StoreManager};
use log::{debug, error};

/// 协议中使用的固定回复
pub mod reply {
    pub const OK: &str = "OK";
    pub const NULL: &str = "null";
    pub const PONG: &str = "pong";
    pub const KEY_NOT_FOUND: &str = "Key not found";
    pub const KEY_OR_FIELD_NOT_FOUND: &str = "Key or field not found";
    pub const INVALID_RANGE: &str = "Invalid range";
    pub const UNKNOWN_COMMAND: &str = "Unknown command";
}

/// 各命令参数个数不符时的用法提示
pub mod usage {
    pub const SET: &str = "Usage: set [key] [value]";
    pub const GET: &str = "Usage: get [key]";
    pub const DEL: &str = "Usage: del [key]";
    pub const LPUSH: &str = "Usage: lpush [key] [value]";
    pub const RPUSH: &str = "Usage: rpush [key] [value]";
    pub const RANGE: &str = "Usage: range [key] [start] [end]";
    pub const LEN: &str = "Usage: len [key]";
    pub const LPOP: &str = "Usage: lpop [key]";
    pub const RPOP: &str = "Usage: rpop [key]";
    pub const LDEL: &str = "Usage: ldel [key]";
    pub const HSET: &str = "Usage: hset [key] [field] [value]";
    pub const HGET: &str = "Usage: hget [key] [field]";
    pub const HDEL: &str = "Usage: hdel [key] [field] or hdel [key]";
}

const HELP_ALL: &str = "Available commands:
set [key] [value]
get [key]
del [key]
lpush [key] [value]
rpush [key] [value]
range [key] [start] [end]
len [key]
lpop [key]
rpop [key]
ldel [key]
ping
help
help [command]
hset [key] [field] [value]
hget [key] [field]
hdel [key] [field] or hdel [key]";

/// 把一行输入按单个空格切分
///
/// 去掉行尾的 `\r`/`\n` 和末尾的空 token；中间连续的空格会产生空 token。
/// 不支持引号和转义。
pub fn split_tokens(line: &str) -> Vec<&str> {
    let line = line.trim_end_matches(|c: char| c == '\n' || c == '\r');
    let mut tokens: Vec<&str> = line.split(' ').collect();
    while matches!(tokens.last(), Some(t) if t.is_empty()) {
        tokens.pop();
    }
    tokens
}

// 表示解析后的命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    // 字符串命令
    Set(String, String),
    Get(String),
    Del(String),

    // 列表命令
    LPush(String, String),
    RPush(String, String),
    Range(String, i64, i64),
    Len(String),
    LPop(String),
    RPop(String),
    LDel(String),

    // 哈希命令
    HSet(String, String, String),
    HGet(String, String),
    HDel(String, String),
    HDelKey(String),

    // 其他命令
    Ping,
    Help,
    HelpCommand(String),

    /// 参数个数不符，携带用法提示
    Usage(&'static str),
    /// 参数无法解析
    Malformed(String),
    Unknown,
}

impl Command {
    /// 解析一行命令；命令名区分大小写
    pub fn parse(input: &str) -> Command {
        let tokens = split_tokens(input);
        let Some((&name, args)) = tokens.split_first() else {
            return Command::Unknown;
        };
        // 空参数（连续空格）视为参数个数不符
        let filled = args.iter().all(|a| !a.is_empty());
        let s = |a: &&str| a.to_string();

        match (name, args) {
            ("set", [key, value]) if filled => Command::Set(s(key), s(value)),
            ("set", _) => Command::Usage(usage::SET),
            ("get", [key]) if filled => Command::Get(s(key)),
            ("get", _) => Command::Usage(usage::GET),
            ("del", [key]) if filled => Command::Del(s(key)),
            ("del", _) => Command::Usage(usage::DEL),

            ("lpush", [key, value]) if filled => Command::LPush(s(key), s(value)),
            ("lpush", _) => Command::Usage(usage::LPUSH),
            ("rpush", [key, value]) if filled => Command::RPush(s(key), s(value)),
            ("rpush", _) => Command::Usage(usage::RPUSH),
            ("range", [key, start, end]) if filled => {
                match (start.parse::<i64>(), end.parse::<i64>()) {
                    (Ok(start), Ok(end)) => Command::Range(s(key), start, end),
                    _ => Command::Malformed("start and end must be integers".to_string()),
                }
            }
            ("range", _) => Command::Usage(usage::RANGE),
            ("len", [key]) if filled => Command::Len(s(key)),
            ("len", _) => Command::Usage(usage::LEN),
            ("lpop", [key]) if filled => Command::LPop(s(key)),
            ("lpop", _) => Command::Usage(usage::LPOP),
            ("rpop", [key]) if filled => Command::RPop(s(key)),
            ("rpop", _) => Command::Usage(usage::RPOP),
            ("ldel", [key]) if filled => Command::LDel(s(key)),
            ("ldel", _) => Command::Usage(usage::LDEL),

            ("hset", [key, field, value]) if filled => Command::HSet(s(key), s(field), s(value)),
            ("hset", _) => Command::Usage(usage::HSET),
            ("hget", [key, field]) if filled => Command::HGet(s(key), s(field)),
            ("hget", _) => Command::Usage(usage::HGET),
            ("hdel", [key]) if filled => Command::HDelKey(s(key)),
            ("hdel", [key, field]) if filled => Command::HDel(s(key), s(field)),
            ("hdel", _) => Command::Usage(usage::HDEL),

            ("ping", _) => Command::Ping,
            ("help", []) => Command::Help,
            ("help", [command, ..]) => Command::HelpCommand(s(command)),
            _ => Command::Unknown,
        }
    }
}

// 命令处理器
#[derive(Clone)]
pub struct CommandHandler {
    store_manager: StoreManager,
}

impl CommandHandler {
    pub fn new(store_manager: StoreManager) -> Self {
        CommandHandler { store_manager }
    }

    // 解析命令字符串
    pub fn parse_command(&self, input: &str) -> Command {
        Command::parse(input)
    }

    /// 解析并执行一行命令，返回回复文本（不含结束空行）
    pub fn execute(&self, line: &str) -> String {
        let command = self.parse_command(line);
        debug!("执行命令: {:?}", command);
        self.execute_command(command)
    }

    // 执行命令
    pub fn execute_command(&self, command: Command) -> String {
        let store = self.store_manager.get_store();

        match command {
            // 字符串命令
            Command::Set(key, value) => match store.set_string(key, value) {
                Ok(()) => reply::OK.to_string(),
                Err(e) => fault(e),
            },
            Command::Get(key) => store.get_string(&key).unwrap_or_else(null),
            Command::Del(key) => deleted(store.del_string(&key), reply::KEY_NOT_FOUND),

            // 列表命令
            Command::LPush(key, value) => match store.lpush(key, value) {
                Ok(_) => reply::OK.to_string(),
                Err(e) => fault(e),
            },
            Command::RPush(key, value) => match store.rpush(key, value) {
                Ok(_) => reply::OK.to_string(),
                Err(e) => fault(e),
            },
            Command::Range(key, start, end) => match store.range(&key, start, end) {
                Ok(values) => values.join(" "),
                Err(StoreError::KeyNotFound(_)) => reply::KEY_NOT_FOUND.to_string(),
                Err(StoreError::InvalidRange { .. }) => reply::INVALID_RANGE.to_string(),
                Err(e) => fault(e),
            },
            Command::Len(key) => store.llen(&key).to_string(),
            Command::LPop(key) => popped(store.lpop(&key)),
            Command::RPop(key) => popped(store.rpop(&key)),
            Command::LDel(key) => deleted(store.ldel(&key), reply::KEY_NOT_FOUND),

            // 哈希命令
            Command::HSet(key, field, value) => match store.hset(key, field, value) {
                Ok(_) => reply::OK.to_string(),
                Err(e) => fault(e),
            },
            Command::HGet(key, field) => store.hget(&key, &field).unwrap_or_else(null),
            Command::HDel(key, field) => {
                deleted(store.hdel_field(&key, &field), reply::KEY_OR_FIELD_NOT_FOUND)
            }
            Command::HDelKey(key) => deleted(store.hdel_key(&key), reply::KEY_NOT_FOUND),

            // 其他命令
            Command::Ping => reply::PONG.to_string(),
            Command::Help => HELP_ALL.to_string(),
            Command::HelpCommand(cmd) => command_help(&cmd),
            Command::Usage(text) => text.to_string(),
            Command::Malformed(msg) => format!("Error: {}", msg),
            Command::Unknown => reply::UNKNOWN_COMMAND.to_string(),
        }
    }
}

fn null() -> String {
    reply::NULL.to_string()
}

fn fault(e: StoreError) -> String {
    error!("命令执行失败: {}", e);
    format!("Error: {}", e)
}

fn deleted(result: Result<bool, StoreError>, missing: &str) -> String {
    match result {
        Ok(true) => reply::OK.to_string(),
        Ok(false) => missing.to_string(),
        Err(e) => fault(e),
    }
}

fn popped(result: Result<Option<String>, StoreError>) -> String {
    match result {
        Ok(Some(value)) => value,
        Ok(None) => null(),
        Err(e) => fault(e),
    }
}

// 获取特定命令的帮助信息
fn command_help(command: &str) -> String {
    let text = match command {
        "set" => "Usage: set [key] [value] - Store a key - value pair",
        "get" => "Usage: get [key] - Retrieve the value associated with a key",
        "del" => "Usage: del [key] - Delete a key - value pair",
        "lpush" => "Usage: lpush [key] [value] - Push a value to the left of a list",
        "rpush" => "Usage: rpush [key] [value] - Push a value to the right of a list",
        "range" => "Usage: range [key] [start] [end] - Get a range of values from a list",
        "len" => "Usage: len [key] - Get the length of a list",
        "lpop" => "Usage: lpop [key] - Pop a value from the left of a list",
        "rpop" => "Usage: rpop [key] - Pop a value from the right of a list",
        "ldel" => "Usage: ldel [key] - Delete a list",
        "ping" => "Usage: ping - Send a heartbeat request",
        "help" => "Usage: help or help [command] - Get help information",
        "hset" => "Usage: hset [key] [field] [value] - Store a field - value pair in a hash",
        "hget" => "Usage: hget [key] [field] - Retrieve the value of a field in a hash",
        "hdel" => {
            "Usage: hdel [key] [field] or hdel [key] - Delete a field - value pair or a whole hash"
        }
        _ => return format!("Unknown command: {}", command),
    };
    text.to_string()
}
