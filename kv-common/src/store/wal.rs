use std::error::Error;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::{debug, error, info, warn};

use crate::command::split_tokens;
use super::guard::lock_guard;
use super::store_core::Store;
use super::traits::Journal;

/// 持久化日志操作可能的错误
#[derive(Debug)]
pub enum WalError {
    IoError(io::Error),
    /// 回放时某条记录无法应用到存储
    Replay { line: usize, reason: String },
}

impl fmt::Display for WalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WalError::IoError(e) => write!(f, "I/O error: {}", e),
            WalError::Replay { line, reason } => {
                write!(f, "replay failed at line {}: {}", line, reason)
            }
        }
    }
}

impl Error for WalError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            WalError::IoError(e) => Some(e),
            WalError::Replay { .. } => None,
        }
    }
}

impl From<io::Error> for WalError {
    fn from(error: io::Error) -> Self {
        WalError::IoError(error)
    }
}

pub type WalResult<T> = std::result::Result<T, WalError>;

/// 一条已被接受的变更，对应日志文件中的一行
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEntry {
    Set { key: String, value: String },
    Del { key: String },
    LPush { key: String, value: String },
    RPush { key: String, value: String },
    LPop { key: String },
    RPop { key: String },
    LDel { key: String },
    HSet { key: String, field: String, value: String },
    HDelField { key: String, field: String },
    HDelKey { key: String },
}

impl LogEntry {
    pub fn verb(&self) -> &'static str {
        match self {
            LogEntry::Set { .. } => "set",
            LogEntry::Del { .. } => "del",
            LogEntry::LPush { .. } => "lpush",
            LogEntry::RPush { .. } => "rpush",
            LogEntry::LPop { .. } => "lpop",
            LogEntry::RPop { .. } => "rpop",
            LogEntry::LDel { .. } => "ldel",
            LogEntry::HSet { .. } => "hset",
            LogEntry::HDelField { .. } | LogEntry::HDelKey { .. } => "hdel",
        }
    }

    /// 序列化为 `<verb> <key> [<args>...]`，不含换行
    pub fn serialize(&self) -> String {
        let verb = self.verb();
        match self {
            LogEntry::Set { key, value }
            | LogEntry::LPush { key, value }
            | LogEntry::RPush { key, value } => format!("{} {} {}", verb, key, value),
            LogEntry::HSet { key, field, value } => format!("{} {} {} {}", verb, key, field, value),
            LogEntry::HDelField { key, field } => format!("{} {} {}", verb, key, field),
            LogEntry::Del { key }
            | LogEntry::LPop { key }
            | LogEntry::RPop { key }
            | LogEntry::LDel { key }
            | LogEntry::HDelKey { key } => format!("{} {}", verb, key),
        }
    }

    /// 从一行日志解析记录，分词规则与协议输入相同
    pub fn deserialize(line: &str) -> Option<LogEntry> {
        let tokens = split_tokens(line);
        if tokens.iter().any(|t| t.is_empty()) {
            return None;
        }
        let owned = |s: &&str| s.to_string();

        let entry = match tokens.as_slice() {
            ["set", key, value] => LogEntry::Set { key: owned(key), value: owned(value) },
            ["del", key] => LogEntry::Del { key: owned(key) },
            ["lpush", key, value] => LogEntry::LPush { key: owned(key), value: owned(value) },
            ["rpush", key, value] => LogEntry::RPush { key: owned(key), value: owned(value) },
            ["lpop", key] => LogEntry::LPop { key: owned(key) },
            ["rpop", key] => LogEntry::RPop { key: owned(key) },
            ["ldel", key] => LogEntry::LDel { key: owned(key) },
            ["hset", key, field, value] => LogEntry::HSet {
                key: owned(key),
                field: owned(field),
                value: owned(value),
            },
            ["hdel", key, field] => LogEntry::HDelField { key: owned(key), field: owned(field) },
            ["hdel", key] => LogEntry::HDelKey { key: owned(key) },
            _ => return None,
        };
        Some(entry)
    }
}

/// 一次回放的统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    /// 成功应用的记录数
    pub applied: usize,
    /// 因无法解析而跳过的行数
    pub skipped: usize,
}

/// 仅追加的持久化日志
///
/// 所有追加经过同一把写锁，跨连接的记录因此是全序的。
#[derive(Debug)]
pub struct WriteAheadLog {
    log_file: PathBuf,
    file: Mutex<File>,
    sync_on_append: bool,
}

impl WriteAheadLog {
    /// 打开（必要时创建）日志文件
    ///
    /// 如果文件末尾是一条没有换行的残缺记录（追加过程中崩溃，客户端从未收到确认），
    /// 先把它截掉，保证之后的追加从新的一行开始。
    pub fn new(log_file: &Path) -> WalResult<Self> {
        if let Some(parent) = log_file.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        if log_file.exists() {
            if let Some(dropped) = truncate_incomplete_tail(log_file)? {
                warn!(
                    "日志 {} 末尾存在不完整的记录，已截断 {} 字节",
                    log_file.display(),
                    dropped
                );
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_file)?;

        debug!("打开持久化日志: {}", log_file.display());

        Ok(WriteAheadLog {
            log_file: log_file.to_path_buf(),
            file: Mutex::new(file),
            sync_on_append: true,
        })
    }

    /// 设置每次追加后是否 fsync
    pub fn with_sync(mut self, sync_on_append: bool) -> Self {
        self.sync_on_append = sync_on_append;
        self
    }

    /// 追加一条记录并刷新到文件
    ///
    /// 写入失败时文件被截回追加之前的长度，被拒绝的记录不会留在日志里。
    pub fn append_entry(&self, entry: &LogEntry) -> WalResult<()> {
        let line = entry.serialize();
        let mut file = lock_guard(&self.file);
        append_line(&mut *file, &line, self.sync_on_append)?;
        Ok(())
    }

    /// 按文件顺序把日志重新执行到 `store` 上
    ///
    /// `store` 应当是空的；回放走 `Store::apply`，不会再次写日志。
    /// 无法解析的行记录警告后跳过。
    pub fn replay(&self, store: &Store) -> WalResult<ReplayStats> {
        let mut stats = ReplayStats::default();
        scan(&self.log_file, |line_no, entry| {
            match entry {
                Some(entry) => {
                    store.apply(entry).map_err(|e| WalError::Replay {
                        line: line_no,
                        reason: e.to_string(),
                    })?;
                    stats.applied += 1;
                }
                None => {
                    warn!("日志第 {} 行无法解析，已跳过", line_no);
                    stats.skipped += 1;
                }
            }
            Ok(())
        })?;

        info!(
            "从 {} 回放完成: 应用 {} 条, 跳过 {} 条",
            self.log_file.display(),
            stats.applied,
            stats.skipped
        );
        Ok(stats)
    }

    /// 获取日志文件大小
    pub fn file_size(&self) -> WalResult<u64> {
        Ok(fs::metadata(&self.log_file)?.len())
    }
}

impl Journal for WriteAheadLog {
    fn append(&self, entry: &LogEntry) -> WalResult<()> {
        self.append_entry(entry)
    }
}

/// 日志文件需要的写操作
trait LogFile: Write {
    fn size(&self) -> io::Result<u64>;
    fn truncate(&self, len: u64) -> io::Result<()>;
    fn sync(&self) -> io::Result<()>;
}

impl LogFile for File {
    fn size(&self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn truncate(&self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }

    fn sync(&self) -> io::Result<()> {
        self.sync_data()
    }
}

/// 追加一行；任何一步失败都把文件截回原来的长度再返回错误
fn append_line<F: LogFile>(file: &mut F, line: &str, sync: bool) -> io::Result<()> {
    let prev_len = file.size()?;
    if let Err(e) = write_record(file, line, sync) {
        if let Err(rollback) = file.truncate(prev_len) {
            error!("日志回滚到 {} 字节失败: {}", prev_len, rollback);
        }
        return Err(e);
    }
    Ok(())
}

fn write_record<F: LogFile>(file: &mut F, line: &str, sync: bool) -> io::Result<()> {
    let mut record = String::with_capacity(line.len() + 1);
    record.push_str(line);
    record.push('\n');
    file.write_all(record.as_bytes())?;
    file.flush()?;
    if sync {
        file.sync()?;
    }
    Ok(())
}

/// 逐行读取日志，跳过空行；文件不存在视为空日志
fn scan<F>(path: &Path, mut visit: F) -> WalResult<()>
where
    F: FnMut(usize, Option<LogEntry>) -> WalResult<()>,
{
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
    };

    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();
    let mut line_no = 0;
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        line_no += 1;
        let line = String::from_utf8_lossy(&buf);
        let line = line.trim_end_matches(|c: char| c == '\n' || c == '\r');
        if line.is_empty() {
            continue;
        }
        visit(line_no, LogEntry::deserialize(line))?;
    }
    Ok(())
}

/// 截掉最后一个换行之后的内容，返回截掉的字节数
fn truncate_incomplete_tail(path: &Path) -> WalResult<Option<u64>> {
    let bytes = fs::read(path)?;
    if bytes.is_empty() || bytes.ends_with(b"\n") {
        return Ok(None);
    }
    let keep = bytes
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(0, |i| i + 1);
    let file = OpenOptions::new().write(true).open(path)?;
    file.set_len(keep as u64)?;
    file.sync_all()?;
    Ok(Some((bytes.len() - keep) as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::tempdir;

    #[test]
    fn test_log_entry_serialization() {
        let entry = LogEntry::HSet {
            key: "user".to_string(),
            field: "name".to_string(),
            value: "alice".to_string(),
        };

        let serialized = entry.serialize();
        assert_eq!(serialized, "hset user name alice");
        assert_eq!(LogEntry::deserialize(&serialized), Some(entry));

        assert_eq!(
            LogEntry::deserialize("hdel user"),
            Some(LogEntry::HDelKey { key: "user".to_string() })
        );
        assert_eq!(
            LogEntry::deserialize("hdel user name"),
            Some(LogEntry::HDelField {
                key: "user".to_string(),
                field: "name".to_string()
            })
        );
    }

    #[test]
    fn test_deserialize_rejects_non_mutations() {
        assert_eq!(LogEntry::deserialize("get a"), None);
        assert_eq!(LogEntry::deserialize("set a"), None);
        assert_eq!(LogEntry::deserialize("set  a"), None);
        assert_eq!(LogEntry::deserialize("ping"), None);
        assert_eq!(LogEntry::deserialize(""), None);
    }

    #[test]
    fn test_wal_append_and_load() -> WalResult<()> {
        let dir = tempdir().unwrap();
        let wal_path = dir.path().join("test.log");

        let wal = WriteAheadLog::new(&wal_path)?.with_sync(false);
        wal.append_entry(&LogEntry::Set {
            key: "key1".to_string(),
            value: "value1".to_string(),
        })?;
        wal.append_entry(&LogEntry::Del { key: "key2".to_string() })?;

        let content = fs::read_to_string(&wal_path)?;
        assert_eq!(content, "set key1 value1\ndel key2\n");

        let store = Store::new();
        let stats = wal.replay(&store)?;
        assert_eq!(stats, ReplayStats { applied: 2, skipped: 0 });
        assert_eq!(store.get_string("key1"), Some("value1".to_string()));

        Ok(())
    }

    #[test]
    fn test_incomplete_tail_is_truncated() -> WalResult<()> {
        let dir = tempdir().unwrap();
        let wal_path = dir.path().join("torn.log");
        fs::write(&wal_path, "set a 1\nset a 12")?;

        let wal = WriteAheadLog::new(&wal_path)?.with_sync(false);
        assert_eq!(fs::read_to_string(&wal_path)?, "set a 1\n");

        wal.append_entry(&LogEntry::Set {
            key: "b".to_string(),
            value: "2".to_string(),
        })?;
        assert_eq!(fs::read_to_string(&wal_path)?, "set a 1\nset b 2\n");

        Ok(())
    }

    #[test]
    fn test_replay_skips_malformed_lines() -> WalResult<()> {
        let dir = tempdir().unwrap();
        let wal_path = dir.path().join("mixed.log");
        fs::write(&wal_path, "set a 1\ngarbage line here\n\nrpush l x\nset b\n")?;

        let wal = WriteAheadLog::new(&wal_path)?;
        let store = Store::new();
        let stats = wal.replay(&store)?;

        assert_eq!(stats, ReplayStats { applied: 2, skipped: 2 });
        assert_eq!(store.get_string("a"), Some("1".to_string()));
        assert_eq!(store.llen("l"), 1);

        Ok(())
    }

    // 最多写入 `budget` 字节，之后的写入全部失败
    struct ShortFile {
        file: File,
        budget: usize,
    }

    impl Write for ShortFile {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.budget == 0 {
                return Err(io::Error::new(io::ErrorKind::Other, "no space left"));
            }
            let n = buf.len().min(self.budget);
            self.budget -= n;
            self.file.write(&buf[..n])
        }

        fn flush(&mut self) -> io::Result<()> {
            self.file.flush()
        }
    }

    impl LogFile for ShortFile {
        fn size(&self) -> io::Result<u64> {
            self.file.size()
        }

        fn truncate(&self, len: u64) -> io::Result<()> {
            self.file.truncate(len)
        }

        fn sync(&self) -> io::Result<()> {
            self.file.sync()
        }
    }

    #[test]
    fn test_failed_append_is_rolled_back() -> WalResult<()> {
        let dir = tempdir().unwrap();
        let wal_path = dir.path().join("rollback.log");

        let wal = WriteAheadLog::new(&wal_path)?.with_sync(false);
        wal.append_entry(&LogEntry::Set {
            key: "a".to_string(),
            value: "1".to_string(),
        })?;

        // 只写进去半条记录就失败
        let file = OpenOptions::new().append(true).open(&wal_path)?;
        let mut short = ShortFile { file, budget: 6 };
        assert!(append_line(&mut short, "set a REJECTED", false).is_err());
        assert_eq!(fs::read_to_string(&wal_path)?, "set a 1\n");

        wal.append_entry(&LogEntry::Set {
            key: "b".to_string(),
            value: "2".to_string(),
        })?;
        assert_eq!(fs::read_to_string(&wal_path)?, "set a 1\nset b 2\n");

        let store = Store::new();
        let stats = WriteAheadLog::new(&wal_path)?.replay(&store)?;
        assert_eq!(stats, ReplayStats { applied: 2, skipped: 0 });
        assert_eq!(store.get_string("a"), Some("1".to_string()));
        assert_eq!(store.get_string("b"), Some("2".to_string()));

        Ok(())
    }

    #[test]
    fn test_missing_parent_directory_is_created() -> WalResult<()> {
        let dir = tempdir().unwrap();
        let wal_path = dir.path().join("nested").join("data").join("aof.log");

        let wal = WriteAheadLog::new(&wal_path)?;
        assert!(wal_path.exists());
        assert_eq!(wal.file_size()?, 0);

        Ok(())
    }
}
