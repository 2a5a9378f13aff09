use std::collections::BTreeMap;
use std::sync::Arc;

use super::error::StoreResult;
use super::hash_ops::HashSpace;
use super::list_ops::{ListEnd, ListSpace};
use super::string_ops::StringSpace;
use super::traits::Journal;
use super::wal::LogEntry;

/// 核心存储：三个互相独立的命名空间
///
/// 同名的字符串键、列表键、哈希键互不相干。挂上日志之后，每个修改操作先追加日志，
/// 追加成功才修改内存；追加失败时返回错误且内存不变。
#[derive(Default)]
pub struct Store {
    strings: StringSpace,
    lists: ListSpace,
    hashes: HashSpace,
    journal: Option<Arc<dyn Journal>>,
}

/// 三个命名空间的有序副本
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreSnapshot {
    pub strings: BTreeMap<String, String>,
    pub lists: BTreeMap<String, Vec<String>>,
    pub hashes: BTreeMap<String, BTreeMap<String, String>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// 挂上变更日志，之后的所有修改都会先写日志
    pub fn with_journal(mut self, journal: Arc<dyn Journal>) -> Self {
        self.journal = Some(journal);
        self
    }

    fn journal(&self) -> Option<&dyn Journal> {
        self.journal.as_deref()
    }

    // 字符串

    pub fn set_string(&self, key: String, value: String) -> StoreResult<()> {
        self.strings.set(key, value, self.journal())
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.strings.get(key)
    }

    pub fn del_string(&self, key: &str) -> StoreResult<bool> {
        self.strings.delete(key, self.journal())
    }

    // 列表

    pub fn lpush(&self, key: String, value: String) -> StoreResult<usize> {
        self.lists.push(key, value, ListEnd::Front, self.journal())
    }

    pub fn rpush(&self, key: String, value: String) -> StoreResult<usize> {
        self.lists.push(key, value, ListEnd::Back, self.journal())
    }

    pub fn range(&self, key: &str, start: i64, end: i64) -> StoreResult<Vec<String>> {
        self.lists.range(key, start, end)
    }

    pub fn llen(&self, key: &str) -> usize {
        self.lists.len(key)
    }

    pub fn lpop(&self, key: &str) -> StoreResult<Option<String>> {
        self.lists.pop(key, ListEnd::Front, self.journal())
    }

    pub fn rpop(&self, key: &str) -> StoreResult<Option<String>> {
        self.lists.pop(key, ListEnd::Back, self.journal())
    }

    pub fn ldel(&self, key: &str) -> StoreResult<bool> {
        self.lists.delete(key, self.journal())
    }

    // 哈希

    pub fn hset(&self, key: String, field: String, value: String) -> StoreResult<bool> {
        self.hashes.set(key, field, value, self.journal())
    }

    pub fn hget(&self, key: &str, field: &str) -> Option<String> {
        self.hashes.get(key, field)
    }

    pub fn hdel_field(&self, key: &str, field: &str) -> StoreResult<bool> {
        self.hashes.delete_field(key, field, self.journal())
    }

    pub fn hdel_key(&self, key: &str) -> StoreResult<bool> {
        self.hashes.delete(key, self.journal())
    }

    /// 以与在线命令相同的语义执行一条日志记录，但不写日志
    pub fn apply(&self, entry: LogEntry) -> StoreResult<()> {
        match entry {
            LogEntry::Set { key, value } => self.strings.set(key, value, None),
            LogEntry::Del { key } => self.strings.delete(&key, None).map(drop),
            LogEntry::LPush { key, value } => {
                self.lists.push(key, value, ListEnd::Front, None).map(drop)
            }
            LogEntry::RPush { key, value } => {
                self.lists.push(key, value, ListEnd::Back, None).map(drop)
            }
            LogEntry::LPop { key } => self.lists.pop(&key, ListEnd::Front, None).map(drop),
            LogEntry::RPop { key } => self.lists.pop(&key, ListEnd::Back, None).map(drop),
            LogEntry::LDel { key } => self.lists.delete(&key, None).map(drop),
            LogEntry::HSet { key, field, value } => {
                self.hashes.set(key, field, value, None).map(drop)
            }
            LogEntry::HDelField { key, field } => {
                self.hashes.delete_field(&key, &field, None).map(drop)
            }
            LogEntry::HDelKey { key } => self.hashes.delete(&key, None).map(drop),
        }
    }

    /// 复制全部数据；各命名空间分别加锁，彼此之间不是同一时刻的快照
    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            strings: self.strings.snapshot(),
            lists: self.lists.snapshot(),
            hashes: self.hashes.snapshot(),
        }
    }

    /// 三个命名空间中的键总数
    pub fn key_count(&self) -> usize {
        let snapshot = self.snapshot();
        snapshot.strings.len() + snapshot.lists.len() + snapshot.hashes.len()
    }
}
