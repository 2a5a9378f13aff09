use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use super::error::StoreResult;
use super::guard::{read_guard, record, write_guard};
use super::traits::Journal;
use super::wal::LogEntry;

/// 字符串命名空间
///
/// 整个 map 由一把读写锁保护，写操作在写锁内完成"写日志 + 修改"。
#[derive(Debug, Default)]
pub struct StringSpace {
    entries: RwLock<HashMap<String, String>>,
}

impl StringSpace {
    pub fn set(&self, key: String, value: String, journal: Option<&dyn Journal>) -> StoreResult<()> {
        let mut entries = write_guard(&self.entries);
        record(journal, || LogEntry::Set {
            key: key.clone(),
            value: value.clone(),
        })?;
        entries.insert(key, value);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<String> {
        read_guard(&self.entries).get(key).cloned()
    }

    /// 删除键，返回键是否存在
    pub fn delete(&self, key: &str, journal: Option<&dyn Journal>) -> StoreResult<bool> {
        let mut entries = write_guard(&self.entries);
        if !entries.contains_key(key) {
            return Ok(false);
        }
        record(journal, || LogEntry::Del { key: key.to_string() })?;
        entries.remove(key);
        Ok(true)
    }

    pub(crate) fn snapshot(&self) -> BTreeMap<String, String> {
        read_guard(&self.entries)
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}
