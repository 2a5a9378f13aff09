use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, RwLock};

use super::error::StoreResult;
use super::guard::{lock_guard, read_guard, record, write_guard};
use super::traits::Journal;
use super::wal::LogEntry;

type SharedHash = Arc<Mutex<HashMap<String, String>>>;

/// 哈希命名空间，加锁方式与列表相同
#[derive(Debug, Default)]
pub struct HashSpace {
    hashes: RwLock<HashMap<String, SharedHash>>,
}

impl HashSpace {
    /// 设置字段，返回字段是否是新增的
    pub fn set(
        &self,
        key: String,
        field: String,
        value: String,
        journal: Option<&dyn Journal>,
    ) -> StoreResult<bool> {
        let entry = |key: &str, field: &str, value: &str| LogEntry::HSet {
            key: key.to_string(),
            field: field.to_string(),
            value: value.to_string(),
        };

        {
            let hashes = read_guard(&self.hashes);
            if let Some(hash) = hashes.get(&key) {
                let mut hash = lock_guard(hash);
                record(journal, || entry(&key, &field, &value))?;
                return Ok(hash.insert(field, value).is_none());
            }
        }

        let mut hashes = write_guard(&self.hashes);
        if let Some(hash) = hashes.get(&key) {
            let mut hash = lock_guard(hash);
            record(journal, || entry(&key, &field, &value))?;
            return Ok(hash.insert(field, value).is_none());
        }
        record(journal, || entry(&key, &field, &value))?;
        let mut hash = HashMap::new();
        hash.insert(field, value);
        hashes.insert(key, Arc::new(Mutex::new(hash)));
        Ok(true)
    }

    pub fn get(&self, key: &str, field: &str) -> Option<String> {
        read_guard(&self.hashes)
            .get(key)
            .and_then(|hash| lock_guard(hash).get(field).cloned())
    }

    /// 删除单个字段；键或字段不存在时返回 false
    pub fn delete_field(
        &self,
        key: &str,
        field: &str,
        journal: Option<&dyn Journal>,
    ) -> StoreResult<bool> {
        let hashes = read_guard(&self.hashes);
        let Some(hash) = hashes.get(key) else {
            return Ok(false);
        };
        let mut hash = lock_guard(hash);
        if !hash.contains_key(field) {
            return Ok(false);
        }
        record(journal, || LogEntry::HDelField {
            key: key.to_string(),
            field: field.to_string(),
        })?;
        hash.remove(field);
        Ok(true)
    }

    /// 删除整个哈希，返回键是否存在
    pub fn delete(&self, key: &str, journal: Option<&dyn Journal>) -> StoreResult<bool> {
        let mut hashes = write_guard(&self.hashes);
        if !hashes.contains_key(key) {
            return Ok(false);
        }
        record(journal, || LogEntry::HDelKey { key: key.to_string() })?;
        hashes.remove(key);
        Ok(true)
    }

    pub(crate) fn snapshot(&self) -> BTreeMap<String, BTreeMap<String, String>> {
        read_guard(&self.hashes)
            .iter()
            .map(|(k, hash)| {
                let fields = lock_guard(hash)
                    .iter()
                    .map(|(f, v)| (f.clone(), v.clone()))
                    .collect();
                (k.clone(), fields)
            })
            .collect()
    }
}
