use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex, RwLock};

use super::error::{StoreError, StoreResult};
use super::guard::{lock_guard, read_guard, record, write_guard};
use super::traits::Journal;
use super::wal::LogEntry;

type SharedList = Arc<Mutex<VecDeque<String>>>;

/// 列表的哪一端
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListEnd {
    Front,
    Back,
}

/// 列表命名空间
///
/// 外层读写锁只保护 key -> 列表 的映射，每个列表另有自己的互斥锁。
/// push/pop 持有外层读锁再锁住列表，因此不同键的操作可以并行；
/// 创建新列表和 `ldel` 需要外层写锁，与同一键上的 push/pop 互斥。
/// 列表被弹空之后仍然保留在映射中（"存在但为空"与"不存在"是两种状态）。
#[derive(Debug, Default)]
pub struct ListSpace {
    lists: RwLock<HashMap<String, SharedList>>,
}

fn push_entry(key: &str, value: &str, end: ListEnd) -> LogEntry {
    match end {
        ListEnd::Front => LogEntry::LPush {
            key: key.to_string(),
            value: value.to_string(),
        },
        ListEnd::Back => LogEntry::RPush {
            key: key.to_string(),
            value: value.to_string(),
        },
    }
}

fn push_into(list: &mut VecDeque<String>, value: String, end: ListEnd) -> usize {
    match end {
        ListEnd::Front => list.push_front(value),
        ListEnd::Back => list.push_back(value),
    }
    list.len()
}

impl ListSpace {
    /// 向列表一端插入元素，列表不存在时创建，返回插入后的长度
    pub fn push(
        &self,
        key: String,
        value: String,
        end: ListEnd,
        journal: Option<&dyn Journal>,
    ) -> StoreResult<usize> {
        {
            let lists = read_guard(&self.lists);
            if let Some(list) = lists.get(&key) {
                let mut list = lock_guard(list);
                record(journal, || push_entry(&key, &value, end))?;
                return Ok(push_into(&mut list, value, end));
            }
        }

        // 首次使用：在写锁内重新检查，检查和插入是原子的
        let mut lists = write_guard(&self.lists);
        if let Some(list) = lists.get(&key) {
            let mut list = lock_guard(list);
            record(journal, || push_entry(&key, &value, end))?;
            return Ok(push_into(&mut list, value, end));
        }
        record(journal, || push_entry(&key, &value, end))?;
        let mut list = VecDeque::new();
        let len = push_into(&mut list, value, end);
        lists.insert(key, Arc::new(Mutex::new(list)));
        Ok(len)
    }

    /// 从列表一端弹出元素；键不存在或列表为空时返回 None，且不写日志
    pub fn pop(
        &self,
        key: &str,
        end: ListEnd,
        journal: Option<&dyn Journal>,
    ) -> StoreResult<Option<String>> {
        let lists = read_guard(&self.lists);
        let Some(list) = lists.get(key) else {
            return Ok(None);
        };
        let mut list = lock_guard(list);
        if list.is_empty() {
            return Ok(None);
        }
        record(journal, || match end {
            ListEnd::Front => LogEntry::LPop { key: key.to_string() },
            ListEnd::Back => LogEntry::RPop { key: key.to_string() },
        })?;
        Ok(match end {
            ListEnd::Front => list.pop_front(),
            ListEnd::Back => list.pop_back(),
        })
    }

    /// 取 `[start, end]` 闭区间内元素的副本
    ///
    /// 仅当 `0 <= start <= end < len` 时有效，长度在持锁时读取。
    pub fn range(&self, key: &str, start: i64, end: i64) -> StoreResult<Vec<String>> {
        let lists = read_guard(&self.lists);
        let list = lists
            .get(key)
            .ok_or_else(|| StoreError::KeyNotFound(key.to_string()))?;
        let list = lock_guard(list);
        let len = list.len();
        if start < 0 || end < start || end >= len as i64 {
            return Err(StoreError::InvalidRange {
                key: key.to_string(),
                start,
                end,
                len,
            });
        }
        Ok(list
            .iter()
            .skip(start as usize)
            .take((end - start + 1) as usize)
            .cloned()
            .collect())
    }

    /// 列表长度，键不存在时为 0
    pub fn len(&self, key: &str) -> usize {
        read_guard(&self.lists)
            .get(key)
            .map_or(0, |list| lock_guard(list).len())
    }

    /// 删除整个列表（包括已被弹空的列表），返回键是否存在
    pub fn delete(&self, key: &str, journal: Option<&dyn Journal>) -> StoreResult<bool> {
        let mut lists = write_guard(&self.lists);
        if !lists.contains_key(key) {
            return Ok(false);
        }
        record(journal, || LogEntry::LDel { key: key.to_string() })?;
        lists.remove(key);
        Ok(true)
    }

    pub(crate) fn snapshot(&self) -> BTreeMap<String, Vec<String>> {
        read_guard(&self.lists)
            .iter()
            .map(|(k, list)| (k.clone(), lock_guard(list).iter().cloned().collect()))
            .collect()
    }
}
