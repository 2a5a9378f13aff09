use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::error::StoreResult;
use super::traits::Journal;
use super::wal::LogEntry;

// 各命名空间里只有普通的 map，panic 不会留下被破坏的不变式，
// 所以锁中毒时直接取回内部数据继续使用

pub(crate) fn read_guard<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write_guard<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn lock_guard<T>(lock: &Mutex<T>) -> MutexGuard<'_, T> {
    lock.lock().unwrap_or_else(PoisonError::into_inner)
}

/// 在修改之前写日志；没有日志（例如回放期间）时什么也不做
pub(crate) fn record<F>(journal: Option<&dyn Journal>, entry: F) -> StoreResult<()>
where
    F: FnOnce() -> LogEntry,
{
    if let Some(journal) = journal {
        journal.append(&entry())?;
    }
    Ok(())
}
