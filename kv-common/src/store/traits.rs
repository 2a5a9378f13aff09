use super::wal::{LogEntry, WalResult};

/// 变更日志的追加接口
///
/// 存储在修改内存数据之前调用 `append`，只有追加成功才会真正修改数据。
/// 实现必须保证不同线程的追加之间是全序的。
pub trait Journal: Send + Sync {
    /// 追加一条记录，返回前记录必须已经落盘
    fn append(&self, entry: &LogEntry) -> WalResult<()>;
}
