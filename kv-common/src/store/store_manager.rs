use std::path::Path;
use std::sync::Arc;

use log::info;

use super::store_core::Store;
use super::wal::{ReplayStats, WalResult, WriteAheadLog};

/// 线程安全的存储管理器，可以在各连接线程之间廉价克隆
#[derive(Clone)]
pub struct StoreManager {
    store: Arc<Store>,
    recovered: ReplayStats,
}

impl Default for StoreManager {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreManager {
    /// 纯内存存储，不做持久化
    pub fn new() -> Self {
        StoreManager {
            store: Arc::new(Store::new()),
            recovered: ReplayStats::default(),
        }
    }

    /// 打开持久化日志，回放到空存储，然后把日志挂到存储上
    ///
    /// 日志文件无法打开或读取时返回错误，调用方应当终止启动。
    pub fn open(log_file: &Path, sync_on_append: bool) -> WalResult<Self> {
        let wal = WriteAheadLog::new(log_file)?.with_sync(sync_on_append);

        let store = Store::new();
        let recovered = wal.replay(&store)?;
        info!(
            "存储恢复完成: {} 个键, 日志大小 {} 字节",
            store.key_count(),
            wal.file_size()?
        );

        let store = store.with_journal(Arc::new(wal));
        Ok(StoreManager {
            store: Arc::new(store),
            recovered,
        })
    }

    pub fn get_store(&self) -> &Store {
        &self.store
    }

    /// 启动时回放的统计
    pub fn recovery_stats(&self) -> ReplayStats {
        self.recovered
    }
}
