use std::fmt;

use super::wal::WalError;

/// 存储操作错误类型
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// 键不存在
    KeyNotFound(String),
    /// 列表区间越界
    InvalidRange {
        key: String,
        start: i64,
        end: i64,
        len: usize,
    },
    /// 持久化日志写入失败，内存中的数据没有被修改
    Journal(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::KeyNotFound(key) => write!(f, "key '{}' not found", key),
            StoreError::InvalidRange { key, start, end, len } => write!(
                f,
                "invalid range [{}, {}] for list '{}' of length {}",
                start, end, key, len
            ),
            StoreError::Journal(msg) => write!(f, "durability log append failed: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

/// 存储操作结果类型
pub type StoreResult<T> = Result<T, StoreError>;

impl From<WalError> for StoreError {
    fn from(error: WalError) -> Self {
        StoreError::Journal(error.to_string())
    }
}
