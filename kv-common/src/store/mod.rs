mod error;
mod guard;
mod hash_ops;
mod list_ops;
mod store_core;
mod store_manager;
mod string_ops;
mod traits;
mod wal;

pub use error::{StoreError, StoreResult};
pub use list_ops::ListEnd;
pub use store_core::{Store, StoreSnapshot};
pub use store_manager::StoreManager;
pub use traits::Journal;
pub use wal::{LogEntry, ReplayStats, WalError, WalResult, WriteAheadLog};
