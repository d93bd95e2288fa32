//! Infrastructure layer - External I/O and persistence

pub mod config;
pub mod logging;
pub mod remote;
pub mod repository;
pub mod storage;

pub use config::{Config, SyncConfig, SyncPolicy};
pub use remote::{HttpRemote, QuoteRemote, RemoteRecord};
pub use repository::{FileSystemRepository, QuotebookRepository};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage};
