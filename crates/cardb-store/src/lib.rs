// ABOUTME: Storage engine for cardb: tables as directories, rows as JSON files.
// ABOUTME: Provides the filesystem capability, configuration, table manager, and row store.

pub mod config;
pub mod error;
pub mod fs;
pub mod rows;
pub mod tables;
pub mod testing;

pub use config::{ConfigError, StoreConfig};
pub use error::{ErrorKind, StoreError, StoreResult};
pub use fs::{DirEntry, HostFs, LocalFs};
pub use rows::RowStore;
pub use tables::TableManager;
