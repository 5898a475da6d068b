pub mod config;
pub mod error;
pub mod fingerprint;
pub mod loader;
pub mod progress;
pub mod store;

pub use config::{ConfigError, ConnectionConfig, LoadConfig, TableCounts};
pub use error::LoadError;
pub use loader::{BatchLoader, BatchState, CancelToken, LoadOrchestrator, LoadReport, SchemaManager};
pub use store::{InsertTemplate, Store, StoreError};
