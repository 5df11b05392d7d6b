//! Application layer logic for taskmaster.
//!
//! This crate owns the task collection, the persistence boundary, the view
//! session used by front ends, exports, and configuration.

pub mod clock;
pub mod collection;
pub mod config;
pub mod date_util;
pub mod export;
pub mod service;
pub mod shared;
pub mod task_store;

// Re-exports for convenience
pub use clock::{Clock, ManualClock, SystemClock};
pub use collection::{TaskCollection, TaskWriteError};
pub use config::{AppConfig, ExportConfig, StorageConfig, ViewConfig};
pub use date_util::{
    DateParseError, format_date, normalize_timestamp, parse_due_date, parse_timestamp,
};
pub use export::{ExportArtifact, ExportError, ExportFormat, export, write_export};
pub use service::TaskService;
pub use shared::SharedTaskCollection;
pub use task_store::{MemoryStoreError, MemoryTaskStore, TaskStore};
