//! unifs: one async filesystem contract over memory and local disk backends,
//! with a manager that routes `name://path` to the right backend.

pub mod backend;
pub mod backends;
pub mod config;
pub mod decorators;
pub mod error;
pub mod manager;
pub mod mime;
pub mod path;
pub mod types;
pub mod visibility;

// Re-export
pub use backend::*;
pub use backends::{LocalFilesystem, MemoryFilesystem};
pub use config::{DriverConfig, FilesystemConfig, ManagerConfig};
pub use decorators::{DeferredFilesystem, ReadOnlyFilesystem};
pub use error::{ErrorKind, FsError, FsResult, Op};
pub use manager::FilesystemManager;
pub use types::*;
