//! Wrappers that change how an inner filesystem is reached, not what it stores.

mod deferred;
mod readonly;

pub use deferred::{DeferredFilesystem, FilesystemFactory};
pub use readonly::ReadOnlyFilesystem;
