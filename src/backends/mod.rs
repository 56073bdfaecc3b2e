pub mod local;
pub mod memory;

pub use local::{LocalConfig, LocalFilesystem};
pub use memory::{MemoryConfig, MemoryFilesystem, MemoryTree};
