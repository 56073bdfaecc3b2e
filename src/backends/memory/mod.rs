//! In-memory backend: a tree of individually locked nodes.

mod fs;
mod node;
mod tree;

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};

pub use fs::MemoryFilesystem;
pub use tree::MemoryTree;

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Default visibility label; "public" when unset.
    pub visibility: Option<String>,
}
