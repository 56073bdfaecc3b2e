//! Typed configuration for building a [`FilesystemManager`](crate::FilesystemManager).
//!
//! ```json
//! {
//!   "filesystems": {
//!     "cache": { "driver": "memory", "visibility": "private" },
//!     "assets": { "driver": "local", "root": "/srv/assets", "read_only": true }
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::backend::Filesystem;
use crate::backends::{LocalConfig, LocalFilesystem, MemoryConfig, MemoryFilesystem};
use crate::decorators::{DeferredFilesystem, ReadOnlyFilesystem};
use crate::error::FsResult;

/// Which backend to build, with its backend-specific options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "driver", rename_all = "lowercase")]
pub enum DriverConfig {
    Memory(MemoryConfig),
    Local(LocalConfig),
}

impl DriverConfig {
    fn build(&self) -> FsResult<Arc<dyn Filesystem>> {
        Ok(match self {
            DriverConfig::Memory(config) => Arc::new(MemoryFilesystem::from_config(config)),
            DriverConfig::Local(config) => Arc::new(LocalFilesystem::from_config(config)?),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilesystemConfig {
    #[serde(flatten)]
    pub driver: DriverConfig,
    /// Reject every mutation.
    #[serde(default)]
    pub read_only: bool,
    /// Build the backend on first use instead of when the manager is built.
    #[serde(default)]
    pub deferred: bool,
}

impl FilesystemConfig {
    pub fn new(driver: DriverConfig) -> Self {
        Self {
            driver,
            read_only: false,
            deferred: false,
        }
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn deferred(mut self) -> Self {
        self.deferred = true;
        self
    }

    /// Build the configured filesystem with its decorators applied.
    pub fn open(&self, name: &str) -> FsResult<Arc<dyn Filesystem>> {
        let fs: Arc<dyn Filesystem> = if self.deferred {
            let driver = self.driver.clone();
            Arc::new(DeferredFilesystem::new(name, move || driver.build()))
        } else {
            self.driver.build()?
        };
        if self.read_only {
            return Ok(Arc::new(ReadOnlyFilesystem::from_arc(fs)));
        }
        Ok(fs)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    pub filesystems: BTreeMap<String, FilesystemConfig>,
}

impl ManagerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, config: FilesystemConfig) -> Self {
        self.filesystems.insert(name.into(), config);
        self
    }

    /// Decode from an untyped JSON value.
    pub fn from_value(value: serde_json::Value) -> FsResult<Self> {
        Ok(serde_json::from_value(value)?)
    }
}
