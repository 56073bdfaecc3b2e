//! Core types shared by every backend: write options, directory entries, walk control.

use std::ops::{BitOr, BitOrAssign};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::error::{FsError, FsResult};

pub const PUBLIC: &str = "public";
pub const PRIVATE: &str = "private";

/// Enum for distinguishing file types at runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    File,
    Dir,
}

/// Bitmask selecting create/truncate/append behavior of a write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WriteFlag(u32);

impl WriteFlag {
    pub const CREATE: WriteFlag = WriteFlag(0x1);
    pub const TRUNCATE: WriteFlag = WriteFlag(0x2);
    pub const APPEND: WriteFlag = WriteFlag(0x4);

    pub const fn empty() -> Self {
        WriteFlag(0)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn from_bits(bits: u32) -> Self {
        WriteFlag(bits)
    }

    pub const fn contains(self, other: WriteFlag) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for WriteFlag {
    type Output = WriteFlag;

    fn bitor(self, rhs: WriteFlag) -> WriteFlag {
        WriteFlag(self.0 | rhs.0)
    }
}

impl BitOrAssign for WriteFlag {
    fn bitor_assign(&mut self, rhs: WriteFlag) {
        self.0 |= rhs.0;
    }
}

/// Per-operation overrides for writes, directory creation, move and copy.
///
/// Every field is optional; a missing field falls back to the backend default.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteConfig {
    pub dir_visibility: Option<String>,
    pub file_visibility: Option<String>,
    #[serde(alias = "file_write_flag")]
    pub write_flag: Option<WriteFlag>,
}

impl WriteConfig {
    pub fn new(dir_visibility: impl Into<String>, file_visibility: impl Into<String>) -> Self {
        Self {
            dir_visibility: Some(dir_visibility.into()),
            file_visibility: Some(file_visibility.into()),
            write_flag: None,
        }
    }

    pub fn for_dir(dir_visibility: impl Into<String>) -> Self {
        Self {
            dir_visibility: Some(dir_visibility.into()),
            ..Self::default()
        }
    }

    pub fn public_file() -> Self {
        Self::new(PUBLIC, PUBLIC)
    }

    pub fn private_file() -> Self {
        Self::new(PRIVATE, PRIVATE)
    }

    pub fn public_file_with_private_dir() -> Self {
        Self::new(PRIVATE, PUBLIC)
    }

    pub fn private_file_with_public_dir() -> Self {
        Self::new(PUBLIC, PRIVATE)
    }

    pub fn public_dir() -> Self {
        Self::for_dir(PUBLIC)
    }

    pub fn private_dir() -> Self {
        Self::for_dir(PRIVATE)
    }

    pub fn with_write_flag(mut self, flag: WriteFlag) -> Self {
        self.write_flag = Some(flag);
        self
    }

    /// Decode an untyped options bag such as `{"file_visibility": "private"}`.
    pub fn from_value(value: serde_json::Value) -> FsResult<Self> {
        serde_json::from_value(value).map_err(FsError::from)
    }
}

pub(crate) fn dir_visibility<'a>(config: Option<&'a WriteConfig>, default: &'a str) -> &'a str {
    config
        .and_then(|c| c.dir_visibility.as_deref())
        .unwrap_or(default)
}

pub(crate) fn file_visibility<'a>(config: Option<&'a WriteConfig>, default: &'a str) -> &'a str {
    config
        .and_then(|c| c.file_visibility.as_deref())
        .unwrap_or(default)
}

pub(crate) fn write_flag(config: Option<&WriteConfig>, default: WriteFlag) -> WriteFlag {
    config.and_then(|c| c.write_flag).unwrap_or(default)
}

/// Directory listing element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub name: String,
    pub file_type: FileType,
    pub size: u64,
    #[serde(with = "serde_millis")]
    pub modified: SystemTime,
}

impl Entry {
    pub fn is_dir(&self) -> bool {
        self.file_type == FileType::Dir
    }
    pub fn file_type(&self) -> FileType {
        self.file_type
    }
}

/// What a walk callback wants to happen next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkControl {
    Continue,
    /// Do not descend into this directory. Ignored for files.
    SkipDir,
    /// Stop the walk; `walk` still returns `Ok`.
    SkipAll,
}

/// Walk callback: `(path, entry, error resolving the entry's children)`.
pub type WalkFn<'a> =
    dyn FnMut(&str, &Entry, Option<&FsError>) -> FsResult<WalkControl> + Send + 'a;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flags_combine() {
        let flag = WriteFlag::CREATE | WriteFlag::APPEND;
        assert!(flag.contains(WriteFlag::APPEND));
        assert!(!flag.contains(WriteFlag::TRUNCATE));
        assert!(WriteFlag::empty().is_empty());
    }

    #[test]
    fn write_config_from_untyped_options() {
        let cfg = WriteConfig::from_value(json!({
            "file_visibility": "private",
            "file_write_flag": 4,
        }))
        .unwrap();
        assert_eq!(cfg.file_visibility.as_deref(), Some(PRIVATE));
        assert_eq!(cfg.dir_visibility, None);
        assert_eq!(cfg.write_flag, Some(WriteFlag::APPEND));
    }

    #[test]
    fn write_config_skips_missing_fields() {
        let value = serde_json::to_value(WriteConfig::public_dir()).unwrap();
        assert_eq!(value, json!({ "dir_visibility": "public" }));
    }

    #[test]
    fn defaults_apply_when_config_absent() {
        let cfg = WriteConfig::private_dir();
        assert_eq!(dir_visibility(Some(&cfg), PUBLIC), PRIVATE);
        assert_eq!(file_visibility(Some(&cfg), PUBLIC), PUBLIC);
        assert_eq!(
            write_flag(None, WriteFlag::CREATE | WriteFlag::TRUNCATE),
            WriteFlag::CREATE | WriteFlag::TRUNCATE
        );
    }
}
