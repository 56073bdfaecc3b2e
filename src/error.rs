use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The operation a failing call was performing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Op {
    CheckExistence,
    Read,
    ReadDir,
    Walk,
    RetrieveMetadata,
    Write,
    SetVisibility,
    Delete,
    DeleteDir,
    CreateDir,
    Move,
    Copy,
    Resolve,
    Open,
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Op::CheckExistence => "check existence of",
            Op::Read => "read file",
            Op::ReadDir => "read directory",
            Op::Walk => "walk directory",
            Op::RetrieveMetadata => "retrieve metadata of",
            Op::Write => "write file",
            Op::SetVisibility => "set visibility of",
            Op::Delete => "delete file",
            Op::DeleteDir => "delete directory",
            Op::CreateDir => "create directory",
            Op::Move => "move",
            Op::Copy => "copy",
            Op::Resolve => "resolve",
            Op::Open => "open filesystem",
        };
        f.write_str(s)
    }
}

/// Error kind, independent of the context wrappers around it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    NotFound,
    NotAFile,
    NotADirectory,
    AlreadyExists,
    UnknownFilesystem,
    InvalidPath,
    PermissionDenied,
    ReadOnly,
    InvalidConfig,
    BackendIo,
    SystemIo,
}

#[derive(Debug, Error, Serialize, Deserialize)]
pub enum FsError {
    #[error("not found")]
    NotFound,

    #[error("not a file")]
    NotAFile,

    #[error("not a directory")]
    NotADirectory,

    #[error("already exists")]
    AlreadyExists,

    #[error("unknown filesystem: {0}")]
    UnknownFilesystem(String),

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("permission denied")]
    PermissionDenied,

    #[error("read-only filesystem")]
    ReadOnly,

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("backend I/O error: {0}")]
    BackendIo(String),

    // std::io::Error is stringified so it works with Serialize/Deserialize
    #[error("system I/O error: {0}")]
    SystemIo(String),

    #[error("unable to {op} {path}: {source}")]
    Op {
        op: Op,
        path: String,
        source: Box<FsError>,
    },

    #[error("unable to {op} from {src} to {dst}: {source}")]
    Transfer {
        op: Op,
        src: String,
        dst: String,
        source: Box<FsError>,
    },
}

impl FsError {
    /// Wrap this error with the operation and path it happened on.
    pub fn at(self, op: Op, path: impl Into<String>) -> Self {
        FsError::Op {
            op,
            path: path.into(),
            source: Box::new(self),
        }
    }

    /// Wrap this error with a two-path operation (move, copy).
    pub fn between(self, op: Op, src: impl Into<String>, dst: impl Into<String>) -> Self {
        FsError::Transfer {
            op,
            src: src.into(),
            dst: dst.into(),
            source: Box::new(self),
        }
    }

    /// Innermost kind, looking through any context wrappers.
    pub fn kind(&self) -> ErrorKind {
        match self {
            FsError::NotFound => ErrorKind::NotFound,
            FsError::NotAFile => ErrorKind::NotAFile,
            FsError::NotADirectory => ErrorKind::NotADirectory,
            FsError::AlreadyExists => ErrorKind::AlreadyExists,
            FsError::UnknownFilesystem(_) => ErrorKind::UnknownFilesystem,
            FsError::InvalidPath(_) => ErrorKind::InvalidPath,
            FsError::PermissionDenied => ErrorKind::PermissionDenied,
            FsError::ReadOnly => ErrorKind::ReadOnly,
            FsError::InvalidConfig(_) => ErrorKind::InvalidConfig,
            FsError::BackendIo(_) => ErrorKind::BackendIo,
            FsError::SystemIo(_) => ErrorKind::SystemIo,
            FsError::Op { source, .. } | FsError::Transfer { source, .. } => source.kind(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

impl From<std::io::Error> for FsError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::NotFound => FsError::NotFound,
            std::io::ErrorKind::PermissionDenied => FsError::PermissionDenied,
            std::io::ErrorKind::AlreadyExists => FsError::AlreadyExists,
            std::io::ErrorKind::NotADirectory => FsError::NotADirectory,
            std::io::ErrorKind::IsADirectory => FsError::NotAFile,
            _ => FsError::SystemIo(e.to_string()),
        }
    }
}

impl From<serde_json::Error> for FsError {
    fn from(e: serde_json::Error) -> Self {
        FsError::InvalidConfig(e.to_string())
    }
}

pub type FsResult<T> = Result<T, FsError>;
