//! Core MemoryFilesystem implementation.

use std::sync::Arc;
use std::time::SystemTime;

use tokio::io::AsyncReadExt;

use super::MemoryConfig;
use super::tree::MemoryTree;
use crate::backend::{ByteStream, Filesystem};
use crate::error::{ErrorKind, FsError, FsResult, Op};
use crate::mime::{DefaultMimeDetector, MimeTypeDetector};
use crate::types::{Entry, PUBLIC, WalkFn, WriteConfig};

/// In-memory filesystem backend
#[derive(Clone)]
pub struct MemoryFilesystem {
    tree: Arc<MemoryTree>,
    mime: Arc<dyn MimeTypeDetector>,
}

impl MemoryFilesystem {
    /// Create an empty filesystem whose unset visibilities default to `visibility`
    pub fn new(visibility: impl Into<String>) -> Self {
        Self {
            tree: Arc::new(MemoryTree::new(visibility)),
            mime: Arc::new(DefaultMimeDetector::new()),
        }
    }

    pub fn from_config(config: &MemoryConfig) -> Self {
        Self::new(config.visibility.as_deref().unwrap_or(PUBLIC))
    }

    pub fn with_mime_detector(mut self, detector: Arc<dyn MimeTypeDetector>) -> Self {
        self.mime = detector;
        self
    }

    /// The synchronous engine, for callers that don't need the async contract.
    pub fn tree(&self) -> &MemoryTree {
        &self.tree
    }
}

impl Default for MemoryFilesystem {
    fn default() -> Self {
        Self::new(PUBLIC)
    }
}

impl std::fmt::Debug for MemoryFilesystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryFilesystem")
            .field("tree", &self.tree)
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl Filesystem for MemoryFilesystem {
    async fn exists(&self, path: &str) -> FsResult<bool> {
        Ok(self.tree.exists(path))
    }

    async fn file_exists(&self, path: &str) -> FsResult<bool> {
        Ok(self.tree.file_exists(path))
    }

    async fn dir_exists(&self, path: &str) -> FsResult<bool> {
        Ok(self.tree.dir_exists(path))
    }

    async fn read(&self, path: &str) -> FsResult<Vec<u8>> {
        self.tree.read(path)
    }

    async fn read_stream(&self, path: &str) -> FsResult<ByteStream> {
        let content = self.tree.read(path)?;
        Ok(Box::new(std::io::Cursor::new(content)))
    }

    async fn read_dir(&self, path: &str) -> FsResult<Vec<Entry>> {
        self.tree.read_dir(path)
    }

    async fn walk(&self, path: &str, visit: &mut WalkFn<'_>) -> FsResult<()> {
        self.tree.walk(path, visit)
    }

    async fn last_modified(&self, path: &str) -> FsResult<SystemTime> {
        Ok(self.tree.metadata(path)?.modified)
    }

    async fn file_size(&self, path: &str) -> FsResult<u64> {
        Ok(self.tree.metadata(path)?.size)
    }

    async fn mime_type(&self, path: &str) -> FsResult<String> {
        let content = self.tree.read(path).map_err(|e| {
            let cause = match e.kind() {
                ErrorKind::NotFound => FsError::NotFound,
                _ => FsError::NotAFile,
            };
            cause.at(Op::RetrieveMetadata, path)
        })?;
        Ok(self.mime.detect(path, &content))
    }

    async fn visibility(&self, path: &str) -> FsResult<String> {
        self.tree.visibility(path)
    }

    async fn write(
        &self,
        path: &str,
        content: &[u8],
        config: Option<&WriteConfig>,
    ) -> FsResult<()> {
        self.tree.write(path, content, config)
    }

    async fn write_stream(
        &self,
        path: &str,
        mut stream: ByteStream,
        config: Option<&WriteConfig>,
    ) -> FsResult<()> {
        let mut content = Vec::new();
        stream
            .read_to_end(&mut content)
            .await
            .map_err(|e| FsError::from(e).at(Op::Write, path))?;
        self.tree.write(path, &content, config)
    }

    async fn set_visibility(&self, path: &str, visibility: &str) -> FsResult<()> {
        self.tree.set_visibility(path, visibility)
    }

    async fn delete(&self, path: &str) -> FsResult<()> {
        self.tree.delete(path)
    }

    async fn delete_dir(&self, path: &str) -> FsResult<()> {
        self.tree.delete_dir(path)
    }

    async fn create_dir(&self, path: &str, config: Option<&WriteConfig>) -> FsResult<()> {
        self.tree.create_dir(path, config)
    }

    async fn move_to(&self, src: &str, dst: &str, config: Option<&WriteConfig>) -> FsResult<()> {
        self.tree.move_to(src, dst, config)
    }

    async fn copy(&self, src: &str, dst: &str, config: Option<&WriteConfig>) -> FsResult<()> {
        self.tree.copy(src, dst, config)
    }
}
