use std::sync::Arc;
use std::time::SystemTime;

use crate::backend::{ByteStream, Filesystem};
use crate::error::{FsError, FsResult, Op};
use crate::types::{Entry, WalkFn, WriteConfig};

/// Passes queries through to the inner filesystem and rejects every mutation
/// with [`FsError::ReadOnly`].
pub struct ReadOnlyFilesystem<F: Filesystem + ?Sized = dyn Filesystem> {
    inner: Arc<F>,
}

impl<F: Filesystem> ReadOnlyFilesystem<F> {
    pub fn new(inner: F) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }
}

impl<F: Filesystem + ?Sized> ReadOnlyFilesystem<F> {
    pub fn from_arc(inner: Arc<F>) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &Arc<F> {
        &self.inner
    }
}

#[async_trait::async_trait]
impl<F: Filesystem + ?Sized> Filesystem for ReadOnlyFilesystem<F> {
    async fn exists(&self, path: &str) -> FsResult<bool> {
        self.inner.exists(path).await
    }

    async fn file_exists(&self, path: &str) -> FsResult<bool> {
        self.inner.file_exists(path).await
    }

    async fn dir_exists(&self, path: &str) -> FsResult<bool> {
        self.inner.dir_exists(path).await
    }

    async fn read(&self, path: &str) -> FsResult<Vec<u8>> {
        self.inner.read(path).await
    }

    async fn read_stream(&self, path: &str) -> FsResult<ByteStream> {
        self.inner.read_stream(path).await
    }

    async fn read_dir(&self, path: &str) -> FsResult<Vec<Entry>> {
        self.inner.read_dir(path).await
    }

    async fn walk(&self, path: &str, visit: &mut WalkFn<'_>) -> FsResult<()> {
        self.inner.walk(path, visit).await
    }

    async fn last_modified(&self, path: &str) -> FsResult<SystemTime> {
        self.inner.last_modified(path).await
    }

    async fn file_size(&self, path: &str) -> FsResult<u64> {
        self.inner.file_size(path).await
    }

    async fn mime_type(&self, path: &str) -> FsResult<String> {
        self.inner.mime_type(path).await
    }

    async fn visibility(&self, path: &str) -> FsResult<String> {
        self.inner.visibility(path).await
    }

    async fn write(&self, path: &str, _: &[u8], _: Option<&WriteConfig>) -> FsResult<()> {
        Err(FsError::ReadOnly.at(Op::Write, path))
    }

    async fn write_stream(
        &self,
        path: &str,
        _: ByteStream,
        _: Option<&WriteConfig>,
    ) -> FsResult<()> {
        Err(FsError::ReadOnly.at(Op::Write, path))
    }

    async fn set_visibility(&self, path: &str, _: &str) -> FsResult<()> {
        Err(FsError::ReadOnly.at(Op::SetVisibility, path))
    }

    async fn delete(&self, path: &str) -> FsResult<()> {
        Err(FsError::ReadOnly.at(Op::Delete, path))
    }

    async fn delete_dir(&self, path: &str) -> FsResult<()> {
        Err(FsError::ReadOnly.at(Op::DeleteDir, path))
    }

    async fn create_dir(&self, path: &str, _: Option<&WriteConfig>) -> FsResult<()> {
        Err(FsError::ReadOnly.at(Op::CreateDir, path))
    }

    async fn move_to(&self, src: &str, dst: &str, _: Option<&WriteConfig>) -> FsResult<()> {
        Err(FsError::ReadOnly.between(Op::Move, src, dst))
    }

    async fn copy(&self, src: &str, dst: &str, _: Option<&WriteConfig>) -> FsResult<()> {
        Err(FsError::ReadOnly.between(Op::Copy, src, dst))
    }
}
