use std::time::SystemTime;

use tokio::io::AsyncRead;

use crate::error::FsResult;
use crate::types::{Entry, WalkFn, WriteConfig};

pub type ByteStream = Box<dyn AsyncRead + Send + Unpin>;

/// Core trait implemented by all backends.
///
/// Paths are relative to the backend root and are normalized by the backend.
/// Existence checks never report a missing path as an error.
#[async_trait::async_trait]
pub trait Filesystem: Send + Sync + 'static {
    async fn exists(&self, path: &str) -> FsResult<bool>;

    async fn file_exists(&self, path: &str) -> FsResult<bool>;

    async fn dir_exists(&self, path: &str) -> FsResult<bool>;

    async fn read(&self, path: &str) -> FsResult<Vec<u8>>;

    async fn read_stream(&self, path: &str) -> FsResult<ByteStream>;

    /// Direct children, sorted by name.
    async fn read_dir(&self, path: &str) -> FsResult<Vec<Entry>>;

    /// Depth-first, pre-order, with normalized paths. A missing start path
    /// visits nothing.
    async fn walk(&self, path: &str, visit: &mut WalkFn<'_>) -> FsResult<()>;

    async fn last_modified(&self, path: &str) -> FsResult<SystemTime>;

    async fn file_size(&self, path: &str) -> FsResult<u64>;

    async fn mime_type(&self, path: &str) -> FsResult<String>;

    async fn visibility(&self, path: &str) -> FsResult<String>;

    async fn write(&self, path: &str, content: &[u8], config: Option<&WriteConfig>)
    -> FsResult<()>;

    async fn write_stream(
        &self,
        path: &str,
        stream: ByteStream,
        config: Option<&WriteConfig>,
    ) -> FsResult<()>;

    async fn set_visibility(&self, path: &str, visibility: &str) -> FsResult<()>;

    /// Files only. Deleting a missing path succeeds.
    async fn delete(&self, path: &str) -> FsResult<()>;

    /// Recursive. Deleting a missing path succeeds.
    async fn delete_dir(&self, path: &str) -> FsResult<()>;

    async fn create_dir(&self, path: &str, config: Option<&WriteConfig>) -> FsResult<()>;

    async fn move_to(&self, src: &str, dst: &str, config: Option<&WriteConfig>) -> FsResult<()>;

    async fn copy(&self, src: &str, dst: &str, config: Option<&WriteConfig>) -> FsResult<()>;
}
