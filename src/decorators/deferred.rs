use std::sync::Arc;
use std::time::SystemTime;

use tokio::sync::OnceCell;
use tracing::debug;

use crate::backend::{ByteStream, Filesystem};
use crate::error::{FsResult, Op};
use crate::types::{Entry, WalkFn, WriteConfig};

/// Builds the wrapped filesystem on demand.
pub type FilesystemFactory = Box<dyn Fn() -> FsResult<Arc<dyn Filesystem>> + Send + Sync>;

/// Constructs its inner filesystem on the first call of any operation.
///
/// Concurrent first calls share a single construction. A failed construction
/// is returned to the caller and attempted again on the next call.
pub struct DeferredFilesystem {
    name: String,
    factory: FilesystemFactory,
    inner: OnceCell<Arc<dyn Filesystem>>,
}

impl DeferredFilesystem {
    pub fn new<F>(name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> FsResult<Arc<dyn Filesystem>> + Send + Sync + 'static,
    {
        let name = name.into();
        debug!(%name, "deferring filesystem construction until first use");
        Self {
            name,
            factory: Box::new(factory),
            inner: OnceCell::new(),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.initialized()
    }

    async fn fs(&self) -> FsResult<&Arc<dyn Filesystem>> {
        self.inner
            .get_or_try_init(|| async {
                debug!(name = %self.name, "initializing deferred filesystem");
                (self.factory)().map_err(|e| e.at(Op::Open, self.name.as_str()))
            })
            .await
    }
}

impl std::fmt::Debug for DeferredFilesystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeferredFilesystem")
            .field("name", &self.name)
            .field("initialized", &self.is_initialized())
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl Filesystem for DeferredFilesystem {
    async fn exists(&self, path: &str) -> FsResult<bool> {
        self.fs().await?.exists(path).await
    }

    async fn file_exists(&self, path: &str) -> FsResult<bool> {
        self.fs().await?.file_exists(path).await
    }

    async fn dir_exists(&self, path: &str) -> FsResult<bool> {
        self.fs().await?.dir_exists(path).await
    }

    async fn read(&self, path: &str) -> FsResult<Vec<u8>> {
        self.fs().await?.read(path).await
    }

    async fn read_stream(&self, path: &str) -> FsResult<ByteStream> {
        self.fs().await?.read_stream(path).await
    }

    async fn read_dir(&self, path: &str) -> FsResult<Vec<Entry>> {
        self.fs().await?.read_dir(path).await
    }

    async fn walk(&self, path: &str, visit: &mut WalkFn<'_>) -> FsResult<()> {
        self.fs().await?.walk(path, visit).await
    }

    async fn last_modified(&self, path: &str) -> FsResult<SystemTime> {
        self.fs().await?.last_modified(path).await
    }

    async fn file_size(&self, path: &str) -> FsResult<u64> {
        self.fs().await?.file_size(path).await
    }

    async fn mime_type(&self, path: &str) -> FsResult<String> {
        self.fs().await?.mime_type(path).await
    }

    async fn visibility(&self, path: &str) -> FsResult<String> {
        self.fs().await?.visibility(path).await
    }

    async fn write(
        &self,
        path: &str,
        content: &[u8],
        config: Option<&WriteConfig>,
    ) -> FsResult<()> {
        self.fs().await?.write(path, content, config).await
    }

    async fn write_stream(
        &self,
        path: &str,
        stream: ByteStream,
        config: Option<&WriteConfig>,
    ) -> FsResult<()> {
        self.fs().await?.write_stream(path, stream, config).await
    }

    async fn set_visibility(&self, path: &str, visibility: &str) -> FsResult<()> {
        self.fs().await?.set_visibility(path, visibility).await
    }

    async fn delete(&self, path: &str) -> FsResult<()> {
        self.fs().await?.delete(path).await
    }

    async fn delete_dir(&self, path: &str) -> FsResult<()> {
        self.fs().await?.delete_dir(path).await
    }

    async fn create_dir(&self, path: &str, config: Option<&WriteConfig>) -> FsResult<()> {
        self.fs().await?.create_dir(path, config).await
    }

    async fn move_to(&self, src: &str, dst: &str, config: Option<&WriteConfig>) -> FsResult<()> {
        self.fs().await?.move_to(src, dst, config).await
    }

    async fn copy(&self, src: &str, dst: &str, config: Option<&WriteConfig>) -> FsResult<()> {
        self.fs().await?.copy(src, dst, config).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::backends::MemoryFilesystem;
    use crate::error::{ErrorKind, FsError};

    #[tokio::test]
    async fn builds_once_on_first_use() -> FsResult<()> {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let fs = DeferredFilesystem::new("mem", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(MemoryFilesystem::default()) as Arc<dyn Filesystem>)
        });
        assert!(!fs.is_initialized());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        fs.write("a.txt", b"x", None).await?;
        assert_eq!(fs.read("a.txt").await?, b"x");
        assert!(fs.is_initialized());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        Ok(())
    }

    #[tokio::test]
    async fn failed_construction_is_retried() -> FsResult<()> {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let fs = DeferredFilesystem::new("flaky", move || {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(FsError::BackendIo("unavailable".into()))
            } else {
                Ok(Arc::new(MemoryFilesystem::default()) as Arc<dyn Filesystem>)
            }
        });

        let err = fs.exists("a").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BackendIo);
        assert_eq!(
            err.to_string(),
            "unable to open filesystem flaky: backend I/O error: unavailable"
        );
        assert!(!fs.exists("a").await?);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        Ok(())
    }
}
