//! Routes `name://path` logical paths to registered filesystems.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::SystemTime;

use tracing::debug;

use crate::backend::{ByteStream, Filesystem};
use crate::config::ManagerConfig;
use crate::error::{FsError, FsResult, Op};
use crate::types::{Entry, WalkFn, WriteConfig};

const SEPARATOR: &str = "://";

/// A set of named filesystems addressed through `<name>://<path>`.
#[derive(Default)]
pub struct FilesystemManager {
    filesystems: RwLock<HashMap<String, Arc<dyn Filesystem>>>,
}

fn same_instance(a: &Arc<dyn Filesystem>, b: &Arc<dyn Filesystem>) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

impl FilesystemManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build every configured filesystem. Deferred entries are not opened yet.
    pub fn from_config(config: &ManagerConfig) -> FsResult<Self> {
        let manager = Self::new();
        for (name, fs_config) in &config.filesystems {
            debug!(%name, driver = ?fs_config.driver, "registering filesystem");
            manager.add(name.clone(), fs_config.open(name)?);
        }
        Ok(manager)
    }

    /// Register `fs` under `name`, replacing any previous registration.
    pub fn add(&self, name: impl Into<String>, fs: Arc<dyn Filesystem>) {
        self.filesystems
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), fs);
    }

    pub fn get(&self, name: &str) -> FsResult<Arc<dyn Filesystem>> {
        self.filesystems
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .ok_or_else(|| FsError::UnknownFilesystem(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.filesystems
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .filesystems
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Split a logical path into its filesystem and the backend-relative path.
    pub fn resolve<'p>(&self, logical: &'p str) -> FsResult<(Arc<dyn Filesystem>, &'p str)> {
        let parts: Vec<&str> = logical.split(SEPARATOR).collect();
        let [name, path] = parts[..] else {
            return Err(FsError::InvalidPath(logical.to_string()));
        };
        Ok((self.get(name)?, path))
    }

    pub async fn exists(&self, path: &str) -> FsResult<bool> {
        let (fs, p) = self.resolve(path)?;
        fs.exists(p).await
    }

    pub async fn file_exists(&self, path: &str) -> FsResult<bool> {
        let (fs, p) = self.resolve(path)?;
        fs.file_exists(p).await
    }

    pub async fn dir_exists(&self, path: &str) -> FsResult<bool> {
        let (fs, p) = self.resolve(path)?;
        fs.dir_exists(p).await
    }

    pub async fn read(&self, path: &str) -> FsResult<Vec<u8>> {
        let (fs, p) = self.resolve(path)?;
        fs.read(p).await
    }

    pub async fn read_stream(&self, path: &str) -> FsResult<ByteStream> {
        let (fs, p) = self.resolve(path)?;
        fs.read_stream(p).await
    }

    pub async fn read_dir(&self, path: &str) -> FsResult<Vec<Entry>> {
        let (fs, p) = self.resolve(path)?;
        fs.read_dir(p).await
    }

    /// Paths handed to `visit` are relative to the resolved backend.
    pub async fn walk(&self, path: &str, visit: &mut WalkFn<'_>) -> FsResult<()> {
        let (fs, p) = self.resolve(path)?;
        fs.walk(p, visit).await
    }

    pub async fn last_modified(&self, path: &str) -> FsResult<SystemTime> {
        let (fs, p) = self.resolve(path)?;
        fs.last_modified(p).await
    }

    pub async fn file_size(&self, path: &str) -> FsResult<u64> {
        let (fs, p) = self.resolve(path)?;
        fs.file_size(p).await
    }

    pub async fn mime_type(&self, path: &str) -> FsResult<String> {
        let (fs, p) = self.resolve(path)?;
        fs.mime_type(p).await
    }

    pub async fn visibility(&self, path: &str) -> FsResult<String> {
        let (fs, p) = self.resolve(path)?;
        fs.visibility(p).await
    }

    pub async fn write(
        &self,
        path: &str,
        content: &[u8],
        config: Option<&WriteConfig>,
    ) -> FsResult<()> {
        let (fs, p) = self.resolve(path)?;
        fs.write(p, content, config).await
    }

    pub async fn write_stream(
        &self,
        path: &str,
        stream: ByteStream,
        config: Option<&WriteConfig>,
    ) -> FsResult<()> {
        let (fs, p) = self.resolve(path)?;
        fs.write_stream(p, stream, config).await
    }

    pub async fn set_visibility(&self, path: &str, visibility: &str) -> FsResult<()> {
        let (fs, p) = self.resolve(path)?;
        fs.set_visibility(p, visibility).await
    }

    pub async fn delete(&self, path: &str) -> FsResult<()> {
        let (fs, p) = self.resolve(path)?;
        fs.delete(p).await
    }

    pub async fn delete_dir(&self, path: &str) -> FsResult<()> {
        let (fs, p) = self.resolve(path)?;
        fs.delete_dir(p).await
    }

    pub async fn create_dir(&self, path: &str, config: Option<&WriteConfig>) -> FsResult<()> {
        let (fs, p) = self.resolve(path)?;
        fs.create_dir(p, config).await
    }

    /// Within one filesystem this is the backend's own move. Across
    /// filesystems the file is streamed over and then deleted from the source.
    pub async fn move_to(&self, src: &str, dst: &str, config: Option<&WriteConfig>) -> FsResult<()> {
        let (src_fs, src_path) = self.resolve(src)?;
        let (dst_fs, dst_path) = self.resolve(dst)?;
        if same_instance(&src_fs, &dst_fs) {
            return src_fs.move_to(src_path, dst_path, config).await;
        }
        debug!(%src, %dst, "moving across filesystems");
        transfer(&src_fs, src_path, &dst_fs, dst_path, config)
            .await
            .map_err(|e| e.between(Op::Move, src, dst))?;
        src_fs
            .delete(src_path)
            .await
            .map_err(|e| e.between(Op::Move, src, dst))
    }

    /// Within one filesystem this is the backend's own copy. Across
    /// filesystems the file is streamed over.
    pub async fn copy(&self, src: &str, dst: &str, config: Option<&WriteConfig>) -> FsResult<()> {
        let (src_fs, src_path) = self.resolve(src)?;
        let (dst_fs, dst_path) = self.resolve(dst)?;
        if same_instance(&src_fs, &dst_fs) {
            return src_fs.copy(src_path, dst_path, config).await;
        }
        debug!(%src, %dst, "copying across filesystems");
        transfer(&src_fs, src_path, &dst_fs, dst_path, config)
            .await
            .map_err(|e| e.between(Op::Copy, src, dst))
    }
}

async fn transfer(
    src_fs: &Arc<dyn Filesystem>,
    src: &str,
    dst_fs: &Arc<dyn Filesystem>,
    dst: &str,
    config: Option<&WriteConfig>,
) -> FsResult<()> {
    if src_fs.dir_exists(src).await? {
        return Err(FsError::NotAFile);
    }
    let stream = src_fs.read_stream(src).await?;
    dst_fs.write_stream(dst, stream, config).await
}

impl std::fmt::Debug for FilesystemManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilesystemManager")
            .field("filesystems", &self.names())
            .finish()
    }
}
