//! Local disk backend. A thin pass-through to `tokio::fs` under a root directory.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::OnceCell;
use tracing::debug;

use crate::backend::{ByteStream, Filesystem};
use crate::error::{FsError, FsResult, Op};
use crate::mime::{DefaultMimeDetector, MimeTypeDetector};
use crate::path;
use crate::types::{self, Entry, FileType, WalkControl, WalkFn, WriteConfig, WriteFlag};
use crate::visibility::{UnixVisibility, UnixVisibilityConfig, VisibilityConverter};

const MIME_SAMPLE_LEN: u64 = 512;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalConfig {
    pub root: PathBuf,
    /// Create the root on first write instead of at construction.
    pub defer_root_creation: bool,
    pub permissions: UnixVisibilityConfig,
}

pub struct LocalFilesystem {
    root: PathBuf,
    visibility: UnixVisibility,
    mime: Arc<dyn MimeTypeDetector>,
    root_created: OnceCell<()>,
}

fn is_missing(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    )
}

#[cfg(unix)]
fn mode_of(meta: &std::fs::Metadata) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;
    Some(meta.permissions().mode() & 0o777)
}

#[cfg(not(unix))]
fn mode_of(_meta: &std::fs::Metadata) -> Option<u32> {
    None
}

#[cfg(unix)]
async fn chmod(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).await
}

#[cfg(not(unix))]
async fn chmod(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}

async fn create_dirs(path: &Path, mode: u32) -> io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(mode);
    #[cfg(not(unix))]
    let _ = mode;
    builder.create(path).await
}

/// Remove everything below `dir`, leaving `dir` itself in place.
async fn clear_dir(dir: &Path) -> io::Result<()> {
    let mut entries = fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_dir() {
            fs::remove_dir_all(entry.path()).await?;
        } else {
            fs::remove_file(entry.path()).await?;
        }
    }
    Ok(())
}

fn entry_from(name: String, meta: &std::fs::Metadata) -> Entry {
    let is_dir = meta.is_dir();
    Entry {
        name,
        file_type: if is_dir { FileType::Dir } else { FileType::File },
        size: if is_dir { 0 } else { meta.len() },
        modified: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
    }
}

impl LocalFilesystem {
    /// Open a filesystem rooted at `root`, creating the directory now.
    pub fn new(root: impl Into<PathBuf>) -> FsResult<Self> {
        Self::from_config(&LocalConfig {
            root: root.into(),
            ..LocalConfig::default()
        })
    }

    pub fn from_config(config: &LocalConfig) -> FsResult<Self> {
        if config.root.as_os_str().is_empty() {
            return Err(FsError::InvalidConfig("local root must not be empty".into()));
        }
        let fs = Self {
            root: config.root.clone(),
            visibility: UnixVisibility::from_config(&config.permissions),
            mime: Arc::new(DefaultMimeDetector::new()),
            root_created: OnceCell::new(),
        };
        if !config.defer_root_creation {
            std::fs::create_dir_all(&fs.root)
                .map_err(|e| FsError::from(e).at(Op::CreateDir, fs.root.display().to_string()))?;
            let _ = fs.root_created.set(());
        }
        Ok(fs)
    }

    pub fn with_mime_detector(mut self, detector: Arc<dyn MimeTypeDetector>) -> Self {
        self.mime = detector;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn ensure_root(&self) -> FsResult<()> {
        self.root_created
            .get_or_try_init(|| async {
                debug!(root = %self.root.display(), "creating local root");
                fs::create_dir_all(&self.root).await.map_err(|e| {
                    FsError::from(e).at(Op::CreateDir, self.root.display().to_string())
                })
            })
            .await?;
        Ok(())
    }

    fn full(&self, normalized: &str) -> PathBuf {
        if normalized.is_empty() {
            self.root.clone()
        } else {
            self.root.join(normalized)
        }
    }

    /// `Ok(None)` when the path does not exist.
    async fn stat(&self, normalized: &str) -> io::Result<Option<std::fs::Metadata>> {
        match fs::metadata(self.full(normalized)).await {
            Ok(meta) => Ok(Some(meta)),
            Err(e) if is_missing(&e) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn require(&self, path: &str, op: Op) -> FsResult<(String, std::fs::Metadata)> {
        let normalized = path::normalize(path);
        match self.stat(&normalized).await {
            Ok(Some(meta)) => Ok((normalized, meta)),
            Ok(None) => Err(FsError::NotFound.at(op, path)),
            Err(e) => Err(FsError::from(e).at(op, path)),
        }
    }

    async fn list(&self, normalized: &str) -> io::Result<Vec<Entry>> {
        let mut dir = fs::read_dir(self.full(normalized)).await?;
        let mut entries = Vec::new();
        while let Some(child) = dir.next_entry().await? {
            let meta = child.metadata().await?;
            entries.push(entry_from(child.file_name().to_string_lossy().into_owned(), &meta));
        }
        entries.sort_by(|a, b| a.name.as_bytes().cmp(b.name.as_bytes()));
        Ok(entries)
    }
}

impl std::fmt::Debug for LocalFilesystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalFilesystem")
            .field("root", &self.root)
            .field("visibility", &self.visibility)
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl Filesystem for LocalFilesystem {
    async fn exists(&self, path: &str) -> FsResult<bool> {
        let meta = self
            .stat(&path::normalize(path))
            .await
            .map_err(|e| FsError::from(e).at(Op::CheckExistence, path))?;
        Ok(meta.is_some())
    }

    async fn file_exists(&self, path: &str) -> FsResult<bool> {
        let meta = self
            .stat(&path::normalize(path))
            .await
            .map_err(|e| FsError::from(e).at(Op::CheckExistence, path))?;
        Ok(meta.is_some_and(|m| !m.is_dir()))
    }

    async fn dir_exists(&self, path: &str) -> FsResult<bool> {
        let meta = self
            .stat(&path::normalize(path))
            .await
            .map_err(|e| FsError::from(e).at(Op::CheckExistence, path))?;
        Ok(meta.is_some_and(|m| m.is_dir()))
    }

    async fn read(&self, path: &str) -> FsResult<Vec<u8>> {
        let (normalized, meta) = self.require(path, Op::Read).await?;
        if meta.is_dir() {
            return Err(FsError::NotAFile.at(Op::Read, path));
        }
        fs::read(self.full(&normalized))
            .await
            .map_err(|e| FsError::from(e).at(Op::Read, path))
    }

    async fn read_stream(&self, path: &str) -> FsResult<ByteStream> {
        let (normalized, meta) = self.require(path, Op::Read).await?;
        if meta.is_dir() {
            return Err(FsError::NotAFile.at(Op::Read, path));
        }
        let file = fs::File::open(self.full(&normalized))
            .await
            .map_err(|e| FsError::from(e).at(Op::Read, path))?;
        Ok(Box::new(file))
    }

    async fn read_dir(&self, path: &str) -> FsResult<Vec<Entry>> {
        let (normalized, meta) = self.require(path, Op::ReadDir).await?;
        if !meta.is_dir() {
            return Err(FsError::NotADirectory.at(Op::ReadDir, path));
        }
        self.list(&normalized)
            .await
            .map_err(|e| FsError::from(e).at(Op::ReadDir, path))
    }

    async fn walk(&self, path: &str, visit: &mut WalkFn<'_>) -> FsResult<()> {
        let start = path::normalize(path);
        let meta = match self.stat(&start).await {
            Ok(Some(meta)) => meta,
            Ok(None) => return Ok(()),
            Err(e) => return Err(FsError::from(e).at(Op::Walk, path)),
        };
        let name = path::split(&start).1.to_string();

        // children are pushed in reverse so they pop in name order
        let mut stack = vec![(start, entry_from(name, &meta))];
        while let Some((key, entry)) = stack.pop() {
            match visit(&key, &entry, None)? {
                WalkControl::SkipAll => return Ok(()),
                WalkControl::SkipDir => continue,
                WalkControl::Continue => {}
            }
            if !entry.is_dir() {
                continue;
            }
            match self.list(&key).await {
                Ok(children) => {
                    for child in children.into_iter().rev() {
                        stack.push((path::join(&key, &child.name), child));
                    }
                }
                Err(e) => {
                    let err = FsError::from(e).at(Op::Walk, key.as_str());
                    if visit(&key, &entry, Some(&err))? == WalkControl::SkipAll {
                        return Ok(());
                    }
                }
            }
        }
        Ok(())
    }

    async fn last_modified(&self, path: &str) -> FsResult<SystemTime> {
        let (_, meta) = self.require(path, Op::RetrieveMetadata).await?;
        meta.modified()
            .map_err(|e| FsError::from(e).at(Op::RetrieveMetadata, path))
    }

    async fn file_size(&self, path: &str) -> FsResult<u64> {
        let (_, meta) = self.require(path, Op::RetrieveMetadata).await?;
        Ok(if meta.is_dir() { 0 } else { meta.len() })
    }

    async fn mime_type(&self, path: &str) -> FsResult<String> {
        let (normalized, meta) = self.require(path, Op::RetrieveMetadata).await?;
        if meta.is_dir() {
            return Err(FsError::NotAFile.at(Op::RetrieveMetadata, path));
        }
        let mut sample = Vec::new();
        let file = fs::File::open(self.full(&normalized))
            .await
            .map_err(|e| FsError::from(e).at(Op::RetrieveMetadata, path))?;
        file.take(MIME_SAMPLE_LEN)
            .read_to_end(&mut sample)
            .await
            .map_err(|e| FsError::from(e).at(Op::RetrieveMetadata, path))?;
        Ok(self.mime.detect(&normalized, &sample))
    }

    async fn visibility(&self, path: &str) -> FsResult<String> {
        let (_, meta) = self.require(path, Op::RetrieveMetadata).await?;
        Ok(match (mode_of(&meta), meta.is_dir()) {
            (Some(mode), true) => self.visibility.inverse_for_dir(&mode),
            (Some(mode), false) => self.visibility.inverse_for_file(&mode),
            (None, true) => self.visibility.dir_default_visibility().to_string(),
            (None, false) => self.visibility.file_default_visibility().to_string(),
        })
    }

    async fn write(
        &self,
        path: &str,
        content: &[u8],
        config: Option<&WriteConfig>,
    ) -> FsResult<()> {
        let stream: ByteStream = Box::new(io::Cursor::new(content.to_vec()));
        self.write_stream(path, stream, config).await
    }

    async fn write_stream(
        &self,
        path: &str,
        mut stream: ByteStream,
        config: Option<&WriteConfig>,
    ) -> FsResult<()> {
        self.ensure_root().await?;
        let normalized = path::normalize(path);
        if path::is_root(&normalized) {
            return Ok(());
        }
        let target = self.full(&normalized);
        if fs::metadata(&target).await.is_ok_and(|m| m.is_dir()) {
            return Err(FsError::NotAFile.at(Op::Write, path));
        }

        let dir_mode = self
            .visibility
            .for_dir(types::dir_visibility(config, self.visibility.dir_default_visibility()));
        let file_mode = self
            .visibility
            .for_file(types::file_visibility(config, self.visibility.file_default_visibility()));
        let flag = types::write_flag(config, WriteFlag::CREATE | WriteFlag::TRUNCATE);

        if let Some(parent) = target.parent() {
            create_dirs(parent, dir_mode)
                .await
                .map_err(|e| FsError::from(e).at(Op::CreateDir, path::split(&normalized).0))?;
        }

        let append = flag.contains(WriteFlag::APPEND);
        let mut options = fs::OpenOptions::new();
        options
            .write(true)
            .create(flag.contains(WriteFlag::CREATE))
            .truncate(flag.contains(WriteFlag::TRUNCATE) && !append)
            .append(append);
        #[cfg(unix)]
        options.mode(file_mode);
        #[cfg(not(unix))]
        let _ = file_mode;

        let mut file = options
            .open(&target)
            .await
            .map_err(|e| FsError::from(e).at(Op::Write, path))?;
        tokio::io::copy(&mut stream, &mut file)
            .await
            .map_err(|e| FsError::from(e).at(Op::Write, path))?;
        file.flush()
            .await
            .map_err(|e| FsError::from(e).at(Op::Write, path))?;
        Ok(())
    }

    async fn set_visibility(&self, path: &str, visibility: &str) -> FsResult<()> {
        let (normalized, meta) = self.require(path, Op::SetVisibility).await?;
        let mode = if meta.is_dir() {
            self.visibility.for_dir(visibility)
        } else {
            self.visibility.for_file(visibility)
        };
        chmod(&self.full(&normalized), mode)
            .await
            .map_err(|e| FsError::from(e).at(Op::SetVisibility, path))
    }

    async fn delete(&self, path: &str) -> FsResult<()> {
        let normalized = path::normalize(path);
        let meta = match self.stat(&normalized).await {
            Ok(Some(meta)) => meta,
            Ok(None) => return Ok(()),
            Err(e) => return Err(FsError::from(e).at(Op::Delete, path)),
        };
        if meta.is_dir() {
            return Err(FsError::NotAFile.at(Op::Delete, path));
        }
        fs::remove_file(self.full(&normalized))
            .await
            .map_err(|e| FsError::from(e).at(Op::Delete, path))
    }

    async fn delete_dir(&self, path: &str) -> FsResult<()> {
        let normalized = path::normalize(path);
        let meta = match self.stat(&normalized).await {
            Ok(Some(meta)) => meta,
            Ok(None) => return Ok(()),
            Err(e) => return Err(FsError::from(e).at(Op::DeleteDir, path)),
        };
        if !meta.is_dir() {
            return Err(FsError::NotADirectory.at(Op::DeleteDir, path));
        }
        let target = self.full(&normalized);
        let removed = if path::is_root(&normalized) {
            clear_dir(&target).await
        } else {
            fs::remove_dir_all(&target).await
        };
        removed.map_err(|e| FsError::from(e).at(Op::DeleteDir, path))
    }

    async fn create_dir(&self, path: &str, config: Option<&WriteConfig>) -> FsResult<()> {
        self.ensure_root().await?;
        let normalized = path::normalize(path);
        match self.stat(&normalized).await {
            // an existing directory keeps its mode
            Ok(Some(meta)) if meta.is_dir() => return Ok(()),
            Ok(Some(_)) => return Err(FsError::AlreadyExists.at(Op::CreateDir, path)),
            Ok(None) => {}
            Err(e) => return Err(FsError::from(e).at(Op::CreateDir, path)),
        }
        let mode = self
            .visibility
            .for_dir(types::dir_visibility(config, self.visibility.dir_default_visibility()));
        let target = self.full(&normalized);
        create_dirs(&target, mode).await.map_err(|e| {
            let cause = match e.kind() {
                io::ErrorKind::NotADirectory | io::ErrorKind::AlreadyExists => {
                    FsError::AlreadyExists
                }
                _ => FsError::from(e),
            };
            cause.at(Op::CreateDir, path)
        })
    }

    async fn move_to(&self, src: &str, dst: &str, config: Option<&WriteConfig>) -> FsResult<()> {
        let src_key = path::normalize(src);
        let dst_key = path::normalize(dst);
        let fail = |e: FsError| e.between(Op::Move, src, dst);

        if self.stat(&src_key).await.map_err(|e| fail(e.into()))?.is_none() {
            return Err(fail(FsError::NotFound));
        }
        if self.stat(&dst_key).await.map_err(|e| fail(e.into()))?.is_some() {
            return Err(fail(FsError::AlreadyExists));
        }
        if path::is_root(&src_key) || path::is_within(&dst_key, &src_key) {
            return Err(fail(FsError::InvalidPath(
                "cannot move a directory into itself".into(),
            )));
        }

        let target = self.full(&dst_key);
        if let Some(parent) = target.parent() {
            let mode = self
                .visibility
                .for_dir(types::dir_visibility(config, self.visibility.dir_default_visibility()));
            create_dirs(parent, mode)
                .await
                .map_err(|e| fail(e.into()))?;
        }
        fs::rename(self.full(&src_key), &target)
            .await
            .map_err(|e| fail(e.into()))
    }

    async fn copy(&self, src: &str, dst: &str, config: Option<&WriteConfig>) -> FsResult<()> {
        let src_key = path::normalize(src);
        let dst_key = path::normalize(dst);
        let fail = |e: FsError| e.between(Op::Copy, src, dst);
        let src_meta = self
            .stat(&src_key)
            .await
            .map_err(|e| fail(e.into()))?
            .ok_or_else(|| fail(FsError::NotFound))?;
        if src_meta.is_dir() {
            return Err(fail(FsError::NotAFile));
        }

        let flag = types::write_flag(config, WriteFlag::empty());
        if let Some(existing) = self.stat(&dst_key).await.map_err(|e| fail(e.into()))? {
            if !flag.contains(WriteFlag::TRUNCATE) {
                return Err(fail(FsError::AlreadyExists));
            }
            if existing.is_dir() {
                return Err(fail(FsError::NotAFile));
            }
        }

        let file_mode = self
            .visibility
            .for_file(types::file_visibility(config, self.visibility.file_default_visibility()));
        if src_key == dst_key {
            // truncating the destination would empty the source; the content
            // already matches, only the mode follows the config
            return chmod(&self.full(&dst_key), file_mode)
                .await
                .map_err(|e| fail(e.into()));
        }

        // same semantics as the memory backend: always a full replacement
        let write_config = WriteConfig {
            write_flag: Some(WriteFlag::CREATE | WriteFlag::TRUNCATE),
            ..config.cloned().unwrap_or_default()
        };
        let stream = self.read_stream(src).await.map_err(fail)?;
        self.write_stream(dst, stream, Some(&write_config))
            .await
            .map_err(fail)
    }
}
