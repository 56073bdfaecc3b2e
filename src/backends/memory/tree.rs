//! The synchronous tree engine behind [`super::MemoryFilesystem`].
//!
//! Locks are taken per node and only for a single node's mutation, so
//! multi-node operations (mkdir-all, move, copy) are not atomic: a concurrent
//! reader may see a half-created ancestor chain, and two moves racing onto
//! the same name resolve as last-attach-wins. Callers needing cross-operation
//! atomicity must serialize externally.

use std::sync::Arc;

use tracing::trace;

use super::node::Node;
use crate::error::{FsError, FsResult, Op};
use crate::path;
use crate::types::{self, Entry, WalkControl, WalkFn, WriteConfig, WriteFlag};

#[derive(Debug)]
pub struct MemoryTree {
    root: Arc<Node>,
    visibility: String,
}

enum Flow {
    Continue,
    Stop,
}

impl MemoryTree {
    pub fn new(visibility: impl Into<String>) -> Self {
        let visibility = visibility.into();
        Self {
            root: Node::new_dir("", &visibility),
            visibility,
        }
    }

    /// Visibility applied when a write config leaves it unset.
    pub fn default_visibility(&self) -> &str {
        &self.visibility
    }

    fn lookup(&self, normalized: &str) -> Option<Arc<Node>> {
        let mut current = self.root.clone();
        for seg in path::segments(normalized) {
            current = current.child(seg)?;
        }
        Some(current)
    }

    fn resolve(&self, path: &str, op: Op) -> FsResult<Arc<Node>> {
        self.lookup(&path::normalize(path))
            .ok_or_else(|| FsError::NotFound.at(op, path))
    }

    /// Create every missing directory along `normalized`, returning the last.
    fn mkdir_all(&self, normalized: &str, visibility: &str) -> FsResult<Arc<Node>> {
        let mut current = self.root.clone();
        for seg in path::segments(normalized) {
            let next = current
                .child_or_insert_with(seg, || Node::new_dir(seg, visibility))
                .ok_or_else(|| FsError::AlreadyExists.at(Op::CreateDir, normalized))?;
            if !next.is_dir() {
                return Err(FsError::AlreadyExists.at(Op::CreateDir, normalized));
            }
            current = next;
        }
        Ok(current)
    }

    pub fn exists(&self, path: &str) -> bool {
        self.lookup(&path::normalize(path)).is_some()
    }

    pub fn file_exists(&self, path: &str) -> bool {
        self.lookup(&path::normalize(path))
            .is_some_and(|n| !n.is_dir())
    }

    pub fn dir_exists(&self, path: &str) -> bool {
        self.lookup(&path::normalize(path))
            .is_some_and(|n| n.is_dir())
    }

    pub fn read(&self, path: &str) -> FsResult<Vec<u8>> {
        let node = self.resolve(path, Op::Read)?;
        node.content()
            .map(|(data, _)| data)
            .ok_or_else(|| FsError::NotAFile.at(Op::Read, path))
    }

    pub fn read_dir(&self, path: &str) -> FsResult<Vec<Entry>> {
        let node = self.resolve(path, Op::ReadDir)?;
        let children = node
            .children()
            .ok_or_else(|| FsError::NotADirectory.at(Op::ReadDir, path))?;
        Ok(children.iter().map(|c| c.entry()).collect())
    }

    pub fn metadata(&self, path: &str) -> FsResult<Entry> {
        self.resolve(path, Op::RetrieveMetadata).map(|n| n.entry())
    }

    pub fn visibility(&self, path: &str) -> FsResult<String> {
        self.resolve(path, Op::RetrieveMetadata)
            .map(|n| n.visibility())
    }

    /// Paths handed to `visit` are normalized, the start included.
    pub fn walk(&self, start: &str, visit: &mut WalkFn<'_>) -> FsResult<()> {
        let normalized = path::normalize(start);
        let Some(node) = self.lookup(&normalized) else {
            return Ok(());
        };
        self.walk_node(&normalized, &node, visit)?;
        Ok(())
    }

    fn walk_node(&self, path: &str, node: &Arc<Node>, visit: &mut WalkFn<'_>) -> FsResult<Flow> {
        let entry = node.entry();
        match visit(path, &entry, None)? {
            WalkControl::SkipAll => return Ok(Flow::Stop),
            WalkControl::SkipDir => return Ok(Flow::Continue),
            WalkControl::Continue => {}
        }
        if !entry.is_dir() {
            return Ok(Flow::Continue);
        }
        let children = match node.children() {
            Some(children) => children,
            None => {
                // replaced by a file between the two reads
                let err = FsError::NotADirectory.at(Op::Walk, path);
                return match visit(path, &entry, Some(&err))? {
                    WalkControl::SkipAll => Ok(Flow::Stop),
                    _ => Ok(Flow::Continue),
                };
            }
        };
        for child in children {
            let child_path = path::join(path, &child.entry().name);
            if let Flow::Stop = self.walk_node(&child_path, &child, visit)? {
                return Ok(Flow::Stop);
            }
        }
        Ok(Flow::Continue)
    }

    /// Write `content`, creating the file and any missing ancestors.
    /// Writing to the root is a no-op.
    pub fn write(&self, path: &str, content: &[u8], config: Option<&WriteConfig>) -> FsResult<()> {
        let normalized = path::normalize(path);
        if path::is_root(&normalized) {
            return Ok(());
        }
        let dir_visibility = types::dir_visibility(config, &self.visibility);
        let file_visibility = types::file_visibility(config, &self.visibility);
        let flag = types::write_flag(config, WriteFlag::CREATE | WriteFlag::TRUNCATE);

        let (parent, name) = path::split(&normalized);
        let dir = self
            .mkdir_all(parent, dir_visibility)
            .map_err(|e| e.at(Op::Write, path))?;
        let file = dir
            .child_or_insert_with(name, || Node::new_file(name, file_visibility))
            .ok_or_else(|| FsError::NotADirectory.at(Op::Write, path))?;
        if !file.write_content(content, flag.contains(WriteFlag::APPEND)) {
            return Err(FsError::NotAFile.at(Op::Write, path));
        }
        trace!(path = %normalized, len = content.len(), "memory write");
        Ok(())
    }

    pub fn set_visibility(&self, path: &str, visibility: &str) -> FsResult<()> {
        self.resolve(path, Op::SetVisibility)?
            .set_visibility(visibility);
        Ok(())
    }

    /// Remove a file. Missing paths succeed.
    pub fn delete(&self, path: &str) -> FsResult<()> {
        let Some(node) = self.lookup(&path::normalize(path)) else {
            return Ok(());
        };
        if node.is_dir() {
            return Err(FsError::NotAFile.at(Op::Delete, path));
        }
        node.detach();
        trace!(path, "memory delete");
        Ok(())
    }

    /// Remove a directory and everything below it. Missing paths succeed;
    /// the root is emptied rather than removed.
    pub fn delete_dir(&self, path: &str) -> FsResult<()> {
        let normalized = path::normalize(path);
        let Some(node) = self.lookup(&normalized) else {
            return Ok(());
        };
        if !node.is_dir() {
            return Err(FsError::NotADirectory.at(Op::DeleteDir, path));
        }
        if path::is_root(&normalized) {
            self.clear();
        } else {
            node.detach();
        }
        trace!(path, "memory delete_dir");
        Ok(())
    }

    pub fn create_dir(&self, path: &str, config: Option<&WriteConfig>) -> FsResult<()> {
        let visibility = types::dir_visibility(config, &self.visibility);
        self.mkdir_all(&path::normalize(path), visibility)?;
        Ok(())
    }

    /// Move a file or directory. The destination must not exist.
    pub fn move_to(&self, src: &str, dst: &str, config: Option<&WriteConfig>) -> FsResult<()> {
        let src_key = path::normalize(src);
        let dst_key = path::normalize(dst);
        let fail = |e: FsError| e.between(Op::Move, src, dst);

        let node = self.lookup(&src_key).ok_or_else(|| fail(FsError::NotFound))?;
        if self.lookup(&dst_key).is_some() {
            return Err(fail(FsError::AlreadyExists));
        }
        if path::is_root(&src_key) {
            return Err(fail(FsError::InvalidPath("cannot move the root".into())));
        }
        if path::is_within(&dst_key, &src_key) {
            return Err(fail(FsError::InvalidPath(
                "destination is inside the source".into(),
            )));
        }

        let (parent, name) = path::split(&dst_key);
        let dir_visibility = types::dir_visibility(config, &self.visibility);
        let dir = self.mkdir_all(parent, dir_visibility).map_err(fail)?;
        node.detach();
        if !dir.attach(name, node) {
            return Err(fail(FsError::NotADirectory));
        }
        trace!(src = %src_key, dst = %dst_key, "memory move");
        Ok(())
    }

    /// Copy a file into a fresh node. Never appends: with `TRUNCATE` an
    /// existing destination is replaced, otherwise it is an error.
    pub fn copy(&self, src: &str, dst: &str, config: Option<&WriteConfig>) -> FsResult<()> {
        let dst_key = path::normalize(dst);
        let fail = |e: FsError| e.between(Op::Copy, src, dst);

        let node = self
            .lookup(&path::normalize(src))
            .ok_or_else(|| fail(FsError::NotFound))?;
        let (data, mtime) = node.content().ok_or_else(|| fail(FsError::NotAFile))?;

        let flag = types::write_flag(config, WriteFlag::empty());
        if let Some(existing) = self.lookup(&dst_key) {
            if !flag.contains(WriteFlag::TRUNCATE) {
                return Err(fail(FsError::AlreadyExists));
            }
            if existing.is_dir() {
                return Err(fail(FsError::NotAFile));
            }
        }

        let (parent, name) = path::split(&dst_key);
        let dir_visibility = types::dir_visibility(config, &self.visibility);
        let file_visibility = types::file_visibility(config, &self.visibility);
        let dir = self.mkdir_all(parent, dir_visibility).map_err(fail)?;
        if !dir.attach(name, Node::file_from(name, file_visibility, data, mtime)) {
            return Err(fail(FsError::NotADirectory));
        }
        trace!(src, dst = %dst_key, "memory copy");
        Ok(())
    }

    /// Drop every node below the root.
    pub fn clear(&self) {
        self.root.clear_children();
    }
}
