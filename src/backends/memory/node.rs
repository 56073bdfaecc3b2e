//! Internal node representation for the in-memory filesystem.
//!
//! Every node carries its own lock. No method here holds more than one
//! node's lock at a time, so callers can combine them without lock ordering.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};
use std::time::SystemTime;

use crate::types::{Entry, FileType};

#[derive(Debug)]
pub(super) enum NodeKind {
    File { data: Vec<u8> },
    // BTreeMap keeps children ordered by name bytes
    Dir { children: BTreeMap<String, Arc<Node>> },
}

#[derive(Debug)]
pub(super) struct NodeState {
    pub name: String,
    pub visibility: String,
    pub mtime: SystemTime,
    /// Set on attach, cleared on detach. Never owns the parent.
    pub parent: Weak<Node>,
    pub kind: NodeKind,
}

/// Internal filesystem node - either a file or directory
#[derive(Debug)]
pub(super) struct Node {
    state: RwLock<NodeState>,
}

impl Node {
    fn with_kind(name: &str, visibility: &str, kind: NodeKind) -> Arc<Self> {
        Arc::new(Node {
            state: RwLock::new(NodeState {
                name: name.to_string(),
                visibility: visibility.to_string(),
                mtime: SystemTime::now(),
                parent: Weak::new(),
                kind,
            }),
        })
    }

    /// Create a new empty file
    pub fn new_file(name: &str, visibility: &str) -> Arc<Self> {
        Self::with_kind(name, visibility, NodeKind::File { data: Vec::new() })
    }

    /// Create a new directory
    pub fn new_dir(name: &str, visibility: &str) -> Arc<Self> {
        Self::with_kind(
            name,
            visibility,
            NodeKind::Dir {
                children: BTreeMap::new(),
            },
        )
    }

    /// A detached file holding a copy of `data` with the given mtime.
    pub fn file_from(name: &str, visibility: &str, data: Vec<u8>, mtime: SystemTime) -> Arc<Self> {
        let node = Self::with_kind(name, visibility, NodeKind::File { data });
        node.write().mtime = mtime;
        node
    }

    pub fn read(&self) -> RwLockReadGuard<'_, NodeState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, NodeState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_dir(&self) -> bool {
        matches!(self.read().kind, NodeKind::Dir { .. })
    }

    pub fn entry(&self) -> Entry {
        let state = self.read();
        let (file_type, size) = match &state.kind {
            NodeKind::File { data } => (FileType::File, data.len() as u64),
            NodeKind::Dir { .. } => (FileType::Dir, 0),
        };
        Entry {
            name: state.name.clone(),
            file_type,
            size,
            modified: state.mtime,
        }
    }

    /// Snapshot of the file content; `None` for directories.
    pub fn content(&self) -> Option<(Vec<u8>, SystemTime)> {
        let state = self.read();
        match &state.kind {
            NodeKind::File { data } => Some((data.clone(), state.mtime)),
            NodeKind::Dir { .. } => None,
        }
    }

    pub fn child(&self, name: &str) -> Option<Arc<Node>> {
        match &self.read().kind {
            NodeKind::Dir { children } => children.get(name).cloned(),
            NodeKind::File { .. } => None,
        }
    }

    /// Children in name order; `None` if this is a file.
    pub fn children(&self) -> Option<Vec<Arc<Node>>> {
        match &self.read().kind {
            NodeKind::Dir { children } => Some(children.values().cloned().collect()),
            NodeKind::File { .. } => None,
        }
    }

    /// Look up `name`, inserting `make()` under the write lock if it is absent.
    /// `None` if this node is a file.
    pub fn child_or_insert_with(
        self: &Arc<Self>,
        name: &str,
        make: impl FnOnce() -> Arc<Node>,
    ) -> Option<Arc<Node>> {
        if let Some(existing) = self.child(name) {
            return Some(existing);
        }
        let node = make();
        {
            let mut child = node.write();
            child.name = name.to_string();
            child.parent = Arc::downgrade(self);
        }
        let mut state = self.write();
        let NodeKind::Dir { children } = &mut state.kind else {
            return None;
        };
        // another writer may have inserted it since the read above
        Some(
            children
                .entry(name.to_string())
                .or_insert_with(|| node)
                .clone(),
        )
    }

    /// Attach `node` under `name`, replacing whatever was there.
    pub fn attach(self: &Arc<Self>, name: &str, node: Arc<Node>) -> bool {
        {
            let mut child = node.write();
            child.name = name.to_string();
            child.parent = Arc::downgrade(self);
        }
        let mut state = self.write();
        match &mut state.kind {
            NodeKind::Dir { children } => {
                children.insert(name.to_string(), node);
                true
            }
            NodeKind::File { .. } => false,
        }
    }

    /// Remove `self` from its parent. A no-op if the parent entry has
    /// meanwhile been replaced by another node.
    pub fn detach(self: &Arc<Self>) {
        let (name, parent) = {
            let mut state = self.write();
            let parent = std::mem::take(&mut state.parent);
            (state.name.clone(), parent)
        };
        let Some(parent) = parent.upgrade() else {
            return;
        };
        let mut state = parent.write();
        if let NodeKind::Dir { children } = &mut state.kind {
            if children.get(&name).is_some_and(|n| Arc::ptr_eq(n, self)) {
                children.remove(&name);
            }
        }
    }

    pub fn clear_children(&self) {
        let detached = {
            let mut state = self.write();
            match &mut state.kind {
                NodeKind::Dir { children } => std::mem::take(children),
                NodeKind::File { .. } => return,
            }
        };
        for child in detached.values() {
            child.write().parent = Weak::new();
        }
    }

    /// Replace or append file content. `false` if this is a directory.
    pub fn write_content(&self, content: &[u8], append: bool) -> bool {
        let mut state = self.write();
        match &mut state.kind {
            NodeKind::File { data } => {
                if append {
                    data.extend_from_slice(content);
                } else {
                    data.clear();
                    data.extend_from_slice(content);
                }
                state.mtime = SystemTime::now();
                true
            }
            NodeKind::Dir { .. } => false,
        }
    }

    pub fn visibility(&self) -> String {
        self.read().visibility.clone()
    }

    pub fn set_visibility(&self, visibility: &str) {
        self.write().visibility = visibility.to_string();
    }
}
