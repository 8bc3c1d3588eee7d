//! In-process namespace with the same existence, version and not-empty rules
//! as the real service. Every mutating call is journaled so tests can assert
//! on the exact sequence of remote writes.

use super::{NamespaceError, NodeStat, RemoteNamespace};
use crate::config::AclPolicy;
use crate::path_map::{REMOTE_ROOT, join_remote, remote_parent};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Write {
    Create(String),
    Set(String),
    Delete(String),
}

#[derive(Debug, Clone)]
struct Node {
    payload: Vec<u8>,
    version: i32,
    mtime_millis: i64,
}

pub struct MemoryNamespace {
    nodes: RefCell<BTreeMap<String, Node>>,
    journal: RefCell<Vec<Write>>,
    clock_millis: Cell<i64>,
}

impl MemoryNamespace {
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(
            REMOTE_ROOT.to_string(),
            Node {
                payload: Vec::new(),
                version: 0,
                mtime_millis: 0,
            },
        );
        MemoryNamespace {
            nodes: RefCell::new(nodes),
            journal: RefCell::new(Vec::new()),
            clock_millis: Cell::new(1_700_000_000_000),
        }
    }

    /// Sets the timestamp stamped onto subsequent writes.
    pub fn set_clock(&self, millis: i64) {
        self.clock_millis.set(millis);
    }

    pub fn writes(&self) -> Vec<Write> {
        self.journal.borrow().clone()
    }

    pub fn clear_writes(&self) {
        self.journal.borrow_mut().clear();
    }

    pub fn payload(&self, path: &str) -> Option<Vec<u8>> {
        self.nodes.borrow().get(path).map(|n| n.payload.clone())
    }

    pub fn paths(&self) -> Vec<String> {
        self.nodes.borrow().keys().cloned().collect()
    }

    /// Creates a node (and any missing ancestors) without journaling it.
    pub fn seed(&self, path: &str, payload: &[u8]) {
        let parent = remote_parent(path);
        if parent != path && !self.nodes.borrow().contains_key(parent) {
            self.seed(parent, &[]);
        }
        self.nodes.borrow_mut().insert(
            path.to_string(),
            Node {
                payload: payload.to_vec(),
                version: 0,
                mtime_millis: self.clock_millis.get(),
            },
        );
    }

    /// Overwrites a node's payload the way a concurrent writer would.
    pub fn touch(&self, path: &str, payload: &[u8]) {
        let mut nodes = self.nodes.borrow_mut();
        if let Some(node) = nodes.get_mut(path) {
            node.payload = payload.to_vec();
            node.version += 1;
            node.mtime_millis = self.clock_millis.get();
        }
    }

    /// Removes a node the way a concurrent deleter would.
    pub fn vanish(&self, path: &str) {
        self.nodes.borrow_mut().remove(path);
    }

    fn children_of(nodes: &BTreeMap<String, Node>, path: &str) -> Vec<String> {
        let prefix = join_remote(path, "");
        nodes
            .keys()
            .filter(|k| k.as_str() != REMOTE_ROOT)
            .filter_map(|k| k.strip_prefix(prefix.as_str()))
            .filter(|rest| !rest.is_empty() && !rest.contains('/'))
            .map(str::to_string)
            .collect()
    }

    fn stat(nodes: &BTreeMap<String, Node>, path: &str) -> Option<NodeStat> {
        nodes.get(path).map(|node| NodeStat {
            version: node.version,
            num_children: Self::children_of(nodes, path).len() as i32,
            data_length: node.payload.len() as i32,
            mtime_millis: node.mtime_millis,
        })
    }
}

impl RemoteNamespace for MemoryNamespace {
    fn get_children(&self, path: &str) -> Result<(Vec<String>, NodeStat), NamespaceError> {
        let nodes = self.nodes.borrow();
        let stat = Self::stat(&nodes, path).ok_or(NamespaceError::NoNode)?;
        Ok((Self::children_of(&nodes, path), stat))
    }

    fn get_node(&self, path: &str) -> Result<(Vec<u8>, NodeStat), NamespaceError> {
        let nodes = self.nodes.borrow();
        let stat = Self::stat(&nodes, path).ok_or(NamespaceError::NoNode)?;
        Ok((nodes[path].payload.clone(), stat))
    }

    fn create_node(
        &self,
        path: &str,
        payload: &[u8],
        _acl: AclPolicy,
    ) -> Result<(), NamespaceError> {
        let mut nodes = self.nodes.borrow_mut();
        if nodes.contains_key(path) {
            return Err(NamespaceError::NodeExists);
        }
        if !nodes.contains_key(remote_parent(path)) {
            return Err(NamespaceError::NoNode);
        }
        nodes.insert(
            path.to_string(),
            Node {
                payload: payload.to_vec(),
                version: 0,
                mtime_millis: self.clock_millis.get(),
            },
        );
        self.journal.borrow_mut().push(Write::Create(path.to_string()));
        Ok(())
    }

    fn set_node(
        &self,
        path: &str,
        payload: &[u8],
        expected_version: i32,
    ) -> Result<NodeStat, NamespaceError> {
        let mut nodes = self.nodes.borrow_mut();
        let node = nodes.get_mut(path).ok_or(NamespaceError::NoNode)?;
        if node.version != expected_version {
            return Err(NamespaceError::BadVersion);
        }
        node.payload = payload.to_vec();
        node.version += 1;
        node.mtime_millis = self.clock_millis.get();
        self.journal.borrow_mut().push(Write::Set(path.to_string()));
        Self::stat(&nodes, path).ok_or(NamespaceError::NoNode)
    }

    fn delete_node(&self, path: &str, expected_version: i32) -> Result<(), NamespaceError> {
        let mut nodes = self.nodes.borrow_mut();
        let node = nodes.get(path).ok_or(NamespaceError::NoNode)?;
        if node.version != expected_version {
            return Err(NamespaceError::BadVersion);
        }
        if !Self::children_of(&nodes, path).is_empty() {
            return Err(NamespaceError::NotEmpty);
        }
        nodes.remove(path);
        self.journal.borrow_mut().push(Write::Delete(path.to_string()));
        Ok(())
    }

    fn exists(&self, path: &str) -> Result<Option<NodeStat>, NamespaceError> {
        Ok(Self::stat(&self.nodes.borrow(), path))
    }
}
