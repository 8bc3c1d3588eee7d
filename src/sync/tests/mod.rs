use super::*;
use crate::config::{AclPolicy, NodePolicy};
use crate::namespace::memory::{MemoryNamespace, Write};
use crate::namespace::{NodeStat, RemoteNamespace};
use filetime::FileTime;
use std::cell::Cell;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn policy() -> NodePolicy {
    NodePolicy {
        acl: AclPolicy::Open,
        ..Default::default()
    }
}

fn upload_options(delete_first: bool) -> UploadOptions {
    UploadOptions {
        delete_first,
        policy: policy(),
    }
}

fn set_mtime_millis(path: &Path, millis: i64) {
    let time = FileTime::from_unix_time(millis / 1000, ((millis % 1000) * 1_000_000) as u32);
    filetime::set_file_mtime(path, time).unwrap();
}

fn mtime_millis(path: &Path) -> i64 {
    let time = FileTime::from_last_modification_time(&fs::metadata(path).unwrap());
    time.unix_seconds() * 1000 + i64::from(time.nanoseconds() / 1_000_000)
}

/// A namespace where another writer modifies `path` right before this run
/// issues its own versioned write or delete on it.
struct RacingNamespace {
    inner: MemoryNamespace,
    path: String,
    fired: Cell<bool>,
}

impl RacingNamespace {
    fn new(inner: MemoryNamespace, path: &str) -> Self {
        RacingNamespace {
            inner,
            path: path.to_string(),
            fired: Cell::new(false),
        }
    }

    fn race(&self, path: &str) {
        if path == self.path && !self.fired.replace(true) {
            self.inner.touch(path, b"written by someone else");
        }
    }
}

impl RemoteNamespace for RacingNamespace {
    fn get_children(&self, path: &str) -> Result<(Vec<String>, NodeStat), NamespaceError> {
        self.inner.get_children(path)
    }

    fn get_node(&self, path: &str) -> Result<(Vec<u8>, NodeStat), NamespaceError> {
        self.inner.get_node(path)
    }

    fn create_node(
        &self,
        path: &str,
        payload: &[u8],
        acl: AclPolicy,
    ) -> Result<(), NamespaceError> {
        self.inner.create_node(path, payload, acl)
    }

    fn set_node(
        &self,
        path: &str,
        payload: &[u8],
        expected_version: i32,
    ) -> Result<NodeStat, NamespaceError> {
        self.race(path);
        self.inner.set_node(path, payload, expected_version)
    }

    fn delete_node(&self, path: &str, expected_version: i32) -> Result<(), NamespaceError> {
        self.race(path);
        self.inner.delete_node(path, expected_version)
    }

    fn exists(&self, path: &str) -> Result<Option<NodeStat>, NamespaceError> {
        self.inner.exists(path)
    }
}

/// A namespace where another client deletes `path` after its parent was
/// listed but before this run reads the node itself.
struct VanishingNamespace {
    inner: MemoryNamespace,
    path: String,
}

impl VanishingNamespace {
    fn new(inner: MemoryNamespace, path: &str) -> Self {
        VanishingNamespace {
            inner,
            path: path.to_string(),
        }
    }

    fn vanish(&self, path: &str) {
        if path == self.path {
            self.inner.vanish(path);
        }
    }
}

impl RemoteNamespace for VanishingNamespace {
    fn get_children(&self, path: &str) -> Result<(Vec<String>, NodeStat), NamespaceError> {
        self.vanish(path);
        self.inner.get_children(path)
    }

    fn get_node(&self, path: &str) -> Result<(Vec<u8>, NodeStat), NamespaceError> {
        self.vanish(path);
        self.inner.get_node(path)
    }

    fn create_node(
        &self,
        path: &str,
        payload: &[u8],
        acl: AclPolicy,
    ) -> Result<(), NamespaceError> {
        self.inner.create_node(path, payload, acl)
    }

    fn set_node(
        &self,
        path: &str,
        payload: &[u8],
        expected_version: i32,
    ) -> Result<NodeStat, NamespaceError> {
        self.inner.set_node(path, payload, expected_version)
    }

    fn delete_node(&self, path: &str, expected_version: i32) -> Result<(), NamespaceError> {
        self.inner.delete_node(path, expected_version)
    }

    fn exists(&self, path: &str) -> Result<Option<NodeStat>, NamespaceError> {
        self.inner.exists(path)
    }
}
