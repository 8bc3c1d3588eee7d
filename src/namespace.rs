//! Client seam for the remote hierarchical namespace.
//!
//! The synchronization engine only talks to the remote side through
//! [`RemoteNamespace`]. Implementations are connected (and authenticated)
//! before the engine sees them, and every call blocks until the service
//! answers.

#[cfg(test)]
pub mod memory;
pub mod zk;

use crate::config::AclPolicy;

/// Per-node bookkeeping returned by the service alongside reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NodeStat {
    /// Data version, bumped by every successful write of the payload.
    pub version: i32,
    pub num_children: i32,
    pub data_length: i32,
    /// Last modification of the payload, in milliseconds since the Unix epoch.
    pub mtime_millis: i64,
}

impl NodeStat {
    pub fn has_children(&self) -> bool {
        self.num_children > 0
    }

    pub fn has_payload(&self) -> bool {
        self.data_length > 0
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NamespaceError {
    #[error("node does not exist")]
    NoNode,
    #[error("node already exists")]
    NodeExists,
    #[error("node version does not match the expected version")]
    BadVersion,
    #[error("node has children")]
    NotEmpty,
    #[error("{0}")]
    Service(String),
}

pub trait RemoteNamespace {
    /// Names of the direct children of `path` together with its stat.
    fn get_children(&self, path: &str) -> Result<(Vec<String>, NodeStat), NamespaceError>;

    fn get_node(&self, path: &str) -> Result<(Vec<u8>, NodeStat), NamespaceError>;

    /// Creates a persistent node. The parent must already exist.
    fn create_node(
        &self,
        path: &str,
        payload: &[u8],
        acl: AclPolicy,
    ) -> Result<(), NamespaceError>;

    /// Replaces the payload if the node is still at `expected_version`.
    fn set_node(
        &self,
        path: &str,
        payload: &[u8],
        expected_version: i32,
    ) -> Result<NodeStat, NamespaceError>;

    /// Deletes a childless node if it is still at `expected_version`.
    fn delete_node(&self, path: &str, expected_version: i32) -> Result<(), NamespaceError>;

    fn exists(&self, path: &str) -> Result<Option<NodeStat>, NamespaceError>;
}
