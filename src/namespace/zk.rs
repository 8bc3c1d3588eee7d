//! [`RemoteNamespace`] backed by a live ZooKeeper session.

use super::{NamespaceError, NodeStat, RemoteNamespace};
use crate::config::{AclPolicy, Settings};
use tracing::{debug, info};
use zookeeper::{Acl, CreateMode, Stat, WatchedEvent, Watcher, ZkError, ZooKeeper};

const DIGEST_SCHEME: &str = "digest";

impl From<ZkError> for NamespaceError {
    fn from(e: ZkError) -> Self {
        match e {
            ZkError::NoNode => NamespaceError::NoNode,
            ZkError::NodeExists => NamespaceError::NodeExists,
            ZkError::BadVersion => NamespaceError::BadVersion,
            ZkError::NotEmpty => NamespaceError::NotEmpty,
            other => NamespaceError::Service(format!("ZooKeeper error: {other:?}")),
        }
    }
}

impl From<Stat> for NodeStat {
    fn from(stat: Stat) -> Self {
        NodeStat {
            version: stat.version,
            num_children: stat.num_children,
            data_length: stat.data_length,
            mtime_millis: stat.mtime,
        }
    }
}

/// Session events are only logged; the engine never sets watches.
struct SessionLogger;

impl Watcher for SessionLogger {
    fn handle(&self, event: WatchedEvent) {
        debug!("ZooKeeper session event: {:?}", event);
    }
}

pub struct ZkNamespace {
    zk: ZooKeeper,
}

impl ZkNamespace {
    /// Opens a session against the configured ensemble and adds digest
    /// credentials when present.
    pub fn connect(settings: &Settings) -> Result<Self, NamespaceError> {
        let connect_string = settings.servers.join(",");
        info!("Connecting to {}", connect_string);

        let zk = ZooKeeper::connect(&connect_string, settings.timeout, SessionLogger)?;

        if let Some(auth) = &settings.auth {
            zk.add_auth(DIGEST_SCHEME, auth.as_bytes().to_vec())?;
            debug!("Added {} credentials to the session", DIGEST_SCHEME);
        }

        Ok(ZkNamespace { zk })
    }

    pub fn close(self) -> Result<(), NamespaceError> {
        self.zk.close()?;
        Ok(())
    }
}

fn acl_list(acl: AclPolicy) -> Vec<Acl> {
    match acl {
        AclPolicy::CreatorAll => Acl::creator_all().clone(),
        AclPolicy::Open => Acl::open_unsafe().clone(),
    }
}

impl RemoteNamespace for ZkNamespace {
    fn get_children(&self, path: &str) -> Result<(Vec<String>, NodeStat), NamespaceError> {
        // Stat first: a write landing between the two calls then makes a
        // later versioned delete fail instead of matching a newer version.
        let stat = self.zk.exists(path, false)?.ok_or(NamespaceError::NoNode)?;
        let children = self.zk.get_children(path, false)?;
        Ok((children, stat.into()))
    }

    fn get_node(&self, path: &str) -> Result<(Vec<u8>, NodeStat), NamespaceError> {
        let (payload, stat) = self.zk.get_data(path, false)?;
        Ok((payload, stat.into()))
    }

    fn create_node(
        &self,
        path: &str,
        payload: &[u8],
        acl: AclPolicy,
    ) -> Result<(), NamespaceError> {
        self.zk.create(
            path,
            payload.to_vec(),
            acl_list(acl),
            CreateMode::Persistent,
        )?;
        Ok(())
    }

    fn set_node(
        &self,
        path: &str,
        payload: &[u8],
        expected_version: i32,
    ) -> Result<NodeStat, NamespaceError> {
        let stat = self
            .zk
            .set_data(path, payload.to_vec(), Some(expected_version))?;
        Ok(stat.into())
    }

    fn delete_node(&self, path: &str, expected_version: i32) -> Result<(), NamespaceError> {
        self.zk.delete(path, Some(expected_version))?;
        Ok(())
    }

    fn exists(&self, path: &str) -> Result<Option<NodeStat>, NamespaceError> {
        Ok(self.zk.exists(path, false)?.map(NodeStat::from))
    }
}
