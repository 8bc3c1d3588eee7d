use super::SyncError;
use crate::namespace::{NamespaceError, NodeStat, RemoteNamespace};
use crate::path_map::{REMOTE_ROOT, join_remote, normalize_remote};
use tracing::{info, warn};

#[derive(Debug, Default, PartialEq, Eq)]
pub struct DeleteResult {
    /// False when the subtree root did not exist; nothing was deleted.
    pub root_found: bool,
    pub nodes_deleted: usize,
}

/// Recursively deletes `remote_root` and everything below it.
///
/// Children are always deleted before their parent. Each node is deleted
/// against the version read when it was listed, so a concurrent write to a
/// node between listing and deletion fails the run with a version conflict.
/// A missing subtree root is reported and is not an error; a node that
/// disappears mid-walk is.
pub fn delete_tree(ns: &dyn RemoteNamespace, remote_root: &str) -> Result<DeleteResult, SyncError> {
    let root = normalize_remote(remote_root)?;
    if root == REMOTE_ROOT {
        return Err(SyncError::RootDeletion);
    }

    let mut result = DeleteResult::default();

    let (children, stat) = match ns.get_children(&root) {
        Ok(listing) => listing,
        Err(NamespaceError::NoNode) => {
            warn!("Remote path {} not found, nothing to delete", root);
            return Ok(result);
        }
        Err(e) => return Err(SyncError::remote(&root, e)),
    };
    result.root_found = true;

    delete_node(ns, &root, children, stat, &mut result)?;

    info!("Deleted {} nodes under {}", result.nodes_deleted, root);
    Ok(result)
}

fn delete_node(
    ns: &dyn RemoteNamespace,
    path: &str,
    mut children: Vec<String>,
    stat: NodeStat,
    result: &mut DeleteResult,
) -> Result<(), SyncError> {
    children.sort();

    for child in children {
        let child_path = join_remote(path, &child);
        let (grandchildren, child_stat) = ns
            .get_children(&child_path)
            .map_err(|e| SyncError::remote(&child_path, e))?;
        delete_node(ns, &child_path, grandchildren, child_stat, result)?;
    }

    info!("Deleting {}", path);
    ns.delete_node(path, stat.version)
        .map_err(|e| SyncError::remote(path, e))?;
    result.nodes_deleted += 1;

    Ok(())
}
