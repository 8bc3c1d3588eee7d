use super::SyncError;
use crate::config::AclPolicy;
use crate::namespace::{NamespaceError, RemoteNamespace};
use crate::path_map::{REMOTE_ROOT, remote_parent};
use tracing::{debug, info};

/// Makes sure `path` and every ancestor exist, creating missing ones as
/// empty-payload directory nodes from the root down.
///
/// The namespace root always exists. A node that already exists is fine,
/// whether it was there before or another writer created it in between.
pub fn ensure_remote_path(
    ns: &dyn RemoteNamespace,
    path: &str,
    acl: AclPolicy,
) -> Result<(), SyncError> {
    if path == REMOTE_ROOT {
        return Ok(());
    }

    ensure_remote_path(ns, remote_parent(path), acl)?;

    match ns.create_node(path, &[], acl) {
        Ok(()) => info!("Created remote dir {}", path),
        Err(NamespaceError::NodeExists) => debug!("Remote dir already present: {}", path),
        Err(e) => return Err(SyncError::remote(path, e)),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespace::memory::{MemoryNamespace, Write};

    #[test]
    fn test_creates_missing_ancestors_top_down() {
        let ns = MemoryNamespace::new();

        ensure_remote_path(&ns, "/a/b/c", AclPolicy::Open).unwrap();

        assert_eq!(
            ns.writes(),
            vec![
                Write::Create("/a".to_string()),
                Write::Create("/a/b".to_string()),
                Write::Create("/a/b/c".to_string()),
            ]
        );
        assert_eq!(ns.payload("/a/b/c"), Some(Vec::new()));
    }

    #[test]
    fn test_existing_nodes_are_left_alone() {
        let ns = MemoryNamespace::new();
        ns.seed("/a/b", b"data");

        ensure_remote_path(&ns, "/a/b/c", AclPolicy::Open).unwrap();

        assert_eq!(ns.writes(), vec![Write::Create("/a/b/c".to_string())]);
        assert_eq!(ns.payload("/a/b"), Some(b"data".to_vec()));
    }

    #[test]
    fn test_root_is_never_created() {
        let ns = MemoryNamespace::new();

        ensure_remote_path(&ns, "/", AclPolicy::Open).unwrap();

        assert!(ns.writes().is_empty());
    }

    #[test]
    fn test_repeated_ensure_is_idempotent() {
        let ns = MemoryNamespace::new();

        ensure_remote_path(&ns, "/x/y", AclPolicy::Open).unwrap();
        ns.clear_writes();
        ensure_remote_path(&ns, "/x/y", AclPolicy::Open).unwrap();

        assert!(ns.writes().is_empty());
    }
}
