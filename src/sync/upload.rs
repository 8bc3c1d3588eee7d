use super::SyncError;
use super::delete::delete_tree;
use super::ensure::ensure_remote_path;
use crate::config::NodePolicy;
use crate::local_tree::{EntryKind, LocalTreeError, list_directory, stat_entry};
use crate::namespace::{NamespaceError, RemoteNamespace};
use crate::path_map::{REMOTE_ROOT, normalize_remote, to_remote};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub struct UploadOptions {
    /// Recursively delete the remote root before uploading.
    pub delete_first: bool,
    pub policy: NodePolicy,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct UploadResult {
    /// Nodes that did not exist and were created.
    pub copied: usize,
    /// Directories whose node already existed.
    pub already_present: usize,
    /// Files whose node already held identical content.
    pub unchanged: usize,
    /// Files whose node held different content and was overwritten.
    pub overwritten: usize,
    /// Local entries that are neither regular files nor directories.
    pub skipped: usize,
    /// Nodes removed beforehand when `delete_first` was set.
    pub deleted: usize,
}

impl UploadResult {
    /// Number of remote writes issued by the upload walk itself.
    pub fn writes(&self) -> usize {
        self.copied + self.overwritten
    }
}

struct UploadWalk<'a> {
    ns: &'a dyn RemoteNamespace,
    local_root: PathBuf,
    remote_root: String,
    policy: NodePolicy,
    result: UploadResult,
}

/// Pushes the local tree at `local_root` to the remote tree at `remote_root`.
///
/// The remote root and its ancestors are created first. The local tree is
/// then walked pre-order, so every directory node exists before anything
/// beneath it is written.
///
/// For every entry the node is created if missing. An existing directory
/// node is left as is. An existing file node is compared with the local
/// content and overwritten against the version just read if it differs;
/// a concurrent write in between surfaces as [`SyncError::VersionConflict`].
/// A local file whose node has children, or a local directory whose node has
/// a payload, is a [`SyncError::StructuralConflict`]. Symlinks and other
/// special files are logged and skipped.
pub fn upload(
    ns: &dyn RemoteNamespace,
    remote_root: &str,
    local_root: &Path,
    options: &UploadOptions,
) -> Result<UploadResult, SyncError> {
    let remote_root = normalize_remote(remote_root)?;
    let local_root = local_root
        .canonicalize()
        .map_err(|e| LocalTreeError::from_io(local_root, e))?;

    let mut result = UploadResult::default();

    if options.delete_first {
        result.deleted = delete_tree(ns, &remote_root)?.nodes_deleted;
    }

    ensure_remote_path(ns, &remote_root, options.policy.acl)?;

    let root_kind = stat_entry(&local_root)?;

    let mut walk = UploadWalk {
        ns,
        local_root,
        remote_root,
        policy: options.policy,
        result,
    };
    let local_root = walk.local_root.clone();
    walk.visit(&local_root, root_kind)?;

    Ok(walk.result)
}

impl UploadWalk<'_> {
    fn visit(&mut self, local_path: &Path, kind: EntryKind) -> Result<(), SyncError> {
        let remote_path = to_remote(&self.local_root, local_path, &self.remote_root)?;

        match kind {
            EntryKind::Unsupported(what) => {
                warn!(
                    "Skipping {} ({}): not a regular file or directory",
                    local_path.display(),
                    what
                );
                self.result.skipped += 1;
            }
            EntryKind::Dir => {
                self.upload_dir(&remote_path)?;
                for entry in list_directory(local_path)? {
                    self.visit(&entry.path, entry.kind)?;
                }
            }
            EntryKind::File { size } => self.upload_file(local_path, &remote_path, size)?,
        }

        Ok(())
    }

    fn upload_dir(&mut self, remote_path: &str) -> Result<(), SyncError> {
        if remote_path == REMOTE_ROOT {
            self.result.already_present += 1;
            return Ok(());
        }

        match self.ns.create_node(remote_path, &[], self.policy.acl) {
            Ok(()) => {
                info!("Created dir {}", remote_path);
                self.result.copied += 1;
            }
            Err(NamespaceError::NodeExists) => {
                let stat = self
                    .ns
                    .exists(remote_path)
                    .map_err(|e| SyncError::remote(remote_path, e))?
                    .ok_or_else(|| SyncError::NotFound(remote_path.to_string()))?;
                if stat.has_payload() {
                    return Err(SyncError::structural(
                        remote_path,
                        "local directory but the remote node holds file content",
                    ));
                }
                debug!("Dir already there: {}", remote_path);
                self.result.already_present += 1;
            }
            Err(e) => return Err(SyncError::remote(remote_path, e)),
        }
        Ok(())
    }

    fn upload_file(
        &mut self,
        local_path: &Path,
        remote_path: &str,
        size: u64,
    ) -> Result<(), SyncError> {
        if size == 0 {
            warn!(
                "{} is empty and will be stored as a directory node",
                local_path.display()
            );
        }

        let payload =
            std::fs::read(local_path).map_err(|e| LocalTreeError::from_io(local_path, e))?;

        match self.ns.create_node(remote_path, &payload, self.policy.acl) {
            Ok(()) => {
                info!("Copied {} -> {}", local_path.display(), remote_path);
                self.result.copied += 1;
                return Ok(());
            }
            Err(NamespaceError::NodeExists) => {}
            Err(e) => return Err(SyncError::remote(remote_path, e)),
        }

        let mut stat = self
            .ns
            .exists(remote_path)
            .map_err(|e| SyncError::remote(remote_path, e))?
            .ok_or_else(|| SyncError::NotFound(remote_path.to_string()))?;
        if stat.has_children() {
            return Err(SyncError::structural(
                remote_path,
                "local file but the remote node is a directory with children",
            ));
        }

        if usize::try_from(stat.data_length).ok() == Some(payload.len()) {
            let (current, current_stat) = self
                .ns
                .get_node(remote_path)
                .map_err(|e| SyncError::remote(remote_path, e))?;
            if current == payload {
                debug!("Unchanged: {}", remote_path);
                self.result.unchanged += 1;
                return Ok(());
            }
            stat = current_stat;
        }

        self.ns
            .set_node(remote_path, &payload, stat.version)
            .map_err(|e| SyncError::remote(remote_path, e))?;
        info!("Overwrote {} -> {}", local_path.display(), remote_path);
        self.result.overwritten += 1;

        Ok(())
    }
}
