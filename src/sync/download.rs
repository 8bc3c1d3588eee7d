use super::SyncError;
use crate::config::NodePolicy;
use crate::local_tree::LocalTreeError;
use crate::namespace::{NamespaceError, NodeStat, RemoteNamespace};
use crate::path_map::{join_remote, normalize_remote, to_local};
use filetime::FileTime;
use std::cmp::Ordering;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Default, PartialEq, Eq)]
pub struct DownloadResult {
    /// False when the remote root did not exist; nothing was written.
    pub root_found: bool,
    pub dirs_created: usize,
    pub dirs_present: usize,
    /// Files that were missing locally or older than the remote node.
    pub files_written: usize,
    /// Files whose local modification time equals the node's.
    pub files_in_sync: usize,
    /// Files left untouched because the local copy is newer.
    pub local_newer: usize,
}

struct DownloadWalk<'a> {
    ns: &'a dyn RemoteNamespace,
    remote_root: String,
    local_root: PathBuf,
    policy: NodePolicy,
    result: DownloadResult,
}

/// Pulls the remote tree at `remote_root` into `local_root`.
///
/// Directory nodes become local directories. File nodes are written when
/// the local file is missing or its modification time is older than the
/// node's; the local file then gets the node's timestamp so the next run
/// sees them as equal and skips it. A local file newer than the node is
/// reported and left alone. A missing remote root is reported and returns
/// a result with `root_found == false`.
///
/// Local symlinks are followed: a linked directory is used as is, and a
/// linked file is compared and rewritten at its target so the link survives.
pub fn download(
    ns: &dyn RemoteNamespace,
    remote_root: &str,
    local_root: &Path,
    policy: &NodePolicy,
) -> Result<DownloadResult, SyncError> {
    let remote_root = normalize_remote(remote_root)?;
    let local_root = match local_root.canonicalize() {
        Ok(path) => path,
        Err(e) if e.kind() == ErrorKind::NotFound => std::path::absolute(local_root)
            .map_err(|e| LocalTreeError::from_io(local_root, e))?,
        Err(e) => return Err(LocalTreeError::from_io(local_root, e).into()),
    };

    let (payload, stat) = match ns.get_node(&remote_root) {
        Ok(node) => node,
        Err(NamespaceError::NoNode) => {
            warn!("Remote path {} not found, nothing to download", remote_root);
            return Ok(DownloadResult::default());
        }
        Err(e) => return Err(SyncError::remote(&remote_root, e)),
    };

    let mut walk = DownloadWalk {
        ns,
        remote_root: remote_root.clone(),
        local_root,
        policy: *policy,
        result: DownloadResult {
            root_found: true,
            ..Default::default()
        },
    };
    walk.visit(&remote_root, payload, stat)?;

    Ok(walk.result)
}

impl DownloadWalk<'_> {
    fn visit(
        &mut self,
        remote_path: &str,
        payload: Vec<u8>,
        stat: NodeStat,
    ) -> Result<(), SyncError> {
        let local_path = to_local(&self.remote_root, remote_path, &self.local_root)?;

        if payload.is_empty() {
            self.download_dir(remote_path, &local_path, stat)
        } else {
            if stat.has_children() {
                return Err(SyncError::structural(
                    remote_path,
                    "node holds file content and also has children",
                ));
            }
            self.download_file(remote_path, &local_path, &payload, stat)
        }
    }

    fn download_dir(
        &mut self,
        remote_path: &str,
        local_path: &Path,
        stat: NodeStat,
    ) -> Result<(), SyncError> {
        match create_dir(local_path, self.policy.dir_mode) {
            Ok(()) => {
                info!("Created local dir {}", local_path.display());
                self.result.dirs_created += 1;
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                let metadata = std::fs::metadata(local_path)
                    .map_err(|e| LocalTreeError::from_io(local_path, e))?;
                if !metadata.is_dir() {
                    return Err(SyncError::structural(
                        remote_path,
                        "directory node but the local path is not a directory",
                    ));
                }
                debug!("Local dir already present: {}", local_path.display());
                self.result.dirs_present += 1;
            }
            Err(e) => return Err(LocalTreeError::from_io(local_path, e).into()),
        }

        if !stat.has_children() {
            return Ok(());
        }

        let (mut children, _) = self
            .ns
            .get_children(remote_path)
            .map_err(|e| SyncError::remote(remote_path, e))?;
        children.sort();

        for child in children {
            let child_path = join_remote(remote_path, &child);
            let (payload, child_stat) = self
                .ns
                .get_node(&child_path)
                .map_err(|e| SyncError::remote(&child_path, e))?;
            self.visit(&child_path, payload, child_stat)?;
        }

        Ok(())
    }

    fn download_file(
        &mut self,
        remote_path: &str,
        local_path: &Path,
        payload: &[u8],
        stat: NodeStat,
    ) -> Result<(), SyncError> {
        let remote_mtime = stat.mtime_millis;
        debug!(
            "Remote file {} was modified on {}",
            remote_path,
            format_millis(remote_mtime)
        );

        let local_path = &write_target(remote_path, local_path)?;

        match std::fs::metadata(local_path) {
            Ok(metadata) if metadata.is_dir() => {
                return Err(SyncError::structural(
                    remote_path,
                    "file node but the local path is a directory",
                ));
            }
            Ok(metadata) => {
                let local_mtime = millis_of(FileTime::from_last_modification_time(&metadata));
                debug!(
                    "Local file {} was modified on {}",
                    local_path.display(),
                    format_millis(local_mtime)
                );
                match remote_mtime.cmp(&local_mtime) {
                    Ordering::Equal => {
                        debug!("Files are the same: {}", local_path.display());
                        self.result.files_in_sync += 1;
                        return Ok(());
                    }
                    Ordering::Less => {
                        warn!(
                            "Local file is newer than remote, leaving it untouched: {}",
                            local_path.display()
                        );
                        self.result.local_newer += 1;
                        return Ok(());
                    }
                    Ordering::Greater => debug!("Remote file is newer, will overwrite"),
                }
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Local file does not exist: {}", local_path.display())
            }
            Err(e) => return Err(LocalTreeError::from_io(local_path, e).into()),
        }

        write_file(local_path, payload, self.policy.file_mode, remote_mtime)?;
        info!("Downloaded {} -> {}", remote_path, local_path.display());
        self.result.files_written += 1;

        Ok(())
    }
}

/// Resolves a symlinked local file to the file it points at.
fn write_target(remote_path: &str, local_path: &Path) -> Result<PathBuf, SyncError> {
    let is_link = std::fs::symlink_metadata(local_path)
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(false);
    if !is_link {
        return Ok(local_path.to_path_buf());
    }

    match local_path.canonicalize() {
        Ok(target) => {
            debug!("{} links to {}", local_path.display(), target.display());
            Ok(target)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Err(SyncError::structural(
            remote_path,
            "file node but the local path is a dangling symlink",
        )),
        Err(e) => Err(LocalTreeError::from_io(local_path, e).into()),
    }
}

fn create_dir(path: &Path, mode: u32) -> std::io::Result<()> {
    let mut builder = std::fs::DirBuilder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(mode);
    }
    #[cfg(not(unix))]
    let _ = mode;
    builder.create(path)
}

/// Replaces `path` atomically with `payload` and stamps it with `mtime_millis`.
fn write_file(
    path: &Path,
    payload: &[u8],
    mode: u32,
    mtime_millis: i64,
) -> Result<(), LocalTreeError> {
    let parent = path.parent().unwrap_or(Path::new("."));

    let mut temp_file =
        tempfile::NamedTempFile::new_in(parent).map_err(|e| LocalTreeError::from_io(parent, e))?;

    temp_file
        .write_all(payload)
        .map_err(|e| LocalTreeError::from_io(path, e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        temp_file
            .as_file()
            .set_permissions(std::fs::Permissions::from_mode(mode))
            .map_err(|e| LocalTreeError::from_io(path, e))?;
    }
    #[cfg(not(unix))]
    let _ = mode;

    temp_file
        .persist(path)
        .map_err(|e| LocalTreeError::from_io(path, e.error))?;

    if !stamp_mtime(path, mtime_millis)? {
        debug!(
            "Filesystem did not keep the millisecond timestamp of {}, it will be rewritten next run",
            path.display()
        );
    }

    Ok(())
}

/// Sets both times of `path` and reports whether the mtime reads back intact.
fn stamp_mtime(path: &Path, mtime_millis: i64) -> Result<bool, LocalTreeError> {
    let mtime = file_time_of(mtime_millis);
    filetime::set_file_times(path, mtime, mtime).map_err(|e| LocalTreeError::from_io(path, e))?;

    let metadata = std::fs::metadata(path).map_err(|e| LocalTreeError::from_io(path, e))?;
    Ok(millis_of(FileTime::from_last_modification_time(&metadata)) == mtime_millis)
}

fn file_time_of(millis: i64) -> FileTime {
    let seconds = millis.div_euclid(1000);
    let nanos = (millis.rem_euclid(1000) * 1_000_000) as u32;
    FileTime::from_unix_time(seconds, nanos)
}

/// Local timestamps are truncated to the millisecond resolution of the service.
fn millis_of(time: FileTime) -> i64 {
    time.unix_seconds() * 1000 + i64::from(time.nanoseconds() / 1_000_000)
}

fn format_millis(millis: i64) -> String {
    match chrono::DateTime::from_timestamp_millis(millis) {
        Some(utc) => utc.with_timezone(&chrono::Local).to_rfc3339(),
        None => format!("{millis}ms"),
    }
}
