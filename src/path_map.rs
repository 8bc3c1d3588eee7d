//! Mapping between local filesystem paths and remote node paths.
//!
//! A local root and a remote root anchor the same tree on both sides. Any path
//! below one root maps to the path below the other root with the identical
//! relative suffix. Remote paths are absolute, `/`-delimited strings; local
//! paths are whatever the platform uses. Nothing in this module touches the
//! filesystem or the network, so callers canonicalize local roots first.

use std::path::{Component, Path, PathBuf};

pub const REMOTE_ROOT: &str = "/";

#[derive(Debug, thiserror::Error)]
pub enum PathMapError {
    #[error("{path} is not under {root}")]
    NotUnderRoot { path: String, root: String },
    #[error("Invalid remote path: {0:?}")]
    InvalidRemotePath(String),
    #[error("Path is not valid UTF-8: {0}")]
    NonUtf8(PathBuf),
    #[error("Unsupported local path component in {0}")]
    UnsupportedComponent(PathBuf),
}

/// Validates a remote path and strips a trailing slash.
///
/// Remote paths must be absolute and may not contain empty, `.` or `..`
/// components. `/` is the namespace root and is returned as-is.
pub fn normalize_remote(path: &str) -> Result<String, PathMapError> {
    if !path.starts_with('/') {
        return Err(PathMapError::InvalidRemotePath(path.to_string()));
    }

    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return Ok(REMOTE_ROOT.to_string());
    }

    for segment in trimmed[1..].split('/') {
        if !is_valid_segment(segment) {
            return Err(PathMapError::InvalidRemotePath(path.to_string()));
        }
    }

    Ok(trimmed.to_string())
}

fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty() && segment != "." && segment != ".."
}

/// Appends a single child name to a normalized remote path.
pub fn join_remote(parent: &str, child: &str) -> String {
    if parent == REMOTE_ROOT {
        format!("/{child}")
    } else {
        format!("{parent}/{child}")
    }
}

/// Parent of a normalized remote path. The root is its own parent.
pub fn remote_parent(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) | None => REMOTE_ROOT,
        Some(idx) => &path[..idx],
    }
}

/// Maps `local_path`, a descendant of `local_root` (or the root itself), to
/// the corresponding node path under `remote_root`.
pub fn to_remote(
    local_root: &Path,
    local_path: &Path,
    remote_root: &str,
) -> Result<String, PathMapError> {
    let relative = local_path
        .strip_prefix(local_root)
        .map_err(|_| PathMapError::NotUnderRoot {
            path: local_path.display().to_string(),
            root: local_root.display().to_string(),
        })?;

    let mut remote = normalize_remote(remote_root)?;
    for component in relative.components() {
        match component {
            Component::Normal(part) => {
                let part = part
                    .to_str()
                    .ok_or_else(|| PathMapError::NonUtf8(local_path.to_path_buf()))?;
                if part.contains('/') || !is_valid_segment(part) {
                    return Err(PathMapError::UnsupportedComponent(local_path.to_path_buf()));
                }
                remote = join_remote(&remote, part);
            }
            Component::CurDir => continue,
            Component::RootDir | Component::ParentDir | Component::Prefix(_) => {
                return Err(PathMapError::UnsupportedComponent(local_path.to_path_buf()));
            }
        }
    }

    Ok(remote)
}

/// Maps `remote_path`, a descendant of `remote_root` (or the root itself), to
/// the corresponding filesystem path under `local_root`.
pub fn to_local(
    remote_root: &str,
    remote_path: &str,
    local_root: &Path,
) -> Result<PathBuf, PathMapError> {
    let root = normalize_remote(remote_root)?;
    let path = normalize_remote(remote_path)?;

    let not_under_root = || PathMapError::NotUnderRoot {
        path: path.clone(),
        root: root.clone(),
    };

    let suffix = if root == REMOTE_ROOT {
        &path[1..]
    } else if path == root {
        ""
    } else {
        path.strip_prefix(root.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(not_under_root)?
    };

    let mut local = local_root.to_path_buf();
    for segment in suffix.split('/').filter(|s| !s.is_empty()) {
        local.push(segment);
    }
    Ok(local)
}
