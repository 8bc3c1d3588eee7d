//! Tree synchronization between a local directory and a remote namespace.
//!
//! Remote nodes with an empty payload act as directories and nodes with a
//! payload act as files. All walks are depth-first on the call stack and
//! every remote call blocks, so within a run the remote writes happen in
//! exactly the order the walk visits nodes.
//!
//! Any error returned from here aborts the whole run. Writes already applied
//! stay applied; re-running is cheap because creation tolerates existing
//! nodes and downloads skip files whose timestamps already match.

pub mod delete;
pub mod download;
pub mod ensure;
pub mod upload;

#[cfg(test)]
mod tests;

use crate::local_tree::LocalTreeError;
use crate::namespace::NamespaceError;
use crate::path_map::PathMapError;

pub use delete::{DeleteResult, delete_tree};
pub use download::{DownloadResult, download};
pub use upload::{UploadOptions, UploadResult, upload};

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Remote node not found: {0}")]
    NotFound(String),
    #[error("Version conflict on {0}: the node was modified concurrently")]
    VersionConflict(String),
    #[error("Structural conflict at {path}: {detail}")]
    StructuralConflict { path: String, detail: &'static str },
    #[error("Filesystem error: {0}")]
    Filesystem(#[from] LocalTreeError),
    #[error("Path error: {0}")]
    InvalidPath(#[from] PathMapError),
    #[error("Remote error at {path}: {source}")]
    Remote {
        path: String,
        source: NamespaceError,
    },
    #[error("Refusing to delete the namespace root")]
    RootDeletion,
}

impl SyncError {
    /// Classifies a failed remote call on `path`.
    pub(crate) fn remote(path: &str, e: NamespaceError) -> Self {
        match e {
            NamespaceError::NoNode => SyncError::NotFound(path.to_string()),
            NamespaceError::BadVersion => SyncError::VersionConflict(path.to_string()),
            source => SyncError::Remote {
                path: path.to_string(),
                source,
            },
        }
    }

    pub(crate) fn structural(path: &str, detail: &'static str) -> Self {
        SyncError::StructuralConflict {
            path: path.to_string(),
            detail,
        }
    }
}
