//! Non-recursive directory listing for the upload walk.
//!
//! Lists the immediate children of a directory and classifies each one as a
//! regular file, a directory, or an unsupported kind. Symlinks are never
//! followed: a link is classified by its own metadata and is therefore always
//! unsupported.

use std::fs::{FileType, Metadata};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum LocalTreeError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
}

impl LocalTreeError {
    pub fn from_io(path: &Path, e: std::io::Error) -> Self {
        if e.kind() == ErrorKind::PermissionDenied {
            LocalTreeError::PermissionDenied(path.to_path_buf())
        } else {
            LocalTreeError::Io {
                path: path.to_path_buf(),
                source: e,
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalEntry {
    pub path: PathBuf,
    pub kind: EntryKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File { size: u64 },
    Dir,
    /// Anything else; the payload names the kind for log messages.
    Unsupported(&'static str),
}

impl EntryKind {
    pub fn from_metadata(metadata: &Metadata) -> Self {
        let file_type = metadata.file_type();
        if file_type.is_dir() {
            EntryKind::Dir
        } else if file_type.is_file() {
            EntryKind::File {
                size: metadata.len(),
            }
        } else {
            EntryKind::Unsupported(describe_file_type(&file_type))
        }
    }
}

fn describe_file_type(file_type: &FileType) -> &'static str {
    if file_type.is_symlink() {
        return "symlink";
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::FileTypeExt;

        if file_type.is_fifo() {
            return "fifo";
        } else if file_type.is_socket() {
            return "socket";
        } else if file_type.is_block_device() || file_type.is_char_device() {
            return "device";
        }
    }

    "special file"
}

/// Classifies a single path without following symlinks.
pub fn stat_entry(path: &Path) -> Result<EntryKind, LocalTreeError> {
    let metadata = std::fs::symlink_metadata(path).map_err(|e| LocalTreeError::from_io(path, e))?;
    Ok(EntryKind::from_metadata(&metadata))
}

/// Lists the immediate children of `dir`, sorted by file name.
pub fn list_directory(dir: &Path) -> Result<Vec<LocalEntry>, LocalTreeError> {
    let read_dir = std::fs::read_dir(dir).map_err(|e| LocalTreeError::from_io(dir, e))?;

    let mut entries = Vec::new();

    for entry in read_dir {
        let entry = entry.map_err(|e| LocalTreeError::from_io(dir, e))?;
        let path = entry.path();
        let kind = stat_entry(&path)?;
        entries.push(LocalEntry { path, kind });
    }

    entries.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));

    Ok(entries)
}
