use std::path::PathBuf;

use thiserror::Error;

/// Loading a project file from disk.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read project file {path}: {source}")]
    FileUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Applying a chunk to a project document.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApplyError {
    #[error("chunk <{0}> is not a TRACK block")]
    NotATrack(String),

    #[error("no track at index {0}")]
    NoSuchTrack(usize),
}

/// Writing a project document to disk.
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("failed to write project file {path}: {source}")]
    FileUnwritable {
        path: PathBuf,
        source: std::io::Error,
    },
}
