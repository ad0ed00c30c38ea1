// src/error.rs
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SaveError {
    /// The file to read does not exist. Distinct from other I/O failures so
    /// callers can tell "nothing saved yet" apart from a broken disk.
    #[error("save file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode {}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to decode {}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("default and external roots are the same directory: {}", root.display())]
    RootsCollide { root: PathBuf },

    /// Error raised by a caller-supplied custom strategy function.
    #[error(transparent)]
    Custom(#[from] anyhow::Error),
}

impl SaveError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            SaveError::NotFound { path }
        } else {
            SaveError::Io { path, source }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, SaveError::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, SaveError>;
