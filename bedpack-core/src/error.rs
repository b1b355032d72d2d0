//! Error type shared by every bedpack operation.
//!
//! All failures surface as a single [`BedError`] carrying a message and a
//! coarse [`ErrorKind`]. Nothing is retried or recovered internally.

use std::path::Path;

use thiserror::Error;

/// Coarse classification of a [`BedError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The data itself is malformed: bad magic, truncated matrix, invalid
    /// genotype strings, more than two alleles.
    Format,
    /// The caller used the API incorrectly: wrong lifecycle state, sample
    /// count mismatch, unknown variant, nothing to write.
    Usage,
    /// A file could not be opened, read or written.
    Io,
}

#[derive(Error, Debug)]
pub enum BedError {
    #[error("{message}")]
    Format { message: String },

    #[error("{message}")]
    Usage { message: String },

    #[error("{message}: {source}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, BedError>;

impl BedError {
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format {
            message: message.into(),
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
        }
    }

    /// Wrap an I/O failure on `path`, prefixed with what was being attempted.
    pub fn io(action: &str, path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} {}", action, path.display()),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Format { .. } => ErrorKind::Format,
            Self::Usage { .. } => ErrorKind::Usage,
            Self::Io { .. } => ErrorKind::Io,
        }
    }
}
