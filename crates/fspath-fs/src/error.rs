//! Error types for fspath-fs

use fspath_core::FsPath;

use crate::location::WellKnownLocation;

/// Result type for fspath-fs operations
pub type Result<T> = std::result::Result<T, Error>;

/// Which direction a handle was opened for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleMode {
    Reading,
    Writing,
}

impl std::fmt::Display for HandleMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reading => write!(f, "reading"),
            Self::Writing => write!(f, "writing"),
        }
    }
}

/// Errors that can occur in fspath-fs operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: FsPath,
        #[source]
        source: std::io::Error,
    },

    #[error("Destination already exists: {path}")]
    AlreadyExists { path: FsPath },

    #[error("Not a directory: {path}")]
    NotADirectory { path: FsPath },

    #[error("Failed to open {path} for {mode}: {source}")]
    OpenHandle {
        path: FsPath,
        mode: HandleMode,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not resolve the {location} directory")]
    UnknownLocation { location: WellKnownLocation },

    #[error("File is not valid UTF-8: {path}")]
    InvalidUtf8 { path: FsPath },
}

impl Error {
    pub fn io(path: &FsPath, source: std::io::Error) -> Self {
        Self::Io {
            path: path.clone(),
            source,
        }
    }

    pub fn open(path: &FsPath, mode: HandleMode, source: std::io::Error) -> Self {
        Self::OpenHandle {
            path: path.clone(),
            mode,
            source,
        }
    }

    /// True if the underlying host call reported a missing entry.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Io { source, .. } | Self::OpenHandle { source, .. } => {
                source.kind() == std::io::ErrorKind::NotFound
            }
            _ => false,
        }
    }

    /// The path the failing operation was working on, if any.
    pub fn path(&self) -> Option<&FsPath> {
        match self {
            Self::Io { path, .. }
            | Self::AlreadyExists { path }
            | Self::NotADirectory { path }
            | Self::OpenHandle { path, .. }
            | Self::InvalidUtf8 { path } => Some(path),
            Self::UnknownLocation { .. } => None,
        }
    }
}
