//! Settings for the local filesystem backend

/// Tunables for [`LocalFileSystem`](crate::LocalFileSystem).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FsConfig {
    /// Flush written data to disk before the atomic rename.
    pub enable_fsync: bool,
}

impl Default for FsConfig {
    fn default() -> Self {
        Self { enable_fsync: true }
    }
}

impl FsConfig {
    /// A config that skips `sync_all`, for scratch data and tests.
    pub fn without_fsync() -> Self {
        Self {
            enable_fsync: false,
        }
    }
}
