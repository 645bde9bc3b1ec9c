//! Path strings for fspath
//!
//! Pure path-string manipulation with no filesystem access. Operations that
//! touch the filesystem live in `fspath-fs` and take an [`FsPath`] as input.

pub mod path;

pub use path::FsPath;
pub use url::Url;
