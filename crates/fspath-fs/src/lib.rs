//! Filesystem operations over fspath paths
//!
//! The [`FileSystem`] trait is the single seam between path values and the
//! outside world. [`LocalFileSystem`] delegates to the host; [`MemoryFileSystem`]
//! is an in-memory stand-in for tests.

pub mod attributes;
pub mod config;
pub mod error;
pub mod filesystem;
pub mod io;
pub mod local;
pub mod location;
pub mod logging;
pub mod memory;

pub use attributes::{AttributeKey, AttributeValue, Attributes};
pub use config::FsConfig;
pub use error::{Error, HandleMode, Result};
pub use filesystem::{FileSystem, MoveOptions, ReadHandle, WriteHandle};
pub use fspath_core::FsPath;
pub use local::LocalFileSystem;
pub use location::WellKnownLocation;
pub use memory::MemoryFileSystem;
