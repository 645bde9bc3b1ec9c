//! Filesystem operations over [`FsPath`] values
//!
//! Every operation is a thin delegation to a backend. [`LocalFileSystem`]
//! talks to the host; [`MemoryFileSystem`] keeps an in-memory tree so code
//! built on this trait can be tested without touching disk.
//!
//! [`LocalFileSystem`]: crate::LocalFileSystem
//! [`MemoryFileSystem`]: crate::MemoryFileSystem

use std::io::{Read, Seek, Write};

use fspath_core::FsPath;

use crate::{Attributes, Error, Result, WellKnownLocation};

/// A handle opened for streaming reads.
pub trait ReadHandle: Read + Seek + Send {}
impl<T: Read + Seek + Send> ReadHandle for T {}

/// A handle opened for streaming writes.
pub trait WriteHandle: Write + Seek + Send {}
impl<T: Write + Seek + Send> WriteHandle for T {}

/// Options for [`FileSystem::move_to`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveOptions {
    /// Remove an existing destination before moving.
    pub delete_destination: bool,
    /// Create the destination's parent directories before moving.
    pub create_directory: bool,
}

impl MoveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delete_destination(mut self, yes: bool) -> Self {
        self.delete_destination = yes;
        self
    }

    pub fn create_directory(mut self, yes: bool) -> Self {
        self.create_directory = yes;
        self
    }
}

/// Filesystem operations taking a path value as input.
///
/// Probes (`exists`, `is_directory`, `is_file`, `is_symbolic_link`) never
/// fail. Everything else propagates the backend's failure unchanged, with no
/// retries.
pub trait FileSystem: std::fmt::Debug + Send + Sync {
    /// Immediate entries of a directory, sorted.
    fn children(&self, path: &FsPath) -> Result<Vec<FsPath>>;

    /// Every descendant of a directory, sorted.
    fn subpaths(&self, path: &FsPath) -> Result<Vec<FsPath>>;

    /// True if any entry exists at `path`, including a dangling symlink.
    fn exists(&self, path: &FsPath) -> bool;

    /// True if `path` exists and is a directory (following symlinks).
    fn is_directory(&self, path: &FsPath) -> bool;

    /// True if `path` exists and is a regular file (following symlinks).
    fn is_file(&self, path: &FsPath) -> bool;

    /// True iff the link target of `path` can be read. Any failure,
    /// including "not a link", reports false.
    fn is_symbolic_link(&self, path: &FsPath) -> bool;

    /// Create a directory, and its missing ancestors if `with_intermediates`.
    fn create_directory(&self, path: &FsPath, with_intermediates: bool) -> Result<()>;

    /// Remove a file, link, or directory tree.
    ///
    /// With `if_exists`, a missing path is a silent no-op.
    fn delete(&self, path: &FsPath, if_exists: bool) -> Result<()>;

    /// Copy a file or directory tree. Fails if `to` already exists.
    fn copy(&self, from: &FsPath, to: &FsPath) -> Result<()>;

    /// The backend's raw move primitive. Callers want [`FileSystem::move_to`].
    fn rename(&self, from: &FsPath, to: &FsPath) -> Result<()>;

    /// Move `from` to `to`.
    ///
    /// Runs strictly in order: delete the destination (if requested), create
    /// the destination's parent (if requested), then move. Fails with
    /// [`Error::AlreadyExists`] if the destination is still present.
    fn move_to(&self, from: &FsPath, to: &FsPath, options: MoveOptions) -> Result<()> {
        if options.delete_destination {
            self.delete(to, true)?;
        }
        if options.create_directory {
            let parent = to.parent();
            if !parent.is_empty() {
                self.create_directory(&parent, true)?;
            }
        }
        if self.exists(to) {
            return Err(Error::AlreadyExists { path: to.clone() });
        }
        self.rename(from, to)
    }

    /// Whole contents of a file.
    fn read(&self, path: &FsPath) -> Result<Vec<u8>>;

    /// Whole contents of a file as UTF-8.
    fn read_string(&self, path: &FsPath) -> Result<String> {
        let bytes = self.read(path)?;
        String::from_utf8(bytes).map_err(|_| Error::InvalidUtf8 { path: path.clone() })
    }

    /// Replace a file's contents atomically, optionally creating its parent
    /// directories first.
    fn write(&self, path: &FsPath, data: &[u8], create_directory: bool) -> Result<()>;

    fn write_string(&self, path: &FsPath, contents: &str, create_directory: bool) -> Result<()> {
        self.write(path, contents.as_bytes(), create_directory)
    }

    /// Host-reported attributes of the entry itself (links are not followed).
    fn attributes(&self, path: &FsPath) -> Result<Attributes>;

    /// Open an existing file for reading.
    fn open_reading_handle(&self, path: &FsPath) -> Result<Box<dyn ReadHandle>>;

    /// Open an existing file for writing, positioned at the start and
    /// without truncation.
    fn open_writing_handle(&self, path: &FsPath) -> Result<Box<dyn WriteHandle>>;

    /// Resolve a well-known directory. Re-queried on every call.
    fn location(&self, location: WellKnownLocation) -> Result<FsPath>;

    fn current_dir(&self) -> Result<FsPath> {
        self.location(WellKnownLocation::Current)
    }

    fn temporary_dir(&self) -> Result<FsPath> {
        self.location(WellKnownLocation::Temporary)
    }

    fn permanent_dir(&self) -> Result<FsPath> {
        self.location(WellKnownLocation::Permanent)
    }

    fn cache_dir(&self) -> Result<FsPath> {
        self.location(WellKnownLocation::Cache)
    }

    fn home_dir(&self) -> Result<FsPath> {
        self.location(WellKnownLocation::Home)
    }

    /// Resolve `path` against the current directory and normalize it.
    ///
    /// A leading `~` component is replaced by the home directory first.
    fn absolute(&self, path: &FsPath) -> Result<FsPath> {
        let path = match path.as_str().strip_prefix('~') {
            Some(rest) if rest.is_empty() || rest.starts_with('/') => self.home_dir()? + rest,
            _ => path.clone(),
        };
        if path.is_absolute() {
            return Ok(path.normalized());
        }
        Ok(path.absolute_from(&self.current_dir()?))
    }

    fn make_absolute(&self, path: &mut FsPath) -> Result<()> {
        *path = self.absolute(path)?;
        Ok(())
    }
}
