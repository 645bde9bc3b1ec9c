//! Host filesystem backend

use std::fs::{self, File, OpenOptions};
use std::path::Path;

use fspath_core::FsPath;
use walkdir::WalkDir;

use crate::filesystem::{FileSystem, ReadHandle, WriteHandle};
use crate::{
    Attributes, Error, FsConfig, HandleMode, Result, WellKnownLocation, attributes, io,
};

/// [`FileSystem`] backed by `std::fs`.
///
/// Stateless apart from its [`FsConfig`]; cheap to copy and share.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem {
    config: FsConfig,
}

impl LocalFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: FsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> FsConfig {
        self.config
    }

    fn require_directory(path: &FsPath) -> Result<()> {
        let metadata = fs::metadata(path.to_native()).map_err(|e| Error::io(path, e))?;
        if !metadata.is_dir() {
            return Err(Error::NotADirectory { path: path.clone() });
        }
        Ok(())
    }

    fn copy_entry(from: &Path, to: &Path, file_type: fs::FileType) -> std::io::Result<()> {
        if file_type.is_dir() {
            fs::create_dir(to)
        } else if file_type.is_symlink() {
            copy_symlink(from, to)
        } else {
            fs::copy(from, to).map(|_| ())
        }
    }

    fn copy_tree(from: &FsPath, to: &FsPath) -> Result<()> {
        let root = from.to_native();
        for entry in WalkDir::new(&root).sort_by_file_name() {
            let entry = entry.map_err(|e| Error::io(from, e.into()))?;
            let relative = entry.path().strip_prefix(&root).unwrap_or(entry.path());
            let target = if relative.as_os_str().is_empty() {
                to.clone()
            } else {
                to.join(FsPath::from(relative).as_str())
            };
            Self::copy_entry(entry.path(), &target.to_native(), entry.file_type())
                .map_err(|e| Error::io(&target, e))?;
        }
        Ok(())
    }
}

#[cfg(unix)]
fn copy_symlink(from: &Path, to: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(fs::read_link(from)?, to)
}

#[cfg(not(unix))]
fn copy_symlink(from: &Path, to: &Path) -> std::io::Result<()> {
    fs::copy(from, to).map(|_| ())
}

impl FileSystem for LocalFileSystem {
    fn children(&self, path: &FsPath) -> Result<Vec<FsPath>> {
        tracing::debug!(%path, "Listing children");
        Self::require_directory(path)?;

        let mut children = Vec::new();
        for entry in fs::read_dir(path.to_native()).map_err(|e| Error::io(path, e))? {
            let entry = entry.map_err(|e| Error::io(path, e))?;
            children.push(path.join(&entry.file_name().to_string_lossy()));
        }
        children.sort();
        Ok(children)
    }

    fn subpaths(&self, path: &FsPath) -> Result<Vec<FsPath>> {
        tracing::debug!(%path, "Listing subpaths");
        Self::require_directory(path)?;

        let root = path.to_native();
        let mut subpaths = Vec::new();
        for entry in WalkDir::new(&root).min_depth(1) {
            let entry = entry.map_err(|e| {
                tracing::debug!(%path, error = %e, "Directory walk failed");
                Error::io(path, e.into())
            })?;
            let relative = entry.path().strip_prefix(&root).unwrap_or(entry.path());
            subpaths.push(path.join(FsPath::from(relative).as_str()));
        }
        subpaths.sort();
        Ok(subpaths)
    }

    fn exists(&self, path: &FsPath) -> bool {
        fs::symlink_metadata(path.to_native()).is_ok()
    }

    fn is_directory(&self, path: &FsPath) -> bool {
        path.to_native().is_dir()
    }

    fn is_file(&self, path: &FsPath) -> bool {
        path.to_native().is_file()
    }

    fn is_symbolic_link(&self, path: &FsPath) -> bool {
        fs::read_link(path.to_native()).is_ok()
    }

    fn create_directory(&self, path: &FsPath, with_intermediates: bool) -> Result<()> {
        tracing::debug!(%path, with_intermediates, "Creating directory");
        let native = path.to_native();
        let result = if with_intermediates {
            fs::create_dir_all(&native)
        } else {
            fs::create_dir(&native)
        };
        result.map_err(|e| Error::io(path, e))
    }

    fn delete(&self, path: &FsPath, if_exists: bool) -> Result<()> {
        let native = path.to_native();
        let metadata = match fs::symlink_metadata(&native) {
            Ok(metadata) => metadata,
            Err(e) if if_exists && e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(%path, "Nothing to delete");
                return Ok(());
            }
            Err(e) => return Err(Error::io(path, e)),
        };

        tracing::debug!(%path, "Deleting");
        let result = if metadata.is_dir() {
            fs::remove_dir_all(&native)
        } else {
            fs::remove_file(&native)
        };
        result.map_err(|e| Error::io(path, e))
    }

    fn copy(&self, from: &FsPath, to: &FsPath) -> Result<()> {
        tracing::debug!(%from, %to, "Copying");
        if self.exists(to) {
            return Err(Error::AlreadyExists { path: to.clone() });
        }

        let metadata = fs::symlink_metadata(from.to_native()).map_err(|e| Error::io(from, e))?;
        if metadata.is_dir() {
            let (source, target) = (self.absolute(from)?, self.absolute(to)?);
            let inside = format!("{}/", source.as_str().trim_end_matches('/'));
            if target.as_str().starts_with(&inside) {
                return Err(Error::io(
                    to,
                    std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        format!("cannot copy {from} into itself"),
                    ),
                ));
            }
            Self::copy_tree(from, to)
        } else {
            Self::copy_entry(&from.to_native(), &to.to_native(), metadata.file_type())
                .map_err(|e| Error::io(to, e))
        }
    }

    fn rename(&self, from: &FsPath, to: &FsPath) -> Result<()> {
        tracing::debug!(%from, %to, "Moving");
        match fs::rename(from.to_native(), to.to_native()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::CrossesDevices => {
                tracing::debug!(%from, %to, "Rename crosses devices, copying instead");
                self.copy(from, to)?;
                self.delete(from, false)
            }
            Err(e) => {
                tracing::debug!(%from, %to, error = %e, "Move failed");
                Err(Error::io(from, e))
            }
        }
    }

    fn read(&self, path: &FsPath) -> Result<Vec<u8>> {
        tracing::debug!(%path, "Reading file");
        fs::read(path.to_native()).map_err(|e| Error::io(path, e))
    }

    fn write(&self, path: &FsPath, data: &[u8], create_directory: bool) -> Result<()> {
        tracing::debug!(%path, len = data.len(), create_directory, "Writing file");
        io::write_atomic(path, data, create_directory, self.config).inspect_err(|e| {
            tracing::debug!(%path, error = %e, "Write failed");
        })
    }

    fn attributes(&self, path: &FsPath) -> Result<Attributes> {
        let metadata = fs::symlink_metadata(path.to_native()).map_err(|e| Error::io(path, e))?;
        Ok(attributes::from_metadata(&metadata))
    }

    fn open_reading_handle(&self, path: &FsPath) -> Result<Box<dyn ReadHandle>> {
        tracing::debug!(%path, "Opening for reading");
        let file = File::open(path.to_native())
            .map_err(|e| Error::open(path, HandleMode::Reading, e))?;
        Ok(Box::new(file))
    }

    fn open_writing_handle(&self, path: &FsPath) -> Result<Box<dyn WriteHandle>> {
        tracing::debug!(%path, "Opening for writing");
        let file = OpenOptions::new()
            .write(true)
            .open(path.to_native())
            .map_err(|e| Error::open(path, HandleMode::Writing, e))?;
        Ok(Box::new(file))
    }

    fn location(&self, location: WellKnownLocation) -> Result<FsPath> {
        let resolved = match location {
            WellKnownLocation::Current => {
                let cwd = std::env::current_dir().map_err(|e| Error::io(&FsPath::new("."), e))?;
                Some(cwd)
            }
            WellKnownLocation::Temporary => Some(std::env::temp_dir()),
            WellKnownLocation::Permanent => dirs::data_dir(),
            WellKnownLocation::Cache => dirs::cache_dir(),
            WellKnownLocation::Home => dirs::home_dir(),
        };
        resolved
            .map(FsPath::from)
            .ok_or(Error::UnknownLocation { location })
    }
}
