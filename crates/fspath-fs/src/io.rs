//! Atomic file writes

use std::fs;
use std::io::Write;

use fspath_core::FsPath;
use tempfile::NamedTempFile;

use crate::{Error, FsConfig, Result};

/// Write content atomically to a file.
///
/// Data goes to a temp file in the destination's directory (same
/// filesystem), which is then renamed over the destination. Readers see
/// either the old content or the new content, never a mix. If anything
/// fails the temp file is removed when it is dropped.
pub fn write_atomic(
    path: &FsPath,
    content: &[u8],
    create_directory: bool,
    config: FsConfig,
) -> Result<()> {
    let native_path = path.to_native();
    let parent = path.parent();

    if create_directory && !parent.is_empty() {
        fs::create_dir_all(parent.to_native()).map_err(|e| Error::io(&parent, e))?;
    }

    let temp_dir = if parent.is_empty() {
        FsPath::new(".")
    } else {
        parent
    };

    let prefix = format!(".{}.", path.last_component_without_extension().as_str());
    let mut builder = tempfile::Builder::new();
    builder.prefix(&prefix).suffix(".tmp");
    // tempfile defaults to 0600; ask for what `File::create` would get.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o666));
    }

    let mut temp_file = builder
        .tempfile_in(temp_dir.to_native())
        .map_err(|e| Error::io(&temp_dir, e))?;

    // An overwrite keeps the destination's mode.
    if let Some(metadata) = fs::metadata(&native_path).ok().filter(|m| m.is_file()) {
        temp_file
            .as_file()
            .set_permissions(metadata.permissions())
            .map_err(|e| Error::io(path, e))?;
    }

    write_temp(&mut temp_file, content, config).map_err(|e| Error::io(path, e))?;

    temp_file
        .persist(&native_path)
        .map_err(|e| Error::io(path, e.error))?;

    Ok(())
}

fn write_temp(
    temp_file: &mut NamedTempFile,
    content: &[u8],
    config: FsConfig,
) -> std::io::Result<()> {
    temp_file.write_all(content)?;
    temp_file.flush()?;
    if config.enable_fsync {
        temp_file.as_file().sync_all()?;
    }
    Ok(())
}
