//! Moving entries out of the target directory.
//!
//! A rename is always tried first: it is atomic and cheap when source and
//! destination share a filesystem. Renames across filesystems fail, and only
//! that failure falls back to copying the bytes and removing the source.
//! Symlinks are recreated rather than copied, and directories are refused.

use std::{
    fs::{self, File},
    io,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::debug;

/// Errors from relocating a single entry.
#[derive(Debug, Error)]
pub enum RelocateError {
    #[error("rename failed: {0}")]
    Rename(#[source] io::Error),

    #[error("move with copy: couldn't open source file: {0}")]
    OpenSource(#[source] io::Error),

    #[error("move with copy: couldn't open dest file: {0}")]
    CreateDestination(#[source] io::Error),

    #[error("move with copy: couldn't copy to dest from source: {0}")]
    Copy(#[source] io::Error),

    #[error("move with copy: couldn't remove source file: {0}")]
    RemoveSource(#[source] io::Error),

    #[error("cannot move directory {} across filesystems", .0.display())]
    DirectoryAcrossDevices(PathBuf),

    #[cfg(not(unix))]
    #[error("cannot move symlink {} across filesystems", .0.display())]
    SymlinkAcrossDevices(PathBuf),
}

/// Whether a failed rename was rejected because source and destination live
/// on different filesystems.
///
/// This is the only place that interprets platform error codes for the
/// fallback decision; extend it when a new platform reports the condition
/// differently.
pub fn is_cross_device(err: &io::Error) -> bool {
    if err.kind() == io::ErrorKind::CrossesDevices {
        return true;
    }
    #[cfg(unix)]
    {
        err.raw_os_error() == Some(libc::EXDEV)
    }
    #[cfg(not(unix))]
    {
        false
    }
}

/// Move `source` to `destination`, falling back to copy-then-delete when a
/// rename cannot cross the filesystem boundary.
pub fn relocate(source: &Path, destination: &Path) -> Result<(), RelocateError> {
    relocate_with(source, destination, |from, to| fs::rename(from, to))
}

fn relocate_with(
    source: &Path,
    destination: &Path,
    rename: impl FnOnce(&Path, &Path) -> io::Result<()>,
) -> Result<(), RelocateError> {
    let rename_err = match rename(source, destination) {
        Ok(()) => return Ok(()),
        Err(e) => e,
    };

    if !is_cross_device(&rename_err) {
        return Err(RelocateError::Rename(rename_err));
    }

    // Inspect the entry itself, never what a symlink points at.
    let file_type = fs::symlink_metadata(source)
        .map_err(RelocateError::OpenSource)?
        .file_type();
    if file_type.is_dir() {
        return Err(RelocateError::DirectoryAcrossDevices(source.to_path_buf()));
    }

    debug!(
        source = %source.display(),
        destination = %destination.display(),
        symlink = file_type.is_symlink(),
        "Rename crosses filesystems, falling back to copy"
    );
    if file_type.is_symlink() {
        relink(source, destination)
    } else {
        copy_then_remove(source, destination)
    }
}

/// Recreate a symlink at `destination` with the same target, then remove the
/// original link.
#[cfg(unix)]
fn relink(source: &Path, destination: &Path) -> Result<(), RelocateError> {
    let target = fs::read_link(source).map_err(RelocateError::OpenSource)?;
    std::os::unix::fs::symlink(&target, destination).map_err(RelocateError::CreateDestination)?;
    fs::remove_file(source).map_err(RelocateError::RemoveSource)
}

#[cfg(not(unix))]
fn relink(source: &Path, _destination: &Path) -> Result<(), RelocateError> {
    Err(RelocateError::SymlinkAcrossDevices(source.to_path_buf()))
}

fn copy_then_remove(source: &Path, destination: &Path) -> Result<(), RelocateError> {
    let mut input = File::open(source).map_err(RelocateError::OpenSource)?;
    let mut output = File::create(destination).map_err(RelocateError::CreateDestination)?;

    io::copy(&mut input, &mut output).map_err(RelocateError::Copy)?;
    output.sync_all().map_err(RelocateError::Copy)?;

    // Some platforms refuse to remove a file that still has an open handle.
    drop(input);
    drop(output);

    fs::remove_file(source).map_err(RelocateError::RemoveSource)
}
