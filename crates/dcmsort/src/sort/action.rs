//! Filesystem actions for matched files.

use crate::sort::error::{Result, SortError};
use crate::sort::types::ActionKind;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

/// Applies actions with destinations relative to one output root.
#[derive(Debug, Clone)]
pub struct ActionExecutor {
    output_root: PathBuf,
}

impl ActionExecutor {
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
        }
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Join a resolved destination onto the output root. Absolute paths and
    /// `..` components are refused.
    pub fn destination_path(&self, relative: &str) -> Result<PathBuf> {
        let candidate = Path::new(relative);
        let escapes = candidate.components().any(|c| {
            matches!(
                c,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });
        if escapes || relative.is_empty() {
            return Err(SortError::UnsafeDestination(relative.to_string()));
        }
        Ok(self.output_root.join(candidate))
    }

    /// Apply `action` to `source`. Returns the absolute destination path
    /// (unused by delete).
    pub fn apply(&self, action: ActionKind, source: &Path, relative_destination: &str) -> Result<PathBuf> {
        let destination = match action {
            ActionKind::Delete => self.output_root.join(relative_destination),
            _ => self.destination_path(relative_destination)?,
        };

        match action {
            ActionKind::Move => {
                prepare_destination(&destination)?;
                move_file(source, &destination)?;
            }
            ActionKind::Copy => {
                prepare_destination(&destination)?;
                fs::copy(source, &destination)?;
            }
            ActionKind::Link => {
                prepare_destination(&destination)?;
                link_file(source, &destination)?;
            }
            ActionKind::Delete => fs::remove_file(source)?,
            ActionKind::Report => {
                info!(source = %source.display(), destination = %destination.display(), "report");
            }
        }

        debug!(
            action = %action,
            source = %source.display(),
            destination = %destination.display(),
            "Applied action"
        );
        Ok(destination)
    }
}

fn prepare_destination(destination: &Path) -> Result<()> {
    if fs::symlink_metadata(destination).is_ok() {
        return Err(SortError::DestinationExists(destination.to_path_buf()));
    }
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Rename, falling back to copy + remove when the rename cannot cross
/// filesystems.
fn move_file(source: &Path, destination: &Path) -> io::Result<()> {
    match fs::rename(source, destination) {
        Ok(()) => Ok(()),
        Err(err) if fs::symlink_metadata(source).is_ok() && !is_plain_failure(&err) => {
            debug!(source = %source.display(), error = %err, "Rename failed, copying instead");
            fs::copy(source, destination)?;
            fs::remove_file(source)
        }
        Err(err) => Err(err),
    }
}

fn is_plain_failure(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied | io::ErrorKind::AlreadyExists
    )
}

/// Symlink at `destination` pointing to `source` relative to the link's
/// directory.
fn link_file(source: &Path, destination: &Path) -> io::Result<()> {
    let link_dir = match destination.parent() {
        Some(parent) => parent.canonicalize()?,
        None => PathBuf::from("."),
    };
    let source_abs = if source.is_absolute() {
        source.to_path_buf()
    } else {
        std::env::current_dir()?.join(source)
    };
    let target = relative_path(&source_abs, &link_dir);
    symlink(&target, destination)
}

#[cfg(unix)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}

/// Path from directory `base` to `target`. Both must be absolute.
pub fn relative_path(target: &Path, base: &Path) -> PathBuf {
    let target: Vec<Component> = target.components().collect();
    let base: Vec<Component> = base.components().collect();
    let common = target
        .iter()
        .zip(&base)
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for _ in common..base.len() {
        relative.push("..");
    }
    for component in &target[common..] {
        relative.push(component.as_os_str());
    }
    relative
}
