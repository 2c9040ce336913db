//! Directory scanning.
//!
//! Files are listed post-order: every subdirectory's files (recursively)
//! come before the files of the directory itself. Siblings are ordered by
//! name, so repeated scans of an unchanged tree give the same list. Symbolic
//! links are not followed into directories; a link to a regular file is
//! listed as a file.

use crate::sort::error::Result;
use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// A directory entry that could not be read.
#[derive(Debug, Clone)]
pub struct ScanIssue {
    pub path: Option<PathBuf>,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub files: Vec<PathBuf>,
    pub dirs_scanned: usize,
    pub issues: Vec<ScanIssue>,
}

/// Scan `root` for regular files. Unreadable subdirectories are recorded in
/// [`ScanOutcome::issues`] and skipped; an unreadable root is an error.
pub fn scan(root: &Path) -> Result<ScanOutcome> {
    fs::read_dir(root)?;

    let mut outcome = ScanOutcome::default();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .contents_first(true)
        .sort_by(directories_first);

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(error = %err, "Skipping unreadable entry");
                outcome.issues.push(ScanIssue {
                    path: err.path().map(Path::to_path_buf),
                    message: err.to_string(),
                });
                continue;
            }
        };

        let file_type = entry.file_type();
        if file_type.is_dir() {
            outcome.dirs_scanned += 1;
        } else if file_type.is_file() || (file_type.is_symlink() && points_to_file(entry.path())) {
            outcome.files.push(entry.into_path());
        }
    }

    debug!(
        root = %root.display(),
        files = outcome.files.len(),
        dirs = outcome.dirs_scanned,
        "Scan complete"
    );
    Ok(outcome)
}

fn directories_first(a: &DirEntry, b: &DirEntry) -> Ordering {
    let a_dir = a.file_type().is_dir();
    let b_dir = b.file_type().is_dir();
    b_dir
        .cmp(&a_dir)
        .then_with(|| a.file_name().cmp(b.file_name()))
}

fn points_to_file(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.is_file()).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"x").unwrap();
    }

    fn relative(root: &Path, files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn test_post_order_listing() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        touch(root, "top.dcm");
        touch(root, "b/b1.dcm");
        touch(root, "a/z.dcm");
        touch(root, "a/inner/i1.dcm");
        touch(root, "a/inner/i0.dcm");
        fs::create_dir_all(root.join("empty")).unwrap();

        let outcome = scan(root).unwrap();
        assert_eq!(
            relative(root, &outcome.files),
            vec!["a/inner/i0.dcm", "a/inner/i1.dcm", "a/z.dcm", "b/b1.dcm", "top.dcm"]
        );
        // root, a, a/inner, b, empty
        assert_eq!(outcome.dirs_scanned, 5);
        assert!(outcome.issues.is_empty());
    }

    #[test]
    fn test_scan_is_deterministic() {
        let temp = TempDir::new().unwrap();
        for rel in ["s2/f2", "s1/f1", "s1/f0", "g"] {
            touch(temp.path(), rel);
        }
        let first = scan(temp.path()).unwrap().files;
        let second = scan(temp.path()).unwrap().files;
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_root() {
        let temp = TempDir::new().unwrap();
        let outcome = scan(temp.path()).unwrap();
        assert!(outcome.files.is_empty());
    }

    #[test]
    fn test_missing_root_is_error() {
        let temp = TempDir::new().unwrap();
        assert!(scan(&temp.path().join("absent")).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("root");
        touch(&root, "d/real.dcm");
        touch(temp.path(), "outside/hidden.dcm");
        std::os::unix::fs::symlink(root.join("d/real.dcm"), root.join("link.dcm")).unwrap();
        std::os::unix::fs::symlink(temp.path().join("outside"), root.join("dirlink")).unwrap();
        std::os::unix::fs::symlink(root.join("nowhere"), root.join("dangling")).unwrap();

        let outcome = scan(&root).unwrap();
        assert_eq!(relative(&root, &outcome.files), vec!["d/real.dcm", "link.dcm"]);
    }
}
