//! Scan root resolution and validation.

use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub enum ScanPathError {
    NotFound(PathBuf),
    NotDirectory(PathBuf),
    NotReadable(PathBuf),
}

impl fmt::Display for ScanPathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanPathError::NotFound(path) => write!(f, "Path not found: {}", path.display()),
            ScanPathError::NotDirectory(path) => write!(f, "Not a directory: {}", path.display()),
            ScanPathError::NotReadable(path) => write!(f, "Cannot read directory: {}", path.display()),
        }
    }
}

impl std::error::Error for ScanPathError {}

/// Expand a leading `~` to the home directory.
pub fn expand_path(path: &Path) -> PathBuf {
    if path.starts_with("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(path.strip_prefix("~").unwrap_or(path));
        }
    }
    path.to_path_buf()
}

/// Expand, validate and canonicalize a scan root.
pub fn resolve_scan_root(path: &Path) -> Result<PathBuf, ScanPathError> {
    let expanded = expand_path(path);
    validate_scan_path(&expanded)?;
    expanded
        .canonicalize()
        .map_err(|_| ScanPathError::NotReadable(expanded.clone()))
}

pub fn validate_scan_path(path: &Path) -> Result<(), ScanPathError> {
    if !path.exists() {
        return Err(ScanPathError::NotFound(path.to_path_buf()));
    }
    if !path.is_dir() {
        return Err(ScanPathError::NotDirectory(path.to_path_buf()));
    }
    if std::fs::read_dir(path).is_err() {
        return Err(ScanPathError::NotReadable(path.to_path_buf()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_validate_scan_path() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("file.dcm");
        std::fs::write(&file, b"x").unwrap();

        assert!(validate_scan_path(temp.path()).is_ok());
        assert!(matches!(
            validate_scan_path(&temp.path().join("missing")),
            Err(ScanPathError::NotFound(_))
        ));
        assert!(matches!(validate_scan_path(&file), Err(ScanPathError::NotDirectory(_))));
    }

    #[test]
    fn test_resolve_scan_root_is_absolute() {
        let temp = TempDir::new().unwrap();
        let resolved = resolve_scan_root(temp.path()).unwrap();
        assert!(resolved.is_absolute());
        assert_eq!(resolved, temp.path().canonicalize().unwrap());
    }
}
