//! Metadata extraction.
//!
//! Builds one [`MetadataRecord`] per scanned file. Extraction never fails: a
//! file that cannot be read as DICOM gets an empty header and
//! `recognized = false`.

use crate::sort::types::{fileinfo, MetadataRecord, StudyInfo};
use std::collections::BTreeMap;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use tracing::{debug, warn};

pub const DEFAULT_STUDYINFO_FILE: &str = "studyinfo.json";

/// Extraction progress, sent after each file.
#[derive(Debug, Clone, Copy)]
pub struct ExtractProgress {
    pub done: usize,
    pub total: usize,
}

/// Load the study info file from the scan root. A missing, unreadable or
/// malformed file yields an empty map.
pub fn load_study_info(root: &Path, file_name: &str) -> StudyInfo {
    let path = root.join(file_name);
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "No study info file");
            return StudyInfo::new();
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "Cannot read study info, using empty map");
            return StudyInfo::new();
        }
    };

    match serde_json::from_str::<serde_json::Value>(&content) {
        Ok(serde_json::Value::Object(map)) => map
            .into_iter()
            .map(|(key, value)| (key, json_to_text(value)))
            .collect(),
        Ok(_) => {
            warn!(path = %path.display(), "Study info is not a JSON object, using empty map");
            StudyInfo::new()
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "Malformed study info, using empty map");
            StudyInfo::new()
        }
    }
}

fn json_to_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => "None".to_string(),
        other => other.to_string(),
    }
}

/// Scan-run timestamp in ISO-8601 local time.
pub fn run_timestamp() -> String {
    chrono::Local::now()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}

pub struct Extractor {
    root: PathBuf,
    study: Arc<StudyInfo>,
    isotime: String,
}

impl Extractor {
    pub fn new(root: impl Into<PathBuf>, study: StudyInfo, isotime: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            study: Arc::new(study),
            isotime: isotime.into(),
        }
    }

    pub fn isotime(&self) -> &str {
        &self.isotime
    }

    /// Build the record for one file under the scan root.
    pub fn extract(&self, path: &Path) -> MetadataRecord {
        match dcmsort_header::read_file(path) {
            Ok(header) => MetadataRecord {
                fileinfo: self.file_info(path),
                studyinfo: Arc::clone(&self.study),
                header: header.into_elements(),
                recognized: true,
            },
            Err(err) => {
                debug!(path = %path.display(), error = %err, "Not a readable DICOM file");
                self.unrecognized(path)
            }
        }
    }

    fn unrecognized(&self, path: &Path) -> MetadataRecord {
        MetadataRecord {
            fileinfo: self.file_info(path),
            studyinfo: Arc::clone(&self.study),
            header: BTreeMap::new(),
            recognized: false,
        }
    }

    /// Run `read` for one file; a panic leaves the file unrecognized.
    fn guarded(&self, path: &Path, read: impl FnOnce() -> MetadataRecord) -> MetadataRecord {
        match panic::catch_unwind(AssertUnwindSafe(read)) {
            Ok(record) => record,
            Err(_) => {
                warn!(path = %path.display(), "Header reader panicked, file left unrecognized");
                self.unrecognized(path)
            }
        }
    }

    /// Extract every path, keeping input order. With `threads > 1` the list
    /// is split into contiguous chunks, one scoped thread each.
    pub fn extract_all(
        &self,
        paths: &[PathBuf],
        threads: usize,
        progress_tx: Option<mpsc::Sender<ExtractProgress>>,
    ) -> Vec<MetadataRecord> {
        let total = paths.len();
        let done = AtomicUsize::new(0);
        let report = |tx: &Option<mpsc::Sender<ExtractProgress>>| {
            let done = done.fetch_add(1, Ordering::Relaxed) + 1;
            if let Some(tx) = tx {
                let _ = tx.send(ExtractProgress { done, total });
            }
        };

        let threads = threads.max(1).min(total.max(1));
        if threads == 1 {
            return paths
                .iter()
                .map(|path| {
                    let record = self.guarded(path, || self.extract(path));
                    report(&progress_tx);
                    record
                })
                .collect();
        }

        let chunk_size = total.div_ceil(threads);
        std::thread::scope(|scope| {
            let handles: Vec<_> = paths
                .chunks(chunk_size)
                .map(|chunk| {
                    let tx = progress_tx.clone();
                    let report = &report;
                    scope.spawn(move || {
                        chunk
                            .iter()
                            .map(|path| {
                                let record = self.guarded(path, || self.extract(path));
                                report(&tx);
                                record
                            })
                            .collect::<Vec<_>>()
                    })
                })
                .collect();

            let mut records = Vec::with_capacity(total);
            for (handle, chunk) in handles.into_iter().zip(paths.chunks(chunk_size)) {
                match handle.join() {
                    Ok(chunk_records) => records.extend(chunk_records),
                    Err(_) => {
                        warn!(files = chunk.len(), "Extraction worker failed, its files are left unrecognized");
                        records.extend(chunk.iter().map(|path| self.unrecognized(path)));
                    }
                }
            }
            records
        })
    }

    fn file_info(&self, path: &Path) -> BTreeMap<String, String> {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        let folders: Vec<String> = relative
            .parent()
            .map(|dir| {
                dir.components()
                    .filter_map(|c| match c {
                        Component::Normal(name) => Some(name.to_string_lossy().to_string()),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default();

        let name = |p: Option<&std::ffi::OsStr>| p.map(|s| s.to_string_lossy().to_string()).unwrap_or_default();
        let filename = name(path.file_name());
        let stem = name(path.file_stem());
        let ext = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        let mut info = BTreeMap::new();
        info.insert(fileinfo::FILENAME.to_string(), filename);
        info.insert(fileinfo::STEM.to_string(), stem);
        info.insert(fileinfo::EXT.to_string(), ext);
        info.insert(
            fileinfo::ABSPATH.to_string(),
            self.root.join(relative).to_string_lossy().to_string(),
        );
        info.insert(fileinfo::RELPATH.to_string(), folders.join("/"));
        info.insert(fileinfo::ISOTIME.to_string(), self.isotime.clone());
        for (level, folder) in folders.iter().rev().enumerate() {
            info.insert(fileinfo::relpath_component(level), folder.clone());
        }
        info
    }
}
