//! File discovery and extractor dispatch for one submission.

use crate::errors::RecordError;
use crate::extract::{Extractor, RawRecord};
use crate::model::{Outcome, TaskId};
use crate::store::StoreBuilder;
use crate::task_id;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// How a submission's records are laid out on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// One JSON-Lines file holding every record.
    JsonlFile,
    /// A directory of `*.jsonl` files.
    JsonlDir,
    /// A directory of `*.json` files, one record each. When the directory has
    /// none, its immediate subdirectories are scanned instead.
    JsonDir,
}

impl Layout {
    fn is_line_oriented(&self) -> bool {
        matches!(self, Layout::JsonlFile | Layout::JsonlDir)
    }
}

/// Everything the dispatcher needs to know about a submission's schema.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionFormat {
    pub layout: Layout,
    pub extractor: Extractor,
    /// Single-record files are read up to this many bytes. `None` reads all.
    pub read_limit: Option<usize>,
}

/// Per-submission counters. Reporting only; statistics use the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionStats {
    pub model_id: String,
    pub path: PathBuf,
    /// Submission path did not exist or had the wrong kind.
    pub missing: bool,
    pub files: usize,
    pub records: usize,
    /// Writes into the store, duplicates included.
    pub stored: usize,
    pub recovered_from_filename: usize,
    pub dropped: usize,
    /// Failure counts keyed by [`RecordError::kind`].
    pub errors: BTreeMap<String, usize>,
}

impl ExtractionStats {
    fn note_error(&mut self, e: &RecordError) {
        *self.errors.entry(e.kind().to_string()).or_default() += 1;
    }

    pub fn error_count(&self) -> usize {
        self.errors.values().sum()
    }
}

/// Extracts every record of one submission into `store`.
///
/// Never fails: unreadable files and records are counted and skipped.
pub fn extract_submission(
    model_id: &str,
    root: &Path,
    format: &SubmissionFormat,
    store: &mut StoreBuilder,
) -> ExtractionStats {
    let mut stats = ExtractionStats {
        model_id: model_id.to_string(),
        path: root.to_path_buf(),
        ..Default::default()
    };

    let Some(files) = discover(root, format.layout) else {
        tracing::warn!(
            event = "arena.extract.missing",
            model_id = %model_id,
            path = %root.display(),
            layout = ?format.layout,
            "submission path missing, no trajectory data"
        );
        stats.missing = true;
        return stats;
    };
    stats.files = files.len();

    for file in &files {
        if format.layout.is_line_oriented() {
            extract_lines(model_id, file, &format.extractor, store, &mut stats);
        } else {
            extract_file(model_id, file, format, store, &mut stats);
        }
    }

    tracing::info!(
        event = "arena.extract.submission",
        model_id = %model_id,
        extractor = format.extractor.name(),
        files = stats.files,
        records = stats.records,
        stored = stats.stored,
        recovered = stats.recovered_from_filename,
        dropped = stats.dropped,
        errors = stats.error_count(),
    );
    stats
}

/// Lists the files of a submission in a stable order. `None` when the path
/// does not fit the layout at all.
pub fn discover(root: &Path, layout: Layout) -> Option<Vec<PathBuf>> {
    match layout {
        Layout::JsonlFile => root.is_file().then(|| vec![root.to_path_buf()]),
        Layout::JsonlDir => root.is_dir().then(|| scan(root, 1, "jsonl")),
        Layout::JsonDir => {
            if !root.is_dir() {
                return None;
            }
            let flat = scan(root, 1, "json");
            if flat.is_empty() {
                Some(scan(root, 2, "json"))
            } else {
                Some(flat)
            }
        }
    }
}

fn scan(root: &Path, depth: usize, ext: &str) -> Vec<PathBuf> {
    WalkDir::new(root)
        .min_depth(depth)
        .max_depth(depth)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| !e.file_name().to_string_lossy().starts_with('.'))
        .filter(|e| e.path().extension().is_some_and(|x| x == ext))
        .map(|e| e.into_path())
        .collect()
}

fn extract_file(
    model_id: &str,
    path: &Path,
    format: &SubmissionFormat,
    store: &mut StoreBuilder,
    stats: &mut ExtractionStats,
) {
    stats.records += 1;
    let name = file_name(path);

    let extracted = if format.extractor.reads_payload() {
        read_prefix(path, format.read_limit).and_then(|payload| {
            format.extractor.extract(&RawRecord {
                source_name: &name,
                payload: &payload,
            })
        })
    } else {
        format.extractor.extract(&RawRecord {
            source_name: &name,
            payload: "",
        })
    };

    let (task_id, outcome) = match extracted {
        Ok(ex) => (ex.task_id, ex.outcome),
        Err(e) => {
            tracing::debug!(model_id = %model_id, file = %path.display(), error = %e, "record skipped");
            stats.note_error(&e);
            (None, Outcome::Unknown)
        }
    };

    let task_id = task_id.or_else(|| {
        let id = task_id::from_path(path);
        if id.is_some() {
            stats.recovered_from_filename += 1;
        }
        id
    });

    store_or_drop(model_id, task_id, outcome, store, stats);
}

fn extract_lines(
    model_id: &str,
    path: &Path,
    extractor: &Extractor,
    store: &mut StoreBuilder,
    stats: &mut ExtractionStats,
) {
    let name = file_name(path);
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            tracing::warn!(model_id = %model_id, file = %path.display(), error = %e, "failed to open");
            stats.note_error(&RecordError::Read(e.to_string()));
            return;
        }
    };
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                stats.note_error(&RecordError::Read(e.to_string()));
                break;
            }
        }
        let line = String::from_utf8_lossy(&buf);
        if line.trim().is_empty() {
            continue;
        }
        stats.records += 1;

        match extractor.extract(&RawRecord {
            source_name: &name,
            payload: line.trim(),
        }) {
            Ok(ex) => store_or_drop(model_id, ex.task_id, ex.outcome, store, stats),
            Err(e) => {
                tracing::debug!(model_id = %model_id, file = %path.display(), error = %e, "line skipped");
                stats.note_error(&e);
                stats.dropped += 1;
            }
        }
    }
}

fn store_or_drop(
    model_id: &str,
    task_id: Option<TaskId>,
    outcome: Outcome,
    store: &mut StoreBuilder,
    stats: &mut ExtractionStats,
) {
    match task_id {
        Some(id) => {
            store.record(model_id, id, outcome);
            stats.stored += 1;
        }
        None => {
            stats.note_error(&RecordError::MissingTaskId);
            stats.dropped += 1;
        }
    }
}

/// Reads at most `limit` bytes, decoding lossily.
fn read_prefix(path: &Path, limit: Option<usize>) -> Result<String, RecordError> {
    let file = File::open(path).map_err(|e| RecordError::Read(e.to_string()))?;
    let mut bytes = Vec::new();
    let read = match limit {
        Some(n) => file.take(n as u64).read_to_end(&mut bytes),
        None => BufReader::new(file).read_to_end(&mut bytes),
    };
    read.map_err(|e| RecordError::Read(e.to_string()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn explicit() -> Extractor {
        Extractor::ExplicitFields {
            id_field: "task_id".into(),
            success_field: "success".into(),
        }
    }

    fn fmt(layout: Layout, extractor: Extractor) -> SubmissionFormat {
        SubmissionFormat {
            layout,
            extractor,
            read_limit: None,
        }
    }

    #[test]
    fn json_dir_falls_back_to_filename_id() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        fs::write(dir.path().join("task_3.json"), r#"{"success": true}"#)?;
        fs::write(dir.path().join("notes.json"), r#"{"success": true}"#)?;
        // corrupt payload still yields an unknown for a named file
        fs::write(dir.path().join("9.json"), r#"{"task_id": 9, "succ"#)?;

        let mut b = StoreBuilder::new();
        let stats = extract_submission("m", dir.path(), &fmt(Layout::JsonDir, explicit()), &mut b);
        let s = b.finish();

        assert_eq!(s.outcome("m", 3), Some(Outcome::Success));
        assert_eq!(s.outcome("m", 9), Some(Outcome::Unknown));
        assert_eq!(stats.files, 3);
        assert_eq!(stats.stored, 2);
        assert_eq!(stats.recovered_from_filename, 2);
        assert_eq!(stats.dropped, 1);
        assert_eq!(stats.errors.get("parse"), Some(&1));
        assert_eq!(stats.errors.get("missing_task_id"), Some(&1));
        Ok(())
    }

    #[test]
    fn json_dir_scans_subdirectories_when_flat_is_empty() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        fs::create_dir_all(dir.path().join("a"))?;
        fs::create_dir_all(dir.path().join("b/deeper"))?;
        fs::write(dir.path().join("a/1.json"), "{}")?;
        fs::write(dir.path().join("b/2.json"), "{}")?;
        fs::write(dir.path().join("b/deeper/3.json"), "{}")?;

        let files = discover(dir.path(), Layout::JsonDir).unwrap();
        let names: Vec<_> = files.iter().map(|p| file_name(p)).collect();
        assert_eq!(names, vec!["1.json", "2.json"]);
        Ok(())
    }

    #[test]
    fn filename_fallback_ignores_parent_directories() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        fs::create_dir_all(dir.path().join("task_99"))?;
        fs::write(dir.path().join("task_99/12.json"), r#"{"success": true}"#)?;

        let mut b = StoreBuilder::new();
        let stats = extract_submission("m", dir.path(), &fmt(Layout::JsonDir, explicit()), &mut b);
        let s = b.finish();

        assert_eq!(s.outcome("m", 12), Some(Outcome::Success));
        assert_eq!(s.outcome("m", 99), None);
        assert_eq!(stats.recovered_from_filename, 1);
        Ok(())
    }

    #[test]
    fn jsonl_file_last_write_wins_and_skips_bad_lines() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("jace.jsonl");
        fs::write(
            &path,
            "{\"task_id\": 1, \"success\": true}\n\
             \n\
             not json\n\
             {\"success\": true}\n\
             {\"task_id\": 1, \"success\": false}\n",
        )?;

        let mut b = StoreBuilder::new();
        let stats = extract_submission("j", &path, &fmt(Layout::JsonlFile, explicit()), &mut b);
        let s = b.finish();

        assert_eq!(s.outcome("j", 1), Some(Outcome::Failure));
        assert_eq!(s.record_count("j"), 1);
        assert_eq!(stats.records, 4);
        assert_eq!(stats.stored, 2);
        assert_eq!(stats.dropped, 2);
        assert_eq!(stats.recovered_from_filename, 0);
        Ok(())
    }

    #[test]
    fn jsonl_dir_reads_every_jsonl_file() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        fs::write(dir.path().join("a.jsonl"), "{\"task_id\": 1, \"success\": true}\n")?;
        fs::write(dir.path().join("b.jsonl"), "{\"task_id\": 2, \"success\": false}\n")?;
        fs::write(dir.path().join("c.json"), "{\"task_id\": 3, \"success\": false}\n")?;

        let mut b = StoreBuilder::new();
        let stats = extract_submission("g", dir.path(), &fmt(Layout::JsonlDir, explicit()), &mut b);
        let s = b.finish();
        assert_eq!(stats.files, 2);
        assert_eq!(s.record_count("g"), 2);
        Ok(())
    }

    #[test]
    fn read_limit_truncates_into_unknown() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let padding = "x".repeat(200);
        fs::write(
            dir.path().join("12.json"),
            format!(r#"{{"id": 12, "pad": "{padding}", "trajectory": [{{"success": true}}]}}"#),
        )?;
        let ex: Extractor = serde_yaml::from_str("type: trajectory_tail")?;
        let format = SubmissionFormat {
            layout: Layout::JsonDir,
            extractor: ex,
            read_limit: Some(64),
        };

        let mut b = StoreBuilder::new();
        extract_submission("s", dir.path(), &format, &mut b);
        assert_eq!(b.finish().outcome("s", 12), Some(Outcome::Unknown));
        Ok(())
    }

    #[test]
    fn missing_path_is_not_fatal() {
        let mut b = StoreBuilder::new();
        let stats = extract_submission(
            "gone",
            Path::new("/definitely/not/here"),
            &fmt(Layout::JsonDir, explicit()),
            &mut b,
        );
        assert!(stats.missing);
        assert!(!b.finish().has_data("gone"));
    }
}
