//! Recovers a task id from a submission filename.

use crate::model::TaskId;
use regex::Regex;
use std::sync::OnceLock;

/// Checked in order; the first pattern that matches decides.
const PATTERNS: [&str; 4] = [
    r"^(\d+)\.json",
    r"task_(\d+)",
    r"webarena_(\d+)",
    r"task_summary_flat_(\d+)",
];

fn patterns() -> &'static [Regex] {
    static COMPILED: OnceLock<Vec<Regex>> = OnceLock::new();
    COMPILED.get_or_init(|| {
        PATTERNS
            .iter()
            .filter_map(|p| Regex::new(p).ok())
            .collect()
    })
}

/// Returns the first integer captured by the filename patterns, or `None`.
pub fn from_filename(name: &str) -> Option<TaskId> {
    patterns().iter().find_map(|re| {
        re.captures(name)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<TaskId>().ok())
    })
}

/// Same as [`from_filename`] but takes the last component of a path.
pub fn from_path(path: &std::path::Path) -> Option<TaskId> {
    path.file_name()
        .map(|n| n.to_string_lossy())
        .and_then(|n| from_filename(&n))
}
