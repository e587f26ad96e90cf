//! Writes the normalized datasets and the run manifest.

use crate::dispatch::ExtractionStats;
use crate::fingerprint::Fingerprint;
use crate::pipeline::{Datasets, RunOutput};
use crate::reconcile::{AmbiguousMatch, UnmatchedModel};
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const MODELS_FILE: &str = "models.json";
pub const TASKS_FILE: &str = "tasks.json";
pub const RESULTS_FILE: &str = "results.json";
pub const LEADERBOARD_FILE: &str = "leaderboard.json";
pub const DIFFICULTY_FILE: &str = "task_difficulty.json";
pub const HEATMAP_FILE: &str = "heatmap_data.json";
pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WrittenFile {
    pub name: &'static str,
    pub entries: usize,
    pub bytes: u64,
}

#[derive(Debug, Serialize)]
pub struct RunManifest<'a> {
    pub arena_version: &'static str,
    /// Only non-deterministic field in the output set.
    pub generated_at: String,
    pub input_fingerprint: &'a Fingerprint,
    pub leaderboard_last_updated: Option<&'a str>,
    pub skipped_leaderboard_rows: usize,
    pub extraction: &'a [ExtractionStats],
    pub unmatched_models: &'a [UnmatchedModel],
    pub ambiguous_matches: &'a [AmbiguousMatch],
    pub files: &'a [WrittenFile],
}

/// Writes the six datasets. Output bytes depend only on `datasets`.
pub fn write_datasets(out_dir: &Path, datasets: &Datasets) -> Result<Vec<WrittenFile>> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create output dir: {}", out_dir.display()))?;

    let heatmap_cells = datasets.heatmap.task_ids.len() * datasets.heatmap.model_ids.len();
    Ok(vec![
        write_json(out_dir, MODELS_FILE, &datasets.models, datasets.models.len())?,
        write_json(out_dir, TASKS_FILE, &datasets.tasks, datasets.tasks.len())?,
        write_json(out_dir, RESULTS_FILE, &datasets.results, datasets.results.len())?,
        write_json(
            out_dir,
            LEADERBOARD_FILE,
            &datasets.leaderboard,
            datasets.leaderboard.len(),
        )?,
        write_json(
            out_dir,
            DIFFICULTY_FILE,
            &datasets.difficulty,
            datasets.difficulty.len(),
        )?,
        write_json(out_dir, HEATMAP_FILE, &datasets.heatmap, heatmap_cells)?,
    ])
}

/// Writes datasets plus `manifest.json`.
pub fn write_all(out_dir: &Path, run: &RunOutput) -> Result<Vec<WrittenFile>> {
    let mut files = write_datasets(out_dir, &run.datasets)?;

    let manifest = RunManifest {
        arena_version: env!("CARGO_PKG_VERSION"),
        generated_at: chrono::Utc::now().to_rfc3339(),
        input_fingerprint: &run.fingerprint,
        leaderboard_last_updated: run.leaderboard.last_updated.as_deref(),
        skipped_leaderboard_rows: run.leaderboard.skipped_rows,
        extraction: &run.extraction,
        unmatched_models: &run.reconciliation.unmatched,
        ambiguous_matches: &run.reconciliation.ambiguous,
        files: &files,
    };
    let written = write_json(out_dir, MANIFEST_FILE, &manifest, files.len())?;
    files.push(written);

    tracing::info!(
        event = "arena.emit.done",
        out_dir = %out_dir.display(),
        files = files.len(),
        bytes = files.iter().map(|f| f.bytes).sum::<u64>(),
    );
    Ok(files)
}

fn write_json<T: Serialize + ?Sized>(
    out_dir: &Path,
    name: &'static str,
    value: &T,
    entries: usize,
) -> Result<WrittenFile> {
    let path: PathBuf = out_dir.join(name);
    let file = File::create(&path)
        .with_context(|| format!("failed to create output file: {}", path.display()))?;
    let mut w = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut w, value)
        .with_context(|| format!("failed to write {}", name))?;
    w.flush()
        .with_context(|| format!("failed to flush {}", path.display()))?;

    let bytes = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
    Ok(WrittenFile {
        name,
        entries,
        bytes,
    })
}
