//! End-to-end run: load inputs, extract every submission, reconcile, aggregate.
//!
//! Each stage hands an owned value to the next; nothing mutable outlives its
//! stage.

use crate::aggregate;
use crate::config::ArenaConfig;
use crate::dispatch::{self, ExtractionStats};
use crate::fingerprint::{self, Fingerprint};
use crate::inputs::{self, LeaderboardRow, LeaderboardSnapshot};
use crate::model::{
    DifficultyEntry, HeatmapMatrix, LeaderboardEntry, ModelRecord, ResultRecord, TaskRecord,
};
use crate::reconcile::{self, CatalogueEntry, Reconciliation};
use crate::store::{ResultStore, StoreBuilder};
use anyhow::Result;

/// The normalized datasets, ready to emit.
#[derive(Debug, Clone, PartialEq)]
pub struct Datasets {
    pub models: Vec<ModelRecord>,
    pub tasks: Vec<TaskRecord>,
    pub results: Vec<ResultRecord>,
    pub leaderboard: Vec<LeaderboardEntry>,
    pub difficulty: Vec<DifficultyEntry>,
    pub heatmap: HeatmapMatrix,
}

#[derive(Debug)]
pub struct Extracted {
    pub store: ResultStore,
    pub stats: Vec<ExtractionStats>,
}

#[derive(Debug)]
pub struct RunOutput {
    pub datasets: Datasets,
    pub reconciliation: Reconciliation,
    pub extraction: Vec<ExtractionStats>,
    /// Store restricted to reconciled models; the basis of every statistic.
    pub store: ResultStore,
    pub leaderboard: LeaderboardSnapshot,
    pub fingerprint: Fingerprint,
}

/// Runs every submission through its extractor, in catalogue order.
///
/// Each submission fills its own partition; partitions are merged in
/// catalogue order so store iteration order follows the catalogue.
pub fn extract_all(cfg: &ArenaConfig) -> Extracted {
    let mut merged = StoreBuilder::new();
    let mut stats = Vec::with_capacity(cfg.submissions.len());
    for s in &cfg.submissions {
        let mut partition = StoreBuilder::new();
        let root = cfg.submission_root(s);
        stats.push(dispatch::extract_submission(
            &s.id,
            &root,
            &s.format(),
            &mut partition,
        ));
        merged.merge(partition);
    }
    Extracted {
        store: merged.finish(),
        stats,
    }
}

/// Pure part of the run: everything after extraction.
pub fn normalize(
    tasks: Vec<TaskRecord>,
    rows: &[LeaderboardRow],
    catalogue: &[CatalogueEntry],
    store: &ResultStore,
    benchmark_size: usize,
) -> (Datasets, Reconciliation, ResultStore) {
    let reconciliation = reconcile::reconcile(catalogue, rows, store);

    // unreconciled models leave every output, including the matrix
    let store = store.restricted_to(reconciliation.models.iter().map(|m| m.id.as_str()));

    let leaderboard =
        aggregate::build_leaderboard(&reconciliation.models, &tasks, &store, benchmark_size);
    let difficulty = aggregate::build_difficulty(&tasks, &store);
    let heatmap = aggregate::build_heatmap(&tasks, &store);
    let results = store.flatten();

    let datasets = Datasets {
        models: reconciliation.models.clone(),
        tasks,
        results,
        leaderboard,
        difficulty,
        heatmap,
    };
    (datasets, reconciliation, store)
}

pub fn run(cfg: &ArenaConfig) -> Result<RunOutput> {
    // inputs first: a missing metadata file aborts before any extraction
    let tasks = inputs::load_tasks(&cfg.paths.tasks)?;
    let snapshot = inputs::load_leaderboard(&cfg.paths.leaderboard, &cfg.leaderboard)?;
    tracing::info!(
        event = "arena.inputs.loaded",
        tasks = tasks.len(),
        leaderboard_rows = snapshot.rows.len(),
        skipped_rows = snapshot.skipped_rows,
    );

    let submissions: Vec<(String, String)> = cfg
        .submissions
        .iter()
        .map(|s| {
            let descriptor = serde_json::to_string(&(&s.path, s.layout, &s.extractor, s.read_limit))
                .unwrap_or_default();
            (s.id.clone(), descriptor)
        })
        .collect();
    let fingerprint = fingerprint::compute(fingerprint::Context {
        tasks_sha256: &fingerprint::file_sha256(&cfg.paths.tasks)?,
        leaderboard_sha256: &fingerprint::file_sha256(&cfg.paths.leaderboard)?,
        benchmark_size: cfg.benchmark_size,
        submissions: &submissions,
    });

    let Extracted { store, stats } = extract_all(cfg);
    tracing::info!(
        event = "arena.extract.done",
        models_with_data = store.models_with_data(),
        records = store.len(),
    );

    let catalogue: Vec<CatalogueEntry> =
        cfg.submissions.iter().map(|s| s.catalogue_entry()).collect();
    let (datasets, reconciliation, store) = normalize(
        tasks,
        &snapshot.rows,
        &catalogue,
        &store,
        cfg.benchmark_size,
    );
    tracing::info!(
        event = "arena.normalize.done",
        models = datasets.models.len(),
        unmatched = reconciliation.unmatched.len(),
        results = datasets.results.len(),
    );

    Ok(RunOutput {
        datasets,
        reconciliation,
        extraction: stats,
        store,
        leaderboard: snapshot,
        fingerprint,
    })
}
