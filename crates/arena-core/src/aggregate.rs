//! Leaderboard, per-task difficulty and the outcome matrix.

use crate::model::{
    rate_pct, Difficulty, DifficultyEntry, DomainStats, HeatmapMatrix, LeaderboardEntry,
    ModelRecord, Outcome, TaskId, TaskRecord,
};
use crate::store::ResultStore;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Ranked leaderboard. `success_rate` is always the official rate.
pub fn build_leaderboard(
    models: &[ModelRecord],
    tasks: &[TaskRecord],
    store: &ResultStore,
    benchmark_size: usize,
) -> Vec<LeaderboardEntry> {
    let sites = site_index(tasks);

    let mut entries: Vec<LeaderboardEntry> = models
        .iter()
        .map(|m| match store.outcomes_for(&m.id).filter(|o| !o.is_empty()) {
            Some(outcomes) => {
                let total = outcomes.len();
                let successes = outcomes.values().filter(|o| o.is_success()).count();
                LeaderboardEntry {
                    id: m.id.clone(),
                    name: m.display_name.clone(),
                    rank: 0,
                    total_tasks: total,
                    successes,
                    success_rate: m.official_success_rate,
                    computed_rate: Some(rate_pct(successes, total)),
                    domain_breakdown: domain_breakdown(outcomes, &sites),
                    has_trajectories: true,
                }
            }
            None => LeaderboardEntry {
                id: m.id.clone(),
                name: m.display_name.clone(),
                rank: 0,
                total_tasks: benchmark_size,
                successes: estimate_successes(benchmark_size, m.official_success_rate),
                success_rate: m.official_success_rate,
                computed_rate: None,
                domain_breakdown: BTreeMap::new(),
                has_trajectories: false,
            },
        })
        .collect();

    // stable: equal rates keep catalogue order
    entries.sort_by(|a, b| {
        b.success_rate
            .partial_cmp(&a.success_rate)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    for (i, e) in entries.iter_mut().enumerate() {
        e.rank = i + 1;
    }
    entries
}

pub fn estimate_successes(benchmark_size: usize, official_rate: f64) -> usize {
    (benchmark_size as f64 * official_rate / 100.0).round().max(0.0) as usize
}

fn site_index(tasks: &[TaskRecord]) -> HashMap<TaskId, &str> {
    let mut idx = HashMap::with_capacity(tasks.len());
    for t in tasks {
        // first occurrence wins for duplicated ids
        idx.entry(t.id).or_insert(t.site.as_str());
    }
    idx
}

/// Groups outcomes by task site. Tasks missing from the metadata are skipped.
fn domain_breakdown(
    outcomes: &BTreeMap<TaskId, Outcome>,
    sites: &HashMap<TaskId, &str>,
) -> BTreeMap<String, DomainStats> {
    let mut out: BTreeMap<String, DomainStats> = BTreeMap::new();
    for (task_id, outcome) in outcomes {
        let Some(site) = sites.get(task_id) else {
            continue;
        };
        let stats = out.entry(site.to_string()).or_default();
        stats.total_count += 1;
        if outcome.is_success() {
            stats.success_count += 1;
        }
    }
    for stats in out.values_mut() {
        stats.rate = rate_pct(stats.success_count, stats.total_count);
    }
    out
}

/// One entry per task in metadata order. The denominator is the number of
/// models that have any trajectory data.
pub fn build_difficulty(tasks: &[TaskRecord], store: &ResultStore) -> Vec<DifficultyEntry> {
    let models_with_data = store.models_with_data();

    tasks
        .iter()
        .map(|t| {
            let passing_models: Vec<String> = store
                .model_ids()
                .filter(|m| store.outcome(m, t.id) == Some(Outcome::Success))
                .map(String::from)
                .collect();
            let success_count = passing_models.len();
            let success_rate = rate_pct(success_count, models_with_data);
            DifficultyEntry {
                id: t.id,
                success_count,
                success_rate,
                difficulty: Difficulty::from_rate(success_rate),
                passing_models,
            }
        })
        .collect()
}

/// Dense `task x model` matrix over models with data; `None` means no signal.
pub fn build_heatmap(tasks: &[TaskRecord], store: &ResultStore) -> HeatmapMatrix {
    let mut model_ids: Vec<String> = store.model_ids().map(String::from).collect();
    model_ids.sort();
    let task_ids: Vec<TaskId> = tasks
        .iter()
        .map(|t| t.id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let matrix = task_ids
        .iter()
        .map(|t| {
            model_ids
                .iter()
                .map(|m| store.outcome(m, *t).and_then(|o| o.as_bit()))
                .collect()
        })
        .collect();

    HeatmapMatrix {
        model_ids,
        task_ids,
        matrix,
    }
}
