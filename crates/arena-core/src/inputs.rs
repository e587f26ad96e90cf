//! Loaders for the two authoritative inputs: task metadata and leaderboard rows.
//!
//! Both are fatal when missing or unparseable. Individual leaderboard rows
//! that carry no usable model name or rate are skipped.

use crate::model::{TaskId, TaskRecord};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

pub const REFERENCE_PREVIEW_CHARS: usize = 100;

#[derive(Debug, Deserialize)]
struct RawTask {
    task_id: TaskId,
    #[serde(default)]
    intent: String,
    #[serde(default)]
    sites: Option<Vec<String>>,
    #[serde(default)]
    intent_template_id: Option<Value>,
    #[serde(default)]
    eval: Option<RawEval>,
}

#[derive(Debug, Default, Deserialize)]
struct RawEval {
    #[serde(default)]
    eval_types: Option<Vec<String>>,
    #[serde(default)]
    reference_answers: Option<Value>,
}

impl From<RawTask> for TaskRecord {
    fn from(raw: RawTask) -> Self {
        let eval = raw.eval.unwrap_or_default();
        let site = raw
            .sites
            .and_then(|s| s.into_iter().next())
            .unwrap_or_else(|| "unknown".to_string());
        let eval_type = eval
            .eval_types
            .and_then(|t| t.into_iter().next())
            .unwrap_or_else(|| "unknown".to_string());
        let reference = match eval.reference_answers {
            Some(v) => serde_json::to_string(&v).unwrap_or_default(),
            None => "{}".to_string(),
        };

        TaskRecord {
            id: raw.task_id,
            intent: raw.intent,
            site,
            template_id: raw.intent_template_id.as_ref().and_then(Value::as_i64),
            eval_type,
            reference_answer_preview: reference.chars().take(REFERENCE_PREVIEW_CHARS).collect(),
        }
    }
}

pub fn load_tasks(path: &Path) -> Result<Vec<TaskRecord>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read task metadata: {}", path.display()))?;
    parse_tasks(&raw).with_context(|| format!("failed to parse task metadata: {}", path.display()))
}

pub fn parse_tasks(raw: &str) -> Result<Vec<TaskRecord>> {
    let tasks: Vec<RawTask> = serde_json::from_str(raw)?;
    Ok(tasks.into_iter().map(TaskRecord::from).collect())
}

/// Column names of the external leaderboard sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeaderboardColumns {
    pub model_column: String,
    pub rate_column: String,
    pub open_column: String,
    pub open_marker: String,
    pub size_column: String,
    /// Candidates in order; the first present non-null value is the date.
    pub date_columns: Vec<String>,
}

impl Default for LeaderboardColumns {
    fn default() -> Self {
        Self {
            model_column: "Model".into(),
            rate_column: "Success Rate (%)".into(),
            open_column: "Open?".into(),
            open_marker: "✓".into(),
            size_column: "Model Size (billion)".into(),
            date_columns: vec!["Date".into(), "a".into()],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardRow {
    pub model: String,
    pub success_rate: f64,
    pub is_open: bool,
    pub size_billion: Option<f64>,
    pub date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeaderboardSnapshot {
    pub last_updated: Option<String>,
    pub rows: Vec<LeaderboardRow>,
    pub skipped_rows: usize,
}

pub fn load_leaderboard(path: &Path, cols: &LeaderboardColumns) -> Result<LeaderboardSnapshot> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read leaderboard: {}", path.display()))?;
    let value: Value = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse leaderboard JSON: {}", path.display()))?;
    parse_leaderboard(&value, cols)
        .with_context(|| format!("unexpected leaderboard layout: {}", path.display()))
}

/// Accepts `{"last_updated": .., "leaderboard": [..]}` or a bare row array.
pub fn parse_leaderboard(value: &Value, cols: &LeaderboardColumns) -> Result<LeaderboardSnapshot> {
    let (last_updated, rows) = match value {
        Value::Array(rows) => (None, rows),
        Value::Object(obj) => {
            let rows = obj
                .get("leaderboard")
                .and_then(Value::as_array)
                .context("object has no 'leaderboard' array")?;
            let updated = obj
                .get("last_updated")
                .and_then(Value::as_str)
                .map(String::from);
            (updated, rows)
        }
        _ => anyhow::bail!("expected an array of rows or an object with 'leaderboard'"),
    };

    let mut snapshot = LeaderboardSnapshot {
        last_updated,
        ..Default::default()
    };
    for (i, row) in rows.iter().enumerate() {
        match parse_row(row, cols) {
            Some(r) => snapshot.rows.push(r),
            None => {
                tracing::debug!(row = i, "leaderboard row skipped (no model name or rate)");
                snapshot.skipped_rows += 1;
            }
        }
    }
    Ok(snapshot)
}

fn parse_row(row: &Value, cols: &LeaderboardColumns) -> Option<LeaderboardRow> {
    let model = row.get(&cols.model_column)?.as_str()?.trim();
    if model.is_empty() {
        return None;
    }
    let success_rate = number_like(row.get(&cols.rate_column)?)?;

    let is_open = row
        .get(&cols.open_column)
        .and_then(Value::as_str)
        .is_some_and(|s| s.trim() == cols.open_marker);
    let size_billion = row.get(&cols.size_column).and_then(number_like);
    let date = cols
        .date_columns
        .iter()
        .filter_map(|c| row.get(c))
        .find(|v| !v.is_null())
        .map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        });

    Some(LeaderboardRow {
        model: model.to_string(),
        success_rate,
        is_open,
        size_billion,
        date,
    })
}

/// JSON numbers, or strings like `"63.2"` / `"63.2%"`.
fn number_like(v: &Value) -> Option<f64> {
    let x: f64 = match v {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse().ok()?,
        _ => return None,
    };
    x.is_finite().then_some(x)
}
