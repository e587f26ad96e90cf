use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type TaskId = i64;

/// Tri-state result for one (model, task) pair.
///
/// `Unknown` is "no signal extracted" and must never be folded into `Failure`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Failure,
    Unknown,
}

impl Outcome {
    /// Interprets a payload success flag. Booleans map directly, numbers are
    /// success when non-zero; everything else carries no signal.
    pub fn from_flag(v: Option<&serde_json::Value>) -> Self {
        match v {
            Some(serde_json::Value::Bool(true)) => Outcome::Success,
            Some(serde_json::Value::Bool(false)) => Outcome::Failure,
            Some(serde_json::Value::Number(n)) => match n.as_f64() {
                Some(x) if x != 0.0 => Outcome::Success,
                Some(_) => Outcome::Failure,
                None => Outcome::Unknown,
            },
            _ => Outcome::Unknown,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }

    /// Compact cell encoding: `Some(1)`, `Some(0)`, or `None` for no data.
    pub fn as_bit(&self) -> Option<u8> {
        match self {
            Outcome::Success => Some(1),
            Outcome::Failure => Some(0),
            Outcome::Unknown => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: TaskId,
    pub intent: String,
    pub site: String,
    pub template_id: Option<i64>,
    pub eval_type: String,
    #[serde(rename = "reference_answer")]
    pub reference_answer_preview: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRecord {
    pub id: String,
    #[serde(rename = "name")]
    pub display_name: String,
    pub date: Option<String>,
    #[serde(rename = "open")]
    pub is_open: bool,
    #[serde(rename = "size_b")]
    pub size_billion: Option<f64>,
    #[serde(rename = "success_rate")]
    pub official_success_rate: f64,
    pub has_trajectories: bool,
}

/// One stored pair in the flattened results list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    #[serde(rename = "t")]
    pub task_id: TaskId,
    #[serde(rename = "m")]
    pub model_id: String,
    #[serde(rename = "s")]
    pub outcome: Option<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DomainStats {
    #[serde(rename = "success")]
    pub success_count: usize,
    #[serde(rename = "total")]
    pub total_count: usize,
    pub rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub id: String,
    pub name: String,
    pub rank: usize,
    pub total_tasks: usize,
    pub successes: usize,
    /// Always the official rate.
    pub success_rate: f64,
    /// Rate over locally extracted outcomes, when any exist.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub computed_rate: Option<f64>,
    pub domain_breakdown: BTreeMap<String, DomainStats>,
    pub has_trajectories: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    VeryHard,
}

impl Difficulty {
    /// Lower edges are inclusive.
    pub fn from_rate(rate: f64) -> Self {
        if rate >= 80.0 {
            Difficulty::Easy
        } else if rate >= 40.0 {
            Difficulty::Medium
        } else if rate >= 20.0 {
            Difficulty::Hard
        } else {
            Difficulty::VeryHard
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultyEntry {
    pub id: TaskId,
    pub success_count: usize,
    pub success_rate: f64,
    pub difficulty: Difficulty,
    pub passing_models: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeatmapMatrix {
    pub model_ids: Vec<String>,
    pub task_ids: Vec<TaskId>,
    /// `matrix[task_index][model_index]`
    pub matrix: Vec<Vec<Option<u8>>>,
}

/// Percentage rounded to one decimal, `0` when the denominator is empty.
pub fn rate_pct(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round1(part as f64 / whole as f64 * 100.0)
}

/// One decimal, rounding the exact binary value with ties to even, so
/// `31.25` becomes `31.2` and `0.35` (stored just below) becomes `0.3`.
pub fn round1(x: f64) -> f64 {
    format!("{x:.1}").parse().unwrap_or(x)
}
