//! Schema variants for submission records.
//!
//! Each submission declares one [`Extractor`]. An extractor sees a single
//! record (one JSON file, or one line of a JSON-Lines file) and turns it into
//! an [`Extraction`]. Bad input surfaces as a [`RecordError`], never a panic.

use crate::errors::RecordError;
use crate::model::{Outcome, TaskId};
use crate::task_id;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A raw record as handed over by the dispatcher.
#[derive(Debug, Clone, Copy)]
pub struct RawRecord<'a> {
    /// File name the record came from (no directories).
    pub source_name: &'a str,
    pub payload: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extraction {
    pub task_id: Option<TaskId>,
    pub outcome: Outcome,
}

impl Extraction {
    fn new(task_id: Option<TaskId>, outcome: Outcome) -> Self {
        Self { task_id, outcome }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum Extractor {
    /// Task id and boolean flag sit directly on the object.
    ExplicitFields {
        #[serde(default = "default_task_id_field")]
        id_field: String,
        #[serde(default = "default_success_field")]
        success_field: String,
    },
    /// Flag lives one level down, e.g. `{"task_id": 3, "result": {"success": true}}`.
    NestedResult {
        #[serde(default = "default_task_id_field")]
        id_field: String,
        #[serde(default = "default_container_field")]
        container: String,
        #[serde(default = "default_success_field")]
        success_field: String,
    },
    /// Only the last step of the trajectory counts.
    TrajectoryTail {
        #[serde(default = "default_id_field")]
        id_field: String,
        #[serde(default = "default_steps_field")]
        steps_field: String,
        #[serde(default = "default_success_field")]
        success_field: String,
    },
    /// Numeric score thresholded into pass/fail. Task id comes from the filename.
    ScoreThreshold {
        #[serde(default = "default_score_field")]
        score_field: String,
        #[serde(default = "default_threshold")]
        threshold: f64,
    },
    /// No success signal at all; only the filename id is emitted.
    MetadataOnly,
}

fn default_task_id_field() -> String {
    "task_id".into()
}
fn default_id_field() -> String {
    "id".into()
}
fn default_success_field() -> String {
    "success".into()
}
fn default_container_field() -> String {
    "result".into()
}
fn default_steps_field() -> String {
    "trajectory".into()
}
fn default_score_field() -> String {
    "score".into()
}
fn default_threshold() -> f64 {
    0.5
}

impl Extractor {
    pub fn name(&self) -> &'static str {
        match self {
            Extractor::ExplicitFields { .. } => "explicit_fields",
            Extractor::NestedResult { .. } => "nested_result",
            Extractor::TrajectoryTail { .. } => "trajectory_tail",
            Extractor::ScoreThreshold { .. } => "score_threshold",
            Extractor::MetadataOnly => "metadata_only",
        }
    }

    /// Whether the payload has to be parsed at all.
    pub fn reads_payload(&self) -> bool {
        !matches!(self, Extractor::MetadataOnly)
    }

    pub fn extract(&self, record: &RawRecord<'_>) -> Result<Extraction, RecordError> {
        match self {
            Extractor::MetadataOnly => Ok(Extraction::new(
                task_id::from_filename(record.source_name),
                Outcome::Unknown,
            )),
            Extractor::ExplicitFields {
                id_field,
                success_field,
            } => {
                let v = parse_object(record.payload)?;
                Ok(Extraction::new(
                    task_id_of(v.get(id_field)),
                    Outcome::from_flag(v.get(success_field)),
                ))
            }
            Extractor::NestedResult {
                id_field,
                container,
                success_field,
            } => {
                let v = parse_object(record.payload)?;
                let flag = v.get(container).and_then(|c| c.get(success_field));
                Ok(Extraction::new(
                    task_id_of(v.get(id_field)),
                    Outcome::from_flag(flag),
                ))
            }
            Extractor::TrajectoryTail {
                id_field,
                steps_field,
                success_field,
            } => {
                let v = parse_object(record.payload)?;
                let flag = v
                    .get(steps_field)
                    .and_then(Value::as_array)
                    .and_then(|steps| steps.last())
                    .and_then(|last| last.get(success_field));
                Ok(Extraction::new(
                    task_id_of(v.get(id_field)),
                    Outcome::from_flag(flag),
                ))
            }
            Extractor::ScoreThreshold {
                score_field,
                threshold,
            } => {
                let v = parse_object(record.payload)?;
                let outcome = match v.get(score_field).and_then(Value::as_f64) {
                    Some(s) if s >= *threshold => Outcome::Success,
                    Some(_) => Outcome::Failure,
                    None => Outcome::Unknown,
                };
                Ok(Extraction::new(
                    task_id::from_filename(record.source_name),
                    outcome,
                ))
            }
        }
    }
}

fn parse_object(payload: &str) -> Result<Value, RecordError> {
    let v: Value =
        serde_json::from_str(payload).map_err(|e| RecordError::Parse(e.to_string()))?;
    if !v.is_object() {
        return Err(RecordError::Shape("payload is not a JSON object"));
    }
    Ok(v)
}

/// Accepts integers and strings holding an integer.
pub fn task_id_of(v: Option<&Value>) -> Option<TaskId> {
    match v? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec<'a>(name: &'a str, payload: &'a str) -> RawRecord<'a> {
        RawRecord {
            source_name: name,
            payload,
        }
    }

    fn explicit(success_field: &str) -> Extractor {
        Extractor::ExplicitFields {
            id_field: "task_id".into(),
            success_field: success_field.into(),
        }
    }

    #[test]
    fn explicit_fields() {
        let ex = explicit("success");
        let out = ex
            .extract(&rec("x.json", r#"{"task_id": 4, "success": false}"#))
            .unwrap();
        assert_eq!(out, Extraction::new(Some(4), Outcome::Failure));

        let ex = explicit("correct");
        let out = ex
            .extract(&rec("log.jsonl", r#"{"task_id": "12", "correct": true}"#))
            .unwrap();
        assert_eq!(out, Extraction::new(Some(12), Outcome::Success));
    }

    #[test]
    fn explicit_fields_missing_flag_is_unknown() {
        let out = explicit("success")
            .extract(&rec("x.json", r#"{"task_id": 4}"#))
            .unwrap();
        assert_eq!(out, Extraction::new(Some(4), Outcome::Unknown));
    }

    #[test]
    fn nested_result() {
        let ex = Extractor::NestedResult {
            id_field: "task_id".into(),
            container: "result".into(),
            success_field: "success".into(),
        };
        let out = ex
            .extract(&rec(
                "jace.jsonl",
                r#"{"task_id": 8, "result": {"success": true, "answer": "x"}}"#,
            ))
            .unwrap();
        assert_eq!(out, Extraction::new(Some(8), Outcome::Success));

        // result is not an object
        let out = ex
            .extract(&rec("jace.jsonl", r#"{"task_id": 8, "result": "done"}"#))
            .unwrap();
        assert_eq!(out, Extraction::new(Some(8), Outcome::Unknown));
    }

    #[test]
    fn trajectory_tail_reads_only_last_step() {
        let ex: Extractor = serde_yaml::from_str("type: trajectory_tail").unwrap();
        let payload = r#"{"id": 21, "trajectory": [
            {"success": true}, {"action": "click"}, {"success": false}
        ]}"#;
        let out = ex.extract(&rec("21.json", payload)).unwrap();
        assert_eq!(out, Extraction::new(Some(21), Outcome::Failure));

        // last step without a flag ignores earlier successes
        let payload = r#"{"id": 21, "trajectory": [{"success": true}, {"action": "stop"}]}"#;
        let out = ex.extract(&rec("21.json", payload)).unwrap();
        assert_eq!(out, Extraction::new(Some(21), Outcome::Unknown));
    }

    #[test]
    fn trajectory_tail_empty_keeps_id() {
        let ex: Extractor = serde_yaml::from_str("type: trajectory_tail").unwrap();
        let out = ex
            .extract(&rec("a.json", r#"{"id": 3, "trajectory": []}"#))
            .unwrap();
        assert_eq!(out, Extraction::new(Some(3), Outcome::Unknown));
    }

    #[test]
    fn score_threshold_uses_filename_id() {
        let ex: Extractor = serde_yaml::from_str("type: score_threshold").unwrap();
        let out = ex
            .extract(&rec("task_7.json", r#"{"score": 0.4, "task_id": 99}"#))
            .unwrap();
        assert_eq!(out, Extraction::new(Some(7), Outcome::Failure));

        let out = ex
            .extract(&rec("task_7.json", r#"{"score": 0.5}"#))
            .unwrap();
        assert_eq!(out, Extraction::new(Some(7), Outcome::Success));

        let out = ex.extract(&rec("notes.json", r#"{"score": 1.0}"#)).unwrap();
        assert_eq!(out, Extraction::new(None, Outcome::Success));
    }

    #[test]
    fn metadata_only_never_parses() {
        let ex = Extractor::MetadataOnly;
        let out = ex.extract(&rec("webarena_55.json", "not json {")).unwrap();
        assert_eq!(out, Extraction::new(Some(55), Outcome::Unknown));
    }

    #[test]
    fn malformed_payloads_are_errors_not_panics() {
        let ex = explicit("success");
        assert!(matches!(
            ex.extract(&rec("1.json", r#"{"task_id": 1, "succ"#)),
            Err(RecordError::Parse(_))
        ));
        assert!(matches!(
            ex.extract(&rec("1.json", "[1, 2, 3]")),
            Err(RecordError::Shape(_))
        ));
    }

    #[test]
    fn config_defaults_fill_field_names() {
        let ex: Extractor = serde_yaml::from_str("type: nested_result").unwrap();
        assert_eq!(
            ex,
            Extractor::NestedResult {
                id_field: "task_id".into(),
                container: "result".into(),
                success_field: "success".into(),
            }
        );
        let ex: Extractor =
            serde_yaml::from_str("type: score_threshold\nthreshold: 0.8").unwrap();
        assert_eq!(ex.name(), "score_threshold");
    }
}
