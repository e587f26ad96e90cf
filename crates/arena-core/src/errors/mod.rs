pub mod similarity;

use std::fmt;

/// Configuration problems surfaced before any extraction starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(pub String);

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {}", self.0)
    }
}

impl std::error::Error for ConfigError {}

/// Why a single record yielded nothing usable.
///
/// These never abort a run. The dispatcher counts them per submission.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("failed to read record: {0}")]
    Read(String),
    #[error("failed to parse record: {0}")]
    Parse(String),
    #[error("unexpected record shape: {0}")]
    Shape(&'static str),
    #[error("no task id in payload or filename")]
    MissingTaskId,
}

impl RecordError {
    pub fn kind(&self) -> &'static str {
        match self {
            RecordError::Read(_) => "read",
            RecordError::Parse(_) => "parse",
            RecordError::Shape(_) => "shape",
            RecordError::MissingTaskId => "missing_task_id",
        }
    }
}
