use crate::dispatch::{Layout, SubmissionFormat};
use crate::errors::ConfigError;
use crate::extract::Extractor;
use crate::inputs::LeaderboardColumns;
use crate::reconcile::CatalogueEntry;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

pub mod path_resolver;

pub const SUPPORTED_CONFIG_VERSION: u32 = 1;

/// Standard WebArena task count.
pub const DEFAULT_BENCHMARK_SIZE: usize = 812;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArenaConfig {
    #[serde(default, rename = "configVersion", alias = "version")]
    pub version: u32,
    #[serde(default = "default_benchmark_size")]
    pub benchmark_size: usize,
    #[serde(default)]
    pub paths: Paths,
    #[serde(default)]
    pub leaderboard: LeaderboardColumns,
    pub submissions: Vec<SubmissionConfig>,
}

fn default_benchmark_size() -> usize {
    DEFAULT_BENCHMARK_SIZE
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            version: SUPPORTED_CONFIG_VERSION,
            benchmark_size: DEFAULT_BENCHMARK_SIZE,
            paths: Paths::default(),
            leaderboard: LeaderboardColumns::default(),
            submissions: SubmissionConfig::default_catalogue(),
        }
    }
}

impl ArenaConfig {
    pub fn is_legacy(&self) -> bool {
        self.version == 0
    }

    pub fn submission_root(&self, s: &SubmissionConfig) -> PathBuf {
        self.paths.trajectories.join(&s.path)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Paths {
    pub tasks: PathBuf,
    pub leaderboard: PathBuf,
    pub trajectories: PathBuf,
    pub out_dir: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Self {
            tasks: PathBuf::from("data/test.raw.json"),
            leaderboard: PathBuf::from("data/leaderboard.json"),
            trajectories: PathBuf::from("data/trajectories"),
            out_dir: PathBuf::from("web/public/data"),
        }
    }
}

/// One known submission: its slug, how to find it, how to read it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionConfig {
    pub id: String,
    pub display_name: String,
    /// Relative to `paths.trajectories`.
    pub path: String,
    pub layout: Layout,
    pub extractor: Extractor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_limit: Option<usize>,
}

impl SubmissionConfig {
    pub fn format(&self) -> SubmissionFormat {
        SubmissionFormat {
            layout: self.layout,
            extractor: self.extractor.clone(),
            read_limit: self.read_limit,
        }
    }

    pub fn catalogue_entry(&self) -> CatalogueEntry {
        CatalogueEntry {
            id: self.id.clone(),
            display_name: self.display_name.clone(),
        }
    }

    fn new(id: &str, display_name: &str, path: &str, layout: Layout, extractor: Extractor) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            path: path.into(),
            layout,
            extractor,
            read_limit: None,
        }
    }

    fn with_read_limit(mut self, bytes: usize) -> Self {
        self.read_limit = Some(bytes);
        self
    }

    /// The known WebArena submissions and their on-disk formats.
    pub fn default_catalogue() -> Vec<SubmissionConfig> {
        let explicit = |success_field: &str| Extractor::ExplicitFields {
            id_field: "task_id".into(),
            success_field: success_field.into(),
        };
        let tail = || Extractor::TrajectoryTail {
            id_field: "id".into(),
            steps_field: "trajectory".into(),
            success_field: "success".into(),
        };

        vec![
            Self::new("deepsky", "DeepSky Agent", "deepsky_trajectories", Layout::JsonDir, explicit("success")),
            Self::new(
                "jace",
                "Jace.AI",
                "jace_zetalabs_trajectories",
                Layout::JsonlFile,
                Extractor::NestedResult {
                    id_field: "task_id".into(),
                    container: "result".into(),
                    success_field: "success".into(),
                },
            ),
            Self::new("gui_hybrid", "GUI-API Hybrid", "gui_hybrid_trajectories", Layout::JsonlDir, explicit("correct")),
            Self::new("agentoccam", "AgentOccam", "agent_o_cam_trajectories", Layout::JsonDir, tail())
                .with_read_limit(50_000),
            Self::new("ibm_cuga", "IBM CUGA", "ibm_cuga_webarena_trajectories", Layout::JsonDir, Extractor::MetadataOnly),
            Self::new(
                "learn_by_interact",
                "Learn-by-Interact",
                "learn_by_interact_trajectoties",
                Layout::JsonDir,
                Extractor::MetadataOnly,
            ),
            Self::new(
                "narada",
                "Narada AI",
                "narada_ai_trajectories",
                Layout::JsonDir,
                Extractor::ScoreThreshold {
                    score_field: "score".into(),
                    threshold: 0.5,
                },
            )
            .with_read_limit(100_000),
            Self::new("openai_operator", "OpenAI Operator", "oai_cua_trajectories", Layout::JsonDir, Extractor::MetadataOnly),
            Self::new("scribeagent", "ScribeAgent", "scribeagent_trajectories", Layout::JsonDir, Extractor::MetadataOnly),
            Self::new("step", "SteP", "step_trajectories", Layout::JsonDir, tail()).with_read_limit(50_000),
        ]
    }
}

pub fn load_config(path: &Path, strict: bool) -> Result<ArenaConfig, ConfigError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ConfigError(format!("failed to read config {}: {}", path.display(), e)))?;

    let mut ignored_keys = std::collections::BTreeSet::new();
    let deserializer = serde_yaml::Deserializer::from_str(&raw);

    // serde_ignored wrapper to capture unknown fields
    let mut cfg: ArenaConfig = serde_ignored::deserialize(deserializer, |path| {
        ignored_keys.insert(path.to_string());
    })
    .map_err(|e| ConfigError(format!("failed to parse YAML: {}", e)))?;

    // YAML anchors and extension keys are allowed anywhere
    let meaningful_unknowns: Vec<_> = ignored_keys
        .iter()
        .filter(|k| !k.starts_with('_') && !k.starts_with("x-") && !k.contains(".x-"))
        .collect();

    if !meaningful_unknowns.is_empty() {
        if strict {
            return Err(ConfigError(format!(
                "unknown fields detected in strict mode: {:?} (file: {})",
                meaningful_unknowns,
                path.display()
            )));
        }
        tracing::warn!(fields = ?meaningful_unknowns, "ignored unknown config fields");
    }

    if cfg.version != 0 && cfg.version != SUPPORTED_CONFIG_VERSION {
        return Err(ConfigError(format!(
            "unsupported config version {} (supported: 0, {})",
            cfg.version, SUPPORTED_CONFIG_VERSION
        )));
    }

    if cfg.is_legacy() {
        tracing::info!(path = %path.display(), "configVersion missing, reading as version 1");
        cfg.version = SUPPORTED_CONFIG_VERSION;
    }

    validate(&cfg)?;

    let r = path_resolver::PathResolver::new(path);
    r.resolve(&mut cfg.paths.tasks);
    r.resolve(&mut cfg.paths.leaderboard);
    r.resolve(&mut cfg.paths.trajectories);
    r.resolve(&mut cfg.paths.out_dir);

    Ok(cfg)
}

pub fn validate(cfg: &ArenaConfig) -> Result<(), ConfigError> {
    if cfg.submissions.is_empty() {
        return Err(ConfigError("config has no submissions".into()));
    }

    let mut seen = HashSet::new();
    for s in &cfg.submissions {
        if s.id.trim().is_empty() {
            return Err(ConfigError("submission with empty id".into()));
        }
        if s.display_name.trim().is_empty() {
            return Err(ConfigError(format!("submission '{}' has an empty display_name", s.id)));
        }
        if !seen.insert(s.id.as_str()) {
            return Err(ConfigError(format!("duplicate submission id '{}'", s.id)));
        }
        if let Extractor::ScoreThreshold { threshold, .. } = &s.extractor {
            if !(0.0..=1.0).contains(threshold) {
                return Err(ConfigError(format!(
                    "submission '{}': score threshold {} outside [0, 1]",
                    s.id, threshold
                )));
            }
        }
        if s.read_limit == Some(0) {
            return Err(ConfigError(format!("submission '{}': read_limit must be positive", s.id)));
        }
    }
    Ok(())
}

pub fn write_sample_config(path: &Path) -> Result<(), ConfigError> {
    let body = serde_yaml::to_string(&ArenaConfig::default())
        .map_err(|e| ConfigError(format!("failed to render sample config: {}", e)))?;
    let content = format!(
        "# Arena normalization config.\n\
         # Paths are relative to this file. Submissions are listed in catalogue order.\n{}",
        body
    );
    std::fs::write(path, content)
        .map_err(|e| ConfigError(format!("failed to write sample config: {}", e)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalogue_is_valid_and_unique() {
        let cfg = ArenaConfig::default();
        assert!(validate(&cfg).is_ok());
        assert_eq!(cfg.submissions.len(), 10);
        assert_eq!(cfg.submissions[0].id, "deepsky");
    }

    #[test]
    fn sample_config_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("arena.yaml");
        write_sample_config(&path).unwrap();
        let cfg = load_config(&path, true).unwrap();
        assert_eq!(cfg.submissions, SubmissionConfig::default_catalogue());
        assert_eq!(cfg.paths.tasks, dir.path().join("data/test.raw.json"));
    }

    #[test]
    fn bad_threshold_is_rejected() {
        let mut cfg = ArenaConfig::default();
        cfg.submissions[6].extractor = Extractor::ScoreThreshold {
            score_field: "score".into(),
            threshold: 5.0,
        };
        let err = validate(&cfg).unwrap_err();
        assert!(err.0.contains("narada"));
    }

    const MINIMAL: &str = "submissions:\n  - id: a\n    display_name: A\n    path: a\n    layout: json_dir\n    extractor: {type: metadata_only}\n";

    #[test]
    fn missing_version_reads_as_current() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("arena.yaml");
        std::fs::write(&path, MINIMAL).unwrap();
        let cfg = load_config(&path, true).unwrap();
        assert_eq!(cfg.version, SUPPORTED_CONFIG_VERSION);
        assert_eq!(cfg.benchmark_size, DEFAULT_BENCHMARK_SIZE);
        assert_eq!(cfg.paths.out_dir, dir.path().join("web/public/data"));
    }

    #[test]
    fn unknown_keys_fail_only_in_strict_mode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("arena.yaml");
        std::fs::write(&path, format!("{MINIMAL}colour: blue\nx-note: ok\n")).unwrap();

        let err = load_config(&path, true).unwrap_err();
        assert!(err.to_string().contains("colour"));
        assert!(!err.to_string().contains("x-note"));
        assert!(load_config(&path, false).is_ok());
    }

    #[test]
    fn future_version_and_duplicates_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("arena.yaml");
        std::fs::write(&path, format!("configVersion: 2\n{MINIMAL}")).unwrap();
        assert!(load_config(&path, false).unwrap_err().0.contains("unsupported"));

        let mut cfg = ArenaConfig::default();
        cfg.submissions[1].id = "deepsky".into();
        assert!(validate(&cfg).unwrap_err().0.contains("duplicate"));
    }
}
