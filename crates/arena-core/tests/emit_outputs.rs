use arena_core::config::{ArenaConfig, Paths, SubmissionConfig};
use arena_core::dispatch::Layout;
use arena_core::emit;
use arena_core::extract::Extractor;
use arena_core::pipeline;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn fixture(root: &Path) -> ArenaConfig {
    let traj = root.join("trajectories");
    fs::create_dir_all(traj.join("a")).unwrap();
    fs::create_dir_all(traj.join("b")).unwrap();
    fs::write(
        root.join("tasks.json"),
        json!([
            {"task_id": 0, "intent": "buy", "sites": ["shopping"], "intent_template_id": 3,
             "eval": {"eval_types": ["string_match"], "reference_answers": {"must_include": ["x"]}}},
            {"task_id": 1, "intent": "post", "sites": ["reddit", "gitlab"], "eval": {}}
        ])
        .to_string(),
    )
    .unwrap();
    fs::write(
        root.join("leaderboard.json"),
        json!({"last_updated": "2025-03-01", "leaderboard": [
            {"Model": "Alpha Agent", "Success Rate (%)": "55.5", "Open?": "✓", "Model Size (billion)": "70", "Date": "2025-01"},
            {"Model": "Beta", "Success Rate (%)": 20},
            {"Model": "", "Success Rate (%)": 99}
        ]})
        .to_string(),
    )
    .unwrap();
    fs::write(traj.join("a/0.json"), r#"{"task_id": 0, "success": true}"#).unwrap();
    fs::write(traj.join("a/1.json"), "not json").unwrap();
    fs::write(traj.join("b/0.json"), r#"{"task_id": "0", "success": 0}"#).unwrap();

    let sub = |id: &str, name: &str| SubmissionConfig {
        id: id.into(),
        display_name: name.into(),
        path: id.into(),
        layout: Layout::JsonDir,
        extractor: Extractor::ExplicitFields {
            id_field: "task_id".into(),
            success_field: "success".into(),
        },
        read_limit: None,
    };
    ArenaConfig {
        version: 1,
        benchmark_size: 812,
        paths: Paths {
            tasks: root.join("tasks.json"),
            leaderboard: root.join("leaderboard.json"),
            trajectories: traj,
            out_dir: root.join("out"),
        },
        leaderboard: Default::default(),
        submissions: vec![sub("a", "Alpha Agent"), sub("b", "Beta")],
    }
}

fn read(dir: &Path, name: &str) -> Value {
    serde_json::from_str(&fs::read_to_string(dir.join(name)).unwrap()).unwrap()
}

#[test]
fn writes_every_dataset_with_expected_shapes() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let cfg = fixture(dir.path());
    let run = pipeline::run(&cfg)?;
    let files = emit::write_all(&cfg.paths.out_dir, &run)?;
    assert_eq!(files.len(), 7);

    let out = &cfg.paths.out_dir;
    let models = read(out, emit::MODELS_FILE);
    assert_eq!(models[0]["id"], "a");
    assert_eq!(models[0]["name"], "Alpha Agent");
    assert_eq!(models[0]["open"], true);
    assert_eq!(models[0]["size_b"], 70.0);
    assert_eq!(models[0]["success_rate"], 55.5);
    assert_eq!(models[1]["open"], false);

    let tasks = read(out, emit::TASKS_FILE);
    assert_eq!(tasks[1]["site"], "reddit");
    assert_eq!(tasks[1]["eval_type"], "unknown");
    assert_eq!(tasks[1]["reference_answer"], "{}");

    // unparseable a/1.json still contributes an unknown outcome via its filename
    let results = read(out, emit::RESULTS_FILE);
    let rows: Vec<_> = results.as_array().unwrap().iter().collect();
    assert!(rows.contains(&&json!({"t": 0, "m": "a", "s": 1})));
    assert!(rows.contains(&&json!({"t": 1, "m": "a", "s": null})));
    assert!(rows.contains(&&json!({"t": 0, "m": "b", "s": 0})));

    let heatmap = read(out, emit::HEATMAP_FILE);
    assert_eq!(heatmap["matrix"], json!([[1, 0], [null, null]]));

    let manifest = read(out, emit::MANIFEST_FILE);
    assert_eq!(manifest["leaderboard_last_updated"], "2025-03-01");
    assert_eq!(manifest["skipped_leaderboard_rows"], 1);
    assert_eq!(manifest["extraction"][0]["recovered_from_filename"], 1);
    assert_eq!(manifest["input_fingerprint"]["hex"].as_str().unwrap().len(), 64);
    Ok(())
}

#[test]
fn datasets_are_byte_identical_across_runs() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let cfg = fixture(dir.path());

    let first = dir.path().join("first");
    let second = dir.path().join("second");
    emit::write_datasets(&first, &pipeline::run(&cfg)?.datasets)?;
    emit::write_datasets(&second, &pipeline::run(&cfg)?.datasets)?;

    for name in [
        emit::MODELS_FILE,
        emit::TASKS_FILE,
        emit::RESULTS_FILE,
        emit::LEADERBOARD_FILE,
        emit::DIFFICULTY_FILE,
        emit::HEATMAP_FILE,
    ] {
        assert_eq!(fs::read(first.join(name))?, fs::read(second.join(name))?, "{name}");
    }
    Ok(())
}

#[test]
fn fingerprint_tracks_submission_config() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let mut cfg = fixture(dir.path());
    let before = pipeline::run(&cfg)?.fingerprint.hex;
    cfg.submissions[1].read_limit = Some(10);
    let after = pipeline::run(&cfg)?.fingerprint.hex;
    assert_ne!(before, after);
    Ok(())
}
