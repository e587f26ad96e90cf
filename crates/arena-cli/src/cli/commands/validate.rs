use super::exit_codes;
use crate::cli::args::{ValidateArgs, ValidateFormat};
use arena_core::config::ArenaConfig;
use arena_core::dispatch;
use serde_json::json;

struct Finding {
    severity: &'static str,
    message: String,
}

struct SubmissionCheck {
    id: String,
    path: String,
    files: Option<usize>,
}

pub fn run(args: ValidateArgs) -> anyhow::Result<i32> {
    let cfg = match super::load_or_default(&args.config, args.strict) {
        Ok(cfg) => cfg,
        Err(e) => {
            let findings = vec![Finding {
                severity: "error",
                message: e.to_string(),
            }];
            print_report(&findings, &[], args.format);
            return Ok(exit_codes::CONFIG_ERROR);
        }
    };

    let (findings, submissions) = check(&cfg);
    print_report(&findings, &submissions, args.format);

    if findings.iter().any(|f| f.severity == "error") {
        Ok(exit_codes::CONFIG_ERROR)
    } else {
        Ok(exit_codes::OK)
    }
}

fn check(cfg: &ArenaConfig) -> (Vec<Finding>, Vec<SubmissionCheck>) {
    let mut findings = Vec::new();
    for (label, path) in [
        ("task metadata", &cfg.paths.tasks),
        ("leaderboard", &cfg.paths.leaderboard),
    ] {
        if !path.is_file() {
            findings.push(Finding {
                severity: "error",
                message: format!("{label} not found: {}", path.display()),
            });
        }
    }

    // a missing submission only loses that model's data
    let submissions: Vec<SubmissionCheck> = cfg
        .submissions
        .iter()
        .map(|s| {
            let root = cfg.submission_root(s);
            let files = dispatch::discover(&root, s.layout).map(|f| f.len());
            match files {
                None => findings.push(Finding {
                    severity: "warn",
                    message: format!("submission '{}' path missing: {}", s.id, root.display()),
                }),
                Some(0) => findings.push(Finding {
                    severity: "warn",
                    message: format!("submission '{}' has no record files: {}", s.id, root.display()),
                }),
                Some(_) => {}
            }
            SubmissionCheck {
                id: s.id.clone(),
                path: root.display().to_string(),
                files,
            }
        })
        .collect();

    (findings, submissions)
}

fn print_report(findings: &[Finding], submissions: &[SubmissionCheck], format: ValidateFormat) {
    let errors: Vec<&str> = findings
        .iter()
        .filter(|f| f.severity == "error")
        .map(|f| f.message.as_str())
        .collect();
    let warnings: Vec<&str> = findings
        .iter()
        .filter(|f| f.severity == "warn")
        .map(|f| f.message.as_str())
        .collect();

    match format {
        ValidateFormat::Json => {
            let subs: Vec<_> = submissions
                .iter()
                .map(|s| json!({"id": s.id, "path": s.path, "files": s.files}))
                .collect();
            let output = json!({
                "schema_version": 1,
                "ok": errors.is_empty(),
                "errors": errors,
                "warnings": warnings,
                "submissions": subs,
            });
            match serde_json::to_string_pretty(&output) {
                Ok(s) => println!("{s}"),
                Err(e) => eprintln!("failed to render report: {e}"),
            }
        }
        ValidateFormat::Text => {
            for s in submissions {
                match s.files {
                    Some(n) => println!("  {:<20} {:>5} files", s.id, n),
                    None => println!("  {:<20} missing", s.id),
                }
            }
            for e in &errors {
                println!("error: {e}");
            }
            for w in &warnings {
                println!("warning: {w}");
            }
            if errors.is_empty() {
                println!("config OK ({} warnings)", warnings.len());
            } else {
                println!("config invalid ({} errors, {} warnings)", errors.len(), warnings.len());
            }
        }
    }
}
