use super::exit_codes;
use crate::cli::args::NormalizeArgs;
use arena_core::config::ArenaConfig;
use arena_core::report::console::print_summary;
use arena_core::{emit, pipeline};

pub fn run(args: NormalizeArgs) -> anyhow::Result<i32> {
    let mut cfg = match super::load_or_default(&args.config, args.strict) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{e}");
            return Ok(exit_codes::CONFIG_ERROR);
        }
    };
    apply_overrides(&mut cfg, &args);

    let run = pipeline::run(&cfg)?;
    let files = emit::write_all(&cfg.paths.out_dir, &run)?;
    print_summary(&run, &files, args.quiet);
    eprintln!("wrote {} files to {}", files.len(), cfg.paths.out_dir.display());

    if args.strict && !run.reconciliation.unmatched.is_empty() {
        return Ok(exit_codes::PROBLEMS);
    }
    Ok(exit_codes::OK)
}

fn apply_overrides(cfg: &mut ArenaConfig, args: &NormalizeArgs) {
    if let Some(p) = &args.tasks {
        cfg.paths.tasks = p.clone();
    }
    if let Some(p) = &args.leaderboard {
        cfg.paths.leaderboard = p.clone();
    }
    if let Some(p) = &args.trajectories {
        cfg.paths.trajectories = p.clone();
    }
    if let Some(p) = &args.out {
        cfg.paths.out_dir = p.clone();
    }
}
