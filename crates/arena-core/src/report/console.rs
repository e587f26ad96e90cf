use crate::dispatch::ExtractionStats;
use crate::emit::WrittenFile;
use crate::model::Outcome;
use crate::pipeline::RunOutput;
use crate::store::ResultStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutcomeCounts {
    pub total: usize,
    pub success: usize,
    pub failure: usize,
    pub unknown: usize,
}

impl OutcomeCounts {
    pub fn for_model(store: &ResultStore, model_id: &str) -> Self {
        let mut c = Self::default();
        for o in store.outcomes_for(model_id).into_iter().flat_map(|m| m.values()) {
            c.total += 1;
            match o {
                Outcome::Success => c.success += 1,
                Outcome::Failure => c.failure += 1,
                Outcome::Unknown => c.unknown += 1,
            }
        }
        c
    }

    /// Local rate over all stored outcomes. Display only.
    pub fn rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.success as f64 / self.total as f64 * 100.0
        }
    }
}

pub fn format_model_line(model_id: &str, c: &OutcomeCounts) -> String {
    format!(
        "  {:<20} {:>4} tasks, {:>4} successes, {:>4} failures, {:>4} unknown ({:5.1}%)",
        model_id,
        c.total,
        c.success,
        c.failure,
        c.unknown,
        c.rate()
    )
}

fn extraction_line(s: &ExtractionStats) -> String {
    if s.missing {
        return format!("  {:<20} missing ({})", s.model_id, s.path.display());
    }
    let mut line = format!(
        "  {:<20} {:>5} files, {:>5} records, {:>5} stored",
        s.model_id, s.files, s.records, s.stored
    );
    if s.recovered_from_filename > 0 {
        line.push_str(&format!(", {} id from filename", s.recovered_from_filename));
    }
    if s.dropped > 0 {
        line.push_str(&format!(", {} dropped", s.dropped));
    }
    line
}

pub fn print_summary(run: &RunOutput, files: &[WrittenFile], quiet: bool) {
    if !quiet {
        eprintln!("\nExtraction:");
        for s in &run.extraction {
            eprintln!("{}", extraction_line(s));
        }

        eprintln!("\nSummary by model:");
        let mut ids: Vec<&str> = run.store.model_ids().collect();
        ids.sort();
        for id in ids {
            eprintln!("{}", format_model_line(id, &OutcomeCounts::for_model(&run.store, id)));
        }

        eprintln!("\nFiles:");
        for f in files {
            eprintln!(
                "  ✓ {:<25} ({:>6} entries, {:6.1} KB)",
                f.name,
                f.entries,
                f.bytes as f64 / 1024.0
            );
        }
    }

    if !run.reconciliation.unmatched.is_empty() {
        eprintln!("\n⚠️  Models without a leaderboard match (excluded from outputs):");
        for u in &run.reconciliation.unmatched {
            match &u.closest {
                Some(c) => eprintln!(
                    "    {} ('{}'), closest: '{}' ({:.2})",
                    u.id, u.display_name, c.name, c.similarity
                ),
                None => eprintln!("    {} ('{}')", u.id, u.display_name),
            }
        }
    }

    eprintln!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    let d = &run.datasets;
    eprintln!(
        "Summary: {} models, {} tasks, {} results, {}×{} matrix, {} unmatched",
        d.models.len(),
        d.tasks.len(),
        d.results.len(),
        d.heatmap.task_ids.len(),
        d.heatmap.model_ids.len(),
        run.reconciliation.unmatched.len()
    );
}
