use anyhow::Context as _;
use sha2::{Digest, Sha256};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Fingerprint {
    pub hex: String,
    pub components: Vec<String>,
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut h = Sha256::new();
    h.update(bytes);
    hex::encode(h.finalize())
}

pub fn file_sha256(path: &Path) -> anyhow::Result<String> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read {} for fingerprinting", path.display()))?;
    Ok(sha256_hex(&bytes))
}

/// What a run's outputs are a function of.
pub struct Context<'a> {
    pub tasks_sha256: &'a str,
    pub leaderboard_sha256: &'a str,
    pub benchmark_size: usize,
    /// `(model_id, canonical format descriptor)` per submission.
    pub submissions: &'a [(String, String)],
}

/// Computes a deterministic fingerprint of the input snapshot.
///
/// Trajectory files are not hashed; the submission descriptors stand in for
/// how they are read.
pub fn compute(ctx: Context<'_>) -> Fingerprint {
    let mut parts = vec![
        format!("tasks={}", ctx.tasks_sha256),
        format!("leaderboard={}", ctx.leaderboard_sha256),
        format!("benchmark_size={}", ctx.benchmark_size),
    ];

    // catalogue order feeds tie-breaks and passing_models, so it is hashed as-is
    for (id, descriptor) in ctx.submissions {
        parts.push(format!("submission.{id}={descriptor}"));
    }

    parts.push(format!("arena_version={}", env!("CARGO_PKG_VERSION")));

    let raw = parts.join("\n");
    Fingerprint {
        hex: sha256_hex(raw.as_bytes()),
        components: parts,
    }
}
