/// A leaderboard name that came close to matching a catalogue entry.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ClosestMatch {
    pub name: String,
    pub similarity: f64,
}

/// Below this, a suggestion is more noise than help.
const MIN_SIMILARITY: f64 = 0.4;

/// Finds the candidate most similar to `needle` (case-insensitive normalized Levenshtein).
pub fn closest_name<'a, I>(needle: &str, candidates: I) -> Option<ClosestMatch>
where
    I: IntoIterator<Item = &'a String>,
{
    let needle = needle.to_lowercase();
    let mut best: Option<ClosestMatch> = None;

    for c in candidates {
        let score = strsim::normalized_levenshtein(&needle, &c.to_lowercase());
        if score < MIN_SIMILARITY {
            continue;
        }
        // strict > keeps the earliest candidate on ties
        if best.as_ref().map_or(true, |b| score > b.similarity) {
            best = Some(ClosestMatch {
                name: c.clone(),
                similarity: (score * 100.0).round() / 100.0,
            });
        }
    }
    best
}
