//! Joins internal submission slugs with external leaderboard rows.
//!
//! A slug matches a row when either lower-cased name contains the other. The
//! first matching row in leaderboard order wins. Slugs without a match are
//! excluded from every output but are reported, together with the closest
//! leaderboard name, so the exclusion is visible.

use crate::errors::similarity::{closest_name, ClosestMatch};
use crate::inputs::LeaderboardRow;
use crate::model::ModelRecord;
use crate::store::ResultStore;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogueEntry {
    pub id: String,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnmatchedModel {
    pub id: String,
    pub display_name: String,
    pub closest: Option<ClosestMatch>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AmbiguousMatch {
    pub id: String,
    pub chosen: String,
    pub also_matched: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciliation {
    /// Catalogue order.
    pub models: Vec<ModelRecord>,
    pub unmatched: Vec<UnmatchedModel>,
    pub ambiguous: Vec<AmbiguousMatch>,
}

pub fn names_match(a: &str, b: &str) -> bool {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    a.contains(&b) || b.contains(&a)
}

pub fn reconcile(
    catalogue: &[CatalogueEntry],
    rows: &[LeaderboardRow],
    store: &ResultStore,
) -> Reconciliation {
    let mut out = Reconciliation::default();

    for entry in catalogue {
        let mut matches = rows
            .iter()
            .filter(|r| names_match(&entry.display_name, &r.model));

        let Some(row) = matches.next() else {
            let names: Vec<String> = rows.iter().map(|r| r.model.clone()).collect();
            let closest = closest_name(&entry.display_name, &names);
            tracing::warn!(
                event = "arena.reconcile.unmatched",
                model_id = %entry.id,
                display_name = %entry.display_name,
                closest = ?closest.as_ref().map(|c| &c.name),
                "no leaderboard row matches; model excluded from outputs"
            );
            out.unmatched.push(UnmatchedModel {
                id: entry.id.clone(),
                display_name: entry.display_name.clone(),
                closest,
            });
            continue;
        };

        let also_matched: Vec<String> = matches.map(|r| r.model.clone()).collect();
        if !also_matched.is_empty() {
            tracing::warn!(
                event = "arena.reconcile.ambiguous",
                model_id = %entry.id,
                chosen = %row.model,
                others = ?also_matched,
            );
            out.ambiguous.push(AmbiguousMatch {
                id: entry.id.clone(),
                chosen: row.model.clone(),
                also_matched,
            });
        }

        out.models.push(ModelRecord {
            id: entry.id.clone(),
            display_name: row.model.clone(),
            date: row.date.clone(),
            is_open: row.is_open,
            size_billion: row.size_billion,
            official_success_rate: row.success_rate,
            has_trajectories: store.has_data(&entry.id),
        });
    }

    out
}
