//! Keyed (model, task) -> outcome store.
//!
//! Extraction writes into a [`StoreBuilder`]; aggregation only ever sees the
//! frozen [`ResultStore`] it produces.

use crate::model::{Outcome, ResultRecord, TaskId};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Default)]
pub struct StoreBuilder {
    // model ids in first-write order; this is the store iteration order
    order: Vec<String>,
    results: HashMap<String, BTreeMap<TaskId, Outcome>>,
}

impl StoreBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last write for a pair wins.
    pub fn record(&mut self, model_id: &str, task_id: TaskId, outcome: Outcome) {
        if !self.results.contains_key(model_id) {
            self.order.push(model_id.to_string());
        }
        self.results
            .entry(model_id.to_string())
            .or_default()
            .insert(task_id, outcome);
    }

    /// Folds another builder in. Its pairs overwrite ours.
    pub fn merge(&mut self, other: StoreBuilder) {
        let StoreBuilder { order, mut results } = other;
        for model_id in order {
            if let Some(outcomes) = results.remove(&model_id) {
                for (task_id, outcome) in outcomes {
                    self.record(&model_id, task_id, outcome);
                }
            }
        }
    }

    pub fn finish(self) -> ResultStore {
        ResultStore {
            order: self.order,
            results: self.results,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct ResultStore {
    order: Vec<String>,
    results: HashMap<String, BTreeMap<TaskId, Outcome>>,
}

impl ResultStore {
    /// Keeps only the listed models, preserving iteration order.
    pub fn restricted_to<'a, I>(&self, model_ids: I) -> ResultStore
    where
        I: IntoIterator<Item = &'a str>,
    {
        let keep: std::collections::HashSet<&str> = model_ids.into_iter().collect();
        let order: Vec<String> = self
            .order
            .iter()
            .filter(|m| keep.contains(m.as_str()))
            .cloned()
            .collect();
        let results = order
            .iter()
            .filter_map(|m| self.results.get(m).map(|r| (m.clone(), r.clone())))
            .collect();
        ResultStore { order, results }
    }

    pub fn outcomes_for(&self, model_id: &str) -> Option<&BTreeMap<TaskId, Outcome>> {
        self.results.get(model_id)
    }

    pub fn outcome(&self, model_id: &str, task_id: TaskId) -> Option<Outcome> {
        self.results.get(model_id)?.get(&task_id).copied()
    }

    pub fn has_data(&self, model_id: &str) -> bool {
        self.results.get(model_id).is_some_and(|m| !m.is_empty())
    }

    /// Models with at least one record, in store iteration order.
    pub fn model_ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn models_with_data(&self) -> usize {
        self.order.len()
    }

    pub fn record_count(&self, model_id: &str) -> usize {
        self.results.get(model_id).map_or(0, BTreeMap::len)
    }

    pub fn len(&self) -> usize {
        self.results.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every stored pair, grouped by model in iteration order, tasks ascending.
    pub fn flatten(&self) -> Vec<ResultRecord> {
        let mut out = Vec::with_capacity(self.len());
        for model_id in &self.order {
            if let Some(outcomes) = self.results.get(model_id) {
                for (task_id, outcome) in outcomes {
                    out.push(ResultRecord {
                        task_id: *task_id,
                        model_id: model_id.clone(),
                        outcome: outcome.as_bit(),
                    });
                }
            }
        }
        out
    }
}
