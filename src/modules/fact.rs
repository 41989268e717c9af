//! Fact-table discovery.
//!
//! Every heuristic scores every table of a model in `[0, 1]`. Scores for the
//! same table are averaged across heuristics and tables at or above the
//! threshold become the fact of a new [`StarModel`].

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::model::{mean_confidence, Cardinality, CommonModel, StarModel, TableId};

/// A table's score from one heuristic.
pub type FactScore = (TableId, f64);

/// Many-to-one references held by a table: `<2 -> 0`, `2 -> 0.7`, `>2 -> 0.9`.
#[derive(Debug, Clone, Default)]
pub struct ManyToOne;

impl ManyToOne {
    pub fn score(&self, model: &CommonModel) -> Vec<FactScore> {
        model
            .tables()
            .map(|(id, _)| {
                let references = model
                    .relations_of(id)
                    .filter(|(_, r)| r.link == id && r.cardinality == Cardinality::ManyToOne)
                    .count();
                let score = match references {
                    0 | 1 => 0.0,
                    2 => 0.7,
                    _ => 0.9,
                };
                (id, score)
            })
            .collect()
    }
}

/// Ratio of numeric to non-numeric columns.
#[derive(Debug, Clone, Default)]
pub struct NumericRatio;

impl NumericRatio {
    pub fn score(&self, model: &CommonModel) -> Vec<FactScore> {
        model
            .tables()
            .map(|(id, _)| {
                let (numeric, other) = model.columns_of(id).fold((0usize, 0usize), |(n, o), (_, c)| {
                    if c.datatype().is_numeric() {
                        (n + 1, o)
                    } else {
                        (n, o + 1)
                    }
                });
                let ratio = if other == 0 {
                    numeric as f64
                } else {
                    numeric as f64 / other as f64
                };
                (id, ratio_score(ratio))
            })
            .collect()
    }
}

fn ratio_score(ratio: f64) -> f64 {
    if ratio >= 5.0 {
        1.0
    } else if ratio >= 3.0 {
        0.5
    } else if ratio >= 1.0 {
        0.2
    } else {
        0.0
    }
}

/// Row count compared with the model's mean non-empty row count.
#[derive(Debug, Clone, Default)]
pub struct RowCount;

impl RowCount {
    pub fn score(&self, model: &CommonModel) -> Vec<FactScore> {
        let counts: Vec<(TableId, Option<u64>)> =
            model.tables().map(|(id, t)| (id, t.row_count)).collect();

        let non_empty: Vec<f64> = counts
            .iter()
            .filter_map(|(_, rc)| rc.filter(|r| *r > 0).map(|r| r as f64))
            .collect();
        let Some(average) = mean_confidence(non_empty) else {
            debug!("row_count skipped: no table has rows");
            return Vec::new();
        };
        if counts.iter().any(|(_, rc)| rc.is_none()) {
            debug!("row_count skipped: unknown row counts");
            return Vec::new();
        }

        counts
            .into_iter()
            .map(|(id, rc)| {
                let rows = rc.unwrap_or(0) as f64;
                let score = if rows * 10.0 > average {
                    1.0
                } else if rows * 5.0 > average {
                    0.5
                } else if rows * 2.0 > average {
                    0.2
                } else {
                    0.0
                };
                (id, score)
            })
            .collect()
    }
}

/// All fact heuristics.
#[derive(Debug, Clone)]
pub enum FactModule {
    ManyToOne(ManyToOne),
    NumericRatio(NumericRatio),
    RowCount(RowCount),
}

impl FactModule {
    pub const KEYS: &'static [&'static str] = &["many_to_one", "numeric_ratio", "row_count"];

    pub fn key(&self) -> &'static str {
        match self {
            FactModule::ManyToOne(_) => "many_to_one",
            FactModule::NumericRatio(_) => "numeric_ratio",
            FactModule::RowCount(_) => "row_count",
        }
    }

    pub fn score(&self, model: &CommonModel) -> Vec<FactScore> {
        match self {
            FactModule::ManyToOne(m) => m.score(model),
            FactModule::NumericRatio(m) => m.score(model),
            FactModule::RowCount(m) => m.score(model),
        }
    }
}

/// Mean score per table, in model order.
pub fn average_scores(model: &CommonModel, modules: &[FactModule]) -> Vec<FactScore> {
    let mut scores: BTreeMap<TableId, Vec<f64>> = BTreeMap::new();
    for module in modules {
        for (table, score) in module.score(model) {
            scores.entry(table).or_default().push(score);
        }
    }
    model
        .table_ids()
        .iter()
        .filter_map(|id| {
            let mean = mean_confidence(scores.remove(id)?)?;
            Some((*id, mean))
        })
        .collect()
}

/// Tables whose averaged score reaches `threshold`. When the model holds
/// combined tables only those may qualify.
pub fn select_facts(model: &CommonModel, averaged: &[FactScore], threshold: f64) -> Vec<FactScore> {
    let combined_only = model.has_combined_tables();
    averaged
        .iter()
        .copied()
        .filter(|(id, score)| {
            *score >= threshold && (!combined_only || model.table(*id).is_combined())
        })
        .collect()
}

/// Star models for every qualifying fact of `model`.
pub fn discover_facts(
    model: Arc<CommonModel>,
    modules: &[FactModule],
    threshold: f64,
) -> Vec<StarModel> {
    let averaged = average_scores(&model, modules);
    select_facts(&model, &averaged, threshold)
        .into_iter()
        .map(|(table, confidence)| {
            debug!(
                model = %model.label(),
                table = %model.table(table).name,
                confidence,
                "fact candidate"
            );
            StarModel::new(Arc::clone(&model), table, confidence)
        })
        .collect()
}
