//! Constraint discovery from data samples: not-null, unique, primary key.

use std::collections::HashSet;

use crate::model::{ColumnSet, CommonModel};
use crate::modules::metadata::SampleDirectory;
use crate::modules::ModuleResult;

const DEFAULT_SAMPLE: usize = 100;
const PRIMARY_KEY_SAMPLE: usize = 1000;

/// Evidence above this is treated as already settled.
const SETTLED: f64 = 0.25;

/// Confidence that `sample` is free of duplicates, as `1 - 1/n`.
fn distinct_confidence(sample: &[String]) -> Option<f64> {
    let distinct: HashSet<&String> = sample.iter().collect();
    if distinct.len() != sample.len() {
        return None;
    }
    if sample.is_empty() {
        return Some(0.5);
    }
    Some(1.0 - 1.0 / sample.len() as f64)
}

/// Columns whose sample has no empty value are probably not nullable.
#[derive(Debug, Clone, Default)]
pub struct NonNullability;

impl NonNullability {
    pub async fn refine(&self, model: &mut CommonModel, samples: &SampleDirectory) -> ModuleResult<()> {
        for table in model.table_ids().to_vec() {
            for column in model.table(table).columns().to_vec() {
                if model.not_null_for(column).is_some_and(|c| c > SETTLED) {
                    continue;
                }
                let source = model.column(column).source().clone();
                let sample = samples.column_sample(&source, DEFAULT_SAMPLE).await?;
                if sample.iter().all(|v| !v.is_empty()) {
                    model.table_mut(table).add_not_null_candidate(column, 0.8);
                }
            }
        }
        Ok(())
    }
}

/// Columns whose sample has no repeated value are probably unique.
#[derive(Debug, Clone, Default)]
pub struct UniqueValues;

impl UniqueValues {
    pub async fn refine(&self, model: &mut CommonModel, samples: &SampleDirectory) -> ModuleResult<()> {
        for table in model.table_ids().to_vec() {
            for column in model.table(table).columns().to_vec() {
                if model.unique_for(column).is_some() {
                    continue;
                }
                let source = model.column(column).source().clone();
                let sample = samples.column_sample(&source, DEFAULT_SAMPLE).await?;
                if let Some(confidence) = distinct_confidence(&sample) {
                    model
                        .table_mut(table)
                        .add_unique_candidate(ColumnSet::from([column]), confidence);
                }
            }
        }
        Ok(())
    }
}

/// Single-column primary keys from uniqueness evidence or a large sample.
#[derive(Debug, Clone, Default)]
pub struct DistinctPrimaryKeys;

impl DistinctPrimaryKeys {
    pub async fn refine(&self, model: &mut CommonModel, samples: &SampleDirectory) -> ModuleResult<()> {
        for table in model.table_ids().to_vec() {
            if model
                .table(table)
                .primary_key()
                .is_some_and(|pk| pk.confidence > SETTLED)
            {
                continue;
            }

            let mut candidates = Vec::new();
            for column in model.table(table).columns().to_vec() {
                let confidence = if model.unique_for(column).is_some_and(|u| u.confidence > 0.5) {
                    0.8
                } else {
                    let source = model.column(column).source().clone();
                    let sample = samples.column_sample(&source, PRIMARY_KEY_SAMPLE).await?;
                    if sample.is_empty() {
                        0.0
                    } else {
                        distinct_confidence(&sample).unwrap_or(0.0)
                    }
                };
                if confidence > 0.1 {
                    candidates.push((column, confidence));
                }
            }

            let table = model.table_mut(table);
            for (column, confidence) in candidates {
                table.add_primary_key_candidate(ColumnSet::from([column]), confidence);
            }
        }
        Ok(())
    }
}
