//! Datatype corrections from data samples.

use crate::model::{CommonModel, DataType, TypeTag};
use crate::modules::metadata::SampleDirectory;
use crate::modules::ModuleResult;

const SAMPLE_SIZE: usize = 50;

/// Integer columns holding zero-padded codes are really strings.
#[derive(Debug, Clone, Default)]
pub struct ZipCodes;

impl ZipCodes {
    pub async fn refine(&self, model: &mut CommonModel, samples: &SampleDirectory) -> ModuleResult<()> {
        for table in model.table_ids().to_vec() {
            for column in model.table(table).columns().to_vec() {
                if model.column(column).datatype().tag != TypeTag::Integer {
                    continue;
                }
                let source = model.column(column).source().clone();
                let sample = samples.column_sample(&source, SAMPLE_SIZE).await?;
                if sample.iter().any(|v| is_zero_padded(v)) {
                    model
                        .column_mut(column)
                        .add_datatype_candidate(DataType::new(TypeTag::VarWChar), 0.8);
                }
            }
        }
        Ok(())
    }
}

fn is_zero_padded(value: &str) -> bool {
    value.starts_with('0') && value.len() >= 4
}
