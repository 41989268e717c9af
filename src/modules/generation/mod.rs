//! Generation: script artifacts for a refined star model.
//!
//! Modules return their artifacts; the engine writes them to the output
//! directory.

mod alias;
mod ddl;
mod etl;

pub use alias::AliasContext;
pub use ddl::{physical_tables, quote, sql_type, ColumnDef, CreateScript, CreateTable, ForeignKey};
pub use etl::EtlScript;

use crate::model::StarModel;
use crate::modules::ModuleResult;

/// A generated file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub file_name: String,
    pub content: String,
}

#[derive(Debug, Clone)]
pub enum GenerationModule {
    CreateScript(CreateScript),
    EtlScript(EtlScript),
}

impl GenerationModule {
    pub const KEYS: &'static [&'static str] = &["create_script", "etl_script"];

    pub fn key(&self) -> &'static str {
        match self {
            GenerationModule::CreateScript(_) => "create_script",
            GenerationModule::EtlScript(_) => "etl_script",
        }
    }

    pub fn generate(&self, star: &StarModel, aliases: &mut AliasContext) -> ModuleResult<Artifact> {
        match self {
            GenerationModule::CreateScript(m) => m.generate(star),
            GenerationModule::EtlScript(m) => m.generate(star, aliases),
        }
    }
}
