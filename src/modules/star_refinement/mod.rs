//! Star refinement: structural transforms applied to every star model.
//!
//! The chain runs in a fixed order regardless of how modules are listed in
//! the configuration; each step may be switched off on its own.
//!
//! 1. `fact_relation_columns`
//! 2. `surrogate_keys`
//! 3. `date_time_dimensions`
//! 4. `junk_dimension`
//! 5. `remove_old_foreign_keys`
//! 6. `naming_convention`
//! 7. `order_columns`
//! 8. `extend_string_length`

mod calendar;
mod junk;
mod keys;
mod layout;
mod naming;

pub use calendar::{
    create_date_dimension, create_time_dimension, DateTimeDimensions, DATE_DIMENSION_NAME,
    TIME_DIMENSION_NAME,
};
pub use junk::JunkDimension;
pub use keys::{
    surrogate_key_spec, FactRelationColumns, RemoveOldForeignKeys, SurrogateKeys,
    SURROGATE_KEY_NAME,
};
pub use layout::{ExtendStringLength, OrderColumns};
pub use naming::{change_casing, format_name, rename_duplicate_columns, NamingConvention};

use crate::model::StarModel;
use crate::modules::ModuleResult;

#[derive(Debug, Clone)]
pub enum StarRefinementModule {
    FactRelationColumns(FactRelationColumns),
    SurrogateKeys(SurrogateKeys),
    DateTimeDimensions(DateTimeDimensions),
    JunkDimension(JunkDimension),
    RemoveOldForeignKeys(RemoveOldForeignKeys),
    NamingConvention(NamingConvention),
    OrderColumns(OrderColumns),
    ExtendStringLength(ExtendStringLength),
}

impl StarRefinementModule {
    /// Keys in chain order.
    pub const KEYS: &'static [&'static str] = &[
        "fact_relation_columns",
        "surrogate_keys",
        "date_time_dimensions",
        "junk_dimension",
        "remove_old_foreign_keys",
        "naming_convention",
        "order_columns",
        "extend_string_length",
    ];

    pub fn key(&self) -> &'static str {
        match self {
            StarRefinementModule::FactRelationColumns(_) => "fact_relation_columns",
            StarRefinementModule::SurrogateKeys(_) => "surrogate_keys",
            StarRefinementModule::DateTimeDimensions(_) => "date_time_dimensions",
            StarRefinementModule::JunkDimension(_) => "junk_dimension",
            StarRefinementModule::RemoveOldForeignKeys(_) => "remove_old_foreign_keys",
            StarRefinementModule::NamingConvention(_) => "naming_convention",
            StarRefinementModule::OrderColumns(_) => "order_columns",
            StarRefinementModule::ExtendStringLength(_) => "extend_string_length",
        }
    }

    /// Position of this module in the chain.
    pub fn position(&self) -> usize {
        Self::KEYS
            .iter()
            .position(|k| *k == self.key())
            .unwrap_or(Self::KEYS.len())
    }

    pub fn refine(&self, star: &mut StarModel) -> ModuleResult<()> {
        match self {
            StarRefinementModule::FactRelationColumns(m) => m.refine(star),
            StarRefinementModule::SurrogateKeys(m) => m.refine(star),
            StarRefinementModule::DateTimeDimensions(m) => m.refine(star),
            StarRefinementModule::JunkDimension(m) => m.refine(star),
            StarRefinementModule::RemoveOldForeignKeys(m) => m.refine(star),
            StarRefinementModule::NamingConvention(m) => m.refine(star),
            StarRefinementModule::OrderColumns(m) => m.refine(star),
            StarRefinementModule::ExtendStringLength(m) => m.refine(star),
        }
    }
}

/// Sort selected modules into chain order.
pub fn chain_order(mut modules: Vec<StarRefinementModule>) -> Vec<StarRefinementModule> {
    modules.sort_by_key(|m| m.position());
    modules
}
