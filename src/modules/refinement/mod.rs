//! Relational refinement modules.
//!
//! Each module adds evidence to a [`CommonModel`] in place. Modules declare
//! the [`RelationalCapability`] values they require and affect; the builder
//! orders them with [`order_modules`](crate::graph::order_modules).
//!
//! | key | requires | affects |
//! |---|---|---|
//! | `non_nullability` | - | non_nullable |
//! | `unique_values` | non_nullable | unique |
//! | `distinct_primary_keys` | non_nullable, unique, data_type, primary_key | primary_key |
//! | `cardinality` | relations | cardinality |
//! | `pattern_names` | - | name |
//! | `zip_codes` | data_type | data_type |
//! | `name_relations` | name | relations |

mod constraints;
mod datatypes;
mod inflection;
mod names;
mod relations;

pub use constraints::{DistinctPrimaryKeys, NonNullability, UniqueValues};
pub use datatypes::ZipCodes;
pub use inflection::{is_table_key_name, singularize};
pub use names::PatternNames;
pub use relations::{CardinalityInference, NameRelations};

use crate::graph::{CapabilitySet, Dependent, RelationalCapability};
use crate::model::CommonModel;
use crate::modules::metadata::SampleDirectory;
use crate::modules::ModuleResult;

use RelationalCapability::*;

/// One relational refinement heuristic.
#[derive(Debug, Clone)]
pub enum RefinementModule {
    NonNullability(NonNullability),
    UniqueValues(UniqueValues),
    DistinctPrimaryKeys(DistinctPrimaryKeys),
    Cardinality(CardinalityInference),
    PatternNames(PatternNames),
    ZipCodes(ZipCodes),
    NameRelations(NameRelations),
}

impl RefinementModule {
    pub const KEYS: &'static [&'static str] = &[
        "non_nullability",
        "unique_values",
        "distinct_primary_keys",
        "cardinality",
        "pattern_names",
        "zip_codes",
        "name_relations",
    ];

    /// Apply this module to every table of `model`.
    pub async fn refine(&self, model: &mut CommonModel, samples: &SampleDirectory) -> ModuleResult<()> {
        match self {
            RefinementModule::NonNullability(m) => m.refine(model, samples).await,
            RefinementModule::UniqueValues(m) => m.refine(model, samples).await,
            RefinementModule::DistinctPrimaryKeys(m) => m.refine(model, samples).await,
            RefinementModule::Cardinality(m) => m.refine(model),
            RefinementModule::PatternNames(m) => m.refine(model, samples).await,
            RefinementModule::ZipCodes(m) => m.refine(model, samples).await,
            RefinementModule::NameRelations(m) => m.refine(model),
        }
    }
}

impl Dependent<RelationalCapability> for RefinementModule {
    fn key(&self) -> &'static str {
        match self {
            RefinementModule::NonNullability(_) => "non_nullability",
            RefinementModule::UniqueValues(_) => "unique_values",
            RefinementModule::DistinctPrimaryKeys(_) => "distinct_primary_keys",
            RefinementModule::Cardinality(_) => "cardinality",
            RefinementModule::PatternNames(_) => "pattern_names",
            RefinementModule::ZipCodes(_) => "zip_codes",
            RefinementModule::NameRelations(_) => "name_relations",
        }
    }

    fn requires(&self) -> CapabilitySet<RelationalCapability> {
        match self {
            RefinementModule::NonNullability(_) => CapabilitySet::empty(),
            RefinementModule::UniqueValues(_) => CapabilitySet::of(&[NonNullable]),
            RefinementModule::DistinctPrimaryKeys(_) => {
                CapabilitySet::of(&[NonNullable, Unique, DataType, PrimaryKey])
            }
            RefinementModule::Cardinality(_) => CapabilitySet::of(&[Relations]),
            RefinementModule::PatternNames(_) => CapabilitySet::empty(),
            RefinementModule::ZipCodes(_) => CapabilitySet::of(&[DataType]),
            RefinementModule::NameRelations(_) => CapabilitySet::of(&[Name]),
        }
    }

    fn affects(&self) -> CapabilitySet<RelationalCapability> {
        match self {
            RefinementModule::NonNullability(_) => CapabilitySet::of(&[NonNullable]),
            RefinementModule::UniqueValues(_) => CapabilitySet::of(&[Unique]),
            RefinementModule::DistinctPrimaryKeys(_) => CapabilitySet::of(&[PrimaryKey]),
            RefinementModule::Cardinality(_) => CapabilitySet::of(&[Cardinality]),
            RefinementModule::PatternNames(_) => CapabilitySet::of(&[Name]),
            RefinementModule::ZipCodes(_) => CapabilitySet::of(&[DataType]),
            RefinementModule::NameRelations(_) => CapabilitySet::of(&[Relations]),
        }
    }
}
