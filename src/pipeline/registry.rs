//! Stable module keys mapped to module instances, per phase.

use std::sync::Arc;

use serde::Serialize;

use crate::config::Settings;
use crate::graph::{Capability, CapabilitySet, Dependent, RelationalCapability};
use crate::modules::combination::{CombinationModule, CombineTables};
use crate::modules::dimension::{DimensionModule, FlattenDimensions, Measures};
use crate::modules::fact::{FactModule, ManyToOne, NumericRatio, RowCount};
use crate::modules::generation::{CreateScript, EtlScript, GenerationModule};
use crate::modules::metadata::{builtin_inference_modules, InferenceModule};
use crate::modules::refinement::{
    CardinalityInference, DistinctPrimaryKeys, NameRelations, NonNullability, PatternNames,
    RefinementModule, UniqueValues, ZipCodes,
};
use crate::modules::star_refinement::{
    DateTimeDimensions, ExtendStringLength, FactRelationColumns, JunkDimension, NamingConvention,
    OrderColumns, RemoveOldForeignKeys, StarRefinementModule, SurrogateKeys,
};
use crate::modules::Phase;

use super::error::BuildError;

/// One registered module, as listed by `starforge modules`.
#[derive(Debug, Clone, Serialize)]
pub struct ModuleInfo {
    pub phase: Phase,
    pub key: &'static str,
    pub requires: Vec<&'static str>,
    pub affects: Vec<&'static str>,
}

fn info<C: Capability, M: Dependent<C>>(phase: Phase, module: &M) -> ModuleInfo {
    ModuleInfo {
        phase,
        key: module.key(),
        requires: module.requires().names(),
        affects: module.affects().names(),
    }
}

fn plain(phase: Phase, key: &'static str) -> ModuleInfo {
    ModuleInfo {
        phase,
        key,
        requires: Vec::new(),
        affects: Vec::new(),
    }
}

/// Every module the builder can select from.
#[derive(Default)]
pub struct ModuleRegistry {
    pub(crate) inference: Vec<Arc<dyn InferenceModule>>,
    pub(crate) refinement: Vec<RefinementModule>,
    pub(crate) combination: Vec<CombinationModule>,
    pub(crate) fact: Vec<FactModule>,
    pub(crate) dimension: Vec<DimensionModule>,
    pub(crate) star_refinement: Vec<StarRefinementModule>,
    pub(crate) generation: Vec<GenerationModule>,
}

impl ModuleRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// All built-in modules, configured from `settings`.
    pub fn builtin(settings: &Settings) -> Result<Self, BuildError> {
        Ok(Self {
            inference: builtin_inference_modules(&settings.csv),
            refinement: vec![
                RefinementModule::NonNullability(NonNullability),
                RefinementModule::UniqueValues(UniqueValues),
                RefinementModule::DistinctPrimaryKeys(DistinctPrimaryKeys),
                RefinementModule::Cardinality(CardinalityInference),
                RefinementModule::PatternNames(PatternNames::new(&settings.patterns)?),
                RefinementModule::ZipCodes(ZipCodes),
                RefinementModule::NameRelations(NameRelations),
            ],
            combination: vec![CombinationModule::CombineTables(CombineTables)],
            fact: vec![
                FactModule::ManyToOne(ManyToOne),
                FactModule::NumericRatio(NumericRatio),
                FactModule::RowCount(RowCount),
            ],
            dimension: vec![
                DimensionModule::FlattenDimensions(FlattenDimensions),
                DimensionModule::Measures(Measures),
            ],
            star_refinement: vec![
                StarRefinementModule::FactRelationColumns(FactRelationColumns),
                StarRefinementModule::SurrogateKeys(SurrogateKeys),
                StarRefinementModule::DateTimeDimensions(DateTimeDimensions),
                StarRefinementModule::JunkDimension(JunkDimension),
                StarRefinementModule::RemoveOldForeignKeys(RemoveOldForeignKeys),
                StarRefinementModule::NamingConvention(NamingConvention::new(
                    settings.naming.clone(),
                )),
                StarRefinementModule::OrderColumns(OrderColumns),
                StarRefinementModule::ExtendStringLength(ExtendStringLength),
            ],
            generation: vec![
                GenerationModule::CreateScript(CreateScript),
                GenerationModule::EtlScript(EtlScript::default()),
            ],
        })
    }

    /// Register an additional connector. A connection uses the first
    /// selected connector matching its source type.
    pub fn register_inference(&mut self, module: Arc<dyn InferenceModule>) {
        self.inference.push(module);
    }

    pub fn register_generation(&mut self, module: GenerationModule) {
        self.generation.push(module);
    }

    /// Registered modules in phase order.
    pub fn describe(&self) -> Vec<ModuleInfo> {
        let mut modules = Vec::new();
        for m in &self.inference {
            let mut entry = plain(Phase::Metadata, m.key());
            entry.affects = m.provides().names();
            modules.push(entry);
        }
        modules.extend(self.refinement.iter().map(|m| info(Phase::Refinement, m)));
        modules.extend(self.combination.iter().map(|m| plain(Phase::Combination, m.key())));
        modules.extend(self.fact.iter().map(|m| plain(Phase::Fact, m.key())));
        modules.extend(self.dimension.iter().map(|m| info(Phase::Dimension, m)));
        modules.extend(
            self.star_refinement
                .iter()
                .map(|m| plain(Phase::StarRefinement, m.key())),
        );
        modules.extend(self.generation.iter().map(|m| plain(Phase::Generation, m.key())));
        modules
    }

    /// Capabilities the selected connectors deliver with their schemas.
    pub(crate) fn provided(modules: &[Arc<dyn InferenceModule>]) -> CapabilitySet<RelationalCapability> {
        modules
            .iter()
            .fold(CapabilitySet::empty(), |acc, m| acc.union(&m.provides()))
    }
}

/// Pick the modules named by `selected`, in the order given.
pub(crate) fn resolve<M: Clone>(
    phase: Phase,
    selected: &[String],
    available: &[M],
    key: impl Fn(&M) -> &str,
) -> Result<Vec<M>, BuildError> {
    selected
        .iter()
        .map(|wanted| {
            available
                .iter()
                .find(|m| key(*m) == wanted.as_str())
                .cloned()
                .ok_or_else(|| BuildError::UnknownModule {
                    phase,
                    key: wanted.clone(),
                })
        })
        .collect()
}
