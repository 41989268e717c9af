//! Turns settings plus a registry into a runnable [`Engine`].
//!
//! Every configuration problem is reported here, before any phase runs:
//! unknown keys, empty required phases, missing connections, refinement
//! modules whose required capabilities nobody provides, and dependency
//! cycles.

use std::sync::Arc;

use tracing::debug;

use crate::config::Settings;
use crate::graph::{order_modules, Capability, CapabilitySet, Dependent, RelationalCapability};
use crate::modules::metadata::InferenceModule;
use crate::modules::refinement::RefinementModule;
use crate::modules::star_refinement::chain_order;
use crate::modules::Phase;

use super::engine::Engine;
use super::error::BuildError;
use super::registry::{resolve, ModuleRegistry};

/// Fail on the first selected module requiring a capability that neither
/// a connector nor a selected module affects.
fn check_capabilities<C: Capability, M: Dependent<C>>(
    modules: &[M],
    provided: CapabilitySet<C>,
) -> Result<(), BuildError> {
    let available = modules
        .iter()
        .fold(provided, |acc, m| acc.union(&m.affects()));
    for module in modules {
        if let Some(missing) = module.requires().difference(&available).iter().next() {
            return Err(BuildError::MissingCapability {
                module: module.key(),
                capability: missing.name(),
            });
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EngineBuilder;

impl EngineBuilder {
    pub fn build(settings: &Settings, registry: &ModuleRegistry) -> Result<Engine, BuildError> {
        if settings.connections.is_empty() {
            return Err(BuildError::NoConnections);
        }
        let phases = &settings.phases;
        for (phase, selected) in [
            (Phase::Metadata, &phases.metadata),
            (Phase::Fact, &phases.fact),
            (Phase::Generation, &phases.generation),
        ] {
            if selected.is_empty() {
                return Err(BuildError::MissingPhaseModules(phase));
            }
        }

        let inference: Vec<Arc<dyn InferenceModule>> =
            resolve(Phase::Metadata, &phases.metadata, &registry.inference, |m| m.key())?;
        let refinement: Vec<RefinementModule> =
            resolve(Phase::Refinement, &phases.refinement, &registry.refinement, |m| m.key())?;
        let combination =
            resolve(Phase::Combination, &phases.combination, &registry.combination, |m| m.key())?;
        let fact = resolve(Phase::Fact, &phases.fact, &registry.fact, |m| m.key())?;
        let dimension =
            resolve(Phase::Dimension, &phases.dimension, &registry.dimension, |m| m.key())?;
        let star_refinement = resolve(
            Phase::StarRefinement,
            &phases.star_refinement,
            &registry.star_refinement,
            |m| m.key(),
        )?;
        let generation =
            resolve(Phase::Generation, &phases.generation, &registry.generation, |m| m.key())?;

        let provided: CapabilitySet<RelationalCapability> = ModuleRegistry::provided(&inference);
        check_capabilities(&refinement, provided)?;
        check_capabilities(&dimension, CapabilitySet::empty())?;

        let refinement = order_modules(refinement)?;
        let dimension = order_modules(dimension)?;
        let star_refinement = chain_order(star_refinement);
        debug!(
            refinement = ?refinement.iter().map(|m| m.key()).collect::<Vec<_>>(),
            "module order resolved"
        );

        Ok(Engine {
            connections: settings.connections.clone(),
            star: settings.star.clone(),
            inference,
            refinement,
            combination,
            fact,
            dimension,
            star_refinement,
            generation,
        })
    }
}
