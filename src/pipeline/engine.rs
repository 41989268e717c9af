//! The orchestrator: runs every phase over the configured connections.
//!
//! Phases run in [`Phase`] order. Only a broken output directory aborts a
//! run; connector problems and module failures are logged and skipped.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::{ConnectionSettings, StarSettings};
use crate::graph::{split_components, Dependent};
use crate::model::{CommonModel, Database, StarModel};
use crate::modules::combination::CombinationModule;
use crate::modules::dimension::DimensionModule;
use crate::modules::fact::{discover_facts, FactModule};
use crate::modules::generation::{AliasContext, GenerationModule};
use crate::modules::metadata::InferenceModule;
use crate::modules::refinement::RefinementModule;
use crate::modules::star_refinement::{rename_duplicate_columns, StarRefinementModule};
use crate::modules::Phase;

use super::context::RunContext;
use super::error::{PipelineError, PipelineResult};

/// Counts and outputs of one run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    /// Connections whose schema was merged.
    pub connections: usize,
    pub skipped_connections: usize,
    /// Tables in the merged model.
    pub tables: usize,
    /// Module failures across all phases.
    pub module_failures: usize,
    pub groups: usize,
    /// Models after combination, sources included.
    pub permutations: usize,
    /// Star models that survived dimension discovery.
    pub star_models: usize,
    pub artifacts: Vec<PathBuf>,
}

/// A validated, dependency-ordered pipeline. Built by
/// [`EngineBuilder`](super::EngineBuilder).
pub struct Engine {
    pub(crate) connections: Vec<ConnectionSettings>,
    pub(crate) star: StarSettings,
    pub(crate) inference: Vec<Arc<dyn InferenceModule>>,
    pub(crate) refinement: Vec<RefinementModule>,
    pub(crate) combination: Vec<CombinationModule>,
    pub(crate) fact: Vec<FactModule>,
    pub(crate) dimension: Vec<DimensionModule>,
    pub(crate) star_refinement: Vec<StarRefinementModule>,
    pub(crate) generation: Vec<GenerationModule>,
}

impl Engine {
    /// Refinement keys in execution order.
    pub fn refinement_keys(&self) -> Vec<&'static str> {
        self.refinement.iter().map(|m| m.key()).collect()
    }

    /// Dimension keys in execution order.
    pub fn dimension_keys(&self) -> Vec<&'static str> {
        self.dimension.iter().map(|m| m.key()).collect()
    }

    pub fn star_refinement_keys(&self) -> Vec<&'static str> {
        self.star_refinement.iter().map(|m| m.key()).collect()
    }

    /// Execute every phase, writing artifacts below `output_dir`.
    pub async fn run(&self, output_dir: &Path) -> PipelineResult<RunReport> {
        let mut ctx = RunContext::new();
        let span = info_span!("pipeline_run", run_id = %ctx.run_id);
        self.run_phases(&mut ctx, output_dir).instrument(span).await
    }

    async fn run_phases(&self, ctx: &mut RunContext, output_dir: &Path) -> PipelineResult<RunReport> {
        let mut report = RunReport {
            run_id: ctx.run_id,
            ..RunReport::default()
        };

        let mut model = self
            .metadata(ctx, &mut report)
            .instrument(info_span!("phase", phase = %Phase::Metadata))
            .await;

        self.refine(&mut model, ctx, &mut report)
            .instrument(info_span!("phase", phase = %Phase::Refinement))
            .await;

        let groups = info_span!("phase", phase = %Phase::Grouping)
            .in_scope(|| split_components(&model, &mut ctx.ids));
        report.groups = groups.len();
        info!(groups = groups.len(), "grouped tables");

        let permutations = self
            .combine(groups, ctx)
            .instrument(info_span!("phase", phase = %Phase::Combination))
            .await;
        report.permutations = permutations.len();

        let stars = info_span!("phase", phase = %Phase::Fact).in_scope(|| self.facts(permutations));

        let stars = info_span!("phase", phase = %Phase::Dimension)
            .in_scope(|| self.dimensions(stars, &mut report));
        report.star_models = stars.len();

        let stars = info_span!("phase", phase = %Phase::StarRefinement)
            .in_scope(|| self.refine_stars(stars, &mut report));

        self.generate(&stars, output_dir, &mut report)
            .instrument(info_span!("phase", phase = %Phase::Generation))
            .await?;

        info!(
            star_models = report.star_models,
            artifacts = report.artifacts.len(),
            failures = report.module_failures,
            "run complete"
        );
        Ok(report)
    }

    // ========================================================================
    // Phases
    // ========================================================================

    async fn metadata(&self, ctx: &mut RunContext, report: &mut RunReport) -> CommonModel {
        let mut merged = CommonModel::new(ctx.ids.next_origin());

        for connection in &self.connections {
            let Some(module) = self
                .inference
                .iter()
                .find(|m| connection.matches(m.source_type()))
            else {
                warn!(source_type = %connection.source_type, "no inference module for source type");
                report.skipped_connections += 1;
                continue;
            };

            let connection_string = match connection.resolved_connection_string() {
                Ok(s) => s,
                Err(e) => {
                    warn!(error = %e, "skipping connection");
                    report.skipped_connections += 1;
                    continue;
                }
            };
            if !module.is_valid_connection(&connection_string).await {
                warn!(
                    module = module.key(),
                    connection = %connection_string,
                    "invalid connection"
                );
                report.skipped_connections += 1;
                continue;
            }

            let database = Database {
                id: ctx.ids.next_database(),
                name: module.database_name(&connection_string),
                connection_string,
                source_type: module.source_type().to_string(),
            };
            let schema = match module.schema(&database, merged.origin_id()).await {
                Ok(schema) => schema,
                Err(e) => {
                    warn!(module = module.key(), database = %database.name, error = %e, "schema extraction failed");
                    report.skipped_connections += 1;
                    continue;
                }
            };
            let name = database.name.clone();
            if let Err(e) = ctx.samples.register(database, Arc::clone(module)) {
                warn!(database = %name, error = %e, "skipping connection");
                report.skipped_connections += 1;
                continue;
            }

            info!(database = %name, tables = schema.table_count(), "extracted schema");
            merged.absorb(schema);
            report.connections += 1;
        }

        report.tables = merged.table_count();
        merged
    }

    async fn refine(&self, model: &mut CommonModel, ctx: &RunContext, report: &mut RunReport) {
        for module in &self.refinement {
            debug!(module = module.key(), "refining");
            if let Err(e) = module.refine(model, &ctx.samples).await {
                error!(module = module.key(), error = %e, "refinement module failed");
                report.module_failures += 1;
            }
        }
    }

    async fn combine(&self, groups: Vec<CommonModel>, ctx: &mut RunContext) -> Vec<CommonModel> {
        let mut models = groups;
        for module in &self.combination {
            let mut next = Vec::with_capacity(models.len());
            for model in models {
                next.extend(module.combine(model, &ctx.samples, &mut ctx.suffixes).await);
            }
            info!(module = module.key(), models = next.len(), "combined tables");
            models = next;
        }
        models
    }

    fn facts(&self, models: Vec<CommonModel>) -> Vec<StarModel> {
        let stars: Vec<StarModel> = models
            .into_iter()
            .flat_map(|model| discover_facts(Arc::new(model), &self.fact, self.star.fact_threshold))
            .collect();
        info!(stars = stars.len(), "discovered facts");
        stars
    }

    fn dimensions(&self, stars: Vec<StarModel>, report: &mut RunReport) -> Vec<StarModel> {
        let min_dimensions = self.star.min_dimensions;
        let mut kept = Vec::with_capacity(stars.len());
        for mut star in stars {
            for module in &self.dimension {
                if let Err(e) = module.refine(&mut star) {
                    error!(module = module.key(), error = %e, "dimension module failed");
                    report.module_failures += 1;
                }
            }
            if star.dimensions().len() > min_dimensions {
                kept.push(star);
            } else {
                debug!(
                    fact = %star.table(star.fact()).name,
                    dimensions = star.dimensions().len(),
                    "dropping star model"
                );
            }
        }
        info!(stars = kept.len(), "derived dimensions");
        kept
    }

    fn refine_stars(&self, mut stars: Vec<StarModel>, report: &mut RunReport) -> Vec<StarModel> {
        for star in &mut stars {
            for module in &self.star_refinement {
                if let Err(e) = module.refine(star) {
                    error!(module = module.key(), error = %e, "star refinement module failed");
                    report.module_failures += 1;
                }
            }
        }
        stars
    }

    async fn generate(
        &self,
        stars: &[StarModel],
        output_dir: &Path,
        report: &mut RunReport,
    ) -> PipelineResult<()> {
        tokio::fs::create_dir_all(output_dir)
            .await
            .map_err(|source| PipelineError::Output {
                path: output_dir.to_path_buf(),
                source,
            })?;

        for star in stars {
            let mut star = star.clone();
            for table in star.table_ids() {
                rename_duplicate_columns(&mut star, table);
            }
            let dir = output_dir.join(star.origin().label());
            if let Err(e) = tokio::fs::create_dir_all(&dir).await {
                error!(path = %dir.display(), error = %e, "cannot create model directory");
                continue;
            }

            let mut aliases = AliasContext::new();
            for module in &self.generation {
                let artifact = match module.generate(&star, &mut aliases) {
                    Ok(artifact) => artifact,
                    Err(e) => {
                        error!(module = module.key(), error = %e, "generation module failed");
                        report.module_failures += 1;
                        continue;
                    }
                };
                let path = dir.join(&artifact.file_name);
                match tokio::fs::write(&path, artifact.content).await {
                    Ok(()) => {
                        debug!(path = %path.display(), "wrote artifact");
                        report.artifacts.push(path);
                    }
                    Err(e) => {
                        error!(module = module.key(), path = %path.display(), error = %e, "cannot write artifact");
                        report.module_failures += 1;
                    }
                }
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("connections", &self.connections.len())
            .field("refinement", &self.refinement_keys())
            .field("dimension", &self.dimension_keys())
            .field("star_refinement", &self.star_refinement_keys())
            .finish()
    }
}
