use std::path::PathBuf;

use crate::config::SettingsError;
use crate::graph::DependencyCycle;
use crate::modules::Phase;

/// Configuration problems found before any phase runs.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("No connections configured")]
    NoConnections,

    #[error("No modules selected for required phase '{0}'")]
    MissingPhaseModules(Phase),

    #[error("Unknown module '{key}' in phase '{phase}'")]
    UnknownModule { phase: Phase, key: String },

    #[error("Module '{module}' requires '{capability}', which no selected module provides")]
    MissingCapability {
        module: &'static str,
        capability: &'static str,
    },

    #[error(transparent)]
    Cycle(#[from] DependencyCycle),

    #[error("Invalid value pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Top-level pipeline failure.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Build error: {0}")]
    Build(#[from] BuildError),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("Failed to prepare output directory {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type PipelineResult<T> = Result<T, PipelineError>;
