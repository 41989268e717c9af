//! Pipeline modules, grouped by the phase that runs them.
//!
//! | phase | modules |
//! |---|---|
//! | metadata | [`metadata::InferenceModule`] trait objects |
//! | refinement | [`refinement::RefinementModule`] |
//! | combination | [`combination::CombinationModule`] |
//! | fact | [`fact::FactModule`] |
//! | dimension | [`dimension::DimensionModule`] |
//! | star refinement | [`star_refinement::StarRefinementModule`] |
//! | generation | [`generation::GenerationModule`] |

pub mod combination;
pub mod dimension;
pub mod fact;
pub mod generation;
pub mod metadata;
pub mod refinement;
pub mod star_refinement;

use std::fmt;

use serde::Serialize;

use crate::graph::JoinPathError;
use metadata::ConnectorError;

/// Failure of one module on one item. The orchestrator logs it and moves on.
#[derive(Debug, thiserror::Error)]
pub enum ModuleError {
    #[error(transparent)]
    Connector(#[from] ConnectorError),

    #[error(transparent)]
    JoinPath(#[from] JoinPathError),

    #[error("{module}: {reason}")]
    Failed { module: &'static str, reason: String },
}

impl ModuleError {
    pub fn failed(module: &'static str, reason: impl Into<String>) -> Self {
        ModuleError::Failed {
            module,
            reason: reason.into(),
        }
    }
}

pub type ModuleResult<T> = Result<T, ModuleError>;

/// Pipeline phases in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Metadata,
    Refinement,
    Grouping,
    Combination,
    Fact,
    Dimension,
    StarRefinement,
    Generation,
}

impl Phase {
    pub const ALL: [Phase; 8] = [
        Phase::Metadata,
        Phase::Refinement,
        Phase::Grouping,
        Phase::Combination,
        Phase::Fact,
        Phase::Dimension,
        Phase::StarRefinement,
        Phase::Generation,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Metadata => "metadata",
            Phase::Refinement => "refinement",
            Phase::Grouping => "grouping",
            Phase::Combination => "combination",
            Phase::Fact => "fact",
            Phase::Dimension => "dimension",
            Phase::StarRefinement => "star_refinement",
            Phase::Generation => "generation",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
