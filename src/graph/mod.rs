//! Graph algorithms over modules and schemas.
//!
//! - [`dependency`]: capability masks and module execution order
//! - [`grouping`]: connected components of a relational model
//! - [`join_path`]: join ordering for generated projections

pub mod dependency;
pub mod grouping;
pub mod join_path;

pub use dependency::{
    order_modules, Capability, CapabilitySet, DependencyCycle, DependencyGraph, Dependent,
    RelationalCapability, StarCapability,
};
pub use grouping::{connected_components, split_components};
pub use join_path::{plan_joins, JoinPathError, JoinPlan, JoinStep};
