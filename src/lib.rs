//! # Starforge
//!
//! Derives candidate star-schema models from relational and flat-file sources.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │         Connections (InferenceModule trait objects)      │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [metadata]
//! ┌─────────────────────────────────────────────────────────┐
//! │   CommonModel (confidence-weighted relational arena)     │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [refinement, grouping, combination]
//! ┌─────────────────────────────────────────────────────────┐
//! │        One CommonModel per component / permutation       │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [fact, dimension, star refinement]
//! ┌─────────────────────────────────────────────────────────┐
//! │                      StarModel                           │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [generation]
//! ┌─────────────────────────────────────────────────────────┐
//! │              CREATE TABLE and ETL scripts                │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Every phase is a list of modules selected by key in [`config::Settings`];
//! [`pipeline::EngineBuilder`] validates and orders them.

pub mod config;
pub mod graph;
pub mod model;
pub mod modules;
pub mod pipeline;

pub use config::Settings;
pub use model::{CommonModel, DataType, StarModel, TypeTag};
pub use pipeline::{Engine, EngineBuilder, ModuleRegistry, PipelineError, RunReport};
