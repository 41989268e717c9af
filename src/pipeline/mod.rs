//! Pipeline orchestration.
//!
//! ```text
//! Settings + ModuleRegistry --[EngineBuilder]--> Engine --[run]--> RunReport
//! ```

mod builder;
mod context;
mod engine;
mod error;
mod registry;

pub use builder::EngineBuilder;
pub use context::RunContext;
pub use engine::{Engine, RunReport};
pub use error::{BuildError, PipelineError, PipelineResult};
pub use registry::{ModuleInfo, ModuleRegistry};
