//! Sandboxed tool capabilities and their dispatcher.

pub mod executor;
pub mod impls;
pub mod sandbox;
pub mod trait_def;

pub use executor::{RunnerLimits, ToolExecutor, ToolResult};
pub use trait_def::{Tool, ToolExecutionContext, ToolRegistry};
