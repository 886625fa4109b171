//! Tool implementations.

pub mod ls;
pub mod read;
pub mod run;
pub mod search;
pub mod write;

use super::executor::ToolResult;

pub(crate) fn missing_param(name: &str) -> ToolResult {
    ToolResult::err(format!("Missing required parameter: {name}"))
}
