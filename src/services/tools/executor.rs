//! Tool Execution
//!
//! The dispatcher that turns model tool calls into tool results.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use super::impls;
use super::trait_def::{ToolExecutionContext, ToolRegistry};
use crate::services::llm::types::ToolDefinition;

/// Outcome of a single tool invocation, fed back to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,
    pub output: String,
    pub error: Option<String>,
}

impl ToolResult {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            error: None,
        }
    }

    pub fn err(error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: String::new(),
            error: Some(error.into()),
        }
    }

    /// Text handed back to the model as the tool_result block content
    pub fn to_content(&self) -> String {
        match &self.error {
            Some(error) if self.output.is_empty() => error.clone(),
            Some(error) => format!("{error}\n{}", self.output),
            None => self.output.clone(),
        }
    }
}

/// Caps and permissions for `run_command`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerLimits {
    /// Programs `run_command` may launch
    pub allowed_commands: Vec<String>,
    pub default_timeout_ms: u64,
    /// Per-stream capture cap for stdout and stderr
    pub max_output_bytes: usize,
}

impl Default for RunnerLimits {
    fn default() -> Self {
        Self {
            allowed_commands: vec!["mify".to_string(), "git".to_string(), "ls".to_string()],
            default_timeout_ms: 120_000,
            max_output_bytes: 30_000,
        }
    }
}

/// Dispatches model tool calls to the registered implementations for one
/// project root.
pub struct ToolExecutor {
    registry: ToolRegistry,
    context: ToolExecutionContext,
}

impl ToolExecutor {
    pub fn new(
        project_root: &Path,
        runner: RunnerLimits,
        cancellation_token: CancellationToken,
    ) -> Self {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(impls::read::ReadFileTool));
        registry.register(Arc::new(impls::write::WriteFileTool));
        registry.register(Arc::new(impls::ls::ListDirectoryTool));
        registry.register(Arc::new(impls::search::SearchFilesTool));
        registry.register(Arc::new(impls::run::RunCommandTool));

        Self {
            registry,
            context: ToolExecutionContext {
                project_root: project_root.to_path_buf(),
                runner: Arc::new(runner),
                cancellation_token,
            },
        }
    }

    /// Tool schemas for the provider request
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.registry.definitions()
    }

    pub async fn execute(&self, name: &str, args: &Value) -> ToolResult {
        match self.registry.get(name) {
            Some(tool) => tool.execute(&self.context, args).await,
            None => ToolResult::err(format!("Unknown tool: {name}")),
        }
    }
}
