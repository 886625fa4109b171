//! write_file tool

use async_trait::async_trait;
use serde_json::Value;

use super::missing_param;
use crate::services::llm::types::ParameterSchema;
use crate::services::tools::executor::ToolResult;
use crate::services::tools::sandbox::resolve_sandboxed;
use crate::services::tools::trait_def::{Tool, ToolExecutionContext};

pub struct WriteFileTool;

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Create or overwrite a file in the project. Parent directories are created as needed. \
         Always provide the complete file content; partial content replaces the whole file."
    }

    fn parameters_schema(&self) -> ParameterSchema {
        ParameterSchema::object(
            vec![
                (
                    "path",
                    ParameterSchema::string("File path relative to the project root"),
                ),
                (
                    "content",
                    ParameterSchema::string("Complete content to write"),
                ),
            ],
            vec!["path", "content"],
        )
    }

    async fn execute(&self, ctx: &ToolExecutionContext, args: &Value) -> ToolResult {
        let path = match args.get("path").and_then(Value::as_str) {
            Some(p) => p,
            None => return missing_param("path"),
        };
        let content = match args.get("content").and_then(Value::as_str) {
            Some(c) => c,
            None => return missing_param("content"),
        };
        let resolved = match resolve_sandboxed(&ctx.project_root, path) {
            Ok(p) => p,
            Err(e) => return ToolResult::err(e),
        };

        if let Some(parent) = resolved.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                return ToolResult::err(format!("Failed to create directories for {path}: {e}"));
            }
        }

        match tokio::fs::write(&resolved, content.as_bytes()).await {
            Ok(()) => ToolResult::ok(format!("Wrote {} bytes to {path}", content.len())),
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                ToolResult::err(format!("Permission denied: {path}"))
            }
            Err(e) => ToolResult::err(format!("Failed to write {path}: {e}")),
        }
    }
}
