//! read_file tool

use async_trait::async_trait;
use serde_json::Value;

use super::missing_param;
use crate::services::llm::types::ParameterSchema;
use crate::services::tools::executor::ToolResult;
use crate::services::tools::sandbox::resolve_sandboxed;
use crate::services::tools::trait_def::{Tool, ToolExecutionContext};

const MAX_READ_CHARS: usize = 100_000;

pub struct ReadFileTool;

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read the contents of a file in the project. The path is relative to the project root."
    }

    fn parameters_schema(&self) -> ParameterSchema {
        ParameterSchema::object(
            vec![(
                "path",
                ParameterSchema::string("File path relative to the project root"),
            )],
            vec!["path"],
        )
    }

    async fn execute(&self, ctx: &ToolExecutionContext, args: &Value) -> ToolResult {
        let path = match args.get("path").and_then(Value::as_str) {
            Some(p) => p,
            None => return missing_param("path"),
        };
        let resolved = match resolve_sandboxed(&ctx.project_root, path) {
            Ok(p) => p,
            Err(e) => return ToolResult::err(e),
        };
        if !resolved.exists() {
            return ToolResult::err(format!("File not found: {path}"));
        }
        if resolved.is_dir() {
            return ToolResult::err(format!("Not a file: {path} is a directory"));
        }

        match tokio::fs::read_to_string(&resolved).await {
            Ok(content) => {
                if content.chars().count() > MAX_READ_CHARS {
                    let truncated: String = content.chars().take(MAX_READ_CHARS).collect();
                    ToolResult::ok(format!(
                        "{truncated}\n... (file truncated at {MAX_READ_CHARS} characters)"
                    ))
                } else {
                    ToolResult::ok(content)
                }
            }
            Err(e) => ToolResult::err(format!("Failed to read {path}: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::tools::executor::RunnerLimits;
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::TempDir;
    use tokio_util::sync::CancellationToken;

    fn make_ctx(root: &TempDir) -> ToolExecutionContext {
        ToolExecutionContext {
            project_root: root.path().to_path_buf(),
            runner: Arc::new(RunnerLimits::default()),
            cancellation_token: CancellationToken::new(),
        }
    }

    #[tokio::test]
    async fn test_read_existing_file() {
        let root = TempDir::new().unwrap();
        std::fs::write(root.path().join("hello.txt"), "hi there").unwrap();

        let result = ReadFileTool
            .execute(&make_ctx(&root), &json!({"path": "hello.txt"}))
            .await;
        assert!(result.success);
        assert_eq!(result.output, "hi there");
    }

    #[tokio::test]
    async fn test_read_missing_file() {
        let root = TempDir::new().unwrap();
        let result = ReadFileTool
            .execute(&make_ctx(&root), &json!({"path": "nope.txt"}))
            .await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("File not found"));
    }

    #[tokio::test]
    async fn test_read_directory_rejected() {
        let root = TempDir::new().unwrap();
        std::fs::create_dir(root.path().join("src")).unwrap();
        let result = ReadFileTool
            .execute(&make_ctx(&root), &json!({"path": "src"}))
            .await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("Not a file"));
    }

    #[tokio::test]
    async fn test_read_escaping_path_rejected() {
        let root = TempDir::new().unwrap();
        let result = ReadFileTool
            .execute(&make_ctx(&root), &json!({"path": "../../etc/passwd"}))
            .await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("escapes the project root"));
    }

    #[tokio::test]
    async fn test_missing_param() {
        let root = TempDir::new().unwrap();
        let result = ReadFileTool.execute(&make_ctx(&root), &json!({})).await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("path"));
    }
}
