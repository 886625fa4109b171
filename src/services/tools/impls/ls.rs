//! list_directory tool

use async_trait::async_trait;
use serde_json::Value;

use crate::services::llm::types::ParameterSchema;
use crate::services::tools::executor::ToolResult;
use crate::services::tools::sandbox::resolve_sandboxed;
use crate::services::tools::trait_def::{Tool, ToolExecutionContext};

const LS_MAX_ENTRIES: usize = 200;

pub struct ListDirectoryTool;

#[async_trait]
impl Tool for ListDirectoryTool {
    fn name(&self) -> &str {
        "list_directory"
    }

    fn description(&self) -> &str {
        "List the entries of a directory in the project. Directories are listed first. \
         Hidden entries are skipped."
    }

    fn parameters_schema(&self) -> ParameterSchema {
        ParameterSchema::object(
            vec![(
                "path",
                ParameterSchema::string(
                    "Directory path relative to the project root; defaults to the root",
                ),
            )],
            vec![],
        )
    }

    async fn execute(&self, ctx: &ToolExecutionContext, args: &Value) -> ToolResult {
        let path = args.get("path").and_then(Value::as_str).unwrap_or(".");
        let resolved = match resolve_sandboxed(&ctx.project_root, path) {
            Ok(p) => p,
            Err(e) => return ToolResult::err(e),
        };
        if !resolved.exists() {
            return ToolResult::err(format!("Directory not found: {path}"));
        }
        if !resolved.is_dir() {
            return ToolResult::err(format!("Not a directory: {path}"));
        }

        let entries = match std::fs::read_dir(&resolved) {
            Ok(entries) => entries,
            Err(e) => return ToolResult::err(format!("Failed to list {path}: {e}")),
        };

        let mut rows: Vec<(bool, String, u64)> = Vec::new();
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with('.') {
                continue;
            }
            let Ok(meta) = entry.metadata() else { continue };
            rows.push((meta.is_dir(), name, meta.len()));
        }

        // Directories first, then lexicographic
        rows.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));

        if rows.is_empty() {
            return ToolResult::ok("(empty directory)");
        }

        let total = rows.len();
        let mut lines: Vec<String> = rows
            .into_iter()
            .take(LS_MAX_ENTRIES)
            .map(|(is_dir, name, size)| {
                if is_dir {
                    format!("DIR   {name}/")
                } else {
                    format!("FILE  {name} ({})", format_size(size))
                }
            })
            .collect();
        if total > LS_MAX_ENTRIES {
            lines.push(format!("... ({} more entries)", total - LS_MAX_ENTRIES));
        }
        ToolResult::ok(lines.join("\n"))
    }
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
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
    async fn test_list_directories_first() {
        let root = TempDir::new().unwrap();
        std::fs::write(root.path().join("b.txt"), "x").unwrap();
        std::fs::create_dir(root.path().join("src")).unwrap();
        std::fs::write(root.path().join("a.txt"), "xy").unwrap();

        let result = ListDirectoryTool
            .execute(&make_ctx(&root), &json!({}))
            .await;
        assert!(result.success);
        let lines: Vec<&str> = result.output.lines().collect();
        assert_eq!(lines[0], "DIR   src/");
        assert!(lines[1].starts_with("FILE  a.txt"));
        assert!(lines[2].starts_with("FILE  b.txt"));
    }

    #[tokio::test]
    async fn test_hidden_entries_skipped() {
        let root = TempDir::new().unwrap();
        std::fs::write(root.path().join(".secret"), "x").unwrap();
        let result = ListDirectoryTool
            .execute(&make_ctx(&root), &json!({}))
            .await;
        assert_eq!(result.output, "(empty directory)");
    }

    #[tokio::test]
    async fn test_list_missing_directory() {
        let root = TempDir::new().unwrap();
        let result = ListDirectoryTool
            .execute(&make_ctx(&root), &json!({"path": "nope"}))
            .await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("Directory not found"));
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(10), "10 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }
}
