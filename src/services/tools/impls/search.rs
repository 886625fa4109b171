//! search_files tool

use async_trait::async_trait;
use ignore::WalkBuilder;
use regex::RegexBuilder;
use serde_json::Value;

use super::missing_param;
use crate::services::llm::types::ParameterSchema;
use crate::services::tools::executor::ToolResult;
use crate::services::tools::sandbox::resolve_sandboxed;
use crate::services::tools::trait_def::{Tool, ToolExecutionContext};

const MAX_MATCHES: usize = 200;
const MAX_OUTPUT_CHARS: usize = 30_000;

pub struct SearchFilesTool;

#[async_trait]
impl Tool for SearchFilesTool {
    fn name(&self) -> &str {
        "search_files"
    }

    fn description(&self) -> &str {
        "Search file contents under the project with a regular expression. Respects \
         .gitignore. Returns path:line: text rows."
    }

    fn parameters_schema(&self) -> ParameterSchema {
        ParameterSchema::object(
            vec![
                (
                    "pattern",
                    ParameterSchema::string("Regular expression to search for"),
                ),
                (
                    "path",
                    ParameterSchema::string(
                        "Directory to search, relative to the project root; defaults to the root",
                    ),
                ),
            ],
            vec!["pattern"],
        )
    }

    async fn execute(&self, ctx: &ToolExecutionContext, args: &Value) -> ToolResult {
        let pattern = match args.get("pattern").and_then(Value::as_str) {
            Some(p) => p,
            None => return missing_param("pattern"),
        };
        let path = args.get("path").and_then(Value::as_str).unwrap_or(".");
        let base = match resolve_sandboxed(&ctx.project_root, path) {
            Ok(p) => p,
            Err(e) => return ToolResult::err(e),
        };
        if !base.exists() {
            return ToolResult::err(format!("Directory not found: {path}"));
        }

        let regex = match RegexBuilder::new(pattern).build() {
            Ok(r) => r,
            Err(e) => return ToolResult::err(format!("Invalid regex: {e}")),
        };

        let walker = WalkBuilder::new(&base)
            .hidden(true)
            .git_ignore(true)
            .require_git(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .build();

        let mut rows: Vec<String> = Vec::new();
        let mut total_chars = 0usize;
        let mut truncated = false;

        'outer: for entry in walker.flatten() {
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            let Ok(content) = std::fs::read_to_string(entry.path()) else {
                // Binary or unreadable; skip
                continue;
            };
            let display = entry
                .path()
                .strip_prefix(&ctx.project_root)
                .unwrap_or(entry.path())
                .display()
                .to_string();
            for (idx, line) in content.lines().enumerate() {
                if regex.is_match(line) {
                    let row = format!("{display}:{}: {}", idx + 1, line.trim_end());
                    total_chars += row.len() + 1;
                    rows.push(row);
                    if rows.len() >= MAX_MATCHES || total_chars >= MAX_OUTPUT_CHARS {
                        truncated = true;
                        break 'outer;
                    }
                }
            }
        }

        if rows.is_empty() {
            return ToolResult::ok(format!("No matches for pattern: {pattern}"));
        }
        if truncated {
            if rows.len() >= MAX_MATCHES {
                rows.push(format!("... (results truncated at {MAX_MATCHES} matches)"));
            } else {
                rows.push("... (results truncated; output limit reached)".to_string());
            }
        }
        ToolResult::ok(rows.join("\n"))
    }
}
