//! run_command tool
//!
//! Launches allow-listed programs with an argv vector. No shell is involved,
//! so arguments are never interpolated.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

use super::missing_param;
use crate::services::llm::types::ParameterSchema;
use crate::services::tools::executor::ToolResult;
use crate::services::tools::trait_def::{Tool, ToolExecutionContext};

const MAX_TIMEOUT_MS: u64 = 600_000;

pub struct RunCommandTool;

#[async_trait]
impl Tool for RunCommandTool {
    fn name(&self) -> &str {
        "run_command"
    }

    fn description(&self) -> &str {
        "Run an allow-listed program in the project root. Arguments are passed verbatim \
         (no shell). Use this to invoke the mify scaffolding tool."
    }

    fn parameters_schema(&self) -> ParameterSchema {
        ParameterSchema::object(
            vec![
                (
                    "command",
                    ParameterSchema::string("Program to run; must be on the allow-list"),
                ),
                (
                    "args",
                    ParameterSchema::array_of(
                        ParameterSchema::string("One argument"),
                        "Arguments passed to the program",
                    ),
                ),
                (
                    "timeout_ms",
                    ParameterSchema::integer("Timeout in milliseconds"),
                ),
            ],
            vec!["command"],
        )
    }

    async fn execute(&self, ctx: &ToolExecutionContext, args: &Value) -> ToolResult {
        let command = match args.get("command").and_then(Value::as_str) {
            Some(c) => c,
            None => return missing_param("command"),
        };
        let cmd_args: Vec<String> = match args.get("args") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => {
                let mut collected = Vec::with_capacity(items.len());
                for item in items {
                    match item.as_str() {
                        Some(s) => collected.push(s.to_string()),
                        None => return ToolResult::err("args must be an array of strings"),
                    }
                }
                collected
            }
            Some(_) => return ToolResult::err("args must be an array of strings"),
        };
        let timeout_ms = args
            .get("timeout_ms")
            .and_then(Value::as_u64)
            .unwrap_or(ctx.runner.default_timeout_ms)
            .min(MAX_TIMEOUT_MS);

        if !ctx.runner.allowed_commands.iter().any(|c| c == command) {
            return ToolResult::err(format!(
                "Command not allowed: {command}. Allowed commands: {}",
                ctx.runner.allowed_commands.join(", ")
            ));
        }

        let mut child = match Command::new(command)
            .args(&cmd_args)
            .current_dir(&ctx.project_root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(e) => return ToolResult::err(format!("Failed to launch {command}: {e}")),
        };

        // Drain both pipes while waiting; a child writing more than the OS
        // pipe buffer would otherwise block on write and never exit.
        let cap = ctx.runner.max_output_bytes;
        let stdout_task = tokio::spawn(read_stream(child.stdout.take(), cap));
        let stderr_task = tokio::spawn(read_stream(child.stderr.take(), cap));

        // None = timed out
        let status = tokio::select! {
            status = child.wait() => match status {
                Ok(status) => Some(status),
                Err(e) => return ToolResult::err(format!("Failed to wait for {command}: {e}")),
            },
            _ = tokio::time::sleep(Duration::from_millis(timeout_ms)) => {
                let _ = child.kill().await;
                None
            }
            _ = ctx.cancellation_token.cancelled() => {
                let _ = child.kill().await;
                return ToolResult::err(format!("Command cancelled: {command}"));
            }
        };

        // The readers hit EOF once the child exits or is killed
        let stdout_text = stdout_task.await.unwrap_or_default();
        let stderr_text = stderr_task.await.unwrap_or_default();

        let mut output = stdout_text;
        if !stderr_text.is_empty() {
            if !output.is_empty() {
                output.push('\n');
            }
            output.push_str("--- stderr ---\n");
            output.push_str(&stderr_text);
        }

        match status {
            None => ToolResult {
                success: false,
                output,
                error: Some(format!("Command timed out after {timeout_ms} ms: {command}")),
            },
            Some(status) if status.success() => {
                if output.is_empty() {
                    output = "(no output)".to_string();
                }
                ToolResult::ok(output)
            }
            Some(status) => {
                let code = status
                    .code()
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "killed by signal".to_string());
                ToolResult {
                    success: false,
                    output,
                    error: Some(format!("Command exited with code {code}: {command}")),
                }
            }
        }
    }
}

async fn read_stream<R>(stream: Option<R>, cap: usize) -> String
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let Some(mut stream) = stream else {
        return String::new();
    };
    let mut buf = Vec::new();
    let _ = stream.read_to_end(&mut buf).await;
    let text = String::from_utf8_lossy(&buf);
    if text.len() > cap {
        let mut end = cap;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}\n... (output truncated at {cap} bytes)", &text[..end])
    } else {
        text.into_owned()
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

    fn make_ctx(root: &TempDir, allowed: &[&str]) -> ToolExecutionContext {
        ToolExecutionContext {
            project_root: root.path().to_path_buf(),
            runner: Arc::new(RunnerLimits {
                allowed_commands: allowed.iter().map(|s| s.to_string()).collect(),
                default_timeout_ms: 5_000,
                max_output_bytes: 30_000,
            }),
            cancellation_token: CancellationToken::new(),
        }
    }

    #[tokio::test]
    async fn test_run_captures_stdout() {
        let root = TempDir::new().unwrap();
        let ctx = make_ctx(&root, &["echo"]);
        let result = RunCommandTool
            .execute(&ctx, &json!({"command": "echo", "args": ["hello", "world"]}))
            .await;
        assert!(result.success, "{:?}", result.error);
        assert!(result.output.contains("hello world"));
    }

    #[tokio::test]
    async fn test_disallowed_command_rejected() {
        let root = TempDir::new().unwrap();
        let ctx = make_ctx(&root, &["echo"]);
        let result = RunCommandTool
            .execute(&ctx, &json!({"command": "rm", "args": ["-rf", "/"]}))
            .await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("Command not allowed"));
    }

    #[tokio::test]
    async fn test_timeout_kills_child() {
        let root = TempDir::new().unwrap();
        let ctx = make_ctx(&root, &["sleep"]);
        let started = std::time::Instant::now();
        let result = RunCommandTool
            .execute(
                &ctx,
                &json!({"command": "sleep", "args": ["10"], "timeout_ms": 300}),
            )
            .await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("timed out"));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_large_output_truncated_not_timed_out() {
        let root = TempDir::new().unwrap();
        let ctx = ToolExecutionContext {
            project_root: root.path().to_path_buf(),
            runner: Arc::new(RunnerLimits {
                allowed_commands: vec!["head".to_string()],
                default_timeout_ms: 5_000,
                max_output_bytes: 1_000,
            }),
            cancellation_token: CancellationToken::new(),
        };
        // 1 MB is well past the OS pipe buffer; the command itself finishes
        // in milliseconds and must not be reported as a timeout.
        let started = std::time::Instant::now();
        let result = RunCommandTool
            .execute(
                &ctx,
                &json!({
                    "command": "head",
                    "args": ["-c", "1000000", "/dev/zero"],
                    "timeout_ms": 2000
                }),
            )
            .await;
        assert!(result.success, "{:?}", result.error);
        assert!(result.output.contains("output truncated at 1000 bytes"));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_nonzero_exit_reports_code() {
        let root = TempDir::new().unwrap();
        let ctx = make_ctx(&root, &["false"]);
        let result = RunCommandTool
            .execute(&ctx, &json!({"command": "false"}))
            .await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("exited with code 1"));
    }

    #[tokio::test]
    async fn test_launch_failure_is_tool_error() {
        let root = TempDir::new().unwrap();
        let ctx = make_ctx(&root, &["definitely-not-a-real-binary"]);
        let result = RunCommandTool
            .execute(&ctx, &json!({"command": "definitely-not-a-real-binary"}))
            .await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("Failed to launch"));
    }

    #[tokio::test]
    async fn test_runs_in_project_root() {
        let root = TempDir::new().unwrap();
        std::fs::write(root.path().join("marker.txt"), "x").unwrap();
        let ctx = make_ctx(&root, &["ls"]);
        let result = RunCommandTool.execute(&ctx, &json!({"command": "ls"})).await;
        assert!(result.success);
        assert!(result.output.contains("marker.txt"));
    }
}
