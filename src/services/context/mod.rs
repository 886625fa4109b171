//! Prompt Context Builder
//!
//! Assembles the system preamble, a bounded project file tree, and the
//! replayed conversation for each provider call. Given the same persisted
//! state the output is deterministic.

use std::path::Path;

use ignore::WalkBuilder;

use crate::models::message::{StoredMessage, StoredRole};
use crate::models::project::Project;
use crate::models::settings::ContextSettings;
use crate::services::llm::types::{Message, MessageRole};
use crate::utils::error::AppResult;

const SYSTEM_PREAMBLE: &str = "\
You are a coding agent working on a local project. You converse with the user \
and act on the project through tools.

Tools:
- read_file: read a file before you change it.
- write_file: create or overwrite a file. Always provide the complete file \
content; partial content replaces the whole file.
- list_directory: inspect a directory's entries.
- search_files: find code by regular expression before editing unfamiliar files.
- run_command: run an allow-listed program such as the mify scaffolding tool.

Guidance:
- All paths are relative to the project root shown below.
- To scaffold new services, invoke mify through run_command instead of writing \
boilerplate by hand.
- When a tool fails, read the error, adjust, and retry; do not repeat the same \
failing call.
- Answer the user directly once the task is done. Keep answers short and \
concrete.";

/// What gets sent to the provider for one round
#[derive(Debug, Clone)]
pub struct PromptContext {
    pub system: String,
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone)]
pub struct ContextBuilder {
    settings: ContextSettings,
}

impl ContextBuilder {
    pub fn new(settings: ContextSettings) -> Self {
        Self { settings }
    }

    pub fn build(&self, project: &Project, history: &[StoredMessage]) -> AppResult<PromptContext> {
        let tree = self.tree_summary(&project.root_path);
        let system = format!(
            "{SYSTEM_PREAMBLE}\n\n## Project\nName: {}\n\n## File tree\n{tree}",
            project.name
        );
        let messages = self.replay(history)?;
        Ok(PromptContext { system, messages })
    }

    /// Replay stored messages into provider messages, applying the history
    /// budget. Oldest messages are dropped first; the window must then open
    /// on a user message, because the provider rejects tool_result blocks
    /// whose tool_use fell outside the window.
    fn replay(&self, history: &[StoredMessage]) -> AppResult<Vec<Message>> {
        let start = history
            .len()
            .saturating_sub(self.settings.max_history_messages);
        let mut window = &history[start..];
        while let Some(first) = window.first() {
            if first.role == StoredRole::User {
                break;
            }
            window = &window[1..];
        }

        let mut messages = Vec::with_capacity(window.len());
        for stored in window {
            let role = match stored.role {
                StoredRole::Assistant => MessageRole::Assistant,
                StoredRole::User | StoredRole::Tool => MessageRole::User,
            };
            messages.push(Message {
                role,
                content: stored.content_blocks()?,
            });
        }
        Ok(messages)
    }

    /// Depth- and count-bounded file tree, sorted for determinism
    fn tree_summary(&self, root: &Path) -> String {
        let walker = WalkBuilder::new(root)
            .hidden(true)
            .git_ignore(true)
            .require_git(false)
            .max_depth(Some(self.settings.max_tree_depth))
            .sort_by_file_name(|a, b| a.cmp(b))
            .build();

        let mut lines = Vec::new();
        let mut omitted = false;
        for entry in walker.flatten() {
            if entry.depth() == 0 {
                continue;
            }
            if lines.len() >= self.settings.max_tree_entries {
                omitted = true;
                break;
            }
            let indent = "  ".repeat(entry.depth() - 1);
            let name = entry.file_name().to_string_lossy();
            let suffix = if entry.file_type().is_some_and(|t| t.is_dir()) {
                "/"
            } else {
                ""
            };
            lines.push(format!("{indent}{name}{suffix}"));
        }

        if lines.is_empty() {
            return "(empty project)".to_string();
        }
        if omitted {
            lines.push("... (more entries omitted)".to_string());
        }
        lines.join("\n")
    }
}
