//! Agent Orchestrator
//!
//! Runs one user turn: persist the user message, then alternate provider
//! calls and tool dispatch until the model answers without tool calls, the
//! round ceiling is hit, or the turn is cancelled. Every step is persisted
//! before the next begins.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio_util::sync::CancellationToken;

use crate::models::message::StoredRole;
use crate::models::project::Project;
use crate::models::settings::{AppConfig, OrchestratorSettings};
use crate::services::context::ContextBuilder;
use crate::services::llm::provider::LlmProvider;
use crate::services::llm::types::{AssistantTurn, MessageContent};
use crate::services::tools::executor::{RunnerLimits, ToolExecutor, ToolResult};
use crate::storage::database::Database;
use crate::utils::error::{AppError, AppResult};

/// Outcome of one full user turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The model answered without further tool calls
    Done { message: String, rounds: u32 },
    /// Round ceiling or cancellation; the message explains why
    Aborted { message: String },
}

impl TurnOutcome {
    pub fn message(&self) -> &str {
        match self {
            Self::Done { message, .. } | Self::Aborted { message } => message,
        }
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted { .. })
    }
}

pub struct AgentOrchestrator {
    db: Database,
    provider: Arc<dyn LlmProvider>,
    context: ContextBuilder,
    settings: OrchestratorSettings,
    runner: RunnerLimits,
    /// One mutex per project, held for the whole turn
    turn_locks: DashMap<String, Arc<tokio::sync::Mutex<()>>>,
    active_turns: DashMap<String, CancellationToken>,
}

impl AgentOrchestrator {
    pub fn new(
        db: Database,
        provider: Arc<dyn LlmProvider>,
        context: ContextBuilder,
        settings: OrchestratorSettings,
        runner: RunnerLimits,
    ) -> Self {
        Self {
            db,
            provider,
            context,
            settings,
            runner,
            turn_locks: DashMap::new(),
            active_turns: DashMap::new(),
        }
    }

    pub fn from_config(db: Database, provider: Arc<dyn LlmProvider>, config: &AppConfig) -> Self {
        Self::new(
            db,
            provider,
            ContextBuilder::new(config.context.clone()),
            config.orchestrator.clone(),
            config.runner.clone(),
        )
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Run one user turn. Turns for the same project are serialized; turns
    /// for different projects run concurrently.
    pub async fn run_turn(&self, project_id: &str, text: &str) -> AppResult<TurnOutcome> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::validation("Message must not be empty"));
        }
        let project = self.db.get_project(project_id)?;

        let lock = self
            .turn_locks
            .entry(project_id.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        let token = CancellationToken::new();
        self.active_turns
            .insert(project_id.to_string(), token.clone());
        let outcome = self.run_turn_inner(&project, text, &token).await;
        self.active_turns.remove(project_id);
        outcome
    }

    /// Request cooperative cancellation of the in-flight turn, if any
    pub fn cancel_turn(&self, project_id: &str) -> bool {
        match self.active_turns.get(project_id) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    async fn run_turn_inner(
        &self,
        project: &Project,
        text: &str,
        token: &CancellationToken,
    ) -> AppResult<TurnOutcome> {
        let executor = ToolExecutor::new(&project.root_path, self.runner.clone(), token.clone());
        let tools = executor.definitions();

        self.db.append_message(
            &project.id,
            StoredRole::User,
            &[MessageContent::Text {
                text: text.to_string(),
            }],
        )?;

        let mut rounds: u32 = 0;
        loop {
            if token.is_cancelled() {
                return self.abort(project, "Turn cancelled by request.");
            }
            if rounds >= self.settings.max_rounds {
                return self.abort(
                    project,
                    &format!(
                        "Stopped after {} tool rounds without reaching a final answer. \
                         Send a follow-up message to continue.",
                        self.settings.max_rounds
                    ),
                );
            }
            rounds += 1;

            let history = self.db.get_history(&project.id)?;
            let prompt = self.context.build(project, &history)?;

            tracing::debug!(
                project = %project.id,
                round = rounds,
                messages = prompt.messages.len(),
                "calling provider"
            );
            let response = tokio::time::timeout(
                Duration::from_millis(self.settings.llm_timeout_ms),
                self.provider
                    .send_message(prompt.messages, Some(prompt.system), tools.clone()),
            )
            .await
            .map_err(|_| {
                AppError::provider(format!(
                    "LLM request timed out after {} ms",
                    self.settings.llm_timeout_ms
                ))
            })?
            .map_err(|e| AppError::provider(e.to_string()))?;

            match response.into_turn() {
                AssistantTurn::FinalText(message) => {
                    self.db.append_message(
                        &project.id,
                        StoredRole::Assistant,
                        &[MessageContent::Text {
                            text: message.clone(),
                        }],
                    )?;
                    tracing::info!(project = %project.id, rounds, "turn complete");
                    return Ok(TurnOutcome::Done { message, rounds });
                }
                AssistantTurn::ToolCalls { text, calls } => {
                    let mut blocks = Vec::with_capacity(calls.len() + 1);
                    if let Some(text) = text {
                        blocks.push(MessageContent::Text { text });
                    }
                    for call in &calls {
                        blocks.push(MessageContent::ToolUse {
                            id: call.id.clone(),
                            name: call.name.clone(),
                            input: call.arguments.clone(),
                        });
                    }
                    self.db
                        .append_message(&project.id, StoredRole::Assistant, &blocks)?;

                    for call in &calls {
                        let result = if token.is_cancelled() {
                            ToolResult::err("Turn cancelled before this tool ran")
                        } else {
                            executor.execute(&call.name, &call.arguments).await
                        };
                        if result.success {
                            tracing::debug!(tool = %call.name, "tool call succeeded");
                        } else {
                            tracing::warn!(
                                tool = %call.name,
                                error = result.error.as_deref().unwrap_or(""),
                                "tool call failed"
                            );
                        }
                        self.db.append_message(
                            &project.id,
                            StoredRole::Tool,
                            &[MessageContent::ToolResult {
                                tool_use_id: call.id.clone(),
                                content: result.to_content(),
                                is_error: !result.success,
                            }],
                        )?;
                    }
                }
            }
        }
    }

    /// Persist an explanatory assistant message and end the turn
    fn abort(&self, project: &Project, message: &str) -> AppResult<TurnOutcome> {
        self.db.append_message(
            &project.id,
            StoredRole::Assistant,
            &[MessageContent::Text {
                text: message.to_string(),
            }],
        )?;
        tracing::info!(project = %project.id, "turn aborted");
        Ok(TurnOutcome::Aborted {
            message: message.to_string(),
        })
    }
}
