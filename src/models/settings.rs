//! Application Settings
//!
//! The persisted configuration shape and its validation.

use serde::{Deserialize, Serialize};

use crate::services::llm::types::ProviderConfig;
use crate::services::tools::executor::RunnerLimits;

/// Top-level application configuration, stored as pretty JSON
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub provider: ProviderConfig,
    pub orchestrator: OrchestratorSettings,
    pub runner: RunnerLimits,
    pub context: ContextSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind_addr: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8787".to_string(),
        }
    }
}

/// Turn-loop limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorSettings {
    /// Hard ceiling on LLM rounds within one turn
    pub max_rounds: u32,
    /// Timeout for a single provider call
    pub llm_timeout_ms: u64,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            max_rounds: 8,
            llm_timeout_ms: 120_000,
        }
    }
}

/// Prompt-context budgets
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextSettings {
    pub max_tree_depth: usize,
    pub max_tree_entries: usize,
    /// Oldest messages are dropped once history exceeds this
    pub max_history_messages: usize,
}

impl Default for ContextSettings {
    fn default() -> Self {
        Self {
            max_tree_depth: 4,
            max_tree_entries: 200,
            max_history_messages: 80,
        }
    }
}

impl AppConfig {
    /// Validate the configuration, returning a human-readable reason on failure
    pub fn validate(&self) -> Result<(), String> {
        if self.server.bind_addr.parse::<std::net::SocketAddr>().is_err() {
            return Err(format!("Invalid bind address: {}", self.server.bind_addr));
        }
        if self.provider.model.trim().is_empty() {
            return Err("Provider model must not be empty".to_string());
        }
        if self.provider.max_tokens == 0 {
            return Err("max_tokens must be positive".to_string());
        }
        if self.orchestrator.max_rounds == 0 {
            return Err("max_rounds must be at least 1".to_string());
        }
        if self.orchestrator.llm_timeout_ms == 0 {
            return Err("llm_timeout_ms must be positive".to_string());
        }
        if self.runner.default_timeout_ms == 0 {
            return Err("runner default_timeout_ms must be positive".to_string());
        }
        if self.context.max_history_messages < 2 {
            return Err("max_history_messages must be at least 2".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_bind_addr_rejected() {
        let mut config = AppConfig::default();
        config.server.bind_addr = "not-an-addr".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_rounds_rejected() {
        let mut config = AppConfig::default();
        config.orchestrator.max_rounds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"orchestrator": {"max_rounds": 3}}"#).unwrap();
        assert_eq!(config.orchestrator.max_rounds, 3);
        assert_eq!(
            config.orchestrator.llm_timeout_ms,
            OrchestratorSettings::default().llm_timeout_ms
        );
        assert!(config.validate().is_ok());
    }
}
