use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use atelier::services::llm::{AnthropicProvider, LlmProvider};
use atelier::services::orchestrator::AgentOrchestrator;
use atelier::state::AppState;
use atelier::storage::config::ConfigService;
use atelier::storage::database::Database;
use atelier::server;
use atelier::utils::paths;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("atelier=info,tower_http=info")),
        )
        .init();

    let config_service = ConfigService::new().context("failed to load configuration")?;
    let mut config = config_service.get_config_clone();
    if config.provider.api_key.is_none() {
        config.provider.api_key = std::env::var("ANTHROPIC_API_KEY")
            .ok()
            .filter(|key| !key.is_empty());
    }
    if config.provider.api_key.is_none() {
        tracing::warn!("no Anthropic API key configured; chat requests will fail");
    }

    let db = Database::new(&paths::database_path()?).context("failed to open database")?;
    let provider: Arc<dyn LlmProvider> = Arc::new(AnthropicProvider::new(config.provider.clone()));
    let orchestrator = Arc::new(AgentOrchestrator::from_config(
        db.clone(),
        provider,
        &config,
    ));

    let bind_addr = config.server.bind_addr.clone();
    let state = AppState {
        db,
        orchestrator,
        config: Arc::new(config),
    };

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!(
        addr = %bind_addr,
        model = %state.config.provider.model,
        "atelier listening"
    );
    axum::serve(listener, server::router(state))
        .await
        .context("server error")?;
    Ok(())
}
