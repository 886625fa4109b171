//! Shared Application State

use std::sync::Arc;

use crate::models::settings::AppConfig;
use crate::services::orchestrator::AgentOrchestrator;
use crate::storage::database::Database;

/// State handed to every HTTP handler
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub orchestrator: Arc<AgentOrchestrator>,
    pub config: Arc<AppConfig>,
}
