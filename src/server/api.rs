//! HTTP Handlers
//!
//! The chat API: send a message (blocks for the whole turn), manage
//! projects, read or clear history, cancel an in-flight turn.

use std::path::Path;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::models::message::StoredRole;
use crate::state::AppState;
use crate::utils::error::AppResult;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub project_id: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub message: String,
}

/// POST /api/chat — run one full turn and return the assistant's answer
pub async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> AppResult<Json<ChatResponse>> {
    let outcome = state
        .orchestrator
        .run_turn(&req.project_id, &req.message)
        .await?;
    Ok(Json(ChatResponse {
        message: outcome.message().to_string(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct ProjectQuery {
    pub project_id: String,
}

/// POST /api/chat/cancel — cooperatively cancel the in-flight turn
pub async fn cancel_chat(
    State(state): State<AppState>,
    Query(query): Query<ProjectQuery>,
) -> Json<Value> {
    let cancelled = state.orchestrator.cancel_turn(&query.project_id);
    Json(json!({ "cancelled": cancelled }))
}

#[derive(Debug, Serialize)]
pub struct ProjectResponse {
    pub id: String,
    pub name: String,
}

/// GET /api/chat/projects
pub async fn list_projects(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<ProjectResponse>>> {
    let projects = state.db.list_projects()?;
    Ok(Json(
        projects
            .into_iter()
            .map(|p| ProjectResponse {
                id: p.id,
                name: p.name,
            })
            .collect(),
    ))
}

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
    pub root_path: String,
}

/// POST /api/chat/projects
pub async fn create_project(
    State(state): State<AppState>,
    Json(req): Json<CreateProjectRequest>,
) -> AppResult<Json<ProjectResponse>> {
    let project = state
        .db
        .create_project(&req.name, Path::new(&req.root_path))?;
    tracing::info!(project = %project.id, name = %project.name, "project created");
    Ok(Json(ProjectResponse {
        id: project.id,
        name: project.name,
    }))
}

/// DELETE /api/chat/projects?project_id=...
pub async fn delete_project(
    State(state): State<AppState>,
    Query(query): Query<ProjectQuery>,
) -> AppResult<Json<Value>> {
    state.orchestrator.cancel_turn(&query.project_id);
    state.db.delete_project(&query.project_id)?;
    Ok(Json(json!({ "deleted": true })))
}

#[derive(Debug, Serialize)]
pub struct HistoryEntry {
    pub id: String,
    pub content: String,
    #[serde(rename = "isUser")]
    pub is_user: bool,
}

/// GET /api/chat/history?project_id=... — plain user/assistant text only;
/// tool plumbing is filtered out
pub async fn get_history(
    State(state): State<AppState>,
    Query(query): Query<ProjectQuery>,
) -> AppResult<Json<Vec<HistoryEntry>>> {
    state.db.get_project(&query.project_id)?;
    let history = state.db.get_history(&query.project_id)?;
    let entries = history
        .iter()
        .filter(|m| m.role != StoredRole::Tool)
        .filter_map(|m| {
            m.visible_text().map(|content| HistoryEntry {
                id: m.id.clone(),
                content,
                is_user: m.role == StoredRole::User,
            })
        })
        .collect();
    Ok(Json(entries))
}

/// DELETE /api/chat/history?project_id=...
pub async fn clear_history(
    State(state): State<AppState>,
    Query(query): Query<ProjectQuery>,
) -> AppResult<Json<Value>> {
    state.db.get_project(&query.project_id)?;
    let removed = state.db.clear_history(&query.project_id)?;
    Ok(Json(json!({ "removed": removed })))
}

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": if state.db.is_healthy() { "ok" } else { "degraded" },
        "provider": state.orchestrator.provider_name(),
        "provider_configured": state.config.provider.api_key.is_some(),
    }))
}
