//! atelier — chat-driven repository agent service.
//!
//! A local HTTP service that lets a user converse with an LLM which acts on
//! a project directory through sandboxed tools, iterating until the task is
//! done. Conversations are persisted per project.

pub mod models;
pub mod server;
pub mod services;
pub mod state;
pub mod storage;
pub mod utils;

pub use state::AppState;
pub use storage::database::Database;
pub use utils::error::{AppError, AppResult};
