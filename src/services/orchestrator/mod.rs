//! The agent turn loop.

pub mod service;

pub use service::{AgentOrchestrator, TurnOutcome};
