pub mod context;
pub mod llm;
pub mod orchestrator;
pub mod tools;
