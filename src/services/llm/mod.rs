//! LLM provider abstraction and implementations.

pub mod anthropic;
pub mod provider;
pub mod types;

pub use anthropic::AnthropicProvider;
pub use provider::LlmProvider;
