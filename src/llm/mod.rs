//! Clients for the chat-completion and tool-execution services.

/// Assistant message type.
pub mod ai;
pub(crate) mod chat_runtime;
/// Service identifiers and error type.
pub mod error;
/// OpenAI-compatible chat-completions client.
pub mod openai;
/// Tool call payload helpers.
pub mod tools;
/// Toolhouse-compatible tool-execution client.
pub mod toolhouse;

pub use chat_runtime::RetryConfig;
