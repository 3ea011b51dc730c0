//! Reasoning oracle seam.
//!
//! The engine treats the oracle as a black box that turns a prompt into text.
//! Structured replies are parsed with [`parse_json`], which never tries to
//! repair malformed output.

pub mod anthropic;
pub mod errors;
pub mod json;
pub mod scripted;

use async_trait::async_trait;

pub use anthropic::{ClaudeConfig, ClaudeOracle};
pub use errors::OracleError;
pub use json::parse_json;
pub use scripted::ScriptedOracle;

/// Natural-language planning and extraction capability.
#[async_trait]
pub trait ReasoningOracle: Send + Sync {
    /// Completes `prompt`, producing at most `max_tokens` tokens of text.
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, OracleError>;
}
