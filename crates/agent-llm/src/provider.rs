use std::pin::Pin;

use agent_core::{tools::ToolSchema, Message};
use async_trait::async_trait;
use futures::Stream;
use thiserror::Error;

use crate::config::ConfigError;
use crate::types::LLMChunk;

/// Transport-level failures. Any of these ends the current turn.
#[derive(Error, Debug)]
pub enum LLMError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Stream error: {0}")]
    Stream(String),

    /// Non-success status or an error payload from the endpoint
    #[error("API error: {0}")]
    Api(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, LLMError>;

/// Decoded response events, in arrival order.
pub type LLMStream = Pin<Box<dyn Stream<Item = Result<LLMChunk>> + Send>>;

#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Send the full history plus tool definitions and stream back the response.
    ///
    /// `model` overrides the provider's configured model for this request only.
    async fn chat_stream(
        &self,
        messages: &[Message],
        tools: &[ToolSchema],
        max_output_tokens: Option<u32>,
        model: Option<&str>,
    ) -> Result<LLMStream>;
}
