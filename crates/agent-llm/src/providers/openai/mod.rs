use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Map, Value};

use crate::config::ProviderConfig;
use crate::provider::{LLMError, LLMProvider, LLMStream, Result};
use agent_core::{tools::ToolSchema, Message};

use super::common::openai_compat::{
    build_openai_compat_body, parse_openai_compat_response, parse_openai_compat_sse_data_strict,
};
use super::common::sse::llm_stream_from_sse;

/// Provider for any OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAIProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    stream: bool,
    extra_body: Map<String, Value>,
}

impl OpenAIProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            stream: true,
            extra_body: Map::new(),
        }
    }

    /// Build a provider from validated configuration, with the request timeout applied.
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url(),
            model: config.model.clone(),
            stream: config.stream,
            extra_body: config.extra_body.clone(),
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_streaming(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    pub fn with_extra_body(mut self, extra_body: Map<String, Value>) -> Self {
        self.extra_body = extra_body;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    async fn chat_stream(
        &self,
        messages: &[Message],
        tools: &[ToolSchema],
        max_output_tokens: Option<u32>,
        model: Option<&str>,
    ) -> Result<LLMStream> {
        // Use provided model or fall back to default
        let model_to_use = model.unwrap_or(&self.model);

        if model.is_some() {
            log::debug!(
                "OpenAI provider using override model '{}' (default: '{}')",
                model_to_use,
                self.model
            );
        }

        let body = build_openai_compat_body(
            model_to_use,
            messages,
            tools,
            self.stream,
            max_output_tokens,
            &self.extra_body,
        );

        log::debug!(
            "POST {} ({} messages, {} tools, stream={})",
            self.completions_url(),
            messages.len(),
            tools.len(),
            self.stream
        );

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await?;
            return Err(LLMError::Api(format!("HTTP {}: {}", status, text)));
        }

        if !self.stream {
            let text = response.text().await?;
            let chunks = parse_openai_compat_response(&text)?;
            let stream = futures::stream::iter(chunks.into_iter().map(Ok::<_, LLMError>));
            return Ok(Box::pin(stream));
        }

        Ok(llm_stream_from_sse(response, |_event, data| {
            parse_openai_compat_sse_data_strict(data)
        }))
    }
}
