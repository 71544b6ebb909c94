//! LLM Providers
//!
//! OpenAI-compatible chat completion providers.

pub(crate) mod common;
pub mod openai;

pub use openai::OpenAIProvider;
