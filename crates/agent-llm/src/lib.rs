pub mod config;
pub mod provider;
pub mod providers;
pub mod types;

pub use config::{ConfigError, ProviderConfig};
pub use provider::{LLMError, LLMProvider, LLMStream};
pub use providers::OpenAIProvider;
pub use types::{FinishReason, LLMChunk};
