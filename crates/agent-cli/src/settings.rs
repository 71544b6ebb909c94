//! Command-line overrides on top of file and environment configuration.

use std::path::PathBuf;

use agent_llm::ProviderConfig;
use clap::Args;

#[derive(Args, Debug, Clone, Default)]
pub struct ProviderOverrides {
    /// Model name sent with every request
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Scheme and authority of the API, e.g. http://localhost:11434
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Path prefix in front of /chat/completions
    #[arg(long, global = true)]
    pub base_path: Option<String>,

    #[arg(long, global = true)]
    pub api_key: Option<String>,

    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    /// Request a single JSON response instead of a stream
    #[arg(long, global = true)]
    pub no_stream: bool,

    #[arg(long, global = true)]
    pub system_prompt: Option<String>,

    /// Read configuration from this file instead of the default locations
    #[arg(long, global = true, env = "TOOL_AGENT_CONFIG")]
    pub config: Option<PathBuf>,
}

impl ProviderOverrides {
    /// Defaults, then config file, then environment, then these flags.
    pub fn load(&self) -> anyhow::Result<ProviderConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let mut config = ProviderConfig::from_file(path)?;
                config.apply_env(|key| std::env::var(key).ok())?;
                config
            }
            None => ProviderConfig::load()?,
        };
        self.apply(&mut config);
        Ok(config)
    }

    pub fn apply(&self, config: &mut ProviderConfig) {
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(base_path) = &self.base_path {
            config.base_path = base_path.clone();
        }
        if let Some(api_key) = &self.api_key {
            config.api_key = api_key.clone();
        }
        if let Some(timeout_secs) = self.timeout_secs {
            config.timeout_secs = timeout_secs;
        }
        if self.no_stream {
            config.stream = false;
        }
        if let Some(system_prompt) = &self.system_prompt {
            config.system_prompt = Some(system_prompt.clone());
        }
    }
}
