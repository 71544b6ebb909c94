use std::sync::Arc;

use crate::debug_log::DebugLogger;

/// Configuration for the agent loop.
pub struct AgentLoopConfig {
    /// Upper bound on request/tool rounds for a single user message
    pub max_rounds: usize,
    pub system_prompt: Option<String>,
    /// Model override passed to the provider; `None` uses the provider default
    pub model: Option<String>,
    pub max_output_tokens: Option<u32>,
    /// Fixed text reported to the model for any failed tool call. When `None`,
    /// the model sees `Error: {error}` with the specific failure.
    pub failure_fallback: Option<String>,
    /// If true, skip appending the initial user message (already present in session).
    pub skip_initial_user_message: bool,
    /// Optional JSON-lines event log
    pub debug_logger: Option<Arc<DebugLogger>>,
}

impl Default for AgentLoopConfig {
    fn default() -> Self {
        Self {
            max_rounds: 20,
            system_prompt: None,
            model: None,
            max_output_tokens: None,
            failure_fallback: None,
            skip_initial_user_message: false,
            debug_logger: None,
        }
    }
}
