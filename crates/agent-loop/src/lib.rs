//! Drives a conversation against a chat model until it produces a final answer,
//! executing requested tool calls between requests.

pub mod config;
pub mod debug_log;
pub mod runner;
pub mod stream;

pub use config::AgentLoopConfig;
pub use debug_log::{DebugInfo, DebugLogger, Timer};
pub use runner::{run_agent_loop, run_agent_loop_with_config};
