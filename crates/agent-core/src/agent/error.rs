use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("LLM error: {0}")]
    LLM(String),

    #[error("Tool error: {0}")]
    Tool(String),

    #[error("Conversation error: {0}")]
    Conversation(String),

    #[error("Exceeded maximum of {0} rounds without a final answer")]
    MaxRoundsExceeded(usize),
}
