use agent_core::tools::ToolCallDelta;

/// Why the model stopped generating for a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishReason {
    ToolCalls,
    Stop,
    Other(String),
}

impl FinishReason {
    pub fn parse(value: &str) -> Self {
        match value {
            "tool_calls" | "function_call" => Self::ToolCalls,
            "stop" => Self::Stop,
            other => Self::Other(other.to_string()),
        }
    }
}

/// One decoded unit of a model response.
#[derive(Debug, Clone, PartialEq)]
pub enum LLMChunk {
    /// Answer text
    Token(String),
    /// Model "thinking" text
    Reasoning(String),
    ToolCalls(Vec<ToolCallDelta>),
    Finish(FinishReason),
    Done,
}
