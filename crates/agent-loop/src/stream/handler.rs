use futures::StreamExt;
use tokio::sync::mpsc;

use agent_core::tools::{ToolCall, ToolCallAccumulator};
use agent_core::{AgentError, AgentEvent};
use agent_llm::{FinishReason, LLMChunk, LLMStream};

/// Everything one model response produced.
#[derive(Debug, Default)]
pub struct StreamHandlingOutput {
    pub content: String,
    pub reasoning: String,
    pub token_count: usize,
    /// Finalized in the order the calls were opened
    pub tool_calls: Vec<ToolCall>,
    /// `None` when the stream ended without a finish signal
    pub finish_reason: Option<FinishReason>,
}

pub async fn consume_llm_stream(
    mut stream: LLMStream,
    event_tx: &mpsc::Sender<AgentEvent>,
    session_id: &str,
) -> Result<StreamHandlingOutput, AgentError> {
    let mut content = String::new();
    let mut reasoning = String::new();
    let mut token_count = 0usize;
    let mut finish_reason = None;
    let mut tool_calls = ToolCallAccumulator::new();

    while let Some(chunk_result) = stream.next().await {
        match chunk_result {
            Ok(LLMChunk::Token(token)) => {
                token_count += token.len();
                content.push_str(&token);

                let _ = event_tx
                    .send(AgentEvent::Token {
                        content: token.clone(),
                    })
                    .await;
            }
            Ok(LLMChunk::Reasoning(text)) => {
                reasoning.push_str(&text);
                let _ = event_tx.send(AgentEvent::Reasoning { content: text }).await;
            }
            Ok(LLMChunk::ToolCalls(partial_calls)) => {
                log::debug!(
                    "[{}] Received {} tool call parts",
                    session_id,
                    partial_calls.len()
                );
                tool_calls.extend(partial_calls);
            }
            Ok(LLMChunk::Finish(reason)) => {
                log::debug!("[{}] Finish signal: {:?}", session_id, reason);
                finish_reason = Some(reason);
            }
            Ok(LLMChunk::Done) => {
                log::debug!("[{}] LLM stream completed", session_id);
                break;
            }
            Err(error) => {
                let message = format!("Stream error: {error}");
                let _ = event_tx
                    .send(AgentEvent::Error {
                        message: message.clone(),
                    })
                    .await;
                return Err(AgentError::LLM(error.to_string()));
            }
        }
    }

    Ok(StreamHandlingOutput {
        content,
        reasoning,
        token_count,
        tool_calls: tool_calls.finalize_all(),
        finish_reason,
    })
}
