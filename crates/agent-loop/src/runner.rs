use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::mpsc;

use agent_core::agent::events::TokenUsage;
use agent_core::tools::{execute_tool_call, parse_tool_args, ToolCall, ToolError, ToolExecutor};
use agent_core::{AgentError, AgentEvent, Message, Session};
use agent_llm::{FinishReason, LLMProvider};

use crate::config::AgentLoopConfig;
use crate::debug_log::{DebugLogger, Timer};
use crate::stream::handler::{consume_llm_stream, StreamHandlingOutput};

pub type Result<T> = std::result::Result<T, AgentError>;

/// What to do with a completed model response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RoundOutcome {
    RunTools,
    FinalAnswer,
}

/// Run the conversation until the model gives a final answer.
///
/// Appends `initial_message` (unless `skip_initial_user_message` is set), then alternates
/// between requesting a response and executing the tool calls it asks for. All calls of one
/// response run concurrently; their results are appended in the order the calls were
/// announced, and the next request is only sent once every result is in. Returns the
/// final answer text.
///
/// A transport failure ends the turn with [`AgentError::LLM`]; messages appended before the
/// failure stay in the session.
pub async fn run_agent_loop_with_config(
    session: &mut Session,
    initial_message: String,
    event_tx: mpsc::Sender<AgentEvent>,
    llm: Arc<dyn LLMProvider>,
    tools: Arc<dyn ToolExecutor>,
    config: AgentLoopConfig,
) -> Result<String> {
    let debug_logger = config
        .debug_logger
        .clone()
        .unwrap_or_else(|| Arc::new(DebugLogger::new(log::log_enabled!(log::Level::Debug))));
    let session_id = session.id.clone();

    log::debug!(
        "[{}] Starting agent loop with message: {}",
        session_id,
        initial_message
    );
    debug_logger.log_event(
        &session_id,
        "agent_loop_start",
        serde_json::json!({
            "message": initial_message,
            "max_rounds": config.max_rounds,
            "initial_message_count": session.messages.len(),
        }),
    );

    if let Some(system_prompt) = config.system_prompt.as_deref() {
        session.ensure_system_prompt(system_prompt);
    }

    if !config.skip_initial_user_message {
        session.add_message(Message::user(initial_message));
    }

    let tool_schemas = tools.list_tools();
    let mut total_tokens = 0usize;

    for round in 0..config.max_rounds {
        debug_logger.log_event(
            &session_id,
            "round_start",
            serde_json::json!({
                "round": round + 1,
                "total_rounds": config.max_rounds,
                "message_count": session.messages.len(),
            }),
        );

        let timer = Timer::new("llm_request");
        let stream = match llm
            .chat_stream(
                &session.messages,
                &tool_schemas,
                config.max_output_tokens,
                config.model.as_deref(),
            )
            .await
        {
            Ok(stream) => stream,
            Err(error) => {
                log::error!("[{}] LLM request failed: {}", session_id, error);
                let _ = event_tx
                    .send(AgentEvent::Error {
                        message: error.to_string(),
                    })
                    .await;
                return Err(AgentError::LLM(error.to_string()));
            }
        };

        let stream_output = consume_llm_stream(stream, &event_tx, &session_id).await?;
        total_tokens += stream_output.token_count;

        timer.debug(&session_id);
        log::debug!(
            "[{}] LLM response completed in {}ms, {} tokens received",
            session_id,
            timer.elapsed_ms(),
            stream_output.token_count
        );

        match round_outcome(&stream_output, &session_id) {
            RoundOutcome::FinalAnswer => {
                let answer = stream_output.content;
                session.add_message(Message::assistant(answer.clone(), None));

                debug_logger.log_event(
                    &session_id,
                    "round_complete",
                    serde_json::json!({
                        "round": round + 1,
                        "final_answer": true,
                        "answer_length": answer.len(),
                    }),
                );

                let usage = TokenUsage {
                    prompt_tokens: 0,
                    completion_tokens: total_tokens as u32,
                    total_tokens: total_tokens as u32,
                };
                let _ = event_tx
                    .send(AgentEvent::Complete {
                        content: answer.clone(),
                        usage,
                    })
                    .await;

                log::info!(
                    "[{}] Final answer after {} round(s)",
                    session_id,
                    round + 1
                );
                return Ok(answer);
            }
            RoundOutcome::RunTools => {
                let tool_calls = stream_output.tool_calls;
                log::info!(
                    "[{}] Round {}: executing {} tool call(s)",
                    session_id,
                    round + 1,
                    tool_calls.len()
                );

                session.add_message(Message::assistant(
                    stream_output.content,
                    Some(tool_calls.clone()),
                ));

                let results = execute_tool_calls(
                    &tool_calls,
                    tools.as_ref(),
                    &event_tx,
                    &session_id,
                    &config,
                    &debug_logger,
                )
                .await;

                for (tool_call, content) in tool_calls.iter().zip(results) {
                    if let Err(error) = session.add_tool_result(&tool_call.id, content) {
                        log::error!(
                            "[{}] Dropped result for tool call '{}': {}",
                            session_id,
                            tool_call.id,
                            error
                        );
                    }
                }

                debug_logger.log_event(
                    &session_id,
                    "round_complete",
                    serde_json::json!({
                        "round": round + 1,
                        "final_answer": false,
                        "tool_calls": tool_calls.len(),
                    }),
                );
            }
        }
    }

    log::warn!(
        "[{}] No final answer within {} rounds",
        session_id,
        config.max_rounds
    );
    let error = AgentError::MaxRoundsExceeded(config.max_rounds);
    let _ = event_tx
        .send(AgentEvent::Error {
            message: error.to_string(),
        })
        .await;
    Err(error)
}

pub async fn run_agent_loop(
    session: &mut Session,
    initial_message: String,
    event_tx: mpsc::Sender<AgentEvent>,
    llm: Arc<dyn LLMProvider>,
    tools: Arc<dyn ToolExecutor>,
    max_rounds: usize,
) -> Result<String> {
    run_agent_loop_with_config(
        session,
        initial_message,
        event_tx,
        llm,
        tools,
        AgentLoopConfig {
            max_rounds,
            ..Default::default()
        },
    )
    .await
}

fn round_outcome(output: &StreamHandlingOutput, session_id: &str) -> RoundOutcome {
    let has_calls = !output.tool_calls.is_empty();

    match &output.finish_reason {
        Some(FinishReason::Stop) => {
            if has_calls {
                log::warn!(
                    "[{}] Response finished with 'stop' but carried {} tool call(s); ignoring them",
                    session_id,
                    output.tool_calls.len()
                );
            }
            RoundOutcome::FinalAnswer
        }
        Some(FinishReason::ToolCalls) if has_calls => RoundOutcome::RunTools,
        Some(FinishReason::ToolCalls) => {
            log::warn!(
                "[{}] Response asked for tool calls but none were received",
                session_id
            );
            RoundOutcome::FinalAnswer
        }
        _ if has_calls => RoundOutcome::RunTools,
        other => {
            log::warn!(
                "[{}] Response ended with finish reason {:?}; treating text as final answer",
                session_id,
                other
            );
            RoundOutcome::FinalAnswer
        }
    }
}

/// Execute every call concurrently and return one result text per call, in call order.
async fn execute_tool_calls(
    tool_calls: &[ToolCall],
    tools: &dyn ToolExecutor,
    event_tx: &mpsc::Sender<AgentEvent>,
    session_id: &str,
    config: &AgentLoopConfig,
    debug_logger: &DebugLogger,
) -> Vec<String> {
    let executions = tool_calls.iter().map(|tool_call| async move {
        let arguments = parse_tool_args(&tool_call.function.arguments)
            .map(serde_json::Value::Object)
            .unwrap_or_else(|_| serde_json::Value::String(tool_call.function.arguments.clone()));

        let _ = event_tx
            .send(AgentEvent::ToolStart {
                tool_call_id: tool_call.id.clone(),
                tool_name: tool_call.function.name.clone(),
                arguments,
            })
            .await;

        let tool_timer = Timer::new(format!("tool_{}", tool_call.function.name));
        let result = execute_tool_call(tool_call, tools).await;
        tool_timer.debug(session_id);

        debug_logger.log_event(
            session_id,
            "tool_result",
            serde_json::json!({
                "tool_call_id": tool_call.id,
                "tool_name": tool_call.function.name,
                "success": result.is_ok(),
                "duration_ms": tool_timer.elapsed_ms() as u64,
            }),
        );

        match result {
            Ok(output) => {
                let _ = event_tx
                    .send(AgentEvent::ToolComplete {
                        tool_call_id: tool_call.id.clone(),
                        result: output.clone(),
                    })
                    .await;
                output
            }
            Err(error) => {
                log::warn!(
                    "[{}] Tool '{}' ({}) failed: {}",
                    session_id,
                    tool_call.function.name,
                    tool_call.id,
                    error
                );
                let _ = event_tx
                    .send(AgentEvent::ToolError {
                        tool_call_id: tool_call.id.clone(),
                        error: error.to_string(),
                    })
                    .await;
                failure_text(&error, config)
            }
        }
    });

    join_all(executions).await
}

/// The tool message content the model sees for a failed call.
fn failure_text(error: &ToolError, config: &AgentLoopConfig) -> String {
    match config.failure_fallback.as_deref() {
        Some(fallback) => fallback.to_string(),
        None => format!("Error: {error}"),
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
