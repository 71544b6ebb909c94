//! OpenAI-compatible request serialization and response decoding.
//!
//! Many providers (OpenAI, DeepSeek, Qwen, Ollama, vLLM, ...) accept the OpenAI chat
//! completions shape. These helpers build a "compat" JSON body without leaking internal
//! `agent_core::Message` fields (like `id` / `created_at`) and decode both streamed deltas
//! and single response objects into [`LLMChunk`]s.

use agent_core::tools::{ToolCallDelta, ToolSchema};
use agent_core::{Message, Role};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::provider::{LLMError, Result};
use crate::types::{FinishReason, LLMChunk};

/// Body keys owned by the codec; `extra_body` cannot replace them.
const RESERVED_BODY_KEYS: [&str; 4] = ["model", "messages", "stream", "tools"];

/// Convert internal [`Message`] values to an OpenAI-compatible JSON array.
///
/// This intentionally omits internal fields like `id` and `created_at`.
pub fn messages_to_openai_compat_json(messages: &[Message]) -> Vec<Value> {
    messages
        .iter()
        .map(|m| {
            let role = match m.role {
                Role::System => "system",
                Role::User => "user",
                Role::Assistant => "assistant",
                Role::Tool => "tool",
            };

            let mut msg = json!({
                "role": role,
                "content": m.content,
            });

            if let Some(tool_call_id) = &m.tool_call_id {
                msg["tool_call_id"] = json!(tool_call_id);
            }

            if let Some(tool_calls) = &m.tool_calls {
                msg["tool_calls"] = json!(tool_calls);
            }

            msg
        })
        .collect()
}

/// Convert internal [`ToolSchema`] values to the OpenAI `tools` array JSON.
pub fn tools_to_openai_compat_json(tools: &[ToolSchema]) -> Vec<Value> {
    tools.iter().map(|t| json!(t)).collect()
}

/// Build an OpenAI-compatible chat request body.
pub fn build_openai_compat_body(
    model: &str,
    messages: &[Message],
    tools: &[ToolSchema],
    stream: bool,
    max_output_tokens: Option<u32>,
    extra_body: &Map<String, Value>,
) -> Value {
    let mut body = json!({
        "model": model,
        "messages": messages_to_openai_compat_json(messages),
        "stream": stream,
    });

    if !tools.is_empty() {
        body["tools"] = json!(tools_to_openai_compat_json(tools));
    }

    if let Some(max_tokens) = max_output_tokens {
        body["max_tokens"] = json!(max_tokens);
    }

    for (key, value) in extra_body {
        if RESERVED_BODY_KEYS.contains(&key.as_str()) {
            log::warn!("Ignoring extra body field '{}' reserved by the request codec", key);
            continue;
        }
        body[key.as_str()] = value.clone();
    }

    body
}

// --- OpenAI-compatible streaming chunk parsing ---

#[derive(Debug, Deserialize)]
pub struct OpenAICompatStreamChunk {
    #[serde(default)]
    choices: Vec<OpenAICompatChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAICompatChoice {
    #[serde(default)]
    delta: OpenAICompatDelta,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct OpenAICompatDelta {
    content: Option<String>,
    /// DeepSeek / Qwen style
    reasoning_content: Option<String>,
    /// OpenRouter / vLLM style
    reasoning: Option<String>,
    tool_calls: Option<Vec<OpenAICompatToolCallDelta>>,
}

#[derive(Debug, Deserialize)]
struct OpenAICompatToolCallDelta {
    index: Option<u32>,
    id: Option<String>,
    function: Option<OpenAICompatFunctionDelta>,
}

#[derive(Debug, Deserialize)]
struct OpenAICompatFunctionDelta {
    name: Option<String>,
    arguments: Option<String>,
}

fn non_empty(text: Option<String>) -> Option<String> {
    text.filter(|text| !text.is_empty())
}

/// Convert a single OpenAI-compatible stream chunk into [`LLMChunk`]s.
///
/// Order within one event: reasoning, content, tool call fragments, finish signal.
pub fn parse_openai_compat_chunk(chunk: OpenAICompatStreamChunk) -> Vec<LLMChunk> {
    let Some(choice) = chunk.choices.into_iter().next() else {
        return Vec::new();
    };

    let mut out = Vec::new();
    let delta = choice.delta;

    let reasoning = non_empty(delta.reasoning_content).or(non_empty(delta.reasoning));
    if let Some(reasoning) = reasoning {
        out.push(LLMChunk::Reasoning(reasoning));
    }

    if let Some(content) = non_empty(delta.content) {
        out.push(LLMChunk::Token(content));
    }

    if let Some(tool_calls) = delta.tool_calls {
        let deltas: Vec<ToolCallDelta> = tool_calls
            .into_iter()
            .map(|tc| {
                let (name, arguments) = tc
                    .function
                    .map(|f| (f.name, f.arguments))
                    .unwrap_or_default();
                ToolCallDelta {
                    id: tc.id,
                    index: tc.index,
                    name,
                    arguments,
                }
            })
            .collect();

        if !deltas.is_empty() {
            out.push(LLMChunk::ToolCalls(deltas));
        }
    }

    if let Some(reason) = choice.finish_reason.filter(|reason| !reason.is_empty()) {
        out.push(LLMChunk::Finish(FinishReason::parse(&reason)));
    }

    out
}

/// Parse an SSE `data:` payload.
///
/// - `"[DONE]"` -> `LLMChunk::Done`
/// - Invalid JSON -> error
/// - An `{"error": ...}` payload -> `LLMError::Api`
pub fn parse_openai_compat_sse_data_strict(data: &str) -> Result<Vec<LLMChunk>> {
    let data = data.trim();
    if data.is_empty() {
        return Ok(Vec::new());
    }
    if data == "[DONE]" {
        return Ok(vec![LLMChunk::Done]);
    }

    let value: Value = serde_json::from_str(data)?;
    if let Some(error) = value.get("error") {
        return Err(LLMError::Api(api_error_message(error)));
    }

    let chunk: OpenAICompatStreamChunk = serde_json::from_value(value)?;
    Ok(parse_openai_compat_chunk(chunk))
}

fn api_error_message(error: &Value) -> String {
    error
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| error.to_string())
}

// --- Non-streaming response parsing ---

#[derive(Debug, Deserialize)]
struct OpenAICompatResponse {
    #[serde(default)]
    choices: Vec<OpenAICompatResponseChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAICompatResponseChoice {
    message: OpenAICompatResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAICompatResponseMessage {
    content: Option<String>,
    reasoning_content: Option<String>,
    reasoning: Option<String>,
    #[serde(default)]
    tool_calls: Vec<OpenAICompatResponseToolCall>,
}

#[derive(Debug, Deserialize)]
struct OpenAICompatResponseToolCall {
    id: String,
    function: OpenAICompatResponseFunction,
}

#[derive(Debug, Deserialize)]
struct OpenAICompatResponseFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

/// Decode a complete (non-streamed) chat completion into the same chunk sequence a stream
/// would produce, ending with [`LLMChunk::Done`].
pub fn parse_openai_compat_response(body: &str) -> Result<Vec<LLMChunk>> {
    let value: Value = serde_json::from_str(body)?;
    if let Some(error) = value.get("error") {
        return Err(LLMError::Api(api_error_message(error)));
    }

    let response: OpenAICompatResponse = serde_json::from_value(value)?;
    let Some(choice) = response.choices.into_iter().next() else {
        return Err(LLMError::Api("response contained no choices".to_string()));
    };

    let mut out = Vec::new();
    let message = choice.message;

    let reasoning = non_empty(message.reasoning_content).or(non_empty(message.reasoning));
    if let Some(reasoning) = reasoning {
        out.push(LLMChunk::Reasoning(reasoning));
    }
    if let Some(content) = non_empty(message.content) {
        out.push(LLMChunk::Token(content));
    }
    if !message.tool_calls.is_empty() {
        let deltas = message
            .tool_calls
            .into_iter()
            .enumerate()
            .map(|(index, call)| {
                ToolCallDelta::new(call.id, index as u32)
                    .with_name(call.function.name)
                    .with_arguments(call.function.arguments)
            })
            .collect();
        out.push(LLMChunk::ToolCalls(deltas));
    }
    if let Some(reason) = choice.finish_reason {
        out.push(LLMChunk::Finish(FinishReason::parse(&reason)));
    }
    out.push(LLMChunk::Done);

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::tools::{FunctionSchema, ToolCall};

    fn weather_schema() -> ToolSchema {
        ToolSchema {
            schema_type: "function".to_string(),
            function: FunctionSchema {
                name: "get_weather".to_string(),
                description: "Get the weather".to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "location": { "type": "string", "description": "City" }
                    },
                    "required": ["location"],
                    "additionalProperties": false
                }),
            },
        }
    }

    #[test]
    fn messages_to_openai_compat_json_omits_internal_fields() {
        let messages = vec![Message::user("Hello")];

        let out = messages_to_openai_compat_json(&messages);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0]["role"], "user");
        assert_eq!(out[0]["content"], "Hello");
        assert!(out[0].get("id").is_none());
        assert!(out[0].get("created_at").is_none());
    }

    #[test]
    fn messages_to_openai_compat_json_includes_tool_fields() {
        let tool_call = ToolCall::function("call_1", "get_weather", r#"{"location":"北京"}"#);

        let messages = vec![
            Message::assistant("", Some(vec![tool_call])),
            Message::tool_result("call_1", "sunny"),
        ];

        let out = messages_to_openai_compat_json(&messages);

        assert_eq!(out.len(), 2);
        assert_eq!(out[0]["role"], "assistant");
        assert_eq!(out[0]["tool_calls"][0]["id"], "call_1");
        assert_eq!(out[0]["tool_calls"][0]["type"], "function");
        assert_eq!(out[0]["tool_calls"][0]["function"]["name"], "get_weather");
        assert_eq!(
            out[0]["tool_calls"][0]["function"]["arguments"],
            r#"{"location":"北京"}"#
        );

        assert_eq!(out[1]["role"], "tool");
        assert_eq!(out[1]["tool_call_id"], "call_1");
    }

    #[test]
    fn tools_to_openai_compat_json_serializes_shape() {
        let out = tools_to_openai_compat_json(&[weather_schema()]);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0]["type"], "function");
        assert!(out[0].get("schema_type").is_none());
        assert_eq!(out[0]["function"]["name"], "get_weather");
        assert_eq!(out[0]["function"]["parameters"]["additionalProperties"], false);
    }

    #[test]
    fn build_body_includes_required_fields_and_omits_empty_tools() {
        let body = build_openai_compat_body(
            "gpt-4o-mini",
            &[Message::user("Hello")],
            &[],
            true,
            None,
            &Map::new(),
        );

        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["stream"], true);
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
        assert!(body.get("tools").is_none());
        assert!(body.get("max_tokens").is_none());
    }

    #[test]
    fn build_body_with_tools_and_max_tokens() {
        let body = build_openai_compat_body(
            "gpt-4o",
            &[Message::user("Weather?")],
            &[weather_schema()],
            false,
            Some(4096),
            &Map::new(),
        );

        assert_eq!(body["stream"], false);
        assert_eq!(body["max_tokens"], 4096);
        assert_eq!(body["tools"][0]["function"]["name"], "get_weather");
    }

    #[test]
    fn build_body_merges_extra_fields_but_keeps_reserved_keys() {
        let mut extra = Map::new();
        extra.insert("temperature".to_string(), json!(0.3));
        extra.insert("enable_thinking".to_string(), json!(true));
        extra.insert("model".to_string(), json!("hijacked"));

        let body = build_openai_compat_body(
            "gpt-4o-mini",
            &[Message::user("Hi")],
            &[],
            true,
            None,
            &extra,
        );

        assert_eq!(body["temperature"], 0.3);
        assert_eq!(body["enable_thinking"], true);
        assert_eq!(body["model"], "gpt-4o-mini");
    }

    #[test]
    fn parse_content_delta_yields_token() {
        let data = r#"{"id":"chatcmpl_1","choices":[{"delta":{"content":"Hello"},"finish_reason":null}]}"#;

        let chunks = parse_openai_compat_sse_data_strict(data).unwrap();

        assert_eq!(chunks, vec![LLMChunk::Token("Hello".to_string())]);
    }

    #[test]
    fn parse_reasoning_delta_yields_reasoning() {
        let data = r#"{"choices":[{"delta":{"reasoning_content":"let me think","content":null}}]}"#;

        let chunks = parse_openai_compat_sse_data_strict(data).unwrap();

        assert_eq!(chunks, vec![LLMChunk::Reasoning("let me think".to_string())]);
    }

    #[test]
    fn empty_reasoning_content_falls_back_to_reasoning() {
        let data = r#"{"choices":[{"delta":{"reasoning_content":"","reasoning":"weighing options"}}]}"#;

        let chunks = parse_openai_compat_sse_data_strict(data).unwrap();

        assert_eq!(
            chunks,
            vec![LLMChunk::Reasoning("weighing options".to_string())]
        );
    }

    #[test]
    fn full_response_empty_reasoning_content_falls_back_to_reasoning() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Sunny.","reasoning_content":"","reasoning":"checked"},"finish_reason":"stop"}]}"#;

        let chunks = parse_openai_compat_response(body).unwrap();

        assert_eq!(chunks[0], LLMChunk::Reasoning("checked".to_string()));
        assert_eq!(chunks[1], LLMChunk::Token("Sunny.".to_string()));
    }

    #[test]
    fn parse_tool_call_fragments_keep_absent_fields_absent() {
        let first = r#"{"choices":[{"delta":{"tool_calls":[{"index":0,"id":"call_1","type":"function","function":{"name":"get_weather","arguments":""}}]}}]}"#;
        let second = r#"{"choices":[{"delta":{"tool_calls":[{"index":0,"function":{"arguments":"{\"location\":"}}]}}]}"#;

        let chunks = parse_openai_compat_sse_data_strict(first).unwrap();
        match &chunks[..] {
            [LLMChunk::ToolCalls(deltas)] => {
                assert_eq!(deltas[0].id.as_deref(), Some("call_1"));
                assert_eq!(deltas[0].index, Some(0));
                assert_eq!(deltas[0].name.as_deref(), Some("get_weather"));
            }
            other => panic!("expected tool call chunk, got {other:?}"),
        }

        let chunks = parse_openai_compat_sse_data_strict(second).unwrap();
        match &chunks[..] {
            [LLMChunk::ToolCalls(deltas)] => {
                assert!(deltas[0].id.is_none());
                assert!(deltas[0].name.is_none());
                assert_eq!(deltas[0].arguments.as_deref(), Some("{\"location\":"));
            }
            other => panic!("expected tool call chunk, got {other:?}"),
        }
    }

    #[test]
    fn parse_finish_reason_follows_content() {
        let data = r#"{"choices":[{"delta":{"content":"."},"finish_reason":"stop"}]}"#;

        let chunks = parse_openai_compat_sse_data_strict(data).unwrap();

        assert_eq!(
            chunks,
            vec![
                LLMChunk::Token(".".to_string()),
                LLMChunk::Finish(FinishReason::Stop),
            ]
        );
    }

    #[test]
    fn parse_tool_calls_finish_reason() {
        let data = r#"{"choices":[{"delta":{},"finish_reason":"tool_calls"}]}"#;
        let chunks = parse_openai_compat_sse_data_strict(data).unwrap();
        assert_eq!(chunks, vec![LLMChunk::Finish(FinishReason::ToolCalls)]);
    }

    #[test]
    fn parse_done_signal_with_whitespace() {
        let chunks = parse_openai_compat_sse_data_strict("  [DONE]  ").unwrap();
        assert_eq!(chunks, vec![LLMChunk::Done]);
    }

    #[test]
    fn parse_empty_delta_and_no_choices_yield_nothing() {
        assert!(parse_openai_compat_sse_data_strict(r#"{"choices":[{"delta":{}}]}"#)
            .unwrap()
            .is_empty());
        assert!(parse_openai_compat_sse_data_strict(r#"{"choices":[]}"#)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn parse_invalid_json_errors() {
        assert!(parse_openai_compat_sse_data_strict("{invalid json}").is_err());
    }

    #[test]
    fn parse_error_payload_is_api_error() {
        let data = r#"{"error":{"message":"Invalid API key","code":"invalid_api_key"}}"#;
        match parse_openai_compat_sse_data_strict(data) {
            Err(LLMError::Api(message)) => assert_eq!(message, "Invalid API key"),
            other => panic!("expected API error, got {other:?}"),
        }
    }

    #[test]
    fn parse_full_response_with_tool_calls() {
        let body = r#"{
            "id": "chatcmpl-1",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [
                        {"id": "a", "type": "function", "function": {"name": "get_weather", "arguments": "{\"location\":\"北京\"}"}},
                        {"id": "b", "type": "function", "function": {"name": "get_weather", "arguments": "{\"location\":\"郑州\"}"}}
                    ]
                },
                "finish_reason": "tool_calls"
            }]
        }"#;

        let chunks = parse_openai_compat_response(body).unwrap();

        assert_eq!(chunks.len(), 3);
        match &chunks[0] {
            LLMChunk::ToolCalls(deltas) => {
                assert_eq!(deltas.len(), 2);
                assert_eq!(deltas[1].id.as_deref(), Some("b"));
                assert_eq!(deltas[1].index, Some(1));
                assert_eq!(
                    deltas[1].arguments.as_deref(),
                    Some(r#"{"location":"郑州"}"#)
                );
            }
            other => panic!("expected tool calls, got {other:?}"),
        }
        assert_eq!(chunks[1], LLMChunk::Finish(FinishReason::ToolCalls));
        assert_eq!(chunks[2], LLMChunk::Done);
    }

    #[test]
    fn parse_full_response_with_answer() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Sunny.","reasoning_content":"checked"},"finish_reason":"stop"}]}"#;

        let chunks = parse_openai_compat_response(body).unwrap();

        assert_eq!(
            chunks,
            vec![
                LLMChunk::Reasoning("checked".to_string()),
                LLMChunk::Token("Sunny.".to_string()),
                LLMChunk::Finish(FinishReason::Stop),
                LLMChunk::Done,
            ]
        );
    }

    #[test]
    fn parse_full_response_without_choices_errors() {
        assert!(matches!(
            parse_openai_compat_response(r#"{"choices":[]}"#),
            Err(LLMError::Api(_))
        ));
    }

    #[test]
    fn finish_reason_parse_maps_known_values() {
        assert_eq!(FinishReason::parse("tool_calls"), FinishReason::ToolCalls);
        assert_eq!(FinishReason::parse("stop"), FinishReason::Stop);
        assert_eq!(
            FinishReason::parse("length"),
            FinishReason::Other("length".to_string())
        );
    }
}
