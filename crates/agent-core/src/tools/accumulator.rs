//! Reassembly of streamed tool call fragments.
//!
//! Streaming chat APIs deliver a tool call's id, name and argument text spread over
//! several events. Fragments are folded into one open [`PendingToolCall`] at a time;
//! a fragment carrying a new id closes the open call and starts the next one.

use std::collections::HashSet;

use uuid::Uuid;

use crate::tools::{FunctionCall, ToolCall};

/// One tool call fragment as carried by a single stream event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolCallDelta {
    pub id: Option<String>,
    pub index: Option<u32>,
    pub name: Option<String>,
    pub arguments: Option<String>,
}

impl ToolCallDelta {
    pub fn new(id: impl Into<String>, index: u32) -> Self {
        Self {
            id: Some(id.into()),
            index: Some(index),
            ..Self::default()
        }
    }

    pub fn arguments(fragment: impl Into<String>) -> Self {
        Self {
            arguments: Some(fragment.into()),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_arguments(mut self, fragment: impl Into<String>) -> Self {
        self.arguments = Some(fragment.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingToolCall {
    pub stream_id: String,
    pub position_index: u32,
    pub name: String,
    /// Append-only; the concatenation forms one JSON document
    pub argument_text: String,
}

impl PendingToolCall {
    fn open(stream_id: String, position_index: u32) -> Self {
        Self {
            stream_id,
            position_index,
            name: String::new(),
            argument_text: String::new(),
        }
    }

    fn into_tool_call(self) -> ToolCall {
        ToolCall {
            id: if self.stream_id.is_empty() {
                format!("call_{}", Uuid::new_v4())
            } else {
                self.stream_id
            },
            tool_type: "function".to_string(),
            function: FunctionCall {
                name: self.name,
                arguments: self.argument_text,
            },
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct ToolCallAccumulator {
    open: Option<PendingToolCall>,
    finalized: Vec<PendingToolCall>,
}

impl ToolCallAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one fragment into the accumulated state.
    ///
    /// Absent (or empty) fields never clear what is already known. When a fragment
    /// has no id, a change of `index` is also treated as the start of a new call.
    pub fn on_delta(&mut self, delta: ToolCallDelta) {
        let id = delta.id.filter(|id| !id.is_empty());
        let name = delta.name.filter(|name| !name.is_empty());

        let starts_new_call = match (&self.open, &id, delta.index) {
            (None, _, _) => true,
            (Some(open), Some(id), _) => &open.stream_id != id,
            (Some(open), None, Some(index)) => open.position_index != index,
            (Some(_), None, None) => false,
        };

        if starts_new_call {
            if id.is_none() && name.is_none() && delta.arguments.is_none() {
                return;
            }
            if let Some(previous) = self.open.take() {
                self.finalized.push(previous);
            }
            let position = delta
                .index
                .unwrap_or_else(|| self.finalized.len() as u32);
            self.open = Some(PendingToolCall::open(id.unwrap_or_default(), position));
        }

        let Some(open) = self.open.as_mut() else {
            return;
        };

        if let Some(name) = name {
            open.name = name;
        }
        if let Some(fragment) = delta.arguments {
            open.argument_text.push_str(&fragment);
        }
    }

    pub fn extend<I>(&mut self, deltas: I)
    where
        I: IntoIterator<Item = ToolCallDelta>,
    {
        for delta in deltas {
            self.on_delta(delta);
        }
    }

    /// Close the open call and return every call in the order it was first opened.
    ///
    /// Ids are unique in the result: an id the stream reused for a later call is replaced
    /// with a generated `call_{uuid}`.
    pub fn finalize_all(mut self) -> Vec<ToolCall> {
        if let Some(open) = self.open.take() {
            self.finalized.push(open);
        }

        let mut seen = HashSet::new();
        self.finalized
            .into_iter()
            .map(|mut pending| {
                if !pending.stream_id.is_empty() && !seen.insert(pending.stream_id.clone()) {
                    log::warn!(
                        "Tool call id '{}' reused by a later call ({}), assigning a new id",
                        pending.stream_id,
                        pending.name
                    );
                    pending.stream_id.clear();
                }
                pending.into_tool_call()
            })
            .collect()
    }

    pub fn pending(&self) -> Option<&PendingToolCall> {
        self.open.as_ref()
    }

    pub fn len(&self) -> usize {
        self.finalized.len() + usize::from(self.open.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulator_merges_partial_arguments() {
        let mut accumulator = ToolCallAccumulator::new();

        accumulator.on_delta(
            ToolCallDelta::new("call_1", 0)
                .with_name("execute_command")
                .with_arguments("{\"command\": \""),
        );
        accumulator.on_delta(ToolCallDelta::arguments("echo hello"));
        accumulator.on_delta(ToolCallDelta::arguments("\"}"));

        let calls = accumulator.finalize_all();

        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].id, "call_1");
        assert_eq!(calls[0].function.name, "execute_command");
        assert_eq!(calls[0].function.arguments, "{\"command\": \"echo hello\"}");
    }

    #[test]
    fn two_calls_are_finalized_in_opening_order() {
        let mut accumulator = ToolCallAccumulator::new();

        accumulator.extend([
            ToolCallDelta::new("a", 0).with_name("get_weather"),
            ToolCallDelta::arguments("{\"location\":"),
            ToolCallDelta::arguments("\"北京\"}"),
            ToolCallDelta::new("b", 1).with_name("get_weather"),
            ToolCallDelta::arguments("{\"location\":\"郑州\"}"),
        ]);

        let calls = accumulator.finalize_all();

        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].id, "a");
        assert_eq!(calls[0].function.arguments, r#"{"location":"北京"}"#);
        assert_eq!(calls[1].id, "b");
        assert_eq!(calls[1].function.arguments, r#"{"location":"郑州"}"#);
    }

    #[test]
    fn any_split_of_argument_text_yields_same_result() {
        let full = r#"{"location":"北京","days":3}"#;
        let chars: Vec<char> = full.chars().collect();

        for split in 0..=chars.len() {
            let head: String = chars[..split].iter().collect();
            let tail: String = chars[split..].iter().collect();

            let mut accumulator = ToolCallAccumulator::new();
            accumulator.on_delta(ToolCallDelta::new("a", 0).with_name("get_weather"));
            accumulator.on_delta(ToolCallDelta::arguments(head));
            accumulator.on_delta(ToolCallDelta::arguments(tail));

            let calls = accumulator.finalize_all();
            assert_eq!(calls[0].function.arguments, full, "split at {split}");
        }
    }

    #[test]
    fn new_id_leaves_previous_call_untouched() {
        let mut accumulator = ToolCallAccumulator::new();

        accumulator.on_delta(
            ToolCallDelta::new("a", 0)
                .with_name("first")
                .with_arguments("{}"),
        );
        accumulator.on_delta(ToolCallDelta::new("b", 1).with_name("second"));
        accumulator.on_delta(ToolCallDelta::arguments("{\"x\":1}"));
        accumulator.on_delta(
            ToolCallDelta {
                id: Some("b".to_string()),
                ..ToolCallDelta::default()
            }
            .with_name("second_renamed"),
        );

        let calls = accumulator.finalize_all();

        assert_eq!(calls[0].function.name, "first");
        assert_eq!(calls[0].function.arguments, "{}");
        assert_eq!(calls[1].function.name, "second_renamed");
        assert_eq!(calls[1].function.arguments, "{\"x\":1}");
    }

    #[test]
    fn absent_fields_do_not_clear_known_values() {
        let mut accumulator = ToolCallAccumulator::new();

        accumulator.on_delta(ToolCallDelta::new("a", 0).with_name("get_weather"));
        accumulator.on_delta(ToolCallDelta::new("a", 0));
        accumulator.on_delta(ToolCallDelta {
            id: Some("a".to_string()),
            name: Some(String::new()),
            ..ToolCallDelta::default()
        });

        let pending = accumulator.pending().expect("open call");
        assert_eq!(pending.name, "get_weather");
        assert_eq!(pending.argument_text, "");
    }

    #[test]
    fn index_change_without_id_opens_new_call() {
        let mut accumulator = ToolCallAccumulator::new();

        accumulator.on_delta(ToolCallDelta {
            index: Some(0),
            name: Some("first".to_string()),
            arguments: Some("{}".to_string()),
            ..ToolCallDelta::default()
        });
        accumulator.on_delta(ToolCallDelta {
            index: Some(1),
            name: Some("second".to_string()),
            ..ToolCallDelta::default()
        });

        let calls = accumulator.finalize_all();

        assert_eq!(calls.len(), 2);
        assert!(calls[0].id.starts_with("call_"));
        assert_ne!(calls[0].id, calls[1].id);
        assert_eq!(calls[1].function.name, "second");
    }

    #[test]
    fn reused_id_gets_a_fresh_id() {
        let mut accumulator = ToolCallAccumulator::new();

        accumulator.extend([
            ToolCallDelta::new("a", 0)
                .with_name("get_weather")
                .with_arguments("{\"location\":"),
            ToolCallDelta::new("b", 1)
                .with_name("get_weather")
                .with_arguments("{\"location\":\"郑州\"}"),
            ToolCallDelta::new("a", 0).with_arguments("\"北京\"}"),
        ]);

        let calls = accumulator.finalize_all();

        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0].id, "a");
        assert_eq!(calls[0].function.arguments, "{\"location\":");
        assert_eq!(calls[1].id, "b");
        assert!(calls[2].id.starts_with("call_"));
        assert_eq!(calls[2].function.arguments, "\"北京\"}");
    }

    #[test]
    fn empty_fragment_before_any_call_is_ignored() {
        let mut accumulator = ToolCallAccumulator::new();
        accumulator.on_delta(ToolCallDelta::default());
        assert!(accumulator.is_empty());
        assert!(accumulator.finalize_all().is_empty());
    }

    #[test]
    fn len_counts_open_and_finalized_calls() {
        let mut accumulator = ToolCallAccumulator::new();
        accumulator.on_delta(ToolCallDelta::new("a", 0));
        assert_eq!(accumulator.len(), 1);
        accumulator.on_delta(ToolCallDelta::new("b", 1));
        assert_eq!(accumulator.len(), 2);
    }
}
