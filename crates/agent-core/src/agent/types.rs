use crate::tools::ToolCall;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::AgentError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    #[serde(
        default = "generate_id",
        skip_serializing_if = "String::is_empty"
    )]
    pub id: String,
    pub role: Role,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

impl Message {
    fn with_role(role: Role, content: String) -> Self {
        Self {
            id: generate_id(),
            role,
            content,
            tool_calls: None,
            tool_call_id: None,
            created_at: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(Role::User, content.into())
    }

    /// An empty `tool_calls` list is stored as `None` so the provider never sees `[]`.
    pub fn assistant(content: impl Into<String>, tool_calls: Option<Vec<ToolCall>>) -> Self {
        let mut message = Self::with_role(Role::Assistant, content.into());
        message.tool_calls = tool_calls.filter(|calls| !calls.is_empty());
        message
    }

    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        let mut message = Self::with_role(Role::Tool, content.into());
        message.tool_call_id = Some(tool_call_id.into());
        message
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(Role::System, content.into())
    }
}

/// In-memory conversation history for one interactive session.
///
/// Messages are only ever appended; the provider reads them as ordered history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Model name for this session (e.g., "gpt-4o-mini")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
            model: None,
        }
    }

    pub fn add_message(&mut self, message: Message) {
        self.messages.push(message);
        self.updated_at = Utc::now();
    }

    /// Append a `tool` message answering one of the calls of the latest assistant message.
    ///
    /// Fails if the id does not belong to that assistant message, or was already answered.
    pub fn add_tool_result(
        &mut self,
        tool_call_id: &str,
        content: impl Into<String>,
    ) -> Result<(), AgentError> {
        let Some(assistant_index) = self
            .messages
            .iter()
            .rposition(|message| message.role == Role::Assistant)
        else {
            return Err(AgentError::Conversation(format!(
                "tool result '{tool_call_id}' has no preceding assistant message"
            )));
        };

        let assistant = &self.messages[assistant_index];
        let requested = assistant
            .tool_calls
            .as_ref()
            .is_some_and(|calls| calls.iter().any(|call| call.id == tool_call_id));
        if !requested {
            return Err(AgentError::Conversation(format!(
                "tool result '{tool_call_id}' does not match any call of the preceding assistant message"
            )));
        }

        let trailing = &self.messages[assistant_index + 1..];
        if trailing.iter().any(|message| message.role != Role::Tool) {
            return Err(AgentError::Conversation(format!(
                "tool result '{tool_call_id}' must directly follow its assistant message"
            )));
        }
        if trailing
            .iter()
            .any(|message| message.tool_call_id.as_deref() == Some(tool_call_id))
        {
            return Err(AgentError::Conversation(format!(
                "tool call '{tool_call_id}' already has a result"
            )));
        }

        self.add_message(Message::tool_result(tool_call_id, content));
        Ok(())
    }

    /// Insert the system prompt at the head of the history, unless one is already present.
    pub fn ensure_system_prompt(&mut self, prompt: &str) {
        if prompt.trim().is_empty() {
            return;
        }
        if self
            .messages
            .first()
            .is_some_and(|message| message.role == Role::System)
        {
            return;
        }
        self.messages.insert(0, Message::system(prompt));
        self.updated_at = Utc::now();
    }

    /// The content of the last assistant message, if the conversation ended on one.
    pub fn last_answer(&self) -> Option<&str> {
        self.messages
            .last()
            .filter(|message| message.role == Role::Assistant && message.tool_calls.is_none())
            .map(|message| message.content.as_str())
    }
}
