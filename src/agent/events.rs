//! Model events and the per-turn conversation log

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::tools::{ToolInvocation, ToolResult};

/// One discrete event emitted by the model client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModelEvent {
    /// A fragment of assistant text
    Text { text: String },
    /// A request to run one tool
    ToolCall(ToolInvocation),
    /// The model client failed; ends the turn
    Error { message: String },
}

impl ModelEvent {
    pub fn text(text: impl Into<String>) -> Self {
        ModelEvent::Text { text: text.into() }
    }

    pub fn tool_call(name: impl Into<String>, input: Value) -> Self {
        ModelEvent::ToolCall(ToolInvocation::new(name, input))
    }

    pub fn error(message: impl Into<String>) -> Self {
        ModelEvent::Error {
            message: message.into(),
        }
    }
}

/// A tool result handed back to the model client
#[derive(Debug, Clone, PartialEq)]
pub struct ToolReply {
    pub call_id: String,
    pub result: ToolResult,
}

/// One entry of a [`ConversationStep`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepEntry {
    Text {
        text: String,
    },
    ToolCall {
        id: String,
        name: String,
        /// Arguments with the tool's hidden args removed
        summary: Value,
    },
    ToolResult {
        id: String,
        payload: Value,
        is_error: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        rendered: Option<String>,
    },
    Error {
        message: String,
    },
}

/// Ordered log of everything that happened in one turn
///
/// Owned by the dispatch loop and handed out in the turn report; nothing
/// carries over to the next turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConversationStep {
    entries: Vec<StepEntry>,
}

impl ConversationStep {
    pub fn push(&mut self, entry: StepEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[StepEntry] {
        &self.entries
    }

    /// All text fragments, concatenated
    pub fn text(&self) -> String {
        self.entries
            .iter()
            .filter_map(|e| match e {
                StepEntry::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Results in the order they were produced
    pub fn results(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().filter_map(|e| match e {
            StepEntry::ToolResult { id, payload, .. } => Some((id.as_str(), payload)),
            _ => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_wire_format() {
        let events: Vec<ModelEvent> = serde_json::from_value(json!([
            { "type": "text", "text": "Looking around." },
            { "type": "tool_call", "id": "c1", "name": "list_directory", "input": { "dir": "." } },
            { "type": "error", "message": "stream reset" }
        ]))
        .unwrap();

        assert_eq!(events[0], ModelEvent::text("Looking around."));
        match &events[1] {
            ModelEvent::ToolCall(call) => {
                assert_eq!(call.id, "c1");
                assert_eq!(call.name, "list_directory");
                assert_eq!(call.input, json!({ "dir": "." }));
            }
            other => panic!("unexpected event: {:?}", other),
        }
        assert_eq!(events[2], ModelEvent::error("stream reset"));
    }

    #[test]
    fn test_step_text_and_results() {
        let mut step = ConversationStep::default();
        step.push(StepEntry::Text { text: "a".into() });
        step.push(StepEntry::ToolResult {
            id: "c1".into(),
            payload: json!({ "success": true }),
            is_error: false,
            rendered: None,
        });
        step.push(StepEntry::Text { text: "b".into() });

        assert_eq!(step.text(), "ab");
        assert_eq!(step.results().map(|(id, _)| id).collect::<Vec<_>>(), vec!["c1"]);
        assert_eq!(step.len(), 3);
    }
}
