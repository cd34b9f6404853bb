//! Conversation history with per-turn tool-call traces.
//!
//! Each `ai` turn carries the tool invocations that produced it, so the
//! association between an answer and its trace never has to be reconstructed
//! by position in the history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Who authored a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Human,
    Ai,
}

/// A single recorded tool invocation: name, resolved input, normalized output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Name of the invoked tool.
    pub tool: String,
    /// Resolved input arguments as passed to the tool.
    pub input: Value,
    /// Normalized output mapping (success payload or error payload).
    pub output: Value,
}

/// One turn in the conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    /// Tool calls made while producing this turn (ai turns only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolInvocation>,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    /// Create a human turn.
    pub fn human(content: &str) -> Self {
        Self {
            role: Role::Human,
            content: content.to_string(),
            tool_calls: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    /// Create an ai turn with its tool-call trace.
    pub fn ai(content: &str, tool_calls: Vec<ToolInvocation>) -> Self {
        Self {
            role: Role::Ai,
            content: content.to_string(),
            tool_calls,
            timestamp: Utc::now(),
        }
    }
}

/// Append-only conversation store.
#[derive(Debug, Default)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn to the history.
    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// All turns in insertion order.
    pub fn all(&self) -> &[Turn] {
        &self.turns
    }

    /// Discard the whole history, traces included.
    pub fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }
}

/// Result of processing one query: the answer plus its ordered trace.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    /// The user's query.
    pub query: String,
    /// Final answer text (model-authored or composed).
    pub answer: String,
    /// Tool invocations in the order they were executed.
    pub tool_calls: Vec<ToolInvocation>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_clear_discards_turns_and_traces() {
        let mut conv = Conversation::new();
        conv.append(Turn::human("hello"));
        conv.append(Turn::ai(
            "hi",
            vec![ToolInvocation {
                tool: "web_search".to_string(),
                input: json!({"query": "hello"}),
                output: json!({"results": []}),
            }],
        ));
        assert_eq!(conv.len(), 2);

        conv.clear();
        assert!(conv.is_empty());
        assert!(conv.all().iter().all(|t| t.tool_calls.is_empty()));
    }

    #[test]
    fn test_turn_serialization_shape() {
        let turn = Turn::ai("answer", Vec::new());
        let value = serde_json::to_value(&turn).unwrap();
        assert_eq!(value["role"], "ai");
        assert_eq!(value["content"], "answer");
        // Empty traces are omitted from the serialized turn
        assert!(value.get("tool_calls").is_none());
    }
}
