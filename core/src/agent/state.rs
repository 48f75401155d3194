use crate::graph::GraphState;
use crate::traits::{ChatMessage, ToolCall};

/// Conversation state for one function-calling run. Created fresh per task;
/// nothing leaks between runs.
pub struct ChatState {
    pub messages: Vec<ChatMessage>,
    /// Set once the plan-complete sentinel tool has run.
    pub completed: bool,
}

impl ChatState {
    pub fn seeded(task: &str) -> Self {
        Self {
            messages: vec![ChatMessage::user(task)],
            completed: false,
        }
    }

    pub fn last_message(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }
}

/// Node output folded into [`ChatState`].
///
/// Messages append; history is never rewritten. The completion flag is
/// last-write-wins and only the tool node sets it.
#[derive(Debug, Default)]
pub struct ChatDelta {
    pub messages: Vec<ChatMessage>,
    pub completed: Option<bool>,
}

impl GraphState for ChatState {
    type Delta = ChatDelta;

    fn apply(&mut self, delta: ChatDelta) {
        self.messages.extend(delta.messages);
        if let Some(done) = delta.completed {
            self.completed = done;
        }
    }
}

/// One executed assistant turn: the tool calls it issued, each joined to the
/// result that came back for it.
#[derive(Debug, Clone)]
pub struct StepRecord {
    pub calls: Vec<ToolCall>,
    pub results: Vec<String>,
}

impl StepRecord {
    /// Compact `name(args)` rendering of the calls, for prompts and logs.
    pub fn describe_calls(&self) -> String {
        self.calls
            .iter()
            .map(|c| format!("{}({})", c.name, c.arguments))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_appends_messages_and_keeps_flag() {
        let mut state = ChatState::seeded("do the thing");
        state.apply(ChatDelta {
            messages: vec![ChatMessage::assistant("ok")],
            completed: None,
        });
        assert_eq!(state.messages.len(), 2);
        assert!(!state.completed);

        state.apply(ChatDelta {
            messages: vec![],
            completed: Some(true),
        });
        assert_eq!(state.messages.len(), 2);
        assert!(state.completed);
    }

    #[test]
    fn describe_calls_joins_name_and_args() {
        let record = StepRecord {
            calls: vec![
                ToolCall {
                    id: "1".into(),
                    name: "get_current_weather".into(),
                    arguments: r#"{"location":"Paris"}"#.into(),
                },
                ToolCall {
                    id: "2".into(),
                    name: "plan_complete".into(),
                    arguments: "{}".into(),
                },
            ],
            results: vec![],
        };
        assert_eq!(
            record.describe_calls(),
            r#"get_current_weather({"location":"Paris"}), plan_complete({})"#
        );
    }
}
