use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::agent::{ChatDelta, ChatState, ToolRegistry};
use crate::error::EngineError;
use crate::graph::{Next, Node, RunContext};
use crate::tools::PLAN_COMPLETE;
use crate::traits::ChatMessage;

/// Dispatches every tool call from the latest assistant turn, in request
/// order, and appends one tool message per call.
///
/// Seeing the plan-complete sentinel among the calls marks the run completed
/// and ends the graph; otherwise control goes back to the model.
pub struct ToolNode {
    registry: Arc<ToolRegistry>,
}

impl ToolNode {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl Node<ChatState> for ToolNode {
    fn id(&self) -> &str {
        "tools"
    }

    async fn run(
        &self,
        state: &ChatState,
        _ctx: &RunContext,
    ) -> Result<(ChatDelta, Next), EngineError> {
        let last = state.last_message().ok_or_else(|| {
            EngineError::ContractViolation("tool node invoked with an empty conversation".into())
        })?;
        let calls = last.requested_tools();
        if last.role != "assistant" || calls.is_empty() {
            return Err(EngineError::ContractViolation(
                "tool node invoked without pending tool calls".into(),
            ));
        }

        let mut delta = ChatDelta::default();
        let mut next = Next::node("model");

        for call in calls {
            let content = match parse_args(&call.arguments) {
                Ok(args) => self
                    .registry
                    .dispatch(&call.name, args)
                    .await
                    .content()
                    .to_string(),
                Err(e) => format!("Tool {} failed: invalid arguments: {}", call.name, e),
            };
            tracing::debug!(tool = %call.name, "dispatched");

            delta
                .messages
                .push(ChatMessage::tool_result(call.id.clone(), content));

            if call.name == PLAN_COMPLETE {
                delta.completed = Some(true);
                next = Next::End;
            }
        }

        Ok((delta, next))
    }
}

fn parse_args(raw: &str) -> Result<serde_json::Value, serde_json::Error> {
    if raw.trim().is_empty() {
        return Ok(json!({}));
    }
    serde_json::from_str(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphState;
    use crate::traits::{Tool, ToolCall, ToolResult};

    struct Echo;

    #[async_trait]
    impl Tool for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echoes the text argument"
        }

        fn parameters_schema(&self) -> serde_json::Value {
            json!({"type": "object", "properties": {"text": {"type": "string"}}})
        }

        async fn execute(&self, args: serde_json::Value) -> anyhow::Result<ToolResult> {
            Ok(ToolResult::success(
                args["text"].as_str().unwrap_or_default().to_string(),
            ))
        }
    }

    struct Sentinel;

    #[async_trait]
    impl Tool for Sentinel {
        fn name(&self) -> &str {
            PLAN_COMPLETE
        }

        fn description(&self) -> &str {
            "Marks the plan finished"
        }

        fn parameters_schema(&self) -> serde_json::Value {
            json!({"type": "object", "properties": {}})
        }

        async fn execute(&self, _args: serde_json::Value) -> anyhow::Result<ToolResult> {
            Ok(ToolResult::success("Plan execution completed successfully"))
        }
    }

    fn node() -> ToolNode {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Echo));
        registry.register(Arc::new(Sentinel));
        ToolNode::new(Arc::new(registry))
    }

    fn call(id: &str, name: &str, arguments: &str) -> ToolCall {
        ToolCall {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    fn state_with_calls(calls: Vec<ToolCall>) -> ChatState {
        let mut state = ChatState::seeded("task");
        state.apply(ChatDelta {
            messages: vec![ChatMessage::assistant_with_tool_calls("", calls)],
            completed: None,
        });
        state
    }

    #[tokio::test]
    async fn dispatches_in_order_and_absorbs_misses() {
        let state = state_with_calls(vec![
            call("a", "echo", r#"{"text":"hi"}"#),
            call("b", "get_moon_phase", "{}"),
        ]);

        let (delta, next) = node().run(&state, &RunContext::new()).await.unwrap();
        assert_eq!(next, Next::node("model"));
        assert_eq!(delta.completed, None);
        assert_eq!(delta.messages.len(), 2);
        assert_eq!(delta.messages[0].tool_call_id.as_deref(), Some("a"));
        assert_eq!(delta.messages[0].content, "hi");
        assert_eq!(delta.messages[1].tool_call_id.as_deref(), Some("b"));
        assert_eq!(delta.messages[1].content, "Tool get_moon_phase not found");
    }

    #[tokio::test]
    async fn sentinel_completes_and_ends() {
        let state = state_with_calls(vec![call("a", PLAN_COMPLETE, "{}")]);

        let (delta, next) = node().run(&state, &RunContext::new()).await.unwrap();
        assert_eq!(next, Next::End);
        assert_eq!(delta.completed, Some(true));
        assert_eq!(delta.messages[0].content, "Plan execution completed successfully");
    }

    #[tokio::test]
    async fn sentinel_among_other_calls_still_ends() {
        let state = state_with_calls(vec![
            call("a", "echo", r#"{"text":"done"}"#),
            call("b", PLAN_COMPLETE, "{}"),
        ]);

        let (delta, next) = node().run(&state, &RunContext::new()).await.unwrap();
        assert_eq!(next, Next::End);
        assert_eq!(delta.completed, Some(true));
        assert_eq!(delta.messages.len(), 2);
    }

    #[tokio::test]
    async fn malformed_arguments_become_a_failure_result() {
        let state = state_with_calls(vec![call("a", "echo", "{not json")]);

        let (delta, next) = node().run(&state, &RunContext::new()).await.unwrap();
        assert_eq!(next, Next::node("model"));
        assert!(delta.messages[0].content.starts_with("Tool echo failed: invalid arguments"));
    }

    #[tokio::test]
    async fn rejects_a_turn_without_calls() {
        let mut state = ChatState::seeded("task");
        state.apply(ChatDelta {
            messages: vec![ChatMessage::assistant("no calls here")],
            completed: None,
        });

        let err = node().run(&state, &RunContext::new()).await.unwrap_err();
        assert!(matches!(err, EngineError::ContractViolation(_)));
    }
}
