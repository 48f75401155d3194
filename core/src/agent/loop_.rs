use std::collections::HashMap;
use std::sync::Arc;

use crate::agent::{ChatState, ModelNode, StepRecord, ToolNode, ToolRegistry};
use crate::error::EngineError;
use crate::graph::{Next, RunContext, StateGraph, StopReason};
use crate::traits::{ChatMessage, Provider};

const DEFAULT_MAX_TURNS: usize = 20;

/// Placeholder result for a call whose tool message never arrived.
const NO_RESULT: &str = "(no result recorded)";

/// How a function-calling run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The model stopped requesting tools (or the turn budget ran out).
    Continuing,
    /// The plan-complete sentinel ran.
    Completed,
}

/// Everything a finished function-calling run hands back: the distilled step
/// records, the typed outcome, and the raw transcript.
pub struct StepRun {
    pub records: Vec<StepRecord>,
    pub outcome: StepOutcome,
    pub transcript: Vec<ChatMessage>,
}

/// The function-calling loop: model turn, tool dispatch, repeat.
///
/// Each [`AgentLoop::run`] call is self-contained. State is seeded from the
/// task text alone and dropped when the run returns, so the same loop can
/// serve many tasks.
pub struct AgentLoop {
    provider: Arc<dyn Provider>,
    registry: Arc<ToolRegistry>,
    max_turns: usize,
}

impl AgentLoop {
    pub fn new(provider: Arc<dyn Provider>, registry: Arc<ToolRegistry>) -> Self {
        Self {
            provider,
            registry,
            max_turns: DEFAULT_MAX_TURNS,
        }
    }

    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns;
        self
    }

    /// Drives the conversation until the model answers without tool calls,
    /// the plan-complete sentinel runs, or the turn budget is spent.
    pub async fn run(&self, task: &str, ctx: &RunContext) -> Result<StepRun, EngineError> {
        let graph = StateGraph::new()
            .add_node(Box::new(ModelNode::new(
                self.provider.clone(),
                self.registry.specs(),
            )))
            .add_node(Box::new(ToolNode::new(self.registry.clone())))
            .set_entry("model")
            .add_conditional_edge("model", route_tools)
            .with_max_steps(self.max_turns.saturating_mul(2))
            .compile()?;

        let run = graph.run(ChatState::seeded(task), ctx).await?;
        if run.stop == StopReason::BudgetExhausted {
            tracing::warn!(max_turns = self.max_turns, "conversation hit its turn budget");
        }

        let outcome = if run.state.completed {
            StepOutcome::Completed
        } else {
            StepOutcome::Continuing
        };

        Ok(StepRun {
            records: distill(&run.state.messages),
            outcome,
            transcript: run.state.messages,
        })
    }
}

/// After a model turn: dispatch its tool calls, or end when it answered in
/// plain text.
fn route_tools(state: &ChatState) -> Next {
    match state.last_message() {
        Some(m) if m.role == "assistant" && !m.requested_tools().is_empty() => Next::node("tools"),
        _ => Next::End,
    }
}

/// Folds a finished transcript into step records: one record per assistant
/// turn that issued tool calls, each call joined to its tool message by
/// correlation id. Plain text turns produce no record.
fn distill(messages: &[ChatMessage]) -> Vec<StepRecord> {
    let results: HashMap<&str, &str> = messages
        .iter()
        .filter(|m| m.role == "tool")
        .filter_map(|m| m.tool_call_id.as_deref().map(|id| (id, m.content.as_str())))
        .collect();

    messages
        .iter()
        .filter(|m| m.role == "assistant")
        .filter_map(|m| {
            let calls = m.requested_tools();
            if calls.is_empty() {
                return None;
            }
            let outputs = calls
                .iter()
                .map(|c| {
                    results
                        .get(c.id.as_str())
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| NO_RESULT.to_string())
                })
                .collect();
            Some(StepRecord {
                calls: calls.to_vec(),
                results: outputs,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::MockProvider;
    use crate::tools::{GeoCoordinatesTool, PlanCompleteTool, WeatherForecastTool};
    use crate::traits::ToolCall;
    use serde_json::json;

    fn call(id: &str, name: &str, arguments: &str) -> ToolCall {
        ToolCall {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    fn demo_registry() -> Arc<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(GeoCoordinatesTool::new("")));
        registry.register(Arc::new(WeatherForecastTool::new("")));
        registry.register(Arc::new(PlanCompleteTool));
        Arc::new(registry)
    }

    #[tokio::test]
    async fn plain_answer_ends_without_records() {
        let provider = Arc::new(MockProvider::new().script_text("Paris is sunny today."));
        let agent = AgentLoop::new(provider, demo_registry());

        let run = agent
            .run("What is the weather in Paris?", &RunContext::new())
            .await
            .unwrap();
        assert!(run.records.is_empty());
        assert_eq!(run.outcome, StepOutcome::Continuing);
        assert_eq!(run.transcript.len(), 2);
        assert_eq!(run.transcript[1].content, "Paris is sunny today.");
    }

    #[tokio::test]
    async fn unknown_tool_is_absorbed_and_loop_continues() {
        let provider = Arc::new(
            MockProvider::new()
                .script_calls(vec![("get_moon_phase", json!({}))])
                .script_text("I cannot determine the moon phase."),
        );
        let agent = AgentLoop::new(provider, demo_registry());

        let run = agent
            .run("Moon phase tonight?", &RunContext::new())
            .await
            .unwrap();
        assert_eq!(run.records.len(), 1);
        assert_eq!(run.records[0].results, vec!["Tool get_moon_phase not found"]);
        assert_eq!(run.outcome, StepOutcome::Continuing);
    }

    #[tokio::test]
    async fn chained_calls_feed_results_forward() {
        let provider = Arc::new(
            MockProvider::new()
                .script_calls(vec![(
                    "get_geo_coordinates",
                    json!({"city_name": "San Francisco", "state_code": "CA", "country": "US"}),
                )])
                .script_calls(vec![(
                    "get_weather_forecast",
                    json!({"lat": 37.7790262, "lon": -122.419906}),
                )])
                .script_text("Forecast retrieved."),
        );
        let agent = AgentLoop::new(provider, demo_registry());

        let run = agent
            .run("Forecast for San Francisco", &RunContext::new())
            .await
            .unwrap();
        // user, assistant, tool, assistant, tool, assistant
        assert_eq!(run.transcript.len(), 6);
        assert_eq!(run.records.len(), 2);
        assert!(run.records[0].results[0].contains("37.7790262"));

        let forecast_args: serde_json::Value =
            serde_json::from_str(&run.records[1].calls[0].arguments).unwrap();
        assert_eq!(forecast_args["lat"], json!(37.7790262));
        assert!(run.records[1].results[0].contains("2025-10-04 12:00:00"));
    }

    #[tokio::test]
    async fn sentinel_call_completes_the_run() {
        let provider =
            Arc::new(MockProvider::new().script_calls(vec![("plan_complete", json!({}))]));
        let agent = AgentLoop::new(provider, demo_registry());

        let run = agent.run("1. plan_complete", &RunContext::new()).await.unwrap();
        assert_eq!(run.outcome, StepOutcome::Completed);
        assert_eq!(run.records.len(), 1);
        assert_eq!(run.records[0].calls[0].name, "plan_complete");
        assert_eq!(
            run.records[0].results,
            vec!["Plan execution completed successfully"]
        );
    }

    #[tokio::test]
    async fn turn_budget_stops_a_looping_model() {
        let provider = Arc::new(
            MockProvider::new()
                .script_calls(vec![("get_geo_coordinates", json!({"city_name": "Paris"}))])
                .script_calls(vec![("get_geo_coordinates", json!({"city_name": "Paris"}))])
                .script_calls(vec![("get_geo_coordinates", json!({"city_name": "Paris"}))]),
        );
        let agent = AgentLoop::new(provider, demo_registry()).with_max_turns(2);

        let run = agent
            .run("Coordinates of Paris", &RunContext::new())
            .await
            .unwrap();
        assert_eq!(run.outcome, StepOutcome::Continuing);
        assert_eq!(run.records.len(), 2);
    }

    #[test]
    fn distill_joins_results_by_id_not_position() {
        let messages = vec![
            ChatMessage::user("task"),
            ChatMessage::assistant_with_tool_calls(
                "",
                vec![call("a", "first", "{}"), call("b", "second", "{}")],
            ),
            // results recorded in reverse order
            ChatMessage::tool_result("b".into(), "result-b"),
            ChatMessage::tool_result("a".into(), "result-a"),
        ];

        let records = distill(&messages);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].results, vec!["result-a", "result-b"]);
    }

    #[test]
    fn distill_marks_missing_results() {
        let messages = vec![
            ChatMessage::user("task"),
            ChatMessage::assistant_with_tool_calls("", vec![call("a", "first", "{}")]),
        ];

        let records = distill(&messages);
        assert_eq!(records[0].results, vec![NO_RESULT]);
    }

    #[test]
    fn distill_skips_plain_text_turns() {
        let messages = vec![
            ChatMessage::user("task"),
            ChatMessage::assistant("thinking out loud"),
            ChatMessage::assistant_with_tool_calls("", vec![call("a", "first", "{}")]),
            ChatMessage::tool_result("a".into(), "done"),
            ChatMessage::assistant("all done"),
        ];

        let records = distill(&messages);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].calls[0].name, "first");
    }
}
