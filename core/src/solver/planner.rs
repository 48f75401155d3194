use std::sync::Arc;

use async_trait::async_trait;

use crate::error::EngineError;
use crate::graph::{Next, Node, RunContext};
use crate::solver::prompts::{planner_prompt, render_catalog, render_past_steps, replanner_prompt, today};
use crate::solver::{Plan, SolveDelta, SolveState};
use crate::traits::{ChatMessage, Provider, ToolSpec};

/// Turns the bare objective into the initial plan.
pub struct PlannerNode {
    provider: Arc<dyn Provider>,
    catalog: String,
}

impl PlannerNode {
    pub fn new(provider: Arc<dyn Provider>, specs: &[ToolSpec]) -> Self {
        Self {
            provider,
            catalog: render_catalog(specs),
        }
    }
}

#[async_trait]
impl Node<SolveState> for PlannerNode {
    fn id(&self) -> &str {
        "planner"
    }

    async fn run(
        &self,
        state: &SolveState,
        _ctx: &RunContext,
    ) -> Result<(SolveDelta, Next), EngineError> {
        let messages = vec![
            ChatMessage::system(planner_prompt(&today(), &self.catalog)),
            ChatMessage::user(state.objective.clone()),
        ];
        let reply = self
            .provider
            .chat_structured(&messages, &Plan::schema())
            .await
            .map_err(|e| EngineError::backend("planner", e))?;
        let plan: Plan =
            serde_json::from_value(reply).map_err(|e| EngineError::malformed_plan("planner", e))?;
        tracing::info!(steps = plan.len(), "planner produced a plan");

        Ok((
            SolveDelta {
                plan: Some(plan),
                completed: Some(false),
                ..Default::default()
            },
            Next::Continue,
        ))
    }
}

/// Reviews progress after an execution round and replaces the plan with the
/// steps that still remain.
pub struct ReplannerNode {
    provider: Arc<dyn Provider>,
    catalog: String,
}

impl ReplannerNode {
    pub fn new(provider: Arc<dyn Provider>, specs: &[ToolSpec]) -> Self {
        Self {
            provider,
            catalog: render_catalog(specs),
        }
    }
}

#[async_trait]
impl Node<SolveState> for ReplannerNode {
    fn id(&self) -> &str {
        "replan"
    }

    async fn run(
        &self,
        state: &SolveState,
        _ctx: &RunContext,
    ) -> Result<(SolveDelta, Next), EngineError> {
        let prompt = replanner_prompt(
            &state.objective,
            &state.plan.render_numbered(),
            &render_past_steps(&state.records),
            &self.catalog,
        );
        let messages = vec![ChatMessage::system(prompt)];
        let reply = self
            .provider
            .chat_structured(&messages, &Plan::schema())
            .await
            .map_err(|e| EngineError::backend("replan", e))?;
        let plan: Plan =
            serde_json::from_value(reply).map_err(|e| EngineError::malformed_plan("replan", e))?;
        tracing::info!(remaining = plan.len(), "replanner revised the plan");

        Ok((
            SolveDelta {
                plan: Some(plan),
                ..Default::default()
            },
            Next::Continue,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::MockProvider;
    use serde_json::json;

    #[tokio::test]
    async fn planner_parses_the_structured_reply() {
        let provider = Arc::new(
            MockProvider::new().script_plan(&["get current weather for Paris", "call plan_complete"]),
        );
        let node = PlannerNode::new(provider, &[]);

        let (delta, next) = node
            .run(&SolveState::new("weather in Paris"), &RunContext::new())
            .await
            .unwrap();

        assert_eq!(next, Next::Continue);
        assert_eq!(delta.completed, Some(false));
        let plan = delta.plan.unwrap();
        assert_eq!(plan.steps[0], "get current weather for Paris");
        assert_eq!(plan.len(), 2);
    }

    #[tokio::test]
    async fn planner_rejects_a_malformed_reply() {
        let provider = Arc::new(MockProvider::new().script_plan_value(json!({"steps": "wrong"})));
        let node = PlannerNode::new(provider, &[]);

        let err = node
            .run(&SolveState::new("objective"), &RunContext::new())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::MalformedPlan { node, .. } if node == "planner"));
    }

    #[tokio::test]
    async fn planner_surfaces_backend_failures() {
        let provider = Arc::new(MockProvider::new());
        let node = PlannerNode::new(provider, &[]);

        let err = node
            .run(&SolveState::new("objective"), &RunContext::new())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Backend { node, .. } if node == "planner"));
    }

    #[tokio::test]
    async fn replanner_replaces_without_touching_completion() {
        let provider = Arc::new(MockProvider::new().script_plan(&["call plan_complete"]));
        let node = ReplannerNode::new(provider, &[]);

        let mut state = SolveState::new("weather in Paris");
        state.plan = Plan::new(vec!["get weather".into(), "call plan_complete".into()]);

        let (delta, next) = node.run(&state, &RunContext::new()).await.unwrap();

        assert_eq!(next, Next::Continue);
        assert_eq!(delta.completed, None);
        assert_eq!(delta.plan.unwrap().steps, vec!["call plan_complete"]);
    }
}
