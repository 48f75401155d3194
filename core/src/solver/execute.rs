use async_trait::async_trait;

use crate::agent::{AgentLoop, StepOutcome};
use crate::error::EngineError;
use crate::graph::{Next, Node, RunContext};
use crate::solver::prompts::execute_task;
use crate::solver::{SolveDelta, SolveState};

/// Hands the current plan to the function-calling loop as a single task and
/// folds what it did back into the outer state.
pub struct ExecuteNode {
    agent: AgentLoop,
}

impl ExecuteNode {
    pub fn new(agent: AgentLoop) -> Self {
        Self { agent }
    }
}

#[async_trait]
impl Node<SolveState> for ExecuteNode {
    fn id(&self) -> &str {
        "execute"
    }

    async fn run(
        &self,
        state: &SolveState,
        ctx: &RunContext,
    ) -> Result<(SolveDelta, Next), EngineError> {
        if state.plan.is_empty() {
            return Err(EngineError::ContractViolation(
                "execute node invoked with an empty plan".to_string(),
            ));
        }

        let task = execute_task(&state.plan);
        let run = self.agent.run(&task, ctx).await?;
        let completed = run.outcome == StepOutcome::Completed;
        tracing::info!(records = run.records.len(), completed, "execution round finished");

        Ok((
            SolveDelta {
                records: run.records,
                completed: Some(completed),
                ..Default::default()
            },
            Next::Continue,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::ToolRegistry;
    use crate::providers::MockProvider;
    use crate::solver::Plan;
    use crate::tools::PlanCompleteTool;
    use serde_json::json;
    use std::sync::Arc;

    fn registry() -> Arc<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(PlanCompleteTool));
        Arc::new(registry)
    }

    fn planned_state(steps: &[&str]) -> SolveState {
        let mut state = SolveState::new("objective");
        state.plan = Plan::new(steps.iter().map(|s| s.to_string()).collect());
        state
    }

    #[tokio::test]
    async fn empty_plan_fails_fast() {
        let provider = Arc::new(MockProvider::new());
        let node = ExecuteNode::new(AgentLoop::new(provider, registry()));

        let err = node
            .run(&SolveState::new("objective"), &RunContext::new())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::ContractViolation(_)));
    }

    #[tokio::test]
    async fn sentinel_round_reports_completion() {
        let provider =
            Arc::new(MockProvider::new().script_calls(vec![("plan_complete", json!({}))]));
        let node = ExecuteNode::new(AgentLoop::new(provider, registry()));

        let (delta, next) = node
            .run(&planned_state(&["call plan_complete"]), &RunContext::new())
            .await
            .unwrap();

        assert_eq!(next, Next::Continue);
        assert_eq!(delta.completed, Some(true));
        assert_eq!(delta.records.len(), 1);
        assert_eq!(delta.records[0].calls[0].name, "plan_complete");
    }

    #[tokio::test]
    async fn a_plain_reply_yields_no_records_and_no_completion() {
        let provider = Arc::new(MockProvider::new().script_text("Nothing to call."));
        let node = ExecuteNode::new(AgentLoop::new(provider, registry()));

        let (delta, _) = node
            .run(&planned_state(&["some step"]), &RunContext::new())
            .await
            .unwrap();

        assert_eq!(delta.completed, Some(false));
        assert!(delta.records.is_empty());
    }
}
