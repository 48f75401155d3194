use std::sync::Arc;

use crate::agent::{AgentLoop, StepRecord, ToolRegistry};
use crate::error::EngineError;
use crate::graph::{Next, RunContext, StateGraph, StopReason};
use crate::solver::prompts::render_past_steps;
use crate::solver::{ExecuteNode, Plan, PlannerNode, ReplannerNode, SolveState};
use crate::traits::{ChatMessage, ChatRequest, Provider};

const DEFAULT_MAX_ROUNDS: usize = 8;
const DEFAULT_MAX_TURNS: usize = 20;

/// What a finished plan-solve run hands back: whatever remains of the plan,
/// every step executed, and how the loop stopped.
#[derive(Debug)]
pub struct SolveReport {
    pub objective: String,
    pub plan: Plan,
    pub records: Vec<StepRecord>,
    pub completed: bool,
    pub stop: StopReason,
    /// Post-run summary of the records, present only when enabled.
    pub answer: Option<String>,
}

/// The outer loop: plan once, then execute and replan until the sentinel
/// fires, the plan runs dry, or the round budget is spent.
///
/// One round is an execute visit followed by a replan visit. Replanning runs
/// after every round regardless of the completion flag, so the final state
/// always reflects a reviewed plan.
pub struct PlanSolver {
    provider: Arc<dyn Provider>,
    registry: Arc<ToolRegistry>,
    max_rounds: usize,
    max_turns: usize,
    summarize: bool,
}

impl PlanSolver {
    pub fn new(provider: Arc<dyn Provider>, registry: Arc<ToolRegistry>) -> Self {
        Self {
            provider,
            registry,
            max_rounds: DEFAULT_MAX_ROUNDS,
            max_turns: DEFAULT_MAX_TURNS,
            summarize: false,
        }
    }

    /// Caps execute/replan rounds after the initial planning call.
    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    /// Caps model turns inside each execution round.
    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns;
        self
    }

    /// Adds a final model call that answers the objective from the recorded
    /// tool results.
    pub fn with_summary(mut self, summarize: bool) -> Self {
        self.summarize = summarize;
        self
    }

    pub async fn run(
        &self,
        objective: &str,
        ctx: &RunContext,
    ) -> Result<SolveReport, EngineError> {
        let specs = self.registry.specs();
        let agent = AgentLoop::new(self.provider.clone(), self.registry.clone())
            .with_max_turns(self.max_turns);

        let graph = StateGraph::new()
            .add_node(Box::new(PlannerNode::new(self.provider.clone(), &specs)))
            .add_node(Box::new(ExecuteNode::new(agent)))
            .add_node(Box::new(ReplannerNode::new(self.provider.clone(), &specs)))
            .set_entry("planner")
            .add_edge("planner", "execute")
            .add_edge("execute", "replan")
            .add_conditional_edge("replan", |state: &SolveState| {
                if state.completed || state.plan.is_empty() {
                    Next::End
                } else {
                    Next::node("execute")
                }
            })
            .with_max_steps(1 + self.max_rounds.saturating_mul(2))
            .compile()?;

        tracing::info!(objective, "starting plan-solve run");
        let run = graph.run(SolveState::new(objective), ctx).await?;
        if run.stop == StopReason::BudgetExhausted {
            tracing::warn!(
                rounds = self.max_rounds,
                "round budget exhausted before the plan completed"
            );
        }

        let state = run.state;
        let answer = if self.summarize && !state.records.is_empty() {
            Some(self.answer_from_records(&state).await?)
        } else {
            None
        };

        Ok(SolveReport {
            objective: state.objective,
            plan: state.plan,
            records: state.records,
            completed: state.completed,
            stop: run.stop,
            answer,
        })
    }

    async fn answer_from_records(&self, state: &SolveState) -> Result<String, EngineError> {
        let messages = vec![
            ChatMessage::system(
                "Answer the user's objective using only the recorded tool results below. \
                 Be concise and do not invent data.",
            ),
            ChatMessage::user(format!(
                "Objective: {}\n\nRecorded steps:\n{}",
                state.objective,
                render_past_steps(&state.records)
            )),
        ];
        let response = self
            .provider
            .chat(ChatRequest {
                messages: &messages,
                tools: None,
            })
            .await
            .map_err(|e| EngineError::backend("summary", e))?;
        Ok(response.text_or_empty().to_string())
    }
}
