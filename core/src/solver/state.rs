use crate::agent::StepRecord;
use crate::graph::GraphState;
use crate::solver::Plan;

/// Shared state of one plan-solve run.
pub struct SolveState {
    pub objective: String,
    /// Remaining steps. The replanner rewrites this every round.
    pub plan: Plan,
    /// Everything executed so far, across all rounds.
    pub records: Vec<StepRecord>,
    pub completed: bool,
}

impl SolveState {
    pub fn new(objective: impl Into<String>) -> Self {
        Self {
            objective: objective.into(),
            plan: Plan::default(),
            records: Vec::new(),
            completed: false,
        }
    }
}

/// Node output folded into [`SolveState`].
///
/// A fresh plan replaces the old one wholesale, records accumulate, and the
/// completion flag is last-write-wins.
#[derive(Debug, Default)]
pub struct SolveDelta {
    pub plan: Option<Plan>,
    pub records: Vec<StepRecord>,
    pub completed: Option<bool>,
}

impl GraphState for SolveState {
    type Delta = SolveDelta;

    fn apply(&mut self, delta: SolveDelta) {
        if let Some(plan) = delta.plan {
            self.plan = plan;
        }
        self.records.extend(delta.records);
        if let Some(done) = delta.completed {
            self.completed = done;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::ToolCall;

    fn record(name: &str) -> StepRecord {
        StepRecord {
            calls: vec![ToolCall {
                id: "1".into(),
                name: name.into(),
                arguments: "{}".into(),
            }],
            results: vec!["ok".into()],
        }
    }

    #[test]
    fn plan_replaces_while_records_accumulate() {
        let mut state = SolveState::new("compare forecasts");
        state.apply(SolveDelta {
            plan: Some(Plan::new(vec!["a".into(), "b".into()])),
            records: vec![record("get_current_weather")],
            completed: Some(false),
        });
        state.apply(SolveDelta {
            plan: Some(Plan::new(vec!["b".into()])),
            records: vec![record("plan_complete")],
            completed: Some(true),
        });

        assert_eq!(state.plan.steps, vec!["b"]);
        assert_eq!(state.records.len(), 2);
        assert!(state.completed);
    }

    #[test]
    fn an_empty_delta_changes_nothing() {
        let mut state = SolveState::new("objective");
        state.plan = Plan::new(vec!["a".into()]);
        state.completed = true;

        state.apply(SolveDelta::default());

        assert_eq!(state.plan.len(), 1);
        assert!(state.records.is_empty());
        assert!(state.completed);
    }
}
