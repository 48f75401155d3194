use thiserror::Error;

/// Errors that abort an orchestration run.
///
/// Tool-level failures never show up here. The tool node folds them into the
/// transcript as error results so the conversation can recover on its own.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The model backend was unreachable or rejected the call.
    #[error("backend call failed in '{node}': {reason}")]
    Backend { node: String, reason: String },

    /// A structured planning reply did not deserialize into a plan.
    #[error("malformed plan from '{node}': {reason}")]
    MalformedPlan { node: String, reason: String },

    /// A node ran against state that violates its precondition.
    #[error("contract violation: {0}")]
    ContractViolation(String),

    #[error("run cancelled")]
    Cancelled,

    #[error("graph references unknown node '{0}'")]
    UnknownNode(String),

    #[error("graph has no entry node")]
    EmptyGraph,
}

impl EngineError {
    pub fn backend(node: &str, err: impl std::fmt::Display) -> Self {
        Self::Backend {
            node: node.to_string(),
            reason: err.to_string(),
        }
    }

    pub fn malformed_plan(node: &str, err: impl std::fmt::Display) -> Self {
        Self::MalformedPlan {
            node: node.to_string(),
            reason: err.to_string(),
        }
    }
}
