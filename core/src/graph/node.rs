use async_trait::async_trait;

use crate::error::EngineError;
use crate::graph::{GraphState, RunContext};

/// Routing decision returned by a node alongside its delta.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Next {
    /// Follow whatever edge is declared for the current node.
    Continue,
    /// Jump straight to the named node, overriding declared edges.
    Node(String),
    /// Stop the run and hand back the state.
    End,
}

impl Next {
    pub fn node(id: impl Into<String>) -> Self {
        Next::Node(id.into())
    }
}

/// A unit of work in a graph.
///
/// Nodes read the state, do their work, and report a delta plus where to go
/// next. Returning an error aborts the whole run.
#[async_trait]
pub trait Node<S: GraphState>: Send + Sync {
    /// Stable identifier used for wiring edges and for error reporting.
    fn id(&self) -> &str;

    async fn run(&self, state: &S, ctx: &RunContext) -> Result<(S::Delta, Next), EngineError>;
}
