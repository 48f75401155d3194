use std::collections::HashMap;

use tokio_util::sync::CancellationToken;

use crate::error::EngineError;
use crate::graph::{GraphState, Next, Node};

/// Step budget applied when a graph does not set its own.
const DEFAULT_MAX_STEPS: usize = 20;

/// Per-run context handed to every node.
pub struct RunContext {
    pub cancel: CancellationToken,
}

impl RunContext {
    pub fn new() -> Self {
        Self {
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancel(cancel: CancellationToken) -> Self {
        Self { cancel }
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Why a run returned without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// A node or router ended the graph.
    GraphEnd,
    /// The step budget ran out first. The state is still valid, just
    /// unfinished.
    BudgetExhausted,
}

/// Final state of a finished run plus how and after how many node
/// executions it stopped.
#[derive(Debug)]
pub struct GraphRun<S> {
    pub state: S,
    pub stop: StopReason,
    pub steps: usize,
}

type Router<S> = Box<dyn Fn(&S) -> Next + Send + Sync>;

enum Edge<S> {
    Direct(String),
    Conditional(Router<S>),
}

/// Builder for a node graph. Call [`StateGraph::compile`] to validate the
/// wiring and obtain a runnable graph.
pub struct StateGraph<S: GraphState> {
    nodes: HashMap<String, Box<dyn Node<S>>>,
    edges: HashMap<String, Edge<S>>,
    entry: Option<String>,
    max_steps: usize,
}

impl<S: GraphState> StateGraph<S> {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            edges: HashMap::new(),
            entry: None,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    /// Registers a node under its own id. A second node with the same id
    /// replaces the first.
    pub fn add_node(mut self, node: Box<dyn Node<S>>) -> Self {
        self.nodes.insert(node.id().to_string(), node);
        self
    }

    pub fn set_entry(mut self, id: impl Into<String>) -> Self {
        self.entry = Some(id.into());
        self
    }

    /// Declares that `from` always hands off to `to` when it returns
    /// [`Next::Continue`].
    pub fn add_edge(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.edges.insert(from.into(), Edge::Direct(to.into()));
        self
    }

    /// Declares a routing function consulted when `from` returns
    /// [`Next::Continue`]. The router picks the next node or ends the run;
    /// a router returning `Continue` ends the run since there is no further
    /// edge to follow.
    pub fn add_conditional_edge(
        mut self,
        from: impl Into<String>,
        router: impl Fn(&S) -> Next + Send + Sync + 'static,
    ) -> Self {
        self.edges.insert(from.into(), Edge::Conditional(Box::new(router)));
        self
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Validates the wiring: the entry and every statically declared edge
    /// endpoint must name a registered node. Targets chosen dynamically by
    /// routers or by nodes via [`Next::Node`] are checked at run time.
    pub fn compile(self) -> Result<CompiledGraph<S>, EngineError> {
        let entry = self.entry.ok_or(EngineError::EmptyGraph)?;
        if !self.nodes.contains_key(&entry) {
            return Err(EngineError::UnknownNode(entry));
        }
        for (from, edge) in &self.edges {
            if !self.nodes.contains_key(from) {
                return Err(EngineError::UnknownNode(from.clone()));
            }
            if let Edge::Direct(to) = edge
                && !self.nodes.contains_key(to)
            {
                return Err(EngineError::UnknownNode(to.clone()));
            }
        }

        Ok(CompiledGraph {
            nodes: self.nodes,
            edges: self.edges,
            entry,
            max_steps: self.max_steps,
        })
    }
}

impl<S: GraphState> Default for StateGraph<S> {
    fn default() -> Self {
        Self::new()
    }
}

pub struct CompiledGraph<S: GraphState> {
    nodes: HashMap<String, Box<dyn Node<S>>>,
    edges: HashMap<String, Edge<S>>,
    entry: String,
    max_steps: usize,
}

impl<S: GraphState> CompiledGraph<S> {
    /// Drives the graph from the entry node until something ends it: a node
    /// or router returning [`Next::End`], a node with no outgoing edge, the
    /// step budget, or cancellation.
    ///
    /// Cancellation is checked between node runs, so a cancelled token stops
    /// the run before the next node starts.
    pub async fn run(&self, mut state: S, ctx: &RunContext) -> Result<GraphRun<S>, EngineError> {
        let mut current = self.entry.clone();
        let mut steps = 0usize;

        loop {
            if ctx.cancel.is_cancelled() {
                return Err(EngineError::Cancelled);
            }
            if steps >= self.max_steps {
                tracing::warn!(steps, "step budget exhausted before the graph ended");
                return Ok(GraphRun {
                    state,
                    stop: StopReason::BudgetExhausted,
                    steps,
                });
            }

            let node = self
                .nodes
                .get(&current)
                .ok_or_else(|| EngineError::UnknownNode(current.clone()))?;

            tracing::debug!(node = %current, step = steps, "running node");
            let (delta, next) = node.run(&state, ctx).await?;
            state.apply(delta);
            steps += 1;

            let routed = match next {
                Next::Continue => self.follow_edge(&current, &state),
                decided => decided,
            };

            match routed {
                Next::Node(id) => current = id,
                _ => {
                    return Ok(GraphRun {
                        state,
                        stop: StopReason::GraphEnd,
                        steps,
                    });
                }
            }
        }
    }

    fn follow_edge(&self, from: &str, state: &S) -> Next {
        match self.edges.get(from) {
            Some(Edge::Direct(to)) => Next::Node(to.clone()),
            Some(Edge::Conditional(router)) => router(state),
            None => Next::End,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    #[derive(Debug)]
    struct Trace {
        visited: Vec<String>,
    }

    impl GraphState for Trace {
        type Delta = Vec<String>;

        fn apply(&mut self, delta: Vec<String>) {
            self.visited.extend(delta);
        }
    }

    struct Stub {
        id: &'static str,
        next: Next,
    }

    impl Stub {
        fn new(id: &'static str, next: Next) -> Box<Self> {
            Box::new(Self { id, next })
        }
    }

    #[async_trait]
    impl Node<Trace> for Stub {
        fn id(&self) -> &str {
            self.id
        }

        async fn run(&self, _state: &Trace, _ctx: &RunContext) -> Result<(Vec<String>, Next), EngineError> {
            Ok((vec![self.id.to_string()], self.next.clone()))
        }
    }

    struct CancelSelf {
        id: &'static str,
    }

    #[async_trait]
    impl Node<Trace> for CancelSelf {
        fn id(&self) -> &str {
            self.id
        }

        async fn run(&self, _state: &Trace, ctx: &RunContext) -> Result<(Vec<String>, Next), EngineError> {
            ctx.cancel.cancel();
            Ok((vec![self.id.to_string()], Next::Continue))
        }
    }

    fn empty() -> Trace {
        Trace { visited: vec![] }
    }

    #[test]
    fn compile_requires_entry() {
        let graph: StateGraph<Trace> = StateGraph::new().add_node(Stub::new("a", Next::End));
        assert!(matches!(graph.compile(), Err(EngineError::EmptyGraph)));
    }

    #[test]
    fn compile_rejects_unknown_entry() {
        let graph: StateGraph<Trace> = StateGraph::new()
            .add_node(Stub::new("a", Next::End))
            .set_entry("missing");
        assert!(matches!(graph.compile(), Err(EngineError::UnknownNode(id)) if id == "missing"));
    }

    #[test]
    fn compile_rejects_dangling_edge() {
        let graph: StateGraph<Trace> = StateGraph::new()
            .add_node(Stub::new("a", Next::Continue))
            .set_entry("a")
            .add_edge("a", "b");
        assert!(matches!(graph.compile(), Err(EngineError::UnknownNode(id)) if id == "b"));
    }

    #[tokio::test]
    async fn follows_direct_edges_and_applies_deltas() {
        let graph = StateGraph::new()
            .add_node(Stub::new("a", Next::Continue))
            .add_node(Stub::new("b", Next::End))
            .set_entry("a")
            .add_edge("a", "b")
            .compile()
            .unwrap();

        let run = graph.run(empty(), &RunContext::new()).await.unwrap();
        assert_eq!(run.state.visited, vec!["a", "b"]);
        assert_eq!(run.stop, StopReason::GraphEnd);
        assert_eq!(run.steps, 2);
    }

    #[tokio::test]
    async fn node_jump_overrides_declared_edge() {
        let graph = StateGraph::new()
            .add_node(Stub::new("a", Next::node("c")))
            .add_node(Stub::new("b", Next::End))
            .add_node(Stub::new("c", Next::End))
            .set_entry("a")
            .add_edge("a", "b")
            .compile()
            .unwrap();

        let run = graph.run(empty(), &RunContext::new()).await.unwrap();
        assert_eq!(run.state.visited, vec!["a", "c"]);
    }

    #[tokio::test]
    async fn conditional_edge_routes_on_state() {
        let graph = StateGraph::new()
            .add_node(Stub::new("a", Next::Continue))
            .add_node(Stub::new("b", Next::End))
            .set_entry("a")
            .add_conditional_edge("a", |state: &Trace| {
                if state.visited.len() < 3 {
                    Next::node("a")
                } else {
                    Next::node("b")
                }
            })
            .compile()
            .unwrap();

        let run = graph.run(empty(), &RunContext::new()).await.unwrap();
        assert_eq!(run.state.visited, vec!["a", "a", "a", "b"]);
    }

    #[tokio::test]
    async fn node_without_edge_ends_the_run() {
        let graph = StateGraph::new()
            .add_node(Stub::new("a", Next::Continue))
            .set_entry("a")
            .compile()
            .unwrap();

        let run = graph.run(empty(), &RunContext::new()).await.unwrap();
        assert_eq!(run.stop, StopReason::GraphEnd);
        assert_eq!(run.steps, 1);
    }

    #[tokio::test]
    async fn budget_stops_a_cycle() {
        let graph = StateGraph::new()
            .add_node(Stub::new("a", Next::Continue))
            .set_entry("a")
            .add_edge("a", "a")
            .with_max_steps(5)
            .compile()
            .unwrap();

        let run = graph.run(empty(), &RunContext::new()).await.unwrap();
        assert_eq!(run.stop, StopReason::BudgetExhausted);
        assert_eq!(run.steps, 5);
        assert_eq!(run.state.visited.len(), 5);
    }

    #[tokio::test]
    async fn runtime_jump_to_unknown_node_fails() {
        let graph = StateGraph::new()
            .add_node(Stub::new("a", Next::node("ghost")))
            .set_entry("a")
            .compile()
            .unwrap();

        let err = graph.run(empty(), &RunContext::new()).await.unwrap_err();
        assert!(matches!(err, EngineError::UnknownNode(id) if id == "ghost"));
    }

    #[tokio::test]
    async fn cancelled_token_stops_before_first_node() {
        let graph = StateGraph::new()
            .add_node(Stub::new("a", Next::End))
            .set_entry("a")
            .compile()
            .unwrap();

        let ctx = RunContext::new();
        ctx.cancel.cancel();
        let err = graph.run(empty(), &ctx).await.unwrap_err();
        assert!(matches!(err, EngineError::Cancelled));
    }

    #[tokio::test]
    async fn cancellation_mid_run_stops_the_next_step() {
        let graph = StateGraph::new()
            .add_node(Box::new(CancelSelf { id: "a" }))
            .set_entry("a")
            .add_edge("a", "a")
            .compile()
            .unwrap();

        let err = graph.run(empty(), &RunContext::new()).await.unwrap_err();
        assert!(matches!(err, EngineError::Cancelled));
    }
}
