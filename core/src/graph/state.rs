/// Shared state threaded through a graph run.
///
/// Nodes never touch the state directly. Each node returns a `Delta` and the
/// runner folds it in with [`GraphState::apply`] after the node finishes, so
/// every field carries its own merge rule: conversation history appends,
/// a plan is replaced wholesale, step records accumulate, completion flags
/// are last-write-wins.
pub trait GraphState: Send + 'static {
    /// Partial update produced by a single node run.
    type Delta: Send;

    /// Folds one delta into the state.
    fn apply(&mut self, delta: Self::Delta);
}
