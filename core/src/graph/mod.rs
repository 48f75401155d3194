//! Minimal state-machine runtime: named nodes, declared edges, and a shared
//! state folded forward through per-node deltas.

pub mod node;
pub mod runner;
pub mod state;

pub use node::{Next, Node};
pub use runner::{CompiledGraph, GraphRun, RunContext, StateGraph, StopReason};
pub use state::GraphState;
