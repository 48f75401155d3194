pub mod agent;
pub mod config;
pub mod error;
pub mod graph;
pub mod providers;
pub mod solver;
pub mod tools;
pub mod traits;

pub use agent::{AgentLoop, StepOutcome, StepRun, ToolRegistry};
pub use config::*;
pub use error::EngineError;
pub use graph::{Next, Node, RunContext, StateGraph, StopReason};
pub use providers::*;
pub use solver::{Plan, PlanSolver, SolveReport};
pub use tools::*;
pub use traits::*;
