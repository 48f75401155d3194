//! The outer plan-solve loop: a planner drafts an ordered step list, an
//! execution round drives the function-calling loop over it, and a replanner
//! rewrites the remainder until nothing is left to do.

pub mod execute;
pub mod loop_;
pub mod plan;
pub mod planner;
pub mod prompts;
pub mod state;

pub use execute::ExecuteNode;
pub use loop_::{PlanSolver, SolveReport};
pub use plan::Plan;
pub use planner::{PlannerNode, ReplannerNode};
pub use state::{SolveDelta, SolveState};
