pub mod loop_;
pub mod model_node;
pub mod registry;
pub mod state;
pub mod tool_node;

pub use loop_::{AgentLoop, StepOutcome, StepRun};
pub use model_node::ModelNode;
pub use registry::ToolRegistry;
pub use state::{ChatDelta, ChatState, StepRecord};
pub use tool_node::ToolNode;
