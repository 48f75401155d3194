use crate::traits::{Tool, ToolResult};
use async_trait::async_trait;
use serde_json::json;

/// Name the tool-dispatch node watches for to end a run.
pub const PLAN_COMPLETE: &str = "plan_complete";

/// Sentinel the model calls once every step of the plan has been
/// executed. Carries no arguments and always succeeds.
pub struct PlanCompleteTool;

#[async_trait]
impl Tool for PlanCompleteTool {
    fn name(&self) -> &str {
        PLAN_COMPLETE
    }

    fn description(&self) -> &str {
        "Call this tool once every step of the plan has been executed and no work remains."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(&self, _args: serde_json::Value) -> anyhow::Result<ToolResult> {
        tracing::info!("plan complete tool called");
        Ok(ToolResult::success("Plan execution completed successfully"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn always_succeeds() {
        let tool = PlanCompleteTool;
        let result = tool.execute(json!({})).await.unwrap();
        assert!(result.success);
        assert_eq!(result.content(), "Plan execution completed successfully");
    }

    #[test]
    fn name_matches_the_dispatch_sentinel() {
        assert_eq!(PlanCompleteTool.name(), PLAN_COMPLETE);
    }
}
