use crate::traits::{Tool, ToolResult, ToolSpec};
use std::sync::Arc;

/// Fixed set of capabilities the model may invoke.
///
/// Registration happens once at startup; afterwards the registry is shared
/// read-only, so concurrent runs can dispatch against it freely.
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.push(tool);
    }

    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools.iter().map(|t| t.spec()).collect()
    }

    pub fn resolve(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name).cloned()
    }

    /// Runs the named tool. A registry miss or a failing tool comes back as
    /// an error result, never as a failure of the run itself.
    pub async fn dispatch(&self, name: &str, args: serde_json::Value) -> ToolResult {
        match self.resolve(name) {
            Some(tool) => match tool.execute(args).await {
                Ok(result) => result,
                Err(e) => ToolResult::error(format!("Tool {} failed: {}", name, e)),
            },
            None => ToolResult::error(format!("Tool {} not found", name)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    struct Upper;

    #[async_trait]
    impl Tool for Upper {
        fn name(&self) -> &str {
            "upper"
        }

        fn description(&self) -> &str {
            "Uppercases the given text"
        }

        fn parameters_schema(&self) -> serde_json::Value {
            json!({"type": "object", "properties": {"text": {"type": "string"}}})
        }

        async fn execute(&self, args: serde_json::Value) -> anyhow::Result<ToolResult> {
            let text = args["text"].as_str().unwrap_or_default();
            Ok(ToolResult::success(text.to_uppercase()))
        }
    }

    struct Faulty;

    #[async_trait]
    impl Tool for Faulty {
        fn name(&self) -> &str {
            "faulty"
        }

        fn description(&self) -> &str {
            "Always fails"
        }

        fn parameters_schema(&self) -> serde_json::Value {
            json!({"type": "object", "properties": {}})
        }

        async fn execute(&self, _args: serde_json::Value) -> anyhow::Result<ToolResult> {
            anyhow::bail!("boom")
        }
    }

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Upper));
        registry.register(Arc::new(Faulty));
        registry
    }

    #[tokio::test]
    async fn dispatch_runs_registered_tool() {
        let result = registry().dispatch("upper", json!({"text": "hi"})).await;
        assert!(result.success);
        assert_eq!(result.output, "HI");
    }

    #[tokio::test]
    async fn repeated_dispatch_yields_identical_content() {
        let registry = registry();
        let first = registry.dispatch("upper", json!({"text": "hi"})).await;
        let second = registry.dispatch("upper", json!({"text": "hi"})).await;
        assert_eq!(first.content(), second.content());
    }

    #[tokio::test]
    async fn dispatch_reports_missing_tool() {
        let result = registry().dispatch("get_moon_phase", json!({})).await;
        assert!(!result.success);
        assert_eq!(result.content(), "Tool get_moon_phase not found");
    }

    #[tokio::test]
    async fn dispatch_absorbs_tool_errors() {
        let result = registry().dispatch("faulty", json!({})).await;
        assert!(!result.success);
        assert!(result.content().contains("Tool faulty failed"));
        assert!(result.content().contains("boom"));
    }

    #[test]
    fn specs_cover_every_tool() {
        let specs = registry().specs();
        let names: Vec<&str> = specs.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["upper", "faulty"]);
    }
}
