use serde::{Deserialize, Serialize};
use serde_json::json;

/// Ordered list of natural-language step descriptions.
///
/// Step order is execution order. The planner and replanner both emit this
/// shape as structured model output; the executor renders it as a numbered
/// task for the function-calling loop.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub steps: Vec<String>,
}

impl Plan {
    pub fn new(steps: Vec<String>) -> Self {
        Self { steps }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Renders the plan as a numbered list, one step per line.
    pub fn render_numbered(&self) -> String {
        self.steps
            .iter()
            .enumerate()
            .map(|(i, step)| format!("{}. {}", i + 1, step))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Parses numbered text back into a plan. Blank lines are dropped and a
    /// leading `N. ` index is stripped; anything else is kept verbatim.
    pub fn parse_numbered(text: &str) -> Self {
        let steps = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| strip_index(line).to_string())
            .collect();
        Self { steps }
    }

    /// JSON schema the structured planning calls are constrained to.
    pub fn schema() -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "steps": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "plan steps to be executed in sorted order"
                }
            },
            "required": ["steps"],
            "additionalProperties": false
        })
    }
}

fn strip_index(line: &str) -> &str {
    let rest = line.trim_start_matches(|c: char| c.is_ascii_digit());
    if rest.len() < line.len()
        && let Some(step) = rest.strip_prefix(". ")
    {
        step
    } else {
        line
    }
}
