use std::sync::Arc;

use async_trait::async_trait;

use crate::agent::{ChatDelta, ChatState};
use crate::error::EngineError;
use crate::graph::{Next, Node, RunContext};
use crate::traits::{ChatRequest, Provider, ToolSpec};

/// Hands the conversation to the model with the tool catalog attached and
/// appends whatever the model replies.
pub struct ModelNode {
    provider: Arc<dyn Provider>,
    specs: Vec<ToolSpec>,
}

impl ModelNode {
    pub fn new(provider: Arc<dyn Provider>, specs: Vec<ToolSpec>) -> Self {
        Self { provider, specs }
    }
}

#[async_trait]
impl Node<ChatState> for ModelNode {
    fn id(&self) -> &str {
        "model"
    }

    async fn run(
        &self,
        state: &ChatState,
        _ctx: &RunContext,
    ) -> Result<(ChatDelta, Next), EngineError> {
        if state.messages.is_empty() {
            return Err(EngineError::ContractViolation(
                "model node invoked with an empty conversation".into(),
            ));
        }

        let request = ChatRequest {
            messages: &state.messages,
            tools: (!self.specs.is_empty()).then_some(self.specs.as_slice()),
        };
        let response = self
            .provider
            .chat(request)
            .await
            .map_err(|e| EngineError::backend("model", e))?;

        tracing::debug!(tool_calls = response.tool_calls.len(), "model replied");

        Ok((
            ChatDelta {
                messages: vec![response.into_message()],
                completed: None,
            },
            Next::Continue,
        ))
    }
}
