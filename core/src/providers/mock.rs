use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::traits::{ChatMessage, ChatRequest, ChatResponse, Provider, ToolCall};

/// Scripted backend for tests and offline runs.
///
/// `chat` pops the next scripted reply and `chat_structured` the next
/// scripted plan, in the order they were queued. An exhausted script behaves
/// like a failing backend.
pub struct MockProvider {
    replies: Mutex<VecDeque<ChatResponse>>,
    plans: Mutex<VecDeque<serde_json::Value>>,
    chats: AtomicUsize,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            plans: Mutex::new(VecDeque::new()),
            chats: AtomicUsize::new(0),
        }
    }

    /// Queues a plain text reply.
    pub fn script_text(self, text: impl Into<String>) -> Self {
        self.replies.lock().unwrap().push_back(ChatResponse {
            text: Some(text.into()),
            tool_calls: vec![],
        });
        self
    }

    /// Queues an assistant turn requesting the given tool calls.
    pub fn script_calls(self, calls: Vec<(&str, serde_json::Value)>) -> Self {
        let tool_calls = calls
            .into_iter()
            .map(|(name, args)| ToolCall {
                id: format!("mock_{}", uuid::Uuid::new_v4()),
                name: name.to_string(),
                arguments: args.to_string(),
            })
            .collect();
        self.replies.lock().unwrap().push_back(ChatResponse {
            text: None,
            tool_calls,
        });
        self
    }

    /// Queues a structured planning reply with the given steps.
    pub fn script_plan(self, steps: &[&str]) -> Self {
        self.script_plan_value(serde_json::json!({ "steps": steps }))
    }

    /// Queues a raw structured reply, valid or not.
    pub fn script_plan_value(self, value: serde_json::Value) -> Self {
        self.plans.lock().unwrap().push_back(value);
        self
    }

    /// Number of `chat` calls served so far.
    pub fn chat_count(&self) -> usize {
        self.chats.load(Ordering::SeqCst)
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn chat(&self, _request: ChatRequest<'_>) -> anyhow::Result<ChatResponse> {
        self.chats.fetch_add(1, Ordering::SeqCst);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("mock chat script exhausted"))
    }

    async fn chat_structured(
        &self,
        _messages: &[ChatMessage],
        _schema: &serde_json::Value,
    ) -> anyhow::Result<serde_json::Value> {
        self.plans
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("mock plan script exhausted"))
    }
}
