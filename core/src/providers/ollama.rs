use crate::traits::{ChatMessage, ChatRequest, ChatResponse, Provider, ToolCall, ToolSpec};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<OllamaTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
    /// JSON schema for structured replies.
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<serde_json::Value>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct OllamaMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OllamaToolCallRequest>>,
}

#[derive(Debug, Serialize)]
struct OllamaToolCallRequest {
    function: OllamaFunctionRequest,
}

#[derive(Debug, Serialize)]
struct OllamaFunctionRequest {
    name: String,
    arguments: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct OllamaTool {
    r#type: String,
    function: OllamaToolFunction,
}

#[derive(Debug, Serialize)]
struct OllamaToolFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    message: OllamaResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OllamaResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<OllamaToolCallResponse>>,
    #[serde(default)]
    thinking: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OllamaToolCallResponse {
    function: OllamaFunctionResponse,
}

#[derive(Debug, Deserialize)]
struct OllamaFunctionResponse {
    name: String,
    arguments: serde_json::Value,
}

pub struct OllamaProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
    temperature: f64,
}

impl OllamaProvider {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(300))
            .connect_timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: "http://localhost:11434".to_string(),
            model: "llama3.2".to_string(),
            temperature: 0.0,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let url = base_url.into();
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    /// Local models handle tool output best as user text, so tool messages
    /// are folded into a tagged user message before the next model turn.
    fn convert_messages(&self, messages: &[ChatMessage]) -> Vec<OllamaMessage> {
        let mut result = Vec::new();
        let mut tool_results_buffer: Vec<String> = Vec::new();

        for m in messages {
            if m.role == "tool" {
                let tool_call_id = m.tool_call_id.as_deref().unwrap_or("unknown");
                tool_results_buffer.push(format!(
                    "<tool_result id=\"{}\">\n{}\n</tool_result>",
                    tool_call_id, m.content
                ));
                continue;
            }

            if !tool_results_buffer.is_empty() {
                result.push(Self::tool_results_message(&mut tool_results_buffer));
            }

            let tool_calls = m.tool_calls.as_ref().map(|tcs| {
                tcs.iter()
                    .map(|tc| {
                        let args: serde_json::Value =
                            serde_json::from_str(&tc.arguments).unwrap_or(serde_json::Value::Null);
                        OllamaToolCallRequest {
                            function: OllamaFunctionRequest {
                                name: tc.name.clone(),
                                arguments: args,
                            },
                        }
                    })
                    .collect()
            });

            result.push(OllamaMessage {
                role: m.role.clone(),
                content: if m.content.is_empty() {
                    None
                } else {
                    Some(m.content.clone())
                },
                tool_calls,
            });
        }

        if !tool_results_buffer.is_empty() {
            result.push(Self::tool_results_message(&mut tool_results_buffer));
        }

        result
    }

    fn tool_results_message(buffer: &mut Vec<String>) -> OllamaMessage {
        let combined = buffer.join("\n");
        buffer.clear();
        OllamaMessage {
            role: "user".to_string(),
            content: Some(format!("[Tool results]\n{}", combined)),
            tool_calls: None,
        }
    }

    fn convert_tools(tools: &[ToolSpec]) -> Vec<OllamaTool> {
        tools
            .iter()
            .map(|t| OllamaTool {
                r#type: "function".to_string(),
                function: OllamaToolFunction {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: t.parameters_schema.clone(),
                },
            })
            .collect()
    }

    async fn send(&self, request: &OllamaRequest) -> anyhow::Result<OllamaResponseMessage> {
        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Ollama API error ({}): {}", status, error_text));
        }

        let ollama_response: OllamaResponse = response.json().await?;
        Ok(ollama_response.message)
    }
}

impl Default for OllamaProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Provider for OllamaProvider {
    async fn chat(&self, request: ChatRequest<'_>) -> anyhow::Result<ChatResponse> {
        let ollama_request = OllamaRequest {
            model: self.model.clone(),
            messages: self.convert_messages(request.messages),
            tools: request.tools.map(Self::convert_tools),
            options: Some(OllamaOptions {
                temperature: self.temperature,
            }),
            format: None,
            stream: false,
        };

        let message = self.send(&ollama_request).await?;

        let tool_calls: Vec<ToolCall> = message
            .tool_calls
            .map(|tcs| {
                tcs.into_iter()
                    .map(|tc| {
                        let args_str =
                            serde_json::to_string(&tc.function.arguments).unwrap_or_default();
                        ToolCall {
                            id: format!("ollama_{}", uuid::Uuid::new_v4()),
                            name: tc.function.name,
                            arguments: args_str,
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        let text = match message.content {
            Some(c) if !c.is_empty() => Some(c),
            other => {
                if tool_calls.is_empty() {
                    message.thinking.or(other)
                } else {
                    other
                }
            }
        };

        Ok(ChatResponse { text, tool_calls })
    }

    async fn chat_structured(
        &self,
        messages: &[ChatMessage],
        schema: &serde_json::Value,
    ) -> anyhow::Result<serde_json::Value> {
        let ollama_request = OllamaRequest {
            model: self.model.clone(),
            messages: self.convert_messages(messages),
            tools: None,
            options: Some(OllamaOptions {
                temperature: self.temperature,
            }),
            format: Some(schema.clone()),
            stream: false,
        };

        let message = self.send(&ollama_request).await?;
        let content = message
            .content
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("Empty structured response from Ollama"))?;

        serde_json::from_str(content.trim())
            .map_err(|e| anyhow::anyhow!("Structured response was not valid JSON: {}", e))
    }
}
