use anyhow::{anyhow, Result};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::schema::StructuredOutput;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Handle on one Anthropic model. Cheap to clone; holds no connection state
/// beyond the reqwest pool.
#[derive(Clone)]
pub struct Claude {
    api_key: String,
    model: String,
    base_url: String,
    http: reqwest::Client,
}

impl Claude {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: ANTHROPIC_API_URL.to_string(),
            http: reqwest::Client::new(),
        }
    }

    /// Point at a different endpoint (proxies, test doubles).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Plain text completion at temperature 0.
    pub async fn chat_completion(
        &self,
        system: impl Into<String>,
        user: impl Into<String>,
    ) -> Result<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            max_tokens: 4096,
            temperature: 0.0,
            system: system.into(),
            messages: vec![WireMessage::user(user)],
            tools: None,
            tool_choice: None,
        };

        let response = self.send(&request).await?;
        response
            .text()
            .ok_or_else(|| anyhow!("No text in Claude response"))
    }

    /// Structured output: forces a single `structured_response` tool whose
    /// input schema is derived from `T`, then deserializes the tool input.
    pub async fn extract<T: StructuredOutput>(
        &self,
        system: impl Into<String>,
        user: impl Into<String>,
    ) -> Result<T> {
        let tool_name = "structured_response";
        let request = ChatRequest {
            model: self.model.clone(),
            max_tokens: 4096,
            temperature: 0.0,
            system: system.into(),
            messages: vec![WireMessage::user(user)],
            tools: Some(vec![ToolDefinition {
                name: tool_name.to_string(),
                description: "Report the structured result of the analysis.".to_string(),
                input_schema: T::tool_schema(),
            }]),
            tool_choice: Some(serde_json::json!({
                "type": "tool",
                "name": tool_name,
            })),
        };

        let response = self.send(&request).await?;
        for block in &response.content {
            if let ContentBlock::ToolUse { input, .. } = block {
                return serde_json::from_value(input.clone())
                    .map_err(|e| anyhow!("Failed to deserialize structured response: {e}"));
            }
        }
        Err(anyhow!("No structured output in Claude response"))
    }

    async fn send(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let url = format!("{}/messages", self.base_url);

        debug!(model = %request.model, "Claude chat request");

        let response = self
            .http
            .post(&url)
            .headers(self.headers()?)
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(anyhow!("Claude API error ({status}): {error_text}"));
        }

        Ok(response.json().await?)
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", HeaderValue::from_str(&self.api_key)?);
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Role {
    User,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireMessage {
    role: Role,
    content: String,
}

impl WireMessage {
    fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct ToolDefinition {
    name: String,
    description: String,
    input_schema: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
struct ChatRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    system: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ToolDefinition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    content: Vec<ContentBlock>,
    #[serde(default)]
    #[allow(dead_code)]
    stop_reason: Option<String>,
}

impl ChatResponse {
    fn text(&self) -> Option<String> {
        self.content.iter().find_map(|block| match block {
            ContentBlock::Text { text } => Some(text.clone()),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "tool_use")]
    ToolUse {
        #[allow(dead_code)]
        id: String,
        #[allow(dead_code)]
        name: String,
        input: serde_json::Value,
    },
    #[serde(other)]
    Unknown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_carries_model_and_custom_base_url() {
        let ai = Claude::new("sk-ant-test", "claude-sonnet-4-20250514")
            .with_base_url("http://127.0.0.1:9999/v1");
        assert_eq!(ai.model(), "claude-sonnet-4-20250514");
        assert_eq!(ai.base_url, "http://127.0.0.1:9999/v1");
    }

    #[test]
    fn tool_use_block_parses_from_api_shape() {
        let raw = r#"{
            "content": [
                {"type": "text", "text": "thinking..."},
                {"type": "tool_use", "id": "tu_1", "name": "structured_response",
                 "input": {"headline": "ok"}}
            ],
            "stop_reason": "tool_use"
        }"#;
        let response: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.text().as_deref(), Some("thinking..."));
        let input = response.content.iter().find_map(|b| match b {
            ContentBlock::ToolUse { input, .. } => Some(input),
            _ => None,
        });
        assert_eq!(input.unwrap()["headline"], "ok");
    }
}
