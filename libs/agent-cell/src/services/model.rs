use async_trait::async_trait;
use reqwest::{header, Client};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, error};

use shared_config::AppConfig;

use crate::models::{ToolRequest, Turn};
use crate::services::tools::ToolDefinition;

/// Everything the model sees for one round trip.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    pub system: String,
    pub turns: Vec<Turn>,
    pub tools: Vec<ToolDefinition>,
}

/// Zero or more tool calls and/or text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelTurn {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolRequest>,
}

impl ModelTurn {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            tool_calls: Vec::new(),
        }
    }

    pub fn tools(tool_calls: Vec<ToolRequest>) -> Self {
        Self {
            content: None,
            tool_calls,
        }
    }
}

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("model API key is not configured")]
    NotConfigured,

    #[error("model API error: HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("malformed model response: {0}")]
    MalformedResponse(String),

    #[error("model request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn complete(&self, request: &ModelRequest) -> Result<ModelTurn, ModelError>;
}

// ==============================================================================
// OPENAI CHAT COMPLETIONS
// ==============================================================================

pub struct OpenAiChatClient {
    http_client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
}

impl OpenAiChatClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            http_client: Client::new(),
            api_key: config.openai_api_key.clone(),
            base_url: config.openai_base_url.trim_end_matches('/').to_string(),
            model: config.openai_model.clone(),
            temperature: config.openai_temperature,
        }
    }

    fn request_body(&self, request: &ModelRequest) -> Value {
        let mut messages = vec![json!({ "role": "system", "content": request.system })];
        messages.extend(request.turns.iter().map(message_for));

        let tools: Vec<Value> = request
            .tools
            .iter()
            .map(|tool| {
                json!({
                    "type": "function",
                    "function": {
                        "name": tool.name,
                        "description": tool.description,
                        "parameters": tool.parameters,
                    }
                })
            })
            .collect();

        let mut body = json!({
            "model": self.model,
            "messages": messages,
            "temperature": self.temperature,
        });
        if !tools.is_empty() {
            body["tools"] = Value::Array(tools);
        }
        body
    }
}

fn message_for(turn: &Turn) -> Value {
    match turn {
        Turn::User { content } => json!({ "role": "user", "content": content }),
        Turn::Model { content, tool_calls } if tool_calls.is_empty() => {
            json!({ "role": "assistant", "content": content })
        }
        Turn::Model { content, tool_calls } => json!({
            "role": "assistant",
            "content": content,
            "tool_calls": tool_calls
                .iter()
                .map(|call| json!({
                    "id": call.id,
                    "type": "function",
                    "function": {
                        "name": call.name,
                        "arguments": call.arguments.to_string(),
                    }
                }))
                .collect::<Vec<_>>(),
        }),
        Turn::Tool { call_id, tool_output, .. } => json!({
            "role": "tool",
            "tool_call_id": call_id,
            "content": tool_output.to_value().to_string(),
        }),
    }
}

/// Parse `choices[0].message` of a Chat Completions response.
pub fn parse_completion(body: &Value) -> Result<ModelTurn, ModelError> {
    let message = body["choices"]
        .get(0)
        .map(|choice| &choice["message"])
        .filter(|message| message.is_object())
        .ok_or_else(|| ModelError::MalformedResponse("response has no choices".to_string()))?;

    let content = message["content"]
        .as_str()
        .filter(|text| !text.is_empty())
        .map(str::to_string);

    let mut tool_calls = Vec::new();
    if let Some(calls) = message["tool_calls"].as_array() {
        for (index, call) in calls.iter().enumerate() {
            let name = call["function"]["name"]
                .as_str()
                .ok_or_else(|| ModelError::MalformedResponse("tool call without a name".to_string()))?;
            let raw_arguments = call["function"]["arguments"].as_str().unwrap_or("{}");
            // Unparseable arguments are passed through as a string; the tool
            // registry reports them back to the model as invalid arguments.
            let arguments = serde_json::from_str(raw_arguments)
                .unwrap_or_else(|_| Value::String(raw_arguments.to_string()));

            tool_calls.push(ToolRequest {
                id: call["id"]
                    .as_str()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("call_{}", index)),
                name: name.to_string(),
                arguments,
            });
        }
    }

    Ok(ModelTurn { content, tool_calls })
}

#[async_trait]
impl ModelClient for OpenAiChatClient {
    async fn complete(&self, request: &ModelRequest) -> Result<ModelTurn, ModelError> {
        if self.api_key.is_empty() {
            return Err(ModelError::NotConfigured);
        }

        debug!(
            "Calling {} with {} turns and {} tools",
            self.model,
            request.turns.len(),
            request.tools.len()
        );

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(header::CONTENT_TYPE, "application/json")
            .json(&self.request_body(request))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            error!("OpenAI API error: {} - {}", status, message);
            return Err(ModelError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ModelError::MalformedResponse(e.to_string()))?;

        parse_completion(&body)
    }
}
