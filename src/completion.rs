//! Text completion used to turn the collected posts into topic ideas.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{Error, Result};

const ANTHROPIC_MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

pub const DEFAULT_MODEL: &str = "claude-3-7-sonnet-20250219";
pub const MAX_TOKENS: u32 = 1500;
pub const TEMPERATURE: f32 = 0.8;

/// One prompt in, free text out.
#[async_trait(?Send)]
pub trait Completion {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: [Message<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

/// Anthropic Messages API client.
pub struct AnthropicClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl AnthropicClient {
    pub fn new<K: Into<String>, M: Into<String>>(api_key: K, model: M) -> Self {
        AnthropicClient {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }
}

#[async_trait(?Send)]
impl Completion for AnthropicClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            messages: [Message {
                role: "user",
                content: prompt,
            }],
        };
        info!(model = %self.model, prompt_chars = prompt.len(), "calling completion API");

        let response = self
            .client
            .post(ANTHROPIC_MESSAGES_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(Error::from_status(status, text));
        }
        debug!("completion API call successful");
        first_text_block(&text)
    }
}

/// Extract the first text block of a Messages API reply, trimmed.
fn first_text_block(body: &str) -> Result<String> {
    let response: MessagesResponse = serde_json::from_str(body)?;
    response
        .content
        .into_iter()
        .find(|block| block.kind == "text")
        .map(|block| block.text.trim().to_string())
        .ok_or_else(|| Error::NotFound("text block in completion response".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_first_text_block() {
        let body = r#"{
            "id": "msg_01",
            "type": "message",
            "role": "assistant",
            "content": [{"type": "text", "text": "\n1. Rust at the edge\n"}],
            "stop_reason": "end_turn"
        }"#;
        assert_eq!(first_text_block(body).unwrap(), "1. Rust at the edge");
    }

    #[test]
    fn reply_without_text_is_error() {
        let err = first_text_block(r#"{"content": []}"#).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn serialize_request() {
        let body = MessagesRequest {
            model: DEFAULT_MODEL,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            messages: [Message {
                role: "user",
                content: "hello",
            }],
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["max_tokens"], 1500);
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["messages"][0]["content"], "hello");
    }
}
