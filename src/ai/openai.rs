use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{ChatError, ChatResult, CompletionBackend};
use crate::config::Settings;
use crate::types::{ChatMessage, Role};

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: Role,
    content: &'a str,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

impl OpenAiClient {
    pub fn new(base_url: String, model: String, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url,
            model,
            api_key,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.base_url.clone(),
            settings.model.clone(),
            settings.api_key.clone(),
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

/// Content of the first choice, if the body has the completions shape.
pub fn parse_completion_body(body: &str) -> ChatResult<Option<String>> {
    let parsed: CompletionResponse = serde_json::from_str(body)?;
    Ok(parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|msg| msg.content))
}

#[async_trait]
impl CompletionBackend for OpenAiClient {
    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn complete(&self, messages: &[ChatMessage]) -> ChatResult<Option<String>> {
        let Some(key) = &self.api_key else {
            return Err(ChatError::new("No API key configured"));
        };

        let request = CompletionRequest {
            model: &self.model,
            messages: messages
                .iter()
                .map(|msg| WireMessage {
                    role: msg.role,
                    content: &msg.content,
                })
                .collect(),
        };

        tracing::debug!(
            model = %self.model,
            messages = messages.len(),
            "sending chat completion request"
        );

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(key)
            .json(&request)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ChatError::new(format!("Chat completion error {status}: {body}")));
        }

        parse_completion_body(&body)
    }

    fn name(&self) -> &str {
        "openai"
    }
}
