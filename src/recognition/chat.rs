// SPDX-License-Identifier: GPL-3.0-only

//! Chat assistant over an OpenAI-compatible `chat/completions` API
//!
//! Only used by explicit user requests, never by the processing loops.

use crate::config::ChatConfig;
use crate::errors::RecognitionError;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

#[derive(Serialize, Deserialize, Debug)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize, Debug)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Deserialize, Debug)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone)]
pub struct ChatClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
}

impl ChatClient {
    pub fn new(config: &ChatConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: completions_url(&config.endpoint),
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            model: config.model.clone(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Send one user prompt and return the first answer
    pub async fn ask(&self, prompt: &str) -> Result<String, RecognitionError> {
        let api_key = self.api_key.as_deref().ok_or(RecognitionError::NotConfigured)?;
        debug!(model = %self.model, endpoint = %self.endpoint, "Sending chat request");

        let request_body = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to send chat request");
                RecognitionError::Transport(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!(status = status.as_u16(), "Chat API error");
            return Err(RecognitionError::Status {
                code: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        parse_answer(&body)
    }
}

fn completions_url(base: &str) -> String {
    format!("{}/chat/completions", base.trim_end_matches('/'))
}

fn parse_answer(body: &str) -> Result<String, RecognitionError> {
    let response: ChatResponse =
        serde_json::from_str(body).map_err(|e| RecognitionError::Decode(e.to_string()))?;
    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or_else(|| RecognitionError::Decode("response has no choices".to_string()))
}
