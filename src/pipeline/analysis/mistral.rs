use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use super::types::{ChatMessage, LlmClient};
use super::AnalysisError;
use crate::config::{AnalysisConfig, ApiKey};

const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";

/// HTTP client for a hosted chat-completions endpoint (Mistral API shape).
///
/// The credential is handed in by the caller; the client never reads the
/// environment.
pub struct MistralClient {
    base_url: String,
    api_key: ApiKey,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl MistralClient {
    pub fn new(api_key: ApiKey, config: &AnalysisConfig) -> Result<Self, AnalysisError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("coda/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AnalysisError::ClientBuild(e.to_string()))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            client,
            timeout_secs: config.timeout.as_secs(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Request body for POST /v1/chat/completions
#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

/// Response body from POST /v1/chat/completions
#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl LlmClient for MistralClient {
    fn complete(&self, model: &str, messages: &[ChatMessage]) -> Result<String, AnalysisError> {
        let url = format!("{}{CHAT_COMPLETIONS_PATH}", self.base_url);
        let body = ChatCompletionRequest { model, messages };

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose())
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    AnalysisError::Timeout(self.timeout_secs)
                } else if e.is_connect() {
                    AnalysisError::Connection {
                        url: self.base_url.clone(),
                        message: e.to_string(),
                    }
                } else {
                    AnalysisError::Http(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(AnalysisError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .map_err(|e| AnalysisError::MalformedResponse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(AnalysisError::EmptyResponse)
    }
}

/// Mock LLM client for testing and dry runs. Returns a configurable outcome
/// and remembers every message list it was sent.
pub struct MockLlmClient {
    outcome: Result<String, AnalysisError>,
    seen: Mutex<Vec<Vec<ChatMessage>>>,
}

impl MockLlmClient {
    pub fn new(response: &str) -> Self {
        Self {
            outcome: Ok(response.to_string()),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: AnalysisError) -> Self {
        Self {
            outcome: Err(error),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Message lists received so far, oldest first.
    pub fn calls(&self) -> Vec<Vec<ChatMessage>> {
        self.seen.lock().map(|seen| seen.clone()).unwrap_or_default()
    }
}

impl LlmClient for MockLlmClient {
    fn complete(&self, _model: &str, messages: &[ChatMessage]) -> Result<String, AnalysisError> {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(messages.to_vec());
        }
        self.outcome.clone()
    }
}
