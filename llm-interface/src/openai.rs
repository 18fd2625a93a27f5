use crate::provider::LlmProvider;
use chorus_core::{CoreError, LlmError, DEFAULT_MODEL};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, RETRY_AFTER};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

const OPENAI_API_URL: &str = "https://api.openai.com/v1";
const PROVIDER: &str = "openai";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: &str) -> Self {
        Self {
            role: "system".to_string(),
            content: content.to_string(),
        }
    }

    pub fn user(content: &str) -> Self {
        Self {
            role: "user".to_string(),
            content: content.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    pub message: ChatResponseMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

/// OpenAI (or any OpenAI-compatible) chat completions endpoint.
pub struct OpenAiProvider {
    api_key: String,
    model: String,
    base_url: String,
    http: reqwest::Client,
}

impl OpenAiProvider {
    pub fn new(api_key: impl Into<String>) -> Result<Self, CoreError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: OPENAI_API_URL.to_string(),
            http,
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn headers(&self) -> Result<HeaderMap, CoreError> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.api_key)).map_err(|_| {
            CoreError::Llm(LlmError::InvalidApiKey {
                provider: PROVIDER.to_string(),
            })
        })?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, CoreError> {
        debug!(model = %request.model, "OpenAI chat request");

        let response = self
            .http
            .post(self.endpoint())
            .headers(self.headers()?)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CoreError::Llm(LlmError::RequestTimeout {
                        provider: PROVIDER.to_string(),
                    })
                } else {
                    CoreError::Network(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());
            let error_text = response.text().await.unwrap_or_default();
            error!("OpenAI API error ({}): {}", status, error_text);
            return Err(status_error(status, retry_after, &error_text));
        }

        let body = response.text().await?;
        parse_chat_response(&body)
    }
}

impl LlmProvider for OpenAiProvider {
    async fn complete(&self, system: &str, user: &str) -> Result<String, CoreError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
        };
        let response = self.chat(&request).await?;
        first_choice_text(response)
    }
}

/// Maps a non-success HTTP status of the completions endpoint.
pub fn status_error(status: StatusCode, retry_after: Option<u64>, body: &str) -> CoreError {
    match status {
        StatusCode::UNAUTHORIZED => LlmError::InvalidApiKey {
            provider: PROVIDER.to_string(),
        }
        .into(),
        StatusCode::TOO_MANY_REQUESTS => LlmError::RateLimitExceeded {
            provider: PROVIDER.to_string(),
            retry_after: retry_after.unwrap_or(0),
        }
        .into(),
        s if s.is_server_error() => LlmError::ServiceUnavailable {
            provider: PROVIDER.to_string(),
        }
        .into(),
        s => CoreError::RequestFailed {
            message: format!("OpenAI API error ({}): {}", s, body),
            status_code: Some(s.as_u16()),
        },
    }
}

/// Decodes a completions body. A body that is not a chat completion is an
/// invalid response, not a transport failure.
pub fn parse_chat_response(body: &str) -> Result<ChatResponse, CoreError> {
    serde_json::from_str(body).map_err(|e| {
        error!("Malformed OpenAI response: {}", e);
        LlmError::InvalidResponseFormat {
            provider: PROVIDER.to_string(),
        }
        .into()
    })
}

/// Text of the first choice. A null message content is an empty reply.
pub fn first_choice_text(response: ChatResponse) -> Result<String, CoreError> {
    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content.unwrap_or_default())
        .ok_or_else(|| {
            LlmError::InvalidResponseFormat {
                provider: PROVIDER.to_string(),
            }
            .into()
        })
}
