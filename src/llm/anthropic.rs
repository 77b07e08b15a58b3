use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client as HttpClient, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
const DEFAULT_MODEL: &str = "claude-3-sonnet-20240229";
const DEFAULT_MAX_TOKENS: u32 = 1000;
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Clone, Debug)]
pub struct AnthropicClientConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub default_model: String,
    pub default_max_tokens: u32,
    pub timeout: Duration,
}

impl Default for AnthropicClientConfig {
    fn default() -> Self {
        Self {
            api_key: std::env::var("ANTHROPIC_API_KEY").ok(),
            base_url: DEFAULT_BASE_URL.to_string(),
            default_model: std::env::var("ANTHROPIC_MODEL")
                .unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            default_max_tokens: DEFAULT_MAX_TOKENS,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl AnthropicClientConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(base) = std::env::var("ANTHROPIC_BASE_URL") {
            cfg.base_url = base;
        }
        if let Ok(max_tokens) = std::env::var("ANTHROPIC_MAX_TOKENS") {
            if let Ok(parsed) = max_tokens.parse::<u32>() {
                cfg.default_max_tokens = parsed;
            }
        }
        if let Ok(timeout) = std::env::var("ANTHROPIC_TIMEOUT_SECS") {
            if let Ok(parsed) = timeout.parse::<u64>() {
                cfg.timeout = Duration::from_secs(parsed);
            }
        }
        cfg
    }
}

#[derive(Clone)]
pub struct AnthropicClient {
    http: HttpClient,
    cfg: AnthropicClientConfig,
}

impl AnthropicClient {
    pub fn new(cfg: AnthropicClientConfig) -> Result<Self, AnthropicError> {
        let http = HttpClient::builder()
            .timeout(cfg.timeout)
            .build()
            .map_err(AnthropicError::http)?;
        Ok(Self { http, cfg })
    }

    fn resolve_api_key(&self) -> Result<String, AnthropicError> {
        if let Some(key) = &self.cfg.api_key {
            return Ok(key.clone());
        }
        std::env::var("ANTHROPIC_API_KEY").map_err(|_| AnthropicError::MissingApiKey)
    }

    fn endpoint(&self) -> String {
        format!("{}/messages", self.cfg.base_url.trim_end_matches('/'))
    }

    fn build_api_request(&self, req: &MessageRequest) -> ApiMessageRequest {
        ApiMessageRequest {
            model: req
                .model
                .clone()
                .unwrap_or_else(|| self.cfg.default_model.clone()),
            max_tokens: req.max_tokens.unwrap_or(self.cfg.default_max_tokens),
            system: req.system.clone(),
            temperature: req.temperature,
            messages: req
                .messages
                .iter()
                .map(|m| ApiMessage {
                    role: m.role.as_api_str().to_string(),
                    content: m.content.clone(),
                })
                .collect(),
        }
    }
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn create_message(
        &self,
        request: MessageRequest,
    ) -> Result<MessageResponse, AnthropicError>;
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn create_message(
        &self,
        request: MessageRequest,
    ) -> Result<MessageResponse, AnthropicError> {
        if request.messages.is_empty() {
            return Err(AnthropicError::EmptyMessages);
        }

        let api_key = self.resolve_api_key()?;
        let api_request = self.build_api_request(&request);
        let endpoint = self.endpoint();

        let response = self
            .http
            .post(endpoint)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&api_request)
            .send()
            .await
            .map_err(AnthropicError::from_reqwest)?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(AnthropicError::from_reqwest)?;

        if !status.is_success() {
            let api_err = serde_json::from_slice::<ApiErrorEnvelope>(&bytes)
                .ok()
                .map(|env| env.error);
            return Err(AnthropicError::Api {
                status,
                error: api_err.unwrap_or_default(),
            });
        }

        let parsed: ApiMessageResponse =
            serde_json::from_slice(&bytes).map_err(AnthropicError::Decode)?;
        let raw: Value = serde_json::from_slice(&bytes).map_err(AnthropicError::Decode)?;

        let content = parsed
            .content
            .iter()
            .find_map(|block| block.text.clone())
            .unwrap_or_default();

        Ok(MessageResponse {
            content,
            raw,
            stop_reason: parsed.stop_reason,
            usage: parsed.usage.map(|usage| UsageMetrics {
                input_tokens: usage.input_tokens,
                output_tokens: usage.output_tokens,
            }),
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MessageRequest {
    pub model: Option<String>,
    pub system: Option<String>,
    pub messages: Vec<Message>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    fn as_api_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MessageResponse {
    pub content: String,
    pub raw: Value,
    pub stop_reason: Option<String>,
    pub usage: Option<UsageMetrics>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct UsageMetrics {
    pub input_tokens: Option<u32>,
    pub output_tokens: Option<u32>,
}

#[derive(Debug)]
pub enum AnthropicError {
    MissingApiKey,
    EmptyMessages,
    Http(reqwest::Error),
    Timeout,
    Api {
        status: StatusCode,
        error: ApiErrorBody,
    },
    MockQueueEmpty,
    Decode(serde_json::Error),
}

impl AnthropicError {
    fn http(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AnthropicError::Timeout
        } else {
            AnthropicError::Http(err)
        }
    }

    fn from_reqwest(err: reqwest::Error) -> Self {
        Self::http(err)
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            AnthropicError::Timeout => true,
            AnthropicError::Http(_) => true,
            AnthropicError::Api { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            AnthropicError::MissingApiKey
            | AnthropicError::EmptyMessages
            | AnthropicError::MockQueueEmpty
            | AnthropicError::Decode(_) => false,
        }
    }
}

impl std::fmt::Display for AnthropicError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnthropicError::MissingApiKey => write!(f, "ANTHROPIC_API_KEY is not set"),
            AnthropicError::EmptyMessages => {
                write!(f, "a message request requires at least one message")
            }
            AnthropicError::Http(err) => write!(f, "http error: {err}"),
            AnthropicError::Timeout => write!(f, "request timed out"),
            AnthropicError::Api { status, error } => {
                write!(f, "api error {status}: {}", error.message)
            }
            AnthropicError::MockQueueEmpty => {
                write!(f, "mock client response queue is empty")
            }
            AnthropicError::Decode(err) => write!(f, "decode error: {err}"),
        }
    }
}

impl std::error::Error for AnthropicError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AnthropicError::Http(err) => Some(err),
            AnthropicError::Decode(err) => Some(err),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub message: String,
    #[serde(default)]
    pub r#type: Option<String>,
}

impl Default for ApiErrorBody {
    fn default() -> Self {
        Self {
            message: "unknown error".to_string(),
            r#type: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Default)]
pub struct MockClient {
    responses: Mutex<VecDeque<Result<MessageResponse, AnthropicError>>>,
    calls: Mutex<Vec<MessageRequest>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_response(&self, resp: Result<MessageResponse, AnthropicError>) {
        self.responses.lock().unwrap().push_back(resp);
    }

    pub fn calls(&self) -> Vec<MessageRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for MockClient {
    async fn create_message(
        &self,
        request: MessageRequest,
    ) -> Result<MessageResponse, AnthropicError> {
        self.calls.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AnthropicError::MockQueueEmpty))
    }
}

#[derive(Debug, Clone, Serialize)]
struct ApiMessageRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    messages: Vec<ApiMessage>,
}

#[derive(Debug, Clone, Serialize)]
struct ApiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ApiMessageResponse {
    content: Vec<ApiContentBlock>,
    stop_reason: Option<String>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Clone, Deserialize)]
struct ApiContentBlock {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ApiUsage {
    input_tokens: Option<u32>,
    output_tokens: Option<u32>,
}

#[cfg(test)]
impl AnthropicClient {
    pub(crate) fn build_request_for_tests(&self, req: &MessageRequest) -> ApiMessageRequest {
        self.build_api_request(req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_request() -> MessageRequest {
        MessageRequest {
            model: None,
            system: Some("You are helpful.".into()),
            messages: vec![Message::new(Role::User, "Hello")],
            max_tokens: Some(64),
            temperature: Some(0.0),
        }
    }

    fn sample_config() -> AnthropicClientConfig {
        AnthropicClientConfig {
            api_key: Some("test".into()),
            base_url: DEFAULT_BASE_URL.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            default_max_tokens: DEFAULT_MAX_TOKENS,
            timeout: Duration::from_secs(30),
        }
    }

    #[test]
    fn build_request_serializes_messages() {
        let client = AnthropicClient::new(sample_config()).unwrap();

        let request = sample_request();
        let api_request = client.build_request_for_tests(&request);
        let value = serde_json::to_value(&api_request).unwrap();

        assert_eq!(value["model"], DEFAULT_MODEL);
        assert_eq!(value["system"], "You are helpful.");
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["messages"][0]["content"], "Hello");
        assert_eq!(value["max_tokens"], 64);
        assert_eq!(value["temperature"], 0.0);
    }

    #[test]
    fn build_request_omits_absent_optionals() {
        let client = AnthropicClient::new(sample_config()).unwrap();

        let request = MessageRequest {
            model: Some("claude-3-opus-20240229".into()),
            system: None,
            messages: vec![Message::new(Role::User, "Hi")],
            max_tokens: None,
            temperature: None,
        };
        let value =
            serde_json::to_value(client.build_request_for_tests(&request)).unwrap();

        assert_eq!(value["model"], "claude-3-opus-20240229");
        assert_eq!(value["max_tokens"], DEFAULT_MAX_TOKENS);
        assert!(value.get("system").is_none());
        assert!(value.get("temperature").is_none());
    }

    #[tokio::test]
    async fn mock_client_returns_enqueued_response() {
        let mock = MockClient::new();
        let response = MessageResponse {
            content: "hi".into(),
            raw: Value::String("raw".into()),
            stop_reason: Some("end_turn".into()),
            usage: None,
        };
        mock.push_response(Ok(response.clone()));

        let req = sample_request();
        let out = mock.create_message(req.clone()).await.unwrap();

        assert_eq!(out.content, "hi");
        assert_eq!(mock.calls().len(), 1);
        assert_eq!(mock.calls()[0], req);
    }

    #[test]
    fn api_error_display_includes_status() {
        let err = AnthropicError::Api {
            status: StatusCode::BAD_REQUEST,
            error: ApiErrorBody {
                message: "bad request".into(),
                r#type: Some("invalid_request_error".into()),
            },
        };

        assert_eq!(format!("{err}"), "api error 400 Bad Request: bad request");
        assert!(!err.is_retryable());
    }

    #[test]
    fn rate_limit_and_server_errors_are_retryable() {
        for status in [StatusCode::TOO_MANY_REQUESTS, StatusCode::INTERNAL_SERVER_ERROR] {
            let err = AnthropicError::Api {
                status,
                error: ApiErrorBody::default(),
            };
            assert!(err.is_retryable(), "{status}");
        }
    }
}
