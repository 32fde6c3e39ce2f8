//! LLM capability and the OpenAI-compatible HTTP client.
//!
//! Services depend on the [`StructuredCompletion`] trait rather than a concrete client, so the
//! live/mock split is decided once when the [`LlmBackend`] is constructed.

use crate::config::CoreConfig;
use crate::{CoreError, CoreResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("LLM provider is not reachable at {0}")]
    Connection(String),

    #[error("LLM request timed out after {0}s")]
    Timeout(u64),

    #[error("LLM provider returned error (status {status}): {body}")]
    Provider { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("response parsing error: {0}")]
    ResponseParsing(String),

    #[error("LLM response contained no message content")]
    EmptyResponse,

    #[error("LLM content is not valid JSON: {0}")]
    InvalidJson(String),
}

pub type LlmResult<T> = std::result::Result<T, LlmError>;

/// A single structured-output prompt.
#[derive(Clone, Debug, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub temperature: f64,
}

/// Capability to turn a prompt into a JSON document.
#[async_trait]
pub trait StructuredCompletion: Send + Sync {
    async fn complete_structured(&self, request: &CompletionRequest) -> LlmResult<serde_json::Value>;
}

/// Which source produces scan and outreach content.
#[derive(Clone)]
pub enum LlmBackend {
    Live(Arc<dyn StructuredCompletion>),
    /// Fixed development fixtures. Only reachable when explicitly allowed by configuration.
    Mock,
}

impl LlmBackend {
    /// Choose the backend from startup configuration.
    ///
    /// # Errors
    /// Returns `CoreError::MissingCredential` when no credential is configured and mock mode has
    /// not been allowed, or an LLM error if the HTTP client cannot be built.
    pub fn from_config(cfg: &CoreConfig) -> CoreResult<Self> {
        match cfg.api_key() {
            Some(api_key) => {
                let client = OpenAiClient::new(
                    api_key,
                    cfg.llm_base_url(),
                    cfg.llm_model(),
                    cfg.llm_timeout_secs(),
                )?;
                tracing::info!(
                    base_url = cfg.llm_base_url(),
                    model = cfg.llm_model(),
                    "LLM backend: live"
                );
                Ok(Self::Live(Arc::new(client)))
            }
            None if cfg.allow_mock() => {
                tracing::warn!(
                    "LLM backend: MOCK. No credential configured; scan results are fabricated fixtures"
                );
                Ok(Self::Mock)
            }
            None => Err(CoreError::MissingCredential),
        }
    }

    pub fn is_mock(&self) -> bool {
        matches!(self, Self::Mock)
    }
}

impl fmt::Debug for LlmBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Live(_) => f.write_str("LlmBackend::Live"),
            Self::Mock => f.write_str("LlmBackend::Mock"),
        }
    }
}

/// HTTP client for an OpenAI-compatible chat-completions API.
pub struct OpenAiClient {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
    timeout_secs: u64,
}

impl OpenAiClient {
    pub fn new(api_key: &str, base_url: &str, model: &str, timeout_secs: u64) -> LlmResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| LlmError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            client,
            timeout_secs,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

/// Request body for `POST /chat/completions`.
#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f64,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

/// Response body from `POST /chat/completions`.
#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl StructuredCompletion for OpenAiClient {
    async fn complete_structured(&self, request: &CompletionRequest) -> LlmResult<serde_json::Value> {
        let url = format!("{}/chat/completions", self.base_url);
        tracing::debug!(
            model = self.model(),
            temperature = request.temperature,
            "sending chat completion request"
        );
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            temperature: request.temperature,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    LlmError::Connection(self.base_url.clone())
                } else if e.is_timeout() {
                    LlmError::Timeout(self.timeout_secs)
                } else {
                    LlmError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout(self.timeout_secs)
                } else {
                    LlmError::ResponseParsing(e.to_string())
                }
            })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(LlmError::EmptyResponse)?;

        serde_json::from_str(strip_code_fence(&content))
            .map_err(|e| LlmError::InvalidJson(e.to_string()))
    }
}

/// Some compatible providers wrap JSON mode output in a Markdown fence anyway.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::HeaderMap, http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};

    /// Serve `app` on an ephemeral local port and return its base URL.
    async fn spawn_provider(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn completion(content: &str) -> Value {
        json!({ "choices": [ { "message": { "role": "assistant", "content": content } } ] })
    }

    fn request() -> CompletionRequest {
        CompletionRequest {
            system: "system prompt".into(),
            user: "user prompt".into(),
            temperature: 0.1,
        }
    }

    #[tokio::test]
    async fn sends_json_mode_request_with_bearer_auth() {
        // The fake provider echoes what it received back as the completion content.
        let app = Router::new().route(
            "/chat/completions",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                let echoed = json!({
                    "auth": headers.get("authorization").and_then(|v| v.to_str().ok()),
                    "model": body["model"],
                    "format": body["response_format"]["type"],
                    "temperature": body["temperature"],
                    "roles": [body["messages"][0]["role"], body["messages"][1]["role"]],
                    "user": body["messages"][1]["content"],
                });
                Json(completion(&echoed.to_string()))
            }),
        );
        let base_url = spawn_provider(app).await;

        let client = OpenAiClient::new("sk-test", &base_url, "gpt-4o", 5).unwrap();
        let value = client.complete_structured(&request()).await.unwrap();

        assert_eq!(value["auth"], json!("Bearer sk-test"));
        assert_eq!(value["model"], json!("gpt-4o"));
        assert_eq!(value["format"], json!("json_object"));
        assert_eq!(value["roles"], json!(["system", "user"]));
        assert_eq!(value["user"], json!("user prompt"));
        let temperature = value["temperature"].as_f64().unwrap();
        assert!((temperature - 0.1).abs() < 1e-6);
    }

    #[tokio::test]
    async fn non_success_status_is_reported_with_body() {
        let app = Router::new().route(
            "/chat/completions",
            post(|| async { (StatusCode::TOO_MANY_REQUESTS, "rate limited") }),
        );
        let base_url = spawn_provider(app).await;

        let client = OpenAiClient::new("sk-test", &base_url, "gpt-4o", 5).unwrap();
        let err = client.complete_structured(&request()).await.unwrap_err();

        match err {
            LlmError::Provider { status, body } => {
                assert_eq!(status, 429);
                assert_eq!(body, "rate limited");
            }
            other => panic!("expected Provider error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_json_content_is_rejected() {
        let app = Router::new().route(
            "/chat/completions",
            post(|| async { Json(completion("I could not find any fractures.")) }),
        );
        let base_url = spawn_provider(app).await;

        let client = OpenAiClient::new("sk-test", &base_url, "gpt-4o", 5).unwrap();
        let err = client.complete_structured(&request()).await.unwrap_err();
        assert!(matches!(err, LlmError::InvalidJson(_)));
    }

    #[tokio::test]
    async fn missing_choices_is_an_empty_response() {
        let app = Router::new().route(
            "/chat/completions",
            post(|| async { Json(json!({ "choices": [] })) }),
        );
        let base_url = spawn_provider(app).await;

        let client = OpenAiClient::new("sk-test", &base_url, "gpt-4o", 5).unwrap();
        let err = client.complete_structured(&request()).await.unwrap_err();
        assert!(matches!(err, LlmError::EmptyResponse));
    }

    #[tokio::test]
    async fn unreachable_provider_is_a_connection_error() {
        // Bind then drop to obtain a port with nothing listening.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = OpenAiClient::new("sk-test", &format!("http://{addr}"), "gpt-4o", 5).unwrap();
        let err = client.complete_structured(&request()).await.unwrap_err();
        assert!(matches!(err, LlmError::Connection(_)));
    }

    #[tokio::test]
    async fn slow_provider_is_a_timeout() {
        let app = Router::new().route(
            "/chat/completions",
            post(|| async {
                tokio::time::sleep(std::time::Duration::from_secs(3)).await;
                Json(completion("{}"))
            }),
        );
        let base_url = spawn_provider(app).await;

        let client = OpenAiClient::new("sk-test", &base_url, "gpt-4o", 1).unwrap();
        let err = client.complete_structured(&request()).await.unwrap_err();
        assert!(matches!(err, LlmError::Timeout(1)), "got {err:?}");
    }

    #[test]
    fn strips_markdown_fences() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("  {\"a\":1} "), "{\"a\":1}");
    }

    #[test]
    fn backend_requires_credential_unless_mock_is_allowed() {
        let strict = CoreConfig::new(None, "https://api.openai.com/v1".into(), "gpt-4o".into(), 60, false)
            .unwrap();
        assert!(matches!(
            LlmBackend::from_config(&strict),
            Err(CoreError::MissingCredential)
        ));

        let permissive = CoreConfig::new(None, "https://api.openai.com/v1".into(), "gpt-4o".into(), 60, true)
            .unwrap();
        assert!(LlmBackend::from_config(&permissive).unwrap().is_mock());

        let live = CoreConfig::new(
            Some("sk-test".into()),
            "https://api.openai.com/v1".into(),
            "gpt-4o".into(),
            60,
            true,
        )
        .unwrap();
        assert!(!LlmBackend::from_config(&live).unwrap().is_mock());
    }
}
