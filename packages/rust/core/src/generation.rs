//! Generation service clients.
//!
//! [`GenerationClient`] is the request/response boundary to a hosted model:
//! one instruction text, one content text, one reply. Transport problems of
//! any kind surface as `PositioningError::Transport` and are never retried
//! here.

use std::future::Future;

use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use positioning_shared::{GenerationSettings, PositioningError, ProviderChoice, Result};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Longest slice of an error body kept in a transport error message.
const ERROR_BODY_CHARS: usize = 500;

/// A hosted text-generation capability.
pub trait GenerationClient: Send + Sync {
    /// Submit one request and return the reply text.
    fn submit(
        &self,
        instruction: &str,
        content: &str,
        model: &str,
    ) -> impl Future<Output = Result<String>> + Send;
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

fn build_http_client(settings: &GenerationSettings) -> Result<Client> {
    Client::builder()
        .timeout(settings.request_timeout)
        .build()
        .map_err(|e| PositioningError::Transport(format!("failed to build HTTP client: {e}")))
}

/// Turn a non-success reply into a transport error carrying the status and
/// the head of the body.
async fn check_status(provider: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let body: String = body.chars().take(ERROR_BODY_CHARS).collect();
    Err(PositioningError::Transport(format!(
        "{provider} returned HTTP {}: {}",
        status.as_u16(),
        body.trim()
    )))
}

// ---------------------------------------------------------------------------
// Anthropic
// ---------------------------------------------------------------------------

/// Anthropic Messages API client.
pub struct AnthropicClient {
    http: Client,
    api_key: String,
    base_url: String,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: [ChatMessage<'a>; 1],
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl AnthropicClient {
    pub fn new(settings: &GenerationSettings) -> Result<Self> {
        Ok(Self {
            http: build_http_client(settings)?,
            api_key: settings.api_key.clone(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            max_tokens: settings.max_tokens,
        })
    }
}

impl GenerationClient for AnthropicClient {
    #[instrument(skip_all, fields(provider = "anthropic", model = %model))]
    async fn submit(&self, instruction: &str, content: &str, model: &str) -> Result<String> {
        let url = format!("{}/v1/messages", self.base_url);
        let request = MessagesRequest {
            model,
            max_tokens: self.max_tokens,
            system: instruction,
            messages: [ChatMessage {
                role: "user",
                content,
            }],
        };

        info!("calling generation service");
        let response = self
            .http
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| PositioningError::Transport(format!("anthropic request failed: {e}")))?;

        let response = check_status("anthropic", response).await?;
        let envelope: MessagesResponse = response.json().await.map_err(|e| {
            PositioningError::Transport(format!("unreadable anthropic response: {e}"))
        })?;

        let text = envelope
            .content
            .into_iter()
            .find(|block| block.kind == "text" || block.kind.is_empty())
            .and_then(|block| block.text)
            .ok_or_else(|| {
                PositioningError::Transport("anthropic response had no text content".into())
            })?;

        debug!(chars = text.len(), "generation reply received");
        Ok(text)
    }
}

// ---------------------------------------------------------------------------
// OpenRouter
// ---------------------------------------------------------------------------

/// OpenRouter (OpenAI-compatible chat completions) client.
pub struct OpenRouterClient {
    http: Client,
    api_key: String,
    base_url: String,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

impl OpenRouterClient {
    pub fn new(settings: &GenerationSettings) -> Result<Self> {
        Ok(Self {
            http: build_http_client(settings)?,
            api_key: settings.api_key.clone(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            max_tokens: settings.max_tokens,
        })
    }
}

impl GenerationClient for OpenRouterClient {
    #[instrument(skip_all, fields(provider = "openrouter", model = %model))]
    async fn submit(&self, instruction: &str, content: &str, model: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model,
            max_tokens: self.max_tokens,
            messages: [
                ChatMessage {
                    role: "system",
                    content: instruction,
                },
                ChatMessage {
                    role: "user",
                    content,
                },
            ],
        };

        info!("calling generation service");
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| PositioningError::Transport(format!("openrouter request failed: {e}")))?;

        let response = check_status("openrouter", response).await?;
        let envelope: ChatResponse = response.json().await.map_err(|e| {
            PositioningError::Transport(format!("unreadable openrouter response: {e}"))
        })?;

        let text = envelope
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                PositioningError::Transport("openrouter response had no message content".into())
            })?;

        debug!(chars = text.len(), "generation reply received");
        Ok(text)
    }
}

// ---------------------------------------------------------------------------
// Provider selection
// ---------------------------------------------------------------------------

/// The client for whichever provider the settings resolved to.
pub enum ProviderClient {
    Anthropic(AnthropicClient),
    OpenRouter(OpenRouterClient),
}

impl ProviderClient {
    pub fn from_settings(settings: &GenerationSettings) -> Result<Self> {
        Ok(match settings.provider {
            ProviderChoice::Anthropic => Self::Anthropic(AnthropicClient::new(settings)?),
            ProviderChoice::OpenRouter => Self::OpenRouter(OpenRouterClient::new(settings)?),
        })
    }
}

impl GenerationClient for ProviderClient {
    async fn submit(&self, instruction: &str, content: &str, model: &str) -> Result<String> {
        match self {
            Self::Anthropic(client) => client.submit(instruction, content, model).await,
            Self::OpenRouter(client) => client.submit(instruction, content, model).await,
        }
    }
}

// ---------------------------------------------------------------------------
// Scripted client (tests)
// ---------------------------------------------------------------------------


#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(provider: ProviderChoice, base_url: String) -> GenerationSettings {
        GenerationSettings {
            provider,
            api_key: "test-key".into(),
            model: "test-model".into(),
            base_url,
            max_tokens: 8192,
            repair_attempts: 1,
            request_timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn anthropic_request_shape_and_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "test-key"))
            .and(header("anthropic-version", "2023-06-01"))
            .and(body_partial_json(json!({
                "model": "claude-test",
                "max_tokens": 8192,
                "system": "be a strategist",
                "messages": [{"role": "user", "content": "the data"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [{"type": "text", "text": "{\"company\": \"Acme\"}"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = AnthropicClient::new(&settings(ProviderChoice::Anthropic, server.uri())).unwrap();
        let reply = client
            .submit("be a strategist", "the data", "claude-test")
            .await
            .expect("submit");
        assert_eq!(reply, "{\"company\": \"Acme\"}");
    }

    #[tokio::test]
    async fn openrouter_request_shape_and_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(json!({
                "model": "anthropic/claude-test",
                "messages": [
                    {"role": "system", "content": "be a strategist"},
                    {"role": "user", "content": "the data"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "reply text"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ProviderClient::from_settings(&settings(
            ProviderChoice::OpenRouter,
            format!("{}/", server.uri()),
        ))
        .unwrap();
        assert!(matches!(client, ProviderClient::OpenRouter(_)));

        let reply = client
            .submit("be a strategist", "the data", "anthropic/claude-test")
            .await
            .expect("submit");
        assert_eq!(reply, "reply text");
    }

    #[tokio::test]
    async fn auth_failure_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid x-api-key"))
            .expect(1)
            .mount(&server)
            .await;

        let client = AnthropicClient::new(&settings(ProviderChoice::Anthropic, server.uri())).unwrap();
        let err = client.submit("i", "c", "m").await.unwrap_err();

        assert!(matches!(err, PositioningError::Transport(_)));
        assert!(err.to_string().contains("HTTP 401"));
        assert!(err.to_string().contains("invalid x-api-key"));
    }

    #[tokio::test]
    async fn malformed_envelope_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let client =
            OpenRouterClient::new(&settings(ProviderChoice::OpenRouter, server.uri())).unwrap();
        let err = client.submit("i", "c", "m").await.unwrap_err();
        assert!(matches!(err, PositioningError::Transport(_)));
    }

    #[tokio::test]
    async fn unreachable_service_is_transport_error() {
        let client = AnthropicClient::new(&settings(
            ProviderChoice::Anthropic,
            "http://127.0.0.1:9".into(),
        ))
        .unwrap();
        let err = client.submit("i", "c", "m").await.unwrap_err();
        assert!(matches!(err, PositioningError::Transport(_)));
    }
}
