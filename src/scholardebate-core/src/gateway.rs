//! Language model gateway.
//!
//! The debate core only needs two things from a model server: one blocking
//! completion per turn and the list of models it can serve.

use std::sync::Arc;
use std::time::Duration;

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::error::OpenAIError;
use async_openai::types::chat::{
    ChatCompletionRequestMessage, ChatCompletionRequestUserMessage,
    CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::config::GatewaySettings;
use crate::error::DebateError;

/// Errors raised while talking to a model server.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Model API error: {0}")]
    Api(#[from] OpenAIError),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The server does not serve the requested model.
    #[error("Unknown model: {0}")]
    UnknownModel(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),
}

/// Full text produced by one model invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub text: String,
}

impl Generation {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[async_trait]
pub trait LanguageModelGateway: Send + Sync {
    /// Send a single prompt to `model` and wait for its complete answer.
    async fn invoke(&self, model: &str, prompt: &str) -> Result<Generation, GatewayError>;

    /// Models the server can serve, used to offer agent choices.
    async fn list_models(&self) -> Result<Vec<String>, GatewayError>;
}

#[derive(Debug, Deserialize)]
struct ModelList {
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
}

/// Gateway for any OpenAI-compatible endpoint, local model servers included.
#[derive(Debug, Clone)]
pub struct OpenAiGateway {
    client: Client<OpenAIConfig>,
    http: reqwest::Client,
    api_base: String,
    api_key: String,
}

impl OpenAiGateway {
    pub fn new(api_base: impl Into<String>, api_key: impl Into<String>) -> Result<Self, DebateError> {
        let api_base = api_base.into();
        let api_key = api_key.into();

        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| DebateError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        let config = OpenAIConfig::new()
            .with_api_key(&api_key)
            .with_api_base(&api_base);

        let client = Client::with_config(config).with_http_client(http.clone());

        Ok(Self {
            client,
            http,
            api_base,
            api_key,
        })
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }
}

#[async_trait]
impl LanguageModelGateway for OpenAiGateway {
    async fn invoke(&self, model: &str, prompt: &str) -> Result<Generation, GatewayError> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(model)
            .messages(vec![ChatCompletionRequestMessage::User(
                ChatCompletionRequestUserMessage {
                    content: prompt.to_string().into(),
                    name: None,
                },
            )])
            .build()?;

        debug!(model, prompt_bytes = prompt.len(), "sending chat completion");
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| classify_api_error(model, e))?;

        let choice = response.choices.into_iter().next().ok_or_else(|| {
            GatewayError::MalformedResponse(format!("no choices returned by {model}"))
        })?;

        choice
            .message
            .content
            .map(Generation::new)
            .ok_or_else(|| GatewayError::MalformedResponse(format!("{model} returned no content")))
    }

    async fn list_models(&self) -> Result<Vec<String>, GatewayError> {
        let url = format!("{}/models", self.api_base.trim_end_matches('/'));

        let mut request = self.http.get(&url);
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }

        let response = request.send().await?.error_for_status()?;
        let list: ModelList = response
            .json()
            .await
            .map_err(|e| GatewayError::MalformedResponse(e.to_string()))?;

        Ok(list.data.into_iter().map(|m| m.id).collect())
    }
}

/// Map a server's "model not found" answer to `UnknownModel`.
///
/// OpenAI reports `code: model_not_found`; local servers such as Ollama only
/// say so in the message.
fn classify_api_error(model: &str, error: OpenAIError) -> GatewayError {
    if let OpenAIError::ApiError(api) = &error {
        let message = api.message.to_lowercase();
        let not_found = api.code.as_deref() == Some("model_not_found")
            || (message.contains("model") && message.contains("not found"));
        if not_found {
            return GatewayError::UnknownModel(model.to_string());
        }
    }
    GatewayError::Api(error)
}

/// Bounds every invocation of the wrapped gateway by a deadline.
#[derive(Debug, Clone)]
pub struct TimeoutGateway<G> {
    inner: G,
    timeout: Duration,
}

impl<G> TimeoutGateway<G> {
    pub fn new(inner: G, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

#[async_trait]
impl<G: LanguageModelGateway> LanguageModelGateway for TimeoutGateway<G> {
    async fn invoke(&self, model: &str, prompt: &str) -> Result<Generation, GatewayError> {
        tokio::time::timeout(self.timeout, self.inner.invoke(model, prompt))
            .await
            .map_err(|_| GatewayError::Timeout(self.timeout))?
    }

    async fn list_models(&self) -> Result<Vec<String>, GatewayError> {
        tokio::time::timeout(self.timeout, self.inner.list_models())
            .await
            .map_err(|_| GatewayError::Timeout(self.timeout))?
    }
}

/// Build the gateway described by `settings`.
pub fn connect(settings: &GatewaySettings) -> Result<Arc<dyn LanguageModelGateway>, DebateError> {
    let gateway = OpenAiGateway::new(&settings.api_base, &settings.api_key)?;

    Ok(match settings.timeout_secs {
        Some(secs) => Arc::new(TimeoutGateway::new(gateway, Duration::from_secs(secs))),
        None => Arc::new(gateway),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::ScriptedGateway;

    #[tokio::test]
    async fn test_timeout_gateway_expires() {
        let slow = ScriptedGateway::new()
            .respond("llama3", "too late")
            .with_latency(Duration::from_millis(500));
        let gateway = TimeoutGateway::new(slow, Duration::from_millis(20));

        let err = gateway.invoke("llama3", "prompt").await.unwrap_err();
        assert!(matches!(err, GatewayError::Timeout(d) if d == Duration::from_millis(20)));
    }

    #[tokio::test]
    async fn test_timeout_gateway_passes_through() {
        let fast = ScriptedGateway::new().respond("llama3", "in time");
        let gateway = TimeoutGateway::new(fast, Duration::from_secs(5));

        let generation = gateway.invoke("llama3", "prompt").await.unwrap();
        assert_eq!(generation.text, "in time");
        assert_eq!(gateway.list_models().await.unwrap(), vec!["llama3".to_string()]);
    }

    fn api_error(message: &str, code: Option<&str>) -> OpenAIError {
        OpenAIError::ApiError(async_openai::error::ApiError {
            message: message.to_string(),
            r#type: Some("invalid_request_error".to_string()),
            param: None,
            code: code.map(str::to_string),
        })
    }

    #[test]
    fn test_missing_model_is_unknown_model() {
        let openai = classify_api_error(
            "gpt-9",
            api_error("The model `gpt-9` does not exist", Some("model_not_found")),
        );
        assert!(matches!(openai, GatewayError::UnknownModel(m) if m == "gpt-9"));

        let ollama = classify_api_error(
            "llama9",
            api_error("model \"llama9\" not found, try pulling it first", None),
        );
        assert!(matches!(ollama, GatewayError::UnknownModel(m) if m == "llama9"));
    }

    #[test]
    fn test_other_api_errors_pass_through() {
        let err = classify_api_error("llama3", api_error("rate limit exceeded", None));
        assert!(matches!(err, GatewayError::Api(_)));

        let err = classify_api_error("llama3", OpenAIError::InvalidArgument("bad".to_string()));
        assert!(matches!(err, GatewayError::Api(_)));
    }

    #[test]
    fn test_connect_with_timeout() {
        let settings = GatewaySettings {
            timeout_secs: Some(30),
            ..GatewaySettings::default()
        };
        assert!(connect(&settings).is_ok());
    }

    #[tokio::test]
    #[ignore] // Requires a local OpenAI-compatible model server
    async fn test_openai_gateway_lists_models() {
        let gateway = OpenAiGateway::new("http://localhost:11434/v1", "").unwrap();
        let models = gateway.list_models().await.unwrap();
        assert!(!models.is_empty());
    }
}
