//! Scripted gateway for tests and dry runs.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::gateway::{Generation, GatewayError, LanguageModelGateway};

#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Failure(String),
}

#[derive(Debug, Default)]
struct Script {
    replies: Vec<Reply>,
    next: AtomicUsize,
}

/// A gateway that answers each model from a canned script.
///
/// Replies for a model are served in order and cycle once exhausted. Every
/// prompt received is recorded so tests can inspect what an agent was shown.
#[derive(Debug, Default)]
pub struct ScriptedGateway {
    scripts: BTreeMap<String, Script>,
    prompts: Mutex<Vec<(String, String)>>,
    latency: Duration,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply for `model`.
    pub fn respond(mut self, model: &str, text: impl Into<String>) -> Self {
        self.script(model).replies.push(Reply::Text(text.into()));
        self
    }

    /// Queue a failed invocation for `model`, reported as a malformed response.
    pub fn fail(mut self, model: &str, reason: impl Into<String>) -> Self {
        self.script(model).replies.push(Reply::Failure(reason.into()));
        self
    }

    /// Delay every invocation by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// All `(model, prompt)` pairs received so far, in call order.
    pub fn prompts(&self) -> Vec<(String, String)> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    /// Prompts received by one model, in call order.
    pub fn prompts_for(&self, model: &str) -> Vec<String> {
        self.prompts()
            .into_iter()
            .filter(|(m, _)| m == model)
            .map(|(_, prompt)| prompt)
            .collect()
    }

    fn script(&mut self, model: &str) -> &mut Script {
        self.scripts.entry(model.to_string()).or_default()
    }
}

#[async_trait]
impl LanguageModelGateway for ScriptedGateway {
    async fn invoke(&self, model: &str, prompt: &str) -> Result<Generation, GatewayError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push((model.to_string(), prompt.to_string()));
        }

        let script = self
            .scripts
            .get(model)
            .filter(|s| !s.replies.is_empty())
            .ok_or_else(|| GatewayError::UnknownModel(model.to_string()))?;

        let idx = script.next.fetch_add(1, Ordering::Relaxed);
        match &script.replies[idx % script.replies.len()] {
            Reply::Text(text) => Ok(Generation::new(text.clone())),
            Reply::Failure(reason) => Err(GatewayError::MalformedResponse(reason.clone())),
        }
    }

    async fn list_models(&self) -> Result<Vec<String>, GatewayError> {
        Ok(self.scripts.keys().cloned().collect())
    }
}
