//! LLM client: provider trait + OpenAI Chat Completions implementation + scripted mock.
//!
//! The model's output is untrusted text; whether it is valid structured data
//! is the caller's problem (see `analyze::parse`). This layer only moves
//! messages over the wire.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::ai::AiConfig;
use crate::error::LensError;

/// Message role on the chat wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One outbound chat message: role and content only, nothing else is sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Trait object used by the analyzer and the conversation manager.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send the full message list and return the completion text.
    async fn complete(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
    ) -> Result<String, LensError>;

    /// Provider name for diagnostics.
    fn provider_name(&self) -> &'static str;
}

/// Convenient alias used by callers.
pub type DynLlmClient = Arc<dyn LlmClient>;

/// Factory: build a client according to config and environment variables.
///
/// * If `LLM_TEST_MODE=mock`, returns a deterministic scripted client.
/// * Else if `config.enabled==false`, returns a disabled client.
/// * Else builds the real provider (OpenAI).
pub fn build_client(config: &AiConfig) -> DynLlmClient {
    if std::env::var("LLM_TEST_MODE")
        .map(|v| v == "mock")
        .unwrap_or(false)
    {
        return Arc::new(ScriptedClient::fixed(
            r#"{"summary_points":["**Mock insight** — scripted reply for local runs."],"overall_sentiment":"neutral","sentiment_explainer":"Mock mode is active.","counts":{"positive":0,"neutral":1,"negative":0}}"#,
        ));
    }

    if !config.enabled {
        return Arc::new(DisabledClient);
    }

    match config.provider.as_str() {
        "openai" => Arc::new(OpenAiClient::new(config.api_key.clone(), &config.model)),
        _ => Arc::new(DisabledClient),
    }
}

/// OpenAI provider (Chat Completions API).
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>, model: &str) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("fx-lens/0.1 (+github.com/lumlich/fx-lens)")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(30))
            .build()
            .expect("reqwest client");
        Self {
            http,
            api_key: api_key.into(),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
    ) -> Result<String, LensError> {
        if self.api_key.is_empty() {
            return Err(LensError::MissingApiKey("openai"));
        }

        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: &'a [ChatMessage],
            temperature: f32,
        }
        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: ChoiceMsg,
        }
        #[derive(Deserialize)]
        struct ChoiceMsg {
            content: String,
        }

        let req = Req {
            model: &self.model,
            messages,
            temperature,
        };

        let resp = self
            .http
            .post("https://api.openai.com/v1/chat/completions")
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(LensError::Transport(format!(
                "openai returned HTTP {}",
                resp.status()
            )));
        }

        let body: Resp = resp
            .json()
            .await
            .map_err(|e| LensError::MalformedResponse(e.to_string()))?;

        let content = body
            .choices
            .first()
            .map(|c| c.message.content.trim().to_string())
            .unwrap_or_default();
        if content.is_empty() {
            return Err(LensError::MalformedResponse(
                "completion had no content".into(),
            ));
        }
        Ok(content)
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}

/// Always errors with `Disabled`; used when AI is switched off.
pub struct DisabledClient;

#[async_trait]
impl LlmClient for DisabledClient {
    async fn complete(
        &self,
        _messages: &[ChatMessage],
        _temperature: f32,
    ) -> Result<String, LensError> {
        Err(LensError::Disabled)
    }

    fn provider_name(&self) -> &'static str {
        "disabled"
    }
}

/// One scripted outcome for the mock client.
#[derive(Debug, Clone)]
pub enum ScriptedOutcome {
    Reply(String),
    TransportFail(String),
}

/// Deterministic client for tests and `LLM_TEST_MODE=mock` runs.
///
/// Outcomes are served in order; the last one repeats. Every request's
/// outbound message list is recorded for assertions.
pub struct ScriptedClient {
    script: Vec<ScriptedOutcome>,
    calls: AtomicUsize,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedClient {
    pub fn new(script: Vec<ScriptedOutcome>) -> Self {
        Self {
            script,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn fixed(reply: impl Into<String>) -> Self {
        Self::new(vec![ScriptedOutcome::Reply(reply.into())])
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self::new(vec![ScriptedOutcome::TransportFail(message.into())])
    }

    /// Number of `complete` calls observed so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Snapshot of every outbound message list, in call order.
    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.lock().expect("requests mutex poisoned").clone()
    }
}

#[async_trait]
impl LlmClient for ScriptedClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        _temperature: f32,
    ) -> Result<String, LensError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .expect("requests mutex poisoned")
            .push(messages.to_vec());

        let idx = n.min(self.script.len().saturating_sub(1));
        match self.script.get(idx) {
            Some(ScriptedOutcome::Reply(s)) => Ok(s.clone()),
            Some(ScriptedOutcome::TransportFail(m)) => Err(LensError::Transport(m.clone())),
            None => Err(LensError::Disabled),
        }
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}
