//! Text-generation collaborator.
//!
//! [`ChatCompletion`] is the seam between the editor and whatever produces
//! the rewritten text. [`OpenAiChatClient`] talks to an OpenAI-compatible
//! `/chat/completions` endpoint; [`StaticChat`] is a canned stand-in.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use templatesmith_shared::{Result, TemplatesmithError, Usage};

/// User-Agent string for chat requests.
const USER_AGENT: &str = concat!("Templatesmith/", env!("CARGO_PKG_VERSION"));

/// Upstream error bodies are cut to this many bytes before logging.
const MAX_ERROR_BODY: usize = 500;

// ---------------------------------------------------------------------------
// Request / response model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
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
}

/// Ordered messages plus sampling settings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Generated text and its token accounting.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatResponse {
    /// Upstream response id, when provided.
    pub id: Option<String>,
    pub content: String,
    pub usage: Usage,
}

/// Anything that can turn a [`ChatRequest`] into text.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    /// Run one completion with `credential` as the bearer token.
    async fn complete(&self, request: &ChatRequest, credential: &str) -> Result<ChatResponse>;
}

// ---------------------------------------------------------------------------
// OpenAI wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct CompletionBody {
    id: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
    total_tokens: Option<u64>,
}

impl CompletionBody {
    fn into_response(self) -> Result<ChatResponse> {
        let content = self
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| TemplatesmithError::Upstream("completion contained no text".into()))?;

        let usage = match self.usage {
            Some(wire) => {
                let usage = Usage::new(wire.prompt_tokens, wire.completion_tokens);
                if wire.total_tokens.is_some_and(|t| t != usage.total_units) {
                    debug!(
                        reported = wire.total_tokens,
                        derived = usage.total_units,
                        "upstream total_tokens disagrees with its parts"
                    );
                }
                usage
            }
            None => Usage::default(),
        };

        Ok(ChatResponse {
            id: self.id,
            content,
            usage,
        })
    }
}

// ---------------------------------------------------------------------------
// OpenAiChatClient
// ---------------------------------------------------------------------------

/// Production client for OpenAI-compatible chat APIs.
#[derive(Clone)]
pub struct OpenAiChatClient {
    client: Client,
    endpoint: String,
}

impl OpenAiChatClient {
    /// `api_base_url` is the API root, e.g. `https://api.openai.com/v1`.
    pub fn new(api_base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| {
                TemplatesmithError::Network(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", api_base_url.trim_end_matches('/')),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ChatCompletion for OpenAiChatClient {
    #[instrument(skip_all, fields(model = %request.model, messages = request.messages.len()))]
    async fn complete(&self, request: &ChatRequest, credential: &str) -> Result<ChatResponse> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(credential)
            .json(request)
            .send()
            .await
            .map_err(|e| TemplatesmithError::Upstream(format!("chat request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let snippet = &body[..floor_char_boundary(&body, MAX_ERROR_BODY)];
            warn!(%status, body = snippet, "chat API returned an error");
            return Err(TemplatesmithError::Upstream(format!(
                "chat API returned HTTP {status}: {snippet}"
            )));
        }

        let body: CompletionBody = response
            .json()
            .await
            .map_err(|e| TemplatesmithError::Upstream(format!("malformed chat response: {e}")))?;

        let parsed = body.into_response()?;
        debug!(
            id = parsed.id.as_deref().unwrap_or("-"),
            prompt_tokens = parsed.usage.prompt_units,
            completion_tokens = parsed.usage.completion_units,
            "chat completion received"
        );
        Ok(parsed)
    }
}

// ---------------------------------------------------------------------------
// StaticChat
// ---------------------------------------------------------------------------

/// Deterministic collaborator: answers every request with the same reply
/// and records what it was asked.
#[derive(Debug, Default)]
pub struct StaticChat {
    reply: Option<(String, Usage)>,
    calls: AtomicUsize,
    last_request: Mutex<Option<ChatRequest>>,
}

impl StaticChat {
    /// Reply with `content` and the given usage on every call.
    pub fn replying(content: impl Into<String>, usage: Usage) -> Self {
        Self {
            reply: Some((content.into(), usage)),
            ..Self::default()
        }
    }

    /// Fail every call with an upstream error.
    pub fn failing() -> Self {
        Self::default()
    }

    /// Number of completions requested so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<ChatRequest> {
        self.last_request
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ChatCompletion for StaticChat {
    async fn complete(&self, request: &ChatRequest, _credential: &str) -> Result<ChatResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut guard) = self.last_request.lock() {
            *guard = Some(request.clone());
        }

        match &self.reply {
            Some((content, usage)) => Ok(ChatResponse {
                id: Some(format!("static-{}", self.calls())),
                content: content.clone(),
                usage: *usage,
            }),
            None => Err(TemplatesmithError::Upstream("static chat configured to fail".into())),
        }
    }
}

/// Largest char boundary in `s` that is `<= max`.
fn floor_char_boundary(s: &str, max: usize) -> usize {
    if s.len() <= max {
        return s.len();
    }
    (0..=max).rev().find(|i| s.is_char_boundary(*i)).unwrap_or(0)
}
