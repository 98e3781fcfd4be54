//! Provider trait: the abstraction over completion services.
//!
//! A Provider takes the parsed conversation plus model options and returns
//! the reply as an ordered stream of content fragments. Credentials are
//! passed in explicitly on every call; providers never go looking for them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::ProviderError;
use crate::message::Message;

/// Model selection and sampling options.
///
/// Everything not modeled here is kept in `extra` and forwarded to the
/// wire request untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelOptions {
    /// Which completion service to use (e.g., "openai", "mistral")
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Override the service's base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// Model identifier (e.g., "gpt-3.5-turbo", "mistral-tiny")
    #[serde(default)]
    pub model: String,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Temperature (0.0 = deterministic, 2.0 = very creative)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub random_seed: Option<u64>,

    /// Ask the service to prepend its own safety prompt (Mistral)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safe_mode: Option<bool>,

    /// Provider-specific options passed through verbatim
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn default_provider() -> String {
    "openai".into()
}

impl ModelOptions {
    pub fn new(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            api_url: None,
            model: model.into(),
            max_tokens: None,
            temperature: None,
            top_p: None,
            random_seed: None,
            safe_mode: None,
            extra: serde_json::Map::new(),
        }
    }
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self::new(default_provider(), "gpt-3.5-turbo")
    }
}

/// One completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// The conversation messages, in turn order
    pub messages: Vec<Message>,

    pub options: ModelOptions,

    /// Whether to stream the response
    #[serde(default)]
    pub stream: bool,
}

/// A single chunk in a streaming response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamChunk {
    /// Partial content delta
    #[serde(default)]
    pub content: Option<String>,

    /// Whether this is the final chunk
    #[serde(default)]
    pub done: bool,
}

impl StreamChunk {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            done: false,
        }
    }

    pub fn end() -> Self {
        Self {
            content: None,
            done: true,
        }
    }
}

/// Receiving half of a response stream.
pub type ChunkReceiver = mpsc::Receiver<std::result::Result<StreamChunk, ProviderError>>;

/// An API credential handed to the provider at call time.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Name the key was stored under (e.g., "OPENAI_API_KEY")
    name: String,
    key: String,
}

impl Credentials {
    pub fn new(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn api_key(&self) -> &str {
        &self.key
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("name", &self.name)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// The core Provider trait.
///
/// Every completion backend implements this. The turn runner calls
/// `stream()` without knowing which service is behind it.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "openai", "mistral").
    fn name(&self) -> &str;

    /// Send a request and get a stream of response chunks.
    ///
    /// Chunks arrive in generation order. The stream ends with a chunk
    /// whose `done` flag is set, by closing, or with an error item.
    async fn stream(
        &self,
        request: ProviderRequest,
        credentials: &Credentials,
    ) -> std::result::Result<ChunkReceiver, ProviderError>;
}
