//! OpenAI-compatible provider implementation.
//!
//! Works with: OpenAI, Mistral, OpenRouter, Ollama, Groq, vLLM and any
//! endpoint exposing `/chat/completions` with server-sent events.
//!
//! Only streaming requests are supported. The SSE body is read on a
//! spawned task and forwarded fragment by fragment over a channel. A
//! stream that reports an error, sends an unreadable event, or closes
//! before `[DONE]` ends with an error item rather than an end chunk.

use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use sira_core::error::ProviderError;
use sira_core::message::Message;
use sira_core::provider::*;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Time allowed to establish the connection.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Longest silence tolerated between two reads of the response.
const READ_TIMEOUT: Duration = Duration::from_secs(120);

/// Request-field naming used by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// `seed`; `safe_mode` is not sent
    OpenAi,
    /// `random_seed` and `safe_prompt`
    Mistral,
}

impl Dialect {
    pub fn for_provider(name: &str) -> Self {
        if name == "mistral" {
            Dialect::Mistral
        } else {
            Dialect::OpenAi
        }
    }
}

/// An OpenAI-compatible LLM provider.
///
/// The API key is not stored here; it arrives with every call.
pub struct OpenAiCompatProvider {
    name: String,
    base_url: String,
    dialect: Dialect,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    /// Create a new OpenAI-compatible provider.
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Result<Self, ProviderError> {
        Self::with_read_timeout(name, base_url, READ_TIMEOUT)
    }

    /// Only idle gaps between reads are bounded, not the whole request.
    fn with_read_timeout(
        name: impl Into<String>,
        base_url: impl Into<String>,
        read_timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .read_timeout(read_timeout)
            .build()
            .map_err(|e| ProviderError::Network(format!("failed to create HTTP client: {e}")))?;

        let name = name.into();
        Ok(Self {
            dialect: Dialect::for_provider(&name),
            name,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Convert our Message types to OpenAI API format.
    fn to_api_messages(messages: &[Message]) -> Vec<ApiMessage> {
        messages
            .iter()
            .map(|m| ApiMessage {
                role: m.role.as_str().into(),
                content: m.content.clone(),
            })
            .collect()
    }

    /// Build the JSON body for a streaming chat completion.
    fn request_body(&self, request: &ProviderRequest) -> serde_json::Value {
        let options = &request.options;
        let mut body = serde_json::json!({
            "model": options.model,
            "messages": Self::to_api_messages(&request.messages),
            "stream": true,
        });

        if let Some(temperature) = options.temperature {
            body["temperature"] = serde_json::json!(temperature);
        }
        if let Some(max_tokens) = options.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }
        if let Some(top_p) = options.top_p {
            body["top_p"] = serde_json::json!(top_p);
        }

        match self.dialect {
            Dialect::Mistral => {
                if let Some(seed) = options.random_seed {
                    body["random_seed"] = serde_json::json!(seed);
                }
                if let Some(safe) = options.safe_mode {
                    body["safe_prompt"] = serde_json::json!(safe);
                }
            }
            Dialect::OpenAi => {
                if let Some(seed) = options.random_seed {
                    body["seed"] = serde_json::json!(seed);
                }
                if options.safe_mode.is_some() {
                    debug!(provider = %self.name, "safe_mode is not supported, ignoring");
                }
            }
        }

        // Pass-through options never override the modeled ones
        if let Some(map) = body.as_object_mut() {
            for (key, value) in &options.extra {
                map.entry(key.clone()).or_insert_with(|| value.clone());
            }
        }

        body
    }
}

#[async_trait]
impl Provider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn stream(
        &self,
        request: ProviderRequest,
        credentials: &Credentials,
    ) -> std::result::Result<ChunkReceiver, ProviderError> {
        if !request.stream {
            return Err(ProviderError::NotConfigured(format!(
                "{} only supports streaming requests",
                self.name
            )));
        }

        let url = format!("{}/chat/completions", self.base_url);
        let body = self.request_body(&request);

        debug!(
            provider = %self.name,
            model = %request.options.model,
            messages = request.messages.len(),
            "Sending streaming request"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(credentials.api_key())
            .header("Accept", "text/event-stream")
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status().as_u16();

        if status == 401 || status == 403 {
            return Err(ProviderError::AuthenticationFailed(format!(
                "{} rejected the key stored as {}",
                self.name,
                credentials.name()
            )));
        }

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Provider streaming error");
            return Err(ProviderError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let (tx, rx) = mpsc::channel(64);
        let provider_name = self.name.clone();

        // Spawn task to read the SSE byte stream and parse chunks
        tokio::spawn(async move {
            let mut byte_stream = response.bytes_stream();
            let mut decoder = SseDecoder::default();
            let mut finished = false;

            while let Some(chunk_result) = byte_stream.next().await {
                let bytes = match chunk_result {
                    Ok(b) => b,
                    Err(e) => {
                        let _ = tx
                            .send(Err(ProviderError::StreamInterrupted(e.to_string())))
                            .await;
                        return;
                    }
                };

                for event in decoder.feed(&bytes) {
                    if !forward(&tx, &provider_name, event, &mut finished).await {
                        return;
                    }
                }
            }

            for event in decoder.finish() {
                if !forward(&tx, &provider_name, event, &mut finished).await {
                    return;
                }
            }

            // Closed without [DONE]: complete only if a finish_reason arrived
            let last = if finished {
                debug!(provider = %provider_name, "Stream closed after finish_reason without [DONE]");
                Ok(StreamChunk::end())
            } else {
                warn!(provider = %provider_name, "Stream closed before the reply finished");
                Err(ProviderError::StreamInterrupted(
                    "stream closed before [DONE]".into(),
                ))
            };
            let _ = tx.send(last).await;
        });

        Ok(rx)
    }
}

/// Send one decoded event downstream. Returns `false` once the stream
/// is over, either terminated or abandoned by the receiver.
async fn forward(
    tx: &mpsc::Sender<Result<StreamChunk, ProviderError>>,
    provider: &str,
    event: SseEvent,
    finished: &mut bool,
) -> bool {
    match event {
        SseEvent::Delta(text) => tx.send(Ok(StreamChunk::text(text))).await.is_ok(),
        SseEvent::Finish => {
            *finished = true;
            true
        }
        SseEvent::Done => {
            let _ = tx.send(Ok(StreamChunk::end())).await;
            false
        }
        SseEvent::Error(e) => {
            warn!(provider, error = %e, "Provider stream failed");
            let _ = tx.send(Err(e)).await;
            false
        }
    }
}

/// Something decoded from one SSE `data:` line.
#[derive(Debug)]
enum SseEvent {
    Delta(String),
    Finish,
    Done,
    Error(ProviderError),
}

/// Splits an SSE byte stream into lines and decodes `data:` payloads.
///
/// Bytes are buffered until a full line is available, so a multi-byte
/// character split across network reads is decoded intact.
#[derive(Default)]
struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    fn feed(&mut self, bytes: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(bytes);
        let mut events = Vec::new();

        while let Some(line_end) = self.buffer.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=line_end).collect();
            let line = String::from_utf8_lossy(&raw);
            decode_line(line.trim_end_matches(['\n', '\r']), &mut events);
        }

        events
    }

    /// Decode whatever is left once the body has ended.
    fn finish(&mut self) -> Vec<SseEvent> {
        let mut events = Vec::new();
        if !self.buffer.is_empty() {
            let raw = std::mem::take(&mut self.buffer);
            decode_line(String::from_utf8_lossy(&raw).trim_end_matches('\r'), &mut events);
        }
        events
    }
}

fn decode_line(line: &str, events: &mut Vec<SseEvent>) {
    // Skip empty lines, SSE comments and non-data fields
    let Some(data) = line.strip_prefix("data:").map(str::trim) else {
        return;
    };

    // "[DONE]" signals end of stream
    if data == "[DONE]" {
        events.push(SseEvent::Done);
        return;
    }

    let stream_resp = match serde_json::from_str::<StreamResponse>(data) {
        Ok(r) => r,
        Err(e) => {
            events.push(SseEvent::Error(ProviderError::StreamInterrupted(format!(
                "unreadable stream event ({e}): {data}"
            ))));
            return;
        }
    };

    if let Some(error) = stream_resp.error {
        events.push(SseEvent::Error(ProviderError::StreamInterrupted(format!(
            "provider reported an error: {}",
            error_message(&error)
        ))));
        return;
    }

    if let Some(choice) = stream_resp.choices.into_iter().next() {
        if let Some(content) = choice.delta.content.filter(|c| !c.is_empty()) {
            events.push(SseEvent::Delta(content));
        }
        if choice.finish_reason.is_some() {
            events.push(SseEvent::Finish);
        }
    }
}

/// `{"message": "..."}`, a bare string, or anything else verbatim.
fn error_message(error: &serde_json::Value) -> String {
    error
        .get("message")
        .and_then(|m| m.as_str())
        .or_else(|| error.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| error.to_string())
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    content: String,
}

// --- Streaming SSE types ---

/// A single SSE `data: {...}` chunk from a streaming response.
#[derive(Debug, Deserialize)]
struct StreamResponse {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}
