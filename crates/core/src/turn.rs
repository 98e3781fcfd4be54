//! One conversation turn: parse, call the provider, stream, append.
//!
//! Strictly sequential. The conversation file is read once at the start
//! and appended to once at the end; any failure in between leaves it as
//! it was.

use std::io::Write;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{Error, ProviderError, Result};
use crate::history::window;
use crate::message::Message;
use crate::provider::{ChunkReceiver, Credentials, ModelOptions, Provider, ProviderRequest};
use crate::store::ConversationStore;
use crate::template::ParameterSet;

/// Everything needed to run one turn against a conversation file.
#[derive(Debug, Clone, Copy)]
pub struct Turn<'a> {
    pub store: &'a ConversationStore,
    pub path: &'a Path,
    pub params: &'a ParameterSet,
    pub options: &'a ModelOptions,
    pub history_limit: Option<usize>,
}

impl Turn<'_> {
    /// Run the turn, echoing each fragment to `out` as it arrives.
    ///
    /// Returns the assistant message that was appended to the file.
    pub async fn run<W: Write>(
        &self,
        provider: &dyn Provider,
        credentials: &Credentials,
        out: &mut W,
    ) -> Result<Message> {
        let template = self.store.read_template(self.path, self.params)?;
        let total = template.messages().len();
        let messages = window(template.into_messages(), self.history_limit);

        if messages.is_empty() {
            return Err(Error::Integrity {
                path: self.path.to_path_buf(),
                reason: "conversation has no messages".into(),
            });
        }

        debug!(
            provider = provider.name(),
            model = %self.options.model,
            sent = messages.len(),
            total,
            "Starting turn"
        );

        let request = ProviderRequest {
            messages,
            options: self.options.clone(),
            stream: true,
        };

        let rx = provider.stream(request, credentials).await?;
        let content = collect_stream(rx, out).await?;

        let reply = Message::assistant(content.trim());
        self.store.append(self.path, &reply)?;

        info!(
            path = %self.path.display(),
            chars = reply.content.chars().count(),
            "Turn complete"
        );
        Ok(reply)
    }
}

/// Drain a response stream into one string, echoing fragments to `out`.
///
/// Fragments are written and flushed in arrival order. A trailing newline
/// is written once the end chunk arrives. A stream that closes without an
/// end chunk is incomplete and fails with a transport error.
pub async fn collect_stream<W: Write>(mut rx: ChunkReceiver, out: &mut W) -> Result<String> {
    let mut content = String::new();

    loop {
        let Some(item) = rx.recv().await else {
            return Err(ProviderError::StreamInterrupted(
                "response stream closed before it finished".into(),
            )
            .into());
        };
        let chunk = item?;

        if let Some(fragment) = chunk.content.as_deref().filter(|f| !f.is_empty()) {
            content.push_str(fragment);
            out.write_all(fragment.as_bytes())
                .and_then(|_| out.flush())
                .map_err(output_error)?;
        }

        if chunk.done {
            break;
        }
    }

    writeln!(out).map_err(output_error)?;
    Ok(content)
}

fn output_error(source: std::io::Error) -> Error {
    Error::io("<output>", source)
}
