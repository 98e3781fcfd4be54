//! # sira core
//!
//! Domain types and the conversation pipeline for sira.
//!
//! A conversation lives in a plain text file. Each turn reads the file,
//! strips comment lines, substitutes `{name}` parameters, splits the text
//! at role markers into messages, streams a completion for them, and
//! appends the reply back to the file. Completion backends implement
//! [`Provider`]; everything else is here.

pub mod error;
pub mod history;
pub mod marker;
pub mod message;
pub mod provider;
pub mod store;
pub mod template;
pub mod turn;

// Re-export key types at crate root for ergonomics
pub use error::{Error, ProviderError, Result};
pub use marker::{MarkerSet, RoleMarker};
pub use message::{Message, Role};
pub use provider::{ChunkReceiver, Credentials, ModelOptions, Provider, ProviderRequest, StreamChunk};
pub use store::ConversationStore;
pub use template::{ParameterSet, Template};
pub use turn::{Turn, collect_stream};
