//! Completion providers for sira.
//!
//! All providers implement the `sira_core::Provider` trait.
//! The router selects the correct provider based on the model options.

pub mod openai_compat;
pub mod router;

pub use openai_compat::{Dialect, OpenAiCompatProvider};
pub use router::{build, default_base_url};
