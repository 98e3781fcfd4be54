//! Provider router: selects the completion backend named in the model options.

use std::sync::Arc;

use sira_core::error::ProviderError;
use sira_core::provider::{ModelOptions, Provider};
use tracing::debug;

use crate::openai_compat::OpenAiCompatProvider;

/// Build the provider described by `options`.
///
/// `api_url` wins over the built-in table. Unknown providers need an
/// explicit `api_url`.
pub fn build(options: &ModelOptions) -> Result<Arc<dyn Provider>, ProviderError> {
    let name = options.provider.as_str();
    let base_url = match options.api_url.as_deref() {
        Some(url) => url,
        None => default_base_url(name).ok_or_else(|| {
            ProviderError::NotConfigured(format!(
                "unknown provider \"{name}\"; set model.api_url to use an OpenAI-compatible endpoint"
            ))
        })?,
    };

    debug!(provider = name, base_url, "Selected provider");
    Ok(Arc::new(OpenAiCompatProvider::new(name, base_url)?))
}

/// Get the default base URL for well-known providers.
pub fn default_base_url(provider_name: &str) -> Option<&'static str> {
    let url = match provider_name {
        "openai" => "https://api.openai.com/v1",
        "mistral" => "https://api.mistral.ai/v1",
        "openrouter" => "https://openrouter.ai/api/v1",
        "ollama" => "http://localhost:11434/v1",
        "deepseek" => "https://api.deepseek.com/v1",
        "groq" => "https://api.groq.com/openai/v1",
        "together" => "https://api.together.xyz/v1",
        "fireworks" => "https://api.fireworks.ai/inference/v1",
        "vllm" => "http://localhost:8000/v1",
        "llamacpp" | "llama.cpp" => "http://localhost:8080/v1",
        _ => return None,
    };
    Some(url)
}
