//! Configuration loading and validation for sira.
//!
//! A conversation directory holds `params.toml` (parameters, model options
//! and marker settings) next to the conversation file itself. Credentials
//! live in a separate per-user file, see [`credentials`].

pub mod credentials;

use serde::{Deserialize, Serialize};
use sira_core::{MarkerSet, ModelOptions, ParameterSet};
use std::path::{Path, PathBuf};

pub use credentials::{default_credentials_path, load_credentials};

/// Options document inside a conversation directory.
pub const PARAMS_FILE: &str = "params.toml";

/// Conversation file inside a conversation directory.
pub const CONVERSATION_FILE: &str = "conversation.md";

/// The root configuration structure.
///
/// Maps directly to `<dir>/params.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationConfig {
    /// Values substituted into `{name}` placeholders
    #[serde(default)]
    pub params: ParameterSet,

    /// Model selection and sampling options
    #[serde(default)]
    pub model: ModelOptions,

    /// Marker syntax and append behavior
    #[serde(default)]
    pub conversation: ConversationSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSettings {
    #[serde(default)]
    pub markers: MarkerStyle,

    /// Literals used when `markers = "custom"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<CustomMarkers>,

    /// Leave an empty user section after each reply
    #[serde(default = "default_true")]
    pub prime_user_turn: bool,

    /// Send at most this many trailing messages (plus a leading system one)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_limit: Option<usize>,
}

fn default_true() -> bool {
    true
}

impl Default for ConversationSettings {
    fn default() -> Self {
        Self {
            markers: MarkerStyle::default(),
            custom: None,
            prime_user_turn: true,
            history_limit: None,
        }
    }
}

/// Which marker literal table to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerStyle {
    /// `# system`, comments `>>>`
    #[default]
    Hash,
    /// `[system]`, comments `///`
    Bracket,
    Custom,
}

impl std::str::FromStr for MarkerStyle {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hash" => Ok(Self::Hash),
            "bracket" => Ok(Self::Bracket),
            "custom" => Ok(Self::Custom),
            other => Err(ConfigError::ValidationError(format!(
                "unknown marker style \"{other}\" (expected hash, bracket or custom)"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomMarkers {
    pub system: String,
    pub assistant: String,
    pub user: String,
    #[serde(default = "default_comment")]
    pub comment: String,
}

fn default_comment() -> String {
    ">>>".into()
}

impl ConversationConfig {
    /// Load `params.toml` from a conversation directory.
    pub fn load(dir: &Path) -> Result<Self, ConfigError> {
        Self::load_from(&dir.join(PARAMS_FILE))
    }

    /// Load configuration from a specific path.
    ///
    /// Provider defaults are filled in before validation.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.apply_provider_defaults();
        config.validate()?;

        tracing::debug!(
            path = %path.display(),
            provider = %config.model.provider,
            model = %config.model.model,
            params = config.params.len(),
            "Loaded conversation config"
        );
        Ok(config)
    }

    /// Fill unset model options with the provider's documented defaults.
    pub fn apply_provider_defaults(&mut self) {
        if self.model.provider == "mistral" {
            let model = &mut self.model;
            model.top_p.get_or_insert(1.0);
            model.max_tokens.get_or_insert(1500);
            model.temperature.get_or_insert(0.7);
            model.safe_mode.get_or_insert(true);
            model.random_seed.get_or_insert(0);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "model.model must not be empty".into(),
            ));
        }
        if let Some(t) = self.model.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(ConfigError::ValidationError(
                    "temperature must be between 0.0 and 2.0".into(),
                ));
            }
        }
        if let Some(p) = self.model.top_p {
            if !(0.0..=1.0).contains(&p) {
                return Err(ConfigError::ValidationError(
                    "top_p must be between 0.0 and 1.0".into(),
                ));
            }
        }
        if self.conversation.history_limit == Some(0) {
            return Err(ConfigError::ValidationError(
                "history_limit must be at least 1".into(),
            ));
        }
        self.marker_set()?;
        Ok(())
    }

    /// Build the marker table selected by `[conversation]`.
    pub fn marker_set(&self) -> Result<MarkerSet, ConfigError> {
        match self.conversation.markers {
            MarkerStyle::Hash => Ok(MarkerSet::hash()),
            MarkerStyle::Bracket => Ok(MarkerSet::bracket()),
            MarkerStyle::Custom => {
                let custom = self.conversation.custom.as_ref().ok_or_else(|| {
                    ConfigError::ValidationError(
                        "markers = \"custom\" requires a [conversation.custom] table".into(),
                    )
                })?;
                MarkerSet::new(
                    custom.system.as_str(),
                    custom.assistant.as_str(),
                    custom.user.as_str(),
                    custom.comment.as_str(),
                )
                .map_err(|e| ConfigError::ValidationError(e.to_string()))
            }
        }
    }

    /// Write this config to `path` as TOML.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        std::fs::write(path, content).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            params: ParameterSet::new(),
            model: ModelOptions {
                temperature: Some(0.7),
                max_tokens: Some(500),
                ..ModelOptions::default()
            },
            conversation: ConversationSettings::default(),
        }
    }
}

/// Get the user's home directory.
pub(crate) fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigError> for sira_core::Error {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::ReadError { path, source } | ConfigError::WriteError { path, source } => {
                sira_core::Error::Io { path, source }
            }
            other => sira_core::Error::Config {
                message: other.to_string(),
            },
        }
    }
}
