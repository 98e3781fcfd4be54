//! Per-user credential file.
//!
//! The file holds a single `KEY=value` line, for example
//! `OPENAI_API_KEY=sk-...`. Blank lines and `#` comments are skipped.

use std::path::{Path, PathBuf};

use sira_core::Credentials;

use crate::{ConfigError, dirs_home};

/// `~/.sira/credentials`
pub fn default_credentials_path() -> PathBuf {
    dirs_home().join(".sira").join("credentials")
}

/// Read and parse a credential file.
pub fn load_credentials(path: &Path) -> Result<Credentials, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let credentials = parse(&content).map_err(|reason| ConfigError::ParseError {
        path: path.to_path_buf(),
        reason: reason.into(),
    })?;

    tracing::debug!(path = %path.display(), name = credentials.name(), "Loaded credentials");
    Ok(credentials)
}

fn parse(content: &str) -> Result<Credentials, &'static str> {
    let line = content
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty() && !l.starts_with('#'))
        .ok_or("credential file is empty")?;

    let (name, key) = line.split_once('=').ok_or("expected KEY=value")?;
    let (name, key) = (name.trim(), key.trim());

    if name.is_empty() {
        return Err("credential name is empty");
    }
    if key.is_empty() {
        return Err("credential value is empty");
    }

    Ok(Credentials::new(name, key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn parses_key_value() {
        let file = write("OPENAI_API_KEY= sk-abc123 \n");
        let creds = load_credentials(file.path()).unwrap();
        assert_eq!(creds.name(), "OPENAI_API_KEY");
        assert_eq!(creds.api_key(), "sk-abc123");
    }

    #[test]
    fn value_may_contain_equals() {
        let creds = parse("MISTRAL_API_KEY=abc==").unwrap();
        assert_eq!(creds.api_key(), "abc==");
    }

    #[test]
    fn skips_comments_and_blank_lines() {
        let creds = parse("\n# personal key\nKEY=v\n").unwrap();
        assert_eq!(creds.api_key(), "v");
    }

    #[test]
    fn missing_separator_rejected() {
        let file = write("sk-just-a-key\n");
        let err = load_credentials(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn empty_value_rejected() {
        assert!(parse("KEY=").is_err());
        assert!(parse("").is_err());
    }

    #[test]
    fn missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_credentials(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadError { .. }));
    }

    #[test]
    fn debug_output_is_redacted() {
        let creds = parse("KEY=sk-secret").unwrap();
        let debug = format!("{creds:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn default_path_is_under_home() {
        assert!(default_credentials_path().ends_with(".sira/credentials"));
    }
}
