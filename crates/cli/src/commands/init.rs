//! `sira init`: create a conversation directory.

use std::path::Path;

use sira_config::{CONVERSATION_FILE, ConversationConfig, MarkerStyle, PARAMS_FILE};
use sira_core::{ConversationStore, Error, Result};

const SYSTEM_PROMPT: &str = "You are a helpful assistant. Keep answers short.";

pub fn run(
    dir: &Path,
    markers: MarkerStyle,
    provider: Option<String>,
    model: Option<String>,
) -> Result<()> {
    if dir.exists() {
        return Err(Error::Io {
            path: dir.to_path_buf(),
            source: std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                "directory already exists",
            ),
        });
    }
    if markers == MarkerStyle::Custom {
        return Err(Error::Config {
            message: "init supports hash or bracket markers; set custom markers in params.toml"
                .into(),
        });
    }

    let mut config = ConversationConfig::default();
    config.conversation.markers = markers;
    if let Some(provider) = provider {
        if provider == "mistral" && model.is_none() {
            config.model.model = "mistral-tiny".into();
        }
        config.model.provider = provider;
    }
    if let Some(model) = model {
        config.model.model = model;
    }
    config.apply_provider_defaults();
    config.validate()?;

    std::fs::create_dir_all(dir).map_err(|e| Error::Io {
        path: dir.to_path_buf(),
        source: e,
    })?;
    config.save(&dir.join(PARAMS_FILE))?;
    println!("✅ Created {}", dir.join(PARAMS_FILE).display());

    let conversation = dir.join(CONVERSATION_FILE);
    let store = ConversationStore::new(config.marker_set()?);
    store.create(&conversation, SYSTEM_PROMPT)?;
    println!("✅ Created {}", conversation.display());

    println!("\n📝 Next steps:");
    println!("   1. Put your key in ~/.sira/credentials (e.g. OPENAI_API_KEY=sk-...)");
    println!("   2. Add a user section to {}", CONVERSATION_FILE);
    println!("   3. Run: sira run {}", dir.display());

    Ok(())
}
