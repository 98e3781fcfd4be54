//! `sira run`: perform one turn of a conversation directory.

use std::path::{Path, PathBuf};

use sira_config::{CONVERSATION_FILE, ConversationConfig, default_credentials_path, load_credentials};
use sira_core::{ConversationStore, Result, Turn};
use tracing::debug;

pub async fn run(dir: &Path, credentials: Option<PathBuf>) -> Result<()> {
    let config = ConversationConfig::load(dir)?;

    let credentials_path = credentials.unwrap_or_else(default_credentials_path);
    let credentials = load_credentials(&credentials_path)?;

    let provider = sira_providers::build(&config.model)?;
    let store = ConversationStore::new(config.marker_set()?)
        .with_user_priming(config.conversation.prime_user_turn);
    let conversation = dir.join(CONVERSATION_FILE);

    debug!(
        dir = %dir.display(),
        credentials = %credentials_path.display(),
        "Running turn"
    );

    let turn = Turn {
        store: &store,
        path: &conversation,
        params: &config.params,
        options: &config.model,
        history_limit: config.conversation.history_limit,
    };
    let mut stdout = std::io::stdout();
    turn.run(provider.as_ref(), &credentials, &mut stdout).await?;

    Ok(())
}
