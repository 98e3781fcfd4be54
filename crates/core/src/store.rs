//! Conversation store: reads a conversation file and appends new turns to it.
//!
//! The file is only ever appended to. Bytes already on disk are never
//! rewritten, so an interrupted append can lose the new turn but never
//! damage earlier ones.

use std::fs::{self, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::marker::{MarkerSet, RoleMarker};
use crate::message::Message;
use crate::template::{ParameterSet, Template};

/// Reads and appends conversation files using one marker syntax.
#[derive(Debug, Clone)]
pub struct ConversationStore {
    markers: MarkerSet,
    prime_user_turn: bool,
}

impl ConversationStore {
    pub fn new(markers: MarkerSet) -> Self {
        Self {
            markers,
            prime_user_turn: false,
        }
    }

    /// Follow each appended message with an empty user section.
    pub fn with_user_priming(mut self, enabled: bool) -> Self {
        self.prime_user_turn = enabled;
        self
    }

    pub fn markers(&self) -> &MarkerSet {
        &self.markers
    }

    /// Read the full file content.
    pub fn load(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).map_err(|e| Error::io(path, e))
    }

    /// Read the file and parse it into a template.
    pub fn read_template(&self, path: &Path, params: &ParameterSet) -> Result<Template> {
        let raw = self.load(path)?;
        Template::parse(&raw, params, &self.markers)
    }

    /// Seed a new conversation file with a single system section.
    ///
    /// Fails if the file already exists.
    pub fn create(&self, path: &Path, system_prompt: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| Error::io(path, e))?;

        let seed = format!(
            "{}\n{}\n",
            self.markers.literal(RoleMarker::System),
            system_prompt.trim()
        );
        file.write_all(seed.as_bytes())
            .map_err(|e| Error::io(path, e))?;

        info!(path = %path.display(), "Created conversation file");
        Ok(())
    }

    /// Append `message` as a new section at the end of the file.
    ///
    /// One newline separates the new marker from content that already ends
    /// in a newline, two otherwise. An empty file has no trailing byte to
    /// inspect and is rejected.
    pub fn append(&self, path: &Path, message: &Message) -> Result<()> {
        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .open(path)
            .map_err(|e| Error::io(path, e))?;

        let len = file.metadata().map_err(|e| Error::io(path, e))?.len();
        if len == 0 {
            return Err(Error::Integrity {
                path: path.to_path_buf(),
                reason: "cannot append to an empty conversation file".into(),
            });
        }

        let mut last = [0u8; 1];
        file.seek(SeekFrom::End(-1))
            .and_then(|_| file.read_exact(&mut last))
            .map_err(|e| Error::io(path, e))?;

        let separator = if last[0] == b'\n' { "\n" } else { "\n\n" };
        let section = self.render_section(message);

        file.write_all(format!("{separator}{section}").as_bytes())
            .and_then(|_| file.sync_all())
            .map_err(|e| Error::io(path, e))?;

        debug!(
            path = %path.display(),
            role = %message.role,
            bytes = separator.len() + section.len(),
            "Appended message"
        );
        Ok(())
    }

    fn render_section(&self, message: &Message) -> String {
        let marker = self.markers.literal(RoleMarker::for_role(message.role));
        let mut section = format!("{marker}\n{}", message.content.trim());
        if self.prime_user_turn {
            section.push_str("\n\n");
            section.push_str(self.markers.literal(RoleMarker::User));
            section.push_str("\n\n");
        }
        section
    }
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new(MarkerSet::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn file_with(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let store = ConversationStore::default();
        let err = store.load(Path::new("/nonexistent/conversation.md")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn append_after_trailing_newline_uses_one_separator() {
        let before = "# system\nBe kind.\n\n# user\nfinish up\n";
        let file = file_with(before);
        let store = ConversationStore::default();

        store.append(file.path(), &Message::assistant("done")).unwrap();

        let after = fs::read_to_string(file.path()).unwrap();
        assert_eq!(after, format!("{before}\n# assistant\ndone"));
        assert!(after.ends_with("# assistant\ndone"));
    }

    #[test]
    fn append_without_trailing_newline_uses_two() {
        let before = "# user\nwow";
        let file = file_with(before);
        let store = ConversationStore::default();

        store.append(file.path(), &Message::assistant("ok")).unwrap();

        let after = fs::read_to_string(file.path()).unwrap();
        assert_eq!(after, "# user\nwow\n\n# assistant\nok");
    }

    #[test]
    fn append_preserves_prior_bytes() {
        let before = "# system\nünïcødé\n>>> comment stays on disk\n# user\nq";
        let file = file_with(before);
        let store = ConversationStore::default().with_user_priming(true);

        store
            .append(file.path(), &Message::assistant("  padded reply \n"))
            .unwrap();

        let after = fs::read(file.path()).unwrap();
        assert!(after.len() > before.len());
        assert_eq!(&after[..before.len()], before.as_bytes());
        assert_eq!(
            std::str::from_utf8(&after[before.len()..]).unwrap(),
            "\n\n# assistant\npadded reply\n\n# user\n\n"
        );
    }

    #[test]
    fn primed_file_parses_with_empty_user_turn() {
        let file = file_with("# user\nhello\n");
        let store = ConversationStore::default().with_user_priming(true);
        store.append(file.path(), &Message::assistant("hi")).unwrap();

        let template = store.read_template(file.path(), &ParameterSet::new()).unwrap();
        assert_eq!(
            template.messages(),
            &[
                Message::user("hello"),
                Message::assistant("hi"),
                Message::user(""),
            ]
        );
    }

    #[test]
    fn append_to_empty_file_is_integrity_error() {
        let file = file_with("");
        let store = ConversationStore::default();
        let err = store.append(file.path(), &Message::assistant("x")).unwrap_err();
        assert!(matches!(err, Error::Integrity { .. }));
        assert_eq!(fs::read(file.path()).unwrap().len(), 0);
    }

    #[test]
    fn append_to_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConversationStore::default();
        let err = store
            .append(&dir.path().join("absent.md"), &Message::assistant("x"))
            .unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn bracket_store_uses_bracket_markers() {
        let file = file_with("[user]\nq\n");
        let store = ConversationStore::new(MarkerSet::bracket()).with_user_priming(true);
        store.append(file.path(), &Message::assistant("a")).unwrap();
        let after = fs::read_to_string(file.path()).unwrap();
        assert_eq!(after, "[user]\nq\n\n[assistant]\na\n\n[user]\n\n");
    }

    #[test]
    fn create_seeds_single_system_message() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conversation.md");
        let store = ConversationStore::default();

        store.create(&path, "You are a helpful assistant.").unwrap();

        let template = store.read_template(&path, &ParameterSet::new()).unwrap();
        assert_eq!(
            template.messages(),
            &[Message::system("You are a helpful assistant.")]
        );
        assert!(store.create(&path, "again").is_err());
    }

    #[test]
    fn repeated_appends_grow_monotonically() {
        let file = file_with("# user\none");
        let store = ConversationStore::default();
        let mut previous = fs::read(file.path()).unwrap();

        for reply in ["first", "second", "third"] {
            store.append(file.path(), &Message::assistant(reply)).unwrap();
            let current = fs::read(file.path()).unwrap();
            assert!(current.len() > previous.len());
            assert!(current.starts_with(&previous));
            previous = current;
        }

        let messages = store
            .read_template(file.path(), &ParameterSet::new())
            .unwrap()
            .into_messages();
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[3], Message::assistant("third"));
    }
}
