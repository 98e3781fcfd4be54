//! Role markers and the literal table that binds them to text.
//!
//! A marker introduces a message section in the conversation file. The
//! literal for each kind is data, not code: the same engine parses
//! `# system` documents and `[system]` documents depending on which
//! [`MarkerSet`] it is handed.

use crate::error::{Error, Result};
use crate::message::Role;

/// The closed set of section markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoleMarker {
    System,
    Assistant,
    User,
}

impl RoleMarker {
    /// All kinds, in table order.
    pub const ALL: [RoleMarker; 3] = [RoleMarker::System, RoleMarker::Assistant, RoleMarker::User];

    /// The message role this marker introduces.
    pub fn role(self) -> Role {
        match self {
            RoleMarker::System => Role::System,
            RoleMarker::Assistant => Role::Assistant,
            RoleMarker::User => Role::User,
        }
    }

    /// The marker that introduces messages of `role`.
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::System => RoleMarker::System,
            Role::Assistant => RoleMarker::Assistant,
            Role::User => RoleMarker::User,
        }
    }
}

/// Literal table for one marker syntax, plus its comment sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerSet {
    system: String,
    assistant: String,
    user: String,
    comment: String,
}

impl MarkerSet {
    /// Build a custom marker set.
    ///
    /// Rejects empty literals and role literals where one is a prefix of
    /// another, since the tokenizer could not tell them apart.
    pub fn new(
        system: impl Into<String>,
        assistant: impl Into<String>,
        user: impl Into<String>,
        comment: impl Into<String>,
    ) -> Result<Self> {
        let set = Self {
            system: system.into(),
            assistant: assistant.into(),
            user: user.into(),
            comment: comment.into(),
        };
        set.validate()?;
        Ok(set)
    }

    /// `# system` / `# assistant` / `# user`, comments start with `>>>`.
    pub fn hash() -> Self {
        Self {
            system: "# system".into(),
            assistant: "# assistant".into(),
            user: "# user".into(),
            comment: ">>>".into(),
        }
    }

    /// `[system]` / `[assistant]` / `[user]`, comments start with `///`.
    pub fn bracket() -> Self {
        Self {
            system: "[system]".into(),
            assistant: "[assistant]".into(),
            user: "[user]".into(),
            comment: "///".into(),
        }
    }

    /// The literal bound to `kind`.
    pub fn literal(&self, kind: RoleMarker) -> &str {
        match kind {
            RoleMarker::System => &self.system,
            RoleMarker::Assistant => &self.assistant,
            RoleMarker::User => &self.user,
        }
    }

    /// The comment sentinel.
    pub fn comment(&self) -> &str {
        &self.comment
    }

    /// (kind, literal) pairs in table order.
    pub fn entries(&self) -> impl Iterator<Item = (RoleMarker, &str)> + '_ {
        RoleMarker::ALL.into_iter().map(|kind| (kind, self.literal(kind)))
    }

    fn validate(&self) -> Result<()> {
        if self.comment.is_empty() {
            return Err(Error::config("comment sentinel must not be empty"));
        }

        for (kind, literal) in self.entries() {
            if literal.is_empty() {
                return Err(Error::config(format!(
                    "marker for {} must not be empty",
                    kind.role()
                )));
            }
        }

        for (a, lit_a) in self.entries() {
            for (b, lit_b) in self.entries() {
                if a != b && lit_b.starts_with(lit_a) {
                    return Err(Error::config(format!(
                        "marker \"{lit_a}\" ({}) is a prefix of \"{lit_b}\" ({})",
                        a.role(),
                        b.role()
                    )));
                }
            }
        }

        Ok(())
    }
}

impl Default for MarkerSet {
    fn default() -> Self {
        Self::hash()
    }
}
