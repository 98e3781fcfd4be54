//! Bounds how much of a long conversation is sent with each turn.

use crate::message::{Message, Role};

/// Keep the last `limit` messages, plus a leading system message if the
/// conversation starts with one.
///
/// `None` (or a conversation already within the limit) passes through
/// unchanged.
pub fn window(messages: Vec<Message>, limit: Option<usize>) -> Vec<Message> {
    let Some(limit) = limit else {
        return messages;
    };
    if messages.len() <= limit {
        return messages;
    }

    let mut kept = Vec::with_capacity(limit + 1);
    if messages.first().is_some_and(|m| m.role == Role::System) {
        kept.push(messages[0].clone());
    }
    kept.extend_from_slice(&messages[messages.len() - limit..]);
    kept
}
