//! Turns a token stream into role-tagged messages.

use crate::marker::MarkerSet;
use crate::message::Message;

use super::tokenizer::Token;

/// Slice `text` into one message per token.
///
/// A token's content runs from the end of its marker literal to the start
/// of the next marker (or end of text), trimmed on both sides. Anything
/// before the first marker belongs to no message.
pub fn segment(
    text: &str,
    tokens: impl IntoIterator<Item = Token>,
    markers: &MarkerSet,
) -> Vec<Message> {
    let mut messages = Vec::new();
    let mut open: Option<Token> = None;

    for token in tokens {
        if let Some(prev) = open.replace(token) {
            messages.push(section(text, prev, token.offset, markers));
        }
    }

    if let Some(last) = open {
        messages.push(section(text, last, text.len(), markers));
    }

    messages
}

fn section(text: &str, token: Token, end: usize, markers: &MarkerSet) -> Message {
    let start = token.offset + markers.literal(token.kind).len();
    Message::new(token.kind.role(), text[start..end].trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marker::RoleMarker;
    use crate::message::Role;
    use crate::template::tokenizer::Tokenizer;

    fn parse(text: &str, markers: &MarkerSet) -> Vec<Message> {
        segment(text, Tokenizer::new(text, markers), markers)
    }

    #[test]
    fn spans_run_between_markers() {
        let text = "# assistant\nWrite a haiku\n\n# user\nwow";
        assert_eq!(
            parse(text, &MarkerSet::hash()),
            vec![Message::assistant("Write a haiku"), Message::user("wow")]
        );
    }

    #[test]
    fn zero_tokens_zero_messages() {
        assert!(parse("no markers at all", &MarkerSet::hash()).is_empty());
    }

    #[test]
    fn preamble_is_ignored() {
        let text = "stray preamble\n# system\nrules";
        assert_eq!(parse(text, &MarkerSet::hash()), vec![Message::system("rules")]);
    }

    #[test]
    fn empty_sections_yield_empty_content() {
        let text = "# system\n\n# user\n\n";
        let messages = parse(text, &MarkerSet::hash());
        assert_eq!(messages.len(), 2);
        assert!(messages.iter().all(|m| m.content.is_empty()));
        assert_eq!(messages[1].role, Role::User);
    }

    #[test]
    fn order_follows_tokens() {
        let tokens = vec![
            Token {
                kind: RoleMarker::User,
                offset: 0,
            },
            Token {
                kind: RoleMarker::Assistant,
                offset: 9,
            },
        ];
        let text = "[user] a [assistant] b";
        let messages = segment(text, tokens, &MarkerSet::bracket());
        assert_eq!(messages, vec![Message::user("a"), Message::assistant("b")]);
    }
}
