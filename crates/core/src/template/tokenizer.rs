//! Single-pass marker scanner.
//!
//! Offsets are UTF-8 byte offsets into the scanned text. The cursor only
//! ever rests on `char` boundaries, so every offset is safe to slice with.

use crate::marker::{MarkerSet, RoleMarker};

/// A marker occurrence in the filtered, substituted text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: RoleMarker,
    /// Byte offset of the first byte of the marker literal.
    pub offset: usize,
}

/// Lazily yields [`Token`]s in strictly increasing offset order.
///
/// On a match the cursor jumps past the whole literal, so tokens never
/// overlap. Consumed tokens are gone; scan again with a new tokenizer.
pub struct Tokenizer<'a> {
    text: &'a str,
    markers: &'a MarkerSet,
    cursor: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(text: &'a str, markers: &'a MarkerSet) -> Self {
        Self {
            text,
            markers,
            cursor: 0,
        }
    }
}

impl Iterator for Tokenizer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        let (text, markers) = (self.text, self.markers);

        while self.cursor < text.len() {
            let rest = &text[self.cursor..];

            if let Some((kind, literal)) = markers
                .entries()
                .find(|(_, literal)| rest.starts_with(literal))
            {
                let token = Token {
                    kind,
                    offset: self.cursor,
                };
                self.cursor += literal.len();
                return Some(token);
            }

            // Step one code point; `rest` is non-empty here.
            self.cursor += rest.chars().next().map_or(1, char::len_utf8);
        }

        None
    }
}
