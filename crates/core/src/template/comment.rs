//! Comment filter: drops sentinel-prefixed lines before anything else sees them.

/// Remove every line that starts with `sentinel`.
///
/// Dropped lines vanish entirely; they are not replaced with blanks.
pub fn strip_comments(text: &str, sentinel: &str) -> String {
    text.split('\n')
        .filter(|line| !line.starts_with(sentinel))
        .collect::<Vec<_>>()
        .join("\n")
}
