//! Content-addressed sprite naming.
//!
//! `[hash]` expands to the full blake3 hex digest of the document,
//! `[hash:N]` to its first N characters. Same bytes, same name.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static HASH_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[hash(?::(\d+))?\]").unwrap());

/// Full lowercase hex blake3 digest of `content` (64 chars).
pub fn content_hash(content: &[u8]) -> String {
    blake3::hash(content).to_hex().to_string()
}

/// Substitute the content hash into every placeholder of `pattern`.
pub fn hash_name(pattern: &str, content: &[u8]) -> String {
    let digest = content_hash(content);
    HASH_TOKEN
        .replace_all(pattern, |caps: &Captures<'_>| {
            let len = caps
                .get(1)
                .and_then(|m| m.as_str().parse::<usize>().ok())
                .map_or(digest.len(), |n| n.clamp(1, digest.len()));
            digest[..len].to_string()
        })
        .into_owned()
}
