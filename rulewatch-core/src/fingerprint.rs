//! Content hashing and identity-to-storage-key mapping.

use rulewatch_common::util::{slugify, truncate_chars};
use sha2::{Digest, Sha256};

use crate::normalize::canonicalize_encoding;

/// Maximum slug length inside a storage key.
pub const KEY_SLUG_CHARS: usize = 48;

/// Hex chars of the identity digest appended to the slug.
pub const KEY_DIGEST_CHARS: usize = 16;

/// SHA-256 of the canonicalized text, hex encoded.
pub fn content_hash(text: &str) -> String {
    let canonical = canonicalize_encoding(text);
    hex::encode(Sha256::digest(canonical.as_bytes()))
}

/// Deterministic storage key for an identity.
///
/// The slug keeps keys readable on disk; the digest suffix keeps two identities that
/// slugify alike (`"2026/001"` and `"2026-001"`) apart.
pub fn storage_key(identity: &str) -> String {
    let identity = identity.trim();
    let slug = slugify(identity);
    let slug = truncate_chars(&slug, KEY_SLUG_CHARS).trim_end_matches('-');
    let slug = if slug.is_empty() { "doc" } else { slug };

    let digest = hex::encode(Sha256::digest(identity.as_bytes()));
    format!("{slug}-{}", &digest[..KEY_DIGEST_CHARS])
}
