// Oversized - Large File Storage for Git
// Copyright (C) 2025 Oversized Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published
// by the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.

//! Pointer record codec
//!
//! A pointer is the small stand-in committed to git in place of a large
//! file's body. It is a single-line JSON record followed by a newline:
//!
//! ```text
//! {"magic":"oversized-v001","sha256":"4d7a...2393","length":12345}
//! ```
//!
//! The record always fits inside the first 4096-byte block of a file, which
//! is why the filters only ever need to peek one block to classify their
//! input. Decoding is deliberately forgiving in direction: any input that is
//! not exactly a pointer record is a normal, non-fatal "not a pointer"
//! outcome, because the filters run over arbitrary binary files.

use crate::error::GitResult;
use oversized_store::Digest;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Magic string identifying a pointer record
pub const MAGIC: &str = "oversized-v001";

/// One I/O block; pointer detection reads at most this many bytes
pub const BLOCK_LEN: usize = 4096;

/// Why a block of bytes is not a pointer record
///
/// None of these are fatal to a filter run; they all mean "treat the input
/// as ordinary file content".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PointerDecodeError {
    /// Input longer than one block can never be a bare pointer file
    #[error("input exceeds one block")]
    TooLarge,

    /// Not valid UTF-8
    #[error("input is not text")]
    NotText,

    /// Not a JSON record of the expected shape, or followed by garbage
    #[error("not a pointer record: {0}")]
    Malformed(String),

    /// Valid record shape with the wrong magic string
    #[error("unrecognized magic: {0}")]
    BadMagic(String),

    /// sha256 field is not 64 hex characters
    #[error("invalid digest in pointer: {0}")]
    BadDigest(String),
}

/// Pointer record committed to git in place of a large file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pointer {
    /// Format magic, always [`MAGIC`] for records this version writes
    pub magic: String,

    /// SHA-256 of the replaced file's bytes, 64 hex characters
    pub sha256: String,

    /// Length of the replaced file in bytes
    pub length: u64,
}

impl Pointer {
    /// Build a pointer for an object already in the store.
    pub fn new(digest: &Digest, length: u64) -> Self {
        Pointer {
            magic: MAGIC.to_string(),
            sha256: digest.to_hex(),
            length,
        }
    }

    /// Serialize to the wire form: one JSON line plus a trailing newline.
    pub fn encode(&self) -> Vec<u8> {
        // serde_json cannot fail on this struct; fall back to an empty
        // record rather than panicking in filter context.
        let mut bytes = serde_json::to_vec(self).unwrap_or_default();
        bytes.push(b'\n');
        bytes
    }

    /// Try to decode a pointer from the first block of a file.
    ///
    /// Accepts only a complete record: leading/trailing whitespace is
    /// tolerated, anything else before or after the JSON is not. Never reads
    /// beyond the supplied slice and never panics on arbitrary input.
    pub fn decode(first_block: &[u8]) -> Result<Self, PointerDecodeError> {
        if first_block.len() > BLOCK_LEN {
            return Err(PointerDecodeError::TooLarge);
        }

        let text = std::str::from_utf8(first_block).map_err(|_| PointerDecodeError::NotText)?;
        let trimmed = text.trim();

        // serde_json::from_str rejects trailing non-whitespace, which is
        // exactly the whole-block-is-the-record rule.
        let pointer: Pointer = serde_json::from_str(trimmed)
            .map_err(|e| PointerDecodeError::Malformed(e.to_string()))?;

        if pointer.magic != MAGIC {
            return Err(PointerDecodeError::BadMagic(pointer.magic));
        }

        if pointer.sha256.len() != 64 || !pointer.sha256.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(PointerDecodeError::BadDigest(pointer.sha256));
        }

        Ok(pointer)
    }

    /// The referenced object's digest.
    pub fn digest(&self) -> GitResult<Digest> {
        // sha256 is validated at both construction paths, so this only
        // fails on a hand-built Pointer with a bad field.
        Ok(self.sha256.parse().map_err(oversized_store::StoreError::from)?)
    }
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} bytes)", self.sha256, self.length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_HEX: &str = "4d7a214614ab2935c943f9e0ff69d22eadbb8f32b1258daaa5e2ca24d17e2393";

    fn valid_pointer() -> Pointer {
        Pointer {
            magic: MAGIC.to_string(),
            sha256: VALID_HEX.to_string(),
            length: 12345,
        }
    }

    #[test]
    fn test_encode_shape() {
        let encoded = valid_pointer().encode();
        let text = std::str::from_utf8(&encoded).unwrap();

        assert!(text.ends_with('\n'));
        assert_eq!(text.lines().count(), 1);
        assert!(text.starts_with(r#"{"magic":"oversized-v001""#));
        assert!(encoded.len() < BLOCK_LEN);
    }

    #[test]
    fn test_roundtrip() {
        let original = valid_pointer();
        let decoded = Pointer::decode(&original.encode()).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn test_new_from_digest() {
        let digest = Digest::hash(b"content");
        let pointer = Pointer::new(&digest, 7);

        assert_eq!(pointer.magic, MAGIC);
        assert_eq!(pointer.sha256, digest.to_hex());
        assert_eq!(pointer.digest().unwrap(), digest);
    }

    #[test]
    fn test_decode_tolerates_surrounding_whitespace() {
        let mut bytes = b"  \n".to_vec();
        bytes.extend_from_slice(&valid_pointer().encode());
        bytes.extend_from_slice(b"  \n");

        assert_eq!(Pointer::decode(&bytes).unwrap(), valid_pointer());
    }

    #[test]
    fn test_decode_rejects_trailing_garbage() {
        let mut bytes = valid_pointer().encode();
        bytes.extend_from_slice(b"extra file content");

        assert!(matches!(
            Pointer::decode(&bytes),
            Err(PointerDecodeError::Malformed(_))
        ));
    }

    #[test]
    fn test_decode_rejects_wrong_magic() {
        let json = format!(r#"{{"magic":"other-v999","sha256":"{}","length":1}}"#, VALID_HEX);
        assert!(matches!(
            Pointer::decode(json.as_bytes()),
            Err(PointerDecodeError::BadMagic(_))
        ));
    }

    #[test]
    fn test_decode_rejects_bad_digest() {
        let json = r#"{"magic":"oversized-v001","sha256":"nothex","length":1}"#;
        assert!(matches!(
            Pointer::decode(json.as_bytes()),
            Err(PointerDecodeError::BadDigest(_))
        ));
    }

    #[test]
    fn test_decode_binary_junk_is_non_fatal() {
        let junk: Vec<u8> = (0..=255u8).cycle().take(2048).collect();
        assert!(Pointer::decode(&junk).is_err());

        assert!(matches!(
            Pointer::decode(&[0xFF, 0xFE, 0x00]),
            Err(PointerDecodeError::NotText)
        ));
    }

    #[test]
    fn test_decode_rejects_oversize_input() {
        let big = vec![b' '; BLOCK_LEN + 1];
        assert!(matches!(
            Pointer::decode(&big),
            Err(PointerDecodeError::TooLarge)
        ));
    }

    #[test]
    fn test_decode_rejects_plain_text() {
        assert!(Pointer::decode(b"This is just regular file content").is_err());
        assert!(Pointer::decode(b"").is_err());
    }
}
