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

//! Content digest for the object store
//!
//! A [`Digest`] is the SHA-256 hash of an object's bytes. It doubles as the
//! object's filename in the local store and (prefixed) its key in the remote
//! bucket, so identical content always lands in the same place.

use crate::error::{StoreError, StoreResult};
use sha2::{Digest as _, Sha256};
use std::fmt;
use tokio::io::{AsyncRead, AsyncReadExt};

/// SHA-256 content digest, the unique storage key of an object
///
/// # Examples
///
/// ```
/// use oversized_store::Digest;
///
/// let digest = Digest::hash(b"Hello, World!");
/// assert_eq!(digest.to_hex().len(), 64);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Digest([u8; 32]);

impl Digest {
    /// Hash a byte slice.
    pub fn hash(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Digest(hasher.finalize().into())
    }

    /// Finish an externally driven SHA-256 accumulation.
    pub(crate) fn hash_state(hasher: Sha256) -> Self {
        Digest(hasher.finalize().into())
    }

    /// Hash everything an async reader yields, in 64 KiB chunks.
    ///
    /// Constant memory regardless of input size. Returns the digest and the
    /// number of bytes consumed.
    pub async fn from_reader<R: AsyncRead + Unpin>(mut reader: R) -> std::io::Result<(Self, u64)> {
        let mut hasher = Sha256::new();
        let mut buffer = vec![0u8; 64 * 1024];
        let mut total = 0u64;

        loop {
            let n = reader.read(&mut buffer).await?;
            if n == 0 {
                break;
            }
            hasher.update(&buffer[..n]);
            total += n as u64;
        }

        Ok((Digest(hasher.finalize().into()), total))
    }

    /// Streaming hash of a file on disk.
    pub async fn from_file<P: AsRef<std::path::Path>>(path: P) -> std::io::Result<(Self, u64)> {
        let file = tokio::fs::File::open(path.as_ref()).await?;
        Self::from_reader(file).await
    }

    /// Parse a digest from its 64-character hex form.
    pub fn from_hex(hex_str: &str) -> StoreResult<Self> {
        if hex_str.len() != 64 || !hex_str.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(StoreError::InvalidDigest(hex_str.to_string()));
        }

        let bytes = hex::decode(hex_str).map_err(|_| StoreError::InvalidDigest(hex_str.to_string()))?;
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Digest(arr))
    }

    /// Lowercase hex representation, as used for filenames and bucket keys.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Abbreviated hex form for display (first 8 characters).
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.short())
    }
}

impl std::str::FromStr for Digest {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_known_value() {
        let digest = Digest::hash(b"Hello, World!");
        assert_eq!(
            digest.to_hex(),
            "dffd6021bb2bd5b0af676290809ec3a53191dd81c7f70a4b28688a362182986f"
        );
    }

    #[test]
    fn test_identical_content_identical_digest() {
        assert_eq!(Digest::hash(b"same bytes"), Digest::hash(b"same bytes"));
        assert_ne!(Digest::hash(b"same bytes"), Digest::hash(b"other bytes"));
    }

    #[test]
    fn test_hex_roundtrip() {
        let digest = Digest::hash(b"roundtrip");
        let parsed = Digest::from_hex(&digest.to_hex()).unwrap();
        assert_eq!(digest, parsed);
    }

    #[test]
    fn test_from_hex_rejects_bad_input() {
        assert!(Digest::from_hex("abc").is_err());
        assert!(Digest::from_hex(&"g".repeat(64)).is_err());
        assert!(Digest::from_hex(&"a".repeat(63)).is_err());
        assert!(Digest::from_hex(&"a".repeat(64)).is_ok());
    }

    #[test]
    fn test_short_display() {
        let digest = Digest::hash(b"short");
        assert_eq!(digest.short().len(), 8);
        assert!(digest.to_hex().starts_with(&digest.short()));
    }

    #[tokio::test]
    async fn test_from_reader_matches_hash() {
        let data = vec![0xABu8; 200 * 1024];
        let (digest, len) = Digest::from_reader(&data[..]).await.unwrap();
        assert_eq!(len, data.len() as u64);
        assert_eq!(digest, Digest::hash(&data));
    }

    #[tokio::test]
    async fn test_from_reader_empty() {
        let (digest, len) = Digest::from_reader(&b""[..]).await.unwrap();
        assert_eq!(len, 0);
        assert_eq!(digest, Digest::hash(b""));
    }
}
