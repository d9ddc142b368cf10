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

//! Digest-to-remote-key mapping
//!
//! A remote key is the digest hex, optionally under a configured prefix so
//! several repositories can share one bucket. All code that names remote
//! objects goes through [`RemoteNamespace`] so the mapping cannot drift
//! between the filters and the sync engine.

use crate::digest::Digest;

/// Maps digests to bucket keys under an optional prefix
#[derive(Debug, Clone, Default)]
pub struct RemoteNamespace {
    prefix: Option<String>,
}

impl RemoteNamespace {
    /// Create a namespace. Trailing slashes on the prefix are normalized
    /// away; an empty prefix behaves like no prefix.
    pub fn new(prefix: Option<String>) -> Self {
        let prefix = prefix
            .map(|p| p.trim_end_matches('/').to_string())
            .filter(|p| !p.is_empty());
        RemoteNamespace { prefix }
    }

    /// Bucket key for an object: `<prefix>/<hex>` or bare `<hex>`.
    pub fn key(&self, digest: &Digest) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}/{}", prefix, digest.to_hex()),
            None => digest.to_hex(),
        }
    }

    /// Prefix string for listing every object in this namespace.
    pub fn listing_prefix(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}/", prefix),
            None => String::new(),
        }
    }

    /// Recover the digest from a listed key, if the key belongs to this
    /// namespace and names a valid digest.
    pub fn digest_from_key(&self, key: &str) -> Option<Digest> {
        let hex = key.strip_prefix(&self.listing_prefix())?;
        hex.parse().ok()
    }
}
