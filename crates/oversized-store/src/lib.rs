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

//! Object storage layer for oversized
//!
//! This crate holds the two stores the rest of the system reconciles:
//!
//! - [`ObjectStore`]: the content-addressable local cache of full file
//!   bodies, kept under the repository's private metadata directory. Objects
//!   are immutable, named by their SHA-256 digest, and promoted into place
//!   with an atomic rename so a crash mid-write never exposes a partial
//!   object.
//! - [`RemoteBackend`]: the abstraction over a bucket-addressed blob store.
//!   [`S3Backend`] is the production implementation; [`MockBackend`] is an
//!   in-memory stand-in for tests.
//!
//! # Core Concepts
//!
//! - **Digest**: SHA-256 of an object's bytes, its unique storage key
//! - **Object**: an immutable byte sequence addressed by its digest
//! - **Key**: a remote bucket key, normally the digest hex with an optional
//!   configured prefix
//!
//! The digest invariant holds everywhere: no object is stored, transmitted,
//! or trusted without `digest == sha256(bytes)` being checked at the
//! appropriate boundary (promotion into the local store, download from the
//! remote, `verify`).
//!
//! # Examples
//!
//! ```no_run
//! use oversized_store::{ObjectStore, RemoteBackend, MockBackend};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = ObjectStore::open(".git").await?;
//!
//!     let (digest, len) = store.put_bytes(b"big file body").await?;
//!     assert!(store.has(&digest).await);
//!     assert_eq!(len, 13);
//!
//!     let remote = MockBackend::new();
//!     remote.put(&digest.to_hex(), b"big file body").await?;
//!     assert!(remote.exists(&digest.to_hex()).await?);
//!
//!     Ok(())
//! }
//! ```

pub mod digest;
pub mod error;
pub mod mock;
pub mod namespace;
pub mod objects;
pub mod s3;

use async_trait::async_trait;
use std::fmt::Debug;

pub use digest::Digest;
pub use error::{StoreError, StoreResult};
pub use mock::MockBackend;
pub use namespace::RemoteNamespace;
pub use objects::ObjectStore;
pub use s3::{S3Backend, S3Config};

/// Remote backend trait for bucket-style object storage
///
/// The minimal blob interface the sync engine needs: get/put/exists/delete
/// and prefix listing. Implementations must be `Send + Sync + Debug` and
/// safe for concurrent use; `anyhow::Result` is used at this seam so
/// backends can attach whatever context their SDK produces.
///
/// Semantics implementations must honor:
/// - `get` on a missing key is an error whose message contains
///   "object not found"
/// - `put` overwrites; callers rely on content addressing to make that safe
/// - `delete` is idempotent (deleting a missing key succeeds)
/// - `list` returns sorted keys
#[async_trait]
pub trait RemoteBackend: Send + Sync + Debug {
    /// Retrieve an object's bytes by key.
    async fn get(&self, key: &str) -> anyhow::Result<Vec<u8>>;

    /// Store an object under the given key.
    async fn put(&self, key: &str, data: &[u8]) -> anyhow::Result<()>;

    /// Check whether a key exists.
    async fn exists(&self, key: &str) -> anyhow::Result<bool>;

    /// Delete a key. Idempotent.
    async fn delete(&self, key: &str) -> anyhow::Result<()>;

    /// List all keys starting with `prefix`, sorted.
    async fn list(&self, prefix: &str) -> anyhow::Result<Vec<String>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trait_is_object_safe() {
        fn _check_object_safe(_: &dyn RemoteBackend) {}
    }
}
