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

//! In-memory remote backend for tests
//!
//! Honors the same contract as [`S3Backend`](crate::S3Backend) so the sync
//! engine can be exercised without network access. Counts operations and can
//! be told to fail, which the transfer tests use to check that one bad
//! object does not sink a batch.

use crate::RemoteBackend;
use anyhow::anyhow;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory [`RemoteBackend`] implementation
///
/// Clones share the same underlying map, so a test can hand one clone to the
/// sync engine and keep another for assertions.
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    objects: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    put_count: Arc<AtomicU64>,
    get_count: Arc<AtomicU64>,
    fail_puts: Arc<AtomicBool>,
    fail_gets: Arc<AtomicBool>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful and failed `put` calls so far.
    pub fn put_count(&self) -> u64 {
        self.put_count.load(Ordering::Relaxed)
    }

    /// Number of `get` calls so far.
    pub fn get_count(&self) -> u64 {
        self.get_count.load(Ordering::Relaxed)
    }

    /// Make every subsequent `put` fail.
    pub fn fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::Relaxed);
    }

    /// Make every subsequent `get` fail.
    pub fn fail_gets(&self, fail: bool) {
        self.fail_gets.store(fail, Ordering::Relaxed);
    }

    /// Overwrite an object's bytes in place, bypassing the normal interface.
    /// Lets corruption tests store data that no longer matches its key.
    pub async fn corrupt(&self, key: &str, data: &[u8]) {
        self.objects
            .write()
            .await
            .insert(key.to_string(), data.to_vec());
    }

    /// Number of objects currently stored.
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait]
impl RemoteBackend for MockBackend {
    async fn get(&self, key: &str) -> anyhow::Result<Vec<u8>> {
        self.get_count.fetch_add(1, Ordering::Relaxed);
        if self.fail_gets.load(Ordering::Relaxed) {
            return Err(anyhow!("injected get failure for {}", key));
        }

        self.objects
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| anyhow!("object not found: {}", key))
    }

    async fn put(&self, key: &str, data: &[u8]) -> anyhow::Result<()> {
        self.put_count.fetch_add(1, Ordering::Relaxed);
        if self.fail_puts.load(Ordering::Relaxed) {
            return Err(anyhow!("injected put failure for {}", key));
        }

        self.objects
            .write()
            .await
            .insert(key.to_string(), data.to_vec());
        Ok(())
    }

    async fn exists(&self, key: &str) -> anyhow::Result<bool> {
        Ok(self.objects.read().await.contains_key(key))
    }

    async fn delete(&self, key: &str) -> anyhow::Result<()> {
        self.objects.write().await.remove(key);
        Ok(())
    }

    async fn list(&self, prefix: &str) -> anyhow::Result<Vec<String>> {
        let mut keys: Vec<String> = self
            .objects
            .read()
            .await
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }
}
