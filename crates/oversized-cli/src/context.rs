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

//! Shared command context
//!
//! Most subcommands need the same things: the discovered repository, its
//! settings, the local object store and (sometimes) a connected remote.
//! [`CliContext`] builds them once per invocation; the remote is only
//! constructed for commands that actually talk to the bucket.

use anyhow::{Context, Result};
use oversized_config::Settings;
use oversized_git::Repo;
use oversized_store::{ObjectStore, RemoteBackend, RemoteNamespace, S3Backend, S3Config};
use oversized_sync::SyncEngine;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// Everything a repository-bound command needs
pub struct CliContext {
    pub repo: Repo,
    pub settings: Settings,
    pub store: ObjectStore,
    pub namespace: RemoteNamespace,
}

impl CliContext {
    /// Discover the repository and load its settings. Fails with a pointer
    /// to `init` when no bucket is configured.
    pub async fn load() -> Result<Self> {
        let repo = Repo::discover()?;
        let mut config = repo.config()?;
        let settings = Settings::load(&mut config)?;
        let store = ObjectStore::open(repo.git_dir()).await?;
        let namespace = RemoteNamespace::new(settings.prefix.clone());

        Ok(CliContext {
            repo,
            settings,
            store,
            namespace,
        })
    }

    /// Connect to the configured bucket.
    pub async fn remote(&self) -> Result<Arc<dyn RemoteBackend>> {
        let config = S3Config {
            bucket: self.settings.bucket.clone(),
            profile: self.settings.profile.clone(),
            ..Default::default()
        };
        let backend = S3Backend::with_config(config)
            .await
            .with_context(|| format!("cannot reach bucket '{}'", self.settings.bucket))?;
        Ok(Arc::new(backend))
    }

    /// Build a sync engine over the configured remote.
    pub async fn engine(&self, jobs: Option<usize>) -> Result<SyncEngine> {
        let remote = self.remote().await?;
        let mut engine = SyncEngine::new(self.store.clone(), remote, self.namespace.clone());
        if let Some(jobs) = jobs {
            engine = engine.with_workers(jobs);
        }
        Ok(engine)
    }

    /// Distinct digests referenced by pointers, from history or the index.
    pub fn referenced_digests(
        &self,
        from_index: bool,
        window: Option<Duration>,
    ) -> Result<HashSet<oversized_store::Digest>> {
        let refs = if from_index {
            self.repo.pointers_in_index()?
        } else {
            self.repo.pointers_in_history(window)?
        };

        refs.iter().map(|r| Ok(r.pointer.digest()?)).collect()
    }
}
