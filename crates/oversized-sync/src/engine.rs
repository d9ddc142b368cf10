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

//! Sync engine
//!
//! Reconciles the local object store with the remote bucket. Transfers run
//! with bounded concurrency; one bad object fails in its own lane and the
//! rest of the batch proceeds. gc is the only destructive operation and is
//! gated on a reachability set the caller proves complete.

use crate::error::SyncResult;
use crate::report::{GcReport, StatusReport, TransferReport, VerifyFinding};
use futures::stream::{self, StreamExt};
use oversized_store::{Digest, ObjectStore, RemoteBackend, RemoteNamespace};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Default number of concurrent transfer lanes
pub const DEFAULT_WORKERS: usize = 8;

/// Outcome of one object's transfer, folded into a [`TransferReport`]
enum ObjectOutcome {
    Transferred(Digest, u64),
    Skipped(Digest),
    Failed(Digest, String),
}

/// Push/pull/gc/verify engine over a local store and one remote
#[derive(Clone)]
pub struct SyncEngine {
    store: ObjectStore,
    remote: Arc<dyn RemoteBackend>,
    namespace: RemoteNamespace,
    workers: usize,
}

impl SyncEngine {
    pub fn new(
        store: ObjectStore,
        remote: Arc<dyn RemoteBackend>,
        namespace: RemoteNamespace,
    ) -> Self {
        SyncEngine {
            store,
            remote,
            namespace,
            workers: DEFAULT_WORKERS,
        }
    }

    /// Override the transfer concurrency. Clamped to at least 1.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn store(&self) -> &ObjectStore {
        &self.store
    }

    pub fn namespace(&self) -> &RemoteNamespace {
        &self.namespace
    }

    /// Upload local objects the remote does not have yet.
    ///
    /// Re-pushing is idempotent: objects the remote already holds are
    /// skipped without transferring a byte.
    pub async fn push(&self, digests: &[Digest]) -> SyncResult<TransferReport> {
        let outcomes = stream::iter(digests.iter().copied())
            .map(|digest| {
                let store = self.store.clone();
                let remote = Arc::clone(&self.remote);
                let key = self.namespace.key(&digest);

                async move { push_one(&store, remote.as_ref(), &key, digest).await }
            })
            .buffer_unordered(self.workers)
            .collect::<Vec<_>>()
            .await;

        let report = fold_outcomes(outcomes);
        info!("push: {}", report.summary());
        Ok(report)
    }

    /// Download referenced objects missing from the local store.
    ///
    /// Each download re-verifies its digest before promotion; a corrupt
    /// download and a missing remote object are distinct per-object
    /// failures.
    pub async fn pull(&self, digests: &[Digest]) -> SyncResult<TransferReport> {
        let outcomes = stream::iter(digests.iter().copied())
            .map(|digest| {
                let store = self.store.clone();
                let remote = Arc::clone(&self.remote);
                let key = self.namespace.key(&digest);

                async move {
                    if store.has(&digest).await {
                        return ObjectOutcome::Skipped(digest);
                    }

                    match store.fetch_from(remote.as_ref(), &key, &digest).await {
                        Ok(length) => ObjectOutcome::Transferred(digest, length),
                        Err(e) => {
                            warn!(digest = %digest.short(), "pull failed: {}", e);
                            ObjectOutcome::Failed(digest, e.to_string())
                        }
                    }
                }
            })
            .buffer_unordered(self.workers)
            .collect::<Vec<_>>()
            .await;

        let report = fold_outcomes(outcomes);
        info!("pull: {}", report.summary());
        Ok(report)
    }

    /// Remove unreferenced local objects. See [`crate::local::gc`].
    pub async fn gc(&self, referenced: &HashSet<Digest>, dry_run: bool) -> SyncResult<GcReport> {
        crate::local::gc(&self.store, referenced, dry_run).await
    }

    /// Audit local object integrity. See [`crate::local::verify`].
    pub async fn verify(&self) -> SyncResult<Vec<VerifyFinding>> {
        crate::local::verify(&self.store).await
    }

    /// Compare the local store against the referenced set. See
    /// [`crate::local::status`].
    pub async fn status(&self, referenced: &HashSet<Digest>) -> SyncResult<StatusReport> {
        crate::local::status(&self.store, referenced).await
    }
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("remote", &self.remote)
            .field("workers", &self.workers)
            .finish()
    }
}

async fn push_one(
    store: &ObjectStore,
    remote: &dyn RemoteBackend,
    key: &str,
    digest: Digest,
) -> ObjectOutcome {
    let exists = match remote.exists(key).await {
        Ok(exists) => exists,
        Err(e) => {
            warn!(digest = %digest.short(), "push existence check failed: {}", e);
            return ObjectOutcome::Failed(digest, e.to_string());
        }
    };
    if exists {
        debug!(digest = %digest.short(), "push skipped, remote has object");
        return ObjectOutcome::Skipped(digest);
    }

    let data = match store.read_object(&digest).await {
        Ok(data) => data,
        Err(e) => return ObjectOutcome::Failed(digest, e.to_string()),
    };

    match remote.put(key, &data).await {
        Ok(()) => ObjectOutcome::Transferred(digest, data.len() as u64),
        Err(e) => {
            warn!(digest = %digest.short(), "push upload failed: {}", e);
            ObjectOutcome::Failed(digest, e.to_string())
        }
    }
}

fn fold_outcomes(outcomes: Vec<ObjectOutcome>) -> TransferReport {
    let mut report = TransferReport::default();

    for outcome in outcomes {
        match outcome {
            ObjectOutcome::Transferred(digest, bytes) => {
                report.bytes_transferred += bytes;
                report.transferred.push(digest);
            }
            ObjectOutcome::Skipped(digest) => report.skipped.push(digest),
            ObjectOutcome::Failed(digest, msg) => report.failed.push((digest, msg)),
        }
    }

    report.transferred.sort();
    report.skipped.sort();
    report.failed.sort_by_key(|(digest, _)| *digest);
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyncError;
    use crate::lock::GcLock;
    use oversized_store::MockBackend;
    use tempfile::TempDir;

    async fn engine() -> (TempDir, SyncEngine, MockBackend) {
        let td = TempDir::new().unwrap();
        let store = ObjectStore::open(td.path()).await.unwrap();
        let remote = MockBackend::new();
        let engine = SyncEngine::new(
            store,
            Arc::new(remote.clone()),
            RemoteNamespace::new(Some("media".to_string())),
        );
        (td, engine, remote)
    }

    async fn seed(engine: &SyncEngine, bodies: &[&[u8]]) -> Vec<Digest> {
        let mut digests = Vec::new();
        for body in bodies {
            let (digest, _) = engine.store().put_bytes(body).await.unwrap();
            digests.push(digest);
        }
        digests
    }

    #[tokio::test]
    async fn test_push_uploads_and_double_push_skips() {
        let (_td, engine, remote) = engine().await;
        let digests = seed(&engine, &[b"one", b"two", b"three"]).await;

        let first = engine.push(&digests).await.unwrap();
        assert_eq!(first.transferred.len(), 3);
        assert!(first.is_clean());
        assert_eq!(remote.put_count(), 3);

        // Second push moves nothing.
        let second = engine.push(&digests).await.unwrap();
        assert!(second.transferred.is_empty());
        assert_eq!(second.skipped.len(), 3);
        assert_eq!(remote.put_count(), 3);
    }

    #[tokio::test]
    async fn test_push_uses_namespace_keys() {
        let (_td, engine, remote) = engine().await;
        let digests = seed(&engine, &[b"namespaced"]).await;

        engine.push(&digests).await.unwrap();

        let keys = remote.list("media/").await.unwrap();
        assert_eq!(keys, vec![format!("media/{}", digests[0].to_hex())]);
    }

    #[tokio::test]
    async fn test_push_failure_does_not_sink_batch() {
        let (_td, engine, remote) = engine().await;
        let digests = seed(&engine, &[b"alpha", b"beta"]).await;

        remote.fail_puts(true);
        let report = engine.push(&digests).await.unwrap();
        assert_eq!(report.failed.len(), 2);

        remote.fail_puts(false);
        let retry = engine.push(&digests).await.unwrap();
        assert_eq!(retry.transferred.len(), 2);
        assert!(retry.is_clean());
    }

    #[tokio::test]
    async fn test_pull_fetches_missing_only() {
        let (_td, engine, remote) = engine().await;

        let body = b"pull me".to_vec();
        let digest = Digest::hash(&body);
        remote
            .put(&engine.namespace().key(&digest), &body)
            .await
            .unwrap();

        let local = seed(&engine, &[b"already here"]).await;

        let mut wanted = vec![digest];
        wanted.extend(local.clone());
        let report = engine.pull(&wanted).await.unwrap();

        assert_eq!(report.transferred, vec![digest]);
        assert_eq!(report.skipped, local);
        assert!(engine.store().has(&digest).await);
    }

    #[tokio::test]
    async fn test_pull_distinguishes_corruption_from_missing() {
        let (_td, engine, remote) = engine().await;

        let body = b"true body".to_vec();
        let digest = Digest::hash(&body);
        remote
            .corrupt(&engine.namespace().key(&digest), b"tampered")
            .await;

        let absent = Digest::hash(b"never uploaded");

        let report = engine.pull(&[digest, absent]).await.unwrap();
        assert_eq!(report.failed.len(), 2);

        let failures: std::collections::HashMap<_, _> = report.failed.into_iter().collect();
        assert!(failures[&digest].contains("integrity mismatch"));
        assert!(failures[&absent].contains("not found"));
        assert!(!engine.store().has(&digest).await);
    }

    #[tokio::test]
    async fn test_gc_removes_exactly_the_unreferenced() {
        let (_td, engine, _remote) = engine().await;
        let digests = seed(&engine, &[b"keep", b"drop-1", b"drop-22"]).await;

        let referenced: HashSet<Digest> = [digests[0]].into_iter().collect();
        let report = engine.gc(&referenced, false).await.unwrap();

        assert_eq!(report.removed.len(), 2);
        assert_eq!(report.bytes_reclaimed, 6 + 7);
        assert!(engine.store().has(&digests[0]).await);
        assert!(!engine.store().has(&digests[1]).await);
        assert!(!engine.store().has(&digests[2]).await);

        // Lock was released.
        assert!(!engine.store().gc_lock_path().exists());
    }

    #[tokio::test]
    async fn test_gc_dry_run_deletes_nothing() {
        let (_td, engine, _remote) = engine().await;
        let digests = seed(&engine, &[b"orphan"]).await;

        let report = engine.gc(&HashSet::new(), true).await.unwrap();
        assert!(report.dry_run);
        assert_eq!(report.removed, digests);
        assert!(engine.store().has(&digests[0]).await);
    }

    #[tokio::test]
    async fn test_gc_respects_held_lock() {
        let (_td, engine, _remote) = engine().await;
        seed(&engine, &[b"orphan"]).await;

        let _lock = GcLock::acquire(engine.store().gc_lock_path()).unwrap();
        assert!(matches!(
            engine.gc(&HashSet::new(), false).await,
            Err(SyncError::LockHeld(_))
        ));
    }

    #[tokio::test]
    async fn test_verify_flags_exactly_the_mutated_object() {
        let (_td, engine, _remote) = engine().await;
        let digests = seed(&engine, &[b"intact", b"to be mutated"]).await;

        // Corrupt one object file in place.
        let victim = engine.store().path(&digests[1]);
        let mut perms = std::fs::metadata(&victim).unwrap().permissions();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            perms.set_mode(0o644);
        }
        std::fs::set_permissions(&victim, perms).unwrap();
        std::fs::write(&victim, b"mutated bytes").unwrap();

        let findings = engine.verify().await.unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].digest, digests[1]);
        assert_eq!(findings[0].actual, Digest::hash(b"mutated bytes").to_hex());

        // Object untouched by verify.
        assert_eq!(
            engine.store().read_object(&digests[1]).await.unwrap(),
            b"mutated bytes"
        );
    }

    #[tokio::test]
    async fn test_status_partitions_stale_and_orphans() {
        let (_td, engine, _remote) = engine().await;
        let local = seed(&engine, &[b"shared", b"orphan"]).await;

        let missing = Digest::hash(b"referenced but absent");
        let referenced: HashSet<Digest> = [local[0], missing].into_iter().collect();

        let status = engine.status(&referenced).await.unwrap();
        assert_eq!(status.referenced, 2);
        assert_eq!(status.local, 2);
        assert_eq!(status.stale, vec![missing]);
        assert_eq!(status.orphans, vec![local[1]]);
    }
}
