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

//! Local-only maintenance operations
//!
//! gc, verify and status touch only the local store, so they live as free
//! functions callable without a remote connection. [`SyncEngine`] delegates
//! here for callers that already hold an engine.
//!
//! [`SyncEngine`]: crate::SyncEngine

use crate::error::SyncResult;
use crate::lock::GcLock;
use crate::report::{GcReport, StatusReport, VerifyFinding};
use oversized_git::PointerRef;
use oversized_store::{Digest, ObjectStore};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Remove local objects not in the referenced set.
///
/// The caller must supply the reachability set from a traversal that
/// completed without error; this function has no way to tell a complete set
/// from a truncated one. The delete phase runs under the gc lock; dry runs
/// take no lock and delete nothing.
pub async fn gc(
    store: &ObjectStore,
    referenced: &HashSet<Digest>,
    dry_run: bool,
) -> SyncResult<GcReport> {
    let local = store.list().await?;
    let candidates: Vec<Digest> = local
        .into_iter()
        .filter(|digest| !referenced.contains(digest))
        .collect();

    let mut report = GcReport {
        dry_run,
        ..Default::default()
    };

    if dry_run {
        for digest in candidates {
            report.bytes_reclaimed += store.size(&digest).await?;
            report.removed.push(digest);
        }
        info!("gc (dry run): {}", report.summary());
        return Ok(report);
    }

    let _lock = GcLock::acquire(store.gc_lock_path())?;

    for digest in candidates {
        let size = store.size(&digest).await?;
        store.remove(&digest).await?;
        debug!(digest = %digest.short(), size, "gc removed object");
        report.bytes_reclaimed += size;
        report.removed.push(digest);
    }

    info!("gc: {}", report.summary());
    Ok(report)
}

/// Re-hash every local object and report those whose bytes no longer match
/// their name. Objects are only read, never repaired or removed.
pub async fn verify(store: &ObjectStore) -> SyncResult<Vec<VerifyFinding>> {
    let mut findings = Vec::new();

    for digest in store.list().await? {
        let object = store.open_object(&digest).await?;
        let (actual, _) = Digest::from_reader(object).await?;

        if actual != digest {
            warn!(
                expected = %digest.short(),
                actual = %actual.short(),
                "corrupt object detected"
            );
            findings.push(VerifyFinding {
                digest,
                actual: actual.to_hex(),
            });
        }
    }

    Ok(findings)
}

/// Compare the local store against the referenced set.
pub async fn status(
    store: &ObjectStore,
    referenced: &HashSet<Digest>,
) -> SyncResult<StatusReport> {
    let local: HashSet<Digest> = store.list().await?.into_iter().collect();

    let mut stale: Vec<Digest> = referenced.difference(&local).copied().collect();
    let mut orphans: Vec<Digest> = local.difference(referenced).copied().collect();
    stale.sort();
    orphans.sort();

    Ok(StatusReport {
        referenced: referenced.len(),
        local: local.len(),
        stale,
        orphans,
    })
}

/// Filter history references by digest hex prefix.
pub fn find_refs<'a>(prefix: &str, refs: &'a [PointerRef]) -> Vec<&'a PointerRef> {
    refs.iter()
        .filter(|r| r.pointer.sha256.starts_with(prefix))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use oversized_git::Pointer;

    #[test]
    fn test_find_refs_prefix_match() {
        let digest_a = Digest::hash(b"aaa");
        let digest_b = Digest::hash(b"bbb");
        let refs = vec![
            PointerRef {
                pointer: Pointer::new(&digest_a, 3),
                blob_id: git2_oid(),
                commit_id: None,
                path: "a.bin".to_string(),
            },
            PointerRef {
                pointer: Pointer::new(&digest_b, 3),
                blob_id: git2_oid(),
                commit_id: None,
                path: "b.bin".to_string(),
            },
        ];

        let hits = find_refs(&digest_a.to_hex()[..8], &refs);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].path, "a.bin");

        assert_eq!(find_refs("", &refs).len(), 2);
        assert!(find_refs("zzzz", &refs).is_empty());
    }

    fn git2_oid() -> git2::Oid {
        git2::Oid::zero()
    }
}
