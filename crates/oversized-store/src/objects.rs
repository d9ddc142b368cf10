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

//! Content-addressable local object store
//!
//! Full file bodies live under `<git-dir>/oversized/objects/<hex digest>`,
//! one flat file per object, made read-only once promoted. Writes stream
//! through a uniquely named file in `<git-dir>/oversized/tmp/` while the
//! digest is computed, then a single atomic rename publishes the object.
//!
//! That rename discipline is the whole concurrency story: filter processes
//! run one-per-file and many-in-flight, but promotion to a content-addressed
//! name is idempotent and order-independent, so no cross-process locking is
//! needed. A crash mid-write leaves at most an orphan temp file, never a
//! corrupt object under its final name.

use crate::digest::Digest;
use crate::error::{StoreError, StoreResult};
use crate::RemoteBackend;
use sha2::{Digest as _, Sha256};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tracing::debug;

/// Counter folded into temp file names so concurrent puts in one process
/// never collide.
static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Content-addressable store of object files under the repository's
/// private metadata directory
///
/// Cheap to clone-by-reconstruction: holds only the two directory paths.
#[derive(Debug, Clone)]
pub struct ObjectStore {
    objects_dir: PathBuf,
    tmp_dir: PathBuf,
}

/// Removes the temp file unless promotion disarmed it.
struct TempGuard {
    path: PathBuf,
    armed: bool,
}

impl Drop for TempGuard {
    fn drop(&mut self) {
        if self.armed {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

impl ObjectStore {
    /// Open (creating on first use) the object store under the given git
    /// directory.
    ///
    /// Creates `<git-dir>/oversized/objects` and `<git-dir>/oversized/tmp`
    /// with restrictive permissions.
    pub async fn open<P: AsRef<Path>>(git_dir: P) -> StoreResult<Self> {
        let base = git_dir.as_ref().join("oversized");
        let objects_dir = base.join("objects");
        let tmp_dir = base.join("tmp");

        fs::create_dir_all(&objects_dir).await?;
        fs::create_dir_all(&tmp_dir).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o700);
            fs::set_permissions(&base, perms).await?;
        }

        Ok(ObjectStore {
            objects_dir,
            tmp_dir,
        })
    }

    /// Path an object with this digest lives (or would live) at.
    pub fn path(&self, digest: &Digest) -> PathBuf {
        self.objects_dir.join(digest.to_hex())
    }

    /// Directory temp files are staged in.
    pub fn tmp_dir(&self) -> &Path {
        &self.tmp_dir
    }

    /// Path of the gc lock file guarding the delete phase.
    pub fn gc_lock_path(&self) -> PathBuf {
        self.objects_dir
            .parent()
            .unwrap_or(&self.objects_dir)
            .join("gc.lock")
    }

    /// Check whether an object is present locally.
    pub async fn has(&self, digest: &Digest) -> bool {
        fs::try_exists(self.path(digest)).await.unwrap_or(false)
    }

    /// Stream a reader into the store.
    ///
    /// Bytes are copied to a private temp file and a SHA-256 accumulator at
    /// the same time, never holding the full content in memory. On EOF the
    /// temp file is atomically renamed to its content-addressed name; if an
    /// object with that digest already exists the temp file is discarded
    /// instead (dedup by construction). Returns the digest and the exact
    /// byte count observed.
    pub async fn put<R: AsyncRead + Unpin>(&self, mut reader: R) -> StoreResult<(Digest, u64)> {
        let tmp_path = self.next_tmp_path();
        let mut guard = TempGuard {
            path: tmp_path.clone(),
            armed: true,
        };

        let mut file = fs::File::create(&tmp_path).await?;
        let mut hasher = Sha256::new();
        let mut buffer = vec![0u8; 64 * 1024];
        let mut length = 0u64;

        loop {
            let n = reader.read(&mut buffer).await?;
            if n == 0 {
                break;
            }
            hasher.update(&buffer[..n]);
            file.write_all(&buffer[..n]).await?;
            length += n as u64;
        }

        file.sync_all().await?;
        drop(file);

        let digest = Digest::hash_state(hasher);
        if self.promote(&tmp_path, &digest).await? {
            guard.armed = false;
        }
        // promote returning false means the object already existed; the
        // guard then deletes the redundant temp file.

        Ok((digest, length))
    }

    /// Convenience wrapper over [`Self::put`] for in-memory content.
    pub async fn put_bytes(&self, data: &[u8]) -> StoreResult<(Digest, u64)> {
        self.put(data).await
    }

    /// Open an object for streaming read.
    pub async fn open_object(&self, digest: &Digest) -> StoreResult<fs::File> {
        match fs::File::open(self.path(digest)).await {
            Ok(file) => Ok(file),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::not_found(digest.to_hex()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Read an object fully into memory (remote upload path).
    pub async fn read_object(&self, digest: &Digest) -> StoreResult<Vec<u8>> {
        match fs::read(self.path(digest)).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::not_found(digest.to_hex()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Size of a stored object in bytes.
    pub async fn size(&self, digest: &Digest) -> StoreResult<u64> {
        match fs::metadata(self.path(digest)).await {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::not_found(digest.to_hex()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Enumerate every object currently in the store, sorted by digest.
    ///
    /// Entries whose names are not valid digests (stray files) are skipped.
    pub async fn list(&self) -> StoreResult<Vec<Digest>> {
        let mut digests = Vec::new();
        let mut entries = fs::read_dir(&self.objects_dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            if let Some(name) = entry.file_name().to_str() {
                if let Ok(digest) = Digest::from_hex(name) {
                    digests.push(digest);
                }
            }
        }

        digests.sort();
        Ok(digests)
    }

    /// Delete an object file.
    ///
    /// The store performs no reference counting; the caller (gc) is solely
    /// responsible for proving the object unreferenced first.
    pub async fn remove(&self, digest: &Digest) -> StoreResult<()> {
        let path = self.path(digest);

        // Objects are read-only; clear that before unlinking so removal
        // works on platforms where the file bit matters.
        if let Ok(meta) = fs::metadata(&path).await {
            let mut perms = meta.permissions();
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                perms.set_mode(0o644);
            }
            #[cfg(not(unix))]
            perms.set_readonly(false);
            let _ = fs::set_permissions(&path, perms).await;
        }

        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::not_found(digest.to_hex()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Download a single object from a remote backend into the store.
    ///
    /// The downloaded bytes are re-hashed and compared against `expected`
    /// *before* promotion; a mismatch discards the data and reports an
    /// integrity failure, which callers must keep distinct from a missing
    /// object. Returns the object length.
    pub async fn fetch_from(
        &self,
        remote: &dyn RemoteBackend,
        key: &str,
        expected: &Digest,
    ) -> StoreResult<u64> {
        if !remote
            .exists(key)
            .await
            .map_err(|e| StoreError::backend(e.to_string()))?
        {
            return Err(StoreError::not_found(key));
        }

        let data = remote
            .get(key)
            .await
            .map_err(|e| StoreError::backend(e.to_string()))?;

        let actual = Digest::hash(&data);
        if &actual != expected {
            return Err(StoreError::Integrity {
                expected: expected.to_hex(),
                actual: actual.to_hex(),
            });
        }

        let (digest, length) = self.put_bytes(&data).await?;
        debug_assert_eq!(&digest, expected);
        debug!(digest = %expected.short(), length, "fetched object from remote");
        Ok(length)
    }

    fn next_tmp_path(&self) -> PathBuf {
        let seq = TMP_SEQ.fetch_add(1, Ordering::Relaxed);
        self.tmp_dir
            .join(format!("put-{}-{}.tmp", std::process::id(), seq))
    }

    /// Atomically publish a temp file under its content-addressed name.
    ///
    /// Returns true if the rename happened, false if an object with that
    /// digest already existed and the temp file should be discarded.
    async fn promote(&self, tmp_path: &Path, digest: &Digest) -> StoreResult<bool> {
        let final_path = self.path(digest);

        if fs::try_exists(&final_path).await? {
            debug!(digest = %digest.short(), "object already cached");
            return Ok(false);
        }

        fs::rename(tmp_path, &final_path).await?;

        // Objects are never mutated in place.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o444);
            fs::set_permissions(&final_path, perms).await?;
        }
        #[cfg(not(unix))]
        {
            let mut perms = fs::metadata(&final_path).await?.permissions();
            perms.set_readonly(true);
            fs::set_permissions(&final_path, perms).await?;
        }

        debug!(digest = %digest.short(), "object promoted");
        Ok(true)
    }
}
