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

//! gc delete-phase lock
//!
//! `create_new` on the lock file is the whole mutual exclusion: exactly one
//! process can create it. Only the delete phase needs the lock; scans and
//! transfers stay concurrent-safe through content addressing alone.

use crate::error::{SyncError, SyncResult};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Held for the duration of a gc delete phase; removed on drop
#[derive(Debug)]
pub struct GcLock {
    path: PathBuf,
}

impl GcLock {
    /// Take the lock, failing if another gc holds it.
    pub fn acquire(path: PathBuf) -> SyncResult<Self> {
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(SyncError::LockHeld(path));
            }
            Err(e) => return Err(e.into()),
        };

        // Pid makes a stale lock diagnosable by hand.
        let _ = writeln!(file, "{}", std::process::id());

        debug!(path = %path.display(), "gc lock acquired");
        Ok(GcLock { path })
    }
}

impl Drop for GcLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), "failed to remove gc lock: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_lock_excludes_second_holder() {
        let td = TempDir::new().unwrap();
        let path = td.path().join("gc.lock");

        let lock = GcLock::acquire(path.clone()).unwrap();
        assert!(matches!(
            GcLock::acquire(path.clone()),
            Err(SyncError::LockHeld(_))
        ));

        drop(lock);
        assert!(!path.exists());

        // Released lock can be reacquired.
        let _lock = GcLock::acquire(path).unwrap();
    }
}
