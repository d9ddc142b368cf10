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

//! Sync engine error types

use oversized_store::StoreError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for sync operations
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors from the sync engine
#[derive(Error, Debug)]
pub enum SyncError {
    /// Another gc holds the lock
    #[error("gc already in progress (lock file {0} exists)")]
    LockHeld(PathBuf),

    /// Local store failure outside the per-object transfer loop
    #[error(transparent)]
    Store(#[from] StoreError),

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Transparent delegation for wrapped error types
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
