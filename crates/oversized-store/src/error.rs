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

//! Store error types

use std::io;
use thiserror::Error;

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in the local object store or a remote backend
#[derive(Error, Debug)]
pub enum StoreError {
    /// Object not found, locally or remotely
    #[error("object not found: {0}")]
    NotFound(String),

    /// Recomputed digest does not match the expected one.
    ///
    /// Kept distinct from `NotFound`: a mismatched download must be
    /// discarded and reported as corruption, not as a missing object.
    #[error("integrity mismatch: expected {expected}, got {actual}")]
    Integrity { expected: String, actual: String },

    /// Not a valid 64-character hex digest
    #[error("invalid digest: {0}")]
    InvalidDigest(String),

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Remote backend failure after retries were exhausted
    #[error("remote backend error: {0}")]
    Backend(String),

    /// Transparent delegation for wrapped error types
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StoreError {
    /// Create a NotFound error for the given digest or key
    pub fn not_found<S: Into<String>>(key: S) -> Self {
        StoreError::NotFound(key.into())
    }

    /// Create a Backend error with context
    pub fn backend<S: Into<String>>(msg: S) -> Self {
        StoreError::Backend(msg.into())
    }

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }

    /// Check if this is an integrity failure
    pub fn is_integrity(&self) -> bool {
        matches!(self, StoreError::Integrity { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found() {
        let err = StoreError::not_found("abcd");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "object not found: abcd");
    }

    #[test]
    fn test_integrity_is_distinct() {
        let err = StoreError::Integrity {
            expected: "aa".into(),
            actual: "bb".into(),
        };
        assert!(err.is_integrity());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_io_conversion() {
        let err = StoreError::from(io::Error::other("disk on fire"));
        assert!(matches!(err, StoreError::Io(_)));
    }
}
