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

//! Git-layer error types

use oversized_store::StoreError;
use thiserror::Error;

/// Result type alias for git-layer operations
pub type GitResult<T> = Result<T, GitError>;

/// Errors from the pointer codec, filter pipeline and repository plumbing
#[derive(Error, Debug)]
pub enum GitError {
    /// Underlying libgit2 failure
    #[error("git error: {0}")]
    Repository(#[from] git2::Error),

    /// No git repository found from the starting path
    #[error("not a git repository: {0}")]
    NotARepository(String),

    /// Repository has no working tree (bare)
    #[error("repository has no working tree")]
    NoWorkdir,

    /// A pointer references an object that is neither local nor fetchable.
    ///
    /// The filter must fail the checkout of this file rather than write the
    /// pointer record where file content is expected.
    #[error("object {0} is not available locally or remotely")]
    ObjectMissing(String),

    /// Filter stream processing failed
    #[error("filter failed: {0}")]
    FilterFailed(String),

    /// .gitattributes could not be read or updated
    #[error("failed to update .gitattributes: {0}")]
    GitattributesConfig(String),

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Object store failure surfaced through the filter pipeline
    #[error(transparent)]
    Store(#[from] StoreError),
}
