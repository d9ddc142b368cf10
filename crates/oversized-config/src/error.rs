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

//! Configuration error types

use thiserror::Error;

/// Result type alias for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors loading, validating or persisting repository settings
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Repository has no bucket configured; `init` has not run
    #[error("no bucket configured; run 'git oversized init --bucket <name>' first")]
    MissingBucket,

    /// Bucket name violates S3 naming rules
    #[error("invalid bucket name '{0}': {1}")]
    InvalidBucket(String, String),

    /// Remote key prefix is malformed
    #[error("invalid prefix '{0}': {1}")]
    InvalidPrefix(String, String),

    /// AWS credentials are missing or do not contain the named profile
    #[error("credentials error: {0}")]
    Credentials(String),

    /// Underlying git configuration failure
    #[error("git config error: {0}")]
    Git(#[from] git2::Error),

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
