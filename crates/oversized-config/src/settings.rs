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

//! Repository settings
//!
//! Settings live in the repository's git configuration under the
//! `oversized.*` keys and are loaded once per invocation, then threaded
//! explicitly into whatever needs them. There is no ambient global
//! configuration.

use crate::error::{ConfigError, ConfigResult};
use git2::ErrorCode;
use tracing::debug;

/// Git config key for the bucket name
pub const KEY_BUCKET: &str = "oversized.bucket";
/// Git config key for the optional remote key prefix
pub const KEY_PREFIX: &str = "oversized.prefix";
/// Git config key for the optional AWS profile
pub const KEY_PROFILE: &str = "oversized.profile";

/// Per-repository settings persisted in git config
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// S3 bucket holding this repository's objects
    pub bucket: String,

    /// Optional key prefix inside the bucket
    pub prefix: Option<String>,

    /// Optional AWS credentials profile
    pub profile: Option<String>,
}

impl Settings {
    pub fn new(bucket: String, prefix: Option<String>, profile: Option<String>) -> Self {
        Settings {
            bucket,
            prefix: none_if_empty(prefix),
            profile: none_if_empty(profile),
        }
    }

    /// Load settings from a repository's configuration.
    ///
    /// A missing bucket means the repository was never initialized and is a
    /// typed error; missing optionals are simply `None`.
    pub fn load(config: &mut git2::Config) -> ConfigResult<Self> {
        let snapshot = config.snapshot()?;

        let bucket = match read_key(&snapshot, KEY_BUCKET)? {
            Some(bucket) if !bucket.is_empty() => bucket,
            _ => return Err(ConfigError::MissingBucket),
        };

        let settings = Settings {
            bucket,
            prefix: read_key(&snapshot, KEY_PREFIX)?.filter(|s| !s.is_empty()),
            profile: read_key(&snapshot, KEY_PROFILE)?.filter(|s| !s.is_empty()),
        };

        debug!(?settings, "loaded repository settings");
        Ok(settings)
    }

    /// Write settings into a repository's configuration.
    ///
    /// Empty optionals are not written, matching what `load` skips.
    pub fn persist(&self, config: &mut git2::Config) -> ConfigResult<()> {
        config.set_str(KEY_BUCKET, &self.bucket)?;
        if let Some(prefix) = &self.prefix {
            config.set_str(KEY_PREFIX, prefix)?;
        }
        if let Some(profile) = &self.profile {
            config.set_str(KEY_PROFILE, profile)?;
        }

        debug!(bucket = %self.bucket, "persisted repository settings");
        Ok(())
    }

    /// Validate settings before anything is persisted or contacted.
    pub fn validate(&self) -> ConfigResult<()> {
        validate_bucket_name(&self.bucket)?;

        if let Some(prefix) = &self.prefix {
            if prefix.starts_with('/') {
                return Err(ConfigError::InvalidPrefix(
                    prefix.clone(),
                    "must not start with '/'".to_string(),
                ));
            }
        }

        Ok(())
    }
}

fn none_if_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

fn read_key(config: &git2::Config, key: &str) -> ConfigResult<Option<String>> {
    match config.get_string(key) {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// S3 bucket naming rules: 3-63 characters of lowercase letters, digits,
/// dots and hyphens, starting and ending with a letter or digit.
fn validate_bucket_name(bucket: &str) -> ConfigResult<()> {
    let err = |reason: &str| {
        Err(ConfigError::InvalidBucket(
            bucket.to_string(),
            reason.to_string(),
        ))
    };

    if bucket.len() < 3 || bucket.len() > 63 {
        return err("must be 3-63 characters");
    }

    if !bucket
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '-')
    {
        return err("only lowercase letters, digits, dots and hyphens allowed");
    }

    let first = bucket.chars().next().unwrap_or('-');
    let last = bucket.chars().last().unwrap_or('-');
    if !first.is_ascii_alphanumeric() || !last.is_ascii_alphanumeric() {
        return err("must start and end with a letter or digit");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn repo_config() -> (TempDir, git2::Config) {
        let td = TempDir::new().unwrap();
        let repo = git2::Repository::init(td.path()).unwrap();
        let config = repo.config().unwrap();
        (td, config)
    }

    #[test]
    fn test_load_without_bucket_is_missing_bucket() {
        let (_td, mut config) = repo_config();
        assert!(matches!(
            Settings::load(&mut config),
            Err(ConfigError::MissingBucket)
        ));
    }

    #[test]
    fn test_persist_load_roundtrip() {
        let (_td, mut config) = repo_config();

        let settings = Settings::new(
            "my-bucket".to_string(),
            Some("team/assets".to_string()),
            Some("storage".to_string()),
        );
        settings.persist(&mut config).unwrap();

        assert_eq!(Settings::load(&mut config).unwrap(), settings);
    }

    #[test]
    fn test_persist_skips_empty_optionals() {
        let (_td, mut config) = repo_config();

        let settings = Settings::new("my-bucket".to_string(), Some(String::new()), None);
        settings.persist(&mut config).unwrap();

        let loaded = Settings::load(&mut config).unwrap();
        assert_eq!(loaded.prefix, None);
        assert_eq!(loaded.profile, None);
    }

    #[test]
    fn test_validate_bucket_names() {
        let ok = |name: &str| Settings::new(name.to_string(), None, None).validate().is_ok();

        assert!(ok("my-bucket"));
        assert!(ok("bucket.with.dots"));
        assert!(ok("abc"));
        assert!(!ok("ab"));
        assert!(!ok(&"a".repeat(64)));
        assert!(!ok("My-Bucket"));
        assert!(!ok("bucket_underscore"));
        assert!(!ok("-leading-hyphen"));
        assert!(!ok("trailing-hyphen-"));
        assert!(!ok(""));
    }

    #[test]
    fn test_validate_prefix() {
        let bad = Settings::new("my-bucket".to_string(), Some("/abs".to_string()), None);
        assert!(matches!(bad.validate(), Err(ConfigError::InvalidPrefix(..))));

        let good = Settings::new("my-bucket".to_string(), Some("rel/path".to_string()), None);
        assert!(good.validate().is_ok());
    }
}
