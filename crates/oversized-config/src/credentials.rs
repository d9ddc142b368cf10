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

//! AWS shared-credentials checks for `init`
//!
//! `init` refuses to persist configuration that names a credentials profile
//! the AWS shared credentials file does not contain; a typo'd profile should
//! fail at init time, not on the first push.

use crate::error::{ConfigError, ConfigResult};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Location of the AWS shared credentials file, honoring the standard
/// `AWS_SHARED_CREDENTIALS_FILE` override.
pub fn credentials_file_path() -> ConfigResult<PathBuf> {
    if let Ok(path) = std::env::var("AWS_SHARED_CREDENTIALS_FILE") {
        if !path.is_empty() {
            return Ok(PathBuf::from(path));
        }
    }

    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map_err(|_| ConfigError::Credentials("cannot determine home directory".to_string()))?;

    Ok(PathBuf::from(home).join(".aws").join("credentials"))
}

/// Check that the shared credentials file exists and contains the named
/// profile section.
pub fn profile_is_readable(profile: &str) -> ConfigResult<()> {
    let path = credentials_file_path()?;
    profile_is_readable_in(&path, profile)
}

fn profile_is_readable_in(path: &Path, profile: &str) -> ConfigResult<()> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        ConfigError::Credentials(format!(
            "cannot read credentials file {}: {}",
            path.display(),
            e
        ))
    })?;

    let section = format!("[{}]", profile);
    let found = content.lines().any(|line| line.trim() == section);

    if !found {
        return Err(ConfigError::Credentials(format!(
            "profile '{}' not found in {}",
            profile,
            path.display()
        )));
    }

    debug!(profile, path = %path.display(), "credentials profile found");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn credentials_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_profile_found() {
        let file = credentials_file(
            "[default]\naws_access_key_id = AKIA\n\n[storage]\naws_access_key_id = AKIB\n",
        );
        assert!(profile_is_readable_in(file.path(), "default").is_ok());
        assert!(profile_is_readable_in(file.path(), "storage").is_ok());
    }

    #[test]
    fn test_profile_missing() {
        let file = credentials_file("[default]\naws_access_key_id = AKIA\n");
        let err = profile_is_readable_in(file.path(), "storage").unwrap_err();
        assert!(matches!(err, ConfigError::Credentials(_)));
        assert!(err.to_string().contains("storage"));
    }

    #[test]
    fn test_file_missing() {
        let err =
            profile_is_readable_in(Path::new("/nonexistent/credentials"), "default").unwrap_err();
        assert!(matches!(err, ConfigError::Credentials(_)));
    }

    #[test]
    fn test_section_matching_is_exact() {
        let file = credentials_file("[storage-backup]\naws_access_key_id = AKIA\n");
        assert!(profile_is_readable_in(file.path(), "storage").is_err());
    }
}
