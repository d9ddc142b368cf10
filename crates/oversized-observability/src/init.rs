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

//! Tracing initialization

use crate::config::{LogConfig, LogError, LogFormat};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

/// Initialize tracing with the given format and optional level override.
pub fn init_tracing(format: LogFormat, level: Option<&str>) -> Result<(), LogError> {
    let mut config = LogConfig::new().with_format(format);
    if let Some(level) = level {
        config = config.with_level(level);
    }
    init_tracing_with_config(config)
}

/// Initialize tracing with a full configuration. Writes to stderr only.
pub fn init_tracing_with_config(config: LogConfig) -> Result<(), LogError> {
    let filter = build_env_filter(&config)?;
    let registry = Registry::default().with(filter);

    match config.format {
        LogFormat::Compact => {
            registry
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(true)
                        .with_ansi(config.use_color)
                        .compact(),
                )
                .init();
        }
        LogFormat::Pretty => {
            registry
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(true)
                        .with_ansi(config.use_color)
                        .pretty(),
                )
                .init();
        }
        LogFormat::Json => {
            registry
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .json()
                        .with_target(true),
                )
                .init();
        }
    }

    Ok(())
}

fn build_env_filter(config: &LogConfig) -> Result<EnvFilter, LogError> {
    let filter = config.effective_filter();
    EnvFilter::try_new(&filter)
        .map_err(|e| LogError::InvalidFilter(format!("'{}': {}", filter, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Initializing the global subscriber is one-shot, so these tests only
    // cover filter construction.

    #[test]
    fn test_env_filter_parsing() {
        assert!(build_env_filter(&LogConfig::new().with_level("debug")).is_ok());
        assert!(build_env_filter(&LogConfig::new().with_level("trace")).is_ok());
        assert!(build_env_filter(&LogConfig::new().with_level("oversized_sync=debug,warn")).is_ok());
    }

    #[test]
    fn test_bad_filter_is_rejected() {
        assert!(build_env_filter(&LogConfig::new().with_level("not a =// filter")).is_err());
    }
}
