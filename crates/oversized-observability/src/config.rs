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

//! Logging configuration
//!
//! Logs always go to stderr: in filter invocations stdout carries file
//! content, and a stray log line there would corrupt a checkout.

use thiserror::Error;

/// Errors that can occur during logging configuration
#[derive(Error, Debug)]
pub enum LogError {
    #[error("invalid log format: {0}")]
    InvalidFormat(String),

    #[error("invalid log filter: {0}")]
    InvalidFilter(String),
}

/// Output format for logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Compact single-line format (default; suits filter processes)
    #[default]
    Compact,

    /// Pretty multi-line format for interactive debugging
    Pretty,

    /// JSON format for machine-readable logs
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "compact" => Ok(LogFormat::Compact),
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(LogError::InvalidFormat(format!(
                "{} (expected one of: compact, pretty, json)",
                s
            ))),
        }
    }
}

/// Configuration for logging
#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    /// Output format for logs
    pub format: LogFormat,

    /// Log level filter; `None` defers to `RUST_LOG`, then "warn"
    pub level: Option<String>,

    /// Whether to use ANSI colors
    pub use_color: bool,
}

impl LogConfig {
    pub fn new() -> Self {
        LogConfig {
            use_color: true,
            ..Default::default()
        }
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = Some(level.into());
        self
    }

    pub fn with_color(mut self, use_color: bool) -> Self {
        self.use_color = use_color;
        self
    }

    /// Effective filter string: explicit level, then `RUST_LOG`, then "warn".
    ///
    /// The quiet default matters because filters run once per checked-out
    /// file; chatty defaults would flood every clone.
    pub fn effective_filter(&self) -> String {
        self.level
            .clone()
            .or_else(|| std::env::var("RUST_LOG").ok())
            .unwrap_or_else(|| "warn".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parsing() {
        assert_eq!("compact".parse::<LogFormat>().unwrap(), LogFormat::Compact);
        assert_eq!("PRETTY".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_builder() {
        let config = LogConfig::new()
            .with_format(LogFormat::Json)
            .with_level("debug")
            .with_color(false);

        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.effective_filter(), "debug");
        assert!(!config.use_color);
    }

    #[test]
    fn test_effective_filter_defaults_quiet() {
        let config = LogConfig {
            level: None,
            ..LogConfig::new()
        };
        if std::env::var("RUST_LOG").is_err() {
            assert_eq!(config.effective_filter(), "warn");
        }
    }
}
