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

//! AWS S3 remote backend implementation
//!
//! Provides a [`RemoteBackend`] implementation backed by an S3 bucket:
//! - AWS SDK credential chain (environment, IAM, profiles), with an
//!   optional named profile from repository configuration
//! - Automatic region detection
//! - Exponential backoff retry around every operation
//! - Bucket reachability verified once at construction
//!
//! # Configuration
//!
//! Credentials resolve through the AWS SDK's standard chain:
//! 1. Environment variables (AWS_ACCESS_KEY_ID, AWS_SECRET_ACCESS_KEY, ...)
//! 2. IAM role credentials (if running on EC2, ECS, Lambda, etc.)
//! 3. AWS profiles (~/.aws/credentials and ~/.aws/config)
//!
//! When the repository names a profile, that profile is selected explicitly
//! instead of the chain's default. An alternate endpoint supports
//! S3-compatible services (MinIO, LocalStack).
//!
//! # Examples
//!
//! ```rust,no_run
//! use oversized_store::{RemoteBackend, S3Backend, S3Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = S3Config {
//!         bucket: "my-large-files".to_string(),
//!         profile: Some("storage".to_string()),
//!         ..Default::default()
//!     };
//!     let remote = S3Backend::with_config(config).await?;
//!
//!     remote.put("media/abc123", b"object body").await?;
//!     assert!(remote.exists("media/abc123").await?);
//!
//!     Ok(())
//! }
//! ```

use crate::RemoteBackend;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use aws_sdk_s3::Client;
use bytes::Bytes;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Configuration for the S3 backend
#[derive(Clone, Debug)]
pub struct S3Config {
    /// S3 bucket name
    pub bucket: String,

    /// Optional AWS profile to use instead of the default credential chain
    pub profile: Option<String>,

    /// Optional custom S3 endpoint (for S3-compatible services like MinIO)
    pub endpoint: Option<String>,

    /// Maximum number of retries for failed operations (default: 3)
    pub max_retries: u32,

    /// Initial retry delay in milliseconds (default: 100ms)
    pub initial_retry_delay_ms: u64,
}

impl Default for S3Config {
    fn default() -> Self {
        S3Config {
            bucket: String::new(),
            profile: None,
            endpoint: None,
            max_retries: 3,
            initial_retry_delay_ms: 100,
        }
    }
}

/// AWS S3 remote backend
///
/// # Thread Safety
///
/// `Send + Sync`; clones share the underlying SDK client and can be used
/// concurrently from many transfer tasks.
#[derive(Clone)]
pub struct S3Backend {
    client: Client,
    config: Arc<S3Config>,
}

impl S3Backend {
    /// Create a backend for the given bucket using default configuration.
    ///
    /// Verifies bucket access with a `HeadBucket` probe, so a bad bucket
    /// name or missing credentials fail here rather than mid-transfer.
    pub async fn new(bucket: impl Into<String>) -> Result<Self> {
        let config = S3Config {
            bucket: bucket.into(),
            ..Default::default()
        };
        Self::with_config(config).await
    }

    /// Create a backend with custom configuration.
    pub async fn with_config(config: S3Config) -> Result<Self> {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(profile) = &config.profile {
            debug!("Using AWS profile: {}", profile);
            loader = loader.profile_name(profile);
        }
        let sdk_config = loader.load().await;

        // Override endpoint if provided (for S3-compatible services)
        let client = if let Some(endpoint) = &config.endpoint {
            debug!("Using custom S3 endpoint: {}", endpoint);
            let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
                .endpoint_url(endpoint.clone())
                .force_path_style(true)
                .build();
            Client::from_conf(s3_config)
        } else {
            Client::new(&sdk_config)
        };

        client
            .head_bucket()
            .bucket(&config.bucket)
            .send()
            .await
            .context(format!(
                "Failed to verify S3 bucket access: {}",
                config.bucket
            ))?;

        debug!(
            "Successfully connected to S3 bucket: {} with region: {:?}",
            config.bucket,
            sdk_config.region()
        );

        Ok(S3Backend {
            client,
            config: Arc::new(config),
        })
    }

    /// Validate a key for correctness
    fn validate_key(key: &str) -> Result<()> {
        if key.is_empty() {
            return Err(anyhow!("key cannot be empty"));
        }
        if key.starts_with('/') {
            return Err(anyhow!("key cannot start with '/'"));
        }
        Ok(())
    }

    /// Perform operation with exponential backoff retry logic
    async fn with_retry<F, T>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut() -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<T>> + Send>>,
    {
        let mut retry_count = 0;
        let mut delay_ms = self.config.initial_retry_delay_ms;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    retry_count += 1;
                    if retry_count >= self.config.max_retries {
                        return Err(e).context(format!(
                            "Failed after {} retries",
                            self.config.max_retries
                        ));
                    }

                    warn!(
                        "Operation failed (attempt {}/{}), retrying in {}ms: {}",
                        retry_count, self.config.max_retries, delay_ms, e
                    );

                    tokio::time::sleep(tokio::time::Duration::from_millis(delay_ms)).await;

                    delay_ms = (delay_ms * 2).min(10000); // Cap at 10 seconds
                }
            }
        }
    }
}

impl fmt::Debug for S3Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Backend")
            .field("bucket", &self.config.bucket)
            .field("profile", &self.config.profile)
            .field("endpoint", &self.config.endpoint)
            .finish()
    }
}

#[async_trait]
impl RemoteBackend for S3Backend {
    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        Self::validate_key(key)?;

        let client = self.client.clone();
        let bucket = self.config.bucket.clone();
        let key_clone = key.to_string();

        self.with_retry(|| {
            let client = client.clone();
            let bucket = bucket.clone();
            let key = key_clone.clone();

            Box::pin(async move {
                debug!("Getting object from S3: {}", key);

                let response = client
                    .get_object()
                    .bucket(&bucket)
                    .key(&key)
                    .send()
                    .await
                    .map_err(|e| {
                        if is_not_found(&e.to_string()) {
                            anyhow!("object not found: {}", key)
                        } else {
                            anyhow!("Failed to get object: {}", e)
                        }
                    })?;

                let body = response
                    .body
                    .collect()
                    .await
                    .map_err(|e| anyhow!("Failed to read object body: {}", e))?;

                Ok(body.into_bytes().to_vec())
            })
        })
        .await
    }

    async fn put(&self, key: &str, data: &[u8]) -> Result<()> {
        Self::validate_key(key)?;

        let client = self.client.clone();
        let bucket = self.config.bucket.clone();
        let key_clone = key.to_string();
        let data_vec = data.to_vec();

        self.with_retry(|| {
            let client = client.clone();
            let bucket = bucket.clone();
            let key = key_clone.clone();
            let data = data_vec.clone();

            Box::pin(async move {
                debug!("Putting object to S3: {} ({} bytes)", key, data.len());

                client
                    .put_object()
                    .bucket(&bucket)
                    .key(&key)
                    .body(Bytes::from(data).into())
                    .send()
                    .await
                    .map_err(|e| anyhow!("Failed to put object: {}", e))?;

                debug!("Successfully put object to S3: {}", key);
                Ok(())
            })
        })
        .await
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Self::validate_key(key)?;

        let client = self.client.clone();
        let bucket = self.config.bucket.clone();
        let key_clone = key.to_string();

        self.with_retry(|| {
            let client = client.clone();
            let bucket = bucket.clone();
            let key = key_clone.clone();

            Box::pin(async move {
                debug!("Checking if object exists in S3: {}", key);

                match client.head_object().bucket(&bucket).key(&key).send().await {
                    Ok(_) => Ok(true),
                    Err(e) => {
                        if is_not_found(&e.to_string()) {
                            Ok(false)
                        } else {
                            Err(anyhow!("Failed to check object existence: {}", e))
                        }
                    }
                }
            })
        })
        .await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        Self::validate_key(key)?;

        let client = self.client.clone();
        let bucket = self.config.bucket.clone();
        let key_clone = key.to_string();

        self.with_retry(|| {
            let client = client.clone();
            let bucket = bucket.clone();
            let key = key_clone.clone();

            Box::pin(async move {
                debug!("Deleting object from S3: {}", key);

                // S3 DeleteObject succeeds on missing keys, matching the
                // trait's idempotence requirement.
                client
                    .delete_object()
                    .bucket(&bucket)
                    .key(&key)
                    .send()
                    .await
                    .map_err(|e| anyhow!("Failed to delete object: {}", e))?;

                Ok(())
            })
        })
        .await
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let client = self.client.clone();
        let bucket = self.config.bucket.clone();
        let prefix_clone = prefix.to_string();

        self.with_retry(|| {
            let client = client.clone();
            let bucket = bucket.clone();
            let prefix = prefix_clone.clone();

            Box::pin(async move {
                debug!("Listing objects in S3 with prefix: '{}'", prefix);

                let mut result = vec![];
                let mut continuation_token: Option<String> = None;

                loop {
                    let mut request = client.list_objects_v2().bucket(&bucket);

                    if !prefix.is_empty() {
                        request = request.prefix(&prefix);
                    }

                    if let Some(token) = continuation_token {
                        request = request.continuation_token(token);
                    }

                    let response = request
                        .send()
                        .await
                        .map_err(|e| anyhow!("Failed to list objects: {}", e))?;

                    for obj in response.contents() {
                        if let Some(key) = obj.key() {
                            result.push(key.to_string());
                        }
                    }

                    if response.is_truncated() == Some(true) {
                        continuation_token =
                            response.next_continuation_token().map(|t| t.to_string());
                    } else {
                        break;
                    }
                }

                result.sort();

                debug!("Found {} objects with prefix: '{}'", result.len(), prefix);
                Ok(result)
            })
        })
        .await
    }
}

/// Match the "not found" shapes real and emulated S3 services produce.
fn is_not_found(error_message: &str) -> bool {
    let msg = error_message.to_lowercase();
    msg.contains("404")
        || msg.contains("not found")
        || msg.contains("notfound")
        || msg.contains("nosuchkey")
        || msg.contains("does not exist")
        || msg.contains("no such key")
        // LocalStack sometimes returns a bare "service error" for missing objects
        || (msg.contains("service error") && msg.len() < 50)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = S3Config::default();
        assert!(config.profile.is_none());
        assert!(config.endpoint.is_none());
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.initial_retry_delay_ms, 100);
    }

    #[test]
    fn test_validate_key() {
        assert!(S3Backend::validate_key("valid_key").is_ok());
        assert!(S3Backend::validate_key("path/to/key").is_ok());
        assert!(S3Backend::validate_key("").is_err());
        assert!(S3Backend::validate_key("/invalid").is_err());
    }

    #[test]
    fn test_not_found_matching() {
        assert!(is_not_found("HTTP 404 Not Found"));
        assert!(is_not_found("NoSuchKey: the key does not exist"));
        assert!(is_not_found("service error"));
        assert!(!is_not_found("access denied"));
        assert!(!is_not_found("connection reset by peer"));
    }
}
