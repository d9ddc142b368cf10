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

//! Clean and smudge filter pipeline
//!
//! - **Clean** (`git add`): file body goes into the object store, the
//!   pointer record goes to git.
//! - **Smudge** (`git checkout`): the pointer record is replaced by the
//!   object's bytes, fetched from the remote if it is not cached locally.
//!
//! Both directions classify their input by peeking at most one 4096-byte
//! block. Git pipes file content through stdin, which cannot be rewound, so
//! after the peek the block is replayed ahead of the remaining stream with
//! `Cursor::chain` and everything downstream sees one contiguous stream.
//! Neither direction ever buffers a whole file in memory.
//!
//! The pipeline returns typed errors only; deciding to exit a process is the
//! CLI's business.

use crate::error::{GitError, GitResult};
use crate::pointer::{Pointer, BLOCK_LEN};
use oversized_store::{ObjectStore, RemoteBackend, RemoteNamespace, StoreError};
use std::io::Cursor;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

/// What the clean filter did with its input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanOutcome {
    /// Input was already a pointer record and was passed through unchanged
    AlreadyPointer(Pointer),

    /// Input body was stored and replaced by this pointer
    Stored(Pointer),
}

/// What the smudge filter did with its input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SmudgeOutcome {
    /// Input was not a pointer record and was passed through unchanged
    PassedThrough,

    /// Pointer was resolved and the object's bytes were written out
    Materialized(Pointer),
}

/// Streaming clean/smudge pipeline over an [`ObjectStore`]
#[derive(Debug, Clone)]
pub struct FilterPipeline {
    store: ObjectStore,
    namespace: RemoteNamespace,
}

impl FilterPipeline {
    pub fn new(store: ObjectStore, namespace: RemoteNamespace) -> Self {
        FilterPipeline { store, namespace }
    }

    /// Clean: convert file content to a pointer record.
    ///
    /// If the input is already exactly a pointer record it is written
    /// through unchanged, so cleaning is idempotent and nothing is stored
    /// twice. Otherwise the full input streams into the object store and the
    /// encoded pointer is all that reaches `output`.
    pub async fn clean<R, W>(&self, mut input: R, mut output: W) -> GitResult<CleanOutcome>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let (block, at_eof) = read_first_block(&mut input).await?;

        if at_eof {
            if let Ok(pointer) = Pointer::decode(&block) {
                debug!(digest = %pointer.sha256, "clean input already a pointer");
                output.write_all(&block).await?;
                output.flush().await?;
                return Ok(CleanOutcome::AlreadyPointer(pointer));
            }
        }

        let replay = Cursor::new(block).chain(input);
        let (digest, length) = self.store.put(replay).await?;

        let pointer = Pointer::new(&digest, length);
        output.write_all(&pointer.encode()).await?;
        output.flush().await?;

        info!(digest = %digest.short(), length, "cleaned file into object store");
        Ok(CleanOutcome::Stored(pointer))
    }

    /// Smudge: convert a pointer record back to file content.
    ///
    /// Non-pointer input passes through unchanged. For a pointer, the object
    /// streams out of the local store; on a local miss with a configured
    /// remote the single object is fetched (with digest verification) first.
    /// If the object cannot be obtained at all this returns
    /// [`GitError::ObjectMissing`] — the pointer bytes are never emitted as
    /// file content.
    pub async fn smudge<R, W>(
        &self,
        mut input: R,
        mut output: W,
        remote: Option<&dyn RemoteBackend>,
    ) -> GitResult<SmudgeOutcome>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let (block, at_eof) = read_first_block(&mut input).await?;

        let pointer = match (at_eof, Pointer::decode(&block)) {
            (true, Ok(pointer)) => pointer,
            _ => {
                output.write_all(&block).await?;
                tokio::io::copy(&mut input, &mut output).await?;
                output.flush().await?;
                return Ok(SmudgeOutcome::PassedThrough);
            }
        };

        let digest = pointer.digest()?;

        if !self.store.has(&digest).await {
            let Some(remote) = remote else {
                return Err(GitError::ObjectMissing(pointer.sha256));
            };

            let key = self.namespace.key(&digest);
            debug!(digest = %digest.short(), key, "object missing locally, fetching");
            match self.store.fetch_from(remote, &key, &digest).await {
                Ok(_) => {}
                Err(e) if e.is_not_found() => {
                    return Err(GitError::ObjectMissing(pointer.sha256));
                }
                Err(e) => return Err(e.into()),
            }
        }

        let mut object = self.store.open_object(&digest).await?;
        let copied = tokio::io::copy(&mut object, &mut output).await?;
        output.flush().await?;

        if copied != pointer.length {
            return Err(GitError::Store(StoreError::Integrity {
                expected: format!("{} bytes", pointer.length),
                actual: format!("{} bytes", copied),
            }));
        }

        debug!(digest = %digest.short(), length = copied, "smudged pointer into file content");
        Ok(SmudgeOutcome::Materialized(pointer))
    }
}

/// Read up to one block plus one probe byte.
///
/// Returns the bytes read and whether the input ended within them. A result
/// longer than [`BLOCK_LEN`] means "more than one block" and can never be a
/// bare pointer file.
async fn read_first_block<R: AsyncRead + Unpin>(reader: &mut R) -> GitResult<(Vec<u8>, bool)> {
    let mut block = vec![0u8; BLOCK_LEN + 1];
    let mut filled = 0;

    while filled < block.len() {
        let n = reader.read(&mut block[filled..]).await?;
        if n == 0 {
            block.truncate(filled);
            return Ok((block, true));
        }
        filled += n;
    }

    Ok((block, false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use oversized_store::{Digest, MockBackend};
    use tempfile::TempDir;

    async fn pipeline() -> (TempDir, FilterPipeline) {
        let td = TempDir::new().unwrap();
        let store = ObjectStore::open(td.path()).await.unwrap();
        (td, FilterPipeline::new(store, RemoteNamespace::default()))
    }

    async fn clean_bytes(pipeline: &FilterPipeline, input: &[u8]) -> (Vec<u8>, CleanOutcome) {
        let mut output = Vec::new();
        let outcome = pipeline.clean(input, &mut output).await.unwrap();
        (output, outcome)
    }

    #[tokio::test]
    async fn test_clean_stores_body_and_emits_pointer() {
        let (_td, pipeline) = pipeline().await;
        let body = vec![0x42u8; 100 * 1024];

        let (output, outcome) = clean_bytes(&pipeline, &body).await;

        let pointer = Pointer::decode(&output).unwrap();
        assert_eq!(pointer.length, body.len() as u64);
        assert_eq!(pointer.sha256, Digest::hash(&body).to_hex());
        assert!(matches!(outcome, CleanOutcome::Stored(p) if p == pointer));
        assert!(pipeline.store.has(&pointer.digest().unwrap()).await);
    }

    #[tokio::test]
    async fn test_clean_is_idempotent() {
        let (_td, pipeline) = pipeline().await;
        let body = b"some large file body".to_vec();

        let (first, _) = clean_bytes(&pipeline, &body).await;
        let (second, outcome) = clean_bytes(&pipeline, &first).await;

        assert_eq!(first, second);
        assert!(matches!(outcome, CleanOutcome::AlreadyPointer(_)));
        // Exactly one object in the store.
        assert_eq!(pipeline.store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_smudge_round_trip() {
        let (_td, pipeline) = pipeline().await;
        let body = vec![0xA7u8; 300 * 1024];

        let (pointer_bytes, _) = clean_bytes(&pipeline, &body).await;

        let mut restored = Vec::new();
        let outcome = pipeline
            .smudge(&pointer_bytes[..], &mut restored, None)
            .await
            .unwrap();

        assert_eq!(restored, body);
        assert!(matches!(outcome, SmudgeOutcome::Materialized(_)));
    }

    #[tokio::test]
    async fn test_smudge_passes_through_regular_content() {
        let (_td, pipeline) = pipeline().await;
        let content = b"just a normal text file\n".to_vec();

        let mut output = Vec::new();
        let outcome = pipeline
            .smudge(&content[..], &mut output, None)
            .await
            .unwrap();

        assert_eq!(output, content);
        assert_eq!(outcome, SmudgeOutcome::PassedThrough);
    }

    #[tokio::test]
    async fn test_smudge_passes_through_large_binary() {
        let (_td, pipeline) = pipeline().await;
        // Larger than one block, so it cannot be a pointer.
        let content: Vec<u8> = (0..=255u8).cycle().take(BLOCK_LEN * 3 + 17).collect();

        let mut output = Vec::new();
        pipeline.smudge(&content[..], &mut output, None).await.unwrap();
        assert_eq!(output, content);
    }

    #[tokio::test]
    async fn test_smudge_missing_object_fails_loudly() {
        let (_td, pipeline) = pipeline().await;
        let pointer = Pointer::new(&Digest::hash(b"never stored"), 12);

        let mut output = Vec::new();
        let err = pipeline
            .smudge(&pointer.encode()[..], &mut output, None)
            .await
            .unwrap_err();

        assert!(matches!(err, GitError::ObjectMissing(_)));
        // Nothing written: the pointer must not leak into file content.
        assert!(output.is_empty());
    }

    #[tokio::test]
    async fn test_smudge_fetches_from_remote_on_local_miss() {
        let (_td, pipeline) = pipeline().await;
        let body = b"remote-only body".to_vec();
        let digest = Digest::hash(&body);

        let remote = MockBackend::new();
        remote.put(&digest.to_hex(), &body).await.unwrap();

        let pointer = Pointer::new(&digest, body.len() as u64);
        let mut output = Vec::new();
        let outcome = pipeline
            .smudge(&pointer.encode()[..], &mut output, Some(&remote))
            .await
            .unwrap();

        assert_eq!(output, body);
        assert!(matches!(outcome, SmudgeOutcome::Materialized(_)));
        // Fetched object is now cached locally.
        assert!(pipeline.store.has(&digest).await);
    }

    #[tokio::test]
    async fn test_smudge_remote_miss_is_object_missing() {
        let (_td, pipeline) = pipeline().await;
        let remote = MockBackend::new();

        let pointer = Pointer::new(&Digest::hash(b"nowhere at all"), 14);
        let mut output = Vec::new();
        let err = pipeline
            .smudge(&pointer.encode()[..], &mut output, Some(&remote))
            .await
            .unwrap_err();

        assert!(matches!(err, GitError::ObjectMissing(_)));
    }

    #[tokio::test]
    async fn test_round_trip_empty_file() {
        let (_td, pipeline) = pipeline().await;

        let (pointer_bytes, _) = clean_bytes(&pipeline, b"").await;
        let pointer = Pointer::decode(&pointer_bytes).unwrap();
        assert_eq!(pointer.length, 0);

        let mut restored = Vec::new();
        pipeline
            .smudge(&pointer_bytes[..], &mut restored, None)
            .await
            .unwrap();
        assert!(restored.is_empty());
    }

    #[tokio::test]
    async fn test_clean_content_exactly_one_block() {
        let (_td, pipeline) = pipeline().await;
        let body = vec![b'x'; BLOCK_LEN];

        let (output, outcome) = clean_bytes(&pipeline, &body).await;
        assert!(matches!(outcome, CleanOutcome::Stored(_)));

        let pointer = Pointer::decode(&output).unwrap();
        assert_eq!(pointer.length, BLOCK_LEN as u64);
    }
}
