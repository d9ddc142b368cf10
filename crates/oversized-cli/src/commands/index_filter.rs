//! The `index-filter` subcommand, for use with `git filter-branch`
//!
//! Rewrites large staged blobs into pointer records, moving their content
//! into the object store. Intended to run as
//! `git filter-branch --index-filter 'git-oversized index-filter' ...` so an
//! existing history can be migrated without touching the working tree.

use anyhow::Result;
use clap::Parser;
use oversized_git::{Pointer, Repo};
use oversized_store::ObjectStore;
use tracing::{debug, info};

/// Rewrite large index entries into pointer records (for filter-branch)
#[derive(Parser, Debug)]
pub struct IndexFilterCmd {
    /// Only rewrite entries strictly larger than this many bytes
    #[arg(long, value_name = "BYTES", default_value_t = 1_048_576)]
    pub larger_than: u64,
}

impl IndexFilterCmd {
    pub async fn execute(&self) -> Result<()> {
        // filter-branch drives us through GIT_DIR/GIT_INDEX_FILE.
        let repo = Repo::open_from_env().or_else(|_| Repo::discover())?;
        let store = ObjectStore::open(repo.git_dir()).await?;

        let entries = repo.large_index_entries(self.larger_than)?;
        if entries.is_empty() {
            debug!("no index entries above {} bytes", self.larger_than);
            return Ok(());
        }

        let mut rewritten = 0usize;
        for entry in entries {
            let content = repo.blob_content(entry.blob_id)?;
            let (digest, length) = store.put_bytes(&content).await?;

            let pointer = Pointer::new(&digest, length);
            repo.replace_index_entry(&entry.path, &pointer.encode())?;

            debug!(
                path = %entry.path,
                digest = %digest.short(),
                length,
                "index entry rewritten to pointer"
            );
            rewritten += 1;
        }

        // Nothing on stdout: filter-branch treats output as noise.
        info!(rewritten, "index filter pass complete");
        Ok(())
    }
}
