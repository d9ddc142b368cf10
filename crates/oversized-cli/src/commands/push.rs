use crate::context::CliContext;
use crate::output;
use crate::progress;
use anyhow::{bail, Result};
use clap::Parser;
use oversized_store::Digest;

/// Upload referenced objects to the configured bucket
#[derive(Parser, Debug)]
pub struct PushCmd {
    /// Push only objects referenced from the index, not all of history
    #[arg(long)]
    pub index: bool,

    /// Number of concurrent uploads
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Show what would be uploaded without transferring anything
    #[arg(long)]
    pub dry_run: bool,
}

impl PushCmd {
    pub async fn execute(&self) -> Result<()> {
        let ctx = CliContext::load().await?;
        let referenced = ctx.referenced_digests(self.index, None)?;

        // Only objects we actually hold can be pushed; the rest are stale
        // and need a pull from wherever they live.
        let mut candidates: Vec<Digest> = Vec::new();
        let mut missing = 0usize;
        for digest in referenced {
            if ctx.store.has(&digest).await {
                candidates.push(digest);
            } else {
                missing += 1;
            }
        }
        candidates.sort();

        if missing > 0 {
            output::warning(&format!(
                "{} referenced object(s) are not in the local store and cannot be pushed",
                missing
            ));
        }

        if candidates.is_empty() {
            output::info("Nothing to push");
            return Ok(());
        }

        if self.dry_run {
            output::info(&format!("Would push {} object(s)", candidates.len()));
            for digest in &candidates {
                println!("  {}", digest);
            }
            return Ok(());
        }

        let engine = ctx.engine(self.jobs).await?;
        let bar = progress::spinner(&format!("Pushing {} object(s)...", candidates.len()));
        let report = engine.push(&candidates).await?;
        bar.finish_and_clear();

        output::success(&format!("Push complete: {}", report.summary()));
        for (digest, msg) in &report.failed {
            output::error(&format!("{}: {}", digest.short(), msg));
        }

        if !report.is_clean() {
            bail!("{} object(s) failed to upload", report.failed.len());
        }
        Ok(())
    }
}
