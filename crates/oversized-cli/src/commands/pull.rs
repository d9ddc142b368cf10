use crate::commands::checkout;
use crate::context::CliContext;
use crate::output;
use crate::progress;
use anyhow::{bail, Result};
use clap::Parser;
use oversized_store::Digest;
use std::collections::HashSet;

/// Download referenced objects missing from the local store
#[derive(Parser, Debug)]
pub struct PullCmd {
    /// Number of concurrent downloads
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Rewrite working-tree files that still hold pointer records
    #[arg(long)]
    pub checkout: bool,
}

impl PullCmd {
    pub async fn execute(&self) -> Result<()> {
        let ctx = CliContext::load().await?;

        // History plus whatever is staged but not yet committed.
        let mut wanted: HashSet<Digest> = ctx.referenced_digests(false, None)?;
        wanted.extend(ctx.referenced_digests(true, None)?);

        let mut digests: Vec<Digest> = wanted.into_iter().collect();
        digests.sort();

        if digests.is_empty() {
            output::info("Nothing to pull");
            return Ok(());
        }

        let engine = ctx.engine(self.jobs).await?;
        let bar = progress::spinner(&format!("Pulling {} object(s)...", digests.len()));
        let report = engine.pull(&digests).await?;
        bar.finish_and_clear();

        output::success(&format!("Pull complete: {}", report.summary()));
        for (digest, msg) in &report.failed {
            output::error(&format!("{}: {}", digest.short(), msg));
        }

        if self.checkout {
            let (restored, skipped) = checkout::materialize_all(&ctx).await?;
            output::info(&format!(
                "Checkout: {} file(s) restored, {} left as-is",
                restored, skipped
            ));
        }

        if !report.is_clean() {
            bail!("{} object(s) failed to download", report.failed.len());
        }
        Ok(())
    }
}
