use crate::context::CliContext;
use crate::output;
use anyhow::Result;
use clap::Parser;
use dialoguer::Confirm;
use oversized_sync::local;
use std::time::Duration;

/// Remove local objects no longer referenced by history or the index
#[derive(Parser, Debug)]
pub struct GcCmd {
    /// Only consider commits from the last N days as referencing
    #[arg(long, value_name = "DAYS")]
    pub window_days: Option<u64>,

    /// Show what would be removed without deleting anything
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

impl GcCmd {
    pub async fn execute(&self) -> Result<()> {
        let ctx = CliContext::load().await?;

        let window = self.window_days.map(|days| Duration::from_secs(days * 86_400));

        // Staged pointers always count as referenced, whatever the window
        // says, so a gc right after `git add` can never eat staged content.
        let mut referenced = ctx.referenced_digests(false, window)?;
        referenced.extend(ctx.referenced_digests(true, None)?);

        let preview = local::gc(&ctx.store, &referenced, true).await?;
        if preview.removed.is_empty() {
            output::info("Nothing to remove");
            return Ok(());
        }

        if self.dry_run {
            output::info(&format!("Dry run: {}", preview.summary()));
            for digest in &preview.removed {
                println!("  {}", digest);
            }
            return Ok(());
        }

        if !self.yes {
            let prompt = format!(
                "Remove {} object(s) ({} bytes)?",
                preview.removed.len(),
                preview.bytes_reclaimed
            );
            if !Confirm::new().with_prompt(prompt).default(false).interact()? {
                output::info("Aborted");
                return Ok(());
            }
        }

        let report = local::gc(&ctx.store, &referenced, false).await?;
        output::success(&format!("gc complete: {}", report.summary()));
        Ok(())
    }
}
