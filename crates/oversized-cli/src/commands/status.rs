use crate::context::CliContext;
use crate::output;
use anyhow::Result;
use clap::Parser;
use oversized_sync::local;

/// Show how the local object store relates to what history references
#[derive(Parser, Debug)]
pub struct StatusCmd {
    /// List every stale and orphan digest instead of counts only
    #[arg(long)]
    pub long: bool,
}

impl StatusCmd {
    pub async fn execute(&self) -> Result<()> {
        let ctx = CliContext::load().await?;
        let referenced = ctx.referenced_digests(false, None)?;
        let report = local::status(&ctx.store, &referenced).await?;

        output::detail("bucket", &ctx.settings.bucket);
        output::detail("referenced objects", &report.referenced.to_string());
        output::detail("local objects", &report.local.to_string());
        output::detail("stale (missing locally)", &report.stale.len().to_string());
        output::detail("orphans (unreferenced)", &report.orphans.len().to_string());

        if self.long {
            for digest in &report.stale {
                println!("  stale  {}", digest);
            }
            for digest in &report.orphans {
                println!("  orphan {}", digest);
            }
        }

        if !report.stale.is_empty() {
            output::info("Run 'git oversized pull' to fetch stale objects");
        }
        if !report.orphans.is_empty() {
            output::info("Run 'git oversized gc' to remove orphan objects");
        }

        Ok(())
    }
}
