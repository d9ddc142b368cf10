use crate::context::CliContext;
use crate::output;
use anyhow::{bail, Result};
use clap::Parser;
use oversized_sync::local;

/// Re-hash every local object and report corruption
#[derive(Parser, Debug)]
pub struct VerifyCmd {}

impl VerifyCmd {
    pub async fn execute(&self) -> Result<()> {
        let ctx = CliContext::load().await?;
        let checked = ctx.store.list().await?.len();
        let findings = local::verify(&ctx.store).await?;

        if findings.is_empty() {
            output::success(&format!("All objects intact ({} checked)", checked));
            return Ok(());
        }

        for finding in &findings {
            output::error(&format!(
                "{} hashes to {}",
                finding.digest,
                &finding.actual[..8]
            ));
        }
        bail!("{} corrupt object(s) found", findings.len());
    }
}
