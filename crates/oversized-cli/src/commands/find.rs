use crate::context::CliContext;
use crate::output;
use anyhow::Result;
use clap::Parser;
use oversized_sync::find_refs;

/// Locate the commits and paths that reference an object
#[derive(Parser, Debug)]
pub struct FindCmd {
    /// Digest hex prefix to search for
    #[arg(value_name = "DIGEST-PREFIX")]
    pub prefix: String,
}

impl FindCmd {
    pub async fn execute(&self) -> Result<()> {
        let ctx = CliContext::load().await?;
        let refs = ctx.repo.pointers_in_history(None)?;
        let hits = find_refs(&self.prefix, &refs);

        if hits.is_empty() {
            output::info(&format!("No references match '{}'", self.prefix));
            return Ok(());
        }

        for hit in hits {
            let commit = hit
                .commit_id
                .map(|id| id.to_string()[..8].to_string())
                .unwrap_or_else(|| "index".to_string());
            println!("{}  {}  {}", &hit.pointer.sha256[..16], commit, hit.path);
        }
        Ok(())
    }
}
