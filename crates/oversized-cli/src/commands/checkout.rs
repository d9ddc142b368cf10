use crate::context::CliContext;
use crate::output;
use anyhow::Result;
use clap::Parser;
use oversized_git::{Pointer, BLOCK_LEN};
use std::io::Read;
use tracing::{debug, warn};

/// Replace working-tree pointer files with their real content
#[derive(Parser, Debug)]
pub struct CheckoutCmd {}

impl CheckoutCmd {
    pub async fn execute(&self) -> Result<()> {
        let ctx = CliContext::load().await?;
        let (restored, skipped) = materialize_all(&ctx).await?;

        if restored == 0 {
            output::info("No pointer files to restore");
        } else {
            output::success(&format!("{} file(s) restored", restored));
        }
        if skipped > 0 {
            output::info(&format!(
                "{} file(s) skipped (object missing locally; run 'git oversized pull')",
                skipped
            ));
        }
        Ok(())
    }
}

/// Rewrite every working-tree file that still holds a pointer record whose
/// object is available locally. Files with real content are left alone.
pub(crate) async fn materialize_all(ctx: &CliContext) -> Result<(usize, usize)> {
    let mut restored = 0usize;
    let mut skipped = 0usize;

    for pref in ctx.repo.pointers_in_index()? {
        let digest = pref.pointer.digest()?;

        let path = ctx.repo.workdir_file(&pref.path)?;
        if !holds_pointer(&path, &pref.pointer) {
            debug!(path = %pref.path, "working file already materialized");
            continue;
        }

        if !ctx.store.has(&digest).await {
            warn!(path = %pref.path, digest = %digest.short(), "object missing locally");
            skipped += 1;
            continue;
        }

        ctx.repo.materialize(&pref.path, &ctx.store.path(&digest))?;
        restored += 1;
    }

    Ok((restored, skipped))
}

/// Does the file on disk currently contain exactly this pointer record?
///
/// Reads at most one block plus a probe byte; anything longer cannot be a
/// pointer and is real content.
fn holds_pointer(path: &std::path::Path, pointer: &Pointer) -> bool {
    let Ok(file) = std::fs::File::open(path) else {
        return false;
    };

    let mut head = Vec::with_capacity(BLOCK_LEN + 1);
    if file.take(BLOCK_LEN as u64 + 1).read_to_end(&mut head).is_err() {
        return false;
    }

    match Pointer::decode(&head) {
        Ok(found) => found.sha256 == pointer.sha256,
        Err(_) => false,
    }
}
