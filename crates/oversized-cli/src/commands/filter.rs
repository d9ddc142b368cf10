//! The `filter-clean` and `filter-smudge` subcommands
//!
//! These are invoked by git, not by people: stdin carries file content (or a
//! pointer record), stdout must carry exactly the transformed bytes and
//! nothing else. All diagnostics go to stderr via tracing.

use anyhow::{Context, Result};
use clap::Parser;
use oversized_config::Settings;
use oversized_git::{FilterPipeline, Repo};
use oversized_store::{ObjectStore, RemoteBackend, RemoteNamespace, S3Backend, S3Config};
use tracing::{debug, warn};

/// Clean filter: store file content, emit a pointer record (invoked by git)
#[derive(Parser, Debug)]
pub struct FilterCleanCmd {
    /// Path of the file being filtered, as substituted by git for %f
    #[arg(value_name = "FILE")]
    pub file: Option<String>,
}

impl FilterCleanCmd {
    pub async fn execute(&self) -> Result<()> {
        let (repo, store, namespace) = filter_setup().await?;
        drop(repo);

        let pipeline = FilterPipeline::new(store, namespace);
        let outcome = pipeline
            .clean(tokio::io::stdin(), tokio::io::stdout())
            .await
            .with_context(|| {
                format!("clean filter failed for {}", self.file.as_deref().unwrap_or("<stdin>"))
            })?;

        debug!(file = self.file.as_deref(), ?outcome, "clean filter done");
        Ok(())
    }
}

/// Smudge filter: resolve a pointer record to file content (invoked by git)
#[derive(Parser, Debug)]
pub struct FilterSmudgeCmd {
    /// Path of the file being filtered, as substituted by git for %f
    #[arg(value_name = "FILE")]
    pub file: Option<String>,
}

impl FilterSmudgeCmd {
    pub async fn execute(&self) -> Result<()> {
        let (repo, store, namespace) = filter_setup().await?;

        // A remote is optional here: without one, smudge still materializes
        // anything cached locally. Connect up front because stdin cannot be
        // replayed after a failed attempt.
        let remote = smudge_remote(&repo).await;
        drop(repo);

        let pipeline = FilterPipeline::new(store, namespace);
        let outcome = pipeline
            .smudge(
                tokio::io::stdin(),
                tokio::io::stdout(),
                remote.as_ref().map(|b| b as &dyn RemoteBackend),
            )
            .await
            .with_context(|| {
                format!("smudge filter failed for {}", self.file.as_deref().unwrap_or("<stdin>"))
            })?;

        debug!(file = self.file.as_deref(), ?outcome, "smudge filter done");
        Ok(())
    }
}

/// Open the repository the way git invokes filters: environment first, then
/// discovery from the working directory.
async fn filter_setup() -> Result<(Repo, ObjectStore, RemoteNamespace)> {
    let repo = Repo::open_from_env().or_else(|_| Repo::discover())?;
    let store = ObjectStore::open(repo.git_dir()).await?;

    let namespace = match repo.config() {
        Ok(mut config) => match Settings::load(&mut config) {
            Ok(settings) => RemoteNamespace::new(settings.prefix),
            Err(_) => RemoteNamespace::default(),
        },
        Err(_) => RemoteNamespace::default(),
    };

    Ok((repo, store, namespace))
}

/// Best-effort S3 connection for smudge. An unconfigured or unreachable
/// bucket downgrades to local-only materialization rather than failing the
/// checkout outright.
async fn smudge_remote(repo: &Repo) -> Option<S3Backend> {
    let mut config = repo.config().ok()?;
    let settings = Settings::load(&mut config).ok()?;

    let s3 = S3Config {
        bucket: settings.bucket.clone(),
        profile: settings.profile.clone(),
        ..Default::default()
    };
    match S3Backend::with_config(s3).await {
        Ok(backend) => Some(backend),
        Err(e) => {
            warn!("bucket '{}' unreachable, smudging locally: {}", settings.bucket, e);
            None
        }
    }
}
