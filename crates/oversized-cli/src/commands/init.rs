use crate::output;
use anyhow::Result;
use clap::Parser;
use oversized_config::{credentials, Settings};
use oversized_git::Repo;
use oversized_store::{ObjectStore, S3Backend, S3Config};

/// Configure this repository for large file storage
///
/// Validates the settings, checks that the named AWS profile is readable,
/// probes the bucket, and only then persists configuration and installs the
/// filter driver. A failed check persists nothing.
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:
    # Use a bucket with the default credential chain
    git oversized init --bucket my-large-files

    # Shared bucket with a per-repo prefix and named profile
    git oversized init --bucket team-assets --prefix projects/render --profile storage")]
pub struct InitCmd {
    /// S3 bucket that will hold this repository's objects
    #[arg(long)]
    pub bucket: String,

    /// Key prefix inside the bucket
    #[arg(long)]
    pub prefix: Option<String>,

    /// AWS credentials profile to use
    #[arg(long)]
    pub profile: Option<String>,

    /// Skip the bucket reachability probe (air-gapped setup)
    #[arg(long)]
    pub offline: bool,
}

impl InitCmd {
    pub async fn execute(&self) -> Result<()> {
        let repo = Repo::discover()?;

        let settings = Settings::new(
            self.bucket.clone(),
            self.prefix.clone(),
            self.profile.clone(),
        );
        settings.validate()?;

        if let Some(profile) = &settings.profile {
            credentials::profile_is_readable(profile)?;
        }

        if !self.offline {
            // with_config performs the head_bucket probe.
            S3Backend::with_config(S3Config {
                bucket: settings.bucket.clone(),
                profile: settings.profile.clone(),
                ..Default::default()
            })
            .await?;
        }

        // Every check passed; now persist and wire up the repository.
        settings.persist(&mut repo.config()?)?;
        repo.install_filter()?;
        ObjectStore::open(repo.git_dir()).await?;

        output::success("Repository configured for large file storage");
        output::detail("bucket", &settings.bucket);
        if let Some(prefix) = &settings.prefix {
            output::detail("prefix", prefix);
        }
        if let Some(profile) = &settings.profile {
            output::detail("profile", profile);
        }
        output::info("Use 'git oversized track <pattern>' to route files through the filter");

        Ok(())
    }
}
