use crate::output;
use anyhow::Result;
use clap::Parser;
use oversized_git::Repo;

/// Route files matching a pattern through large file storage
#[derive(Parser, Debug)]
pub struct TrackCmd {
    /// Pattern to track (e.g. "*.psd", "assets/**/*.mp4")
    #[arg(value_name = "PATTERN")]
    pub pattern: String,
}

impl TrackCmd {
    pub fn execute(&self) -> Result<()> {
        let repo = Repo::discover()?;
        repo.track(&self.pattern)?;
        output::success(&format!("Tracking {}", self.pattern));
        Ok(())
    }
}

/// Stop routing a pattern through large file storage
#[derive(Parser, Debug)]
pub struct UntrackCmd {
    /// Pattern to untrack
    #[arg(value_name = "PATTERN")]
    pub pattern: String,
}

impl UntrackCmd {
    pub fn execute(&self) -> Result<()> {
        let repo = Repo::discover()?;
        repo.untrack(&self.pattern)?;
        output::success(&format!("No longer tracking {}", self.pattern));
        Ok(())
    }
}
