// Oversized - Large File Storage for Git
// Copyright (C) 2025 Oversized Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published
// by the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.

//! git-oversized: large file storage for git over S3
//!
//! Installed as `git-oversized` so it is callable both directly and as
//! `git oversized <command>`. The filter-clean/filter-smudge subcommands are
//! wired into git's filter driver by `init` and speak the filter protocol on
//! stdin/stdout; every other subcommand is for humans.

mod commands;
mod context;
mod output;
mod progress;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use oversized_observability::{init_tracing, LogFormat};

#[derive(Parser, Debug)]
#[command(
    name = "git-oversized",
    version,
    about = "Store large files outside git, in S3, behind content-addressed pointers"
)]
struct Cli {
    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log errors only
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Init(commands::InitCmd),
    Track(commands::TrackCmd),
    Untrack(commands::UntrackCmd),
    Status(commands::StatusCmd),
    Push(commands::PushCmd),
    Pull(commands::PullCmd),
    Gc(commands::GcCmd),
    Verify(commands::VerifyCmd),
    Checkout(commands::CheckoutCmd),
    Find(commands::FindCmd),

    #[command(name = "filter-clean")]
    FilterClean(commands::FilterCleanCmd),

    #[command(name = "filter-smudge")]
    FilterSmudge(commands::FilterSmudgeCmd),

    #[command(name = "index-filter")]
    IndexFilter(commands::IndexFilterCmd),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.quiet {
        Some("error")
    } else if cli.verbose {
        Some("debug")
    } else {
        None
    };
    if let Err(e) = init_tracing(LogFormat::Compact, level) {
        eprintln!("failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(cli).await {
        output::error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Init(cmd) => cmd.execute().await,
        Commands::Track(cmd) => cmd.execute(),
        Commands::Untrack(cmd) => cmd.execute(),
        Commands::Status(cmd) => cmd.execute().await,
        Commands::Push(cmd) => cmd.execute().await,
        Commands::Pull(cmd) => cmd.execute().await,
        Commands::Gc(cmd) => cmd.execute().await,
        Commands::Verify(cmd) => cmd.execute().await,
        Commands::Checkout(cmd) => cmd.execute().await,
        Commands::Find(cmd) => cmd.execute().await,
        Commands::FilterClean(cmd) => cmd.execute().await,
        Commands::FilterSmudge(cmd) => cmd.execute().await,
        Commands::IndexFilter(cmd) => cmd.execute().await,
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            let name = command.get_name().to_string();
            clap_complete::generate(shell, &mut command, name, &mut std::io::stdout());
            Ok(())
        }
    }
}
