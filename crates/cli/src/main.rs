//! Eaglewatch CLI - eaglewatch command

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use ew_cli::config::{self, Overrides};
use std::path::PathBuf;

mod cmd;
mod logging;
mod util;

/// Eaglewatch - Upload new images from watched folders into Eagle
#[derive(Parser)]
#[command(name = "eaglewatch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
    /// Config file (default: <config dir>/eaglewatch/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Folder to watch, in addition to configured ones (repeatable)
    #[arg(long = "root", global = true)]
    roots: Vec<PathBuf>,

    /// Processed-files ledger path
    #[arg(long, global = true)]
    ledger: Option<PathBuf>,

    /// Eagle API base URL
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Number of files processed at once
    #[arg(long, global = true)]
    workers: Option<usize>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Also write logs to daily files in this directory
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

impl GlobalArgs {
    fn overrides(&self) -> Overrides {
        Overrides {
            roots: self.roots.clone(),
            ledger: self.ledger.clone(),
            workers: self.workers,
            api_url: self.api_url.clone(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Watch folders and upload new images until interrupted
    Watch,
    /// Upload images already in the folders, then exit
    Scan,
    /// Show configuration, ledger and Eagle connectivity
    Status,
    /// Report whether files were already uploaded
    Check {
        /// Image files to check
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let _log_guard = logging::init(cli.global.verbose, cli.global.log_file.as_deref())?;

    let settings = config::load(cli.global.config.as_deref(), &cli.global.overrides())?;

    match cli.command {
        Commands::Watch => cmd::watch::run(&settings).await,
        Commands::Scan => cmd::scan::run(&settings).await,
        Commands::Status => cmd::status::run(&settings).await,
        Commands::Check { files } => cmd::check::run(&settings, &files).await,
    }
}
