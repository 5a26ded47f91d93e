//! Watch folders until interrupted

use anyhow::Result;
use ew_cli::daemon;
use ew_cli::Settings;
use owo_colors::OwoColorize;
use std::sync::Arc;

pub async fn run(settings: &Settings) -> Result<()> {
    let api = Arc::new(daemon::eagle_client(settings)?);

    let stats = daemon::run_watch(settings, api, daemon::shutdown_signal()).await?;

    println!("{} {}", "Stopped:".bold(), stats);
    Ok(())
}
