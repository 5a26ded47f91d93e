//! One-shot upload of files already present

use anyhow::Result;
use ew_cli::daemon;
use ew_cli::Settings;
use owo_colors::OwoColorize;
use std::sync::Arc;

pub async fn run(settings: &Settings) -> Result<()> {
    let api = Arc::new(daemon::eagle_client(settings)?);

    let stats = daemon::run_scan(settings, api).await?;

    println!("{}", "Scan complete".bold());
    println!("  Found:       {}", stats.submitted);
    println!("  Uploaded:    {}", stats.uploaded.green());
    println!("  Duplicates:  {}", stats.duplicates);
    println!("  Skipped:     {}", stats.abandoned.yellow());
    println!("  Failed:      {}", stats.failed.red());

    if stats.failed > 0 {
        anyhow::bail!("{} file(s) failed to upload", stats.failed);
    }
    Ok(())
}
