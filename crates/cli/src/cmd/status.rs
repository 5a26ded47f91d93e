//! Show configuration, ledger and Eagle status

use crate::util;
use anyhow::Result;
use ew_cli::{daemon, Settings};
use ew_eagle::AssetApi;
use owo_colors::OwoColorize;

pub async fn run(settings: &Settings) -> Result<()> {
    let roots = settings.watched_roots();
    let ledger = util::open_existing_ledger(&settings.ledger.path)?;
    let client = daemon::eagle_client(settings)?;
    let listing = client.list_folders().await;

    println!("{}", "Eaglewatch Status".bold());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!();

    // Watched folders
    println!("Watched folders:");
    if roots.valid.is_empty() {
        println!("  {}", "None".red());
        println!(
            "  {}",
            format!("Tip: set {}* or pass --root", settings.watch.env_prefix).dimmed()
        );
    }
    for root in &roots.valid {
        println!("  {}", root.display().to_string().cyan());
    }
    for (root, reason) in &roots.rejected {
        println!("  {} {}", root.display().to_string().red(), format!("({reason})").dimmed());
    }
    let extensions: Vec<&str> = settings.watch.extensions.extensions().collect();
    println!("  Extensions:  {}", extensions.join(", "));
    println!();

    // Ledger
    println!("Ledger:");
    println!("  Path:        {}", settings.ledger.path.display());
    match &ledger {
        Some(ledger) => {
            let size = std::fs::metadata(ledger.path()).map(|m| m.len()).unwrap_or(0);
            println!("  Processed:   {} files", ledger.len());
            println!("  Size:        {}", util::format_size(size));
        }
        None => println!("  {}", "Not created yet".dimmed()),
    }
    println!();

    // Eagle
    println!("Eagle:");
    println!("  URL:         {}", settings.eagle.base_url);
    println!("  Category:    {}", settings.eagle.category);
    match listing {
        Ok(folders) => {
            println!("  Service:     {}", "Reachable ✓".green());
            let category = folders.iter().find(|f| f.name == settings.eagle.category);
            match category {
                Some(folder) => println!("  Folder id:   {}", folder.id),
                None => println!("  {}", "Category folder will be created on first run".dimmed()),
            }
        }
        Err(e) => {
            println!("  Service:     {}", "Unreachable".yellow());
            println!("  {}", e.to_string().dimmed());
        }
    }
    println!();

    // Pool
    println!("Workers:       {}", settings.pool.workers);
    println!(
        "Stability:     {} ms interval, {} ms timeout",
        settings.stability.interval_ms, settings.stability.timeout_ms
    );

    Ok(())
}
