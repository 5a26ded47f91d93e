//! Report whether files were already uploaded

use crate::util;
use anyhow::Result;
use ew_cli::Settings;
use ew_core::hash_file;
use owo_colors::OwoColorize;
use std::path::PathBuf;

pub async fn run(settings: &Settings, files: &[PathBuf]) -> Result<()> {
    let ledger = util::open_existing_ledger(&settings.ledger.path)?;
    let mut unreadable = 0usize;

    for path in files {
        let owned = path.clone();
        let hashed = tokio::task::spawn_blocking(move || {
            let size = std::fs::metadata(&owned)?.len();
            hash_file(&owned).map(|digest| (digest, size))
        })
        .await?;

        match hashed {
            Ok((digest, size)) => {
                let processed = ledger.as_ref().is_some_and(|l| l.is_committed(&digest));
                let state = if processed {
                    "processed".green().to_string()
                } else {
                    "new".yellow().to_string()
                };
                println!(
                    "{}  {}  {:>10}  {}",
                    digest.short().dimmed(),
                    state,
                    util::format_size(size),
                    path.display()
                );
            }
            Err(e) => {
                unreadable += 1;
                println!("{}  {}", "error".red(), format!("{}: {e}", path.display()));
            }
        }
    }

    if unreadable > 0 {
        anyhow::bail!("{} file(s) could not be read", unreadable);
    }
    Ok(())
}
