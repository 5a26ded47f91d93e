//! Run wiring
//!
//! Startup order matters: roots are validated and the category folder is
//! resolved before any file is touched. Either failing aborts the run.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use ew_core::ImageFilter;
use ew_eagle::{resolve_category, AssetApi, EagleClient};
use ew_journal::DedupLedger;
use ew_watcher::{collect_backlog, PollMonitor};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::config::Settings;
use crate::pipeline::Pipeline;
use crate::pool::WorkerPool;
use crate::stats::StatsSnapshot;

/// Everything a run needs once startup checks pass
pub struct Startup {
    pub roots: Vec<PathBuf>,
    pub pipeline: Arc<Pipeline>,
}

/// HTTP client configured from settings
pub fn eagle_client(settings: &Settings) -> Result<EagleClient> {
    EagleClient::with_timeouts(
        settings.eagle.base_url.clone(),
        settings.connect_timeout(),
        settings.request_timeout(),
    )
    .context("Failed to build HTTP client")
}

/// Validate roots, load the ledger and resolve the category folder
pub async fn prepare(settings: &Settings, api: Arc<dyn AssetApi>) -> Result<Startup> {
    let roots = settings.watched_roots();
    if roots.is_empty() {
        anyhow::bail!(
            "No valid folders to watch (set {}* or pass --root)",
            settings.watch.env_prefix
        );
    }
    for root in &roots.valid {
        info!(root = %root.display(), "Watched folder");
    }

    let ledger = DedupLedger::open(&settings.ledger.path).context("Failed to load ledger")?;

    let category = resolve_category(api.as_ref(), &settings.eagle.category)
        .await
        .with_context(|| format!("Failed to resolve category folder '{}'", settings.eagle.category))?;

    let pipeline = Pipeline::new(api, category, Arc::new(ledger), settings.stability_gate());
    Ok(Startup {
        roots: roots.valid,
        pipeline: Arc::new(pipeline),
    })
}

fn start_pool(settings: &Settings, pipeline: &Arc<Pipeline>) -> WorkerPool<PathBuf> {
    let pipeline = Arc::clone(pipeline);
    WorkerPool::new(
        settings.pool.workers,
        settings.pool.queue_capacity,
        move |path: PathBuf| {
            let pipeline = Arc::clone(&pipeline);
            async move { pipeline.run(path).await }
        },
    )
}

async fn submit(pool: &WorkerPool<PathBuf>, pipeline: &Pipeline, path: PathBuf) {
    pipeline.stats().record_submitted();
    if let Err(e) = pool.submit(path).await {
        error!(error = %e, "Dropped task");
    }
}

/// Queue every pre-existing eligible file; returns how many were found
async fn submit_backlog(
    roots: &[PathBuf],
    filter: &ImageFilter,
    pool: &WorkerPool<PathBuf>,
    pipeline: &Pipeline,
) -> Result<usize> {
    let (roots, filter) = (roots.to_vec(), filter.clone());
    let backlog = tokio::task::spawn_blocking(move || collect_backlog(&roots, &filter))
        .await
        .context("Backlog scan failed")?;

    info!(files = backlog.len(), "Backlog scan complete");
    let found = backlog.len();
    for path in backlog {
        submit(pool, pipeline, path).await;
    }
    Ok(found)
}

/// Process the backlog once and wait for every task
pub async fn run_scan(settings: &Settings, api: Arc<dyn AssetApi>) -> Result<StatsSnapshot> {
    let startup = prepare(settings, api).await?;
    let pool = start_pool(settings, &startup.pipeline);

    submit_backlog(&startup.roots, &settings.watch.extensions, &pool, &startup.pipeline).await?;
    pool.drain().await;

    let stats = startup.pipeline.stats().snapshot();
    info!(%stats, "Scan finished");
    pool.shutdown().await;
    Ok(stats)
}

/// Watch until `shutdown` completes, then let queued tasks finish
///
/// Monitoring starts before the backlog scan so files landing during the
/// scan are not missed; any overlap is absorbed by the ledger.
pub async fn run_watch<S>(
    settings: &Settings,
    api: Arc<dyn AssetApi>,
    shutdown: S,
) -> Result<StatsSnapshot>
where
    S: Future<Output = ()>,
{
    let startup = prepare(settings, api).await?;
    let pool = start_pool(settings, &startup.pipeline);

    let (tx, mut events) = mpsc::unbounded_channel();
    let monitor = PollMonitor::start(
        &startup.roots,
        settings.watch.extensions.clone(),
        settings.poll_interval(),
        tx,
    )
    .context("Failed to start folder monitor")?;

    submit_backlog(&startup.roots, &settings.watch.extensions, &pool, &startup.pipeline).await?;

    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown requested, finishing queued files");
                break;
            }
            event = events.recv() => match event {
                Some(event) => submit(&pool, &startup.pipeline, event.path).await,
                None => {
                    warn!("Monitor stopped unexpectedly");
                    break;
                }
            },
        }
    }

    monitor.stop();
    pool.shutdown().await;

    let stats = startup.pipeline.stats().snapshot();
    info!(%stats, "Stopped");
    Ok(stats)
}

/// Resolves on Ctrl-C
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
