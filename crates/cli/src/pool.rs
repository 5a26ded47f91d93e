//! Bounded worker pool
//!
//! Jobs go through a bounded queue into a dispatcher that runs at most
//! `workers` of them at once. A full queue makes [`WorkerPool::submit`] wait.
//! Each job runs in its own task, so a panicking job is logged and its
//! siblings carry on.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, Notify, Semaphore};
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tracing::{debug, error};

#[derive(Debug, Error)]
#[error("worker pool is shut down")]
pub struct PoolClosed;

/// Jobs submitted but not yet finished
#[derive(Debug, Default)]
struct Pending {
    count: AtomicUsize,
    idle: Notify,
}

impl Pending {
    fn add(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }

    fn done(&self) {
        if self.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_waiters();
        }
    }
}

/// Marks a job finished even if it panics
struct JobGuard(Arc<Pending>);

impl Drop for JobGuard {
    fn drop(&mut self) {
        self.0.done();
    }
}

pub struct WorkerPool<T> {
    queue: mpsc::Sender<T>,
    pending: Arc<Pending>,
    dispatcher: JoinHandle<()>,
}

impl<T: Send + 'static> WorkerPool<T> {
    /// Start a pool running `handler` on up to `workers` jobs at a time
    pub fn new<F, Fut>(workers: usize, queue_capacity: usize, handler: F) -> Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (queue, jobs) = mpsc::channel(queue_capacity.max(1));
        let pending = Arc::new(Pending::default());
        let dispatcher = tokio::spawn(dispatch(
            jobs,
            workers.max(1),
            handler,
            Arc::clone(&pending),
        ));

        Self {
            queue,
            pending,
            dispatcher,
        }
    }

    /// Queue a job, waiting while the queue is full
    pub async fn submit(&self, job: T) -> Result<(), PoolClosed> {
        self.pending.add();
        if self.queue.send(job).await.is_err() {
            self.pending.done();
            return Err(PoolClosed);
        }
        Ok(())
    }

    /// Jobs queued or running
    pub fn pending(&self) -> usize {
        self.pending.count.load(Ordering::SeqCst)
    }

    /// Wait until every submitted job has finished
    pub async fn drain(&self) {
        loop {
            let idle = self.pending.idle.notified();
            if self.pending() == 0 {
                return;
            }
            idle.await;
        }
    }

    /// Stop accepting jobs and wait for queued and running ones to finish
    pub async fn shutdown(self) {
        drop(self.queue);
        if let Err(e) = self.dispatcher.await {
            error!(error = %e, "Worker pool dispatcher failed");
        }
    }
}

async fn dispatch<T, F, Fut>(
    mut jobs: mpsc::Receiver<T>,
    workers: usize,
    handler: F,
    pending: Arc<Pending>,
) where
    T: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let permits = Arc::new(Semaphore::new(workers));
    let mut running = JoinSet::new();

    loop {
        tokio::select! {
            biased;

            Some(finished) = running.join_next(), if !running.is_empty() => {
                report(finished);
            }
            permit = Arc::clone(&permits).acquire_owned() => {
                let Ok(permit) = permit else { break };
                let Some(job) = jobs.recv().await else { break };

                let guard = JobGuard(Arc::clone(&pending));
                let work = handler(job);
                running.spawn(async move {
                    let _guard = guard;
                    let _permit = permit;
                    work.await;
                });
            }
        }
    }

    debug!(running = running.len(), "Queue closed, waiting for running jobs");
    while let Some(finished) = running.join_next().await {
        report(finished);
    }
}

fn report(finished: Result<(), JoinError>) {
    if let Err(e) = finished {
        if e.is_panic() {
            error!("Worker job panicked");
        } else {
            error!(error = %e, "Worker job cancelled");
        }
    }
}
