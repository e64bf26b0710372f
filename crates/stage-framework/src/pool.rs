//! # Fan-out Worker Pool
//!
//! This module defines the `WorkerPool`, which runs one [`StageWorker`] on N
//! concurrent tasks that all pull from the same input stream and push into the
//! same output stream.
//!
//! ## Join before close
//!
//! Workers finish at different times. If the output stream closed when the
//! *first* worker saw end-of-input, downstream would stop while the others
//! were still in flight; if it never closed, downstream would wait forever.
//! The pool therefore has a supervisor task that owns the first output
//! sender, joins every worker through a `JoinSet`, and only then closes the
//! stream.

use crate::error::PipelineError;
use crate::stream::{stream, Next, StageReceiver, StageSender};
use crate::worker::StageWorker;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};

/// Outcome of a pool run once every worker has exited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolSummary {
    /// Number of worker tasks that were started.
    pub workers: usize,
    /// Items that were processed *and* emitted downstream.
    pub processed: usize,
    /// True if at least one worker stopped because of cancellation.
    pub cancelled: bool,
}

/// Per-task result, folded into [`PoolSummary`] by the supervisor.
#[derive(Debug, Clone, Copy, Default)]
struct WorkerExit {
    processed: usize,
    cancelled: bool,
}

/// A fixed-size pool of tasks sharing one [`StageWorker`].
///
/// # Usage Pattern
///
/// 1.  **Create**: `WorkerPool::new(stage, workers, worker)`.
/// 2.  **Spawn**: hand it the upstream receiver; get the downstream receiver
///     and the supervisor handle back.
/// 3.  **Join**: await the supervisor handle after downstream has drained.
///
/// ```rust
/// use stage_framework::{stream, StageWorker, WorkerPool};
/// use async_trait::async_trait;
/// use tokio_util::sync::CancellationToken;
///
/// struct Double;
///
/// #[async_trait]
/// impl StageWorker for Double {
///     type Input = u32;
///     type Output = u32;
///     type Error = std::convert::Infallible;
///
///     async fn process(&self, item: u32) -> Result<u32, Self::Error> {
///         Ok(item * 2)
///     }
/// }
///
/// #[tokio::main]
/// async fn main() {
///     let (tx, rx) = stream("numbers", 8).unwrap();
///     let pool = WorkerPool::new("double", 3, Double).unwrap();
///     let (out, supervisor) = pool.spawn(rx, 8, CancellationToken::new()).unwrap();
///
///     for i in 1..=4 {
///         tx.emit(i).await.unwrap();
///     }
///     tx.close();
///
///     let mut doubled = out.drain().await;
///     doubled.sort();
///     assert_eq!(doubled, vec![2, 4, 6, 8]);
///     assert_eq!(supervisor.await.unwrap().unwrap().processed, 4);
/// }
/// ```
pub struct WorkerPool<W: StageWorker> {
    stage: &'static str,
    workers: usize,
    worker: Arc<W>,
}

impl<W: StageWorker> WorkerPool<W> {
    /// Creates a pool of `workers` tasks for the named stage.
    ///
    /// # Errors
    ///
    /// [`PipelineError::InvalidConfig`] if `workers` is zero.
    pub fn new(stage: &'static str, workers: usize, worker: W) -> Result<Self, PipelineError> {
        if workers == 0 {
            return Err(PipelineError::InvalidConfig(format!(
                "stage '{stage}' needs at least one worker"
            )));
        }
        Ok(Self {
            stage,
            workers,
            worker: Arc::new(worker),
        })
    }

    /// Name of the stage this pool implements.
    pub fn stage(&self) -> &'static str {
        self.stage
    }

    /// Number of worker tasks the pool will start.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Starts the workers and the supervisor.
    ///
    /// Returns the receiving end of the pool's output stream and the
    /// supervisor handle. The output stream reaches end-of-stream only after
    /// every worker has exited.
    pub fn spawn(
        self,
        input: StageReceiver<W::Input>,
        capacity: usize,
        shutdown: CancellationToken,
    ) -> Result<
        (
            StageReceiver<W::Output>,
            JoinHandle<Result<PoolSummary, PipelineError>>,
        ),
        PipelineError,
    > {
        let (output, downstream) = stream(self.stage, capacity)?;
        let stage = self.stage;
        let workers = self.workers;
        let input = Arc::new(Mutex::new(input));
        let span = info_span!("stage", name = stage);

        let mut tasks = JoinSet::new();
        for index in 0..workers {
            tasks.spawn(
                work(
                    stage,
                    index,
                    self.worker.clone(),
                    input.clone(),
                    output.clone(),
                    shutdown.clone(),
                )
                .instrument(span.clone()),
            );
        }
        drop(input);

        let supervisor = tokio::spawn(
            supervise(stage, workers, tasks, output, shutdown).instrument(span),
        );
        Ok((downstream, supervisor))
    }
}

/// Joins every worker, then closes the output stream.
async fn supervise<T>(
    stage: &'static str,
    workers: usize,
    mut tasks: JoinSet<Result<WorkerExit, PipelineError>>,
    output: StageSender<T>,
    shutdown: CancellationToken,
) -> Result<PoolSummary, PipelineError> {
    info!(workers, "Pool started");
    let mut summary = PoolSummary {
        workers,
        ..PoolSummary::default()
    };
    let mut failure = None;

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(exit)) => {
                summary.processed += exit.processed;
                summary.cancelled |= exit.cancelled;
            }
            Ok(Err(e)) => {
                failure.get_or_insert(e);
            }
            Err(e) => {
                error!(error = %e, "Worker task panicked");
                shutdown.cancel();
                failure.get_or_insert(PipelineError::WorkerPanicked { stage });
            }
        }
    }

    // All workers are gone; this is the last sender.
    output.close();

    match failure {
        Some(e) => {
            error!(error = %e, "Pool failed");
            Err(e)
        }
        None => {
            info!(
                processed = summary.processed,
                cancelled = summary.cancelled,
                "Pool finished"
            );
            Ok(summary)
        }
    }
}

/// Body of a single pool task.
async fn work<W: StageWorker>(
    stage: &'static str,
    index: usize,
    worker: Arc<W>,
    input: Arc<Mutex<StageReceiver<W::Input>>>,
    output: StageSender<W::Output>,
    shutdown: CancellationToken,
) -> Result<WorkerExit, PipelineError> {
    let mut exit = WorkerExit::default();

    loop {
        // The lock is held only while waiting for the next item, never while
        // processing it.
        let next = {
            let mut input = input.lock().await;
            input.next_until(&shutdown).await
        };
        let item = match next {
            Next::Item(item) => item,
            Next::End => break,
            Next::Cancelled => {
                exit.cancelled = true;
                break;
            }
        };

        debug!(worker = index, ?item, "Processing");
        let produced = match worker.process(item).await {
            Ok(produced) => produced,
            Err(e) => {
                error!(worker = index, error = %e, "Worker failed, cancelling run");
                shutdown.cancel();
                return Err(PipelineError::Worker {
                    stage,
                    source: Box::new(e),
                });
            }
        };

        if !output.emit_until(produced, &shutdown).await? {
            warn!(worker = index, "Cancelled before result could be emitted");
            exit.cancelled = true;
            break;
        }
        exit.processed += 1;
    }

    debug!(worker = index, processed = exit.processed, "Worker exited");
    Ok(exit)
}
