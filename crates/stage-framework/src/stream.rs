//! # Closable Streams
//!
//! A stream is the unidirectional link between two stages: a bounded queue
//! with blocking put, blocking get and an explicit end-of-stream signal.
//!
//! - [`StageSender`] is the producing half. It can be cloned so several pool
//!   workers share one output; the stream ends once every clone is closed.
//! - [`StageReceiver`] is the consuming half. `next()` yields `None` only after
//!   end-of-stream *and* an empty buffer, so a consumer never stops early.
//!
//! Capacity is the only source of backpressure: a producer suspends in
//! [`StageSender::emit`] while the buffer is full.

use crate::error::PipelineError;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Creates a bounded stream owned by the named producing stage.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] for a zero capacity, which
/// `tokio::sync::mpsc::channel` would otherwise reject with a panic.
pub fn stream<T>(
    stage: &'static str,
    capacity: usize,
) -> Result<(StageSender<T>, StageReceiver<T>), PipelineError> {
    if capacity == 0 {
        return Err(PipelineError::InvalidConfig(format!(
            "stream for stage '{stage}' needs a capacity of at least 1"
        )));
    }
    let (sender, receiver) = mpsc::channel(capacity);
    Ok((
        StageSender {
            inner: sender,
            stage,
        },
        StageReceiver { inner: receiver },
    ))
}

/// Producing half of a stream.
#[derive(Debug)]
pub struct StageSender<T> {
    inner: mpsc::Sender<T>,
    stage: &'static str,
}

impl<T> Clone for StageSender<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            stage: self.stage,
        }
    }
}

impl<T> StageSender<T> {
    /// Name of the stage that owns this stream.
    pub fn stage(&self) -> &'static str {
        self.stage
    }

    /// Emits one item, suspending while the buffer is full.
    pub async fn emit(&self, item: T) -> Result<(), PipelineError> {
        self.inner
            .send(item)
            .await
            .map_err(|_| PipelineError::StreamClosed { stage: self.stage })
    }

    /// Emits one item unless `shutdown` is cancelled first.
    ///
    /// Returns `Ok(true)` once the item is buffered and `Ok(false)` if the run
    /// was cancelled, either while waiting for capacity or because the
    /// consumer already stopped. A closed stream without cancellation is
    /// still a [`PipelineError::StreamClosed`].
    pub async fn emit_until(
        &self,
        item: T,
        shutdown: &CancellationToken,
    ) -> Result<bool, PipelineError> {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => Ok(false),
            sent = self.inner.send(item) => match sent {
                Ok(()) => Ok(true),
                Err(_) if shutdown.is_cancelled() => Ok(false),
                Err(_) => Err(PipelineError::StreamClosed { stage: self.stage }),
            },
        }
    }

    /// Signals end-of-stream for this handle.
    ///
    /// The consumer observes end-of-stream once *every* clone has been closed.
    pub fn close(self) {
        debug!(stage = self.stage, "Stream handle closed");
    }
}

/// Outcome of a cancellable receive.
#[derive(Debug, PartialEq, Eq)]
pub enum Next<T> {
    /// The next item from the stream.
    Item(T),
    /// End-of-stream: every producer closed and the buffer is empty.
    End,
    /// The run was cancelled while items could still arrive.
    Cancelled,
}

/// Consuming half of a stream.
#[derive(Debug)]
pub struct StageReceiver<T> {
    inner: mpsc::Receiver<T>,
}

impl<T> StageReceiver<T> {
    /// Waits for the next item; `None` means end-of-stream.
    pub async fn next(&mut self) -> Option<T> {
        self.inner.recv().await
    }

    /// Like [`next`](Self::next), but stops once `shutdown` is cancelled.
    ///
    /// Cancellation wins over a buffered item. A stream that has already
    /// ended reports [`Next::End`] even after cancellation, so a consumer
    /// that saw all of its input is never counted as cut short.
    pub async fn next_until(&mut self, shutdown: &CancellationToken) -> Next<T> {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                if self.inner.is_closed() && self.inner.is_empty() {
                    Next::End
                } else {
                    Next::Cancelled
                }
            }
            item = self.inner.recv() => match item {
                Some(item) => Next::Item(item),
                None => Next::End,
            },
        }
    }

    /// Collects every remaining item until end-of-stream.
    pub async fn drain(mut self) -> Vec<T> {
        let mut items = Vec::new();
        while let Some(item) = self.inner.recv().await {
            items.push(item);
        }
        items
    }
}
