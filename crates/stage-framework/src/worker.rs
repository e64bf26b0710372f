use async_trait::async_trait;
use std::fmt::Debug;

/// Business logic of one fan-out stage.
///
/// # Architecture Note
/// A [`WorkerPool`](crate::WorkerPool) owns the plumbing (shared input,
/// join-before-close, cancellation); the worker only says what happens to a
/// single item. The pool shares one worker value across all of its tasks
/// through an `Arc`, so `process` takes `&self`.
///
/// Each item is handed to exactly one task, and the worker receives it by
/// value. Nothing is shared between concurrent calls unless the worker
/// itself holds shared state.
#[async_trait]
pub trait StageWorker: Send + Sync + 'static {
    /// Item pulled from the stage's input stream.
    type Input: Send + Debug + 'static;

    /// Item emitted on the stage's output stream.
    type Output: Send + Debug + 'static;

    /// Failure of a single `process` call.
    ///
    /// A failing worker is treated as a pipeline fault: the run is cancelled
    /// and the error is reported by the pool's supervisor.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Transforms one input item into one output item.
    async fn process(&self, item: Self::Input) -> Result<Self::Output, Self::Error>;
}
