//! # Fulfillment Stage
//!
//! Second fan-out [`WorkerPool`], consuming reserved orders and completing
//! them (`Reserved → Filled`). Same concurrency discipline as
//! [`reservation`](crate::reservation): independent items, unordered output,
//! output closed only after every worker has finished.

use crate::model::{Order, TransitionError};
use async_trait::async_trait;
use stage_framework::{PipelineError, StageWorker, WorkerPool};
use tracing::debug;

/// Stage name used in logs and errors.
pub const STAGE: &str = "fulfillment";

/// Worker performing the `Reserved → Filled` transition.
#[derive(Debug, Clone, Copy, Default)]
pub struct FillWorker;

#[async_trait]
impl StageWorker for FillWorker {
    type Input = Order;
    type Output = Order;
    type Error = TransitionError;

    async fn process(&self, order: Order) -> Result<Order, TransitionError> {
        let filled = order.fill()?;
        debug!(product_code = %filled.product_code, "Order filled");
        Ok(filled)
    }
}

/// Creates the fulfillment pool with `workers` tasks.
pub fn pool(workers: usize) -> Result<WorkerPool<FillWorker>, PipelineError> {
    WorkerPool::new(STAGE, workers, FillWorker)
}
