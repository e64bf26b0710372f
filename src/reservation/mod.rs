//! # Reservation Stage
//!
//! A fan-out [`WorkerPool`] that marks each valid order as inventory-reserved
//! (`Received → Reserved`). Reservation of one order is independent of every
//! other, so any number of workers may run at once; output order across the
//! pool is not guaranteed.
//!
//! There is no inventory store behind this stage: reserving is the status
//! transition itself.

use crate::model::{Order, TransitionError};
use async_trait::async_trait;
use stage_framework::{PipelineError, StageWorker, WorkerPool};
use tracing::debug;

/// Stage name used in logs and errors.
pub const STAGE: &str = "reservation";

/// Worker performing the `Received → Reserved` transition.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReserveWorker;

#[async_trait]
impl StageWorker for ReserveWorker {
    type Input = Order;
    type Output = Order;
    type Error = TransitionError;

    async fn process(&self, order: Order) -> Result<Order, TransitionError> {
        let reserved = order.reserve()?;
        debug!(product_code = %reserved.product_code, quantity = reserved.quantity, "Inventory reserved");
        Ok(reserved)
    }
}

/// Creates the reservation pool with `workers` tasks.
pub fn pool(workers: usize) -> Result<WorkerPool<ReserveWorker>, PipelineError> {
    WorkerPool::new(STAGE, workers, ReserveWorker)
}
