//! # Validation Stage
//!
//! Splits the received orders into two streams: valid orders continue to
//! reservation, invalid ones go to the rejection sink as [`InvalidOrder`]s.
//!
//! ## Policy
//!
//! An order is invalid iff its quantity is `<= 0` (a `NaN` quantity is
//! invalid too). Rejection is a business outcome, not a fault.
//!
//! ## Ordering
//!
//! One task does all the work, so each output keeps the relative input order.
//! There is no ordering between the two outputs.
//!
//! ## Usage
//!
//! ```rust
//! use order_pipeline::model::Order;
//! use order_pipeline::validation;
//! use stage_framework::stream;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (tx, rx) = stream("source", 4)?;
//!     let (valid, invalid, handle) = validation::spawn(rx, 4, CancellationToken::new())?;
//!
//!     tx.emit(Order::new(1111, -42.5).receive()?).await?;
//!     tx.emit(Order::new(2222, 54.22).receive()?).await?;
//!     tx.close();
//!
//!     let (valid, invalid) = tokio::join!(valid.drain(), invalid.drain());
//!     assert_eq!(valid.len(), 1);
//!     assert_eq!(invalid.len(), 1);
//!     assert_eq!(handle.await??.invalid, 1);
//!     Ok(())
//! }
//! ```

pub mod error;

pub use error::*;

use crate::model::{InvalidOrder, Order};
use stage_framework::{stream, Next, PipelineError, StageReceiver};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, Instrument};

/// Stage name used in logs and errors.
pub const STAGE: &str = "validation";

/// Counts reported by the validation task when it finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationSummary {
    pub valid: usize,
    pub invalid: usize,
    pub cancelled: bool,
}

/// Applies the quantity rule to one order.
pub fn check(order: &Order) -> Result<(), ValidationError> {
    // Written so that NaN fails as well.
    if order.quantity > 0.0 {
        Ok(())
    } else {
        Err(ValidationError::NonPositiveQuantity {
            quantity: order.quantity,
        })
    }
}

/// Routes one order to exactly one side.
pub fn validate(order: Order) -> Result<Order, InvalidOrder> {
    match check(&order) {
        Ok(()) => Ok(order),
        Err(reason) => Err(InvalidOrder::new(order, reason)),
    }
}

/// Starts the validation task.
///
/// Returns the valid-order stream, the invalid-order stream and the task
/// handle. Both streams reach end-of-stream exactly once, after the input is
/// exhausted (or the run is cancelled).
pub fn spawn(
    mut input: StageReceiver<Order>,
    capacity: usize,
    shutdown: CancellationToken,
) -> Result<
    (
        StageReceiver<Order>,
        StageReceiver<InvalidOrder>,
        JoinHandle<Result<ValidationSummary, PipelineError>>,
    ),
    PipelineError,
> {
    let (valid_tx, valid_rx) = stream(STAGE, capacity)?;
    let (invalid_tx, invalid_rx) = stream(STAGE, capacity)?;

    let handle = tokio::spawn(
        async move {
            info!("Stage started");
            let mut summary = ValidationSummary::default();

            loop {
                let order = match input.next_until(&shutdown).await {
                    Next::Item(order) => order,
                    Next::End => break,
                    Next::Cancelled => {
                        summary.cancelled = true;
                        break;
                    }
                };
                let emitted = match validate(order) {
                    Ok(order) => {
                        debug!(product_code = %order.product_code, quantity = order.quantity, "Order valid");
                        let sent = valid_tx.emit_until(order, &shutdown).await?;
                        summary.valid += usize::from(sent);
                        sent
                    }
                    Err(invalid) => {
                        info!(
                            product_code = %invalid.order.product_code,
                            quantity = invalid.order.quantity,
                            reason = %invalid.reason,
                            "Order rejected"
                        );
                        let sent = invalid_tx.emit_until(invalid, &shutdown).await?;
                        summary.invalid += usize::from(sent);
                        sent
                    }
                };
                if !emitted {
                    summary.cancelled = true;
                    break;
                }
            }

            // Both outputs close together, only after the input is drained.
            valid_tx.close();
            invalid_tx.close();
            info!(
                valid = summary.valid,
                invalid = summary.invalid,
                cancelled = summary.cancelled,
                "Stage finished"
            );
            Ok(summary)
        }
        .instrument(info_span!("stage", name = STAGE)),
    );

    Ok((valid_rx, invalid_rx, handle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::OrderStatus;

    fn received(code: i64, quantity: f64) -> Order {
        Order::new(code, quantity).receive().unwrap()
    }

    #[test]
    fn test_quantity_rule() {
        assert!(check(&received(1, 0.01)).is_ok());
        assert!(check(&received(1, 0.0)).is_err());
        assert!(check(&received(1, -1.0)).is_err());
        assert!(check(&received(1, f64::NAN)).is_err());
    }

    #[test]
    fn test_diagnostic_names_quantity() {
        let invalid = validate(received(1111, -42.5)).unwrap_err();
        assert_eq!(
            invalid.diagnostic(),
            "invalid order quantity: -42.5, order quantity should be greater than 0"
        );
        assert_eq!(invalid.order.status, OrderStatus::Received);
    }

    #[tokio::test]
    async fn test_each_output_keeps_input_order() {
        let (tx, rx) = stream(crate::source::STAGE, 16).unwrap();
        let (valid, invalid, handle) = spawn(rx, 16, CancellationToken::new()).unwrap();

        let quantities = [5.0, -1.0, 3.0, 0.0, 1.0, -2.0];
        for (i, q) in quantities.iter().enumerate() {
            tx.emit(received(i as i64, *q)).await.unwrap();
        }
        tx.close();

        let (valid, invalid) = tokio::join!(valid.drain(), invalid.drain());
        let valid_codes: Vec<i64> = valid.iter().map(|o| o.product_code.0).collect();
        let invalid_codes: Vec<i64> = invalid.iter().map(|o| o.order.product_code.0).collect();
        assert_eq!(valid_codes, vec![0, 2, 4]);
        assert_eq!(invalid_codes, vec![1, 3, 5]);

        let summary = handle.await.unwrap().unwrap();
        assert_eq!(
            summary,
            ValidationSummary {
                valid: 3,
                invalid: 3,
                cancelled: false
            }
        );
    }

    #[tokio::test]
    async fn test_outputs_close_only_after_input() {
        let (tx, rx) = stream(crate::source::STAGE, 1).unwrap();
        let (mut valid, mut invalid, handle) = spawn(rx, 1, CancellationToken::new()).unwrap();

        tx.emit(received(7, 1.0)).await.unwrap();
        assert_eq!(valid.next().await.map(|o| o.product_code.0), Some(7));

        // Input still open: the invalid side must not have closed.
        let pending = tokio::time::timeout(std::time::Duration::from_millis(20), invalid.next()).await;
        assert!(pending.is_err());

        tx.close();
        assert!(valid.next().await.is_none());
        assert!(invalid.next().await.is_none());
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_cancel_after_input_exhausted_is_not_cancellation() {
        let shutdown = CancellationToken::new();
        let (tx, rx) = stream(crate::source::STAGE, 4).unwrap();
        let (valid, invalid, handle) = spawn(rx, 4, shutdown.clone()).unwrap();

        tx.emit(received(1, 1.0)).await.unwrap();
        tx.emit(received(2, -1.0)).await.unwrap();
        tx.close();
        let (valid, invalid) = tokio::join!(valid.drain(), invalid.drain());
        assert_eq!((valid.len(), invalid.len()), (1, 1));

        shutdown.cancel();
        assert!(!handle.await.unwrap().unwrap().cancelled);
    }

    #[tokio::test]
    async fn test_cancel_with_input_open_marks_stage_cancelled() {
        let shutdown = CancellationToken::new();
        let (tx, rx) = stream(crate::source::STAGE, 4).unwrap();
        let (valid, invalid, handle) = spawn(rx, 4, shutdown.clone()).unwrap();

        shutdown.cancel();
        let (valid, invalid) = tokio::join!(valid.drain(), invalid.drain());
        assert!(valid.is_empty() && invalid.is_empty());
        assert!(handle.await.unwrap().unwrap().cancelled);
        drop(tx);
    }
}
