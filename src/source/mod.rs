//! # Source Stage
//!
//! Decodes raw JSON order records into [`Order`]s and emits them, in input
//! order, on a single stream.
//!
//! ## Record format
//!
//! ```json
//! {"productCode": 2222, "quantity": 54.22, "status": 2}
//! ```
//!
//! Field names match case-insensitively; missing or `null` fields default to
//! zero. The inbound `status` is ignored: every
//! decoded order leaves this stage as [`OrderStatus::Received`](crate::model::OrderStatus::Received).
//!
//! ## Failures
//!
//! A record that does not decode is logged at `warn` and dropped; the stage
//! moves on to the next record. The output stream closes exactly once, after
//! the last record.

pub mod error;

pub use error::*;

use crate::model::{Order, OrderStatus, ProductCode};
use serde::de::{IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use stage_framework::{stream, PipelineError, StageReceiver};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};

/// Stage name used in logs and errors.
pub const STAGE: &str = "source";

/// Wire shape of an order record.
///
/// Field names match case-insensitively (`productCode`, `ProductCode`,
/// `PRODUCTCODE`, ...). A missing or `null` field leaves the value at zero,
/// unknown fields are skipped, and when a field appears twice the later one
/// wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawOrder {
    pub product_code: i64,
    pub quantity: f64,
    pub status: i64,
}

impl<'de> Deserialize<'de> for RawOrder {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(RawOrderVisitor)
    }
}

struct RawOrderVisitor;

impl<'de> Visitor<'de> for RawOrderVisitor {
    type Value = RawOrder;

    fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("an order record object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<RawOrder, A::Error> {
        let mut raw = RawOrder::default();
        while let Some(key) = map.next_key::<String>()? {
            if key.eq_ignore_ascii_case("productCode") {
                if let Some(code) = map.next_value::<Option<i64>>()? {
                    raw.product_code = code;
                }
            } else if key.eq_ignore_ascii_case("quantity") {
                if let Some(quantity) = map.next_value::<Option<f64>>()? {
                    raw.quantity = quantity;
                }
            } else if key.eq_ignore_ascii_case("status") {
                if let Some(status) = map.next_value::<Option<i64>>()? {
                    raw.status = status;
                }
            } else {
                map.next_value::<IgnoredAny>()?;
            }
        }
        Ok(raw)
    }
}

impl From<RawOrder> for Order {
    fn from(raw: RawOrder) -> Self {
        Order::new(raw.product_code, raw.quantity)
    }
}

/// Counts reported by the source task when it finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceSummary {
    /// Records handed to the stage.
    pub received: usize,
    /// Orders emitted downstream.
    pub emitted: usize,
    /// Records dropped because they did not decode.
    pub dropped: usize,
    pub cancelled: bool,
}

/// Decodes one raw record into an order that has not been received yet.
pub fn decode(record: &str) -> Result<Order, DecodeError> {
    let raw: RawOrder = serde_json::from_str(record)?;
    let inbound = OrderStatus::from_code(raw.status)
        .map_or_else(|| "Unknown status".to_string(), |s| s.to_string());
    debug!(
        product_code = raw.product_code,
        inbound_status = %inbound,
        "Ignoring inbound status"
    );
    Ok(raw.into())
}

/// Starts the source task over a finite batch of records.
pub fn spawn(
    records: Vec<String>,
    capacity: usize,
    shutdown: CancellationToken,
) -> Result<
    (
        StageReceiver<Order>,
        JoinHandle<Result<SourceSummary, PipelineError>>,
    ),
    PipelineError,
> {
    let (output, downstream) = stream(STAGE, capacity)?;

    let handle = tokio::spawn(
        async move {
            info!(records = records.len(), "Stage started");
            let mut summary = SourceSummary::default();

            for (index, record) in records.into_iter().enumerate() {
                if shutdown.is_cancelled() {
                    summary.cancelled = true;
                    break;
                }
                summary.received += 1;

                let order = match decode(&record) {
                    Ok(order) => order,
                    Err(e) => {
                        warn!(index, error = %e, "Dropping undecodable record");
                        summary.dropped += 1;
                        continue;
                    }
                };
                let order = order.receive().map_err(|e| PipelineError::Worker {
                    stage: STAGE,
                    source: Box::new(e),
                })?;
                let product_code: ProductCode = order.product_code;

                if !output.emit_until(order, &shutdown).await? {
                    summary.cancelled = true;
                    break;
                }
                debug!(%product_code, "Order received");
                summary.emitted += 1;
            }

            output.close();
            info!(
                emitted = summary.emitted,
                dropped = summary.dropped,
                cancelled = summary.cancelled,
                "Stage finished"
            );
            Ok(summary)
        }
        .instrument(info_span!("stage", name = STAGE)),
    );

    Ok((downstream, handle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_ignores_inbound_status() {
        let order = decode(r#"{"productCode": 3333, "quantity": 61.23, "status": 3}"#).unwrap();
        assert_eq!(order.product_code, ProductCode(3333));
        assert_eq!(order.quantity, 61.23);
        assert_eq!(order.status, OrderStatus::None);
    }

    #[test]
    fn test_decode_defaults_missing_fields() {
        let order = decode("{}").unwrap();
        assert_eq!(order, Order::new(0, 0.0));
    }

    #[test]
    fn test_decode_matches_field_names_case_insensitively() {
        let order = decode(r#"{"ProductCode": 5555, "Quantity": 3.5, "Status": 1}"#).unwrap();
        assert_eq!(order, Order::new(5555, 3.5));

        let order = decode(r#"{"PRODUCTCODE": 7, "quantity": 1.0, "note": [1, 2]}"#).unwrap();
        assert_eq!(order, Order::new(7, 1.0));
    }

    #[test]
    fn test_decode_treats_null_as_zero() {
        let order = decode(r#"{"productCode": 6666, "quantity": null, "status": null}"#).unwrap();
        assert_eq!(order, Order::new(6666, 0.0));

        // A later null does not clear an earlier value.
        let order = decode(r#"{"quantity": 2.0, "Quantity": null, "productCode": 1}"#).unwrap();
        assert_eq!(order.quantity, 2.0);
    }

    #[test]
    fn test_decode_later_duplicate_field_wins() {
        let order = decode(r#"{"productCode": 1, "productcode": 2, "quantity": 1.0}"#).unwrap();
        assert_eq!(order.product_code, ProductCode(2));
    }

    #[test]
    fn test_decode_rejects_non_numeric_code() {
        let err = decode(r#"{"productCode": "abc", "quantity": 1.0}"#).unwrap_err();
        assert!(matches!(err, DecodeError::Malformed(_)));
        assert!(decode("not json").is_err());
        assert!(decode("[1, 2, 3]").is_err());
    }

    #[tokio::test]
    async fn test_drops_bad_records_and_keeps_order() {
        let records = vec![
            r#"{"productCode": 1, "quantity": 1.0}"#.to_string(),
            r#"{"productCode": "x"}"#.to_string(),
            r#"{"productCode": 2, "quantity": -1.0}"#.to_string(),
            "{".to_string(),
            r#"{"productCode": 3, "quantity": 2.5}"#.to_string(),
        ];
        let (orders, handle) = spawn(records, 2, CancellationToken::new()).unwrap();

        let orders = orders.drain().await;
        let codes: Vec<i64> = orders.iter().map(|o| o.product_code.0).collect();
        assert_eq!(codes, vec![1, 2, 3]);
        assert!(orders.iter().all(|o| o.status == OrderStatus::Received));

        let summary = handle.await.unwrap().unwrap();
        assert_eq!(summary.received, 5);
        assert_eq!(summary.emitted, 3);
        assert_eq!(summary.dropped, 2);
        assert!(!summary.cancelled);
    }

    #[tokio::test]
    async fn test_empty_batch_closes_stream() {
        let (orders, handle) = spawn(Vec::new(), 1, CancellationToken::new()).unwrap();
        assert!(orders.drain().await.is_empty());
        assert_eq!(handle.await.unwrap().unwrap(), SourceSummary::default());
    }

    #[tokio::test]
    async fn test_cancel_after_last_record_is_not_cancellation() {
        let shutdown = CancellationToken::new();
        let records = vec![r#"{"productCode": 1, "quantity": 1.0}"#.to_string()];
        let (orders, handle) = spawn(records, 2, shutdown.clone()).unwrap();

        assert_eq!(orders.drain().await.len(), 1);
        shutdown.cancel();
        assert!(!handle.await.unwrap().unwrap().cancelled);
    }

    #[tokio::test]
    async fn test_cancelled_before_start_emits_nothing() {
        let shutdown = CancellationToken::new();
        shutdown.cancel();
        let records = vec![r#"{"productCode": 1, "quantity": 1.0}"#.to_string()];
        let (orders, handle) = spawn(records, 2, shutdown).unwrap();

        assert!(orders.drain().await.is_empty());
        let summary = handle.await.unwrap().unwrap();
        assert!(summary.cancelled);
        assert_eq!(summary.received, 0);
    }
}
