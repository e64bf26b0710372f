use crate::lifecycle::PipelineConfig;
use crate::model::{InvalidOrder, Order};
use crate::{fulfillment, reservation, sink, source, validation};
use stage_framework::PipelineError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Everything a run produced, grouped by disposition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineReport {
    /// Orders that reached `Filled`, in completion order.
    pub filled: Vec<Order>,
    /// Orders rejected by validation, in input order.
    pub rejected: Vec<InvalidOrder>,
    /// Records dropped because they did not decode.
    pub dropped: usize,
    /// Records the source stage took in.
    pub received: usize,
    /// True if the run was cut short by cancellation or its deadline.
    pub cancelled: bool,
}

impl PipelineReport {
    /// Records with a known final disposition.
    pub fn total(&self) -> usize {
        self.filled.len() + self.rejected.len() + self.dropped
    }

    /// `filled + rejected + dropped == received`.
    pub fn is_conserved(&self) -> bool {
        self.total() == self.received
    }
}

/// The orchestrator for the staged order pipeline.
///
/// `OrderPipeline` is responsible for:
/// - **Wiring**: Source → Validation → Reservation → Fulfillment, plus the two sinks
/// - **Completion**: joining *both* sinks before declaring the run done
/// - **Fault reporting**: joining every stage so wiring errors are never swallowed
///
/// # Example
///
/// ```rust
/// use order_pipeline::lifecycle::{OrderPipeline, PipelineConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let pipeline = OrderPipeline::new(PipelineConfig::default())?;
///     let report = pipeline
///         .run(vec![
///             r#"{"productCode": 1111, "quantity": -42.5, "status": 1}"#.to_string(),
///             r#"{"productCode": 2222, "quantity": 54.22, "status": 2}"#.to_string(),
///         ])
///         .await?;
///
///     assert_eq!(report.filled.len(), 1);
///     assert_eq!(report.rejected.len(), 1);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct OrderPipeline {
    config: PipelineConfig,
}

impl OrderPipeline {
    /// Creates a pipeline after validating `config`.
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Processes a finite batch of raw records exactly once.
    pub async fn run(&self, records: Vec<String>) -> Result<PipelineReport, PipelineError> {
        self.run_with_shutdown(records, CancellationToken::new()).await
    }

    /// Like [`run`](Self::run), with an externally owned cancellation token.
    ///
    /// Cancelling the token makes every stage stop pulling input; the sinks
    /// still drain what already arrived and the report has `cancelled` set.
    pub async fn run_with_shutdown(
        &self,
        records: Vec<String>,
        shutdown: CancellationToken,
    ) -> Result<PipelineReport, PipelineError> {
        // Internal faults cancel the run, not the caller's token.
        let shutdown = shutdown.child_token();
        let capacity = self.config.channel_capacity;
        info!(
            records = records.len(),
            reservation_workers = self.config.reservation_workers,
            fulfillment_workers = self.config.fulfillment_workers,
            "Starting pipeline"
        );

        let deadline = self.config.deadline.map(|after| arm_deadline(after, shutdown.clone()));

        // =====================================================================
        // 1. Wire the stages, upstream first
        // =====================================================================

        let (received, source_task) = source::spawn(records, capacity, shutdown.clone())?;
        let (valid, invalid, validation_task) =
            validation::spawn(received, capacity, shutdown.clone())?;
        let (reserved, reservation_task) = reservation::pool(self.config.reservation_workers)?
            .spawn(valid, capacity, shutdown.clone())?;
        let (filled, fulfillment_task) = fulfillment::pool(self.config.fulfillment_workers)?
            .spawn(reserved, capacity, shutdown.clone())?;

        // =====================================================================
        // 2. Drain both result streams and wait for *both* sinks
        // =====================================================================

        let filled_sink = sink::spawn("filled", filled);
        let rejected_sink = sink::spawn("rejected", invalid);
        let (filled, rejected) = tokio::try_join!(filled_sink, rejected_sink)
            .map_err(|e| PipelineError::join("sink", e))?;

        if let Some(deadline) = deadline {
            deadline.abort();
        }

        // =====================================================================
        // 3. Join every stage; any fault here is a wiring error
        // =====================================================================

        let source = source_task
            .await
            .map_err(|e| PipelineError::join(source::STAGE, e))??;
        let validation = validation_task
            .await
            .map_err(|e| PipelineError::join(validation::STAGE, e))??;
        let reservation = join_pool(reservation::STAGE, reservation_task).await?;
        let fulfillment = join_pool(fulfillment::STAGE, fulfillment_task).await?;

        let report = PipelineReport {
            filled,
            rejected,
            dropped: source.dropped,
            received: source.received,
            cancelled: source.cancelled
                || validation.cancelled
                || reservation.cancelled
                || fulfillment.cancelled,
        };

        if !report.cancelled && !report.is_conserved() {
            error!(
                received = report.received,
                accounted = report.total(),
                "Pipeline lost orders"
            );
            return Err(PipelineError::Unbalanced {
                received: report.received,
                accounted: report.total(),
            });
        }

        info!(
            filled = report.filled.len(),
            rejected = report.rejected.len(),
            dropped = report.dropped,
            cancelled = report.cancelled,
            "Pipeline complete"
        );
        Ok(report)
    }
}

async fn join_pool(
    stage: &'static str,
    handle: JoinHandle<Result<stage_framework::PoolSummary, PipelineError>>,
) -> Result<stage_framework::PoolSummary, PipelineError> {
    handle.await.map_err(|_| PipelineError::WorkerPanicked { stage })?
}

/// Cancels `shutdown` once `after` has elapsed, unless it is cancelled first.
fn arm_deadline(after: std::time::Duration, shutdown: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::time::sleep(after) => {
                warn!(deadline_ms = after.as_millis() as u64, "Deadline elapsed, cancelling run");
                shutdown.cancel();
            }
            _ = shutdown.cancelled() => {}
        }
    })
}
