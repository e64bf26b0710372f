use stage_framework::PipelineError;
use std::time::Duration;

/// Tunables for one pipeline run.
///
/// # Example
///
/// ```rust
/// use order_pipeline::lifecycle::PipelineConfig;
/// use std::time::Duration;
///
/// let config = PipelineConfig::default()
///     .with_reservation_workers(4)
///     .with_deadline(Duration::from_secs(2));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Tasks in the reservation pool.
    pub reservation_workers: usize,
    /// Tasks in the fulfillment pool.
    pub fulfillment_workers: usize,
    /// Buffer size of every stream between stages.
    pub channel_capacity: usize,
    /// Cancel the run if it is still going after this long.
    pub deadline: Option<Duration>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            reservation_workers: 3,
            fulfillment_workers: 3,
            channel_capacity: 32,
            deadline: None,
        }
    }
}

impl PipelineConfig {
    pub fn with_reservation_workers(mut self, workers: usize) -> Self {
        self.reservation_workers = workers;
        self
    }

    pub fn with_fulfillment_workers(mut self, workers: usize) -> Self {
        self.fulfillment_workers = workers;
        self
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Rejects values that cannot produce a working pipeline.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.reservation_workers == 0 {
            return Err(PipelineError::InvalidConfig(
                "reservation_workers must be at least 1".into(),
            ));
        }
        if self.fulfillment_workers == 0 {
            return Err(PipelineError::InvalidConfig(
                "fulfillment_workers must be at least 1".into(),
            ));
        }
        if self.channel_capacity == 0 {
            return Err(PipelineError::InvalidConfig(
                "channel_capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
