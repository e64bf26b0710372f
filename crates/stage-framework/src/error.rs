//! # Framework Errors
//!
//! This module defines the error type shared by every stage, stream and pool.
//! Business-rule outcomes (a rejected order, a dropped record) are *not*
//! errors at this level; a `PipelineError` always means the pipeline itself
//! was misconfigured or mis-wired.

/// Errors that can occur within the stage framework itself.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A configuration value cannot produce a working pipeline
    /// (zero workers, zero-capacity stream, ...).
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A producer tried to emit after its consumer went away.
    ///
    /// With the join-before-close discipline this only happens when a
    /// consumer terminates early, which is a wiring bug.
    #[error("Stream closed before stage '{stage}' finished emitting")]
    StreamClosed { stage: &'static str },

    /// A worker's `process` call failed.
    #[error("Worker in stage '{stage}' failed: {source}")]
    Worker {
        stage: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A worker task panicked or was aborted.
    #[error("Worker in stage '{stage}' panicked")]
    WorkerPanicked { stage: &'static str },

    /// A completed run did not account for every input item.
    #[error("Pipeline lost items: {received} received, {accounted} accounted for")]
    Unbalanced { received: usize, accounted: usize },

    /// A single-task stage (source, validation, sink) could not be joined.
    #[error("Stage '{stage}' task failed: {reason}")]
    StageJoin { stage: &'static str, reason: String },
}

impl PipelineError {
    /// Wraps a `JoinError` from a stage task that is not part of a pool.
    pub fn join(stage: &'static str, error: tokio::task::JoinError) -> Self {
        PipelineError::StageJoin {
            stage,
            reason: error.to_string(),
        }
    }
}
