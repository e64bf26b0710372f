//! # Stage Framework
//!
//! This crate provides the building blocks for staged, concurrent pipelines
//! on Tokio: stages connected by bounded, closable streams, with fan-out
//! worker pools inside a stage and a fan-in discipline that lets the whole
//! pipeline terminate deterministically once its input is exhausted.
//!
//! ## Architecture Overview
//!
//! 1. **Link Layer** ([`stream`]) - bounded queues with an explicit end-of-stream signal
//! 2. **Logic Layer** ([`StageWorker`]) - what happens to one item
//! 3. **Runtime Layer** ([`WorkerPool`]) - N tasks per stage, joined before the output closes
//!
//! Business logic is written once in a worker; the pool handles the shared
//! input, the join barrier, cancellation and error propagation.
//!
//! ## Termination
//!
//! A consumer sees end-of-stream only when every producer handle has been
//! closed. Single-task stages close their outputs when their loop ends; pools
//! close theirs from a supervisor after joining all workers. Given a finite
//! input, every stage therefore finishes, in pipeline order.
//!
//! ## Cancellation
//!
//! Stages take a `tokio_util::sync::CancellationToken`. Once it is cancelled,
//! stages stop pulling input and close their outputs, so downstream drains what
//! already arrived and nothing blocks forever. A failing or panicking worker
//! cancels the token itself and the pool reports the failure as a
//! [`PipelineError`].
//!
//! ## Testing
//!
//! [`mock::MockWorker`] builds a worker from a closure and records the items it
//! processed. See the [`mock`] module.

pub mod error;
pub mod mock;
pub mod pool;
pub mod stream;
pub mod tracing;
pub mod worker;

// Re-export core types for convenience
pub use error::PipelineError;
pub use pool::{PoolSummary, WorkerPool};
pub use stream::{stream, Next, StageReceiver, StageSender};
pub use worker::StageWorker;
