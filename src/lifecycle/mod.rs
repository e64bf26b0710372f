//! # Pipeline Lifecycle & Orchestration
//!
//! Individual stages are simple; wiring them together is where the
//! correctness lives. This module is the conductor.
//!
//! **Key Responsibilities:**
//! 1. **Configuration** - [`PipelineConfig`]: pool sizes, stream capacity, optional deadline
//! 2. **Wiring** - connect every stage output to the next stage's input
//! 3. **Completion** - the run is done only when *both* sinks have drained
//! 4. **Fault reporting** - join every stage and surface wiring errors
//!
//! ## Completion
//!
//! The filled and rejected sinks are joined with `tokio::try_join!`. Waiting
//! for "whichever stream produces first" would declare the run done after a
//! single outcome and silently drop the rest.
//!
//! ```rust,ignore
//! let (filled, rejected) = tokio::try_join!(filled_sink, rejected_sink)?;
//! ```
//!
//! ## Shutdown
//!
//! There is no explicit shutdown step. Each stage closes its outputs when its
//! input ends, so a finite batch drains front to back:
//!
//! 1. **Source** closes after the last record
//! 2. **Validation** closes both outputs after the source stream ends
//! 3. **Pools** close after their supervisor has joined every worker
//! 4. **Sinks** return once their stream ends
//!
//! A [`CancellationToken`](tokio_util::sync::CancellationToken) passed to
//! [`OrderPipeline::run_with_shutdown`], or an elapsed deadline, short-cuts
//! step 1-3: stages stop pulling input and close early.

pub mod config;
pub mod order_pipeline;

pub use config::*;
pub use order_pipeline::*;
