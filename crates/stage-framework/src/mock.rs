//! # Mock Worker & Testing Guide
//!
//! `MockWorker<I, O>` implements [`StageWorker`] from a plain mapping closure
//! and records every item it sees. It lets you test pool wiring, ordering and
//! failure propagation without writing a dedicated worker type.
//!
//! ## When to use MockWorker vs a real worker
//!
//! | Feature | MockWorker | Real worker |
//! |---------|------------|-------------|
//! | **Logic** | Any closure | Domain transition |
//! | **Inspection** | `seen()` / `verify()` | Only via output stream |
//! | **Error Injection** | Easy (`fail_when`) | Hard (requires specific state) |
//!
//! ## Example
//!
//! ```rust
//! use stage_framework::mock::MockWorker;
//! use stage_framework::{stream, WorkerPool};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() {
//!     let worker = MockWorker::new(|n: u32| n + 1);
//!     let probe = worker.clone();
//!
//!     let (tx, rx) = stream("numbers", 4).unwrap();
//!     let pool = WorkerPool::new("increment", 2, worker).unwrap();
//!     let (out, supervisor) = pool.spawn(rx, 4, CancellationToken::new()).unwrap();
//!
//!     tx.emit(1).await.unwrap();
//!     tx.close();
//!
//!     assert_eq!(out.drain().await, vec![2]);
//!     supervisor.await.unwrap().unwrap();
//!     probe.verify(1);
//! }
//! ```

use crate::worker::StageWorker;
use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::{Arc, Mutex};

/// Error returned by a [`MockWorker`] whose failure predicate matched.
#[derive(Debug, thiserror::Error)]
#[error("Mock worker rejected item: {0}")]
pub struct MockWorkerError(pub String);

type Mapper<I, O> = dyn Fn(I) -> O + Send + Sync;
type Predicate<I> = dyn Fn(&I) -> bool + Send + Sync;

/// A scripted worker with call recording.
///
/// Clones share the same recording, so keep a clone as a probe before moving
/// the worker into a pool.
pub struct MockWorker<I, O> {
    map: Arc<Mapper<I, O>>,
    fail_when: Option<Arc<Predicate<I>>>,
    seen: Arc<Mutex<Vec<I>>>,
}

impl<I, O> Clone for MockWorker<I, O> {
    fn clone(&self) -> Self {
        Self {
            map: self.map.clone(),
            fail_when: self.fail_when.clone(),
            seen: self.seen.clone(),
        }
    }
}

impl<I, O> MockWorker<I, O>
where
    I: Clone + Send + Debug + 'static,
    O: Send + Debug + 'static,
{
    /// Creates a worker that maps every item with `map`.
    pub fn new(map: impl Fn(I) -> O + Send + Sync + 'static) -> Self {
        Self {
            map: Arc::new(map),
            fail_when: None,
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Makes `process` fail for items matching `predicate`.
    pub fn fail_when(mut self, predicate: impl Fn(&I) -> bool + Send + Sync + 'static) -> Self {
        self.fail_when = Some(Arc::new(predicate));
        self
    }

    /// Items processed so far, in the order workers picked them up.
    pub fn seen(&self) -> Vec<I> {
        self.seen.lock().unwrap().clone()
    }

    /// Verifies that exactly `expected` items reached the worker.
    pub fn verify(&self, expected: usize) {
        let seen = self.seen.lock().unwrap();
        if seen.len() != expected {
            panic!(
                "Expected {} processed items, worker saw {}: {:?}",
                expected,
                seen.len(),
                *seen
            );
        }
    }
}

#[async_trait]
impl<I, O> StageWorker for MockWorker<I, O>
where
    I: Clone + Send + Sync + Debug + 'static,
    O: Send + Debug + 'static,
{
    type Input = I;
    type Output = O;
    type Error = MockWorkerError;

    async fn process(&self, item: I) -> Result<O, MockWorkerError> {
        self.seen.lock().unwrap().push(item.clone());
        if let Some(fail) = &self.fail_when {
            if fail(&item) {
                return Err(MockWorkerError(format!("{item:?}")));
            }
        }
        Ok((self.map)(item))
    }
}
