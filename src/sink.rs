//! Terminal consumers.
//!
//! A sink drains one stream to end-of-stream on its own task and hands back
//! everything it saw. It never stops early and never watches cancellation:
//! upstream stages close their outputs when cancelled, which ends the sink.

use stage_framework::StageReceiver;
use std::fmt::Display;
use tokio::task::JoinHandle;
use tracing::{info, info_span, Instrument};

/// Spawns a sink task for the named result stream.
pub fn spawn<T>(name: &'static str, mut input: StageReceiver<T>) -> JoinHandle<Vec<T>>
where
    T: Display + Send + 'static,
{
    tokio::spawn(
        async move {
            let mut drained = Vec::new();
            while let Some(item) = input.next().await {
                info!(%item, "Outcome");
                drained.push(item);
            }
            info!(count = drained.len(), "Sink drained");
            drained
        }
        .instrument(info_span!("sink", name)),
    )
}
