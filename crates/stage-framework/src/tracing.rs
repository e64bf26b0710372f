//! # Observability & Tracing
//!
//! Every stage runs inside an `info_span!("stage", name = ...)`, so log lines
//! from concurrent workers can be told apart without extra fields.
//!
//! ## What Gets Traced
//!
//! - **Stage lifecycle**: start, end-of-input, close of each output
//! - **Per-order transitions**: at `debug`
//! - **Dropped records**: undecodable input at `warn`
//! - **Wiring faults**: worker failures and panics at `error`
//!
//! ## Usage Examples
//!
//! ```bash
//! # Stage lifecycle only
//! RUST_LOG=info cargo run
//!
//! # Every order as it moves through the stages
//! RUST_LOG=debug cargo run
//!
//! # Only the framework's pool supervisor
//! RUST_LOG=stage_framework::pool=debug cargo run
//! ```
//!
//! Logs go to standard error; standard output is left for results.

/// Installs a compact, `RUST_LOG`-filtered subscriber writing to stderr.
///
/// Safe to call more than once; only the first call installs a subscriber.
pub fn setup_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}
