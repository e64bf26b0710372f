//! # Order Pipeline CLI
//!
//! Feeds a batch of raw order records through the pipeline and prints the
//! two result streams.
//!
//! 1.  Loads configuration from flags, `ORDER_PIPELINE_*` variables and `.env`.
//! 2.  Reads newline-delimited JSON records (or uses the built-in sample).
//! 3.  Runs the [`OrderPipeline`] and prints filled and rejected orders.

use clap::Parser;
use order_pipeline::lifecycle::{OrderPipeline, PipelineConfig, PipelineReport};
use stage_framework::tracing::setup_tracing;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Instrument};

const SAMPLE_RECORDS: [&str; 4] = [
    r#"{"productCode": 1111, "quantity": -42.5, "status": 1}"#,
    r#"{"productCode": 2222, "quantity": 54.22, "status": 2}"#,
    r#"{"productCode": 3333, "quantity": 61.23, "status": 3}"#,
    r#"{"productCode": 4444, "quantity": 12.56, "status": 0}"#,
];

#[derive(Debug, Parser)]
#[command(name = "order-pipeline", version, about = "Run a batch of orders through the staged pipeline")]
struct Args {
    /// Newline-delimited JSON records; `-` reads stdin. Uses a built-in sample when omitted.
    #[arg(long, env = "ORDER_PIPELINE_INPUT")]
    input: Option<PathBuf>,

    /// Tasks in the reservation pool.
    #[arg(long, env = "ORDER_PIPELINE_RESERVATION_WORKERS", default_value_t = 3)]
    reservation_workers: usize,

    /// Tasks in the fulfillment pool.
    #[arg(long, env = "ORDER_PIPELINE_FULFILLMENT_WORKERS", default_value_t = 3)]
    fulfillment_workers: usize,

    /// Buffer size of every stream between stages.
    #[arg(long, env = "ORDER_PIPELINE_CAPACITY", default_value_t = 32)]
    capacity: usize,

    /// Cancel the run after this many milliseconds.
    #[arg(long, env = "ORDER_PIPELINE_TIMEOUT_MS")]
    timeout_ms: Option<u64>,

    /// Print results as JSON lines instead of text.
    #[arg(long, env = "ORDER_PIPELINE_JSON")]
    json: bool,
}

impl Args {
    fn config(&self) -> PipelineConfig {
        let config = PipelineConfig::default()
            .with_reservation_workers(self.reservation_workers)
            .with_fulfillment_workers(self.fulfillment_workers)
            .with_channel_capacity(self.capacity);
        match self.timeout_ms {
            Some(ms) => config.with_deadline(Duration::from_millis(ms)),
            None => config,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), String> {
    // A missing .env file is fine; flags and the environment still apply.
    let _ = dotenvy::dotenv();
    setup_tracing();

    let args = Args::parse();
    let records = load_records(args.input.as_ref())
        .await
        .map_err(|e| format!("failed to read input: {e}"))?;

    let pipeline = OrderPipeline::new(args.config()).map_err(|e| e.to_string())?;

    // Ctrl-C cancels the run; whatever already reached a sink is still printed.
    let shutdown = CancellationToken::new();
    let on_signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling run");
            on_signal.cancel();
        }
    });

    let span = tracing::info_span!("pipeline_run");
    let report = pipeline
        .run_with_shutdown(records, shutdown)
        .instrument(span)
        .await
        .map_err(|e| e.to_string())?;

    print_report(&report, args.json).map_err(|e| e.to_string())?;
    info!("Run finished");
    Ok(())
}

async fn load_records(input: Option<&PathBuf>) -> std::io::Result<Vec<String>> {
    let text = match input {
        None => return Ok(SAMPLE_RECORDS.iter().map(|r| r.to_string()).collect()),
        Some(path) if path.as_os_str() == "-" => {
            let mut text = String::new();
            tokio::io::stdin().read_to_string(&mut text).await?;
            text
        }
        Some(path) => tokio::fs::read_to_string(path).await?,
    };
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

fn print_report(report: &PipelineReport, json: bool) -> Result<(), serde_json::Error> {
    if json {
        for order in &report.filled {
            println!("{}", serde_json::to_string(order)?);
        }
        for invalid in &report.rejected {
            println!("{}", serde_json::to_string(invalid)?);
        }
    } else {
        for order in &report.filled {
            println!("Filled order: {order}");
        }
        for invalid in &report.rejected {
            println!("Invalid order: {invalid}");
        }
    }

    println!(
        "{} filled, {} rejected, {} dropped of {} records{}",
        report.filled.len(),
        report.rejected.len(),
        report.dropped,
        report.received,
        if report.cancelled { " (cancelled)" } else { "" }
    );
    Ok(())
}
