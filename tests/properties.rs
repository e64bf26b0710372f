//! Property tests for whole-pipeline runs.
//!
//! Each case builds its own multi-threaded runtime so worker pools really
//! run in parallel while the properties are checked.

use order_pipeline::lifecycle::{OrderPipeline, PipelineConfig, PipelineReport};
use order_pipeline::model::OrderStatus;
use proptest::prelude::*;
use std::collections::HashSet;

/// A generated input line and what the pipeline should do with it.
#[derive(Debug, Clone)]
enum Record {
    Order { code: i64, quantity: f64 },
    Garbage(String),
}

impl Record {
    fn to_line(&self) -> String {
        match self {
            Record::Order { code, quantity } => {
                format!(r#"{{"productCode": {}, "quantity": {}, "status": 0}}"#, code, quantity)
            }
            Record::Garbage(text) => text.clone(),
        }
    }
}

fn arb_record() -> impl Strategy<Value = Record> {
    prop_oneof![
        8 => (-1_000.0f64..1_000.0).prop_map(|quantity| Record::Order { code: 0, quantity }),
        1 => Just(Record::Order { code: 0, quantity: 0.0 }),
        1 => "[a-z ]{0,12}".prop_map(|text| Record::Garbage(format!("<{text}>"))),
    ]
}

/// Records with unique product codes so outputs can be traced back to inputs.
fn arb_batch() -> impl Strategy<Value = Vec<Record>> {
    prop::collection::vec(arb_record(), 0..60).prop_map(|records| {
        records
            .into_iter()
            .enumerate()
            .map(|(i, record)| match record {
                Record::Order { quantity, .. } => Record::Order {
                    code: i as i64,
                    quantity,
                },
                garbage => garbage,
            })
            .collect()
    })
}

fn arb_config() -> impl Strategy<Value = PipelineConfig> {
    (1usize..6, 1usize..6, 1usize..8).prop_map(|(reserve, fill, capacity)| {
        PipelineConfig::default()
            .with_reservation_workers(reserve)
            .with_fulfillment_workers(fill)
            .with_channel_capacity(capacity)
    })
}

fn run_batch(config: PipelineConfig, batch: &[Record]) -> PipelineReport {
    let lines = batch.iter().map(Record::to_line).collect();
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .unwrap();
    rt.block_on(async {
        OrderPipeline::new(config)
            .unwrap()
            .run(lines)
            .await
            .unwrap()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Every record ends up in exactly one place.
    ///
    /// This test verifies that:
    /// 1. `filled + rejected + dropped == received`
    /// 2. No product code appears twice across both outputs
    #[test]
    fn prop_every_record_accounted_once(config in arb_config(), batch in arb_batch()) {
        let report = run_batch(config, &batch);

        prop_assert!(!report.cancelled);
        prop_assert_eq!(report.received, batch.len());
        prop_assert!(report.is_conserved());

        let mut seen = HashSet::new();
        for code in report
            .filled
            .iter()
            .map(|o| o.product_code.0)
            .chain(report.rejected.iter().map(|o| o.order.product_code.0))
        {
            prop_assert!(seen.insert(code), "product code {} emitted twice", code);
        }
    }

    /// Validation routes by quantity alone.
    ///
    /// This test verifies that:
    /// 1. Every positive-quantity order is filled
    /// 2. Every other order is rejected with its quantity in the diagnostic
    /// 3. Only garbage lines are dropped
    #[test]
    fn prop_validation_routes_by_quantity(batch in arb_batch()) {
        let report = run_batch(PipelineConfig::default(), &batch);

        let filled: HashSet<i64> = report.filled.iter().map(|o| o.product_code.0).collect();
        let rejected: HashSet<i64> =
            report.rejected.iter().map(|o| o.order.product_code.0).collect();

        let mut garbage = 0;
        for record in &batch {
            match record {
                Record::Order { code, quantity } if *quantity > 0.0 => {
                    prop_assert!(filled.contains(code));
                }
                Record::Order { code, .. } => {
                    prop_assert!(rejected.contains(code));
                }
                Record::Garbage(_) => garbage += 1,
            }
        }
        prop_assert_eq!(report.dropped, garbage);

        for invalid in &report.rejected {
            prop_assert!(!(invalid.order.quantity > 0.0));
            prop_assert!(invalid.diagnostic().starts_with("invalid order quantity:"));
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Every output carries the terminal status of its path.
    #[test]
    fn prop_outputs_have_terminal_status(config in arb_config(), batch in arb_batch()) {
        let report = run_batch(config, &batch);

        prop_assert!(report.filled.iter().all(|o| o.status == OrderStatus::Filled));
        prop_assert!(report
            .rejected
            .iter()
            .all(|o| o.order.status == OrderStatus::Received));
    }
}
