//! # Order Pipeline
//!
//! A staged, concurrent order-processing pipeline built on
//! [`stage_framework`].
//!
//! ```text
//! raw records ─▶ source ─▶ validation ─┬─▶ reservation (N) ─▶ fulfillment (N) ─▶ filled sink
//!                                      └─▶ rejected sink
//! ```
//!
//! ## 🗺️ Module Tour
//!
//! - **[model]**: [`Order`](model::Order), [`OrderStatus`](model::OrderStatus),
//!   [`InvalidOrder`](model::InvalidOrder).
//! - **[source]**: decodes raw JSON records; undecodable records are logged and dropped.
//! - **[validation]**: routes orders with a non-positive quantity to the rejected stream.
//! - **[reservation]** / **[fulfillment]**: fan-out worker pools advancing the status.
//! - **[sink]**: terminal consumers that drain a stream to completion.
//! - **[lifecycle]**: [`OrderPipeline`](lifecycle::OrderPipeline) wires it all and
//!   reports every record's disposition.
//!
//! ## Running
//!
//! ```bash
//! RUST_LOG=info cargo run
//! RUST_LOG=debug cargo run -- --input orders.jsonl --reservation-workers 4
//! ```

pub mod fulfillment;
pub mod lifecycle;
pub mod model;
pub mod reservation;
pub mod sink;
pub mod source;
pub mod validation;
