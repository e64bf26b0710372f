//! Error types for the validation stage.

use thiserror::Error;

/// Business-rule rejection of an order.
///
/// This is routed to the invalid-order stream; it never aborts the run.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    /// The quantity is zero, negative or not a number.
    #[error("invalid order quantity: {quantity}, order quantity should be greater than 0")]
    NonPositiveQuantity { quantity: f64 },
}
