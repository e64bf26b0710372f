//! Error types for order status transitions.

use crate::model::{OrderStatus, ProductCode};
use thiserror::Error;

/// An attempt to move an order to a status other than the next one.
///
/// Stages only ever request the single forward step, so seeing this error
/// means an order was routed to the wrong stage.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Illegal status transition for product {product_code}: {from} -> {to}")]
pub struct TransitionError {
    pub product_code: ProductCode,
    pub from: OrderStatus,
    pub to: OrderStatus,
}
