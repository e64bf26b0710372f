//! Represents a customer order moving through the pipeline.
//!
//! Orders are values: every stage that changes the status consumes the order
//! and hands back an updated copy, so no two workers ever share one.
//!
//! See [`OrderStatus`] for the lifecycle and [`InvalidOrder`] for the
//! rejection path.
use crate::model::TransitionError;
use crate::validation::ValidationError;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt::Display;

/// Type-safe product code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductCode(pub i64);

impl From<i64> for ProductCode {
    fn from(code: i64) -> Self {
        Self(code)
    }
}

impl Display for ProductCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of an order: `None → Received → Reserved → Filled`.
///
/// The derived ordering follows the lifecycle, so "later" compares greater.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OrderStatus {
    #[default]
    None,
    Received,
    Reserved,
    Filled,
}

impl OrderStatus {
    /// Maps the integer wire code (0..=3) to a status.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(OrderStatus::None),
            1 => Some(OrderStatus::Received),
            2 => Some(OrderStatus::Reserved),
            3 => Some(OrderStatus::Filled),
            _ => None,
        }
    }

    /// Integer wire code of this status.
    pub fn code(self) -> i64 {
        self as i64
    }

    /// The only status this one may advance to; `None` once filled.
    pub fn next(self) -> Option<Self> {
        match self {
            OrderStatus::None => Some(OrderStatus::Received),
            OrderStatus::Received => Some(OrderStatus::Reserved),
            OrderStatus::Reserved => Some(OrderStatus::Filled),
            OrderStatus::Filled => None,
        }
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            OrderStatus::None => "None",
            OrderStatus::Received => "Received",
            OrderStatus::Reserved => "Reserved",
            OrderStatus::Filled => "Filled",
        };
        f.write_str(name)
    }
}

/// An order as it travels between stages.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub product_code: ProductCode,
    pub quantity: f64,
    pub status: OrderStatus,
}

impl Order {
    /// Creates a new order with status [`OrderStatus::None`].
    pub fn new(product_code: i64, quantity: f64) -> Self {
        Self {
            product_code: ProductCode(product_code),
            quantity,
            status: OrderStatus::None,
        }
    }

    /// Moves the order one step forward.
    ///
    /// # Errors
    /// Fails unless `next` is exactly the status after the current one:
    /// orders never regress and never skip a step.
    pub fn advance(mut self, next: OrderStatus) -> Result<Self, TransitionError> {
        if self.status.next() != Some(next) {
            return Err(TransitionError {
                product_code: self.product_code,
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(self)
    }

    /// `None → Received`, done by the source stage.
    pub fn receive(self) -> Result<Self, TransitionError> {
        self.advance(OrderStatus::Received)
    }

    /// `Received → Reserved`, done by the reservation stage.
    pub fn reserve(self) -> Result<Self, TransitionError> {
        self.advance(OrderStatus::Reserved)
    }

    /// `Reserved → Filled`, done by the fulfillment stage.
    pub fn fill(self) -> Result<Self, TransitionError> {
        self.advance(OrderStatus::Filled)
    }
}

impl Display for Order {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Product Code: {}, Quantity: {}, Status: {}",
            self.product_code, self.quantity, self.status
        )
    }
}

/// An order rejected by validation, with the reason.
///
/// Produced only by the validation stage and never re-enters the main path.
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidOrder {
    pub order: Order,
    pub reason: ValidationError,
}

impl InvalidOrder {
    pub fn new(order: Order, reason: ValidationError) -> Self {
        Self { order, reason }
    }

    /// Human-readable diagnostic, e.g.
    /// `invalid order quantity: -42.5, order quantity should be greater than 0`.
    pub fn diagnostic(&self) -> String {
        self.reason.to_string()
    }
}

impl Display for InvalidOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, Issue: {}", self.order, self.reason)
    }
}

impl Serialize for InvalidOrder {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("InvalidOrder", 4)?;
        state.serialize_field("productCode", &self.order.product_code)?;
        state.serialize_field("quantity", &self.order.quantity)?;
        state.serialize_field("status", &self.order.status)?;
        state.serialize_field("diagnostic", &self.diagnostic())?;
        state.end()
    }
}
