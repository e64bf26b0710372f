//! Error types for the source stage.

use thiserror::Error;

/// A raw record that could not be turned into an order.
///
/// Recovered locally: the record is logged and dropped, the stage continues.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The record is not valid JSON or a field has the wrong type.
    #[error("malformed order record: {0}")]
    Malformed(#[from] serde_json::Error),
}
