//! Order data structures shared by every stage.

pub mod error;
pub mod order;

pub use error::*;
pub use order::*;
