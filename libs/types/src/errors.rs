//! Error taxonomy
//!
//! Recoverable conditions are return-value-encoded at the engine boundary
//! (empty trade list, false); these typed errors carry the diagnostics that
//! get logged on those paths.

use thiserror::Error;

/// Engine-level errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("unknown symbol: {symbol}")]
    UnknownSymbol { symbol: String },

    #[error("unknown order: {order_id}")]
    UnknownOrder { order_id: String },

    #[error("invalid quantity: {reason}")]
    InvalidQuantity { reason: String },

    #[error("order id must not be empty")]
    EmptyOrderId,
}
