//! Matching engine
//!
//! Multi-instrument limit order book with price-time priority matching.
//!
//! **Key invariants:**
//! - Price-time priority strictly enforced: best price first, FIFO within
//!   a price level
//! - Execution price is always the resting (maker) order's price
//! - Deterministic matching (same inputs → same outputs)
//! - Conservation of quantity: trade sizes sum to the fill applied on both
//!   sides
//!
//! All engine operations are serialized through a single lock; trade
//! observers run synchronously on the caller's thread.

pub mod book;
pub mod engine;
pub mod events;
pub mod matching;

pub use book::OrderBook;
pub use engine::{MatchingEngine, OrderBookSnapshot};
