//! Matching logic module
//!
//! Crossing checks and trade construction for the price-time priority
//! matching loop.

pub mod crossing;
pub mod executor;

pub use crossing::crosses;
pub use executor::LogicalClock;
