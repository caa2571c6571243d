//! Order lifecycle types

use crate::ids::{OrderId, Symbol};
use crate::numeric::{Price, Quantity};
use serde::{Deserialize, Serialize};

/// Order side (buyer or seller)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Buy order (bid)
    Buy,
    /// Sell order (ask)
    Sell,
}

impl Side {
    /// Get the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// Order kind
///
/// A limit order carries its limit price; a market order executes against
/// whatever the contra side offers and never rests in the book.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "price")]
pub enum OrderKind {
    #[serde(rename = "LIMIT")]
    Limit(Price),
    #[serde(rename = "MARKET")]
    Market,
}

/// Order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Accepted, no fills yet
    New,
    /// Some quantity executed, remainder live
    PartiallyFilled,
    /// Completely executed (terminal)
    Filled,
    /// Removed from the book by the client (terminal)
    Cancelled,
    /// Failed boundary validation (terminal)
    Rejected,
}

impl OrderStatus {
    /// Check if status is terminal (no further transitions possible)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Cancelled | OrderStatus::Rejected
        )
    }
}

/// An inbound or resting order
///
/// `timestamp` is assigned by the engine at arrival and never changes
/// afterwards; it is the time component of price-time priority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub symbol: Symbol,
    pub side: Side,
    pub kind: OrderKind,
    pub quantity: Quantity,
    pub filled: Quantity,
    pub timestamp: u64,
    pub status: OrderStatus,
}

impl Order {
    /// Create a new limit order
    pub fn limit(
        id: impl Into<OrderId>,
        symbol: Symbol,
        side: Side,
        quantity: Quantity,
        price: Price,
        timestamp: u64,
    ) -> Self {
        Self {
            id: id.into(),
            symbol,
            side,
            kind: OrderKind::Limit(price),
            quantity,
            filled: Quantity::zero(),
            timestamp,
            status: OrderStatus::New,
        }
    }

    /// Create a new market order
    pub fn market(
        id: impl Into<OrderId>,
        symbol: Symbol,
        side: Side,
        quantity: Quantity,
        timestamp: u64,
    ) -> Self {
        Self {
            id: id.into(),
            symbol,
            side,
            kind: OrderKind::Market,
            quantity,
            filled: Quantity::zero(),
            timestamp,
            status: OrderStatus::New,
        }
    }

    /// Quantity still open
    pub fn remaining(&self) -> Quantity {
        self.quantity - self.filled
    }

    /// Check if order is completely filled
    pub fn is_filled(&self) -> bool {
        self.remaining().is_zero()
    }

    /// Check if order has any fills
    pub fn has_fills(&self) -> bool {
        !self.filled.is_zero()
    }

    pub fn is_market(&self) -> bool {
        matches!(self.kind, OrderKind::Market)
    }

    /// The limit price, or None for market orders
    pub fn limit_price(&self) -> Option<Price> {
        match self.kind {
            OrderKind::Limit(price) => Some(price),
            OrderKind::Market => None,
        }
    }

    /// Apply an execution to this order, updating `filled` and `status`
    /// together.
    ///
    /// # Panics
    /// Panics if the fill exceeds the remaining quantity
    pub fn apply_fill(&mut self, fill: Quantity) {
        assert!(
            fill <= self.remaining(),
            "fill {} exceeds remaining {} on order {}",
            fill,
            self.remaining(),
            self.id
        );

        self.filled = self.filled + fill;

        if self.is_filled() {
            self.status = OrderStatus::Filled;
        } else if self.has_fills() {
            self.status = OrderStatus::PartiallyFilled;
        }
    }

    /// Cancel the order
    ///
    /// # Panics
    /// Panics if the order is already in a terminal state
    pub fn cancel(&mut self) {
        assert!(
            !self.status.is_terminal(),
            "cannot cancel terminal order {}",
            self.id
        );
        self.status = OrderStatus::Cancelled;
    }
}
