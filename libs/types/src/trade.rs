//! Trade execution record

use crate::ids::{OrderId, Symbol, TradeId};
use crate::numeric::{Price, Quantity};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A record of one execution between a resting order and an incoming one
///
/// The execution price is always the resting (maker) order's price.
/// `executed_at` carries the engine's time at execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub trade_id: TradeId,
    pub symbol: Symbol,
    pub buy_order_id: OrderId,
    pub sell_order_id: OrderId,
    pub price: Price,
    pub quantity: Quantity,
    pub executed_at: u64,
}

impl Trade {
    /// Create a new trade record
    pub fn new(
        symbol: Symbol,
        buy_order_id: OrderId,
        sell_order_id: OrderId,
        price: Price,
        quantity: Quantity,
        executed_at: u64,
    ) -> Self {
        Self {
            trade_id: TradeId::new(),
            symbol,
            buy_order_id,
            sell_order_id,
            price,
            quantity,
            executed_at,
        }
    }

    /// Notional value (price × quantity)
    pub fn notional(&self) -> Decimal {
        self.price.as_decimal() * Decimal::from(self.quantity.as_u64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trade_creation() {
        let trade = Trade::new(
            Symbol::new("AAPL"),
            OrderId::new("B1"),
            OrderId::new("S1"),
            Price::from_u64(100),
            Quantity::new(50),
            7,
        );

        assert_eq!(trade.buy_order_id.as_str(), "B1");
        assert_eq!(trade.sell_order_id.as_str(), "S1");
        assert_eq!(trade.executed_at, 7);
    }

    #[test]
    fn test_trade_notional() {
        let trade = Trade::new(
            Symbol::new("AAPL"),
            OrderId::new("B1"),
            OrderId::new("S1"),
            Price::from_str("10.5").unwrap(),
            Quantity::new(4),
            1,
        );

        assert_eq!(trade.notional(), Decimal::from(42));
    }

    #[test]
    fn test_trade_serialization() {
        let trade = Trade::new(
            Symbol::new("AAPL"),
            OrderId::new("B1"),
            OrderId::new("S1"),
            Price::from_u64(100),
            Quantity::new(50),
            7,
        );

        let json = serde_json::to_string(&trade).unwrap();
        let deserialized: Trade = serde_json::from_str(&json).unwrap();
        assert_eq!(trade, deserialized);
    }
}
