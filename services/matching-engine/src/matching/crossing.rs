//! Crossing detection logic
//!
//! Determines when an incoming order can execute against a resting price.

use types::numeric::Price;
use types::order::{Order, OrderKind, Side};

/// Check whether an incoming order crosses a resting contra-side price
///
/// A market order always crosses. A limit buy crosses a resting ask at or
/// below its limit; a limit sell crosses a resting bid at or above its
/// limit.
pub fn crosses(incoming: &Order, resting_price: Price) -> bool {
    match incoming.kind {
        OrderKind::Market => true,
        OrderKind::Limit(limit) => match incoming.side {
            Side::Buy => limit >= resting_price,
            Side::Sell => limit <= resting_price,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::ids::Symbol;
    use types::numeric::Quantity;

    fn limit(side: Side, price: u64) -> Order {
        Order::limit(
            "O1",
            Symbol::new("AAPL"),
            side,
            Quantity::new(100),
            Price::from_u64(price),
            1,
        )
    }

    #[test]
    fn test_buy_crosses_at_or_above_ask() {
        assert!(crosses(&limit(Side::Buy, 10), Price::from_u64(9)));
        assert!(crosses(&limit(Side::Buy, 10), Price::from_u64(10)));
        assert!(!crosses(&limit(Side::Buy, 10), Price::from_u64(11)));
    }

    #[test]
    fn test_sell_crosses_at_or_below_bid() {
        assert!(crosses(&limit(Side::Sell, 10), Price::from_u64(11)));
        assert!(crosses(&limit(Side::Sell, 10), Price::from_u64(10)));
        assert!(!crosses(&limit(Side::Sell, 10), Price::from_u64(9)));
    }

    #[test]
    fn test_market_always_crosses() {
        let order = Order::market("M1", Symbol::new("AAPL"), Side::Buy, Quantity::new(100), 1);
        assert!(crosses(&order, Price::from_u64(1)));
        assert!(crosses(&order, Price::from_u64(1_000_000)));
    }
}
