//! Trade construction and engine time
//!
//! The clock is a logical counter: strictly increasing, advanced only
//! under the engine lock, so timestamp order equals serialized call order.

use types::ids::{OrderId, Symbol};
use types::numeric::{Price, Quantity};
use types::order::{Order, Side};
use types::trade::Trade;

/// Monotonic logical clock for order and trade timestamps
#[derive(Debug, Clone)]
pub struct LogicalClock {
    next: u64,
}

impl LogicalClock {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Advance the clock and return the new timestamp
    pub fn tick(&mut self) -> u64 {
        let now = self.next;
        self.next += 1;
        now
    }
}

impl Default for LogicalClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the trade record for one fill between a taker and a maker
///
/// Buyer/seller identifiers are assigned from the taker's side; `price` is
/// the maker's price.
pub fn trade_between(
    symbol: &Symbol,
    taker: &Order,
    maker_id: &OrderId,
    price: Price,
    quantity: Quantity,
    executed_at: u64,
) -> Trade {
    let (buy_order_id, sell_order_id) = match taker.side {
        Side::Buy => (taker.id.clone(), maker_id.clone()),
        Side::Sell => (maker_id.clone(), taker.id.clone()),
    };
    Trade::new(
        symbol.clone(),
        buy_order_id,
        sell_order_id,
        price,
        quantity,
        executed_at,
    )
}
