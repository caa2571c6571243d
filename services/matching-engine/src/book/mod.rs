//! Order book for a single instrument
//!
//! Contains the price levels, the bid and ask sides, and the book itself:
//! two price-time-sorted sides plus an id index for cancellation lookup.

pub mod ask_book;
pub mod bid_book;
pub mod price_level;

pub use ask_book::AskBook;
pub use bid_book::BidBook;
pub use price_level::PriceLevel;

use std::collections::{HashMap, VecDeque};

use rust_decimal::Decimal;
use types::ids::{OrderId, Symbol};
use types::numeric::{Price, Quantity};
use types::order::{Order, OrderKind, Side};
use types::trade::Trade;

use crate::matching::{crossing, executor};

/// Where a resting order lives, for O(level) cancellation lookup
#[derive(Debug, Clone, Copy, PartialEq)]
struct RestingRef {
    side: Side,
    price: Price,
}

/// Order book for one instrument
///
/// Owns every resting order on the instrument. The id index is
/// multi-valued: duplicate client ids are tolerated and resolved in FIFO
/// (arrival) order, both for cancellation and for lookup.
///
/// Invariants maintained across every operation:
/// - each side is ordered best price first, FIFO within a price level
/// - an order is in a side iff it has an entry in the id index
/// - no resting order has zero remaining quantity
/// - only limit orders rest
#[derive(Debug, Clone)]
pub struct OrderBook {
    symbol: Symbol,
    bids: BidBook,
    asks: AskBook,
    ids: HashMap<OrderId, VecDeque<RestingRef>>,
    last_update_time: u64,
}

impl OrderBook {
    /// Create a new, empty order book for the given symbol
    pub fn new(symbol: Symbol) -> Self {
        Self {
            symbol,
            bids: BidBook::new(),
            asks: AskBook::new(),
            ids: HashMap::new(),
            last_update_time: 0,
        }
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Insert a limit order into the appropriate side and the id index
    ///
    /// # Panics
    /// Panics on a market order, a mismatched symbol, or an order with
    /// nothing left to fill. All are programmer errors.
    pub fn add(&mut self, order: Order, timestamp: u64) {
        assert_eq!(
            order.symbol, self.symbol,
            "order {} targets {}, book is {}",
            order.id, order.symbol, self.symbol
        );
        let price = match order.kind {
            OrderKind::Limit(price) => price,
            OrderKind::Market => panic!("market order {} cannot rest in the book", order.id),
        };
        assert!(
            !order.remaining().is_zero(),
            "order {} has no remaining quantity",
            order.id
        );

        self.ids
            .entry(order.id.clone())
            .or_default()
            .push_back(RestingRef {
                side: order.side,
                price,
            });
        match order.side {
            Side::Buy => self.bids.insert(price, order),
            Side::Sell => self.asks.insert(price, order),
        }
        self.touch(timestamp);
    }

    /// Cancel the earliest-arrived resting order with this id
    ///
    /// Removes it from its side and the id index, marks it cancelled, and
    /// returns it. None if no resting order matches.
    pub fn cancel(&mut self, id: &str, timestamp: u64) -> Option<Order> {
        let refs = self.ids.get_mut(id)?;
        let at = refs.pop_front()?;
        if refs.is_empty() {
            self.ids.remove(id);
        }

        let removed = match at.side {
            Side::Buy => self.bids.remove(id, at.price),
            Side::Sell => self.asks.remove(id, at.price),
        };
        let mut order =
            removed.unwrap_or_else(|| panic!("id index out of sync for order {id}"));
        order.cancel();
        self.touch(timestamp);
        Some(order)
    }

    /// Match an incoming order against the contra side
    ///
    /// Walks the contra side best level first, FIFO within a level, filling
    /// while the incoming order crosses. Fully-filled makers are removed
    /// from their side and the id index. The residual is NOT appended to
    /// the book; the caller decides what happens to it.
    ///
    /// Returns trades in execution order (maker priority order).
    pub fn match_order(&mut self, incoming: &mut Order, timestamp: u64) -> Vec<Trade> {
        assert_eq!(
            incoming.symbol, self.symbol,
            "order {} targets {}, book is {}",
            incoming.id, incoming.symbol, self.symbol
        );

        let mut trades = Vec::new();
        if incoming.is_filled() {
            return trades;
        }

        match incoming.side {
            Side::Buy => self.match_against_asks(incoming, timestamp, &mut trades),
            Side::Sell => self.match_against_bids(incoming, timestamp, &mut trades),
        }

        self.touch(timestamp);
        trades
    }

    fn match_against_asks(&mut self, incoming: &mut Order, timestamp: u64, trades: &mut Vec<Trade>) {
        while !incoming.is_filled() {
            let Some((level_price, level)) = self.asks.best_level_mut() else {
                break;
            };
            if !crossing::crosses(incoming, level_price) {
                break;
            }

            while !incoming.is_filled() {
                let Some(maker) = level.front() else {
                    break;
                };
                let maker_id = maker.id.clone();
                let fill = incoming.remaining().min(maker.remaining());

                incoming.apply_fill(fill);
                if let Some(completed) = level.fill_front(fill) {
                    Self::unindex(&mut self.ids, &completed.id, Side::Sell, level_price);
                }
                trades.push(executor::trade_between(
                    &self.symbol,
                    incoming,
                    &maker_id,
                    level_price,
                    fill,
                    timestamp,
                ));
            }
            self.asks.prune(level_price);
        }
    }

    fn match_against_bids(&mut self, incoming: &mut Order, timestamp: u64, trades: &mut Vec<Trade>) {
        while !incoming.is_filled() {
            let Some((level_price, level)) = self.bids.best_level_mut() else {
                break;
            };
            if !crossing::crosses(incoming, level_price) {
                break;
            }

            while !incoming.is_filled() {
                let Some(maker) = level.front() else {
                    break;
                };
                let maker_id = maker.id.clone();
                let fill = incoming.remaining().min(maker.remaining());

                incoming.apply_fill(fill);
                if let Some(completed) = level.fill_front(fill) {
                    Self::unindex(&mut self.ids, &completed.id, Side::Buy, level_price);
                }
                trades.push(executor::trade_between(
                    &self.symbol,
                    incoming,
                    &maker_id,
                    level_price,
                    fill,
                    timestamp,
                ));
            }
            self.bids.prune(level_price);
        }
    }

    /// Drop the earliest id-index entry matching (side, price)
    fn unindex(
        ids: &mut HashMap<OrderId, VecDeque<RestingRef>>,
        id: &OrderId,
        side: Side,
        price: Price,
    ) {
        if let Some(refs) = ids.get_mut(id.as_str()) {
            if let Some(pos) = refs
                .iter()
                .position(|r| r.side == side && r.price == price)
            {
                refs.remove(pos);
            }
            if refs.is_empty() {
                ids.remove(id.as_str());
            }
        }
    }

    /// Highest resting buy price, if any buys rest
    pub fn best_bid(&self) -> Option<Price> {
        self.bids.best_price()
    }

    /// Lowest resting sell price, if any sells rest
    pub fn best_ask(&self) -> Option<Price> {
        self.asks.best_price()
    }

    /// Best ask minus best bid, when both sides are populated
    pub fn spread(&self) -> Option<Decimal> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask.as_decimal() - bid.as_decimal()),
            _ => None,
        }
    }

    /// Sum of remaining quantity resting at exactly this price
    pub fn volume_at_price(&self, side: Side, price: Price) -> Quantity {
        match side {
            Side::Buy => self.bids.volume_at(price),
            Side::Sell => self.asks.volume_at(price),
        }
    }

    /// Aggregated (price, quantity) levels, best first
    pub fn depth(&self, side: Side, levels: usize) -> Vec<(Price, Quantity)> {
        match side {
            Side::Buy => self.bids.depth(levels),
            Side::Sell => self.asks.depth(levels),
        }
    }

    /// All resting orders on one side, in priority order
    pub fn orders(&self, side: Side) -> Vec<&Order> {
        match side {
            Side::Buy => self.bids.orders().collect(),
            Side::Sell => self.asks.orders().collect(),
        }
    }

    /// Whether any resting order carries this id
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains_key(id)
    }

    /// Number of resting orders across both sides
    pub fn order_count(&self) -> usize {
        self.bids.order_count() + self.asks.order_count()
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    pub fn last_update_time(&self) -> u64 {
        self.last_update_time
    }

    fn touch(&mut self, timestamp: u64) {
        self.last_update_time = self.last_update_time.max(timestamp);
    }
}
