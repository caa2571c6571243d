//! Multi-symbol matching engine
//!
//! Routes inbound orders to per-instrument books, assigns timestamps, and
//! fans executed trades out to registered observers. Every operation,
//! mutating or inspecting, is serialized through one lock over the whole
//! engine state, so concurrent calls are linearizable and timestamp order
//! equals serialized order equals priority order at equal price.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use serde::Serialize;
use tracing::{debug, warn};

use types::errors::EngineError;
use types::ids::{OrderId, Symbol};
use types::numeric::{Price, Quantity};
use types::order::{Order, Side};
use types::trade::Trade;

use crate::book::OrderBook;
use crate::events::{TradeNotifier, TradeObserver};
use crate::matching::LogicalClock;

/// Multi-symbol matching engine
///
/// Owns one [`OrderBook`] per symbol, a multi-valued id → symbol index for
/// cancellation routing, the trade observer list, and the logical clock
/// that timestamps every arrival.
///
/// Observers run on the caller's thread while the engine lock is held;
/// an observer that reentrantly calls the engine deadlocks.
#[derive(Debug, Default)]
pub struct MatchingEngine {
    inner: Mutex<EngineInner>,
}

#[derive(Debug, Default)]
struct EngineInner {
    /// Symbol -> order book
    books: HashMap<String, OrderBook>,

    /// Order id -> symbols of its resting instances, insertion ordered.
    /// Multi-valued because client ids may repeat across time and across
    /// symbols.
    order_symbols: HashMap<OrderId, VecDeque<String>>,

    notifier: TradeNotifier,
    clock: LogicalClock,
}

/// Aggregated top-of-book view of one instrument
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderBookSnapshot {
    pub symbol: Symbol,
    pub bids: Vec<(Price, Quantity)>,
    pub asks: Vec<(Price, Quantity)>,
}

impl MatchingEngine {
    /// Create a new, empty matching engine
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an order book for `symbol` if none exists. Idempotent.
    pub fn add_book(&self, symbol: &str) {
        if symbol.is_empty() {
            warn!("ignoring empty symbol");
            return;
        }
        let mut guard = self.inner.lock().unwrap();
        if !guard.books.contains_key(symbol) {
            debug!(symbol, "creating order book");
            guard
                .books
                .insert(symbol.to_string(), OrderBook::new(Symbol::new(symbol)));
        }
    }

    /// Place a limit order
    ///
    /// Matches against the contra side; any unfilled remainder comes to
    /// rest in the book. Returns the trades produced, in execution order.
    /// Unknown symbols and invalid parameters yield an empty list and no
    /// state change.
    pub fn place_limit(
        &self,
        symbol: &str,
        order_id: impl Into<OrderId>,
        side: Side,
        quantity: Quantity,
        price: Price,
    ) -> Vec<Trade> {
        let order_id = order_id.into();
        let mut guard = self.inner.lock().unwrap();
        let inner = &mut *guard;

        if let Err(err) = validate_submission(&order_id, quantity) {
            warn!(%err, "limit order rejected");
            return Vec::new();
        }
        let Some(book) = inner.books.get_mut(symbol) else {
            let err = EngineError::UnknownSymbol {
                symbol: symbol.to_string(),
            };
            warn!(%err, "limit order dropped");
            return Vec::new();
        };

        let timestamp = inner.clock.tick();
        let mut order = Order::limit(
            order_id,
            book.symbol().clone(),
            side,
            quantity,
            price,
            timestamp,
        );
        let trades = book.match_order(&mut order, timestamp);

        if !order.remaining().is_zero() {
            // Only resting orders are indexed; a fully-filled arrival must
            // not leave an entry that would confuse a later cancel.
            inner
                .order_symbols
                .entry(order.id.clone())
                .or_default()
                .push_back(symbol.to_string());
            book.add(order, timestamp);
        } else {
            debug!(id = %order.id, "limit order fully filled on arrival");
        }

        inner.notifier.notify_all(&trades);
        trades
    }

    /// Place a market order
    ///
    /// Matches against whatever the contra side offers; the order is
    /// discarded afterwards regardless of residual and never rests.
    pub fn place_market(
        &self,
        symbol: &str,
        order_id: impl Into<OrderId>,
        side: Side,
        quantity: Quantity,
    ) -> Vec<Trade> {
        let order_id = order_id.into();
        let mut guard = self.inner.lock().unwrap();
        let inner = &mut *guard;

        if let Err(err) = validate_submission(&order_id, quantity) {
            warn!(%err, "market order rejected");
            return Vec::new();
        }
        let Some(book) = inner.books.get_mut(symbol) else {
            let err = EngineError::UnknownSymbol {
                symbol: symbol.to_string(),
            };
            warn!(%err, "market order dropped");
            return Vec::new();
        };

        let timestamp = inner.clock.tick();
        let mut order = Order::market(order_id, book.symbol().clone(), side, quantity, timestamp);
        let trades = book.match_order(&mut order, timestamp);

        if !order.remaining().is_zero() {
            debug!(
                id = %order.id,
                remaining = %order.remaining(),
                "market order expired with unfilled remainder"
            );
        }

        inner.notifier.notify_all(&trades);
        trades
    }

    /// Cancel the earliest-arrived live order with this id
    ///
    /// Walks the id's symbol entries in arrival order; the first entry
    /// whose book still holds the id is cancelled. Entries whose order has
    /// since filled are stale and get pruned on the way. Returns false
    /// when no live order remains. Observers are not notified.
    pub fn cancel(&self, order_id: &str) -> bool {
        let mut guard = self.inner.lock().unwrap();
        let inner = &mut *guard;

        let Some(entries) = inner.order_symbols.get_mut(order_id) else {
            let err = EngineError::UnknownOrder {
                order_id: order_id.to_string(),
            };
            debug!(%err, "cancel ignored");
            return false;
        };

        while let Some(symbol) = entries.pop_front() {
            let timestamp = inner.clock.tick();
            let cancelled = inner
                .books
                .get_mut(symbol.as_str())
                .and_then(|book| book.cancel(order_id, timestamp))
                .is_some();

            if cancelled {
                if entries.is_empty() {
                    inner.order_symbols.remove(order_id);
                }
                debug!(order_id, %symbol, "order cancelled");
                return true;
            }
            // Stale entry: the order filled after resting. Drop it and
            // keep walking.
        }

        inner.order_symbols.remove(order_id);
        false
    }

    /// Run a read-only closure against one book
    ///
    /// The engine lock is held for the duration of the closure; do not
    /// call back into the engine from inside it.
    pub fn with_book<R>(&self, symbol: &str, f: impl FnOnce(&OrderBook) -> R) -> Option<R> {
        let guard = self.inner.lock().unwrap();
        guard.books.get(symbol).map(f)
    }

    /// Aggregated view of the top `levels` price levels of one book
    pub fn snapshot(&self, symbol: &str, levels: usize) -> Option<OrderBookSnapshot> {
        let guard = self.inner.lock().unwrap();
        guard.books.get(symbol).map(|book| OrderBookSnapshot {
            symbol: book.symbol().clone(),
            bids: book.depth(Side::Buy, levels),
            asks: book.depth(Side::Sell, levels),
        })
    }

    /// All known symbols, sorted
    pub fn symbols(&self) -> Vec<String> {
        let guard = self.inner.lock().unwrap();
        let mut symbols: Vec<String> = guard.books.keys().cloned().collect();
        symbols.sort();
        symbols
    }

    /// Number of symbols currently tracked
    pub fn num_symbols(&self) -> usize {
        self.inner.lock().unwrap().books.len()
    }

    /// Register a trade observer
    ///
    /// Observers are invoked synchronously, in registration order, for
    /// every trade produced by `place_limit`/`place_market`.
    pub fn register_trade_observer(&self, observer: impl FnMut(&Trade) + Send + 'static) {
        let boxed: TradeObserver = Box::new(observer);
        self.inner.lock().unwrap().notifier.register(boxed);
    }
}

fn validate_submission(order_id: &OrderId, quantity: Quantity) -> Result<(), EngineError> {
    if order_id.as_str().is_empty() {
        return Err(EngineError::EmptyOrderId);
    }
    if quantity.is_zero() {
        return Err(EngineError::InvalidQuantity {
            reason: "size must be positive".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn engine_with(symbol: &str) -> MatchingEngine {
        let engine = MatchingEngine::new();
        engine.add_book(symbol);
        engine
    }

    #[test]
    fn test_add_book_idempotent() {
        let engine = MatchingEngine::new();
        engine.add_book("AAPL");
        engine.add_book("AAPL");
        engine.add_book("MSFT");

        assert_eq!(engine.num_symbols(), 2);
        assert_eq!(engine.symbols(), vec!["AAPL", "MSFT"]);
    }

    #[test]
    fn test_unknown_symbol_yields_no_trades() {
        let engine = MatchingEngine::new();
        let trades = engine.place_limit(
            "NOPE",
            "B1",
            Side::Buy,
            Quantity::new(100),
            Price::from_u64(10),
        );
        assert!(trades.is_empty());
        assert_eq!(engine.num_symbols(), 0);
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        let engine = engine_with("AAPL");

        let trades = engine.place_limit("AAPL", "", Side::Buy, Quantity::new(1), Price::from_u64(10));
        assert!(trades.is_empty());

        let trades =
            engine.place_limit("AAPL", "B1", Side::Buy, Quantity::zero(), Price::from_u64(10));
        assert!(trades.is_empty());

        assert_eq!(engine.with_book("AAPL", |b| b.order_count()), Some(0));
    }

    #[test]
    fn test_resting_order_is_cancellable() {
        let engine = engine_with("AAPL");
        engine.place_limit("AAPL", "B1", Side::Buy, Quantity::new(100), Price::from_u64(10));

        assert_eq!(
            engine.with_book("AAPL", |b| b.best_bid()),
            Some(Some(Price::from_u64(10)))
        );
        assert!(engine.cancel("B1"));
        assert!(!engine.cancel("B1"));
        assert_eq!(engine.with_book("AAPL", |b| b.is_empty()), Some(true));
    }

    #[test]
    fn test_fully_filled_limit_leaves_no_index_entry() {
        let engine = engine_with("AAPL");
        engine.place_limit("AAPL", "S1", Side::Sell, Quantity::new(100), Price::from_u64(10));
        let trades =
            engine.place_limit("AAPL", "B1", Side::Buy, Quantity::new(100), Price::from_u64(10));

        assert_eq!(trades.len(), 1);
        assert!(!engine.cancel("B1"), "filled-on-arrival order must not be cancellable");
        assert!(!engine.cancel("S1"), "filled maker must not be cancellable");
    }

    #[test]
    fn test_market_order_never_rests() {
        let engine = engine_with("AAPL");
        let trades = engine.place_market("AAPL", "M1", Side::Sell, Quantity::new(100));

        assert!(trades.is_empty());
        assert_eq!(engine.with_book("AAPL", |b| b.is_empty()), Some(true));
        assert!(!engine.cancel("M1"));
    }

    #[test]
    fn test_observer_sees_trades_in_emission_order() {
        let engine = engine_with("AAPL");
        let seen: Arc<Mutex<Vec<(String, u64)>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        engine.register_trade_observer(move |trade| {
            sink.lock()
                .unwrap()
                .push((trade.sell_order_id.to_string(), trade.quantity.as_u64()));
        });

        engine.place_limit("AAPL", "S1", Side::Sell, Quantity::new(100), Price::from_u64(10));
        engine.place_limit("AAPL", "S2", Side::Sell, Quantity::new(100), Price::from_u64(9));
        engine.place_market("AAPL", "B1", Side::Buy, Quantity::new(150));

        let seen = seen.lock().unwrap();
        assert_eq!(*seen, vec![("S2".to_string(), 100), ("S1".to_string(), 50)]);
    }

    #[test]
    fn test_observer_not_notified_on_cancel() {
        let engine = engine_with("AAPL");
        let count = Arc::new(Mutex::new(0u32));
        let sink = Arc::clone(&count);
        engine.register_trade_observer(move |_| *sink.lock().unwrap() += 1);

        engine.place_limit("AAPL", "B1", Side::Buy, Quantity::new(100), Price::from_u64(10));
        engine.cancel("B1");

        assert_eq!(*count.lock().unwrap(), 0);
    }

    #[test]
    fn test_timestamps_monotonic_across_symbols() {
        let engine = MatchingEngine::new();
        engine.add_book("AAPL");
        engine.add_book("MSFT");

        engine.place_limit("AAPL", "A1", Side::Buy, Quantity::new(10), Price::from_u64(10));
        engine.place_limit("MSFT", "M1", Side::Buy, Quantity::new(10), Price::from_u64(20));
        engine.place_limit("AAPL", "A2", Side::Buy, Quantity::new(10), Price::from_u64(10));

        let a1 = engine
            .with_book("AAPL", |b| b.orders(Side::Buy)[0].timestamp)
            .unwrap();
        let m1 = engine
            .with_book("MSFT", |b| b.orders(Side::Buy)[0].timestamp)
            .unwrap();
        let a2 = engine
            .with_book("AAPL", |b| b.orders(Side::Buy)[1].timestamp)
            .unwrap();

        assert!(a1 < m1 && m1 < a2);
    }

    #[test]
    fn test_same_id_across_symbols_cancels_fifo() {
        let engine = MatchingEngine::new();
        engine.add_book("AAPL");
        engine.add_book("MSFT");

        engine.place_limit("AAPL", "U", Side::Buy, Quantity::new(10), Price::from_u64(10));
        engine.place_limit("MSFT", "U", Side::Buy, Quantity::new(10), Price::from_u64(20));

        assert!(engine.cancel("U"));
        assert_eq!(engine.with_book("AAPL", |b| b.is_empty()), Some(true));
        assert_eq!(engine.with_book("MSFT", |b| b.is_empty()), Some(false));

        assert!(engine.cancel("U"));
        assert_eq!(engine.with_book("MSFT", |b| b.is_empty()), Some(true));
        assert!(!engine.cancel("U"));
    }

    #[test]
    fn test_stale_index_entry_pruned_on_cancel() {
        let engine = engine_with("AAPL");
        // U rests, then fills; a later U rests on the same symbol.
        engine.place_limit("AAPL", "U", Side::Sell, Quantity::new(100), Price::from_u64(10));
        engine.place_market("AAPL", "B1", Side::Buy, Quantity::new(100));
        engine.place_limit("AAPL", "U", Side::Sell, Quantity::new(50), Price::from_u64(11));

        // The first U's entry is stale; cancel must reach the live one.
        assert!(engine.cancel("U"));
        assert_eq!(engine.with_book("AAPL", |b| b.is_empty()), Some(true));
        assert!(!engine.cancel("U"));
    }

    #[test]
    fn test_snapshot_depth() {
        let engine = engine_with("AAPL");
        engine.place_limit("AAPL", "B1", Side::Buy, Quantity::new(100), Price::from_u64(10));
        engine.place_limit("AAPL", "B2", Side::Buy, Quantity::new(50), Price::from_u64(9));
        engine.place_limit("AAPL", "S1", Side::Sell, Quantity::new(75), Price::from_u64(12));

        let snapshot = engine.snapshot("AAPL", 10).unwrap();
        assert_eq!(snapshot.bids.len(), 2);
        assert_eq!(snapshot.bids[0], (Price::from_u64(10), Quantity::new(100)));
        assert_eq!(snapshot.asks, vec![(Price::from_u64(12), Quantity::new(75))]);
        assert!(engine.snapshot("NOPE", 10).is_none());
    }

    #[test]
    fn test_snapshot_serializes() {
        let engine = engine_with("AAPL");
        engine.place_limit("AAPL", "B1", Side::Buy, Quantity::new(100), Price::from_u64(10));

        let snapshot = engine.snapshot("AAPL", 1).unwrap();
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("\"AAPL\""));
        assert!(json.contains("\"10\""));
    }
}
