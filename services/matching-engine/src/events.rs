//! Trade fan-out to registered observers
//!
//! Observers run synchronously, in registration order, on the thread that
//! placed the order, while the engine lock is held. An observer that
//! calls back into the engine deadlocks; that reentrancy is a contract
//! violation and is not defensively handled.

use types::trade::Trade;

/// Callback invoked for every executed trade
pub type TradeObserver = Box<dyn FnMut(&Trade) + Send>;

/// Ordered list of trade observers
#[derive(Default)]
pub struct TradeNotifier {
    observers: Vec<TradeObserver>,
}

impl TradeNotifier {
    pub fn new() -> Self {
        Self {
            observers: Vec::new(),
        }
    }

    /// Append an observer to the notification list
    pub fn register(&mut self, observer: TradeObserver) {
        self.observers.push(observer);
    }

    /// Notify every observer of every trade, in emission order
    pub fn notify_all(&mut self, trades: &[Trade]) {
        for trade in trades {
            for observer in &mut self.observers {
                observer(trade);
            }
        }
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }
}

impl std::fmt::Debug for TradeNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TradeNotifier")
            .field("observers", &self.observers.len())
            .finish()
    }
}
