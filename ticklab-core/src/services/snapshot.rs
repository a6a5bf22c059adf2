//! The read-only snapshot a strategy evaluates against.
//!
//! Borrows both services for the duration of one evaluation; the strategy
//! cannot mutate anything through it, only observe and return an action.

use super::{MarketDataService, OrderService};
use crate::domain::{ChildOrder, InstrumentStatus, PriceLevel};

#[derive(Clone, Copy)]
pub struct AlgoState<'a> {
    market: &'a MarketDataService,
    orders: &'a OrderService,
}

impl<'a> AlgoState<'a> {
    pub fn new(market: &'a MarketDataService, orders: &'a OrderService) -> Self {
        Self { market, orders }
    }

    /// Bid level at `depth` (0 = best), `None` past the ladder's end.
    pub fn bid_at(&self, depth: usize) -> Option<PriceLevel> {
        self.market.bid_at(depth)
    }

    /// Ask level at `depth` (0 = best), `None` past the ladder's end.
    pub fn ask_at(&self, depth: usize) -> Option<PriceLevel> {
        self.market.ask_at(depth)
    }

    pub fn best_bid(&self) -> Option<PriceLevel> {
        self.market.best_bid()
    }

    pub fn best_ask(&self) -> Option<PriceLevel> {
        self.market.best_ask()
    }

    pub fn status(&self) -> Option<InstrumentStatus> {
        self.market.status()
    }

    pub fn active_child_orders(&self) -> impl Iterator<Item = &'a ChildOrder> {
        self.orders.active_orders()
    }

    pub fn all_child_orders(&self) -> impl Iterator<Item = &'a ChildOrder> {
        self.orders.all_orders()
    }

    pub fn active_order_count(&self) -> usize {
        self.orders.active_count()
    }

    pub fn total_order_count(&self) -> usize {
        self.orders.total_count()
    }
}
