//! A VWAP-anchored passive strategy.
//!
//! Approximates VWAP from the top levels of both book sides (no historical
//! trades are available in a replay), then trades around it:
//!
//! - buy the top-of-book clip when the best bid sits below VWAP and the
//!   active order count allows it,
//! - sell when the best bid sits above VWAP and shares are held,
//! - cancel the oldest active order when VWAP leaves the acceptable band,
//! - otherwise hold.
//!
//! A hard cap on total orders bounds exposure for the whole run.

use serde::Deserialize;
use ticklab_core::{Action, AlgoLogic, AlgoState, Side, StrategyError};

/// Tunables, loadable from a TOML file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VwapConfig {
    /// Book levels per side feeding the VWAP estimate.
    pub depth: usize,
    /// VWAP assumed when the book shows no liquidity at all.
    pub fallback_vwap: f64,
    /// Cancel the oldest active order when VWAP drops to or below this.
    pub cancel_below: f64,
    /// Cancel the oldest active order when VWAP rises to or above this.
    pub cancel_above: f64,
    pub max_active_orders: usize,
    pub max_total_orders: usize,
    /// Shares held at the start of the run.
    pub initial_shares: u64,
}

impl Default for VwapConfig {
    fn default() -> Self {
        Self {
            depth: 3,
            fallback_vwap: 90.0,
            cancel_below: 60.0,
            cancel_above: 90.0,
            max_active_orders: 3,
            max_total_orders: 5,
            initial_shares: 1000,
        }
    }
}

/// Running portfolio view, booked at order creation time.
#[derive(Debug, Clone, Copy, Default)]
pub struct Portfolio {
    pub shares_owned: i64,
    pub total_spent: i64,
    pub total_earned: i64,
}

impl Portfolio {
    /// Profit counting remaining shares at the given mark.
    pub fn profit_at(&self, mark: i64) -> i64 {
        self.total_earned + self.shares_owned * mark - self.total_spent
    }
}

pub struct VwapStrategy {
    config: VwapConfig,
    portfolio: Portfolio,
}

impl VwapStrategy {
    pub fn new(config: VwapConfig) -> Self {
        let portfolio = Portfolio {
            shares_owned: config.initial_shares as i64,
            ..Portfolio::default()
        };
        Self { config, portfolio }
    }

    pub fn portfolio(&self) -> Portfolio {
        self.portfolio
    }

    /// VWAP over the top `depth` levels of both sides, or the configured
    /// fallback when the book is empty.
    fn vwap(&self, state: &AlgoState<'_>) -> f64 {
        let mut value = 0.0;
        let mut quantity: u64 = 0;
        for depth in 0..self.config.depth {
            for level in [state.bid_at(depth), state.ask_at(depth)].into_iter().flatten() {
                value += level.price as f64 * level.size as f64;
                quantity += level.size;
            }
        }
        if quantity == 0 {
            tracing::info!(fallback = self.config.fallback_vwap, "empty book, using fallback vwap");
            return self.config.fallback_vwap;
        }
        value / quantity as f64
    }
}

impl AlgoLogic for VwapStrategy {
    fn name(&self) -> &str {
        "vwap-passive"
    }

    fn evaluate(&mut self, state: &AlgoState<'_>) -> Result<Action, StrategyError> {
        let Some(best_bid) = state.best_bid() else {
            return Ok(Action::NoAction);
        };
        let price = best_bid.price;
        let quantity = best_bid.size;

        let vwap = self.vwap(state);
        let active = state.active_order_count();
        let total = state.total_order_count();
        tracing::info!(price, vwap, active, total, "evaluating");

        if total >= self.config.max_total_orders {
            let p = self.portfolio;
            tracing::info!(
                shares = p.shares_owned,
                spent = p.total_spent,
                earned = p.total_earned,
                profit = p.profit_at(price),
                "order limit reached, holding"
            );
            return Ok(Action::NoAction);
        }

        if (price as f64) < vwap && active < self.config.max_active_orders {
            self.portfolio.shares_owned += quantity as i64;
            self.portfolio.total_spent += price * quantity as i64;
            tracing::info!(price, quantity, vwap, "bid below vwap, buying");
            return Ok(Action::CreateChildOrder {
                side: Side::Buy,
                quantity,
                price,
            });
        }

        if (price as f64) > vwap
            && active <= self.config.max_active_orders
            && self.portfolio.shares_owned > 0
        {
            self.portfolio.shares_owned -= quantity as i64;
            self.portfolio.total_earned += price * quantity as i64;
            tracing::info!(price, quantity, vwap, "bid above vwap, selling");
            return Ok(Action::CreateChildOrder {
                side: Side::Sell,
                quantity,
                price,
            });
        }

        if (vwap <= self.config.cancel_below || vwap >= self.config.cancel_above) && active > 0 {
            // Oldest active order first: positions struck furthest from the
            // current market go first.
            let oldest = state
                .active_child_orders()
                .find(|o| o.remaining_quantity() > 0);
            if let Some(order) = oldest {
                tracing::info!(vwap, order_id = %order.id, "vwap out of band, cancelling oldest");
                return Ok(Action::CancelChildOrder { order_id: order.id });
            }
        }

        tracing::info!(shares = self.portfolio.shares_owned, "holding");
        Ok(Action::NoAction)
    }
}
