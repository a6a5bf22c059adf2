//! Read-model services: the market-data cache and the order tracker.
//!
//! Both are driven exclusively by sequenced commands and expose read-only
//! views. The strategy sees them only through the [`AlgoState`] snapshot.

pub mod market_data;
pub mod orders;
pub mod snapshot;

pub use market_data::MarketDataService;
pub use orders::OrderService;
pub use snapshot::AlgoState;

use crate::domain::{OrderId, SequenceNumber};
use thiserror::Error;

/// A broken structural invariant.
///
/// Unlike a decode failure, which is local to one command, any of these means
/// consumer state can no longer be trusted to match the command stream. The
/// sequencer halts the run on the first one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    /// A fill exceeded the order's remaining quantity.
    #[error("fill of {fill_quantity} exceeds remaining {remaining} on order #{order_id}")]
    OverFill {
        order_id: OrderId,
        fill_quantity: u64,
        remaining: u64,
    },

    /// A fill referenced an order nobody created.
    #[error("fill references unknown order #{order_id}")]
    UnknownOrder { order_id: OrderId },

    /// A mutation was attempted on an order in a terminal state.
    #[error("mutation of terminal order #{order_id}")]
    TerminalTransition { order_id: OrderId },

    /// A consumer observed a sequence number at or below one it had already
    /// processed.
    #[error("out-of-order sequence: saw {seen} after {last}")]
    OutOfOrderSequence {
        last: SequenceNumber,
        seen: SequenceNumber,
    },
}
