//! Child orders and their lifecycle.

use super::ids::{OrderId, SequenceNumber};
use serde::{Deserialize, Serialize};

/// Order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Side {
    Buy = 1,
    Sell = 2,
}

impl Side {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            1 => Some(Self::Buy),
            2 => Some(Self::Sell),
            _ => None,
        }
    }
}

/// Child order lifecycle states.
///
/// `New → Active → {PartiallyFilled → Active | Filled | Cancelled}`.
/// `Filled` and `Cancelled` are terminal: no further mutation is allowed once
/// an order reaches either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderState {
    /// Constructed, not yet acknowledged into the stream.
    New,
    /// Resting, nothing filled yet.
    Active,
    /// Some quantity filled, remainder still resting.
    PartiallyFilled,
    /// Completely filled. Terminal.
    Filled,
    /// Cancelled before completion. Terminal.
    Cancelled,
}

/// A strategy-originated order tracked through its fill/cancel lifecycle.
///
/// Owned by the order service; the strategy only ever sees it through
/// read-only snapshot views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildOrder {
    pub id: OrderId,
    pub side: Side,
    pub quantity: u64,
    pub price: i64,
    pub filled_quantity: u64,
    pub state: OrderState,
    /// Sequence number of the CreateOrder command that produced this order.
    pub created_seq: SequenceNumber,
}

impl ChildOrder {
    pub fn new(id: OrderId, side: Side, quantity: u64, price: i64, created_seq: SequenceNumber) -> Self {
        Self {
            id,
            side,
            quantity,
            price,
            filled_quantity: 0,
            state: OrderState::New,
            created_seq,
        }
    }

    pub fn remaining_quantity(&self) -> u64 {
        self.quantity - self.filled_quantity
    }

    /// Active = not in a terminal state.
    pub fn is_active(&self) -> bool {
        matches!(
            self.state,
            OrderState::New | OrderState::Active | OrderState::PartiallyFilled
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.state, OrderState::Filled | OrderState::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buy(id: u64, qty: u64, px: i64) -> ChildOrder {
        ChildOrder::new(OrderId(id), Side::Buy, qty, px, SequenceNumber(id))
    }

    #[test]
    fn remaining_quantity_tracks_fills() {
        let mut order = buy(1, 100, 70);
        assert_eq!(order.remaining_quantity(), 100);

        order.filled_quantity = 30;
        assert_eq!(order.remaining_quantity(), 70);
    }

    #[test]
    fn active_states() {
        let mut order = buy(1, 100, 70);
        assert!(order.is_active());

        order.state = OrderState::Active;
        assert!(order.is_active());

        order.state = OrderState::PartiallyFilled;
        assert!(order.is_active());

        order.state = OrderState::Filled;
        assert!(!order.is_active());
        assert!(order.is_terminal());

        order.state = OrderState::Cancelled;
        assert!(order.is_terminal());
    }

    #[test]
    fn side_roundtrips_through_u8() {
        for side in [Side::Buy, Side::Sell] {
            assert_eq!(Side::from_u8(side as u8), Some(side));
        }
        assert_eq!(Side::from_u8(0), None);
    }
}
