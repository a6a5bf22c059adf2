//! Child-order lifecycle tracker.
//!
//! The single source of truth for order state. Creates orders from sequenced
//! CreateOrder commands (the order id is the command's sequence number),
//! applies fills and cancels, and enforces the lifecycle invariants: no fill
//! beyond remaining quantity, no fill of an unknown or terminal order.
//!
//! A cancel that arrives after the order went terminal is ignored, not an
//! error: with fills and cancels both flowing through the same stream, a
//! strategy's cancel can legitimately be sequenced one slot behind the fill
//! that completed the order.

use super::InvariantViolation;
use crate::codec::{CancelOrder, CreateOrder, Fill};
use crate::domain::{ChildOrder, OrderId, OrderState, SequenceNumber};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Default, Serialize)]
pub struct OrderService {
    orders: BTreeMap<OrderId, ChildOrder>,
    last_seq: SequenceNumber,
}

impl OrderService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a sequenced CreateOrder. The new order's id is `seq`.
    pub fn apply_create(
        &mut self,
        seq: SequenceNumber,
        create: &CreateOrder,
    ) -> Result<OrderId, InvariantViolation> {
        self.check_seq(seq)?;
        let id = OrderId::from(seq);
        let mut order = ChildOrder::new(id, create.side, create.quantity, create.price, seq);
        order.state = OrderState::Active;
        self.orders.insert(id, order);
        Ok(id)
    }

    /// Apply a sequenced fill.
    pub fn apply_fill(
        &mut self,
        seq: SequenceNumber,
        fill: &Fill,
    ) -> Result<(), InvariantViolation> {
        self.check_seq(seq)?;
        let order = self
            .orders
            .get_mut(&fill.order_id)
            .ok_or(InvariantViolation::UnknownOrder {
                order_id: fill.order_id,
            })?;
        if order.is_terminal() {
            return Err(InvariantViolation::TerminalTransition { order_id: order.id });
        }
        let remaining = order.remaining_quantity();
        if fill.quantity > remaining {
            return Err(InvariantViolation::OverFill {
                order_id: order.id,
                fill_quantity: fill.quantity,
                remaining,
            });
        }
        order.filled_quantity += fill.quantity;
        order.state = if order.remaining_quantity() == 0 {
            OrderState::Filled
        } else {
            OrderState::PartiallyFilled
        };
        Ok(())
    }

    /// Apply a sequenced cancel. Cancels of unknown or already-terminal
    /// orders are dropped.
    pub fn apply_cancel(
        &mut self,
        seq: SequenceNumber,
        cancel: &CancelOrder,
    ) -> Result<(), InvariantViolation> {
        self.check_seq(seq)?;
        match self.orders.get_mut(&cancel.order_id) {
            Some(order) if !order.is_terminal() => {
                order.state = OrderState::Cancelled;
            }
            Some(order) => {
                tracing::debug!(order_id = %order.id, "cancel of terminal order ignored");
            }
            None => {
                tracing::debug!(order_id = %cancel.order_id, "cancel of unknown order ignored");
            }
        }
        Ok(())
    }

    /// Record a sequence number for a command this service does not interpret.
    pub fn observe(&mut self, seq: SequenceNumber) -> Result<(), InvariantViolation> {
        self.check_seq(seq)
    }

    fn check_seq(&mut self, seq: SequenceNumber) -> Result<(), InvariantViolation> {
        if seq <= self.last_seq {
            return Err(InvariantViolation::OutOfOrderSequence {
                last: self.last_seq,
                seen: seq,
            });
        }
        self.last_seq = seq;
        Ok(())
    }

    pub fn order(&self, id: OrderId) -> Option<&ChildOrder> {
        self.orders.get(&id)
    }

    /// All orders ever created, in id (= creation) order.
    pub fn all_orders(&self) -> impl Iterator<Item = &ChildOrder> {
        self.orders.values()
    }

    /// Orders not yet in a terminal state, in id order.
    pub fn active_orders(&self) -> impl Iterator<Item = &ChildOrder> {
        self.orders.values().filter(|o| o.is_active())
    }

    pub fn total_count(&self) -> usize {
        self.orders.len()
    }

    pub fn active_count(&self) -> usize {
        self.active_orders().count()
    }

    /// Total quantity filled across all orders.
    pub fn total_filled_quantity(&self) -> u64 {
        self.orders.values().map(|o| o.filled_quantity).sum()
    }
}
