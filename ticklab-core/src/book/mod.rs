//! The matching book: fills resting child orders against displayed liquidity.
//!
//! The book is a consumer like any other. It tracks resting orders from
//! CreateOrder commands and, on every book update, checks which of them are
//! marketable against the new top of book:
//!
//! - a buy rests at its limit and fills when the best bid is at or below it,
//! - a sell fills when the best ask is at or above its limit.
//!
//! Fill quantity is capped by a shared budget, the size displayed at the top
//! level, allocated oldest order first. The book does not mutate its own
//! resting quantities at match time; it publishes Fill commands and applies
//! the reduction when each Fill comes back through the sequencer, so every
//! consumer sees the same fill at the same sequence number.

use crate::codec::{BookUpdate, CancelOrder, CreateOrder, Fill, Message};
use crate::domain::{
    InstrumentStatus, OrderId, PriceLevel, SequenceNumber, Side, Venue,
};
use crate::sequencer::{Command, Consumer, ConsumerError, Outbox};
use crate::services::InvariantViolation;
use serde::Serialize;
use std::collections::BTreeMap;

type BookKey = (Venue, u64);

/// A child order resting in the book, waiting for marketable liquidity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RestingOrder {
    pub id: OrderId,
    pub side: Side,
    pub price: i64,
    pub remaining: u64,
}

/// Both sides of one instrument's displayed book, best-first.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Ladder {
    pub bids: Vec<PriceLevel>,
    pub asks: Vec<PriceLevel>,
    pub status: Option<InstrumentStatus>,
}

#[derive(Debug, Default, Serialize)]
pub struct MatchingBook {
    #[serde(serialize_with = "crate::fingerprint::serialize_keyed_map")]
    ladders: BTreeMap<BookKey, Ladder>,
    /// Creation order, which is also fill-priority order.
    resting: Vec<RestingOrder>,
    last_seq: SequenceNumber,
}

impl MatchingBook {
    pub fn new() -> Self {
        Self::default()
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

    fn apply_book_update(&mut self, update: &BookUpdate, outbox: &mut Outbox) {
        let ladder = Ladder {
            bids: update.bids.clone(),
            asks: update.asks.clone(),
            status: Some(update.status),
        };
        self.ladders
            .insert((update.venue, update.instrument_id), ladder);

        // No matching outside continuous trading.
        if update.status != InstrumentStatus::Continuous {
            return;
        }
        self.match_side(Side::Buy, update.bids.first().copied(), outbox);
        self.match_side(Side::Sell, update.asks.first().copied(), outbox);
    }

    fn match_side(&self, side: Side, top: Option<PriceLevel>, outbox: &mut Outbox) {
        let Some(top) = top else { return };
        let mut budget = top.size;
        for order in self.resting.iter().filter(|o| o.side == side) {
            if budget == 0 {
                break;
            }
            let marketable = match side {
                Side::Buy => top.price <= order.price,
                Side::Sell => top.price >= order.price,
            };
            if !marketable {
                continue;
            }
            let quantity = order.remaining.min(budget);
            if quantity == 0 {
                continue;
            }
            budget -= quantity;
            tracing::debug!(order_id = %order.id, quantity, price = top.price, "match");
            outbox.publish(&Message::Fill(Fill {
                order_id: order.id,
                quantity,
            }));
        }
    }

    fn apply_create(&mut self, seq: SequenceNumber, create: &CreateOrder) {
        self.resting.push(RestingOrder {
            id: OrderId::from(seq),
            side: create.side,
            price: create.price,
            remaining: create.quantity,
        });
    }

    fn apply_fill(&mut self, fill: &Fill) -> Result<(), InvariantViolation> {
        let order = self
            .resting
            .iter_mut()
            .find(|o| o.id == fill.order_id)
            .ok_or(InvariantViolation::UnknownOrder {
                order_id: fill.order_id,
            })?;
        if fill.quantity > order.remaining {
            return Err(InvariantViolation::OverFill {
                order_id: order.id,
                fill_quantity: fill.quantity,
                remaining: order.remaining,
            });
        }
        order.remaining -= fill.quantity;
        if order.remaining == 0 {
            self.resting.retain(|o| o.id != fill.order_id);
        }
        Ok(())
    }

    /// Cancels of orders no longer resting (already fully filled) are
    /// dropped, mirroring the order service.
    fn apply_cancel(&mut self, cancel: &CancelOrder) {
        self.resting.retain(|o| o.id != cancel.order_id);
    }

    pub fn resting_orders(&self) -> &[RestingOrder] {
        &self.resting
    }

    pub fn ladder(&self, venue: Venue, instrument_id: u64) -> Option<&Ladder> {
        self.ladders.get(&(venue, instrument_id))
    }
}

impl Consumer for MatchingBook {
    fn name(&self) -> &'static str {
        "book"
    }

    fn on_command(
        &mut self,
        seq: SequenceNumber,
        command: &Command,
        outbox: &mut Outbox,
    ) -> Result<(), ConsumerError> {
        self.check_seq(seq)?;
        match command.decode()? {
            Message::BookUpdate(update) => self.apply_book_update(&update, outbox),
            Message::CreateOrder(create) => self.apply_create(seq, &create),
            Message::CancelOrder(cancel) => self.apply_cancel(&cancel),
            Message::Fill(fill) => self.apply_fill(&fill)?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Source;

    fn book_update(bids: &[(i64, u64)], asks: &[(i64, u64)]) -> Command {
        book_update_with_status(bids, asks, InstrumentStatus::Continuous)
    }

    fn book_update_with_status(
        bids: &[(i64, u64)],
        asks: &[(i64, u64)],
        status: InstrumentStatus,
    ) -> Command {
        Command::from_message(&Message::BookUpdate(BookUpdate {
            venue: Venue::Xlon,
            instrument_id: 123,
            source: Source::Stream,
            bids: bids.iter().map(|&(p, s)| PriceLevel::new(p, s)).collect(),
            asks: asks.iter().map(|&(p, s)| PriceLevel::new(p, s)).collect(),
            status,
        }))
    }

    fn create(side: Side, quantity: u64, price: i64) -> Command {
        Command::from_message(&Message::CreateOrder(CreateOrder {
            side,
            quantity,
            price,
        }))
    }

    fn drain_fills(outbox: &mut Outbox) -> Vec<(OrderId, u64)> {
        outbox
            .drain()
            .filter_map(|cmd| match cmd.decode() {
                Ok(Message::Fill(f)) => Some((f.order_id, f.quantity)),
                _ => None,
            })
            .collect()
    }

    fn dispatch(book: &mut MatchingBook, seq: u64, cmd: &Command) -> Vec<(OrderId, u64)> {
        let mut outbox = Outbox::new();
        book.on_command(SequenceNumber(seq), cmd, &mut outbox)
            .unwrap();
        drain_fills(&mut outbox)
    }

    #[test]
    fn buy_fills_when_best_bid_at_or_below_limit() {
        let mut book = MatchingBook::new();
        assert!(dispatch(&mut book, 1, &create(Side::Buy, 500, 70)).is_empty());

        let fills = dispatch(&mut book, 2, &book_update(&[(70, 500), (74, 200)], &[(76, 100)]));
        assert_eq!(fills, vec![(OrderId(1), 500)]);
    }

    #[test]
    fn buy_does_not_fill_above_its_limit() {
        let mut book = MatchingBook::new();
        dispatch(&mut book, 1, &create(Side::Buy, 500, 70));

        let fills = dispatch(&mut book, 2, &book_update(&[(74, 200)], &[(76, 100)]));
        assert!(fills.is_empty());
    }

    #[test]
    fn sell_fills_when_best_ask_at_or_above_limit() {
        let mut book = MatchingBook::new();
        dispatch(&mut book, 1, &create(Side::Sell, 100, 75));

        let fills = dispatch(&mut book, 2, &book_update(&[(70, 500)], &[(76, 300)]));
        assert_eq!(fills, vec![(OrderId(1), 100)]);
    }

    #[test]
    fn top_level_size_caps_the_fill() {
        let mut book = MatchingBook::new();
        dispatch(&mut book, 1, &create(Side::Buy, 500, 70));

        let fills = dispatch(&mut book, 2, &book_update(&[(70, 200)], &[]));
        assert_eq!(fills, vec![(OrderId(1), 200)]);
    }

    #[test]
    fn shared_budget_allocates_oldest_first() {
        let mut book = MatchingBook::new();
        dispatch(&mut book, 1, &create(Side::Buy, 300, 70));
        dispatch(&mut book, 2, &create(Side::Buy, 300, 70));

        let fills = dispatch(&mut book, 3, &book_update(&[(70, 400)], &[]));
        assert_eq!(fills, vec![(OrderId(1), 300), (OrderId(2), 100)]);
    }

    #[test]
    fn fill_command_reduces_resting_quantity() {
        let mut book = MatchingBook::new();
        dispatch(&mut book, 1, &create(Side::Buy, 500, 70));

        // Match publishes the fill but leaves the resting order untouched.
        dispatch(&mut book, 2, &book_update(&[(70, 200)], &[]));
        assert_eq!(book.resting_orders()[0].remaining, 500);

        // The sequenced Fill applies the reduction.
        let fill = Command::from_message(&Message::Fill(Fill {
            order_id: OrderId(1),
            quantity: 200,
        }));
        dispatch(&mut book, 3, &fill);
        assert_eq!(book.resting_orders()[0].remaining, 300);
    }

    #[test]
    fn fully_filled_order_leaves_the_book() {
        let mut book = MatchingBook::new();
        dispatch(&mut book, 1, &create(Side::Buy, 200, 70));
        dispatch(&mut book, 2, &book_update(&[(70, 200)], &[]));

        let fill = Command::from_message(&Message::Fill(Fill {
            order_id: OrderId(1),
            quantity: 200,
        }));
        dispatch(&mut book, 3, &fill);
        assert!(book.resting_orders().is_empty());
    }

    #[test]
    fn cancel_removes_resting_order() {
        let mut book = MatchingBook::new();
        dispatch(&mut book, 1, &create(Side::Buy, 500, 70));

        let cancel = Command::from_message(&Message::CancelOrder(CancelOrder {
            order_id: OrderId(1),
        }));
        dispatch(&mut book, 2, &cancel);
        assert!(book.resting_orders().is_empty());

        // Cancelled order no longer fills.
        let fills = dispatch(&mut book, 3, &book_update(&[(70, 500)], &[]));
        assert!(fills.is_empty());
    }

    #[test]
    fn no_matching_outside_continuous_trading() {
        let mut book = MatchingBook::new();
        dispatch(&mut book, 1, &create(Side::Buy, 500, 70));

        let fills = dispatch(
            &mut book,
            2,
            &book_update_with_status(&[(70, 500)], &[], InstrumentStatus::Auction),
        );
        assert!(fills.is_empty());
    }

    #[test]
    fn over_fill_is_a_violation() {
        let mut book = MatchingBook::new();
        dispatch(&mut book, 1, &create(Side::Buy, 100, 70));

        let fill = Command::from_message(&Message::Fill(Fill {
            order_id: OrderId(1),
            quantity: 200,
        }));
        let mut outbox = Outbox::new();
        let err = book
            .on_command(SequenceNumber(2), &fill, &mut outbox)
            .unwrap_err();
        assert!(matches!(
            err,
            ConsumerError::Invariant(InvariantViolation::OverFill { .. })
        ));
    }
}
