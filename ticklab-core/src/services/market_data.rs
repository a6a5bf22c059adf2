//! Latest-book market-data cache.
//!
//! Applies every BookUpdate in sequence order and holds the most recent book
//! per (venue, instrument), plus a pointer to the instrument updated last.
//! Depth accessors return `None` past the end of a side's ladder; callers
//! treat missing levels as zero contribution.

use super::InvariantViolation;
use crate::codec::BookUpdate;
use crate::domain::{InstrumentStatus, PriceLevel, SequenceNumber, Venue};
use serde::Serialize;
use std::collections::BTreeMap;

type BookKey = (Venue, u64);

#[derive(Debug, Default, Serialize)]
pub struct MarketDataService {
    #[serde(serialize_with = "crate::fingerprint::serialize_keyed_map")]
    books: BTreeMap<BookKey, BookUpdate>,
    /// Key of the most recently updated book. Depth accessors read this one.
    latest: Option<BookKey>,
    last_seq: SequenceNumber,
}

impl MarketDataService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one sequenced book update.
    pub fn apply(
        &mut self,
        seq: SequenceNumber,
        update: &BookUpdate,
    ) -> Result<(), InvariantViolation> {
        self.check_seq(seq)?;
        let key = (update.venue, update.instrument_id);
        self.books.insert(key, update.clone());
        self.latest = Some(key);
        Ok(())
    }

    /// Record a sequence number for a command this service does not interpret.
    /// Keeps the out-of-order check covering the full stream.
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

    fn latest_book(&self) -> Option<&BookUpdate> {
        self.books.get(self.latest.as_ref()?)
    }

    /// Bid level at `depth` (0 = best) of the most recently updated book.
    pub fn bid_at(&self, depth: usize) -> Option<PriceLevel> {
        self.latest_book()?.bids.get(depth).copied()
    }

    /// Ask level at `depth` (0 = best) of the most recently updated book.
    pub fn ask_at(&self, depth: usize) -> Option<PriceLevel> {
        self.latest_book()?.asks.get(depth).copied()
    }

    pub fn best_bid(&self) -> Option<PriceLevel> {
        self.bid_at(0)
    }

    pub fn best_ask(&self) -> Option<PriceLevel> {
        self.ask_at(0)
    }

    /// Trading phase of the most recently updated book.
    pub fn status(&self) -> Option<InstrumentStatus> {
        Some(self.latest_book()?.status)
    }

    pub fn has_book(&self) -> bool {
        self.latest.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Source;

    fn update(bids: &[(i64, u64)], asks: &[(i64, u64)]) -> BookUpdate {
        BookUpdate {
            venue: Venue::Xlon,
            instrument_id: 123,
            source: Source::Stream,
            bids: bids.iter().map(|&(p, s)| PriceLevel::new(p, s)).collect(),
            asks: asks.iter().map(|&(p, s)| PriceLevel::new(p, s)).collect(),
            status: InstrumentStatus::Continuous,
        }
    }

    #[test]
    fn depth_accessors_read_latest_book() {
        let mut svc = MarketDataService::new();
        assert!(svc.bid_at(0).is_none());

        svc.apply(
            SequenceNumber(1),
            &update(&[(70, 500), (74, 200), (75, 300)], &[(76, 100)]),
        )
        .unwrap();

        assert_eq!(svc.bid_at(0), Some(PriceLevel::new(70, 500)));
        assert_eq!(svc.bid_at(2), Some(PriceLevel::new(75, 300)));
        assert_eq!(svc.ask_at(0), Some(PriceLevel::new(76, 100)));
        assert_eq!(svc.status(), Some(InstrumentStatus::Continuous));
    }

    #[test]
    fn missing_depth_is_none_not_an_error() {
        let mut svc = MarketDataService::new();
        svc.apply(SequenceNumber(1), &update(&[(70, 500)], &[]))
            .unwrap();

        assert_eq!(svc.bid_at(5), None);
        assert_eq!(svc.ask_at(0), None);
    }

    #[test]
    fn newer_update_replaces_the_book() {
        let mut svc = MarketDataService::new();
        svc.apply(SequenceNumber(1), &update(&[(70, 500)], &[(76, 100)]))
            .unwrap();
        svc.apply(SequenceNumber(2), &update(&[(71, 400)], &[(77, 50)]))
            .unwrap();

        assert_eq!(svc.best_bid(), Some(PriceLevel::new(71, 400)));
        assert_eq!(svc.best_ask(), Some(PriceLevel::new(77, 50)));
    }

    #[test]
    fn out_of_order_sequence_is_a_violation() {
        let mut svc = MarketDataService::new();
        svc.apply(SequenceNumber(5), &update(&[(70, 500)], &[]))
            .unwrap();

        let err = svc
            .apply(SequenceNumber(5), &update(&[(71, 400)], &[]))
            .unwrap_err();
        assert_eq!(
            err,
            InvariantViolation::OutOfOrderSequence {
                last: SequenceNumber(5),
                seen: SequenceNumber(5),
            }
        );
    }
}
