use serde::{Deserialize, Serialize};
use std::fmt;

/// Sequence number assigned by the sequencer at command ingestion.
///
/// Strictly increasing, one per command. Every consumer observes commands in
/// exactly this order; the whole system's determinism hangs on it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct SequenceNumber(pub u64);

impl fmt::Display for SequenceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Child order ID.
///
/// Order ids are the sequence number of the CreateOrder command that produced
/// them, so every consumer derives the same id for the same order without any
/// out-of-band coordination.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct OrderId(pub u64);

impl From<SequenceNumber> for OrderId {
    fn from(seq: SequenceNumber) -> Self {
        Self(seq.0)
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_id_derives_from_sequence_number() {
        let seq = SequenceNumber(42);
        assert_eq!(OrderId::from(seq), OrderId(42));
    }

    #[test]
    fn sequence_numbers_order() {
        assert!(SequenceNumber(1) < SequenceNumber(2));
    }
}
