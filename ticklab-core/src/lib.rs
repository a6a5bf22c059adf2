//! TickLab core: a deterministic trading backtest engine.
//!
//! Everything in the system reacts to one totally-ordered command stream.
//! The [`sequencer`] assigns sequence numbers and dispatches each command to
//! every consumer synchronously, in registration order; the [`book`] fills
//! resting orders against displayed liquidity and feeds the fills back into
//! the same stream; the [`services`] maintain the read models a strategy
//! evaluates against; the [`container`] hosts the strategy and turns its
//! decisions into sequenced commands. Given the same tick tape, a run
//! produces the same final state, byte for byte — [`fingerprint`] makes that
//! checkable.
//!
//! Commands travel as fixed-layout binary payloads; see [`codec`] for the
//! wire format.

pub mod book;
pub mod codec;
pub mod container;
pub mod domain;
pub mod fingerprint;
pub mod sequencer;
pub mod services;

pub use book::MatchingBook;
pub use codec::{BookUpdate, CancelOrder, CreateOrder, DecodeError, Fill, Message};
pub use container::{Action, AlgoContainer, AlgoLogic, StrategyError};
pub use domain::{
    ChildOrder, InstrumentStatus, OrderId, OrderState, PriceLevel, SequenceNumber, Side, Source,
    Venue,
};
pub use fingerprint::StateDump;
pub use sequencer::{
    Command, Consumer, ConsumerError, LoggingConsumer, Outbox, Sequencer, SequencerError,
};
pub use services::{AlgoState, InvariantViolation, MarketDataService, OrderService};

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn wire_types_are_send_sync() {
        assert_send_sync::<Message>();
        assert_send_sync::<DecodeError>();
        assert_send_sync::<InvariantViolation>();
        assert_send_sync::<ChildOrder>();
    }
}
