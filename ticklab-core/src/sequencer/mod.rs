//! The command sequencer: single entry point for every command in the system.
//!
//! All state mutation anywhere in TickLab happens only as a reaction to a
//! sequenced command. `submit` assigns the next sequence number, then invokes
//! every registered consumer's `on_command` in registration order,
//! synchronously, before returning to the caller. Given the same ordered
//! command stream, all consumer state evolves identically on every run.
//!
//! Consumers that need to feed commands back into the stream (the matching
//! book publishing fills, the strategy container publishing order actions) do
//! so through the [`Outbox`] passed to `on_command`. Outbox commands are
//! sequenced and dispatched FIFO within the same `submit` call, after the
//! command that produced them. Calling `submit` from inside a dispatch is a
//! programming error and is flagged as [`SequencerError::ReentrantSubmit`]
//! rather than silently interleaved.

pub mod logging;

pub use logging::LoggingConsumer;

use crate::codec::{self, DecodeError, Message};
use crate::domain::SequenceNumber;
use crate::services::InvariantViolation;
use bytes::Bytes;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use thiserror::Error;

/// An opaque, immutable wire payload flowing through the sequencer.
///
/// Created by a producer (harness or outbox), owned by the sequencer until
/// dispatched, then borrowed read-only by each consumer.
#[derive(Debug, Clone)]
pub struct Command {
    bytes: Bytes,
}

impl Command {
    pub fn new(bytes: Bytes) -> Self {
        Self { bytes }
    }

    /// Encode a message into a ready-to-submit command.
    pub fn from_message(message: &Message) -> Self {
        Self {
            bytes: codec::encode(message),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Message-family discriminant from the wire header.
    pub fn schema_id(&self) -> Result<u16, DecodeError> {
        codec::peek_schema_id(&self.bytes)
    }

    pub fn decode(&self) -> Result<Message, DecodeError> {
        codec::decode(&self.bytes)
    }
}

/// Commands queued by consumers during dispatch, sequenced after the command
/// currently being dispatched.
#[derive(Debug, Default)]
pub struct Outbox {
    queue: VecDeque<Command>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode a message and queue it for sequencing.
    pub fn publish(&mut self, message: &Message) {
        self.queue.push_back(Command::from_message(message));
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub(crate) fn drain(&mut self) -> impl Iterator<Item = Command> + '_ {
        self.queue.drain(..)
    }
}

/// An error from a consumer processing one sequenced command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsumerError {
    /// The command payload could not be decoded. Fatal to that command only.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// A structural invariant was broken. Fatal to the run: the determinism
    /// guarantee no longer holds, so the sequencer halts.
    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
}

/// Errors from the sequencer itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequencerError {
    /// `submit` was called while a dispatch was already in progress.
    #[error("reentrant submit: a dispatch is already in progress")]
    ReentrantSubmit,

    /// `register` was called after the first command was submitted. The
    /// consumer set is fixed at start-up.
    #[error("consumer registered after the first submit")]
    RegisterAfterStart,

    /// The command failed wire validation and was dropped before being
    /// assigned a sequence number. The run continues with the next command.
    #[error("command rejected: {0}")]
    Rejected(#[from] DecodeError),

    /// A consumer failed while processing a sequenced command.
    #[error("consumer {consumer} failed: {source}")]
    Consumer {
        consumer: &'static str,
        source: ConsumerError,
    },

    /// The sequencer halted after an invariant violation; no further commands
    /// are accepted.
    #[error("sequencer halted after invariant violation")]
    Halted,
}

/// A component registered to observe every sequenced command, in order.
pub trait Consumer {
    /// Name used in dispatch logs and error reports.
    fn name(&self) -> &'static str;

    /// Process one sequenced command. Commands queued on `outbox` are
    /// dispatched after this command completes, in FIFO order.
    fn on_command(
        &mut self,
        seq: SequenceNumber,
        command: &Command,
        outbox: &mut Outbox,
    ) -> Result<(), ConsumerError>;
}

/// Shared single-threaded handle: lets the harness keep a view into a
/// consumer (to read final state) while the sequencer drives it.
impl<C: Consumer> Consumer for Rc<RefCell<C>> {
    fn name(&self) -> &'static str {
        self.borrow().name()
    }

    fn on_command(
        &mut self,
        seq: SequenceNumber,
        command: &Command,
        outbox: &mut Outbox,
    ) -> Result<(), ConsumerError> {
        self.borrow_mut().on_command(seq, command, outbox)
    }
}

/// The sequencer. Owns the consumer list and the one logical clock.
#[derive(Default)]
pub struct Sequencer {
    consumers: Vec<Box<dyn Consumer>>,
    next_seq: u64,
    in_dispatch: bool,
    halted: bool,
}

impl Sequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a consumer. Only valid before the first `submit`; the
    /// consumer set (and therefore the dispatch order) is fixed at start-up.
    pub fn register(&mut self, consumer: Box<dyn Consumer>) -> Result<(), SequencerError> {
        if self.next_seq > 0 {
            return Err(SequencerError::RegisterAfterStart);
        }
        tracing::debug!(consumer = consumer.name(), "registered consumer");
        self.consumers.push(consumer);
        Ok(())
    }

    /// Submit a command: validate it, assign the next sequence number, and
    /// dispatch it (plus any commands consumers queue in response) to every
    /// consumer before returning.
    ///
    /// Returns the sequence number assigned to the submitted command.
    /// Malformed commands are rejected before sequencing; the stream is
    /// unaffected and the caller may continue with the next command.
    pub fn submit(&mut self, command: Command) -> Result<SequenceNumber, SequencerError> {
        if self.halted {
            return Err(SequencerError::Halted);
        }
        if self.in_dispatch {
            return Err(SequencerError::ReentrantSubmit);
        }
        // Validate before a sequence number is burned on a bad payload.
        command.decode()?;

        self.in_dispatch = true;
        let result = self.dispatch_loop(command);
        self.in_dispatch = false;

        if let Err(SequencerError::Consumer {
            source: ConsumerError::Invariant(_),
            ..
        }) = &result
        {
            self.halted = true;
        }
        result
    }

    fn dispatch_loop(&mut self, command: Command) -> Result<SequenceNumber, SequencerError> {
        let mut pending = VecDeque::from([command]);
        let mut submitted_seq = None;

        while let Some(cmd) = pending.pop_front() {
            self.next_seq += 1;
            let seq = SequenceNumber(self.next_seq);
            if submitted_seq.is_none() {
                submitted_seq = Some(seq);
            }

            let mut outbox = Outbox::new();
            for consumer in &mut self.consumers {
                if let Err(source) = consumer.on_command(seq, &cmd, &mut outbox) {
                    return Err(SequencerError::Consumer {
                        consumer: consumer.name(),
                        source,
                    });
                }
            }
            pending.extend(outbox.drain());
        }

        // dispatch_loop is only entered with one command, so this is Some.
        submitted_seq.ok_or(SequencerError::Halted)
    }

    /// Sequence number of the most recently dispatched command.
    pub fn last_seq(&self) -> SequenceNumber {
        SequenceNumber(self.next_seq)
    }

    /// Whether an invariant violation has permanently halted the sequencer.
    pub fn is_halted(&self) -> bool {
        self.halted
    }
}
