//! A passive consumer that traces every sequenced command.
//!
//! Registered first so the trace shows each command before any stateful
//! consumer reacts to it. Never errors and never publishes.

use super::{Command, Consumer, ConsumerError, Outbox};
use crate::domain::SequenceNumber;

#[derive(Debug, Default)]
pub struct LoggingConsumer {
    commands_seen: u64,
}

impl LoggingConsumer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands_seen(&self) -> u64 {
        self.commands_seen
    }
}

impl Consumer for LoggingConsumer {
    fn name(&self) -> &'static str {
        "logging"
    }

    fn on_command(
        &mut self,
        seq: SequenceNumber,
        command: &Command,
        _outbox: &mut Outbox,
    ) -> Result<(), ConsumerError> {
        self.commands_seen += 1;
        match command.decode() {
            Ok(message) => tracing::debug!(%seq, %message, "command"),
            // Decode failures are rejected by the sequencer before dispatch;
            // if one slips through, log it rather than kill the stream here.
            Err(err) => tracing::warn!(%seq, %err, "undecodable command"),
        }
        Ok(())
    }
}
