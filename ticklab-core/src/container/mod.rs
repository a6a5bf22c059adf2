//! The strategy container: hosts pluggable strategy logic behind the
//! sequencer, feeding it read-only state and turning its decisions back into
//! sequenced commands.
//!
//! The container is one consumer. It owns both read-model services, applies
//! every command to them first, and then, when the trigger fires, hands the
//! strategy an [`AlgoState`] snapshot and publishes whatever action comes
//! back. Strategy failures are contained: the error is logged and treated as
//! no action, never surfaced as a stream failure.

use crate::codec::{CreateOrder, CancelOrder, Message};
use crate::domain::{OrderId, SequenceNumber, Side};
use crate::sequencer::{Command, Consumer, ConsumerError, Outbox};
use crate::services::{AlgoState, MarketDataService, OrderService};
use thiserror::Error;

/// What a strategy wants done after one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CreateChildOrder {
        side: Side,
        quantity: u64,
        price: i64,
    },
    CancelChildOrder {
        order_id: OrderId,
    },
    NoAction,
}

/// A failure inside strategy logic. Contained at the container boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("strategy failure: {0}")]
pub struct StrategyError(pub String);

/// Pluggable strategy logic.
pub trait AlgoLogic {
    fn name(&self) -> &str;

    /// Evaluate the current state and decide on at most one action.
    fn evaluate(&mut self, state: &AlgoState<'_>) -> Result<Action, StrategyError>;
}

// ── Trigger ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TriggerState {
    Idle,
    Evaluating,
}

/// Decides when the strategy runs and guards against nested evaluation.
///
/// Only market-data commands trigger an evaluation; the fills and cancels a
/// strategy's own actions produce do not re-trigger it within the same tick.
#[derive(Debug)]
pub struct RunTrigger {
    state: TriggerState,
}

impl RunTrigger {
    pub fn new() -> Self {
        Self {
            state: TriggerState::Idle,
        }
    }

    pub fn wants(message: &Message) -> bool {
        matches!(message, Message::BookUpdate(_))
    }

    /// Returns false when an evaluation is already in flight.
    fn begin(&mut self) -> bool {
        if self.state == TriggerState::Evaluating {
            return false;
        }
        self.state = TriggerState::Evaluating;
        true
    }

    fn end(&mut self) {
        self.state = TriggerState::Idle;
    }
}

impl Default for RunTrigger {
    fn default() -> Self {
        Self::new()
    }
}

// ── Actioner ─────────────────────────────────────────────────────────

/// Turns a strategy action into a sequenced command.
#[derive(Debug, Default)]
pub struct Actioner;

impl Actioner {
    pub fn publish(&self, action: Action, outbox: &mut Outbox) {
        match action {
            Action::CreateChildOrder {
                side,
                quantity,
                price,
            } => {
                tracing::info!(?side, quantity, price, "action: create child order");
                outbox.publish(&Message::CreateOrder(CreateOrder {
                    side,
                    quantity,
                    price,
                }));
            }
            Action::CancelChildOrder { order_id } => {
                tracing::info!(%order_id, "action: cancel child order");
                outbox.publish(&Message::CancelOrder(CancelOrder { order_id }));
            }
            Action::NoAction => {}
        }
    }
}

// ── Container ────────────────────────────────────────────────────────

pub struct AlgoContainer {
    market: MarketDataService,
    orders: OrderService,
    trigger: RunTrigger,
    actioner: Actioner,
    logic: Box<dyn AlgoLogic>,
}

impl AlgoContainer {
    pub fn new(logic: Box<dyn AlgoLogic>) -> Self {
        Self {
            market: MarketDataService::new(),
            orders: OrderService::new(),
            trigger: RunTrigger::new(),
            actioner: Actioner,
            logic,
        }
    }

    pub fn market(&self) -> &MarketDataService {
        &self.market
    }

    pub fn orders(&self) -> &OrderService {
        &self.orders
    }

    pub fn state(&self) -> AlgoState<'_> {
        AlgoState::new(&self.market, &self.orders)
    }

    fn apply(&mut self, seq: SequenceNumber, message: &Message) -> Result<(), ConsumerError> {
        match message {
            Message::BookUpdate(update) => {
                self.market.apply(seq, update)?;
                self.orders.observe(seq)?;
            }
            Message::CreateOrder(create) => {
                self.market.observe(seq)?;
                self.orders.apply_create(seq, create)?;
            }
            Message::CancelOrder(cancel) => {
                self.market.observe(seq)?;
                self.orders.apply_cancel(seq, cancel)?;
            }
            Message::Fill(fill) => {
                self.market.observe(seq)?;
                self.orders.apply_fill(seq, fill)?;
            }
        }
        Ok(())
    }

    fn evaluate(&mut self, outbox: &mut Outbox) {
        if !self.trigger.begin() {
            tracing::warn!("evaluation already in flight, skipping");
            return;
        }
        let state = AlgoState::new(&self.market, &self.orders);
        let action = match self.logic.evaluate(&state) {
            Ok(action) => action,
            Err(err) => {
                // Strategy failures never take the stream down.
                tracing::warn!(strategy = self.logic.name(), %err, "strategy error, no action");
                Action::NoAction
            }
        };
        self.actioner.publish(action, outbox);
        self.trigger.end();
    }
}

impl Consumer for AlgoContainer {
    fn name(&self) -> &'static str {
        "container"
    }

    fn on_command(
        &mut self,
        seq: SequenceNumber,
        command: &Command,
        outbox: &mut Outbox,
    ) -> Result<(), ConsumerError> {
        let message = command.decode()?;
        self.apply(seq, &message)?;
        if RunTrigger::wants(&message) {
            self.evaluate(outbox);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::BookUpdate;
    use crate::domain::{InstrumentStatus, PriceLevel, Source, Venue};

    /// Buys a fixed clip at the best bid whenever fewer than `max` orders
    /// exist.
    struct FixedBuyer {
        max: usize,
    }

    impl AlgoLogic for FixedBuyer {
        fn name(&self) -> &str {
            "fixed-buyer"
        }

        fn evaluate(&mut self, state: &AlgoState<'_>) -> Result<Action, StrategyError> {
            if state.total_order_count() >= self.max {
                return Ok(Action::NoAction);
            }
            let Some(bid) = state.best_bid() else {
                return Ok(Action::NoAction);
            };
            Ok(Action::CreateChildOrder {
                side: Side::Buy,
                quantity: 100,
                price: bid.price,
            })
        }
    }

    struct Failing;

    impl AlgoLogic for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn evaluate(&mut self, _state: &AlgoState<'_>) -> Result<Action, StrategyError> {
            Err(StrategyError("boom".into()))
        }
    }

    fn tick() -> Command {
        Command::from_message(&Message::BookUpdate(BookUpdate {
            venue: Venue::Xlon,
            instrument_id: 123,
            source: Source::Stream,
            bids: vec![PriceLevel::new(70, 500)],
            asks: vec![PriceLevel::new(76, 100)],
            status: InstrumentStatus::Continuous,
        }))
    }

    #[test]
    fn book_update_triggers_evaluation_and_publishes_action() {
        let mut container = AlgoContainer::new(Box::new(FixedBuyer { max: 1 }));
        let mut outbox = Outbox::new();

        container
            .on_command(SequenceNumber(1), &tick(), &mut outbox)
            .unwrap();

        let published: Vec<Message> = outbox.drain().map(|c| c.decode().unwrap()).collect();
        assert_eq!(
            published,
            vec![Message::CreateOrder(CreateOrder {
                side: Side::Buy,
                quantity: 100,
                price: 70,
            })]
        );
    }

    #[test]
    fn own_orders_do_not_retrigger_evaluation() {
        let mut container = AlgoContainer::new(Box::new(FixedBuyer { max: 10 }));
        let mut outbox = Outbox::new();

        let create = Command::from_message(&Message::CreateOrder(CreateOrder {
            side: Side::Buy,
            quantity: 100,
            price: 70,
        }));
        container
            .on_command(SequenceNumber(1), &create, &mut outbox)
            .unwrap();

        assert!(outbox.is_empty());
        assert_eq!(container.orders().total_count(), 1);
    }

    #[test]
    fn strategy_error_becomes_no_action() {
        let mut container = AlgoContainer::new(Box::new(Failing));
        let mut outbox = Outbox::new();

        container
            .on_command(SequenceNumber(1), &tick(), &mut outbox)
            .unwrap();
        assert!(outbox.is_empty());
    }

    #[test]
    fn trigger_guards_nested_evaluation() {
        let mut trigger = RunTrigger::new();
        assert!(trigger.begin());
        assert!(!trigger.begin());
        trigger.end();
        assert!(trigger.begin());
    }
}
