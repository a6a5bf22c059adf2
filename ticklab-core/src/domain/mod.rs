//! Domain types for TickLab

pub mod ids;
pub mod market;
pub mod order;

pub use ids::{OrderId, SequenceNumber};
pub use market::{InstrumentStatus, PriceLevel, Source, Venue};
pub use order::{ChildOrder, OrderState, Side};
