//! Scripted tick tapes for replays.
//!
//! One instrument on XLON, continuous trading throughout. The ticks are
//! shaped to walk a VWAP strategy through its branches: bids below VWAP to
//! invite buys, bids above to invite sells, and a collapsed book to push
//! VWAP out of band and trigger cancels.

use ticklab_core::codec::BookUpdate;
use ticklab_core::{InstrumentStatus, Message, PriceLevel, Source, Venue};

const INSTRUMENT: u64 = 123;

fn tick(bids: &[(i64, u64)], asks: &[(i64, u64)]) -> Message {
    Message::BookUpdate(BookUpdate {
        venue: Venue::Xlon,
        instrument_id: INSTRUMENT,
        source: Source::Stream,
        bids: bids.iter().map(|&(p, s)| PriceLevel::new(p, s)).collect(),
        asks: asks.iter().map(|&(p, s)| PriceLevel::new(p, s)).collect(),
        status: InstrumentStatus::Continuous,
    })
}

/// Best bid well below VWAP.
pub fn tick_buy1() -> Message {
    tick(
        &[(70, 500), (74, 200), (75, 300)],
        &[(76, 100), (80, 200), (85, 500)],
    )
}

/// Best bid above VWAP.
pub fn tick_sell1() -> Message {
    tick(
        &[(80, 500), (82, 300), (85, 200)],
        &[(75, 400), (77, 600), (79, 800)],
    )
}

pub fn tick_buy2() -> Message {
    tick(
        &[(68, 600), (72, 300), (74, 200)],
        &[(75, 400), (77, 600), (79, 800)],
    )
}

pub fn tick_sell2() -> Message {
    tick(
        &[(85, 600), (88, 400), (90, 300)],
        &[(80, 500), (82, 700), (84, 900)],
    )
}

/// Collapsed book: VWAP falls below the acceptable band.
pub fn tick_cancel1() -> Message {
    tick(
        &[(50, 1000), (52, 800), (55, 600)],
        &[(60, 500), (62, 700), (64, 900)],
    )
}

pub fn tick_buy3() -> Message {
    tick(
        &[(65, 700), (68, 400), (70, 300)],
        &[(72, 500), (74, 600), (76, 800)],
    )
}

pub fn tick_buy4() -> Message {
    tick(
        &[(60, 800), (63, 500), (65, 400)],
        &[(67, 700), (69, 800), (71, 1000)],
    )
}

/// The full scripted tape, in replay order.
pub fn standard_tape() -> Vec<Message> {
    vec![
        tick_buy1(),
        tick_sell1(),
        tick_buy2(),
        tick_sell2(),
        tick_cancel1(),
        tick_buy3(),
        tick_buy4(),
    ]
}
