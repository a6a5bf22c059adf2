//! Market-data types: venues, price levels, instrument status.

use serde::{Deserialize, Serialize};

/// Trading venue.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum Venue {
    Xlon = 1,
    Xnas = 2,
    Xpar = 3,
}

impl Venue {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            1 => Some(Self::Xlon),
            2 => Some(Self::Xnas),
            3 => Some(Self::Xpar),
            _ => None,
        }
    }
}

/// Where a book update came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Source {
    /// Incremental stream update.
    Stream = 1,
    /// Full snapshot.
    Snapshot = 2,
}

impl Source {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            1 => Some(Self::Stream),
            2 => Some(Self::Snapshot),
            _ => None,
        }
    }
}

/// Instrument trading phase carried on every book update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum InstrumentStatus {
    Continuous = 1,
    Auction = 2,
    Halted = 3,
}

impl InstrumentStatus {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            1 => Some(Self::Continuous),
            2 => Some(Self::Auction),
            3 => Some(Self::Halted),
            _ => None,
        }
    }
}

/// One price level of a book side: price and the size resting at it.
///
/// A side's book is an ordered sequence of levels, best-first (index 0 is the
/// top of book). Lists shorter than the requested depth are not an error —
/// callers get `None` past the end and must treat missing levels as zero
/// contribution to any aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceLevel {
    pub price: i64,
    pub size: u64,
}

impl PriceLevel {
    pub fn new(price: i64, size: u64) -> Self {
        Self { price, size }
    }
}
