//! Fixed-layout binary wire codec for the command stream.
//!
//! Every command on the wire is a header followed by a body:
//!
//! ```text
//! [schema_id:u16][version:u16][body_len:u32][body...]
//! ```
//!
//! all little-endian. The header carries enough to dispatch on message type
//! without out-of-band metadata, and the declared body length lets a decoder
//! reject truncated payloads before interpreting a single body field.
//!
//! Body layouts:
//! - BookUpdate: `venue:u8, instrument_id:u64, source:u8, bid_count:u16,
//!   bid[]{price:i64, size:u64}, ask_count:u16, ask[]{price:i64, size:u64},
//!   status:u8` — bid and ask lists are independently sized.
//! - CreateOrder: `side:u8, quantity:u64, price:i64`
//! - CancelOrder: `order_id:u64`
//! - Fill: `order_id:u64, quantity:u64`
//!
//! `encode` and `decode` are pure transforms; `decode(encode(m)) == m` for
//! every valid message.

use crate::domain::{InstrumentStatus, OrderId, PriceLevel, Side, Source, Venue};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Wire schema identifiers, one per message shape.
pub const SCHEMA_BOOK_UPDATE: u16 = 1;
pub const SCHEMA_CREATE_ORDER: u16 = 2;
pub const SCHEMA_CANCEL_ORDER: u16 = 3;
pub const SCHEMA_FILL: u16 = 4;

/// Current wire version, carried in every header.
pub const WIRE_VERSION: u16 = 1;

/// Header size in bytes: schema_id + version + body_len.
pub const HEADER_LEN: usize = 8;

/// Errors from decoding a wire payload.
///
/// All of these are fatal to the single command that carried them, never to
/// the run: the sequencer surfaces the error and continues with the next
/// command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unknown schema id {0}")]
    UnknownSchema(u16),

    #[error("unsupported wire version {0}")]
    UnknownVersion(u16),

    #[error("truncated payload: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("bad enum value {value} for {field}")]
    BadEnum { field: &'static str, value: u8 },
}

/// A book update: the venue+instrument top-of-book ladder for both sides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookUpdate {
    pub venue: Venue,
    pub instrument_id: u64,
    pub source: Source,
    /// Bid levels, best-first (descending price).
    pub bids: Vec<PriceLevel>,
    /// Ask levels, best-first (ascending price).
    pub asks: Vec<PriceLevel>,
    pub status: InstrumentStatus,
}

/// Request to create a child order. The order id is not on the wire: it is
/// the sequence number the command receives at ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrder {
    pub side: Side,
    pub quantity: u64,
    pub price: i64,
}

/// Request to cancel a resting child order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelOrder {
    pub order_id: OrderId,
}

/// A fill of a resting child order, emitted by the matching book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fill {
    pub order_id: OrderId,
    pub quantity: u64,
}

/// The closed set of message shapes carried on the command stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Message {
    BookUpdate(BookUpdate),
    CreateOrder(CreateOrder),
    CancelOrder(CancelOrder),
    Fill(Fill),
}

impl Message {
    pub fn schema_id(&self) -> u16 {
        match self {
            Message::BookUpdate(_) => SCHEMA_BOOK_UPDATE,
            Message::CreateOrder(_) => SCHEMA_CREATE_ORDER,
            Message::CancelOrder(_) => SCHEMA_CANCEL_ORDER,
            Message::Fill(_) => SCHEMA_FILL,
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::BookUpdate(m) => write!(
                f,
                "BookUpdate[{:?}/{} {:?} {} bids / {} asks]",
                m.venue,
                m.instrument_id,
                m.status,
                m.bids.len(),
                m.asks.len()
            ),
            Message::CreateOrder(m) => {
                write!(f, "CreateOrder[{:?} {} @ {}]", m.side, m.quantity, m.price)
            }
            Message::CancelOrder(m) => write!(f, "CancelOrder[#{}]", m.order_id),
            Message::Fill(m) => write!(f, "Fill[#{} qty {}]", m.order_id, m.quantity),
        }
    }
}

// ── Encode ───────────────────────────────────────────────────────────

/// Encode a message into its wire representation, header included.
pub fn encode(message: &Message) -> Bytes {
    let body = encode_body(message);
    let mut out = BytesMut::with_capacity(HEADER_LEN + body.len());
    out.put_u16_le(message.schema_id());
    out.put_u16_le(WIRE_VERSION);
    out.put_u32_le(body.len() as u32);
    out.put_slice(&body);
    out.freeze()
}

fn encode_body(message: &Message) -> BytesMut {
    let mut out = BytesMut::with_capacity(64);
    match message {
        Message::BookUpdate(m) => {
            out.put_u8(m.venue as u8);
            out.put_u64_le(m.instrument_id);
            out.put_u8(m.source as u8);
            out.put_u16_le(m.bids.len() as u16);
            for level in &m.bids {
                out.put_i64_le(level.price);
                out.put_u64_le(level.size);
            }
            out.put_u16_le(m.asks.len() as u16);
            for level in &m.asks {
                out.put_i64_le(level.price);
                out.put_u64_le(level.size);
            }
            out.put_u8(m.status as u8);
        }
        Message::CreateOrder(m) => {
            out.put_u8(m.side as u8);
            out.put_u64_le(m.quantity);
            out.put_i64_le(m.price);
        }
        Message::CancelOrder(m) => {
            out.put_u64_le(m.order_id.0);
        }
        Message::Fill(m) => {
            out.put_u64_le(m.order_id.0);
            out.put_u64_le(m.quantity);
        }
    }
    out
}

// ── Decode ───────────────────────────────────────────────────────────

/// Decode a full wire payload (header + body) back into a message.
///
/// The header is validated first: unknown schema ids and version mismatches
/// are rejected before the body is touched, and the declared body length must
/// match the bytes actually present.
pub fn decode(buf: &[u8]) -> Result<Message, DecodeError> {
    if buf.len() < HEADER_LEN {
        return Err(DecodeError::Truncated {
            expected: HEADER_LEN,
            actual: buf.len(),
        });
    }

    let mut cursor = buf;
    let schema_id = cursor.get_u16_le();
    let version = cursor.get_u16_le();
    let body_len = cursor.get_u32_le() as usize;

    if version != WIRE_VERSION {
        return Err(DecodeError::UnknownVersion(version));
    }
    if cursor.remaining() != body_len {
        return Err(DecodeError::Truncated {
            expected: HEADER_LEN + body_len,
            actual: buf.len(),
        });
    }

    match schema_id {
        SCHEMA_BOOK_UPDATE => decode_book_update(cursor),
        SCHEMA_CREATE_ORDER => decode_create_order(cursor),
        SCHEMA_CANCEL_ORDER => decode_cancel_order(cursor),
        SCHEMA_FILL => decode_fill(cursor),
        other => Err(DecodeError::UnknownSchema(other)),
    }
}

/// Read the schema id of a payload without decoding the body.
pub fn peek_schema_id(buf: &[u8]) -> Result<u16, DecodeError> {
    if buf.len() < 2 {
        return Err(DecodeError::Truncated {
            expected: HEADER_LEN,
            actual: buf.len(),
        });
    }
    Ok(u16::from_le_bytes([buf[0], buf[1]]))
}

fn need(cursor: &[u8], n: usize) -> Result<(), DecodeError> {
    if cursor.remaining() < n {
        Err(DecodeError::Truncated {
            expected: n,
            actual: cursor.remaining(),
        })
    } else {
        Ok(())
    }
}

fn decode_levels(cursor: &mut &[u8]) -> Result<Vec<PriceLevel>, DecodeError> {
    need(cursor, 2)?;
    let count = cursor.get_u16_le() as usize;
    need(cursor, count * 16)?;
    let mut levels = Vec::with_capacity(count);
    for _ in 0..count {
        let price = cursor.get_i64_le();
        let size = cursor.get_u64_le();
        levels.push(PriceLevel { price, size });
    }
    Ok(levels)
}

fn decode_book_update(mut cursor: &[u8]) -> Result<Message, DecodeError> {
    need(cursor, 10)?;
    let venue_raw = cursor.get_u8();
    let venue = Venue::from_u8(venue_raw).ok_or(DecodeError::BadEnum {
        field: "venue",
        value: venue_raw,
    })?;
    let instrument_id = cursor.get_u64_le();
    let source_raw = cursor.get_u8();
    let source = Source::from_u8(source_raw).ok_or(DecodeError::BadEnum {
        field: "source",
        value: source_raw,
    })?;

    let bids = decode_levels(&mut cursor)?;
    let asks = decode_levels(&mut cursor)?;

    need(cursor, 1)?;
    let status_raw = cursor.get_u8();
    let status = InstrumentStatus::from_u8(status_raw).ok_or(DecodeError::BadEnum {
        field: "status",
        value: status_raw,
    })?;

    Ok(Message::BookUpdate(BookUpdate {
        venue,
        instrument_id,
        source,
        bids,
        asks,
        status,
    }))
}

fn decode_create_order(mut cursor: &[u8]) -> Result<Message, DecodeError> {
    need(cursor, 17)?;
    let side_raw = cursor.get_u8();
    let side = Side::from_u8(side_raw).ok_or(DecodeError::BadEnum {
        field: "side",
        value: side_raw,
    })?;
    let quantity = cursor.get_u64_le();
    let price = cursor.get_i64_le();
    Ok(Message::CreateOrder(CreateOrder {
        side,
        quantity,
        price,
    }))
}

fn decode_cancel_order(mut cursor: &[u8]) -> Result<Message, DecodeError> {
    need(cursor, 8)?;
    let order_id = OrderId(cursor.get_u64_le());
    Ok(Message::CancelOrder(CancelOrder { order_id }))
}

fn decode_fill(mut cursor: &[u8]) -> Result<Message, DecodeError> {
    need(cursor, 16)?;
    let order_id = OrderId(cursor.get_u64_le());
    let quantity = cursor.get_u64_le();
    Ok(Message::Fill(Fill { order_id, quantity }))
}
