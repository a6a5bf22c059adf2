//! Deterministic state fingerprinting.
//!
//! A run's final state is dumped to canonical JSON and hashed with BLAKE3.
//! Two runs over the same command stream must produce byte-identical dumps,
//! so comparing fingerprints is the cheap way to verify determinism across
//! runs, machines, and refactors.

use crate::book::MatchingBook;
use crate::domain::SequenceNumber;
use crate::services::{MarketDataService, OrderService};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Everything observable at the end of a run.
///
/// All fields serialize in a stable order (BTreeMaps underneath), so the JSON
/// is canonical for a given state.
#[derive(Serialize)]
pub struct StateDump<'a> {
    pub last_seq: SequenceNumber,
    pub book: &'a MatchingBook,
    pub market: &'a MarketDataService,
    pub orders: &'a OrderService,
}

/// Pretty JSON dump of the state, for logs and diffing.
pub fn state_json(dump: &StateDump<'_>) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(dump)
}

/// BLAKE3 hex fingerprint over the compact JSON dump.
pub fn fingerprint(dump: &StateDump<'_>) -> Result<String, serde_json::Error> {
    let json = serde_json::to_vec(dump)?;
    Ok(blake3::hash(&json).to_hex().to_string())
}

/// Serialize a map with a non-string key as a sequence of (key, value)
/// pairs. JSON object keys must be strings; our book maps are keyed by
/// (venue, instrument) tuples.
pub(crate) fn serialize_keyed_map<K, V, S>(
    map: &BTreeMap<K, V>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    K: Serialize,
    V: Serialize,
    S: Serializer,
{
    serializer.collect_seq(map.iter())
}
