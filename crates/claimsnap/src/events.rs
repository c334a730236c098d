//! 🧾 Event records: one line of the batch, decoded into something with a node id.
//!
//! The upstream system emits a JSON object per line. We care about exactly one
//! field (`nodeId`). Everything else rides along and gets ignored, like the
//! terms and conditions.

use serde::Deserialize;
use thiserror::Error;

/// 🧾 A single domain event, reduced to the one thing this pipeline needs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(crate) struct EventRecord {
    /// 🆔 The repository node id of the asset to classify.
    #[serde(rename = "nodeId")]
    pub asset_id: String,
}

/// 💀 A record that refused to become an [`EventRecord`].
///
/// Carries the original text so the log line can show exactly what arrived.
#[derive(Debug, Error)]
#[error("could not parse event record {raw:?}: {source}")]
pub(crate) struct ParseError {
    pub raw: String,
    #[source]
    pub source: serde_json::Error,
}

/// 🔍 Decode one raw record. Failure is local to the record: the batch keeps going.
pub(crate) fn parse_record(raw: &str) -> Result<EventRecord, ParseError> {
    serde_json::from_str::<EventRecord>(raw).map_err(|source| ParseError {
        raw: raw.to_string(),
        source,
    })
}
