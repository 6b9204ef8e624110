//! Errors at the decode/import boundary.
//!
//! Coordinate resolution never errors: an unresolvable point yields `None`
//! and is skipped. `TdError` only covers data coming from outside: persisted
//! snapshots, server payloads, and bar series handed in by the data layer.

use crate::model::UnixTime;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TdError {
    #[error("bars out of order: {next} does not follow {prev}")]
    UnorderedBars { prev: UnixTime, next: UnixTime },

    #[error("{kind} needs {expected} points, found {found}")]
    PointCount {
        kind: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("point {index} has no usable coordinate or a non-finite price")]
    InvalidPoint { index: usize },

    #[error("point {index} of {id} has no time and cannot be placed on the series")]
    UnresolvedTime { id: String, index: usize },

    #[error("unknown drawing type `{0}`")]
    UnknownKind(String),

    #[error("bad timestamp `{value}`: {reason}")]
    BadTimestamp { value: String, reason: String },

    #[error("payload needs bar data to resolve `{0}`")]
    NoBars(&'static str),

    #[error("{kind} payload is missing `{field}`")]
    MissingField { kind: &'static str, field: &'static str },

    #[error("unknown sync event `{0}`")]
    UnknownEvent(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    MsgPackEncode(#[from] rmp_serde::encode::Error),

    #[error(transparent)]
    MsgPackDecode(#[from] rmp_serde::decode::Error),
}
