use serde::Serialize;
use time::PrimitiveDateTime;

use crate::schedule::{Period, ScheduleError};

time::serde::format_description!(
    timestamp_format,
    PrimitiveDateTime,
    "[day]/[month]/[year] [hour]:[minute]"
);

/// One record as delivered by the file-parsing collaborator: the raw
/// timestamp and kWh texts plus the 0-based position in the input sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub index: usize,
    pub timestamp: String,
    pub kwh: String,
}

/// One metered interval. Immutable once parsed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Reading {
    #[serde(with = "timestamp_format")]
    pub ts: PrimitiveDateTime,
    pub kwh: f64,
}

/// A reading augmented with its calendar position and both prices.
///
/// Costs follow the per-100-kWh price convention:
/// `cost = kwh * price / 100`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostedReading {
    #[serde(flatten)]
    pub reading: Reading,
    pub month: u8,
    pub hour: u8,
    pub weekday: u8,
    pub season: String,
    pub period: Period,
    pub unit_price: f64,
    pub tiered_cost: f64,
    pub flat_cost: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum RowError {
    #[error("invalid timestamp '{text}': {source}")]
    Timestamp {
        text: String,
        source: time::error::Parse,
    },
    #[error("invalid energy quantity '{text}': {source}")]
    Energy {
        text: String,
        source: std::num::ParseFloatError,
    },
    #[error("energy quantity {0} kWh is not a non-negative number")]
    InvalidEnergy(f64),
    #[error(transparent)]
    Rate(#[from] ScheduleError),
}

/// A row that failed classification, kept alongside the reason instead of
/// being silently replaced or dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedRow {
    pub index: usize,
    pub timestamp: String,
    pub kwh: String,
    pub reason: String,
}
