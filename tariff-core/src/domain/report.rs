use serde::Serialize;

/// Tiered and flat cost sums for one calendar month (year-independent).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthBucket {
    pub month: u8,
    pub label: &'static str,
    pub tiered_cost: f64,
    pub flat_cost: f64,
}

/// Tiered and flat cost sums for one season.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonBucket {
    pub season: String,
    pub tiered_cost: f64,
    pub flat_cost: f64,
}

/// Cost comparison for one batch of readings. Computed fresh per batch,
/// never persisted.
///
/// Month buckets are in calendar order and carry only months present in the
/// batch; season buckets follow schedule-definition order. `pct_difference`
/// is `100 * (total_flat - total_tiered) / total_flat`, or `None` when the
/// flat total is zero (serialized as JSON `null`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateReport {
    pub readings: usize,
    pub rejected: usize,
    pub months: Vec<MonthBucket>,
    pub seasons: Vec<SeasonBucket>,
    pub total_tiered_cost: f64,
    pub total_flat_cost: f64,
    pub pct_difference: Option<f64>,
}
