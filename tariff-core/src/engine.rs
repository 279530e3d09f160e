use std::collections::HashMap;

use crate::calendar;
use crate::domain::{
    AggregateReport, CostedReading, MonthBucket, RawRow, Reading, RejectedRow, RowError,
    SeasonBucket,
};
use crate::schedule::{ScheduleError, TariffSchedule};

/// Result of classifying one batch: the priced rows and the rows that were
/// rejected at row granularity. Rejections never abort the batch; whether
/// they are merely counted or surfaced in full is the caller's policy.
#[derive(Debug)]
pub struct BatchOutcome {
    pub costed: Vec<CostedReading>,
    pub rejected: Vec<RejectedRow>,
}

/// Classify and price a single raw row.
///
/// Pure function of the input and the schedule: the same row always yields
/// the same `CostedReading`. A timestamp that does not parse is an error,
/// not a substitute date.
pub fn classify_row(raw: &RawRow, schedule: &TariffSchedule) -> Result<CostedReading, RowError> {
    let ts = calendar::parse_timestamp(&raw.timestamp).map_err(|source| RowError::Timestamp {
        text: raw.timestamp.clone(),
        source,
    })?;

    let kwh: f64 = raw
        .kwh
        .trim()
        .parse()
        .map_err(|source| RowError::Energy {
            text: raw.kwh.clone(),
            source,
        })?;
    if !kwh.is_finite() || kwh < 0.0 {
        return Err(RowError::InvalidEnergy(kwh));
    }

    let cal = calendar::attributes_of(ts);
    let quote = schedule.resolve_rate(cal.month, cal.hour, cal.is_weekend)?;

    Ok(CostedReading {
        reading: Reading { ts, kwh },
        month: cal.month,
        hour: cal.hour,
        weekday: cal.weekday,
        season: quote.season.to_string(),
        period: quote.period,
        unit_price: quote.unit_price,
        tiered_cost: kwh * quote.unit_price / 100.0,
        flat_cost: kwh * schedule.flat_rate() / 100.0,
    })
}

/// Classify a whole batch. Row-level failures accumulate as rejections; an
/// unresolvable rate on a validated schedule is an internal invariant
/// violation and fails the batch.
pub fn classify_batch<I>(rows: I, schedule: &TariffSchedule) -> Result<BatchOutcome, ScheduleError>
where
    I: IntoIterator<Item = RawRow>,
{
    let mut costed = Vec::new();
    let mut rejected = Vec::new();

    for raw in rows {
        match classify_row(&raw, schedule) {
            Ok(reading) => costed.push(reading),
            Err(RowError::Rate(e)) => return Err(e),
            Err(e) => rejected.push(RejectedRow {
                index: raw.index,
                timestamp: raw.timestamp,
                kwh: raw.kwh,
                reason: e.to_string(),
            }),
        }
    }

    Ok(BatchOutcome { costed, rejected })
}

/// Sum tiered and flat costs by month, by season, and in total, in a single
/// pass over the batch.
///
/// Month buckets collapse multi-year input into the 12 calendar months.
pub fn aggregate(
    costed: &[CostedReading],
    schedule: &TariffSchedule,
    rejected: usize,
) -> AggregateReport {
    let mut by_month: HashMap<u8, (f64, f64)> = HashMap::new();
    let mut by_season: HashMap<&str, (f64, f64)> = HashMap::new();
    let mut total_tiered = 0.0;
    let mut total_flat = 0.0;

    for reading in costed {
        let month = by_month.entry(reading.month).or_insert((0.0, 0.0));
        month.0 += reading.tiered_cost;
        month.1 += reading.flat_cost;

        let season = by_season.entry(reading.season.as_str()).or_insert((0.0, 0.0));
        season.0 += reading.tiered_cost;
        season.1 += reading.flat_cost;

        total_tiered += reading.tiered_cost;
        total_flat += reading.flat_cost;
    }

    let months = (1..=12u8)
        .filter_map(|month| {
            by_month.get(&month).map(|&(tiered_cost, flat_cost)| MonthBucket {
                month,
                label: calendar::month_abbrev(month),
                tiered_cost,
                flat_cost,
            })
        })
        .collect();

    let mut seasons: Vec<SeasonBucket> = Vec::new();
    for rule in schedule.rules() {
        if seasons.iter().any(|b| b.season == rule.season) {
            continue;
        }
        if let Some(&(tiered_cost, flat_cost)) = by_season.get(rule.season.as_str()) {
            seasons.push(SeasonBucket {
                season: rule.season.clone(),
                tiered_cost,
                flat_cost,
            });
        }
    }

    let pct_difference = if total_flat == 0.0 {
        None
    } else {
        Some(100.0 * (total_flat - total_tiered) / total_flat)
    };

    AggregateReport {
        readings: costed.len(),
        rejected,
        months,
        seasons,
        total_tiered_cost: total_tiered,
        total_flat_cost: total_flat,
        pct_difference,
    }
}
