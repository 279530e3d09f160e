use time::{macros::datetime, PrimitiveDateTime};

use tariff_core::CostedReading;

use crate::pipeline::{Envelope, PipelineError, Transform};

/// Broad sanity window for reading timestamps. Anything outside it is a
/// mis-keyed or corrupted export row, not a plausible meter interval.
pub fn within_sanity_window(ts: PrimitiveDateTime) -> bool {
    let min_ts = datetime!(2000-01-01 00:00);
    let max_ts = datetime!(2100-01-01 00:00);
    ts >= min_ts && ts < max_ts
}

/// Pure validation of a costed reading.
///
/// Negative energy is already rejected during classification; the remaining
/// rule is the timestamp sanity window.
pub fn validate_costed(
    env: Envelope<CostedReading>,
) -> Result<Envelope<CostedReading>, PipelineError> {
    let ts = env.payload.reading.ts;
    if !within_sanity_window(ts) {
        return Err(PipelineError::Transform(format!(
            "timestamp {ts} outside the accepted range"
        )));
    }
    Ok(env)
}

#[derive(Clone, Default)]
pub struct CostedValidation;

#[async_trait::async_trait]
impl Transform<CostedReading, CostedReading> for CostedValidation {
    async fn apply(
        &self,
        input: Envelope<CostedReading>,
    ) -> Result<Envelope<CostedReading>, PipelineError> {
        match validate_costed(input) {
            Ok(env) => Ok(env),
            Err(e) => {
                metrics::counter!("validation_rejected_rows_total").increment(1);
                Err(e)
            }
        }
    }
}
