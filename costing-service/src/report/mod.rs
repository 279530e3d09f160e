use std::sync::Arc;

use futures::StreamExt;
use tariff_core::{engine, CostedReading, TariffSchedule};

use crate::pipeline::{Envelope, PipelineError, Sink};

/// Terminal stage of the file pipeline: accumulates the costed stream,
/// counts row-level rejections flowing past it, builds the aggregate report
/// and writes it to stdout as pretty JSON.
pub struct ReportSink {
    schedule: Arc<TariffSchedule>,
}

impl ReportSink {
    pub fn new(schedule: Arc<TariffSchedule>) -> Self {
        Self { schedule }
    }
}

#[async_trait::async_trait]
impl Sink<CostedReading> for ReportSink {
    async fn run<S>(&self, mut input: S) -> Result<(), PipelineError>
    where
        S: futures::Stream<Item = Result<Envelope<CostedReading>, PipelineError>>
            + Send
            + Unpin
            + 'static,
    {
        let mut envelopes: Vec<Envelope<CostedReading>> = Vec::new();
        let mut rejected: usize = 0;

        while let Some(item) = input.next().await {
            match item {
                Ok(env) => envelopes.push(env),
                // Row-level rejections are counted, never fatal.
                Err(PipelineError::Classify(e)) | Err(PipelineError::Transform(e)) => {
                    rejected += 1;
                    metrics::counter!("report_rejected_rows_total").increment(1);
                    tracing::warn!(error = %e, "row rejected");
                }
                Err(e) => {
                    tracing::error!(error = %e, "fatal error upstream of report sink");
                    return Err(e);
                }
            }
        }

        // Approximate end-to-end latency from earliest received_at to now.
        if let Some(min_received) = envelopes.iter().map(|e| e.received_at).min() {
            if let Ok(dur) = std::time::SystemTime::now().duration_since(min_received) {
                metrics::histogram!("report_build_latency_seconds").record(dur.as_secs_f64());
            }
        }

        let costed: Vec<CostedReading> = envelopes.into_iter().map(|e| e.payload).collect();
        let report = engine::aggregate(&costed, &self.schedule, rejected);

        metrics::counter!("report_costed_rows_total").increment(report.readings as u64);
        tracing::info!(
            readings = report.readings,
            rejected = report.rejected,
            total_tiered = report.total_tiered_cost,
            total_flat = report.total_flat_cost,
            "costed batch aggregated"
        );

        let rendered = serde_json::to_string_pretty(&report)
            .map_err(|e| PipelineError::Sink(format!("failed to render report: {e}")))?;
        println!("{rendered}");

        Ok(())
    }
}
