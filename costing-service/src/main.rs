use anyhow::Result;
use costing_service::{
    api::{self, ApiState},
    config::AppConfig,
    metrics_server, observability,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    // Load configuration. An invalid tariff schedule aborts here, before
    // any classification is served.
    let cfg = AppConfig::load()?;
    let schedule = cfg
        .engine
        .into_schedule()
        .map_err(|e| anyhow::anyhow!("invalid tariff schedule: {e}"))?;
    tracing::info!(
        seasons = schedule.rules().len(),
        flat_rate = schedule.flat_rate(),
        "tariff schedule loaded"
    );

    // Start metrics server if configured
    if let Some(metrics_cfg) = &cfg.metrics {
        metrics_server::init(&metrics_cfg.bind_addr)?;
    }

    api::serve(
        &cfg.http.bind_addr,
        ApiState {
            schedule: Arc::new(schedule),
            skip_rows: cfg.source.skip_rows,
            reject_policy: cfg.engine.on_parse_error,
        },
    )
    .await
}
