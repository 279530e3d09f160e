use anyhow::{bail, Result};
use costing_service::{
    config::AppConfig,
    observability,
    pipeline::{Classifier, Pipeline},
    report::ReportSink,
    sources::IntervalCsvFileSource,
    transform,
};
use std::{env, sync::Arc};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        bail!("usage: analyze_csv <meter_export_csv_path>");
    }
    let file_path = &args[1];

    // Load configuration (can point COSTING_CONFIG to an alternate tariff).
    let cfg = AppConfig::load()?;
    let schedule = Arc::new(
        cfg.engine
            .into_schedule()
            .map_err(|e| anyhow::anyhow!("invalid tariff schedule: {e}"))?,
    );

    let source = IntervalCsvFileSource::new(file_path, cfg.source.skip_rows);

    let pipeline = Pipeline {
        source,
        classifier: Classifier::new(schedule.clone()),
        transforms: vec![Arc::new(transform::CostedValidation::default())],
        sink: ReportSink::new(schedule),
    };

    pipeline.run().await?;

    Ok(())
}
