use std::{net::SocketAddr, sync::Arc};

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::Serialize;

use tariff_core::{engine, AggregateReport, CostedReading, RejectedRow, TariffSchedule};

use crate::config::RejectPolicy;
use crate::sources;
use crate::transform;

/// Read-only state shared across upload requests.
#[derive(Clone)]
pub struct ApiState {
    pub schedule: Arc<TariffSchedule>,
    pub skip_rows: usize,
    pub reject_policy: RejectPolicy,
}

#[derive(Serialize)]
pub struct AnalyzeResponse {
    pub report: AggregateReport,
    pub rows: Vec<CostedReading>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejected_rows: Option<Vec<RejectedRow>>,
}

pub async fn serve(bind_addr: &str, state: ApiState) -> anyhow::Result<()> {
    let addr: SocketAddr = bind_addr
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid http bind addr: {e}"))?;

    let app = router(Arc::new(state));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "analysis API listening");
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/analyze", post(analyze))
        .with_state(state)
}

/// Analyze one uploaded meter export: the request body is the raw CSV text,
/// the response carries the costed rows and the aggregate report.
async fn analyze(
    State(state): State<Arc<ApiState>>,
    body: String,
) -> Result<Json<AnalyzeResponse>, (StatusCode, String)> {
    metrics::counter!("http_analyze_requests_total").increment(1);

    let rows = sources::parse_rows(&body, state.skip_rows)
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    if rows.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "no data rows in upload".to_string()));
    }

    let outcome = engine::classify_batch(rows, &state.schedule).map_err(|e| {
        // Unreachable with the startup-validated schedule.
        tracing::error!(error = %e, "tariff resolution failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    let before = outcome.costed.len();
    let costed: Vec<CostedReading> = outcome
        .costed
        .into_iter()
        .filter(|c| transform::within_sanity_window(c.reading.ts))
        .collect();
    let out_of_window = before - costed.len();
    let rejected_count = outcome.rejected.len() + out_of_window;

    let report = engine::aggregate(&costed, &state.schedule, rejected_count);
    tracing::info!(
        readings = report.readings,
        rejected = report.rejected,
        "upload analyzed"
    );

    let rejected_rows = match state.reject_policy {
        RejectPolicy::Flag => Some(outcome.rejected),
        RejectPolicy::Exclude => None,
    };

    Ok(Json(AnalyzeResponse {
        report,
        rows: costed,
        rejected_rows,
    }))
}
