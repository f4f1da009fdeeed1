// =============================================================================
// REST API Endpoints — Axum 0.7
// =============================================================================
//
// Every analysis endpoint runs the whole pipeline once per request and keeps
// nothing afterwards. Errors are converted to a single message here; they
// never escape the handler.
//
//   GET /                        dashboard page (?ticker=)
//   GET /api/v1/health           liveness
//   GET /api/v1/analysis         JSON report (?ticker=)
//   GET /api/v1/chart.svg        SVG chart (?ticker=)
//   GET /api/v1/report.txt       plain-text report (?ticker=)
//
// CORS is configured permissively; the service holds no credentials.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Json, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

use crate::app_state::AppState;
use crate::error::AnalysisError;
use crate::pipeline::{analyze, Analysis};
use crate::presentation::{render_page, render_svg_chart, Report};
use crate::trend::TrendSnapshot;
use crate::types::PriceBar;

// =============================================================================
// Router construction
// =============================================================================

/// Build the full router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(dashboard))
        .route("/api/v1/health", get(health))
        .route("/api/v1/analysis", get(analysis))
        .route("/api/v1/chart.svg", get(chart))
        .route("/api/v1/report.txt", get(text_report))
        .layer(cors)
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct TickerQuery {
    ticker: Option<String>,
}

/// Run the pipeline, logging failures. `Ok(None)` means blank input.
async fn run(state: &AppState, input: &str) -> Result<Option<Analysis>, AnalysisError> {
    analyze(state.provider.as_ref(), input, state.today())
        .await
        .inspect_err(|e| warn!(input, error = %e, "analysis failed"))
}

fn error_response(err: &AnalysisError) -> Response {
    let body = serde_json::json!({ "error": err.user_message() });
    (err.status_code(), Json(body)).into_response()
}

// =============================================================================
// Health
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    server_time: i64,
}

async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        server_time: chrono::Utc::now().timestamp_millis(),
    })
}

// =============================================================================
// Dashboard page
// =============================================================================

async fn dashboard(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TickerQuery>,
) -> Html<String> {
    let input = query.ticker.unwrap_or_else(|| state.default_ticker.clone());
    let outcome = run(&state, &input).await.transpose();
    Html(render_page(&input, outcome.as_ref(), &state.display))
}

// =============================================================================
// JSON analysis
// =============================================================================

#[derive(Serialize)]
struct EmaSeriesBody<'a> {
    period: usize,
    values: &'a [f64],
}

#[derive(Serialize)]
struct SeriesBody<'a> {
    bars: &'a [PriceBar],
    emas: Vec<EmaSeriesBody<'a>>,
}

#[derive(Serialize)]
struct AnalysisResponse<'a> {
    ticker: &'a str,
    latest_close: f64,
    report: Report,
    snapshot: &'a TrendSnapshot,
    series: SeriesBody<'a>,
}

async fn analysis(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TickerQuery>,
) -> Response {
    let input = query.ticker.unwrap_or_default();
    let analysis = match run(&state, &input).await {
        Ok(Some(a)) => a,
        Ok(None) => return StatusCode::NO_CONTENT.into_response(),
        Err(e) => return error_response(&e),
    };

    let body = AnalysisResponse {
        ticker: analysis.ticker.as_str(),
        latest_close: analysis.snapshot.latest_close,
        report: Report::from_analysis(&analysis, &state.display),
        snapshot: &analysis.snapshot,
        series: SeriesBody {
            bars: analysis.series.bars(),
            emas: analysis
                .emas
                .lines()
                .iter()
                .map(|l| EmaSeriesBody {
                    period: l.period,
                    values: &l.values,
                })
                .collect(),
        },
    };
    Json(body).into_response()
}

// =============================================================================
// SVG chart
// =============================================================================

async fn chart(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TickerQuery>,
) -> Response {
    let input = query.ticker.unwrap_or_default();
    match run(&state, &input).await {
        Ok(Some(a)) => (
            [(header::CONTENT_TYPE, "image/svg+xml")],
            render_svg_chart(&a, &state.display),
        )
            .into_response(),
        Ok(None) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(&e),
    }
}

// =============================================================================
// Plain-text report
// =============================================================================

async fn text_report(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TickerQuery>,
) -> Response {
    let input = query.ticker.unwrap_or_default();
    match run(&state, &input).await {
        Ok(Some(a)) => (
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            Report::from_analysis(&a, &state.display).to_text(),
        )
            .into_response(),
        Ok(None) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(&e),
    }
}
