// =============================================================================
// REST API Endpoints — Axum 0.7
// =============================================================================
//
// All endpoints live under `/api/v1/` and are read-only:
//
//   GET /api/v1/health
//   GET /api/v1/strategies
//   GET /api/v1/analysis?symbol&start&end&strategy&show_macd
//   GET /api/v1/analysis/csv?symbol&start&end&strategy&show_macd
//   GET /api/v1/forecast?symbol&start&end
//
// CORS is permissive; the dashboard front-end may be served from anywhere.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Json, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::analysis::{analyze, forecast_only, AnalysisError, AnalysisQuery};
use crate::app_state::AppState;
use crate::presentation::{csv_filename, to_csv};
use crate::types::StrategyKind;

type ApiError = (StatusCode, Json<serde_json::Value>);

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/strategies", get(strategies))
        .route("/api/v1/analysis", get(analysis))
        .route("/api/v1/analysis/csv", get(analysis_csv))
        .route("/api/v1/forecast", get(forecast))
        .layer(cors)
        .with_state(state)
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn error_response(err: AnalysisError) -> ApiError {
    let status = match &err {
        AnalysisError::Request(_) => StatusCode::BAD_REQUEST,
        AnalysisError::Source(_) => StatusCode::BAD_GATEWAY,
        AnalysisError::Forecast(_) => StatusCode::UNPROCESSABLE_ENTITY,
        AnalysisError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        warn!(status = status.as_u16(), error = %err, "request failed");
    } else {
        info!(status = status.as_u16(), error = %err, "request rejected");
    }
    (status, Json(serde_json::json!({ "error": err.to_string() })))
}

// =============================================================================
// Health
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    source: &'static str,
    requests_served: u64,
    uptime_secs: u64,
    server_time: i64,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        source: state.source.name(),
        requests_served: state.requests_served(),
        uptime_secs: state.uptime_secs(),
        server_time: Utc::now().timestamp_millis(),
    })
}

// =============================================================================
// Strategies
// =============================================================================

#[derive(Serialize)]
struct StrategyInfo {
    id: &'static str,
    label: &'static str,
}

#[derive(Serialize)]
struct StrategiesResponse {
    strategies: Vec<StrategyInfo>,
    default_strategy: StrategyKind,
    default_show_macd: bool,
    default_symbol: String,
    earliest_date: NaiveDate,
    rsi_oversold: f64,
    rsi_overbought: f64,
}

async fn strategies(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let cfg = &state.config;
    Json(StrategiesResponse {
        strategies: StrategyKind::ALL
            .iter()
            .map(|s| StrategyInfo {
                id: s.slug(),
                label: s.label(),
            })
            .collect(),
        default_strategy: cfg.strategy.default_strategy,
        default_show_macd: cfg.strategy.default_show_macd,
        default_symbol: cfg.default_symbol.clone(),
        earliest_date: cfg.earliest_date,
        rsi_oversold: cfg.strategy.rsi_oversold,
        rsi_overbought: cfg.strategy.rsi_overbought,
    })
}

// =============================================================================
// Analysis
// =============================================================================

async fn analysis(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AnalysisQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let seq = state.next_request();
    let request = query
        .resolve(&state.config, today())
        .map_err(|e| error_response(e.into()))?;
    info!(seq, symbol = %request.symbol, start = %request.start, end = %request.end, "analysis requested");

    let result = analyze(
        state.source.as_ref(),
        state.forecaster.clone(),
        &state.config,
        request,
        true,
    )
    .await
    .map_err(error_response)?;

    Ok(Json(result.into_report(&state.config)))
}

async fn analysis_csv(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AnalysisQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let seq = state.next_request();
    let request = query
        .resolve(&state.config, today())
        .map_err(|e| error_response(e.into()))?;
    info!(seq, symbol = %request.symbol, "csv export requested");

    let result = analyze(
        state.source.as_ref(),
        state.forecaster.clone(),
        &state.config,
        request,
        false,
    )
    .await
    .map_err(error_response)?;

    let body = to_csv(&result.frame, &result.signals).map_err(|e| error_response(e.into()))?;
    let disposition = format!(
        "attachment; filename=\"{}\"",
        csv_filename(&result.request.symbol)
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}

// =============================================================================
// Forecast
// =============================================================================

async fn forecast(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AnalysisQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let seq = state.next_request();
    let request = query
        .resolve(&state.config, today())
        .map_err(|e| error_response(e.into()))?;
    info!(seq, symbol = %request.symbol, "forecast requested");

    let report = forecast_only(state.source.as_ref(), state.forecaster.clone(), request)
        .await
        .map_err(error_response)?;
    Ok(Json(report))
}
