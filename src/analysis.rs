// =============================================================================
// Analysis Pipeline — one request, one pass
// =============================================================================
//
//   query ──validate──► AnalysisRequest
//         ──fetch─────► PriceSeries            (PriceSource, awaited)
//         ──compute───► IndicatorFrame          (plan from strategy + MACD flag)
//         ──decide────► Decision column + summary
//         ──forecast──► ForecastResult | forecast_error
//
// Nothing is retained between requests. A forecast failure does not abort the
// run; the rest of the report still renders.
// =============================================================================

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, info_span, warn, Instrument, Span};
use uuid::Uuid;

use std::sync::Arc;

use crate::forecast::{ForecastError, ForecastResult, Forecaster};
use crate::indicators::{IndicatorFrame, IndicatorPlan};
use crate::market_data::{PriceSeries, PriceSource, SourceError};
use crate::presentation::{build_charts, build_table, forecast_panel, ChartPanel, ChartSet, ExportError, Table};
use crate::runtime_config::RuntimeConfig;
use crate::strategy::{decide_all, SignalSummary};
use crate::types::{Signal, StrategyKind, UnknownStrategy};

// =============================================================================
// Errors
// =============================================================================

/// Input problems. The pipeline does not run when one of these is raised.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("symbol must not be empty")]
    EmptySymbol,

    #[error("Please choose a full date range")]
    PartialRange,

    #[error("invalid {field} date '{value}', expected YYYY-MM-DD")]
    InvalidDate { field: &'static str, value: String },

    #[error("start date {start} is after end date {end}")]
    StartAfterEnd { start: NaiveDate, end: NaiveDate },

    #[error("start date {start} is before the earliest supported date {earliest}")]
    BeforeEarliest { start: NaiveDate, earliest: NaiveDate },

    #[error("end date {end} is in the future (today is {today})")]
    InFuture { end: NaiveDate, today: NaiveDate },

    #[error(transparent)]
    Strategy(#[from] UnknownStrategy),
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Request(#[from] RequestError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Forecast(#[from] ForecastError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

// =============================================================================
// Request
// =============================================================================

/// Raw user input, as it arrives on the query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalysisQuery {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
    #[serde(default)]
    pub strategy: Option<String>,
    #[serde(default)]
    pub show_macd: Option<bool>,
}

/// Validated input for one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisRequest {
    pub symbol: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub strategy: StrategyKind,
    pub show_macd: bool,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, RequestError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| RequestError::InvalidDate {
        field,
        value: value.to_string(),
    })
}

impl AnalysisQuery {
    /// Fill defaults from `config` and validate against `today`.
    ///
    /// With neither date given the range is the configured trailing window
    /// ending today; with only one given the range is rejected.
    pub fn resolve(
        &self,
        config: &RuntimeConfig,
        today: NaiveDate,
    ) -> Result<AnalysisRequest, RequestError> {
        let symbol = match &self.symbol {
            None => config.default_symbol.trim().to_uppercase(),
            Some(raw) => raw.trim().to_uppercase(),
        };
        if symbol.is_empty() {
            return Err(RequestError::EmptySymbol);
        }

        let (start, end) = match (non_blank(&self.start), non_blank(&self.end)) {
            (None, None) => (today - Duration::days(config.default_range_days), today),
            (Some(start), Some(end)) => (parse_date("start", start)?, parse_date("end", end)?),
            _ => return Err(RequestError::PartialRange),
        };
        if start > end {
            return Err(RequestError::StartAfterEnd { start, end });
        }
        if start < config.earliest_date {
            return Err(RequestError::BeforeEarliest {
                start,
                earliest: config.earliest_date,
            });
        }
        if end > today {
            return Err(RequestError::InFuture { end, today });
        }

        let strategy = match non_blank(&self.strategy) {
            Some(raw) => raw.parse()?,
            None => config.strategy.default_strategy,
        };

        Ok(AnalysisRequest {
            symbol,
            start,
            end,
            strategy,
            show_macd: self.show_macd.unwrap_or(config.strategy.default_show_macd),
        })
    }
}

// =============================================================================
// Pipeline
// =============================================================================

/// Everything one run produced, before shaping for a consumer.
#[derive(Debug)]
pub struct Analysis {
    pub run_id: Uuid,
    pub request: AnalysisRequest,
    pub frame: IndicatorFrame,
    pub signals: Vec<Signal>,
    pub summary: SignalSummary,
    pub forecast: Option<Result<ForecastResult, ForecastError>>,
}

/// JSON report served by the analysis endpoint.
#[derive(Debug, Serialize)]
pub struct AnalysisReport {
    pub run_id: Uuid,
    pub request: AnalysisRequest,
    pub rows: usize,
    pub summary: SignalSummary,
    pub table: Table,
    pub charts: ChartSet,
    pub forecast: Option<ForecastResult>,
    pub forecast_error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ForecastReport {
    pub run_id: Uuid,
    pub symbol: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub forecast: ForecastResult,
    pub chart: ChartPanel,
}

async fn fetch(
    source: &dyn PriceSource,
    request: &AnalysisRequest,
) -> Result<PriceSeries, SourceError> {
    let series = source
        .fetch_daily(&request.symbol, request.start, request.end)
        .await?;
    if series.is_empty() {
        warn!(source = source.name(), "no bars in requested range");
    } else {
        info!(source = source.name(), bars = series.len(), "price history fetched");
    }
    Ok(series)
}

/// Fit the forecast on the blocking pool; the ridge solve is CPU-bound.
async fn run_forecast(
    forecaster: Arc<dyn Forecaster>,
    history: Vec<(NaiveDate, f64)>,
) -> Result<ForecastResult, ForecastError> {
    let span = Span::current();
    tokio::task::spawn_blocking(move || span.in_scope(|| forecaster.forecast(&history)))
        .await
        .map_err(|e| ForecastError::FitFailed(format!("forecast task failed: {e}")))?
}

/// Run the full pipeline. The forecast stage is skipped when
/// `with_forecast` is false (e.g. for the CSV export).
pub async fn analyze(
    source: &dyn PriceSource,
    forecaster: Arc<dyn Forecaster>,
    config: &RuntimeConfig,
    request: AnalysisRequest,
    with_forecast: bool,
) -> Result<Analysis, AnalysisError> {
    let run_id = Uuid::new_v4();
    let span = info_span!(
        "analysis",
        %run_id,
        symbol = %request.symbol,
        strategy = %request.strategy,
    );

    async move {
        let series = fetch(source, &request).await?;

        let plan = IndicatorPlan::for_strategy(request.strategy, request.show_macd);
        let frame = IndicatorFrame::build(series, plan, &config.indicators);
        let signals = decide_all(&frame, request.strategy, &config.strategy);
        let summary = SignalSummary::from_signals(&signals);

        let forecast = if with_forecast {
            let result = run_forecast(forecaster, frame.series().observed_closes()).await;
            if let Err(e) = &result {
                warn!(error = %e, "forecast failed");
            }
            Some(result)
        } else {
            None
        };

        info!(
            rows = frame.len(),
            buy = summary.buy,
            sell = summary.sell,
            hold = summary.hold,
            "analysis complete"
        );

        Ok::<_, AnalysisError>(Analysis {
            run_id,
            request,
            frame,
            signals,
            summary,
            forecast,
        })
    }
    .instrument(span)
    .await
}

/// Fetch and forecast only.
pub async fn forecast_only(
    source: &dyn PriceSource,
    forecaster: Arc<dyn Forecaster>,
    request: AnalysisRequest,
) -> Result<ForecastReport, AnalysisError> {
    let run_id = Uuid::new_v4();
    let span = info_span!("forecast", %run_id, symbol = %request.symbol);

    async move {
        let series = fetch(source, &request).await?;
        let forecast = run_forecast(forecaster, series.observed_closes()).await?;
        info!(horizon = forecast.horizon.len(), "forecast complete");

        Ok::<_, AnalysisError>(ForecastReport {
            run_id,
            chart: forecast_panel(&series, &forecast),
            symbol: request.symbol,
            start: request.start,
            end: request.end,
            forecast,
        })
    }
    .instrument(span)
    .await
}

impl Analysis {
    pub fn into_report(self, config: &RuntimeConfig) -> AnalysisReport {
        let (forecast, forecast_error) = match self.forecast {
            Some(Ok(f)) => (Some(f), None),
            Some(Err(e)) => (None, Some(e.to_string())),
            None => (None, None),
        };
        let table = build_table(&self.frame, &self.signals);
        let charts = build_charts(
            &self.frame,
            &self.signals,
            self.request.show_macd,
            forecast.as_ref(),
            &config.strategy,
        );

        AnalysisReport {
            run_id: self.run_id,
            rows: self.frame.len(),
            request: self.request,
            summary: self.summary,
            table,
            charts,
            forecast,
            forecast_error,
        }
    }
}
