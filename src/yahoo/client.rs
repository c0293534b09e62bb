// =============================================================================
// Yahoo Finance Chart API Client — daily history retrieval
// =============================================================================
//
// Uses the public v8 chart endpoint. No credentials are required, but the
// endpoint rejects requests without a browser-like User-Agent.
// =============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Url;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::market_data::{Bar, PriceSeries, PriceSource, SourceError};

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Yahoo Finance REST client.
#[derive(Clone)]
pub struct YahooClient {
    base_url: Url,
    client: reqwest::Client,
}

impl YahooClient {
    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    /// Create a client against `base_url` with the given request timeout.
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Result<Self, SourceError> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));

        let client = reqwest::Client::builder()
            .default_headers(default_headers)
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()?;

        let raw = base_url.into();
        let base_url = Url::parse(raw.trim_end_matches('/'))
            .ok()
            .filter(|u| !u.cannot_be_a_base())
            .ok_or_else(|| SourceError::InvalidBaseUrl(raw.clone()))?;
        debug!(base_url = %base_url, "YahooClient initialised");

        Ok(Self { base_url, client })
    }

    // -------------------------------------------------------------------------
    // History
    // -------------------------------------------------------------------------

    /// `{base}/v8/finance/chart/{symbol}` with the symbol percent-encoded as
    /// a single path segment.
    fn chart_url(&self, symbol: &str) -> Result<Url, SourceError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| SourceError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(["v8", "finance", "chart", symbol]);
        Ok(url)
    }

    /// GET /v8/finance/chart/{symbol} with a daily interval.
    ///
    /// `end` is inclusive: the request window closes at midnight UTC of the
    /// following day.
    #[instrument(skip(self), name = "yahoo::get_daily_bars")]
    pub async fn get_daily_bars(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, SourceError> {
        let period1 = midnight_utc(start);
        let period2 = midnight_utc(end + Duration::days(1));
        let url = self.chart_url(symbol)?;

        let resp = self
            .client
            .get(url)
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
                ("events", "history".to_string()),
                ("includeAdjustedClose", "true".to_string()),
            ])
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        let envelope: ChartEnvelope = match serde_json::from_str(&body) {
            Ok(env) => env,
            Err(e) if status.is_success() => {
                return Err(SourceError::Malformed(format!("chart response: {e}")));
            }
            Err(_) => {
                return Err(SourceError::Api {
                    status: status.as_u16(),
                    message: truncate(&body, 200),
                });
            }
        };

        if let Some(err) = envelope.chart.error {
            warn!(symbol, code = %err.code, "Yahoo chart error");
            if err.code.eq_ignore_ascii_case("Not Found") {
                return Err(SourceError::NotFound(symbol.to_string()));
            }
            return Err(SourceError::Api {
                status: status.as_u16(),
                message: format!("{}: {}", err.code, err.description),
            });
        }

        if !status.is_success() {
            return Err(SourceError::Api {
                status: status.as_u16(),
                message: truncate(&body, 200),
            });
        }

        let result = envelope
            .chart
            .result
            .and_then(|mut r| if r.is_empty() { None } else { Some(r.swap_remove(0)) })
            .ok_or_else(|| SourceError::NotFound(symbol.to_string()))?;

        // Exchange-local dating can push a bar just outside the window.
        let bars: Vec<Bar> = bars_from_result(&result)?
            .into_iter()
            .filter(|b| b.date >= start && b.date <= end)
            .collect();
        debug!(symbol, count = bars.len(), "daily bars fetched");
        Ok(PriceSeries::new(symbol, bars))
    }
}

#[async_trait]
impl PriceSource for YahooClient {
    async fn fetch_daily(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, SourceError> {
        self.get_daily_bars(symbol, start, end).await
    }

    fn name(&self) -> &'static str {
        "yahoo"
    }
}

impl std::fmt::Debug for YahooClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YahooClient")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Wire format
// -----------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    /// Exchange offset from UTC in seconds; bars are dated in exchange time.
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Default, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

// -----------------------------------------------------------------------------
// Internal helpers
// -----------------------------------------------------------------------------

fn bars_from_result(result: &ChartResult) -> Result<Vec<Bar>, SourceError> {
    if result.timestamp.is_empty() {
        return Ok(Vec::new());
    }

    let quote = result
        .indicators
        .quote
        .first()
        .ok_or_else(|| SourceError::Malformed("chart result has no quote block".into()))?;

    let at = |col: &[Option<f64>], i: usize| col.get(i).copied().flatten();

    let mut bars = Vec::with_capacity(result.timestamp.len());
    for (i, &ts) in result.timestamp.iter().enumerate() {
        let local = DateTime::from_timestamp(ts + result.meta.gmtoffset, 0)
            .ok_or_else(|| SourceError::Malformed(format!("timestamp {ts} out of range")))?;
        bars.push(Bar {
            date: local.date_naive(),
            open: at(&quote.open, i),
            high: at(&quote.high, i),
            low: at(&quote.low, i),
            close: at(&quote.close, i),
            volume: at(&quote.volume, i).filter(|v| *v >= 0.0).map(|v| v as u64),
        });
    }
    Ok(bars)
}

fn midnight_utc(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or_default()
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &s[..end])
}
