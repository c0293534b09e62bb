// =============================================================================
// Price Source — seam between the pipeline and the history vendor
// =============================================================================

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::market_data::PriceSeries;

/// Errors reported by a `PriceSource`. They are propagated to the caller
/// unchanged; the pipeline never retries.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request to price vendor failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("price vendor returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("symbol '{0}' not found or has no data in the requested range")]
    NotFound(String),

    #[error("malformed vendor response: {0}")]
    Malformed(String),

    #[error("invalid vendor base URL '{0}'")]
    InvalidBaseUrl(String),
}

/// Fetches daily bars for a symbol over an inclusive date range.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn fetch_daily(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, SourceError>;

    /// Short identifier used in logs.
    fn name(&self) -> &'static str;
}
