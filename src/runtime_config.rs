// =============================================================================
// Runtime Configuration — dashboard settings with atomic save
// =============================================================================
//
// Every tunable of the dashboard lives here: where to listen, where to fetch
// history from, indicator windows, decision thresholds and the forecast
// model's knobs.
//
// Persistence uses an atomic tmp + rename pattern to prevent corruption on
// crash. All fields carry `#[serde(default)]` so that adding new fields
// never breaks loading an older config file.
//
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::types::StrategyKind;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_bind_addr() -> String {
    "0.0.0.0:8050".to_string()
}

fn default_symbol() -> String {
    "AAPL".to_string()
}

fn default_earliest_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or_default()
}

fn default_range_days() -> i64 {
    365
}

fn default_yahoo_base_url() -> String {
    crate::yahoo::client::DEFAULT_BASE_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

// =============================================================================
// IndicatorSettings
// =============================================================================

/// Window sizes and decay spans for every derived column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorSettings {
    pub ema_short_span: usize,
    pub ema_long_span: usize,
    pub rsi_window: usize,
    pub sma_fast_window: usize,
    pub sma_slow_window: usize,
    pub bollinger_window: usize,
    /// Band half-width in standard deviations.
    pub bollinger_num_std: f64,
    pub macd_fast_span: usize,
    pub macd_slow_span: usize,
    pub macd_signal_span: usize,
}

impl Default for IndicatorSettings {
    fn default() -> Self {
        Self {
            ema_short_span: 10,
            ema_long_span: 50,
            rsi_window: 14,
            sma_fast_window: 10,
            sma_slow_window: 50,
            bollinger_window: 20,
            bollinger_num_std: 2.0,
            macd_fast_span: 12,
            macd_slow_span: 26,
            macd_signal_span: 9,
        }
    }
}

// =============================================================================
// StrategySettings
// =============================================================================

/// Decision thresholds and the selector defaults shown in the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategySettings {
    /// RSI strictly below this => BUY.
    pub rsi_oversold: f64,
    /// RSI strictly above this => SELL.
    pub rsi_overbought: f64,
    pub default_strategy: StrategyKind,
    pub default_show_macd: bool,
}

impl Default for StrategySettings {
    fn default() -> Self {
        Self {
            rsi_oversold: 30.0,
            rsi_overbought: 70.0,
            default_strategy: StrategyKind::Rsi,
            default_show_macd: false,
        }
    }
}

// =============================================================================
// ForecastSettings
// =============================================================================

/// How seasonal and holiday effects combine with the trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeasonalityMode {
    Additive,
    /// Effects scale with the trend; fitted in log space.
    Multiplicative,
}

impl Default for SeasonalityMode {
    fn default() -> Self {
        Self::Additive
    }
}

/// Spacing of the future dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HorizonFrequency {
    /// Every calendar day.
    Daily,
    /// Monday to Friday only.
    Business,
}

impl Default for HorizonFrequency {
    fn default() -> Self {
        Self::Daily
    }
}

/// A periodic Fourier component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalitySpec {
    pub name: String,
    pub period_days: f64,
    pub fourier_order: usize,
}

impl SeasonalitySpec {
    pub fn new(name: impl Into<String>, period_days: f64, fourier_order: usize) -> Self {
        Self {
            name: name.into(),
            period_days,
            fourier_order,
        }
    }
}

/// A user-supplied holiday with an optional window of affected days around
/// it (`lower_window` is zero or negative).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HolidaySpec {
    pub name: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub lower_window: i64,
    #[serde(default)]
    pub upper_window: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastSettings {
    /// Number of future periods past the last observation.
    pub horizon: usize,
    pub frequency: HorizonFrequency,
    /// Coverage of the uncertainty band (0.95 => 95 %).
    pub interval_width: f64,
    pub seasonality_mode: SeasonalityMode,
    /// Number of potential trend changepoints.
    pub n_changepoints: usize,
    /// Fraction of history in which changepoints may be placed.
    pub changepoint_range: f64,
    /// Larger values let the trend bend more easily.
    pub changepoint_prior_scale: f64,
    /// Larger values let seasonal terms fit larger swings.
    pub seasonality_prior_scale: f64,
    pub holidays_prior_scale: f64,
    /// Ridge penalty applied to every coefficient.
    pub regularization: f64,
    /// Add a yearly component once history spans at least two years.
    pub auto_yearly: bool,
    pub seasonalities: Vec<SeasonalitySpec>,
    /// Built-in holiday calendar to include ("US" is supported).
    pub country_holidays: Option<String>,
    pub holidays: Vec<HolidaySpec>,
}

impl Default for ForecastSettings {
    fn default() -> Self {
        Self {
            horizon: 30,
            frequency: HorizonFrequency::Daily,
            interval_width: 0.95,
            seasonality_mode: SeasonalityMode::Additive,
            n_changepoints: 25,
            changepoint_range: 0.8,
            changepoint_prior_scale: 0.05,
            seasonality_prior_scale: 10.0,
            holidays_prior_scale: 10.0,
            regularization: 0.01,
            auto_yearly: true,
            seasonalities: vec![
                SeasonalitySpec::new("weekly", 7.0, 3),
                SeasonalitySpec::new("monthly", 30.5, 5),
            ],
            country_holidays: None,
            holidays: Vec::new(),
        }
    }
}

// =============================================================================
// RuntimeConfig
// =============================================================================

/// Top-level configuration for the dashboard service.
///
/// Every field has a serde default so that older JSON files missing new fields
/// will still deserialise correctly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Address the HTTP API listens on.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Symbol pre-filled when a request omits one.
    #[serde(default = "default_symbol")]
    pub default_symbol: String,

    /// Earliest start date a request may ask for.
    #[serde(default = "default_earliest_date")]
    pub earliest_date: NaiveDate,

    /// Length of the default range ending today.
    #[serde(default = "default_range_days")]
    pub default_range_days: i64,

    #[serde(default = "default_yahoo_base_url")]
    pub yahoo_base_url: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default)]
    pub indicators: IndicatorSettings,

    #[serde(default)]
    pub strategy: StrategySettings,

    #[serde(default)]
    pub forecast: ForecastSettings,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            default_symbol: default_symbol(),
            earliest_date: default_earliest_date(),
            default_range_days: default_range_days(),
            yahoo_base_url: default_yahoo_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            indicators: IndicatorSettings::default(),
            strategy: StrategySettings::default(),
            forecast: ForecastSettings::default(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse config from {}", path.display()))?;

        info!(
            path = %path.display(),
            bind_addr = %config.bind_addr,
            default_symbol = %config.default_symbol,
            "runtime config loaded"
        );

        Ok(config)
    }

    /// Persist the current configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content =
            serde_json::to_string_pretty(self).context("failed to serialise config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "runtime config saved (atomic)");
        Ok(())
    }

    /// Apply `STOCK_LENS_*` environment overrides on top of the file values.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(addr) = lookup("STOCK_LENS_BIND_ADDR").filter(|s| !s.trim().is_empty()) {
            self.bind_addr = addr.trim().to_string();
        }
        if let Some(sym) = lookup("STOCK_LENS_DEFAULT_SYMBOL").filter(|s| !s.trim().is_empty()) {
            self.default_symbol = sym.trim().to_uppercase();
        }
        if let Some(url) = lookup("STOCK_LENS_YAHOO_BASE_URL").filter(|s| !s.trim().is_empty()) {
            self.yahoo_base_url = url.trim().to_string();
        }
        if let Some(raw) = lookup("STOCK_LENS_REQUEST_TIMEOUT_SECS") {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => self.request_timeout_secs = secs,
                _ => warn!(value = %raw, "ignoring invalid STOCK_LENS_REQUEST_TIMEOUT_SECS"),
            }
        }
    }
}
