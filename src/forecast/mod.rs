// =============================================================================
// Forecast Module
// =============================================================================
//
// Univariate price forecasting behind the `Forecaster` seam:
// - additive trend + seasonality + holiday model (ridge-fitted)
// - Fourier / changepoint design matrix construction
// - built-in holiday calendars

pub mod additive;
pub mod features;
pub mod holidays;

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

pub use additive::AdditiveForecaster;

/// One dated model output with its uncertainty band.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub yhat: f64,
    pub yhat_lower: f64,
    pub yhat_upper: f64,
}

/// In-sample fit plus the forward horizon.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastResult {
    /// Model values on every observed date.
    pub fitted: Vec<ForecastPoint>,
    /// Future points, strictly after the last observed date.
    pub horizon: Vec<ForecastPoint>,
    /// Coverage of the band, e.g. 0.95.
    pub interval_width: f64,
    /// Names of the seasonal and holiday components that were fitted.
    pub components: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("need at least {required} observations to fit a forecast, got {got}")]
    InsufficientData { required: usize, got: usize },

    #[error("multiplicative seasonality requires strictly positive prices")]
    NonPositiveValues,

    #[error("invalid forecast settings: {0}")]
    InvalidSettings(String),

    #[error("model fit failed: {0}")]
    FitFailed(String),
}

/// Fits a model to `(date, close)` observations and projects it forward.
pub trait Forecaster: Send + Sync {
    fn forecast(&self, history: &[(NaiveDate, f64)]) -> Result<ForecastResult, ForecastError>;
}
