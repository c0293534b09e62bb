// =============================================================================
// Additive Forecaster — trend + seasonality + holidays
// =============================================================================
//
// Pipeline:
//   1. Validate history and settings
//   2. Transform y (log for multiplicative mode) and scale by max |y|
//   3. Build the design matrix over history and horizon dates
//   4. Ridge fit (smartcore, Cholesky) on the history rows
//   5. Predict every row, un-scale, and attach the uncertainty band:
//        half_width = z * σ_resid * sqrt(1 + h / n)
//      where z is the normal quantile for the interval width and h is the
//      horizon step (0 for in-sample points)
// =============================================================================

use chrono::NaiveDate;
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::linear::ridge_regression::{
    RidgeRegression, RidgeRegressionParameters, RidgeRegressionSolverName,
};
use statrs::distribution::{ContinuousCDF, Normal};
use statrs::statistics::{Data, Distribution};
use tracing::{debug, info};

use super::features::{future_dates, DesignSpec};
use super::{ForecastError, ForecastPoint, ForecastResult, Forecaster};
use crate::runtime_config::{ForecastSettings, SeasonalityMode};

/// Minimum number of observations the model accepts.
const MIN_OBSERVATIONS: usize = super::features::MIN_ROWS;

#[derive(Debug, Clone)]
pub struct AdditiveForecaster {
    settings: ForecastSettings,
}

impl AdditiveForecaster {
    pub fn new(settings: ForecastSettings) -> Self {
        Self { settings }
    }

    fn validate(&self) -> Result<(), ForecastError> {
        let s = &self.settings;
        if s.horizon == 0 {
            return Err(ForecastError::InvalidSettings("horizon must be positive".into()));
        }
        if s.interval_width.is_nan() || s.interval_width <= 0.0 || s.interval_width >= 1.0 {
            return Err(ForecastError::InvalidSettings(format!(
                "interval_width must be in (0, 1), got {}",
                s.interval_width
            )));
        }
        if s.regularization.is_nan() || s.regularization <= 0.0 {
            return Err(ForecastError::InvalidSettings(
                "regularization must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Normal quantile for a two-sided interval of the configured width.
    fn z_score(&self) -> Result<f64, ForecastError> {
        let normal = Normal::new(0.0, 1.0)
            .map_err(|e| ForecastError::FitFailed(format!("normal distribution: {e}")))?;
        Ok(normal.inverse_cdf(0.5 + self.settings.interval_width / 2.0))
    }
}

impl Forecaster for AdditiveForecaster {
    fn forecast(&self, history: &[(NaiveDate, f64)]) -> Result<ForecastResult, ForecastError> {
        self.validate()?;

        let history: Vec<(NaiveDate, f64)> = history
            .iter()
            .copied()
            .filter(|(_, y)| y.is_finite())
            .collect();
        if history.len() < MIN_OBSERVATIONS {
            return Err(ForecastError::InsufficientData {
                required: MIN_OBSERVATIONS,
                got: history.len(),
            });
        }

        // ── 1. Transform & scale ─────────────────────────────────────────
        let multiplicative = self.settings.seasonality_mode == SeasonalityMode::Multiplicative;
        let transformed: Vec<f64> = if multiplicative {
            if history.iter().any(|(_, y)| *y <= 0.0) {
                return Err(ForecastError::NonPositiveValues);
            }
            history.iter().map(|(_, y)| y.ln()).collect()
        } else {
            history.iter().map(|(_, y)| *y).collect()
        };

        let y_scale = transformed
            .iter()
            .fold(0.0_f64, |acc, y| acc.max(y.abs()));
        let y_scale = if y_scale > 0.0 { y_scale } else { 1.0 };
        let y_scaled: Vec<f64> = transformed.iter().map(|y| y / y_scale).collect();

        // ── 2. Design matrix ─────────────────────────────────────────────
        let dates: Vec<NaiveDate> = history.iter().map(|(d, _)| *d).collect();
        let last = dates[dates.len() - 1];
        let future = future_dates(last, self.settings.horizon, self.settings.frequency);
        let horizon_end = future.last().copied().unwrap_or(last);

        let spec = DesignSpec::new(&dates, &self.settings, horizon_end)?;
        debug!(
            observations = dates.len(),
            columns = spec.width(),
            changepoints = spec.changepoint_count(),
            components = ?spec.component_names(),
            "design matrix laid out"
        );

        let train_rows: Vec<Vec<f64>> = dates.iter().map(|d| spec.row(*d)).collect();
        let future_rows: Vec<Vec<f64>> = future.iter().map(|d| spec.row(*d)).collect();

        // ── 3. Fit ───────────────────────────────────────────────────────
        let x_train = DenseMatrix::from_2d_vec(&train_rows)
            .map_err(|e| ForecastError::FitFailed(format!("matrix error: {e}")))?;
        let x_future = DenseMatrix::from_2d_vec(&future_rows)
            .map_err(|e| ForecastError::FitFailed(format!("matrix error: {e}")))?;

        let (fit_rows, fit_y, alpha) =
            penalised_system(train_rows, y_scaled, spec.width(), self.settings.regularization);
        let x_fit = DenseMatrix::from_2d_vec(&fit_rows)
            .map_err(|e| ForecastError::FitFailed(format!("matrix error: {e}")))?;

        let params = RidgeRegressionParameters::default()
            .with_alpha(alpha)
            .with_solver(RidgeRegressionSolverName::Cholesky)
            .with_normalize(false);

        let model: RidgeRegression<f64, f64, DenseMatrix<f64>, Vec<f64>> =
            RidgeRegression::fit(&x_fit, &fit_y, params)
                .map_err(|e| ForecastError::FitFailed(e.to_string()))?;

        let fitted_scaled = model
            .predict(&x_train)
            .map_err(|e| ForecastError::FitFailed(e.to_string()))?;
        let future_scaled = model
            .predict(&x_future)
            .map_err(|e| ForecastError::FitFailed(e.to_string()))?;

        // ── 4. Uncertainty ───────────────────────────────────────────────
        let fitted_t: Vec<f64> = fitted_scaled.iter().map(|v| v * y_scale).collect();
        let future_t: Vec<f64> = future_scaled.iter().map(|v| v * y_scale).collect();

        let residuals: Vec<f64> = transformed
            .iter()
            .zip(fitted_t.iter())
            .map(|(y, f)| y - f)
            .collect();
        let sigma = Data::new(residuals).std_dev().unwrap_or(0.0);
        if !sigma.is_finite() {
            return Err(ForecastError::FitFailed("residual spread is not finite".into()));
        }
        let z = self.z_score()?;
        let n = dates.len() as f64;

        let to_point = |date: NaiveDate, value: f64, step: usize| -> Result<ForecastPoint, ForecastError> {
            let half = z * sigma * (1.0 + step as f64 / n).sqrt();
            let (yhat, lower, upper) = if multiplicative {
                (value.exp(), (value - half).exp(), (value + half).exp())
            } else {
                (value, value - half, value + half)
            };
            if !(yhat.is_finite() && lower.is_finite() && upper.is_finite()) {
                return Err(ForecastError::FitFailed(format!(
                    "non-finite prediction at {date}"
                )));
            }
            Ok(ForecastPoint {
                date,
                yhat,
                yhat_lower: lower,
                yhat_upper: upper,
            })
        };

        let fitted = dates
            .iter()
            .zip(fitted_t.iter())
            .map(|(d, v)| to_point(*d, *v, 0))
            .collect::<Result<Vec<_>, _>>()?;
        let horizon = future
            .iter()
            .zip(future_t.iter())
            .enumerate()
            .map(|(i, (d, v))| to_point(*d, *v, i + 1))
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            observations = dates.len(),
            horizon = horizon.len(),
            residual_sigma = sigma,
            mode = ?self.settings.seasonality_mode,
            "forecast fitted"
        );

        Ok(ForecastResult {
            fitted,
            horizon,
            interval_width: self.settings.interval_width,
            components: spec.component_names(),
        })
    }
}

/// Rows, targets and solver alpha for the ridge fit.
///
/// The solver needs more rows than columns. When the history is too short,
/// half the penalty moves into `width` rows of `sqrt(alpha / 2) * e_j` with a
/// zero target, which leaves the total penalty at `alpha`.
fn penalised_system(
    mut rows: Vec<Vec<f64>>,
    mut y: Vec<f64>,
    width: usize,
    alpha: f64,
) -> (Vec<Vec<f64>>, Vec<f64>, f64) {
    if rows.len() > width {
        return (rows, y, alpha);
    }
    let half = alpha / 2.0;
    for j in 0..width {
        let mut row = vec![0.0; width];
        row[j] = half.sqrt();
        rows.push(row);
        y.push(0.0);
    }
    (rows, y, half)
}
