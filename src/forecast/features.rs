// =============================================================================
// Design matrix for the additive model
// =============================================================================
//
// Each row of the matrix describes one date:
//
//   [ 1, t, hinge_1 .. hinge_K, fourier terms .., holiday indicators .. ]
//
//   t:        time scaled to [0, 1] over the observed history
//   hinge_k:  max(0, t - c_k) * changepoint_prior_scale, one per changepoint
//   fourier:  sin / cos(2πnT / P) * seasonality_prior_scale for n = 1..order,
//              T in days since the UNIX epoch
//   holiday:  1 on affected dates, scaled by holidays_prior_scale
//
// Scaling a column by s under a uniform ridge penalty is equivalent to a prior
// of width s on its effect, which is how the prior scales act.
// =============================================================================

use std::collections::BTreeSet;
use std::f64::consts::PI;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use tracing::debug;

use super::holidays::holiday_dates;
use super::ForecastError;
use crate::runtime_config::{ForecastSettings, HorizonFrequency, SeasonalitySpec};

/// History must span this many days before a yearly term is added.
const YEARLY_MIN_SPAN_DAYS: f64 = 730.0;

/// Two distinct dates pin down intercept and slope.
pub const MIN_ROWS: usize = 2;

#[derive(Debug, Clone)]
pub struct DesignSpec {
    origin: NaiveDate,
    span_days: f64,
    changepoints: Vec<f64>,
    changepoint_scale: f64,
    seasonalities: Vec<SeasonalitySpec>,
    seasonality_scale: f64,
    holidays: Vec<(String, BTreeSet<NaiveDate>)>,
    holiday_scale: f64,
}

impl DesignSpec {
    /// Lay out the columns for a history with the given (sorted) `dates`,
    /// extending holiday coverage to `horizon_end`.
    pub fn new(
        dates: &[NaiveDate],
        settings: &ForecastSettings,
        horizon_end: NaiveDate,
    ) -> Result<Self, ForecastError> {
        let (origin, last) = match (dates.first(), dates.last()) {
            (Some(first), Some(last)) if dates.len() >= MIN_ROWS && last > first => {
                (*first, *last)
            }
            _ => {
                return Err(ForecastError::InsufficientData {
                    required: MIN_ROWS,
                    got: dates.len(),
                })
            }
        };
        let span_days = (last - origin).num_days() as f64;

        let mut seasonalities: Vec<SeasonalitySpec> = settings
            .seasonalities
            .iter()
            .filter(|s| {
                let keep = s.fourier_order > 0 && s.period_days > 0.0 && span_days >= s.period_days;
                if !keep {
                    debug!(name = %s.name, span_days, "seasonality skipped for short history");
                }
                keep
            })
            .cloned()
            .collect();
        if settings.auto_yearly
            && span_days >= YEARLY_MIN_SPAN_DAYS
            && !seasonalities.iter().any(|s| s.name == "yearly")
        {
            seasonalities.push(SeasonalitySpec::new("yearly", 365.25, 10));
        }

        let holiday_map = holiday_dates(
            settings.country_holidays.as_deref(),
            &settings.holidays,
            origin.year(),
            horizon_end.year(),
        )
        .map_err(ForecastError::InvalidSettings)?;

        // A holiday that never touches the history cannot be estimated.
        let observed: BTreeSet<NaiveDate> = dates.iter().copied().collect();
        let mut holidays: Vec<(String, BTreeSet<NaiveDate>)> = holiday_map
            .into_iter()
            .filter(|(_, days)| days.iter().any(|d| observed.contains(d)))
            .collect();

        // The system must stay overdetermined: fewer columns than rows.
        // Holidays go first, then the longest seasonalities.
        let rows = dates.len();
        while 2 + fourier_width(&seasonalities) + holidays.len() >= rows {
            if holidays.pop().is_none() && seasonalities.pop().is_none() {
                break;
            }
        }
        let fixed = 2 + fourier_width(&seasonalities) + holidays.len();
        let changepoints = changepoint_positions(
            dates,
            origin,
            span_days,
            settings.n_changepoints.min(rows.saturating_sub(fixed + 1)),
            settings.changepoint_range,
        );

        Ok(Self {
            origin,
            span_days,
            changepoints,
            changepoint_scale: settings.changepoint_prior_scale,
            seasonalities,
            seasonality_scale: settings.seasonality_prior_scale,
            holidays,
            holiday_scale: settings.holidays_prior_scale,
        })
    }

    /// Scaled time of `date` relative to the history.
    pub fn scaled_time(&self, date: NaiveDate) -> f64 {
        (date - self.origin).num_days() as f64 / self.span_days
    }

    pub fn width(&self) -> usize {
        2 + self.changepoints.len() + fourier_width(&self.seasonalities) + self.holidays.len()
    }

    /// Feature row for `date`.
    pub fn row(&self, date: NaiveDate) -> Vec<f64> {
        let t = self.scaled_time(date);
        let mut row = Vec::with_capacity(self.width());

        row.push(1.0);
        row.push(t);
        for &c in &self.changepoints {
            row.push((t - c).max(0.0) * self.changepoint_scale);
        }

        let epoch_days = days_since_epoch(date);
        for s in &self.seasonalities {
            for n in 1..=s.fourier_order {
                let angle = 2.0 * PI * n as f64 * epoch_days / s.period_days;
                row.push(angle.sin() * self.seasonality_scale);
                row.push(angle.cos() * self.seasonality_scale);
            }
        }

        for (_, days) in &self.holidays {
            let hit = if days.contains(&date) { 1.0 } else { 0.0 };
            row.push(hit * self.holiday_scale);
        }

        row
    }

    /// Seasonal and holiday component names, in column order.
    pub fn component_names(&self) -> Vec<String> {
        self.seasonalities
            .iter()
            .map(|s| s.name.clone())
            .chain(self.holidays.iter().map(|(name, _)| name.clone()))
            .collect()
    }

    pub fn changepoint_count(&self) -> usize {
        self.changepoints.len()
    }
}

/// Evenly spaced changepoints over the first `range` fraction of history,
/// excluding the very first observation.
fn changepoint_positions(
    dates: &[NaiveDate],
    origin: NaiveDate,
    span_days: f64,
    n_changepoints: usize,
    range: f64,
) -> Vec<f64> {
    let hist_size = (dates.len() as f64 * range.clamp(0.0, 1.0)).floor() as usize;
    let n = n_changepoints.min(hist_size.saturating_sub(1));
    if n == 0 {
        return Vec::new();
    }

    let last_idx = (hist_size - 1) as f64;
    (1..=n)
        .map(|k| {
            let idx = (k as f64 * last_idx / n as f64).round() as usize;
            (dates[idx] - origin).num_days() as f64 / span_days
        })
        .collect()
}

fn fourier_width(seasonalities: &[SeasonalitySpec]) -> usize {
    seasonalities.iter().map(|s| 2 * s.fourier_order).sum()
}

fn days_since_epoch(date: NaiveDate) -> f64 {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default();
    (date - epoch).num_days() as f64
}

/// `n` dates strictly after `last`, spaced by `frequency`.
pub fn future_dates(last: NaiveDate, n: usize, frequency: HorizonFrequency) -> Vec<NaiveDate> {
    let mut out = Vec::with_capacity(n);
    let mut date = last;
    while out.len() < n {
        date += Duration::days(1);
        let weekend = matches!(date.weekday(), Weekday::Sat | Weekday::Sun);
        if frequency == HorizonFrequency::Business && weekend {
            continue;
        }
        out.push(date);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime_config::HolidaySpec;

    fn days(start: NaiveDate, n: usize) -> Vec<NaiveDate> {
        (0..n).map(|i| start + Duration::days(i as i64)).collect()
    }

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    #[test]
    fn rejects_single_date() {
        let err = DesignSpec::new(&[start()], &ForecastSettings::default(), start()).unwrap_err();
        assert!(matches!(err, ForecastError::InsufficientData { got: 1, .. }));
    }

    #[test]
    fn width_matches_row_length() {
        let dates = days(start(), 120);
        let spec = DesignSpec::new(&dates, &ForecastSettings::default(), dates[119]).unwrap();
        // 2 trend + 25 hinges + weekly(6) + monthly(10)
        assert_eq!(spec.width(), 2 + 25 + 6 + 10);
        assert_eq!(spec.row(dates[10]).len(), spec.width());
        assert_eq!(spec.component_names(), vec!["weekly", "monthly"]);
    }

    #[test]
    fn scaled_time_spans_unit_interval() {
        let dates = days(start(), 11);
        let spec = DesignSpec::new(&dates, &ForecastSettings::default(), dates[10]).unwrap();
        assert_eq!(spec.scaled_time(dates[0]), 0.0);
        assert_eq!(spec.scaled_time(dates[10]), 1.0);
        assert!(spec.scaled_time(dates[10] + Duration::days(5)) > 1.0);
    }

    #[test]
    fn short_history_drops_long_seasonalities() {
        let dates = days(start(), 10);
        let spec = DesignSpec::new(&dates, &ForecastSettings::default(), dates[9]).unwrap();
        assert_eq!(spec.component_names(), vec!["weekly"]);
    }

    #[test]
    fn yearly_added_for_long_history() {
        let dates = days(start(), 800);
        let spec = DesignSpec::new(&dates, &ForecastSettings::default(), dates[799]).unwrap();
        assert!(spec.component_names().contains(&"yearly".to_string()));
    }

    #[test]
    fn changepoints_within_range() {
        let dates = days(start(), 100);
        let cps = changepoint_positions(&dates, dates[0], 99.0, 25, 0.8);
        assert_eq!(cps.len(), 25);
        assert!(cps.iter().all(|c| *c > 0.0 && *c <= 0.8));
        assert!(cps.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn column_budget_stays_below_row_count() {
        let dates = days(start(), 12);
        let spec = DesignSpec::new(&dates, &ForecastSettings::default(), dates[11]).unwrap();
        assert!(spec.width() < dates.len());
        assert_eq!(spec.component_names(), vec!["weekly"]);

        let tiny = days(start(), 4);
        let spec = DesignSpec::new(&tiny, &ForecastSettings::default(), tiny[3]).unwrap();
        assert_eq!(spec.width(), 3);

        let pair = days(start(), 2);
        let spec = DesignSpec::new(&pair, &ForecastSettings::default(), pair[1]).unwrap();
        assert_eq!(spec.width(), 2);
        assert_eq!(spec.changepoint_count(), 0);
        assert!(spec.component_names().is_empty());
    }

    #[test]
    fn few_points_limit_changepoints() {
        let dates = days(start(), 5);
        // hist_size = 4 => at most 3 changepoints
        assert_eq!(changepoint_positions(&dates, dates[0], 4.0, 25, 0.8).len(), 3);
    }

    #[test]
    fn holiday_columns_only_when_observed() {
        let dates = days(start(), 60);
        let settings = ForecastSettings {
            holidays: vec![
                HolidaySpec {
                    name: "inside".into(),
                    date: dates[20],
                    lower_window: 0,
                    upper_window: 0,
                },
                HolidaySpec {
                    name: "outside".into(),
                    date: dates[59] + Duration::days(10),
                    lower_window: 0,
                    upper_window: 0,
                },
            ],
            ..ForecastSettings::default()
        };
        let spec = DesignSpec::new(&dates, &settings, dates[59] + Duration::days(30)).unwrap();
        let names = spec.component_names();
        assert!(names.contains(&"inside".to_string()));
        assert!(!names.contains(&"outside".to_string()));

        let row = spec.row(dates[20]);
        assert_eq!(*row.last().unwrap(), settings.holidays_prior_scale);
    }

    #[test]
    fn future_dates_daily_and_business() {
        // 2024-01-05 is a Friday.
        let friday = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let daily = future_dates(friday, 3, HorizonFrequency::Daily);
        assert_eq!(daily[0], friday + Duration::days(1));
        assert_eq!(daily.len(), 3);

        let business = future_dates(friday, 3, HorizonFrequency::Business);
        assert_eq!(
            business,
            vec![
                friday + Duration::days(3),
                friday + Duration::days(4),
                friday + Duration::days(5)
            ]
        );
    }
}
