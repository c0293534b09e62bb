// =============================================================================
// Rolling-window primitives
// =============================================================================
//
// Building blocks shared by SMA, RSI and Bollinger Bands. All functions take
// an aligned series with gaps (`Option<f64>`) and return a series of the same
// length. Two minimum-period conventions exist:
//
//   strict:  the window must hold `window` defined samples, otherwise the
//              output is missing (SMA, RSI sums).
//   relaxed: the output is defined once `min_periods` defined samples are
//              present in the trailing window (Bollinger Bands).
// =============================================================================

/// Sum of the trailing `window` samples; missing until the window is full or
/// whenever it contains a gap.
pub fn rolling_sum(series: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    strict_window(series, window, |values| values.iter().sum())
}

/// Mean of the trailing `window` samples under the strict convention.
pub fn rolling_mean(series: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    strict_window(series, window, |values| {
        values.iter().sum::<f64>() / values.len() as f64
    })
}

/// Mean of the defined samples among the trailing `window`, defined once at
/// least `min_periods` of them are present.
pub fn rolling_mean_relaxed(
    series: &[Option<f64>],
    window: usize,
    min_periods: usize,
) -> Vec<Option<f64>> {
    relaxed_window(series, window, min_periods.max(1), |values| {
        values.iter().sum::<f64>() / values.len() as f64
    })
}

/// Sample standard deviation (n − 1 denominator) of the defined samples among
/// the trailing `window`. Needs at least two samples regardless of
/// `min_periods`.
pub fn rolling_std_relaxed(
    series: &[Option<f64>],
    window: usize,
    min_periods: usize,
) -> Vec<Option<f64>> {
    relaxed_window(series, window, min_periods.max(2), |values| {
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
        // Rounding can push a zero variance slightly negative.
        var.max(0.0).sqrt()
    })
}

// -----------------------------------------------------------------------------
// Internal helpers
// -----------------------------------------------------------------------------

fn strict_window(
    series: &[Option<f64>],
    window: usize,
    reduce: impl Fn(&[f64]) -> f64,
) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; series.len()];
    }

    let mut out = Vec::with_capacity(series.len());
    let mut buf = Vec::with_capacity(window);
    for i in 0..series.len() {
        if i + 1 < window {
            out.push(None);
            continue;
        }
        buf.clear();
        let complete = series[i + 1 - window..=i].iter().all(|v| match v {
            Some(x) => {
                buf.push(*x);
                true
            }
            None => false,
        });
        out.push(if complete { Some(reduce(&buf)) } else { None });
    }
    out
}

fn relaxed_window(
    series: &[Option<f64>],
    window: usize,
    min_periods: usize,
    reduce: impl Fn(&[f64]) -> f64,
) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; series.len()];
    }

    let mut out = Vec::with_capacity(series.len());
    let mut buf = Vec::with_capacity(window);
    for i in 0..series.len() {
        let from = (i + 1).saturating_sub(window);
        buf.clear();
        buf.extend(series[from..=i].iter().flatten());
        out.push(if buf.len() >= min_periods {
            Some(reduce(&buf))
        } else {
            None
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn some(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().copied().map(Some).collect()
    }

    #[test]
    fn rolling_sum_strict() {
        let out = rolling_sum(&some(&[1.0, 2.0, 3.0, 4.0]), 3);
        assert_eq!(out, vec![None, None, Some(6.0), Some(9.0)]);
    }

    #[test]
    fn rolling_sum_gap_poisons_window() {
        let series = vec![Some(1.0), None, Some(3.0), Some(4.0), Some(5.0)];
        let out = rolling_sum(&series, 2);
        assert_eq!(out, vec![None, None, None, Some(7.0), Some(9.0)]);
    }

    #[test]
    fn zero_window_is_all_missing() {
        assert_eq!(rolling_sum(&some(&[1.0, 2.0]), 0), vec![None, None]);
        assert_eq!(rolling_mean_relaxed(&some(&[1.0]), 0, 1), vec![None]);
    }

    #[test]
    fn relaxed_mean_defined_from_first_sample() {
        let out = rolling_mean_relaxed(&some(&[2.0, 4.0, 6.0, 8.0]), 3, 1);
        assert_eq!(out, vec![Some(2.0), Some(3.0), Some(4.0), Some(6.0)]);
    }

    #[test]
    fn relaxed_mean_skips_gaps() {
        let series = vec![Some(2.0), None, Some(4.0)];
        let out = rolling_mean_relaxed(&series, 3, 1);
        assert_eq!(out, vec![Some(2.0), Some(2.0), Some(3.0)]);
    }

    #[test]
    fn relaxed_std_needs_two_samples() {
        let out = rolling_std_relaxed(&some(&[1.0, 3.0, 5.0]), 20, 1);
        assert_eq!(out[0], None);
        // sample std of [1, 3] = sqrt(2)
        assert!((out[1].unwrap() - 2.0_f64.sqrt()).abs() < 1e-12);
        // sample std of [1, 3, 5] = 2
        assert!((out[2].unwrap() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn empty_input() {
        assert!(rolling_sum(&[], 14).is_empty());
        assert!(rolling_std_relaxed(&[], 20, 1).is_empty());
    }
}
