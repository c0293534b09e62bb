// =============================================================================
// Exponential Moving Average (EMA)
// =============================================================================
//
// EMA gives more weight to recent prices, making it more responsive to new
// information than the Simple Moving Average (SMA).
//
// Formula (no initial-window adjustment):
//   alpha  = 2 / (span + 1)
//   EMA_0  = close_0
//   EMA_t  = alpha * close_t + (1 - alpha) * EMA_{t-1}
//
// The first defined close seeds the recurrence exactly. A gap in the input
// yields a gap in the output; the recurrence resumes from the last defined
// EMA value when data returns.
// =============================================================================

/// Compute the EMA series for `series` with the given `span`.
///
/// Output is aligned with the input.
///
/// # Edge cases
/// - empty input => empty vec
/// - `span == 0` => all-missing output (alpha would exceed 1)
/// - leading gaps stay missing until the first defined sample
pub fn ema(series: &[Option<f64>], span: usize) -> Vec<Option<f64>> {
    if span == 0 {
        return vec![None; series.len()];
    }

    let alpha = 2.0 / (span as f64 + 1.0);
    let mut prev: Option<f64> = None;

    series
        .iter()
        .map(|sample| {
            let value = (*sample)?;
            let next = match prev {
                None => value,
                Some(p) => alpha * value + (1.0 - alpha) * p,
            };
            prev = Some(next);
            Some(next)
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn some(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().copied().map(Some).collect()
    }

    #[test]
    fn ema_empty_input() {
        assert!(ema(&[], 10).is_empty());
    }

    #[test]
    fn ema_span_zero() {
        assert_eq!(ema(&some(&[1.0, 2.0]), 0), vec![None, None]);
    }

    #[test]
    fn ema_seeds_with_first_value() {
        let out = ema(&some(&[10.0, 20.0]), 3);
        // alpha = 0.5
        assert_eq!(out[0], Some(10.0));
        assert!((out[1].unwrap() - 15.0).abs() < 1e-12);
    }

    #[test]
    fn ema_known_values() {
        let closes: Vec<f64> = (1..=10).map(|x| x as f64).collect();
        let out = ema(&some(&closes), 5);
        assert_eq!(out.len(), 10);

        let alpha = 2.0 / 6.0;
        let mut expected = 1.0;
        for (i, &c) in closes.iter().enumerate() {
            if i > 0 {
                expected = alpha * c + (1.0 - alpha) * expected;
            }
            let got = out[i].unwrap();
            assert!((got - expected).abs() < 1e-10, "got {got}, expected {expected}");
        }
    }

    #[test]
    fn ema_constant_series_is_constant() {
        let out = ema(&vec![Some(42.0); 60], 50);
        for v in out {
            assert!((v.unwrap() - 42.0).abs() < 1e-12);
        }
    }

    #[test]
    fn ema_gap_propagates_and_resumes() {
        let series = vec![None, Some(10.0), None, Some(20.0)];
        let out = ema(&series, 3);
        assert_eq!(out[0], None);
        assert_eq!(out[1], Some(10.0));
        assert_eq!(out[2], None);
        // Resumes from 10.0 with alpha 0.5.
        assert!((out[3].unwrap() - 15.0).abs() < 1e-12);
    }
}
