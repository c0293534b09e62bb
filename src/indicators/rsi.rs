// =============================================================================
// Relative Strength Index (RSI) — rolling-sum variant
// =============================================================================
//
// RSI measures the balance of recent gains against recent losses.
//
// Step 1: delta_t = close_t - close_{t-1}          (missing at t = 0)
// Step 2: U_t = max(delta_t, 0),  D_t = max(-delta_t, 0)
// Step 3: U_SUM / D_SUM = rolling sums of U / D over `window` samples
// Step 4: RS  = U_SUM / D_SUM
//          RSI = 100 - 100 / (1 + RS)
//
// Saturation: when D_SUM is exactly zero, RS takes the sentinel value 100 and
// RSI is pinned to 100. RSI is never NaN or infinite.
// =============================================================================

use super::rolling::rolling_sum;

/// Sentinel RS value used when the loss sum is zero.
pub const RS_SATURATION: f64 = 100.0;

/// Every intermediate column of the RSI computation, aligned with the input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RsiColumns {
    pub delta: Vec<Option<f64>>,
    pub up: Vec<Option<f64>>,
    pub down: Vec<Option<f64>>,
    pub up_sum: Vec<Option<f64>>,
    pub down_sum: Vec<Option<f64>>,
    pub rs: Vec<Option<f64>>,
    pub rsi: Vec<Option<f64>>,
}

/// Compute RSI and its intermediate columns.
///
/// # Edge cases
/// - empty input => all columns empty
/// - `window == 0` => sums, RS and RSI are all missing
/// - first `window` rows are missing (the first delta is undefined)
pub fn rsi_columns(series: &[Option<f64>], window: usize) -> RsiColumns {
    let delta: Vec<Option<f64>> = (0..series.len())
        .map(|i| {
            if i == 0 {
                return None;
            }
            Some(series[i]? - series[i - 1]?)
        })
        .collect();

    let up: Vec<Option<f64>> = delta.iter().map(|d| d.map(|x| x.max(0.0))).collect();
    let down: Vec<Option<f64>> = delta.iter().map(|d| d.map(|x| (-x).max(0.0))).collect();

    let up_sum = rolling_sum(&up, window);
    let down_sum = rolling_sum(&down, window);

    let (rs, rsi): (Vec<Option<f64>>, Vec<Option<f64>>) = up_sum
        .iter()
        .zip(down_sum.iter())
        .map(|(u, d)| match (u, d) {
            (Some(u), Some(d)) => {
                let (rs, rsi) = rsi_from_sums(*u, *d);
                (Some(rs), Some(rsi))
            }
            _ => (None, None),
        })
        .unzip();

    RsiColumns {
        delta,
        up,
        down,
        up_sum,
        down_sum,
        rs,
        rsi,
    }
}

// =============================================================================
// Internal helpers
// =============================================================================

/// Convert gain / loss sums into `(RS, RSI)`.
///
/// - loss sum zero => (100, 100): saturation, including the no-movement case
/// - otherwise     => RS = gain / loss, RSI in [0, 100)
fn rsi_from_sums(up_sum: f64, down_sum: f64) -> (f64, f64) {
    if down_sum == 0.0 {
        return (RS_SATURATION, 100.0);
    }
    let rs = up_sum / down_sum;
    (rs, 100.0 - 100.0 / (1.0 + rs))
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

    fn rsi(series: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
        rsi_columns(series, window).rsi
    }

    #[test]
    fn rsi_empty_input() {
        let cols = rsi_columns(&[], 14);
        assert!(cols.rsi.is_empty());
        assert!(cols.delta.is_empty());
    }

    #[test]
    fn rsi_window_zero_is_missing() {
        let out = rsi(&some(&[1.0, 2.0, 3.0]), 0);
        assert_eq!(out, vec![None, None, None]);
    }

    #[test]
    fn rsi_flat_prices_saturate() {
        // 20 identical prices: missing before index 14, exactly 100 after.
        let out = rsi(&vec![Some(50.0); 20], 14);
        assert_eq!(out.len(), 20);
        for (i, v) in out.iter().enumerate() {
            if i < 14 {
                assert!(v.is_none(), "index {i} should be missing");
            } else {
                assert_eq!(*v, Some(100.0), "index {i}");
            }
        }
    }

    #[test]
    fn rsi_all_gains() {
        let closes: Vec<f64> = (1..=30).map(|x| x as f64).collect();
        let cols = rsi_columns(&some(&closes), 14);
        for i in 14..30 {
            assert_eq!(cols.rsi[i], Some(100.0));
            assert_eq!(cols.rs[i], Some(RS_SATURATION));
            assert_eq!(cols.down_sum[i], Some(0.0));
        }
    }

    #[test]
    fn rsi_all_losses() {
        let closes: Vec<f64> = (1..=30).rev().map(|x| x as f64).collect();
        let out = rsi(&some(&closes), 14);
        for v in &out[14..] {
            assert!(v.unwrap().abs() < 1e-10, "expected 0.0, got {v:?}");
        }
    }

    #[test]
    fn rsi_known_value() {
        // Alternating +2 / -1 moves: over 14 deltas, 7 gains of 2 and 7 losses of 1.
        let mut closes = vec![100.0];
        for i in 0..14 {
            let last = *closes.last().unwrap();
            closes.push(if i % 2 == 0 { last + 2.0 } else { last - 1.0 });
        }
        let cols = rsi_columns(&some(&closes), 14);
        assert_eq!(cols.up_sum[14], Some(14.0));
        assert_eq!(cols.down_sum[14], Some(7.0));
        assert_eq!(cols.rs[14], Some(2.0));
        let expected = 100.0 - 100.0 / 3.0;
        assert!((cols.rsi[14].unwrap() - expected).abs() < 1e-10);
    }

    #[test]
    fn rsi_intermediate_columns() {
        let cols = rsi_columns(&some(&[10.0, 12.0, 11.0]), 2);
        assert_eq!(cols.delta, vec![None, Some(2.0), Some(-1.0)]);
        assert_eq!(cols.up, vec![None, Some(2.0), Some(0.0)]);
        assert_eq!(cols.down, vec![None, Some(0.0), Some(1.0)]);
        assert_eq!(cols.up_sum, vec![None, None, Some(2.0)]);
        assert_eq!(cols.down_sum, vec![None, None, Some(1.0)]);
    }

    #[test]
    fn rsi_gap_propagates() {
        let mut series = some(&(1..=20).map(|x| x as f64).collect::<Vec<_>>());
        series[5] = None;
        let out = rsi(&series, 3);
        // Deltas at 5 and 6 are missing, so windows covering them are missing.
        assert!(out[5].is_none() && out[6].is_none() && out[7].is_none() && out[8].is_none());
        assert_eq!(out[9], Some(100.0));
    }

    #[test]
    fn rsi_range_check() {
        let closes = vec![
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08, 45.89, 46.03,
            44.18, 44.22, 44.57, 43.42, 42.66, 43.13,
        ];
        for v in rsi(&some(&closes), 14).into_iter().flatten() {
            assert!((0.0..=100.0).contains(&v), "RSI {v} out of range");
        }
    }
}
