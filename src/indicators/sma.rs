// =============================================================================
// Simple Moving Average (SMA)
// =============================================================================

use super::rolling::rolling_mean;

/// Arithmetic mean of the trailing `window` closes.
///
/// The first `window - 1` outputs are missing, as is any output whose window
/// contains a gap.
pub fn sma(series: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    rolling_mean(series, window)
}
