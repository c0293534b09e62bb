// =============================================================================
// Bollinger Bands
// =============================================================================
//
// Bollinger Bands consist of a middle band (rolling mean), an upper band
// (middle + k*σ), and a lower band (middle - k*σ), where σ is the rolling
// sample standard deviation.
//
// Both statistics use a relaxed minimum-period rule: the middle band is
// defined from the first close using however many samples are available, the
// bands from the second.

use super::rolling::{rolling_mean_relaxed, rolling_std_relaxed};

/// Aligned Bollinger columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BollingerBands {
    pub middle: Vec<Option<f64>>,
    pub upper: Vec<Option<f64>>,
    pub lower: Vec<Option<f64>>,
}

/// Calculate Bollinger Bands over `series`.
///
/// - `middle` = rolling mean over up to `window` samples (min periods 1)
/// - `upper`  = middle + `num_std` * σ
/// - `lower`  = middle - `num_std` * σ
pub fn bollinger(series: &[Option<f64>], window: usize, num_std: f64) -> BollingerBands {
    let middle = rolling_mean_relaxed(series, window, 1);
    let std = rolling_std_relaxed(series, window, 1);

    let (upper, lower) = middle
        .iter()
        .zip(std.iter())
        .map(|(m, s)| match (m, s) {
            (Some(m), Some(s)) => (Some(m + num_std * s), Some(m - num_std * s)),
            _ => (None, None),
        })
        .unzip();

    BollingerBands {
        middle,
        upper,
        lower,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bollinger_basic() {
        let closes: Vec<Option<f64>> = (1..=20).map(|x| Some(x as f64)).collect();
        let bb = bollinger(&closes, 20, 2.0);
        let last = 19;
        assert!((bb.middle[last].unwrap() - 10.5).abs() < 1e-12);
        assert!(bb.upper[last].unwrap() > bb.middle[last].unwrap());
        assert!(bb.lower[last].unwrap() < bb.middle[last].unwrap());
    }

    #[test]
    fn bollinger_middle_defined_from_first_sample() {
        let closes = vec![Some(10.0), Some(12.0), Some(14.0)];
        let bb = bollinger(&closes, 20, 2.0);
        assert_eq!(bb.middle, vec![Some(10.0), Some(11.0), Some(12.0)]);
        assert_eq!(bb.upper[0], None);
        assert_eq!(bb.lower[0], None);
        // σ of [10, 12] = sqrt(2)
        let half = 2.0 * 2.0_f64.sqrt();
        assert!((bb.upper[1].unwrap() - (11.0 + half)).abs() < 1e-12);
        assert!((bb.lower[1].unwrap() - (11.0 - half)).abs() < 1e-12);
    }

    #[test]
    fn bollinger_flat() {
        let bb = bollinger(&vec![Some(100.0); 30], 20, 2.0);
        for i in 1..30 {
            assert_eq!(bb.middle[i], Some(100.0));
            assert_eq!(bb.upper[i], Some(100.0));
            assert_eq!(bb.lower[i], Some(100.0));
        }
    }

    #[test]
    fn bollinger_empty() {
        let bb = bollinger(&[], 20, 2.0);
        assert!(bb.middle.is_empty() && bb.upper.is_empty() && bb.lower.is_empty());
    }
}
