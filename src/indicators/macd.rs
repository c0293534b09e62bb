// =============================================================================
// Moving Average Convergence Divergence (MACD)
// =============================================================================
//
//   MACD        = EMA(fast) - EMA(slow)
//   Signal_Line = EMA(MACD, signal)
// =============================================================================

use super::ema::ema;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MacdColumns {
    pub ema_fast: Vec<Option<f64>>,
    pub ema_slow: Vec<Option<f64>>,
    pub macd: Vec<Option<f64>>,
    pub signal_line: Vec<Option<f64>>,
}

pub fn macd(series: &[Option<f64>], fast: usize, slow: usize, signal: usize) -> MacdColumns {
    let ema_fast = ema(series, fast);
    let ema_slow = ema(series, slow);

    let macd: Vec<Option<f64>> = ema_fast
        .iter()
        .zip(ema_slow.iter())
        .map(|(f, s)| Some((*f)? - (*s)?))
        .collect();

    let signal_line = ema(&macd, signal);

    MacdColumns {
        ema_fast,
        ema_slow,
        macd,
        signal_line,
    }
}
