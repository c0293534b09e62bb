// =============================================================================
// Decision Engine — per-row BUY / SELL / HOLD
// =============================================================================
//
// A stateless classifier: each row of the indicator frame is projected into a
// `RuleInput` carrying only the fields the selected strategy reads, and a
// single `match` turns it into a `Signal`. No cross-row memory, no position
// tracking.
//
// Any missing input makes the rule non-satisfiable, which resolves to HOLD.
// =============================================================================

use serde::Serialize;
use tracing::debug;

use crate::indicators::{Column, IndicatorFrame};
use crate::runtime_config::StrategySettings;
use crate::types::{Signal, StrategyKind};

// =============================================================================
// Rule inputs
// =============================================================================

/// One row's view of the frame, shaped by the active strategy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RuleInput {
    Rsi {
        rsi: Option<f64>,
    },
    Sma {
        fast: Option<f64>,
        slow: Option<f64>,
    },
    Bollinger {
        close: Option<f64>,
        lower: Option<f64>,
        upper: Option<f64>,
    },
    Macd {
        macd: Option<f64>,
        signal_line: Option<f64>,
    },
}

impl RuleInput {
    /// Project row `row` of `frame` for `strategy`.
    pub fn from_frame(frame: &IndicatorFrame, strategy: StrategyKind, row: usize) -> Self {
        match strategy {
            StrategyKind::Rsi => Self::Rsi {
                rsi: frame.value(Column::Rsi, row),
            },
            StrategyKind::Sma => Self::Sma {
                fast: frame.value(Column::SmaFast, row),
                slow: frame.value(Column::SmaSlow, row),
            },
            StrategyKind::BollingerBands => Self::Bollinger {
                close: frame.close(row),
                lower: frame.value(Column::BollingerLower, row),
                upper: frame.value(Column::BollingerUpper, row),
            },
            StrategyKind::Macd => Self::Macd {
                macd: frame.value(Column::Macd, row),
                signal_line: frame.value(Column::SignalLine, row),
            },
        }
    }
}

// =============================================================================
// Decision rules
// =============================================================================

/// Map one row to a signal. First matching rule wins; everything else is HOLD.
pub fn decide(input: RuleInput, settings: &StrategySettings) -> Signal {
    match input {
        RuleInput::Rsi { rsi: Some(rsi) } => {
            if rsi < settings.rsi_oversold {
                Signal::Buy
            } else if rsi > settings.rsi_overbought {
                Signal::Sell
            } else {
                Signal::Hold
            }
        }
        RuleInput::Sma {
            fast: Some(fast),
            slow: Some(slow),
        } => crossover(fast, slow),
        RuleInput::Bollinger {
            close: Some(close),
            lower,
            upper,
        } => {
            if lower.is_some_and(|l| close < l) {
                Signal::Buy
            } else if upper.is_some_and(|u| close > u) {
                Signal::Sell
            } else {
                Signal::Hold
            }
        }
        RuleInput::Macd {
            macd: Some(macd),
            signal_line: Some(signal_line),
        } => crossover(macd, signal_line),
        _ => Signal::Hold,
    }
}

fn crossover(lead: f64, reference: f64) -> Signal {
    if lead > reference {
        Signal::Buy
    } else if lead < reference {
        Signal::Sell
    } else {
        Signal::Hold
    }
}

/// The Decision column for the whole frame.
pub fn decide_all(
    frame: &IndicatorFrame,
    strategy: StrategyKind,
    settings: &StrategySettings,
) -> Vec<Signal> {
    let signals: Vec<Signal> = (0..frame.len())
        .map(|row| decide(RuleInput::from_frame(frame, strategy, row), settings))
        .collect();

    debug!(
        strategy = %strategy,
        rows = signals.len(),
        "decision column computed"
    );
    signals
}

// =============================================================================
// Summary
// =============================================================================

/// Row counts per signal for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SignalSummary {
    pub buy: usize,
    pub sell: usize,
    pub hold: usize,
    /// Signal on the most recent row, if any.
    pub latest: Option<Signal>,
}

impl SignalSummary {
    pub fn from_signals(signals: &[Signal]) -> Self {
        let mut summary = Self {
            latest: signals.last().copied(),
            ..Self::default()
        };
        for s in signals {
            match s {
                Signal::Buy => summary.buy += 1,
                Signal::Sell => summary.sell += 1,
                Signal::Hold => summary.hold += 1,
            }
        }
        summary
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::IndicatorPlan;
    use crate::market_data::{Bar, PriceSeries};
    use crate::runtime_config::IndicatorSettings;
    use chrono::NaiveDate;

    fn settings() -> StrategySettings {
        StrategySettings::default()
    }

    #[test]
    fn rsi_rule() {
        let s = settings();
        assert_eq!(decide(RuleInput::Rsi { rsi: Some(25.0) }, &s), Signal::Buy);
        assert_eq!(decide(RuleInput::Rsi { rsi: Some(75.0) }, &s), Signal::Sell);
        assert_eq!(decide(RuleInput::Rsi { rsi: Some(50.0) }, &s), Signal::Hold);
        // Boundaries are exclusive.
        assert_eq!(decide(RuleInput::Rsi { rsi: Some(30.0) }, &s), Signal::Hold);
        assert_eq!(decide(RuleInput::Rsi { rsi: Some(70.0) }, &s), Signal::Hold);
        assert_eq!(decide(RuleInput::Rsi { rsi: None }, &s), Signal::Hold);
    }

    #[test]
    fn sma_rule() {
        let s = settings();
        let sma = |fast, slow| RuleInput::Sma { fast, slow };
        assert_eq!(decide(sma(Some(105.0), Some(100.0)), &s), Signal::Buy);
        assert_eq!(decide(sma(Some(95.0), Some(100.0)), &s), Signal::Sell);
        assert_eq!(decide(sma(Some(100.0), Some(100.0)), &s), Signal::Hold);
        assert_eq!(decide(sma(Some(105.0), None), &s), Signal::Hold);
        assert_eq!(decide(sma(None, Some(100.0)), &s), Signal::Hold);
    }

    #[test]
    fn bollinger_rule() {
        let s = settings();
        let bb = |close, lower, upper| RuleInput::Bollinger {
            close: Some(close),
            lower: Some(lower),
            upper: Some(upper),
        };
        assert_eq!(decide(bb(90.0, 95.0, 105.0), &s), Signal::Buy);
        assert_eq!(decide(bb(110.0, 95.0, 105.0), &s), Signal::Sell);
        assert_eq!(decide(bb(100.0, 95.0, 105.0), &s), Signal::Hold);

        let missing_close = RuleInput::Bollinger {
            close: None,
            lower: Some(95.0),
            upper: Some(105.0),
        };
        assert_eq!(decide(missing_close, &s), Signal::Hold);

        let missing_bands = RuleInput::Bollinger {
            close: Some(90.0),
            lower: None,
            upper: None,
        };
        assert_eq!(decide(missing_bands, &s), Signal::Hold);
    }

    #[test]
    fn macd_rule() {
        let s = settings();
        let m = |macd, signal_line| RuleInput::Macd { macd, signal_line };
        assert_eq!(decide(m(Some(1.0), Some(0.5)), &s), Signal::Buy);
        assert_eq!(decide(m(Some(-1.0), Some(0.5)), &s), Signal::Sell);
        assert_eq!(decide(m(Some(0.5), Some(0.5)), &s), Signal::Hold);
        assert_eq!(decide(m(None, Some(0.5)), &s), Signal::Hold);
    }

    #[test]
    fn custom_thresholds() {
        let s = StrategySettings {
            rsi_oversold: 20.0,
            rsi_overbought: 80.0,
            ..StrategySettings::default()
        };
        assert_eq!(decide(RuleInput::Rsi { rsi: Some(25.0) }, &s), Signal::Hold);
        assert_eq!(decide(RuleInput::Rsi { rsi: Some(15.0) }, &s), Signal::Buy);
    }

    fn frame(closes: &[f64], strategy: StrategyKind) -> IndicatorFrame {
        let start = NaiveDate::from_ymd_opt(2023, 6, 1).unwrap();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar::close_only(start + chrono::Duration::days(i as i64), c))
            .collect();
        IndicatorFrame::build(
            PriceSeries::new("T", bars),
            IndicatorPlan::for_strategy(strategy, false),
            &IndicatorSettings::default(),
        )
    }

    #[test]
    fn decide_all_rsi_on_rising_series() {
        let closes: Vec<f64> = (1..=30).map(|x| x as f64).collect();
        let f = frame(&closes, StrategyKind::Rsi);
        let signals = decide_all(&f, StrategyKind::Rsi, &settings());
        assert_eq!(signals.len(), 30);
        // Lookback not satisfied => HOLD; afterwards RSI = 100 => SELL.
        assert!(signals[..14].iter().all(|s| *s == Signal::Hold));
        assert!(signals[14..].iter().all(|s| *s == Signal::Sell));
    }

    #[test]
    fn decide_all_sma_on_falling_series() {
        let closes: Vec<f64> = (1..=60).rev().map(|x| x as f64).collect();
        let f = frame(&closes, StrategyKind::Sma);
        let signals = decide_all(&f, StrategyKind::Sma, &settings());
        assert!(signals[..49].iter().all(|s| *s == Signal::Hold));
        assert!(signals[49..].iter().all(|s| *s == Signal::Sell));
    }

    #[test]
    fn decide_all_without_required_columns_holds() {
        // MACD strategy on a frame built without MACD columns.
        let closes: Vec<f64> = (1..=30).map(|x| x as f64).collect();
        let f = frame(&closes, StrategyKind::Rsi);
        let signals = decide_all(&f, StrategyKind::Macd, &settings());
        assert!(signals.iter().all(|s| *s == Signal::Hold));
    }

    #[test]
    fn decide_all_empty_frame() {
        let f = frame(&[], StrategyKind::BollingerBands);
        assert!(decide_all(&f, StrategyKind::BollingerBands, &settings()).is_empty());
    }

    #[test]
    fn summary_counts() {
        let summary =
            SignalSummary::from_signals(&[Signal::Buy, Signal::Hold, Signal::Hold, Signal::Sell]);
        assert_eq!(summary.buy, 1);
        assert_eq!(summary.sell, 1);
        assert_eq!(summary.hold, 2);
        assert_eq!(summary.latest, Some(Signal::Sell));
        assert_eq!(SignalSummary::from_signals(&[]).latest, None);
    }
}
