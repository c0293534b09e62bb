// =============================================================================
// Indicator Frame — PriceSeries augmented with named derived columns
// =============================================================================
//
// Columns are stored in insertion order so that the table, the CSV export and
// the chart builder all see the same layout. Every column is aligned with the
// bars of the underlying series.
// =============================================================================

use chrono::NaiveDate;
use serde::{Serialize, Serializer};

use super::{bollinger::bollinger, ema::ema, macd::macd, rsi::rsi_columns, sma::sma};
use crate::market_data::{Bar, PriceSeries};
use crate::runtime_config::IndicatorSettings;
use crate::types::StrategyKind;

/// Every derived column the engine can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    EmaShort,
    EmaLong,
    Delta,
    Up,
    Down,
    UpSum,
    DownSum,
    Rs,
    Rsi,
    SmaFast,
    SmaSlow,
    BollingerMiddle,
    BollingerUpper,
    BollingerLower,
    EmaFast,
    EmaSlow,
    Macd,
    SignalLine,
}

impl Column {
    /// Header used in the table and the CSV export.
    ///
    /// Names reflect the default windows; they stay fixed when the windows
    /// are reconfigured so downstream consumers see a stable schema.
    pub fn name(&self) -> &'static str {
        match self {
            Self::EmaShort => "EMA_10",
            Self::EmaLong => "EMA_50",
            Self::Delta => "Delta",
            Self::Up => "U",
            Self::Down => "D",
            Self::UpSum => "U_SUM",
            Self::DownSum => "D_SUM",
            Self::Rs => "RS",
            Self::Rsi => "RSI",
            Self::SmaFast => "SMA_10",
            Self::SmaSlow => "SMA_50",
            Self::BollingerMiddle => "BB_Middle",
            Self::BollingerUpper => "BB_Upper",
            Self::BollingerLower => "BB_Lower",
            Self::EmaFast => "EMA_12",
            Self::EmaSlow => "EMA_26",
            Self::Macd => "MACD",
            Self::SignalLine => "Signal_Line",
        }
    }
}

impl std::fmt::Display for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Column {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Which optional indicator groups a run needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct IndicatorPlan {
    pub sma: bool,
    pub bollinger: bool,
    pub macd: bool,
}

impl IndicatorPlan {
    /// Columns required by `strategy`, plus MACD when it is shown.
    pub fn for_strategy(strategy: StrategyKind, show_macd: bool) -> Self {
        Self {
            sma: strategy == StrategyKind::Sma,
            bollinger: strategy == StrategyKind::BollingerBands,
            macd: show_macd || strategy == StrategyKind::Macd,
        }
    }
}

/// A price series plus its derived columns.
#[derive(Debug, Clone)]
pub struct IndicatorFrame {
    series: PriceSeries,
    columns: Vec<(Column, Vec<Option<f64>>)>,
}

impl IndicatorFrame {
    /// Compute the base columns (EMA pair and the RSI chain) and whatever
    /// optional groups `plan` asks for.
    pub fn build(series: PriceSeries, plan: IndicatorPlan, settings: &IndicatorSettings) -> Self {
        let closes = series.closes();
        let mut frame = Self {
            series,
            columns: Vec::new(),
        };

        frame.push(Column::EmaShort, ema(&closes, settings.ema_short_span));
        frame.push(Column::EmaLong, ema(&closes, settings.ema_long_span));

        let rsi = rsi_columns(&closes, settings.rsi_window);
        frame.push(Column::Delta, rsi.delta);
        frame.push(Column::Up, rsi.up);
        frame.push(Column::Down, rsi.down);
        frame.push(Column::UpSum, rsi.up_sum);
        frame.push(Column::DownSum, rsi.down_sum);
        frame.push(Column::Rs, rsi.rs);
        frame.push(Column::Rsi, rsi.rsi);

        if plan.sma {
            frame.push(Column::SmaFast, sma(&closes, settings.sma_fast_window));
            frame.push(Column::SmaSlow, sma(&closes, settings.sma_slow_window));
        }

        if plan.bollinger {
            let bb = bollinger(&closes, settings.bollinger_window, settings.bollinger_num_std);
            frame.push(Column::BollingerMiddle, bb.middle);
            frame.push(Column::BollingerUpper, bb.upper);
            frame.push(Column::BollingerLower, bb.lower);
        }

        if plan.macd {
            let m = macd(
                &closes,
                settings.macd_fast_span,
                settings.macd_slow_span,
                settings.macd_signal_span,
            );
            frame.push(Column::EmaFast, m.ema_fast);
            frame.push(Column::EmaSlow, m.ema_slow);
            frame.push(Column::Macd, m.macd);
            frame.push(Column::SignalLine, m.signal_line);
        }

        frame
    }

    fn push(&mut self, column: Column, values: Vec<Option<f64>>) {
        debug_assert_eq!(values.len(), self.series.len(), "column {column} misaligned");
        self.columns.push((column, values));
    }

    pub fn series(&self) -> &PriceSeries {
        &self.series
    }

    pub fn bars(&self) -> &[Bar] {
        self.series.bars()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.series.dates()
    }

    /// Column names in insertion order.
    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|(c, _)| c.name()).collect()
    }

    pub fn columns(&self) -> impl Iterator<Item = (Column, &[Option<f64>])> {
        self.columns.iter().map(|(c, v)| (*c, v.as_slice()))
    }

    pub fn has(&self, column: Column) -> bool {
        self.columns.iter().any(|(c, _)| *c == column)
    }

    pub fn column(&self, column: Column) -> Option<&[Option<f64>]> {
        self.columns
            .iter()
            .find(|(c, _)| *c == column)
            .map(|(_, v)| v.as_slice())
    }

    /// Value of `column` at `row`; missing when the column was not computed,
    /// the row is out of range, or the lookback is not yet satisfied.
    pub fn value(&self, column: Column, row: usize) -> Option<f64> {
        self.column(column)?.get(row).copied().flatten()
    }

    pub fn close(&self, row: usize) -> Option<f64> {
        self.series.bars().get(row).and_then(|b| b.close)
    }
}
