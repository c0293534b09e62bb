use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// One daily OHLCV observation. Only `close` is consumed by the indicator
/// pipeline; every field is optional because vendors report gaps as nulls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<u64>,
}

impl Bar {
    /// Convenience constructor for a bar that only carries a close.
    pub fn close_only(date: NaiveDate, close: f64) -> Self {
        Self {
            date,
            open: None,
            high: None,
            low: None,
            close: Some(close),
            volume: None,
        }
    }
}

/// Ordered daily bars for one symbol.
///
/// Dates are strictly increasing with no duplicates; `PriceSeries::new`
/// enforces this by sorting and keeping the last bar seen for a date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSeries {
    symbol: String,
    bars: Vec<Bar>,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>, mut bars: Vec<Bar>) -> Self {
        // Stable sort keeps vendor order for equal dates, so the dedup below
        // retains the most recently reported bar.
        bars.sort_by_key(|b| b.date);
        let mut deduped: Vec<Bar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match deduped.last_mut() {
                Some(last) if last.date == bar.date => *last = bar,
                _ => deduped.push(bar),
            }
        }

        // Non-finite closes are treated as missing.
        for bar in &mut deduped {
            if bar.close.is_some_and(|c| !c.is_finite()) {
                bar.close = None;
            }
        }

        Self {
            symbol: symbol.into(),
            bars: deduped,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    /// The Close column with gaps preserved.
    pub fn closes(&self) -> Vec<Option<f64>> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// `(date, close)` pairs with missing closes removed, oldest first.
    pub fn observed_closes(&self) -> Vec<(NaiveDate, f64)> {
        self.bars
            .iter()
            .filter_map(|b| b.close.map(|c| (b.date, c)))
            .collect()
    }
}
