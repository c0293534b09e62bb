use chrono::NaiveDate;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::indicators::{Column, IndicatorFrame};
use crate::types::Signal;

/// Indicator values of one row, serialised as an ordered JSON object.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorValues(pub Vec<(Column, Option<f64>)>);

impl Serialize for IndicatorValues {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (column, value) in &self.0 {
            map.serialize_entry(column.name(), value)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<u64>,
    pub indicators: IndicatorValues,
    pub decision: Signal,
}

/// Tabular view of the analysed frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub columns: Vec<&'static str>,
    pub rows: Vec<TableRow>,
}

/// One row per bar. `signals` is aligned with the frame; rows past its end
/// default to HOLD.
pub fn build_table(frame: &IndicatorFrame, signals: &[Signal]) -> Table {
    let rows = frame
        .bars()
        .iter()
        .enumerate()
        .map(|(i, bar)| TableRow {
            date: bar.date,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
            indicators: IndicatorValues(
                frame
                    .columns()
                    .map(|(column, values)| (column, values.get(i).copied().flatten()))
                    .collect(),
            ),
            decision: signals.get(i).copied().unwrap_or_default(),
        })
        .collect();

    Table {
        columns: frame.column_names(),
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::IndicatorPlan;
    use crate::market_data::{Bar, PriceSeries};
    use crate::runtime_config::IndicatorSettings;

    fn frame(n: usize) -> IndicatorFrame {
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let bars = (0..n)
            .map(|i| Bar::close_only(start + chrono::Duration::days(i as i64), 10.0 + i as f64))
            .collect();
        IndicatorFrame::build(
            PriceSeries::new("ABC", bars),
            IndicatorPlan::default(),
            &IndicatorSettings::default(),
        )
    }

    #[test]
    fn rows_follow_bars() {
        let f = frame(3);
        let table = build_table(&f, &[Signal::Hold, Signal::Buy, Signal::Sell]);
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.rows[1].close, Some(11.0));
        assert_eq!(table.rows[2].decision, Signal::Sell);
        assert_eq!(table.columns, f.column_names());
    }

    #[test]
    fn json_shape_keeps_column_order_and_nulls() {
        let table = build_table(&frame(2), &[Signal::Hold, Signal::Hold]);
        let json = serde_json::to_string(&table.rows[0]).unwrap();
        assert!(json.contains(r#""date":"2024-03-01""#));
        assert!(json.contains(r#""decision":"HOLD""#));
        assert!(json.contains(r#""RSI":null"#));

        let ema_short = json.find("EMA_10").unwrap();
        let rsi = json.find(r#""RSI""#).unwrap();
        assert!(ema_short < rsi);
    }

    #[test]
    fn short_signal_slice_defaults_to_hold() {
        let table = build_table(&frame(2), &[]);
        assert!(table.rows.iter().all(|r| r.decision == Signal::Hold));
    }

    #[test]
    fn empty_frame_gives_empty_table() {
        let table = build_table(&frame(0), &[]);
        assert!(table.rows.is_empty());
        assert!(!table.columns.is_empty());
    }
}
