// =============================================================================
// CSV Export
// =============================================================================
//
// Layout: Date,Open,High,Low,Close,Volume,<indicator columns>,Decision
// Missing values are written as empty fields.
// =============================================================================

use thiserror::Error;

use crate::indicators::IndicatorFrame;
use crate::types::Signal;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("csv buffer flush failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Download name offered for `symbol`'s export.
pub fn csv_filename(symbol: &str) -> String {
    format!("{symbol}_stock_data.csv")
}

fn field(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Render `frame` plus its decision column as CSV bytes.
pub fn to_csv(frame: &IndicatorFrame, signals: &[Signal]) -> Result<Vec<u8>, ExportError> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    let mut header = vec!["Date", "Open", "High", "Low", "Close", "Volume"];
    header.extend(frame.column_names());
    header.push("Decision");
    wtr.write_record(&header)?;

    let columns: Vec<&[Option<f64>]> = frame.columns().map(|(_, values)| values).collect();
    for (i, bar) in frame.bars().iter().enumerate() {
        let mut record = vec![
            bar.date.format("%Y-%m-%d").to_string(),
            field(bar.open),
            field(bar.high),
            field(bar.low),
            field(bar.close),
            bar.volume.map(|v| v.to_string()).unwrap_or_default(),
        ];
        record.extend(
            columns
                .iter()
                .map(|values| field(values.get(i).copied().flatten())),
        );
        record.push(signals.get(i).copied().unwrap_or_default().to_string());
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    wtr.into_inner().map_err(|e| ExportError::Io(e.into_error()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::IndicatorPlan;
    use crate::market_data::{Bar, PriceSeries};
    use crate::runtime_config::IndicatorSettings;
    use crate::types::StrategyKind;
    use chrono::NaiveDate;

    fn frame(closes: &[Option<f64>], plan: IndicatorPlan) -> IndicatorFrame {
        let start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, close)| Bar {
                date: start + chrono::Duration::days(i as i64),
                open: Some(1.5),
                high: None,
                low: None,
                close: *close,
                volume: Some(1000),
            })
            .collect();
        IndicatorFrame::build(PriceSeries::new("XYZ", bars), plan, &IndicatorSettings::default())
    }

    #[test]
    fn filename_format() {
        assert_eq!(csv_filename("AAPL"), "AAPL_stock_data.csv");
    }

    #[test]
    fn header_lists_frame_columns_between_ohlcv_and_decision() {
        let f = frame(
            &[Some(1.0), Some(2.0)],
            IndicatorPlan::for_strategy(StrategyKind::Sma, false),
        );
        let bytes = to_csv(&f, &[Signal::Hold, Signal::Buy]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let header = text.lines().next().unwrap();
        assert_eq!(
            header,
            "Date,Open,High,Low,Close,Volume,EMA_10,EMA_50,Delta,U,D,U_SUM,D_SUM,RS,RSI,SMA_10,SMA_50,Decision"
        );
    }

    #[test]
    fn missing_values_are_empty_fields() {
        let f = frame(&[Some(1.0), None], IndicatorPlan::default());
        let bytes = to_csv(&f, &[Signal::Hold, Signal::Sell]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        // Date, Open, High (empty), Low (empty), Close, Volume, EMA_10 ...
        assert!(lines[1].starts_with("2024-01-02,1.5,,,1,1000,1,"));
        assert!(lines[2].starts_with("2024-01-03,1.5,,,,1000,,"));
        assert!(lines[2].ends_with(",SELL"));
    }

    #[test]
    fn empty_frame_writes_header_only() {
        let f = frame(&[], IndicatorPlan::default());
        let text = String::from_utf8(to_csv(&f, &[]).unwrap()).unwrap();
        assert_eq!(text.lines().count(), 1);
    }
}
