// =============================================================================
// Chart Panels
// =============================================================================
//
// Renderer-agnostic chart data. Each panel carries line series, optional
// shaded bands, horizontal reference lines and signal markers; the browser
// side draws them.
//
//   price     Close + EMA / SMA / Bollinger overlays, BUY ▲ / SELL ▼ at Close
//   rsi       RSI with overbought / oversold lines
//   macd      MACD + Signal_Line with a zero line (only when shown)
//   forecast  observed Close, yhat, shaded lower / upper band
// =============================================================================

use chrono::NaiveDate;
use serde::Serialize;

use crate::forecast::ForecastResult;
use crate::indicators::{Column, IndicatorFrame};
use crate::market_data::PriceSeries;
use crate::runtime_config::StrategySettings;
use crate::types::Signal;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartPoint {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub name: String,
    pub points: Vec<ChartPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MarkerShape {
    TriangleUp,
    TriangleDown,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub date: NaiveDate,
    pub price: f64,
    pub signal: Signal,
    pub shape: MarkerShape,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceLine {
    pub label: String,
    pub value: f64,
}

/// Shaded region between two aligned boundaries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Band {
    pub name: String,
    pub lower: Vec<ChartPoint>,
    pub upper: Vec<ChartPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPanel {
    pub title: String,
    pub series: Vec<ChartSeries>,
    pub bands: Vec<Band>,
    pub reference_lines: Vec<ReferenceLine>,
    pub markers: Vec<Marker>,
}

impl ChartPanel {
    fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            series: Vec::new(),
            bands: Vec::new(),
            reference_lines: Vec::new(),
            markers: Vec::new(),
        }
    }

    pub fn series(&self, name: &str) -> Option<&ChartSeries> {
        self.series.iter().find(|s| s.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSet {
    pub price: ChartPanel,
    pub rsi: ChartPanel,
    pub macd: Option<ChartPanel>,
    pub forecast: Option<ChartPanel>,
}

/// Overlays drawn on the price panel, when present in the frame.
const PRICE_OVERLAYS: [Column; 7] = [
    Column::EmaShort,
    Column::EmaLong,
    Column::SmaFast,
    Column::SmaSlow,
    Column::BollingerMiddle,
    Column::BollingerUpper,
    Column::BollingerLower,
];

fn column_series(frame: &IndicatorFrame, dates: &[NaiveDate], column: Column) -> Option<ChartSeries> {
    let values = frame.column(column)?;
    Some(ChartSeries {
        name: column.name().to_string(),
        points: dates
            .iter()
            .zip(values)
            .map(|(date, value)| ChartPoint {
                date: *date,
                value: *value,
            })
            .collect(),
    })
}

pub fn build_charts(
    frame: &IndicatorFrame,
    signals: &[Signal],
    show_macd: bool,
    forecast: Option<&ForecastResult>,
    strategy: &StrategySettings,
) -> ChartSet {
    let dates = frame.dates();

    // ── Price ───────────────────────────────────────────────────────────
    let mut price = ChartPanel::new(format!("{} Close", frame.series().symbol()));
    price.series.push(ChartSeries {
        name: "Close".into(),
        points: frame
            .bars()
            .iter()
            .map(|b| ChartPoint {
                date: b.date,
                value: b.close,
            })
            .collect(),
    });
    price.series.extend(
        PRICE_OVERLAYS
            .iter()
            .filter_map(|c| column_series(frame, &dates, *c)),
    );
    if let (Some(lower), Some(upper)) = (
        column_series(frame, &dates, Column::BollingerLower),
        column_series(frame, &dates, Column::BollingerUpper),
    ) {
        price.bands.push(Band {
            name: "Bollinger Bands".into(),
            lower: lower.points,
            upper: upper.points,
        });
    }
    price.markers = frame
        .bars()
        .iter()
        .zip(signals)
        .filter_map(|(bar, signal)| {
            let shape = match signal {
                Signal::Buy => MarkerShape::TriangleUp,
                Signal::Sell => MarkerShape::TriangleDown,
                Signal::Hold => return None,
            };
            Some(Marker {
                date: bar.date,
                price: bar.close?,
                signal: *signal,
                shape,
            })
        })
        .collect();

    // ── RSI ─────────────────────────────────────────────────────────────
    let mut rsi = ChartPanel::new("Relative Strength Index");
    rsi.series.extend(column_series(frame, &dates, Column::Rsi));
    rsi.reference_lines = vec![
        ReferenceLine {
            label: "Overbought".into(),
            value: strategy.rsi_overbought,
        },
        ReferenceLine {
            label: "Oversold".into(),
            value: strategy.rsi_oversold,
        },
    ];

    // ── MACD ────────────────────────────────────────────────────────────
    let macd = if show_macd && frame.has(Column::Macd) {
        let mut panel = ChartPanel::new("MACD");
        panel.series.extend(
            [Column::Macd, Column::SignalLine]
                .iter()
                .filter_map(|c| column_series(frame, &dates, *c)),
        );
        panel.reference_lines.push(ReferenceLine {
            label: "Zero".into(),
            value: 0.0,
        });
        Some(panel)
    } else {
        None
    };

    ChartSet {
        price,
        rsi,
        macd,
        forecast: forecast.map(|f| forecast_panel(frame.series(), f)),
    }
}

/// Observed closes against the fitted and projected values.
pub fn forecast_panel(series: &PriceSeries, forecast: &ForecastResult) -> ChartPanel {
    let mut panel = ChartPanel::new(format!("{} Forecast", series.symbol()));

    panel.series.push(ChartSeries {
        name: "Observed".into(),
        points: series
            .observed_closes()
            .into_iter()
            .map(|(date, close)| ChartPoint {
                date,
                value: Some(close),
            })
            .collect(),
    });

    let all = || forecast.fitted.iter().chain(forecast.horizon.iter());
    let point = |date, value| ChartPoint {
        date,
        value: Some(value),
    };
    panel.series.push(ChartSeries {
        name: "Forecast".into(),
        points: all().map(|p| point(p.date, p.yhat)).collect(),
    });
    panel.bands.push(Band {
        name: format!("{:.0}% interval", forecast.interval_width * 100.0),
        lower: all().map(|p| point(p.date, p.yhat_lower)).collect(),
        upper: all().map(|p| point(p.date, p.yhat_upper)).collect(),
    });

    panel
}
