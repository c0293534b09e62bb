// =============================================================================
// Presentation Module
// =============================================================================
//
// Shapes an analysed frame for its consumers:
// - JSON table rows (one per bar, indicator columns in frame order)
// - CSV export
// - chart panels with BUY / SELL markers and the forecast band

pub mod chart;
pub mod export;
pub mod table;

pub use chart::{build_charts, forecast_panel, ChartPanel, ChartSet};
pub use export::{csv_filename, to_csv, ExportError};
pub use table::{build_table, Table};
