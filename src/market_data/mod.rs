pub mod price_series;
pub mod source;

pub use price_series::{Bar, PriceSeries};
pub use source::{PriceSource, SourceError};
