// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free implementations of the indicators shown on the
// dashboard. Every function takes the Close column as `&[Option<f64>]` and
// returns an aligned series, so insufficient lookback and vendor gaps surface
// as `None` rather than as zeros.

pub mod bollinger;
pub mod ema;
pub mod frame;
pub mod macd;
pub mod rolling;
pub mod rsi;
pub mod sma;

pub use frame::{Column, IndicatorFrame, IndicatorPlan};
