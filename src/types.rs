// =============================================================================
// Shared types used across the Stock Lens dashboard
// =============================================================================

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Categorical per-row signal produced by the decision engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Buy,
    Sell,
    #[default]
    Hold,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
            Self::Hold => "HOLD",
        }
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single rule set that drives the Decision column for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrategyKind {
    #[default]
    #[serde(rename = "RSI")]
    Rsi,
    #[serde(rename = "SMA")]
    Sma,
    #[serde(rename = "Bollinger Bands")]
    BollingerBands,
    #[serde(rename = "MACD")]
    Macd,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 4] = [
        StrategyKind::Rsi,
        StrategyKind::Sma,
        StrategyKind::BollingerBands,
        StrategyKind::Macd,
    ];

    /// Human-readable label, identical to the serde name.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Rsi => "RSI",
            Self::Sma => "SMA",
            Self::BollingerBands => "Bollinger Bands",
            Self::Macd => "MACD",
        }
    }

    /// Short slug accepted in query strings.
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Rsi => "rsi",
            Self::Sma => "sma",
            Self::BollingerBands => "bollinger",
            Self::Macd => "macd",
        }
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown strategy '{0}' (expected one of: rsi, sma, bollinger, macd)")]
pub struct UnknownStrategy(pub String);

impl FromStr for StrategyKind {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalised: String = s
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .collect();
        match normalised.as_str() {
            "rsi" => Ok(Self::Rsi),
            "sma" => Ok(Self::Sma),
            "bollinger" | "bollingerbands" | "bb" => Ok(Self::BollingerBands),
            "macd" => Ok(Self::Macd),
            _ => Err(UnknownStrategy(s.to_string())),
        }
    }
}
