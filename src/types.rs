// =============================================================================
// Shared types used across the EMA trend analyzer
// =============================================================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A normalised ticker symbol: trimmed and upper-cased, never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ticker(String);

impl Ticker {
    /// Normalise free-text user input. Returns `None` for blank input.
    pub fn parse(raw: &str) -> Option<Self> {
        let symbol = raw.trim().to_uppercase();
        if symbol.is_empty() {
            None
        } else {
            Some(Self(symbol))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Ticker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One trading day of (adjusted) prices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: u64,
}

/// Daily bars for one ticker, ascending by date with unique dates.
///
/// The ordering invariant is enforced on construction; there is no way to
/// mutate a series afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PriceSeries {
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Build a series from bars in any order. Bars are sorted by date and,
    /// when two bars share a date, the later one in the input wins.
    pub fn new(mut bars: Vec<PriceBar>) -> Self {
        // Stable sort keeps input order among equal dates.
        bars.sort_by_key(|b| b.date);
        let mut deduped: Vec<PriceBar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match deduped.last_mut() {
                Some(last) if last.date == bar.date => *last = bar,
                _ => deduped.push(bar),
            }
        }
        Self { bars: deduped }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    pub fn latest(&self) -> Option<&PriceBar> {
        self.bars.last()
    }
}

/// Where the latest close sits relative to one EMA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmaStatus {
    Above,
    Below,
}

impl std::fmt::Display for EmaStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Above => write!(f, "Above"),
            Self::Below => write!(f, "Below"),
        }
    }
}

/// Direction of a trend signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Bullish,
    Bearish,
}

impl TrendDirection {
    pub fn from_bullish(bullish: bool) -> Self {
        if bullish {
            Self::Bullish
        } else {
            Self::Bearish
        }
    }
}

impl std::fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bullish => write!(f, "Bullish"),
            Self::Bearish => write!(f, "Bearish"),
        }
    }
}
