// =============================================================================
// Exponential Moving Average (EMA)
// =============================================================================
//
// EMA gives more weight to recent prices, making it more responsive to new
// information than the Simple Moving Average (SMA).
//
// Formula:
//   multiplier = 2 / (period + 1)
//   EMA_0      = close_0
//   EMA_t      = EMA_{t-1} + multiplier * (close_t - EMA_{t-1})
//
// Same value as close_t * m + EMA_{t-1} * (1 - m); a flat series stays
// exactly flat in f64.
//
// The series is seeded with the first close, not an SMA, so it is defined for
// any non-empty input regardless of the period ("adjust=false" weighting).
// The output is index-aligned with the input.
// =============================================================================

use serde::Serialize;
use thiserror::Error;

/// The fixed set of look-back periods the analyzer reports on.
pub const EMA_PERIODS: [usize; 4] = [20, 50, 100, 200];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmaError {
    #[error("cannot compute an EMA over an empty price series")]
    EmptySeries,

    #[error("EMA period must be a positive integer")]
    InvalidPeriod,
}

/// Compute the EMA series for the given `closes` slice and look-back `period`.
///
/// The result has exactly `closes.len()` elements.
///
/// # Errors
/// - `closes` is empty => [`EmaError::EmptySeries`]
/// - `period == 0` => [`EmaError::InvalidPeriod`]
pub fn calculate_ema(closes: &[f64], period: usize) -> Result<Vec<f64>, EmaError> {
    if period == 0 {
        return Err(EmaError::InvalidPeriod);
    }
    let (&first, rest) = closes.split_first().ok_or(EmaError::EmptySeries)?;

    let multiplier = 2.0 / (period as f64 + 1.0);

    let mut result = Vec::with_capacity(closes.len());
    result.push(first);

    let mut prev_ema = first;
    for &close in rest {
        let ema = prev_ema + multiplier * (close - prev_ema);
        result.push(ema);
        prev_ema = ema;
    }

    Ok(result)
}

/// One EMA series tagged with its period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmaLine {
    pub period: usize,
    pub values: Vec<f64>,
}

impl EmaLine {
    pub fn label(&self) -> String {
        format!("EMA{}", self.period)
    }

    /// Most recent value. Lines are never empty once built by [`EmaSet`].
    pub fn latest(&self) -> Option<f64> {
        self.values.last().copied()
    }
}

/// The four EMA series over one close series, in [`EMA_PERIODS`] order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmaSet {
    lines: Vec<EmaLine>,
}

impl EmaSet {
    /// Compute every period in [`EMA_PERIODS`] independently over `closes`.
    pub fn compute(closes: &[f64]) -> Result<Self, EmaError> {
        let lines = EMA_PERIODS
            .iter()
            .map(|&period| {
                calculate_ema(closes, period).map(|values| EmaLine { period, values })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { lines })
    }

    pub fn lines(&self) -> &[EmaLine] {
        &self.lines
    }

    /// Latest value of each line, in [`EMA_PERIODS`] order.
    pub fn latest_values(&self) -> Result<[f64; 4], EmaError> {
        let mut out = [0.0; 4];
        for (slot, line) in out.iter_mut().zip(&self.lines) {
            *slot = line.latest().ok_or(EmaError::EmptySeries)?;
        }
        Ok(out)
    }
}
