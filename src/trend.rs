// =============================================================================
// Trend Classification
// =============================================================================
//
// Compares the latest close to each EMA and the EMA20 / EMA50 pair.
//
// Decision rules (all strict, ties fall on the bearish side):
//   status[p]  = Above  if close > EMA_p         else Below
//   long_term  = Bullish if close > EMA200       else Bearish
//   short_term = Bullish if EMA20 > EMA50        else Bearish

use serde::Serialize;
use tracing::debug;

use crate::indicators::EMA_PERIODS;
use crate::types::{EmaStatus, TrendDirection};

/// Latest value of one EMA and where the close sits against it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EmaReading {
    pub period: usize,
    pub value: f64,
    pub status: EmaStatus,
}

/// Read-only summary of the latest bar against the four EMAs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSnapshot {
    pub latest_close: f64,
    pub readings: [EmaReading; 4],
    pub long_term: TrendDirection,
    pub short_term: TrendDirection,
}

/// Status of `close` against a single EMA value.
pub fn ema_status(close: f64, ema: f64) -> EmaStatus {
    if close > ema {
        EmaStatus::Above
    } else {
        EmaStatus::Below
    }
}

/// Classify the latest close against the latest EMA20/50/100/200 values.
///
/// `emas` must be in [`EMA_PERIODS`] order.
pub fn classify(latest_close: f64, emas: [f64; 4]) -> TrendSnapshot {
    let readings = std::array::from_fn(|i| EmaReading {
        period: EMA_PERIODS[i],
        value: emas[i],
        status: ema_status(latest_close, emas[i]),
    });

    let [ema20, ema50, _, ema200] = emas;
    let long_term = TrendDirection::from_bullish(latest_close > ema200);
    let short_term = TrendDirection::from_bullish(ema20 > ema50);

    debug!(
        latest_close,
        ema20,
        ema50,
        ema200,
        long_term = %long_term,
        short_term = %short_term,
        "trend classified"
    );

    TrendSnapshot {
        latest_close,
        readings,
        long_term,
        short_term,
    }
}
