// =============================================================================
// Analysis Errors
// =============================================================================
//
// Everything that can go wrong between "user typed a ticker" and "report is
// ready" ends up as an `AnalysisError`. The HTTP layer turns it into one
// user-facing message and a status code; nothing propagates further.
//
//   NoData       → 404
//   Fetch        → 502
//   Computation  → 502
// =============================================================================

use axum::http::StatusCode;
use thiserror::Error;

use crate::indicators::EmaError;
use crate::market_data::ProviderError;
use crate::types::Ticker;

#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The provider answered, but had no bars for this ticker.
    #[error("no data found for ticker {0}")]
    NoData(Ticker),

    /// Transport, decoding or provider-side failure.
    #[error("error fetching data: {0}")]
    Fetch(#[from] ProviderError),

    /// The EMA engine rejected its input. Unreachable behind the empty-series
    /// guard; reported like any other failure if it ever happens.
    #[error("error fetching data: {0}")]
    Computation(#[from] EmaError),
}

impl AnalysisError {
    /// Message shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::NoData(_) => "No data found. Please check the ticker.".to_string(),
            other => other.to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NoData(_) => StatusCode::NOT_FOUND,
            Self::Fetch(_) | Self::Computation(_) => StatusCode::BAD_GATEWAY,
        }
    }
}
