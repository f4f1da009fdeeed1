// =============================================================================
// Analysis Pipeline — one query, start to finish
// =============================================================================
//
//   raw input → Ticker → fetch trailing year → EmaSet → TrendSnapshot
//
// Nothing is cached or shared between calls; every invocation works on its own
// freshly fetched series.
// =============================================================================

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, error, info, instrument};

use crate::error::AnalysisError;
use crate::indicators::{EmaError, EmaSet};
use crate::market_data::{FetchWindow, PriceProvider};
use crate::trend::{classify, TrendSnapshot};
use crate::types::{PriceSeries, Ticker};

/// Everything the presentation layer needs for one ticker.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub ticker: Ticker,
    pub series: PriceSeries,
    pub emas: EmaSet,
    pub snapshot: TrendSnapshot,
}

/// Run the full pipeline for `raw_input` as of `today`.
///
/// Returns `Ok(None)` for blank input without touching the provider.
#[instrument(skip(provider), name = "pipeline::analyze")]
pub async fn analyze(
    provider: &dyn PriceProvider,
    raw_input: &str,
    today: NaiveDate,
) -> Result<Option<Analysis>, AnalysisError> {
    let Some(ticker) = Ticker::parse(raw_input) else {
        debug!("blank ticker, nothing to do");
        return Ok(None);
    };

    let window = FetchWindow::trailing_year(today);
    let series = provider.fetch_daily(&ticker, window).await?;

    if series.is_empty() {
        info!(ticker = %ticker, "provider returned no bars");
        return Err(AnalysisError::NoData(ticker));
    }

    let analysis = compute(ticker, series).inspect_err(|e| {
        error!(error = %e, "EMA computation failed on a non-empty series");
    })?;

    info!(
        ticker = %analysis.ticker,
        bars = analysis.series.len(),
        latest_close = analysis.snapshot.latest_close,
        long_term = %analysis.snapshot.long_term,
        short_term = %analysis.snapshot.short_term,
        "analysis complete"
    );

    Ok(Some(analysis))
}

/// Compute EMAs and classify the latest bar of an already-fetched series.
pub fn compute(ticker: Ticker, series: PriceSeries) -> Result<Analysis, EmaError> {
    let latest_close = series.latest().ok_or(EmaError::EmptySeries)?.close;
    let emas = EmaSet::compute(&series.closes())?;
    let snapshot = classify(latest_close, emas.latest_values()?);

    Ok(Analysis {
        ticker,
        series,
        emas,
        snapshot,
    })
}
