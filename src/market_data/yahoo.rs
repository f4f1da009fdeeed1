// =============================================================================
// Yahoo Finance chart API client — adjusted daily bars
// =============================================================================
//
// Uses the public v8 chart endpoint, which needs no API key:
//
//   GET /v8/finance/chart/{symbol}?interval=1d&period1=..&period2=..
//       &events=div,splits&includeAdjustedClose=true
//
// The symbol is user text and goes in as a single percent-encoded path
// segment; `#`, `?` and `/` never reach the URL structure.
//
// Prices are split/dividend adjusted the same way as "auto adjust": every OHLC
// field is scaled by adjclose / close, and close becomes adjclose.
// =============================================================================

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Days, NaiveDate};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use super::{FetchWindow, PriceProvider, ProviderError};
use crate::types::{PriceBar, PriceSeries, Ticker};

/// Default public endpoint.
pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// Yahoo rejects requests without a browser-like user agent.
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko)";

/// Error codes Yahoo uses for "this symbol has no data".
const NOT_FOUND_CODES: [&str; 2] = ["Not Found", "No data found"];

// -----------------------------------------------------------------------------
// Wire format
// -----------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: Meta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Meta {
    #[serde(default)]
    gmtoffset: i64,
    currency: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
    #[serde(default)]
    adjclose: Vec<AdjClose>,
}

#[derive(Debug, Default, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

#[derive(Debug, Deserialize)]
struct AdjClose {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

// -----------------------------------------------------------------------------
// Client
// -----------------------------------------------------------------------------

/// Daily-bar provider backed by the Yahoo Finance chart API.
#[derive(Clone)]
pub struct YahooClient {
    base_url: Url,
    client: reqwest::Client,
}

impl YahooClient {
    /// Create a client against `base_url` with a per-request `timeout`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        let raw = base_url.into();
        let base_url = Url::parse(&raw).map_err(|e| ProviderError::InvalidUrl(format!("{raw}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ProviderError::InvalidUrl(raw));
        }
        debug!(base_url = %base_url, "YahooClient initialised");

        Ok(Self { base_url, client })
    }

    fn chart_url(&self, ticker: &Ticker, window: FetchWindow) -> Result<Url, ProviderError> {
        // period2 is exclusive; push it to the start of the next day so the
        // end date's bar is included.
        let period1 = unix_midnight(window.start);
        let period2 = unix_midnight(window.end.checked_add_days(Days::new(1)).unwrap_or(window.end));

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ProviderError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(["v8", "finance", "chart", ticker.as_str()]);
        url.query_pairs_mut()
            .append_pair("interval", "1d")
            .append_pair("period1", &period1.to_string())
            .append_pair("period2", &period2.to_string())
            .append_pair("events", "div,splits")
            .append_pair("includeAdjustedClose", "true");
        Ok(url)
    }
}

#[async_trait]
impl PriceProvider for YahooClient {
    #[instrument(skip(self, ticker), fields(ticker = %ticker), name = "yahoo::fetch_daily")]
    async fn fetch_daily(
        &self,
        ticker: &Ticker,
        window: FetchWindow,
    ) -> Result<PriceSeries, ProviderError> {
        let url = self.chart_url(ticker, window)?;
        debug!(url = %url, "requesting chart");

        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        if status == StatusCode::NOT_FOUND {
            debug!("chart endpoint answered 404; treating as no data");
            return Ok(PriceSeries::empty());
        }
        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body: truncate(&body, 200),
            });
        }

        let series = parse_chart(&body)?;
        debug!(bars = series.len(), "chart parsed");
        Ok(series)
    }
}

impl std::fmt::Debug for YahooClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YahooClient")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Parsing
// -----------------------------------------------------------------------------

/// Decode a chart-API JSON body into an adjusted daily series.
///
/// "Not found" style errors and a missing result decode to an empty series.
fn parse_chart(body: &str) -> Result<PriceSeries, ProviderError> {
    let response: ChartResponse = serde_json::from_str(body)?;

    if let Some(err) = response.chart.error {
        if NOT_FOUND_CODES.contains(&err.code.as_str()) {
            return Ok(PriceSeries::empty());
        }
        return Err(ProviderError::Api {
            code: err.code,
            description: err.description,
        });
    }

    let Some(result) = response.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(PriceSeries::empty());
    };

    if let Some(currency) = &result.meta.currency {
        debug!(currency = %currency, "chart currency");
    }

    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();
    let adjclose = result
        .indicators
        .adjclose
        .into_iter()
        .next()
        .map(|a| a.adjclose);

    let offset = result.meta.gmtoffset;
    let mut bars = Vec::with_capacity(result.timestamp.len());
    let mut skipped = 0usize;

    for (i, &ts) in result.timestamp.iter().enumerate() {
        let (Some(open), Some(high), Some(low), Some(close)) = (
            value_at(&quote.open, i),
            value_at(&quote.high, i),
            value_at(&quote.low, i),
            value_at(&quote.close, i),
        ) else {
            skipped += 1;
            continue;
        };
        let Some(date) = DateTime::from_timestamp(ts + offset, 0).map(|dt| dt.date_naive()) else {
            skipped += 1;
            continue;
        };

        let factor = match adjclose.as_deref().and_then(|a| value_at(a, i)) {
            Some(adj) if close != 0.0 => adj / close,
            _ => 1.0,
        };

        bars.push(PriceBar {
            date,
            open: open * factor,
            high: high * factor,
            low: low * factor,
            close: close * factor,
            volume: quote.volume.get(i).copied().flatten().unwrap_or(0),
        });
    }

    if skipped > 0 {
        warn!(skipped, "dropped incomplete chart rows");
    }

    Ok(PriceSeries::new(bars))
}

fn value_at(values: &[Option<f64>], i: usize) -> Option<f64> {
    values.get(i).copied().flatten()
}

fn unix_midnight(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or_default()
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_chars).collect();
        format!("{cut}…")
    }
}

#[cfg(test)]
mod tests {
    use axum::http::Uri;
    use axum::Router;

    use super::*;
    use crate::error::AnalysisError;
    use crate::pipeline::analyze;

    // 2024-01-02 and 2024-01-03 at 03:45 UTC (09:15 IST).
    const TS1: i64 = 1_704_167_100;
    const TS2: i64 = 1_704_253_500;

    fn body(adj: &str) -> String {
        format!(
            r#"{{"chart":{{"result":[{{"meta":{{"currency":"INR","gmtoffset":19800}},
            "timestamp":[{TS2},{TS1}],
            "indicators":{{"quote":[{{"open":[11.0,9.0],"high":[12.0,10.5],"low":[10.0,8.5],"close":[11.5,10.0],"volume":[200,100]}}]{adj}}}}}],"error":null}}}}"#
        )
    }

    #[test]
    fn parses_and_orders_bars() {
        let series = parse_chart(&body("")).unwrap();
        assert_eq!(series.len(), 2);
        let bars = series.bars();
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(bars[1].date, NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
        assert_eq!(bars[0].close, 10.0);
        assert_eq!(bars[1].volume, 200);
    }

    #[test]
    fn applies_adjusted_close_factor() {
        let series = parse_chart(&body(r#","adjclose":[{"adjclose":[5.75,5.0]}]"#)).unwrap();
        let first = &series.bars()[0];
        assert!((first.close - 5.0).abs() < 1e-12);
        assert!((first.open - 4.5).abs() < 1e-12);
        assert!((first.high - 5.25).abs() < 1e-12);
        assert!((first.low - 4.25).abs() < 1e-12);
        assert!((series.bars()[1].close - 5.75).abs() < 1e-12);
    }

    #[test]
    fn gmt_offset_moves_bar_to_local_day() {
        // 20:00 UTC on Jan 1 is already Jan 2 in IST.
        let ts = 1_704_139_200;
        let json = format!(
            r#"{{"chart":{{"result":[{{"meta":{{"gmtoffset":19800}},"timestamp":[{ts}],
            "indicators":{{"quote":[{{"open":[1.0],"high":[1.0],"low":[1.0],"close":[1.0],"volume":[null]}}]}}}}],"error":null}}}}"#
        );
        let series = parse_chart(&json).unwrap();
        assert_eq!(series.bars()[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(series.bars()[0].volume, 0);
    }

    #[test]
    fn rows_with_missing_prices_are_skipped() {
        let json = format!(
            r#"{{"chart":{{"result":[{{"meta":{{}},"timestamp":[{TS1},{TS2}],
            "indicators":{{"quote":[{{"open":[1.0,null],"high":[1.0,2.0],"low":[1.0,2.0],"close":[1.0,2.0],"volume":[1,2]}}]}}}}],"error":null}}}}"#
        );
        let series = parse_chart(&json).unwrap();
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn not_found_error_is_empty_series() {
        let json = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        assert!(parse_chart(json).unwrap().is_empty());
    }

    #[test]
    fn result_without_timestamps_is_empty_series() {
        let json = r#"{"chart":{"result":[{"meta":{},"indicators":{"quote":[{}]}}],"error":null}}"#;
        assert!(parse_chart(json).unwrap().is_empty());
    }

    #[test]
    fn other_api_errors_propagate() {
        let json = r#"{"chart":{"result":null,"error":{"code":"Bad Request","description":"Invalid input"}}}"#;
        let err = parse_chart(json).unwrap_err();
        assert!(matches!(err, ProviderError::Api { ref code, .. } if code == "Bad Request"));
        assert_eq!(err.to_string(), "provider error Bad Request: Invalid input");
    }

    #[test]
    fn garbage_body_is_decode_error() {
        assert!(matches!(parse_chart("<html>"), Err(ProviderError::Decode(_))));
    }

    fn window() -> FetchWindow {
        FetchWindow {
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
        }
    }

    fn url_for(raw: &str) -> Url {
        let client = YahooClient::new("https://example.test/", Duration::from_secs(1)).unwrap();
        client.chart_url(&Ticker::parse(raw).unwrap(), window()).unwrap()
    }

    fn query_values(url: &Url, key: &str) -> Vec<String> {
        url.query_pairs()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
            .collect()
    }

    #[test]
    fn chart_url_includes_window_and_adjustment() {
        let url = url_for("aapl");
        assert!(url
            .as_str()
            .starts_with("https://example.test/v8/finance/chart/AAPL?interval=1d"));
        assert_eq!(query_values(&url, "period1"), vec!["1704067200"]);
        assert_eq!(query_values(&url, "period2"), vec!["1704240000"]);
        assert_eq!(query_values(&url, "events"), vec!["div,splits"]);
        assert_eq!(query_values(&url, "includeAdjustedClose"), vec!["true"]);
    }

    #[test]
    fn chart_url_keeps_base_path_prefix() {
        let client = YahooClient::new("http://127.0.0.1:9/proxy/", Duration::from_secs(1)).unwrap();
        let url = client.chart_url(&Ticker::parse("infy.ns").unwrap(), window()).unwrap();
        assert_eq!(url.path(), "/proxy/v8/finance/chart/INFY.NS");
    }

    #[test]
    fn chart_url_encodes_fragment_marker() {
        let url = url_for("aapl#");
        assert_eq!(url.path(), "/v8/finance/chart/AAPL%23");
        assert_eq!(url.fragment(), None);
        assert_eq!(query_values(&url, "period1"), vec!["1704067200"]);
        assert_eq!(query_values(&url, "includeAdjustedClose"), vec!["true"]);
    }

    #[test]
    fn chart_url_encodes_query_marker() {
        let url = url_for("aapl?interval=1wk&x=");
        assert!(url.path().starts_with("/v8/finance/chart/AAPL%3F"));
        assert_eq!(query_values(&url, "interval"), vec!["1d"]);
        assert!(query_values(&url, "X").is_empty());
    }

    #[test]
    fn chart_url_encodes_path_separators() {
        let url = url_for("../../v7/x");
        assert_eq!(url.path(), "/v8/finance/chart/..%2F..%2FV7%2FX");
        assert_eq!(url.path_segments().map(|s| s.count()), Some(4));
    }

    #[test]
    fn rejects_unusable_base_url() {
        assert!(matches!(
            YahooClient::new("not a url", Duration::from_secs(1)),
            Err(ProviderError::InvalidUrl(_))
        ));
        assert!(matches!(
            YahooClient::new("mailto:someone@example.test", Duration::from_secs(1)),
            Err(ProviderError::InvalidUrl(_))
        ));
    }

    #[test]
    fn truncate_long_bodies() {
        assert_eq!(truncate("abc", 5), "abc");
        assert_eq!(truncate("abcdef", 3), "abc…");
    }

    // ---- HTTP round trips against a local stub ---------------------------

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{addr}")
    }

    /// Answers every request with the same status and body.
    fn fixed(status: StatusCode, body: String) -> Router {
        Router::new().fallback(move || async move { (status, body) })
    }

    /// Serves `body` for a well-formed AAPL chart request and 404 otherwise.
    fn aapl_only(body: String) -> Router {
        Router::new().fallback(move |uri: Uri| async move {
            let query_ok = uri
                .query()
                .is_some_and(|q| q.contains("period1=") && q.contains("includeAdjustedClose=true"));
            if uri.path() == "/v8/finance/chart/AAPL" && query_ok {
                (StatusCode::OK, body)
            } else {
                (StatusCode::NOT_FOUND, String::new())
            }
        })
    }

    async fn client_for(app: Router) -> YahooClient {
        YahooClient::new(serve(app).await, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn fetch_parses_successful_response() {
        let client = client_for(aapl_only(body(""))).await;
        let series = client
            .fetch_daily(&Ticker::parse("aapl").unwrap(), window())
            .await
            .unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.latest().unwrap().close, 11.5);
    }

    #[tokio::test]
    async fn fetch_does_not_reach_other_symbol_through_special_chars() {
        let client = client_for(aapl_only(body(""))).await;
        for raw in ["aapl#", "aapl?interval=1wk&x=", "../chart/aapl"] {
            let series = client
                .fetch_daily(&Ticker::parse(raw).unwrap(), window())
                .await
                .unwrap();
            assert!(series.is_empty(), "{raw} resolved to AAPL data");
        }
    }

    #[tokio::test]
    async fn fetch_404_is_empty_series() {
        let client = client_for(fixed(StatusCode::NOT_FOUND, "{}".into())).await;
        let series = client
            .fetch_daily(&Ticker::parse("zzzinvalid").unwrap(), window())
            .await
            .unwrap();
        assert!(series.is_empty());
    }

    #[tokio::test]
    async fn fetch_404_surfaces_as_no_data() {
        let client = client_for(fixed(StatusCode::NOT_FOUND, String::new())).await;
        let today = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let err = analyze(&client, "zzzinvalid", today).await.unwrap_err();
        assert!(matches!(err, AnalysisError::NoData(_)));
    }

    #[tokio::test]
    async fn fetch_other_status_is_error_with_truncated_body() {
        let client = client_for(fixed(StatusCode::SERVICE_UNAVAILABLE, "x".repeat(500))).await;
        let err = client
            .fetch_daily(&Ticker::parse("aapl").unwrap(), window())
            .await
            .unwrap_err();
        match err {
            ProviderError::Status { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body.chars().count(), 201);
                assert!(body.ends_with('…'));
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }
}
