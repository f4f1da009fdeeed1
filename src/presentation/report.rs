// =============================================================================
// Text Report — latest price, EMA table, trend banners
// =============================================================================
//
// Rounding rules (display only):
//   price     → 2 decimals
//   EMA value → nearest integer, ties to even
// Classification always uses the unrounded values from the snapshot.

use serde::Serialize;

use super::DisplaySettings;
use crate::pipeline::Analysis;
use crate::types::{EmaStatus, TrendDirection};

/// One row of the EMA table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmaRow {
    pub label: String,
    pub value: i64,
    pub status: EmaStatus,
}

/// A trend verdict with its display text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Banner {
    pub direction: TrendDirection,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub ticker: String,
    pub headline: String,
    pub latest_close: String,
    pub rows: Vec<EmaRow>,
    pub long_term: Banner,
    pub short_term: Banner,
}

impl Report {
    pub fn from_analysis(analysis: &Analysis, settings: &DisplaySettings) -> Self {
        let snap = &analysis.snapshot;
        let latest_close = format_price(snap.latest_close);

        let rows = snap
            .readings
            .iter()
            .map(|r| EmaRow {
                label: format!("{}-day EMA", r.period),
                value: round_display(r.value),
                status: r.status,
            })
            .collect();

        Self {
            ticker: analysis.ticker.to_string(),
            headline: format!("Latest Price: {}{}", settings.currency_symbol, latest_close),
            latest_close,
            rows,
            long_term: long_term_banner(snap.long_term),
            short_term: short_term_banner(snap.short_term),
        }
    }

    /// Plain-text rendering, one item per line.
    pub fn to_text(&self) -> String {
        let mut out = format!("{}\n{}\n", self.ticker, self.headline);
        out.push_str(&format!("{:<14} {:>10}  {}\n", "EMA", "Value", "Status"));
        for row in &self.rows {
            out.push_str(&format!("{:<14} {:>10}  {}\n", row.label, row.value, row.status));
        }
        out.push_str(&self.long_term.text);
        out.push('\n');
        out.push_str(&self.short_term.text);
        out.push('\n');
        out
    }
}

pub fn format_price(price: f64) -> String {
    format!("{price:.2}")
}

/// Integer display rounding for EMA values.
pub fn round_display(value: f64) -> i64 {
    value.round_ties_even() as i64
}

fn long_term_banner(direction: TrendDirection) -> Banner {
    let text = match direction {
        TrendDirection::Bullish => "Long-term Trend: Bullish (Price above 200 EMA)",
        TrendDirection::Bearish => "Long-term Trend: Bearish (Price below 200 EMA)",
    };
    Banner {
        direction,
        text: text.to_string(),
    }
}

fn short_term_banner(direction: TrendDirection) -> Banner {
    let text = match direction {
        TrendDirection::Bullish => "Short-Term Bullish: EMA20 > EMA50",
        TrendDirection::Bearish => "Short-Term Bearish: EMA20 < EMA50",
    };
    Banner {
        direction,
        text: text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::fixtures::series_from_closes;
    use crate::pipeline::compute;
    use crate::types::Ticker;

    fn analysis(closes: &[f64]) -> Analysis {
        compute(Ticker::parse("apollomicro.ns").unwrap(), series_from_closes(closes)).unwrap()
    }

    #[test]
    fn display_rounding_is_ties_to_even() {
        assert_eq!(round_display(2.5), 2);
        assert_eq!(round_display(3.5), 4);
        assert_eq!(round_display(-0.4), 0);
        assert_eq!(round_display(1234.51), 1235);
    }

    #[test]
    fn price_has_two_decimals() {
        assert_eq!(format_price(1234.5678), "1234.57");
        assert_eq!(format_price(10.0), "10.00");
    }

    #[test]
    fn report_for_rising_series() {
        let closes: Vec<f64> = (10..=30).map(|x| x as f64).collect();
        let report = Report::from_analysis(&analysis(&closes), &DisplaySettings::default());

        assert_eq!(report.ticker, "APOLLOMICRO.NS");
        assert_eq!(report.headline, "Latest Price: ₹30.00");
        let labels: Vec<&str> = report.rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["20-day EMA", "50-day EMA", "100-day EMA", "200-day EMA"]);
        assert!(report.rows.iter().all(|r| r.status == EmaStatus::Above));
        assert_eq!(report.long_term.direction, TrendDirection::Bullish);
        assert_eq!(report.long_term.text, "Long-term Trend: Bullish (Price above 200 EMA)");
        assert_eq!(report.short_term.text, "Short-Term Bullish: EMA20 > EMA50");
    }

    #[test]
    fn report_for_flat_series() {
        let report = Report::from_analysis(&analysis(&[100.0; 50]), &DisplaySettings::default());
        assert!(report.rows.iter().all(|r| r.value == 100 && r.status == EmaStatus::Below));
        assert_eq!(report.long_term.text, "Long-term Trend: Bearish (Price below 200 EMA)");
        assert_eq!(report.short_term.text, "Short-Term Bearish: EMA20 < EMA50");
    }

    #[test]
    fn rounding_does_not_change_classification() {
        // EMA20 ends a hair below the close: rounds to the same integer but
        // the status must still be "above".
        let mut closes = vec![100.0; 30];
        closes.push(100.04);
        let a = analysis(&closes);
        let report = Report::from_analysis(&a, &DisplaySettings::default());
        assert_eq!(report.rows[0].value, 100);
        assert_eq!(report.rows[0].status, EmaStatus::Above);
    }

    #[test]
    fn text_rendering_lists_every_row() {
        let report = Report::from_analysis(&analysis(&[5.0, 6.0]), &DisplaySettings {
            currency_symbol: "$".into(),
            price_axis_label: "Price (USD)".into(),
        });
        let text = report.to_text();
        assert!(text.contains("Latest Price: $6.00"));
        assert_eq!(text.matches("-day EMA").count(), 4);
        assert!(text.ends_with("Short-Term Bullish: EMA20 > EMA50\n"));
    }
}
