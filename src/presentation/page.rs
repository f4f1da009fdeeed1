// =============================================================================
// Dashboard Page
// =============================================================================
//
// One HTML page: ticker form, then either an error banner or the report
// table, trend banners and the embedded SVG chart. User text is escaped.
// =============================================================================

use super::report::{Banner, Report};
use super::{escape_html, render_svg_chart, DisplaySettings};
use crate::error::AnalysisError;
use crate::pipeline::Analysis;
use crate::types::{EmaStatus, TrendDirection};

const STYLE: &str = "body{font-family:sans-serif;margin:2rem auto;max-width:1260px;color:#222}\
table{border-collapse:collapse;margin:1rem 0}td,th{border:1px solid #ccc;padding:.4rem .8rem;text-align:left}\
.banner{padding:.7rem 1rem;border-radius:4px;margin:.5rem 0}\
.success{background:#e6f4ea}.error{background:#fdecea}.info{background:#e8f0fe}\
input[type=text]{width:24rem;padding:.4rem}";

/// Render the full page for one request.
///
/// `input` is echoed back into the ticker box; `outcome` is `None` when the
/// box was blank and nothing ran.
pub fn render_page(
    input: &str,
    outcome: Option<&Result<Analysis, AnalysisError>>,
    settings: &DisplaySettings,
) -> String {
    let mut html = String::from("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<title>📊 EMA Trend Analyzer</title>\n");
    html.push_str(&format!("<style>{STYLE}</style>\n</head>\n<body>\n"));
    html.push_str("<h1>📈 EMA Trend Analyzer Dashboard</h1>\n");
    html.push_str(&format!(
        "<form method=\"get\" action=\"/\">\n<label for=\"ticker\">Enter Stock Ticker (e.g. APOLLOMICRO.NS or AAPL):</label><br>\n\
<input type=\"text\" id=\"ticker\" name=\"ticker\" value=\"{}\">\n<button type=\"submit\">Analyze</button>\n</form>\n",
        escape_html(input)
    ));

    match outcome {
        None => {}
        Some(Err(err)) => {
            let text = match err {
                AnalysisError::NoData(_) => format!("❌ {}", err.user_message()),
                _ => format!("⚠️ {}", capitalise(&err.user_message())),
            };
            html.push_str(&banner_div("error", &text));
        }
        Some(Ok(analysis)) => push_analysis(&mut html, analysis, settings),
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn push_analysis(html: &mut String, analysis: &Analysis, settings: &DisplaySettings) {
    let report = Report::from_analysis(analysis, settings);

    html.push_str(&format!("<h2>💰 {}</h2>\n", escape_html(&report.headline)));

    html.push_str("<table>\n<tr><th>EMA</th><th>Value</th><th>Status</th></tr>\n");
    for row in &report.rows {
        let status = match row.status {
            EmaStatus::Above => "🔼 Above",
            EmaStatus::Below => "🔽 Below",
        };
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            escape_html(&row.label),
            row.value,
            status
        ));
    }
    html.push_str("</table>\n");

    html.push_str(&long_term_div(&report.long_term));
    html.push_str(&short_term_div(&report.short_term));

    html.push_str("<h2>📉 Price Chart with EMAs</h2>\n");
    html.push_str(&render_svg_chart(analysis, settings));
}

fn long_term_div(banner: &Banner) -> String {
    match banner.direction {
        TrendDirection::Bullish => banner_div("success", &format!("🟢 {}", banner.text)),
        TrendDirection::Bearish => banner_div("error", &format!("🔴 {}", banner.text)),
    }
}

fn short_term_div(banner: &Banner) -> String {
    let icon = match banner.direction {
        TrendDirection::Bullish => "✅",
        TrendDirection::Bearish => "⚠️",
    };
    banner_div("info", &format!("{icon} {}", banner.text))
}

fn banner_div(class: &str, text: &str) -> String {
    format!("<div class=\"banner {class}\">{}</div>\n", escape_html(text))
}

fn capitalise(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::fixtures::series_from_closes;
    use crate::market_data::ProviderError;
    use crate::pipeline::compute;
    use crate::types::Ticker;

    #[test]
    fn blank_input_renders_form_only() {
        let html = render_page("", None, &DisplaySettings::default());
        assert!(html.contains("<form"));
        assert!(!html.contains("class=\"banner"));
        assert!(!html.contains("<svg"));
    }

    #[test]
    fn input_is_escaped() {
        let html = render_page("<script>", None, &DisplaySettings::default());
        assert!(html.contains("value=\"&lt;script&gt;\""));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn no_data_renders_message_without_chart() {
        let outcome = Err(AnalysisError::NoData(Ticker::parse("zzzinvalid").unwrap()));
        let html = render_page("ZZZINVALID", Some(&outcome), &DisplaySettings::default());
        assert!(html.contains("❌ No data found. Please check the ticker."));
        assert!(!html.contains("<svg"));
        assert!(!html.contains("<table"));
    }

    #[test]
    fn fetch_error_renders_detail_without_chart() {
        let outcome = Err(AnalysisError::Fetch(ProviderError::Decode("boom".into())));
        let html = render_page("AAPL", Some(&outcome), &DisplaySettings::default());
        assert!(html.contains("⚠️ Error fetching data: failed to decode provider response: boom"));
        assert!(!html.contains("<svg"));
    }

    #[test]
    fn success_renders_report_and_chart() {
        let closes: Vec<f64> = (10..=30).map(|x| x as f64).collect();
        let analysis = compute(Ticker::parse("aapl").unwrap(), series_from_closes(&closes)).unwrap();
        let html = render_page("aapl", Some(&Ok(analysis)), &DisplaySettings::default());

        assert!(html.contains("💰 Latest Price: ₹30.00"));
        assert_eq!(html.matches("🔼 Above").count(), 4);
        assert!(html.contains("🟢 Long-term Trend: Bullish (Price above 200 EMA)"));
        assert!(html.contains("✅ Short-Term Bullish: EMA20 &gt; EMA50"));
        assert!(html.contains("<svg"));
        assert!(html.contains("AAPL – Price + EMA Trend"));
    }

    #[test]
    fn capitalise_first_letter() {
        assert_eq!(capitalise("error fetching"), "Error fetching");
        assert_eq!(capitalise(""), "");
    }
}
