// =============================================================================
// Presentation Module — text report, SVG chart, HTML page
// =============================================================================
//
// Everything here is a sink. Values are rounded only when they are turned
// into text; the analysis itself is never modified.
// =============================================================================

pub mod chart;
pub mod page;
pub mod report;

pub use chart::render_svg_chart;
pub use page::render_page;
pub use report::Report;

use crate::runtime_config::AnalyzerConfig;

/// Display preferences shared by every renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplaySettings {
    pub currency_symbol: String,
    pub price_axis_label: String,
}

impl DisplaySettings {
    pub fn from_config(config: &AnalyzerConfig) -> Self {
        Self {
            currency_symbol: config.currency_symbol.clone(),
            price_axis_label: config.price_axis_label.clone(),
        }
    }
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self::from_config(&AnalyzerConfig::default())
    }
}

/// Escape text for inclusion in HTML or SVG markup.
pub(crate) fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
