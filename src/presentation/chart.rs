// =============================================================================
// SVG Price Chart — close line plus four dashed EMA overlays
// =============================================================================
//
// Layout (pixels):
//
//   ┌──────────────────────── title ────────────────────────┐
//   │ y-label │  plot area with gridlines + legend          │
//   │         │                                             │
//   └─────────┴──────────── date ticks ─────────────────────┘
//
// x is the bar index, so weekends and holidays do not leave gaps.
// =============================================================================

use chrono::NaiveDate;

use super::{escape_html, DisplaySettings};
use crate::pipeline::Analysis;

const WIDTH: f64 = 1200.0;
const HEIGHT: f64 = 600.0;
const MARGIN_LEFT: f64 = 80.0;
const MARGIN_RIGHT: f64 = 30.0;
const MARGIN_TOP: f64 = 50.0;
const MARGIN_BOTTOM: f64 = 60.0;

const GRID_LINES: usize = 6;
const CLOSE_COLOUR: &str = "#000000";
/// One colour per EMA line, in period order.
const EMA_COLOURS: [&str; 4] = ["#1f77b4", "#ff7f0e", "#2ca02c", "#d62728"];

/// A line to draw: legend label, colour, dashed or not, y values by index.
struct Line<'a> {
    label: String,
    colour: &'a str,
    dashed: bool,
    values: &'a [f64],
}

/// Maps data space to pixel space.
struct Frame {
    n: usize,
    y_min: f64,
    y_max: f64,
}

impl Frame {
    fn plot_width() -> f64 {
        WIDTH - MARGIN_LEFT - MARGIN_RIGHT
    }

    fn plot_height() -> f64 {
        HEIGHT - MARGIN_TOP - MARGIN_BOTTOM
    }

    fn x(&self, i: usize) -> f64 {
        if self.n <= 1 {
            return MARGIN_LEFT + Self::plot_width() / 2.0;
        }
        MARGIN_LEFT + Self::plot_width() * i as f64 / (self.n - 1) as f64
    }

    fn y(&self, v: f64) -> f64 {
        let span = self.y_max - self.y_min;
        MARGIN_TOP + Self::plot_height() * (self.y_max - v) / span
    }
}

/// Render the price/EMA chart for `analysis` as a standalone SVG document.
pub fn render_svg_chart(analysis: &Analysis, settings: &DisplaySettings) -> String {
    let closes = analysis.series.closes();
    let dates = analysis.series.dates();

    let mut lines = vec![Line {
        label: "Close".to_string(),
        colour: CLOSE_COLOUR,
        dashed: false,
        values: &closes,
    }];
    for (line, colour) in analysis.emas.lines().iter().zip(EMA_COLOURS) {
        lines.push(Line {
            label: line.label(),
            colour,
            dashed: true,
            values: &line.values,
        });
    }

    let frame = frame_for(closes.len(), &lines);
    let title = format!("{} – Price + EMA Trend", analysis.ticker);

    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="sans-serif" font-size="12">"#,
        w = WIDTH,
        h = HEIGHT
    );
    svg.push('\n');
    svg.push_str(&format!(
        r##"<rect x="0" y="0" width="{WIDTH}" height="{HEIGHT}" fill="#ffffff"/>"##
    ));
    svg.push('\n');
    svg.push_str(&format!(
        r#"<text class="title" x="{}" y="30" text-anchor="middle" font-size="18">{}</text>"#,
        WIDTH / 2.0,
        escape_html(&title)
    ));
    svg.push('\n');

    push_grid(&mut svg, &frame, &dates);

    svg.push_str(&format!(
        r#"<text class="ylabel" x="20" y="{y:.1}" text-anchor="middle" transform="rotate(-90 20 {y:.1})">{}</text>"#,
        escape_html(&settings.price_axis_label),
        y = MARGIN_TOP + Frame::plot_height() / 2.0
    ));
    svg.push('\n');

    for line in &lines {
        push_polyline(&mut svg, &frame, line);
    }

    push_legend(&mut svg, &lines);

    svg.push_str("</svg>\n");
    svg
}

fn frame_for(n: usize, lines: &[Line<'_>]) -> Frame {
    let (mut lo, mut hi) = (f64::INFINITY, f64::NEG_INFINITY);
    for v in lines.iter().flat_map(|l| l.values.iter().copied()) {
        if v.is_finite() {
            lo = lo.min(v);
            hi = hi.max(v);
        }
    }
    if !lo.is_finite() || !hi.is_finite() {
        (lo, hi) = (0.0, 1.0);
    }
    // Pad 5% each side; a flat series still needs a non-zero span.
    let pad = if hi > lo { (hi - lo) * 0.05 } else { lo.abs().max(1.0) * 0.05 };
    Frame {
        n,
        y_min: lo - pad,
        y_max: hi + pad,
    }
}

fn push_grid(svg: &mut String, frame: &Frame, dates: &[NaiveDate]) {
    let left = MARGIN_LEFT;
    let right = WIDTH - MARGIN_RIGHT;
    let top = MARGIN_TOP;
    let bottom = HEIGHT - MARGIN_BOTTOM;

    svg.push_str(r##"<g class="grid" stroke="#cccccc" stroke-width="1">"##);
    svg.push('\n');
    for k in 0..=GRID_LINES {
        let v = frame.y_min + (frame.y_max - frame.y_min) * k as f64 / GRID_LINES as f64;
        let y = frame.y(v);
        svg.push_str(&format!(
            r#"<line x1="{left}" y1="{y:.2}" x2="{right}" y2="{y:.2}"/>"#
        ));
        svg.push('\n');
    }
    let ticks = tick_indices(frame.n, GRID_LINES);
    for &i in &ticks {
        let x = frame.x(i);
        svg.push_str(&format!(
            r#"<line x1="{x:.2}" y1="{top}" x2="{x:.2}" y2="{bottom}"/>"#
        ));
        svg.push('\n');
    }
    svg.push_str("</g>\n");

    svg.push_str(&format!(
        r##"<rect x="{left}" y="{top}" width="{w}" height="{h}" fill="none" stroke="#333333"/>"##,
        w = Frame::plot_width(),
        h = Frame::plot_height()
    ));
    svg.push('\n');

    for k in 0..=GRID_LINES {
        let v = frame.y_min + (frame.y_max - frame.y_min) * k as f64 / GRID_LINES as f64;
        svg.push_str(&format!(
            r#"<text class="ytick" x="{:.1}" y="{:.2}" text-anchor="end" dominant-baseline="middle">{:.2}</text>"#,
            left - 6.0,
            frame.y(v),
            v
        ));
        svg.push('\n');
    }
    for &i in &ticks {
        if let Some(date) = dates.get(i) {
            svg.push_str(&format!(
                r#"<text class="xtick" x="{:.2}" y="{:.1}" text-anchor="middle">{}</text>"#,
                frame.x(i),
                bottom + 20.0,
                date.format("%Y-%m-%d")
            ));
            svg.push('\n');
        }
    }
}

fn push_polyline(svg: &mut String, frame: &Frame, line: &Line<'_>) {
    let points: Vec<String> = line
        .values
        .iter()
        .enumerate()
        .filter(|(_, v)| v.is_finite())
        .map(|(i, &v)| format!("{:.2},{:.2}", frame.x(i), frame.y(v)))
        .collect();
    if points.is_empty() {
        return;
    }
    let dash = if line.dashed { r#" stroke-dasharray="6 4""# } else { "" };
    svg.push_str(&format!(
        r#"<polyline class="series" data-label="{}" fill="none" stroke="{}" stroke-width="1.5"{} points="{}"/>"#,
        escape_html(&line.label),
        line.colour,
        dash,
        points.join(" ")
    ));
    svg.push('\n');
}

fn push_legend(svg: &mut String, lines: &[Line<'_>]) {
    let x = MARGIN_LEFT + 12.0;
    let y = MARGIN_TOP + 12.0;
    let row = 18.0;
    svg.push_str(&format!(
        r##"<g class="legend"><rect x="{x}" y="{y}" width="110" height="{:.1}" fill="#ffffff" fill-opacity="0.85" stroke="#999999"/>"##,
        row * lines.len() as f64 + 8.0
    ));
    svg.push('\n');
    for (k, line) in lines.iter().enumerate() {
        let ly = y + 13.0 + row * k as f64;
        let dash = if line.dashed { r#" stroke-dasharray="6 4""# } else { "" };
        svg.push_str(&format!(
            r#"<line x1="{:.1}" y1="{ly:.1}" x2="{:.1}" y2="{ly:.1}" stroke="{}" stroke-width="2"{dash}/><text x="{:.1}" y="{:.1}">{}</text>"#,
            x + 8.0,
            x + 38.0,
            line.colour,
            x + 46.0,
            ly + 4.0,
            escape_html(&line.label)
        ));
        svg.push('\n');
    }
    svg.push_str("</g>\n");
}

/// Evenly spaced bar indices for date ticks, always including both ends.
fn tick_indices(n: usize, segments: usize) -> Vec<usize> {
    match n {
        0 => Vec::new(),
        1 => vec![0],
        _ => {
            let mut idx: Vec<usize> = (0..=segments)
                .map(|k| k * (n - 1) / segments.max(1))
                .collect();
            idx.dedup();
            idx
        }
    }
}
