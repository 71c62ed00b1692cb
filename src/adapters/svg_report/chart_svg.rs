//! Line and stacked-area charts as standalone SVG documents.

use chrono::NaiveDate;
use std::fmt::Write;

pub const WIDTH: f64 = 800.0;
pub const HEIGHT: f64 = 320.0;
const PADDING: f64 = 50.0;

pub const PALETTE: [&str; 8] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
];

/// One named line.
pub struct Series<'a> {
    pub label: &'a str,
    pub values: &'a [f64],
}

pub fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn open_document(out: &mut String, title: &str) {
    let _ = write!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH:.0}" height="{HEIGHT:.0}" viewBox="0 0 {WIDTH:.0} {HEIGHT:.0}" font-family="sans-serif" font-size="11">
<rect width="100%" height="100%" fill="white"/>
<text x="{:.1}" y="20" text-anchor="middle" font-size="14">{}</text>
"#,
        WIDTH / 2.0,
        escape(title)
    );
}

fn empty_chart(title: &str) -> String {
    let mut out = String::new();
    open_document(&mut out, title);
    let _ = writeln!(
        out,
        r#"<text x="{:.1}" y="{:.1}" text-anchor="middle">No data available.</text>"#,
        WIDTH / 2.0,
        HEIGHT / 2.0
    );
    out.push_str("</svg>\n");
    out
}

/// Maps data coordinates into the plot area.
struct Scale {
    n: usize,
    min: f64,
    max: f64,
}

impl Scale {
    fn new(n: usize, min: f64, max: f64) -> Self {
        // A flat series still needs a non-zero range.
        let (min, max) = if max > min {
            (min, max)
        } else {
            (min - 0.5, max + 0.5)
        };
        Self { n, min, max }
    }

    fn x(&self, i: usize) -> f64 {
        let plot_width = WIDTH - 2.0 * PADDING;
        if self.n > 1 {
            PADDING + i as f64 * plot_width / (self.n - 1) as f64
        } else {
            PADDING + plot_width / 2.0
        }
    }

    fn y(&self, value: f64) -> f64 {
        let plot_height = HEIGHT - 2.0 * PADDING;
        HEIGHT - PADDING - (value - self.min) / (self.max - self.min) * plot_height
    }
}

fn axes(out: &mut String, scale: &Scale, dates: &[NaiveDate], percent: bool) {
    let bottom = HEIGHT - PADDING;
    let right = WIDTH - PADDING;
    let _ = writeln!(
        out,
        r##"<path d="M{PADDING:.1},{PADDING:.1} L{PADDING:.1},{bottom:.1} L{right:.1},{bottom:.1}" fill="none" stroke="#333"/>"##
    );

    let label = |v: f64| {
        if percent {
            format!("{:.1}%", v * 100.0)
        } else {
            format!("{v:.2}")
        }
    };
    for value in [scale.min, scale.max] {
        let _ = writeln!(
            out,
            r#"<text x="{:.1}" y="{:.1}" text-anchor="end">{}</text>"#,
            PADDING - 4.0,
            scale.y(value) + 4.0,
            label(value)
        );
    }
    if let (Some(first), Some(last)) = (dates.first(), dates.last()) {
        let _ = writeln!(
            out,
            r#"<text x="{PADDING:.1}" y="{:.1}">{first}</text>"#,
            bottom + 16.0
        );
        let _ = writeln!(
            out,
            r#"<text x="{right:.1}" y="{:.1}" text-anchor="end">{last}</text>"#,
            bottom + 16.0
        );
    }
}

fn legend(out: &mut String, labels: &[&str]) {
    for (k, label) in labels.iter().enumerate() {
        let x = PADDING + 10.0 + 150.0 * k as f64;
        let color = PALETTE[k % PALETTE.len()];
        let _ = writeln!(
            out,
            r#"<rect x="{x:.1}" y="32" width="10" height="10" fill="{color}"/><text x="{:.1}" y="41">{}</text>"#,
            x + 14.0,
            escape(label)
        );
    }
}

/// Path data for a line, starting a new segment after every undefined value.
fn line_path(scale: &Scale, values: &[f64]) -> String {
    let mut d = String::new();
    let mut pen_down = false;
    for (i, &v) in values.iter().enumerate() {
        if !v.is_finite() {
            pen_down = false;
            continue;
        }
        let cmd = if pen_down { 'L' } else { 'M' };
        let _ = write!(d, "{cmd}{:.1},{:.1} ", scale.x(i), scale.y(v));
        pen_down = true;
    }
    d.trim_end().to_string()
}

/// Lines over a shared date axis. Non-finite values leave gaps.
/// `percent` formats the value axis as percentages. `zero_line` draws a
/// horizontal rule at 0 when it is in range.
pub fn line_chart(
    title: &str,
    dates: &[NaiveDate],
    series: &[Series],
    percent: bool,
    zero_line: bool,
) -> String {
    let finite = || {
        series
            .iter()
            .flat_map(|s| s.values.iter().copied())
            .filter(|v| v.is_finite())
    };
    let min = finite().fold(f64::INFINITY, f64::min);
    let max = finite().fold(f64::NEG_INFINITY, f64::max);
    if dates.is_empty() || !min.is_finite() {
        return empty_chart(title);
    }

    let scale = Scale::new(dates.len(), min, max);
    let mut out = String::new();
    open_document(&mut out, title);
    axes(&mut out, &scale, dates, percent);

    if zero_line && scale.min <= 0.0 && scale.max >= 0.0 {
        let y = scale.y(0.0);
        let _ = writeln!(
            out,
            r##"<line x1="{PADDING:.1}" y1="{y:.1}" x2="{:.1}" y2="{y:.1}" stroke="#999" stroke-dasharray="4 3"/>"##,
            WIDTH - PADDING
        );
    }
    for (k, s) in series.iter().enumerate() {
        let _ = writeln!(
            out,
            r#"<path d="{}" fill="none" stroke="{}" stroke-width="1.5"/>"#,
            line_path(&scale, s.values),
            PALETTE[k % PALETTE.len()]
        );
    }
    let labels: Vec<&str> = series.iter().map(|s| s.label).collect();
    legend(&mut out, &labels);

    out.push_str("</svg>\n");
    out
}

/// Stacked areas of non-negative columns, bottom to top in column order.
/// Undefined values count as zero.
pub fn stacked_area_chart(title: &str, dates: &[NaiveDate], columns: &[Series]) -> String {
    if dates.is_empty() || columns.is_empty() {
        return empty_chart(title);
    }

    let value = |v: f64| if v.is_finite() { v.max(0.0) } else { 0.0 };
    let mut lower = vec![0.0; dates.len()];
    let mut bands = Vec::with_capacity(columns.len());
    for column in columns {
        let upper: Vec<f64> = lower
            .iter()
            .zip(column.values)
            .map(|(lo, v)| lo + value(*v))
            .collect();
        bands.push((lower, upper.clone()));
        lower = upper;
    }
    let top = lower.iter().copied().fold(1.0, f64::max);

    let scale = Scale::new(dates.len(), 0.0, top);
    let mut out = String::new();
    open_document(&mut out, title);
    axes(&mut out, &scale, dates, true);

    for (k, (lo, hi)) in bands.iter().enumerate() {
        let mut d = String::new();
        for (i, v) in hi.iter().enumerate() {
            let cmd = if i == 0 { 'M' } else { 'L' };
            let _ = write!(d, "{cmd}{:.1},{:.1} ", scale.x(i), scale.y(*v));
        }
        for (i, v) in lo.iter().enumerate().rev() {
            let _ = write!(d, "L{:.1},{:.1} ", scale.x(i), scale.y(*v));
        }
        d.push('Z');
        let _ = writeln!(
            out,
            r#"<path d="{d}" fill="{}" fill-opacity="0.8" stroke="none"/>"#,
            PALETTE[k % PALETTE.len()]
        );
    }
    let labels: Vec<&str> = columns.iter().map(|s| s.label).collect();
    legend(&mut out, &labels);

    out.push_str("</svg>\n");
    out
}
