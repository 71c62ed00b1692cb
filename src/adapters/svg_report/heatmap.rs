//! Year × month heatmap of monthly returns.

use super::chart_svg::escape;
use crate::domain::metrics::MonthlyReturn;
use std::collections::BTreeMap;
use std::fmt::Write;

const CELL_WIDTH: f64 = 56.0;
const CELL_HEIGHT: f64 = 24.0;
const LEFT: f64 = 60.0;
const TOP: f64 = 50.0;
const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Red for losses, green for gains, white at zero; intensity relative to
/// the largest absolute monthly return.
fn color(value: f64, scale: f64) -> String {
    let t = if scale > 0.0 {
        (value.abs() / scale).min(1.0)
    } else {
        0.0
    };
    let fade = (255.0 * (1.0 - 0.75 * t)).round() as u8;
    if value >= 0.0 {
        format!("rgb({fade},255,{fade})")
    } else {
        format!("rgb(255,{fade},{fade})")
    }
}

pub fn monthly_heatmap(title: &str, monthly: &[MonthlyReturn]) -> String {
    let mut grid: BTreeMap<i32, [Option<f64>; 12]> = BTreeMap::new();
    for m in monthly {
        let row = grid.entry(m.year()).or_insert([None; 12]);
        row[(m.month() - 1) as usize] = Some(m.value);
    }
    let scale = monthly
        .iter()
        .map(|m| m.value.abs())
        .filter(|v| v.is_finite())
        .fold(0.0, f64::max);

    let width = LEFT + 12.0 * CELL_WIDTH + 20.0;
    let height = TOP + grid.len().max(1) as f64 * CELL_HEIGHT + 20.0;

    let mut out = String::new();
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width:.0}" height="{height:.0}" viewBox="0 0 {width:.0} {height:.0}" font-family="sans-serif" font-size="10">"#
    );
    out.push_str("<rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n");
    let _ = writeln!(
        out,
        r#"<text x="{:.1}" y="20" text-anchor="middle" font-size="14">{}</text>"#,
        width / 2.0,
        escape(title)
    );

    for (c, name) in MONTHS.iter().enumerate() {
        let _ = writeln!(
            out,
            r#"<text x="{:.1}" y="{:.1}" text-anchor="middle">{name}</text>"#,
            LEFT + (c as f64 + 0.5) * CELL_WIDTH,
            TOP - 6.0
        );
    }

    if grid.is_empty() {
        let _ = writeln!(
            out,
            r#"<text x="{:.1}" y="{:.1}" text-anchor="middle">No data available.</text>"#,
            width / 2.0,
            TOP + CELL_HEIGHT / 2.0
        );
    }

    for (r, (year, months)) in grid.iter().enumerate() {
        let y = TOP + r as f64 * CELL_HEIGHT;
        let _ = writeln!(
            out,
            r#"<text x="{:.1}" y="{:.1}" text-anchor="end">{year}</text>"#,
            LEFT - 6.0,
            y + CELL_HEIGHT / 2.0 + 4.0
        );
        for (c, value) in months.iter().enumerate() {
            let x = LEFT + c as f64 * CELL_WIDTH;
            let (fill, label) = match value {
                Some(v) if v.is_finite() => (color(*v, scale), format!("{:.1}%", v * 100.0)),
                _ => ("rgb(240,240,240)".to_string(), String::new()),
            };
            let _ = writeln!(
                out,
                r#"<rect x="{x:.1}" y="{y:.1}" width="{CELL_WIDTH:.1}" height="{CELL_HEIGHT:.1}" fill="{fill}" stroke="white"/><text x="{:.1}" y="{:.1}" text-anchor="middle">{label}</text>"#,
                x + CELL_WIDTH / 2.0,
                y + CELL_HEIGHT / 2.0 + 4.0
            );
        }
    }

    out.push_str("</svg>\n");
    out
}
