//! PNG charts for the analysis tables.
//!
//! Every chart has fixed cosmetic parameters; only the data, titles and axis
//! descriptions vary.

use crate::error::{plot_err, Result};
use crate::order_parameters::HeatmapGrid;
use crate::statistics::Histogram;
use plotters::prelude::*;
use std::collections::BTreeSet;
use std::f64::consts::PI;
use std::path::Path;

type DrawResult = std::result::Result<(), Box<dyn std::error::Error>>;

const POINT_BLUE: RGBColor = RGBColor(0, 114, 178);
const BAR_GREY: RGBColor = RGBColor(153, 153, 153);
const MISSING_GREY: RGBColor = RGBColor(230, 230, 230);

/// Fixed colors for named series, cycling through a qualitative palette otherwise.
fn series_color(index: usize) -> RGBColor {
    const COLORS: [RGBColor; 3] = [RGBColor(220, 40, 40), RGBColor(40, 160, 60), RGBColor(40, 70, 220)];
    match COLORS.get(index) {
        Some(c) => *c,
        None => {
            let c = Palette99::pick(index).to_rgba();
            RGBColor(c.0, c.1, c.2)
        }
    }
}

/// Padded `(min, max)` of a set of values, never an empty range.
fn padded_range<I: IntoIterator<Item = f64>>(values: I, pad_fraction: f64) -> (f64, f64) {
    let (lo, hi) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !lo.is_finite() {
        return (0.0, 1.0);
    }
    let pad = if hi > lo { (hi - lo) * pad_fraction } else { 0.5 };
    (lo - pad, hi + pad)
}

/// Deterministic horizontal offset in `[-0.5, 0.5)` for the `i`-th point of a strip.
fn jitter(i: usize) -> f64 {
    ((i * 7919) % 101) as f64 / 101.0 - 0.5
}

/// Strip plot: one column of points per category.
pub fn strip_plot(
    path: &Path,
    groups: &[(String, Vec<f64>)],
    title: &str,
    y_desc: &str,
    y_range: Option<(f64, f64)>,
) -> Result<()> {
    draw_strip(path, groups, title, y_desc, y_range).map_err(plot_err)
}

fn draw_strip(
    path: &Path,
    groups: &[(String, Vec<f64>)],
    title: &str,
    y_desc: &str,
    y_range: Option<(f64, f64)>,
) -> DrawResult {
    let (y_lo, y_hi) = y_range.unwrap_or_else(|| {
        padded_range(groups.iter().flat_map(|(_, v)| v.iter().copied()), 0.1)
    });
    let n = groups.len().max(1);

    let root = BitMapBackend::new(path, (1000, 620)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 22))
        .margin(15)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), y_lo..y_hi)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .y_desc(y_desc)
        .x_labels(n)
        .x_label_formatter(&|x| {
            let idx = x.round();
            if (x - idx).abs() > 1e-6 || idx < 0.0 {
                return String::new();
            }
            groups
                .get(idx as usize)
                .map(|(name, _)| name.to_owned())
                .unwrap_or_default()
        })
        .draw()?;

    for (gi, (_, values)) in groups.iter().enumerate() {
        let points: Vec<(f64, f64)> = values
            .iter()
            .enumerate()
            .map(|(i, v)| (gi as f64 + 0.3 * jitter(i), *v))
            .collect();
        chart.draw_series(
            points
                .iter()
                .map(|&(x, y)| Circle::new((x, y), 6, POINT_BLUE.filled())),
        )?;
        chart.draw_series(
            points
                .iter()
                .map(|&(x, y)| Circle::new((x, y), 6, BLACK.stroke_width(1))),
        )?;
    }

    root.present()?;
    Ok(())
}

/// Line chart of one or more labelled series sharing the x axis.
pub fn line_plot(
    path: &Path,
    series: &[(String, Vec<(f64, f64)>)],
    title: &str,
    x_desc: &str,
    y_desc: &str,
) -> Result<()> {
    draw_lines(path, series, title, x_desc, y_desc).map_err(plot_err)
}

fn draw_lines(
    path: &Path,
    series: &[(String, Vec<(f64, f64)>)],
    title: &str,
    x_desc: &str,
    y_desc: &str,
) -> DrawResult {
    let all = || series.iter().flat_map(|(_, pts)| pts.iter().copied());
    let (x_lo, x_hi) = padded_range(all().map(|p| p.0), 0.0);
    let (y_lo, y_hi) = padded_range(all().map(|p| p.1), 0.05);

    let root = BitMapBackend::new(path, (1200, 600)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 22))
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(70)
        .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)?;

    chart
        .configure_mesh()
        .x_desc(x_desc)
        .y_desc(y_desc)
        .light_line_style(BLACK.mix(0.05))
        .draw()?;

    for (i, (label, points)) in series.iter().enumerate() {
        let color = series_color(i);
        chart
            .draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(2)))?
            .label(label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
    }

    if series.len() > 1 {
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }

    root.present()?;
    Ok(())
}

/// Histogram bars with the summary statistics printed in the upper right corner.
pub fn histogram_plot(
    path: &Path,
    histogram: &Histogram,
    summary_text: Option<&str>,
    title: &str,
    x_desc: &str,
) -> Result<()> {
    draw_histogram(path, histogram, summary_text, title, x_desc).map_err(plot_err)
}

fn draw_histogram(
    path: &Path,
    histogram: &Histogram,
    summary_text: Option<&str>,
    title: &str,
    x_desc: &str,
) -> DrawResult {
    let x_lo = histogram.edges.first().copied().unwrap_or(0.0);
    let x_hi = histogram.edges.last().copied().unwrap_or(1.0);
    let y_max = histogram.counts.iter().copied().max().unwrap_or(0).max(1) as f64 * 1.1;

    let (width, height) = (1000u32, 600u32);
    let root = BitMapBackend::new(path, (width, height)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 22))
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(60)
        .build_cartesian_2d(x_lo..x_hi, 0.0..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc(x_desc)
        .y_desc("Frequency")
        .y_label_formatter(&|y| format!("{y:.0}"))
        .draw()?;

    let bars = histogram
        .edges
        .windows(2)
        .zip(histogram.counts.iter())
        .map(|(edge, &count)| [(edge[0], 0.0), (edge[1], count as f64)]);
    chart.draw_series(bars.clone().map(|b| Rectangle::new(b, BAR_GREY.mix(0.8).filled())))?;
    chart.draw_series(bars.map(|b| Rectangle::new(b, BLACK.stroke_width(1))))?;

    if let Some(text) = summary_text {
        let lines: Vec<&str> = text.lines().collect();
        let line_height = 18;
        let box_w = 230;
        let box_h = line_height * lines.len() as i32 + 12;
        let x0 = width as i32 - box_w - 40;
        let y0 = 60;
        root.draw(&Rectangle::new(
            [(x0, y0), (x0 + box_w, y0 + box_h)],
            WHITE.filled(),
        ))?;
        root.draw(&Rectangle::new(
            [(x0, y0), (x0 + box_w, y0 + box_h)],
            RGBColor(128, 128, 128).stroke_width(1),
        ))?;
        for (i, line) in lines.iter().enumerate() {
            root.draw(&Text::new(
                line.to_string(),
                (x0 + 8, y0 + 6 + i as i32 * line_height),
                ("sans-serif", 14).into_font().color(&BLACK),
            ))?;
        }
    }

    root.present()?;
    Ok(())
}

/// Filled density curves, one per labelled group.
pub fn density_plot(
    path: &Path,
    curves: &[(String, Vec<(f64, f64)>)],
    title: &str,
    x_desc: &str,
) -> Result<()> {
    draw_density(path, curves, title, x_desc).map_err(plot_err)
}

fn draw_density(
    path: &Path,
    curves: &[(String, Vec<(f64, f64)>)],
    title: &str,
    x_desc: &str,
) -> DrawResult {
    let all = || curves.iter().flat_map(|(_, pts)| pts.iter().copied());
    let (x_lo, x_hi) = padded_range(all().map(|p| p.0), 0.0);
    let y_max = all().map(|p| p.1).fold(0.0, f64::max).max(1e-6) * 1.1;

    let root = BitMapBackend::new(path, (900, 680)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 22))
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(70)
        .build_cartesian_2d(x_lo..x_hi, 0.0..y_max)?;

    chart
        .configure_mesh()
        .x_desc(x_desc)
        .y_desc("Density")
        .light_line_style(BLACK.mix(0.05))
        .draw()?;

    for (i, (label, points)) in curves.iter().enumerate() {
        let color = series_color(i);
        chart
            .draw_series(
                AreaSeries::new(points.iter().copied(), 0.0, color.mix(0.35))
                    .border_style(color.stroke_width(2)),
            )?
            .label(label.as_str())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 20, y + 5)], color.mix(0.5).filled()));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

/// Blue-white-red color for `value` on a symmetric scale of half-width `max_abs`.
pub fn diverging_color(value: f64, max_abs: f64) -> RGBColor {
    let t = if max_abs > 0.0 {
        (value / max_abs).clamp(-1.0, 1.0)
    } else {
        0.0
    };
    let fade = |c: u8, t: f64| (255.0 + (c as f64 - 255.0) * t).round() as u8;
    if t >= 0.0 {
        RGBColor(fade(180, t), fade(4, t), fade(38, t))
    } else {
        RGBColor(fade(59, -t), fade(76, -t), fade(192, -t))
    }
}

/// Heatmap of a pair-by-residue grid; missing cells are drawn light grey.
pub fn heatmap_plot(path: &Path, grid: &HeatmapGrid, title: &str) -> Result<()> {
    draw_heatmap(path, grid, title).map_err(plot_err)
}

fn draw_heatmap(path: &Path, grid: &HeatmapGrid, title: &str) -> DrawResult {
    let n_cols = grid.columns.len().max(1) as i32;
    let n_rows = grid.rows.len().max(1) as i32;
    let max_abs = grid.max_abs();
    let width = (300 + 8 * n_cols).clamp(800, 4000) as u32;
    let height = (160 + 30 * n_rows).clamp(300, 3000) as u32;

    let root = BitMapBackend::new(path, (width, height)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!("{title} (|ΔS²| ≤ {max_abs:.2})"),
            ("sans-serif", 20),
        )
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(140)
        .build_cartesian_2d(0i32..n_cols, 0i32..n_rows)?;

    let x_step = (n_cols / 20).max(1);
    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc("Residue")
        .x_labels(n_cols as usize)
        .y_labels(n_rows as usize)
        .x_label_formatter(&|x| {
            if x % x_step != 0 {
                return String::new();
            }
            grid.columns
                .get(*x as usize)
                .map(|r| r.to_string())
                .unwrap_or_default()
        })
        .y_label_formatter(&|y| grid.rows.get(*y as usize).cloned().unwrap_or_default())
        .draw()?;

    for (y, row) in grid.values.iter().enumerate() {
        chart.draw_series(row.iter().enumerate().map(|(x, value)| {
            let color = match value {
                Some(v) => diverging_color(*v, max_abs),
                None => MISSING_GREY,
            };
            Rectangle::new(
                [(x as i32, y as i32), (x as i32 + 1, y as i32 + 1)],
                color.filled(),
            )
        }))?;
    }

    root.present()?;
    Ok(())
}

/// Positions of `n` nodes evenly spaced on the unit circle.
pub fn circular_layout(n: usize) -> Vec<(f64, f64)> {
    (0..n)
        .map(|i| {
            let angle = 2.0 * PI * i as f64 / n.max(1) as f64;
            (angle.cos(), angle.sin())
        })
        .collect()
}

/// Weighted network on a circular layout; edge width and opacity follow the weight.
pub fn network_plot(path: &Path, edges: &[(String, String, f64)], title: &str) -> Result<()> {
    draw_network(path, edges, title).map_err(plot_err)
}

fn draw_network(path: &Path, edges: &[(String, String, f64)], title: &str) -> DrawResult {
    let nodes: Vec<&str> = edges
        .iter()
        .flat_map(|(a, b, _)| [a.as_str(), b.as_str()])
        .collect::<BTreeSet<&str>>()
        .into_iter()
        .collect();
    let layout = circular_layout(nodes.len());
    let position = |name: &str| -> (f64, f64) {
        nodes
            .binary_search(&name)
            .map(|i| layout[i])
            .unwrap_or((0.0, 0.0))
    };

    let root = BitMapBackend::new(path, (1400, 1400)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 24))
        .margin(40)
        .build_cartesian_2d(-1.25f64..1.25f64, -1.25f64..1.25f64)?;

    for (a, b, weight) in edges {
        let w = weight.clamp(0.0, 1.0);
        let style = POINT_BLUE.mix(0.15 + 0.6 * w).stroke_width(1 + (4.0 * w).round() as u32);
        chart.draw_series(std::iter::once(PathElement::new(
            vec![position(a), position(b)],
            style,
        )))?;
    }

    chart.draw_series(
        layout
            .iter()
            .map(|&p| Circle::new(p, 5, RGBColor(255, 170, 60).filled())),
    )?;
    chart.draw_series(nodes.iter().zip(layout.iter()).map(|(name, &(x, y))| {
        Text::new(
            name.to_string(),
            (x * 1.08, y * 1.08),
            ("sans-serif", 11).into_font().color(&BLACK),
        )
    }))?;

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diverging_scale_is_symmetric() {
        assert_eq!(diverging_color(0.0, 1.0), RGBColor(255, 255, 255));
        assert_eq!(diverging_color(1.0, 1.0), RGBColor(180, 4, 38));
        assert_eq!(diverging_color(-2.0, 1.0), RGBColor(59, 76, 192));
        assert_eq!(diverging_color(0.3, 0.0), RGBColor(255, 255, 255));
    }

    #[test]
    fn nodes_are_spread_on_the_unit_circle() {
        let layout = circular_layout(4);
        assert_eq!(layout.len(), 4);
        for (x, y) in &layout {
            assert!(((x * x + y * y) - 1.0).abs() < 1e-12);
        }
        assert!((layout[2].0 + 1.0).abs() < 1e-12);
    }

    #[test]
    fn ranges_are_padded_and_never_empty() {
        assert_eq!(padded_range([1.0, 3.0], 0.5), (0.0, 4.0));
        assert_eq!(padded_range([2.0], 0.1), (1.5, 2.5));
        assert_eq!(padded_range(std::iter::empty(), 0.1), (0.0, 1.0));
        assert!((-0.5..0.5).contains(&jitter(12345)));
    }
}
