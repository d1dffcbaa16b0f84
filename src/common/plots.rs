//! Plotting infrastructure for ratio curves and overview charts
//!
//! This module renders charts using the [`plotters`] crate. Charts are saved as PNG files
//! through the bitmap backend so they can be produced in headless environments (Docker/CI).

use crate::common::data_structures::Point;
use crate::stats::regression::LinearFit;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during plot generation
#[derive(Error, Debug)]
pub enum PlotError {
    #[error("Failed to create drawing area: {0}")]
    DrawingArea(String),

    #[error("Failed to configure chart: {0}")]
    ChartConfig(String),

    #[error("Failed to draw chart elements: {0}")]
    Drawing(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

type Result<T> = core::result::Result<T, PlotError>;

/// Everything drawn on one normalized-duration chart
#[derive(Debug, Clone)]
pub struct RatioChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// Normalized durations, drawn as faint markers
    pub points: Vec<Point>,
    /// Regression of the ratio curve, drawn as a line across the observed range
    pub fit: Option<LinearFit>,
    /// Population-weighted mean ratio, drawn as a horizontal reference line
    pub mean_ratio: Option<f64>,
    /// Smoothed lower envelope
    pub lower: Vec<Point>,
    /// Smoothed upper envelope
    pub upper: Vec<Point>,
}

/// Inclusive-exclusive bounds of a data range, widened when degenerate
fn axis_range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let (min, max) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });

    if min > max {
        return None;
    }
    if min == max {
        let pad = if min == 0.0 { 1.0 } else { min.abs() * 0.1 };
        return Some((min - pad, max + pad));
    }
    Some((min, max))
}

/// Upper bound of a y-axis starting at zero, with a little headroom
fn y_upper_bound(values: impl Iterator<Item = f64>) -> f64 {
    let max = values
        .filter(|v| v.is_finite())
        .fold(f64::NEG_INFINITY, f64::max);
    if max > 0.0 {
        max * 1.1
    } else {
        1.0
    }
}

/// Renders a [`RatioChart`] to a PNG file
///
/// The chart shows the normalized points, the regression line labelled with its
/// correlation coefficient, the weighted mean ratio, and the smoothed lower (blue) and
/// upper (red) envelopes. The y-axis always starts at zero.
///
/// # Arguments
/// * `chart` - The data to draw
/// * `output_path` - Path where the PNG file should be saved
/// * `size` - Resolution in pixels
///
/// # Returns
/// * `Ok(())` - If the chart was successfully created and saved
/// * `Err(PlotError)` - If the data is empty or an error occurred during drawing
pub fn create_ratio_plot(chart: &RatioChart, output_path: &Path, size: (u32, u32)) -> Result<()> {
    if chart.points.is_empty() {
        return Err(PlotError::InvalidData("Data cannot be empty".to_string()));
    }

    let (x_min, x_max) = axis_range(chart.points.iter().map(|p| p.x))
        .ok_or_else(|| PlotError::InvalidData("No finite x values".to_string()))?;

    let fit_ends = chart
        .fit
        .iter()
        .flat_map(|fit| [fit.predict(x_min), fit.predict(x_max)]);
    let y_max = y_upper_bound(
        chart
            .points
            .iter()
            .chain(&chart.lower)
            .chain(&chart.upper)
            .map(|p| p.y)
            .chain(chart.mean_ratio)
            .chain(fit_ends),
    );

    let root = BitMapBackend::new(output_path, size).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| PlotError::DrawingArea(e.to_string()))?;

    let mut chart_context = ChartBuilder::on(&root)
        .caption(&chart.title, ("sans-serif", 30))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(100)
        .build_cartesian_2d(x_min..x_max, 0.0..y_max)
        .map_err(|e| PlotError::ChartConfig(e.to_string()))?;

    chart_context
        .configure_mesh()
        .x_desc(chart.x_label.as_str())
        .y_desc(chart.y_label.as_str())
        .label_style(("sans-serif", 18))
        .light_line_style(BLACK.mix(0.05))
        .x_label_formatter(&|x| format!("{:.0}", x))
        .y_label_formatter(&|y| format!("{:.3e}", y))
        .draw()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    chart_context
        .draw_series(
            chart
                .points
                .iter()
                .map(|p| Circle::new((p.x, p.y), 4, BLUE.mix(0.1).filled())),
        )
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    if let Some(fit) = chart.fit {
        chart_context
            .draw_series(LineSeries::new(
                [(x_min, fit.predict(x_min)), (x_max, fit.predict(x_max))],
                GREEN.stroke_width(2),
            ))
            .map_err(|e| PlotError::Drawing(e.to_string()))?
            .label(format!("Linear Fit (r={:.2})", fit.r))
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], GREEN));
    }

    if let Some(mean) = chart.mean_ratio {
        chart_context
            .draw_series(LineSeries::new(
                [(x_min, mean), (x_max, mean)],
                BLACK.mix(0.5),
            ))
            .map_err(|e| PlotError::Drawing(e.to_string()))?
            .label(format!("Weighted mean ({:.3e})", mean))
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLACK.mix(0.5)));
    }

    for (envelope, color, label) in [
        (&chart.lower, BLUE, "Lower envelope"),
        (&chart.upper, RED, "Upper envelope"),
    ] {
        if envelope.is_empty() {
            continue;
        }
        chart_context
            .draw_series(LineSeries::new(
                envelope.iter().map(|p| (p.x, p.y)),
                color.stroke_width(2),
            ))
            .map_err(|e| PlotError::Drawing(e.to_string()))?
            .label(label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }

    chart_context
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    root.present()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    Ok(())
}

/// One bar of a histogram
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Splits `values` into `bins` equal-width bins spanning their range
///
/// The last bin includes the maximum value. Returns no bins for empty input.
pub fn histogram_bins(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    let Some((min, max)) = axis_range(values.iter().copied()) else {
        return Vec::new();
    };
    if bins == 0 {
        return Vec::new();
    }

    let width = (max - min) / bins as f64;
    let mut histogram: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            start: min + width * i as f64,
            end: min + width * (i + 1) as f64,
            count: 0,
        })
        .collect();

    for value in values.iter().filter(|v| v.is_finite()) {
        let index = (((value - min) / width) as usize).min(bins - 1);
        histogram[index].count += 1;
    }

    histogram
}

/// Renders a histogram of `values` to a PNG file
pub fn create_histogram_plot(
    values: &[f64],
    bins: usize,
    title: &str,
    x_label: &str,
    output_path: &Path,
    size: (u32, u32),
) -> Result<()> {
    let histogram = histogram_bins(values, bins);
    let (Some(first), Some(last)) = (histogram.first(), histogram.last()) else {
        return Err(PlotError::InvalidData("Data cannot be empty".to_string()));
    };

    let y_max = y_upper_bound(histogram.iter().map(|bin| bin.count as f64));

    let root = BitMapBackend::new(output_path, size).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| PlotError::DrawingArea(e.to_string()))?;

    let mut chart_context = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 30))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(80)
        .build_cartesian_2d(first.start..last.end, 0.0..y_max)
        .map_err(|e| PlotError::ChartConfig(e.to_string()))?;

    chart_context
        .configure_mesh()
        .x_desc(x_label)
        .y_desc("Frequency")
        .label_style(("sans-serif", 18))
        .light_line_style(BLACK.mix(0.05))
        .y_label_formatter(&|y| format!("{:.0}", y))
        .draw()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    chart_context
        .draw_series(histogram.iter().map(|bin| {
            Rectangle::new(
                [(bin.start, 0.0), (bin.end, bin.count as f64)],
                BLUE.mix(0.6).filled(),
            )
        }))
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    root.present()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    Ok(())
}

/// Renders one scatter series per named group to a PNG file, each in its own colour
pub fn create_grouped_scatter_plot(
    groups: &[(String, Vec<Point>)],
    title: &str,
    x_label: &str,
    y_label: &str,
    output_path: &Path,
    size: (u32, u32),
) -> Result<()> {
    let all_points = || groups.iter().flat_map(|(_, points)| points.iter());
    let (x_min, x_max) = axis_range(all_points().map(|p| p.x))
        .ok_or_else(|| PlotError::InvalidData("Data cannot be empty".to_string()))?;
    let y_max = y_upper_bound(all_points().map(|p| p.y));

    let root = BitMapBackend::new(output_path, size).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| PlotError::DrawingArea(e.to_string()))?;

    let mut chart_context = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 30))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(80)
        .build_cartesian_2d(x_min..x_max, 0.0..y_max)
        .map_err(|e| PlotError::ChartConfig(e.to_string()))?;

    chart_context
        .configure_mesh()
        .x_desc(x_label)
        .y_desc(y_label)
        .label_style(("sans-serif", 18))
        .light_line_style(BLACK.mix(0.05))
        .draw()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    for (index, (name, points)) in groups.iter().enumerate() {
        let color = Palette99::pick(index).to_rgba();
        chart_context
            .draw_series(
                points
                    .iter()
                    .map(move |p| Circle::new((p.x, p.y), 3, color.mix(0.6).filled())),
            )
            .map_err(|e| PlotError::Drawing(e.to_string()))?
            .label(name.as_str())
            .legend(move |(x, y)| Circle::new((x, y), 4, color.filled()));
    }

    chart_context
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    root.present()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    Ok(())
}

/// Renders a scatter plot whose markers are coloured by a third value on a viridis scale
///
/// # Arguments
/// * `points` - Each point with the value that picks its colour
/// * `output_path` - Path where the PNG file should be saved
/// * `size` - Resolution in pixels
pub fn create_colored_scatter_plot(
    points: &[(Point, f64)],
    title: &str,
    x_label: &str,
    y_label: &str,
    output_path: &Path,
    size: (u32, u32),
) -> Result<()> {
    let (x_min, x_max) = axis_range(points.iter().map(|(p, _)| p.x))
        .ok_or_else(|| PlotError::InvalidData("Data cannot be empty".to_string()))?;
    let y_max = y_upper_bound(points.iter().map(|(p, _)| p.y));
    let (c_min, c_max) = axis_range(points.iter().map(|(_, c)| *c)).unwrap_or((0.0, 1.0));

    let root = BitMapBackend::new(output_path, size).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| PlotError::DrawingArea(e.to_string()))?;

    let mut chart_context = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 30))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(80)
        .build_cartesian_2d(x_min..x_max, 0.0..y_max)
        .map_err(|e| PlotError::ChartConfig(e.to_string()))?;

    chart_context
        .configure_mesh()
        .x_desc(x_label)
        .y_desc(y_label)
        .label_style(("sans-serif", 18))
        .light_line_style(BLACK.mix(0.05))
        .draw()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    chart_context
        .draw_series(points.iter().map(|(p, c)| {
            let color = ViridisRGB::get_color_normalized(*c, c_min, c_max);
            Circle::new((p.x, p.y), 4, color.mix(0.7).filled())
        }))
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    root.present()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    Ok(())
}

/// Samples of one box-plot series, split by category
#[derive(Debug, Clone, PartialEq)]
pub struct BoxSeries {
    pub name: String,
    /// One sample per category of the owning [`BoxChart`], in the same order
    pub values: Vec<Vec<f64>>,
}

/// Everything drawn on one box-plot chart
#[derive(Debug, Clone)]
pub struct BoxChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub categories: Vec<String>,
    /// Series are drawn side by side within each category; a legend is added for more than one
    pub series: Vec<BoxSeries>,
    /// Plot `log10` of the values, labelling the axis in the original units
    pub log_scale: bool,
}

/// Quartiles of the plottable values of one box, or `None` if there are none
///
/// Non-finite values are dropped, as are non-positive ones on a log scale.
fn box_quartiles(values: &[f64], log_scale: bool) -> Option<Quartiles> {
    let kept: Vec<f64> = values
        .iter()
        .copied()
        .filter(|v| v.is_finite() && (!log_scale || *v > 0.0))
        .map(|v| if log_scale { v.log10() } else { v })
        .collect();

    (!kept.is_empty()).then(|| Quartiles::new(&kept))
}

fn segment_label(value: &SegmentValue<&String>) -> String {
    match value {
        SegmentValue::Exact(name) | SegmentValue::CenterOf(name) => name.to_string(),
        SegmentValue::Last => String::new(),
    }
}

/// Renders a [`BoxChart`] to a PNG file
///
/// Boxes span the quartiles; whiskers end at the 1.5 IQR fences.
pub fn create_box_plot(chart: &BoxChart, output_path: &Path, size: (u32, u32)) -> Result<()> {
    let boxes: Vec<Vec<Option<Quartiles>>> = chart
        .series
        .iter()
        .map(|series| {
            series
                .values
                .iter()
                .map(|values| box_quartiles(values, chart.log_scale))
                .collect()
        })
        .collect();

    let (y_min, y_max) = axis_range(
        boxes
            .iter()
            .flatten()
            .flatten()
            .flat_map(|quartiles| quartiles.values())
            .map(f64::from),
    )
    .ok_or_else(|| PlotError::InvalidData("Data cannot be empty".to_string()))?;
    let pad = (y_max - y_min) * 0.05;

    let root = BitMapBackend::new(output_path, size).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| PlotError::DrawingArea(e.to_string()))?;

    let mut chart_context = ChartBuilder::on(&root)
        .caption(&chart.title, ("sans-serif", 30))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(80)
        .build_cartesian_2d(
            chart.categories[..].into_segmented(),
            (y_min - pad) as f32..(y_max + pad) as f32,
        )
        .map_err(|e| PlotError::ChartConfig(e.to_string()))?;

    let log_scale = chart.log_scale;
    chart_context
        .configure_mesh()
        .x_desc(chart.x_label.as_str())
        .y_desc(chart.y_label.as_str())
        .x_labels(chart.categories.len())
        .label_style(("sans-serif", 18))
        .light_line_style(BLACK.mix(0.05))
        .x_label_formatter(&segment_label)
        .y_label_formatter(&|y: &f32| {
            if log_scale {
                format!("{:.3}", 10f32.powf(*y))
            } else {
                format!("{:.2}", y)
            }
        })
        .draw()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    let count = chart.series.len();
    let width = (160 / count.max(1)).clamp(8, 40) as u32;
    for (index, (series, quartiles)) in chart.series.iter().zip(&boxes).enumerate() {
        let color = Palette99::pick(index).to_rgba();
        let offset = (index as f64 - (count as f64 - 1.0) / 2.0) * f64::from(width + 4);

        let annotation = chart_context
            .draw_series(chart.categories.iter().zip(quartiles).filter_map(
                |(category, quartiles)| {
                    quartiles.as_ref().map(|quartiles| {
                        Boxplot::new_vertical(SegmentValue::CenterOf(category), quartiles)
                            .width(width)
                            .whisker_width(0.5)
                            .style(color.stroke_width(2))
                            .offset(offset)
                    })
                },
            ))
            .map_err(|e| PlotError::Drawing(e.to_string()))?;

        if count > 1 {
            annotation
                .label(series.name.as_str())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
        }
    }

    if count > 1 {
        chart_context
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(|e| PlotError::Drawing(e.to_string()))?;
    }

    root.present()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    Ok(())
}

/// Fill colour of a correlation cell: blue for negative, white at zero, red for positive
fn correlation_color(r: f64) -> RGBColor {
    let fade = |strength: f64| (255.0 * (1.0 - strength.clamp(0.0, 1.0))).round() as u8;
    if r >= 0.0 {
        RGBColor(255, fade(r), fade(r))
    } else {
        RGBColor(fade(-r), fade(-r), 255)
    }
}

/// Renders a square correlation matrix as a heatmap with the coefficient written in each cell
///
/// `None` entries (undefined correlations) are drawn grey and labelled `n/a`.
pub fn create_correlation_heatmap(
    labels: &[String],
    matrix: &[Vec<Option<f64>>],
    title: &str,
    output_path: &Path,
    size: (u32, u32),
) -> Result<()> {
    let n = labels.len();
    if n == 0 || matrix.len() != n || matrix.iter().any(|row| row.len() != n) {
        return Err(PlotError::InvalidData(
            "Correlation matrix must be square and match its labels".to_string(),
        ));
    }

    let root = BitMapBackend::new(output_path, size).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| PlotError::DrawingArea(e.to_string()))?;

    let mut chart_context = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 30))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(140)
        .build_cartesian_2d(labels[..].into_segmented(), labels[..].into_segmented())
        .map_err(|e| PlotError::ChartConfig(e.to_string()))?;

    chart_context
        .configure_mesh()
        .disable_mesh()
        .x_labels(n)
        .y_labels(n)
        .label_style(("sans-serif", 18))
        .x_label_formatter(&segment_label)
        .y_label_formatter(&segment_label)
        .draw()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    let edge = |i: usize| labels.get(i).map_or(SegmentValue::Last, SegmentValue::Exact);
    let cells = move || (0..n).flat_map(move |row| (0..n).map(move |column| (row, column)));

    chart_context
        .draw_series(cells().map(|(row, column)| {
            let fill = matrix[row][column].map_or(RGBColor(220, 220, 220), correlation_color);
            Rectangle::new(
                [(edge(column), edge(row)), (edge(column + 1), edge(row + 1))],
                fill.filled(),
            )
        }))
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    chart_context
        .draw_series(cells().map(|(row, column)| {
            let value = matrix[row][column];
            let color: &'static RGBColor = if value.is_some_and(|r| r.abs() > 0.5) {
                &WHITE
            } else {
                &BLACK
            };
            let style = TextStyle::from(("sans-serif", 22).into_font())
                .color(color)
                .pos(Pos::new(HPos::Center, VPos::Center));
            EmptyElement::at((
                SegmentValue::CenterOf(&labels[column]),
                SegmentValue::CenterOf(&labels[row]),
            )) + Text::new(
                value.map_or_else(|| "n/a".to_string(), |r| format!("{:.2}", r)),
                (0, 0),
                style,
            )
        }))
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    root.present()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    Ok(())
}
