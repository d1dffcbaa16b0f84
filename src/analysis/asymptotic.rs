//! Asymptotic complexity analysis
//!
//! For every (generator, operation, matrix type) series this module filters the grouped
//! durations, normalizes them by each candidate growth model, fits the ratio curves and
//! renders one chart per model. A ranking of the models per series is written alongside.

use crate::common::data_structures::{BenchmarkRecord, Point};
use crate::common::paths::sanitize_component;
use crate::common::plots::{create_ratio_plot, RatioChart};
use crate::common::PlotError;
use crate::config::{AnalysisConfig, RecordStatistic};
use crate::stats::filters::{envelope_filter, rolling_outlier_filter, EnvelopeKind};
use crate::stats::grouping::{group_mean, GroupKey};
use crate::stats::models::{rank_models, AsymptoticModel, ModelFit};
use crate::stats::regression::{fit_points, weighted_mean, LinearFit};
use crate::stats::smoothing::savgol_smooth;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tabled::{Table, Tabled};
use tracing::{info, warn};

/// Errors that can occur during asymptotic analysis
#[derive(Debug)]
pub enum AsymptoticError {
    FileWrite(std::io::Error),
    PlotGeneration(PlotError),
}

impl std::fmt::Display for AsymptoticError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AsymptoticError::FileWrite(e) => write!(f, "Failed to write file: {}", e),
            AsymptoticError::PlotGeneration(e) => write!(f, "Failed to generate plot: {}", e),
        }
    }
}

impl std::error::Error for AsymptoticError {}

impl From<std::io::Error> for AsymptoticError {
    fn from(err: std::io::Error) -> Self {
        AsymptoticError::FileWrite(err)
    }
}

impl From<PlotError> for AsymptoticError {
    fn from(err: PlotError) -> Self {
        AsymptoticError::PlotGeneration(err)
    }
}

type Result<T> = core::result::Result<T, AsymptoticError>;

/// Identifies one population-vs-duration series
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SeriesKey {
    pub generator: String,
    pub operation: String,
    pub matrix_type: String,
}

impl SeriesKey {
    /// Location of the chart for `model`, relative to the output root
    pub fn plot_path(&self, model: AsymptoticModel) -> PathBuf {
        PathBuf::from(sanitize_component(&self.matrix_type))
            .join(sanitize_component(&self.operation))
            .join(format!(
                "{}_{}_matrix_performance.png",
                model.name(),
                sanitize_component(&self.generator)
            ))
    }
}

impl std::fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} / {} / {}", self.matrix_type, self.operation, self.generator)
    }
}

/// One ratio curve: a series normalized by a single model
#[derive(Debug, Clone)]
pub struct ModelCurve {
    pub model: AsymptoticModel,
    pub normalized: Vec<Point>,
    pub fit: Option<LinearFit>,
    pub mean_ratio: Option<f64>,
    /// Smoothed lower envelope of the ratio curve
    pub lower: Vec<Point>,
    /// Smoothed upper envelope of the ratio curve
    pub upper: Vec<Point>,
}

/// Result of analyzing one series
#[derive(Debug, Clone)]
pub struct SeriesAnalysis {
    /// Points left after the population cut and rolling outlier filter
    pub filtered: Vec<Point>,
    /// Points dropped by the rolling outlier filter
    pub removed: usize,
    pub curves: Vec<ModelCurve>,
    /// Models ordered from best to worst match
    pub ranking: Vec<ModelFit>,
}

/// Groups records into `(population, duration)` series
///
/// Each record contributes one value (its minimum or mean duration, per `statistic`);
/// records sharing operation, matrix type, generator and population are averaged.
/// Records without samples are skipped.
pub fn build_series(
    records: &[BenchmarkRecord],
    statistic: RecordStatistic,
) -> BTreeMap<SeriesKey, Vec<Point>> {
    let mut skipped = 0usize;
    let values = records.iter().filter_map(|record| {
        let value = match statistic {
            RecordStatistic::Minimum => record.min_duration_nanos(),
            RecordStatistic::Mean => record.mean_duration_nanos(),
        };
        if value.is_none() {
            skipped += 1;
        }

        value.map(|value| {
            let key = GroupKey {
                operation: record.operation.clone(),
                matrix_type: record.matrix_type.clone(),
                generator: record.generator.clone(),
                population: record.population,
            };
            (key, value)
        })
    });
    let grouped = group_mean(values);

    if skipped > 0 {
        warn!(skipped, "skipped records without duration samples");
    }

    let mut series: BTreeMap<SeriesKey, Vec<Point>> = BTreeMap::new();
    for (key, mean) in grouped {
        series
            .entry(SeriesKey {
                generator: key.generator,
                operation: key.operation,
                matrix_type: key.matrix_type,
            })
            .or_default()
            .push(Point::new(key.population as f64, mean));
    }

    series
}

/// Runs the filtering and fitting pipeline on one series
///
/// Returns `None` if nothing survives the population cut.
pub fn analyze_series(points: &[Point], config: &AnalysisConfig) -> Option<SeriesAnalysis> {
    let min_population = config.min_population as f64;
    let candidates: Vec<Point> = points
        .iter()
        .copied()
        .filter(|p| p.x > min_population)
        .collect();
    if candidates.is_empty() {
        return None;
    }

    let rolling = rolling_outlier_filter(
        &candidates,
        config.rolling_filter.window,
        config.rolling_filter.threshold,
    );
    let filtered = rolling.kept;

    let curves = AsymptoticModel::ALL
        .iter()
        .map(|&model| model_curve(model, &filtered, config))
        .collect();
    let ranking = rank_models(&filtered);

    Some(SeriesAnalysis {
        filtered,
        removed: rolling.removed,
        curves,
        ranking,
    })
}

/// Normalizes `points` by `model` and derives the chart curves from the ratios
///
/// The envelopes are taken over the normalized ratios, not the raw durations, so the lower
/// envelope of every chart is non-increasing in its own units.
fn model_curve(model: AsymptoticModel, points: &[Point], config: &AnalysisConfig) -> ModelCurve {
    let normalized = model.normalize(points);
    let smooth = |kind| {
        let envelope = envelope_filter(&normalized, kind).kept;
        let ys: Vec<f64> = envelope.iter().map(|p| p.y).collect();
        let smoothed = savgol_smooth(
            &ys,
            config.smoothing.window_length,
            config.smoothing.polyorder,
        );
        envelope
            .iter()
            .zip(smoothed)
            .map(|(p, y)| Point::new(p.x, y))
            .collect::<Vec<Point>>()
    };

    ModelCurve {
        model,
        fit: fit_points(&normalized),
        mean_ratio: weighted_mean(&normalized),
        lower: smooth(EnvelopeKind::Lower),
        upper: smooth(EnvelopeKind::Upper),
        normalized,
    }
}

impl ModelCurve {
    fn chart(&self, key: &SeriesKey) -> RatioChart {
        RatioChart {
            title: format!(
                "Matrix operation performance: {} (model {})",
                key,
                self.model.formula()
            ),
            x_label: "Population".to_string(),
            y_label: format!("Duration / {} (ns)", self.model.formula()),
            points: self.normalized.clone(),
            fit: self.fit,
            mean_ratio: self.mean_ratio,
            lower: self.lower.clone(),
            upper: self.upper.clone(),
        }
    }
}

#[derive(Tabled)]
struct RankingRow {
    #[tabled(rename = "Rank")]
    rank: usize,
    #[tabled(rename = "Model")]
    model: &'static str,
    #[tabled(rename = "Drift")]
    drift: String,
    #[tabled(rename = "Mean ratio")]
    mean_ratio: String,
    #[tabled(rename = "Slope")]
    slope: String,
    #[tabled(rename = "Std err")]
    std_err: String,
    #[tabled(rename = "r")]
    r: String,
    #[tabled(rename = "p-value")]
    p_value: String,
}

/// Formats the model ranking of one series as an ASCII table
pub fn format_ranking(key: &SeriesKey, analysis: &SeriesAnalysis) -> String {
    let title = format!(
        "{} ({} points, {} outliers removed)",
        key,
        analysis.filtered.len(),
        analysis.removed
    );

    if analysis.ranking.is_empty() {
        return format!("{}\n{}\nNot enough data to fit models", title, "=".repeat(title.len()));
    }

    let rows: Vec<RankingRow> = analysis
        .ranking
        .iter()
        .enumerate()
        .map(|(index, fit)| RankingRow {
            rank: index + 1,
            model: fit.model.name(),
            drift: format!("{:.4}", fit.drift),
            mean_ratio: format!("{:.4e}", fit.mean_ratio),
            slope: format!("{:.4e}", fit.fit.slope),
            std_err: format!("{:.4e}", fit.fit.std_err),
            r: format!("{:.3}", fit.fit.r),
            p_value: format!("{:.4}", fit.fit.p_value),
        })
        .collect();

    format!("{}\n{}\n{}", title, "=".repeat(title.len()), Table::new(rows))
}

/// Analyzes every series and returns the results keyed by series
pub fn analyze_all(
    records: &[BenchmarkRecord],
    config: &AnalysisConfig,
) -> BTreeMap<SeriesKey, SeriesAnalysis> {
    build_series(records, config.record_statistic)
        .into_iter()
        .filter_map(|(key, points)| match analyze_series(&points, config) {
            Some(analysis) => Some((key, analysis)),
            None => {
                warn!(series = %key, "no populations above {}, skipping", config.min_population);
                None
            }
        })
        .collect()
}

/// Generate the asymptotic analysis: one chart per series and model, plus the model ranking
///
/// Charts are written to `<matrix_type>/<operation>/<model>_<generator>_matrix_performance.png`
/// and the ranking to `model-ranking.txt`, both under `config.output_dir`.
///
/// # Returns
/// * `Ok(())` - If every chart and the ranking were written
/// * `Err(AsymptoticError)` - If a file could not be written or a chart could not be drawn
pub fn generate_asymptotic_analysis(
    records: &[BenchmarkRecord],
    config: &AnalysisConfig,
) -> Result<()> {
    let analyses = analyze_all(records, config);
    info!(series = analyses.len(), "fitting asymptotic models");

    let ranking = analyses
        .iter()
        .map(|(key, analysis)| format_ranking(key, analysis))
        .collect::<Vec<_>>()
        .join("\n\n");
    fs::create_dir_all(&config.output_dir)?;
    fs::write(config.output_dir.join("model-ranking.txt"), ranking)?;

    let total: usize = analyses.values().map(|a| a.curves.len()).sum();
    let progress = ProgressBar::new(total as u64);
    progress.set_style(
        ProgressStyle::with_template("{spinner} [{bar:40}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    for (key, analysis) in &analyses {
        progress.set_message(key.to_string());
        for curve in &analysis.curves {
            render_curve(key, curve, &config.output_dir, config.plot_size)?;
            progress.inc(1);
        }
    }
    progress.finish_with_message("plots written");

    Ok(())
}

fn render_curve(
    key: &SeriesKey,
    curve: &ModelCurve,
    output_dir: &Path,
    size: (u32, u32),
) -> Result<()> {
    if curve.normalized.is_empty() {
        warn!(series = %key, model = curve.model.name(), "nothing to plot");
        return Ok(());
    }

    let output_path = output_dir.join(key.plot_path(curve.model));
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)?;
    }

    create_ratio_plot(&curve.chart(key), &output_path, size)?;
    Ok(())
}
