//! Exploratory overview of a benchmark run
//!
//! Produces a plain-text report with summaries, correlations, t-tests between operations and
//! per-occupation regressions, plus charts:
//!
//! - Duration histogram
//! - Duration vs population, one colour per operation
//! - Duration vs size, coloured by occupation
//! - Duration box plots by operation and by occupation
//! - Correlation heatmap
//! - Duration box plots per occupation and operation on a log scale

use crate::common::plots::{
    create_box_plot, create_colored_scatter_plot, create_correlation_heatmap,
    create_grouped_scatter_plot, create_histogram_plot, BoxChart, BoxSeries,
};
use crate::common::{BenchmarkRecord, PlotError, Point};
use crate::config::AnalysisConfig;
use crate::stats::descriptive::{pearson, student_t_test, Summary};
use crate::stats::regression::linear_regression;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use tabled::builder::Builder;
use tabled::{Table, Tabled};
use thiserror::Error;
use tracing::{info, warn};

/// Bins in the duration histogram
const HISTOGRAM_BINS: usize = 50;

/// Errors that can occur while writing the overview
#[derive(Error, Debug)]
pub enum OverviewError {
    #[error("Failed to write overview: {0}")]
    FileWrite(#[from] std::io::Error),

    #[error("Failed to generate plot: {0}")]
    PlotGeneration(#[from] PlotError),
}

type Result<T> = core::result::Result<T, OverviewError>;

/// One record reduced to the numeric columns the overview works with
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub operation: String,
    pub matrix_type: String,
    pub generator: String,
    pub population: f64,
    pub size: f64,
    /// Fraction of occupied entries; derived from population and size when absent
    pub occupation: f64,
    /// Mean duration of the record's samples, in milliseconds; every sample counts, not
    /// only the first
    pub duration_ms: f64,
}

impl Observation {
    fn from_record(record: &BenchmarkRecord) -> Option<Self> {
        let duration_ms = record.mean_duration_millis()?;
        let size = record.size as f64;
        let occupation = record
            .occupation
            .unwrap_or_else(|| record.population as f64 / (size * size).max(1.0));

        Some(Self {
            operation: record.operation.clone(),
            matrix_type: record.matrix_type.clone(),
            generator: record.generator.clone(),
            population: record.population as f64,
            size,
            occupation,
            duration_ms,
        })
    }
}

/// Converts records into observations, skipping records without samples
pub fn observations(records: &[BenchmarkRecord]) -> Vec<Observation> {
    let observations: Vec<Observation> =
        records.iter().filter_map(Observation::from_record).collect();

    let skipped = records.len() - observations.len();
    if skipped > 0 {
        warn!("{} records without duration samples left out of the overview", skipped);
    }
    observations
}

fn fmt2(value: f64) -> String {
    format!("{:.2}", value)
}

fn fmt_optional(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.*}", precision, v))
}

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Column")]
    column: &'static str,
    #[tabled(rename = "Count")]
    count: usize,
    #[tabled(rename = "Mean")]
    mean: String,
    #[tabled(rename = "Std")]
    std: String,
    #[tabled(rename = "Min")]
    min: String,
    #[tabled(rename = "25%")]
    q1: String,
    #[tabled(rename = "50%")]
    median: String,
    #[tabled(rename = "75%")]
    q3: String,
    #[tabled(rename = "Max")]
    max: String,
}

impl SummaryRow {
    fn new(column: &'static str, summary: &Summary) -> Self {
        Self {
            column,
            count: summary.count,
            mean: fmt2(summary.mean),
            std: fmt2(summary.std),
            min: fmt2(summary.min),
            q1: fmt2(summary.q1),
            median: fmt2(summary.median),
            q3: fmt2(summary.q3),
            max: fmt2(summary.max),
        }
    }
}

#[derive(Tabled)]
struct GroupRow {
    #[tabled(rename = "Group")]
    group: String,
    #[tabled(rename = "Count")]
    count: usize,
    #[tabled(rename = "Mean (ms)")]
    mean: String,
    #[tabled(rename = "Std (ms)")]
    std: String,
    #[tabled(rename = "Min (ms)")]
    min: String,
    #[tabled(rename = "Max (ms)")]
    max: String,
    #[tabled(rename = "Mean population")]
    population: String,
    #[tabled(rename = "Mean size")]
    size: String,
}

impl GroupRow {
    fn new(group: String, members: &[&Observation]) -> Option<Self> {
        let durations: Vec<f64> = members.iter().map(|o| o.duration_ms).collect();
        let summary = Summary::of(&durations)?;
        let count = members.len() as f64;

        Some(Self {
            group,
            count: summary.count,
            mean: fmt2(summary.mean),
            std: fmt2(summary.std),
            min: fmt2(summary.min),
            max: fmt2(summary.max),
            population: fmt2(members.iter().map(|o| o.population).sum::<f64>() / count),
            size: fmt2(members.iter().map(|o| o.size).sum::<f64>() / count),
        })
    }
}

#[derive(Tabled)]
struct TTestRow {
    #[tabled(rename = "A")]
    a: String,
    #[tabled(rename = "B")]
    b: String,
    #[tabled(rename = "t")]
    statistic: String,
    #[tabled(rename = "df")]
    df: String,
    #[tabled(rename = "p-value")]
    p_value: String,
}

#[derive(Tabled)]
struct RegressionRow {
    #[tabled(rename = "Operation")]
    operation: String,
    #[tabled(rename = "Occupation")]
    occupation: f64,
    #[tabled(rename = "Points")]
    points: usize,
    #[tabled(rename = "R²")]
    r_squared: String,
    #[tabled(rename = "p-value")]
    p_value: String,
}

/// Observations sorted by occupation, split into runs of equal occupation
fn by_occupation<'a>(
    observations: impl IntoIterator<Item = &'a Observation>,
) -> Vec<(f64, Vec<&'a Observation>)> {
    let mut sorted: Vec<&Observation> = observations.into_iter().collect();
    sorted.sort_by(|a, b| a.occupation.total_cmp(&b.occupation));

    sorted
        .chunk_by(|a, b| a.occupation == b.occupation)
        .map(|run| (run[0].occupation, run.to_vec()))
        .collect()
}

fn by_operation(observations: &[Observation]) -> BTreeMap<&str, Vec<&Observation>> {
    let mut groups: BTreeMap<&str, Vec<&Observation>> = BTreeMap::new();
    for observation in observations {
        groups
            .entry(observation.operation.as_str())
            .or_default()
            .push(observation);
    }
    groups
}

fn unique_values<'a>(values: impl Iterator<Item = &'a str>) -> String {
    values.collect::<BTreeSet<_>>().into_iter().collect::<Vec<_>>().join(", ")
}

/// Pearson correlation between every pair of numeric columns, with the column names
fn correlation_matrix(observations: &[Observation]) -> (Vec<String>, Vec<Vec<Option<f64>>>) {
    let columns: [(&str, Vec<f64>); 4] = [
        ("population", observations.iter().map(|o| o.population).collect()),
        ("size", observations.iter().map(|o| o.size).collect()),
        ("occupation", observations.iter().map(|o| o.occupation).collect()),
        ("duration_ms", observations.iter().map(|o| o.duration_ms).collect()),
    ];

    let labels = columns.iter().map(|(name, _)| name.to_string()).collect();
    let matrix = columns
        .iter()
        .map(|(_, row)| columns.iter().map(|(_, column)| pearson(row, column)).collect())
        .collect();
    (labels, matrix)
}

fn correlation_table(labels: &[String], matrix: &[Vec<Option<f64>>]) -> String {
    let mut builder = Builder::default();
    builder.push_record(std::iter::once(String::new()).chain(labels.iter().cloned()));
    for (name, row) in labels.iter().zip(matrix) {
        builder.push_record(
            std::iter::once(name.clone()).chain(row.iter().map(|r| fmt_optional(*r, 2))),
        );
    }
    builder.build().to_string()
}

fn durations(members: &[&Observation]) -> Vec<f64> {
    members.iter().map(|o| o.duration_ms).collect()
}

fn duration_box_chart(title: &str, x_label: &str, groups: Vec<(String, Vec<f64>)>) -> BoxChart {
    let (categories, values) = groups.into_iter().unzip();
    BoxChart {
        title: title.to_string(),
        x_label: x_label.to_string(),
        y_label: "Duration (ms)".to_string(),
        categories,
        series: vec![BoxSeries {
            name: "duration_ms".to_string(),
            values,
        }],
        log_scale: false,
    }
}

/// One box per occupation and operation, operations side by side within an occupation
fn occupation_operation_chart(observations: &[Observation]) -> BoxChart {
    let runs = by_occupation(observations);
    let operations: BTreeSet<&str> = observations.iter().map(|o| o.operation.as_str()).collect();

    let series = operations
        .into_iter()
        .map(|operation| BoxSeries {
            name: operation.to_string(),
            values: runs
                .iter()
                .map(|(_, members)| {
                    members
                        .iter()
                        .filter(|o| o.operation == operation)
                        .map(|o| o.duration_ms)
                        .collect()
                })
                .collect(),
        })
        .collect();

    BoxChart {
        title: "Duration by Occupation and Operation".to_string(),
        x_label: "Occupation".to_string(),
        y_label: "Duration (ms, log scale)".to_string(),
        categories: runs.iter().map(|(occupation, _)| occupation.to_string()).collect(),
        series,
        log_scale: true,
    }
}

fn t_test_rows(operations: &BTreeMap<&str, Vec<&Observation>>) -> Vec<TTestRow> {
    let durations: Vec<(&str, Vec<f64>)> = operations
        .iter()
        .map(|(name, members)| (*name, members.iter().map(|o| o.duration_ms).collect()))
        .collect();

    let mut rows = Vec::new();
    for (index, (a, first)) in durations.iter().enumerate() {
        for (b, second) in &durations[index + 1..] {
            let test = student_t_test(first, second);
            rows.push(TTestRow {
                a: a.to_string(),
                b: b.to_string(),
                statistic: fmt_optional(test.map(|t| t.statistic), 4),
                df: fmt_optional(test.map(|t| t.df), 0),
                p_value: fmt_optional(test.map(|t| t.p_value), 4),
            });
        }
    }
    rows
}

fn regression_rows(operations: &BTreeMap<&str, Vec<&Observation>>) -> Vec<RegressionRow> {
    let mut rows = Vec::new();
    for (operation, members) in operations {
        for (occupation, run) in by_occupation(members.iter().copied()) {
            let sizes: Vec<f64> = run.iter().map(|o| o.size).collect();
            let durations: Vec<f64> = run.iter().map(|o| o.duration_ms).collect();
            let fit = linear_regression(&sizes, &durations);

            rows.push(RegressionRow {
                operation: operation.to_string(),
                occupation,
                points: run.len(),
                r_squared: fmt_optional(fit.map(|f| f.r_squared()), 4),
                p_value: fmt_optional(fit.map(|f| f.p_value), 4),
            });
        }
    }
    rows
}

fn section(report: &mut String, title: &str, body: &str) {
    report.push_str(&format!("\n=== {} ===\n{}\n", title, body));
}

/// Renders the plain-text overview report
pub fn format_overview(observations: &[Observation]) -> String {
    let mut report = format!("Total records: {}\n", observations.len());
    report.push_str(&format!(
        "matrix_type: {}\noperation: {}\ngenerator: {}\n",
        unique_values(observations.iter().map(|o| o.matrix_type.as_str())),
        unique_values(observations.iter().map(|o| o.operation.as_str())),
        unique_values(observations.iter().map(|o| o.generator.as_str())),
    ));

    let columns: [(&'static str, Vec<f64>); 3] = [
        ("population", observations.iter().map(|o| o.population).collect()),
        ("size", observations.iter().map(|o| o.size).collect()),
        ("duration_ms", observations.iter().map(|o| o.duration_ms).collect()),
    ];
    let summaries: Vec<SummaryRow> = columns
        .iter()
        .filter_map(|(name, values)| Summary::of(values).map(|s| SummaryRow::new(*name, &s)))
        .collect();
    section(&mut report, "Descriptive statistics", &Table::new(summaries).to_string());

    let operations = by_operation(observations);
    let operation_rows: Vec<GroupRow> = operations
        .iter()
        .filter_map(|(name, members)| GroupRow::new(name.to_string(), members))
        .collect();
    section(&mut report, "By operation", &Table::new(operation_rows).to_string());

    let occupation_rows: Vec<GroupRow> = by_occupation(observations)
        .into_iter()
        .filter_map(|(occupation, members)| GroupRow::new(occupation.to_string(), &members))
        .collect();
    section(&mut report, "By occupation", &Table::new(occupation_rows).to_string());

    let (labels, matrix) = correlation_matrix(observations);
    section(&mut report, "Correlation", &correlation_table(&labels, &matrix));
    section(
        &mut report,
        "t-tests between operations",
        &Table::new(t_test_rows(&operations)).to_string(),
    );
    section(
        &mut report,
        "Duration vs size per occupation",
        &Table::new(regression_rows(&operations)).to_string(),
    );

    report
}

/// Generate the exploratory overview under the overview directory
///
/// Writes `summary.txt` and the charts `duration-histogram.png`, `duration-vs-population.png`,
/// `duration-vs-size.png`, `duration-by-operation.png`, `duration-by-occupation.png`,
/// `correlation-heatmap.png` and `duration-by-occupation-and-operation.png`.
///
/// # Returns
/// * `Ok(())` - If the report and every chart were written, or there was nothing to report
/// * `Err(OverviewError)` - If a file could not be written or a chart could not be drawn
pub fn generate_overview(records: &[BenchmarkRecord], config: &AnalysisConfig) -> Result<()> {
    let observations = observations(records);
    if observations.is_empty() {
        warn!("no records with duration samples, skipping overview");
        return Ok(());
    }

    let output_dir = config.overview_path();
    fs::create_dir_all(&output_dir)?;
    fs::write(output_dir.join("summary.txt"), format_overview(&observations))?;

    let all_durations: Vec<f64> = observations.iter().map(|o| o.duration_ms).collect();
    create_histogram_plot(
        &all_durations,
        HISTOGRAM_BINS,
        "Duration Distribution",
        "Duration (ms)",
        &output_dir.join("duration-histogram.png"),
        config.plot_size,
    )?;

    let groups: Vec<(String, Vec<Point>)> = by_operation(&observations)
        .into_iter()
        .map(|(name, members)| {
            let points = members
                .iter()
                .map(|o| Point::new(o.population, o.duration_ms))
                .collect();
            (name.to_string(), points)
        })
        .collect();
    create_grouped_scatter_plot(
        &groups,
        "Duration vs Population",
        "Population",
        "Duration (ms)",
        &output_dir.join("duration-vs-population.png"),
        config.plot_size,
    )?;

    let colored: Vec<(Point, f64)> = observations
        .iter()
        .map(|o| (Point::new(o.size, o.duration_ms), o.occupation))
        .collect();
    let (low, high) = colored
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(low, high), (_, occupation)| {
            (low.min(*occupation), high.max(*occupation))
        });
    create_colored_scatter_plot(
        &colored,
        &format!("Duration vs Size (colour: occupation {} to {})", low, high),
        "Size",
        "Duration (ms)",
        &output_dir.join("duration-vs-size.png"),
        config.plot_size,
    )?;

    let operation_groups = by_operation(&observations)
        .into_iter()
        .map(|(name, members)| (name.to_string(), durations(&members)))
        .collect();
    create_box_plot(
        &duration_box_chart("Duration by Operation", "Operation", operation_groups),
        &output_dir.join("duration-by-operation.png"),
        config.plot_size,
    )?;

    let occupation_groups = by_occupation(&observations)
        .into_iter()
        .map(|(occupation, members)| (occupation.to_string(), durations(&members)))
        .collect();
    create_box_plot(
        &duration_box_chart("Duration by Occupation", "Occupation", occupation_groups),
        &output_dir.join("duration-by-occupation.png"),
        config.plot_size,
    )?;

    let (labels, matrix) = correlation_matrix(&observations);
    create_correlation_heatmap(
        &labels,
        &matrix,
        "Correlation Matrix",
        &output_dir.join("correlation-heatmap.png"),
        config.plot_size,
    )?;

    create_box_plot(
        &occupation_operation_chart(&observations),
        &output_dir.join("duration-by-occupation-and-operation.png"),
        config.plot_size,
    )?;

    info!(path = %output_dir.display(), "wrote overview");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::data_structures::DurationSample;
    use tempfile::TempDir;

    fn record(operation: &str, population: u64, size: u64, millis: &[f64]) -> BenchmarkRecord {
        BenchmarkRecord {
            matrix_type: "Tree".to_string(),
            operation: operation.to_string(),
            generator: "uniform".to_string(),
            occupation: None,
            population,
            size,
            exponent: None,
            durations: millis
                .iter()
                .map(|&ms| DurationSample::Nanos(ms * 1e6))
                .collect(),
        }
    }

    fn sample_records() -> Vec<BenchmarkRecord> {
        vec![
            record("add", 1, 10, &[1.0]),
            record("add", 10, 100, &[2.0, 4.0]),
            record("add", 100, 1000, &[5.0]),
            record("mul", 1, 10, &[10.0]),
            record("mul", 10, 100, &[20.0]),
            record("mul", 100, 1000, &[40.0]),
            record("mul", 5, 10, &[]),
        ]
    }

    #[test]
    fn observations_use_mean_duration_and_derived_occupation() {
        let observations = observations(&sample_records());
        assert_eq!(observations.len(), 6);

        let second = &observations[1];
        assert!((second.duration_ms - 3.0).abs() < 1e-12);
        assert!((second.occupation - 0.001).abs() < 1e-12);
    }

    #[test]
    fn explicit_occupation_is_kept() {
        let mut with_occupation = record("add", 1, 10, &[1.0]);
        with_occupation.occupation = Some(0.5);
        let observations = observations(&[with_occupation]);
        assert_eq!(observations[0].occupation, 0.5);
    }

    #[test]
    fn occupation_runs_are_grouped() {
        let observations = observations(&sample_records());
        let runs = by_occupation(&observations);
        let occupations: Vec<f64> = runs.iter().map(|(o, _)| *o).collect();
        assert_eq!(occupations, vec![0.0001, 0.001, 0.01]);
        assert!(runs.iter().all(|(_, members)| members.len() == 2));
    }

    #[test]
    fn t_tests_cover_every_pair_of_operations() {
        let observations = observations(&sample_records());
        let rows = t_test_rows(&by_operation(&observations));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].a, "add");
        assert_eq!(rows[0].b, "mul");
        assert_ne!(rows[0].p_value, "n/a");
    }

    #[test]
    fn regressions_need_two_sizes() {
        let observations = observations(&sample_records());
        let rows = regression_rows(&by_operation(&observations));
        assert_eq!(rows.len(), 6);
        assert!(rows.iter().all(|row| row.r_squared == "n/a"));
    }

    #[test]
    fn report_lists_every_section() {
        let report = format_overview(&observations(&sample_records()));
        assert!(report.starts_with("Total records: 6"));
        assert!(report.contains("operation: add, mul"));
        for title in [
            "Descriptive statistics",
            "By operation",
            "By occupation",
            "Correlation",
            "t-tests between operations",
            "Duration vs size per occupation",
        ] {
            assert!(report.contains(title), "missing section {}", title);
        }
        assert!(report.contains("duration_ms"));
    }

    #[test]
    fn correlation_matrix_is_symmetric() {
        let (labels, matrix) = correlation_matrix(&observations(&sample_records()));
        assert_eq!(labels, vec!["population", "size", "occupation", "duration_ms"]);
        assert_eq!(matrix.len(), labels.len());

        for (i, row) in matrix.iter().enumerate() {
            assert!((row[i].unwrap() - 1.0).abs() < 1e-9);
            for (j, value) in row.iter().enumerate() {
                assert!((value.unwrap() - matrix[j][i].unwrap()).abs() < 1e-9);
            }
        }
        assert!(matrix[0][1].unwrap() > 0.99);
    }

    #[test]
    fn operation_boxes_hold_every_duration() {
        let observations = observations(&sample_records());
        let groups = by_operation(&observations)
            .into_iter()
            .map(|(name, members)| (name.to_string(), durations(&members)))
            .collect();
        let chart = duration_box_chart("Duration by Operation", "Operation", groups);

        assert_eq!(chart.categories, vec!["add", "mul"]);
        assert_eq!(chart.series.len(), 1);
        assert_eq!(
            chart.series[0].values,
            vec![vec![1.0, 3.0, 5.0], vec![10.0, 20.0, 40.0]]
        );
        assert!(!chart.log_scale);
    }

    #[test]
    fn occupation_boxes_split_by_operation() {
        let chart = occupation_operation_chart(&observations(&sample_records()));

        assert!(chart.log_scale);
        assert_eq!(chart.categories, vec!["0.0001", "0.001", "0.01"]);
        let names: Vec<&str> = chart.series.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["add", "mul"]);
        assert_eq!(chart.series[0].values, vec![vec![5.0], vec![3.0], vec![1.0]]);
        assert_eq!(chart.series[1].values, vec![vec![40.0], vec![20.0], vec![10.0]]);
    }

    #[test]
    fn empty_input_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let config = AnalysisConfig::default().with_output_dir(dir.path());
        generate_overview(&[], &config).unwrap();
        assert!(!config.overview_path().exists());
    }

    #[test]
    #[ignore = "Font rendering not available in test environment"]
    fn overview_files_are_written() {
        let dir = TempDir::new().unwrap();
        let config = AnalysisConfig::default().with_output_dir(dir.path());
        generate_overview(&sample_records(), &config).unwrap();

        let overview = config.overview_path();
        for name in [
            "summary.txt",
            "duration-histogram.png",
            "duration-vs-population.png",
            "duration-vs-size.png",
            "duration-by-operation.png",
            "duration-by-occupation.png",
            "correlation-heatmap.png",
            "duration-by-occupation-and-operation.png",
        ] {
            assert!(overview.join(name).exists(), "missing {}", name);
        }
    }
}
