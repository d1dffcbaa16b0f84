//! LaTeX summary tables
//!
//! One table per operation: rows are (size, population) pairs, columns are matrix types and
//! cells hold the mean duration over every sample, scaled to a readable unit.

use crate::common::paths::sanitize_component;
use crate::common::units::format_duration;
use crate::common::BenchmarkRecord;
use crate::config::AnalysisConfig;
use crate::stats::grouping::group_mean;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

/// Errors that can occur while writing tables
#[derive(Error, Debug)]
pub enum TableError {
    #[error("Failed to write table: {0}")]
    FileWrite(#[from] std::io::Error),
}

type Result<T> = core::result::Result<T, TableError>;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct TableKey {
    operation: String,
    matrix_type: String,
    exponent: u32,
    population: u64,
}

/// One row of an [`OperationTable`]
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub exponent: u32,
    pub population: u64,
    /// Formatted mean duration per matrix type; `None` where nothing was measured
    pub cells: Vec<Option<String>>,
}

/// Mean durations of one operation pivoted into a matrix-type by size table
#[derive(Debug, Clone, PartialEq)]
pub struct OperationTable {
    pub operation: String,
    /// Column headers, sorted
    pub matrix_types: Vec<String>,
    /// Rows, sorted by exponent then population
    pub rows: Vec<TableRow>,
}

/// Share of occupied entries in a `10^exponent` x `10^exponent` matrix, in percent
pub fn occupancy_percentage(population: u64, exponent: u32) -> f64 {
    100.0 * population as f64 / 10f64.powi(2 * exponent as i32)
}

/// Renders a percentage without a fractional part when it is whole
pub fn format_percentage(percentage: f64) -> String {
    if percentage % 1.0 < 0.000_001 {
        format!("{}", percentage.trunc() as i64)
    } else {
        format!("{}", percentage)
    }
}

/// Renders the matrix dimensions as LaTeX, e.g. `$10^3$x$10^3$`
pub fn format_size(exponent: u32) -> String {
    format!("$10^{0}$x$10^{0}$", exponent)
}

/// Builds one table per operation from the raw records
///
/// Every sample counts once towards the mean of its (operation, matrix type, exponent,
/// population) cell, so records with more samples weigh more.
pub fn build_tables(records: &[BenchmarkRecord]) -> Vec<OperationTable> {
    let samples = records.iter().flat_map(|record| {
        let key = TableKey {
            operation: record.operation.clone(),
            matrix_type: record.matrix_type.clone(),
            exponent: record.exponent(),
            population: record.population,
        };
        record
            .durations_nanos()
            .into_iter()
            .map(move |nanos| (key.clone(), nanos))
    });
    let means = group_mean(samples);

    let mut operations: BTreeMap<&str, BTreeMap<(u32, u64), BTreeMap<&str, f64>>> =
        BTreeMap::new();
    for (key, mean) in &means {
        operations
            .entry(key.operation.as_str())
            .or_default()
            .entry((key.exponent, key.population))
            .or_default()
            .insert(key.matrix_type.as_str(), *mean);
    }

    operations
        .into_iter()
        .map(|(operation, rows)| {
            let matrix_types: BTreeSet<&str> = rows
                .values()
                .flat_map(|cells| cells.keys().copied())
                .collect();

            let rows = rows
                .into_iter()
                .map(|((exponent, population), cells)| TableRow {
                    exponent,
                    population,
                    cells: matrix_types
                        .iter()
                        .map(|matrix_type| cells.get(matrix_type).map(|&ns| format_duration(ns)))
                        .collect(),
                })
                .collect();

            OperationTable {
                operation: operation.to_string(),
                matrix_types: matrix_types.into_iter().map(str::to_string).collect(),
                rows,
            }
        })
        .collect()
}

impl OperationTable {
    /// Renders the table as a booktabs `tabular` environment
    pub fn to_latex(&self) -> String {
        let column_format = format!("c c {}", "c ".repeat(self.matrix_types.len()));

        let mut header = vec!["Size".to_string(), "Occupation".to_string()];
        header.extend(self.matrix_types.iter().cloned());

        let mut latex = String::new();
        latex.push_str(&format!("\\begin{{tabular}}{{{}}}\n", column_format));
        latex.push_str("\\toprule\n");
        latex.push_str(&format!("{} \\\\\n", header.join(" & ")));
        latex.push_str("\\midrule\n");

        for row in &self.rows {
            let mut cells = vec![
                format_size(row.exponent),
                format!(
                    "{}\\%",
                    format_percentage(occupancy_percentage(row.population, row.exponent))
                ),
            ];
            cells.extend(row.cells.iter().map(|cell| cell.clone().unwrap_or_default()));
            latex.push_str(&format!("{} \\\\\n", cells.join(" & ")));
        }

        latex.push_str("\\bottomrule\n");
        latex.push_str("\\end{tabular}\n");
        latex
    }
}

/// Generate one LaTeX table per operation under the tables directory
///
/// Each table is written to `table_<operation>.tex` and echoed to stdout.
///
/// # Returns
/// * `Ok(Vec<PathBuf>)` - Paths of the written tables
/// * `Err(TableError)` - If the directory or a file could not be written
pub fn generate_tables(records: &[BenchmarkRecord], config: &AnalysisConfig) -> Result<Vec<PathBuf>> {
    let output_dir = config.tables_path();
    fs::create_dir_all(&output_dir)?;

    let mut written = Vec::new();
    for table in build_tables(records) {
        let latex = table.to_latex();
        let path = output_dir.join(format!("table_{}.tex", sanitize_component(&table.operation)));
        fs::write(&path, &latex)?;

        println!("Operation: {}", table.operation);
        println!("{}", latex);
        println!("{}", "=".repeat(80));

        info!(path = %path.display(), "wrote table");
        written.push(path);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::data_structures::DurationSample;
    use rstest::rstest;
    use tempfile::TempDir;

    fn record(
        operation: &str,
        matrix_type: &str,
        exponent: u32,
        population: u64,
        nanos: &[f64],
    ) -> BenchmarkRecord {
        BenchmarkRecord {
            matrix_type: matrix_type.to_string(),
            operation: operation.to_string(),
            generator: "uniform".to_string(),
            occupation: None,
            population,
            size: 10u64.pow(exponent),
            exponent: Some(exponent),
            durations: nanos.iter().map(|&n| DurationSample::Nanos(n)).collect(),
        }
    }

    #[rstest]
    #[case(1, 1, "1")]
    #[case(1, 5, "5")]
    #[case(2, 2000, "20")]
    #[case(2, 50, "0.5")]
    #[case(4, 1000, "0.001")]
    fn occupancy_is_formatted(#[case] exponent: u32, #[case] population: u64, #[case] expected: &str) {
        assert_eq!(
            format_percentage(occupancy_percentage(population, exponent)),
            expected
        );
    }

    #[test]
    fn size_is_rendered_as_powers_of_ten() {
        assert_eq!(format_size(3), "$10^3$x$10^3$");
    }

    #[test]
    fn tables_pivot_by_matrix_type() {
        let records = vec![
            record("mul", "Tree", 1, 5, &[1_000_000.0, 2_000_000.0]),
            record("mul", "Tree", 1, 5, &[3_000_000.0]),
            record("mul", "Hash", 1, 5, &[999.0]),
            record("mul", "Hash", 2, 100, &[2e9]),
            record("add", "Tree", 1, 1, &[1_500.0]),
        ];

        let tables = build_tables(&records);
        assert_eq!(tables.len(), 2);

        let add = &tables[0];
        assert_eq!(add.operation, "add");
        assert_eq!(add.matrix_types, vec!["Tree"]);
        assert_eq!(add.rows[0].cells, vec![Some("1.500 µs".to_string())]);

        let mul = &tables[1];
        assert_eq!(mul.matrix_types, vec!["Hash", "Tree"]);
        assert_eq!(mul.rows.len(), 2);
        assert_eq!(
            mul.rows[0].cells,
            vec![Some("999.000 ns".to_string()), Some("2.000 ms".to_string())]
        );
        assert_eq!(mul.rows[1].exponent, 2);
        assert_eq!(mul.rows[1].cells, vec![Some("2.000 s".to_string()), None]);
    }

    #[test]
    fn latex_layout() {
        let records = vec![
            record("mul", "Hash", 1, 5, &[1_500_000.0]),
            record("mul", "Tree", 2, 100, &[2e9]),
        ];
        let tables = build_tables(&records);
        let latex = tables[0].to_latex();

        let expected = "\\begin{tabular}{c c c c }\n\
                        \\toprule\n\
                        Size & Occupation & Hash & Tree \\\\\n\
                        \\midrule\n\
                        $10^1$x$10^1$ & 5\\% & 1.500 ms &  \\\\\n\
                        $10^2$x$10^2$ & 1\\% &  & 2.000 s \\\\\n\
                        \\bottomrule\n\
                        \\end{tabular}\n";
        assert_eq!(latex, expected);
    }

    #[test]
    fn tables_are_written_per_operation() {
        let dir = TempDir::new().unwrap();
        let config = AnalysisConfig::default().with_output_dir(dir.path());
        let records = vec![
            record("mul", "Tree", 1, 5, &[1.0]),
            record("add", "Tree", 1, 5, &[1.0]),
        ];

        let written = generate_tables(&records, &config).unwrap();
        assert_eq!(written.len(), 2);
        assert!(dir.path().join("tables").join("table_add.tex").exists());
        assert!(dir.path().join("tables").join("table_mul.tex").exists());
    }

    #[test]
    fn operation_names_cannot_leave_the_tables_directory() {
        let dir = TempDir::new().unwrap();
        let config = AnalysisConfig::default().with_output_dir(dir.path());
        let records = vec![
            record("mul/transposed", "Tree", 1, 5, &[1.0]),
            record("../escape", "Tree", 1, 5, &[1.0]),
        ];

        let written = generate_tables(&records, &config).unwrap();
        let tables = dir.path().join("tables");
        assert_eq!(
            written,
            vec![
                tables.join("table_.._escape.tex"),
                tables.join("table_mul_transposed.tex"),
            ]
        );
        assert!(written.iter().all(|path| path.exists()));
        assert!(!dir.path().join("escape.tex").exists());
    }
}
