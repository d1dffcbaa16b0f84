//! Analysis settings
//!
//! The tool takes no flags; `main` runs with [`AnalysisConfig::default`]. The values
//! here are the ones the benchmark report was produced with.

use std::path::PathBuf;

/// Which per-record statistic feeds the grouped aggregate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordStatistic {
    /// Fastest sample of each record; least affected by scheduler noise
    Minimum,
    /// Mean of all samples of each record
    #[cfg_attr(not(test), allow(dead_code))]
    Mean,
}

/// Settings for the rolling z-score filter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RollingFilterConfig {
    /// Neighbours considered on each side of a point
    pub window: usize,
    /// Maximum z-score a point may have before it is dropped
    pub threshold: f64,
}

/// Settings for Savitzky–Golay smoothing of the envelope curves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmoothingConfig {
    pub window_length: usize,
    pub polyorder: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    /// Root under which plots, tables and reports are written
    pub output_dir: PathBuf,
    /// Directory name (under `output_dir`) for LaTeX tables
    pub tables_dir: String,
    /// Directory name (under `output_dir`) for the exploratory overview
    pub overview_dir: String,
    /// Only populations strictly above this value enter the asymptotic analysis
    pub min_population: u64,
    pub rolling_filter: RollingFilterConfig,
    pub smoothing: SmoothingConfig,
    pub record_statistic: RecordStatistic,
    /// Plot resolution in pixels
    pub plot_size: (u32, u32),
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            tables_dir: "tables".to_string(),
            overview_dir: "overview".to_string(),
            min_population: 100,
            rolling_filter: RollingFilterConfig {
                window: 10,
                threshold: 1.0,
            },
            smoothing: SmoothingConfig {
                window_length: 7,
                polyorder: 3,
            },
            record_statistic: RecordStatistic::Minimum,
            plot_size: (1200, 800),
        }
    }
}

impl AnalysisConfig {
    /// Same settings, writing under `output_dir` instead
    #[cfg(test)]
    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    pub fn tables_path(&self) -> PathBuf {
        self.output_dir.join(&self.tables_dir)
    }

    pub fn overview_path(&self) -> PathBuf {
        self.output_dir.join(&self.overview_dir)
    }
}
