//! Common infrastructure modules shared across analysis phases
//!
//! This module provides reusable infrastructure for:
//! - Data structures for benchmark records
//! - Time unit formatting
//! - Sanitizing record strings used in output paths
//! - Plotting ratio curves and overview charts

pub mod data_structures;
pub mod paths;
pub mod plots;
pub mod units;

// Re-export commonly used items
pub use data_structures::{BenchmarkRecord, Point};
pub use plots::PlotError;
