//! Report generation
//!
//! This module composes the numeric core into the outputs of a run:
//! - Asymptotic model charts and the model ranking
//! - LaTeX duration tables per operation
//! - The exploratory overview

pub mod asymptotic;
pub mod overview;
pub mod tables;

// Re-export report entry points for convenience
pub use asymptotic::generate_asymptotic_analysis;
pub use overview::generate_overview;
pub use tables::generate_tables;
