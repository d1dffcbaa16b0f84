//! Numeric core of the analysis
//!
//! Everything in here is a pure function over numeric slices. Nothing in this module
//! touches the filesystem or the plotting backend, so it can be tested in isolation.
//!
//! - [`filters`]: rolling z-score and monotonic envelope filters
//! - [`smoothing`]: Savitzky–Golay smoothing of envelope curves
//! - [`regression`]: least-squares line fitting
//! - [`models`]: asymptotic growth models and their ranking
//! - [`grouping`]: mean aggregation by key
//! - [`descriptive`]: summaries, correlation, t-tests and the t distribution tail

pub mod descriptive;
pub mod filters;
pub mod grouping;
pub mod models;
pub mod regression;
pub mod smoothing;
