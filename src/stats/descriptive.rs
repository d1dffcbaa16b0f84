//! Descriptive statistics, correlation and two-sample tests
//!
//! Moments and the Student t distribution come from [`statrs`].

use statrs::distribution::{ContinuousCDF, StudentsT};
use statrs::statistics::{Data, Median, Statistics};

/// Summary of a sample, in the spirit of a five-number summary
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; `NaN` for fewer than two values
    pub std: f64,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

impl Summary {
    /// Summarizes `values`, or returns `None` if there are none
    pub fn of(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        Some(Self {
            count: sorted.len(),
            mean: Statistics::mean(&sorted),
            std: Statistics::std_dev(&sorted),
            min: Statistics::min(&sorted),
            q1: quantile_sorted(&sorted, 0.25),
            median: Data::new(sorted.clone()).median(),
            q3: quantile_sorted(&sorted, 0.75),
            max: Statistics::max(&sorted),
        })
    }
}

/// Quantile of an ascending slice, linearly interpolated between closest ranks
///
/// This is the usual type 7 estimator; `statrs`' `OrderStatistics::quantile`
/// uses the median-unbiased one instead, which reports different quartiles on small samples.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }

    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

/// Two-sided tail probability `P(|T| >= |t|)` of Student's t distribution
///
/// Returns `NaN` when `df` is not a valid number of degrees of freedom.
pub fn student_t_two_sided(t: f64, df: f64) -> f64 {
    match StudentsT::new(0.0, 1.0, df) {
        Ok(distribution) => (2.0 * distribution.sf(t.abs())).clamp(0.0, 1.0),
        Err(_) => f64::NAN,
    }
}

/// Pearson correlation coefficient
///
/// Returns `None` when the slices differ in length, hold fewer than two values, or either
/// side is constant.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }

    let sx = Statistics::std_dev(x);
    let sy = Statistics::std_dev(y);
    if !(sx > 0.0 && sy > 0.0) {
        return None;
    }

    let covariance = Statistics::covariance(x, y);
    Some((covariance / (sx * sy)).clamp(-1.0, 1.0))
}

/// Result of a two-sample t-test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TTest {
    pub statistic: f64,
    /// Two-sided p-value
    pub p_value: f64,
    pub df: f64,
}

/// Student's two-sample t-test with pooled variance
///
/// Returns `None` if either sample has fewer than two values or both are constant.
pub fn student_t_test(a: &[f64], b: &[f64]) -> Option<TTest> {
    let (n1, n2) = (a.len(), b.len());
    if n1 < 2 || n2 < 2 {
        return None;
    }

    let df = (n1 + n2 - 2) as f64;
    let pooled = ((n1 - 1) as f64 * Statistics::variance(a)
        + (n2 - 1) as f64 * Statistics::variance(b))
        / df;
    let se = (pooled * (1.0 / n1 as f64 + 1.0 / n2 as f64)).sqrt();
    if !(se > 0.0) {
        return None;
    }

    let statistic = (Statistics::mean(a) - Statistics::mean(b)) / se;
    Some(TTest {
        statistic,
        p_value: student_t_two_sided(statistic, df),
        df,
    })
}
