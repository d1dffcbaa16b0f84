//! Outlier filters over x-ordered series
//!
//! This module provides two families of filters:
//! - [`rolling_outlier_filter`] drops points that sit too many standard deviations away
//!   from their neighbours.
//! - [`envelope_filter`] keeps only the points forming a running minimum or maximum,
//!   which traces a lower or upper bound curve through noisy data.
//!
//! Both filters sort their input by `x` first and never reorder points with equal `x`.

use crate::common::data_structures::{sort_by_x, Point};
use statrs::statistics::{Data, Distribution};
use tracing::debug;

/// Points that survived a filter, plus how many were removed
#[derive(Debug, Clone, PartialEq)]
pub struct FilterOutcome {
    /// Surviving points, sorted by `x`
    pub kept: Vec<Point>,
    /// Number of points dropped
    pub removed: usize,
}

impl FilterOutcome {
    fn from_mask(sorted: Vec<Point>, outliers: &[bool], filter: &str) -> Self {
        let total = sorted.len();
        let kept: Vec<Point> = sorted
            .into_iter()
            .zip(outliers)
            .filter(|(_, &outlier)| !outlier)
            .map(|(point, _)| point)
            .collect();
        let removed = total - kept.len();

        debug!(filter, "removed {} outliers of {} points", removed, total);
        Self { kept, removed }
    }
}

/// Which running bound an [`envelope_filter`] tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeKind {
    /// Running minimum; the result is non-increasing in `x`
    Lower,
    /// Running maximum; the result is non-decreasing in `x`
    Upper,
}

/// Removes points that deviate from the mean of their neighbours by more than
/// `threshold` standard deviations
///
/// For the point at index `i` (after sorting by `x`), the window holds the points at
/// `i - n .. i` and `i + 1 ..= i + n`, clipped at the ends of the series. The point
/// itself is never part of its window.
///
/// A point is only ever flagged when its window has at least two values and a non-zero
/// sample standard deviation, so constant series pass through untouched.
///
/// # Arguments
/// * `points` - The series to filter, in any order
/// * `n` - Number of neighbours considered on each side
/// * `threshold` - Maximum allowed z-score, exclusive
pub fn rolling_outlier_filter(points: &[Point], n: usize, threshold: f64) -> FilterOutcome {
    let sorted = sort_by_x(points);
    let len = sorted.len();
    let mut outliers = vec![false; len];

    for (i, point) in sorted.iter().enumerate() {
        let left = i.saturating_sub(n)..i;
        let right = (i + 1).min(len)..(i + 1 + n).min(len);
        let window: Vec<f64> = sorted[left]
            .iter()
            .chain(&sorted[right])
            .map(|p| p.y)
            .collect();

        if window.len() < 2 {
            continue;
        }

        let window = Data::new(window);
        let (Some(mean), Some(std)) = (window.mean(), window.std_dev()) else {
            continue;
        };

        // Zero spread means there is nothing to measure the point against.
        if std > 0.0 && (point.y - mean).abs() / std > threshold {
            outliers[i] = true;
        }
    }

    FilterOutcome::from_mask(sorted, &outliers, "rolling")
}

/// Keeps only the points that improve on the running bound when scanning in `x` order
///
/// The first point seeds the bound. Every following point is kept only if it is strictly
/// below (for [`EnvelopeKind::Lower`]) or strictly above (for [`EnvelopeKind::Upper`])
/// every point kept before it. Ties therefore keep the earliest point.
pub fn envelope_filter(points: &[Point], kind: EnvelopeKind) -> FilterOutcome {
    let sorted = sort_by_x(points);
    let mut outliers = vec![true; sorted.len()];
    let mut bound: Option<f64> = None;

    for (i, point) in sorted.iter().enumerate() {
        let improves = match (bound, kind) {
            (None, _) => true,
            (Some(current), EnvelopeKind::Lower) => point.y < current,
            (Some(current), EnvelopeKind::Upper) => point.y > current,
        };

        if improves {
            bound = Some(point.y);
            outliers[i] = false;
        }
    }

    let name = match kind {
        EnvelopeKind::Lower => "lower-envelope",
        EnvelopeKind::Upper => "upper-envelope",
    };
    FilterOutcome::from_mask(sorted, &outliers, name)
}
