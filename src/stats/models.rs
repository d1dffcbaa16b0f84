//! Candidate asymptotic growth models
//!
//! Dividing measured durations by a model's value at each population size yields a ratio
//! curve. When the model matches the algorithm's complexity the curve is flat, so the
//! flatness of the ratio curve ranks how well each model explains the measurements.

use super::regression::{fit_points, weighted_mean, LinearFit};
use crate::common::data_structures::Point;

/// A candidate growth function `f(n)`
///
/// All logarithms are natural logarithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AsymptoticModel {
    Constant,
    Linear,
    NLogN,
    NSqrtN,
    NLogNSqrtN,
    Quadratic,
    QuadraticLogN,
}

impl AsymptoticModel {
    /// Every model, from slowest to fastest growing
    pub const ALL: [AsymptoticModel; 7] = [
        AsymptoticModel::Constant,
        AsymptoticModel::Linear,
        AsymptoticModel::NLogN,
        AsymptoticModel::NSqrtN,
        AsymptoticModel::NLogNSqrtN,
        AsymptoticModel::Quadratic,
        AsymptoticModel::QuadraticLogN,
    ];

    /// Stable identifier used in output file names; the numeric prefix keeps them sorted
    pub fn name(&self) -> &'static str {
        match self {
            AsymptoticModel::Constant => "0-constant",
            AsymptoticModel::Linear => "1-linear",
            AsymptoticModel::NLogN => "2-nlog",
            AsymptoticModel::NSqrtN => "3-nsqrt",
            AsymptoticModel::NLogNSqrtN => "4-nlogsqrt",
            AsymptoticModel::Quadratic => "5-quadratic",
            AsymptoticModel::QuadraticLogN => "6-quadratic-log",
        }
    }

    /// Human-readable formula, used in plot captions
    pub fn formula(&self) -> &'static str {
        match self {
            AsymptoticModel::Constant => "1",
            AsymptoticModel::Linear => "n",
            AsymptoticModel::NLogN => "n log n",
            AsymptoticModel::NSqrtN => "n sqrt(n)",
            AsymptoticModel::NLogNSqrtN => "n log n sqrt(n)",
            AsymptoticModel::Quadratic => "n^2",
            AsymptoticModel::QuadraticLogN => "n^2 log n",
        }
    }

    /// Value of the growth function at `n`
    pub fn evaluate(&self, n: f64) -> f64 {
        match self {
            AsymptoticModel::Constant => 1.0,
            AsymptoticModel::Linear => n,
            AsymptoticModel::NLogN => n * n.ln(),
            AsymptoticModel::NSqrtN => n * n.sqrt(),
            AsymptoticModel::NLogNSqrtN => n * n.ln() * n.sqrt(),
            AsymptoticModel::Quadratic => n * n,
            AsymptoticModel::QuadraticLogN => n * n * n.ln(),
        }
    }

    /// Divides each point's `y` by the model evaluated at its `x`
    ///
    /// Points where the model is zero, negative or not finite (e.g. `n log n` at `n = 1`)
    /// cannot be normalized and are dropped.
    pub fn normalize(&self, points: &[Point]) -> Vec<Point> {
        points
            .iter()
            .filter_map(|point| {
                let scale = self.evaluate(point.x);
                (scale.is_finite() && scale > 0.0).then(|| Point::new(point.x, point.y / scale))
            })
            .collect()
    }
}

/// How well one model explains a series
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelFit {
    pub model: AsymptoticModel,
    /// Regression of the ratio curve against population size
    pub fit: LinearFit,
    /// Population-weighted mean of the ratio curve
    pub mean_ratio: f64,
    /// Change of the fitted line across the observed range, relative to the mean ratio
    pub drift: f64,
}

impl ModelFit {
    /// Fits `model` against `points`
    ///
    /// Returns `None` if the normalized series cannot be regressed or its mean ratio is zero.
    pub fn evaluate(model: AsymptoticModel, points: &[Point]) -> Option<Self> {
        let normalized = model.normalize(points);
        let fit = fit_points(&normalized)?;
        let mean_ratio = weighted_mean(&normalized)?;
        if mean_ratio == 0.0 || !mean_ratio.is_finite() {
            return None;
        }

        let (x_min, x_max) = normalized
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
                (lo.min(p.x), hi.max(p.x))
            });
        let drift = (fit.slope * (x_max - x_min) / mean_ratio).abs();

        Some(Self {
            model,
            fit,
            mean_ratio,
            drift,
        })
    }
}

/// Fits every model against `points` and orders them from best to worst match
///
/// Flatter ratio curves (smaller drift) rank first; ties are broken by the weaker
/// correlation.
pub fn rank_models(points: &[Point]) -> Vec<ModelFit> {
    let mut fits: Vec<ModelFit> = AsymptoticModel::ALL
        .iter()
        .filter_map(|&model| ModelFit::evaluate(model, points))
        .collect();

    fits.sort_by(|a, b| {
        a.drift
            .total_cmp(&b.drift)
            .then_with(|| a.fit.r.abs().total_cmp(&b.fit.r.abs()))
    });
    fits
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn generated(model: AsymptoticModel) -> Vec<Point> {
        (1..=40)
            .map(|i| {
                let n = 1000.0 * i as f64;
                Point::new(n, 5.0 * model.evaluate(n))
            })
            .collect()
    }

    #[rstest]
    #[case(AsymptoticModel::Constant, 1.0)]
    #[case(AsymptoticModel::Linear, 100.0)]
    #[case(AsymptoticModel::NLogN, 100.0 * 100f64.ln())]
    #[case(AsymptoticModel::NSqrtN, 1000.0)]
    #[case(AsymptoticModel::NLogNSqrtN, 1000.0 * 100f64.ln())]
    #[case(AsymptoticModel::Quadratic, 10_000.0)]
    #[case(AsymptoticModel::QuadraticLogN, 10_000.0 * 100f64.ln())]
    fn evaluates_at_one_hundred(#[case] model: AsymptoticModel, #[case] expected: f64) {
        assert!((model.evaluate(100.0) - expected).abs() < 1e-9);
    }

    #[test]
    fn names_are_unique_and_ordered() {
        let names: Vec<&str> = AsymptoticModel::ALL.iter().map(|m| m.name()).collect();
        let mut sorted = names.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(names, sorted);
    }

    #[test]
    fn normalize_drops_points_with_zero_scale() {
        let points = [Point::new(1.0, 10.0), Point::new(10.0, 20.0)];
        let normalized = AsymptoticModel::NLogN.normalize(&points);

        assert_eq!(normalized.len(), 1);
        assert_eq!(normalized[0].x, 10.0);
        assert!((normalized[0].y - 20.0 / (10.0 * 10f64.ln())).abs() < 1e-12);
    }

    #[test]
    fn normalize_by_matching_model_is_flat() {
        let normalized = AsymptoticModel::Quadratic.normalize(&generated(AsymptoticModel::Quadratic));
        assert!(normalized.iter().all(|p| (p.y - 5.0).abs() < 1e-9));
    }

    #[rstest]
    #[case(AsymptoticModel::Linear)]
    #[case(AsymptoticModel::NLogN)]
    #[case(AsymptoticModel::Quadratic)]
    fn ranking_prefers_generating_model(#[case] model: AsymptoticModel) {
        let ranking = rank_models(&generated(model));
        assert_eq!(ranking.len(), AsymptoticModel::ALL.len());
        assert_eq!(ranking[0].model, model);
        assert!(ranking[0].drift < 1e-6);
        assert!((ranking[0].mean_ratio - 5.0).abs() < 1e-6);
    }

    #[test]
    fn ranking_of_too_few_points_is_empty() {
        assert!(rank_models(&[Point::new(500.0, 1.0)]).is_empty());
    }
}
