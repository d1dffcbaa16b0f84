//! Ordinary least-squares line fitting

use super::descriptive::student_t_two_sided;
use crate::common::data_structures::Point;

/// Result of fitting `y = intercept + slope * x`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    /// Pearson correlation coefficient between `x` and `y`
    pub r: f64,
    /// Two-sided p-value for the null hypothesis that the slope is zero
    pub p_value: f64,
    /// Standard error of the slope
    pub std_err: f64,
}

impl LinearFit {
    /// Value of the fitted line at `x`
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }

    pub fn r_squared(&self) -> f64 {
        self.r * self.r
    }
}

/// Fits a least-squares line through `(x[i], y[i])`
///
/// # Returns
/// * `Some(LinearFit)` - The fitted line and its quality statistics
/// * `None` - If the slices differ in length, hold fewer than two points, or all `x` are equal
///
/// When every `y` is equal the correlation is reported as `0`.
pub fn linear_regression(x: &[f64], y: &[f64]) -> Option<LinearFit> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }

    let n = x.len() as f64;
    let x_mean = x.iter().sum::<f64>() / n;
    let y_mean = y.iter().sum::<f64>() / n;

    let (ssxm, ssym, ssxym) = x.iter().zip(y).fold((0.0, 0.0, 0.0), |(sxx, syy, sxy), (xi, yi)| {
        let dx = xi - x_mean;
        let dy = yi - y_mean;
        (sxx + dx * dx, syy + dy * dy, sxy + dx * dy)
    });

    if !ssxm.is_finite() || ssxm <= 0.0 {
        return None;
    }

    let slope = ssxym / ssxm;
    let intercept = y_mean - slope * x_mean;
    let r = if ssym <= 0.0 {
        0.0
    } else {
        (ssxym / (ssxm * ssym).sqrt()).clamp(-1.0, 1.0)
    };

    let df = n - 2.0;
    let (p_value, std_err) = if df <= 0.0 {
        // Two points always lie on a line.
        (0.0, 0.0)
    } else {
        let t = r * (df / ((1.0 - r) * (1.0 + r) + f64::MIN_POSITIVE)).sqrt();
        let std_err = ((1.0 - r * r) * ssym / ssxm / df).max(0.0).sqrt();
        (student_t_two_sided(t, df), std_err)
    };

    Some(LinearFit {
        slope,
        intercept,
        r,
        p_value,
        std_err,
    })
}

/// Fits a line through a series of points
pub fn fit_points(points: &[Point]) -> Option<LinearFit> {
    let x: Vec<f64> = points.iter().map(|p| p.x).collect();
    let y: Vec<f64> = points.iter().map(|p| p.y).collect();
    linear_regression(&x, &y)
}

/// `x`-weighted mean of `y`: `Σ(x·y) / Σx`
///
/// Returns `None` for an empty series or when the weights sum to zero.
pub fn weighted_mean(points: &[Point]) -> Option<f64> {
    let weight: f64 = points.iter().map(|p| p.x).sum();
    if weight == 0.0 {
        return None;
    }

    Some(points.iter().map(|p| p.x * p.y).sum::<f64>() / weight)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_line_has_unit_correlation() {
        let x: Vec<f64> = (0..20).map(|i| i as f64 * 10.0).collect();
        let y: Vec<f64> = x.iter().map(|v| 3.0 * v - 7.0).collect();

        let fit = linear_regression(&x, &y).unwrap();
        assert!((fit.r - 1.0).abs() < 1e-9);
        assert!((fit.slope - 3.0).abs() < 1e-9);
        assert!((fit.intercept + 7.0).abs() < 1e-9);
        assert!(fit.p_value < 1e-10);
        assert!(fit.std_err < 1e-6);
        assert!((fit.predict(5.0) - 8.0).abs() < 1e-9);
    }

    #[test]
    fn decreasing_line_has_negative_correlation() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [8.0, 6.0, 4.0, 2.0];
        let fit = linear_regression(&x, &y).unwrap();
        assert!((fit.r + 1.0).abs() < 1e-9);
        assert!((fit.r_squared() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn noisy_data_matches_reference() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [2.0, 4.0, 5.0, 4.0, 5.0];
        let fit = linear_regression(&x, &y).unwrap();

        assert!((fit.slope - 0.6).abs() < 1e-12);
        assert!((fit.intercept - 2.2).abs() < 1e-12);
        assert!((fit.r - 0.774_596_669_241_483_4).abs() < 1e-9);
        assert!((fit.std_err - 0.282_842_712_474_619).abs() < 1e-9);
        assert!((fit.p_value - 0.124_027_062_657_554).abs() < 1e-6);
    }

    #[test]
    fn constant_y_has_zero_correlation() {
        let fit = linear_regression(&[1.0, 2.0, 3.0], &[4.0, 4.0, 4.0]).unwrap();
        assert_eq!(fit.r, 0.0);
        assert_eq!(fit.slope, 0.0);
        assert_eq!(fit.intercept, 4.0);
    }

    #[test]
    fn degenerate_inputs_are_rejected() {
        assert!(linear_regression(&[], &[]).is_none());
        assert!(linear_regression(&[1.0], &[2.0]).is_none());
        assert!(linear_regression(&[1.0, 2.0], &[2.0]).is_none());
        assert!(linear_regression(&[3.0, 3.0, 3.0], &[1.0, 2.0, 3.0]).is_none());
    }

    #[test]
    fn two_points_fit_exactly() {
        let fit = fit_points(&[Point::new(0.0, 1.0), Point::new(2.0, 5.0)]).unwrap();
        assert_eq!(fit.slope, 2.0);
        assert_eq!(fit.p_value, 0.0);
    }

    #[test]
    fn weighted_mean_favours_large_x() {
        let points = [Point::new(1.0, 10.0), Point::new(3.0, 2.0)];
        assert_eq!(weighted_mean(&points), Some(4.0));
        assert_eq!(weighted_mean(&[]), None);
    }
}
