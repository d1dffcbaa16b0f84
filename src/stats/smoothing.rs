//! Savitzky–Golay smoothing
//!
//! Each output value is the value at that sample of a least-squares polynomial fitted to
//! a window of neighbouring samples. Samples closer to the ends than half a window are
//! evaluated on the polynomial fitted to the first (or last) full window.
//!
//! Samples are assumed to be evenly spaced; `x` values are not consulted.

/// Smooths `values` with a Savitzky–Golay filter
///
/// # Arguments
/// * `values` - The samples to smooth
/// * `window_length` - Preferred window length; shrunk to the largest odd length that fits
/// * `polyorder` - Polynomial degree; clamped below the effective window length
///
/// # Returns
/// The smoothed samples. Series too short for a window of at least 3 are returned as-is.
pub fn savgol_smooth(values: &[f64], window_length: usize, polyorder: usize) -> Vec<f64> {
    let window = effective_window(values.len(), window_length);
    if window < 3 {
        return values.to_vec();
    }

    let polyorder = polyorder.min(window - 1);
    let half = window / 2;
    let n = values.len();
    let mut smoothed = Vec::with_capacity(n);

    for i in 0..n {
        // Window start, held in place near the edges so the window always fits.
        let start = i.saturating_sub(half).min(n - window);
        let segment = &values[start..start + window];
        let offset = i as f64 - (start + half) as f64;

        let value = fit_polynomial(segment, half, polyorder)
            .map(|coefficients| evaluate(&coefficients, offset))
            .unwrap_or(values[i]);
        smoothed.push(value);
    }

    smoothed
}

fn effective_window(len: usize, window_length: usize) -> usize {
    let window = window_length.min(len);
    if window % 2 == 0 {
        window.saturating_sub(1)
    } else {
        window
    }
}

/// Least-squares polynomial through `segment`, with abscissae centred on index `center`
fn fit_polynomial(segment: &[f64], center: usize, degree: usize) -> Option<Vec<f64>> {
    let dim = degree + 1;
    let mut a = vec![vec![0.0; dim]; dim];
    let mut b = vec![0.0; dim];

    for (j, &y) in segment.iter().enumerate() {
        let t = j as f64 - center as f64;
        let mut powers = vec![1.0; dim * 2];
        for p in 1..powers.len() {
            powers[p] = powers[p - 1] * t;
        }

        for row in 0..dim {
            b[row] += y * powers[row];
            for col in 0..dim {
                a[row][col] += powers[row + col];
            }
        }
    }

    solve_linear_system(a, b)
}

fn evaluate(coefficients: &[f64], t: f64) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, c| acc * t + c)
}

/// Gauss–Jordan elimination with partial pivoting
fn solve_linear_system(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();
    for pivot in 0..n {
        let mut best_row = pivot;
        let mut best_abs = a[pivot][pivot].abs();
        for (row, values) in a.iter().enumerate().skip(pivot + 1) {
            let candidate = values[pivot].abs();
            if candidate > best_abs {
                best_abs = candidate;
                best_row = row;
            }
        }
        if !best_abs.is_finite() || best_abs <= f64::EPSILON {
            return None;
        }
        if best_row != pivot {
            a.swap(pivot, best_row);
            b.swap(pivot, best_row);
        }

        let pivot_value = a[pivot][pivot];
        for col in pivot..n {
            a[pivot][col] /= pivot_value;
        }
        b[pivot] /= pivot_value;

        for row in 0..n {
            if row == pivot {
                continue;
            }
            let factor = a[row][pivot];
            if factor == 0.0 {
                continue;
            }
            for col in pivot..n {
                a[row][col] -= factor * a[pivot][col];
            }
            b[row] -= factor * b[pivot];
        }
    }
    Some(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn assert_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-6, "{actual:?} != {expected:?}");
        }
    }

    #[rstest]
    #[case(vec![])]
    #[case(vec![1.0])]
    #[case(vec![1.0, 5.0])]
    fn short_series_are_untouched(#[case] values: Vec<f64>) {
        assert_eq!(savgol_smooth(&values, 7, 3), values);
    }

    #[test]
    fn cubic_is_reproduced_exactly() {
        let values: Vec<f64> = (0..12)
            .map(|i| {
                let x = i as f64;
                0.5 * x * x * x - 2.0 * x * x + x - 3.0
            })
            .collect();
        assert_close(&savgol_smooth(&values, 7, 3), &values);
    }

    #[test]
    fn window_shrinks_to_fit_series() {
        // Four samples shrink the window to 3 and the order to 2: an exact parabola fit.
        let values = vec![1.0, 4.0, 9.0, 16.0];
        assert_close(&savgol_smooth(&values, 7, 3), &values);
    }

    #[test]
    fn zero_order_smoothing_is_a_moving_average() {
        let values = vec![0.0, 3.0, 0.0, 3.0, 0.0, 3.0, 0.0];
        let smoothed = savgol_smooth(&values, 3, 0);

        assert!((smoothed[1] - 1.0).abs() < 1e-9);
        assert!((smoothed[2] - 2.0).abs() < 1e-9);
        // Edges reuse the first and last full windows.
        assert!((smoothed[0] - 1.0).abs() < 1e-9);
        assert!((smoothed[6] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn solves_small_system() {
        let a = vec![vec![2.0, 1.0], vec![1.0, 3.0]];
        let b = vec![3.0, 5.0];
        let solution = solve_linear_system(a, b).unwrap();
        assert_close(&solution, &[0.8, 1.4]);
    }

    #[test]
    fn singular_system_has_no_solution() {
        let a = vec![vec![1.0, 2.0], vec![2.0, 4.0]];
        assert!(solve_linear_system(a, vec![1.0, 2.0]).is_none());
    }
}
