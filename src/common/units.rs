//! Time unit constants and human-friendly duration formatting
//!
//! All durations in the analysis are carried as nanoseconds in `f64`.

/// Nanoseconds per microsecond
pub const MICROSECOND_NS: f64 = 1e3;

/// Nanoseconds per millisecond
pub const MILLISECOND_NS: f64 = 1e6;

/// Nanoseconds per second
pub const SECOND_NS: f64 = 1e9;

/// Units tried from largest to smallest when formatting a duration.
const TIME_UNITS: [(&str, f64); 4] = [
    ("s", SECOND_NS),
    ("ms", MILLISECOND_NS),
    ("µs", MICROSECOND_NS),
    ("ns", 1.0),
];

/// Formats a duration in nanoseconds using the largest unit in which the value is at least 1
///
/// Values below one nanosecond (including zero) are still shown in nanoseconds.
///
/// # Arguments
/// * `nanos` - The duration to format, in nanoseconds
///
/// # Returns
/// The scaled value with three decimals followed by its unit, e.g. `1.500 ms`
pub fn format_duration(nanos: f64) -> String {
    let (unit, factor) = TIME_UNITS
        .iter()
        .copied()
        .find(|&(_, factor)| nanos >= factor)
        .unwrap_or(("ns", 1.0));

    format!("{:.3} {}", nanos / factor, unit)
}
