use serde::{Deserialize, Serialize};

/// A single timing sample as emitted by the benchmark harness.
///
/// The harness serializes [`std::time::Duration`] through serde, which produces
/// `{"secs": .., "nanos": ..}`. Older result files store plain nanosecond counts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DurationSample {
    /// Split representation used by [`std::time::Duration`]
    Split { secs: u64, nanos: u32 },
    /// Duration already expressed in nanoseconds
    Nanos(f64),
}

impl DurationSample {
    /// Returns the sample as nanoseconds
    pub fn as_nanos_f64(&self) -> f64 {
        match *self {
            DurationSample::Split { secs, nanos } => secs as f64 * 1e9 + nanos as f64,
            DurationSample::Nanos(nanos) => nanos,
        }
    }
}

/// One benchmark measurement: a matrix implementation running one operation
/// on matrices of a given size and population.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkRecord {
    /// Name of the matrix implementation under test
    pub matrix_type: String,
    /// Operation that was timed (e.g. `mul`, `add`)
    pub operation: String,
    /// Name of the generator used to fill the operands
    pub generator: String,
    /// Fraction of nonzero entries, when the harness recorded it
    #[serde(default)]
    pub occupation: Option<f64>,
    /// Number of nonzero entries in each operand
    pub population: u64,
    /// Matrix dimension (operands are `size` x `size`)
    pub size: u64,
    /// Power of ten of the matrix dimension, when the harness recorded it
    #[serde(default, rename = "i")]
    pub exponent: Option<u32>,
    /// Raw timing samples
    pub durations: Vec<DurationSample>,
}

impl BenchmarkRecord {
    /// All samples converted to nanoseconds, in recorded order
    pub fn durations_nanos(&self) -> Vec<f64> {
        self.durations.iter().map(DurationSample::as_nanos_f64).collect()
    }

    /// Fastest sample in nanoseconds, or `None` if the record has no samples
    pub fn min_duration_nanos(&self) -> Option<f64> {
        self.durations
            .iter()
            .map(DurationSample::as_nanos_f64)
            .reduce(f64::min)
    }

    /// Mean sample in nanoseconds, or `None` if the record has no samples
    pub fn mean_duration_nanos(&self) -> Option<f64> {
        if self.durations.is_empty() {
            return None;
        }

        let total: f64 = self.durations.iter().map(DurationSample::as_nanos_f64).sum();
        Some(total / self.durations.len() as f64)
    }

    pub fn mean_duration_millis(&self) -> Option<f64> {
        self.mean_duration_nanos().map(|nanos| nanos / 1e6)
    }

    /// Power of ten of the matrix dimension.
    ///
    /// Uses the recorded exponent if present, otherwise derives it from `size`.
    pub fn exponent(&self) -> u32 {
        self.exponent.unwrap_or_else(|| self.size.max(1).ilog10())
    }
}

/// A sample of a numeric series, ordered by `x`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Sorts points by `x`, keeping the input order of equal keys.
pub fn sort_by_x(points: &[Point]) -> Vec<Point> {
    let mut sorted = points.to_vec();
    sorted.sort_by(|a, b| a.x.total_cmp(&b.x));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with(durations: Vec<DurationSample>) -> BenchmarkRecord {
        BenchmarkRecord {
            matrix_type: "HashMapMatrix".to_string(),
            operation: "mul".to_string(),
            generator: "uniform".to_string(),
            occupation: None,
            population: 1000,
            size: 100,
            exponent: None,
            durations,
        }
    }

    #[test]
    fn deserializes_split_and_plain_durations() {
        let json = r#"{
            "matrix_type": "TreeMatrix",
            "operation": "add",
            "generator": "uniform",
            "population": 50,
            "size": 10,
            "durations": [{"secs": 1, "nanos": 500}, 250.0]
        }"#;

        let record: BenchmarkRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.occupation, None);
        assert_eq!(record.exponent, None);
        assert_eq!(record.durations_nanos(), vec![1_000_000_500.0, 250.0]);
    }

    #[test]
    fn missing_required_field_is_rejected() {
        let json = r#"{"matrix_type": "TreeMatrix", "operation": "add", "durations": []}"#;
        assert!(serde_json::from_str::<BenchmarkRecord>(json).is_err());
    }

    #[test]
    fn derived_metrics() {
        let record = record_with(vec![
            DurationSample::Split { secs: 0, nanos: 3_000_000 },
            DurationSample::Split { secs: 0, nanos: 1_000_000 },
            DurationSample::Nanos(2_000_000.0),
        ]);

        assert_eq!(record.min_duration_nanos(), Some(1_000_000.0));
        assert_eq!(record.mean_duration_nanos(), Some(2_000_000.0));
        assert_eq!(record.mean_duration_millis(), Some(2.0));
    }

    #[test]
    fn empty_record_has_no_metrics() {
        let record = record_with(vec![]);
        assert_eq!(record.min_duration_nanos(), None);
        assert_eq!(record.mean_duration_nanos(), None);
    }

    #[test]
    fn exponent_prefers_recorded_value() {
        let mut record = record_with(vec![]);
        assert_eq!(record.exponent(), 2);

        record.exponent = Some(4);
        assert_eq!(record.exponent(), 4);

        record.exponent = None;
        record.size = 0;
        assert_eq!(record.exponent(), 0);
    }

    #[test]
    fn sort_by_x_is_stable() {
        let points = vec![
            Point::new(2.0, 1.0),
            Point::new(1.0, 2.0),
            Point::new(2.0, 3.0),
        ];
        let sorted = sort_by_x(&points);
        assert_eq!(
            sorted,
            vec![Point::new(1.0, 2.0), Point::new(2.0, 1.0), Point::new(2.0, 3.0)]
        );
    }
}
