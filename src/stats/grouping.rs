//! Grouped aggregation of measurements

use std::collections::BTreeMap;

/// Key of the grouped duration aggregate used by the asymptotic analysis
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupKey {
    pub operation: String,
    pub matrix_type: String,
    pub generator: String,
    pub population: u64,
}

/// Running sum used to compute a mean per key
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MeanAccumulator {
    sum: f64,
    count: usize,
}

impl MeanAccumulator {
    pub fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

/// Collapses `(key, value)` pairs into the mean value of each key
///
/// Keys come back in ascending order, so downstream output is deterministic.
pub fn group_mean<K, I>(items: I) -> BTreeMap<K, f64>
where
    K: Ord,
    I: IntoIterator<Item = (K, f64)>,
{
    let mut groups: BTreeMap<K, MeanAccumulator> = BTreeMap::new();
    for (key, value) in items {
        groups.entry(key).or_default().push(value);
    }

    groups
        .into_iter()
        .filter_map(|(key, acc)| acc.mean().map(|mean| (key, mean)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(operation: &str, matrix_type: &str, population: u64) -> GroupKey {
        GroupKey {
            operation: operation.to_string(),
            matrix_type: matrix_type.to_string(),
            generator: "uniform".to_string(),
            population,
        }
    }

    #[test]
    fn duplicate_keys_collapse_to_mean() {
        let grouped = group_mean(vec![
            (key("mul", "Tree", 100), 10.0),
            (key("mul", "Tree", 100), 20.0),
            (key("mul", "Tree", 100), 60.0),
            (key("mul", "Hash", 100), 5.0),
        ]);

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[&key("mul", "Tree", 100)], 30.0);
        assert_eq!(grouped[&key("mul", "Hash", 100)], 5.0);
    }

    #[test]
    fn keys_are_ordered() {
        let grouped = group_mean(vec![
            (key("mul", "Tree", 300), 1.0),
            (key("add", "Tree", 100), 1.0),
            (key("mul", "Tree", 200), 1.0),
        ]);
        let populations: Vec<(String, u64)> = grouped
            .keys()
            .map(|k| (k.operation.clone(), k.population))
            .collect();

        assert_eq!(
            populations,
            vec![
                ("add".to_string(), 100),
                ("mul".to_string(), 200),
                ("mul".to_string(), 300)
            ]
        );
    }

    #[test]
    fn accumulator_without_values_has_no_mean() {
        let mut acc = MeanAccumulator::default();
        assert_eq!(acc.mean(), None);
        acc.push(4.0);
        acc.push(8.0);
        assert_eq!(acc.mean(), Some(6.0));
    }
}
