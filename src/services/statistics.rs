// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Metric statistics over a feature collection.

use crate::models::feature::FeatureCollection;
use crate::models::stats::MetricStats;

/// Numeric values under `key`, in feature order.
///
/// Features missing the key or carrying a non-numeric value are skipped,
/// never counted as zero.
pub fn numeric_values(collection: &FeatureCollection, key: &str) -> Vec<f64> {
    collection
        .features()
        .iter()
        .filter_map(|f| f.number(key))
        .collect()
}

/// Compute min/max/mean/median for `key`.
///
/// Returns `None` when no feature exposes a numeric value under `key`.
pub fn compute_stats(collection: &FeatureCollection, key: &str) -> Option<MetricStats> {
    let mut values = numeric_values(collection, key);
    if values.is_empty() {
        return None;
    }

    values.sort_by(f64::total_cmp);

    let count = values.len();
    let sum: f64 = values.iter().sum();

    Some(MetricStats {
        min: values[0],
        max: values[count - 1],
        mean: sum / count as f64,
        median: median_of_sorted(&values)?,
        count,
    })
}

/// Textbook median of an ascending slice: the middle element for odd
/// lengths, the mean of the two middle elements for even lengths.
pub fn median_of_sorted(sorted: &[f64]) -> Option<f64> {
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    let mid = n / 2;
    if n % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::feature::{AttributeValue, Feature};

    fn collection(values: &[Option<AttributeValue>]) -> FeatureCollection {
        FeatureCollection::new(
            values
                .iter()
                .map(|v| {
                    let mut f = Feature::default();
                    if let Some(v) = v {
                        f.attributes.insert("m".to_string(), v.clone());
                    }
                    f
                })
                .collect(),
        )
    }

    fn nums(values: &[f64]) -> FeatureCollection {
        collection(
            &values
                .iter()
                .map(|v| Some(AttributeValue::Number(*v)))
                .collect::<Vec<_>>(),
        )
    }

    #[test]
    fn test_median_even_and_odd() {
        assert_eq!(compute_stats(&nums(&[4.0, 1.0, 3.0, 2.0]), "m").unwrap().median, 2.5);
        assert_eq!(compute_stats(&nums(&[3.0, 1.0, 2.0]), "m").unwrap().median, 2.0);
        assert_eq!(median_of_sorted(&[]), None);
    }

    #[test]
    fn test_min_max_mean() {
        let stats = compute_stats(&nums(&[10.0, -2.0, 7.0]), "m").unwrap();
        assert_eq!(stats.min, -2.0);
        assert_eq!(stats.max, 10.0);
        assert_eq!(stats.mean, 5.0);
        assert_eq!(stats.count, 3);
    }

    #[test]
    fn test_missing_and_text_values_excluded() {
        let fc = collection(&[
            Some(AttributeValue::Number(4.0)),
            None,
            Some(AttributeValue::Text("n/a".to_string())),
            Some(AttributeValue::Number(8.0)),
        ]);
        let stats = compute_stats(&fc, "m").unwrap();
        assert_eq!(stats.count, 2);
        assert_eq!(stats.min, 4.0);
        assert_eq!(stats.mean, 6.0);
    }

    #[test]
    fn test_no_data() {
        let fc = collection(&[None, Some(AttributeValue::Text("x".to_string()))]);
        assert!(compute_stats(&fc, "m").is_none());
        assert!(compute_stats(&FeatureCollection::default(), "m").is_none());
    }

    #[test]
    fn test_single_value() {
        let stats = compute_stats(&nums(&[7.0]), "m").unwrap();
        assert_eq!((stats.min, stats.max, stats.median), (7.0, 7.0, 7.0));
        assert!(stats.is_flat());
    }
}
