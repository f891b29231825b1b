// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shareable encoding of custom metric ranges.
//!
//! Ranges travel as query-string pairs `<metric>_range=<min>,<max>`.
//! Numbers use Rust's shortest round-trip formatting so that decoding
//! reproduces the exact same `f64` pair.

use std::collections::BTreeMap;

const RANGE_SUFFIX: &str = "_range";

/// A custom `(min, max)` range for one metric.
pub type Range = (f64, f64);

/// Encode ranges as a query string (without the leading `?`), sorted by key.
pub fn encode_ranges(ranges: &BTreeMap<String, Range>) -> String {
    ranges
        .iter()
        .map(|(metric, (min, max))| {
            format!(
                "{}{}={}",
                urlencoding::encode(metric),
                RANGE_SUFFIX,
                urlencoding::encode(&format!("{},{}", min, max))
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Decode `*_range` pairs from a query string.
///
/// Unrelated parameters are ignored. Pairs that are not two finite numbers
/// with `min < max` are dropped with a warning.
pub fn decode_ranges(query: &str) -> BTreeMap<String, Range> {
    let mut ranges = BTreeMap::new();

    for pair in query.trim_start_matches('?').split('&') {
        let Some((raw_key, raw_value)) = pair.split_once('=') else {
            continue;
        };
        let Some(key) = decode_component(raw_key) else {
            continue;
        };
        let Some(metric) = key.strip_suffix(RANGE_SUFFIX) else {
            continue;
        };

        match decode_component(raw_value).as_deref().and_then(parse_range) {
            Some(range) => {
                ranges.insert(metric.to_string(), range);
            }
            None => {
                tracing::warn!(metric, value = raw_value, "Ignoring invalid shared range");
            }
        }
    }

    ranges
}

fn decode_component(raw: &str) -> Option<String> {
    // Query strings may encode spaces as '+'
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced).ok().map(|s| s.into_owned())
}

fn parse_range(value: &str) -> Option<Range> {
    let (min, max) = value.split_once(',')?;
    let min = min.trim().parse::<f64>().ok()?;
    let max = max.trim().parse::<f64>().ok()?;
    (min.is_finite() && max.is_finite() && min < max).then_some((min, max))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_is_exact() {
        let mut ranges = BTreeMap::new();
        ranges.insert("Median_HH_Income".to_string(), (50000.0, 250000.5));
        ranges.insert("Kids 4-18 >$250k".to_string(), (0.1 + 0.2, 1.0 / 3.0));

        let encoded = encode_ranges(&ranges);
        assert_eq!(decode_ranges(&encoded), ranges);
    }

    #[test]
    fn test_encoding_format() {
        let mut ranges = BTreeMap::new();
        ranges.insert("Households".to_string(), (100.0, 200.0));
        assert_eq!(encode_ranges(&ranges), "Households_range=100%2C200");
    }

    #[test]
    fn test_decode_accepts_plain_comma_and_question_mark() {
        let ranges = decode_ranges("?Households_range=1,2&zoom=4&Mosaic_A_range=0%2C10");
        assert_eq!(ranges.get("Households"), Some(&(1.0, 2.0)));
        assert_eq!(ranges.get("Mosaic_A"), Some(&(0.0, 10.0)));
        assert_eq!(ranges.len(), 2);
    }

    #[test]
    fn test_decode_drops_invalid_pairs() {
        let ranges = decode_ranges("a_range=5,5&b_range=x,1&c_range=9,1&d_range=1&e_range=1,2");
        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges.get("e"), Some(&(1.0, 2.0)));
    }

    #[test]
    fn test_empty_query() {
        assert!(decode_ranges("").is_empty());
        assert_eq!(encode_ranges(&BTreeMap::new()), "");
    }
}
