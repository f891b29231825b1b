// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Distribution statistics for one metric over one feature collection.
//!
//! Stats are derived per (collection, metric) pair and are never carried
//! over to a different region's collection.

use serde::{Deserialize, Serialize};

/// Min/max/mean/median over the numeric values of a metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    /// Number of features that contributed a numeric value
    pub count: usize,
}

impl MetricStats {
    /// Whether the data spans a usable interpolation range.
    pub fn is_flat(&self) -> bool {
        self.max <= self.min
    }

    /// Relative position of the median within `[min, max]`, for the legend
    /// marker. Clamped to `[0, 1]`.
    pub fn median_position(&self, min: f64, max: f64) -> f64 {
        if max <= min {
            return 0.0;
        }
        ((self.median - min) / (max - min)).clamp(0.0, 1.0)
    }
}
