// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod catalog;
pub mod feature;
pub mod stats;

pub use catalog::{Catalog, MetricDefinition, Region};
pub use feature::{AttributeValue, Feature, FeatureCollection};
pub use stats::MetricStats;
