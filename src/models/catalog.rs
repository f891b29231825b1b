// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Declarative catalog: selectable regions, the metric registry, color
//! presets and the schools overlay source.

use crate::services::color_scale::ScalePreset;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// One selectable region (city) with its own geometry file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Region {
    /// Stable identifier (e.g. "austin")
    pub id: String,
    /// Display name (e.g. "TX - Austin")
    pub name: String,
    /// KML path, relative to the data directory
    pub source: String,
    /// Camera center as `[lon, lat]`
    #[serde(default)]
    pub center: Option<[f64; 2]>,
    #[serde(default)]
    pub zoom: Option<f64>,
}

/// Registry entry describing how a metric is listed and ranged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDefinition {
    /// Attribute key in the KML data
    pub key: String,
    pub display_name: String,
    /// Position in the metric selector (ascending)
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub default_min: Option<f64>,
    #[serde(default)]
    pub default_max: Option<f64>,
    /// Use the data maximum as the default upper bound
    #[serde(default = "default_true")]
    pub use_max_as_default: bool,
}

fn default_true() -> bool {
    true
}

/// Point overlay settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchoolsConfig {
    /// GeoJSON path, relative to the data directory
    pub source: String,
    #[serde(default = "default_threshold_attribute")]
    pub attribute: String,
    #[serde(default = "default_min_tuition")]
    pub default_threshold: f64,
}

fn default_threshold_attribute() -> String {
    "tuition".to_string()
}

fn default_min_tuition() -> f64 {
    30000.0
}

/// The full catalog as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub regions: Vec<Region>,
    #[serde(default)]
    pub metrics: Vec<MetricDefinition>,
    pub presets: BTreeMap<String, ScalePreset>,
    pub default_preset: String,
    #[serde(default)]
    pub schools: Option<SchoolsConfig>,
}

impl Catalog {
    /// Load the catalog from a JSON file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let json_data =
            fs::read_to_string(path.as_ref()).map_err(|e| CatalogError::IoError(e.to_string()))?;
        Self::load_from_json(&json_data)
    }

    /// Load and validate the catalog from a JSON string.
    pub fn load_from_json(json_data: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog = serde_json::from_str(json_data)
            .map_err(|e| CatalogError::ParseError(e.to_string()))?;
        catalog.validate()?;

        tracing::info!(
            regions = catalog.regions.len(),
            metrics = catalog.metrics.len(),
            presets = catalog.presets.len(),
            "Loaded catalog"
        );
        Ok(catalog)
    }

    fn validate(&self) -> Result<(), CatalogError> {
        let mut seen = HashSet::new();
        for region in &self.regions {
            if !seen.insert(region.id.as_str()) {
                return Err(CatalogError::DuplicateRegion(region.id.clone()));
            }
        }

        let mut seen = HashSet::new();
        for metric in &self.metrics {
            if !seen.insert(metric.key.as_str()) {
                return Err(CatalogError::DuplicateMetric(metric.key.clone()));
            }
        }

        for (name, preset) in &self.presets {
            if preset.colors.len() < 2 {
                return Err(CatalogError::InvalidPreset(name.clone()));
            }
        }

        if !self.presets.contains_key(&self.default_preset) {
            return Err(CatalogError::UnknownPreset(self.default_preset.clone()));
        }
        Ok(())
    }

    pub fn region(&self, id: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.id == id)
    }

    /// Regions in selector order (by display name).
    pub fn regions_by_name(&self) -> Vec<&Region> {
        let mut regions: Vec<&Region> = self.regions.iter().collect();
        regions.sort_by(|a, b| a.name.cmp(&b.name));
        regions
    }

    pub fn metric(&self, key: &str) -> Option<&MetricDefinition> {
        self.metrics.iter().find(|m| m.key == key)
    }

    /// Look up a preset by name, or the default preset when `name` is `None`.
    pub fn preset(&self, name: Option<&str>) -> Result<&ScalePreset, CatalogError> {
        let name = name.unwrap_or(&self.default_preset);
        self.presets
            .get(name)
            .ok_or_else(|| CatalogError::UnknownPreset(name.to_string()))
    }
}

/// Errors from catalog loading.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to read file: {0}")]
    IoError(String),

    #[error("Failed to parse catalog: {0}")]
    ParseError(String),

    #[error("Duplicate region id: {0}")]
    DuplicateRegion(String),

    #[error("Duplicate metric key: {0}")]
    DuplicateMetric(String),

    #[error("Preset {0} needs at least 2 colors")]
    InvalidPreset(String),

    #[error("Unknown color preset: {0}")]
    UnknownPreset(String),
}
