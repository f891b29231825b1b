// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Region session controller.
//!
//! Owns the session state (active region, active metric, custom ranges)
//! together with the active feature collection and color scale, and drives
//! the rendering surface:
//!
//! 1. Select a region and fetch its KML (`begin_region_load`)
//! 2. Parse, replace the region layer, enumerate metrics
//!    (`complete_region_load`)
//! 3. Compute stats, resolve the range, build the scale and paint
//!
//! Region loads may complete out of order. Each load carries a ticket and
//! only the most recently issued ticket is applied; anything older is
//! discarded on arrival.

use crate::models::catalog::{Catalog, MetricDefinition, Region};
use crate::models::feature::FeatureCollection;
use crate::models::stats::MetricStats;
use crate::render::{Camera, LayerKind, LayerSpec, RenderError, RenderSurface};
use crate::services::color_scale::{no_data_rule, ColorScale, ScaleError, ScalePreset};
use crate::services::kml::{parse_kml, KmlError};
use crate::services::loader::{FetchError, SourceLoader};
use crate::services::share::{self, Range};
use crate::services::statistics::compute_stats;
use crate::ui::{ControlSurface, MetricOption};
use serde::Serialize;
use serde_json::{json, Map};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Padding added around a region's bounds when it has no configured camera.
const FIT_BOUNDS_PADDING: f64 = 0.1;

/// Lifecycle of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Idle,
    Loading,
    Ready,
}

/// Handle for one in-flight region load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    region_id: String,
    source: String,
    generation: u64,
}

impl LoadTicket {
    pub fn region_id(&self) -> &str {
        &self.region_id
    }

    /// Path of the region's geometry file.
    pub fn source(&self) -> &str {
        &self.source
    }
}

/// What the session is currently showing for the active metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MetricDisplay {
    Painted { metric: String, min: f64, max: f64 },
    /// The metric has no numeric values in this region; the fill is hidden
    NoData { metric: String },
    /// The region exposes no known metric
    NoMetrics,
}

/// Result of completing a region load.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Applied(MetricDisplay),
    /// A newer selection was made while this load was in flight
    Superseded,
}

/// User-facing session state.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionState {
    pub active_region_id: Option<String>,
    pub active_metric_key: Option<String>,
    /// Ranges entered during this session
    pub custom_ranges: BTreeMap<String, Range>,
    /// Ranges restored from a shared query string at startup
    pub shared_ranges: BTreeMap<String, Range>,
    /// Metrics whose custom range matched the default when applied
    pub unshared: BTreeSet<String>,
}

struct ActiveRegion {
    id: String,
    collection: FeatureCollection,
    source_id: String,
    layer_id: String,
    metrics: Vec<MetricOption>,
}

/// Single controller for region, metric and range selection.
pub struct SessionController {
    catalog: Arc<Catalog>,
    preset: ScalePreset,
    state: SessionState,
    active: Option<ActiveRegion>,
    pending: Option<LoadTicket>,
    generation: u64,
    stats: Option<MetricStats>,
    scale: Option<ColorScale>,
}

impl SessionController {
    pub fn new(catalog: Arc<Catalog>, preset: ScalePreset) -> Self {
        Self {
            catalog,
            preset,
            state: SessionState::default(),
            active: None,
            pending: None,
            generation: 0,
            stats: None,
            scale: None,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        if self.pending.is_some() {
            SessionPhase::Loading
        } else if self.active.is_some() {
            SessionPhase::Ready
        } else {
            SessionPhase::Idle
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn preset(&self) -> &ScalePreset {
        &self.preset
    }

    /// Region whose load is in flight, if any.
    pub fn pending_region(&self) -> Option<&str> {
        self.pending.as_ref().map(LoadTicket::region_id)
    }

    pub fn active_collection(&self) -> Option<&FeatureCollection> {
        self.active.as_ref().map(|a| &a.collection)
    }

    /// Fill layer id of the active region.
    pub fn active_layer_id(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.layer_id.as_str())
    }

    pub fn available_metrics(&self) -> &[MetricOption] {
        self.active
            .as_ref()
            .map(|a| a.metrics.as_slice())
            .unwrap_or(&[])
    }

    pub fn stats(&self) -> Option<&MetricStats> {
        self.stats.as_ref()
    }

    pub fn scale(&self) -> Option<&ColorScale> {
        self.scale.as_ref()
    }

    // ─── Shareable Ranges ────────────────────────────────────────

    /// Restore custom ranges from a shared query string.
    pub fn restore_share_query(&mut self, query: &str) {
        self.state.shared_ranges = share::decode_ranges(query);
        tracing::info!(
            ranges = self.state.shared_ranges.len(),
            "Restored shared ranges"
        );
    }

    /// Query string reproducing every effective custom range.
    pub fn share_query(&self) -> String {
        let mut ranges = self.state.shared_ranges.clone();
        ranges.extend(self.state.custom_ranges.iter().map(|(k, v)| (k.clone(), *v)));
        ranges.retain(|key, _| !self.state.unshared.contains(key));
        share::encode_ranges(&ranges)
    }

    // ─── Region Selection ────────────────────────────────────────

    /// Register a region selection and return the ticket for its fetch.
    ///
    /// Any load still in flight is superseded.
    pub fn begin_region_load(&mut self, region_id: &str) -> Result<LoadTicket, SessionError> {
        let region = self
            .catalog
            .region(region_id)
            .ok_or_else(|| SessionError::UnknownRegion(region_id.to_string()))?;

        self.generation += 1;
        let ticket = LoadTicket {
            region_id: region.id.clone(),
            source: region.source.clone(),
            generation: self.generation,
        };

        if let Some(previous) = self.pending.replace(ticket.clone()) {
            tracing::debug!(
                superseded = %previous.region_id,
                region = %ticket.region_id,
                "Superseding in-flight region load"
            );
        }
        tracing::info!(region = %ticket.region_id, source = %ticket.source, "Loading region");
        Ok(ticket)
    }

    /// Apply the fetched geometry for `ticket`.
    ///
    /// Stale tickets are discarded without touching any state. On fetch or
    /// parse failure the previous region (if any) stays in place and the
    /// failure is reported to the UI.
    pub fn complete_region_load(
        &mut self,
        ticket: LoadTicket,
        fetched: Result<String, FetchError>,
        surface: &mut dyn RenderSurface,
        ui: &mut dyn ControlSurface,
    ) -> Result<LoadOutcome, SessionError> {
        if self.pending.as_ref() != Some(&ticket) {
            tracing::debug!(region = %ticket.region_id, "Discarding superseded region load");
            return Ok(LoadOutcome::Superseded);
        }
        self.pending = None;

        let text = match fetched {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(region = %ticket.region_id, error = %e, "Region fetch failed");
                ui.report_failure(&format!("Could not load region {}: {}", ticket.region_id, e));
                return Err(SessionError::Fetch(e));
            }
        };

        let collection = match parse_kml(&text) {
            Ok(collection) => collection,
            Err(e) => {
                tracing::warn!(region = %ticket.region_id, error = %e, "Region geometry rejected");
                ui.report_failure(&format!("Could not read region {}: {}", ticket.region_id, e));
                return Err(SessionError::Malformed(e));
            }
        };

        let region = self
            .catalog
            .region(&ticket.region_id)
            .cloned()
            .ok_or_else(|| SessionError::UnknownRegion(ticket.region_id.clone()))?;

        let metrics = enumerate_metrics(&collection, &self.catalog);

        // Keep the user's metric when the new region has it
        let metric = self
            .state
            .active_metric_key
            .clone()
            .filter(|key| metrics.iter().any(|m| &m.key == key))
            .or_else(|| metrics.first().map(|m| m.key.clone()));

        // The previous region stays until the new one is known to paint
        if let Some(key) = &metric {
            if let Err(e) = self.prepare_metric(&collection, key) {
                tracing::warn!(region = %region.id, metric = %key, error = %e, "Region cannot be painted");
                ui.report_failure(&format!("Could not paint region {}: {}", region.id, e));
                return Err(e);
            }
        }

        self.install_region(&region, collection, metrics, surface)?;

        if let Some(selector) = ui.metric_selector() {
            selector.set_options(self.available_metrics());
        }

        let shown = match metric {
            Some(key) => self.show_metric(&key, surface, ui)?,
            None => {
                self.state.active_metric_key = None;
                self.clear_metric(ui);
                if let Some(selector) = ui.metric_selector() {
                    selector.set_selected(None);
                }
                MetricDisplay::NoMetrics
            }
        };

        tracing::info!(region = %region.id, outcome = ?shown, "Region ready");
        Ok(LoadOutcome::Applied(shown))
    }

    /// Select a region and load it through `loader`.
    pub async fn select_region<L: SourceLoader>(
        &mut self,
        region_id: &str,
        loader: &L,
        surface: &mut dyn RenderSurface,
        ui: &mut dyn ControlSurface,
    ) -> Result<LoadOutcome, SessionError> {
        let ticket = self.begin_region_load(region_id)?;
        let fetched = loader.load_text(ticket.source()).await;
        self.complete_region_load(ticket, fetched, surface, ui)
    }

    fn install_region(
        &mut self,
        region: &Region,
        collection: FeatureCollection,
        metrics: Vec<MetricOption>,
        surface: &mut dyn RenderSurface,
    ) -> Result<(), SessionError> {
        if let Some(previous) = self.active.take() {
            if surface.has_layer(&previous.layer_id) {
                surface.remove_layer(&previous.layer_id)?;
            }
            if surface.has_source(&previous.source_id) {
                surface.remove_source(&previous.source_id)?;
            }
        }
        self.stats = None;
        self.scale = None;

        let source_id = format!("region-{}", region.id);
        let layer_id = format!("{}-fill", source_id);

        surface.add_source(&source_id, collection.to_geojson())?;

        let mut paint = Map::new();
        paint.insert("fill-color".to_string(), no_data_rule());
        paint.insert("fill-opacity".to_string(), json!(1));
        paint.insert("fill-outline-color".to_string(), json!("rgba(0, 0, 0, 0)"));
        surface.add_layer(LayerSpec {
            id: layer_id.clone(),
            source: source_id.clone(),
            kind: LayerKind::Fill,
            paint,
            filter: None,
        })?;

        if let Some(camera) = camera_for(region, &collection) {
            surface.set_camera(camera);
        }

        tracing::info!(
            region = %region.id,
            features = collection.len(),
            metrics = metrics.len(),
            "Region layer installed"
        );

        self.state.active_region_id = Some(region.id.clone());
        self.active = Some(ActiveRegion {
            id: region.id.clone(),
            collection,
            source_id,
            layer_id,
            metrics,
        });
        Ok(())
    }

    // ─── Metric Selection ────────────────────────────────────────

    /// Switch the displayed metric within the active region.
    pub fn select_metric(
        &mut self,
        key: &str,
        surface: &mut dyn RenderSurface,
        ui: &mut dyn ControlSurface,
    ) -> Result<MetricDisplay, SessionError> {
        let active = self.active.as_ref().ok_or(SessionError::NotReady)?;
        if !active.metrics.iter().any(|m| m.key == key) {
            return Err(SessionError::UnknownMetric(key.to_string()));
        }
        self.show_metric(key, surface, ui)
    }

    /// Apply a user-entered range to the active metric.
    ///
    /// A range with `max <= min` is rejected and the current scale stays.
    pub fn apply_custom_range(
        &mut self,
        min: f64,
        max: f64,
        surface: &mut dyn RenderSurface,
        ui: &mut dyn ControlSurface,
    ) -> Result<MetricDisplay, SessionError> {
        if self.active.is_none() {
            return Err(SessionError::NotReady);
        }
        let key = self
            .state
            .active_metric_key
            .clone()
            .ok_or(SessionError::NoActiveMetric)?;

        // Validates the range before anything is stored
        self.preset.build(min, max)?;

        let default = self.stats.as_ref().map(|stats| {
            default_range(self.catalog.metric(&key), stats)
        });

        // A range equal to the region's default is kept but not shared
        if default == Some((min, max)) {
            self.state.unshared.insert(key.clone());
        } else {
            self.state.unshared.remove(&key);
        }
        self.state.custom_ranges.insert(key.clone(), (min, max));
        tracing::info!(metric = %key, min, max, "Applied custom range");

        self.show_metric(&key, surface, ui)
    }

    /// Range used for `key`: custom override, then shared override, then
    /// the default derived from `stats`.
    pub fn resolve_range(&self, key: &str, stats: &MetricStats) -> Range {
        self.state
            .custom_ranges
            .get(key)
            .or_else(|| self.state.shared_ranges.get(key))
            .copied()
            .unwrap_or_else(|| default_range(self.catalog.metric(key), stats))
    }

    /// Stats, range and scale for `key` over `collection`, or `None` when the
    /// metric has no numeric data. Nothing is changed.
    fn prepare_metric(
        &self,
        collection: &FeatureCollection,
        key: &str,
    ) -> Result<Option<(MetricStats, ColorScale)>, SessionError> {
        let Some(stats) = compute_stats(collection, key) else {
            return Ok(None);
        };
        let (min, max) = self.resolve_range(key, &stats);
        let scale = self.preset.build(min, max)?;
        Ok(Some((stats, scale)))
    }

    fn show_metric(
        &mut self,
        key: &str,
        surface: &mut dyn RenderSurface,
        ui: &mut dyn ControlSurface,
    ) -> Result<MetricDisplay, SessionError> {
        let active = self.active.as_ref().ok_or(SessionError::NotReady)?;
        let layer_id = active.layer_id.clone();
        let prepared = self.prepare_metric(&active.collection, key)?;

        self.state.active_metric_key = Some(key.to_string());
        if let Some(selector) = ui.metric_selector() {
            selector.set_selected(Some(key));
        }

        let Some((stats, scale)) = prepared else {
            tracing::info!(metric = key, "Metric has no numeric data");
            surface.set_paint_property(&layer_id, "fill-color", no_data_rule())?;
            self.clear_metric(ui);
            return Ok(MetricDisplay::NoData {
                metric: key.to_string(),
            });
        };
        let (min, max) = (scale.min(), scale.max());

        surface.set_paint_property(&layer_id, "fill-color", scale.fill_color_rule(key))?;

        if let Some(inputs) = ui.range_inputs() {
            inputs.set_range(min, max);
        }
        if let Some(panel) = ui.stats_panel() {
            panel.show_stats(&stats, stats.median_position(min, max));
        }
        if let Some(legend) = ui.legend() {
            legend.show_scale(&scale);
        }

        tracing::debug!(
            metric = key,
            min,
            max,
            median = stats.median,
            count = stats.count,
            "Painted metric"
        );

        self.stats = Some(stats);
        self.scale = Some(scale);
        Ok(MetricDisplay::Painted {
            metric: key.to_string(),
            min,
            max,
        })
    }

    fn clear_metric(&mut self, ui: &mut dyn ControlSurface) {
        self.stats = None;
        self.scale = None;
        if let Some(panel) = ui.stats_panel() {
            panel.clear_stats();
        }
        if let Some(legend) = ui.legend() {
            legend.clear_scale();
        }
    }

    /// Id of the active region, if one is shown.
    pub fn active_region_id(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.id.as_str())
    }
}

/// Default range for a metric given its statistics.
///
/// The registry may pin the lower bound and choose between the data maximum
/// and a fixed upper bound. A degenerate result falls back to the data range,
/// and single-value data gets a one-unit-wide range.
pub fn default_range(definition: Option<&MetricDefinition>, stats: &MetricStats) -> Range {
    let preferred = match definition {
        Some(def) => (
            def.default_min.unwrap_or(stats.min),
            if def.use_max_as_default {
                stats.max
            } else {
                def.default_max.unwrap_or(100.0)
            },
        ),
        None => (stats.min, stats.max),
    };

    if preferred.1 > preferred.0 {
        preferred
    } else if stats.max > stats.min {
        (stats.min, stats.max)
    } else {
        (stats.min, stats.min + 1.0)
    }
}

/// Metrics offered for a collection.
///
/// With a registry, only registered keys present in the data are offered,
/// in registry order. Without one, every numeric key is offered in
/// first-encountered order.
pub fn enumerate_metrics(collection: &FeatureCollection, catalog: &Catalog) -> Vec<MetricOption> {
    let keys = collection.numeric_keys();

    if catalog.metrics.is_empty() {
        return keys
            .into_iter()
            .map(|key| MetricOption {
                label: key.clone(),
                key,
            })
            .collect();
    }

    let mut known: Vec<&MetricDefinition> = catalog
        .metrics
        .iter()
        .filter(|def| keys.contains(&def.key))
        .collect();
    known.sort_by_key(|def| def.order);

    known
        .into_iter()
        .map(|def| MetricOption {
            key: def.key.clone(),
            label: def.display_name.clone(),
        })
        .collect()
}

fn camera_for(region: &Region, collection: &FeatureCollection) -> Option<Camera> {
    if let (Some(center), Some(zoom)) = (region.center, region.zoom) {
        return Some(Camera::FlyTo { center, zoom });
    }
    collection
        .padded_bounds(FIT_BOUNDS_PADDING)
        .map(|rect| Camera::FitBounds {
            southwest: [rect.min().x, rect.min().y],
            northeast: [rect.max().x, rect.max().y],
        })
}

/// Errors from session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Unknown region: {0}")]
    UnknownRegion(String),

    #[error("Metric not available in this region: {0}")]
    UnknownMetric(String),

    #[error("No region is loaded")]
    NotReady,

    #[error("No metric is selected")]
    NoActiveMetric,

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Malformed(#[from] KmlError),

    #[error(transparent)]
    Scale(#[from] ScaleError),

    #[error("Rendering failed: {0}")]
    Render(#[from] RenderError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(min: f64, max: f64) -> MetricStats {
        MetricStats {
            min,
            max,
            mean: (min + max) / 2.0,
            median: (min + max) / 2.0,
            count: 2,
        }
    }

    fn def(default_min: Option<f64>, default_max: Option<f64>, use_max: bool) -> MetricDefinition {
        MetricDefinition {
            key: "m".to_string(),
            display_name: "M".to_string(),
            order: 0,
            default_min,
            default_max,
            use_max_as_default: use_max,
        }
    }

    #[test]
    fn test_default_range_from_stats() {
        assert_eq!(default_range(None, &stats(3.0, 9.0)), (3.0, 9.0));
    }

    #[test]
    fn test_default_range_registry_bounds() {
        let d = def(Some(0.0), None, true);
        assert_eq!(default_range(Some(&d), &stats(3.0, 9.0)), (0.0, 9.0));

        let d = def(None, Some(50.0), false);
        assert_eq!(default_range(Some(&d), &stats(3.0, 9.0)), (3.0, 50.0));

        let d = def(None, None, false);
        assert_eq!(default_range(Some(&d), &stats(3.0, 9.0)), (3.0, 100.0));
    }

    #[test]
    fn test_default_range_fallbacks() {
        // Registry minimum above the data maximum
        let d = def(Some(50000.0), None, true);
        assert_eq!(default_range(Some(&d), &stats(100.0, 40000.0)), (100.0, 40000.0));

        // Single-value data
        assert_eq!(default_range(None, &stats(7.0, 7.0)), (7.0, 8.0));
    }
}
