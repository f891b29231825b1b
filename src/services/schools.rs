// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Schools point overlay with a numeric threshold filter.

use crate::render::{Expression, LayerKind, LayerSpec, RenderError, RenderSurface};
use crate::services::loader::{FetchError, SourceLoader};
use geojson::{GeoJson, Value};
use serde_json::{json, Map};

pub const SCHOOLS_SOURCE_ID: &str = "schools";
pub const SCHOOLS_LAYER_ID: &str = "schools-layer";

/// Point overlay controller.
///
/// The point collection is loaded once; changing the threshold only
/// re-applies the layer filter.
#[derive(Debug, Clone)]
pub struct PointsOverlay {
    attribute: String,
    threshold: f64,
    /// Numeric attribute value per loaded point
    values: Option<Vec<Option<f64>>>,
}

impl PointsOverlay {
    pub fn new(attribute: &str, threshold: f64) -> Self {
        Self {
            attribute: attribute.to_string(),
            threshold: sanitize(threshold),
            values: None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.values.is_some()
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    pub fn point_count(&self) -> usize {
        self.values.as_ref().map_or(0, Vec::len)
    }

    /// Number of loaded points passing the current filter.
    pub fn visible_count(&self) -> usize {
        self.values.as_ref().map_or(0, |values| {
            values
                .iter()
                .filter(|v| v.is_some_and(|v| v >= self.threshold))
                .count()
        })
    }

    /// `attribute >= threshold` filter for the points layer.
    pub fn filter_expression(&self) -> Expression {
        json!([
            "all",
            ["has", self.attribute],
            [">=", ["get", self.attribute], self.threshold]
        ])
    }

    /// Parse a GeoJSON point collection and add it to the surface.
    ///
    /// Returns the number of points kept.
    pub fn load(&mut self, text: &str, surface: &mut dyn RenderSurface) -> Result<usize, OverlayError> {
        if self.is_loaded() {
            return Err(OverlayError::AlreadyLoaded);
        }

        let geojson: GeoJson = text
            .parse()
            .map_err(|e: geojson::Error| OverlayError::ParseError(e.to_string()))?;
        let GeoJson::FeatureCollection(collection) = geojson else {
            return Err(OverlayError::NotFeatureCollection);
        };

        let total = collection.features.len();
        let points: Vec<geojson::Feature> = collection
            .features
            .into_iter()
            .filter(|f| matches!(f.geometry.as_ref().map(|g| &g.value), Some(Value::Point(_))))
            .collect();

        if points.len() < total {
            tracing::warn!(
                dropped = total - points.len(),
                "Ignoring non-point features in overlay"
            );
        }

        let values: Vec<Option<f64>> = points
            .iter()
            .map(|f| f.property(&self.attribute).and_then(|v| v.as_f64()))
            .collect();

        surface.add_source(
            SCHOOLS_SOURCE_ID,
            geojson::FeatureCollection {
                bbox: None,
                features: points,
                foreign_members: None,
            },
        )?;
        surface.add_layer(LayerSpec {
            id: SCHOOLS_LAYER_ID.to_string(),
            source: SCHOOLS_SOURCE_ID.to_string(),
            kind: LayerKind::Circle,
            paint: point_paint(),
            filter: Some(self.filter_expression()),
        })?;

        let count = values.len();
        self.values = Some(values);
        tracing::info!(
            points = count,
            visible = self.visible_count(),
            threshold = self.threshold,
            "Loaded point overlay"
        );
        Ok(count)
    }

    /// Fetch the point collection through `loader` and add it.
    pub async fn load_from<L: SourceLoader>(
        &mut self,
        loader: &L,
        path: &str,
        surface: &mut dyn RenderSurface,
    ) -> Result<usize, OverlayError> {
        let text = loader.load_text(path).await?;
        self.load(&text, surface)
    }

    /// Change the threshold and re-apply the filter.
    pub fn set_threshold(
        &mut self,
        value: f64,
        surface: &mut dyn RenderSurface,
    ) -> Result<(), OverlayError> {
        self.threshold = sanitize(value);
        if self.is_loaded() {
            surface.set_filter(SCHOOLS_LAYER_ID, self.filter_expression())?;
        }
        tracing::info!(
            threshold = self.threshold,
            visible = self.visible_count(),
            "Updated point threshold"
        );
        Ok(())
    }

    /// Threshold from raw input text; anything unparseable counts as 0.
    pub fn set_threshold_input(
        &mut self,
        input: &str,
        surface: &mut dyn RenderSurface,
    ) -> Result<(), OverlayError> {
        let value = input.trim().parse::<f64>().unwrap_or(0.0);
        self.set_threshold(value, surface)
    }
}

fn sanitize(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Fixed point styling.
fn point_paint() -> Map<String, serde_json::Value> {
    let mut paint = Map::new();
    paint.insert("circle-radius".to_string(), json!(6));
    paint.insert("circle-color".to_string(), json!("#ff0000"));
    paint.insert("circle-stroke-width".to_string(), json!(2));
    paint.insert("circle-stroke-color".to_string(), json!("#000000"));
    paint
}

/// Errors from the point overlay.
#[derive(Debug, thiserror::Error)]
pub enum OverlayError {
    #[error("Point overlay is already loaded")]
    AlreadyLoaded,

    #[error("Failed to parse GeoJSON: {0}")]
    ParseError(String),

    #[error("Expected a GeoJSON FeatureCollection")]
    NotFeatureCollection,

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Rendering failed: {0}")]
    Render(#[from] RenderError),
}
