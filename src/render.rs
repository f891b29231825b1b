// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Rendering surface contract.
//!
//! The map engine is an external collaborator: it receives GeoJSON sources,
//! layers with paint expressions and filters, and camera moves. It never
//! hands data back. [`SceneSurface`] keeps the resulting scene in memory so
//! a browser adapter (or a test) can mirror it.

use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;

/// Paint or filter expression in map-style JSON form.
pub type Expression = JsonValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    Fill,
    Circle,
}

/// A layer drawing one source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerSpec {
    pub id: String,
    pub source: String,
    pub kind: LayerKind,
    pub paint: Map<String, JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Expression>,
}

/// Camera instruction issued when a region is shown.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Camera {
    FlyTo { center: [f64; 2], zoom: f64 },
    FitBounds { southwest: [f64; 2], northeast: [f64; 2] },
}

/// Operations the session and overlay controllers issue to the map.
pub trait RenderSurface {
    fn add_source(
        &mut self,
        id: &str,
        data: geojson::FeatureCollection,
    ) -> Result<(), RenderError>;

    fn add_layer(&mut self, layer: LayerSpec) -> Result<(), RenderError>;

    fn set_paint_property(
        &mut self,
        layer_id: &str,
        property: &str,
        value: Expression,
    ) -> Result<(), RenderError>;

    fn set_filter(&mut self, layer_id: &str, filter: Expression) -> Result<(), RenderError>;

    fn remove_layer(&mut self, id: &str) -> Result<(), RenderError>;

    fn remove_source(&mut self, id: &str) -> Result<(), RenderError>;

    fn has_layer(&self, id: &str) -> bool;

    fn has_source(&self, id: &str) -> bool;

    /// Move the camera. Surfaces without a camera ignore this.
    fn set_camera(&mut self, _camera: Camera) {}
}

/// In-memory scene graph implementing [`RenderSurface`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct SceneSurface {
    sources: BTreeMap<String, geojson::FeatureCollection>,
    layers: Vec<LayerSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    camera: Option<Camera>,
    /// Bumped on every change so clients can poll cheaply
    revision: u64,
}

impl SceneSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn layers(&self) -> &[LayerSpec] {
        &self.layers
    }

    pub fn layer(&self, id: &str) -> Option<&LayerSpec> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn source(&self, id: &str) -> Option<&geojson::FeatureCollection> {
        self.sources.get(id)
    }

    pub fn camera(&self) -> Option<&Camera> {
        self.camera.as_ref()
    }

    fn layer_mut(&mut self, id: &str) -> Result<&mut LayerSpec, RenderError> {
        self.layers
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or_else(|| RenderError::UnknownLayer(id.to_string()))
    }
}

impl RenderSurface for SceneSurface {
    fn add_source(
        &mut self,
        id: &str,
        data: geojson::FeatureCollection,
    ) -> Result<(), RenderError> {
        if self.sources.contains_key(id) {
            return Err(RenderError::DuplicateSource(id.to_string()));
        }
        self.sources.insert(id.to_string(), data);
        self.revision += 1;
        Ok(())
    }

    fn add_layer(&mut self, layer: LayerSpec) -> Result<(), RenderError> {
        if self.has_layer(&layer.id) {
            return Err(RenderError::DuplicateLayer(layer.id));
        }
        if !self.has_source(&layer.source) {
            return Err(RenderError::UnknownSource(layer.source));
        }
        self.layers.push(layer);
        self.revision += 1;
        Ok(())
    }

    fn set_paint_property(
        &mut self,
        layer_id: &str,
        property: &str,
        value: Expression,
    ) -> Result<(), RenderError> {
        self.layer_mut(layer_id)?
            .paint
            .insert(property.to_string(), value);
        self.revision += 1;
        Ok(())
    }

    fn set_filter(&mut self, layer_id: &str, filter: Expression) -> Result<(), RenderError> {
        self.layer_mut(layer_id)?.filter = Some(filter);
        self.revision += 1;
        Ok(())
    }

    fn remove_layer(&mut self, id: &str) -> Result<(), RenderError> {
        let before = self.layers.len();
        self.layers.retain(|l| l.id != id);
        if self.layers.len() == before {
            return Err(RenderError::UnknownLayer(id.to_string()));
        }
        self.revision += 1;
        Ok(())
    }

    fn remove_source(&mut self, id: &str) -> Result<(), RenderError> {
        if self.layers.iter().any(|l| l.source == id) {
            return Err(RenderError::SourceInUse(id.to_string()));
        }
        self.sources
            .remove(id)
            .ok_or_else(|| RenderError::UnknownSource(id.to_string()))?;
        self.revision += 1;
        Ok(())
    }

    fn has_layer(&self, id: &str) -> bool {
        self.layers.iter().any(|l| l.id == id)
    }

    fn has_source(&self, id: &str) -> bool {
        self.sources.contains_key(id)
    }

    fn set_camera(&mut self, camera: Camera) {
        self.camera = Some(camera);
        self.revision += 1;
    }
}

/// Errors reported by a rendering surface.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RenderError {
    #[error("Source already exists: {0}")]
    DuplicateSource(String),

    #[error("Layer already exists: {0}")]
    DuplicateLayer(String),

    #[error("Unknown source: {0}")]
    UnknownSource(String),

    #[error("Unknown layer: {0}")]
    UnknownLayer(String),

    #[error("Source {0} is still used by a layer")]
    SourceInUse(String),
}
