// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes driving the single viewer session.

use crate::error::{AppError, Result};
use crate::models::catalog::Region;
use crate::models::stats::MetricStats;
use crate::render::SceneSurface;
use crate::services::color_scale::Breakpoint;
use crate::services::loader::SourceLoader;
use crate::services::session::{LoadOutcome, MetricDisplay, SessionPhase, SessionState};
use crate::ui::{MetricOption, PanelState};
use crate::{AppState, Viewer};
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/regions", get(get_regions))
        .route("/api/session", get(get_session))
        .route("/api/scene", get(get_scene))
        .route("/api/session/region", post(select_region))
        .route("/api/session/metric", post(select_metric))
        .route("/api/session/range", post(apply_range))
        .route("/api/schools/threshold", post(set_schools_threshold))
        .route("/api/share", get(get_share))
}

// ─── Regions ─────────────────────────────────────────────────

/// Regions in display-name order.
async fn get_regions(State(state): State<Arc<AppState>>) -> Json<Vec<Region>> {
    Json(state.catalog.regions_by_name().into_iter().cloned().collect())
}

// ─── Session Snapshot ────────────────────────────────────────

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SchoolsSummary {
    pub attribute: String,
    pub threshold: f64,
    pub points: usize,
    pub visible: usize,
}

#[derive(Debug, Serialize)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    #[serde(flatten)]
    pub state: SessionState,
    pub pending_region: Option<String>,
    pub metrics: Vec<MetricOption>,
    pub stats: Option<MetricStats>,
    pub scale: Vec<Breakpoint>,
    pub panel: PanelState,
    pub share_query: String,
    pub schools: Option<SchoolsSummary>,
}

fn snapshot(viewer: &Viewer) -> SessionSnapshot {
    let session = &viewer.session;
    SessionSnapshot {
        phase: session.phase(),
        state: session.state().clone(),
        pending_region: session.pending_region().map(str::to_string),
        metrics: session.available_metrics().to_vec(),
        stats: session.stats().copied(),
        scale: session
            .scale()
            .map(|s| s.breakpoints().to_vec())
            .unwrap_or_default(),
        panel: viewer.panel.clone(),
        share_query: session.share_query(),
        schools: viewer.schools.as_ref().map(|overlay| SchoolsSummary {
            attribute: overlay.attribute().to_string(),
            threshold: overlay.threshold(),
            points: overlay.point_count(),
            visible: overlay.visible_count(),
        }),
    }
}

async fn get_session(State(state): State<Arc<AppState>>) -> Json<SessionSnapshot> {
    let viewer = state.viewer.lock().await;
    Json(snapshot(&viewer))
}

/// Current map scene: sources, layers and camera.
async fn get_scene(State(state): State<Arc<AppState>>) -> Json<SceneSurface> {
    let viewer = state.viewer.lock().await;
    Json(viewer.scene.clone())
}

// ─── Selection ───────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegionRequest {
    pub region_id: String,
}

#[derive(Debug, Serialize)]
pub struct SelectionResponse {
    /// A newer selection replaced this one before it finished loading
    pub superseded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<MetricDisplay>,
}

/// Select a region.
///
/// The fetch runs without holding the viewer lock, so a later selection
/// can supersede this one while it is in flight.
async fn select_region(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegionRequest>,
) -> Result<Json<SelectionResponse>> {
    let ticket = {
        let mut viewer = state.viewer.lock().await;
        viewer.session.begin_region_load(&req.region_id)?
    };

    let fetched = state.loader.load_text(ticket.source()).await;

    let mut viewer = state.viewer.lock().await;
    let Viewer {
        session,
        scene,
        panel,
        ..
    } = &mut *viewer;
    let outcome = session.complete_region_load(ticket, fetched, scene, panel)?;

    Ok(Json(match outcome {
        LoadOutcome::Applied(display) => SelectionResponse {
            superseded: false,
            display: Some(display),
        },
        LoadOutcome::Superseded => SelectionResponse {
            superseded: true,
            display: None,
        },
    }))
}

#[derive(Debug, Deserialize)]
pub struct MetricRequest {
    pub metric: String,
}

async fn select_metric(
    State(state): State<Arc<AppState>>,
    Json(req): Json<MetricRequest>,
) -> Result<Json<MetricDisplay>> {
    let mut viewer = state.viewer.lock().await;
    let Viewer {
        session,
        scene,
        panel,
        ..
    } = &mut *viewer;
    Ok(Json(session.select_metric(&req.metric, scene, panel)?))
}

#[derive(Debug, Deserialize)]
pub struct RangeRequest {
    pub min: f64,
    pub max: f64,
}

async fn apply_range(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RangeRequest>,
) -> Result<Json<MetricDisplay>> {
    if !req.min.is_finite() || !req.max.is_finite() {
        return Err(AppError::BadRequest("Range bounds must be finite".to_string()));
    }

    let mut viewer = state.viewer.lock().await;
    let Viewer {
        session,
        scene,
        panel,
        ..
    } = &mut *viewer;
    Ok(Json(session.apply_custom_range(req.min, req.max, scene, panel)?))
}

// ─── Schools Overlay ─────────────────────────────────────────

/// Threshold as typed by the user; text that is not a number counts as 0.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ThresholdInput {
    Number(f64),
    Text(String),
}

#[derive(Debug, Deserialize)]
pub struct ThresholdRequest {
    pub threshold: ThresholdInput,
}

async fn set_schools_threshold(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ThresholdRequest>,
) -> Result<Json<SchoolsSummary>> {
    let mut viewer = state.viewer.lock().await;
    let Viewer { schools, scene, .. } = &mut *viewer;
    let overlay = schools
        .as_mut()
        .ok_or_else(|| AppError::NotFound("No point overlay configured".to_string()))?;

    match &req.threshold {
        ThresholdInput::Number(value) => overlay.set_threshold(*value, scene)?,
        ThresholdInput::Text(text) => overlay.set_threshold_input(text, scene)?,
    }

    Ok(Json(SchoolsSummary {
        attribute: overlay.attribute().to_string(),
        threshold: overlay.threshold(),
        points: overlay.point_count(),
        visible: overlay.visible_count(),
    }))
}

// ─── Sharing ─────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ShareResponse {
    /// Query string (without `?`) carrying every custom range
    pub query: String,
}

async fn get_share(State(state): State<Arc<AppState>>) -> Json<ShareResponse> {
    let viewer = state.viewer.lock().await;
    Json(ShareResponse {
        query: viewer.session.share_query(),
    })
}
