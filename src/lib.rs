// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! City-Metrics: choropleth views of per-city demographic metrics
//!
//! This crate converts per-city KML grids into polygon feature collections,
//! derives metric statistics and color scales, and drives a map rendering
//! surface. A small local host exposes the session to a browser map.

pub mod config;
pub mod error;
pub mod models;
pub mod render;
pub mod routes;
pub mod services;
pub mod ui;

use config::Config;
use models::catalog::Catalog;
use render::SceneSurface;
use services::loader::Loader;
use services::{PointsOverlay, SessionController};
use std::sync::Arc;
use tokio::sync::Mutex;
use ui::PanelState;

/// The single user's view: session, overlay, map scene and control panel.
pub struct Viewer {
    pub session: SessionController,
    pub schools: Option<PointsOverlay>,
    pub scene: SceneSurface,
    pub panel: PanelState,
}

impl Viewer {
    pub fn new(session: SessionController) -> Self {
        Self {
            session,
            schools: None,
            scene: SceneSurface::new(),
            panel: PanelState::default(),
        }
    }
}

/// Shared application state.
///
/// The viewer lock is only held between suspension points; region fetches
/// run without it.
pub struct AppState {
    pub config: Config,
    pub catalog: Arc<Catalog>,
    pub loader: Loader,
    pub viewer: Mutex<Viewer>,
}
