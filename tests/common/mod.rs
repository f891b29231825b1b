// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use city_metrics::config::Config;
use city_metrics::models::catalog::Catalog;
use city_metrics::routes::create_router;
use city_metrics::services::{PointsOverlay, SessionController};
use city_metrics::{AppState, Viewer};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Directory holding the test catalog, KML files and points file.
#[allow(dead_code)]
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Read a fixture file as text.
#[allow(dead_code)]
pub fn fixture(name: &str) -> String {
    std::fs::read_to_string(fixtures_dir().join(name))
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", name, e))
}

#[allow(dead_code)]
pub fn test_catalog() -> Arc<Catalog> {
    Arc::new(
        Catalog::load_from_file(fixtures_dir().join("catalog.json"))
            .expect("Test catalog should load"),
    )
}

/// Session over the test catalog using the named preset (default if `None`).
#[allow(dead_code)]
pub fn test_session(preset: Option<&str>) -> SessionController {
    let catalog = test_catalog();
    let preset = catalog
        .preset(preset)
        .expect("Preset should exist")
        .clone();
    SessionController::new(catalog, preset)
}

#[allow(dead_code)]
pub fn test_config() -> Config {
    Config {
        data_dir: fixtures_dir(),
        catalog_path: fixtures_dir().join("catalog.json"),
        ..Config::default()
    }
}

/// Create a test app with no region loaded and the schools overlay in place.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let config = test_config();
    let catalog = test_catalog();
    let preset = catalog.preset(None).expect("Default preset").clone();

    let mut viewer = Viewer::new(SessionController::new(catalog.clone(), preset));
    let mut overlay = PointsOverlay::new("tuition", 30000.0);
    overlay
        .load(&fixture("schools.geojson"), &mut viewer.scene)
        .expect("Schools fixture should load");
    viewer.schools = Some(overlay);

    let state = Arc::new(AppState {
        loader: config.loader(),
        config,
        catalog,
        viewer: Mutex::new(viewer),
    });

    (create_router(state.clone()), state)
}
