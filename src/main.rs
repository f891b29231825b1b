// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! City-Metrics viewer host
//!
//! Serves a single local choropleth session: the browser map mirrors the
//! scene and control panel kept here and posts selections back.

use city_metrics::{
    config::Config,
    models::catalog::Catalog,
    services::{PointsOverlay, SessionController},
    AppState, Viewer,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting City-Metrics viewer");

    // Load regions, metric registry and color presets
    tracing::info!(path = %config.catalog_path.display(), "Loading catalog");
    let catalog =
        Arc::new(Catalog::load_from_file(&config.catalog_path).expect("Failed to load catalog"));
    tracing::info!(
        regions = catalog.regions.len(),
        metrics = catalog.metrics.len(),
        "Catalog loaded"
    );

    let preset = catalog
        .preset(config.color_preset.as_deref())
        .expect("Unknown color preset")
        .clone();

    let mut session = SessionController::new(catalog.clone(), preset);
    if let Some(query) = &config.share_query {
        session.restore_share_query(query);
    }

    let loader = config.loader();
    let mut viewer = Viewer::new(session);

    // Schools overlay is optional; a failure leaves the map usable
    if let Some(schools) = &catalog.schools {
        let mut overlay = PointsOverlay::new(&schools.attribute, schools.default_threshold);
        match overlay
            .load_from(&loader, &schools.source, &mut viewer.scene)
            .await
        {
            Ok(count) => tracing::info!(points = count, "Schools overlay loaded"),
            Err(e) => tracing::warn!(error = %e, "Failed to load schools overlay"),
        }
        viewer.schools = Some(overlay);
    }

    // Show the first region in display order
    if let Some(region) = catalog.regions_by_name().first() {
        let Viewer {
            session,
            scene,
            panel,
            ..
        } = &mut viewer;
        if let Err(e) = session.select_region(&region.id, &loader, scene, panel).await {
            tracing::warn!(region = %region.id, error = %e, "Failed to load initial region");
        }
    }

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        catalog,
        loader,
        viewer: Mutex::new(viewer),
    });

    // Build router
    let app = city_metrics::routes::create_router(state);

    // Start server
    let addr = format!("{}:{}", config.bind_addr, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("city_metrics=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
