// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - parsing, statistics, scales and controllers.

pub mod color_scale;
pub mod kml;
pub mod loader;
pub mod schools;
pub mod session;
pub mod share;
pub mod statistics;

pub use color_scale::{build_scale, ColorScale, ScalePreset};
pub use kml::parse_kml;
pub use loader::{FsLoader, HttpLoader, Loader, SourceLoader};
pub use schools::PointsOverlay;
pub use session::SessionController;
pub use statistics::compute_stats;
