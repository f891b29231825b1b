// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! UI control surface.
//!
//! A front end may expose any subset of the controls. The controllers ask
//! for each capability and skip it when it is absent.

use crate::models::stats::MetricStats;
use crate::services::color_scale::{Breakpoint, ColorScale};
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Entry in the metric selector.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MetricOption {
    pub key: String,
    pub label: String,
}

pub trait MetricSelector {
    fn set_options(&mut self, options: &[MetricOption]);
    fn set_selected(&mut self, key: Option<&str>);
}

pub trait RangeInputs {
    fn set_range(&mut self, min: f64, max: f64);
}

pub trait StatsPanel {
    fn show_stats(&mut self, stats: &MetricStats, median_position: f64);
    fn clear_stats(&mut self);
}

pub trait Legend {
    fn show_scale(&mut self, scale: &ColorScale);
    fn clear_scale(&mut self);
}

/// Capability-checked access to the front end's controls.
pub trait ControlSurface {
    fn metric_selector(&mut self) -> Option<&mut dyn MetricSelector> {
        None
    }

    fn range_inputs(&mut self) -> Option<&mut dyn RangeInputs> {
        None
    }

    fn stats_panel(&mut self) -> Option<&mut dyn StatsPanel> {
        None
    }

    fn legend(&mut self) -> Option<&mut dyn Legend> {
        None
    }

    /// Surface a load failure to the user.
    fn report_failure(&mut self, _message: &str) {}
}

/// A front end with no controls at all.
#[derive(Debug, Default, Clone, Copy)]
pub struct Headless;

impl ControlSurface for Headless {}

/// Full control panel state, mirrored to the browser by the viewer host.
#[derive(Debug, Default, Clone, Serialize)]
pub struct PanelState {
    pub metric_options: Vec<MetricOption>,
    pub selected_metric: Option<String>,
    pub range: Option<(f64, f64)>,
    pub stats: Option<MetricStats>,
    pub median_position: Option<f64>,
    pub legend: Vec<Breakpoint>,
    pub last_failure: Option<String>,
}

impl MetricSelector for PanelState {
    fn set_options(&mut self, options: &[MetricOption]) {
        self.metric_options = options.to_vec();
    }

    fn set_selected(&mut self, key: Option<&str>) {
        self.selected_metric = key.map(str::to_string);
    }
}

impl RangeInputs for PanelState {
    fn set_range(&mut self, min: f64, max: f64) {
        self.range = Some((min, max));
    }
}

impl StatsPanel for PanelState {
    fn show_stats(&mut self, stats: &MetricStats, median_position: f64) {
        self.stats = Some(*stats);
        self.median_position = Some(median_position);
    }

    fn clear_stats(&mut self) {
        self.stats = None;
        self.median_position = None;
    }
}

impl Legend for PanelState {
    fn show_scale(&mut self, scale: &ColorScale) {
        self.legend = scale.breakpoints().to_vec();
    }

    fn clear_scale(&mut self) {
        self.legend.clear();
    }
}

impl ControlSurface for PanelState {
    fn metric_selector(&mut self) -> Option<&mut dyn MetricSelector> {
        Some(self)
    }

    fn range_inputs(&mut self) -> Option<&mut dyn RangeInputs> {
        Some(self)
    }

    fn stats_panel(&mut self) -> Option<&mut dyn StatsPanel> {
        Some(self)
    }

    fn legend(&mut self) -> Option<&mut dyn Legend> {
        Some(self)
    }

    fn report_failure(&mut self, message: &str) {
        self.last_failure = Some(message.to_string());
    }
}
