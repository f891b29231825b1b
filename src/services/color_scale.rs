// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Color scale builder for choropleth fills.
//!
//! A scale is an ordered list of `(value, color)` breakpoints with strictly
//! increasing values. Two gradient styles are supported:
//!
//! - `even`: palette colors spread evenly across `[min, max]`
//! - `fade_in`: a transparent stop at `min`, then the palette spread across
//!   the last 80% of the span
//!
//! The same scale is emitted as a fill-color paint expression for the
//! rendering surface and can be evaluated locally with [`ColorScale::color_at`].

use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use std::fmt;
use std::str::FromStr;

/// Share of the span reserved for the transparent fade in the `fade_in` style.
const FADE_FRACTION: f64 = 0.2;

/// RGBA color with 8-bit channels and a fractional alpha.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Color {
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0.0);

    pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
        Self { r, g, b, a }
    }

    pub fn is_transparent(&self) -> bool {
        self.a == 0.0
    }

    /// Parse a CSS color: `rgba(r, g, b, a)`, `rgb(r, g, b)`, `#rrggbb` or
    /// `#rrggbbaa`.
    pub fn parse(s: &str) -> Result<Self, ColorParseError> {
        let s = s.trim();
        let err = || ColorParseError(s.to_string());

        if let Some(hex) = s.strip_prefix('#') {
            if !hex.is_ascii() || (hex.len() != 6 && hex.len() != 8) {
                return Err(err());
            }
            let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| err());
            let a = if hex.len() == 8 {
                f64::from(channel(6)?) / 255.0
            } else {
                1.0
            };
            return Ok(Color::rgba(channel(0)?, channel(2)?, channel(4)?, a));
        }

        let (args, has_alpha) = if let Some(rest) = s.strip_prefix("rgba(") {
            (rest.strip_suffix(')').ok_or_else(err)?, true)
        } else if let Some(rest) = s.strip_prefix("rgb(") {
            (rest.strip_suffix(')').ok_or_else(err)?, false)
        } else {
            return Err(err());
        };

        let parts: Vec<&str> = args.split(',').map(str::trim).collect();
        if parts.len() != if has_alpha { 4 } else { 3 } {
            return Err(err());
        }

        let channel = |p: &str| p.parse::<u8>().map_err(|_| err());
        let a = if has_alpha {
            let a = parts[3].parse::<f64>().map_err(|_| err())?;
            if !(0.0..=1.0).contains(&a) {
                return Err(err());
            }
            a
        } else {
            1.0
        };

        Ok(Color::rgba(
            channel(parts[0])?,
            channel(parts[1])?,
            channel(parts[2])?,
            a,
        ))
    }

    /// Linear interpolation in RGBA space, `t` in `[0, 1]`.
    pub fn lerp(&self, other: &Color, t: f64) -> Color {
        let mix = |a: u8, b: u8| {
            (f64::from(a) + (f64::from(b) - f64::from(a)) * t)
                .round()
                .clamp(0.0, 255.0) as u8
        };
        Color {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: self.a + (other.a - self.a) * t,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Color::parse(s)
    }
}

impl TryFrom<String> for Color {
    type Error = ColorParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Color::parse(&s)
    }
}

impl From<Color> for String {
    fn from(c: Color) -> Self {
        c.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Invalid color: {0}")]
pub struct ColorParseError(pub String);

/// How palette colors are laid out over the value span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradientStyle {
    #[default]
    Even,
    FadeIn,
}

/// Rendering of values strictly below the scale minimum.
///
/// `Transparent` hides regions below the minimum, `Clamp` floors them into
/// the first color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BelowMinPolicy {
    #[default]
    Transparent,
    Clamp,
}

/// A named palette plus layout settings, as configured in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalePreset {
    #[serde(default)]
    pub style: GradientStyle,
    pub colors: Vec<Color>,
    #[serde(default)]
    pub below_min: BelowMinPolicy,
}

impl ScalePreset {
    pub fn build(&self, min: f64, max: f64) -> Result<ColorScale, ScaleError> {
        let mut scale = build_scale_with(self.style, min, max, &self.colors)?;
        scale.below_min = self.below_min;
        Ok(scale)
    }
}

/// One anchor of the piecewise-linear interpolation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Breakpoint {
    pub value: f64,
    pub color: Color,
}

/// Ordered breakpoints with strictly increasing values.
///
/// Only [`build_scale`] constructs one, so the ordering always holds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorScale {
    breakpoints: Vec<Breakpoint>,
    below_min: BelowMinPolicy,
}

impl ColorScale {
    pub fn breakpoints(&self) -> &[Breakpoint] {
        &self.breakpoints
    }

    pub fn below_min(&self) -> BelowMinPolicy {
        self.below_min
    }

    pub fn min(&self) -> f64 {
        self.breakpoints[0].value
    }

    pub fn max(&self) -> f64 {
        self.breakpoints[self.breakpoints.len() - 1].value
    }

    /// Color a feature with `value` would be filled with.
    pub fn color_at(&self, value: f64) -> Color {
        let first = &self.breakpoints[0];
        let last = &self.breakpoints[self.breakpoints.len() - 1];

        if value < first.value {
            return match self.below_min {
                BelowMinPolicy::Transparent => Color::TRANSPARENT,
                BelowMinPolicy::Clamp => first.color,
            };
        }
        if value >= last.value {
            return last.color;
        }

        for pair in self.breakpoints.windows(2) {
            let (lo, hi) = (&pair[0], &pair[1]);
            if value < hi.value {
                let t = (value - lo.value) / (hi.value - lo.value);
                return lo.color.lerp(&hi.color, t);
            }
        }
        last.color
    }

    /// Fill-color paint expression over `attribute`.
    ///
    /// Features without the attribute are transparent.
    pub fn fill_color_rule(&self, attribute: &str) -> JsonValue {
        let transparent = Color::TRANSPARENT.to_string();

        let mut interpolate = vec![json!("interpolate"), json!(["linear"]), json!(["get", attribute])];
        for bp in &self.breakpoints {
            interpolate.push(json!(bp.value));
            interpolate.push(json!(bp.color.to_string()));
        }

        let mut rule = vec![
            json!("case"),
            json!(["!", ["has", attribute]]),
            json!(transparent),
        ];
        if self.below_min == BelowMinPolicy::Transparent {
            rule.push(json!(["<", ["get", attribute], self.min()]));
            rule.push(json!(transparent));
        }
        rule.push(JsonValue::Array(interpolate));

        JsonValue::Array(rule)
    }
}

/// Fill rule used while a metric has no numeric data.
pub fn no_data_rule() -> JsonValue {
    json!(Color::TRANSPARENT.to_string())
}

/// Build an evenly spaced scale over `[min, max]`.
pub fn build_scale(min: f64, max: f64, palette: &[Color]) -> Result<ColorScale, ScaleError> {
    build_scale_with(GradientStyle::Even, min, max, palette)
}

/// Build a scale in the given gradient style.
pub fn build_scale_with(
    style: GradientStyle,
    min: f64,
    max: f64,
    palette: &[Color],
) -> Result<ColorScale, ScaleError> {
    if !min.is_finite() || !max.is_finite() {
        return Err(ScaleError::NonFiniteBound);
    }
    if max <= min {
        return Err(ScaleError::DegenerateRange { min, max });
    }
    if palette.len() < 2 {
        return Err(ScaleError::PaletteTooShort(palette.len()));
    }

    let last = palette.len() - 1;
    let range = max - min;

    let breakpoints: Vec<Breakpoint> = match style {
        GradientStyle::Even => palette
            .iter()
            .enumerate()
            .map(|(i, color)| Breakpoint {
                value: if i == last {
                    max
                } else {
                    min + (i as f64 / last as f64) * range
                },
                color: *color,
            })
            .collect(),
        GradientStyle::FadeIn => {
            let start = min + range * FADE_FRACTION;
            let step = range * (1.0 - FADE_FRACTION) / last as f64;

            std::iter::once(Breakpoint {
                value: min,
                color: Color::TRANSPARENT,
            })
            .chain(palette.iter().enumerate().map(|(i, color)| Breakpoint {
                value: if i == last {
                    max
                } else {
                    start + step * i as f64
                },
                color: *color,
            }))
            .collect()
        }
    };

    // Spans too narrow for the float resolution can collapse neighbours
    if breakpoints.windows(2).any(|w| w[1].value <= w[0].value) {
        return Err(ScaleError::DegenerateRange { min, max });
    }

    Ok(ColorScale {
        breakpoints,
        below_min: BelowMinPolicy::default(),
    })
}

/// Errors from scale construction.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScaleError {
    #[error("Degenerate range: max ({max}) must be greater than min ({min})")]
    DegenerateRange { min: f64, max: f64 },

    #[error("Palette needs at least 2 colors, got {0}")]
    PaletteTooShort(usize),

    #[error("Range bounds must be finite numbers")]
    NonFiniteBound,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn palette3() -> Vec<Color> {
        vec![
            Color::rgba(0, 0, 255, 0.5),
            Color::rgba(0, 255, 0, 0.5),
            Color::rgba(255, 0, 0, 0.5),
        ]
    }

    #[test]
    fn test_even_breakpoints() {
        let scale = build_scale(0.0, 100.0, &palette3()).unwrap();
        let values: Vec<f64> = scale.breakpoints().iter().map(|b| b.value).collect();
        assert_eq!(values, vec![0.0, 50.0, 100.0]);

        let colors: Vec<Color> = scale.breakpoints().iter().map(|b| b.color).collect();
        assert_eq!(colors, palette3());
    }

    #[test]
    fn test_degenerate_range_rejected() {
        assert_eq!(
            build_scale(10.0, 10.0, &palette3()),
            Err(ScaleError::DegenerateRange {
                min: 10.0,
                max: 10.0
            })
        );
        assert!(matches!(
            build_scale(20.0, 10.0, &palette3()),
            Err(ScaleError::DegenerateRange { .. })
        ));
    }

    #[test]
    fn test_short_palette_and_non_finite() {
        assert_eq!(
            build_scale(0.0, 1.0, &palette3()[..1]),
            Err(ScaleError::PaletteTooShort(1))
        );
        assert_eq!(
            build_scale(f64::NAN, 1.0, &palette3()),
            Err(ScaleError::NonFiniteBound)
        );
    }

    #[test]
    fn test_collapsed_spacing_rejected() {
        // Representable span, but too narrow to hold 3 distinct stops
        let min = 1e16;
        let max = min + 2.0;
        let palette: Vec<Color> = (0..7).map(|i| Color::rgba(i, 0, 0, 1.0)).collect();
        assert!(matches!(
            build_scale(min, max, &palette),
            Err(ScaleError::DegenerateRange { .. })
        ));
    }

    #[test]
    fn test_fade_in_layout() {
        let palette: Vec<Color> = (0..6).map(|i| Color::rgba(i * 10, 0, 0, 0.6)).collect();
        let scale = build_scale_with(GradientStyle::FadeIn, 0.0, 100.0, &palette).unwrap();
        let bps = scale.breakpoints();

        assert_eq!(bps.len(), 7);
        assert_eq!(bps[0].value, 0.0);
        assert!(bps[0].color.is_transparent());
        assert_eq!(bps[1].value, 20.0);
        assert_eq!(bps[1].color, palette[0]);
        assert!((bps[2].value - 36.0).abs() < 1e-9);
        assert!((bps[4].value - 68.0).abs() < 1e-9);
        assert_eq!(bps[6].value, 100.0);
        assert_eq!(bps[6].color, palette[5]);
    }

    #[test]
    fn test_below_min_transparent() {
        let scale = build_scale(100.0, 200.0, &palette3()).unwrap();
        assert!(scale.color_at(99.999).is_transparent());
        assert_eq!(scale.color_at(100.0), palette3()[0]);

        let opaque = vec![Color::rgba(255, 255, 255, 1.0), Color::rgba(0, 0, 0, 1.0)];
        let scale = build_scale(0.0, 1.0, &opaque).unwrap();
        assert!(scale.color_at(-5.0).is_transparent());
    }

    #[test]
    fn test_below_min_clamp_preset() {
        let preset = ScalePreset {
            style: GradientStyle::Even,
            colors: palette3(),
            below_min: BelowMinPolicy::Clamp,
        };
        let scale = preset.build(100.0, 200.0).unwrap();
        assert_eq!(scale.color_at(0.0), palette3()[0]);

        let rule = scale.fill_color_rule("Households");
        // No "<" guard arm under the clamp policy
        assert_eq!(rule.as_array().unwrap().len(), 4);
    }

    #[test]
    fn test_color_at_interpolates() {
        let palette = vec![Color::rgba(0, 0, 0, 0.0), Color::rgba(200, 100, 50, 1.0)];
        let scale = build_scale(0.0, 10.0, &palette).unwrap();

        assert_eq!(scale.color_at(5.0), Color::rgba(100, 50, 25, 0.5));
        assert_eq!(scale.color_at(1000.0), palette[1]);
    }

    #[test]
    fn test_fill_color_rule_shape() {
        let scale = build_scale(0.0, 100.0, &palette3()).unwrap();
        let rule = scale.fill_color_rule("Total_Population");

        assert_eq!(
            rule,
            json!([
                "case",
                ["!", ["has", "Total_Population"]],
                "rgba(0, 0, 0, 0)",
                ["<", ["get", "Total_Population"], 0.0],
                "rgba(0, 0, 0, 0)",
                [
                    "interpolate",
                    ["linear"],
                    ["get", "Total_Population"],
                    0.0,
                    "rgba(0, 0, 255, 0.5)",
                    50.0,
                    "rgba(0, 255, 0, 0.5)",
                    100.0,
                    "rgba(255, 0, 0, 0.5)"
                ]
            ])
        );
    }

    #[test]
    fn test_color_parse() {
        assert_eq!(
            Color::parse("rgba(255, 165, 0, 0.5)").unwrap(),
            Color::rgba(255, 165, 0, 0.5)
        );
        assert_eq!(Color::parse("rgb(1,2,3)").unwrap(), Color::rgba(1, 2, 3, 1.0));
        assert_eq!(
            Color::parse("#B42222").unwrap(),
            Color::rgba(0xb4, 0x22, 0x22, 1.0)
        );
        assert_eq!(Color::parse("#00000000").unwrap(), Color::TRANSPARENT);
        assert!(Color::parse("rgba(300, 0, 0, 1)").is_err());
        assert!(Color::parse("rgba(0, 0, 0, 2)").is_err());
        assert!(Color::parse("blue").is_err());
    }

    #[test]
    fn test_color_serde() {
        let c: Color = serde_json::from_str("\"rgba(128, 0, 128, 0.8)\"").unwrap();
        assert_eq!(c, Color::rgba(128, 0, 128, 0.8));
        assert_eq!(
            serde_json::to_string(&c).unwrap(),
            "\"rgba(128, 0, 128, 0.8)\""
        );
    }

    #[test]
    fn test_scale_serializes_ordered_breakpoints() {
        let scale = build_scale(0.0, 100.0, &palette3()).unwrap();
        let json = serde_json::to_value(&scale).unwrap();
        let values: Vec<f64> = json["breakpoints"]
            .as_array()
            .unwrap()
            .iter()
            .map(|b| b["value"].as_f64().unwrap())
            .collect();
        assert_eq!(values, vec![0.0, 50.0, 100.0]);
        assert!(values.windows(2).all(|w| w[0] < w[1]));
    }
}
