// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Polygon and point feature model shared by the parser, the statistics
//! engine and the rendering surface.

use geo::{BoundingRect, Coord, LineString, Polygon, Rect};
use geojson::{Geometry, JsonObject, JsonValue, Value};
use indexmap::IndexMap;

/// A single `(longitude, latitude)` pair in degrees.
pub type Position = [f64; 2];

/// An ordered ring of positions. The first ring of a feature is the outer
/// boundary, any following rings are holes.
pub type Ring = Vec<Position>;

/// Scalar attribute attached to a feature.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Number(f64),
    Text(String),
}

impl AttributeValue {
    /// Coerce trimmed text into a number when it parses to a finite value,
    /// otherwise keep the original text.
    pub fn from_text(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() => AttributeValue::Number(n),
            _ => AttributeValue::Text(raw.to_string()),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttributeValue::Number(n) => Some(*n),
            AttributeValue::Text(_) => None,
        }
    }

    fn to_json(&self) -> JsonValue {
        match self {
            AttributeValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            AttributeValue::Text(s) => JsonValue::String(s.clone()),
        }
    }
}

/// One polygon region with its attribute map.
///
/// A feature with no rings is kept in its collection but is not renderable.
/// Attributes keep document order; a repeated key keeps its first position
/// and takes the last value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Feature {
    pub rings: Vec<Ring>,
    pub attributes: IndexMap<String, AttributeValue>,
}

impl Feature {
    pub fn is_renderable(&self) -> bool {
        !self.rings.is_empty()
    }

    pub fn attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }

    /// Numeric value under `key`, if present and numeric.
    pub fn number(&self, key: &str) -> Option<f64> {
        self.attribute(key).and_then(AttributeValue::as_number)
    }

    fn to_polygon(&self) -> Option<Polygon<f64>> {
        let mut rings = self.rings.iter().map(|ring| {
            LineString::from(
                ring.iter()
                    .map(|[x, y]| Coord { x: *x, y: *y })
                    .collect::<Vec<_>>(),
            )
        });
        let exterior = rings.next()?;
        Some(Polygon::new(exterior, rings.collect()))
    }

    fn to_geojson(&self) -> geojson::Feature {
        let rings: Vec<Vec<Vec<f64>>> = self
            .rings
            .iter()
            .map(|ring| ring.iter().map(|p| p.to_vec()).collect())
            .collect();

        let properties: JsonObject = self
            .attributes
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();

        // Empty-ring features carry their attributes but draw nothing
        let geometry = (!rings.is_empty()).then(|| Geometry::new(Value::Polygon(rings)));

        geojson::Feature {
            bbox: None,
            geometry,
            id: None,
            properties: Some(properties),
            foreign_members: None,
        }
    }
}

/// Immutable, ordered collection of polygon features for one region.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureCollection {
    features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self { features }
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Attribute keys that carry a numeric value on at least one feature,
    /// in first-encountered order.
    pub fn numeric_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = Vec::new();
        for feature in &self.features {
            for (key, value) in &feature.attributes {
                if value.as_number().is_some() && !keys.iter().any(|k| k == key) {
                    keys.push(key.clone());
                }
            }
        }
        keys
    }

    /// Bounding box of every renderable feature.
    pub fn bounds(&self) -> Option<Rect<f64>> {
        self.features
            .iter()
            .filter_map(Feature::to_polygon)
            .filter_map(|p| p.bounding_rect())
            .reduce(|a, b| {
                Rect::new(
                    Coord {
                        x: a.min().x.min(b.min().x),
                        y: a.min().y.min(b.min().y),
                    },
                    Coord {
                        x: a.max().x.max(b.max().x),
                        y: a.max().y.max(b.max().y),
                    },
                )
            })
    }

    /// Bounding box grown by `fraction` of its width/height on every side.
    pub fn padded_bounds(&self, fraction: f64) -> Option<Rect<f64>> {
        let rect = self.bounds()?;
        let pad_x = rect.width() * fraction;
        let pad_y = rect.height() * fraction;
        Some(Rect::new(
            Coord {
                x: rect.min().x - pad_x,
                y: rect.min().y - pad_y,
            },
            Coord {
                x: rect.max().x + pad_x,
                y: rect.max().y + pad_y,
            },
        ))
    }

    /// Standard GeoJSON encoding handed to the rendering surface.
    pub fn to_geojson(&self) -> geojson::FeatureCollection {
        geojson::FeatureCollection {
            bbox: None,
            features: self.features.iter().map(Feature::to_geojson).collect(),
            foreign_members: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x: f64, y: f64, size: f64) -> Ring {
        vec![
            [x, y],
            [x + size, y],
            [x + size, y + size],
            [x, y + size],
            [x, y],
        ]
    }

    fn feature(rings: Vec<Ring>, attrs: &[(&str, AttributeValue)]) -> Feature {
        Feature {
            rings,
            attributes: attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        }
    }

    #[test]
    fn test_attribute_coercion() {
        assert_eq!(
            AttributeValue::from_text(" 42.5 "),
            AttributeValue::Number(42.5)
        );
        assert_eq!(
            AttributeValue::from_text("Downtown"),
            AttributeValue::Text("Downtown".to_string())
        );
        // Non-finite values stay as text
        assert_eq!(
            AttributeValue::from_text("NaN"),
            AttributeValue::Text("NaN".to_string())
        );
        assert_eq!(
            AttributeValue::from_text(""),
            AttributeValue::Text(String::new())
        );
    }

    #[test]
    fn test_numeric_keys_first_encountered() {
        let fc = FeatureCollection::new(vec![
            feature(
                vec![],
                &[
                    ("name", AttributeValue::Text("a".into())),
                    ("b", AttributeValue::Number(1.0)),
                ],
            ),
            feature(vec![], &[("a", AttributeValue::Number(2.0))]),
        ]);
        assert_eq!(fc.numeric_keys(), vec!["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn test_padded_bounds() {
        let fc = FeatureCollection::new(vec![
            feature(vec![square(0.0, 0.0, 1.0)], &[]),
            feature(vec![square(9.0, 4.0, 1.0)], &[]),
            feature(vec![], &[]),
        ]);

        let rect = fc.padded_bounds(0.1).expect("bounds");
        assert!((rect.min().x - -1.0).abs() < 1e-9);
        assert!((rect.max().x - 11.0).abs() < 1e-9);
        assert!((rect.min().y - -0.5).abs() < 1e-9);
        assert!((rect.max().y - 5.5).abs() < 1e-9);
    }

    #[test]
    fn test_numeric_keys_keep_insertion_order() {
        let fc = FeatureCollection::new(vec![
            feature(
                vec![],
                &[
                    ("Zeta", AttributeValue::Number(1.0)),
                    ("label", AttributeValue::Text("x".to_string())),
                    ("Alpha", AttributeValue::Number(2.0)),
                ],
            ),
            feature(
                vec![],
                &[
                    ("Mid", AttributeValue::Number(3.0)),
                    ("Zeta", AttributeValue::Number(4.0)),
                ],
            ),
        ]);
        assert_eq!(fc.numeric_keys(), vec!["Zeta", "Alpha", "Mid"]);
    }

    #[test]
    fn test_bounds_none_without_geometry() {
        let fc = FeatureCollection::new(vec![feature(vec![], &[])]);
        assert!(fc.bounds().is_none());
    }

    #[test]
    fn test_geojson_encoding_keeps_empty_features() {
        let fc = FeatureCollection::new(vec![
            feature(
                vec![square(0.0, 0.0, 1.0)],
                &[("Households", AttributeValue::Number(12.0))],
            ),
            feature(vec![], &[]),
        ]);

        let encoded = fc.to_geojson();
        assert_eq!(encoded.features.len(), 2);
        assert_eq!(
            encoded.features[0].property("Households"),
            Some(&serde_json::json!(12.0))
        );
        assert!(encoded.features[1].geometry.is_none());
    }
}
