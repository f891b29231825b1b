// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! KML placemark parser.
//!
//! Converts a KML document into a polygon [`FeatureCollection`]. Only a
//! document that is not well-formed XML is an error; malformed coordinate
//! tokens and attribute values are skipped or kept as text.

use crate::models::feature::{AttributeValue, Feature, FeatureCollection, Position, Ring};
use roxmltree::{Document, Node, ParsingOptions};

/// Minimum number of distinct positions for a usable ring.
const MIN_RING_POSITIONS: usize = 3;

/// Parse a KML document into a feature collection.
///
/// Every `Placemark` yields exactly one feature, including placemarks
/// without any valid polygon ring.
pub fn parse_kml(text: &str) -> Result<FeatureCollection, KmlError> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let doc = Document::parse_with_options(text, options)
        .map_err(|e| KmlError::Malformed(e.to_string()))?;

    let mut skipped_points = 0usize;
    let features: Vec<Feature> = doc
        .descendants()
        .filter(|n| is_element(n, "Placemark"))
        .map(|placemark| parse_placemark(placemark, &mut skipped_points))
        .collect();

    let empty = features.iter().filter(|f| !f.is_renderable()).count();
    tracing::info!(
        features = features.len(),
        empty_features = empty,
        skipped_points,
        "Parsed KML document"
    );

    Ok(FeatureCollection::new(features))
}

fn parse_placemark(placemark: Node<'_, '_>, skipped_points: &mut usize) -> Feature {
    let mut feature = Feature::default();

    for polygon in placemark
        .descendants()
        .filter(|n| is_element(n, "Polygon"))
    {
        for coords in polygon
            .descendants()
            .filter(|n| is_element(n, "coordinates"))
        {
            let (ring, skipped) = parse_ring(&text_content(coords));
            *skipped_points += skipped;
            if let Some(ring) = ring {
                feature.rings.push(ring);
            }
        }
    }

    // The placemark's own label goes in first so data elements can override it
    if let Some(name) = placemark
        .children()
        .find(|n| is_element(n, "name") || is_element(n, "n"))
    {
        feature.attributes.insert(
            "name".to_string(),
            AttributeValue::Text(text_content(name).trim().to_string()),
        );
    }

    for node in placemark.descendants().filter(Node::is_element) {
        let Some((key, raw)) = data_entry(node) else {
            continue;
        };
        feature
            .attributes
            .insert(key.to_string(), AttributeValue::from_text(&raw));
    }

    feature
}

/// Extract `(name, text)` from a named data node.
///
/// Accepts the generator's `<data name="k">v</data>` as well as standard
/// KML `<Data name="k"><value>v</value></Data>` and `<SimpleData name="k">`.
fn data_entry<'a>(node: Node<'a, '_>) -> Option<(&'a str, String)> {
    let name = node.attribute("name")?;
    match node.tag_name().name() {
        "data" | "SimpleData" => Some((name, text_content(node))),
        "Data" => {
            let text = node
                .children()
                .find(|n| is_element(n, "value"))
                .map(text_content)
                .unwrap_or_else(|| text_content(node));
            Some((name, text))
        }
        _ => None,
    }
}

/// Parse a whitespace-separated `lon,lat[,alt]` list.
///
/// Returns the ring (if it has enough distinct positions) and the number of
/// tokens that were dropped.
fn parse_ring(text: &str) -> (Option<Ring>, usize) {
    let mut ring: Ring = Vec::new();
    let mut skipped = 0;

    for token in text.split_whitespace() {
        match parse_position(token) {
            Some(p) => ring.push(p),
            None => skipped += 1,
        }
    }

    if distinct_positions(&ring) < MIN_RING_POSITIONS {
        if !ring.is_empty() {
            tracing::debug!(positions = ring.len(), "Dropping degenerate ring");
        }
        return (None, skipped);
    }
    (Some(ring), skipped)
}

fn parse_position(token: &str) -> Option<Position> {
    let mut parts = token.split(',');
    let lon = parts.next()?.trim().parse::<f64>().ok()?;
    let lat = parts.next()?.trim().parse::<f64>().ok()?;
    let _altitude = parts.next();
    if parts.next().is_some() || !lon.is_finite() || !lat.is_finite() {
        return None;
    }
    Some([lon, lat])
}

fn distinct_positions(ring: &[Position]) -> usize {
    let mut seen: Vec<(u64, u64)> = Vec::with_capacity(ring.len());
    for [x, y] in ring {
        let key = (x.to_bits(), y.to_bits());
        if !seen.contains(&key) {
            seen.push(key);
            if seen.len() >= MIN_RING_POSITIONS {
                break;
            }
        }
    }
    seen.len()
}

fn is_element(node: &Node<'_, '_>, name: &str) -> bool {
    node.is_element() && node.tag_name().name() == name
}

/// Concatenated text of all descendant text nodes.
fn text_content(node: Node<'_, '_>) -> String {
    node.descendants()
        .filter(Node::is_text)
        .filter_map(|n| n.text())
        .collect()
}

/// Errors from KML parsing.
#[derive(Debug, thiserror::Error)]
pub enum KmlError {
    #[error("Malformed KML document: {0}")]
    Malformed(String),
}
