//! Parsing of drawn-feature records from the map drawing surface.
//!
//! The drawing surface exports GeoJSON features, either as a bare array
//! or wrapped in a `FeatureCollection`:
//!
//! ```json
//! [{ "type": "Feature", "properties": {},
//!    "geometry": { "type": "LineString",
//!                  "coordinates": [[8.446, 49.481], [8.447, 49.482]] } }]
//! ```
//!
//! Decoding is done by the [`geojson`] crate. Coordinates are
//! `[lon, lat]` (optionally followed by an altitude, which is dropped).
//! Only `LineString` coordinates are kept; other geometry kinds are
//! recorded with an empty coordinate list so callers can still see that
//! they were present.

use geojson::{Feature, GeoJson, Geometry};

use crate::types::{DrawnGeometry, GeoPoint, GeometryKind, SolveError};

/// Parse drawn features from JSON text.
///
/// Features with a `null` geometry are skipped. A lone `Feature` or
/// `Geometry` object is accepted as a one-element collection.
///
/// # Errors
///
/// Returns [`SolveError::InvalidDrawing`] if the text is not JSON, is
/// not valid GeoJSON, or contains a `LineString` position with fewer
/// than two numbers.
pub fn parse_drawings(json: &str) -> Result<Vec<DrawnGeometry>, SolveError> {
    let value: serde_json::Value = serde_json::from_str(json)
        .map_err(|e| SolveError::InvalidDrawing(format!("not valid JSON: {e}")))?;

    let geometries: Vec<Option<Geometry>> = match value {
        serde_json::Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| {
                Feature::try_from(item)
                    .map(|f| f.geometry)
                    .map_err(|e| SolveError::InvalidDrawing(format!("feature {i}: {e}")))
            })
            .collect::<Result<_, _>>()?,
        other => match GeoJson::from_json_value(other)
            .map_err(|e| SolveError::InvalidDrawing(e.to_string()))?
        {
            GeoJson::FeatureCollection(fc) => fc.features.into_iter().map(|f| f.geometry).collect(),
            GeoJson::Feature(f) => vec![f.geometry],
            GeoJson::Geometry(g) => vec![Some(g)],
        },
    };

    let features = geometries.len();
    let drawings = geometries
        .into_iter()
        .enumerate()
        .filter_map(|(i, g)| g.map(|g| (i, g)))
        .map(|(i, g)| {
            drawn_geometry(g.value)
                .map_err(|msg| SolveError::InvalidDrawing(format!("feature {i}: {msg}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    tracing::debug!(
        features,
        geometries = drawings.len(),
        "parsed drawn features"
    );
    Ok(drawings)
}

/// Convert one decoded geometry, reading `LineString` positions as
/// `[lon, lat, ..]`.
fn drawn_geometry(value: geojson::Value) -> Result<DrawnGeometry, String> {
    let kind = match value {
        geojson::Value::LineString(positions) => {
            let coordinates = positions
                .iter()
                .enumerate()
                .map(|(j, position)| match position.as_slice() {
                    [lon, lat, ..] => Ok(GeoPoint::from_lon_lat([*lon, *lat])),
                    _ => Err(format!("position {j} is not a [lon, lat] pair")),
                })
                .collect::<Result<_, _>>()?;
            return Ok(DrawnGeometry {
                kind: GeometryKind::LineString,
                coordinates,
            });
        }
        geojson::Value::Point(_) => GeometryKind::Point,
        geojson::Value::Polygon(_) => GeometryKind::Polygon,
        geojson::Value::MultiPoint(_) => GeometryKind::from("MultiPoint"),
        geojson::Value::MultiLineString(_) => GeometryKind::from("MultiLineString"),
        geojson::Value::MultiPolygon(_) => GeometryKind::from("MultiPolygon"),
        geojson::Value::GeometryCollection(_) => GeometryKind::from("GeometryCollection"),
    };
    Ok(DrawnGeometry {
        kind,
        coordinates: Vec::new(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_feature_array() {
        let json = r#"[
            {"type": "Feature", "properties": {},
             "geometry": {"type": "LineString",
                          "coordinates": [[8.446, 49.481], [8.447, 49.482]]}}
        ]"#;
        let drawings = parse_drawings(json).unwrap();
        assert_eq!(drawings.len(), 1);
        assert_eq!(drawings[0].kind, GeometryKind::LineString);
        assert_eq!(
            drawings[0].coordinates,
            vec![GeoPoint::new(49.481, 8.446), GeoPoint::new(49.482, 8.447)]
        );
    }

    #[test]
    fn parses_feature_collection() {
        let json = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {},
             "geometry": {"type": "LineString", "coordinates": [[1, 2], [3, 4, 100]]}}
        ]}"#;
        let drawings = parse_drawings(json).unwrap();
        assert_eq!(drawings.len(), 1);
        assert_eq!(drawings[0].coordinates[1], GeoPoint::new(4.0, 3.0));
    }

    #[test]
    fn accepts_a_single_feature() {
        let json = r#"{"type": "Feature", "properties": {},
            "geometry": {"type": "LineString", "coordinates": [[1, 2], [3, 4]]}}"#;
        let drawings = parse_drawings(json).unwrap();
        assert_eq!(drawings.len(), 1);
        assert_eq!(drawings[0].coordinates[0], GeoPoint::new(2.0, 1.0));
    }

    #[test]
    fn keeps_other_kinds_without_coordinates() {
        let json = r#"[
            {"type": "Feature", "properties": {},
             "geometry": {"type": "Point", "coordinates": [8.0, 49.0]}},
            {"type": "Feature", "properties": {},
             "geometry": {"type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]]]}},
            {"type": "Feature", "properties": {},
             "geometry": {"type": "MultiPoint", "coordinates": [[0, 0], [1, 1]]}}
        ]"#;
        let drawings = parse_drawings(json).unwrap();
        assert_eq!(drawings.len(), 3);
        assert_eq!(drawings[0].kind, GeometryKind::Point);
        assert_eq!(drawings[1].kind, GeometryKind::Polygon);
        assert_eq!(drawings[2].kind, GeometryKind::Other("MultiPoint".into()));
        assert!(drawings.iter().all(|d| d.coordinates.is_empty()));
    }

    #[test]
    fn skips_features_without_geometry() {
        let json = r#"[{"type": "Feature", "properties": {}, "geometry": null}]"#;
        assert!(parse_drawings(json).unwrap().is_empty());
    }

    #[test]
    fn rejects_malformed_line_coordinates() {
        let json = r#"[{"type": "Feature", "properties": {},
            "geometry": {"type": "LineString", "coordinates": [[8.0], [8.1, 49.1]]}}]"#;
        assert!(matches!(
            parse_drawings(json),
            Err(SolveError::InvalidDrawing(_))
        ));
    }

    #[test]
    fn rejects_non_geojson_input() {
        assert!(matches!(
            parse_drawings("42"),
            Err(SolveError::InvalidDrawing(_))
        ));
        assert!(matches!(
            parse_drawings(r#"[{"geometry": {"type": "LineString", "coordinates": []}}]"#),
            Err(SolveError::InvalidDrawing(_))
        ));
        assert!(matches!(
            parse_drawings("not json"),
            Err(SolveError::InvalidDrawing(_))
        ));
    }
}
