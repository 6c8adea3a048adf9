//! GPX 1.1 track serializer.
//!
//! The route becomes a single `<trk>` with a single `<trkseg>`; every
//! route point is one `<trkpt>`. Coordinates are written with seven
//! decimal places (about one centimetre).

use std::fmt::Write;

use streetwalk_core::ExpandedRoute;

use crate::xml_escape;

/// Metadata to embed in the GPX document. Both fields are optional.
#[derive(Debug, Clone, Default)]
pub struct GpxMetadata<'a> {
    /// Track name, emitted as `<name>` in both `<metadata>` and `<trk>`.
    pub name: Option<&'a str>,

    /// Free-form description, emitted as `<desc>` in `<metadata>`.
    pub description: Option<&'a str>,
}

/// Serialize a route into a GPX 1.1 document string.
///
/// # Examples
///
/// ```
/// use streetwalk_core::{ExpandedRoute, GeoPoint};
/// use streetwalk_export::{GpxMetadata, to_gpx};
///
/// let route = ExpandedRoute {
///     points: vec![GeoPoint::new(49.481, 8.446), GeoPoint::new(49.482, 8.447)],
///     total_length: 133.0,
/// };
/// let gpx = to_gpx(&route, &GpxMetadata::default());
/// assert!(gpx.contains(r#"<trkpt lat="49.4810000" lon="8.4460000"/>"#));
/// ```
#[must_use]
pub fn to_gpx(route: &ExpandedRoute, metadata: &GpxMetadata<'_>) -> String {
    let mut out = String::new();

    let _ = writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    let _ = writeln!(
        out,
        r#"<gpx version="1.1" creator="streetwalk" xmlns="http://www.topografix.com/GPX/1/1">"#
    );

    if metadata.name.is_some() || metadata.description.is_some() {
        let _ = writeln!(out, "  <metadata>");
        if let Some(name) = metadata.name {
            let _ = writeln!(out, "    <name>{}</name>", xml_escape(name));
        }
        if let Some(description) = metadata.description {
            let _ = writeln!(out, "    <desc>{}</desc>", xml_escape(description));
        }
        let _ = writeln!(out, "  </metadata>");
    }

    let _ = writeln!(out, "  <trk>");
    if let Some(name) = metadata.name {
        let _ = writeln!(out, "    <name>{}</name>", xml_escape(name));
    }
    let _ = writeln!(out, "    <trkseg>");
    for p in &route.points {
        let _ = writeln!(out, r#"      <trkpt lat="{:.7}" lon="{:.7}"/>"#, p.lat, p.lon);
    }
    let _ = writeln!(out, "    </trkseg>");
    let _ = writeln!(out, "  </trk>");
    let _ = writeln!(out, "</gpx>");

    out
}
