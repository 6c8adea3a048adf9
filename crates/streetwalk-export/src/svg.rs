//! SVG route preview.
//!
//! Renders the expanded route as a single `<path>` and the drawn
//! coordinates as circle markers, using an equirectangular projection
//! centred on the mean latitude of everything drawn. North is up.
//!
//! Document construction, XML escaping, and path data formatting are
//! done by the [`svg`] crate. This is a pure function with no I/O.

use svg::Document;
use svg::node::element::path::Data;
use svg::node::element::{Circle, Description, Group, Path, Title};
use svg::node::Text;

use streetwalk_core::{ExpandedRoute, GeoPoint};

/// Length of the longer preview side in pixels.
const PREVIEW_SIZE: f64 = 800.0;
/// Blank border around the drawing in pixels.
const MARGIN: f64 = 20.0;
/// Marker circle radius in pixels.
const MARKER_RADIUS: f64 = 5.0;

/// Metadata to embed in the SVG document.
///
/// When present, `<title>` and `<desc>` elements are emitted right
/// after the opening `<svg>` tag. Text is XML-escaped by the `svg` crate.
#[derive(Debug, Clone, Default)]
pub struct SvgMetadata<'a> {
    /// Document title.
    pub title: Option<&'a str>,
    /// Document description, e.g. the solve configuration.
    pub description: Option<&'a str>,
}

/// Maps geographic positions onto preview pixels.
struct Projection {
    cos_lat: f64,
    min_x: f64,
    max_y: f64,
    scale: f64,
    width: f64,
    height: f64,
}

impl Projection {
    fn fit(points: &[GeoPoint]) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let mean_lat = if points.is_empty() {
            0.0
        } else {
            points.iter().map(|p| p.lat).sum::<f64>() / points.len() as f64
        };
        let cos_lat = mean_lat.to_radians().cos();

        let xs = points.iter().map(|p| p.lon * cos_lat);
        let min_x = xs.clone().fold(f64::INFINITY, f64::min);
        let max_x = xs.fold(f64::NEG_INFINITY, f64::max);
        let min_y = points.iter().map(|p| p.lat).fold(f64::INFINITY, f64::min);
        let max_y = points.iter().map(|p| p.lat).fold(f64::NEG_INFINITY, f64::max);

        let (span_x, span_y) = if points.is_empty() {
            (0.0, 0.0)
        } else {
            (max_x - min_x, max_y - min_y)
        };
        let span = span_x.max(span_y);
        let scale = if span > 0.0 {
            (PREVIEW_SIZE - 2.0 * MARGIN) / span
        } else {
            1.0
        };

        Self {
            cos_lat,
            min_x: if points.is_empty() { 0.0 } else { min_x },
            max_y: if points.is_empty() { 0.0 } else { max_y },
            scale,
            width: span_x.mul_add(scale, 2.0 * MARGIN),
            height: span_y.mul_add(scale, 2.0 * MARGIN),
        }
    }

    fn project(&self, p: GeoPoint) -> (f64, f64) {
        (
            (p.lon * self.cos_lat - self.min_x).mul_add(self.scale, MARGIN),
            (self.max_y - p.lat).mul_add(self.scale, MARGIN),
        )
    }
}

/// Serialize a route preview into an SVG document string.
///
/// The route polyline is drawn when it has at least two points; one
/// circle is drawn per entry of `marked`.
///
/// # Examples
///
/// ```
/// use streetwalk_core::{ExpandedRoute, GeoPoint};
/// use streetwalk_export::{SvgMetadata, to_svg};
///
/// let route = ExpandedRoute {
///     points: vec![GeoPoint::new(49.481, 8.446), GeoPoint::new(49.482, 8.447)],
///     total_length: 133.0,
/// };
/// let metadata = SvgMetadata {
///     title: Some("Quadrate"),
///     ..SvgMetadata::default()
/// };
/// let svg = to_svg(&route, &route.points, &metadata);
/// assert!(svg.contains("<title>Quadrate</title>"));
/// assert!(svg.contains("<path"));
/// ```
#[must_use]
pub fn to_svg(route: &ExpandedRoute, marked: &[GeoPoint], metadata: &SvgMetadata<'_>) -> String {
    let all: Vec<GeoPoint> = route.points.iter().chain(marked).copied().collect();
    let projection = Projection::fit(&all);

    let mut doc = Document::new()
        .set("width", format!("{:.0}", projection.width))
        .set("height", format!("{:.0}", projection.height))
        .set(
            "viewBox",
            format!("0 0 {:.3} {:.3}", projection.width, projection.height),
        );

    if let Some(title) = metadata.title {
        doc = doc.add(Title::new(title));
    }
    if let Some(description) = metadata.description {
        doc = doc.add(Description::new().add(Text::new(description)));
    }

    if let [first, rest @ ..] = route.points.as_slice()
        && !rest.is_empty()
    {
        let mut data = Data::new().move_to(projection.project(*first));
        for &p in rest {
            data = data.line_to(projection.project(p));
        }
        let path = Path::new()
            .set("d", data)
            .set("fill", "none")
            .set("stroke", "#d32f2f")
            .set("stroke-width", 3)
            .set("stroke-linejoin", "round");
        doc = doc.add(path);
    }

    if !marked.is_empty() {
        let mut markers = Group::new().set("id", "marked").set("fill", "#1565c0");
        for &p in marked {
            let (cx, cy) = projection.project(p);
            markers = markers.add(
                Circle::new()
                    .set("cx", cx)
                    .set("cy", cy)
                    .set("r", MARKER_RADIUS),
            );
        }
        doc = doc.add(markers);
    }

    // The svg crate omits the XML declaration, so we prepend it.
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{doc}\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route() -> ExpandedRoute {
        ExpandedRoute {
            points: vec![
                GeoPoint::new(0.0, 0.0),
                GeoPoint::new(0.0, 1.0),
                GeoPoint::new(1.0, 1.0),
                GeoPoint::new(0.0, 0.0),
            ],
            total_length: 3.0,
        }
    }

    #[test]
    fn route_and_markers_rendered() {
        let marked = [GeoPoint::new(0.0, 0.0), GeoPoint::new(1.0, 1.0)];
        let svg = to_svg(&route(), &marked, &SvgMetadata::default());
        assert!(svg.starts_with("<?xml"));
        assert_eq!(svg.matches("<path").count(), 1);
        assert_eq!(svg.matches("<circle").count(), 2);
        assert!(svg.contains("</svg>"));
    }

    #[test]
    fn metadata_is_escaped() {
        let metadata = SvgMetadata {
            title: Some("A & B"),
            description: Some("<config>"),
        };
        let svg = to_svg(&route(), &[], &metadata);
        assert!(svg.contains("<title>A &amp; B</title>"));
        assert!(svg.contains("&lt;config&gt;"));
        assert!(!svg.contains("<circle"));
    }

    #[test]
    fn projection_keeps_north_up_and_inside_margin() {
        let points = [GeoPoint::new(0.0, 0.0), GeoPoint::new(1.0, 1.0)];
        let projection = Projection::fit(&points);
        let (x0, y0) = projection.project(points[0]);
        let (x1, y1) = projection.project(points[1]);
        assert!(x1 > x0);
        assert!(y1 < y0, "north should be up");
        for v in [x0, y0, x1, y1] {
            assert!(v >= MARGIN - 1e-9);
            assert!(v <= PREVIEW_SIZE - MARGIN + 1e-9);
        }
    }

    #[test]
    fn single_point_does_not_divide_by_zero() {
        let lonely = ExpandedRoute {
            points: vec![GeoPoint::new(49.0, 8.0)],
            total_length: 0.0,
        };
        let svg = to_svg(&lonely, &lonely.points, &SvgMetadata::default());
        assert!(!svg.contains("<path"));
        assert!(!svg.contains("NaN"));
        assert_eq!(svg.matches("<circle").count(), 1);
    }
}
