//! Map-service directions link.

use std::fmt::Write;

use streetwalk_core::GeoPoint;

/// Prefix of a multi-stop directions URL.
pub const MAPS_DIR_BASE: &str = "https://www.google.com/maps/dir/";

/// Build a directions link visiting `points` in order.
///
/// Each waypoint is written as `lat,lon` and percent-encoded; waypoints
/// are separated by a literal `/`.
///
/// # Examples
///
/// ```
/// use streetwalk_core::GeoPoint;
/// use streetwalk_export::maps_link;
///
/// let link = maps_link(&[GeoPoint::new(49.48, 8.44), GeoPoint::new(49.49, 8.45)]);
/// assert_eq!(link, "https://www.google.com/maps/dir/49.48%2C8.44/49.49%2C8.45");
/// ```
#[must_use]
pub fn maps_link(points: &[GeoPoint]) -> String {
    let waypoints: Vec<String> = points
        .iter()
        .map(|p| percent_encode(&format!("{},{}", p.lat, p.lon)))
        .collect();
    format!("{MAPS_DIR_BASE}{}", waypoints.join("/"))
}

/// Percent-encode everything except RFC 3986 unreserved characters.
fn percent_encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~') {
            out.push(char::from(byte));
        } else {
            let _ = write!(out, "%{byte:02X}");
        }
    }
    out
}
