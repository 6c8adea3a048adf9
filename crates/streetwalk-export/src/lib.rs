//! streetwalk-export: Pure format serializers (sans-IO)
//!
//! Converts solved routes into shareable formats: a GPX track, a
//! map-service directions link, and an SVG preview.

pub mod gpx;
pub mod link;
pub mod svg;

pub use gpx::{GpxMetadata, to_gpx};
pub use link::{MAPS_DIR_BASE, maps_link};
pub use svg::{SvgMetadata, to_svg};

/// Escape the five XML special characters for safe embedding in element
/// text content and attribute values.
pub(crate) fn xml_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xml_escape_all_specials() {
        assert_eq!(xml_escape(r#"<a & "b" 'c'>"#), "&lt;a &amp; &quot;b&quot; &apos;c&apos;&gt;");
        assert_eq!(xml_escape("plain"), "plain");
    }
}
