//! Shared types for the streetwalk route-solving core.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::extract::RequiredPointPolicy;
use crate::tour::TourStrategy;

/// A geographic position in WGS84 degrees.
///
/// Field order is `(lat, lon)`. Drawn input arrives as `[lon, lat]`
/// pairs (GeoJSON order); convert those with [`GeoPoint::from_lon_lat`]
/// exactly once at the parsing boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees (north positive).
    pub lat: f64,
    /// Longitude in degrees (east positive).
    pub lon: f64,
}

impl GeoPoint {
    /// Create a new point from latitude and longitude.
    #[must_use]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Create a point from a GeoJSON-ordered `[lon, lat]` pair.
    #[must_use]
    pub const fn from_lon_lat(pair: [f64; 2]) -> Self {
        Self {
            lat: pair[1],
            lon: pair[0],
        }
    }

    /// Position as an `[x, y]` = `[lon, lat]` array for planar indexing.
    #[must_use]
    pub const fn to_xy(self) -> [f64; 2] {
        [self.lon, self.lat]
    }

    /// Returns `true` if both components are finite.
    #[must_use]
    pub const fn is_finite(self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }
}

/// Identifier of a road network node (OSM-style 64-bit id).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Geometry tag of a drawn record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeometryKind {
    /// An open polyline. The only kind the solver looks at.
    LineString,
    /// A single marker.
    Point,
    /// A closed area.
    Polygon,
    /// Any other tag, kept verbatim for diagnostics.
    Other(String),
}

impl From<&str> for GeometryKind {
    fn from(tag: &str) -> Self {
        match tag {
            "LineString" => Self::LineString,
            "Point" => Self::Point,
            "Polygon" => Self::Polygon,
            other => Self::Other(other.to_owned()),
        }
    }
}

/// One record produced by the drawing surface.
///
/// Coordinates are stored already converted to [`GeoPoint`]; records
/// whose coordinate shape does not match a polyline carry an empty list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawnGeometry {
    /// Geometry type tag.
    pub kind: GeometryKind,
    /// Ordered vertices.
    pub coordinates: Vec<GeoPoint>,
}

impl DrawnGeometry {
    /// Build a `LineString` record from `[lon, lat]` pairs.
    #[must_use]
    pub fn line_string(lon_lat: &[[f64; 2]]) -> Self {
        Self {
            kind: GeometryKind::LineString,
            coordinates: lon_lat.iter().copied().map(GeoPoint::from_lon_lat).collect(),
        }
    }

    /// Returns the record as a marked segment when it is a polyline with
    /// at least two vertices.
    #[must_use]
    pub fn as_marked_segment(&self) -> Option<&[GeoPoint]> {
        (self.kind == GeometryKind::LineString && self.coordinates.len() >= 2)
            .then_some(self.coordinates.as_slice())
    }
}

/// Set of network nodes the tour must visit.
///
/// Backed by a `BTreeSet` so duplicates are impossible and iteration is
/// ordered by node id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredNodes(BTreeSet<NodeId>);

impl RequiredNodes {
    /// Create an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// Insert a node. Returns `false` if it was already present.
    pub fn insert(&mut self, node: NodeId) -> bool {
        self.0.insert(node)
    }

    /// Number of distinct required nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no node is required.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns `true` if `node` is required.
    #[must_use]
    pub fn contains(&self, node: NodeId) -> bool {
        self.0.contains(&node)
    }

    /// Iterate in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.0.iter().copied()
    }

    /// Ordered copy of the members.
    #[must_use]
    pub fn to_vec(&self) -> Vec<NodeId> {
        self.iter().collect()
    }
}

impl FromIterator<NodeId> for RequiredNodes {
    fn from_iter<I: IntoIterator<Item = NodeId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A closed walk over required nodes: `[v0, v1, ..., v(n-1), v0]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tour(Vec<NodeId>);

impl Tour {
    /// Close an open visiting order by appending its first node.
    ///
    /// Returns `None` for an empty order.
    #[must_use]
    pub fn close(mut order: Vec<NodeId>) -> Option<Self> {
        let first = *order.first()?;
        order.push(first);
        Some(Self(order))
    }

    /// All nodes including the repeated start at the end.
    #[must_use]
    pub fn nodes(&self) -> &[NodeId] {
        &self.0
    }

    /// Number of distinct stops (the closing repeat is not counted).
    #[must_use]
    pub fn stop_count(&self) -> usize {
        self.0.len().saturating_sub(1)
    }

    /// Consecutive `(from, to)` legs, including the closing leg.
    pub fn legs(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.0.windows(2).map(|w| (w[0], w[1]))
    }
}

/// Full-resolution coordinate path of a tour through the network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpandedRoute {
    /// One entry per traversed node, in `(lat, lon)` order. Nodes where
    /// two legs meet appear twice.
    pub points: Vec<GeoPoint>,
    /// Sum of the shortest-path lengths of all legs, in metres.
    pub total_length: f64,
}

/// Everything a successful solve produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveResult {
    /// Nodes snapped from the drawn segments.
    pub required: RequiredNodes,
    /// Visiting order over `required`.
    pub tour: Tour,
    /// Network path tracing the tour.
    pub route: ExpandedRoute,
}

/// Configuration for a solve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolveConfig {
    /// Tour construction heuristic.
    pub tour_strategy: TourStrategy,

    /// Run a 2-opt pass over the constructed tour. Never lengthens it.
    pub two_opt: bool,

    /// Largest odd-vertex count for which Christofides uses an exact
    /// minimum-weight matching. Above this, greedy pairing is used and
    /// the 1.5x bound no longer holds.
    pub exact_matching_limit: usize,

    /// Which vertices of a drawn line become required nodes.
    pub required_points: RequiredPointPolicy,
}

impl SolveConfig {
    /// Default tour strategy.
    pub const DEFAULT_TOUR_STRATEGY: TourStrategy = TourStrategy::Christofides;
    /// Default for the 2-opt pass.
    pub const DEFAULT_TWO_OPT: bool = true;
    /// Default exact matching limit (2^18 subset states).
    pub const DEFAULT_EXACT_MATCHING_LIMIT: usize = 18;
    /// Default required-point policy.
    pub const DEFAULT_REQUIRED_POINTS: RequiredPointPolicy = RequiredPointPolicy::Endpoints;
}

impl Default for SolveConfig {
    fn default() -> Self {
        Self {
            tour_strategy: Self::DEFAULT_TOUR_STRATEGY,
            two_opt: Self::DEFAULT_TWO_OPT,
            exact_matching_limit: Self::DEFAULT_EXACT_MATCHING_LIMIT,
            required_points: Self::DEFAULT_REQUIRED_POINTS,
        }
    }
}

/// Errors that can occur while solving a route.
#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize, Deserialize)]
pub enum SolveError {
    /// Fewer than two distinct nodes were marked.
    #[error("not enough marked points to compute a route (found {found} distinct node(s), need 2)")]
    InsufficientInput {
        /// Number of distinct nodes that were resolved.
        found: usize,
    },

    /// Two required nodes lie in different network components.
    #[error("no path between marked points {from} and {to}")]
    UnreachablePair {
        /// First node of the pair.
        from: NodeId,
        /// Second node of the pair.
        to: NodeId,
    },

    /// The road network is empty or malformed.
    #[error("degenerate road network: {0}")]
    DegenerateNetwork(String),

    /// A node id that is not part of the network was referenced.
    #[error("node {0} is not part of the road network")]
    UnknownNode(NodeId),

    /// The auxiliary tour graph could not be spanned.
    #[error("tour graph over marked points is disconnected")]
    DisconnectedTourGraph,

    /// The drawn-feature input could not be parsed.
    #[error("invalid drawing input: {0}")]
    InvalidDrawing(String),
}
