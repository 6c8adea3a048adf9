//! Road network graph and the spatial-graph capability the solver needs.
//!
//! The solver only talks to the network through [`SpatialGraph`]:
//! nearest-node snapping and shortest-path queries. [`RoadNetwork`] is
//! the production implementation, backed by a petgraph `UnGraph` for
//! routing and an R\*-tree over node positions for snapping. Tests can
//! substitute any small synthetic graph.
//!
//! Nearest-node snapping uses planar distance on raw `[lon, lat]`
//! degrees. That is adequate for snapping a cursor-drawn point to a
//! nearby street node within a single city, where the distortion is
//! uniform across the candidates being compared.

use std::collections::HashMap;

use geo::Haversine;
use geo::line_measures::Distance;
use petgraph::algo::{astar, dijkstra};
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use rstar::RTree;
use rstar::primitives::GeomWithData;
use serde::{Deserialize, Serialize};

use crate::types::{GeoPoint, NodeId, SolveError};

// ---------------------------------------------------------------------------
// Capability trait
// ---------------------------------------------------------------------------

/// A concrete path between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathLeg {
    /// Node sequence `[from, ..., to]`. A single entry when `from == to`.
    pub nodes: Vec<NodeId>,
    /// Sum of edge lengths along `nodes`, in metres.
    pub length: f64,
}

/// Spatial graph operations used by the route solver.
pub trait SpatialGraph {
    /// Node closest to `at`.
    ///
    /// # Errors
    ///
    /// Returns [`SolveError::DegenerateNetwork`] if the graph has no nodes.
    fn nearest_node(&self, at: GeoPoint) -> Result<NodeId, SolveError>;

    /// Shortest path from `from` to `to` weighted by edge length.
    ///
    /// # Errors
    ///
    /// Returns [`SolveError::UnreachablePair`] if no path exists and
    /// [`SolveError::UnknownNode`] if either id is not in the graph.
    fn shortest_path(&self, from: NodeId, to: NodeId) -> Result<PathLeg, SolveError>;

    /// Length of the shortest path from `from` to `to`.
    ///
    /// # Errors
    ///
    /// Same as [`shortest_path`](Self::shortest_path).
    fn shortest_path_length(&self, from: NodeId, to: NodeId) -> Result<f64, SolveError>;

    /// Position of a node, if it exists.
    fn position(&self, node: NodeId) -> Option<GeoPoint>;

    /// Returns `true` if the graph has no nodes.
    fn is_empty(&self) -> bool;

    /// Shortest-path lengths from one source to several targets, in
    /// target order.
    ///
    /// The default issues one query per target; implementations with a
    /// single-source algorithm should override it.
    ///
    /// # Errors
    ///
    /// Fails on the first unreachable or unknown target.
    fn lengths_from(&self, from: NodeId, targets: &[NodeId]) -> Result<Vec<f64>, SolveError> {
        targets
            .iter()
            .map(|&to| self.shortest_path_length(from, to))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Serializable network description
// ---------------------------------------------------------------------------

/// A network node as delivered by the graph-acquisition side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Node identifier.
    pub id: NodeId,
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
}

/// An undirected street edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    /// One endpoint.
    pub from: NodeId,
    /// The other endpoint.
    pub to: NodeId,
    /// Physical length in metres. When absent, the haversine distance
    /// between the endpoints is used.
    #[serde(default)]
    pub length: Option<f64>,
}

/// Plain node and edge lists, the JSON form of a road network.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkData {
    /// All nodes.
    pub nodes: Vec<NodeRecord>,
    /// All edges.
    #[serde(default)]
    pub edges: Vec<EdgeRecord>,
}

impl NetworkData {
    /// Parse the `{ "nodes": [...], "edges": [...] }` JSON form.
    ///
    /// # Errors
    ///
    /// Returns [`SolveError::DegenerateNetwork`] if the JSON does not
    /// match the expected shape.
    pub fn from_json(json: &str) -> Result<Self, SolveError> {
        serde_json::from_str(json)
            .map_err(|e| SolveError::DegenerateNetwork(format!("invalid network JSON: {e}")))
    }
}

// ---------------------------------------------------------------------------
// RoadNetwork
// ---------------------------------------------------------------------------

/// Node weight stored in the routing graph.
#[derive(Debug, Clone, Copy)]
struct NetworkNode {
    id: NodeId,
    position: GeoPoint,
}

/// A node position tagged with its graph index, for R\*-tree insertion.
type IndexedNode = GeomWithData<[f64; 2], NodeIndex>;

/// Undirected road network weighted by street length.
///
/// Immutable after construction; safe to share read-only between
/// concurrent solves.
#[derive(Debug, Clone)]
pub struct RoadNetwork {
    graph: UnGraph<NetworkNode, f64>,
    index: HashMap<NodeId, NodeIndex>,
    tree: RTree<IndexedNode>,
}

impl RoadNetwork {
    /// Build a network from node and edge lists.
    ///
    /// Repeated node ids keep the last position seen. A repeated edge
    /// between the same pair of nodes replaces the earlier length.
    ///
    /// # Errors
    ///
    /// Returns [`SolveError::DegenerateNetwork`] for non-finite node
    /// coordinates, negative or non-finite edge lengths, and edges that
    /// reference unknown nodes.
    pub fn from_data(data: &NetworkData) -> Result<Self, SolveError> {
        let mut graph = UnGraph::<NetworkNode, f64>::with_capacity(data.nodes.len(), data.edges.len());
        let mut index = HashMap::<NodeId, NodeIndex>::with_capacity(data.nodes.len());

        for record in &data.nodes {
            let position = GeoPoint::new(record.lat, record.lon);
            if !position.is_finite() {
                return Err(SolveError::DegenerateNetwork(format!(
                    "node {} has non-finite coordinates",
                    record.id
                )));
            }
            let node = NetworkNode {
                id: record.id,
                position,
            };
            match index.get(&record.id) {
                Some(&existing) => graph[existing] = node,
                None => {
                    index.insert(record.id, graph.add_node(node));
                }
            }
        }

        for record in &data.edges {
            let lookup = |id: NodeId| {
                index.get(&id).copied().ok_or_else(|| {
                    SolveError::DegenerateNetwork(format!(
                        "edge {}-{} references unknown node {id}",
                        record.from, record.to
                    ))
                })
            };
            let a = lookup(record.from)?;
            let b = lookup(record.to)?;
            let length = record.length.unwrap_or_else(|| {
                haversine_metres(graph[a].position, graph[b].position)
            });
            if !length.is_finite() || length < 0.0 {
                return Err(SolveError::DegenerateNetwork(format!(
                    "edge {}-{} has invalid length {length}",
                    record.from, record.to
                )));
            }
            graph.update_edge(a, b, length);
        }

        let entries: Vec<IndexedNode> = graph
            .node_indices()
            .map(|i| GeomWithData::new(graph[i].position.to_xy(), i))
            .collect();
        let tree = RTree::bulk_load(entries);

        tracing::debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "road network built"
        );

        Ok(Self { graph, index, tree })
    }

    /// Compose several networks into one, as when a tour spans
    /// neighbouring places. Later parts win on conflicting node ids.
    ///
    /// # Errors
    ///
    /// Same as [`from_data`](Self::from_data).
    pub fn compose<I>(parts: I) -> Result<Self, SolveError>
    where
        I: IntoIterator<Item = NetworkData>,
    {
        let mut merged = NetworkData::default();
        for part in parts {
            merged.nodes.extend(part.nodes);
            merged.edges.extend(part.edges);
        }
        Self::from_data(&merged)
    }

    /// Export the network back into plain lists. Edge lengths are always
    /// present in the output.
    #[must_use]
    pub fn to_data(&self) -> NetworkData {
        let nodes = self
            .graph
            .node_weights()
            .map(|n| NodeRecord {
                id: n.id,
                lat: n.position.lat,
                lon: n.position.lon,
            })
            .collect();
        let edges = self
            .graph
            .edge_references()
            .map(|e| EdgeRecord {
                from: self.graph[e.source()].id,
                to: self.graph[e.target()].id,
                length: Some(*e.weight()),
            })
            .collect();
        NetworkData { nodes, edges }
    }

    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    fn node_index(&self, id: NodeId) -> Result<NodeIndex, SolveError> {
        self.index
            .get(&id)
            .copied()
            .ok_or(SolveError::UnknownNode(id))
    }
}

impl SpatialGraph for RoadNetwork {
    fn nearest_node(&self, at: GeoPoint) -> Result<NodeId, SolveError> {
        let query = at.to_xy();
        let mut best: Option<(f64, NodeId)> = None;

        // Candidates arrive in ascending distance; keep scanning while the
        // distance is tied so the lowest id wins deterministically.
        for (entry, dist2) in self.tree.nearest_neighbor_iter_with_distance_2(&query) {
            let id = self.graph[entry.data].id;
            match best {
                None => best = Some((dist2, id)),
                Some((best_dist2, _)) if dist2 > best_dist2 => break,
                Some((_, best_id)) if id < best_id => best = Some((dist2, id)),
                Some(_) => {}
            }
        }

        best.map(|(_, id)| id)
            .ok_or_else(|| SolveError::DegenerateNetwork("network has no nodes".to_owned()))
    }

    fn shortest_path(&self, from: NodeId, to: NodeId) -> Result<PathLeg, SolveError> {
        let start = self.node_index(from)?;
        let goal = self.node_index(to)?;

        // Zero heuristic: A* degenerates to Dijkstra but also returns the
        // node sequence.
        let (length, path) = astar(
            &self.graph,
            start,
            |n| n == goal,
            |e| *e.weight(),
            |_| 0.0,
        )
        .ok_or(SolveError::UnreachablePair { from, to })?;

        Ok(PathLeg {
            nodes: path.into_iter().map(|i| self.graph[i].id).collect(),
            length,
        })
    }

    fn shortest_path_length(&self, from: NodeId, to: NodeId) -> Result<f64, SolveError> {
        let start = self.node_index(from)?;
        let goal = self.node_index(to)?;
        let costs = dijkstra(&self.graph, start, Some(goal), |e| *e.weight());
        costs
            .get(&goal)
            .copied()
            .ok_or(SolveError::UnreachablePair { from, to })
    }

    fn position(&self, node: NodeId) -> Option<GeoPoint> {
        self.index.get(&node).map(|&i| self.graph[i].position)
    }

    fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    fn lengths_from(&self, from: NodeId, targets: &[NodeId]) -> Result<Vec<f64>, SolveError> {
        let start = self.node_index(from)?;
        let goals = targets
            .iter()
            .map(|&t| self.node_index(t))
            .collect::<Result<Vec<_>, _>>()?;

        let costs = dijkstra(&self.graph, start, None, |e| *e.weight());

        targets
            .iter()
            .zip(goals)
            .map(|(&to, goal)| {
                costs
                    .get(&goal)
                    .copied()
                    .ok_or(SolveError::UnreachablePair { from, to })
            })
            .collect()
    }
}

/// Great-circle distance between two positions in metres.
fn haversine_metres(a: GeoPoint, b: GeoPoint) -> f64 {
    Haversine.distance(
        geo::Point::new(a.lon, a.lat),
        geo::Point::new(b.lon, b.lat),
    )
}

// ---------------------------------------------------------------------------
// Test fixtures shared by the other modules
// ---------------------------------------------------------------------------
