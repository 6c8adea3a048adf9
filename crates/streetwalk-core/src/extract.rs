//! Required-node extraction: snap drawn street markings to network nodes.

use serde::{Deserialize, Serialize};

use crate::network::SpatialGraph;
use crate::types::{DrawnGeometry, RequiredNodes, SolveError};

/// Which vertices of a drawn line become required nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RequiredPointPolicy {
    /// Only the first and last vertex of each line.
    #[default]
    Endpoints,

    /// Every vertex of each line. Useful when a single stroke follows
    /// several streets and the bends must be walked too.
    AllVertices,
}

/// Resolve the set of nodes a tour must visit from drawn geometries.
///
/// Only `LineString` records with at least two vertices are considered;
/// everything else is ignored. Each selected vertex is snapped to its
/// nearest network node and the results are collected into a set, so a
/// node marked by several strokes is required once.
///
/// # Errors
///
/// Returns [`SolveError::DegenerateNetwork`] if the graph has no nodes,
/// whatever was drawn, and [`SolveError::InsufficientInput`] if fewer
/// than two distinct nodes result.
pub fn extract_required_nodes<G: SpatialGraph + ?Sized>(
    graph: &G,
    drawings: &[DrawnGeometry],
    policy: RequiredPointPolicy,
) -> Result<RequiredNodes, SolveError> {
    if graph.is_empty() {
        return Err(SolveError::DegenerateNetwork("network has no nodes".into()));
    }

    let mut required = RequiredNodes::new();
    let mut segments = 0_usize;

    for segment in drawings.iter().filter_map(DrawnGeometry::as_marked_segment) {
        segments += 1;
        match policy {
            RequiredPointPolicy::Endpoints => {
                if let (Some(&first), Some(&last)) = (segment.first(), segment.last()) {
                    required.insert(graph.nearest_node(first)?);
                    required.insert(graph.nearest_node(last)?);
                }
            }
            RequiredPointPolicy::AllVertices => {
                for &vertex in segment {
                    required.insert(graph.nearest_node(vertex)?);
                }
            }
        }
    }

    tracing::debug!(
        drawings = drawings.len(),
        segments,
        required = required.len(),
        ?policy,
        "resolved required nodes"
    );

    if required.len() < 2 {
        return Err(SolveError::InsufficientInput {
            found: required.len(),
        });
    }
    Ok(required)
}
