//! Expansion of a tour over required nodes into a network path.

use crate::network::SpatialGraph;
use crate::types::{ExpandedRoute, SolveError, Tour};

/// Replace every tour leg with the concrete shortest path through the
/// network and concatenate the legs in order.
///
/// Leg paths are appended verbatim, so a node where two legs meet
/// appears twice in a row. `total_length` is the sum of the leg lengths.
///
/// # Errors
///
/// Propagates [`SolveError::UnreachablePair`] and
/// [`SolveError::UnknownNode`] from the graph. Neither can occur for a
/// tour whose distance matrix was built from the same graph.
pub fn expand_tour<G: SpatialGraph + ?Sized>(
    graph: &G,
    tour: &Tour,
) -> Result<ExpandedRoute, SolveError> {
    let mut points = Vec::new();
    let mut total_length = 0.0;

    for (from, to) in tour.legs() {
        let leg = graph.shortest_path(from, to)?;
        total_length += leg.length;
        for node in leg.nodes {
            points.push(graph.position(node).ok_or(SolveError::UnknownNode(node))?);
        }
    }

    tracing::debug!(
        legs = tour.stop_count(),
        points = points.len(),
        total_length,
        "tour expanded"
    );

    Ok(ExpandedRoute {
        points,
        total_length,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::network::fixtures::{A, B, C, D, square, street};
    use crate::types::{GeoPoint, NodeId};

    fn position(id: NodeId) -> GeoPoint {
        square().position(id).unwrap()
    }

    #[test]
    fn out_and_back_over_diagonal() {
        let net = square();
        let tour = Tour::close(vec![A, C]).unwrap();
        let route = expand_tour(&net, &tour).unwrap();
        assert!((route.total_length - 4.0).abs() < 1e-12);
        // Two legs of three nodes each.
        assert_eq!(route.points.len(), 6);
        assert_eq!(route.points.first(), Some(&position(A)));
        assert_eq!(route.points.last(), Some(&position(A)));
        assert_eq!(route.points[2], position(C));
        assert_eq!(route.points[3], position(C));
    }

    #[test]
    fn length_is_sum_of_leg_lengths() {
        let net = square();
        let tour = Tour::close(vec![A, B, C, D]).unwrap();
        let route = expand_tour(&net, &tour).unwrap();
        let legs: f64 = tour
            .legs()
            .map(|(a, b)| net.shortest_path_length(a, b).unwrap())
            .sum();
        assert!((route.total_length - legs).abs() < 1e-12);
        assert!((route.total_length - 4.0).abs() < 1e-12);
    }

    #[test]
    fn consecutive_points_are_adjacent_or_repeated() {
        let net = street(6);
        let tour = Tour::close(vec![NodeId(100), NodeId(105), NodeId(102)]).unwrap();
        let route = expand_tour(&net, &tour).unwrap();
        // 5 + 3 + 2 hops of 10 m.
        assert!((route.total_length - 100.0).abs() < 1e-9);
        for pair in route.points.windows(2) {
            let step = (pair[0].lon - pair[1].lon).abs();
            assert!(step < 1e-9 || (step - 0.001).abs() < 1e-9, "jump of {step}");
        }
    }

    #[test]
    fn unknown_node_is_reported() {
        let net = square();
        let tour = Tour::close(vec![A, NodeId(42)]).unwrap();
        assert_eq!(
            expand_tour(&net, &tour),
            Err(SolveError::UnknownNode(NodeId(42)))
        );
    }
}
