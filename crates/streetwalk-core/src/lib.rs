//! streetwalk-core: Pure route-solving core (sans-IO).
//!
//! Turns street segments drawn on a map into a short closed walking
//! route through a road network:
//! extract required nodes -> distance matrix -> tour approximation ->
//! path expansion.
//!
//! This crate has **no I/O dependencies**. It operates on an in-memory
//! [`RoadNetwork`] (or any [`SpatialGraph`]) and parsed drawings, and
//! returns structured data. Reading files, logging setup, and export
//! formats live in the `streetwalk` and `streetwalk-export` crates.

pub mod diagnostics;
pub mod drawing;
pub mod expand;
pub mod extract;
pub mod matrix;
pub mod network;
pub mod tour;
pub mod types;

pub use drawing::parse_drawings;
pub use extract::RequiredPointPolicy;
pub use network::{NetworkData, RoadNetwork, SpatialGraph};
pub use tour::TourStrategy;
pub use types::{
    DrawnGeometry, ExpandedRoute, GeoPoint, GeometryKind, NodeId, RequiredNodes, SolveConfig,
    SolveError, SolveResult, Tour,
};

/// Compute a closed route visiting every marked street segment.
///
/// # Steps
///
/// 1. Snap the drawn `LineString` vertices to network nodes
/// 2. Compute shortest-path distances between all required nodes
/// 3. Approximate a minimum-length tour (Christofides by default)
/// 4. Expand each tour leg into its network path
///
/// Identical inputs produce identical outputs.
///
/// # Errors
///
/// Returns [`SolveError::InsufficientInput`] if fewer than two distinct
/// nodes are marked, [`SolveError::UnreachablePair`] if two marked
/// nodes are not connected, and [`SolveError::DegenerateNetwork`] for an
/// empty network.
pub fn solve<G: SpatialGraph + ?Sized>(
    graph: &G,
    drawings: &[DrawnGeometry],
    config: &SolveConfig,
) -> Result<SolveResult, SolveError> {
    // 1. Required nodes.
    let required = extract::extract_required_nodes(graph, drawings, config.required_points)?;

    // 2. Pairwise distances.
    let matrix = matrix::DistanceMatrix::build(graph, &required)?;

    // 3. Tour.
    let tour = tour::approximate_tour(&matrix, config)?;

    // 4. Expansion.
    let route = expand::expand_tour(graph, &tour)?;

    tracing::info!(
        stops = tour.stop_count(),
        total_length = route.total_length,
        "route solved"
    );

    Ok(SolveResult {
        required,
        tour,
        route,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::matrix::DistanceMatrix;
    use crate::network::fixtures::{A, B, C, D, edge, node, square, square_data, street};

    fn stroke(from: [f64; 2], to: [f64; 2]) -> DrawnGeometry {
        DrawnGeometry::line_string(&[from, to])
    }

    #[test]
    fn diagonal_stroke_gives_out_and_back() {
        let net = square();
        let result = solve(
            &net,
            &[stroke([0.0, 0.0], [1.0, 1.0])],
            &SolveConfig::default(),
        )
        .unwrap();
        assert_eq!(result.required.to_vec(), vec![A, C]);
        assert_eq!(result.tour.nodes(), &[A, C, A]);
        assert!((result.route.total_length - 4.0).abs() < 1e-12);
    }

    #[test]
    fn all_corners_walk_the_square() {
        let net = square();
        let drawings = [
            stroke([0.0, 0.0], [1.0, 0.0]),
            stroke([1.0, 1.0], [0.0, 1.0]),
        ];
        let result = solve(&net, &drawings, &SolveConfig::default()).unwrap();
        assert_eq!(result.required.to_vec(), vec![A, B, C, D]);
        assert_eq!(result.tour.stop_count(), 4);
        assert!((result.route.total_length - 4.0).abs() < 1e-12);
        let first = result.route.points.first().unwrap();
        let last = result.route.points.last().unwrap();
        assert_eq!(first, last);
    }

    #[test]
    fn disconnected_marks_name_the_pair() {
        let mut data = square_data();
        data.nodes.push(node(10, 5.0, 5.0));
        data.nodes.push(node(11, 5.0, 6.0));
        data.edges.push(edge(10, 11, 1.0));
        let net = RoadNetwork::from_data(&data).unwrap();

        let drawings = [stroke([0.0, 0.0], [6.0, 5.0])];
        assert_eq!(
            solve(&net, &drawings, &SolveConfig::default()),
            Err(SolveError::UnreachablePair {
                from: A,
                to: NodeId(11)
            })
        );
    }

    #[test]
    fn nothing_marked_is_insufficient() {
        let net = square();
        let drawings = [DrawnGeometry {
            kind: GeometryKind::Point,
            coordinates: vec![GeoPoint::new(0.0, 0.0)],
        }];
        assert_eq!(
            solve(&net, &drawings, &SolveConfig::default()),
            Err(SolveError::InsufficientInput { found: 0 })
        );
    }

    #[test]
    fn empty_network_is_degenerate() {
        let net = RoadNetwork::from_data(&NetworkData::default()).unwrap();
        assert!(net.is_empty());
        assert!(matches!(
            solve(&net, &[stroke([0.0, 0.0], [1.0, 1.0])], &SolveConfig::default()),
            Err(SolveError::DegenerateNetwork(_))
        ));
    }

    #[test]
    fn network_can_be_shared_between_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RoadNetwork>();
    }

    #[test]
    fn solving_is_deterministic() {
        let net = square();
        let drawings = [
            stroke([0.0, 0.0], [1.0, 1.0]),
            stroke([1.0, 0.0], [0.0, 1.0]),
        ];
        let config = SolveConfig::default();
        let first = solve(&net, &drawings, &config).unwrap();
        for _ in 0..5 {
            assert_eq!(solve(&net, &drawings, &config).unwrap(), first);
        }
    }

    #[test]
    fn strategies_agree_on_small_input() {
        let net = square();
        let drawings = [
            stroke([0.0, 0.0], [1.0, 0.0]),
            stroke([1.0, 1.0], [0.0, 1.0]),
        ];
        let nn = SolveConfig {
            tour_strategy: TourStrategy::NearestNeighbor,
            ..SolveConfig::default()
        };
        let a = solve(&net, &drawings, &SolveConfig::default()).unwrap();
        let b = solve(&net, &drawings, &nn).unwrap();
        assert!((a.route.total_length - b.route.total_length).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn route_length_matches_legs_and_covers_farthest_pair(
            marks in proptest::collection::vec((0_u32..30, 1_u32..30), 1..6),
        ) {
            // The street fixture has 30 nodes 10 m apart along the equator.
            let net = street(30);
            let drawings: Vec<DrawnGeometry> = marks
                .iter()
                .map(|&(a, d)| {
                    let b = (a + d) % 30;
                    stroke([f64::from(a) * 0.001, 0.0], [f64::from(b) * 0.001, 0.0])
                })
                .collect();

            let result = solve(&net, &drawings, &SolveConfig::default()).unwrap();
            let total = result.route.total_length;

            let farthest = DistanceMatrix::build(&net, &result.required).unwrap().max_distance();
            prop_assert!(total >= farthest - 1e-9);

            let legs: f64 = result
                .tour
                .legs()
                .map(|(a, b)| net.shortest_path_length(a, b).unwrap())
                .sum();
            prop_assert!((total - legs).abs() < 1e-9);
        }
    }
}
