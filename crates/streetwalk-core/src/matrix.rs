//! Pairwise shortest-path distances between required nodes.

use crate::network::SpatialGraph;
use crate::types::{NodeId, RequiredNodes, SolveError};

/// Dense symmetric distance matrix over an ordered list of nodes.
///
/// Row-major `n × n` storage. Index `i` refers to `nodes()[i]`. The
/// diagonal is zero and never consulted by the tour heuristics.
///
/// # Examples
///
/// ```
/// use streetwalk_core::matrix::DistanceMatrix;
/// use streetwalk_core::NodeId;
///
/// let m = DistanceMatrix::from_data(
///     vec![NodeId(1), NodeId(2)],
///     vec![0.0, 5.0, 5.0, 0.0],
/// )
/// .unwrap();
/// assert_eq!(m.size(), 2);
/// assert!((m.get(0, 1) - 5.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    nodes: Vec<NodeId>,
    data: Vec<f64>,
}

impl DistanceMatrix {
    /// Compute shortest-path distances for every unordered pair of
    /// required nodes.
    ///
    /// One single-source query is issued per node against the nodes that
    /// follow it in id order, so each pair is computed once and mirrored.
    ///
    /// # Errors
    ///
    /// Returns [`SolveError::UnreachablePair`] for the first pair (in id
    /// order) with no connecting path. No partial matrix is returned.
    pub fn build<G: SpatialGraph + ?Sized>(
        graph: &G,
        required: &RequiredNodes,
    ) -> Result<Self, SolveError> {
        let nodes = required.to_vec();
        let n = nodes.len();
        let mut matrix = Self {
            data: vec![0.0; n * n],
            nodes,
        };

        for i in 0..n {
            let targets = &matrix.nodes[i + 1..];
            if targets.is_empty() {
                continue;
            }
            let lengths = graph.lengths_from(matrix.nodes[i], targets)?;
            for (k, length) in lengths.into_iter().enumerate() {
                matrix.set(i, i + 1 + k, length);
            }
        }

        tracing::debug!(nodes = n, pairs = n * n.saturating_sub(1) / 2, "distance matrix built");
        Ok(matrix)
    }

    /// Create a matrix from explicit row-major data.
    ///
    /// Returns `None` if `data.len() != nodes.len()²`.
    #[must_use]
    pub fn from_data(nodes: Vec<NodeId>, data: Vec<f64>) -> Option<Self> {
        (data.len() == nodes.len() * nodes.len()).then_some(Self { nodes, data })
    }

    /// Distance between the nodes at indices `i` and `j`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    #[must_use]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.nodes.len() + j]
    }

    /// Set the distance between `i` and `j` in both directions.
    fn set(&mut self, i: usize, j: usize, distance: f64) {
        let n = self.nodes.len();
        self.data[i * n + j] = distance;
        self.data[j * n + i] = distance;
    }

    /// Number of nodes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.nodes.len()
    }

    /// The ordered node list.
    #[must_use]
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// Node at index `i`.
    #[must_use]
    pub fn node(&self, i: usize) -> NodeId {
        self.nodes[i]
    }

    /// Index of `node`, if present.
    #[must_use]
    pub fn index_of(&self, node: NodeId) -> Option<usize> {
        self.nodes.iter().position(|&n| n == node)
    }

    /// Largest pairwise distance, or 0 for fewer than two nodes.
    #[must_use]
    pub fn max_distance(&self) -> f64 {
        self.data.iter().copied().fold(0.0, f64::max)
    }

    /// Total length of a closed visit order given as indices
    /// (`order[0] -> order[1] -> ... -> order[0]`).
    #[must_use]
    pub fn cycle_length(&self, order: &[usize]) -> f64 {
        if order.len() < 2 {
            return 0.0;
        }
        let closing = self.get(order[order.len() - 1], order[0]);
        order.windows(2).map(|w| self.get(w[0], w[1])).sum::<f64>() + closing
    }
}
