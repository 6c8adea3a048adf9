//! Tour approximation over the complete graph of required nodes.
//!
//! # Algorithm overview (Christofides)
//!
//! 1. **MST via Kruskal:** sort all node pairs by shortest-path distance
//!    and merge via `UnionFind` until one component remains.
//!
//! 2. **Fix parity:** collect the odd-degree vertices of the tree and
//!    join them with a minimum-weight perfect matching. The matching is
//!    exact (bitmask dynamic programme) up to
//!    [`SolveConfig::exact_matching_limit`] odd vertices; above that a
//!    greedy closest-pair matching is used.
//!
//! 3. **Hierholzer:** tree plus matching has only even degrees, so it
//!    contains an Eulerian circuit.
//!
//! 4. **Shortcut:** drop repeated vertices from the circuit. Because
//!    shortest-path distances obey the triangle inequality this never
//!    lengthens the walk.
//!
//! With an exact matching the tour is at most 1.5 times the optimal
//! tour length. The greedy matching fallback and the
//! [`TourStrategy::NearestNeighbor`] construction carry no constant
//! factor guarantee.
//!
//! An optional 2-opt pass runs after construction. It only accepts
//! strictly improving moves, so every bound above still holds.

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::unionfind::UnionFind;
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

use crate::matrix::DistanceMatrix;
use crate::types::{SolveConfig, SolveError, Tour};

/// Hard cap on the exact matching size regardless of configuration.
/// The dynamic programme allocates `2^k` states, about 10 MB at the cap.
pub const MAX_EXACT_MATCHING: usize = 20;

/// Minimum improvement for a 2-opt move to be accepted.
const TWO_OPT_EPSILON: f64 = 1e-9;

/// Selects the tour construction heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TourStrategy {
    /// MST + minimum-weight matching + Euler circuit + shortcut.
    ///
    /// At most 1.5x optimal when the matching is exact.
    #[default]
    Christofides,

    /// Start at the lowest node id and repeatedly walk to the nearest
    /// unvisited node. Fast, no constant-factor guarantee.
    NearestNeighbor,
}

/// Trait for tour construction strategies.
///
/// Input: a complete, finite distance matrix with at least three nodes.
/// Output: an open visiting order of matrix indices, each exactly once.
pub trait TourConstructor {
    /// Build a visiting order.
    ///
    /// # Errors
    ///
    /// Returns [`SolveError::DisconnectedTourGraph`] if the matrix cannot
    /// be spanned.
    fn construct(
        &self,
        matrix: &DistanceMatrix,
        config: &SolveConfig,
    ) -> Result<Vec<usize>, SolveError>;
}

impl TourConstructor for TourStrategy {
    fn construct(
        &self,
        matrix: &DistanceMatrix,
        config: &SolveConfig,
    ) -> Result<Vec<usize>, SolveError> {
        match *self {
            Self::Christofides => christofides(matrix, config.exact_matching_limit),
            Self::NearestNeighbor => Ok(nearest_neighbor(matrix)),
        }
    }
}

/// Compute an approximate minimum-length closed tour over all nodes of
/// `matrix`.
///
/// Two nodes give the trivial tour `[a, b, a]`. The returned tour starts
/// and ends at the lowest node id.
///
/// # Errors
///
/// Returns [`SolveError::InsufficientInput`] for fewer than two nodes and
/// [`SolveError::DisconnectedTourGraph`] if any pairwise distance is not
/// finite.
pub fn approximate_tour(
    matrix: &DistanceMatrix,
    config: &SolveConfig,
) -> Result<Tour, SolveError> {
    let n = matrix.size();
    if n < 2 {
        return Err(SolveError::InsufficientInput { found: n });
    }
    if (0..n).any(|i| (0..n).any(|j| !matrix.get(i, j).is_finite())) {
        return Err(SolveError::DisconnectedTourGraph);
    }

    let mut order = if n == 2 {
        vec![0, 1]
    } else {
        config.tour_strategy.construct(matrix, config)?
    };

    let constructed = matrix.cycle_length(&order);
    if config.two_opt && n > 3 {
        two_opt(&mut order, matrix);
    }

    if let Some(pos) = order.iter().position(|&i| i == 0) {
        order.rotate_left(pos);
    }

    tracing::debug!(
        strategy = ?config.tour_strategy,
        stops = n,
        constructed,
        improved = matrix.cycle_length(&order),
        "tour approximated"
    );

    Tour::close(order.iter().map(|&i| matrix.node(i)).collect())
        .ok_or(SolveError::InsufficientInput { found: 0 })
}

// ---------------------------------------------------------------------------
// Christofides
// ---------------------------------------------------------------------------

fn christofides(matrix: &DistanceMatrix, exact_matching_limit: usize) -> Result<Vec<usize>, SolveError> {
    let n = matrix.size();
    let tree = minimum_spanning_tree(matrix)?;

    let mut degree = vec![0_usize; n];
    for &(a, b) in &tree {
        degree[a] += 1;
        degree[b] += 1;
    }
    let odd: Vec<usize> = (0..n).filter(|&v| degree[v] % 2 != 0).collect();

    let limit = exact_matching_limit.min(MAX_EXACT_MATCHING);
    let matching = if odd.len() <= limit {
        exact_matching(&odd, matrix)
    } else {
        tracing::warn!(
            odd = odd.len(),
            limit,
            "too many odd-degree vertices for exact matching; 1.5x bound not guaranteed"
        );
        greedy_matching(&odd, matrix)
    };

    let mut graph = UnGraph::<(), f64>::with_capacity(n, tree.len() + matching.len());
    for _ in 0..n {
        graph.add_node(());
    }
    for &(a, b) in tree.iter().chain(&matching) {
        graph.add_edge(NodeIndex::new(a), NodeIndex::new(b), matrix.get(a, b));
    }

    let circuit = hierholzer(&graph, NodeIndex::new(0));
    Ok(shortcut(&circuit, n))
}

/// Kruskal's algorithm over the complete graph.
///
/// Ties are broken by index pair so the result is deterministic.
fn minimum_spanning_tree(matrix: &DistanceMatrix) -> Result<Vec<(usize, usize)>, SolveError> {
    let n = matrix.size();
    let mut candidates: Vec<(f64, usize, usize)> = Vec::with_capacity(n * n.saturating_sub(1) / 2);
    for i in 0..n {
        for j in i + 1..n {
            let w = matrix.get(i, j);
            if w.is_finite() {
                candidates.push((w, i, j));
            }
        }
    }
    candidates.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)).then(a.2.cmp(&b.2)));

    let mut uf = UnionFind::<usize>::new(n);
    let mut edges = Vec::with_capacity(n.saturating_sub(1));
    for (_, a, b) in candidates {
        if uf.union(a, b) {
            edges.push((a, b));
            if edges.len() == n - 1 {
                break;
            }
        }
    }

    if edges.len() + 1 < n {
        return Err(SolveError::DisconnectedTourGraph);
    }
    Ok(edges)
}

/// Minimum-weight perfect matching over `vertices` by dynamic
/// programming on subsets.
///
/// `best[mask]` is the cheapest way to match exactly the vertices in
/// `mask`, always pairing the lowest unmatched vertex next, which keeps
/// the state count at `2^k`.
fn exact_matching(vertices: &[usize], matrix: &DistanceMatrix) -> Vec<(usize, usize)> {
    let k = vertices.len();
    if k == 0 {
        return Vec::new();
    }
    let full = (1_usize << k) - 1;
    let mut best = vec![f64::INFINITY; full + 1];
    // Indices fit in a byte since k <= MAX_EXACT_MATCHING.
    let mut choice = vec![(0_u8, 0_u8); full + 1];
    best[0] = 0.0;

    for mask in 0..full {
        let base = best[mask];
        if !base.is_finite() {
            continue;
        }
        let i = (!mask).trailing_zeros() as usize;
        for j in i + 1..k {
            if mask & (1 << j) != 0 {
                continue;
            }
            let next = mask | (1 << i) | (1 << j);
            let cost = base + matrix.get(vertices[i], vertices[j]);
            if cost < best[next] {
                best[next] = cost;
                #[allow(clippy::cast_possible_truncation)]
                {
                    choice[next] = (i as u8, j as u8);
                }
            }
        }
    }

    let mut pairs = Vec::with_capacity(k / 2);
    let mut mask = full;
    while mask != 0 {
        let (i, j) = (usize::from(choice[mask].0), usize::from(choice[mask].1));
        pairs.push((vertices[i], vertices[j]));
        mask &= !((1 << i) | (1 << j));
    }
    pairs
}

/// Greedy matching: repeatedly pair the two closest unmatched vertices.
fn greedy_matching(vertices: &[usize], matrix: &DistanceMatrix) -> Vec<(usize, usize)> {
    let mut open = vertices.to_vec();
    let mut pairs = Vec::with_capacity(open.len() / 2);

    while open.len() >= 2 {
        let mut best_i = 0;
        let mut best_j = 1;
        let mut best_dist = f64::INFINITY;
        for (i, &a) in open.iter().enumerate() {
            for (j, &b) in open.iter().enumerate().skip(i + 1) {
                let d = matrix.get(a, b);
                if d < best_dist {
                    best_dist = d;
                    best_i = i;
                    best_j = j;
                }
            }
        }
        pairs.push((open[best_i], open[best_j]));
        // Remove the higher index first so the lower one stays valid.
        open.swap_remove(best_j);
        open.swap_remove(best_i);
    }
    pairs
}

/// Find an Eulerian circuit from `start` using Hierholzer's algorithm.
///
/// Assumes every vertex has even degree and all edges are reachable
/// from `start`. The returned sequence begins and ends at `start`.
fn hierholzer(graph: &UnGraph<(), f64>, start: NodeIndex) -> Vec<NodeIndex> {
    let mut stack = vec![start];
    let mut circuit = Vec::with_capacity(graph.edge_count() + 1);
    let mut used_edges = vec![false; graph.edge_count()];

    while let Some(&current) = stack.last() {
        let next_edge = graph.edges(current).find_map(|e| {
            let eidx = e.id().index();
            if used_edges[eidx] {
                None
            } else {
                Some((e.id(), e.target()))
            }
        });

        if let Some((edge_id, target)) = next_edge {
            used_edges[edge_id.index()] = true;
            stack.push(target);
        } else {
            circuit.push(stack.pop().unwrap_or(start));
        }
    }

    circuit.reverse();
    circuit
}

/// Keep the first occurrence of each vertex of an Euler circuit.
fn shortcut(circuit: &[NodeIndex], n: usize) -> Vec<usize> {
    let mut seen = vec![false; n];
    let mut order = Vec::with_capacity(n);
    for v in circuit {
        let i = v.index();
        if !seen[i] {
            seen[i] = true;
            order.push(i);
        }
    }
    order
}

// ---------------------------------------------------------------------------
// Nearest neighbour and 2-opt
// ---------------------------------------------------------------------------

/// Greedy nearest-neighbour order starting at index 0.
fn nearest_neighbor(matrix: &DistanceMatrix) -> Vec<usize> {
    let n = matrix.size();
    let mut visited = vec![false; n];
    let mut order = Vec::with_capacity(n);
    let mut current = 0;
    visited[0] = true;
    order.push(0);

    while order.len() < n {
        let next = (0..n)
            .filter(|&j| !visited[j])
            .min_by(|&a, &b| {
                matrix
                    .get(current, a)
                    .total_cmp(&matrix.get(current, b))
                    .then(a.cmp(&b))
            })
            .unwrap_or(current);
        visited[next] = true;
        order.push(next);
        current = next;
    }
    order
}

/// First-improvement 2-opt over a closed order.
///
/// Reversing `order[i+1..=j]` replaces edges `(a, b)` and `(c, d)` with
/// `(a, c)` and `(b, d)`.
fn two_opt(order: &mut [usize], matrix: &DistanceMatrix) {
    let n = order.len();
    if n < 4 {
        return;
    }

    let mut improved = true;
    while improved {
        improved = false;
        for i in 0..n - 2 {
            for j in i + 2..n {
                if i == 0 && j == n - 1 {
                    continue; // Edges share vertex order[0].
                }
                let a = order[i];
                let b = order[i + 1];
                let c = order[j];
                let d = order[(j + 1) % n];
                let delta = matrix.get(a, c) + matrix.get(b, d)
                    - matrix.get(a, b)
                    - matrix.get(c, d);
                if delta < -TWO_OPT_EPSILON {
                    order[i + 1..=j].reverse();
                    improved = true;
                }
            }
        }
    }
}
