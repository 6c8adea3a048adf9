//! Solve diagnostics: timing and counts for each stage.
//!
//! [`solve_with_diagnostics`] runs the same stages as
//! [`solve`](crate::solve) and records how long each took together with
//! stage-specific metrics. The core crate does no I/O, so wall-clock
//! time is read through the [`Clock`] trait supplied by the caller.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::expand::expand_tour;
use crate::extract::extract_required_nodes;
use crate::matrix::DistanceMatrix;
use crate::network::SpatialGraph;
use crate::tour::approximate_tour;
use crate::types::{DrawnGeometry, SolveConfig, SolveError, SolveResult};

/// Source of wall-clock time for stage timing.
pub trait Clock {
    /// Opaque point in time.
    type Instant;

    /// Current instant.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Diagnostics collected from a single solve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolveDiagnostics {
    /// Stage 1: required-node extraction.
    pub extract: StageDiagnostics,
    /// Stage 2: pairwise distance matrix.
    pub matrix: StageDiagnostics,
    /// Stage 3: tour approximation.
    pub tour: StageDiagnostics,
    /// Stage 4: path expansion.
    pub expand: StageDiagnostics,
    /// Total wall-clock duration of the solve (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary counts across all stages.
    pub summary: SolveSummary,
}

/// Diagnostics for a single stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: StageMetrics,
}

/// Stage-specific metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Required-node extraction.
    Extract {
        /// Drawn geometries received.
        drawings: usize,
        /// Geometries that qualified as marked segments.
        marked_segments: usize,
        /// Distinct required nodes after snapping.
        required_nodes: usize,
        /// Required-point policy in effect.
        policy: String,
    },
    /// Distance matrix construction.
    Matrix {
        /// Matrix dimension.
        nodes: usize,
        /// Unordered pairs computed.
        pairs: usize,
        /// Largest pairwise distance in metres.
        max_distance: f64,
    },
    /// Tour approximation.
    Tour {
        /// Construction heuristic.
        strategy: String,
        /// Whether the 2-opt pass ran.
        two_opt: bool,
        /// Tour length over the matrix in metres.
        tour_length: f64,
    },
    /// Path expansion.
    Expand {
        /// Number of legs expanded.
        legs: usize,
        /// Points in the expanded route.
        points: usize,
        /// Route length in metres.
        total_length: f64,
    },
}

/// High-level summary for the whole solve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolveSummary {
    /// Distinct required nodes.
    pub required_nodes: usize,
    /// Stops in the tour (closing repeat excluded).
    pub tour_stops: usize,
    /// Points in the expanded route.
    pub route_points: usize,
    /// Route length in metres.
    pub total_length: f64,
}

/// Run a full solve and collect per-stage diagnostics.
///
/// # Errors
///
/// Same as [`solve`](crate::solve).
pub fn solve_with_diagnostics<G, C>(
    graph: &G,
    drawings: &[DrawnGeometry],
    config: &SolveConfig,
    clock: &C,
) -> Result<(SolveResult, SolveDiagnostics), SolveError>
where
    G: SpatialGraph + ?Sized,
    C: Clock,
{
    let total_start = clock.now();

    let start = clock.now();
    let required = extract_required_nodes(graph, drawings, config.required_points)?;
    let extract = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: StageMetrics::Extract {
            drawings: drawings.len(),
            marked_segments: drawings
                .iter()
                .filter(|d| d.as_marked_segment().is_some())
                .count(),
            required_nodes: required.len(),
            policy: format!("{:?}", config.required_points),
        },
    };

    let start = clock.now();
    let matrix = DistanceMatrix::build(graph, &required)?;
    let n = matrix.size();
    let matrix_diag = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: StageMetrics::Matrix {
            nodes: n,
            pairs: n * n.saturating_sub(1) / 2,
            max_distance: matrix.max_distance(),
        },
    };

    let start = clock.now();
    let tour = approximate_tour(&matrix, config)?;
    let tour_length: f64 = tour
        .legs()
        .filter_map(|(a, b)| Some(matrix.get(matrix.index_of(a)?, matrix.index_of(b)?)))
        .sum();
    let tour_diag = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: StageMetrics::Tour {
            strategy: format!("{:?}", config.tour_strategy),
            two_opt: config.two_opt,
            tour_length,
        },
    };

    let start = clock.now();
    let route = expand_tour(graph, &tour)?;
    let expand = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: StageMetrics::Expand {
            legs: tour.stop_count(),
            points: route.points.len(),
            total_length: route.total_length,
        },
    };

    let summary = SolveSummary {
        required_nodes: required.len(),
        tour_stops: tour.stop_count(),
        route_points: route.points.len(),
        total_length: route.total_length,
    };

    tracing::info!(
        stops = summary.tour_stops,
        total_length = summary.total_length,
        "route solved"
    );

    let diagnostics = SolveDiagnostics {
        extract,
        matrix: matrix_diag,
        tour: tour_diag,
        expand,
        total_duration: clock.elapsed(&total_start),
        summary,
    };

    Ok((
        SolveResult {
            required,
            tour,
            route,
        },
        diagnostics,
    ))
}

impl SolveDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Solve Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<16} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);
        let stages = [
            ("Extract", &self.extract),
            ("Matrix", &self.matrix),
            ("Tour", &self.tour),
            ("Expand", &self.expand),
        ];

        for (name, diag) in stages {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<16} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.push(String::new());
        lines.push(format!(
            "Required nodes: {}  |  Route points: {}  |  Length: {:.2} m",
            self.summary.required_nodes, self.summary.route_points, self.summary.total_length,
        ));

        lines.join("\n")
    }
}

fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Extract {
            drawings,
            marked_segments,
            required_nodes,
            policy,
        } => format!("{drawings} drawings, {marked_segments} segments -> {required_nodes} nodes ({policy})"),
        StageMetrics::Matrix {
            nodes,
            pairs,
            max_distance,
        } => format!("{nodes}x{nodes}, {pairs} pairs, max={max_distance:.1} m"),
        StageMetrics::Tour {
            strategy,
            two_opt,
            tour_length,
        } => {
            let polish = if *two_opt { " + 2-opt" } else { "" };
            format!("{strategy}{polish}, {tour_length:.1} m")
        }
        StageMetrics::Expand {
            legs,
            points,
            total_length,
        } => format!("{legs} legs, {points} pts, {total_length:.1} m"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::network::fixtures::square;

    /// Clock that advances one millisecond per reading.
    struct TickClock(Cell<u64>);

    impl Clock for TickClock {
        type Instant = u64;

        fn now(&self) -> u64 {
            let t = self.0.get() + 1;
            self.0.set(t);
            t
        }

        fn elapsed(&self, since: &u64) -> Duration {
            Duration::from_millis(self.now() - since)
        }
    }

    #[test]
    fn duration_ms_converts_correctly() {
        let ms = duration_ms(Duration::from_millis(1234));
        assert!((ms - 1234.0).abs() < 0.01);
    }

    #[test]
    fn diagnostics_match_result() {
        let net = square();
        let drawings = vec![DrawnGeometry::line_string(&[[0.0, 0.0], [1.0, 1.0]])];
        let clock = TickClock(Cell::new(0));
        let (result, diag) =
            solve_with_diagnostics(&net, &drawings, &SolveConfig::default(), &clock).unwrap();

        assert_eq!(diag.summary.required_nodes, 2);
        assert_eq!(diag.summary.tour_stops, 2);
        assert_eq!(diag.summary.route_points, result.route.points.len());
        assert!((diag.summary.total_length - 4.0).abs() < 1e-12);
        assert!(diag.total_duration >= diag.extract.duration + diag.matrix.duration);
        assert!(matches!(
            diag.tour.metrics,
            StageMetrics::Tour { tour_length, .. } if (tour_length - 4.0).abs() < 1e-12
        ));
    }

    #[test]
    fn report_names_every_stage() {
        let net = square();
        let drawings = vec![DrawnGeometry::line_string(&[[0.0, 0.0], [1.0, 1.0]])];
        let clock = TickClock(Cell::new(0));
        let (_, diag) =
            solve_with_diagnostics(&net, &drawings, &SolveConfig::default(), &clock).unwrap();

        let report = diag.report();
        assert!(report.contains("Solve Diagnostics Report"));
        for stage in ["Extract", "Matrix", "Tour", "Expand"] {
            assert!(report.contains(stage), "missing {stage}");
        }
        assert!(report.contains("Christofides"));
        assert!(report.contains("4.00 m"));
    }

    #[test]
    fn diagnostics_serialize_durations_as_seconds() {
        let net = square();
        let drawings = vec![DrawnGeometry::line_string(&[[0.0, 0.0], [1.0, 1.0]])];
        let clock = TickClock(Cell::new(0));
        let (_, diag) =
            solve_with_diagnostics(&net, &drawings, &SolveConfig::default(), &clock).unwrap();

        let value = serde_json::to_value(&diag).unwrap();
        assert!(value["total_duration"].is_f64());
        assert!(value["extract"]["duration"].as_f64().unwrap() > 0.0);
        let back: SolveDiagnostics = serde_json::from_value(value).unwrap();
        assert_eq!(back.summary.required_nodes, 2);
    }

    #[test]
    fn insufficient_input_propagates() {
        let net = square();
        let clock = TickClock(Cell::new(0));
        assert!(matches!(
            solve_with_diagnostics(&net, &[], &SolveConfig::default(), &clock),
            Err(SolveError::InsufficientInput { found: 0 })
        ));
    }
}
