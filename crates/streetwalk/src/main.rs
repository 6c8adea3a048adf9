//! streetwalk: plan a closed walking tour over streets marked on a map.
//!
//! Loads one or more road network files, reads the drawn street
//! segments, solves the tour, and prints per-stage diagnostics, the
//! total length, and a directions link. Optionally writes the route as
//! GPX and an SVG preview.
//!
//! # Usage
//!
//! ```text
//! streetwalk --network mannheim.json --drawings marked.json --gpx route.gpx
//! ```
//!
//! Network files hold `{"nodes": [{"id", "lat", "lon"}], "edges":
//! [{"from", "to", "length"?}]}`. Drawing files hold the drawn features
//! as a GeoJSON array or `FeatureCollection`.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use streetwalk_core::diagnostics::{Clock, SolveDiagnostics, solve_with_diagnostics};
use streetwalk_core::{
    NetworkData, RequiredPointPolicy, RoadNetwork, SolveConfig, SolveError, SolveResult,
    TourStrategy, parse_drawings,
};
use streetwalk_export::{GpxMetadata, SvgMetadata, maps_link, to_gpx, to_svg};
use tracing_subscriber::EnvFilter;

/// Default log directives when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "streetwalk=info";

/// Plan a closed walking tour that covers hand-marked streets.
#[derive(Parser)]
#[command(name = "streetwalk", version)]
struct Cli {
    /// Road network JSON file. Repeat to merge neighbouring areas.
    #[arg(long = "network", required = true)]
    networks: Vec<PathBuf>,

    /// Drawn features (GeoJSON array or FeatureCollection).
    #[arg(long)]
    drawings: PathBuf,

    /// Tour construction heuristic.
    #[arg(long, value_enum, default_value_t = CLI_DEFAULT_STRATEGY)]
    strategy: Strategy,

    /// Skip the 2-opt improvement pass.
    #[arg(long)]
    no_two_opt: bool,

    /// Require every vertex of a drawn line, not just its endpoints.
    #[arg(long)]
    all_vertices: bool,

    /// Largest odd-vertex count matched exactly by Christofides.
    #[arg(long, default_value_t = SolveConfig::DEFAULT_EXACT_MATCHING_LIMIT)]
    exact_matching_limit: usize,

    /// Full solve config as a JSON string.
    ///
    /// When provided, all other solve parameter flags are ignored.
    /// The JSON must be a valid `SolveConfig` serialization; missing
    /// fields take their defaults.
    #[arg(long)]
    config_json: Option<String>,

    /// Write the route as a GPX track.
    #[arg(long)]
    gpx: Option<PathBuf>,

    /// Write an SVG preview of the route.
    #[arg(long)]
    svg: Option<PathBuf>,

    /// Write the merged road network as a single network JSON file.
    #[arg(long)]
    dump_network: Option<PathBuf>,

    /// Print diagnostics and result as JSON instead of a report.
    #[arg(long)]
    json: bool,
}

/// Tour strategy selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Strategy {
    /// MST + minimum-weight matching + Euler circuit (1.5x bound).
    Christofides,
    /// Greedy nearest unvisited stop.
    NearestNeighbor,
}

/// Maps a [`TourStrategy`] to the local CLI [`Strategy`] enum.
const fn strategy_from_core(s: TourStrategy) -> Strategy {
    match s {
        TourStrategy::Christofides => Strategy::Christofides,
        TourStrategy::NearestNeighbor => Strategy::NearestNeighbor,
    }
}

/// The CLI default strategy, derived from
/// [`SolveConfig::DEFAULT_TOUR_STRATEGY`] so the two cannot diverge.
const CLI_DEFAULT_STRATEGY: Strategy = strategy_from_core(SolveConfig::DEFAULT_TOUR_STRATEGY);

/// Errors surfaced by the binary.
#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("error parsing --config-json: {0}")]
    Config(serde_json::Error),

    #[error("failed to serialize output: {0}")]
    Serialize(serde_json::Error),

    #[error("{}: {source}", path.display())]
    Input { path: PathBuf, source: SolveError },

    #[error(transparent)]
    Solve(#[from] SolveError),
}

/// Build a [`SolveConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual parameter flags are ignored.
fn config_from_cli(cli: &Cli) -> Result<SolveConfig, CliError> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(CliError::Config);
    }

    Ok(SolveConfig {
        tour_strategy: match cli.strategy {
            Strategy::Christofides => TourStrategy::Christofides,
            Strategy::NearestNeighbor => TourStrategy::NearestNeighbor,
        },
        two_opt: !cli.no_two_opt,
        exact_matching_limit: cli.exact_matching_limit,
        required_points: if cli.all_vertices {
            RequiredPointPolicy::AllVertices
        } else {
            RequiredPointPolicy::Endpoints
        },
    })
}

fn read(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn write(path: &Path, contents: &str) -> Result<(), CliError> {
    std::fs::write(path, contents).map_err(|source| CliError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    eprintln!("Written {} ({} bytes)", path.display(), contents.len());
    Ok(())
}

/// Load and merge every network file.
fn load_network(paths: &[PathBuf]) -> Result<RoadNetwork, CliError> {
    let parts = paths
        .iter()
        .map(|path| {
            NetworkData::from_json(&read(path)?).map_err(|source| CliError::Input {
                path: path.clone(),
                source,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let network = RoadNetwork::compose(parts)?;
    tracing::info!(
        files = paths.len(),
        nodes = network.node_count(),
        edges = network.edge_count(),
        "road network loaded"
    );
    Ok(network)
}

/// Serialize a network in the same form [`load_network`] reads.
fn network_json(network: &RoadNetwork) -> Result<String, CliError> {
    serde_json::to_string_pretty(&network.to_data()).map_err(CliError::Serialize)
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let config = config_from_cli(cli)?;
    tracing::debug!(?config, "solve configuration");

    let network = load_network(&cli.networks)?;
    if let Some(ref dump_path) = cli.dump_network {
        write(dump_path, &network_json(&network)?)?;
    }

    let drawings = parse_drawings(&read(&cli.drawings)?).map_err(|source| CliError::Input {
        path: cli.drawings.clone(),
        source,
    })?;

    let (result, diagnostics) = solve_with_diagnostics(&network, &drawings, &config, &StdClock)?;
    let link = maps_link(&result.route.points);

    if cli.json {
        print_json(&result, &diagnostics, &link)?;
    } else {
        println!("{}", diagnostics.report());
        println!();
        println!("Total length: {:.2} m", result.route.total_length);
        println!("Directions: {link}");
    }

    let name = cli
        .drawings
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("streetwalk");
    let description = serde_json::to_string(&config).map_err(CliError::Serialize)?;

    if let Some(ref gpx_path) = cli.gpx {
        let metadata = GpxMetadata {
            name: Some(name),
            description: Some(&description),
        };
        write(gpx_path, &to_gpx(&result.route, &metadata))?;
    }

    if let Some(ref svg_path) = cli.svg {
        let marked: Vec<_> = drawings
            .iter()
            .filter_map(|d| d.as_marked_segment())
            .flatten()
            .copied()
            .collect();
        let metadata = SvgMetadata {
            title: Some(name),
            description: Some(&description),
        };
        write(svg_path, &to_svg(&result.route, &marked, &metadata))?;
    }

    Ok(())
}

fn print_json(
    result: &SolveResult,
    diagnostics: &SolveDiagnostics,
    link: &str,
) -> Result<(), CliError> {
    let output = serde_json::json!({
        "total_length": result.route.total_length,
        "maps_link": link,
        "result": result,
        "diagnostics": diagnostics,
    });
    let text = serde_json::to_string_pretty(&output).map_err(CliError::Serialize)?;
    println!("{text}");
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError::Solve(e @ SolveError::InsufficientInput { .. })) => {
            eprintln!("warning: {e}");
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["streetwalk", "--network", "a.json", "--drawings", "d.json"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn defaults_match_solve_config() {
        let config = config_from_cli(&parse(&[])).unwrap();
        assert_eq!(config, SolveConfig::default());
    }

    #[test]
    fn flags_override_defaults() {
        let config = config_from_cli(&parse(&[
            "--strategy",
            "nearest-neighbor",
            "--no-two-opt",
            "--all-vertices",
            "--exact-matching-limit",
            "4",
        ]))
        .unwrap();
        assert_eq!(config.tour_strategy, TourStrategy::NearestNeighbor);
        assert!(!config.two_opt);
        assert_eq!(config.exact_matching_limit, 4);
        assert_eq!(config.required_points, RequiredPointPolicy::AllVertices);
    }

    #[test]
    fn config_json_wins_over_flags() {
        let config = config_from_cli(&parse(&[
            "--no-two-opt",
            "--config-json",
            r#"{"tour_strategy": "NearestNeighbor"}"#,
        ]))
        .unwrap();
        assert_eq!(config.tour_strategy, TourStrategy::NearestNeighbor);
        assert!(config.two_opt);
    }

    #[test]
    fn bad_config_json_is_reported() {
        let err = config_from_cli(&parse(&["--config-json", "{"])).unwrap_err();
        assert!(err.to_string().starts_with("error parsing --config-json"));
    }

    #[test]
    fn several_networks_accepted() {
        let cli = Cli::try_parse_from([
            "streetwalk",
            "--network",
            "a.json",
            "--network",
            "b.json",
            "--drawings",
            "d.json",
        ])
        .unwrap();
        assert_eq!(cli.networks.len(), 2);
    }

    #[test]
    fn dump_network_flag_parses() {
        let cli = parse(&["--dump-network", "merged.json"]);
        assert_eq!(cli.dump_network, Some(PathBuf::from("merged.json")));
        assert_eq!(parse(&[]).dump_network, None);
    }

    #[test]
    fn dumped_network_reloads() {
        let part = r#"{"nodes": [{"id": 1, "lat": 0.0, "lon": 0.0}, {"id": 2, "lat": 0.0, "lon": 0.001}],
                       "edges": [{"from": 1, "to": 2}]}"#;
        let network = RoadNetwork::from_data(&NetworkData::from_json(part).unwrap()).unwrap();
        let json = network_json(&network).unwrap();
        let reloaded = RoadNetwork::from_data(&NetworkData::from_json(&json).unwrap()).unwrap();
        assert_eq!(reloaded.node_count(), 2);
        assert_eq!(reloaded.edge_count(), 1);
        assert!(json.contains("\"length\""));
    }

    #[test]
    fn network_is_required() {
        assert!(Cli::try_parse_from(["streetwalk", "--drawings", "d.json"]).is_err());
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = read(Path::new("/nonexistent/streetwalk.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/streetwalk.json"));
    }
}
