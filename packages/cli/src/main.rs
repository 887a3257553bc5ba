#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for the neighborhood map pipeline.
//!
//! ```text
//! dongne_map resolve "서울 중구 태평로1가 1" [--road "..."]
//! dongne_map place "시청역 1호선" "서울 중구 태평로1가 31" [--road "..."]
//! dongne_map location "롯데마트 부평점, 인천광역시 부평구 부개3동 12"
//! dongne_map cluster reports.json [--bounds n,s,e,w] [--near lat,lng --range small]
//! dongne_map replay events.jsonl [--reports reports.json]
//! dongne_map districts
//! ```
//!
//! Output is JSON on stdout. Set `RUST_LOG=debug` to trace resolution
//! tiers and coordinator decisions on stderr.

mod config;
mod replay;

use std::path::{Path, PathBuf};
use std::str::FromStr;

use clap::{Parser, Subcommand};
use dongne_map_cluster::{ReportClusterer, markers};
use dongne_map_neighborhood::address::parse_report_location;
use dongne_map_neighborhood::{NeighborhoodResolver, ResolveNeighborhood};
use dongne_map_report_models::{LatLng, ReportPoint};
use dongne_map_spatial::{NeighborhoodRange, ReportIndex, format_distance};
use dongne_map_viewport_models::ViewportBounds;
use serde::Serialize;
use serde_json::json;

use crate::config::Config;

#[derive(Parser)]
#[command(
    name = "dongne_map",
    about = "Resolve Korean addresses to neighborhoods and cluster reports for the map"
)]
struct Cli {
    /// Config file (defaults to ./dongne_map.toml when present)
    #[arg(long, global = true, env = "DONGNE_MAP_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve an address to its administrative neighborhood
    Resolve {
        /// Raw (lot-number) address
        raw: String,
        /// Road-name address
        #[arg(long)]
        road: Option<String>,
    },
    /// Choose the display name for a searched place
    Place {
        /// Place name from the geocoder
        place_name: String,
        /// Raw (lot-number) address of the place
        raw: String,
        /// Road-name address of the place
        #[arg(long)]
        road: Option<String>,
    },
    /// Split a stored report address into place name and short address
    Location {
        /// Stored address
        address: String,
    },
    /// Cluster a JSON array of reports
    Cluster {
        /// Reports file (JSON array)
        reports: PathBuf,
        /// Only cluster reports inside these bounds
        #[arg(long, value_parser = parse_bounds, allow_hyphen_values = true)]
        bounds: Option<ViewportBounds>,
        /// Only cluster reports near this point
        #[arg(long, value_parser = parse_lat_lng, allow_hyphen_values = true)]
        near: Option<LatLng>,
        /// How far --near reaches
        #[arg(long, default_value = "MEDIUM", value_parser = parse_range)]
        range: NeighborhoodRange,
        /// Cluster key to mark as selected
        #[arg(long)]
        selected: Option<String>,
    },
    /// Replay a JSON-lines viewport event log
    Replay {
        /// Event log (one JSON event per line)
        events: PathBuf,
        /// Locally cached reports to count per search
        #[arg(long)]
        reports: Option<PathBuf>,
    },
    /// List registered district tables
    Districts,
}

/// Parses `"north,south,east,west"`.
fn parse_bounds(value: &str) -> Result<ViewportBounds, String> {
    match parse_floats(value)?.as_slice() {
        &[north, south, east, west] => Ok(ViewportBounds::new(north, south, east, west)),
        _ => Err(format!("expected north,south,east,west, got {value:?}")),
    }
}

/// Parses `"lat,lng"`.
fn parse_lat_lng(value: &str) -> Result<LatLng, String> {
    match parse_floats(value)?.as_slice() {
        &[lat, lng] => Ok(LatLng::new(lat, lng)),
        _ => Err(format!("expected lat,lng, got {value:?}")),
    }
}

/// Parses a range name (`small`, `MEDIUM`, ...).
fn parse_range(value: &str) -> Result<NeighborhoodRange, String> {
    NeighborhoodRange::from_str(value).map_err(|e| format!("{e}: {value:?}"))
}

fn parse_floats(value: &str) -> Result<Vec<f64>, String> {
    value
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<f64>()
                .map_err(|e| format!("invalid number {part:?}: {e}"))
        })
        .collect()
}

fn read_reports(path: &Path) -> Result<Vec<ReportPoint>, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let reports: Vec<ReportPoint> = serde_json::from_str(&content)?;
    log::info!("Read {} reports from {}", reports.len(), path.display());
    Ok(reports)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref())?;
    let registry = config.district_registry()?;
    let resolver = NeighborhoodResolver::new(&registry)
        .with_place_name_max_chars(config.resolver.place_name_max_chars);

    match cli.command {
        Commands::Resolve { raw, road } => {
            print_json(&resolver.resolve(&raw, road.as_deref()))?;
        }
        Commands::Place {
            place_name,
            raw,
            road,
        } => {
            println!(
                "{}",
                resolver.best_display_name(&place_name, &raw, road.as_deref())
            );
        }
        Commands::Location { address } => {
            print_json(&parse_report_location(Some(address.as_str())))?;
        }
        Commands::Cluster {
            reports,
            bounds,
            near,
            range,
            selected,
        } => {
            let index = ReportIndex::new(read_reports(&reports)?);

            let mut candidates: Vec<ReportPoint> = match &bounds {
                Some(bounds) => index.within_bounds(bounds).into_iter().cloned().collect(),
                None => index.reports().to_vec(),
            };

            let mut nearby = Vec::new();
            let mut range_stats = None;
            if let Some(center) = near {
                let hits = index.within_range(center, range);
                let in_range: Vec<&str> = hits.iter().map(|h| h.report.id.as_str()).collect();
                candidates.retain(|r| in_range.contains(&r.id.as_str()));

                nearby = hits
                    .iter()
                    .map(|h| {
                        json!({
                            "id": h.report.id,
                            "distance": format_distance(h.distance_m),
                        })
                    })
                    .collect();
                range_stats = Some(index.range_stats(center, range));
                log::info!("{} reports within {}", hits.len(), range.description());
            }

            let clusters = ReportClusterer::new(resolver, config.cluster).cluster(&candidates);
            let markers = markers(&clusters, selected.as_deref());

            print_json(&json!({
                "clusters": clusters,
                "markers": markers,
                "nearby": nearby,
                "rangeStats": range_stats,
            }))?;
        }
        Commands::Replay { events, reports } => {
            let content = std::fs::read_to_string(&events)
                .map_err(|e| format!("Failed to read {}: {e}", events.display()))?;
            let events = replay::parse_events(&content)
                .map_err(|(line, e)| format!("{}:{line}: {e}", events.display()))?;

            let index = reports
                .as_deref()
                .map(read_reports)
                .transpose()?
                .map(ReportIndex::new);

            for step in replay::replay(events, config.viewport, index.as_ref()) {
                println!("{}", serde_json::to_string(&step)?);
            }
        }
        Commands::Districts => {
            let tables: Vec<_> = registry
                .tables()
                .iter()
                .map(|t| {
                    json!({
                        "id": t.id(),
                        "defaultDong": t.default_dong,
                        "legalDongs": t.legal_dongs.len(),
                        "landmarks": t.landmarks.len(),
                    })
                })
                .collect();
            print_json(&tables)?;
        }
    }

    Ok(())
}
