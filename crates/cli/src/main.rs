//! Wellsite CLI - Well screening against protected-area buffers

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use wellsite_algorithms::buffer::BufferParams;
use wellsite_algorithms::filter::{BoundaryRule, FilterParams};
use wellsite_algorithms::pipeline::{run_analysis, PipelineParams};
use wellsite_core::io::{read_shapefile, read_well_table};
use wellsite_core::{GeoPoint, MapPoint, PolygonLayer, WellSet};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "wellsite")]
#[command(author, version, about = "Well screening against protected-area buffers", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Screen candidate wells against buffered protection layers
    Analyze {
        /// Protection layer shapefile (repeat for each layer)
        #[arg(short, long = "layer", required = true)]
        layer: Vec<PathBuf>,
        /// Candidate well table (tab-separated EOV coordinates)
        #[arg(short, long)]
        wells: PathBuf,
        /// Reference well table, shown on the map but never filtered
        #[arg(short, long)]
        reference: Option<PathBuf>,
        /// Protection distance in metres
        #[arg(short, long, default_value = "50.0")]
        distance: f64,
        /// Number of segments approximating buffer discs
        #[arg(short, long, default_value = "16")]
        segments: usize,
        /// Boundary rule: intersects (exclude wells exactly on the
        /// boundary) or contains (retain them)
        #[arg(short, long, default_value = "intersects")]
        boundary: String,
        /// Output CSV file
        #[arg(short, long)]
        output: PathBuf,
        /// Optional map handoff JSON file
        #[arg(short, long)]
        map_json: Option<PathBuf>,
    },
    /// Show information about a protection layer shapefile
    Info {
        /// Input shapefile
        input: PathBuf,
    },
}

/// Map handoff written when `--map-json` is given
#[derive(Serialize)]
struct MapHandoff<'a> {
    center: Option<GeoPoint>,
    points: &'a [MapPoint],
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn done(name: &str, path: &PathBuf, elapsed: std::time::Duration) {
    println!("{} saved to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

fn parse_boundary(s: &str) -> BoundaryRule {
    match s.to_lowercase().as_str() {
        "intersects" | "i" => BoundaryRule::Intersects,
        "contains" | "c" => BoundaryRule::Contains,
        _ => {
            eprintln!("Unknown boundary rule: {}. Using intersects.", s);
            BoundaryRule::Intersects
        }
    }
}

fn read_layers(paths: &[PathBuf]) -> Result<Vec<PolygonLayer>> {
    let pb = spinner("Reading protection layers...");
    let mut layers = Vec::with_capacity(paths.len());
    for path in paths {
        let layer = read_shapefile(path)
            .with_context(|| format!("Failed to read layer {}", path.display()))?;
        info!("Layer {}: {} polygons", layer.name(), layer.len());
        layers.push(layer);
    }
    pb.finish_and_clear();
    Ok(layers)
}

fn read_wells(path: &PathBuf, what: &str) -> Result<WellSet> {
    let pb = spinner(&format!("Reading {what} wells..."));
    let set = read_well_table(path)
        .with_context(|| format!("Failed to read {what} wells from {}", path.display()))?;
    pb.finish_and_clear();
    info!("{}: {} wells", set.name(), set.len());
    Ok(set)
}

// ─── Entry point ────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        // ── Analyze ──────────────────────────────────────────────────
        Commands::Analyze {
            layer,
            wells,
            reference,
            distance,
            segments,
            boundary,
            output,
            map_json,
        } => {
            let boundary = parse_boundary(&boundary);
            let layers = read_layers(&layer)?;
            let candidates = read_wells(&wells, "candidate")?;
            let reference_set = match &reference {
                Some(path) => Some(read_wells(path, "reference")?),
                None => None,
            };

            let params = PipelineParams {
                buffer: BufferParams { distance, segments },
                filter: FilterParams { boundary },
            };

            let pb = spinner("Screening candidates...");
            let start = Instant::now();
            let analysis = run_analysis(&layers, &candidates, reference_set.as_ref(), &params)
                .context("Screening failed")?;
            let elapsed = start.elapsed();
            pb.finish_and_clear();

            std::fs::write(&output, analysis.report.to_csv())
                .with_context(|| format!("Failed to write {}", output.display()))?;

            if let Some(path) = &map_json {
                let handoff = MapHandoff {
                    center: analysis.report.map_center(),
                    points: analysis.report.map_points(),
                };
                let json = serde_json::to_string_pretty(&handoff)
                    .context("Failed to encode map handoff")?;
                std::fs::write(path, json)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
            }

            let stats = &analysis.stats;
            println!(
                "Screened {} candidates against {} layers ({} buffered features)",
                stats.candidate_count, stats.layer_count, stats.feature_count
            );
            println!(
                "  Retained: {}   Excluded: {}   Distance: {} m",
                stats.retained_count, stats.excluded_count, distance
            );
            if analysis.report.is_empty() {
                warn!("No wells remain after filtering. Adjust the buffer distance or check your data.");
            }
            done("Result table", &output, elapsed);
            if let Some(path) = &map_json {
                println!("Map handoff saved to: {}", path.display());
            }
        }

        // ── Info ─────────────────────────────────────────────────────
        Commands::Info { input } => {
            let pb = spinner("Reading layer...");
            let layer = read_shapefile(&input)
                .with_context(|| format!("Failed to read layer {}", input.display()))?;
            pb.finish_and_clear();

            let ring_count: usize = layer
                .iter()
                .map(|p| 1 + p.interiors().len())
                .sum();
            let vertex_count: usize = layer
                .iter()
                .map(|p| {
                    p.exterior().0.len()
                        + p.interiors().iter().map(|r| r.0.len()).sum::<usize>()
                })
                .sum();

            println!("File: {}", input.display());
            println!("Layer: {}", layer.name());
            println!(
                "Polygons: {} ({} rings, {} vertices)",
                layer.len(),
                ring_count,
                vertex_count
            );
            println!("CRS: {}", layer.crs());
            if let Some(bounds) = layer.bounds() {
                println!(
                    "Bounds: ({:.2}, {:.2}) - ({:.2}, {:.2})",
                    bounds.min_x, bounds.min_y, bounds.max_x, bounds.max_y
                );
                println!(
                    "Extent: {:.2} m x {:.2} m",
                    bounds.width(),
                    bounds.height()
                );
            }
        }
    }

    Ok(())
}
