//! Command-line driver: cluster extraction and filtering over JSON run files.
#![allow(
    clippy::uninlined_format_args,
    clippy::cast_possible_truncation,
    clippy::too_many_lines
)]

use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use telepix_algorithms::{
    process_events, ClusteringTotals, EventProcessor, ProcessorConfig, SparseAlgorithm,
    SparseConfig, WindowConfig,
};
use telepix_core::{Event, PixelStatus, PlaneGeometry, PulseRecord, Telescope};
use telepix_filter::{ClusterFilter, FilterConfig, FilterOutcome};
use thiserror::Error;

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Processing error: {0}")]
    Core(#[from] telepix_core::Error),

    #[error("event {event}: {source}")]
    Event {
        event: u64,
        source: telepix_core::Error,
    },

    #[error("plane {plane}: bad pixel ({x}, {y}) outside the plane bounds")]
    BadPixelOutOfBounds { plane: usize, x: i32, y: i32 },
}

/// Engine selection for zero-suppressed frames.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Algorithm {
    /// Scatter into a dense matrix and grow fixed windows
    FixedWindow,
    /// Connected components, enumeration pixel order
    NeighborGraph,
    /// Connected components, coordinate-sorted order with capped sizes
    NeighborGraphSorted,
}

impl From<Algorithm> for SparseAlgorithm {
    fn from(algorithm: Algorithm) -> Self {
        match algorithm {
            Algorithm::FixedWindow => Self::FixedWindow,
            Algorithm::NeighborGraph => Self::NeighborGraph,
            Algorithm::NeighborGraphSorted => Self::NeighborGraphSorted,
        }
    }
}

/// Multi-plane pixel telescope cluster extraction and filtering.
#[derive(Parser)]
#[command(name = "telepix")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Cluster a run file and write the accepted pulse records
    Process {
        /// Input run file (JSON)
        input: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Engine for zero-suppressed frames
        #[arg(short, long, value_enum, default_value = "neighbor-graph")]
        algorithm: Algorithm,

        /// Fixed window width (odd)
        #[arg(long, default_value = "5")]
        x_size: i32,

        /// Fixed window height (odd)
        #[arg(long, default_value = "5")]
        y_size: i32,

        /// Seed significance threshold
        #[arg(long, default_value = "4.5")]
        seed_cut: f32,

        /// Cluster significance threshold
        #[arg(long, default_value = "3.0")]
        cluster_cut: f32,

        /// Adjacency distance for connected components (0 = touching)
        #[arg(long, default_value = "0.0")]
        min_distance: f32,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show information about a run file
    Info {
        /// Input run file (JSON)
        input: PathBuf,
    },
}

/// One plane of the run file: bounds plus optional calibration.
#[derive(Debug, Deserialize)]
struct PlaneSpec {
    min_x: i32,
    max_x: i32,
    min_y: i32,
    max_y: i32,
    #[serde(default)]
    noise: Option<Vec<f32>>,
    #[serde(default)]
    bad_pixels: Vec<(i32, i32)>,
}

/// The run file: plane calibration, events and filter settings.
#[derive(Debug, Deserialize)]
struct RunFile {
    planes: Vec<PlaneSpec>,
    events: Vec<Event>,
    #[serde(default)]
    filter: FilterConfig,
}

/// Accepted clusters of one event, as written to the output file.
#[derive(Debug, Serialize)]
struct EventOutput {
    event_id: u64,
    clusters: Vec<PulseRecord>,
}

fn load_run(path: &Path) -> Result<RunFile> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

fn build_telescope(planes: &[PlaneSpec]) -> Result<Telescope> {
    let mut geometries = Vec::with_capacity(planes.len());
    for spec in planes {
        geometries.push(PlaneGeometry::new(
            spec.min_x, spec.max_x, spec.min_y, spec.max_y,
        )?);
    }

    let mut telescope = Telescope::new(geometries);
    for (plane, spec) in planes.iter().enumerate() {
        if let Some(noise) = &spec.noise {
            telescope.set_noise(plane, noise.clone())?;
        }
        if !spec.bad_pixels.is_empty() {
            let geometry = *telescope.geometry(plane)?;
            let mut status = vec![PixelStatus::Good; geometry.pixel_count()];
            for (x, y) in &spec.bad_pixels {
                if !geometry.contains(*x, *y) {
                    return Err(CliError::BadPixelOutOfBounds {
                        plane,
                        x: *x,
                        y: *y,
                    });
                }
                status[geometry.index_of(*x, *y)] = PixelStatus::Bad;
            }
            telescope.set_status(plane, status)?;
        }
    }
    Ok(telescope)
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Process {
            input,
            output,
            algorithm,
            x_size,
            y_size,
            seed_cut,
            cluster_cut,
            min_distance,
            verbose,
        } => {
            let run = load_run(&input)?;
            let telescope = build_telescope(&run.planes)?;

            if verbose {
                eprintln!("Run file: {}", input.display());
                eprintln!("Planes: {}", telescope.plane_count());
                eprintln!("Events: {}", run.events.len());
                eprintln!("Algorithm: {:?}", algorithm);
            }

            let config = ProcessorConfig {
                window: WindowConfig {
                    x_size,
                    y_size,
                    seed_cut,
                    cluster_cut,
                    ..WindowConfig::default()
                },
                sparse: SparseConfig {
                    seed_cut,
                    cluster_cut,
                    min_distance,
                    ..SparseConfig::default()
                },
                sparse_algorithm: algorithm.into(),
            };
            let processor = EventProcessor::new(config)?;
            let mut filter = ClusterFilter::new(run.filter, telescope.plane_count());

            let start = Instant::now();
            let mut totals = ClusteringTotals::new(telescope.plane_count());
            let results = process_events(&processor, &telescope, &run.events, &mut totals);

            let mut outputs = Vec::new();
            let mut skipped = 0usize;
            let mut filtered_out = 0usize;
            for (event, result) in run.events.iter().zip(results) {
                let found = match result {
                    Ok(found) => found,
                    Err(source) => {
                        // Surface the event id alongside the failure.
                        return Err(CliError::Event {
                            event: event.id,
                            source,
                        });
                    }
                };
                if found.skipped {
                    skipped += 1;
                    continue;
                }
                match filter.filter_event(&found.clusters) {
                    FilterOutcome::Accepted(accepted) => outputs.push(EventOutput {
                        event_id: found.event_id,
                        clusters: accepted.into_iter().map(|(_, record)| record).collect(),
                    }),
                    FilterOutcome::Empty => filtered_out += 1,
                }
            }
            let elapsed = start.elapsed();

            fs::write(&output, serde_json::to_string_pretty(&outputs)?)?;
            info!("wrote {} events to {}", outputs.len(), output.display());

            println!(
                "Processed {} events in {:.2}s",
                run.events.len(),
                elapsed.as_secs_f64()
            );
            println!("Events with accepted clusters: {}", outputs.len());
            println!("Events skipped (no readout): {}", skipped);
            println!("Events emptied by the filter: {}", filtered_out);
            print!("{}", totals.report());
            print!("{}", filter.summary());
        }

        Commands::Info { input } => {
            let run = load_run(&input)?;

            println!("File: {}", input.display());
            println!("Planes: {}", run.planes.len());
            for (plane, spec) in run.planes.iter().enumerate() {
                let geometry =
                    PlaneGeometry::new(spec.min_x, spec.max_x, spec.min_y, spec.max_y)?;
                println!(
                    "  plane {}: {}x{} pixels, x [{}, {}], y [{}, {}], {} bad",
                    plane,
                    geometry.width(),
                    geometry.height(),
                    spec.min_x,
                    spec.max_x,
                    spec.min_y,
                    spec.max_y,
                    spec.bad_pixels.len()
                );
            }

            println!("Events: {}", run.events.len());
            let empty = run.events.iter().filter(|e| e.is_empty()).count();
            if empty > 0 {
                println!("Events without readout: {}", empty);
            }
            let dense = run
                .events
                .iter()
                .flat_map(|e| &e.planes)
                .filter(|f| f.dense.is_some())
                .count();
            let sparse = run
                .events
                .iter()
                .flat_map(|e| &e.planes)
                .filter(|f| f.sparse.is_some())
                .count();
            println!("Dense frames: {}", dense);
            println!("Sparse frames: {}", sparse);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    const RUN: &str = r#"{
        "planes": [
            {"min_x": 0, "max_x": 9, "min_y": 0, "max_y": 9,
             "bad_pixels": [[3, 3]]}
        ],
        "events": [
            {"id": 0, "planes": [
                {"plane": 0, "dense": null,
                 "sparse": {"encoding_tag": 1,
                            "pixels": [{"x": 5, "y": 5, "charge": 40.0}]}}
            ]}
        ],
        "filter": {"min_total_charge": [10.0]}
    }"#;

    #[test]
    fn test_run_file_parses() {
        let run: RunFile = serde_json::from_str(RUN).unwrap();
        assert_eq!(run.planes.len(), 1);
        assert_eq!(run.events.len(), 1);
        assert!(run.filter.min_total_charge_requested());
    }

    #[test]
    fn test_build_telescope_applies_calibration() {
        let run: RunFile = serde_json::from_str(RUN).unwrap();
        let telescope = build_telescope(&run.planes).unwrap();
        let geometry = *telescope.geometry(0).unwrap();
        let status = telescope.status(0).unwrap();
        assert_eq!(status[geometry.index_of(3, 3)], PixelStatus::Bad);
        assert_eq!(status[geometry.index_of(5, 5)], PixelStatus::Good);
    }

    #[test]
    fn test_bad_pixel_outside_bounds_is_error() {
        let planes = vec![PlaneSpec {
            min_x: 0,
            max_x: 9,
            min_y: 0,
            max_y: 9,
            noise: None,
            bad_pixels: vec![(12, 0)],
        }];
        assert!(matches!(
            build_telescope(&planes),
            Err(CliError::BadPixelOutOfBounds { x: 12, y: 0, .. })
        ));
    }

    #[test]
    fn test_load_run_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(RUN.as_bytes()).unwrap();
        let run = load_run(file.path()).unwrap();
        assert_eq!(run.events[0].id, 0);
    }
}
