//!
//! Command-line front end for tagging neutron-capture candidates in
//! JSON event files.
#![allow(
    clippy::uninlined_format_args,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::too_many_lines
)]

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use neucap_algorithms::{process_events, EventInput, EventResult, PeakSearchConfig, TagConfig};
use neucap_core::StaticGeometry;

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
    Core(#[from] neucap_core::Error),
}

/// One input file: a sensor position table plus the events recorded
/// against it. Positions are indexed by sensor id, in cm.
#[derive(Debug, Deserialize)]
struct InputDocument {
    geometry: Vec<[f32; 3]>,
    events: Vec<EventInput>,
}

#[derive(Debug, Serialize)]
struct OutputDocument {
    events: Vec<EventResult>,
}

/// Neutron-capture candidate tagger.
#[derive(Parser)]
#[command(name = "neucap")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Tag capture candidates in a JSON event file
    Tag {
        /// Input JSON file (geometry + events)
        input: PathBuf,

        /// Output JSON file for tagged candidates
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Minimum cluster-window multiplicity for a candidate
        #[arg(long, default_value = "7")]
        n_low: usize,

        /// Maximum cluster-window multiplicity for a candidate
        #[arg(long, default_value = "50")]
        n_high: usize,

        /// Wide-window multiplicity above which an anchor is dropped
        #[arg(long, default_value = "200")]
        n_wide_max: usize,

        /// Earliest accepted corrected hit time (nanoseconds)
        #[arg(long, default_value = "5.0")]
        t0_min: f32,

        /// Latest accepted corrected hit time (nanoseconds)
        #[arg(long, default_value = "535.0")]
        t0_max: f32,

        /// Minimum separation between emitted anchors (nanoseconds)
        #[arg(long, default_value = "50.0")]
        min_separation: f32,

        /// Truth match half-window (nanoseconds)
        #[arg(long, default_value = "40.0")]
        t_match_window: f32,

        /// Print a per-candidate table for each event
        #[arg(short, long)]
        dump: bool,
    },

    /// Show information about a JSON event file
    Info {
        /// Input JSON file
        input: PathBuf,
    },
}

fn read_input(path: &Path) -> Result<InputDocument> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

/// One row per candidate, in the style of an event display dump.
fn dump_event(index: usize, result: &EventResult) {
    println!("Event {}: {} candidate(s)", index, result.candidates.len());
    if result.candidates.is_empty() {
        return;
    }
    println!(
        "{:<6} | {:>10} | {:>5} | {:>5} | {:>8} | {:>8} | {:>5}",
        "ID", "Time (ns)", "N10", "N200", "Trms", "Qsum", "Type"
    );
    for candidate in &result.candidates {
        let f = &candidate.features;
        println!(
            "{:<6} | {:>10.1} | {:>5} | {:>5} | {:>8.2} | {:>8.1} | {:>5}",
            candidate.id,
            f.float("recon_ct").unwrap_or(f32::NAN),
            f.int("n10").unwrap_or(0),
            f.int("n200").unwrap_or(0),
            f.float("trms").unwrap_or(f32::NAN),
            f.float("qsum").unwrap_or(f32::NAN),
            f.int("capture_type").unwrap_or(0),
        );
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Tag {
            input,
            output,
            n_low,
            n_high,
            n_wide_max,
            t0_min,
            t0_max,
            min_separation,
            t_match_window,
            dump,
        } => {
            let document = read_input(&input)?;
            let geometry = StaticGeometry::new(document.geometry)?;

            let config = TagConfig {
                peak: PeakSearchConfig::default()
                    .with_multiplicity_bounds(n_low, n_high)
                    .with_wide_max(n_wide_max)
                    .with_time_range(t0_min, t0_max)
                    .with_min_peak_separation(min_separation),
                t_match_window,
            };

            log::info!(
                "tagging {} event(s) from {}",
                document.events.len(),
                input.display()
            );

            let start = Instant::now();
            let results = process_events(&geometry, &config, &document.events);
            let elapsed = start.elapsed();

            let mut tagged = Vec::with_capacity(results.len());
            let mut total_candidates = 0usize;
            for (index, result) in results.into_iter().enumerate() {
                let result = result?;
                total_candidates += result.candidates.len();
                if dump {
                    dump_event(index, &result);
                }
                tagged.push(result);
            }

            println!(
                "Tagged {} event(s) in {:.2}s",
                tagged.len(),
                elapsed.as_secs_f64()
            );
            println!("Total candidates: {}", total_candidates);

            if let Some(path) = output {
                let file = File::create(&path)?;
                serde_json::to_writer(file, &OutputDocument { events: tagged })?;
                println!("Wrote candidates to: {}", path.display());
            }
        }

        Commands::Info { input } => {
            let document = read_input(&input)?;

            println!("File: {}", input.display());
            println!("Sensors: {}", document.geometry.len());
            println!("Events: {}", document.events.len());

            let total_hits: usize = document.events.iter().map(|e| e.hits.len()).sum();
            println!("Hits: {}", total_hits);

            let with_truth = document
                .events
                .iter()
                .filter(|e| e.truth.is_some())
                .count();
            if with_truth > 0 {
                println!("Events with truth: {}", with_truth);
            }

            if let Some(event) = document.events.iter().find(|e| !e.hits.is_empty()) {
                let min_t = event.hits.times.iter().copied().fold(f32::INFINITY, f32::min);
                let max_t = event
                    .hits
                    .times
                    .iter()
                    .copied()
                    .fold(f32::NEG_INFINITY, f32::max);
                println!("First non-empty event time range: {} - {} ns", min_t, max_t);
            }
        }
    }

    Ok(())
}
