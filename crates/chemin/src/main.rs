//! Command-line entry point: run the optimal-route job against a JSON
//! store and emit the route plus its run report as JSON.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};

use chemin_engine::{JobConfig, JobEvent, OptimalRouteJob};
use chemin_store::JsonStore;

/// Compute the optimal collection route over the road network and write
/// the on-route flags back to the store.
#[derive(Parser)]
#[command(version)]
struct Args {
    /// Directory containing roads.json and collecting_points.json.
    #[arg(long, default_value = "data")]
    store: PathBuf,

    /// Compute everything but skip the flag write-back.
    #[arg(long)]
    dry_run: bool,

    /// Abort if the computation runs longer than this many seconds.
    #[arg(long, value_name = "SECS")]
    deadline_secs: Option<u64>,

    /// Decimal digits for spatial grid cells (3 is roughly 110 m).
    #[arg(long, default_value_t = chemin_engine::DEFAULT_CELL_PRECISION)]
    cell_precision: u8,

    /// Decimal digits for exact coordinate matching (6 is roughly 0.11 m).
    #[arg(long, default_value_t = chemin_engine::DEFAULT_MATCH_PRECISION)]
    match_precision: u8,

    /// Write the JSON outcome to this file instead of stdout.
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();
    let config = JobConfig {
        cell_precision: args.cell_precision,
        match_precision: args.match_precision,
        deadline: args.deadline_secs.map(Duration::from_secs),
        dry_run: args.dry_run,
    };

    info!(store = %args.store.display(), dry_run = config.dry_run, "starting route computation");
    let mut store = JsonStore::open(&args.store);
    let job = OptimalRouteJob::new(config);
    let outcome = job.run_with(&mut store, log_event)?;

    if outcome.report.is_clean() {
        info!(route_len = outcome.route.len(), "run completed");
    } else {
        warn!(
            route_len = outcome.route.len(),
            warnings = outcome.report.warning_count(),
            "run completed with warnings"
        );
    }

    let rendered = serde_json::to_string_pretty(&outcome)?;
    match args.report {
        Some(path) => std::fs::write(path, rendered)?,
        None => println!("{rendered}"),
    }
    Ok(())
}

fn log_event(event: JobEvent) {
    match event {
        JobEvent::Loaded { segments, waypoints } => {
            info!(segments, waypoints, "records loaded");
        }
        JobEvent::NetworkBuilt {
            vertices,
            edges,
            excluded,
        } => {
            info!(vertices, edges, excluded, "road network built");
        }
        JobEvent::PathsComputed {
            completed_sources,
            total_sources,
        } => {
            // One line every 50 sources keeps large runs readable.
            if completed_sources % 50 == 0 || completed_sources == total_sources {
                info!(completed_sources, total_sources, "pairwise shortest paths");
            }
        }
        JobEvent::TourBuilt { route_len, unreached } => {
            info!(route_len, unreached, "tour built");
        }
        JobEvent::Validated { violations } => {
            if violations > 0 {
                warn!(violations, "route contains non-adjacent consecutive pairs");
            } else {
                info!("route validated");
            }
        }
        JobEvent::FlagsWritten { marked } => {
            info!(marked, "on-route flags written");
        }
    }
}
