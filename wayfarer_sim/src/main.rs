//! Wayfarer Simulator CLI
//!
//! Plan trips, replay tours headlessly and run the playback scenarios.

use clap::{Parser, Subcommand};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, Level};
use tracing_subscriber::FmtSubscriber;

use wayfarer_core::itinerary::{Preferences, TravelMode};
use wayfarer_core::view::{Screen, TripSummary};
use wayfarer_core::{
    ConfigError, PlannerError, TransportCommand, TripPlanner, TripRequest, TripStore,
    WayfarerConfig,
};
use wayfarer_env::{MemoryStore, SledStore, StoreError, TokioContext};
use wayfarer_sim::runner::DEFAULT_JITTER;
use wayfarer_sim::{fixtures, ScenarioId, ScenarioResult, ScenarioRunner, SimContext, TourDriver};

/// Errors surfaced by the CLI.
#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Planner(#[from] PlannerError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No saved itinerary in {0} (run `plan` first or pass --demo)")]
    NoItinerary(String),

    #[error("Tour failed: {0}")]
    Tour(String),

    #[error("{0}")]
    Usage(String),
}

/// Wayfarer trip planner and headless tour simulator
#[derive(Parser, Debug)]
#[command(name = "wayfarer-sim")]
#[command(about = "Plan trips and replay their globe tours headlessly", long_about = None)]
struct Args {
    /// Master seed for frame jitter (0 = random from time)
    #[arg(short, long, default_value = "42", global = true)]
    seed: u64,

    /// JSON config file (playback and planner sections)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Plan a trip and save it as the latest itinerary
    Plan {
        /// Origin city
        #[arg(long)]
        from: String,

        /// Destination city
        #[arg(long)]
        to: String,

        /// Travel mode (flight, train, bus, car)
        #[arg(long, default_value = "flight")]
        mode: TravelMode,

        /// Number of days
        #[arg(long, default_value = "3")]
        days: u32,

        /// Free-text preferences, e.g. "budget: medium; must visit: Louvre"
        #[arg(long, default_value = "budget: medium; food: local")]
        prefs: String,

        /// Sled database path
        #[arg(long, default_value = "wayfarer.db")]
        store: PathBuf,
    },

    /// Play the latest itinerary (or the demo trip) headlessly
    Tour {
        /// Use the built-in Mumbai to Washington trip
        #[arg(long)]
        demo: bool,

        /// Sled database path
        #[arg(long, default_value = "wayfarer.db")]
        store: PathBuf,

        /// Relative host frame jitter
        #[arg(long, default_value_t = DEFAULT_JITTER)]
        jitter: f64,

        /// Export recorded frames to a JSON file
        #[arg(long)]
        export: Option<String>,
    },

    /// Toggle a day of the latest itinerary as completed
    Progress {
        /// 1-based day to toggle
        #[arg(long)]
        day: u32,

        /// Sled database path
        #[arg(long, default_value = "wayfarer.db")]
        store: PathBuf,
    },

    /// Run playback and planning scenarios
    Scenarios {
        /// Scenario to run (full_tour, step_through, ..., all)
        #[arg(short = 'S', long, default_value = "all")]
        scenario: String,

        /// Number of consecutive seeds to test (for CI mode)
        #[arg(long, default_value = "1")]
        seeds: usize,

        /// JSON output for CI parsing
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    let quiet = matches!(args.command, Command::Scenarios { json: true, .. });
    if !quiet {
        info!("Wayfarer Simulator v{}", env!("CARGO_PKG_VERSION"));
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    }

    let config = match &args.config {
        Some(path) => match WayfarerConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                error!("✗ {}", e);
                std::process::exit(1);
            }
        },
        None => WayfarerConfig::default(),
    };

    // Determine base seed
    let seed = if args.seed == 0 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(42)
    } else {
        args.seed
    };

    let result = match args.command {
        Command::Plan {
            from,
            to,
            mode,
            days,
            prefs,
            store,
        } => run_plan(&config, from, to, mode, days, &prefs, store),
        Command::Tour {
            demo,
            store,
            jitter,
            export,
        } => run_tour(&config, seed, demo, store, jitter, export),
        Command::Progress { day, store } => run_progress(day, store),
        Command::Scenarios {
            scenario,
            seeds,
            json,
        } => run_scenarios(&config, seed, &scenario, seeds, json),
    };

    if let Err(e) = result {
        error!("✗ {}", e);
        std::process::exit(1);
    }
}

fn run_plan(
    config: &WayfarerConfig,
    from: String,
    to: String,
    mode: TravelMode,
    days: u32,
    prefs: &str,
    store: PathBuf,
) -> Result<(), CliError> {
    let request = TripRequest::new(from, to, mode, days)
        .with_preferences(Preferences::parse_free_text(prefs));
    request.validate().map_err(PlannerError::from)?;

    let planner_config = config.planner.clone().with_env();
    let runtime = tokio::runtime::Runtime::new()?;

    let planner = TripPlanner::new(TokioContext::shared(), &planner_config)?;
    info!(
        "Planning {} days {} -> {} by {} via {}",
        request.days,
        request.origin,
        request.destination,
        request.mode,
        planner.primary_name()
    );
    let outcome = runtime.block_on(planner.plan(&request))?;

    if let Some(reason) = &outcome.fallback_reason {
        info!("Used the offline itinerary ({})", reason);
    }

    let trips = TripStore::new(SledStore::open(&store)?);
    trips.save_latest(&outcome.itinerary)?;
    info!(
        "✓ Saved {} ({} days) to {}",
        outcome.itinerary.id.as_deref().unwrap_or("itinerary"),
        outcome.itinerary.day_plans.len(),
        store.display()
    );

    println!("{}", serde_json::to_string_pretty(&outcome.itinerary)?);
    Ok(())
}

fn run_tour(
    config: &WayfarerConfig,
    seed: u64,
    demo: bool,
    store: PathBuf,
    jitter: f64,
    export: Option<String>,
) -> Result<(), CliError> {
    let (saved, completed) = if demo {
        (Some(fixtures::demo_itinerary()), BTreeSet::new())
    } else {
        let trips = TripStore::new(SledStore::open(&store)?);
        let saved = trips.load_latest();
        let completed = saved
            .as_ref()
            .map(|itinerary| trips.completed_days(&TripStore::<SledStore>::progress_key_for(itinerary)))
            .unwrap_or_default();
        (saved, completed)
    };

    let itinerary = match Screen::resolve(saved.map(Arc::new)) {
        Screen::Form => {
            info!("No saved itinerary in {}", store.display());
            info!("Start by planning one: wayfarer-sim plan --from <city> --to <city> [--days N]");
            return Ok(());
        }
        Screen::Tour(itinerary) => itinerary,
    };

    let summary = TripSummary::new(&itinerary, &completed);
    info!(
        "{}: {} days by {}, est. {} ({}/{} days done)",
        summary.title,
        summary.days,
        summary.mode,
        summary.estimated_total_label,
        summary.completed,
        summary.days
    );
    let title = summary.title;

    let ctx = SimContext::new(seed);
    let mut driver = TourDriver::new(
        itinerary,
        &config.playback,
        Arc::new(MemoryStore::new()),
        ctx.rng(0),
        jitter,
    );
    if export.is_some() {
        driver = driver.with_export(&title, seed);
    }

    let stops = driver.session().route().len();
    info!("Touring \"{}\" ({} stops, seed={})", title, stops, seed);
    for waypoint in driver.session().route().waypoints() {
        debug!(
            "  {} at ({:.3}, {:.3})",
            waypoint.name, waypoint.geo.lat, waypoint.geo.lng
        );
    }

    let runner = ScenarioRunner::new(seed).with_config(config.playback.clone());
    let outcome = if stops < 2 {
        // A single stop dwells forever; show it briefly and stop
        driver.submit(TransportCommand::Play);
        driver.run_for(5.0)
    } else {
        runner.play_through(&mut driver).map(|_| ())
    };
    let passed = outcome.is_ok();

    for banner in driver.recorder().banners().into_iter().flatten() {
        debug!("  {}", banner);
    }

    let (stats, recording) = driver.finish(passed);
    if let (Some(path), Some(recording)) = (&export, recording) {
        recording.write_to_file(path)?;
        info!("Exported {} frames to {}", recording.frames.len(), path);
    }

    outcome.map_err(CliError::Tour)?;
    info!(
        "✓ Tour finished: {} frames, {:.1}s, {} stops, {} traveling frames",
        stats.frames, stats.time_secs, stats.metrics.stops_visited, stats.metrics.traveling_frames
    );
    Ok(())
}

fn run_progress(day: u32, store: PathBuf) -> Result<(), CliError> {
    let trips = TripStore::new(SledStore::open(&store)?);
    let itinerary = trips
        .load_latest()
        .ok_or_else(|| CliError::NoItinerary(store.display().to_string()))?;
    if itinerary.day(day).is_none() {
        return Err(CliError::Usage(format!(
            "Day {} is not part of this {}-day trip",
            day,
            itinerary.day_plans.len()
        )));
    }

    let key = TripStore::<SledStore>::progress_key_for(&itinerary);
    let done = trips.toggle_day(&key, day)?;
    let completed = trips.completed_days(&key);
    info!(
        "✓ Day {} marked {} ({}/{} complete)",
        day,
        if done { "complete" } else { "incomplete" },
        completed.len(),
        itinerary.day_plans.len()
    );
    println!("{}", serde_json::to_string(&completed)?);
    Ok(())
}

fn run_scenarios(
    config: &WayfarerConfig,
    base_seed: u64,
    scenario: &str,
    seeds: usize,
    json: bool,
) -> Result<(), CliError> {
    let scenarios: Vec<ScenarioId> = if scenario == "all" {
        ScenarioId::all()
    } else {
        vec![scenario.parse().map_err(|e: String| {
            let names: Vec<&str> = ScenarioId::all().iter().map(|s| s.name()).collect();
            CliError::Usage(format!("{} (available: {}, all)", e, names.join(", ")))
        })?]
    };

    // Track results
    let mut all_results: Vec<ScenarioResult> = Vec::new();
    let mut failed_count = 0;

    for seed_offset in 0..seeds.max(1) {
        let seed = base_seed.wrapping_add(seed_offset as u64);
        let runner = ScenarioRunner::new(seed).with_config(config.playback.clone());

        for scenario in &scenarios {
            debug!("{}: {}", scenario.name(), scenario.description());
            let result = runner.run(*scenario);

            if !json {
                if result.passed {
                    info!("✓ {} (seed={}) PASSED", scenario.name(), seed);
                } else {
                    error!(
                        "✗ {} (seed={}) FAILED: {}",
                        scenario.name(),
                        seed,
                        result.failure_reason.as_deref().unwrap_or("unknown")
                    );
                }
            }

            if !result.passed {
                failed_count += 1;
            }
            all_results.push(result);
        }
    }

    // Summary
    let total = all_results.len();
    let passed = total - failed_count;

    if json {
        let summary = serde_json::json!({
            "total": total,
            "passed": passed,
            "failed": failed_count,
            "results": all_results.iter().map(|r| {
                serde_json::json!({
                    "scenario": r.scenario.name(),
                    "planning": r.scenario.is_planning(),
                    "seed": r.seed,
                    "passed": r.passed,
                    "frames": r.total_frames,
                    "time_secs": r.final_time_secs,
                    "stops_visited": r.metrics.stops_visited,
                    "failure_reason": r.failure_reason,
                })
            }).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        info!("");
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        if failed_count == 0 {
            info!("✅ All {} scenario runs passed!", total);
        } else {
            error!("❌ {}/{} scenario runs failed!", failed_count, total);
            for result in all_results.iter().filter(|r| !r.passed) {
                error!(
                    "  - {} seed={}: {}",
                    result.scenario.name(),
                    result.seed,
                    result.failure_reason.as_deref().unwrap_or("unknown")
                );
            }
        }
    }

    if failed_count > 0 {
        std::process::exit(1);
    }
    Ok(())
}
