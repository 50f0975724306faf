#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the civic-watch analysis engine.
//!
//! Generates mock corpora and runs filter, viewport, stats, and pattern
//! queries against a corpus (generated or loaded from JSON), printing the
//! results as JSON.

use std::path::PathBuf;
use std::sync::Arc;

use civic_watch_analysis::clock::{Clock, SystemClock};
use civic_watch_analysis::config;
use civic_watch_analysis_models::{
    ClusterSize, EngineConfig, FilterState, Lens, Stats, TimeWindow, Viewport,
};
use civic_watch_corpus::GeneratorOptions;
use civic_watch_observation_models::Observation;
use civic_watch_session::Session;
use civic_watch_session::mode::{MapView, PatternMode};
use civic_watch_spatial::{GeoBounds, bounding_box};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;

/// Zoom used when no viewport is given.
const DEFAULT_ZOOM: u8 = 12;

#[derive(Parser)]
#[command(name = "civic_watch", about = "Observation map analysis engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a deterministic mock corpus as JSON
    Generate {
        /// PRNG seed
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Number of observations
        #[arg(long, default_value_t = 500)]
        count: usize,
        /// Number of dense hotspots to plant
        #[arg(long, default_value_t = 4)]
        hotspots: usize,
        /// Oldest observation age in days
        #[arg(long, default_value_t = 45)]
        max_age_days: u32,
        /// Write to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Aggregate stats over the filtered (and optionally viewport-clipped) set
    Stats {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        filter: FilterArgs,
        /// Viewport as `west,south,east,north`
        #[arg(long)]
        bbox: Option<String>,
        /// Viewport zoom level
        #[arg(long, default_value_t = DEFAULT_ZOOM)]
        zoom: u8,
    },
    /// Run a city-wide or local pattern analysis around a reference observation
    Pattern {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        filter: FilterArgs,
        /// Analysis mode
        #[arg(long, value_enum, default_value_t = PatternKind::CityWide)]
        mode: PatternKind,
        /// Reference observation id (defaults to the first filtered observation)
        #[arg(long)]
        reference: Option<String>,
    },
}

/// Where the corpus and engine config come from.
#[derive(Args)]
struct SourceArgs {
    /// JSON corpus file; a mock corpus is generated when omitted
    #[arg(long)]
    corpus: Option<PathBuf>,
    /// Seed for the generated corpus
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Size of the generated corpus
    #[arg(long, default_value_t = 500)]
    count: usize,
    /// Engine config TOML overriding the built-in policy
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Lens and time window.
#[derive(Args)]
struct FilterArgs {
    /// Type lens: `all`, `violation`, `risk`, or `infrastructure`
    #[arg(long, default_value = "all")]
    lens: Lens,
    /// Time window: `24h`, `7d`, `30d`, or `persistent`
    #[arg(long, default_value = "30d")]
    window: TimeWindow,
}

impl FilterArgs {
    const fn state(&self) -> FilterState {
        FilterState {
            lens: self.lens,
            window: self.window,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum PatternKind {
    /// Every same-type observation in the filtered set
    CityWide,
    /// Same-type observations within the configured radius
    Local,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatsReport {
    filter: FilterState,
    filtered_count: usize,
    viewport: Option<Viewport>,
    stats: Stats,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PatternReport<'a> {
    filter: FilterState,
    pattern: &'a PatternMode,
    cluster: Option<ClusterSize>,
    view: MapView,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    match cli.command {
        Commands::Generate {
            seed,
            count,
            hotspots,
            max_age_days,
            out,
        } => {
            let options = GeneratorOptions {
                seed,
                count,
                hotspots,
                max_age_days,
                ..GeneratorOptions::default()
            };
            let corpus = civic_watch_corpus::generate(&options, clock.now_millis());
            let json = serde_json::to_string_pretty(&corpus)?;

            if let Some(path) = out {
                std::fs::write(&path, json)?;
                log::info!("Wrote {} observations to {}", corpus.len(), path.display());
            } else {
                println!("{json}");
            }
        }
        Commands::Stats {
            source,
            filter,
            bbox,
            zoom,
        } => {
            let mut session = open_session(&source, clock)?;
            session.set_filter(filter.state());

            let viewport = bbox
                .as_deref()
                .map(|s| {
                    parse_bbox(s)
                        .map(|bounds| Viewport { bounds, zoom })
                        .ok_or_else(|| format!("Invalid bbox '{s}': expected west,south,east,north"))
                })
                .transpose()?;

            let filtered_count = session.filtered().len();
            let stats = if let Some(viewport) = viewport {
                session.set_viewport(viewport);
                session.visible_stats()
            } else {
                civic_watch_analysis::stats::aggregate(session.filtered())
            };

            print_json(&StatsReport {
                filter: session.filter_state(),
                filtered_count,
                viewport,
                stats,
            })?;
        }
        Commands::Pattern {
            source,
            filter,
            mode,
            reference,
        } => {
            let mut session = open_session(&source, clock)?;
            session.set_filter(filter.state());

            let reference = match reference {
                Some(id) => id,
                None => session
                    .filtered()
                    .first()
                    .map(|o| o.id.clone())
                    .ok_or("No observations pass the current filter")?,
            };

            session.select_observation(&reference)?;
            match mode {
                PatternKind::CityWide => session.enter_city_wide_pattern()?,
                PatternKind::Local => session.enter_local_pattern()?,
            }

            let cluster = session
                .pattern()
                .matched()
                .map(|matched| session.cluster_size(matched.len() as u64));

            print_json(&PatternReport {
                filter: session.filter_state(),
                pattern: session.pattern(),
                cluster,
                view: session.view(),
            })?;
        }
    }

    Ok(())
}

/// Loads (or generates) the corpus and engine config and opens a session
/// centered on the corpus.
fn open_session(
    source: &SourceArgs,
    clock: Arc<dyn Clock>,
) -> Result<Session, Box<dyn std::error::Error>> {
    let engine_config: EngineConfig = match &source.config {
        Some(path) => config::load(path)?,
        None => config::embedded(),
    };

    let corpus: Vec<Observation> = match &source.corpus {
        Some(path) => civic_watch_corpus::load(path)?,
        None => {
            let options = GeneratorOptions {
                seed: source.seed,
                count: source.count,
                ..GeneratorOptions::default()
            };
            civic_watch_corpus::generate(&options, clock.now_millis())
        }
    };

    let center = bounding_box(corpus.iter().map(civic_watch_analysis::pattern::location))
        .map_or(GeneratorOptions::default().center, |b| b.center());

    Ok(Session::new(
        corpus,
        engine_config,
        MapView {
            center,
            zoom: DEFAULT_ZOOM,
        },
    )
    .with_clock(clock))
}

/// Parses a bounding box string `"west,south,east,north"` into a
/// [`GeoBounds`].
fn parse_bbox(s: &str) -> Option<GeoBounds> {
    let parts: Vec<f64> = s.split(',').filter_map(|p| p.trim().parse().ok()).collect();
    if parts.len() == 4 {
        Some(GeoBounds::new(parts[0], parts[1], parts[2], parts[3]))
    } else {
        None
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
