#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless command-line runner for Waypoint Defence scenarios.

mod placement_arg;
mod report;

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::EnvFilter;
use waypoint_defence_core::Event;
use waypoint_defence_simulation::{Request, Scenario, Simulation};
use waypoint_defence_system_placement::PlacementRequest;

use crate::{placement_arg::PlacementArg, report::RunReport};

/// Scenario used when `--scenario` is not supplied.
const DEFAULT_SCENARIO: &str = include_str!("../scenarios/default.toml");

/// Log filter applied when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "waypoint_defence=info";

#[derive(Parser)]
#[command(
    name = "waypoint-defence",
    about = "Run Waypoint Defence scenarios without a renderer",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate a scenario until it is won, lost or the tick limit is reached
    Run {
        /// Scenario TOML file (default: the built-in scenario)
        #[arg(long)]
        scenario: Option<PathBuf>,
        /// Fixed simulation step in milliseconds
        #[arg(long, default_value_t = 50)]
        dt_ms: u64,
        /// Maximum number of steps before giving up
        #[arg(long, default_value_t = 20_000)]
        max_ticks: u32,
        /// Tower to build before the first wave, as NAME@COLUMN,ROW (repeatable)
        #[arg(long = "place", value_name = "NAME@COLUMN,ROW")]
        placements: Vec<PlacementArg>,
    },
    /// List the towers a scenario offers, cheapest first
    Towers {
        /// Scenario TOML file (default: the built-in scenario)
        #[arg(long)]
        scenario: Option<PathBuf>,
    },
}

/// Entry point for the Waypoint Defence command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            scenario,
            dt_ms,
            max_ticks,
            placements,
        } => run(scenario.as_deref(), dt_ms, max_ticks, &placements),
        Commands::Towers { scenario } => towers(scenario.as_deref()),
    }
}

fn load_scenario(path: Option<&Path>) -> Result<Scenario> {
    let Some(path) = path else {
        return Scenario::from_toml_str(DEFAULT_SCENARIO)
            .context("built-in scenario is invalid");
    };
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read scenario at {}", path.display()))?;
    Scenario::from_toml_str(&contents)
        .with_context(|| format!("failed to load scenario at {}", path.display()))
}

fn run(
    scenario: Option<&Path>,
    dt_ms: u64,
    max_ticks: u32,
    placements: &[PlacementArg],
) -> Result<()> {
    if dt_ms == 0 {
        bail!("--dt-ms must be greater than zero");
    }
    let scenario = load_scenario(scenario)?;
    let mut simulation =
        Simulation::from_scenario(&scenario).context("failed to build simulation")?;
    let dt = Duration::from_millis(dt_ms);

    let mut report = RunReport::default();
    let mut events = Vec::new();

    for placement in placements {
        let config = simulation
            .catalog()
            .find(&placement.tower)
            .cloned()
            .with_context(|| format!("scenario has no tower named `{}`", placement.tower))?;
        simulation.submit(
            Request::Placement(PlacementRequest::Start(config)),
            &mut events,
        );
        simulation.submit(
            Request::Placement(PlacementRequest::Confirm(placement.cell)),
            &mut events,
        );
        if let Some(reason) = rejection(&events) {
            warn!(
                tower = %placement.tower,
                column = placement.cell.column(),
                row = placement.cell.row(),
                %reason,
                "placement skipped"
            );
            simulation.submit(
                Request::Placement(PlacementRequest::Cancel),
                &mut events,
            );
        }
        report.record(&events);
        events.clear();
    }

    simulation.submit(Request::StartGame, &mut events);
    let mut ticks = 0;
    while ticks < max_ticks && !simulation.is_finished() {
        simulation.step(dt, &mut events);
        ticks += 1;
        report.record(&events);
        events.clear();
    }
    report.record(&events);

    println!("{}", report.summary(simulation.world(), ticks));
    Ok(())
}

fn rejection(events: &[Event]) -> Option<String> {
    events.iter().find_map(|event| match event {
        Event::TowerPlacementRejected { reason, .. } => Some(reason.to_string()),
        Event::PurchaseFailed { cost } => Some(format!("cannot afford {cost} gold")),
        _ => None,
    })
}

fn towers(scenario: Option<&Path>) -> Result<()> {
    let scenario = load_scenario(scenario)?;
    let catalog = scenario.catalog().context("scenario towers are invalid")?;

    println!(
        "{:<12} {:>5} {:>5} {:>6} {:>5} {:>7}  special",
        "name", "cost", "sell", "range", "rate", "damage"
    );
    for tower in catalog.iter() {
        let mut special = Vec::new();
        if let Some(radius) = tower.splash_radius {
            special.push(format!("splash {radius}"));
        }
        if let Some(amount) = tower.slow_amount {
            special.push(format!("slow {amount}"));
        }
        println!(
            "{:<12} {:>5} {:>5} {:>6.1} {:>5.2} {:>7}  {}",
            tower.name,
            tower.cost,
            tower.sell_value(),
            tower.range,
            tower.fire_rate,
            tower.damage,
            special.join(", ")
        );
    }
    Ok(())
}
