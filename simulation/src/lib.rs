#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Single simulation context wiring the world to its pure systems.
//!
//! Each step runs in a fixed order: wave spawns, enemy movement and tower
//! cooldowns, target selection, firing, and finally projectile flight. Every
//! command produced by a system is applied before the next system observes the
//! world, so later systems always see the effects of earlier ones.

mod scenario;

use std::time::Duration;

use tracing::{debug, info};
use waypoint_defence_core::{Command, Event, GamePhase, TowerCatalog, WaveTimeline};
use waypoint_defence_system_placement::{Placement, PlacementRequest};
use waypoint_defence_system_tower_combat::TowerCombat;
use waypoint_defence_system_tower_targeting::TowerTargeting;
use waypoint_defence_system_wave_scheduler::WaveScheduler;
use waypoint_defence_world::{self as world, query, World};

pub use scenario::{
    EconomySettings, GroupEntry, Scenario, ScenarioError, WaveEntry, SUPPORTED_SCENARIO_VERSION,
};

/// Player or adapter intent submitted between steps.
#[derive(Clone, Debug, PartialEq)]
pub enum Request {
    /// Leave the building phase and start the first wave.
    StartGame,
    /// Skip the countdown to the next wave.
    StartNextWave,
    /// Placement, selection or sale intent.
    Placement(PlacementRequest),
}

/// Owner of the world and every system driving it.
#[derive(Debug)]
pub struct Simulation {
    world: World,
    catalog: TowerCatalog,
    scheduler: WaveScheduler,
    targeting: TowerTargeting,
    combat: TowerCombat,
    placement: Placement,
    commands: Vec<Command>,
}

impl Simulation {
    /// Wraps an already configured world.
    #[must_use]
    pub fn new(world: World, timeline: &WaveTimeline, catalog: TowerCatalog) -> Self {
        Self {
            world,
            catalog,
            scheduler: WaveScheduler::new(timeline),
            targeting: TowerTargeting::new(),
            combat: TowerCombat::new(),
            placement: Placement::new(),
            commands: Vec::new(),
        }
    }

    /// Builds a simulation from an authored scenario.
    pub fn from_scenario(scenario: &Scenario) -> Result<Self, ScenarioError> {
        let catalog = scenario.catalog()?;
        let timeline = scenario.timeline()?;

        let mut world = World::new();
        let mut events = Vec::new();
        let setup = [
            Command::ConfigureGrid {
                layout: scenario.grid,
            },
            Command::ConfigureGround {
                ground: scenario.ground.clone(),
            },
            Command::ConfigureEconomy {
                starting_gold: scenario.economy.starting_gold,
                starting_health: scenario.economy.starting_health,
            },
            Command::ConfigurePath {
                cells: scenario.path.clone(),
            },
        ];
        for command in setup {
            world::apply(&mut world, command, &mut events);
        }
        if let Some(reason) = events.iter().find_map(|event| match event {
            Event::PathRejected { reason } => Some(*reason),
            _ => None,
        }) {
            return Err(ScenarioError::InvalidPath(reason));
        }

        info!(
            towers = catalog.len(),
            waves = timeline.len(),
            "scenario loaded"
        );
        Ok(Self::new(world, &timeline, catalog))
    }

    /// Read-only access to the world for queries.
    #[must_use]
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// Towers available for purchase, cheapest first.
    #[must_use]
    pub const fn catalog(&self) -> &TowerCatalog {
        &self.catalog
    }

    /// Wave scheduler state.
    #[must_use]
    pub const fn scheduler(&self) -> &WaveScheduler {
        &self.scheduler
    }

    /// Mirror of the placement session and selection.
    #[must_use]
    pub const fn placement(&self) -> &Placement {
        &self.placement
    }

    /// Reports whether the session has been won or lost.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        query::phase(&self.world) == GamePhase::Defeated || query::is_victorious(&self.world)
    }

    /// Applies a request, appending the resulting events to `out`.
    pub fn submit(&mut self, request: Request, out: &mut Vec<Event>) {
        debug!(?request, "request submitted");
        match request {
            Request::StartGame => {
                let _ = self.scheduler.start_game(&mut self.commands);
            }
            Request::StartNextWave => {
                let _ = self.scheduler.start_next_wave(&mut self.commands);
            }
            Request::Placement(request) => {
                let world = &self.world;
                self.placement.handle(
                    &[],
                    Some(request),
                    |cell| query::tower_at(world, cell),
                    &mut self.commands,
                );
            }
        }
        self.flush(out);
    }

    /// Advances the simulation by `dt`, appending the resulting events to `out`.
    pub fn step(&mut self, dt: Duration, out: &mut Vec<Event>) {
        if query::phase(&self.world) == GamePhase::Defeated {
            return;
        }

        self.scheduler
            .advance(query::phase(&self.world), dt, &mut self.commands);
        self.commands.push(Command::Tick { dt });
        self.flush(out);

        self.targeting.handle(
            query::phase(&self.world),
            &query::tower_view(&self.world),
            &query::enemy_view(&self.world),
            &mut self.commands,
        );
        self.flush(out);

        self.combat.handle(
            query::phase(&self.world),
            &query::tower_view(&self.world),
            &mut self.commands,
        );
        self.commands.push(Command::AdvanceProjectiles { dt });
        self.flush(out);
    }

    fn flush(&mut self, out: &mut Vec<Event>) {
        let start = out.len();
        for command in self.commands.drain(..) {
            world::apply(&mut self.world, command, out);
        }
        let world = &self.world;
        self.placement.handle(
            &out[start..],
            None,
            |cell| query::tower_at(world, cell),
            &mut self.commands,
        );
    }
}
