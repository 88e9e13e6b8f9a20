#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Waypoint Defence.

mod economy;
mod enemies;
mod grid;
mod path;
mod projectiles;
mod terrain;
mod towers;

use std::time::Duration;

use glam::Vec3;
use tracing::{debug, info, warn};
use waypoint_defence_core::{
    Command, EnemyConfig, EnemyId, Event, GamePhase, GridCell, GridLayout, PlacementError,
    ProjectilePayload, SellError, SpawnError, TowerConfig, TowerId, WaveIndex,
    DEFAULT_STARTING_GOLD, DEFAULT_STARTING_HEALTH,
};

pub use economy::Economy;
pub use grid::BuildGrid;
pub use path::Path;
pub use terrain::Terrain;

use enemies::{DamageOutcome, EnemyRegistry, Movement};
use projectiles::{Flight, Projectile, ProjectileRegistry};
use towers::TowerRegistry;

/// Progress through the wave timeline as reported by the scheduler.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WaveProgress {
    current: Option<WaveIndex>,
    total: u32,
    countdown: Option<Duration>,
    complete: bool,
}

impl WaveProgress {
    /// Wave most recently started, if any.
    #[must_use]
    pub const fn current(&self) -> Option<WaveIndex> {
        self.current
    }

    /// Number of waves in the timeline.
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.total
    }

    /// Time left before the next wave starts while the scheduler is waiting.
    #[must_use]
    pub const fn countdown(&self) -> Option<Duration> {
        self.countdown
    }

    /// Reports whether every wave has been spawned.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.complete
    }
}

/// Represents the authoritative Waypoint Defence world state.
#[derive(Debug)]
pub struct World {
    grid: BuildGrid,
    terrain: Terrain,
    path: Path,
    economy: Economy,
    phase: GamePhase,
    enemies: EnemyRegistry,
    towers: TowerRegistry,
    projectiles: ProjectileRegistry,
    waves: WaveProgress,
    placement: Option<TowerConfig>,
    selected: Option<TowerId>,
    victory_reported: bool,
}

impl World {
    /// Creates a world with a 20×20 unit grid, flat ground, no path and the default ledger.
    #[must_use]
    pub fn new() -> Self {
        Self {
            grid: BuildGrid::new(GridLayout::default()),
            terrain: Terrain::default(),
            path: Path::default(),
            economy: Economy::new(DEFAULT_STARTING_GOLD, DEFAULT_STARTING_HEALTH),
            phase: GamePhase::Building,
            enemies: EnemyRegistry::new(),
            towers: TowerRegistry::new(),
            projectiles: ProjectileRegistry::new(),
            waves: WaveProgress::default(),
            placement: None,
            selected: None,
            victory_reported: false,
        }
    }

    fn clear_layout(&mut self) {
        self.path = Path::default();
        self.enemies.clear();
        self.towers.clear();
        self.projectiles.clear();
        self.placement = None;
        self.selected = None;
    }

    fn configure_path(&mut self, cells: &[GridCell], out_events: &mut Vec<Event>) {
        self.clear_layout();
        self.grid.reset_buildable();
        match path::generate(cells, &mut self.grid, &self.terrain) {
            Ok(path) => {
                let waypoints = u32::try_from(path.len()).unwrap_or(u32::MAX);
                self.path = path;
                out_events.push(Event::PathGenerated { waypoints });
            }
            Err(reason) => out_events.push(Event::PathRejected { reason }),
        }
    }

    fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        out_events.push(Event::TimeAdvanced { dt });

        for enemy in self.enemies.iter_mut() {
            if enemy.tick_slow(dt) {
                out_events.push(Event::EnemySlowExpired { enemy: enemy.id });
            }
        }

        let mut departed: Vec<(EnemyId, u32)> = Vec::new();
        for enemy in self.enemies.iter_mut() {
            match enemy.advance(self.path.waypoints(), dt) {
                Movement::Idle | Movement::Moved => {}
                Movement::ReachedWaypoint(next_waypoint) => {
                    out_events.push(Event::EnemyReachedWaypoint {
                        enemy: enemy.id,
                        next_waypoint,
                    });
                }
                Movement::ReachedBase => departed.push((enemy.id, enemy.config.base_damage)),
            }
        }

        for (enemy, damage) in departed {
            self.retire_enemy(enemy, out_events);
            out_events.push(Event::EnemyReachedBase { enemy, damage });
            self.damage_base(damage, out_events);
        }
        if self.phase == GamePhase::Defeated {
            return;
        }

        for tower in self.towers.iter_mut() {
            let target_position = tower
                .target
                .and_then(|id| self.enemies.get(id))
                .map(|enemy| enemy.position);
            tower.tick(dt, target_position);
        }

        self.check_victory(out_events);
    }

    fn damage_base(&mut self, damage: u32, out_events: &mut Vec<Event>) {
        let was_game_over = self.economy.is_game_over();
        let ended = self.economy.take_damage(damage);
        if was_game_over {
            return;
        }
        out_events.push(Event::HealthChanged {
            health: self.economy.health(),
        });
        if ended {
            self.phase = GamePhase::Defeated;
            info!("game over");
            out_events.push(Event::GameOver);
        }
    }

    fn spawn_enemy(&mut self, config: EnemyConfig, out_events: &mut Vec<Event>) {
        let rejection = if let Err(error) = config.validate() {
            Some(SpawnError::InvalidConfig(error))
        } else if !self.path.is_usable() {
            Some(SpawnError::NoPath)
        } else {
            None
        };
        if let Some(reason) = rejection {
            warn!(enemy = %config.name, %reason, "enemy spawn rejected");
            out_events.push(Event::EnemySpawnRejected {
                name: config.name,
                reason,
            });
            return;
        }

        let name = config.name.clone();
        let enemy = self.enemies.spawn(config, self.path.waypoints());
        debug!(enemy = enemy.id.get(), %name, "enemy spawned");
        out_events.push(Event::EnemySpawned {
            enemy: enemy.id,
            name,
            position: enemy.position,
        });
    }

    /// Removes the enemy and drops every reference towers hold to it.
    fn retire_enemy(&mut self, enemy: EnemyId, out_events: &mut Vec<Event>) {
        let _ = self.enemies.remove(enemy);
        for tower in self.towers.forget_enemy(enemy) {
            out_events.push(Event::TowerTargetChanged {
                tower,
                target: None,
            });
        }
    }

    fn set_tower_target(
        &mut self,
        tower: TowerId,
        target: Option<EnemyId>,
        out_events: &mut Vec<Event>,
    ) {
        let Some(state) = self.towers.get_mut(tower) else {
            debug!(tower = tower.get(), "ignoring target for missing tower");
            return;
        };
        if let Some(enemy) = target {
            let in_range = self
                .enemies
                .get(enemy)
                .is_some_and(|candidate| candidate.position.distance(state.position) <= state.config.range);
            if !in_range {
                debug!(
                    tower = tower.get(),
                    enemy = enemy.get(),
                    "ignoring target that is gone or out of range"
                );
                return;
            }
        }
        if state.target != target {
            state.target = target;
            out_events.push(Event::TowerTargetChanged { tower, target });
        }
    }

    fn fire_projectile(&mut self, tower: TowerId, target: EnemyId, out_events: &mut Vec<Event>) {
        let Some(state) = self.towers.get_mut(tower) else {
            return;
        };
        if state.target != Some(target) || !state.is_ready() || self.enemies.get(target).is_none() {
            debug!(tower = tower.get(), enemy = target.get(), "ignoring fire request");
            return;
        }
        state.reload();
        let projectile =
            self.projectiles
                .launch(tower, target, state.position, state.config.payload());
        out_events.push(Event::ProjectileFired {
            projectile,
            tower,
            target,
        });
    }

    fn advance_projectiles(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let mut expired = Vec::new();
        let mut impacts = Vec::new();
        for projectile in self.projectiles.iter_mut() {
            let target_position = self
                .enemies
                .get(projectile.target)
                .map(|enemy| enemy.position);
            match projectile.advance(dt, target_position) {
                Flight::Flying => {}
                Flight::Expired => expired.push(projectile.id),
                Flight::Impacted(point) => impacts.push((projectile.id, point)),
            }
        }

        for id in expired {
            let _ = self.projectiles.remove(id);
            out_events.push(Event::ProjectileExpired { projectile: id });
        }
        for (id, point) in impacts {
            if let Some(projectile) = self.projectiles.remove(id) {
                self.resolve_impact(&projectile, point, out_events);
            }
        }

        self.check_victory(out_events);
    }

    fn resolve_impact(&mut self, projectile: &Projectile, point: Vec3, out_events: &mut Vec<Event>) {
        // An earlier impact in the same pass may already have killed the target.
        if self.enemies.get(projectile.target).is_none() {
            out_events.push(Event::ProjectileExpired {
                projectile: projectile.id,
            });
            return;
        }

        let victims: Vec<EnemyId> = match projectile.payload.splash_radius {
            Some(radius) => self
                .enemies
                .iter()
                .filter(|enemy| enemy.position.distance(point) <= radius)
                .map(|enemy| enemy.id)
                .collect(),
            None => vec![projectile.target],
        };

        let mut hits = 0_u32;
        for victim in victims {
            if self.damage_enemy(victim, &projectile.payload, out_events) {
                hits += 1;
            }
        }
        debug!(
            projectile = projectile.id.get(),
            tower = projectile.tower.get(),
            hits,
            "projectile impacted"
        );
        out_events.push(Event::ProjectileImpacted {
            projectile: projectile.id,
            position: point,
            hits,
        });
    }

    fn damage_enemy(
        &mut self,
        victim: EnemyId,
        payload: &ProjectilePayload,
        out_events: &mut Vec<Event>,
    ) -> bool {
        let Some(enemy) = self.enemies.get_mut(victim) else {
            return false;
        };
        match enemy.take_damage(payload.damage) {
            DamageOutcome::Ignored => false,
            DamageOutcome::Damaged { amount, remaining } => {
                out_events.push(Event::EnemyDamaged {
                    enemy: victim,
                    amount,
                    remaining,
                });
                if let Some(slow) = payload.slow_amount {
                    enemy.apply_slow(slow);
                    out_events.push(Event::EnemySlowed {
                        enemy: victim,
                        slow: enemy.slow,
                    });
                }
                true
            }
            DamageOutcome::Killed { amount } => {
                let gold_reward = enemy.config.gold_reward;
                out_events.push(Event::EnemyDamaged {
                    enemy: victim,
                    amount,
                    remaining: 0,
                });
                self.retire_enemy(victim, out_events);
                debug!(enemy = victim.get(), gold_reward, "enemy died");
                out_events.push(Event::EnemyDied {
                    enemy: victim,
                    gold_reward,
                });
                self.economy.add_gold(gold_reward);
                out_events.push(Event::GoldChanged {
                    gold: self.economy.gold(),
                });
                true
            }
        }
    }

    fn validate_placement(&self, config: &TowerConfig, cell: GridCell) -> Result<(), PlacementError> {
        config.validate().map_err(PlacementError::InvalidConfig)?;
        if !self.grid.contains(cell) {
            return Err(PlacementError::OutOfBounds);
        }
        if !self.grid.is_buildable(cell) {
            return Err(PlacementError::NotBuildable);
        }
        if !self.economy.can_afford(config.cost) {
            return Err(PlacementError::InsufficientGold);
        }
        Ok(())
    }

    fn begin_placement(&mut self, config: TowerConfig, out_events: &mut Vec<Event>) {
        if let Err(error) = config.validate() {
            warn!(tower = %config.name, %error, "refusing placement of invalid tower");
            out_events.push(Event::PurchaseFailed { cost: config.cost });
            return;
        }
        if !self.economy.can_afford(config.cost) {
            out_events.push(Event::PurchaseFailed { cost: config.cost });
            return;
        }
        out_events.push(Event::PlacementStarted {
            name: config.name.clone(),
            cost: config.cost,
        });
        self.placement = Some(config);
    }

    fn place_tower(&mut self, config: TowerConfig, cell: GridCell, out_events: &mut Vec<Event>) {
        if let Err(reason) = self.validate_placement(&config, cell) {
            debug!(column = cell.column(), row = cell.row(), %reason, "tower placement rejected");
            if reason == PlacementError::InsufficientGold {
                out_events.push(Event::PurchaseFailed { cost: config.cost });
            }
            out_events.push(Event::TowerPlacementRejected { cell, reason });
            return;
        }
        if !self.economy.try_purchase(config.cost) {
            out_events.push(Event::PurchaseFailed { cost: config.cost });
            out_events.push(Event::TowerPlacementRejected {
                cell,
                reason: PlacementError::InsufficientGold,
            });
            return;
        }

        self.grid.set_buildable(cell, false);
        let position = self.terrain.settle(&self.grid, self.grid.grid_to_world(cell));
        let cost = config.cost;
        let name = config.name.clone();
        let tower = self.towers.insert(config, cell, position);
        self.placement = None;
        info!(tower = tower.get(), %name, column = cell.column(), row = cell.row(), "tower placed");
        out_events.push(Event::PurchaseSucceeded { cost });
        out_events.push(Event::GoldChanged {
            gold: self.economy.gold(),
        });
        out_events.push(Event::TowerPlaced { tower, name, cell });
    }

    fn sell_tower(&mut self, tower: TowerId, out_events: &mut Vec<Event>) {
        if self.towers.get(tower).is_none() {
            out_events.push(Event::TowerSaleRejected {
                tower,
                reason: SellError::MissingTower,
            });
            return;
        }
        if self.selected == Some(tower) {
            self.deselect_tower(out_events);
        }
        let Some(state) = self.towers.remove(tower) else {
            return;
        };
        let refund = state.config.sell_value();
        self.grid.set_buildable(state.cell, true);
        self.economy.add_gold(refund);
        info!(tower = tower.get(), refund, "tower sold");
        out_events.push(Event::TowerSold {
            tower,
            cell: state.cell,
            refund,
        });
        out_events.push(Event::GoldChanged {
            gold: self.economy.gold(),
        });
    }

    fn select_tower(&mut self, tower: TowerId, out_events: &mut Vec<Event>) {
        if self.selected == Some(tower) || self.towers.get(tower).is_none() {
            return;
        }
        self.deselect_tower(out_events);
        self.selected = Some(tower);
        out_events.push(Event::TowerSelected { tower });
    }

    fn deselect_tower(&mut self, out_events: &mut Vec<Event>) {
        if let Some(tower) = self.selected.take() {
            out_events.push(Event::TowerDeselected { tower });
        }
    }

    fn check_victory(&mut self, out_events: &mut Vec<Event>) {
        if !self.victory_reported && query::is_victorious(self) {
            self.victory_reported = true;
            info!("all waves cleared");
            out_events.push(Event::Victory);
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Once the session is lost every command is ignored.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    if world.phase == GamePhase::Defeated {
        debug!(?command, "ignoring command after game over");
        return;
    }

    match command {
        Command::ConfigureGrid { layout } => {
            world.grid = BuildGrid::new(layout);
            world.clear_layout();
            info!(columns = layout.columns, rows = layout.rows, "grid configured");
            out_events.push(Event::GridConfigured {
                columns: layout.columns,
                rows: layout.rows,
            });
        }
        Command::ConfigureGround { ground } => {
            world.terrain = Terrain::new(ground);
        }
        Command::ConfigurePath { cells } => world.configure_path(&cells, out_events),
        Command::ConfigureEconomy {
            starting_gold,
            starting_health,
        } => {
            world.economy = Economy::new(starting_gold, starting_health);
            out_events.push(Event::GoldChanged {
                gold: starting_gold,
            });
            out_events.push(Event::HealthChanged {
                health: starting_health,
            });
        }
        Command::StartGame => {
            if world.phase == GamePhase::Building {
                world.phase = GamePhase::Running;
                info!("game started");
                out_events.push(Event::GameStarted);
            }
        }
        Command::Tick { dt } => world.tick(dt, out_events),
        Command::SpawnEnemy { config } => world.spawn_enemy(config, out_events),
        Command::SetTowerTarget { tower, target } => {
            world.set_tower_target(tower, target, out_events);
        }
        Command::FireProjectile { tower, target } => {
            world.fire_projectile(tower, target, out_events);
        }
        Command::AdvanceProjectiles { dt } => world.advance_projectiles(dt, out_events),
        Command::BeginWave { wave, total } => {
            world.waves.current = Some(wave);
            world.waves.total = total;
            world.waves.countdown = None;
            info!(wave = wave.number(), total, "wave started");
            out_events.push(Event::WaveStarted { wave, total });
        }
        Command::UpdateWaveCountdown { remaining } => {
            world.waves.countdown = Some(remaining);
            out_events.push(Event::WaveTimerTicked {
                seconds_remaining: remaining.as_secs_f32(),
            });
        }
        Command::AwardWaveReward { wave, gold } => {
            world.economy.add_gold(gold);
            out_events.push(Event::WaveSpawnCompleted {
                wave,
                gold_reward: gold,
            });
            out_events.push(Event::GoldChanged {
                gold: world.economy.gold(),
            });
        }
        Command::CompleteWaves => {
            if !world.waves.complete {
                world.waves.complete = true;
                world.waves.countdown = None;
                info!("all waves spawned");
                out_events.push(Event::AllWavesComplete);
            }
            world.check_victory(out_events);
        }
        Command::BeginPlacement { config } => world.begin_placement(config, out_events),
        Command::CancelPlacement => {
            if world.placement.take().is_some() {
                out_events.push(Event::PlacementCancelled);
            }
        }
        Command::PreviewPlacement { cell } => {
            if let Some(config) = world.placement.as_ref() {
                let valid = world.validate_placement(config, cell).is_ok();
                out_events.push(Event::PlacementPreviewed { cell, valid });
            }
        }
        Command::PlaceTower { config, cell } => world.place_tower(config, cell, out_events),
        Command::SellTower { tower } => world.sell_tower(tower, out_events),
        Command::SelectTower { tower } => world.select_tower(tower, out_events),
        Command::DeselectTower => world.deselect_tower(out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use glam::Vec3;
    use waypoint_defence_core::{
        EnemyView, GamePhase, GridCell, PlacementError, TowerConfig, TowerId, TowerView,
    };

    use super::{BuildGrid, Economy, Path, Terrain, WaveProgress, World};

    /// Provides read-only access to the buildability grid.
    #[must_use]
    pub fn grid(world: &World) -> &BuildGrid {
        &world.grid
    }

    /// Provides read-only access to the ground surface.
    #[must_use]
    pub fn terrain(world: &World) -> &Terrain {
        &world.terrain
    }

    /// Provides read-only access to the enemy path.
    #[must_use]
    pub fn path(world: &World) -> &Path {
        &world.path
    }

    /// Provides read-only access to the gold and health ledger.
    #[must_use]
    pub fn economy(world: &World) -> &Economy {
        &world.economy
    }

    /// Current lifecycle phase of the session.
    #[must_use]
    pub fn phase(world: &World) -> GamePhase {
        world.phase
    }

    /// Captures a read-only view of the live enemies.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        EnemyView::from_snapshots(world.enemies.iter().map(|enemy| enemy.snapshot()).collect())
    }

    /// Captures a read-only view of the placed towers.
    #[must_use]
    pub fn tower_view(world: &World) -> TowerView {
        TowerView::from_snapshots(world.towers.iter().map(|tower| tower.snapshot()).collect())
    }

    /// Identifier of the tower occupying the cell, if any.
    #[must_use]
    pub fn tower_at(world: &World, cell: GridCell) -> Option<TowerId> {
        world.towers.at(cell)
    }

    /// Number of projectiles in flight.
    #[must_use]
    pub fn projectile_count(world: &World) -> usize {
        world.projectiles.len()
    }

    /// Explains whether the tower could be placed on the cell right now.
    pub fn placement_check(
        world: &World,
        config: &TowerConfig,
        cell: GridCell,
    ) -> Result<(), PlacementError> {
        world.validate_placement(config, cell)
    }

    /// Reports whether the cell is buildable and the tower affordable.
    #[must_use]
    pub fn can_place(world: &World, config: &TowerConfig, cell: GridCell) -> bool {
        placement_check(world, config, cell).is_ok()
    }

    /// Tower of the open placement session, if any.
    #[must_use]
    pub fn placement_session(world: &World) -> Option<&TowerConfig> {
        world.placement.as_ref()
    }

    /// Currently selected tower, if any.
    #[must_use]
    pub fn selected_tower(world: &World) -> Option<TowerId> {
        world.selected
    }

    /// Progress through the wave timeline.
    #[must_use]
    pub fn wave_progress(world: &World) -> WaveProgress {
        world.waves
    }

    /// Reports whether every wave was spawned and resolved without losing.
    #[must_use]
    pub fn is_victorious(world: &World) -> bool {
        world.waves.complete && world.enemies.is_empty() && world.phase != GamePhase::Defeated
    }

    /// Height of the ground below the horizontal position, if any ground exists there.
    #[must_use]
    pub fn ground_height(world: &World, position: Vec3) -> Option<f32> {
        world.terrain.height_at(&world.grid, position)
    }
}

/// Moves `from` towards `to` by at most `max_step`, landing exactly on `to` when close enough.
pub(crate) fn move_towards(from: Vec3, to: Vec3, max_step: f32) -> Vec3 {
    let delta = to - from;
    let distance = delta.length();
    if distance <= max_step || distance <= f32::EPSILON {
        return to;
    }
    from + delta / distance * max_step.max(0.0)
}

/// Heading in radians around the vertical axis, zero facing +Z, or `fallback` for coincident points.
pub(crate) fn heading_towards(from: Vec3, to: Vec3, fallback: f32) -> f32 {
    let dx = to.x - from.x;
    let dz = to.z - from.z;
    if dx.abs() <= f32::EPSILON && dz.abs() <= f32::EPSILON {
        fallback
    } else {
        dx.atan2(dz)
    }
}
