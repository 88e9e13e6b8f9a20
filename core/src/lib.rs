#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Waypoint Defence engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters and systems submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! for systems and presentation sinks to react to. Systems consume immutable
//! snapshots such as [`EnemyView`] and [`TowerView`] and respond exclusively
//! with new command batches.

mod config;

use std::time::Duration;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use config::{
    ConfigError, EnemyConfig, EnemyGroup, GridLayout, Ground, GroundTile, ProjectilePayload,
    TowerCatalog, TowerConfig, Wave, WaveTimeline,
};

/// Distance below which an enemy counts as having reached its current waypoint.
pub const WAYPOINT_ARRIVAL_EPSILON: f32 = 0.1;

/// Time a slow stays active after its most recent application.
pub const SLOW_DURATION: Duration = Duration::from_secs(2);

/// Flight speed of every projectile in world units per second.
pub const PROJECTILE_SPEED: f32 = 20.0;

/// Projectiles that have not hit anything after this long are discarded.
pub const PROJECTILE_MAX_LIFETIME: Duration = Duration::from_secs(5);

/// Distance at which a projectile counts as having reached its target.
pub const PROJECTILE_COLLISION_RADIUS: f32 = 0.5;

/// Angular interpolation factor per second used when turrets track targets.
pub const TURRET_TURN_RATE: f32 = 10.0;

/// Percentage of the purchase cost refunded when a tower is sold.
pub const SELL_RATIO_PERCENT: u64 = 70;

/// Smallest fire rate honoured by towers, in shots per second.
pub const FIRE_RATE_FLOOR: f32 = 0.001;

/// Gold available at the start of a session unless configured otherwise.
pub const DEFAULT_STARTING_GOLD: u32 = 500;

/// Base health at the start of a session unless configured otherwise.
pub const DEFAULT_STARTING_HEALTH: u32 = 100;

/// Describes the lifecycle phase of a play session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GamePhase {
    /// Towers may be placed but no wave has been started yet.
    Building,
    /// Waves are running.
    Running,
    /// The base ran out of health; the simulation no longer advances.
    Defeated,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Replaces the buildable grid, clearing the path and every agent.
    ConfigureGrid {
        /// Dimensions and world placement of the grid.
        layout: GridLayout,
    },
    /// Replaces the ground surface used for height queries.
    ConfigureGround {
        /// Authored ground surface.
        ground: Ground,
    },
    /// Generates the enemy path from an ordered list of grid cells.
    ConfigurePath {
        /// Cells visited by the path in order.
        cells: Vec<GridCell>,
    },
    /// Resets the gold and health ledger.
    ConfigureEconomy {
        /// Gold available to spend.
        starting_gold: u32,
        /// Health of the base.
        starting_health: u32,
    },
    /// Moves the session from building into the running phase.
    StartGame,
    /// Advances enemies, slow timers and tower cooldowns by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests that a new enemy enters the path.
    SpawnEnemy {
        /// Template for the new enemy.
        config: EnemyConfig,
    },
    /// Replaces a tower's current target.
    SetTowerTarget {
        /// Tower being retargeted.
        tower: TowerId,
        /// New target, or `None` to clear it.
        target: Option<EnemyId>,
    },
    /// Requests that a ready tower fires at its current target.
    FireProjectile {
        /// Tower firing the projectile.
        tower: TowerId,
        /// Enemy the projectile seeks.
        target: EnemyId,
    },
    /// Moves projectiles and resolves their impacts.
    AdvanceProjectiles {
        /// Duration of simulated time that elapsed since the previous advance.
        dt: Duration,
    },
    /// Records that a wave started spawning.
    BeginWave {
        /// Wave that started.
        wave: WaveIndex,
        /// Number of waves in the timeline.
        total: u32,
    },
    /// Publishes the time left before the next wave starts.
    UpdateWaveCountdown {
        /// Time remaining until the next wave.
        remaining: Duration,
    },
    /// Grants the reward for a wave whose last enemy has spawned.
    AwardWaveReward {
        /// Wave that finished spawning.
        wave: WaveIndex,
        /// Gold granted.
        gold: u32,
    },
    /// Records that every wave in the timeline has been spawned.
    CompleteWaves,
    /// Opens a placement session for the provided tower, checking affordability.
    BeginPlacement {
        /// Tower the player wants to place.
        config: TowerConfig,
    },
    /// Closes the current placement session without building anything.
    CancelPlacement,
    /// Asks whether the tower of the open placement session fits on the cell.
    PreviewPlacement {
        /// Cell under the cursor.
        cell: GridCell,
    },
    /// Purchases and places a tower on the provided cell.
    PlaceTower {
        /// Tower to construct.
        config: TowerConfig,
        /// Cell the tower occupies.
        cell: GridCell,
    },
    /// Sells a tower, refunding its sell value.
    SellTower {
        /// Tower to remove.
        tower: TowerId,
    },
    /// Marks a tower as selected, replacing any previous selection.
    SelectTower {
        /// Tower to select.
        tower: TowerId,
    },
    /// Clears the current tower selection.
    DeselectTower,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Confirms that the buildable grid was rebuilt.
    GridConfigured {
        /// Number of cell columns.
        columns: u32,
        /// Number of cell rows.
        rows: u32,
    },
    /// Confirms that a usable path was generated.
    PathGenerated {
        /// Number of waypoints on the path.
        waypoints: u32,
    },
    /// Reports that path generation failed and the path is empty.
    PathRejected {
        /// Reason the path could not be generated.
        reason: PathError,
    },
    /// Reports that the session entered the running phase.
    GameStarted,
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that an enemy entered the path.
    EnemySpawned {
        /// Identifier assigned to the enemy.
        enemy: EnemyId,
        /// Name of the enemy template.
        name: String,
        /// Position of the first waypoint.
        position: Vec3,
    },
    /// Reports that an enemy could not be spawned.
    EnemySpawnRejected {
        /// Name of the enemy template.
        name: String,
        /// Reason the spawn failed.
        reason: SpawnError,
    },
    /// Reports that an enemy reached a waypoint and now heads for the next one.
    EnemyReachedWaypoint {
        /// Enemy that advanced.
        enemy: EnemyId,
        /// Index of the waypoint the enemy is now heading for.
        next_waypoint: u32,
    },
    /// Reports damage dealt to an enemy after armor.
    EnemyDamaged {
        /// Enemy that was hit.
        enemy: EnemyId,
        /// Damage subtracted from the enemy's health.
        amount: u32,
        /// Health left after the hit.
        remaining: u32,
    },
    /// Reports that an enemy's active slow changed.
    EnemySlowed {
        /// Enemy that was slowed.
        enemy: EnemyId,
        /// Active slow fraction after the application.
        slow: f32,
    },
    /// Reports that an enemy's slow wore off.
    EnemySlowExpired {
        /// Enemy that recovered its base speed.
        enemy: EnemyId,
    },
    /// Reports that an enemy was killed.
    EnemyDied {
        /// Enemy that died.
        enemy: EnemyId,
        /// Gold granted for the kill.
        gold_reward: u32,
    },
    /// Reports that an enemy completed the path.
    EnemyReachedBase {
        /// Enemy that reached the base.
        enemy: EnemyId,
        /// Damage dealt to the base.
        damage: u32,
    },
    /// Reports that a tower acquired, switched or dropped its target.
    TowerTargetChanged {
        /// Tower whose target changed.
        tower: TowerId,
        /// New target, if any.
        target: Option<EnemyId>,
    },
    /// Confirms that a tower fired a projectile.
    ProjectileFired {
        /// Identifier assigned to the projectile.
        projectile: ProjectileId,
        /// Tower that fired.
        tower: TowerId,
        /// Enemy the projectile seeks.
        target: EnemyId,
    },
    /// Reports that a projectile hit and resolved its damage.
    ProjectileImpacted {
        /// Projectile that hit.
        projectile: ProjectileId,
        /// Point of impact.
        position: Vec3,
        /// Number of enemies damaged by the impact.
        hits: u32,
    },
    /// Reports that a projectile vanished without dealing damage.
    ProjectileExpired {
        /// Projectile that vanished.
        projectile: ProjectileId,
    },
    /// Reports that a wave started spawning.
    WaveStarted {
        /// Wave that started.
        wave: WaveIndex,
        /// Number of waves in the timeline.
        total: u32,
    },
    /// Publishes the countdown to the next wave.
    WaveTimerTicked {
        /// Seconds left before the next wave starts.
        seconds_remaining: f32,
    },
    /// Reports that a wave's last enemy spawned and its reward was granted.
    WaveSpawnCompleted {
        /// Wave that finished spawning.
        wave: WaveIndex,
        /// Gold granted for the wave.
        gold_reward: u32,
    },
    /// Reports that every wave has been spawned.
    AllWavesComplete,
    /// Reports the new gold balance.
    GoldChanged {
        /// Gold after the change.
        gold: u32,
    },
    /// Reports the new base health.
    HealthChanged {
        /// Health after the change.
        health: u32,
    },
    /// Reports that the base health reached zero. Emitted at most once per session.
    GameOver,
    /// Reports that every wave was spawned and every enemy resolved without losing.
    Victory,
    /// Confirms that a placement session opened.
    PlacementStarted {
        /// Tower being placed.
        name: String,
        /// Cost of the tower.
        cost: u32,
    },
    /// Confirms that the placement session closed without building.
    PlacementCancelled,
    /// Answers a placement preview.
    PlacementPreviewed {
        /// Cell that was checked.
        cell: GridCell,
        /// Whether the tower could be placed there.
        valid: bool,
    },
    /// Confirms that a tower was placed into the world.
    TowerPlaced {
        /// Identifier assigned to the tower.
        tower: TowerId,
        /// Name of the tower template.
        name: String,
        /// Cell occupied by the tower.
        cell: GridCell,
    },
    /// Reports that a tower placement request was rejected.
    TowerPlacementRejected {
        /// Cell provided in the placement request.
        cell: GridCell,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Confirms that gold was debited for a purchase.
    PurchaseSucceeded {
        /// Gold debited.
        cost: u32,
    },
    /// Reports that a purchase could not be afforded.
    PurchaseFailed {
        /// Gold that would have been required.
        cost: u32,
    },
    /// Confirms that a tower was sold.
    TowerSold {
        /// Tower that was removed.
        tower: TowerId,
        /// Cell freed by the sale.
        cell: GridCell,
        /// Gold refunded.
        refund: u32,
    },
    /// Reports that a sale request was rejected.
    TowerSaleRejected {
        /// Tower named in the request.
        tower: TowerId,
        /// Specific reason the sale failed.
        reason: SellError,
    },
    /// Reports that a tower became selected.
    TowerSelected {
        /// Selected tower.
        tower: TowerId,
    },
    /// Reports that a tower lost its selection.
    TowerDeselected {
        /// Previously selected tower.
        tower: TowerId,
    },
}

/// Unique identifier assigned to an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TowerId(u32);

impl TowerId {
    /// Creates a new tower identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the tower identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a projectile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectileId(u32);

impl ProjectileId {
    /// Creates a new projectile identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the projectile identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Zero-based position of a wave within the timeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WaveIndex(u32);

impl WaveIndex {
    /// Creates a new wave index.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the zero-based index.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// One-based wave number suitable for "Wave 2/5" style displays.
    #[must_use]
    pub const fn number(&self) -> u32 {
        self.0.saturating_add(1)
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
///
/// Coordinates are signed because world positions outside the grid convert to
/// cells with negative indices; such cells are simply never buildable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCell {
    column: i32,
    row: i32,
}

impl GridCell {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: i32, row: i32) -> Self {
        Self { column, row }
    }

    /// Column index of the cell.
    #[must_use]
    pub const fn column(&self) -> i32 {
        self.column
    }

    /// Row index of the cell.
    #[must_use]
    pub const fn row(&self) -> i32 {
        self.row
    }
}

/// Reasons path generation may fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum PathError {
    /// Fewer than two coordinates were supplied.
    #[error("a path needs at least two coordinates, {supplied} supplied")]
    TooFewCoordinates {
        /// Number of coordinates supplied.
        supplied: u32,
    },
    /// Too many coordinates were skipped to leave a usable path.
    #[error("only {usable} usable waypoints remained after skipping invalid coordinates")]
    TooFewUsableWaypoints {
        /// Number of waypoints that survived validation.
        usable: u32,
    },
}

/// Reasons an enemy spawn may be rejected.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum SpawnError {
    /// No usable path exists for the enemy to follow.
    #[error("no usable path has been generated")]
    NoPath,
    /// The enemy template failed validation.
    #[error("invalid enemy template: {0}")]
    InvalidConfig(ConfigError),
}

/// Reasons a tower placement request may be rejected by the world.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum PlacementError {
    /// The tower template failed validation.
    #[error("invalid tower template: {0}")]
    InvalidConfig(ConfigError),
    /// The requested cell lies outside the grid.
    #[error("cell lies outside the grid")]
    OutOfBounds,
    /// The requested cell is part of the path or already holds a tower.
    #[error("cell is not buildable")]
    NotBuildable,
    /// The player cannot afford the tower.
    #[error("not enough gold")]
    InsufficientGold,
}

/// Reasons a tower sale request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum SellError {
    /// No tower with the provided identifier exists.
    #[error("no such tower")]
    MissingTower,
}

/// Immutable representation of a single enemy's state used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct EnemySnapshot {
    /// Unique identifier assigned to the enemy.
    pub id: EnemyId,
    /// Current world position.
    pub position: Vec3,
    /// Facing in radians around the vertical axis.
    pub heading: f32,
    /// Current health.
    pub health: u32,
    /// Health at spawn.
    pub max_health: u32,
    /// Current speed after slows.
    pub speed: f32,
    /// Active slow fraction.
    pub slow: f32,
    /// Index of the waypoint the enemy is heading for.
    pub next_waypoint: u32,
}

/// Read-only snapshot describing all live enemies.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EnemySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured enemy snapshots in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Looks up a live enemy by identifier.
    #[must_use]
    pub fn get(&self, id: EnemyId) -> Option<&EnemySnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Number of live enemies captured.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether no enemies are alive.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EnemySnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single tower's state used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct TowerSnapshot {
    /// Identifier allocated to the tower by the world.
    pub id: TowerId,
    /// Name of the tower template.
    pub name: String,
    /// Cell occupied by the tower.
    pub cell: GridCell,
    /// World position the tower fires from.
    pub position: Vec3,
    /// Targeting radius.
    pub range: f32,
    /// Current target, if any.
    pub target: Option<EnemyId>,
    /// Time remaining until the tower may fire again.
    pub ready_in: Duration,
    /// Turret heading in radians around the vertical axis.
    pub yaw: f32,
}

/// Read-only snapshot describing all towers placed on the grid.
#[derive(Clone, Debug, Default)]
pub struct TowerView {
    snapshots: Vec<TowerSnapshot>,
}

impl TowerView {
    /// Creates a new tower view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TowerSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured tower snapshots in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &TowerSnapshot> {
        self.snapshots.iter()
    }

    /// Looks up a tower by identifier.
    #[must_use]
    pub fn get(&self, id: TowerId) -> Option<&TowerSnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Number of towers captured.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether no towers are placed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<TowerSnapshot> {
        self.snapshots
    }
}
