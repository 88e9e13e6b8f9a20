//! Authored template data consumed by the simulation.
//!
//! Every type in this module is immutable once loaded. Validation is explicit:
//! callers invoke `validate` and decide how to degrade, the types never refuse
//! construction on their own so that loaders can report every problem at once.

use std::time::Duration;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{GridCell, FIRE_RATE_FLOOR, PROJECTILE_SPEED, SELL_RATIO_PERCENT};

/// Problems detected while validating authored configuration.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// An enemy template declared zero maximum health.
    #[error("enemy `{name}` must have a positive max health")]
    ZeroHealth {
        /// Name of the offending template.
        name: String,
    },
    /// A speed, range or radius was negative or not a finite number.
    #[error("`{name}` has an invalid {field}: {value}")]
    InvalidMagnitude {
        /// Name of the offending template.
        name: String,
        /// Field holding the invalid value.
        field: &'static str,
        /// Value that failed validation.
        value: f32,
    },
    /// A fractional modifier fell outside the closed unit interval.
    #[error("`{name}` has {field} {value} outside 0.0..=1.0")]
    FractionOutOfRange {
        /// Name of the offending template.
        name: String,
        /// Field holding the invalid value.
        field: &'static str,
        /// Value that failed validation.
        value: f32,
    },
    /// The wave timeline contained no waves at all.
    #[error("wave timeline contains no waves")]
    EmptyTimeline,
}

/// Immutable template describing a kind of enemy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnemyConfig {
    /// Display name used by catalogs and logs.
    pub name: String,
    /// Health assigned to freshly spawned instances.
    pub max_health: u32,
    /// Base movement speed in world units per second.
    pub move_speed: f32,
    /// Damage dealt to the base when the enemy completes the path.
    pub base_damage: u32,
    /// Gold granted when the enemy is killed.
    pub gold_reward: u32,
    /// Fraction of incoming damage absorbed by armor, present for armored enemies.
    #[serde(default)]
    pub armor_damage_reduction: Option<f32>,
    /// Multiplier applied to the move speed, present for fast enemies.
    #[serde(default)]
    pub speed_multiplier: Option<f32>,
}

impl EnemyConfig {
    /// Creates a plain enemy template without armor or speed modifiers.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        max_health: u32,
        move_speed: f32,
        base_damage: u32,
        gold_reward: u32,
    ) -> Self {
        Self {
            name: name.into(),
            max_health,
            move_speed,
            base_damage,
            gold_reward,
            armor_damage_reduction: None,
            speed_multiplier: None,
        }
    }

    /// Returns a copy of the template with armor absorbing `reduction` of incoming damage.
    #[must_use]
    pub fn armored(mut self, reduction: f32) -> Self {
        self.armor_damage_reduction = Some(reduction);
        self
    }

    /// Returns a copy of the template whose speed is scaled by `multiplier`.
    #[must_use]
    pub fn fast(mut self, multiplier: f32) -> Self {
        self.speed_multiplier = Some(multiplier);
        self
    }

    /// Speed before any slow is applied.
    #[must_use]
    pub fn base_speed(&self) -> f32 {
        self.move_speed * self.speed_multiplier.unwrap_or(1.0)
    }

    /// Fraction of damage absorbed, clamped into the unit interval.
    #[must_use]
    pub fn armor_fraction(&self) -> f32 {
        self.armor_damage_reduction.map_or(0.0, clamp_fraction)
    }

    /// Checks the template for values the simulation cannot honour.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_health == 0 {
            return Err(ConfigError::ZeroHealth {
                name: self.name.clone(),
            });
        }
        check_magnitude(&self.name, "move speed", self.move_speed)?;
        if let Some(multiplier) = self.speed_multiplier {
            check_magnitude(&self.name, "speed multiplier", multiplier)?;
        }
        if let Some(reduction) = self.armor_damage_reduction {
            check_fraction(&self.name, "armor damage reduction", reduction)?;
        }
        Ok(())
    }
}

/// Immutable template describing a kind of tower.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TowerConfig {
    /// Display name used by catalogs and logs.
    pub name: String,
    /// Gold debited when the tower is placed.
    pub cost: u32,
    /// Targeting radius in world units.
    pub range: f32,
    /// Shots per second.
    pub fire_rate: f32,
    /// Damage carried by each projectile.
    pub damage: u32,
    /// Splash radius, present for area-of-effect towers.
    #[serde(default)]
    pub splash_radius: Option<f32>,
    /// Slow fraction applied on hit, present for towers that slow enemies.
    #[serde(default)]
    pub slow_amount: Option<f32>,
}

impl TowerConfig {
    /// Creates a single-target tower template without special abilities.
    #[must_use]
    pub fn new(name: impl Into<String>, cost: u32, range: f32, fire_rate: f32, damage: u32) -> Self {
        Self {
            name: name.into(),
            cost,
            range,
            fire_rate,
            damage,
            splash_radius: None,
            slow_amount: None,
        }
    }

    /// Returns a copy of the template that damages everything within `radius` on impact.
    #[must_use]
    pub fn with_splash(mut self, radius: f32) -> Self {
        self.splash_radius = Some(radius);
        self
    }

    /// Returns a copy of the template that slows damaged enemies by `amount`.
    #[must_use]
    pub fn with_slow(mut self, amount: f32) -> Self {
        self.slow_amount = Some(amount);
        self
    }

    /// Gold refunded when the tower is sold.
    ///
    /// Computed as `round(cost × 0.7)` with halves rounded away from zero.
    #[must_use]
    pub fn sell_value(&self) -> u32 {
        let scaled = u64::from(self.cost) * SELL_RATIO_PERCENT + 50;
        u32::try_from(scaled / 100).unwrap_or(u32::MAX)
    }

    /// Reports whether projectiles fired by this tower explode on impact.
    #[must_use]
    pub const fn is_aoe(&self) -> bool {
        self.splash_radius.is_some()
    }

    /// Reports whether projectiles fired by this tower slow their victims.
    #[must_use]
    pub const fn slows_enemies(&self) -> bool {
        self.slow_amount.is_some()
    }

    /// Delay between consecutive shots.
    ///
    /// The fire rate is floored at [`FIRE_RATE_FLOOR`] so that a zero or
    /// negative rate yields a very long, but finite, cooldown.
    #[must_use]
    pub fn fire_interval(&self) -> Duration {
        let rate = if self.fire_rate.is_nan() {
            FIRE_RATE_FLOOR
        } else {
            self.fire_rate.max(FIRE_RATE_FLOOR)
        };
        seconds(1.0 / rate)
    }

    /// Payload seeded into every projectile this tower fires.
    #[must_use]
    pub fn payload(&self) -> ProjectilePayload {
        ProjectilePayload {
            damage: self.damage,
            splash_radius: self.splash_radius,
            slow_amount: self.slow_amount.map(clamp_fraction),
            speed: PROJECTILE_SPEED,
        }
    }

    /// Checks the template for values the simulation cannot honour.
    ///
    /// A zero fire rate is accepted and clamped at runtime.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_magnitude(&self.name, "range", self.range)?;
        check_magnitude(&self.name, "fire rate", self.fire_rate)?;
        if let Some(radius) = self.splash_radius {
            check_magnitude(&self.name, "splash radius", radius)?;
        }
        if let Some(amount) = self.slow_amount {
            check_fraction(&self.name, "slow amount", amount)?;
        }
        Ok(())
    }
}

/// Damage package carried by a projectile from the firing tower to its target.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectilePayload {
    /// Damage applied to every enemy hit by the projectile.
    pub damage: u32,
    /// Splash radius for area-of-effect payloads.
    pub splash_radius: Option<f32>,
    /// Slow fraction applied to every enemy damaged by the impact.
    pub slow_amount: Option<f32>,
    /// Flight speed in world units per second.
    pub speed: f32,
}

impl ProjectilePayload {
    /// Reports whether the payload damages everything inside its splash radius.
    #[must_use]
    pub const fn is_aoe(&self) -> bool {
        self.splash_radius.is_some()
    }
}

/// Available towers ordered by ascending cost.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TowerCatalog {
    towers: Vec<TowerConfig>,
}

impl TowerCatalog {
    /// Builds a catalog, sorting the entries by cost while keeping authored order for ties.
    #[must_use]
    pub fn from_configs(mut towers: Vec<TowerConfig>) -> Self {
        towers.sort_by_key(|tower| tower.cost);
        Self { towers }
    }

    /// Iterator over the catalog entries from cheapest to most expensive.
    pub fn iter(&self) -> impl Iterator<Item = &TowerConfig> {
        self.towers.iter()
    }

    /// Looks up a tower template by name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&TowerConfig> {
        self.towers.iter().find(|tower| tower.name == name)
    }

    /// Number of towers in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.towers.len()
    }

    /// Reports whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.towers.is_empty()
    }
}

/// Group of identical enemies spawned back to back within a wave.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnemyGroup {
    /// Template used for every enemy in the group.
    pub enemy: EnemyConfig,
    /// Number of enemies to spawn.
    pub count: u32,
}

/// Authored burst of enemy groups.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Wave {
    /// Groups spawned in authored order.
    pub groups: Vec<EnemyGroup>,
    /// Seconds between individual spawns across the flattened sequence.
    pub time_between_spawns: f32,
    /// Seconds to wait after the last spawn before the next wave starts.
    pub time_to_next_wave: f32,
    /// Gold granted once the wave's last enemy has spawned.
    pub gold_reward: u32,
}

impl Wave {
    /// Flattened spawn order: every group's enemies, group by group.
    pub fn spawn_sequence(&self) -> impl Iterator<Item = &EnemyConfig> {
        self.groups.iter().flat_map(|group| {
            std::iter::repeat(&group.enemy).take(usize::try_from(group.count).unwrap_or(0))
        })
    }

    /// Total number of enemies the wave spawns.
    #[must_use]
    pub fn enemy_count(&self) -> u64 {
        self.groups.iter().map(|group| u64::from(group.count)).sum()
    }

    /// Delay between individual spawns.
    #[must_use]
    pub fn spawn_interval(&self) -> Duration {
        seconds(self.time_between_spawns)
    }

    /// Delay between the last spawn and the start of the next wave.
    #[must_use]
    pub fn next_wave_delay(&self) -> Duration {
        seconds(self.time_to_next_wave)
    }
}

/// Ordered sequence of waves making up a level.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WaveTimeline {
    /// Waves in play order.
    pub waves: Vec<Wave>,
}

impl WaveTimeline {
    /// Creates a timeline from the provided waves.
    #[must_use]
    pub fn new(waves: Vec<Wave>) -> Self {
        Self { waves }
    }

    /// Number of waves in the timeline.
    #[must_use]
    pub fn len(&self) -> usize {
        self.waves.len()
    }

    /// Reports whether the timeline holds no waves.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.waves.is_empty()
    }

    /// Checks that the timeline is playable and every enemy template is valid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.waves.is_empty() {
            return Err(ConfigError::EmptyTimeline);
        }
        for wave in &self.waves {
            for group in &wave.groups {
                group.enemy.validate()?;
            }
        }
        Ok(())
    }
}

/// Authored ground surface used to resolve waypoint and tower heights.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Ground {
    /// Level ground at a constant height everywhere.
    Flat {
        /// Height of the ground plane.
        height: f32,
    },
    /// Ground only exists on the listed cells.
    Tiles {
        /// Height of each cell that has ground.
        tiles: Vec<GroundTile>,
    },
}

impl Default for Ground {
    fn default() -> Self {
        Self::Flat { height: 0.0 }
    }
}

/// Height of the ground on a single grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroundTile {
    /// Cell the tile covers.
    pub cell: GridCell,
    /// Ground height on the cell.
    pub height: f32,
}

/// Placement of the grid in world space.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridLayout {
    /// Number of cell columns.
    pub columns: u32,
    /// Number of cell rows.
    pub rows: u32,
    /// Edge length of a square cell in world units.
    pub cell_size: f32,
    /// World position of the grid's lower corner.
    pub origin: Vec3,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            columns: 20,
            rows: 20,
            cell_size: 1.0,
            origin: Vec3::ZERO,
        }
    }
}

fn seconds(value: f32) -> Duration {
    Duration::try_from_secs_f32(value.max(0.0)).unwrap_or(Duration::MAX)
}

fn clamp_fraction(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

fn check_magnitude(name: &str, field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidMagnitude {
            name: name.to_owned(),
            field,
            value,
        })
    }
}

fn check_fraction(name: &str, field: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::FractionOutOfRange {
            name: name.to_owned(),
            field,
            value,
        })
    }
}
