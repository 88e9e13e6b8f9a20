use serde::Deserialize;
use thiserror::Error;
use waypoint_defence_core::{
    ConfigError, EnemyConfig, EnemyGroup, GridCell, GridLayout, Ground, PathError, TowerCatalog,
    TowerConfig, Wave, WaveTimeline, DEFAULT_STARTING_GOLD, DEFAULT_STARTING_HEALTH,
};

/// Scenario document version understood by this build.
pub const SUPPORTED_SCENARIO_VERSION: u32 = 1;

/// Errors raised while loading or resolving a scenario document.
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// The document is not valid scenario TOML.
    #[error("failed to parse scenario: {0}")]
    Parse(#[from] toml::de::Error),
    /// The document declares a version this build cannot read.
    #[error("unsupported scenario version {found}; expected {expected}")]
    UnsupportedVersion {
        /// Version declared by the document.
        found: u32,
        /// Version this build understands.
        expected: u32,
    },
    /// A wave references an enemy missing from the enemy catalog.
    #[error("wave {wave} references unknown enemy `{name}`")]
    UnknownEnemy {
        /// One-based number of the offending wave.
        wave: u32,
        /// Enemy name that failed to resolve.
        name: String,
    },
    /// Two catalog entries share a name.
    #[error("scenario defines `{name}` more than once")]
    DuplicateName {
        /// Name declared twice.
        name: String,
    },
    /// An enemy, tower or wave template failed validation.
    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),
    /// The path coordinates did not produce a usable path.
    #[error("scenario path rejected: {0}")]
    InvalidPath(PathError),
}

/// Starting resources of a scenario.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct EconomySettings {
    /// Gold available before the first purchase.
    #[serde(default = "default_gold")]
    pub starting_gold: u32,
    /// Base health before the first leak.
    #[serde(default = "default_health")]
    pub starting_health: u32,
}

impl Default for EconomySettings {
    fn default() -> Self {
        Self {
            starting_gold: DEFAULT_STARTING_GOLD,
            starting_health: DEFAULT_STARTING_HEALTH,
        }
    }
}

/// Group entry of an authored wave, naming its enemy by catalog name.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct GroupEntry {
    /// Name of an enemy in the scenario's enemy catalog.
    pub enemy: String,
    /// Number of enemies to spawn.
    pub count: u32,
}

/// Authored wave before enemy names are resolved.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct WaveEntry {
    /// Groups in spawn order.
    pub groups: Vec<GroupEntry>,
    /// Seconds between individual spawns.
    pub time_between_spawns: f32,
    /// Seconds between the wave's last spawn and the next wave.
    pub time_to_next_wave: f32,
    /// Gold granted once the wave has fully spawned.
    #[serde(default)]
    pub gold_reward: u32,
}

/// Complete authored level: grid, path, economy, catalogs and waves.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Scenario {
    /// Document version, see [`SUPPORTED_SCENARIO_VERSION`].
    pub version: u32,
    /// Grid placement in world space.
    #[serde(default)]
    pub grid: GridLayout,
    /// Ground surface used for waypoint and tower heights.
    #[serde(default)]
    pub ground: Ground,
    /// Ordered path coordinates.
    pub path: Vec<GridCell>,
    /// Starting resources.
    #[serde(default)]
    pub economy: EconomySettings,
    /// Enemy catalog referenced by waves.
    pub enemies: Vec<EnemyConfig>,
    /// Towers the player may build.
    pub towers: Vec<TowerConfig>,
    /// Waves in play order.
    pub waves: Vec<WaveEntry>,
}

impl Scenario {
    /// Parses a scenario from TOML text and checks its version.
    pub fn from_toml_str(contents: &str) -> Result<Self, ScenarioError> {
        let scenario: Self = toml::from_str(contents)?;
        if scenario.version != SUPPORTED_SCENARIO_VERSION {
            return Err(ScenarioError::UnsupportedVersion {
                found: scenario.version,
                expected: SUPPORTED_SCENARIO_VERSION,
            });
        }
        Ok(scenario)
    }

    /// Validates every tower and returns them sorted by ascending cost.
    pub fn catalog(&self) -> Result<TowerCatalog, ScenarioError> {
        for (index, tower) in self.towers.iter().enumerate() {
            tower.validate()?;
            if self.towers[..index]
                .iter()
                .any(|other| other.name == tower.name)
            {
                return Err(ScenarioError::DuplicateName {
                    name: tower.name.clone(),
                });
            }
        }
        Ok(TowerCatalog::from_configs(self.towers.clone()))
    }

    /// Resolves enemy names and validates the resulting timeline.
    pub fn timeline(&self) -> Result<WaveTimeline, ScenarioError> {
        for (index, enemy) in self.enemies.iter().enumerate() {
            if self.enemies[..index]
                .iter()
                .any(|other| other.name == enemy.name)
            {
                return Err(ScenarioError::DuplicateName {
                    name: enemy.name.clone(),
                });
            }
        }

        let mut waves = Vec::with_capacity(self.waves.len());
        for (number, entry) in (1_u32..).zip(&self.waves) {
            let mut groups = Vec::with_capacity(entry.groups.len());
            for group in &entry.groups {
                let enemy = self
                    .enemies
                    .iter()
                    .find(|enemy| enemy.name == group.enemy)
                    .ok_or_else(|| ScenarioError::UnknownEnemy {
                        wave: number,
                        name: group.enemy.clone(),
                    })?;
                groups.push(EnemyGroup {
                    enemy: enemy.clone(),
                    count: group.count,
                });
            }
            waves.push(Wave {
                groups,
                time_between_spawns: entry.time_between_spawns,
                time_to_next_wave: entry.time_to_next_wave,
                gold_reward: entry.gold_reward,
            });
        }

        let timeline = WaveTimeline::new(waves);
        timeline.validate()?;
        Ok(timeline)
    }
}

const fn default_gold() -> u32 {
    DEFAULT_STARTING_GOLD
}

const fn default_health() -> u32 {
    DEFAULT_STARTING_HEALTH
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
version = 1
path = [{ column = 0, row = 0 }, { column = 5, row = 0 }]

[[enemies]]
name = "Grunt"
max_health = 100
move_speed = 2.0
base_damage = 10
gold_reward = 10

[[towers]]
name = "Cannon"
cost = 150
range = 4.0
fire_rate = 0.5
damage = 40
splash_radius = 2.0

[[towers]]
name = "Archer"
cost = 100
range = 5.0
fire_rate = 1.0
damage = 20

[[waves]]
time_between_spawns = 1.0
time_to_next_wave = 5.0
gold_reward = 50
groups = [{ enemy = "Grunt", count = 3 }]
"#;

    #[test]
    fn minimal_document_uses_defaults() {
        let scenario = Scenario::from_toml_str(MINIMAL).expect("scenario parses");
        assert_eq!(scenario.grid, GridLayout::default());
        assert_eq!(scenario.ground, Ground::default());
        assert_eq!(scenario.economy, EconomySettings::default());

        let catalog = scenario.catalog().expect("towers valid");
        let names: Vec<&str> = catalog.iter().map(|tower| tower.name.as_str()).collect();
        assert_eq!(names, vec!["Archer", "Cannon"]);

        let timeline = scenario.timeline().expect("waves resolve");
        assert_eq!(timeline.len(), 1);
        assert_eq!(timeline.waves[0].enemy_count(), 3);
    }

    #[test]
    fn unknown_enemy_fails_resolution() {
        let contents = MINIMAL.replace("enemy = \"Grunt\"", "enemy = \"Ghost\"");
        let scenario = Scenario::from_toml_str(&contents).expect("scenario parses");
        let error = scenario.timeline().expect_err("ghost is unknown");
        assert!(matches!(
            error,
            ScenarioError::UnknownEnemy { wave: 1, ref name } if name == "Ghost"
        ));
    }

    #[test]
    fn future_version_is_refused() {
        let contents = MINIMAL.replace("version = 1", "version = 2");
        let error = Scenario::from_toml_str(&contents).expect_err("version 2 unsupported");
        assert!(matches!(
            error,
            ScenarioError::UnsupportedVersion {
                found: 2,
                expected: 1
            }
        ));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let error = Scenario::from_toml_str("version = ").expect_err("truncated document");
        assert!(matches!(error, ScenarioError::Parse(_)));
    }

    #[test]
    fn duplicate_tower_names_are_refused() {
        let contents = MINIMAL.replace("name = \"Cannon\"", "name = \"Archer\"");
        let scenario = Scenario::from_toml_str(&contents).expect("scenario parses");
        assert!(matches!(
            scenario.catalog(),
            Err(ScenarioError::DuplicateName { ref name }) if name == "Archer"
        ));
    }
}
