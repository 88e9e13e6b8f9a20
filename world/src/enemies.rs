//! Enemy agents walking the path.

use std::{collections::BTreeMap, time::Duration};

use glam::Vec3;
use waypoint_defence_core::{
    EnemyConfig, EnemyId, EnemySnapshot, SLOW_DURATION, WAYPOINT_ARRIVAL_EPSILON,
};

use crate::{heading_towards, move_towards};

/// Lifecycle of an enemy. `Dying` and `ReachedBase` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum EnemyState {
    Spawned,
    Moving,
    Dying,
    ReachedBase,
}

/// Result of advancing an enemy for one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Movement {
    Idle,
    Moved,
    ReachedWaypoint(u32),
    ReachedBase,
}

/// Result of applying damage to an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum DamageOutcome {
    Ignored,
    Damaged { amount: u32, remaining: u32 },
    Killed { amount: u32 },
}

#[derive(Clone, Debug)]
pub(crate) struct Enemy {
    pub(crate) id: EnemyId,
    pub(crate) config: EnemyConfig,
    pub(crate) state: EnemyState,
    pub(crate) position: Vec3,
    pub(crate) heading: f32,
    pub(crate) health: u32,
    pub(crate) slow: f32,
    pub(crate) slow_remaining: Duration,
    pub(crate) next_waypoint: usize,
}

impl Enemy {
    /// Places the enemy on the first waypoint, facing the second.
    fn spawn(id: EnemyId, config: EnemyConfig, waypoints: &[Vec3]) -> Self {
        let position = waypoints.first().copied().unwrap_or(Vec3::ZERO);
        let heading = waypoints
            .get(1)
            .map_or(0.0, |next| heading_towards(position, *next, 0.0));
        Self {
            id,
            health: config.max_health,
            config,
            state: EnemyState::Spawned,
            position,
            heading,
            slow: 0.0,
            slow_remaining: Duration::ZERO,
            next_waypoint: 1,
        }
    }

    pub(crate) const fn is_alive(&self) -> bool {
        matches!(self.state, EnemyState::Spawned | EnemyState::Moving)
    }

    /// Speed after the active slow is applied.
    pub(crate) fn speed(&self) -> f32 {
        self.config.base_speed() * (1.0 - self.slow)
    }

    pub(crate) fn advance(&mut self, waypoints: &[Vec3], dt: Duration) -> Movement {
        if !self.is_alive() {
            return Movement::Idle;
        }
        self.state = EnemyState::Moving;

        let Some(target) = waypoints.get(self.next_waypoint).copied() else {
            self.state = EnemyState::ReachedBase;
            return Movement::ReachedBase;
        };

        let step = self.speed() * dt.as_secs_f32();
        self.position = move_towards(self.position, target, step);
        self.heading = heading_towards(self.position, target, self.heading);

        if self.position.distance(target) >= WAYPOINT_ARRIVAL_EPSILON {
            return Movement::Moved;
        }

        self.next_waypoint += 1;
        if self.next_waypoint >= waypoints.len() {
            self.state = EnemyState::ReachedBase;
            return Movement::ReachedBase;
        }
        Movement::ReachedWaypoint(u32::try_from(self.next_waypoint).unwrap_or(u32::MAX))
    }

    /// Applies armor-reduced damage, rounded half away from zero.
    pub(crate) fn take_damage(&mut self, amount: u32) -> DamageOutcome {
        if !self.is_alive() {
            return DamageOutcome::Ignored;
        }
        let reduced = (amount as f32 * (1.0 - self.config.armor_fraction())).round();
        let applied = (reduced as u32).min(self.health);
        self.health -= applied;
        if self.health == 0 {
            self.state = EnemyState::Dying;
            return DamageOutcome::Killed { amount: applied };
        }
        DamageOutcome::Damaged {
            amount: applied,
            remaining: self.health,
        }
    }

    /// Keeps the strongest slow and restarts the wear-off timer.
    pub(crate) fn apply_slow(&mut self, amount: f32) {
        if !self.is_alive() {
            return;
        }
        self.slow = self.slow.max(amount.clamp(0.0, 1.0));
        self.slow_remaining = SLOW_DURATION;
    }

    /// Counts the slow down, returning `true` on the tick it wears off.
    pub(crate) fn tick_slow(&mut self, dt: Duration) -> bool {
        if self.slow_remaining.is_zero() {
            return false;
        }
        self.slow_remaining = self.slow_remaining.saturating_sub(dt);
        if self.slow_remaining.is_zero() {
            self.slow = 0.0;
            return true;
        }
        false
    }

    pub(crate) fn snapshot(&self) -> EnemySnapshot {
        EnemySnapshot {
            id: self.id,
            position: self.position,
            heading: self.heading,
            health: self.health,
            max_health: self.config.max_health,
            speed: self.speed(),
            slow: self.slow,
            next_waypoint: u32::try_from(self.next_waypoint).unwrap_or(u32::MAX),
        }
    }
}

/// Registry of live enemies keyed by identifier.
#[derive(Debug)]
pub(crate) struct EnemyRegistry {
    entries: BTreeMap<EnemyId, Enemy>,
    next_enemy_id: EnemyId,
}

impl EnemyRegistry {
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_enemy_id: EnemyId::new(0),
        }
    }

    pub(crate) fn spawn(&mut self, config: EnemyConfig, waypoints: &[Vec3]) -> &Enemy {
        let id = self.next_enemy_id;
        self.next_enemy_id = EnemyId::new(id.get().saturating_add(1));
        self.entries
            .entry(id)
            .or_insert_with(|| Enemy::spawn(id, config, waypoints))
    }

    pub(crate) fn get(&self, id: EnemyId) -> Option<&Enemy> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: EnemyId) -> Option<&mut Enemy> {
        self.entries.get_mut(&id)
    }

    pub(crate) fn remove(&mut self, id: EnemyId) -> Option<Enemy> {
        self.entries.remove(&id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Enemy> {
        self.entries.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Enemy> {
        self.entries.values_mut()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grunt() -> EnemyConfig {
        EnemyConfig::new("Grunt", 100, 5.0, 10, 10)
    }

    fn straight_path() -> Vec<Vec3> {
        vec![
            Vec3::new(0.5, 0.0, 0.5),
            Vec3::new(5.5, 0.0, 0.5),
            Vec3::new(5.5, 0.0, 5.5),
        ]
    }

    #[test]
    fn spawn_snaps_to_first_waypoint_facing_the_second() {
        let enemy = Enemy::spawn(EnemyId::new(0), grunt(), &straight_path());
        assert_eq!(enemy.position, Vec3::new(0.5, 0.0, 0.5));
        assert!((enemy.heading - std::f32::consts::FRAC_PI_2).abs() < 1e-5);
        assert_eq!(enemy.state, EnemyState::Spawned);
    }

    #[test]
    fn enemy_walks_to_base_exactly_once() {
        let path = straight_path();
        let mut enemy = Enemy::spawn(EnemyId::new(0), grunt(), &path);
        let dt = Duration::from_millis(100);
        let mut reached_base = 0;
        let mut waypoints = Vec::new();
        for _ in 0..100 {
            match enemy.advance(&path, dt) {
                Movement::ReachedWaypoint(index) => waypoints.push(index),
                Movement::ReachedBase => reached_base += 1,
                Movement::Moved | Movement::Idle => {}
            }
        }
        assert_eq!(waypoints, vec![2]);
        assert_eq!(reached_base, 1);
        assert_eq!(enemy.state, EnemyState::ReachedBase);
    }

    #[test]
    fn armor_reduces_damage_with_rounding() {
        let mut enemy = Enemy::spawn(EnemyId::new(0), grunt().armored(0.25), &straight_path());
        assert_eq!(
            enemy.take_damage(10),
            DamageOutcome::Damaged {
                amount: 8,
                remaining: 92
            }
        );
    }

    #[test]
    fn lethal_damage_kills_once_and_never_goes_negative() {
        let mut enemy = Enemy::spawn(EnemyId::new(0), grunt(), &straight_path());
        assert_eq!(enemy.take_damage(250), DamageOutcome::Killed { amount: 100 });
        assert_eq!(enemy.health, 0);
        assert_eq!(enemy.take_damage(10), DamageOutcome::Ignored);
    }

    #[test]
    fn strongest_slow_wins_and_wears_off() {
        let mut enemy = Enemy::spawn(EnemyId::new(0), grunt(), &straight_path());
        let base = enemy.speed();

        enemy.apply_slow(0.3);
        assert!(!enemy.tick_slow(Duration::from_millis(500)));
        enemy.apply_slow(0.5);
        assert_eq!(enemy.slow, 0.5);
        assert!((enemy.speed() - base * 0.5).abs() < 1e-6);

        enemy.apply_slow(0.2);
        assert_eq!(enemy.slow, 0.5);

        assert!(!enemy.tick_slow(Duration::from_millis(1_999)));
        assert!(enemy.tick_slow(Duration::from_millis(1)));
        assert_eq!(enemy.speed(), base);
    }

    #[test]
    fn registry_allocates_increasing_identifiers() {
        let mut registry = EnemyRegistry::new();
        let first = registry.spawn(grunt(), &straight_path()).id;
        let second = registry.spawn(grunt(), &straight_path()).id;
        assert!(first < second);
        assert!(registry.remove(first).is_some());
        assert!(registry.get(first).is_none());
        assert!(registry.get(second).is_some());
    }
}
