//! Projectiles in flight.

use std::{collections::BTreeMap, time::Duration};

use glam::Vec3;
use waypoint_defence_core::{
    EnemyId, ProjectileId, ProjectilePayload, TowerId, PROJECTILE_COLLISION_RADIUS,
    PROJECTILE_MAX_LIFETIME,
};

use crate::move_towards;

/// Outcome of one flight step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Flight {
    Flying,
    Impacted(Vec3),
    Expired,
}

#[derive(Clone, Debug)]
pub(crate) struct Projectile {
    pub(crate) id: ProjectileId,
    pub(crate) tower: TowerId,
    pub(crate) target: EnemyId,
    pub(crate) position: Vec3,
    pub(crate) payload: ProjectilePayload,
    pub(crate) lifetime: Duration,
}

impl Projectile {
    /// Ages the projectile and moves it towards the target's current position.
    ///
    /// `target_position` is `None` once the target no longer exists.
    pub(crate) fn advance(&mut self, dt: Duration, target_position: Option<Vec3>) -> Flight {
        self.lifetime = self.lifetime.saturating_add(dt);
        let Some(target) = target_position else {
            return Flight::Expired;
        };
        if self.lifetime > PROJECTILE_MAX_LIFETIME {
            return Flight::Expired;
        }
        if self.position.distance(target) <= PROJECTILE_COLLISION_RADIUS {
            return Flight::Impacted(self.position);
        }
        self.position = move_towards(self.position, target, self.payload.speed * dt.as_secs_f32());
        Flight::Flying
    }
}

#[derive(Debug)]
pub(crate) struct ProjectileRegistry {
    entries: BTreeMap<ProjectileId, Projectile>,
    next_projectile_id: ProjectileId,
}

impl ProjectileRegistry {
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_projectile_id: ProjectileId::new(0),
        }
    }

    pub(crate) fn launch(
        &mut self,
        tower: TowerId,
        target: EnemyId,
        position: Vec3,
        payload: ProjectilePayload,
    ) -> ProjectileId {
        let id = self.next_projectile_id;
        self.next_projectile_id = ProjectileId::new(id.get().saturating_add(1));
        let _ = self.entries.insert(
            id,
            Projectile {
                id,
                tower,
                target,
                position,
                payload,
                lifetime: Duration::ZERO,
            },
        );
        id
    }

    pub(crate) fn remove(&mut self, id: ProjectileId) -> Option<Projectile> {
        self.entries.remove(&id)
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Projectile> {
        self.entries.values_mut()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waypoint_defence_core::TowerConfig;

    fn launch(registry: &mut ProjectileRegistry, position: Vec3) -> ProjectileId {
        let payload = TowerConfig::new("Archer", 100, 5.0, 1.0, 20).payload();
        registry.launch(TowerId::new(0), EnemyId::new(0), position, payload)
    }

    #[test]
    fn projectile_flies_then_impacts() {
        let mut registry = ProjectileRegistry::new();
        let _ = launch(&mut registry, Vec3::ZERO);
        let target = Vec3::new(4.0, 0.0, 0.0);
        let dt = Duration::from_millis(100);

        let projectile = registry.iter_mut().next().expect("projectile");
        assert_eq!(projectile.advance(dt, Some(target)), Flight::Flying);
        assert_eq!(projectile.position, Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(projectile.advance(dt, Some(target)), Flight::Flying);
        assert_eq!(
            projectile.advance(dt, Some(target)),
            Flight::Impacted(Vec3::new(4.0, 0.0, 0.0))
        );
    }

    #[test]
    fn projectile_expires_when_target_vanishes() {
        let mut registry = ProjectileRegistry::new();
        let id = launch(&mut registry, Vec3::ZERO);
        let projectile = registry.iter_mut().next().expect("projectile");
        assert_eq!(
            projectile.advance(Duration::from_millis(16), None),
            Flight::Expired
        );
        assert!(registry.remove(id).is_some());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn projectile_expires_after_max_lifetime() {
        let mut registry = ProjectileRegistry::new();
        let _ = launch(&mut registry, Vec3::ZERO);
        let projectile = registry.iter_mut().next().expect("projectile");
        let unreachable = Vec3::new(1_000.0, 0.0, 0.0);
        assert_eq!(
            projectile.advance(Duration::from_secs(5), Some(unreachable)),
            Flight::Flying
        );
        assert_eq!(
            projectile.advance(Duration::from_millis(1), Some(unreachable)),
            Flight::Expired
        );
    }
}
