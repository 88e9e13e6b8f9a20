//! Authoritative tower state management utilities.

use std::{collections::BTreeMap, time::Duration};

use glam::Vec3;
use waypoint_defence_core::{
    EnemyId, GridCell, TowerConfig, TowerId, TowerSnapshot, TURRET_TURN_RATE,
};

use crate::heading_towards;

/// Tower stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct Tower {
    /// Identifier allocated by the world for the tower.
    pub(crate) id: TowerId,
    /// Template the tower was built from.
    pub(crate) config: TowerConfig,
    /// Cell occupied by the tower.
    pub(crate) cell: GridCell,
    /// World position projectiles are launched from.
    pub(crate) position: Vec3,
    /// Enemy currently tracked, re-validated before every use.
    pub(crate) target: Option<EnemyId>,
    /// Time left before the next shot.
    pub(crate) cooldown: Duration,
    /// Turret heading in radians.
    pub(crate) yaw: f32,
}

impl Tower {
    fn new(id: TowerId, config: TowerConfig, cell: GridCell, position: Vec3) -> Self {
        Self {
            id,
            cooldown: config.fire_interval(),
            config,
            cell,
            position,
            target: None,
            yaw: 0.0,
        }
    }

    /// Counts the cooldown down and swings the turret towards the target.
    pub(crate) fn tick(&mut self, dt: Duration, target_position: Option<Vec3>) {
        self.cooldown = self.cooldown.saturating_sub(dt);
        if let Some(target) = target_position {
            let desired = heading_towards(self.position, target, self.yaw);
            let blend = (TURRET_TURN_RATE * dt.as_secs_f32()).min(1.0);
            self.yaw = wrap_angle(self.yaw + wrap_angle(desired - self.yaw) * blend);
        }
    }

    pub(crate) fn is_ready(&self) -> bool {
        self.cooldown.is_zero()
    }

    pub(crate) fn reload(&mut self) {
        self.cooldown = self.config.fire_interval();
    }

    pub(crate) fn snapshot(&self) -> TowerSnapshot {
        TowerSnapshot {
            id: self.id,
            name: self.config.name.clone(),
            cell: self.cell,
            position: self.position,
            range: self.config.range,
            target: self.target,
            ready_in: self.cooldown,
            yaw: self.yaw,
        }
    }
}

/// Registry that stores towers and manages identifier allocation.
#[derive(Debug)]
pub(crate) struct TowerRegistry {
    entries: BTreeMap<TowerId, Tower>,
    next_tower_id: TowerId,
}

impl TowerRegistry {
    /// Creates an empty tower registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_tower_id: TowerId::new(0),
        }
    }

    pub(crate) fn insert(&mut self, config: TowerConfig, cell: GridCell, position: Vec3) -> TowerId {
        let id = self.next_tower_id;
        self.next_tower_id = TowerId::new(id.get().saturating_add(1));
        let _ = self
            .entries
            .insert(id, Tower::new(id, config, cell, position));
        id
    }

    pub(crate) fn get(&self, id: TowerId) -> Option<&Tower> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: TowerId) -> Option<&mut Tower> {
        self.entries.get_mut(&id)
    }

    pub(crate) fn remove(&mut self, id: TowerId) -> Option<Tower> {
        self.entries.remove(&id)
    }

    pub(crate) fn at(&self, cell: GridCell) -> Option<TowerId> {
        self.entries
            .values()
            .find(|tower| tower.cell == cell)
            .map(|tower| tower.id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Tower> {
        self.entries.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Tower> {
        self.entries.values_mut()
    }

    /// Drops every reference to the enemy, returning the towers that lost their target.
    pub(crate) fn forget_enemy(&mut self, enemy: EnemyId) -> Vec<TowerId> {
        self.entries
            .values_mut()
            .filter(|tower| tower.target == Some(enemy))
            .map(|tower| {
                tower.target = None;
                tower.id
            })
            .collect()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}

fn wrap_angle(angle: f32) -> f32 {
    let turn = std::f32::consts::TAU;
    let wrapped = (angle + std::f32::consts::PI).rem_euclid(turn) - std::f32::consts::PI;
    if wrapped.is_finite() {
        wrapped
    } else {
        0.0
    }
}
