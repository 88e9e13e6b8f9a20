#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that keeps tower targets up to date from world snapshots.
//!
//! A tower keeps its current target for as long as that enemy is alive and
//! within range. Otherwise it picks the nearest live enemy within range, with
//! the first enemy in identifier order winning exact distance ties. Commands
//! are only emitted for towers whose target actually changes.

use glam::Vec3;
use waypoint_defence_core::{Command, EnemyId, EnemyView, GamePhase, TowerView};

/// Tower targeting system that reuses a scratch buffer to avoid repeated allocations.
#[derive(Debug, Default)]
pub struct TowerTargeting {
    enemy_workspace: Vec<EnemyCandidate>,
}

impl TowerTargeting {
    /// Creates a new tower targeting system with an empty scratch buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes target changes for the provided world snapshot.
    ///
    /// The output buffer is cleared before populating it with `SetTowerTarget`
    /// commands.
    pub fn handle(
        &mut self,
        phase: GamePhase,
        towers: &TowerView,
        enemies: &EnemyView,
        out: &mut Vec<Command>,
    ) {
        out.clear();

        if phase == GamePhase::Defeated || towers.is_empty() {
            return;
        }

        self.prepare_enemy_workspace(enemies);

        for tower in towers.iter() {
            let current = tower.target.filter(|enemy| {
                self.enemy_workspace
                    .iter()
                    .find(|candidate| candidate.id == *enemy)
                    .is_some_and(|candidate| candidate.within(tower.position, tower.range))
            });
            let next = current.or_else(|| self.nearest(tower.position, tower.range));
            if next != tower.target {
                out.push(Command::SetTowerTarget {
                    tower: tower.id,
                    target: next,
                });
            }
        }
    }

    /// Reports which enemy a tower at `position` would pick when it has no target.
    #[must_use]
    pub fn preview(&mut self, position: Vec3, range: f32, enemies: &EnemyView) -> Option<EnemyId> {
        self.prepare_enemy_workspace(enemies);
        self.nearest(position, range)
    }

    fn nearest(&self, position: Vec3, range: f32) -> Option<EnemyId> {
        let mut best: Option<(EnemyId, f32)> = None;
        for candidate in &self.enemy_workspace {
            let distance = candidate.position.distance(position);
            if distance > range {
                continue;
            }
            match best {
                Some((_, closest)) if distance >= closest => {}
                _ => best = Some((candidate.id, distance)),
            }
        }
        best.map(|(id, _)| id)
    }

    fn prepare_enemy_workspace(&mut self, enemies: &EnemyView) {
        self.enemy_workspace.clear();
        self.enemy_workspace.reserve(enemies.len());
        for snapshot in enemies.iter() {
            if snapshot.health == 0 {
                continue;
            }
            self.enemy_workspace.push(EnemyCandidate {
                id: snapshot.id,
                position: snapshot.position,
            });
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct EnemyCandidate {
    id: EnemyId,
    position: Vec3,
}

impl EnemyCandidate {
    fn within(&self, position: Vec3, range: f32) -> bool {
        self.position.distance(position) <= range
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use waypoint_defence_core::{EnemySnapshot, GridCell, TowerId, TowerSnapshot};

    fn tower(id: u32, position: Vec3, range: f32, target: Option<u32>) -> TowerSnapshot {
        TowerSnapshot {
            id: TowerId::new(id),
            name: "Archer".to_owned(),
            cell: GridCell::new(0, 0),
            position,
            range,
            target: target.map(EnemyId::new),
            ready_in: Duration::ZERO,
            yaw: 0.0,
        }
    }

    fn enemy(id: u32, position: Vec3) -> EnemySnapshot {
        EnemySnapshot {
            id: EnemyId::new(id),
            position,
            heading: 0.0,
            health: 100,
            max_health: 100,
            speed: 5.0,
            slow: 0.0,
            next_waypoint: 1,
        }
    }

    fn targets(out: &[Command]) -> Vec<(TowerId, Option<EnemyId>)> {
        out.iter()
            .filter_map(|command| match command {
                Command::SetTowerTarget { tower, target } => Some((*tower, *target)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn acquires_nearest_enemy_in_range() {
        let mut system = TowerTargeting::new();
        let towers = TowerView::from_snapshots(vec![tower(1, Vec3::ZERO, 5.0, None)]);
        let enemies = EnemyView::from_snapshots(vec![
            enemy(3, Vec3::new(4.0, 0.0, 0.0)),
            enemy(4, Vec3::new(0.0, 0.0, 2.0)),
            enemy(5, Vec3::new(9.0, 0.0, 0.0)),
        ]);

        let mut out = Vec::new();
        system.handle(GamePhase::Running, &towers, &enemies, &mut out);

        assert_eq!(
            targets(&out),
            vec![(TowerId::new(1), Some(EnemyId::new(4)))]
        );
    }

    #[test]
    fn range_boundary_is_inclusive() {
        let mut system = TowerTargeting::new();
        let enemies = EnemyView::from_snapshots(vec![enemy(1, Vec3::new(5.0, 0.0, 0.0))]);
        assert_eq!(
            system.preview(Vec3::ZERO, 5.0, &enemies),
            Some(EnemyId::new(1))
        );
        assert_eq!(system.preview(Vec3::ZERO, 4.99, &enemies), None);
    }

    #[test]
    fn first_enemy_wins_exact_ties() {
        let mut system = TowerTargeting::new();
        let enemies = EnemyView::from_snapshots(vec![
            enemy(8, Vec3::new(-3.0, 0.0, 0.0)),
            enemy(2, Vec3::new(3.0, 0.0, 0.0)),
        ]);
        assert_eq!(
            system.preview(Vec3::ZERO, 5.0, &enemies),
            Some(EnemyId::new(2))
        );
    }

    #[test]
    fn keeps_current_target_even_when_a_closer_enemy_appears() {
        let mut system = TowerTargeting::new();
        let towers = TowerView::from_snapshots(vec![tower(1, Vec3::ZERO, 5.0, Some(7))]);
        let enemies = EnemyView::from_snapshots(vec![
            enemy(7, Vec3::new(4.5, 0.0, 0.0)),
            enemy(9, Vec3::new(0.5, 0.0, 0.0)),
        ]);

        let mut out = Vec::new();
        system.handle(GamePhase::Running, &towers, &enemies, &mut out);

        assert!(out.is_empty());
    }

    #[test]
    fn switches_when_current_target_leaves_range() {
        let mut system = TowerTargeting::new();
        let towers = TowerView::from_snapshots(vec![tower(1, Vec3::ZERO, 5.0, Some(7))]);
        let enemies = EnemyView::from_snapshots(vec![
            enemy(7, Vec3::new(5.5, 0.0, 0.0)),
            enemy(9, Vec3::new(1.0, 0.0, 0.0)),
        ]);

        let mut out = Vec::new();
        system.handle(GamePhase::Running, &towers, &enemies, &mut out);

        assert_eq!(
            targets(&out),
            vec![(TowerId::new(1), Some(EnemyId::new(9)))]
        );
    }

    #[test]
    fn clears_target_that_no_longer_exists() {
        let mut system = TowerTargeting::new();
        let towers = TowerView::from_snapshots(vec![tower(1, Vec3::ZERO, 5.0, Some(7))]);
        let enemies = EnemyView::default();

        let mut out = Vec::new();
        system.handle(GamePhase::Running, &towers, &enemies, &mut out);

        assert_eq!(targets(&out), vec![(TowerId::new(1), None)]);
    }

    #[test]
    fn defeated_session_clears_output() {
        let mut system = TowerTargeting::new();
        let towers = TowerView::from_snapshots(vec![tower(1, Vec3::ZERO, 5.0, None)]);
        let enemies = EnemyView::from_snapshots(vec![enemy(1, Vec3::ZERO)]);

        let mut out = vec![Command::StartGame];
        system.handle(GamePhase::Defeated, &towers, &enemies, &mut out);
        assert!(out.is_empty());
    }
}
