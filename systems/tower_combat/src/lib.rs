#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that emits projectile firing commands for ready towers.
//!
//! Firing is not gated on the turret facing its target; the world resets the
//! cooldown of every tower that actually fires.

use waypoint_defence_core::{Command, GamePhase, TowerView};

/// Tower combat system that queues firing commands for ready towers.
#[derive(Debug, Default)]
pub struct TowerCombat {
    scratch: Vec<Command>,
}

impl TowerCombat {
    /// Creates a new tower combat system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `Command::FireProjectile` entries for towers with a target and no cooldown left.
    pub fn handle(&mut self, phase: GamePhase, towers: &TowerView, out: &mut Vec<Command>) {
        if phase == GamePhase::Defeated || towers.is_empty() {
            return;
        }

        self.scratch.clear();

        for tower in towers.iter() {
            let Some(target) = tower.target else {
                continue;
            };
            if tower.ready_in.is_zero() {
                self.scratch.push(Command::FireProjectile {
                    tower: tower.id,
                    target,
                });
            }
        }

        if self.scratch.is_empty() {
            return;
        }

        out.reserve(self.scratch.len());
        out.append(&mut self.scratch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use std::time::Duration;
    use waypoint_defence_core::{EnemyId, GridCell, TowerId, TowerSnapshot};

    #[test]
    fn defeated_session_is_silent() {
        let mut system = TowerCombat::new();
        let towers = TowerView::from_snapshots(vec![snapshot(1, Some(7), Duration::ZERO)]);
        let mut out = Vec::new();

        system.handle(GamePhase::Defeated, &towers, &mut out);

        assert!(out.is_empty());
    }

    #[test]
    fn firing_respects_cooldown_readiness() {
        let mut system = TowerCombat::new();
        let towers = TowerView::from_snapshots(vec![
            snapshot(5, Some(1), Duration::ZERO),
            snapshot(2, Some(4), Duration::ZERO),
        ]);
        let mut out = Vec::new();

        system.handle(GamePhase::Running, &towers, &mut out);

        assert_eq!(
            out,
            vec![
                Command::FireProjectile {
                    tower: TowerId::new(2),
                    target: EnemyId::new(4),
                },
                Command::FireProjectile {
                    tower: TowerId::new(5),
                    target: EnemyId::new(1),
                },
            ],
        );
    }

    #[test]
    fn cooling_or_idle_towers_are_skipped() {
        let mut system = TowerCombat::new();
        let towers = TowerView::from_snapshots(vec![
            snapshot(3, Some(9), Duration::from_millis(250)),
            snapshot(8, Some(2), Duration::ZERO),
            snapshot(11, None, Duration::ZERO),
        ]);
        let mut out = vec![Command::StartGame];

        system.handle(GamePhase::Building, &towers, &mut out);

        assert_eq!(
            out,
            vec![
                Command::StartGame,
                Command::FireProjectile {
                    tower: TowerId::new(8),
                    target: EnemyId::new(2),
                },
            ],
        );
    }

    fn snapshot(tower: u32, target: Option<u32>, ready_in: Duration) -> TowerSnapshot {
        TowerSnapshot {
            id: TowerId::new(tower),
            name: "Archer".to_owned(),
            cell: GridCell::new(0, 0),
            position: Vec3::ZERO,
            range: 5.0,
            target: target.map(EnemyId::new),
            ready_in,
            yaw: 0.0,
        }
    }
}
