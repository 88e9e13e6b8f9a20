//! Ground height lookups.

use glam::Vec3;
use tracing::warn;
use waypoint_defence_core::Ground;

use crate::BuildGrid;

/// Authored ground surface that waypoints and towers rest on.
#[derive(Clone, Debug, Default)]
pub struct Terrain {
    ground: Ground,
}

impl Terrain {
    pub(crate) fn new(ground: Ground) -> Self {
        Self { ground }
    }

    /// Ground description the terrain was built from.
    #[must_use]
    pub fn ground(&self) -> &Ground {
        &self.ground
    }

    /// Height of the ground below the horizontal position, if any ground exists there.
    #[must_use]
    pub fn height_at(&self, grid: &BuildGrid, position: Vec3) -> Option<f32> {
        match &self.ground {
            Ground::Flat { height } => Some(*height),
            Ground::Tiles { tiles } => {
                let cell = grid.world_to_grid(position);
                tiles
                    .iter()
                    .find(|tile| tile.cell == cell)
                    .map(|tile| tile.height)
            }
        }
    }

    /// Places the position on the ground, defaulting to height zero where none exists.
    pub(crate) fn settle(&self, grid: &BuildGrid, position: Vec3) -> Vec3 {
        let height = self.height_at(grid, position).unwrap_or_else(|| {
            warn!(
                x = position.x,
                z = position.z,
                "no ground found below position, defaulting height to 0"
            );
            0.0
        });
        Vec3::new(position.x, height, position.z)
    }
}
