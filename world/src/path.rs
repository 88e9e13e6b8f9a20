//! Enemy path generated once from authored grid coordinates.

use glam::Vec3;
use tracing::{info, warn};
use waypoint_defence_core::{GridCell, PathError};

use crate::{BuildGrid, Terrain};

/// Ordered world-space waypoints followed by every enemy.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Path {
    waypoints: Vec<Vec3>,
}

impl Path {
    /// Waypoints in travel order.
    #[must_use]
    pub fn waypoints(&self) -> &[Vec3] {
        &self.waypoints
    }

    /// Number of waypoints on the path.
    #[must_use]
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// Reports whether the path has no waypoints.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Reports whether enemies can walk the path.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.waypoints.len() >= 2
    }

    /// Total walking distance from the first to the last waypoint.
    #[must_use]
    pub fn length(&self) -> f32 {
        self.waypoints
            .windows(2)
            .map(|pair| pair[0].distance(pair[1]))
            .sum()
    }
}

/// Builds the path, marking every in-bounds coordinate's cell as not buildable.
///
/// Out-of-bounds coordinates and consecutive duplicates are skipped. The grid
/// is still updated for the coordinates that were usable when the resulting
/// path turns out too short to walk.
pub(crate) fn generate(
    cells: &[GridCell],
    grid: &mut BuildGrid,
    terrain: &Terrain,
) -> Result<Path, PathError> {
    if cells.len() < 2 {
        let supplied = u32::try_from(cells.len()).unwrap_or(u32::MAX);
        warn!(supplied, "path needs at least two coordinates");
        return Err(PathError::TooFewCoordinates { supplied });
    }

    let mut waypoints = Vec::with_capacity(cells.len());
    let mut previous: Option<GridCell> = None;
    for (index, cell) in cells.iter().copied().enumerate() {
        if !grid.contains(cell) {
            warn!(
                index,
                column = cell.column(),
                row = cell.row(),
                "skipping path coordinate outside the grid"
            );
            continue;
        }
        grid.set_buildable(cell, false);
        if previous == Some(cell) {
            warn!(
                index,
                column = cell.column(),
                row = cell.row(),
                "skipping repeated path coordinate"
            );
            continue;
        }
        previous = Some(cell);
        waypoints.push(terrain.settle(grid, grid.grid_to_world(cell)));
    }

    if waypoints.len() < 2 {
        let usable = u32::try_from(waypoints.len()).unwrap_or(u32::MAX);
        warn!(usable, "too few usable path coordinates, path left empty");
        return Err(PathError::TooFewUsableWaypoints { usable });
    }

    info!(waypoints = waypoints.len(), "path generated");
    Ok(Path { waypoints })
}
