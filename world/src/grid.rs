//! Buildability table and coordinate conversion for the placement grid.

use glam::Vec3;
use tracing::warn;
use waypoint_defence_core::{GridCell, GridLayout};

/// Describes the discrete cell layout of the world and which cells accept towers.
#[derive(Clone, Debug)]
pub struct BuildGrid {
    layout: GridLayout,
    buildable: Vec<bool>,
}

impl BuildGrid {
    /// Creates a grid where every cell starts buildable.
    ///
    /// A non-positive or non-finite cell size is replaced with one world unit.
    pub(crate) fn new(mut layout: GridLayout) -> Self {
        if !(layout.cell_size.is_finite() && layout.cell_size > 0.0) {
            warn!(
                cell_size = layout.cell_size,
                "invalid grid cell size, falling back to 1.0"
            );
            layout.cell_size = 1.0;
        }
        let capacity = u64::from(layout.columns) * u64::from(layout.rows);
        Self {
            layout,
            buildable: vec![true; usize::try_from(capacity).unwrap_or(0)],
        }
    }

    /// Number of columns contained in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.layout.columns
    }

    /// Number of rows contained in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.layout.rows
    }

    /// Side length of a single square cell expressed in world units.
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.layout.cell_size
    }

    /// World position of the grid's lower corner.
    #[must_use]
    pub const fn origin(&self) -> Vec3 {
        self.layout.origin
    }

    /// Layout the grid was built from.
    #[must_use]
    pub const fn layout(&self) -> GridLayout {
        self.layout
    }

    /// Reports whether the cell lies inside the configured extent.
    #[must_use]
    pub fn contains(&self, cell: GridCell) -> bool {
        self.index(cell).is_some()
    }

    /// Converts a world position into the cell containing it.
    ///
    /// The vertical coordinate is ignored. Positions outside the grid yield
    /// cells outside the extent rather than being clamped.
    #[must_use]
    pub fn world_to_grid(&self, position: Vec3) -> GridCell {
        let local = position - self.layout.origin;
        let size = self.layout.cell_size;
        GridCell::new(
            (local.x / size).floor() as i32,
            (local.z / size).floor() as i32,
        )
    }

    /// Converts a cell into the world position of its centre at the origin's height.
    #[must_use]
    pub fn grid_to_world(&self, cell: GridCell) -> Vec3 {
        let size = self.layout.cell_size;
        self.layout.origin
            + Vec3::new(
                (cell.column() as f32 + 0.5) * size,
                0.0,
                (cell.row() as f32 + 0.5) * size,
            )
    }

    /// Reports whether a tower may currently be placed on the cell.
    ///
    /// Cells outside the grid are never buildable.
    #[must_use]
    pub fn is_buildable(&self, cell: GridCell) -> bool {
        self.index(cell)
            .and_then(|index| self.buildable.get(index).copied())
            .unwrap_or(false)
    }

    /// Number of cells that currently accept towers.
    #[must_use]
    pub fn buildable_count(&self) -> usize {
        self.buildable.iter().filter(|flag| **flag).count()
    }

    pub(crate) fn set_buildable(&mut self, cell: GridCell, buildable: bool) {
        match self.index(cell).and_then(|index| self.buildable.get_mut(index)) {
            Some(slot) => *slot = buildable,
            None => warn!(
                column = cell.column(),
                row = cell.row(),
                "ignoring buildability change for a cell outside the grid"
            ),
        }
    }

    pub(crate) fn reset_buildable(&mut self) {
        self.buildable.fill(true);
    }

    fn index(&self, cell: GridCell) -> Option<usize> {
        let column = u32::try_from(cell.column()).ok()?;
        let row = u32::try_from(cell.row()).ok()?;
        if column >= self.layout.columns || row >= self.layout.rows {
            return None;
        }
        let width = usize::try_from(self.layout.columns).ok()?;
        let row = usize::try_from(row).ok()?;
        let column = usize::try_from(column).ok()?;
        Some(row * width + column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn grid(columns: u32, rows: u32, cell_size: f32, origin: Vec3) -> BuildGrid {
        BuildGrid::new(GridLayout {
            columns,
            rows,
            cell_size,
            origin,
        })
    }

    #[test]
    fn cell_centre_sits_half_a_cell_from_the_corner() {
        let grid = grid(20, 20, 2.0, Vec3::new(-10.0, 1.0, 4.0));
        let centre = grid.grid_to_world(GridCell::new(3, 1));
        assert_eq!(centre, Vec3::new(-3.0, 1.0, 7.0));
    }

    #[test]
    fn positions_outside_grid_map_to_out_of_bounds_cells() {
        let grid = grid(4, 4, 1.0, Vec3::ZERO);
        let cell = grid.world_to_grid(Vec3::new(-0.5, 0.0, 2.5));
        assert_eq!(cell, GridCell::new(-1, 2));
        assert!(!grid.contains(cell));
        assert!(!grid.is_buildable(cell));
    }

    #[test]
    fn set_buildable_outside_grid_is_ignored() {
        let mut grid = grid(2, 2, 1.0, Vec3::ZERO);
        grid.set_buildable(GridCell::new(5, 5), false);
        assert_eq!(grid.buildable_count(), 4);

        grid.set_buildable(GridCell::new(1, 0), false);
        assert!(!grid.is_buildable(GridCell::new(1, 0)));
        assert_eq!(grid.buildable_count(), 3);
    }

    #[test]
    fn invalid_cell_size_falls_back_to_unit_cells() {
        let grid = grid(3, 3, 0.0, Vec3::ZERO);
        assert_eq!(grid.cell_size(), 1.0);
    }

    proptest! {
        #[test]
        fn world_to_grid_inverts_grid_to_world(
            columns in 1u32..64,
            rows in 1u32..64,
            cell_size in 0.25f32..8.0,
            origin_x in -100.0f32..100.0,
            origin_z in -100.0f32..100.0,
            column_seed in 0u32..u32::MAX,
            row_seed in 0u32..u32::MAX,
        ) {
            let grid = grid(columns, rows, cell_size, Vec3::new(origin_x, 0.0, origin_z));
            let cell = GridCell::new((column_seed % columns) as i32, (row_seed % rows) as i32);
            prop_assert_eq!(grid.world_to_grid(grid.grid_to_world(cell)), cell);
        }
    }
}
