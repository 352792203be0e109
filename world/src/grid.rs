//! Cell storage for placed dice.

use std::collections::BTreeSet;

use dice_defence_core::{CellCoord, MergeError, Point};

use crate::dice::Die;

const MASK_MIN_DISTANCE: f32 = 0.45;
const MASK_MAX_DISTANCE: f32 = 1.5;

/// Geometry and contents of the dice board.
///
/// Cells are stored column-major. Levels that follow a winding path carry a
/// mask of valid cells; every other cell behaves as if it were out of bounds.
#[derive(Clone, Debug)]
pub struct Grid {
    origin: Point,
    cell_size: f32,
    columns: u32,
    rows: u32,
    valid: Option<BTreeSet<CellCoord>>,
    cells: Vec<Option<Die>>,
}

impl Grid {
    pub(crate) fn rectangular(origin: Point, cell_size: f32, columns: u32, rows: u32) -> Self {
        Self {
            origin,
            cell_size,
            columns,
            rows,
            valid: None,
            cells: vec![None; (columns * rows) as usize],
        }
    }

    /// Builds a grid whose valid cells hug the path at a fixed gap.
    pub(crate) fn along_path(
        origin: Point,
        cell_size: f32,
        columns: u32,
        rows: u32,
        path: &[Point],
    ) -> Self {
        let mut grid = Self::rectangular(origin, cell_size, columns, rows);
        let min = cell_size * MASK_MIN_DISTANCE;
        let max = cell_size * MASK_MAX_DISTANCE;

        let mut valid = BTreeSet::new();
        for column in 0..columns {
            for row in 0..rows {
                let cell = CellCoord::new(column, row);
                let center = grid.center_of(cell);
                let distance = path
                    .windows(2)
                    .map(|segment| center.distance_to_segment(segment[0], segment[1]))
                    .fold(f32::INFINITY, f32::min);
                if min < distance && distance < max {
                    let _ = valid.insert(cell);
                }
            }
        }
        grid.valid = Some(valid);
        grid
    }

    /// Number of columns.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Side length of a cell in world units.
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Top-left corner of the board.
    #[must_use]
    pub const fn origin(&self) -> Point {
        self.origin
    }

    /// Reports whether the cell lies on the board and inside the valid mask.
    #[must_use]
    pub fn in_bounds(&self, cell: CellCoord) -> bool {
        if cell.column() >= self.columns || cell.row() >= self.rows {
            return false;
        }
        self.valid
            .as_ref()
            .map_or(true, |valid| valid.contains(&cell))
    }

    /// Centre of the cell in world units.
    #[must_use]
    pub fn center_of(&self, cell: CellCoord) -> Point {
        let half = self.cell_size / 2.0;
        Point::new(
            self.origin.x + cell.column() as f32 * self.cell_size + half,
            self.origin.y + cell.row() as f32 * self.cell_size + half,
        )
    }

    /// Centre of the whole board.
    #[must_use]
    pub fn center_cell(&self) -> CellCoord {
        CellCoord::new(self.columns / 2, self.rows / 2)
    }

    /// Valid cells in column-major order.
    pub fn cells(&self) -> impl Iterator<Item = CellCoord> + '_ {
        (0..self.columns)
            .flat_map(move |column| (0..self.rows).map(move |row| CellCoord::new(column, row)))
            .filter(move |cell| self.in_bounds(*cell))
    }

    /// Valid cells that hold no die, in column-major order.
    #[must_use]
    pub fn empty_cells(&self) -> Vec<CellCoord> {
        self.cells().filter(|cell| self.get(*cell).is_none()).collect()
    }

    /// Cells holding a die, in column-major order.
    #[must_use]
    pub fn occupied_cells(&self) -> Vec<CellCoord> {
        self.cells().filter(|cell| self.get(*cell).is_some()).collect()
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        self.in_bounds(cell)
            .then(|| (cell.column() * self.rows + cell.row()) as usize)
    }

    pub(crate) fn get(&self, cell: CellCoord) -> Option<&Die> {
        self.index(cell)
            .and_then(|index| self.cells.get(index))
            .and_then(Option::as_ref)
    }

    pub(crate) fn get_mut(&mut self, cell: CellCoord) -> Option<&mut Die> {
        let index = self.index(cell)?;
        self.cells.get_mut(index).and_then(Option::as_mut)
    }

    /// Stores a die in an empty valid cell, handing it back on failure.
    pub(crate) fn place(&mut self, cell: CellCoord, die: Die) -> Result<(), Die> {
        match self.index(cell).and_then(|index| self.cells.get_mut(index)) {
            Some(slot) if slot.is_none() => {
                *slot = Some(die);
                Ok(())
            }
            _ => Err(die),
        }
    }

    pub(crate) fn remove(&mut self, cell: CellCoord) -> Option<Die> {
        let index = self.index(cell)?;
        self.cells.get_mut(index).and_then(Option::take)
    }

    /// Consumes the die at `from` and promotes the die at `into`.
    pub(crate) fn merge(&mut self, from: CellCoord, into: CellCoord) -> Result<&Die, MergeError> {
        if from == into {
            return Err(MergeError::SameCell);
        }
        let (Some(source), Some(target)) = (self.get(from), self.get(into)) else {
            return Err(MergeError::EmptyCell);
        };
        if source.kind() != target.kind() {
            return Err(MergeError::KindMismatch);
        }
        if source.level() != target.level() {
            return Err(MergeError::LevelMismatch);
        }

        let _ = self.remove(from);
        let promoted = self.get_mut(into).ok_or(MergeError::EmptyCell)?;
        promoted.promote();
        Ok(&*promoted)
    }

    /// Dice with the centres of their cells, in column-major order.
    pub(crate) fn dice_mut(&mut self) -> impl Iterator<Item = (Point, &mut Die)> + '_ {
        let (rows, origin, size) = (self.rows, self.origin, self.cell_size);
        self.cells
            .iter_mut()
            .enumerate()
            .filter_map(move |(index, slot)| {
                let index = index as u32;
                let (column, row) = ((index / rows) as f32, (index % rows) as f32);
                let center = Point::new(
                    origin.x + column * size + size / 2.0,
                    origin.y + row * size + size / 2.0,
                );
                slot.as_mut().map(|die| (center, die))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dice_defence_core::DieKind;

    fn grid() -> Grid {
        Grid::rectangular(Point::new(0.0, 0.0), 100.0, 3, 2)
    }

    #[test]
    fn out_of_bounds_cells_are_rejected() {
        let mut grid = grid();
        assert!(grid.in_bounds(CellCoord::new(2, 1)));
        assert!(!grid.in_bounds(CellCoord::new(3, 0)));
        assert!(grid.get(CellCoord::new(9, 9)).is_none());
        assert!(grid
            .place(CellCoord::new(0, 2), Die::new(DieKind::Single, 1))
            .is_err());
    }

    #[test]
    fn a_cell_holds_at_most_one_die() {
        let mut grid = grid();
        let cell = CellCoord::new(1, 1);
        assert!(grid.place(cell, Die::new(DieKind::Single, 1)).is_ok());
        assert!(grid.place(cell, Die::new(DieKind::Fire, 1)).is_err());
        assert_eq!(grid.get(cell).map(Die::kind), Some(DieKind::Single));
        assert_eq!(grid.occupied_cells(), vec![cell]);
        assert_eq!(grid.empty_cells().len(), 5);
    }

    #[test]
    fn center_accounts_for_origin() {
        let grid = Grid::rectangular(Point::new(575.0, 175.0), 140.0, 5, 3);
        assert_eq!(grid.center_of(CellCoord::new(1, 2)), Point::new(785.0, 525.0));
        assert_eq!(grid.center_cell(), CellCoord::new(2, 1));
    }

    #[test]
    fn merge_promotes_target_and_empties_source() {
        let mut grid = grid();
        let from = CellCoord::new(0, 0);
        let into = CellCoord::new(2, 1);
        assert!(grid.place(from, Die::new(DieKind::Poison, 2)).is_ok());
        assert!(grid.place(into, Die::new(DieKind::Poison, 2)).is_ok());

        let level = grid.merge(from, into).map(Die::level);
        assert_eq!(level, Ok(3));
        assert!(grid.get(from).is_none());
    }

    #[test]
    fn merge_rejections_leave_grid_untouched() {
        let mut grid = grid();
        let a = CellCoord::new(0, 0);
        let b = CellCoord::new(0, 1);
        let c = CellCoord::new(1, 0);
        assert!(grid.place(a, Die::new(DieKind::Single, 1)).is_ok());
        assert!(grid.place(b, Die::new(DieKind::Fire, 1)).is_ok());
        assert!(grid.place(c, Die::new(DieKind::Single, 2)).is_ok());

        assert_eq!(grid.merge(a, a).err(), Some(MergeError::SameCell));
        assert_eq!(
            grid.merge(a, CellCoord::new(2, 0)).err(),
            Some(MergeError::EmptyCell)
        );
        assert_eq!(grid.merge(a, b).err(), Some(MergeError::KindMismatch));
        assert_eq!(grid.merge(a, c).err(), Some(MergeError::LevelMismatch));
        assert_eq!(grid.occupied_cells().len(), 3);
    }

    #[test]
    fn path_mask_keeps_cells_near_but_not_on_the_path() {
        let path = [Point::new(0.0, 250.0), Point::new(1000.0, 250.0)];
        let grid = Grid::along_path(Point::new(0.0, 0.0), 100.0, 5, 5, &path);

        assert!(!grid.in_bounds(CellCoord::new(0, 2)), "cell on the path");
        assert!(grid.in_bounds(CellCoord::new(0, 1)));
        assert!(grid.in_bounds(CellCoord::new(0, 3)));
        assert!(!grid.in_bounds(CellCoord::new(0, 0)), "cell too far away");
        assert_eq!(grid.cells().count(), 10);
    }

    #[test]
    fn dice_iteration_reports_cell_centers() {
        let mut grid = grid();
        let cell = CellCoord::new(2, 1);
        assert!(grid.place(cell, Die::new(DieKind::Wind, 1)).is_ok());
        let expected = grid.center_of(cell);
        let centers: Vec<Point> = grid.dice_mut().map(|(center, _)| center).collect();
        assert_eq!(centers, vec![expected]);
    }
}
