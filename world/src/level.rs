//! Per-level well shapes consulted before any cell is accepted.

use std::ops::Range;

use stackrunner_core::{CellCoord, LevelId};

/// Contiguous band of rows sharing the same legal column range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct RowBand {
    first_row: i32,
    last_row: i32,
    first_column: i32,
    end_column: i32,
}

impl RowBand {
    const fn new(first_row: i32, last_row: i32, first_column: i32, end_column: i32) -> Self {
        Self {
            first_row,
            last_row,
            first_column,
            end_column,
        }
    }

    const fn contains_row(&self, row: i32) -> bool {
        row >= self.first_row && row <= self.last_row
    }
}

const LEVEL_ONE_BANDS: [RowBand; 1] = [RowBand::new(0, 19, 0, 10)];

const LEVEL_TWO_BANDS: [RowBand; 2] = [RowBand::new(0, 10, 0, 20), RowBand::new(11, 19, 0, 10)];

const LEVEL_THREE_BANDS: [RowBand; 3] = [
    RowBand::new(-10, -1, 11, 20),
    RowBand::new(0, 10, 0, 20),
    RowBand::new(11, 19, 0, 10),
];

const SPAWN_ORIGIN: CellCoord = CellCoord::new(4, 18);

/// Legal cell layout of a level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LevelShape {
    level: LevelId,
    bands: &'static [RowBand],
}

impl LevelShape {
    /// Looks up the literal shape of the provided level.
    #[must_use]
    pub fn for_level(level: LevelId) -> Self {
        let bands: &'static [RowBand] = match level {
            LevelId::One => &LEVEL_ONE_BANDS,
            LevelId::Two => &LEVEL_TWO_BANDS,
            LevelId::Three => &LEVEL_THREE_BANDS,
        };
        Self { level, bands }
    }

    /// Level described by the shape.
    #[must_use]
    pub const fn level(&self) -> LevelId {
        self.level
    }

    /// Reports whether the cell lies inside the well.
    #[must_use]
    pub fn is_in_bounds(&self, cell: CellCoord) -> bool {
        self.columns_in_row(cell.y())
            .map_or(false, |columns| columns.contains(&cell.x()))
    }

    /// Legal column range for a row, if the row belongs to the level.
    #[must_use]
    pub fn columns_in_row(&self, row: i32) -> Option<Range<i32>> {
        self.bands
            .iter()
            .find(|band| band.contains_row(row))
            .map(|band| band.first_column..band.end_column)
    }

    /// Lowest legal row.
    #[must_use]
    pub fn min_row(&self) -> i32 {
        self.bands.iter().map(|band| band.first_row).min().unwrap_or(0)
    }

    /// Highest legal row.
    #[must_use]
    pub fn max_row(&self) -> i32 {
        self.bands.iter().map(|band| band.last_row).max().unwrap_or(0)
    }

    /// Number of columns the backing array needs.
    #[must_use]
    pub fn width(&self) -> u32 {
        let end = self.bands.iter().map(|band| band.end_column).max().unwrap_or(0);
        u32::try_from(end).unwrap_or(0)
    }

    /// Number of rows the backing array needs.
    #[must_use]
    pub fn height(&self) -> u32 {
        u32::try_from(self.max_row() - self.min_row() + 1).unwrap_or(0)
    }

    /// Constant added to a world row to obtain a non-negative array row.
    #[must_use]
    pub fn y_offset(&self) -> i32 {
        -self.min_row().min(0)
    }

    /// Origin at which new pieces appear.
    #[must_use]
    pub const fn spawn_origin(&self) -> CellCoord {
        SPAWN_ORIGIN
    }

    /// Anchor cell marking where the player starts the level.
    #[must_use]
    pub const fn starting_point(&self) -> CellCoord {
        match self.level {
            LevelId::One => CellCoord::new(9, 0),
            LevelId::Two | LevelId::Three => CellCoord::new(19, 0),
        }
    }

    /// Iterates every legal cell of the level, bottom row first.
    pub fn cells(&self) -> impl Iterator<Item = CellCoord> + '_ {
        (self.min_row()..=self.max_row()).flat_map(move |row| {
            self.columns_in_row(row)
                .into_iter()
                .flatten()
                .map(move |column| CellCoord::new(column, row))
        })
    }
}

/// Pure bounds predicate for a level and world cell.
#[must_use]
pub fn is_in_bounds(level: LevelId, cell: CellCoord) -> bool {
    LevelShape::for_level(level).is_in_bounds(cell)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_one_is_a_ten_by_twenty_rectangle() {
        let shape = LevelShape::for_level(LevelId::One);
        assert_eq!((shape.width(), shape.height(), shape.y_offset()), (10, 20, 0));
        assert!(shape.is_in_bounds(CellCoord::new(0, 0)));
        assert!(shape.is_in_bounds(CellCoord::new(9, 19)));
        assert!(!shape.is_in_bounds(CellCoord::new(10, 5)));
        assert!(!shape.is_in_bounds(CellCoord::new(-1, 5)));
        assert!(!shape.is_in_bounds(CellCoord::new(3, 20)));
        assert!(!shape.is_in_bounds(CellCoord::new(3, -1)));
        assert_eq!(shape.cells().count(), 200);
    }

    #[test]
    fn level_two_narrows_above_row_ten() {
        assert!(is_in_bounds(LevelId::Two, CellCoord::new(19, 10)));
        assert!(!is_in_bounds(LevelId::Two, CellCoord::new(19, 11)));
        assert!(is_in_bounds(LevelId::Two, CellCoord::new(9, 19)));
        assert!(!is_in_bounds(LevelId::Two, CellCoord::new(10, 11)));
        assert_eq!(LevelShape::for_level(LevelId::Two).cells().count(), 11 * 20 + 9 * 10);
    }

    #[test]
    fn level_three_extends_below_zero_on_the_right() {
        let shape = LevelShape::for_level(LevelId::Three);
        assert_eq!((shape.width(), shape.height(), shape.y_offset()), (20, 30, 10));
        assert!(shape.is_in_bounds(CellCoord::new(11, -10)));
        assert!(shape.is_in_bounds(CellCoord::new(19, -1)));
        assert!(!shape.is_in_bounds(CellCoord::new(10, -1)));
        assert!(!shape.is_in_bounds(CellCoord::new(15, -11)));
        assert!(shape.is_in_bounds(CellCoord::new(0, 0)));
        assert!(!shape.is_in_bounds(CellCoord::new(12, 15)));
    }

    #[test]
    fn spawn_and_starting_point_are_legal_in_every_level() {
        for level in LevelId::ALL {
            let shape = LevelShape::for_level(level);
            assert!(shape.is_in_bounds(shape.spawn_origin()), "{level}");
            assert!(shape.is_in_bounds(shape.starting_point()), "{level}");
        }
    }
}
