//! Dense occupancy grid shared by both gameplay phases.

use stackrunner_core::{Block, BlockId, CellCoord};
use thiserror::Error;

use crate::level::LevelShape;

/// Reasons a grid write is rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum GridError {
    /// The cell maps outside the backing array.
    #[error("cell ({}, {}) lies outside the grid", .0.x(), .0.y())]
    OutOfBounds(CellCoord),
    /// The slot already holds another block.
    #[error("cell ({}, {}) is already occupied", .0.x(), .0.y())]
    Occupied(CellCoord),
}

/// Array of optional block references addressed by world coordinates.
#[derive(Clone, Debug)]
pub struct OccupancyGrid {
    width: u32,
    height: u32,
    y_offset: i32,
    cells: Vec<Option<Block>>,
}

impl OccupancyGrid {
    /// Allocates an empty grid with explicit dimensions.
    #[must_use]
    pub fn new(width: u32, height: u32, y_offset: i32) -> Self {
        let capacity_u64 = u64::from(width) * u64::from(height);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        Self {
            width,
            height,
            y_offset,
            cells: vec![None; capacity],
        }
    }

    /// Allocates an empty grid sized for a level.
    #[must_use]
    pub fn for_shape(shape: &LevelShape) -> Self {
        Self::new(shape.width(), shape.height(), shape.y_offset())
    }

    /// Reports whether the slot holds a block. Cells outside the array are
    /// never occupied.
    #[must_use]
    pub fn is_occupied(&self, cell: CellCoord) -> bool {
        self.block_at(cell).is_some()
    }

    /// Block stored at the cell, if any.
    #[must_use]
    pub fn block_at(&self, cell: CellCoord) -> Option<Block> {
        self.index(cell)
            .and_then(|index| self.cells.get(index).copied().flatten())
    }

    /// Writes a block into an empty slot.
    pub fn place(&mut self, cell: CellCoord, block: Block) -> Result<(), GridError> {
        let Some(slot) = self.index(cell).and_then(|index| self.cells.get_mut(index)) else {
            log::warn!(
                "rejected write of block {} outside the grid at ({}, {})",
                block.id().get(),
                cell.x(),
                cell.y()
            );
            return Err(GridError::OutOfBounds(cell));
        };
        if slot.is_some() {
            return Err(GridError::Occupied(cell));
        }
        *slot = Some(block);
        Ok(())
    }

    /// Clears the slot when it still holds the expected block.
    ///
    /// Returns `false` without touching the grid when the slot is empty or
    /// holds a different block.
    pub fn remove(&mut self, cell: CellCoord, expected: BlockId) -> bool {
        let Some(slot) = self.index(cell).and_then(|index| self.cells.get_mut(index)) else {
            return false;
        };
        match slot {
            Some(block) if block.id() == expected => {
                *slot = None;
                true
            }
            _ => false,
        }
    }

    /// Cells within `radius` of the provided cell that map into the array.
    ///
    /// Used to notify the renderer about a neighbourhood; occupancy is not
    /// touched.
    pub fn region_around(
        &self,
        cell: CellCoord,
        radius: i32,
    ) -> impl Iterator<Item = CellCoord> + '_ {
        let radius = radius.max(0);
        (-radius..=radius)
            .flat_map(move |dy| (-radius..=radius).map(move |dx| cell.translated(dx, dy)))
            .filter(move |candidate| self.index(*candidate).is_some())
    }

    /// Reports whether any slot at or above the provided world row holds a
    /// committed block. Protection blocks are temporary and do not count.
    #[must_use]
    pub fn committed_at_or_above(&self, row: i32) -> bool {
        let width = usize::try_from(self.width).unwrap_or(0);
        if width == 0 {
            return false;
        }
        let first_row = row.saturating_add(self.y_offset).max(0);
        let Ok(first_row) = usize::try_from(first_row) else {
            return false;
        };
        self.cells
            .chunks(width)
            .skip(first_row)
            .any(|slots| {
                slots
                    .iter()
                    .flatten()
                    .any(|block| !block.is_protection())
            })
    }

    /// Iterates every occupied slot in row-major order, bottom row first.
    pub fn blocks(&self) -> impl Iterator<Item = (CellCoord, Block)> + '_ {
        let width = usize::try_from(self.width).unwrap_or(1).max(1);
        self.cells.iter().enumerate().filter_map(move |(index, slot)| {
            let block = (*slot)?;
            let column = i32::try_from(index % width).ok()?;
            let row = i32::try_from(index / width).ok()?;
            Some((CellCoord::new(column, row - self.y_offset), block))
        })
    }

    /// Empties every slot.
    pub fn clear(&mut self) {
        self.cells.fill(None);
    }

    /// Array dimensions as `(width, height)`.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Constant added to world rows to obtain array rows.
    #[must_use]
    pub const fn y_offset(&self) -> i32 {
        self.y_offset
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        let column = u32::try_from(cell.x()).ok()?;
        let row = u32::try_from(cell.y().checked_add(self.y_offset)?).ok()?;
        if column < self.width && row < self.height {
            let row = usize::try_from(row).ok()?;
            let column = usize::try_from(column).ok()?;
            let width = usize::try_from(self.width).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}
