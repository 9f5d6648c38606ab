use std::{collections::HashMap, fmt::Write as _};

use stackrunner_core::{CellCoord, SnapshotBlock, SnapshotCell};
use stackrunner_presentation::block_glyph;
use stackrunner_world::LevelShape;

const EMPTY: char = '.';
const OUTSIDE: char = ' ';
const FALLING: char = '@';

/// Renders the level as text, top row first.
///
/// Cells outside the level stay blank, `falling` cells are drawn over the
/// committed blocks.
pub(crate) fn render(shape: &LevelShape, cells: &[SnapshotCell], falling: &[CellCoord]) -> String {
    let blocks: HashMap<CellCoord, SnapshotBlock> =
        cells.iter().map(|entry| (entry.cell, entry.block)).collect();
    let mut out = String::new();

    for row in (shape.min_row()..=shape.max_row()).rev() {
        let _ = write!(out, "{row:>4} |");
        for column in 0..shape.width() as i32 {
            let cell = CellCoord::new(column, row);
            let glyph = if !shape.is_in_bounds(cell) {
                OUTSIDE
            } else if falling.contains(&cell) {
                FALLING
            } else {
                blocks.get(&cell).map_or(EMPTY, |block| block_glyph(*block))
            };
            out.push(glyph);
        }
        out.push_str("|\n");
    }
    out
}
