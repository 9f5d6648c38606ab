//! Falling-piece transform, input handling and gravity timing.

use std::time::Duration;

use stackrunner_core::{CellCoord, CellOffset, PieceDefinition, PieceId, Rotation, Shift};
use thiserror::Error;

use crate::{grid::OccupancyGrid, level::LevelShape};

const MIN_FALL_INTERVAL: Duration = Duration::from_millis(1);

/// Read-only view of everything a piece collides with.
#[derive(Clone, Copy, Debug)]
pub struct Footing<'a> {
    shape: &'a LevelShape,
    grid: &'a OccupancyGrid,
}

impl<'a> Footing<'a> {
    /// Combines the level shape and occupancy grid into a collision oracle.
    #[must_use]
    pub const fn new(shape: &'a LevelShape, grid: &'a OccupancyGrid) -> Self {
        Self { shape, grid }
    }

    /// Whether a piece cell may sit at the provided location.
    #[must_use]
    pub fn is_free(&self, cell: CellCoord) -> bool {
        self.shape.is_in_bounds(cell) && !self.grid.is_occupied(cell)
    }
}

/// Gravity timing applied to the falling piece.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GravityIntervals {
    /// Interval between rows while soft drop is released.
    pub base: Duration,
    /// Interval between rows while soft drop is held.
    pub soft_drop: Duration,
}

impl GravityIntervals {
    fn active(&self, soft_drop: bool) -> Duration {
        let interval = if soft_drop { self.soft_drop } else { self.base };
        interval.max(MIN_FALL_INTERVAL)
    }
}

/// Lifecycle phase of the falling piece.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PiecePhase {
    /// The cell below the piece is free.
    Falling,
    /// The piece rests on the stack and locks when the fall timer expires.
    Locking,
    /// The piece was committed; it no longer accepts input.
    Locked,
}

/// Outcome of advancing the fall timer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GravityStep {
    /// Rows the piece descended.
    pub rows_fallen: u32,
    /// Whether the piece locked during the step.
    pub locked: bool,
}

/// Raised when a new piece has no legal position at its spawn origin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("piece {} is blocked at spawn origin ({}, {})", .piece.get(), .origin.x(), .origin.y())]
pub struct SpawnBlocked {
    /// Piece that could not be placed.
    pub piece: PieceId,
    /// Origin that was attempted.
    pub origin: CellCoord,
}

/// Active piece owned by the world while it falls.
#[derive(Clone, Debug)]
pub struct FallingPiece {
    id: PieceId,
    definition: PieceDefinition,
    origin: CellCoord,
    rotation: Rotation,
    offsets: [CellOffset; 4],
    fall_timer: Duration,
    phase: PiecePhase,
}

impl FallingPiece {
    /// Places a new piece at `origin` in its spawn orientation.
    pub fn spawn(
        id: PieceId,
        definition: PieceDefinition,
        origin: CellCoord,
        intervals: GravityIntervals,
        footing: &Footing<'_>,
    ) -> Result<Self, SpawnBlocked> {
        let mut piece = Self {
            id,
            definition,
            origin,
            rotation: Rotation::Deg0,
            offsets: definition.spawn_cells(),
            fall_timer: intervals.active(false),
            phase: PiecePhase::Falling,
        };
        if !piece.is_legal(footing) {
            return Err(SpawnBlocked { piece: id, origin });
        }
        piece.refresh_phase(footing);
        Ok(piece)
    }

    /// Identifier of the piece.
    #[must_use]
    pub const fn id(&self) -> PieceId {
        self.id
    }

    /// Definition the piece was spawned from.
    #[must_use]
    pub const fn definition(&self) -> PieceDefinition {
        self.definition
    }

    /// Position of the piece origin.
    #[must_use]
    pub const fn origin(&self) -> CellCoord {
        self.origin
    }

    /// Current orientation.
    #[must_use]
    pub const fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Current lifecycle phase.
    #[must_use]
    pub const fn phase(&self) -> PiecePhase {
        self.phase
    }

    /// Time left before the next gravity step.
    #[must_use]
    pub const fn fall_timer(&self) -> Duration {
        self.fall_timer
    }

    /// World cells occupied at the current transform.
    #[must_use]
    pub fn cells(&self) -> [CellCoord; 4] {
        self.offsets.map(|offset| self.origin.offset_by(offset))
    }

    /// Whether every cell of the piece is inside the level and unoccupied.
    #[must_use]
    pub fn is_legal(&self, footing: &Footing<'_>) -> bool {
        self.cells().iter().all(|cell| footing.is_free(*cell))
    }

    /// Attempts a one-column shift, reverting when the result is illegal.
    pub fn try_shift(&mut self, shift: Shift, footing: &Footing<'_>) -> bool {
        self.try_translate(shift.dx(), 0, footing)
    }

    /// Attempts a counter-clockwise quarter turn about the pivot, reverting
    /// when the result is illegal.
    pub fn try_rotate(&mut self, footing: &Footing<'_>) -> bool {
        if self.phase == PiecePhase::Locked {
            return false;
        }
        let previous = self.offsets;
        let pivot = self.definition.pivot();
        self.offsets = previous.map(|offset| pivot.rotate_quarter(offset));
        if self.is_legal(footing) {
            self.rotation = self.rotation.next();
            self.refresh_phase(footing);
            true
        } else {
            self.offsets = previous;
            false
        }
    }

    /// Counts the fall timer down by `dt`, dropping one row whenever it
    /// expires. The piece locks instead when the row below is blocked.
    pub fn advance(
        &mut self,
        dt: Duration,
        intervals: GravityIntervals,
        soft_drop: bool,
        footing: &Footing<'_>,
    ) -> GravityStep {
        let mut step = GravityStep::default();
        if self.phase == PiecePhase::Locked {
            return step;
        }

        let mut remaining = dt;
        loop {
            let interval = intervals.active(soft_drop);
            if self.fall_timer > interval {
                self.fall_timer = interval;
            }
            if remaining < self.fall_timer {
                self.fall_timer -= remaining;
                return step;
            }
            remaining -= self.fall_timer;

            if self.try_translate(0, -1, footing) {
                step.rows_fallen += 1;
                self.fall_timer = interval;
            } else {
                self.fall_timer = Duration::ZERO;
                self.phase = PiecePhase::Locked;
                step.locked = true;
                return step;
            }
        }
    }

    fn try_translate(&mut self, dx: i32, dy: i32, footing: &Footing<'_>) -> bool {
        if self.phase == PiecePhase::Locked {
            return false;
        }
        let previous = self.origin;
        self.origin = previous.translated(dx, dy);
        if self.is_legal(footing) {
            self.refresh_phase(footing);
            true
        } else {
            self.origin = previous;
            false
        }
    }

    fn refresh_phase(&mut self, footing: &Footing<'_>) {
        let resting = self.cells().iter().any(|cell| {
            let below = cell.translated(0, -1);
            !self.covers(below) && !footing.is_free(below)
        });
        self.phase = if resting {
            PiecePhase::Locking
        } else {
            PiecePhase::Falling
        };
    }

    fn covers(&self, cell: CellCoord) -> bool {
        self.cells().contains(&cell)
    }
}
