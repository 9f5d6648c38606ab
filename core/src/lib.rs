#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Stackrunner engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems and
//! external collaborators (camera, renderer, player, timer) to react to.
//! Systems consume event streams and respond exclusively with new command
//! batches.

mod config;
mod pieces;

use std::{fmt, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use config::{ConfigError, SessionConfig, DEFAULT_LOOKAHEAD, PREVIEW_LEN};
pub use pieces::{
    Ability, AbilityProfile, CellOffset, PieceDefinition, Pivot, Rgba, Rotation, ShapeId,
    ShapeSpec, SHAPES,
};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Stackrunner.";

/// Describes the active gameplay mode for the simulation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayMode {
    /// Falling-block stacking phase.
    #[default]
    Tetris,
    /// Side-scrolling phase where the player climbs the stack.
    Platformer,
}

/// Identifies one of the hand-authored levels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LevelId {
    /// Rectangular 10×20 well.
    #[default]
    #[serde(rename = "level1")]
    One,
    /// L-shaped well, wide at the bottom.
    #[serde(rename = "level2")]
    Two,
    /// S-shaped well extending below row zero.
    #[serde(rename = "level3")]
    Three,
}

impl LevelId {
    /// Every level in play order.
    pub const ALL: [LevelId; 3] = [LevelId::One, LevelId::Two, LevelId::Three];

    /// Scene name associated with the level.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::One => "Level1",
            Self::Two => "Level2",
            Self::Three => "Level3",
        }
    }
}

impl fmt::Display for LevelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LevelId {
    type Err = UnknownLevel;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "1" | "level1" => Ok(Self::One),
            "2" | "level2" => Ok(Self::Two),
            "3" | "level3" => Ok(Self::Three),
            _ => Err(UnknownLevel(value.to_owned())),
        }
    }
}

/// Error returned when a level name cannot be resolved.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown level '{0}' (expected level1, level2 or level3)")]
pub struct UnknownLevel(pub String);

/// Location of a grid cell in world coordinates.
///
/// Rows grow upward and may be negative; gravity moves pieces toward lower
/// rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    x: i32,
    y: i32,
}

impl CellCoord {
    /// Creates a new world cell coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Column of the cell.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Row of the cell in world space.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Returns the cell displaced by the provided amounts.
    ///
    /// Saturates at the `i32` range; no level reaches that far.
    #[must_use]
    pub const fn translated(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x.saturating_add(dx), self.y.saturating_add(dy))
    }

    /// Returns the cell reached by applying a piece offset.
    #[must_use]
    pub const fn offset_by(self, offset: CellOffset) -> Self {
        self.translated(offset.dx(), offset.dy())
    }
}

/// Unique identifier assigned to every block written into the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(u32);

impl BlockId {
    /// Creates a new block identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to every spawned piece.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PieceId(u32);

impl PieceId {
    /// Creates a new piece identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Origin of a block stored in the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockKind {
    /// Cell of a locked piece.
    Piece {
        /// Piece the cell belonged to while falling.
        piece: PieceId,
        /// Ability inherited from the piece.
        ability: Ability,
    },
    /// Temporary platform placed around the player on Tetris re-entry.
    Protection,
    /// Fixed anchor marking where the player starts the level.
    StartingPoint,
}

/// Reference stored in an occupied grid slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Block {
    id: BlockId,
    kind: BlockKind,
}

impl Block {
    /// Creates a block reference.
    #[must_use]
    pub const fn new(id: BlockId, kind: BlockKind) -> Self {
        Self { id, kind }
    }

    /// Unique identifier of the block.
    #[must_use]
    pub const fn id(&self) -> BlockId {
        self.id
    }

    /// Origin of the block.
    #[must_use]
    pub const fn kind(&self) -> BlockKind {
        self.kind
    }

    /// Whether the block is a temporary protection cell.
    #[must_use]
    pub const fn is_protection(&self) -> bool {
        matches!(self.kind, BlockKind::Protection)
    }
}

/// Horizontal direction of a one-cell shift.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Shift {
    /// Toward lower columns.
    Left,
    /// Toward higher columns.
    Right,
}

impl Shift {
    /// Column delta applied by the shift.
    #[must_use]
    pub const fn dx(self) -> i32 {
        match self {
            Self::Left => -1,
            Self::Right => 1,
        }
    }
}

/// Persistable description of an occupied cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SnapshotBlock {
    /// Locked piece cell carrying an ability.
    Piece(Ability),
    /// Protection cell.
    Protection,
    /// Level starting point.
    StartingPoint,
}

/// Occupied cell captured in a grid snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SnapshotCell {
    /// Location of the cell.
    pub cell: CellCoord,
    /// Content of the cell.
    pub block: SnapshotBlock,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Starts or retunes a session. The grid is re-allocated only when the
    /// level differs from the active one.
    ConfigureSession {
        /// Tuning and level for the session.
        config: SessionConfig,
    },
    /// Re-initializes every piece of session state on the active level.
    Restart,
    /// Advances the simulation clock and applies gravity to the falling piece.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Attempts to shift the falling piece one column.
    ShiftPiece {
        /// Direction of the shift.
        shift: Shift,
    },
    /// Attempts a counter-clockwise quarter turn of the falling piece.
    RotatePiece,
    /// Engages or releases soft drop.
    SetSoftDrop {
        /// Whether soft drop is held.
        engaged: bool,
    },
    /// Swaps the falling piece with the held slot.
    HoldPiece,
    /// Requests the return from the platformer phase to stacking.
    SwitchToTetris {
        /// Player position rounded to the grid.
        player_cell: CellCoord,
    },
    /// Replaces the grid contents with a snapshot and re-seats the falling
    /// piece at its spawn origin.
    RestoreGrid {
        /// Cells to write into the cleared grid.
        cells: Vec<SnapshotCell>,
    },
}

/// Condition that ended a Tetris round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SwitchTrigger {
    /// The round's landed-piece quota was reached.
    Quota,
    /// A locked cell reached the checkpoint row.
    Checkpoint {
        /// Checkpoint row that was reached.
        row: i32,
    },
    /// A cell reached the level's height limit.
    HeightLimit,
}

/// Reason the session ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameOverReason {
    /// The stack reached the height limit.
    HeightLimit,
    /// A new piece had no legal spawn position.
    SpawnBlocked,
}

/// Reason a [`Command::SwitchToTetris`] request was refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SwitchRefusal {
    /// The session already ended.
    GameOver,
    /// The simulation is not in the platformer phase.
    NotPlatformer,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Announces that a level grid was allocated.
    LevelPrepared {
        /// Level that became active.
        level: LevelId,
    },
    /// Requests a new falling piece from the spawner collaborator.
    PieceSpawned {
        /// Identifier assigned to the piece.
        piece: PieceId,
        /// Shape and ability of the piece.
        definition: PieceDefinition,
        /// Spawn position of the piece origin.
        origin: CellCoord,
    },
    /// Confirms that the falling piece moved or turned.
    PieceMoved {
        /// Piece that moved.
        piece: PieceId,
        /// New position of the piece origin.
        origin: CellCoord,
        /// New orientation.
        rotation: Rotation,
    },
    /// Confirms that a piece was committed into the grid.
    PieceLocked {
        /// Piece that locked.
        piece: PieceId,
        /// Cells written into the grid.
        cells: Vec<CellCoord>,
    },
    /// Confirms that the falling piece was moved into the hold slot.
    PieceHeld {
        /// Definition now stored in the hold slot.
        held: PieceDefinition,
    },
    /// Reports that a hold request was ignored because hold was already used.
    HoldRejected,
    /// Notifies the renderer that a cell and its neighbours need a refresh.
    CellChanged {
        /// Cell whose occupancy or neighbourhood changed.
        cell: CellCoord,
    },
    /// Announces that the simulation entered a new play mode.
    PlayModeChanged {
        /// Mode that became active after processing commands.
        mode: PlayMode,
    },
    /// Reports that a Tetris round ended.
    RoundCompleted {
        /// One-based number of the finished round.
        round: u32,
        /// Condition that ended the round.
        trigger: SwitchTrigger,
    },
    /// Reports that the checkpoint row moved up.
    CheckpointAdvanced {
        /// New checkpoint row.
        row: i32,
    },
    /// Activates or deactivates the player collaborator.
    PlayerActivationChanged {
        /// Whether the player is active.
        active: bool,
    },
    /// Starts the platformer round countdown.
    RoundTimerArmed {
        /// Length of the round.
        duration: Duration,
    },
    /// Stops the platformer round countdown.
    RoundTimerDisarmed,
    /// Requests that the camera follow the player.
    CameraFollowEnabled,
    /// Requests that the camera return to the static stacking framing.
    CameraFollowDisabled,
    /// Confirms that protection cells were inserted around the player.
    ProtectionPlaced {
        /// Cells that received protection blocks.
        cells: Vec<CellCoord>,
    },
    /// Confirms that protection cells were removed.
    ProtectionRemoved {
        /// Cells whose protection blocks were cleared.
        cells: Vec<CellCoord>,
    },
    /// Reports that a return to stacking was refused.
    SwitchRefused {
        /// Why the request was refused.
        reason: SwitchRefusal,
    },
    /// Announces the terminal end of the session.
    GameOver {
        /// Why the session ended.
        reason: GameOverReason,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{de::DeserializeOwned, Serialize};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn piece_definition_round_trips_through_bincode() {
        let shape = ShapeId::new(3).expect("shape index in table");
        assert_round_trip(&PieceDefinition::new(shape, Ability::HighJump));
    }

    #[test]
    fn snapshot_cell_round_trips_through_bincode() {
        assert_round_trip(&SnapshotCell {
            cell: CellCoord::new(15, -4),
            block: SnapshotBlock::Piece(Ability::Bouncy),
        });
    }

    #[test]
    fn corrupted_shape_index_fails_to_deserialize() {
        let bytes = bincode::serialize(&9u8).expect("serialize");
        assert!(bincode::deserialize::<ShapeId>(&bytes).is_err());
    }

    #[test]
    fn level_names_parse_case_insensitively() {
        assert_eq!("Level2".parse::<LevelId>(), Ok(LevelId::Two));
        assert_eq!("3".parse::<LevelId>(), Ok(LevelId::Three));
        assert!("level9".parse::<LevelId>().is_err());
    }

    #[test]
    fn definition_takes_pivot_from_shape_table() {
        let shape = ShapeId::new(0).expect("shape index in table");
        let definition = PieceDefinition::new(shape, Ability::Normal);
        assert_eq!(definition.pivot(), SHAPES[0].pivot);
        assert!((definition.pivot().dx() - 1.5).abs() < f32::EPSILON);
    }

    #[test]
    fn shifts_move_one_column() {
        let origin = CellCoord::new(4, 18);
        assert_eq!(origin.translated(Shift::Left.dx(), 0), CellCoord::new(3, 18));
        assert_eq!(origin.translated(Shift::Right.dx(), 0), CellCoord::new(5, 18));
    }

    #[test]
    fn translation_saturates_at_the_coordinate_range() {
        let corner = CellCoord::new(i32::MIN, i32::MAX);
        assert_eq!(corner.translated(-1, 1), corner);
        assert_eq!(corner.translated(1, -1), CellCoord::new(i32::MIN + 1, i32::MAX - 1));
    }
}
