#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared presentation contracts for Stackrunner adapters.
//!
//! The world never talks to the engine directly. It emits [`Event`]s and
//! [`dispatch`] forwards them to the collaborator traits defined here, so
//! adapters only implement the notifications they care about.

use std::time::Duration;

use glam::Vec2;
use stackrunner_core::{
    Ability, CellCoord, Event, GameOverReason, PieceDefinition, PieceId, Rgba, SnapshotBlock,
    SwitchTrigger,
};

/// Side length of the view while stacking, in cells.
pub const STACKING_VIEW_SIZE: f32 = 10.0;

/// Side length of the view while following the player, in cells.
pub const FOLLOW_VIEW_SIZE: f32 = 5.0;

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Converts a byte colour from the ability table.
    #[must_use]
    pub fn from_rgba(rgba: Rgba) -> Self {
        Self {
            red: f32::from(rgba.red) / 255.0,
            green: f32::from(rgba.green) / 255.0,
            blue: f32::from(rgba.blue) / 255.0,
            alpha: f32::from(rgba.alpha) / 255.0,
        }
    }

    /// Returns a new color lightened towards white by the provided amount.
    #[must_use]
    pub fn lighten(self, amount: f32) -> Self {
        let amount = amount.clamp(0.0, 1.0);

        Self {
            red: lighten_channel(self.red, amount),
            green: lighten_channel(self.green, amount),
            blue: lighten_channel(self.blue, amount),
            alpha: self.alpha,
        }
    }
}

fn lighten_channel(channel: f32, amount: f32) -> f32 {
    channel + (1.0 - channel) * amount
}

const PROTECTION_COLOR: Color = Color::new(0.85, 0.85, 0.85, 1.0);
const STARTING_POINT_COLOR: Color = Color::new(0.95, 0.8, 0.2, 1.0);

/// Tint used for a committed cell.
#[must_use]
pub fn block_color(block: SnapshotBlock) -> Color {
    match block {
        SnapshotBlock::Piece(ability) => Color::from_rgba(ability.profile().color),
        SnapshotBlock::Protection => PROTECTION_COLOR,
        SnapshotBlock::StartingPoint => STARTING_POINT_COLOR,
    }
}

/// Tint used for the cells of the falling piece.
#[must_use]
pub fn falling_color(ability: Ability) -> Color {
    Color::from_rgba(ability.profile().color).lighten(0.35)
}

/// Single-character glyph used by text adapters for a committed cell.
#[must_use]
pub const fn block_glyph(block: SnapshotBlock) -> char {
    match block {
        SnapshotBlock::Piece(Ability::Normal) => '#',
        SnapshotBlock::Piece(Ability::Sticky) => 'S',
        SnapshotBlock::Piece(Ability::Pass) => 'P',
        SnapshotBlock::Piece(Ability::HighJump) => 'H',
        SnapshotBlock::Piece(Ability::Bouncy) => 'B',
        SnapshotBlock::Protection => '=',
        SnapshotBlock::StartingPoint => '*',
    }
}

/// World-space centre of a grid cell.
#[must_use]
pub fn cell_center(cell: CellCoord) -> Vec2 {
    Vec2::new(cell.x() as f32 + 0.5, cell.y() as f32 + 0.5)
}

/// Receives piece lifecycle notifications.
pub trait Spawner {
    /// A new piece must be instantiated at `origin`.
    fn spawn_next(&mut self, piece: PieceId, definition: &PieceDefinition, origin: CellCoord);

    /// The piece was committed into the grid.
    fn notify_landed(&mut self, piece: PieceId, cells: &[CellCoord]);

    /// A stacking round ended.
    fn notify_round_completed(&mut self, _round: u32, _trigger: SwitchTrigger) {}

    /// The session ended.
    fn notify_game_over(&mut self, _reason: GameOverReason) {}
}

/// Receives camera framing requests.
pub trait Camera {
    /// Switches between following the player and the static stacking view.
    fn set_follow(&mut self, follow: bool);
}

/// Redraws grid cells.
pub trait CellRenderer {
    /// Refreshes `cell` and its eight neighbours.
    fn refresh_cell_and_neighbors(&mut self, cell: CellCoord);
}

/// Platformer character controlled outside the core.
pub trait Player {
    /// Enables or disables player control and physics.
    fn set_active(&mut self, active: bool);
}

/// Observer for the platformer round countdown.
pub trait RoundClock {
    /// Countdown started.
    fn arm(&mut self, duration: Duration);

    /// Countdown cancelled.
    fn disarm(&mut self);
}

/// Borrowed set of collaborators events are forwarded to.
pub struct Collaborators<'a> {
    /// Piece lifecycle observer.
    pub spawner: &'a mut dyn Spawner,
    /// Camera controller.
    pub camera: &'a mut dyn Camera,
    /// Grid renderer.
    pub renderer: &'a mut dyn CellRenderer,
    /// Player character.
    pub player: &'a mut dyn Player,
    /// Countdown display.
    pub clock: &'a mut dyn RoundClock,
}

/// Forwards world events to the matching collaborator calls.
///
/// Events without an outbound counterpart are skipped.
pub fn dispatch(events: &[Event], collaborators: &mut Collaborators<'_>) {
    for event in events {
        match event {
            Event::PieceSpawned {
                piece,
                definition,
                origin,
            } => collaborators
                .spawner
                .spawn_next(*piece, definition, *origin),
            Event::PieceLocked { piece, cells } => {
                collaborators.spawner.notify_landed(*piece, cells);
            }
            Event::RoundCompleted { round, trigger } => {
                collaborators
                    .spawner
                    .notify_round_completed(*round, *trigger);
            }
            Event::GameOver { reason } => collaborators.spawner.notify_game_over(*reason),
            Event::CameraFollowEnabled => collaborators.camera.set_follow(true),
            Event::CameraFollowDisabled => collaborators.camera.set_follow(false),
            Event::CellChanged { cell } => {
                collaborators.renderer.refresh_cell_and_neighbors(*cell);
            }
            Event::PlayerActivationChanged { active } => {
                collaborators.player.set_active(*active);
            }
            Event::RoundTimerArmed { duration } => collaborators.clock.arm(*duration),
            Event::RoundTimerDisarmed => collaborators.clock.disarm(),
            _ => {}
        }
    }
}

/// Visible region of the world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraFraming {
    /// World-space point at the centre of the view.
    pub center: Vec2,
    /// Side length of the view in cells.
    pub size: f32,
}

/// Camera that toggles between the stacking view and following the player.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraRig {
    stacking: CameraFraming,
    follow: bool,
}

impl CameraRig {
    /// Creates a rig framing a level spanning `columns` and rows
    /// `min_row..=max_row`.
    #[must_use]
    pub fn new(columns: u32, min_row: i32, max_row: i32) -> Self {
        let bottom = min_row as f32;
        let top = max_row as f32 + 1.0;
        Self {
            stacking: CameraFraming {
                center: Vec2::new(columns as f32 / 2.0, (bottom + top) / 2.0),
                size: STACKING_VIEW_SIZE,
            },
            follow: false,
        }
    }

    /// Whether the rig currently follows the player.
    #[must_use]
    pub const fn is_following(&self) -> bool {
        self.follow
    }

    /// Framing for the current frame given the player's world position.
    #[must_use]
    pub fn framing(&self, player: Vec2) -> CameraFraming {
        if self.follow {
            CameraFraming {
                center: player,
                size: FOLLOW_VIEW_SIZE,
            }
        } else {
            self.stacking
        }
    }
}

impl Camera for CameraRig {
    fn set_follow(&mut self, follow: bool) {
        self.follow = follow;
    }
}
