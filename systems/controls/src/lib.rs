#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure input system translating raw intent booleans into piece commands.

use stackrunner_core::{Command, Event, PlayMode, Shift};

/// Input snapshot distilled from adapter-provided frame input data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PieceInput {
    /// Move the piece one column left on this frame.
    pub left: bool,
    /// Move the piece one column right on this frame.
    pub right: bool,
    /// Rotate the piece a quarter turn on this frame.
    pub rotate: bool,
    /// Swap the piece with the hold slot on this frame.
    pub hold: bool,
    /// Whether the soft-drop key is currently held.
    pub soft_drop: bool,
}

impl PieceInput {
    /// Horizontal shift requested by the frame, if exactly one side is pressed.
    #[must_use]
    pub const fn shift(&self) -> Option<Shift> {
        match (self.left, self.right) {
            (true, false) => Some(Shift::Left),
            (false, true) => Some(Shift::Right),
            _ => None,
        }
    }
}

/// Stacking-phase control system.
///
/// Commands are only emitted while the stacking phase is active and the game
/// has not ended.
#[derive(Debug, Clone, Default)]
pub struct Controls {
    play_mode: PlayMode,
    game_over: bool,
    soft_drop: bool,
}

impl Controls {
    /// Creates a new control system instance.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            play_mode: PlayMode::Tetris,
            game_over: false,
            soft_drop: false,
        }
    }

    /// Consumes world events and the frame's input to emit piece commands.
    ///
    /// Hold is emitted before movement so the replacement piece receives the
    /// frame's shift and rotation. Soft drop is only reported when it changes.
    pub fn handle(&mut self, events: &[Event], input: PieceInput, out: &mut Vec<Command>) {
        for event in events {
            match event {
                Event::PlayModeChanged { mode } => {
                    self.play_mode = *mode;
                    self.soft_drop = false;
                }
                Event::LevelPrepared { .. } => self.game_over = false,
                Event::GameOver { .. } => self.game_over = true,
                _ => {}
            }
        }

        if self.play_mode != PlayMode::Tetris || self.game_over {
            return;
        }

        if input.hold {
            out.push(Command::HoldPiece);
        }
        if let Some(shift) = input.shift() {
            out.push(Command::ShiftPiece { shift });
        }
        if input.rotate {
            out.push(Command::RotatePiece);
        }
        if input.soft_drop != self.soft_drop {
            self.soft_drop = input.soft_drop;
            out.push(Command::SetSoftDrop {
                engaged: input.soft_drop,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposing_directions_cancel() {
        let input = PieceInput {
            left: true,
            right: true,
            ..PieceInput::default()
        };
        assert_eq!(input.shift(), None);
    }
}
