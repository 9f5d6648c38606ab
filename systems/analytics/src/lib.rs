#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic analytics system that folds world events into session stats.

use std::{collections::BTreeMap, time::Duration};

use serde::Serialize;
use stackrunner_core::{Ability, Event, GameOverReason, PieceId, PlayMode, SwitchTrigger};

/// Aggregated statistics for the current session.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SessionStats {
    /// Pieces spawned, including replacements issued by hold.
    pub pieces_spawned: u32,
    /// Pieces committed to the grid.
    pub pieces_locked: u32,
    /// Cells committed to the grid.
    pub cells_landed: u64,
    /// Committed cells grouped by ability tag.
    pub cells_by_ability: BTreeMap<Ability, u64>,
    /// Successful hold swaps.
    pub holds: u32,
    /// Rounds completed for any reason.
    pub rounds: u32,
    /// Rounds completed by reaching the landed-piece quota.
    pub quota_rounds: u32,
    /// Rounds completed by reaching a checkpoint row.
    pub checkpoint_rounds: u32,
    /// Highest checkpoint row in effect.
    pub checkpoint_row: Option<i32>,
    /// Protection cells inserted around the player.
    pub protection_cells: u32,
    /// Simulated time spent stacking.
    #[serde(with = "millis")]
    pub stacking_time: Duration,
    /// Simulated time spent in the platformer phase.
    #[serde(with = "millis")]
    pub platformer_time: Duration,
    /// Why the session ended, if it did.
    pub game_over: Option<GameOverReason>,
}

/// Pure analytics system that tracks piece and round statistics.
#[derive(Debug, Default)]
pub struct Analytics {
    stats: SessionStats,
    abilities: BTreeMap<PieceId, Ability>,
    active: Option<PieceId>,
    play_mode: PlayMode,
    dirty: bool,
}

impl Analytics {
    /// Creates a new analytics system with empty statistics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Statistics accumulated so far.
    #[must_use]
    pub fn report(&self) -> &SessionStats {
        &self.stats
    }

    /// Returns a copy of the statistics when they changed since the last call.
    pub fn take_update(&mut self) -> Option<SessionStats> {
        if !self.dirty {
            return None;
        }
        self.dirty = false;
        Some(self.stats.clone())
    }

    /// Consumes world events, updating the statistics.
    pub fn handle(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::LevelPrepared { .. } => {
                    self.stats = SessionStats::default();
                    self.abilities.clear();
                    self.active = None;
                    self.play_mode = PlayMode::Tetris;
                }
                Event::TimeAdvanced { dt } => {
                    let bucket = match self.play_mode {
                        PlayMode::Tetris => &mut self.stats.stacking_time,
                        PlayMode::Platformer => &mut self.stats.platformer_time,
                    };
                    if self.stats.game_over.is_none() {
                        *bucket = bucket.saturating_add(*dt);
                    }
                    continue;
                }
                Event::PlayModeChanged { mode } => self.play_mode = *mode,
                Event::PieceSpawned {
                    piece, definition, ..
                } => {
                    self.stats.pieces_spawned += 1;
                    let _ = self.abilities.insert(*piece, definition.ability());
                    self.active = Some(*piece);
                }
                Event::PieceLocked { piece, cells } => {
                    self.stats.pieces_locked += 1;
                    self.stats.cells_landed += cells.len() as u64;
                    let ability = self.abilities.remove(piece).unwrap_or_default();
                    *self.stats.cells_by_ability.entry(ability).or_insert(0) += cells.len() as u64;
                }
                Event::PieceHeld { .. } => {
                    self.stats.holds += 1;
                    if let Some(piece) = self.active.take() {
                        let _ = self.abilities.remove(&piece);
                    }
                }
                Event::RoundCompleted { trigger, .. } => {
                    self.stats.rounds += 1;
                    match trigger {
                        SwitchTrigger::Quota => self.stats.quota_rounds += 1,
                        SwitchTrigger::Checkpoint { .. } => self.stats.checkpoint_rounds += 1,
                        SwitchTrigger::HeightLimit => {}
                    }
                }
                Event::CheckpointAdvanced { row } => self.stats.checkpoint_row = Some(*row),
                Event::ProtectionPlaced { cells } => {
                    self.stats.protection_cells += cells.len() as u32;
                }
                Event::GameOver { reason } => self.stats.game_over = Some(*reason),
                _ => continue,
            }
            self.dirty = true;
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::Serializer;

    pub(super) fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }
}
