//! Tetris/platformer mode state machine and protection bookkeeping.

use stackrunner_core::{
    BlockId, CellCoord, GameOverReason, PlayMode, SessionConfig, SwitchRefusal, SwitchTrigger,
};

use crate::grid::OccupancyGrid;

/// Decision taken after a piece was committed to the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LandingOutcome {
    /// Keep stacking; the next piece spawns.
    Continue,
    /// End the round and hand control to the platformer phase.
    Switch(SwitchTrigger),
}

/// Round progression recorded when the platformer phase begins.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoundSummary {
    /// One-based number of the round that just ended.
    pub round: u32,
    /// Checkpoint row in effect for the next round.
    pub checkpoint_row: i32,
}

/// Owns the play mode, round counters, game-over flag and live protection.
#[derive(Clone, Debug)]
pub struct ModeCoordinator {
    mode: PlayMode,
    game_over: Option<GameOverReason>,
    landed_this_round: u32,
    rounds_completed: u32,
    checkpoint_row: i32,
    round_quota: u32,
    height_limit_row: i32,
    checkpoint_step: i32,
    protection: Vec<(CellCoord, BlockId)>,
}

impl ModeCoordinator {
    /// Creates a coordinator in the stacking phase.
    #[must_use]
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            mode: PlayMode::Tetris,
            game_over: None,
            landed_this_round: 0,
            rounds_completed: 0,
            checkpoint_row: config.first_checkpoint_row,
            round_quota: config.round_quota,
            height_limit_row: config.height_limit_row,
            checkpoint_step: config.checkpoint_step,
            protection: Vec::new(),
        }
    }

    /// Applies new tuning without touching progression.
    pub fn retune(&mut self, config: &SessionConfig) {
        self.round_quota = config.round_quota;
        self.height_limit_row = config.height_limit_row;
        self.checkpoint_step = config.checkpoint_step;
    }

    /// Active play mode.
    #[must_use]
    pub const fn mode(&self) -> PlayMode {
        self.mode
    }

    /// Why the session ended, if it did.
    #[must_use]
    pub const fn game_over(&self) -> Option<GameOverReason> {
        self.game_over
    }

    /// Whether the stacking phase currently accepts piece input.
    #[must_use]
    pub const fn is_stacking(&self) -> bool {
        matches!(self.mode, PlayMode::Tetris) && self.game_over.is_none()
    }

    /// Pieces landed since the current round began.
    #[must_use]
    pub const fn landed_this_round(&self) -> u32 {
        self.landed_this_round
    }

    /// Rounds finished since the level started.
    #[must_use]
    pub const fn rounds_completed(&self) -> u32 {
        self.rounds_completed
    }

    /// Row whose occupation ends the current round.
    #[must_use]
    pub const fn checkpoint_row(&self) -> i32 {
        self.checkpoint_row
    }

    /// Records a landed piece and decides whether the round ends.
    ///
    /// The height limit is checked first by scanning the whole grid, then the
    /// checkpoint against the freshly committed cells, then the quota.
    pub fn evaluate_landing(&mut self, locked: &[CellCoord], grid: &OccupancyGrid) -> LandingOutcome {
        self.landed_this_round = self.landed_this_round.saturating_add(1);

        if grid.committed_at_or_above(self.height_limit_row) {
            return LandingOutcome::Switch(SwitchTrigger::HeightLimit);
        }
        if locked.iter().any(|cell| cell.y() >= self.checkpoint_row) {
            return LandingOutcome::Switch(SwitchTrigger::Checkpoint {
                row: self.checkpoint_row,
            });
        }
        if self.landed_this_round >= self.round_quota {
            return LandingOutcome::Switch(SwitchTrigger::Quota);
        }
        LandingOutcome::Continue
    }

    /// Enters the platformer phase, closing the current round.
    pub fn begin_platformer(&mut self) -> RoundSummary {
        self.mode = PlayMode::Platformer;
        self.landed_this_round = 0;
        self.rounds_completed = self.rounds_completed.saturating_add(1);
        self.checkpoint_row = self.checkpoint_row.saturating_add(self.checkpoint_step);
        RoundSummary {
            round: self.rounds_completed,
            checkpoint_row: self.checkpoint_row,
        }
    }

    /// Checks whether a return to stacking may proceed.
    pub fn can_return(&self) -> Result<(), SwitchRefusal> {
        if self.game_over.is_some() {
            return Err(SwitchRefusal::GameOver);
        }
        if self.mode != PlayMode::Platformer {
            return Err(SwitchRefusal::NotPlatformer);
        }
        Ok(())
    }

    /// Re-enters the stacking phase.
    pub fn begin_tetris(&mut self) {
        self.mode = PlayMode::Tetris;
    }

    /// Sets the terminal flag. Returns `false` when the game was already over.
    pub fn declare_game_over(&mut self, reason: GameOverReason) -> bool {
        if self.game_over.is_some() {
            return false;
        }
        self.game_over = Some(reason);
        true
    }

    /// Tags a protection block so it can be removed on the next switch.
    pub fn record_protection(&mut self, cell: CellCoord, block: BlockId) {
        self.protection.push((cell, block));
    }

    /// Hands over every tagged protection block, clearing the tag list.
    pub fn take_protection(&mut self) -> Vec<(CellCoord, BlockId)> {
        std::mem::take(&mut self.protection)
    }

    /// Cells currently tagged as protection.
    pub fn protection_cells(&self) -> impl Iterator<Item = CellCoord> + '_ {
        self.protection.iter().map(|(cell, _)| *cell)
    }
}

/// Two-by-two footprint placed under and beside the player on re-entry.
#[must_use]
pub fn protection_footprint(player: CellCoord) -> [CellCoord; 4] {
    [
        player.translated(-1, 1),
        player.translated(0, 1),
        player.translated(-1, 0),
        player,
    ]
}
