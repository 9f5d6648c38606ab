//! Session tuning shared by the world, systems and adapters.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::LevelId;

/// Number of upcoming pieces kept in the queue when no override is provided.
pub const DEFAULT_LOOKAHEAD: usize = 4;
/// Number of queued pieces shown in the preview.
pub const PREVIEW_LEN: usize = 3;

/// Tunable parameters for a play session.
///
/// Every field falls back to its default when missing from a configuration
/// file, so partial TOML documents are accepted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Level the session runs on.
    pub level: LevelId,
    /// Seed feeding the piece generator.
    pub seed: u64,
    /// Number of upcoming pieces held in the queue.
    pub lookahead: usize,
    /// Base gravity interval in milliseconds.
    pub fall_interval_ms: u64,
    /// Gravity interval while soft drop is engaged, in milliseconds.
    pub soft_drop_interval_ms: u64,
    /// Pieces that may land in one Tetris round before switching modes.
    pub round_quota: u32,
    /// Row whose occupation ends the game.
    pub height_limit_row: i32,
    /// Row whose occupation triggers the first mode switch.
    pub first_checkpoint_row: i32,
    /// Rows added to the checkpoint after every switch.
    pub checkpoint_step: i32,
    /// Length of a platformer round in milliseconds.
    pub platformer_round_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            level: LevelId::One,
            seed: 0x5eed_b10c_4a11_0001,
            lookahead: DEFAULT_LOOKAHEAD,
            fall_interval_ms: 1_000,
            soft_drop_interval_ms: 100,
            round_quota: 8,
            height_limit_row: 18,
            first_checkpoint_row: 6,
            checkpoint_step: 6,
            platformer_round_ms: 20_000,
        }
    }
}

impl SessionConfig {
    /// Base gravity interval.
    #[must_use]
    pub const fn fall_interval(&self) -> Duration {
        Duration::from_millis(self.fall_interval_ms)
    }

    /// Gravity interval while soft drop is engaged.
    #[must_use]
    pub const fn soft_drop_interval(&self) -> Duration {
        Duration::from_millis(self.soft_drop_interval_ms)
    }

    /// Duration of one platformer round.
    #[must_use]
    pub const fn platformer_round(&self) -> Duration {
        Duration::from_millis(self.platformer_round_ms)
    }

    /// Checks the configuration for values the simulation cannot honour.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lookahead == 0 {
            return Err(ConfigError::EmptyLookahead);
        }
        if self.fall_interval_ms == 0 || self.soft_drop_interval_ms == 0 {
            return Err(ConfigError::ZeroFallInterval);
        }
        if self.round_quota == 0 {
            return Err(ConfigError::ZeroRoundQuota);
        }
        if self.checkpoint_step <= 0 {
            return Err(ConfigError::NonPositiveCheckpointStep(self.checkpoint_step));
        }
        Ok(())
    }
}

/// Reasons a [`SessionConfig`] is rejected.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The queue must hold at least one upcoming piece.
    #[error("lookahead must be at least one piece")]
    EmptyLookahead,
    /// Gravity intervals must be positive.
    #[error("fall intervals must be positive")]
    ZeroFallInterval,
    /// A round must allow at least one landed piece.
    #[error("round quota must be at least one piece")]
    ZeroRoundQuota,
    /// Checkpoints must move upward after every switch.
    #[error("checkpoint step must be positive (received {0})")]
    NonPositiveCheckpointStep(i32),
}
