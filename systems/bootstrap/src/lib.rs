#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure bootstrap system that prepares a Stackrunner session.

use sha2::{Digest, Sha256};
use stackrunner_core::{Command, LevelId, SessionConfig};
use stackrunner_world::{query, LevelShape, World};

const LEVEL_STREAM_LABEL: &str = "stackrunner/level";

/// Derives per-level sessions from a single master seed.
#[derive(Debug, Default)]
pub struct Bootstrap {
    master_seed: u64,
}

impl Bootstrap {
    /// Creates a bootstrap system that derives level seeds from `master_seed`.
    #[must_use]
    pub const fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    /// Derives the banner that should be shown when the experience starts.
    #[must_use]
    pub fn welcome_banner<'world>(&self, world: &'world World) -> &'world str {
        query::welcome_banner(world)
    }

    /// Exposes the shape of the active level for presentation.
    #[must_use]
    pub fn level_shape<'world>(&self, world: &'world World) -> &'world LevelShape {
        query::level_shape(world)
    }

    /// Piece-generator seed for the provided level.
    ///
    /// Every level draws from an independent stream so replaying one level
    /// never shifts the sequence of another.
    #[must_use]
    pub fn level_seed(&self, level: LevelId) -> u64 {
        let mut hasher = Sha256::new();
        hasher.update(self.master_seed.to_le_bytes());
        hasher.update(LEVEL_STREAM_LABEL.as_bytes());
        hasher.update(level.name().as_bytes());
        let digest = hasher.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        u64::from_le_bytes(bytes)
    }

    /// Emits the command that starts `level` with the provided tuning.
    pub fn start_level(&self, level: LevelId, base: &SessionConfig, out: &mut Vec<Command>) {
        let config = SessionConfig {
            level,
            seed: self.level_seed(level),
            ..base.clone()
        };
        out.push(Command::ConfigureSession { config });
    }
}
