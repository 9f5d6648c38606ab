//! Upcoming-piece queue with preview and a one-shot hold slot.

use std::collections::VecDeque;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use stackrunner_core::{Ability, PieceDefinition, ShapeId};

/// Deterministic source of random piece definitions.
#[derive(Clone, Debug)]
pub struct PieceGenerator {
    rng: ChaCha8Rng,
}

impl PieceGenerator {
    /// Creates a generator whose sequence is fully determined by the seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Draws the next piece: uniform shape, weighted ability tag.
    pub fn generate(&mut self) -> PieceDefinition {
        let shape = ShapeId::ALL[self.rng.gen_range(0..ShapeId::COUNT)];
        let ability = Ability::from_roll(self.rng.gen_range(0..100));
        PieceDefinition::new(shape, ability)
    }
}

/// Result of a successful hold request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HoldOutcome {
    /// Piece that becomes active.
    pub active: PieceDefinition,
    /// Content of the hold slot before the request.
    pub held_before: Option<PieceDefinition>,
}

/// Fixed-length queue of upcoming pieces.
///
/// The queue always holds exactly `lookahead` pieces between calls.
#[derive(Clone, Debug)]
pub struct PieceQueue {
    generator: PieceGenerator,
    upcoming: VecDeque<PieceDefinition>,
    lookahead: usize,
    held: Option<PieceDefinition>,
    hold_available: bool,
}

impl PieceQueue {
    /// Creates a queue pre-filled with `lookahead` generated pieces.
    #[must_use]
    pub fn new(lookahead: usize, seed: u64) -> Self {
        let mut queue = Self {
            generator: PieceGenerator::new(seed),
            upcoming: VecDeque::with_capacity(lookahead),
            lookahead,
            held: None,
            hold_available: true,
        };
        queue.initialize(lookahead);
        queue
    }

    /// Discards the queue and hold slot, then refills with `lookahead` pieces.
    pub fn initialize(&mut self, lookahead: usize) {
        self.lookahead = lookahead;
        self.upcoming.clear();
        self.held = None;
        self.hold_available = true;
        self.refill();
    }

    /// Removes the head and enqueues a fresh replacement.
    pub fn dequeue_next(&mut self) -> PieceDefinition {
        let next = match self.upcoming.pop_front() {
            Some(next) => next,
            None => self.generator.generate(),
        };
        self.refill();
        next
    }

    /// Read-only view over the first `n` upcoming pieces.
    pub fn peek_preview(&self, n: usize) -> impl Iterator<Item = PieceDefinition> + Clone + '_ {
        self.upcoming.iter().take(n).copied()
    }

    /// Stores `current` in the hold slot, returning the piece that replaces it.
    ///
    /// Returns `None` without touching any state when hold was already used
    /// since the last spawn.
    pub fn try_hold(&mut self, current: PieceDefinition) -> Option<HoldOutcome> {
        if !self.hold_available {
            return None;
        }
        self.hold_available = false;
        let held_before = self.held.replace(current);
        let active = match held_before {
            Some(previous) => previous,
            None => self.dequeue_next(),
        };
        Some(HoldOutcome {
            active,
            held_before,
        })
    }

    /// Re-enables hold after a natural spawn.
    pub fn mark_spawned(&mut self) {
        self.hold_available = true;
    }

    /// Piece currently stored in the hold slot.
    #[must_use]
    pub const fn held(&self) -> Option<PieceDefinition> {
        self.held
    }

    /// Whether a hold request would be honoured.
    #[must_use]
    pub const fn hold_available(&self) -> bool {
        self.hold_available
    }

    /// Number of queued pieces.
    #[must_use]
    pub fn len(&self) -> usize {
        self.upcoming.len()
    }

    /// Reports whether the queue holds no pieces.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.upcoming.is_empty()
    }

    fn refill(&mut self) {
        while self.upcoming.len() < self.lookahead {
            self.upcoming.push_back(self.generator.generate());
        }
    }
}
