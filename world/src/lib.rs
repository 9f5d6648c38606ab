#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Stackrunner.
//!
//! The world owns the occupancy grid, the piece queue, the falling piece and
//! the mode coordinator. Every mutation flows through [`apply`], which
//! reports its effects as [`Event`] values.

mod grid;
mod level;
mod mode;
mod piece;
mod queue;

use stackrunner_core::{
    Block, BlockId, BlockKind, CellCoord, Command, Event, GameOverReason, PieceDefinition,
    PieceId, PlayMode, SessionConfig, SnapshotBlock, SnapshotCell, SwitchTrigger,
    WELCOME_BANNER,
};

pub use grid::{GridError, OccupancyGrid};
pub use level::{is_in_bounds, LevelShape};
pub use mode::{protection_footprint, LandingOutcome, ModeCoordinator, RoundSummary};
pub use piece::{
    FallingPiece, Footing, GravityIntervals, GravityStep, PiecePhase, SpawnBlocked,
};
pub use queue::{HoldOutcome, PieceGenerator, PieceQueue};

const PROTECTION_REFRESH_RADIUS: i32 = 1;

/// Represents the authoritative Stackrunner world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    config: SessionConfig,
    session_started: bool,
    shape: LevelShape,
    grid: OccupancyGrid,
    queue: PieceQueue,
    piece: Option<FallingPiece>,
    coordinator: ModeCoordinator,
    soft_drop: bool,
    next_block_id: u32,
    next_piece_id: u32,
    landed_blocks: u64,
    tick_index: u64,
}

impl World {
    /// Creates an idle world using the default session configuration.
    ///
    /// Nothing spawns until a [`Command::ConfigureSession`] or
    /// [`Command::Restart`] starts the session.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(SessionConfig::default())
    }

    fn with_config(config: SessionConfig) -> Self {
        let shape = LevelShape::for_level(config.level);
        Self {
            banner: WELCOME_BANNER,
            session_started: false,
            grid: OccupancyGrid::for_shape(&shape),
            queue: PieceQueue::new(config.lookahead, config.seed),
            piece: None,
            coordinator: ModeCoordinator::new(&config),
            soft_drop: false,
            next_block_id: 0,
            next_piece_id: 0,
            landed_blocks: 0,
            tick_index: 0,
            shape,
            config,
        }
    }

    fn intervals(&self) -> GravityIntervals {
        GravityIntervals {
            base: self.config.fall_interval(),
            soft_drop: self.config.soft_drop_interval(),
        }
    }

    fn allocate_block_id(&mut self) -> BlockId {
        let id = BlockId::new(self.next_block_id);
        self.next_block_id = self.next_block_id.wrapping_add(1);
        id
    }

    fn allocate_piece_id(&mut self) -> PieceId {
        let id = PieceId::new(self.next_piece_id);
        self.next_piece_id = self.next_piece_id.wrapping_add(1);
        id
    }

    fn start_session(&mut self, out_events: &mut Vec<Event>) {
        let config = self.config.clone();
        *self = Self::with_config(config);
        self.session_started = true;
        log::info!("starting session on {}", self.shape.level());
        out_events.push(Event::LevelPrepared {
            level: self.shape.level(),
        });
        out_events.push(Event::PlayModeChanged {
            mode: PlayMode::Tetris,
        });

        let anchor = self.shape.starting_point();
        let block = Block::new(self.allocate_block_id(), BlockKind::StartingPoint);
        match self.grid.place(anchor, block) {
            Ok(()) => out_events.push(Event::CellChanged { cell: anchor }),
            Err(error) => log::warn!("starting point rejected: {error}"),
        }

        self.spawn_next(out_events);
    }

    fn spawn_next(&mut self, out_events: &mut Vec<Event>) {
        let definition = self.queue.dequeue_next();
        self.queue.mark_spawned();
        self.spawn(definition, out_events);
    }

    fn spawn(&mut self, definition: PieceDefinition, out_events: &mut Vec<Event>) {
        if self.coordinator.game_over().is_some() {
            return;
        }
        let id = self.allocate_piece_id();
        self.seat(id, definition, out_events);
    }

    fn seat(&mut self, id: PieceId, definition: PieceDefinition, out_events: &mut Vec<Event>) {
        let Some(piece) = self.place_at_spawn(id, definition, out_events) else {
            return;
        };
        log::debug!("spawned piece {} ({:?})", id.get(), definition);
        out_events.push(Event::PieceSpawned {
            piece: id,
            definition,
            origin: piece.origin(),
        });
        self.piece = Some(piece);
    }

    /// Puts an already announced piece back at the spawn origin.
    fn reseat(&mut self, previous: FallingPiece, out_events: &mut Vec<Event>) {
        let Some(piece) = self.place_at_spawn(previous.id(), previous.definition(), out_events)
        else {
            return;
        };
        out_events.push(Event::PieceMoved {
            piece: piece.id(),
            origin: piece.origin(),
            rotation: piece.rotation(),
        });
        self.piece = Some(piece);
    }

    fn place_at_spawn(
        &mut self,
        id: PieceId,
        definition: PieceDefinition,
        out_events: &mut Vec<Event>,
    ) -> Option<FallingPiece> {
        let origin = self.shape.spawn_origin();
        let footing = Footing::new(&self.shape, &self.grid);
        match FallingPiece::spawn(id, definition, origin, self.intervals(), &footing) {
            Ok(piece) => Some(piece),
            Err(blocked) => {
                log::info!("{blocked}");
                self.piece = None;
                self.end_game(GameOverReason::SpawnBlocked, out_events);
                None
            }
        }
    }

    fn end_game(&mut self, reason: GameOverReason, out_events: &mut Vec<Event>) {
        if self.coordinator.declare_game_over(reason) {
            log::info!("game over: {reason:?}");
            out_events.push(Event::GameOver { reason });
        }
    }

    fn lock_piece(&mut self, out_events: &mut Vec<Event>) {
        let Some(piece) = self.piece.take() else {
            return;
        };
        let kind = BlockKind::Piece {
            piece: piece.id(),
            ability: piece.definition().ability(),
        };

        let mut placed = Vec::with_capacity(4);
        for cell in piece.cells() {
            let block = Block::new(self.allocate_block_id(), kind);
            match self.grid.place(cell, block) {
                Ok(()) => {
                    placed.push(cell);
                    out_events.push(Event::CellChanged { cell });
                }
                Err(error) => log::warn!("locked cell dropped: {error}"),
            }
        }
        self.landed_blocks = self.landed_blocks.saturating_add(placed.len() as u64);
        log::debug!("locked piece {} at {:?}", piece.id().get(), placed);

        let outcome = self.coordinator.evaluate_landing(&placed, &self.grid);
        out_events.push(Event::PieceLocked {
            piece: piece.id(),
            cells: placed,
        });

        match outcome {
            LandingOutcome::Continue => self.spawn_next(out_events),
            LandingOutcome::Switch(trigger) => self.switch_to_platformer(trigger, out_events),
        }
    }

    fn switch_to_platformer(&mut self, trigger: SwitchTrigger, out_events: &mut Vec<Event>) {
        let summary = self.coordinator.begin_platformer();
        self.soft_drop = false;
        log::info!(
            "round {} completed by {:?}; checkpoint now row {}",
            summary.round,
            trigger,
            summary.checkpoint_row
        );

        out_events.push(Event::PlayModeChanged {
            mode: PlayMode::Platformer,
        });
        out_events.push(Event::RoundCompleted {
            round: summary.round,
            trigger,
        });
        out_events.push(Event::CheckpointAdvanced {
            row: summary.checkpoint_row,
        });
        self.remove_protection(out_events);
        out_events.push(Event::PlayerActivationChanged { active: true });
        out_events.push(Event::RoundTimerArmed {
            duration: self.config.platformer_round(),
        });
        out_events.push(Event::CameraFollowEnabled);

        if trigger == SwitchTrigger::HeightLimit {
            self.end_game(GameOverReason::HeightLimit, out_events);
        }
    }

    fn switch_to_tetris(&mut self, player_cell: CellCoord, out_events: &mut Vec<Event>) {
        if let Err(reason) = self.coordinator.can_return() {
            log::debug!("return to stacking refused: {reason:?}");
            out_events.push(Event::SwitchRefused { reason });
            return;
        }

        self.coordinator.begin_tetris();
        log::info!("returning to stacking with player at {player_cell:?}");
        out_events.push(Event::PlayModeChanged {
            mode: PlayMode::Tetris,
        });
        out_events.push(Event::PlayerActivationChanged { active: false });
        out_events.push(Event::RoundTimerDisarmed);
        self.remove_protection(out_events);
        self.place_protection(player_cell, out_events);
        self.spawn_next(out_events);
        out_events.push(Event::CameraFollowDisabled);
    }

    fn remove_protection(&mut self, out_events: &mut Vec<Event>) {
        let tagged = self.coordinator.take_protection();
        if tagged.is_empty() {
            return;
        }

        let mut removed = Vec::with_capacity(tagged.len());
        for (cell, block) in tagged {
            if self.grid.remove(cell, block) {
                removed.push(cell);
            }
        }
        for cell in &removed {
            out_events.extend(
                self.grid
                    .region_around(*cell, PROTECTION_REFRESH_RADIUS)
                    .map(|cell| Event::CellChanged { cell }),
            );
        }
        if !removed.is_empty() {
            out_events.push(Event::ProtectionRemoved { cells: removed });
        }
    }

    fn place_protection(&mut self, player_cell: CellCoord, out_events: &mut Vec<Event>) {
        let mut placed = Vec::with_capacity(4);
        for cell in protection_footprint(player_cell) {
            if !self.shape.is_in_bounds(cell) || self.grid.is_occupied(cell) {
                continue;
            }
            let block = Block::new(self.allocate_block_id(), BlockKind::Protection);
            if self.grid.place(cell, block).is_ok() {
                self.coordinator.record_protection(cell, block.id());
                placed.push(cell);
                out_events.push(Event::CellChanged { cell });
            }
        }
        if !placed.is_empty() {
            out_events.push(Event::ProtectionPlaced { cells: placed });
        }
    }

    fn hold_piece(&mut self, out_events: &mut Vec<Event>) {
        if !self.coordinator.is_stacking() {
            return;
        }
        let Some(current) = self.piece.as_ref().map(FallingPiece::definition) else {
            return;
        };
        match self.queue.try_hold(current) {
            None => out_events.push(Event::HoldRejected),
            Some(outcome) => {
                out_events.push(Event::PieceHeld { held: current });
                self.piece = None;
                self.spawn(outcome.active, out_events);
            }
        }
    }

    fn restore_grid(&mut self, cells: Vec<SnapshotCell>, out_events: &mut Vec<Event>) {
        self.grid.clear();
        let _ = self.coordinator.take_protection();

        for SnapshotCell { cell, block } in cells {
            if !self.shape.is_in_bounds(cell) {
                log::warn!("snapshot cell {cell:?} lies outside {}", self.shape.level());
                continue;
            }
            let kind = match block {
                SnapshotBlock::Piece(ability) => BlockKind::Piece {
                    piece: self.allocate_piece_id(),
                    ability,
                },
                SnapshotBlock::Protection => BlockKind::Protection,
                SnapshotBlock::StartingPoint => BlockKind::StartingPoint,
            };
            let block = Block::new(self.allocate_block_id(), kind);
            match self.grid.place(cell, block) {
                Ok(()) => {
                    if block.is_protection() {
                        self.coordinator.record_protection(cell, block.id());
                    }
                    out_events.push(Event::CellChanged { cell });
                }
                Err(error) => log::warn!("snapshot cell skipped: {error}"),
            }
        }

        if let Some(piece) = self.piece.take() {
            self.reseat(piece, out_events);
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureSession { config } => {
            if let Err(error) = config.validate() {
                log::warn!("ignoring session configuration: {error}");
                return;
            }
            let level_changed = config.level != world.shape.level();
            world.config = config;
            if level_changed || !world.session_started {
                world.start_session(out_events);
            } else {
                world.coordinator.retune(&world.config);
            }
        }
        Command::Restart => world.start_session(out_events),
        Command::Tick { dt } => {
            world.tick_index = world.tick_index.saturating_add(1);
            out_events.push(Event::TimeAdvanced { dt });

            if !world.coordinator.is_stacking() {
                return;
            }
            let intervals = world.intervals();
            let Some(piece) = world.piece.as_mut() else {
                return;
            };
            let footing = Footing::new(&world.shape, &world.grid);
            let step = piece.advance(dt, intervals, world.soft_drop, &footing);
            if step.rows_fallen > 0 {
                out_events.push(Event::PieceMoved {
                    piece: piece.id(),
                    origin: piece.origin(),
                    rotation: piece.rotation(),
                });
            }
            if step.locked {
                world.lock_piece(out_events);
            }
        }
        Command::ShiftPiece { shift } => {
            if !world.coordinator.is_stacking() {
                return;
            }
            if let Some(piece) = world.piece.as_mut() {
                let footing = Footing::new(&world.shape, &world.grid);
                if piece.try_shift(shift, &footing) {
                    out_events.push(Event::PieceMoved {
                        piece: piece.id(),
                        origin: piece.origin(),
                        rotation: piece.rotation(),
                    });
                }
            }
        }
        Command::RotatePiece => {
            if !world.coordinator.is_stacking() {
                return;
            }
            if let Some(piece) = world.piece.as_mut() {
                let footing = Footing::new(&world.shape, &world.grid);
                if piece.try_rotate(&footing) {
                    out_events.push(Event::PieceMoved {
                        piece: piece.id(),
                        origin: piece.origin(),
                        rotation: piece.rotation(),
                    });
                }
            }
        }
        Command::SetSoftDrop { engaged } => {
            world.soft_drop = engaged && world.coordinator.is_stacking();
        }
        Command::HoldPiece => world.hold_piece(out_events),
        Command::SwitchToTetris { player_cell } => world.switch_to_tetris(player_cell, out_events),
        Command::RestoreGrid { cells } => world.restore_grid(cells, out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use super::{FallingPiece, LevelShape, OccupancyGrid, World};
    use stackrunner_core::{
        Block, BlockKind, CellCoord, GameOverReason, LevelId, PieceDefinition, PieceId,
        PlayMode, Rotation, SessionConfig, SnapshotBlock, SnapshotCell, PREVIEW_LEN,
    };

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Configuration the session currently runs with.
    #[must_use]
    pub fn config(world: &World) -> &SessionConfig {
        &world.config
    }

    /// Level the world is laid out for.
    #[must_use]
    pub fn level(world: &World) -> LevelId {
        world.shape.level()
    }

    /// Shape of the active level.
    #[must_use]
    pub fn level_shape(world: &World) -> &LevelShape {
        &world.shape
    }

    /// Active play mode.
    #[must_use]
    pub fn play_mode(world: &World) -> PlayMode {
        world.coordinator.mode()
    }

    /// Why the session ended, if it did.
    #[must_use]
    pub fn game_over(world: &World) -> Option<GameOverReason> {
        world.coordinator.game_over()
    }

    /// Number of simulation ticks processed since the world was created.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Total cells committed to the grid since the level started.
    #[must_use]
    pub fn landed_blocks(world: &World) -> u64 {
        world.landed_blocks
    }

    /// Pieces landed in the current round.
    #[must_use]
    pub fn landed_this_round(world: &World) -> u32 {
        world.coordinator.landed_this_round()
    }

    /// Rounds completed since the level started.
    #[must_use]
    pub fn rounds_completed(world: &World) -> u32 {
        world.coordinator.rounds_completed()
    }

    /// Row whose occupation ends the current round.
    #[must_use]
    pub fn checkpoint_row(world: &World) -> i32 {
        world.coordinator.checkpoint_row()
    }

    /// Captures the falling piece, if one is active.
    #[must_use]
    pub fn falling_piece(world: &World) -> Option<FallingPieceView> {
        world.piece.as_ref().map(FallingPieceView::capture)
    }

    /// Upcoming pieces shown to the player.
    #[must_use]
    pub fn preview(world: &World) -> Vec<PieceDefinition> {
        world.queue.peek_preview(PREVIEW_LEN).collect()
    }

    /// Number of pieces waiting in the queue.
    #[must_use]
    pub fn queue_len(world: &World) -> usize {
        world.queue.len()
    }

    /// Piece stored in the hold slot.
    #[must_use]
    pub fn held_piece(world: &World) -> Option<PieceDefinition> {
        world.queue.held()
    }

    /// Whether a hold request would currently be honoured by the queue.
    #[must_use]
    pub fn hold_available(world: &World) -> bool {
        world.queue.hold_available()
    }

    /// Cells holding live protection blocks.
    #[must_use]
    pub fn protection_cells(world: &World) -> Vec<CellCoord> {
        world.coordinator.protection_cells().collect()
    }

    /// Exposes a read-only view of the occupancy grid.
    #[must_use]
    pub fn occupancy_view(world: &World) -> OccupancyView<'_> {
        OccupancyView { grid: &world.grid }
    }

    /// Captures every occupied cell in a persistable form.
    #[must_use]
    pub fn snapshot(world: &World) -> Vec<SnapshotCell> {
        world
            .grid
            .blocks()
            .map(|(cell, block)| SnapshotCell {
                cell,
                block: match block.kind() {
                    BlockKind::Piece { ability, .. } => SnapshotBlock::Piece(ability),
                    BlockKind::Protection => SnapshotBlock::Protection,
                    BlockKind::StartingPoint => SnapshotBlock::StartingPoint,
                },
            })
            .collect()
    }

    /// Immutable representation of the falling piece.
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct FallingPieceView {
        /// Identifier of the piece.
        pub id: PieceId,
        /// Shape and ability of the piece.
        pub definition: PieceDefinition,
        /// Position of the piece origin.
        pub origin: CellCoord,
        /// Current orientation.
        pub rotation: Rotation,
        /// World cells occupied by the piece.
        pub cells: [CellCoord; 4],
    }

    impl FallingPieceView {
        fn capture(piece: &FallingPiece) -> Self {
            Self {
                id: piece.id(),
                definition: piece.definition(),
                origin: piece.origin(),
                rotation: piece.rotation(),
                cells: piece.cells(),
            }
        }
    }

    /// Read-only view into the occupancy grid.
    #[derive(Clone, Copy, Debug)]
    pub struct OccupancyView<'a> {
        grid: &'a OccupancyGrid,
    }

    impl<'a> OccupancyView<'a> {
        /// Returns the block occupying the provided cell, if any.
        #[must_use]
        pub fn block_at(&self, cell: CellCoord) -> Option<Block> {
            self.grid.block_at(cell)
        }

        /// Reports whether the cell holds a block.
        #[must_use]
        pub fn is_occupied(&self, cell: CellCoord) -> bool {
            self.grid.is_occupied(cell)
        }

        /// Iterates every occupied cell, bottom row first.
        pub fn iter(&self) -> impl Iterator<Item = (CellCoord, Block)> + 'a {
            self.grid.blocks()
        }

        /// Provides the dimensions of the underlying array.
        #[must_use]
        pub fn dimensions(&self) -> (u32, u32) {
            self.grid.dimensions()
        }

        /// Constant added to world rows to obtain array rows.
        #[must_use]
        pub fn y_offset(&self) -> i32 {
            self.grid.y_offset()
        }
    }
}
