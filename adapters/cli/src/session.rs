use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use stackrunner_core::{
    CellCoord, Command, Event, GameOverReason, LevelId, PieceDefinition, PieceId, SessionConfig,
    SnapshotCell, SwitchTrigger,
};
use stackrunner_presentation::{
    cell_center, dispatch, CameraFraming, CameraRig, CellRenderer, Collaborators, Player,
    RoundClock, Spawner,
};
use stackrunner_system_analytics::{Analytics, SessionStats};
use stackrunner_system_bootstrap::Bootstrap;
use stackrunner_system_controls::{Controls, PieceInput};
use stackrunner_system_round_timer::RoundTimer;
use stackrunner_world::{self as world, query, LevelShape, World};

/// Random but reproducible piece input.
#[derive(Debug)]
struct Autopilot {
    rng: ChaCha8Rng,
}

impl Autopilot {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    fn next_input(&mut self) -> PieceInput {
        let roll = self.rng.gen_range(0..12);
        PieceInput {
            left: roll < 2,
            right: (2..4).contains(&roll),
            rotate: roll == 4,
            hold: roll == 5 && self.rng.gen_bool(0.1),
            soft_drop: self.rng.gen_bool(0.3),
        }
    }
}

#[derive(Debug, Default)]
struct PieceLog;

impl Spawner for PieceLog {
    fn spawn_next(&mut self, piece: PieceId, definition: &PieceDefinition, origin: CellCoord) {
        log::debug!(
            "spawn {piece:?} shape {} ({:?}) at {origin:?}",
            definition.shape().get(),
            definition.ability()
        );
    }

    fn notify_landed(&mut self, piece: PieceId, cells: &[CellCoord]) {
        log::debug!("{piece:?} landed on {cells:?}");
    }

    fn notify_round_completed(&mut self, round: u32, trigger: SwitchTrigger) {
        log::info!("round {round} completed by {trigger:?}");
    }

    fn notify_game_over(&mut self, reason: GameOverReason) {
        log::info!("game over: {reason:?}");
    }
}

#[derive(Debug, Default)]
struct RefreshCounter {
    refreshed: u64,
}

impl CellRenderer for RefreshCounter {
    fn refresh_cell_and_neighbors(&mut self, _cell: CellCoord) {
        self.refreshed += 1;
    }
}

/// Stand-in for the platformer character: it waits on top of the stack
/// above the level's starting point.
#[derive(Debug, Default)]
struct Runner {
    active: bool,
}

impl Runner {
    fn standing_cell(world: &World) -> CellCoord {
        let shape = query::level_shape(world);
        let anchor = shape.starting_point();
        let grid = query::occupancy_view(world);
        let top = (shape.min_row()..=shape.max_row())
            .rev()
            .map(|row| CellCoord::new(anchor.x(), row))
            .find(|cell| grid.is_occupied(*cell))
            .unwrap_or(anchor);
        let above = top.translated(0, 1);
        if shape.is_in_bounds(above) {
            above
        } else {
            top
        }
    }
}

impl Player for Runner {
    fn set_active(&mut self, active: bool) {
        self.active = active;
    }
}

#[derive(Debug, Default)]
struct Countdown {
    armed: Option<Duration>,
}

impl RoundClock for Countdown {
    fn arm(&mut self, duration: Duration) {
        log::debug!("platformer round of {duration:?}");
        self.armed = Some(duration);
    }

    fn disarm(&mut self) {
        self.armed = None;
    }
}

/// Headless session wiring the world to every system and collaborator.
pub(crate) struct Session {
    world: World,
    controls: Controls,
    timer: RoundTimer,
    analytics: Analytics,
    autopilot: Autopilot,
    pieces: PieceLog,
    renderer: RefreshCounter,
    runner: Runner,
    countdown: Countdown,
    camera: CameraRig,
    pending: Vec<Event>,
    tick: Duration,
}

impl Session {
    /// Starts `level` with the seed derived from `master_seed`.
    pub(crate) fn start(
        master_seed: u64,
        level: LevelId,
        base: &SessionConfig,
        tick: Duration,
    ) -> Self {
        let bootstrap = Bootstrap::new(master_seed);
        let mut commands = Vec::new();
        bootstrap.start_level(level, base, &mut commands);

        let shape = LevelShape::for_level(level);
        let mut session = Self {
            world: World::new(),
            controls: Controls::new(),
            timer: RoundTimer::new(),
            analytics: Analytics::new(),
            autopilot: Autopilot::new(bootstrap.level_seed(level)),
            pieces: PieceLog,
            renderer: RefreshCounter::default(),
            runner: Runner::default(),
            countdown: Countdown::default(),
            camera: CameraRig::new(shape.width(), shape.min_row(), shape.max_row()),
            pending: Vec::new(),
            tick,
        };
        session.execute(commands);
        session
    }

    /// Replaces the grid contents and continues from there.
    pub(crate) fn restore(&mut self, cells: Vec<SnapshotCell>) {
        self.execute(vec![Command::RestoreGrid { cells }]);
    }

    /// Advances the session by up to `ticks` frames, stopping at game over.
    ///
    /// Returns the number of frames simulated.
    pub(crate) fn run(&mut self, ticks: u32) -> u32 {
        for frame in 0..ticks {
            if query::game_over(&self.world).is_some() {
                return frame;
            }
            self.step();
        }
        ticks
    }

    fn step(&mut self) {
        let mut commands = Vec::new();
        let input = self.autopilot.next_input();
        self.controls.handle(&self.pending, input, &mut commands);
        commands.push(Command::Tick { dt: self.tick });
        self.execute(commands);
    }

    fn execute(&mut self, commands: Vec<Command>) {
        let mut events = Vec::new();
        for command in commands {
            world::apply(&mut self.world, command, &mut events);
        }

        let mut follow_up = Vec::new();
        let current = &self.world;
        self.timer
            .handle(&events, || Runner::standing_cell(current), &mut follow_up);
        for command in follow_up {
            world::apply(&mut self.world, command, &mut events);
        }

        self.analytics.handle(&events);
        if let Some(stats) = self.analytics.take_update() {
            log::trace!("stats updated: {} cells landed", stats.cells_landed);
        }
        dispatch(
            &events,
            &mut Collaborators {
                spawner: &mut self.pieces,
                camera: &mut self.camera,
                renderer: &mut self.renderer,
                player: &mut self.runner,
                clock: &mut self.countdown,
            },
        );
        self.pending = events;
    }

    /// World driven by the session.
    pub(crate) fn world(&self) -> &World {
        &self.world
    }

    /// Statistics gathered so far.
    pub(crate) fn stats(&self) -> &SessionStats {
        self.analytics.report()
    }

    /// One-line summary of the session state.
    pub(crate) fn status(&self) -> String {
        let world = &self.world;
        let framing: CameraFraming = self
            .camera
            .framing(cell_center(Runner::standing_cell(world)));
        let mut status = format!(
            "{} | tick {} | mode {:?} | round {} | checkpoint row {} | landed {} | camera ({:.1}, {:.1}) x{}",
            query::level(world),
            query::tick_index(world),
            query::play_mode(world),
            query::rounds_completed(world) + 1,
            query::checkpoint_row(world),
            query::landed_blocks(world),
            framing.center.x,
            framing.center.y,
            framing.size,
        );
        if self.runner.active {
            if let (Some(armed), Some(fraction)) =
                (self.countdown.armed, self.timer.remaining_fraction())
            {
                status.push_str(&format!(
                    " | runner active, {:.0}% of {armed:?} left",
                    fraction * 100.0
                ));
            }
        }
        if let Some(reason) = query::game_over(world) {
            status.push_str(&format!(" | game over ({reason:?})"));
        }
        status.push_str(&format!(" | {} cell refreshes", self.renderer.refreshed));
        status
    }
}
