use std::time::Duration;

use stackrunner_core::{
    Ability, CellCoord, Command, Event, GameOverReason, PlayMode, SessionConfig, SnapshotBlock,
    SnapshotCell,
};
use stackrunner_system_analytics::Analytics;
use stackrunner_world::{self as world, query, World};

fn drive(world: &mut World, analytics: &mut Analytics, command: Command) {
    let mut events = Vec::new();
    world::apply(world, command, &mut events);
    analytics.handle(&events);
}

#[test]
fn locked_cells_are_attributed_to_the_spawned_ability() {
    let mut world = World::new();
    let mut analytics = Analytics::new();
    drive(
        &mut world,
        &mut analytics,
        Command::ConfigureSession {
            config: SessionConfig::default(),
        },
    );
    let ability = query::falling_piece(&world)
        .expect("piece spawned")
        .definition
        .ability();

    drive(
        &mut world,
        &mut analytics,
        Command::Tick {
            dt: Duration::from_secs(60),
        },
    );

    let stats = analytics.take_update().expect("lock publishes an update");
    assert_eq!(stats.pieces_locked, 1);
    assert_eq!(stats.cells_landed, 4);
    assert_eq!(stats.cells_by_ability.get(&ability), Some(&4));
    assert_eq!(stats.cells_landed, query::landed_blocks(&world));
    assert_eq!(stats.pieces_spawned, 2);
    assert_eq!(analytics.take_update(), None, "update is consumed");
}

#[test]
fn rounds_and_phase_time_are_tracked() {
    let mut world = World::new();
    let mut analytics = Analytics::new();
    drive(
        &mut world,
        &mut analytics,
        Command::ConfigureSession {
            config: SessionConfig {
                round_quota: 1,
                ..SessionConfig::default()
            },
        },
    );
    drive(
        &mut world,
        &mut analytics,
        Command::Tick {
            dt: Duration::from_secs(60),
        },
    );
    assert_eq!(query::play_mode(&world), PlayMode::Platformer);
    drive(
        &mut world,
        &mut analytics,
        Command::Tick {
            dt: Duration::from_secs(5),
        },
    );

    let stats = analytics.report();
    assert_eq!(stats.rounds, 1);
    assert_eq!(stats.quota_rounds, 1);
    assert_eq!(stats.checkpoint_row, Some(12));
    assert_eq!(stats.stacking_time, Duration::from_secs(60));
    assert_eq!(stats.platformer_time, Duration::from_secs(5));
}

#[test]
fn level_restart_clears_statistics() {
    let mut analytics = Analytics::new();
    analytics.handle(&[
        Event::GameOver {
            reason: GameOverReason::SpawnBlocked,
        },
        Event::TimeAdvanced {
            dt: Duration::from_secs(3),
        },
    ]);
    assert_eq!(analytics.report().game_over, Some(GameOverReason::SpawnBlocked));
    assert_eq!(analytics.report().stacking_time, Duration::ZERO);

    analytics.handle(&[Event::LevelPrepared {
        level: stackrunner_core::LevelId::Two,
    }]);

    assert_eq!(analytics.report().game_over, None);
    assert_eq!(analytics.report().rounds, 0);
}

#[test]
fn report_serializes_to_json() {
    let analytics = Analytics::new();
    let json = serde_json::to_value(analytics.report()).expect("stats serialize");
    assert_eq!(json["stacking_time"], 0);
    assert_eq!(json["game_over"], serde_json::Value::Null);
}

#[test]
fn restoring_the_grid_does_not_count_a_new_spawn() {
    let mut world = World::new();
    let mut analytics = Analytics::new();
    drive(
        &mut world,
        &mut analytics,
        Command::ConfigureSession {
            config: SessionConfig::default(),
        },
    );
    drive(
        &mut world,
        &mut analytics,
        Command::RestoreGrid {
            cells: vec![SnapshotCell {
                cell: CellCoord::new(0, 0),
                block: SnapshotBlock::Piece(Ability::Pass),
            }],
        },
    );

    assert_eq!(analytics.report().pieces_spawned, 1);
}
