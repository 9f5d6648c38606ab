use std::time::Duration;

use stackrunner_core::{
    Ability, CellCoord, Command, Event, GameOverReason, LevelId, PlayMode, SessionConfig, Shift,
    SnapshotBlock, SnapshotCell, SwitchRefusal, SwitchTrigger,
};
use stackrunner_world::{self as world, query, World};

const LONG_TICK: Duration = Duration::from_secs(60);

fn started(config: SessionConfig) -> (World, Vec<Event>) {
    let mut world = World::new();
    let mut events = Vec::new();
    world::apply(&mut world, Command::ConfigureSession { config }, &mut events);
    (world, events)
}

fn run(world: &mut World, command: Command) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(world, command, &mut events);
    events
}

fn filled_row(row: i32, columns: std::ops::Range<i32>) -> Vec<SnapshotCell> {
    columns
        .map(|column| SnapshotCell {
            cell: CellCoord::new(column, row),
            block: SnapshotBlock::Piece(Ability::Normal),
        })
        .collect()
}

fn count(events: &[Event], predicate: impl Fn(&Event) -> bool) -> usize {
    events.iter().filter(|event| predicate(event)).count()
}

#[test]
fn session_start_places_anchor_and_spawns_first_piece() {
    let (world, events) = started(SessionConfig::default());

    assert_eq!(events.first(), Some(&Event::LevelPrepared { level: LevelId::One }));
    assert!(events.contains(&Event::CellChanged {
        cell: CellCoord::new(9, 0)
    }));
    assert_eq!(
        count(&events, |event| matches!(event, Event::PieceSpawned { .. })),
        1
    );
    assert!(query::occupancy_view(&world).is_occupied(CellCoord::new(9, 0)));
    assert_eq!(query::queue_len(&world), 4);
    assert_eq!(query::preview(&world).len(), 3);
    assert_eq!(query::play_mode(&world), PlayMode::Tetris);
}

#[test]
fn shifting_left_stops_at_column_zero() {
    let (mut world, _) = started(SessionConfig::default());
    let spawned = query::falling_piece(&world).expect("piece spawned");
    assert_eq!(spawned.origin.x(), 4);

    for _ in 0..4 {
        let events = run(&mut world, Command::ShiftPiece { shift: Shift::Left });
        assert_eq!(
            count(&events, |event| matches!(event, Event::PieceMoved { .. })),
            1
        );
    }
    assert_eq!(query::falling_piece(&world).map(|piece| piece.origin.x()), Some(0));

    let events = run(&mut world, Command::ShiftPiece { shift: Shift::Left });
    assert!(events.is_empty());
    assert_eq!(query::falling_piece(&world).map(|piece| piece.origin.x()), Some(0));
}

#[test]
fn reaching_checkpoint_row_switches_once_and_resets_counter() {
    let config = SessionConfig {
        first_checkpoint_row: 17,
        height_limit_row: 19,
        round_quota: 100,
        ..SessionConfig::default()
    };
    let (mut world, _) = started(config);
    let _ = run(
        &mut world,
        Command::RestoreGrid {
            cells: filled_row(16, 0..10),
        },
    );
    let _ = run(&mut world, Command::ShiftPiece { shift: Shift::Left });

    let events = run(&mut world, Command::Tick { dt: LONG_TICK });

    let locked = events
        .iter()
        .find_map(|event| match event {
            Event::PieceLocked { cells, .. } => Some(cells.clone()),
            _ => None,
        })
        .expect("piece locked");
    assert!(locked.iter().any(|cell| cell.y() == 17));
    assert!(locked.iter().any(|cell| cell.x() == 3));
    assert_eq!(
        count(&events, |event| *event
            == Event::PlayModeChanged {
                mode: PlayMode::Platformer
            }),
        1
    );
    assert_eq!(
        count(&events, |event| matches!(
            event,
            Event::RoundCompleted {
                trigger: SwitchTrigger::Checkpoint { row: 17 },
                ..
            }
        )),
        1
    );
    assert!(events.contains(&Event::CameraFollowEnabled));
    assert!(events.contains(&Event::PlayerActivationChanged { active: true }));
    assert_eq!(query::landed_this_round(&world), 0);
    assert_eq!(query::landed_blocks(&world), 4);
    assert_eq!(query::checkpoint_row(&world), 23);
    assert!(query::falling_piece(&world).is_none());

    let later = run(&mut world, Command::Tick { dt: LONG_TICK });
    assert_eq!(later, vec![Event::TimeAdvanced { dt: LONG_TICK }]);
}

#[test]
fn height_limit_ends_game_and_refuses_return() {
    let (mut world, _) = started(SessionConfig::default());
    let _ = run(
        &mut world,
        Command::RestoreGrid {
            cells: filled_row(17, 0..10),
        },
    );

    let events = run(&mut world, Command::Tick { dt: LONG_TICK });

    assert!(events.contains(&Event::RoundCompleted {
        round: 1,
        trigger: SwitchTrigger::HeightLimit,
    }));
    assert_eq!(
        events.last(),
        Some(&Event::GameOver {
            reason: GameOverReason::HeightLimit
        })
    );
    assert_eq!(query::game_over(&world), Some(GameOverReason::HeightLimit));

    let refused = run(
        &mut world,
        Command::SwitchToTetris {
            player_cell: CellCoord::new(5, 3),
        },
    );
    assert_eq!(
        refused,
        vec![Event::SwitchRefused {
            reason: SwitchRefusal::GameOver
        }]
    );
    assert_eq!(query::play_mode(&world), PlayMode::Platformer);
    assert!(query::falling_piece(&world).is_none());
}

#[test]
fn second_hold_in_same_round_is_rejected() {
    let (mut world, _) = started(SessionConfig::default());
    let first = query::falling_piece(&world).expect("piece spawned");
    let upcoming = query::preview(&world)[0];

    let events = run(&mut world, Command::HoldPiece);

    assert_eq!(events[0], Event::PieceHeld { held: first.definition });
    assert!(matches!(
        events[1],
        Event::PieceSpawned { definition, .. } if definition == upcoming
    ));
    assert_eq!(query::held_piece(&world), Some(first.definition));
    let active = query::falling_piece(&world).expect("replacement spawned");
    let preview = query::preview(&world);

    let events = run(&mut world, Command::HoldPiece);

    assert_eq!(events, vec![Event::HoldRejected]);
    assert_eq!(query::falling_piece(&world), Some(active));
    assert_eq!(query::preview(&world), preview);
    assert_eq!(query::held_piece(&world), Some(first.definition));
}

#[test]
fn return_to_stacking_places_protection_around_player() {
    let config = SessionConfig {
        round_quota: 1,
        ..SessionConfig::default()
    };
    let (mut world, _) = started(config);
    let events = run(&mut world, Command::Tick { dt: LONG_TICK });
    assert!(events.contains(&Event::RoundCompleted {
        round: 1,
        trigger: SwitchTrigger::Quota,
    }));
    assert_eq!(query::play_mode(&world), PlayMode::Platformer);

    let _ = run(
        &mut world,
        Command::RestoreGrid {
            cells: vec![SnapshotCell {
                cell: CellCoord::new(4, 3),
                block: SnapshotBlock::Piece(Ability::Sticky),
            }],
        },
    );

    let events = run(
        &mut world,
        Command::SwitchToTetris {
            player_cell: CellCoord::new(5, 3),
        },
    );

    let expected = vec![
        CellCoord::new(4, 4),
        CellCoord::new(5, 4),
        CellCoord::new(5, 3),
    ];
    assert!(events.contains(&Event::ProtectionPlaced {
        cells: expected.clone()
    }));
    assert_eq!(query::protection_cells(&world), expected);
    let occupancy = query::occupancy_view(&world);
    let untouched = occupancy
        .block_at(CellCoord::new(4, 3))
        .expect("locked cell kept");
    assert!(!untouched.is_protection());
    assert_eq!(query::play_mode(&world), PlayMode::Tetris);
    assert!(query::falling_piece(&world).is_some());
    assert_eq!(events.last(), Some(&Event::CameraFollowDisabled));
    assert!(events.contains(&Event::RoundTimerDisarmed));
}

#[test]
fn next_switch_removes_live_protection() {
    let config = SessionConfig {
        round_quota: 1,
        ..SessionConfig::default()
    };
    let (mut world, _) = started(config);
    let _ = run(&mut world, Command::Tick { dt: LONG_TICK });
    let _ = run(
        &mut world,
        Command::SwitchToTetris {
            player_cell: CellCoord::new(1, 10),
        },
    );
    let placed = query::protection_cells(&world);
    assert_eq!(placed.len(), 4);

    let events = run(&mut world, Command::Tick { dt: LONG_TICK });

    assert!(events.contains(&Event::ProtectionRemoved { cells: placed.clone() }));
    assert!(query::protection_cells(&world).is_empty());
    let occupancy = query::occupancy_view(&world);
    assert!(placed.iter().all(|cell| !occupancy.is_occupied(*cell)));
}

#[test]
fn protection_above_height_limit_does_not_end_the_game() {
    let config = SessionConfig {
        round_quota: 1,
        ..SessionConfig::default()
    };
    let (mut world, _) = started(config);
    let _ = run(&mut world, Command::Tick { dt: LONG_TICK });
    let _ = run(
        &mut world,
        Command::SwitchToTetris {
            player_cell: CellCoord::new(1, 17),
        },
    );
    assert!(query::protection_cells(&world).contains(&CellCoord::new(0, 18)));

    let events = run(&mut world, Command::Tick { dt: LONG_TICK });

    assert_eq!(query::game_over(&world), None);
    assert!(events.contains(&Event::RoundCompleted {
        round: 2,
        trigger: SwitchTrigger::Quota,
    }));
    assert_eq!(
        count(&events, |event| matches!(event, Event::GameOver { .. })),
        0
    );
}

#[test]
fn extreme_player_cell_places_no_protection() {
    let config = SessionConfig {
        round_quota: 1,
        ..SessionConfig::default()
    };
    let (mut world, _) = started(config);
    let _ = run(&mut world, Command::Tick { dt: LONG_TICK });

    let events = run(
        &mut world,
        Command::SwitchToTetris {
            player_cell: CellCoord::new(i32::MIN, i32::MAX),
        },
    );

    assert_eq!(
        count(&events, |event| matches!(event, Event::ProtectionPlaced { .. })),
        0
    );
    assert!(query::protection_cells(&world).is_empty());
    assert_eq!(query::play_mode(&world), PlayMode::Tetris);
    assert!(query::falling_piece(&world).is_some());
}

#[test]
fn restore_moves_the_falling_piece_back_without_respawning() {
    let (mut world, _) = started(SessionConfig::default());
    let before = query::falling_piece(&world).expect("piece spawned");
    let _ = run(&mut world, Command::ShiftPiece { shift: Shift::Left });

    let events = run(
        &mut world,
        Command::RestoreGrid {
            cells: filled_row(0, 0..5),
        },
    );

    assert_eq!(
        count(&events, |event| matches!(event, Event::PieceSpawned { .. })),
        0
    );
    assert_eq!(
        events.last(),
        Some(&Event::PieceMoved {
            piece: before.id,
            origin: before.origin,
            rotation: before.rotation,
        })
    );
    assert_eq!(query::falling_piece(&world), Some(before));
}

#[test]
fn blocked_spawn_is_reported_as_game_over() {
    let (mut world, _) = started(SessionConfig::default());
    let mut cells = filled_row(18, 0..10);
    cells.extend(filled_row(19, 0..10));

    let events = run(&mut world, Command::RestoreGrid { cells });

    assert_eq!(
        events.last(),
        Some(&Event::GameOver {
            reason: GameOverReason::SpawnBlocked
        })
    );
    assert!(query::falling_piece(&world).is_none());
    let after = run(&mut world, Command::HoldPiece);
    assert!(after.is_empty());
}

#[test]
fn restart_rebuilds_state_from_scratch() {
    let config = SessionConfig {
        round_quota: 1,
        ..SessionConfig::default()
    };
    let (mut world, initial) = started(config);
    let _ = run(&mut world, Command::Tick { dt: LONG_TICK });
    assert_eq!(query::rounds_completed(&world), 1);

    let events = run(&mut world, Command::Restart);

    assert_eq!(events, initial);
    assert_eq!(query::rounds_completed(&world), 0);
    assert_eq!(query::landed_blocks(&world), 0);
    assert_eq!(query::play_mode(&world), PlayMode::Tetris);
}

#[test]
fn reconfiguring_same_level_keeps_the_grid() {
    let (mut world, _) = started(SessionConfig::default());
    let _ = run(&mut world, Command::Tick { dt: LONG_TICK });
    let before = query::snapshot(&world);

    let events = run(
        &mut world,
        Command::ConfigureSession {
            config: SessionConfig {
                round_quota: 2,
                ..SessionConfig::default()
            },
        },
    );

    assert!(events.is_empty());
    assert_eq!(query::snapshot(&world), before);
    assert_eq!(query::config(&world).round_quota, 2);

    let events = run(
        &mut world,
        Command::ConfigureSession {
            config: SessionConfig {
                level: LevelId::Three,
                ..SessionConfig::default()
            },
        },
    );
    assert_eq!(events.first(), Some(&Event::LevelPrepared { level: LevelId::Three }));
    assert_eq!(query::occupancy_view(&world).dimensions(), (20, 30));
    assert_eq!(query::occupancy_view(&world).y_offset(), 10);
}

#[test]
fn invalid_configuration_is_ignored() {
    let mut world = World::new();
    let events = run(
        &mut world,
        Command::ConfigureSession {
            config: SessionConfig {
                lookahead: 0,
                ..SessionConfig::default()
            },
        },
    );
    assert!(events.is_empty());
    assert!(query::falling_piece(&world).is_none());
}

#[test]
fn level_three_accepts_snapshot_cells_below_zero() {
    let (mut world, _) = started(SessionConfig {
        level: LevelId::Three,
        ..SessionConfig::default()
    });
    let cells = vec![
        SnapshotCell {
            cell: CellCoord::new(15, -10),
            block: SnapshotBlock::Piece(Ability::Bouncy),
        },
        SnapshotCell {
            cell: CellCoord::new(2, -3),
            block: SnapshotBlock::Piece(Ability::Pass),
        },
    ];

    let _ = run(&mut world, Command::RestoreGrid { cells });

    let snapshot = query::snapshot(&world);
    assert_eq!(
        snapshot,
        vec![SnapshotCell {
            cell: CellCoord::new(15, -10),
            block: SnapshotBlock::Piece(Ability::Bouncy),
        }]
    );
}

#[test]
fn replay_is_deterministic() {
    fn replay() -> (Vec<Event>, Vec<SnapshotCell>) {
        let (mut world, mut log) = started(SessionConfig {
            round_quota: 3,
            seed: 42,
            ..SessionConfig::default()
        });
        let script = [
            Command::ShiftPiece { shift: Shift::Left },
            Command::RotatePiece,
            Command::Tick { dt: LONG_TICK },
            Command::ShiftPiece { shift: Shift::Right },
            Command::ShiftPiece { shift: Shift::Right },
            Command::SetSoftDrop { engaged: true },
            Command::Tick { dt: Duration::from_secs(3) },
            Command::HoldPiece,
            Command::Tick { dt: LONG_TICK },
            Command::Tick { dt: LONG_TICK },
        ];
        for command in script {
            log.extend(run(&mut world, command));
        }
        (log, query::snapshot(&world))
    }

    assert_eq!(replay(), replay());
}
