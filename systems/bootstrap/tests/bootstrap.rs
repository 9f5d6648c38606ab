use stackrunner_core::{Command, Event, LevelId, SessionConfig, WELCOME_BANNER};
use stackrunner_system_bootstrap::Bootstrap;
use stackrunner_world::{self as world, World};

#[test]
fn level_seeds_are_stable_and_distinct() {
    let bootstrap = Bootstrap::new(7);
    let again = Bootstrap::new(7);

    for level in LevelId::ALL {
        assert_eq!(bootstrap.level_seed(level), again.level_seed(level));
    }
    assert_ne!(
        bootstrap.level_seed(LevelId::One),
        bootstrap.level_seed(LevelId::Two)
    );
    assert_ne!(
        bootstrap.level_seed(LevelId::One),
        Bootstrap::new(8).level_seed(LevelId::One)
    );
}

#[test]
fn start_level_configures_the_world() {
    let bootstrap = Bootstrap::new(99);
    let base = SessionConfig {
        round_quota: 5,
        ..SessionConfig::default()
    };
    let mut commands = Vec::new();
    bootstrap.start_level(LevelId::Two, &base, &mut commands);

    let config = match commands.as_slice() {
        [Command::ConfigureSession { config }] => config.clone(),
        other => panic!("unexpected commands: {other:?}"),
    };
    assert_eq!(config.level, LevelId::Two);
    assert_eq!(config.round_quota, 5);
    assert_eq!(config.seed, bootstrap.level_seed(LevelId::Two));

    let mut world = World::new();
    let mut events = Vec::new();
    for command in commands {
        world::apply(&mut world, command, &mut events);
    }
    assert_eq!(events.first(), Some(&Event::LevelPrepared { level: LevelId::Two }));
    assert_eq!(bootstrap.welcome_banner(&world), WELCOME_BANNER);
    assert_eq!(bootstrap.level_shape(&world).width(), 20);
}
