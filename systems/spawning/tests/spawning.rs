use std::time::Duration;

use iso_defence_core::{
    Command, Event, MobKind, MobStatus, SceneDefinition, TileCoord, WaveDefinition, WaveIndex,
    WaveStatus,
};
use iso_defence_system_spawning::{Config, WaveSpawner};
use iso_defence_world::{self as world, query, World};
use proptest::prelude::*;

fn scene(waves: Vec<WaveDefinition>) -> SceneDefinition {
    SceneDefinition {
        name: "Spawn Field".to_owned(),
        columns: 16,
        rows: 16,
        waypoints: vec![TileCoord::new(0, 8), TileCoord::new(15, 8)],
        waves,
    }
}

/// Runs one frame: tick the world, let the spawner react, apply its commands.
fn frame(world: &mut World, spawner: &mut WaveSpawner, dt: Duration) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(
        world,
        Command::Tick {
            dt,
            transform: query::transform(world),
        },
        &mut events,
    );

    let mut commands = Vec::new();
    spawner.handle(&events, &mut commands);
    commands.push(Command::AdvanceMobs { dt });
    for command in commands {
        world::apply(world, command, &mut events);
    }
    events
}

/// Drives the spawner alone over the given frame lengths and counts releases per wave.
fn releases(waves: &[WaveDefinition], cooldown_ms: u64, frames: &[u64]) -> Vec<u32> {
    let mut spawner = WaveSpawner::new(Config::new(Duration::from_millis(cooldown_ms)), waves);
    let mut commands = Vec::new();
    for millis in frames {
        spawner.handle(
            &[Event::TimeAdvanced {
                dt: Duration::from_millis(*millis),
            }],
            &mut commands,
        );
    }

    let mut counts = vec![0; waves.len()];
    for command in commands {
        if let Command::SpawnMob { wave } = command {
            counts[wave.index()] += 1;
        }
    }
    counts
}

#[test]
fn fine_and_coarse_frames_release_the_same_mobs() {
    let waves = [WaveDefinition::new(0.1, MobKind::Red, 3)];

    let fine = releases(&waves, 400, &[50; 12]);
    let coarse = releases(&waves, 400, &[300, 300]);

    assert_eq!(fine, vec![2]);
    assert_eq!(coarse, fine);
}

#[test]
fn queued_wave_starts_when_the_blocking_wave_does() {
    let waves = [
        WaveDefinition::new(1.0, MobKind::Red, 1),
        WaveDefinition::new(0.2, MobKind::Blue, 4),
    ];

    let coarse = releases(&waves, 400, &[1_900]);
    let fine = releases(&waves, 400, &[10; 190]);

    assert_eq!(coarse, vec![1, 3], "second wave runs for 0.9 s after the first starts");
    assert_eq!(fine, coarse);
}

#[test]
fn three_mobs_spawn_across_three_frames() {
    let waves = vec![WaveDefinition::new(0.0, MobKind::Red, 3)];
    let mut world = World::new();
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::LoadScene {
            scene: scene(waves.clone()),
        },
        &mut events,
    );
    let mut spawner = WaveSpawner::new(Config::new(Duration::from_millis(400)), &waves);

    let mut spawned = 0;
    for _ in 0..3 {
        let events = frame(&mut world, &mut spawner, Duration::from_millis(410));
        spawned += events
            .iter()
            .filter(|event| matches!(event, Event::MobSpawned { .. }))
            .count();
    }

    assert_eq!(spawned, 3);
    let mobs = query::mob_view(&world).into_vec();
    assert_eq!(mobs.len(), 3);
    assert!(mobs.iter().all(|mob| mob.status == MobStatus::Alive));
    assert!(mobs.iter().all(|mob| mob.status != MobStatus::Inactive));
    assert_eq!(spawner.status(WaveIndex::new(0)), Some(WaveStatus::Ended));
}

#[test]
fn surplus_time_releases_several_mobs_in_one_frame() {
    let waves = vec![WaveDefinition::new(0.0, MobKind::Blue, 5)];
    let mut spawner = WaveSpawner::new(Config::new(Duration::from_millis(400)), &waves);
    let mut commands = Vec::new();

    spawner.handle(
        &[Event::TimeAdvanced {
            dt: Duration::from_millis(16),
        }],
        &mut commands,
    );
    commands.clear();
    spawner.handle(
        &[Event::TimeAdvanced {
            dt: Duration::from_millis(1_250),
        }],
        &mut commands,
    );

    let spawns = commands
        .iter()
        .filter(|command| matches!(command, Command::SpawnMob { .. }))
        .count();
    assert_eq!(spawns, 3, "1.25 s covers three cooldowns");
    assert_eq!(spawner.remaining(WaveIndex::new(0)), Some(1));
}

#[test]
fn delayed_wave_activates_once_its_timer_runs_out() {
    let waves = vec![WaveDefinition::new(1.0, MobKind::Red, 2)];
    let mut world = World::new();
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::LoadScene {
            scene: scene(waves.clone()),
        },
        &mut events,
    );
    let mut spawner = WaveSpawner::new(Config::new(Duration::from_millis(400)), &waves);

    let events = frame(&mut world, &mut spawner, Duration::from_millis(600));
    assert!(events.iter().all(|event| !matches!(event, Event::WaveActivated { .. })));
    assert_eq!(query::mob_count(&world), 0);

    let events = frame(&mut world, &mut spawner, Duration::from_millis(600));
    assert!(events.contains(&Event::WaveActivated {
        wave: WaveIndex::new(0),
        mobs: 2,
    }));
    assert_eq!(query::mob_count(&world), 2);
}

proptest! {
    #[test]
    fn releases_do_not_depend_on_frame_splits(
        counts in prop::collection::vec(0u32..8, 1..4),
        delays in prop::collection::vec(0u64..2_000, 4),
        frames in prop::collection::vec(1u64..500, 1..40),
        cooldown in 0u64..600,
    ) {
        let waves: Vec<_> = counts
            .iter()
            .zip(&delays)
            .map(|(count, delay)| WaveDefinition::new(*delay as f32 / 1_000.0, MobKind::Blue, *count))
            .collect();
        let total: u64 = frames.iter().sum();

        prop_assert_eq!(releases(&waves, cooldown, &frames), releases(&waves, cooldown, &[total]));
    }

    #[test]
    fn waves_never_spawn_more_than_declared(
        counts in prop::collection::vec(0u32..12, 1..5),
        delays in prop::collection::vec(0.0f32..3.0, 5),
        frames in prop::collection::vec(1u64..900, 1..60),
        cooldown in 0u64..700,
    ) {
        let waves: Vec<_> = counts
            .iter()
            .zip(&delays)
            .map(|(count, delay)| WaveDefinition::new(*delay, MobKind::Red, *count))
            .collect();
        let mut world = World::new();
        let mut events = Vec::new();
        world::apply(&mut world, Command::LoadScene { scene: scene(waves.clone()) }, &mut events);
        let mut spawner = WaveSpawner::new(Config::new(Duration::from_millis(cooldown)), &waves);

        let mut spawned = vec![0u32; waves.len()];
        for millis in frames {
            for event in frame(&mut world, &mut spawner, Duration::from_millis(millis)) {
                if let Event::MobSpawned { wave, .. } = event {
                    spawned[wave.index()] += 1;
                }
            }
        }

        for (index, wave) in waves.iter().enumerate() {
            prop_assert!(spawned[index] <= wave.mob_count);
            let id = WaveIndex::new(index as u32);
            prop_assert_eq!(spawner.spawned(id), Some(spawned[index]));
            if spawner.status(id) == Some(WaveStatus::Ended) {
                prop_assert_eq!(spawned[index], wave.mob_count);
            }
        }
    }
}
