use std::time::Duration;

use iso_defence_core::{
    Event, MobKind, MobStatus, SceneDefinition, TileCoord, TowerKind, WaveDefinition, WaveIndex,
    WaveStatus,
};
use iso_defence_scene::{Scene, SceneConfig};

fn straight_run(waves: Vec<WaveDefinition>) -> SceneDefinition {
    SceneDefinition {
        name: "Straight Run".to_owned(),
        columns: 12,
        rows: 12,
        waypoints: vec![TileCoord::new(0, 5), TileCoord::new(11, 5)],
        waves,
    }
}

fn load(waves: Vec<WaveDefinition>) -> Scene {
    Scene::load(straight_run(waves), SceneConfig::default()).expect("valid scene")
}

fn position(events: &[Event], predicate: impl Fn(&Event) -> bool) -> usize {
    events
        .iter()
        .position(predicate)
        .expect("expected event was raised")
}

#[test]
fn three_frames_release_a_three_mob_wave() {
    let mut scene = load(vec![WaveDefinition::new(0.0, MobKind::Red, 3)]);

    for _ in 0..3 {
        let _ = scene.update(Duration::from_millis(410));
    }

    let alive = scene.mobs().alive().count();
    assert_eq!(alive, 3);
    assert_eq!(scene.wave_status(WaveIndex::new(0)), Some(WaveStatus::Ended));
    assert_eq!(scene.stats().spawned, 3);
}

#[test]
fn first_frame_runs_systems_in_order() {
    let mut scene = load(vec![WaveDefinition::new(0.0, MobKind::Red, 1)]);
    let _ = scene
        .place_tower_of(TowerKind::Rapid, TileCoord::new(5, 3))
        .expect("tile is free");

    let events = scene.update(Duration::from_millis(16));

    let placed = position(&events, |event| matches!(event, Event::TowerPlaced { .. }));
    let time = position(&events, |event| matches!(event, Event::TimeAdvanced { .. }));
    let spawned = position(&events, |event| matches!(event, Event::MobSpawned { .. }));
    let targeted = position(&events, |event| {
        matches!(event, Event::TowerTargetChanged { .. })
    });
    let fired = position(&events, |event| matches!(event, Event::ProjectileFired { .. }));
    assert!(placed < time && time < spawned && spawned < targeted && targeted < fired);
}

fn play_to_the_end() -> (Scene, Vec<Event>) {
    let mut wave = WaveDefinition::new(0.5, MobKind::Red, 5);
    wave.max_health = Some(60);
    let mut scene = load(vec![wave, WaveDefinition::new(2.0, MobKind::Blue, 4)]);
    for (kind, tile) in [
        (TowerKind::Rapid, TileCoord::new(5, 3)),
        (TowerKind::Frost, TileCoord::new(3, 7)),
        (TowerKind::Cannon, TileCoord::new(8, 6)),
    ] {
        let _ = scene.place_tower_of(kind, tile).expect("tile is free");
    }

    let mut events = Vec::new();
    for _ in 0..3_000 {
        events.extend(scene.update(Duration::from_millis(16)));
        if scene.is_cleared() {
            break;
        }
    }
    (scene, events)
}

#[test]
fn defended_scene_runs_to_completion() {
    let (scene, events) = play_to_the_end();

    assert!(scene.is_cleared());
    let stats = scene.stats();
    assert_eq!(stats.spawned, 9);
    assert_eq!(stats.killed + stats.escaped, stats.spawned);
    assert!(stats.killed > 0, "towers should kill part of the waves");
    assert!(stats.shots_fired > 0);
    assert!(events
        .iter()
        .any(|event| matches!(event, Event::ProjectileLanded { .. })));

    for mob in scene.mobs().iter() {
        assert!(matches!(mob.status, MobStatus::Dead | MobStatus::Inactive));
        assert_eq!(mob.status == MobStatus::Dead, mob.health <= 0);
    }
}

#[test]
fn identical_inputs_replay_identically() {
    let (first_scene, first) = play_to_the_end();
    let (second_scene, second) = play_to_the_end();
    assert_eq!(first, second);
    assert_eq!(first_scene.stats(), second_scene.stats());
}
