#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Scene orchestration for Iso Defence.
//!
//! A [`Scene`] owns the authoritative world of one level together with the
//! pure systems that drive it, and fixes the order in which they run every
//! frame: waves, then mob movement, then targeting and fire control, then
//! projectiles. Damage dealt during a frame is therefore only visible to
//! targeting on the following frame.

mod config;
mod stats;

use std::time::Duration;

use glam::Vec2;
use iso_defence_core::{
    Command, Event, IsoProjection, LevelError, MobId, MobView, PlacementError, ProjectileView,
    SceneDefinition, TileCoord, TowerId, TowerKind, TowerSnapshot, TowerView,
    ViewTransform, WaveIndex, WaveStatus,
};
use iso_defence_system_spawning::{Config as SpawnerConfig, WaveSpawner};
use iso_defence_system_tower_combat::TowerCombat;
use iso_defence_system_tower_targeting::TowerTargeting;
use iso_defence_world::{self as world, query, World};
use thiserror::Error;
use tracing::{debug, info};

pub use config::{GameplaySpeed, SceneConfig};
pub use stats::SceneStats;

/// Errors raised while preparing a scene.
#[derive(Debug, Error)]
pub enum SceneError {
    /// The level data failed validation.
    #[error("invalid scene definition: {0}")]
    Level(#[from] LevelError),
    /// The configuration document is not valid TOML for [`SceneConfig`].
    #[error("failed to parse scene configuration: {0}")]
    Config(#[from] toml::de::Error),
    /// A configuration value is outside of the range the simulation accepts.
    #[error("configuration field `{field}` is out of range")]
    InvalidConfig {
        /// Name of the offending field.
        field: &'static str,
    },
}

/// One playable level: world state, systems and input-layer surface.
#[derive(Debug)]
pub struct Scene {
    definition: SceneDefinition,
    config: SceneConfig,
    max_frame_delta: Duration,
    spawn_cooldown: Duration,
    world: World,
    spawner: WaveSpawner,
    targeting: TowerTargeting,
    combat: TowerCombat,
    transform: ViewTransform,
    speed: GameplaySpeed,
    selected: TowerKind,
    stats: SceneStats,
    pending: Vec<Event>,
    commands: Vec<Command>,
}

impl Scene {
    /// Validates the level and configuration and loads the level into a fresh world.
    pub fn load(definition: SceneDefinition, config: SceneConfig) -> Result<Self, SceneError> {
        definition.validate()?;
        config.validate()?;
        let spawn_cooldown = config.spawn_cooldown_duration()?;
        let max_frame_delta = config.max_frame_delta_duration()?;
        let projection = IsoProjection::new(config.tile_width, config.tile_height);

        let mut scene = Self {
            spawner: WaveSpawner::new(SpawnerConfig::new(spawn_cooldown), &definition.waves),
            definition,
            config,
            max_frame_delta,
            spawn_cooldown,
            world: World::with_projection(projection),
            targeting: TowerTargeting::new(),
            combat: TowerCombat::new(),
            transform: ViewTransform::default(),
            speed: config.speed,
            selected: TowerKind::Rapid,
            stats: SceneStats::default(),
            pending: Vec::new(),
            commands: Vec::new(),
        };
        scene.load_world();
        Ok(scene)
    }

    /// Restarts the level, resetting every pool and timer wholesale.
    ///
    /// The view transform, gameplay speed and selected tower kind survive.
    pub fn reload(&mut self) {
        self.spawner = WaveSpawner::new(
            SpawnerConfig::new(self.spawn_cooldown),
            &self.definition.waves,
        );
        self.stats = SceneStats::default();
        self.pending.clear();
        self.load_world();
    }

    fn load_world(&mut self) {
        info!(scene = %self.definition.name, "starting scene");
        let scene = self.definition.clone();
        execute(
            &mut self.world,
            &mut self.stats,
            Command::LoadScene { scene },
            &mut self.pending,
        );
    }

    /// Advances the simulation by one frame and returns every event it raised.
    ///
    /// Events caused by input calls since the previous frame come first.
    pub fn update(&mut self, dt: Duration) -> Vec<Event> {
        let dt = dt.min(self.max_frame_delta) * self.speed.multiplier();
        let mut events = std::mem::take(&mut self.pending);
        let Self {
            world,
            spawner,
            targeting,
            combat,
            stats,
            commands,
            transform,
            ..
        } = self;

        let frame_start = events.len();
        execute(
            world,
            stats,
            Command::Tick {
                dt,
                transform: *transform,
            },
            &mut events,
        );

        spawner.handle(&events[frame_start..], commands);
        flush(world, stats, commands, &mut events);

        execute(world, stats, Command::AdvanceMobs { dt }, &mut events);

        targeting.handle(
            &query::tower_view(world),
            &query::mob_view(world),
            transform.zoom_factor(),
            commands,
        );
        flush(world, stats, commands, &mut events);

        execute(world, stats, Command::ChargeTowers { dt }, &mut events);

        combat.handle(&query::tower_view(world), commands);
        flush(world, stats, commands, &mut events);

        execute(world, stats, Command::AdvanceProjectiles { dt }, &mut events);

        events
    }

    /// Activates the next wave immediately, skipping its remaining start delay.
    pub fn start_next_wave(&mut self) -> Option<WaveIndex> {
        let wave = self.spawner.start_next_wave(&mut self.commands)?;
        debug!(wave = wave.get(), "wave started on request");
        flush(
            &mut self.world,
            &mut self.stats,
            &mut self.commands,
            &mut self.pending,
        );
        Some(wave)
    }

    /// Places a tower of the selected kind on `tile`.
    pub fn place_tower(&mut self, tile: TileCoord) -> Result<TowerId, PlacementError> {
        self.place_tower_of(self.selected, tile)
    }

    /// Places a tower of `kind` on `tile`.
    ///
    /// Fails when the tile is outside the grid, on the path, already occupied,
    /// or when every tower slot is taken.
    pub fn place_tower_of(
        &mut self,
        kind: TowerKind,
        tile: TileCoord,
    ) -> Result<TowerId, PlacementError> {
        let start = self.pending.len();
        execute(
            &mut self.world,
            &mut self.stats,
            Command::PlaceTower { kind, tile },
            &mut self.pending,
        );
        for event in &self.pending[start..] {
            match event {
                Event::TowerPlaced { tower, .. } => return Ok(*tower),
                Event::TowerPlacementRejected { reason, .. } => return Err(*reason),
                _ => {}
            }
        }
        Err(PlacementError::OutOfBounds)
    }

    /// Removes the tower standing on `tile`, returning its identifier.
    pub fn remove_tower(&mut self, tile: TileCoord) -> Option<TowerId> {
        let start = self.pending.len();
        execute(
            &mut self.world,
            &mut self.stats,
            Command::RemoveTower { tile },
            &mut self.pending,
        );
        self.pending[start..].iter().find_map(|event| match event {
            Event::TowerRemoved { tower, .. } => Some(*tower),
            _ => None,
        })
    }

    /// Chooses the tower kind used by [`Scene::place_tower`].
    pub fn select_tower_kind(&mut self, kind: TowerKind) {
        self.selected = kind;
    }

    /// Switches to the next tower kind and returns it.
    pub fn cycle_tower_kind(&mut self) -> TowerKind {
        self.selected = self.selected.next();
        self.selected
    }

    /// Tower kind used by [`Scene::place_tower`].
    #[must_use]
    pub fn selected_tower_kind(&self) -> TowerKind {
        self.selected
    }

    /// Sets the pan and zoom; position queries reflect it immediately.
    pub fn set_transform(&mut self, transform: ViewTransform) {
        self.transform = transform;
        execute(
            &mut self.world,
            &mut self.stats,
            Command::SetTransform { transform },
            &mut self.pending,
        );
    }

    /// Pan and zoom of the scene.
    #[must_use]
    pub fn transform(&self) -> ViewTransform {
        self.transform
    }

    /// Changes how fast simulated time runs.
    pub fn set_speed(&mut self, speed: GameplaySpeed) {
        self.speed = speed;
    }

    /// Current gameplay speed.
    #[must_use]
    pub fn speed(&self) -> GameplaySpeed {
        self.speed
    }

    /// Grid tile under a world-space point, using the latest transform.
    #[must_use]
    pub fn tile_at(&self, point: Vec2) -> Option<TileCoord> {
        query::tile_at(&self.world, point)
    }

    /// Level data the scene was loaded from.
    #[must_use]
    pub fn definition(&self) -> &SceneDefinition {
        &self.definition
    }

    /// Configuration the scene was loaded with.
    #[must_use]
    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Read access to the underlying world for [`iso_defence_world::query`].
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Reports whether the mob walks the path.
    #[must_use]
    pub fn is_mob_alive(&self, mob: MobId) -> bool {
        query::is_mob_alive(&self.world, mob)
    }

    /// World-space position of the mob.
    #[must_use]
    pub fn mob_position(&self, mob: MobId) -> Option<Vec2> {
        query::mob_position(&self.world, mob)
    }

    /// Share of the whole path the mob walked, from 0 to 100.
    #[must_use]
    pub fn mob_percent_traveled(&self, mob: MobId) -> Option<f32> {
        query::mob_percent_traveled(&self.world, mob)
    }

    /// Number of mob slots reserved by activated waves.
    #[must_use]
    pub fn mob_count(&self) -> usize {
        query::mob_count(&self.world)
    }

    /// Reports whether the tile belongs to the mob path.
    #[must_use]
    pub fn is_path_tile(&self, tile: TileCoord) -> bool {
        query::is_path_tile(&self.world, tile)
    }

    /// Spawn progress of the wave, if it exists.
    #[must_use]
    pub fn wave_status(&self, wave: WaveIndex) -> Option<WaveStatus> {
        self.spawner.status(wave)
    }

    /// Seconds left before the wave activates on its own.
    #[must_use]
    pub fn time_until_wave(&self, wave: WaveIndex) -> Option<Duration> {
        self.spawner.time_until_start(wave)
    }

    /// Snapshot of every mob slot.
    #[must_use]
    pub fn mobs(&self) -> MobView {
        query::mob_view(&self.world)
    }

    /// Snapshot of every placed tower.
    #[must_use]
    pub fn towers(&self) -> TowerView {
        query::tower_view(&self.world)
    }

    /// Snapshot of every projectile in flight.
    #[must_use]
    pub fn projectiles(&self) -> ProjectileView {
        query::projectile_view(&self.world)
    }

    /// Tower standing on the tile, if any.
    #[must_use]
    pub fn tower_at(&self, tile: TileCoord) -> Option<TowerSnapshot> {
        query::tower_at(&self.world, tile)
    }

    /// Counters accumulated since the last load.
    #[must_use]
    pub fn stats(&self) -> SceneStats {
        self.stats
    }

    /// Reports whether every wave released its mobs and none of them is left on the path.
    #[must_use]
    pub fn is_cleared(&self) -> bool {
        self.spawner.is_finished() && self.mobs().alive().next().is_none()
    }
}

fn execute(world: &mut World, stats: &mut SceneStats, command: Command, out: &mut Vec<Event>) {
    let start = out.len();
    world::apply(world, command, out);
    stats.record(&out[start..]);
}

fn flush(
    world: &mut World,
    stats: &mut SceneStats,
    commands: &mut Vec<Command>,
    out: &mut Vec<Event>,
) {
    for command in commands.drain(..) {
        execute(world, stats, command, out);
    }
}
