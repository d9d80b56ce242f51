#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Iso Defence.
//!
//! The world owns every pool of a scene (mobs, towers, projectiles and the
//! modifier slots of each mob). It is only ever mutated through [`apply`] and
//! only ever read through the functions in [`query`].

mod mobs;
mod modifiers;
mod path;
mod projectiles;
mod towers;

use iso_defence_core::{
    Command, Event, IsoProjection, MobId, MobSnapshot, MobStatus, ModifierId, PlacementError,
    SceneDefinition, TileProjection, TowerSnapshot, ViewTransform, WaveDefinition, WaveIndex,
    MAX_MOBS,
};
use tracing::{debug, info, warn};

use crate::{
    mobs::Mob,
    path::Path,
    projectiles::{Frame, ProjectilePool},
    towers::TowerPool,
};

/// Represents the authoritative Iso Defence world state.
#[derive(Debug)]
pub struct World {
    projection: IsoProjection,
    transform: ViewTransform,
    tick_index: u64,
    name: String,
    columns: u32,
    rows: u32,
    path: Path,
    waves: Vec<WaveDefinition>,
    activated: Vec<bool>,
    mobs: Vec<Mob>,
    towers: TowerPool,
    projectiles: ProjectilePool,
    expired: Vec<ModifierId>,
}

impl World {
    /// Creates an empty world using the reference isometric projection.
    #[must_use]
    pub fn new() -> Self {
        Self::with_projection(IsoProjection::default())
    }

    /// Creates an empty world that projects tiles with the provided metrics.
    #[must_use]
    pub fn with_projection(projection: IsoProjection) -> Self {
        Self {
            projection,
            transform: ViewTransform::default(),
            tick_index: 0,
            name: String::new(),
            columns: 0,
            rows: 0,
            path: Path::default(),
            waves: Vec::new(),
            activated: Vec::new(),
            mobs: Vec::with_capacity(MAX_MOBS),
            towers: TowerPool::default(),
            projectiles: ProjectilePool::default(),
            expired: Vec::new(),
        }
    }

    fn load(&mut self, scene: SceneDefinition) {
        self.tick_index = 0;
        self.name = scene.name;
        self.columns = scene.columns;
        self.rows = scene.rows;
        self.path = Path::new(scene.waypoints);
        self.activated = vec![false; scene.waves.len()];
        self.waves = scene.waves;
        self.mobs.clear();
        self.towers = TowerPool::default();
        self.projectiles = ProjectilePool::default();
    }

    fn frame(&self) -> Frame<'_> {
        Frame {
            path: &self.path,
            projection: &self.projection,
            transform: &self.transform,
        }
    }

    fn is_mob_alive(&self, mob: MobId) -> bool {
        self.mobs.get(mob.index()).is_some_and(Mob::is_alive)
    }

    fn activate_wave(&mut self, wave: WaveIndex, out_events: &mut Vec<Event>) {
        let index = wave.index();
        let Some(definition) = self.waves.get(index) else {
            warn!(wave = wave.get(), "ignoring activation of unknown wave");
            return;
        };
        if self.activated.get(index).copied().unwrap_or(true) {
            return;
        }
        if !self.path.is_walkable() {
            warn!(wave = wave.get(), "scene path has no segment, wave not activated");
            return;
        }

        let requested = definition.mob_count as usize;
        let available = MAX_MOBS.saturating_sub(self.mobs.len());
        if requested > available {
            warn!(
                wave = wave.get(),
                requested,
                available,
                "mob pool exhausted, dropping excess mobs"
            );
        }
        let reserved = requested.min(available);
        for _ in 0..reserved {
            let id = MobId::new(self.mobs.len() as u32);
            self.mobs.push(Mob::reserved(id, wave, definition));
        }
        if let Some(flag) = self.activated.get_mut(index) {
            *flag = true;
        }

        info!(wave = wave.get(), mobs = reserved, "wave activated");
        out_events.push(Event::WaveActivated {
            wave,
            mobs: reserved as u32,
        });
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
        Command::LoadScene { scene } => {
            let waves = scene.waves.len();
            info!(scene = %scene.name, waves, "loading scene");
            world.load(scene);
            out_events.push(Event::SceneLoaded {
                name: world.name.clone(),
                waves,
            });
        }
        Command::Tick { dt, transform } => {
            world.tick_index = world.tick_index.saturating_add(1);
            world.transform = transform;
            out_events.push(Event::TimeAdvanced { dt });
        }
        Command::SetTransform { transform } => world.transform = transform,
        Command::ActivateWave { wave } => world.activate_wave(wave, out_events),
        Command::SpawnMob { wave } => {
            let Some(mob) = world
                .mobs
                .iter_mut()
                .find(|mob| mob.wave == wave && mob.status == MobStatus::WaitingSpawn)
            else {
                return;
            };
            mob.status = MobStatus::Alive;
            debug!(mob = mob.id.get(), wave = wave.get(), "mob spawned");
            out_events.push(Event::MobSpawned {
                mob: mob.id,
                wave,
                kind: mob.kind,
            });
        }
        Command::AdvanceMobs { dt } => {
            let dt = dt.as_secs_f32();
            let World {
                mobs,
                path,
                expired,
                ..
            } = world;
            for mob in mobs.iter_mut() {
                mob.advance(path, dt, expired, out_events);
            }
        }
        Command::AssignTarget { tower, target } => {
            if target.is_some_and(|mob| !world.is_mob_alive(mob)) {
                return;
            }
            let Some(entry) = world.towers.get_mut(tower) else {
                return;
            };
            if entry.target != target {
                entry.target = target;
                out_events.push(Event::TowerTargetChanged { tower, target });
            }
        }
        Command::ChargeTowers { dt } => {
            let dt = dt.as_secs_f32();
            let mobs = &world.mobs;
            for tower in world.towers.iter_mut() {
                let tracking = tower
                    .target
                    .and_then(|mob| mobs.get(mob.index()))
                    .is_some_and(Mob::is_alive);
                if tracking {
                    tower.time_since_last_shot += dt;
                }
            }
        }
        Command::FireProjectile { tower, target } => {
            let alive = world.is_mob_alive(target);
            let Some(entry) = world.towers.get_mut(tower) else {
                return;
            };
            let interval = entry.kind.stats().seconds_per_shot();
            if !alive || entry.target != Some(target) || entry.time_since_last_shot < interval {
                return;
            }
            entry.time_since_last_shot -= interval;
            let (kind, tile) = (entry.kind, entry.tile);
            world.projectiles.fire(tower, kind, tile, target, out_events);
        }
        Command::AdvanceProjectiles { dt } => {
            let World {
                projectiles,
                mobs,
                path,
                projection,
                transform,
                ..
            } = world;
            let frame = Frame {
                path: &*path,
                projection: &*projection,
                transform: &*transform,
            };
            projectiles.advance(mobs, &frame, dt.as_secs_f32(), out_events);
        }
        Command::PlaceTower { kind, tile } => {
            let result = if !world.projection.is_valid_tile(world.columns, world.rows, tile) {
                Err(PlacementError::OutOfBounds)
            } else if world.path.contains_tile(tile) {
                Err(PlacementError::OnPath)
            } else {
                world.towers.place(kind, tile)
            };

            match result {
                Ok(tower) => {
                    info!(tower = tower.get(), ?kind, ?tile, "tower placed");
                    out_events.push(Event::TowerPlaced { tower, kind, tile });
                }
                Err(reason) => {
                    if reason == PlacementError::PoolExhausted {
                        warn!(?kind, ?tile, "tower pool exhausted, dropping placement");
                    } else {
                        debug!(?kind, ?tile, ?reason, "tower placement rejected");
                    }
                    out_events.push(Event::TowerPlacementRejected { kind, tile, reason });
                }
            }
        }
        Command::RemoveTower { tile } => {
            if let Some(tower) = world.towers.remove(tile) {
                info!(tower = tower.id.get(), ?tile, "tower removed");
                out_events.push(Event::TowerRemoved {
                    tower: tower.id,
                    tile,
                });
            }
        }
        Command::ApplyModifier { mob, modifier } => {
            if let Some(entry) = world.mobs.get_mut(mob.index()) {
                entry.apply_modifier(modifier, out_events);
            }
        }
        Command::RemoveModifier { mob, modifier } => {
            let removed = world
                .mobs
                .get_mut(mob.index())
                .is_some_and(|entry| entry.modifiers.remove(modifier));
            if removed {
                out_events.push(Event::ModifierRemoved { mob, modifier });
            }
        }
    }
}

fn mob_snapshot(world: &World, mob: &Mob) -> MobSnapshot {
    MobSnapshot {
        id: mob.id,
        kind: mob.kind,
        wave: mob.wave,
        status: mob.status,
        health: mob.health,
        max_health: mob.max_health,
        position: world.frame().mob_position(mob),
        target_waypoint: mob.target_waypoint,
        time_in_segment: mob.time_in_segment,
        percent_traveled: world
            .path
            .percent_traveled(mob.target_waypoint, mob.time_in_segment, mob.speed)
            .unwrap_or(0.0),
    }
}

fn tower_snapshot(world: &World, tower: &towers::Tower) -> TowerSnapshot {
    TowerSnapshot {
        id: tower.id,
        kind: tower.kind,
        tile: tower.tile,
        center: world.frame().tile_center(tower.tile),
        target: tower.target,
        time_since_last_shot: tower.time_since_last_shot,
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use glam::Vec2;
    use iso_defence_core::{
        IsoProjection, MobId, MobView, ModifierEffect, ModifierSnapshot, ProjectileSnapshot,
        ProjectileView, TileCoord, TileProjection, TowerSnapshot, TowerView, ViewTransform,
        WaveIndex,
    };

    use super::{mob_snapshot, tower_snapshot, World};

    /// Display name of the loaded scene.
    #[must_use]
    pub fn scene_name(world: &World) -> &str {
        &world.name
    }

    /// Number of columns and rows of the loaded grid.
    #[must_use]
    pub fn grid_dimensions(world: &World) -> (u32, u32) {
        (world.columns, world.rows)
    }

    /// Ordered waypoints of the loaded path.
    #[must_use]
    pub fn waypoints(world: &World) -> &[TileCoord] {
        world.path.waypoints()
    }

    /// Number of waves declared by the loaded scene.
    #[must_use]
    pub fn wave_count(world: &World) -> usize {
        world.waves.len()
    }

    /// Reports whether the mobs of a wave were reserved in the pool.
    #[must_use]
    pub fn is_wave_activated(world: &World, wave: WaveIndex) -> bool {
        world.activated.get(wave.index()).copied().unwrap_or(false)
    }

    /// Pan and zoom recorded by the latest tick.
    #[must_use]
    pub fn transform(world: &World) -> ViewTransform {
        world.transform
    }

    /// Projection used to place tiles in world space.
    #[must_use]
    pub fn projection(world: &World) -> &IsoProjection {
        &world.projection
    }

    /// Number of ticks processed since the scene was loaded.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Reports whether the tile belongs to the mob path.
    #[must_use]
    pub fn is_path_tile(world: &World, tile: TileCoord) -> bool {
        world.path.contains_tile(tile)
    }

    /// Grid tile under a world-space point, if the point lies on the grid.
    #[must_use]
    pub fn tile_at(world: &World, point: Vec2) -> Option<TileCoord> {
        let tile = world.projection.world_to_tile(&world.transform, point);
        world
            .projection
            .is_valid_tile(world.columns, world.rows, tile)
            .then_some(tile)
    }

    /// World-space center of a tile under the current transform.
    #[must_use]
    pub fn tile_center(world: &World, tile: TileCoord) -> Vec2 {
        world.frame().tile_center(tile)
    }

    /// Number of mob slots reserved by activated waves.
    #[must_use]
    pub fn mob_count(world: &World) -> usize {
        world.mobs.len()
    }

    /// Reports whether the mob walks the path and can be targeted.
    #[must_use]
    pub fn is_mob_alive(world: &World, mob: MobId) -> bool {
        world.is_mob_alive(mob)
    }

    /// World-space position of a mob under the current transform.
    #[must_use]
    pub fn mob_position(world: &World, mob: MobId) -> Option<Vec2> {
        world
            .mobs
            .get(mob.index())
            .map(|entry| world.frame().mob_position(entry))
    }

    /// Share of the whole path a mob walked, from 0 to 100.
    #[must_use]
    pub fn mob_percent_traveled(world: &World, mob: MobId) -> Option<f32> {
        let entry = world.mobs.get(mob.index())?;
        world
            .path
            .percent_traveled(entry.target_waypoint, entry.time_in_segment, entry.speed)
    }

    /// Captures a read-only view of every mob slot.
    #[must_use]
    pub fn mob_view(world: &World) -> MobView {
        MobView::from_snapshots(
            world
                .mobs
                .iter()
                .map(|mob| mob_snapshot(world, mob))
                .collect(),
        )
    }

    /// Folds the mob's active modifiers of `effect` over `base`.
    #[must_use]
    pub fn modified_value(
        world: &World,
        mob: MobId,
        effect: ModifierEffect,
        base: f32,
    ) -> Option<f32> {
        world
            .mobs
            .get(mob.index())
            .map(|entry| entry.modifiers.modified_value(effect, base))
    }

    /// Modifiers attached to a mob in slot order.
    #[must_use]
    pub fn active_modifiers(world: &World, mob: MobId) -> Vec<ModifierSnapshot> {
        world
            .mobs
            .get(mob.index())
            .map(|entry| entry.modifiers.snapshots())
            .unwrap_or_default()
    }

    /// Captures a read-only view of every placed tower.
    #[must_use]
    pub fn tower_view(world: &World) -> TowerView {
        TowerView::from_snapshots(
            world
                .towers
                .iter()
                .map(|tower| tower_snapshot(world, tower))
                .collect(),
        )
    }

    /// Tower standing on the tile, if any.
    #[must_use]
    pub fn tower_at(world: &World, tile: TileCoord) -> Option<TowerSnapshot> {
        world
            .towers
            .at(tile)
            .map(|tower| tower_snapshot(world, tower))
    }

    /// Number of placed towers.
    #[must_use]
    pub fn tower_count(world: &World) -> usize {
        world.towers.iter().count()
    }

    /// Captures a read-only view of every projectile in flight.
    #[must_use]
    pub fn projectile_view(world: &World) -> ProjectileView {
        let frame = world.frame();
        ProjectileView::from_snapshots(
            world
                .projectiles
                .iter()
                .map(|projectile| {
                    let origin = frame.tile_center(projectile.origin);
                    let target = world
                        .mobs
                        .get(projectile.target.index())
                        .map_or(origin, |mob| frame.mob_position(mob));
                    ProjectileSnapshot {
                        id: projectile.id,
                        tower_kind: projectile.tower_kind,
                        origin: projectile.origin,
                        target: projectile.target,
                        position: origin.lerp(target, projectile.progress),
                        progress: projectile.progress,
                    }
                })
                .collect(),
        )
    }
}
