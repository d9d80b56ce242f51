#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Iso Defence simulation.
//!
//! This crate defines the message surface that connects the scene
//! orchestrator, the authoritative world, and pure systems. The orchestrator
//! submits [`Command`] values describing desired mutations, the world executes
//! those commands via its `apply` entry point, and then broadcasts [`Event`]
//! values. Systems read immutable views of the world and respond exclusively
//! with new command batches.

use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};

mod grid;
pub mod level;
mod modifier;

pub use grid::{point_in_ellipse, IsoProjection, TileProjection, ViewTransform, REFERENCE_SCALE};
pub use level::{LevelError, SceneDefinition, WaveDefinition};
pub use modifier::{
    ModifierDuration, ModifierEffect, ModifierId, ModifierSnapshot, ModifierValue, StatModifier,
    BURN, SLOW,
};

/// Maximum number of mobs a single scene may spawn across all of its waves.
pub const MAX_MOBS: usize = 1024;
/// Maximum number of waves a scene may declare.
pub const MAX_WAVES: usize = 10;
/// Maximum number of waypoints a scene path may declare.
pub const MAX_WAYPOINTS: usize = 10;
/// Number of tower slots available in a scene.
pub const MAX_TOWERS: usize = 20;
/// Number of projectile slots available in a scene.
pub const MAX_PROJECTILES: usize = 1024;
/// Number of stat-modifier slots carried by every mob.
pub const MODIFIER_SLOTS: usize = 4;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Replaces the active scene, resetting every pool wholesale.
    LoadScene {
        /// Validated level description to install.
        scene: SceneDefinition,
    },
    /// Opens a new frame, recording the view transform used by the frame's commands.
    Tick {
        /// Duration of simulated time covered by the frame.
        dt: Duration,
        /// Pan/zoom transform in effect for the frame.
        transform: ViewTransform,
    },
    /// Replaces the view transform between frames, so queries see it at once.
    SetTransform {
        /// Pan/zoom transform in effect from now on.
        transform: ViewTransform,
    },
    /// Reserves the mobs of a wave in the pool, ready to be spawned.
    ActivateWave {
        /// Wave being activated.
        wave: WaveIndex,
    },
    /// Releases the next waiting mob of a wave onto the path.
    SpawnMob {
        /// Wave whose next waiting mob should spawn.
        wave: WaveIndex,
    },
    /// Advances every alive mob along the path and ticks its modifiers.
    AdvanceMobs {
        /// Duration of simulated time to advance.
        dt: Duration,
    },
    /// Replaces the target tracked by a tower.
    AssignTarget {
        /// Tower whose target changes.
        tower: TowerId,
        /// New target, or `None` to clear it.
        target: Option<MobId>,
    },
    /// Accumulates shot time on every tower holding a live target.
    ChargeTowers {
        /// Duration of simulated time to accumulate.
        dt: Duration,
    },
    /// Requests that a tower shoots a projectile at its target.
    FireProjectile {
        /// Tower that fires.
        tower: TowerId,
        /// Mob the projectile homes in on.
        target: MobId,
    },
    /// Moves every projectile toward its target and resolves landed hits.
    AdvanceProjectiles {
        /// Duration of simulated time to advance.
        dt: Duration,
    },
    /// Requests placement of a tower on a tile.
    PlaceTower {
        /// Type of tower to construct.
        kind: TowerKind,
        /// Tile the tower should occupy.
        tile: TileCoord,
    },
    /// Requests removal of the tower standing on a tile.
    RemoveTower {
        /// Tile whose tower should be removed.
        tile: TileCoord,
    },
    /// Attaches a stat modifier to a mob, refreshing it if already active.
    ApplyModifier {
        /// Mob receiving the modifier.
        mob: MobId,
        /// Modifier definition to attach.
        modifier: StatModifier,
    },
    /// Detaches an active stat modifier from a mob.
    RemoveModifier {
        /// Mob carrying the modifier.
        mob: MobId,
        /// Identifier of the modifier to detach.
        modifier: ModifierId,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Confirms that a scene replaced the previous one.
    SceneLoaded {
        /// Display name of the scene.
        name: String,
        /// Number of waves the scene declares.
        waves: usize,
    },
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the frame.
        dt: Duration,
    },
    /// Confirms that the mobs of a wave were reserved in the pool.
    WaveActivated {
        /// Wave that became active.
        wave: WaveIndex,
        /// Number of mobs reserved for the wave.
        mobs: u32,
    },
    /// Confirms that a waiting mob entered the path.
    MobSpawned {
        /// Identifier of the spawned mob.
        mob: MobId,
        /// Wave that owns the mob.
        wave: WaveIndex,
        /// Type of the spawned mob.
        kind: MobKind,
    },
    /// Reports damage dealt to a mob.
    MobDamaged {
        /// Mob that took damage.
        mob: MobId,
        /// Amount of health removed.
        damage: i32,
        /// Health remaining after the damage.
        health: i32,
    },
    /// Reports that a mob's health reached zero.
    MobDied {
        /// Mob that died.
        mob: MobId,
    },
    /// Reports that a mob completed the final path segment and left the scene.
    MobReachedGoal {
        /// Mob that reached the goal.
        mob: MobId,
    },
    /// Confirms that a modifier occupied a free slot on a mob.
    ModifierApplied {
        /// Mob carrying the modifier.
        mob: MobId,
        /// Modifier that was attached.
        modifier: ModifierId,
    },
    /// Confirms that an already active modifier had its duration reset.
    ModifierRefreshed {
        /// Mob carrying the modifier.
        mob: MobId,
        /// Modifier that was refreshed.
        modifier: ModifierId,
    },
    /// Reports that a temporary modifier ran out of time.
    ModifierExpired {
        /// Mob that carried the modifier.
        mob: MobId,
        /// Modifier that expired.
        modifier: ModifierId,
    },
    /// Confirms that a modifier was detached on request.
    ModifierRemoved {
        /// Mob that carried the modifier.
        mob: MobId,
        /// Modifier that was detached.
        modifier: ModifierId,
    },
    /// Reports that a modifier could not be attached because every slot was taken.
    ModifierDropped {
        /// Mob whose slots were full.
        mob: MobId,
        /// Modifier that was discarded.
        modifier: ModifierId,
    },
    /// Confirms that a tower was placed into the world.
    TowerPlaced {
        /// Identifier assigned to the tower.
        tower: TowerId,
        /// Type of tower that was placed.
        kind: TowerKind,
        /// Tile occupied by the tower.
        tile: TileCoord,
    },
    /// Reports that a tower placement request was rejected.
    TowerPlacementRejected {
        /// Type of tower requested for placement.
        kind: TowerKind,
        /// Tile provided in the placement request.
        tile: TileCoord,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Confirms that a tower was removed from the world.
    TowerRemoved {
        /// Identifier of the tower that was removed.
        tower: TowerId,
        /// Tile previously occupied by the tower.
        tile: TileCoord,
    },
    /// Reports that a tower switched targets.
    TowerTargetChanged {
        /// Tower whose target changed.
        tower: TowerId,
        /// New target, if any.
        target: Option<MobId>,
    },
    /// Confirms that a tower shot a projectile.
    ProjectileFired {
        /// Identifier of the new projectile.
        projectile: ProjectileId,
        /// Tower that fired.
        tower: TowerId,
        /// Mob the projectile homes in on.
        target: MobId,
    },
    /// Reports that a shot was discarded because every projectile slot was taken.
    ProjectileDropped {
        /// Tower that attempted to fire.
        tower: TowerId,
        /// Mob the shot was aimed at.
        target: MobId,
    },
    /// Reports that a projectile reached its target and resolved its damage.
    ProjectileLanded {
        /// Projectile that landed.
        projectile: ProjectileId,
        /// Mob the projectile homed in on.
        target: MobId,
        /// Number of additional mobs caught in the area of effect.
        splashed: u32,
    },
}

/// Unique identifier assigned to a mob: its slot in the scene's mob pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MobId(u32);

impl MobId {
    /// Creates a new mob identifier with the provided slot value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Slot index addressed by the identifier.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Unique identifier assigned to a tower: its slot in the tower pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TowerId(u32);

impl TowerId {
    /// Creates a new tower identifier with the provided slot value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Slot index addressed by the identifier.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Unique identifier assigned to a projectile: its slot in the projectile pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProjectileId(u32);

impl ProjectileId {
    /// Creates a new projectile identifier with the provided slot value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Position of a wave within the scene's wave list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WaveIndex(u32);

impl WaveIndex {
    /// Creates a new wave index.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the index.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Position addressed by the index.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Location of a single tile expressed as column and row coordinates.
///
/// Coordinates are signed because projecting an arbitrary world point back
/// onto the grid can land outside of it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    column: i32,
    row: i32,
}

impl TileCoord {
    /// Creates a new tile coordinate.
    #[must_use]
    pub const fn new(column: i32, row: i32) -> Self {
        Self { column, row }
    }

    /// Column index of the tile.
    #[must_use]
    pub const fn column(&self) -> i32 {
        self.column
    }

    /// Row index of the tile.
    #[must_use]
    pub const fn row(&self) -> i32 {
        self.row
    }
}

/// Opaque RGB color used to tint mobs, towers and projectiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    red: u8,
    green: u8,
    blue: u8,
}

impl Color {
    /// Creates a new color from byte RGB components.
    #[must_use]
    pub const fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Red component of the color.
    #[must_use]
    pub const fn red(&self) -> u8 {
        self.red
    }

    /// Green component of the color.
    #[must_use]
    pub const fn green(&self) -> u8 {
        self.green
    }

    /// Blue component of the color.
    #[must_use]
    pub const fn blue(&self) -> u8 {
        self.blue
    }
}

/// Types of mobs a wave can send down the path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MobKind {
    /// Slow, sturdy mob.
    Red,
    /// Fast, fragile mob.
    Blue,
}

impl MobKind {
    /// Resolves the numeric type used by the scene text format.
    #[must_use]
    pub const fn from_index(index: i64) -> Option<Self> {
        match index {
            0 => Some(Self::Red),
            1 => Some(Self::Blue),
            _ => None,
        }
    }

    /// Health a freshly spawned mob starts with.
    #[must_use]
    pub const fn max_health(self) -> i32 {
        match self {
            Self::Red => 100,
            Self::Blue => 30,
        }
    }

    /// Movement speed expressed in tiles per second.
    #[must_use]
    pub const fn movement_speed(self) -> f32 {
        match self {
            Self::Red => 1.0,
            Self::Blue => 2.0,
        }
    }

    /// Color used when presenting the mob.
    #[must_use]
    pub const fn color(self) -> Color {
        match self {
            Self::Red => Color::from_rgb(230, 41, 55),
            Self::Blue => Color::from_rgb(0, 121, 241),
        }
    }
}

/// Lifecycle of a mob slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MobStatus {
    /// Slot is unused, or its mob reached the goal.
    Inactive,
    /// Mob is reserved by an active wave and waits for its spawn turn.
    WaitingSpawn,
    /// Mob walks the path and can be targeted.
    Alive,
    /// Mob health reached zero.
    Dead,
}

/// Lifecycle of a wave.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WaveStatus {
    /// Wave is waiting for its start delay or an explicit start.
    NotStarted,
    /// Wave is spawning its mobs.
    Started,
    /// Wave spawned every mob it was configured with.
    Ended,
}

/// Whether a projectile damages only its target or everything around the impact.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TargetType {
    /// Only the targeted mob takes damage.
    Single,
    /// Every alive mob within the area-of-effect radius takes damage.
    Area,
}

/// Types of towers that can be placed on the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TowerKind {
    /// Fast single-target tower whose needles set mobs on fire.
    Rapid,
    /// Area tower whose shards slow mobs down.
    Frost,
    /// Slow area tower with heavy shells.
    Cannon,
}

impl TowerKind {
    /// Every tower kind in selection order.
    pub const ALL: [TowerKind; 3] = [Self::Rapid, Self::Frost, Self::Cannon];

    /// Kind that follows this one when cycling the selection.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Rapid => Self::Frost,
            Self::Frost => Self::Cannon,
            Self::Cannon => Self::Rapid,
        }
    }

    /// Static combat parameters of the tower kind.
    ///
    /// Ranges, area radii and projectile speeds are expressed in world units
    /// at the reference zoom level and scale with the view transform.
    #[must_use]
    pub const fn stats(self) -> TowerStats {
        match self {
            Self::Rapid => TowerStats {
                rate_of_fire: 8.0,
                range: 320.0,
                damage: 6,
                aoe_radius: 0.0,
                projectile_speed: 800.0,
                projectile_width: 4.0,
                projectile_color: Color::from_rgb(253, 249, 0),
                target_type: TargetType::Single,
                on_hit: Some(BURN),
                color: Color::from_rgb(255, 255, 255),
            },
            Self::Frost => TowerStats {
                rate_of_fire: 1.2,
                range: 240.0,
                damage: 8,
                aoe_radius: 40.0,
                projectile_speed: 500.0,
                projectile_width: 10.0,
                projectile_color: Color::from_rgb(102, 191, 255),
                target_type: TargetType::Area,
                on_hit: Some(SLOW),
                color: Color::from_rgb(0, 121, 241),
            },
            Self::Cannon => TowerStats {
                rate_of_fire: 0.8,
                range: 280.0,
                damage: 18,
                aoe_radius: 60.0,
                projectile_speed: 300.0,
                projectile_width: 16.0,
                projectile_color: Color::from_rgb(0, 82, 172),
                target_type: TargetType::Area,
                on_hit: None,
                color: Color::from_rgb(112, 31, 126),
            },
        }
    }
}

/// Combat parameters shared by every tower of a kind.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerStats {
    /// Shots per second.
    pub rate_of_fire: f32,
    /// Horizontal radius of the targeting ellipse.
    pub range: f32,
    /// Health removed by each projectile.
    pub damage: i32,
    /// Radius of the area of effect around the impact point.
    pub aoe_radius: f32,
    /// Projectile travel speed.
    pub projectile_speed: f32,
    /// Visual radius of the projectile.
    pub projectile_width: f32,
    /// Visual color of the projectile.
    pub projectile_color: Color,
    /// Whether projectiles hit a single mob or an area.
    pub target_type: TargetType,
    /// Modifier attached to every mob a projectile damages.
    pub on_hit: Option<StatModifier>,
    /// Visual color of the tower.
    pub color: Color,
}

impl TowerStats {
    /// Interval that must elapse between two consecutive shots.
    #[must_use]
    pub fn seconds_per_shot(&self) -> f32 {
        1.0 / self.rate_of_fire
    }
}

/// Reasons a tower placement request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlacementError {
    /// The requested tile lies outside of the grid.
    OutOfBounds,
    /// The requested tile is part of the mob path.
    OnPath,
    /// Another tower already stands on the tile.
    Occupied,
    /// Every tower slot is in use.
    PoolExhausted,
}

/// Immutable representation of a single mob's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MobSnapshot {
    /// Slot identifier of the mob.
    pub id: MobId,
    /// Type of the mob.
    pub kind: MobKind,
    /// Wave that owns the mob.
    pub wave: WaveIndex,
    /// Lifecycle status of the mob.
    pub status: MobStatus,
    /// Current health.
    pub health: i32,
    /// Health the mob spawned with.
    pub max_health: i32,
    /// World-space position derived from path progress.
    pub position: Vec2,
    /// Index of the waypoint the mob walks toward.
    pub target_waypoint: usize,
    /// Seconds spent on the current path segment.
    pub time_in_segment: f32,
    /// Share of the whole path already walked, from 0 to 100.
    pub percent_traveled: f32,
}

impl MobSnapshot {
    /// Reports whether the mob walks the path and can be targeted.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.status == MobStatus::Alive
    }
}

/// Read-only snapshot describing every mob slot of the scene.
#[derive(Clone, Debug, Default)]
pub struct MobView {
    snapshots: Vec<MobSnapshot>,
}

impl MobView {
    /// Creates a new mob view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<MobSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured mob snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &MobSnapshot> {
        self.snapshots.iter()
    }

    /// Iterator over the mobs that can currently be targeted.
    pub fn alive(&self) -> impl Iterator<Item = &MobSnapshot> {
        self.snapshots.iter().filter(|snapshot| snapshot.is_alive())
    }

    /// Looks up the snapshot captured for a mob.
    #[must_use]
    pub fn get(&self, mob: MobId) -> Option<&MobSnapshot> {
        self.snapshots
            .binary_search_by_key(&mob, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Number of captured snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<MobSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single tower's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerSnapshot {
    /// Slot identifier of the tower.
    pub id: TowerId,
    /// Type of the tower.
    pub kind: TowerKind,
    /// Tile occupied by the tower.
    pub tile: TileCoord,
    /// World-space center of the tower's tile under the frame's transform.
    pub center: Vec2,
    /// Mob currently tracked by the tower.
    pub target: Option<MobId>,
    /// Seconds accumulated toward the next shot.
    pub time_since_last_shot: f32,
}

impl TowerSnapshot {
    /// Reports whether enough time accumulated for the tower to shoot.
    #[must_use]
    pub fn ready_to_fire(&self) -> bool {
        self.time_since_last_shot >= self.kind.stats().seconds_per_shot()
    }
}

/// Read-only snapshot describing all towers placed on the grid.
#[derive(Clone, Debug, Default)]
pub struct TowerView {
    snapshots: Vec<TowerSnapshot>,
}

impl TowerView {
    /// Creates a new tower view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TowerSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured tower snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &TowerSnapshot> {
        self.snapshots.iter()
    }

    /// Number of captured snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<TowerSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a projectile in flight.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectileSnapshot {
    /// Slot identifier of the projectile.
    pub id: ProjectileId,
    /// Kind of tower that fired the projectile.
    pub tower_kind: TowerKind,
    /// Tile of the tower that fired the projectile.
    pub origin: TileCoord,
    /// Mob the projectile homes in on.
    pub target: MobId,
    /// Current world-space position.
    pub position: Vec2,
    /// Travel progress from 0 (origin) to 1 (impact).
    pub progress: f32,
}

/// Read-only snapshot describing every projectile in flight.
#[derive(Clone, Debug, Default)]
pub struct ProjectileView {
    snapshots: Vec<ProjectileSnapshot>,
}

impl ProjectileView {
    /// Creates a new projectile view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<ProjectileSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured projectile snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &ProjectileSnapshot> {
        self.snapshots.iter()
    }

    /// Number of projectiles in flight.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether no projectile is in flight.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}
