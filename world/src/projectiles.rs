//! Projectile pool and hit resolution.

use glam::Vec2;
use iso_defence_core::{
    Event, IsoProjection, MobId, ProjectileId, TargetType, TileCoord, TileProjection, TowerId,
    TowerKind, ViewTransform, MAX_PROJECTILES,
};
use tracing::{debug, warn};

use crate::{mobs::Mob, path::Path};

#[derive(Clone, Copy, Debug)]
pub(crate) struct Projectile {
    pub(crate) id: ProjectileId,
    pub(crate) tower_kind: TowerKind,
    pub(crate) origin: TileCoord,
    pub(crate) target: MobId,
    pub(crate) progress: f32,
}

/// Fixed pool of projectile slots.
#[derive(Debug)]
pub(crate) struct ProjectilePool {
    slots: Vec<Option<Projectile>>,
}

impl Default for ProjectilePool {
    fn default() -> Self {
        Self {
            slots: vec![None; MAX_PROJECTILES],
        }
    }
}

/// Read-only state required to locate mobs and towers in world space.
pub(crate) struct Frame<'a> {
    pub(crate) path: &'a Path,
    pub(crate) projection: &'a IsoProjection,
    pub(crate) transform: &'a ViewTransform,
}

impl Frame<'_> {
    pub(crate) fn mob_position(&self, mob: &Mob) -> Vec2 {
        self.path
            .point_at(
                mob.target_waypoint,
                mob.time_in_segment,
                mob.speed,
                self.projection,
                self.transform,
            )
            .or_else(|| {
                self.path
                    .waypoints()
                    .first()
                    .map(|tile| self.projection.tile_center(self.transform, *tile))
            })
            .unwrap_or(Vec2::ZERO)
    }

    pub(crate) fn tile_center(&self, tile: TileCoord) -> Vec2 {
        self.projection.tile_center(self.transform, tile)
    }
}

impl ProjectilePool {
    /// Launches a projectile from the tower on `origin` toward `target`.
    pub(crate) fn fire(
        &mut self,
        tower: TowerId,
        tower_kind: TowerKind,
        origin: TileCoord,
        target: MobId,
        out_events: &mut Vec<Event>,
    ) {
        let Some((index, slot)) = self
            .slots
            .iter_mut()
            .enumerate()
            .find(|(_, slot)| slot.is_none())
        else {
            warn!(
                tower = tower.get(),
                target = target.get(),
                "projectile pool exhausted, dropping shot"
            );
            out_events.push(Event::ProjectileDropped { tower, target });
            return;
        };

        let id = ProjectileId::new(index as u32);
        *slot = Some(Projectile {
            id,
            tower_kind,
            origin,
            target,
            progress: 0.0,
        });
        debug!(
            projectile = id.get(),
            tower = tower.get(),
            target = target.get(),
            "projectile fired"
        );
        out_events.push(Event::ProjectileFired {
            projectile: id,
            tower,
            target,
        });
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Projectile> {
        self.slots.iter().flatten()
    }

    /// Moves every projectile toward its target's current position and resolves landings.
    pub(crate) fn advance(
        &mut self,
        mobs: &mut [Mob],
        frame: &Frame<'_>,
        dt: f32,
        out_events: &mut Vec<Event>,
    ) {
        let zoom = frame.transform.zoom_factor();
        for slot in &mut self.slots {
            let Some(projectile) = slot.as_mut() else {
                continue;
            };
            let Some(target) = mobs.get(projectile.target.index()) else {
                *slot = None;
                continue;
            };

            let stats = projectile.tower_kind.stats();
            let origin = frame.tile_center(projectile.origin);
            let distance = origin.distance(frame.mob_position(target));
            let step = if distance <= f32::EPSILON {
                1.0
            } else {
                stats.projectile_speed * zoom * dt / distance
            };
            projectile.progress = (projectile.progress + step).clamp(0.0, 1.0);

            if projectile.progress >= 1.0 {
                let landed = *projectile;
                *slot = None;
                resolve_hit(&landed, mobs, frame, out_events);
            }
        }
    }
}

/// Damages the target of a landed projectile and, for area shots, every alive mob near the impact.
fn resolve_hit(
    projectile: &Projectile,
    mobs: &mut [Mob],
    frame: &Frame<'_>,
    out_events: &mut Vec<Event>,
) {
    let stats = projectile.tower_kind.stats();
    let Some(target) = mobs.get_mut(projectile.target.index()) else {
        return;
    };
    let impact = frame.mob_position(target);

    target.take_damage(stats.damage, out_events);
    if let Some(modifier) = stats.on_hit {
        target.apply_modifier(modifier, out_events);
    }

    let mut splashed = 0;
    if stats.target_type == TargetType::Area && stats.aoe_radius > 0.0 {
        let radius = stats.aoe_radius * frame.transform.zoom_factor();
        let radius_squared = radius * radius;
        for other in mobs.iter_mut() {
            if other.id == projectile.target || !other.is_alive() {
                continue;
            }
            if frame.mob_position(other).distance_squared(impact) > radius_squared {
                continue;
            }
            other.take_damage(stats.damage, out_events);
            if let Some(modifier) = stats.on_hit {
                other.apply_modifier(modifier, out_events);
            }
            splashed += 1;
        }
    }

    debug!(
        projectile = projectile.id.get(),
        target = projectile.target.get(),
        splashed,
        "projectile landed"
    );
    out_events.push(Event::ProjectileLanded {
        projectile: projectile.id,
        target: projectile.target,
        splashed,
    });
}
