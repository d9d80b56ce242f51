//! Running counters derived from the event stream of a scene.

use iso_defence_core::Event;

/// Totals accumulated since the scene was last loaded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SceneStats {
    /// Mobs that entered the path.
    pub spawned: u32,
    /// Mobs killed by damage.
    pub killed: u32,
    /// Mobs that walked the whole path.
    pub escaped: u32,
    /// Projectiles launched by towers.
    pub shots_fired: u32,
    /// Shots lost to a full projectile pool.
    pub shots_dropped: u32,
}

impl SceneStats {
    pub(crate) fn record(&mut self, events: &[Event]) {
        for event in events {
            let counter = match event {
                Event::MobSpawned { .. } => &mut self.spawned,
                Event::MobDied { .. } => &mut self.killed,
                Event::MobReachedGoal { .. } => &mut self.escaped,
                Event::ProjectileFired { .. } => &mut self.shots_fired,
                Event::ProjectileDropped { .. } => &mut self.shots_dropped,
                _ => continue,
            };
            *counter = counter.saturating_add(1);
        }
    }
}
