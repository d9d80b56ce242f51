//! Mob pool entries, path following and damage.

use iso_defence_core::{
    Event, MobId, MobKind, MobStatus, ModifierEffect, ModifierId, StatModifier, WaveDefinition,
    WaveIndex,
};
use tracing::{debug, warn};

use crate::{
    modifiers::{ModifierOutcome, ModifierSlots},
    path::Path,
};

#[derive(Clone, Debug)]
pub(crate) struct Mob {
    pub(crate) id: MobId,
    pub(crate) kind: MobKind,
    pub(crate) wave: WaveIndex,
    pub(crate) status: MobStatus,
    pub(crate) health: i32,
    pub(crate) max_health: i32,
    pub(crate) speed: f32,
    pub(crate) target_waypoint: usize,
    pub(crate) time_in_segment: f32,
    pending_damage: f32,
    pub(crate) modifiers: ModifierSlots,
}

impl Mob {
    /// Creates a mob waiting at the first waypoint for its wave to release it.
    pub(crate) fn reserved(id: MobId, wave: WaveIndex, definition: &WaveDefinition) -> Self {
        Self {
            id,
            kind: definition.mob,
            wave,
            status: MobStatus::WaitingSpawn,
            health: definition.max_health(),
            max_health: definition.max_health(),
            speed: definition.movement_speed(),
            target_waypoint: 1,
            time_in_segment: 0.0,
            pending_damage: 0.0,
            modifiers: ModifierSlots::default(),
        }
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.status == MobStatus::Alive
    }

    /// Removes health from an alive mob, killing it once health reaches zero.
    pub(crate) fn take_damage(&mut self, damage: i32, out_events: &mut Vec<Event>) {
        if !self.is_alive() || damage <= 0 {
            return;
        }
        self.health = self.health.saturating_sub(damage).max(0);
        out_events.push(Event::MobDamaged {
            mob: self.id,
            damage,
            health: self.health,
        });
        if self.health <= 0 {
            self.status = MobStatus::Dead;
            debug!(mob = self.id.get(), "mob died");
            out_events.push(Event::MobDied { mob: self.id });
        }
    }

    /// Attaches a modifier to an alive mob and reports the outcome.
    pub(crate) fn apply_modifier(&mut self, modifier: StatModifier, out_events: &mut Vec<Event>) {
        if !self.is_alive() {
            return;
        }
        let event = match self.modifiers.apply(modifier) {
            ModifierOutcome::Applied => Event::ModifierApplied {
                mob: self.id,
                modifier: modifier.id(),
            },
            ModifierOutcome::Refreshed => Event::ModifierRefreshed {
                mob: self.id,
                modifier: modifier.id(),
            },
            ModifierOutcome::Dropped => {
                warn!(
                    mob = self.id.get(),
                    modifier = modifier.id().get(),
                    "modifier slots exhausted, dropping modifier"
                );
                Event::ModifierDropped {
                    mob: self.id,
                    modifier: modifier.id(),
                }
            }
        };
        out_events.push(event);
    }

    /// Advances the mob by one frame: burn damage, modifier timers and path progress.
    ///
    /// The frame is split at every modifier expiry so that an effect only
    /// applies for the part of the frame it was still active.
    pub(crate) fn advance(
        &mut self,
        path: &Path,
        dt: f32,
        expired: &mut Vec<ModifierId>,
        out_events: &mut Vec<Event>,
    ) {
        if !self.is_alive() {
            return;
        }

        expired.clear();
        let mut left = dt;
        let mut path_dt = 0.0;
        let mut burned = 0.0;
        while left > 0.0 {
            let step = self
                .modifiers
                .next_expiry()
                .map_or(left, |expiry| expiry.clamp(0.0, left));
            let pace = self.modifiers.modified_value(ModifierEffect::Slow, 1.0).max(0.0);
            let health_rate = self.modifiers.modified_value(ModifierEffect::DamageOverTime, 0.0);
            path_dt += pace * step;
            if health_rate < 0.0 {
                burned += -health_rate * step;
            }
            self.modifiers.tick(step, expired);
            left -= step;
        }
        for modifier in expired.iter() {
            out_events.push(Event::ModifierExpired {
                mob: self.id,
                modifier: *modifier,
            });
        }

        if burned > 0.0 {
            self.pending_damage += burned;
            let whole = self.pending_damage.floor();
            if whole >= 1.0 {
                self.pending_damage -= whole;
                self.take_damage(whole as i32, out_events);
            }
            if !self.is_alive() {
                return;
            }
        }

        self.walk(path, path_dt, out_events);
    }

    fn walk(&mut self, path: &Path, dt: f32, out_events: &mut Vec<Event>) {
        let Some(duration) = path.segment_duration(self.target_waypoint, self.speed) else {
            return;
        };

        self.time_in_segment = (self.time_in_segment + dt).clamp(0.0, duration);
        if self.time_in_segment < duration {
            return;
        }

        if self.target_waypoint >= path.last_index() {
            self.status = MobStatus::Inactive;
            debug!(mob = self.id.get(), "mob reached the goal");
            out_events.push(Event::MobReachedGoal { mob: self.id });
        } else {
            self.target_waypoint += 1;
            self.time_in_segment = 0.0;
        }
    }
}
