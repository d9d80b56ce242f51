//! Per-mob stat modifier slots.

use iso_defence_core::{
    ModifierEffect, ModifierId, ModifierSnapshot, StatModifier, MODIFIER_SLOTS,
};

/// Result of attaching a modifier to a set of slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ModifierOutcome {
    /// The modifier took the first free slot.
    Applied,
    /// The modifier was already active and had its lifetime reset.
    Refreshed,
    /// Every slot was taken.
    Dropped,
}

#[derive(Clone, Copy, Debug)]
struct ModifierTimer {
    modifier: StatModifier,
    remaining: Option<f32>,
}

/// Fixed set of modifier timers carried by a mob.
#[derive(Clone, Debug, Default)]
pub(crate) struct ModifierSlots {
    slots: [Option<ModifierTimer>; MODIFIER_SLOTS],
}

impl ModifierSlots {
    /// Attaches `modifier`, refreshing an active instance with the same id instead of stacking.
    pub(crate) fn apply(&mut self, modifier: StatModifier) -> ModifierOutcome {
        let fresh = ModifierTimer {
            modifier,
            remaining: modifier.initial_remaining(),
        };

        if let Some(slot) = self
            .slots
            .iter_mut()
            .find(|slot| matches!(slot, Some(timer) if timer.modifier.id() == modifier.id()))
        {
            *slot = Some(fresh);
            return ModifierOutcome::Refreshed;
        }

        match self.slots.iter_mut().find(|slot| slot.is_none()) {
            Some(slot) => {
                *slot = Some(fresh);
                ModifierOutcome::Applied
            }
            None => ModifierOutcome::Dropped,
        }
    }

    /// Detaches the modifier with the given id, reporting whether it was active.
    pub(crate) fn remove(&mut self, id: ModifierId) -> bool {
        for slot in &mut self.slots {
            if matches!(slot, Some(timer) if timer.modifier.id() == id) {
                *slot = None;
                return true;
            }
        }
        false
    }

    /// Counts down temporary modifiers, collecting the ids of those that expired.
    pub(crate) fn tick(&mut self, dt: f32, expired: &mut Vec<ModifierId>) {
        for slot in &mut self.slots {
            let Some(timer) = slot else {
                continue;
            };
            let Some(remaining) = timer.remaining.as_mut() else {
                continue;
            };
            *remaining -= dt;
            if *remaining <= 0.0 {
                expired.push(timer.modifier.id());
                *slot = None;
            }
        }
    }

    /// Seconds until the first temporary modifier runs out, if any is active.
    pub(crate) fn next_expiry(&self) -> Option<f32> {
        self.slots
            .iter()
            .flatten()
            .filter_map(|timer| timer.remaining)
            .reduce(f32::min)
    }

    /// Folds every active modifier of `effect` over `base` in slot order.
    pub(crate) fn modified_value(&self, effect: ModifierEffect, base: f32) -> f32 {
        self.slots
            .iter()
            .flatten()
            .filter(|timer| timer.modifier.effect() == effect)
            .fold(base, |current, timer| timer.modifier.value().apply(current))
    }

    pub(crate) fn snapshots(&self) -> Vec<ModifierSnapshot> {
        self.slots
            .iter()
            .flatten()
            .map(|timer| ModifierSnapshot {
                modifier: timer.modifier,
                remaining: timer.remaining,
            })
            .collect()
    }
}
