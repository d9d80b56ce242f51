//! Stat modifier definitions shared by towers and the world.

/// Identifier shared by every application of the same modifier definition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModifierId(u32);

impl ModifierId {
    /// Creates a new modifier identifier.
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

/// Stat a modifier acts upon.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ModifierEffect {
    /// Scales the time a mob accrues on its path each frame.
    Slow,
    /// Health delta applied per second.
    DamageOverTime,
}

/// How long a modifier stays attached once applied.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ModifierDuration {
    /// Never expires on its own.
    Permanent,
    /// Expires after the given number of seconds.
    Temporary {
        /// Lifetime of the modifier.
        seconds: f32,
    },
}

/// Magnitude of a modifier and the way it combines with the current value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ModifierValue {
    /// Adds the value.
    Flat(f32),
    /// Adds `value / 100` of the current value.
    Percent(f32),
    /// Multiplies the current value.
    Multiplier(f32),
}

impl ModifierValue {
    /// Applies the magnitude to `current`.
    #[must_use]
    pub fn apply(self, current: f32) -> f32 {
        match self {
            Self::Flat(value) => current + value,
            Self::Percent(value) => current + value / 100.0 * current,
            Self::Multiplier(value) => current * value,
        }
    }
}

/// Immutable modifier definition attached to mobs on hit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StatModifier {
    id: ModifierId,
    effect: ModifierEffect,
    duration: ModifierDuration,
    value: ModifierValue,
}

impl StatModifier {
    /// Creates a new modifier definition.
    #[must_use]
    pub const fn new(
        id: ModifierId,
        effect: ModifierEffect,
        duration: ModifierDuration,
        value: ModifierValue,
    ) -> Self {
        Self {
            id,
            effect,
            duration,
            value,
        }
    }

    /// Identifier used to detect reapplication.
    #[must_use]
    pub const fn id(&self) -> ModifierId {
        self.id
    }

    /// Stat the modifier acts upon.
    #[must_use]
    pub const fn effect(&self) -> ModifierEffect {
        self.effect
    }

    /// Lifetime of the modifier.
    #[must_use]
    pub const fn duration(&self) -> ModifierDuration {
        self.duration
    }

    /// Magnitude of the modifier.
    #[must_use]
    pub const fn value(&self) -> ModifierValue {
        self.value
    }

    /// Remaining lifetime of a fresh application, `None` when permanent.
    #[must_use]
    pub const fn initial_remaining(&self) -> Option<f32> {
        match self.duration {
            ModifierDuration::Permanent => None,
            ModifierDuration::Temporary { seconds } => Some(seconds),
        }
    }
}

/// Halves the path time a mob accrues for one second.
pub const SLOW: StatModifier = StatModifier::new(
    ModifierId::new(1),
    ModifierEffect::Slow,
    ModifierDuration::Temporary { seconds: 1.0 },
    ModifierValue::Percent(-50.0),
);

/// Burns one health point per second for seven seconds.
pub const BURN: StatModifier = StatModifier::new(
    ModifierId::new(2),
    ModifierEffect::DamageOverTime,
    ModifierDuration::Temporary { seconds: 7.0 },
    ModifierValue::Flat(-1.0),
);

/// Modifier attached to a mob together with its remaining lifetime.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ModifierSnapshot {
    /// Definition of the attached modifier.
    pub modifier: StatModifier,
    /// Seconds left before expiry, `None` when permanent.
    pub remaining: Option<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_scales_relative_to_current_value() {
        assert_eq!(ModifierValue::Percent(-50.0).apply(0.2), 0.1);
        assert_eq!(ModifierValue::Percent(100.0).apply(3.0), 6.0);
    }

    #[test]
    fn flat_and_multiplier_ignore_percent_semantics() {
        assert_eq!(ModifierValue::Flat(-1.0).apply(0.0), -1.0);
        assert_eq!(ModifierValue::Multiplier(0.5).apply(4.0), 2.0);
    }

    #[test]
    fn permanent_modifiers_have_no_remaining_time() {
        let permanent = StatModifier::new(
            ModifierId::new(9),
            ModifierEffect::Slow,
            ModifierDuration::Permanent,
            ModifierValue::Multiplier(0.9),
        );
        assert_eq!(permanent.initial_remaining(), None);
        assert_eq!(SLOW.initial_remaining(), Some(1.0));
    }
}
