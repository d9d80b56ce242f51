//! Tunables of a scene that do not belong to the level data.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::SceneError;

/// Multiplier applied to the clamped frame delta.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameplaySpeed {
    /// Real time.
    #[default]
    Normal,
    /// Twice as fast as real time.
    Fast,
    /// Four times as fast as real time.
    Fastest,
}

impl GameplaySpeed {
    /// Factor by which simulated time outpaces real time.
    #[must_use]
    pub const fn multiplier(self) -> u32 {
        match self {
            Self::Normal => 1,
            Self::Fast => 2,
            Self::Fastest => 4,
        }
    }

    /// Next speed in the toggle cycle, wrapping back to normal.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Normal => Self::Fast,
            Self::Fast => Self::Fastest,
            Self::Fastest => Self::Normal,
        }
    }
}

/// Timing and projection parameters shared by every level.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SceneConfig {
    /// Seconds between two mobs of the same wave.
    pub spawn_cooldown: f32,
    /// Largest frame delta in seconds simulated by a single update.
    pub max_frame_delta: f32,
    /// Tile width in world units at reference zoom.
    pub tile_width: f32,
    /// Tile height in world units at reference zoom.
    pub tile_height: f32,
    /// Gameplay speed the scene starts with.
    pub speed: GameplaySpeed,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            spawn_cooldown: 0.4,
            max_frame_delta: 0.25,
            tile_width: 64.0,
            tile_height: 32.0,
            speed: GameplaySpeed::Normal,
        }
    }
}

impl SceneConfig {
    /// Parses a TOML document; omitted fields keep their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, SceneError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the simulation cannot run with.
    pub fn validate(&self) -> Result<(), SceneError> {
        let _ = self.spawn_cooldown_duration()?;
        let _ = self.max_frame_delta_duration()?;
        positive("tile_width", self.tile_width)?;
        positive("tile_height", self.tile_height)?;
        Ok(())
    }

    pub(crate) fn spawn_cooldown_duration(&self) -> Result<Duration, SceneError> {
        Duration::try_from_secs_f32(self.spawn_cooldown).map_err(|_| SceneError::InvalidConfig {
            field: "spawn_cooldown",
        })
    }

    pub(crate) fn max_frame_delta_duration(&self) -> Result<Duration, SceneError> {
        positive("max_frame_delta", self.max_frame_delta)?;
        Duration::try_from_secs_f32(self.max_frame_delta).map_err(|_| SceneError::InvalidConfig {
            field: "max_frame_delta",
        })
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), SceneError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SceneError::InvalidConfig { field })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_keeps_defaults() {
        let config = SceneConfig::from_toml_str("").expect("empty config is valid");
        assert_eq!(config, SceneConfig::default());
        assert_eq!(
            config.spawn_cooldown_duration().expect("valid"),
            Duration::from_secs_f32(0.4)
        );
    }

    #[test]
    fn partial_document_overrides_named_fields() {
        let config = SceneConfig::from_toml_str("spawn_cooldown = 1.5\nspeed = \"fastest\"\n")
            .expect("valid config");
        assert_eq!(config.spawn_cooldown, 1.5);
        assert_eq!(config.speed, GameplaySpeed::Fastest);
        assert_eq!(config.max_frame_delta, 0.25);
    }

    #[test]
    fn out_of_range_values_name_the_field() {
        let error = SceneConfig::from_toml_str("max_frame_delta = 0.0").unwrap_err();
        assert!(matches!(
            error,
            SceneError::InvalidConfig {
                field: "max_frame_delta"
            }
        ));
        let error = SceneConfig::from_toml_str("spawn_cooldown = -1.0").unwrap_err();
        assert!(matches!(
            error,
            SceneError::InvalidConfig {
                field: "spawn_cooldown"
            }
        ));
        let error = SceneConfig::from_toml_str("tile_height = nan").unwrap_err();
        assert!(matches!(
            error,
            SceneError::InvalidConfig {
                field: "tile_height"
            }
        ));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(matches!(
            SceneConfig::from_toml_str("spawn_rate = 2"),
            Err(SceneError::Config(_))
        ));
    }

    #[test]
    fn speed_cycle_wraps() {
        let mut speed = GameplaySpeed::Normal;
        let mut multipliers = Vec::new();
        for _ in 0..4 {
            multipliers.push(speed.multiplier());
            speed = speed.next();
        }
        assert_eq!(multipliers, vec![1, 2, 4, 1]);
    }
}
