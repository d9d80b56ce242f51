//! Scene definitions and the loaders that produce them.
//!
//! Scenes are authored either in a compact line-oriented text format or in
//! TOML. Both loaders produce a [`SceneDefinition`] that has already passed
//! [`SceneDefinition::validate`], so a scene that would overflow the
//! configuration-time pools never reaches the world.
//!
//! The text format reads:
//!
//! ```text
//! # comment
//! Scene name
//! G <columns> <rows>
//! P <column> <row>
//! W <start delay> <mob type> <mob count>
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::{MobKind, TileCoord, MAX_MOBS, MAX_WAVES, MAX_WAYPOINTS};

/// Static description of a playable scene.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneDefinition {
    /// Display name of the scene.
    pub name: String,
    /// Number of grid columns.
    pub columns: u32,
    /// Number of grid rows.
    pub rows: u32,
    /// Ordered tiles the mob path runs through.
    pub waypoints: Vec<TileCoord>,
    /// Waves in activation order.
    #[serde(default)]
    pub waves: Vec<WaveDefinition>,
}

/// Static description of a single wave.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WaveDefinition {
    /// Seconds before the wave activates on its own.
    #[serde(default)]
    pub start_delay: f32,
    /// Number of mobs the wave spawns.
    pub mob_count: u32,
    /// Type of the spawned mobs.
    pub mob: MobKind,
    /// Health override for the spawned mobs.
    #[serde(default)]
    pub max_health: Option<i32>,
    /// Movement speed override for the spawned mobs, in tiles per second.
    #[serde(default)]
    pub movement_speed: Option<f32>,
}

impl WaveDefinition {
    /// Creates a wave of `mob_count` mobs of the given kind.
    #[must_use]
    pub fn new(start_delay: f32, mob: MobKind, mob_count: u32) -> Self {
        Self {
            start_delay,
            mob_count,
            mob,
            max_health: None,
            movement_speed: None,
        }
    }

    /// Health every mob of the wave spawns with.
    #[must_use]
    pub fn max_health(&self) -> i32 {
        self.max_health.unwrap_or_else(|| self.mob.max_health())
    }

    /// Movement speed of every mob of the wave, in tiles per second.
    #[must_use]
    pub fn movement_speed(&self) -> f32 {
        self.movement_speed.unwrap_or_else(|| self.mob.movement_speed())
    }
}

/// Errors raised while loading or validating a scene.
#[derive(Debug, Error)]
pub enum LevelError {
    /// The source contained no name line.
    #[error("scene has no name line")]
    MissingName,
    /// A recognised line had missing, extra or unparsable values.
    #[error("line {line}: malformed `{content}`")]
    Malformed {
        /// One-based line number.
        line: usize,
        /// Offending line content.
        content: String,
    },
    /// A wave line referenced a mob type that does not exist.
    #[error("line {line}: unknown mob type {value}")]
    UnknownMobType {
        /// One-based line number.
        line: usize,
        /// Offending mob type.
        value: i64,
    },
    /// The grid has no tiles.
    #[error("grid must have at least one column and one row, got {columns}x{rows}")]
    EmptyGrid {
        /// Declared columns.
        columns: u32,
        /// Declared rows.
        rows: u32,
    },
    /// The path cannot form a single segment.
    #[error("path needs at least 2 waypoints, got {count}")]
    TooFewWaypoints {
        /// Declared waypoints.
        count: usize,
    },
    /// The path exceeds the waypoint capacity.
    #[error("path allows at most 10 waypoints, got {count}")]
    TooManyWaypoints {
        /// Declared waypoints.
        count: usize,
    },
    /// A waypoint lies outside of the grid.
    #[error("waypoint ({column}, {row}) lies outside of the grid")]
    WaypointOutOfBounds {
        /// Waypoint column.
        column: i32,
        /// Waypoint row.
        row: i32,
    },
    /// The scene exceeds the wave capacity.
    #[error("scene allows at most 10 waves, got {count}")]
    TooManyWaves {
        /// Declared waves.
        count: usize,
    },
    /// The waves together exceed the mob capacity.
    #[error("scene allows at most 1024 mobs, got {count}")]
    TooManyMobs {
        /// Mobs declared across every wave.
        count: u64,
    },
    /// A wave declared a negative or non-finite start delay.
    #[error("wave {wave} has an invalid start delay")]
    InvalidStartDelay {
        /// Zero-based wave position.
        wave: usize,
    },
    /// A wave declared a non-positive health or speed.
    #[error("wave {wave} overrides health or speed with a non-positive value")]
    InvalidOverride {
        /// Zero-based wave position.
        wave: usize,
    },
    /// The TOML source could not be deserialized.
    #[error("invalid scene toml")]
    Toml(#[from] toml::de::Error),
}

impl SceneDefinition {
    /// Parses and validates a scene written in the line-oriented text format.
    ///
    /// Unrecognised lines are skipped with a warning.
    pub fn parse(source: &str) -> Result<Self, LevelError> {
        let mut name = None;
        let mut columns = 0;
        let mut rows = 0;
        let mut waypoints = Vec::new();
        let mut waves = Vec::new();

        for (index, raw) in source.lines().enumerate() {
            let number = index + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if name.is_none() {
                name = Some(line.to_owned());
                continue;
            }

            let mut tokens = line.split_whitespace();
            match tokens.next() {
                Some("G") => {
                    let [c, r] = fields::<2>(tokens, number, line)?;
                    columns = parse_value(c, number, line)?;
                    rows = parse_value(r, number, line)?;
                }
                Some("P") => {
                    let [c, r] = fields::<2>(tokens, number, line)?;
                    waypoints.push(TileCoord::new(
                        parse_value(c, number, line)?,
                        parse_value(r, number, line)?,
                    ));
                }
                Some("W") => {
                    let [delay, kind, count] = fields::<3>(tokens, number, line)?;
                    let kind: i64 = parse_value(kind, number, line)?;
                    let mob = MobKind::from_index(kind).ok_or(LevelError::UnknownMobType {
                        line: number,
                        value: kind,
                    })?;
                    waves.push(WaveDefinition::new(
                        parse_value(delay, number, line)?,
                        mob,
                        parse_value(count, number, line)?,
                    ));
                }
                _ => warn!(line = number, content = line, "skipping unknown scene line"),
            }
        }

        let definition = Self {
            name: name.ok_or(LevelError::MissingName)?,
            columns,
            rows,
            waypoints,
            waves,
        };
        definition.validate()?;
        Ok(definition)
    }

    /// Parses and validates a scene written in TOML.
    pub fn from_toml_str(source: &str) -> Result<Self, LevelError> {
        let definition: Self = toml::from_str(source)?;
        definition.validate()?;
        Ok(definition)
    }

    /// Checks the definition against the scene capacities.
    pub fn validate(&self) -> Result<(), LevelError> {
        if self.name.trim().is_empty() {
            return Err(LevelError::MissingName);
        }
        if self.columns == 0 || self.rows == 0 {
            return Err(LevelError::EmptyGrid {
                columns: self.columns,
                rows: self.rows,
            });
        }
        if self.waypoints.len() < 2 {
            return Err(LevelError::TooFewWaypoints {
                count: self.waypoints.len(),
            });
        }
        if self.waypoints.len() > MAX_WAYPOINTS {
            return Err(LevelError::TooManyWaypoints {
                count: self.waypoints.len(),
            });
        }
        if let Some(outside) = self.waypoints.iter().find(|tile| !self.contains(**tile)) {
            return Err(LevelError::WaypointOutOfBounds {
                column: outside.column(),
                row: outside.row(),
            });
        }
        if self.waves.len() > MAX_WAVES {
            return Err(LevelError::TooManyWaves {
                count: self.waves.len(),
            });
        }
        for (wave, definition) in self.waves.iter().enumerate() {
            if !definition.start_delay.is_finite() || definition.start_delay < 0.0 {
                return Err(LevelError::InvalidStartDelay { wave });
            }
            let speed = definition.movement_speed();
            if definition.max_health() <= 0 || !speed.is_finite() || speed <= 0.0 {
                return Err(LevelError::InvalidOverride { wave });
            }
        }
        let count = self.total_mobs();
        if count > MAX_MOBS as u64 {
            return Err(LevelError::TooManyMobs { count });
        }
        Ok(())
    }

    /// Number of mobs declared across every wave.
    #[must_use]
    pub fn total_mobs(&self) -> u64 {
        self.waves
            .iter()
            .map(|wave| u64::from(wave.mob_count))
            .sum()
    }

    /// Reports whether the tile lies within the grid.
    #[must_use]
    pub fn contains(&self, tile: TileCoord) -> bool {
        tile.column() >= 0
            && tile.row() >= 0
            && (tile.column() as u32) < self.columns
            && (tile.row() as u32) < self.rows
    }
}

fn fields<'a, const N: usize>(
    mut tokens: impl Iterator<Item = &'a str>,
    line: usize,
    content: &str,
) -> Result<[&'a str; N], LevelError> {
    let malformed = || LevelError::Malformed {
        line,
        content: content.to_owned(),
    };
    let mut values: [&'a str; N] = [""; N];
    for value in &mut values {
        *value = tokens.next().ok_or_else(malformed)?;
    }
    if tokens.next().is_some() {
        return Err(malformed());
    }
    Ok(values)
}

fn parse_value<T: std::str::FromStr>(
    token: &str,
    line: usize,
    content: &str,
) -> Result<T, LevelError> {
    token.parse().map_err(|_| LevelError::Malformed {
        line,
        content: content.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENE: &str = "\
# first scene
Meadow
G 12 12
P 0 2
P 6 2
P 6 9
W 0 0 3
W 5 1 4
";

    #[test]
    fn parses_text_scene() {
        let scene = SceneDefinition::parse(SCENE).expect("scene parses");
        assert_eq!(scene.name, "Meadow");
        assert_eq!((scene.columns, scene.rows), (12, 12));
        assert_eq!(
            scene.waypoints,
            vec![
                TileCoord::new(0, 2),
                TileCoord::new(6, 2),
                TileCoord::new(6, 9)
            ]
        );
        assert_eq!(scene.waves.len(), 2);
        assert_eq!(scene.waves[1].mob, MobKind::Blue);
        assert_eq!(scene.waves[1].start_delay, 5.0);
        assert_eq!(scene.total_mobs(), 7);
    }

    #[test]
    fn unknown_lines_are_skipped() {
        let source = format!("{SCENE}X what is this\n");
        let scene = SceneDefinition::parse(&source).expect("unknown lines are tolerated");
        assert_eq!(scene.waves.len(), 2);
    }

    #[test]
    fn missing_values_are_malformed() {
        let source = SCENE.replace("G 12 12", "G 12");
        let error = SceneDefinition::parse(&source).expect_err("grid line lacks rows");
        assert!(matches!(error, LevelError::Malformed { line: 3, .. }), "{error}");
    }

    #[test]
    fn unknown_mob_type_is_rejected() {
        let source = SCENE.replace("W 0 0 3", "W 0 7 3");
        let error = SceneDefinition::parse(&source).expect_err("mob type 7 does not exist");
        assert!(matches!(error, LevelError::UnknownMobType { value: 7, .. }));
    }

    #[test]
    fn single_waypoint_path_is_fatal() {
        let source = "Lonely\nG 4 4\nP 1 1\nW 0 0 1\n";
        let error = SceneDefinition::parse(source).expect_err("one waypoint cannot form a path");
        assert!(matches!(error, LevelError::TooFewWaypoints { count: 1 }));
    }

    #[test]
    fn waypoints_must_stay_on_the_grid() {
        let source = SCENE.replace("P 6 9", "P 6 12");
        let error = SceneDefinition::parse(&source).expect_err("row 12 is outside");
        assert!(matches!(
            error,
            LevelError::WaypointOutOfBounds { column: 6, row: 12 }
        ));
    }

    #[test]
    fn mob_capacity_is_enforced_at_load() {
        let source = SCENE.replace("W 5 1 4", "W 5 1 1022");
        let error = SceneDefinition::parse(&source).expect_err("1025 mobs overflow the pool");
        assert!(matches!(error, LevelError::TooManyMobs { count: 1025 }));
    }

    #[test]
    fn wave_capacity_is_enforced_at_load() {
        let mut source = String::from("Crowded\nG 4 4\nP 0 0\nP 3 0\n");
        for _ in 0..=MAX_WAVES {
            source.push_str("W 0 0 1\n");
        }
        let error = SceneDefinition::parse(&source).expect_err("eleven waves overflow");
        assert!(matches!(error, LevelError::TooManyWaves { count: 11 }));
    }

    #[test]
    fn parses_toml_scene_with_overrides() {
        let source = r#"
name = "Ridge"
columns = 8
rows = 6
waypoints = [{ column = 0, row = 0 }, { column = 7, row = 0 }]

[[waves]]
mob_count = 2
mob = "red"
max_health = 40

[[waves]]
start_delay = 3.5
mob_count = 5
mob = "blue"
movement_speed = 3.0
"#;
        let scene = SceneDefinition::from_toml_str(source).expect("toml scene parses");
        assert_eq!(scene.waves[0].start_delay, 0.0);
        assert_eq!(scene.waves[0].max_health(), 40);
        assert_eq!(scene.waves[0].movement_speed(), 1.0);
        assert_eq!(scene.waves[1].max_health(), 30);
        assert_eq!(scene.waves[1].movement_speed(), 3.0);
    }

    #[test]
    fn non_positive_override_is_rejected() {
        let source = r#"
name = "Ridge"
columns = 8
rows = 6
waypoints = [{ column = 0, row = 0 }, { column = 7, row = 0 }]

[[waves]]
mob_count = 2
mob = "red"
movement_speed = 0.0
"#;
        let error = SceneDefinition::from_toml_str(source).expect_err("speed must be positive");
        assert!(matches!(error, LevelError::InvalidOverride { wave: 0 }));
    }

    #[test]
    fn start_delay_must_be_a_finite_non_negative_number() {
        for delay in ["-1", "nan", "inf"] {
            let source = SCENE.replace("W 0 0 3", &format!("W {delay} 0 3"));
            let error = SceneDefinition::parse(&source).expect_err("delay is rejected");
            assert!(matches!(error, LevelError::InvalidStartDelay { wave: 0 }), "{delay}");
        }
    }

    #[test]
    fn broken_toml_surfaces_as_toml_error() {
        let error = SceneDefinition::from_toml_str("name = ").expect_err("not toml");
        assert!(matches!(error, LevelError::Toml(_)));
    }
}
