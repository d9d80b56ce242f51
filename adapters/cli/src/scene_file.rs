//! Loading of scene definitions and configuration from disk.

use std::{fs, path::Path, str::FromStr};

use anyhow::{bail, Context, Result};
use iso_defence_core::{SceneDefinition, TileCoord, TowerKind};
use iso_defence_scene::SceneConfig;

/// Reads a scene file, picking the TOML form for `.toml` files and the line
/// format for everything else.
pub(crate) fn load_definition(path: &Path) -> Result<SceneDefinition> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("failed to read scene file {}", path.display()))?;
    let is_toml = path
        .extension()
        .is_some_and(|extension| extension.eq_ignore_ascii_case("toml"));
    let definition = if is_toml {
        SceneDefinition::from_toml_str(&source)
    } else {
        SceneDefinition::parse(&source)
    };
    definition.with_context(|| format!("invalid scene file {}", path.display()))
}

/// Reads the optional configuration file, falling back to the defaults.
pub(crate) fn load_config(path: Option<&Path>) -> Result<SceneConfig> {
    let Some(path) = path else {
        return Ok(SceneConfig::default());
    };
    let source = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    SceneConfig::from_toml_str(&source)
        .with_context(|| format!("invalid config file {}", path.display()))
}

/// Tower requested on the command line as `column,row[,kind]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct TowerRequest {
    pub(crate) tile: TileCoord,
    pub(crate) kind: Option<TowerKind>,
}

impl FromStr for TowerRequest {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        let parts: Vec<&str> = value.split(',').map(str::trim).collect();
        let (column, row, kind) = match parts.as_slice() {
            [column, row] => (column, row, None),
            [column, row, kind] => (column, row, Some(parse_kind(kind)?)),
            _ => bail!("expected COLUMN,ROW[,KIND] but got `{value}`"),
        };
        let column = column
            .parse()
            .with_context(|| format!("invalid tower column `{column}`"))?;
        let row = row
            .parse()
            .with_context(|| format!("invalid tower row `{row}`"))?;
        Ok(Self {
            tile: TileCoord::new(column, row),
            kind,
        })
    }
}

fn parse_kind(value: &str) -> Result<TowerKind> {
    TowerKind::ALL
        .into_iter()
        .find(|kind| format!("{kind:?}").eq_ignore_ascii_case(value))
        .with_context(|| format!("unknown tower kind `{value}` (expected rapid, frost or cannon)"))
}
