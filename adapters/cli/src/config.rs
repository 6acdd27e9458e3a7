//! TOML battle descriptions loaded before a session starts.

use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tank_clash_core::{Command, Facing, Item, TankColor, Tile, TileCoord};

const SUPPORTED_CONFIG_VERSION: u32 = 1;

fn default_columns() -> u32 {
    20
}

fn default_rows() -> u32 {
    14
}

fn default_brain() -> BrainChoice {
    BrainChoice::Wander
}

/// Declarative description of a battle: the field, its dressing and the tanks.
#[derive(Debug, Deserialize)]
pub(crate) struct BattleConfig {
    version: u32,
    /// Number of tile columns laid out on the field.
    #[serde(default = "default_columns")]
    pub(crate) columns: u32,
    /// Number of tile rows laid out on the field.
    #[serde(default = "default_rows")]
    pub(crate) rows: u32,
    /// Battle seed override; the command-line seed applies when absent.
    pub(crate) seed: Option<u64>,
    /// Terrain kinds that stop a driving tank.
    #[serde(default)]
    pub(crate) blocking: Vec<Tile>,
    /// Terrain painted over the generated field.
    #[serde(default)]
    pub(crate) paint: Vec<PaintSpec>,
    /// Scenery placed on top of the generated field.
    #[serde(default)]
    pub(crate) scenery: Vec<ScenerySpec>,
    /// Tanks deployed into the battle, in spawn order.
    #[serde(default)]
    pub(crate) tanks: Vec<TankSpec>,
}

/// Single cell of terrain painted over the generated field.
#[derive(Debug, Deserialize)]
pub(crate) struct PaintSpec {
    /// Cell whose terrain changes.
    pub(crate) cell: TileCoord,
    /// Terrain kind to install.
    pub(crate) tile: Tile,
}

/// Single scenery item placed on top of the generated field.
#[derive(Debug, Deserialize)]
pub(crate) struct ScenerySpec {
    /// Cell that should hold the item.
    pub(crate) cell: TileCoord,
    /// Item to install.
    pub(crate) item: Item,
}

/// One tank of the battle roster.
#[derive(Debug, Deserialize)]
pub(crate) struct TankSpec {
    /// Identity tag painted on the hull.
    pub(crate) color: TankColor,
    /// Decision policy driving the tank.
    #[serde(default = "default_brain")]
    pub(crate) brain: BrainChoice,
    /// Policy seed override; derived from the battle seed when absent.
    pub(crate) seed: Option<u64>,
    /// Commands played back by a scripted brain.
    #[serde(default)]
    pub(crate) script: Vec<Command>,
    /// Spawn cell override; picked by the deployment scan when absent.
    pub(crate) cell: Option<TileCoord>,
    /// Spawn facing override; aimed at the field center when absent.
    pub(crate) facing: Option<Facing>,
}

/// Decision policies a config can ask for.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum BrainChoice {
    /// No policy; the tank only runs injected commands.
    Inert,
    /// Seeded random wanderer.
    Wander,
    /// Plays a fixed script, one command at a time.
    Scripted,
}

impl BattleConfig {
    /// Stock two-tank skirmish used when no config file is provided.
    pub(crate) fn skirmish() -> Self {
        Self {
            version: SUPPORTED_CONFIG_VERSION,
            columns: default_columns(),
            rows: default_rows(),
            seed: None,
            blocking: Vec::new(),
            paint: Vec::new(),
            scenery: Vec::new(),
            tanks: vec![
                TankSpec {
                    color: TankColor::Red,
                    brain: BrainChoice::Wander,
                    seed: None,
                    script: Vec::new(),
                    cell: None,
                    facing: None,
                },
                TankSpec {
                    color: TankColor::Blue,
                    brain: BrainChoice::Wander,
                    seed: None,
                    script: Vec::new(),
                    cell: None,
                    facing: None,
                },
            ],
        }
    }
}

/// Loads a battle config from the provided path.
pub(crate) fn load(path: &Path) -> Result<BattleConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read battle config at {}", path.display()))?;
    parse(&contents)
}

fn parse(contents: &str) -> Result<BattleConfig> {
    let config: BattleConfig =
        toml::from_str(contents).context("failed to parse battle config toml contents")?;
    if config.version != SUPPORTED_CONFIG_VERSION {
        bail!(
            "unsupported battle config version {}; expected {}",
            config.version,
            SUPPORTED_CONFIG_VERSION
        );
    }
    if config.tanks.is_empty() {
        bail!("battle config lists no tanks");
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_a_full_battle_description() {
        let contents = r#"
            version = 1
            columns = 12
            rows = 9
            seed = 99
            blocking = ["Water"]

            [[paint]]
            cell = { column = 2, row = 2 }
            tile = "Dirt"

            [[scenery]]
            cell = { column = 4, row = 4 }
            item = "Rock"

            [[tanks]]
            color = "Red"
            brain = "scripted"
            script = ["Forward", { Face = "Left" }, "Shoot"]
            cell = { column = 1, row = 1 }
            facing = "Right"

            [[tanks]]
            color = "Blue"
            brain = "wander"
            seed = 5
        "#;

        let config = parse(contents).expect("well-formed config parses");

        assert_eq!(config.columns, 12);
        assert_eq!(config.rows, 9);
        assert_eq!(config.seed, Some(99));
        assert_eq!(config.blocking, vec![Tile::Water]);
        assert_eq!(config.paint.len(), 1);
        assert_eq!(config.paint[0].cell, TileCoord::new(2, 2));
        assert_eq!(config.paint[0].tile, Tile::Dirt);
        assert_eq!(config.scenery.len(), 1);
        assert_eq!(config.scenery[0].item, Item::Rock);
        assert_eq!(config.tanks.len(), 2);
        assert_eq!(config.tanks[0].brain, BrainChoice::Scripted);
        assert_eq!(
            config.tanks[0].script,
            vec![
                Command::Forward,
                Command::Face(Facing::Left),
                Command::Shoot
            ]
        );
        assert_eq!(config.tanks[0].cell, Some(TileCoord::new(1, 1)));
        assert_eq!(config.tanks[0].facing, Some(Facing::Right));
        assert_eq!(config.tanks[1].brain, BrainChoice::Wander);
        assert_eq!(config.tanks[1].seed, Some(5));
    }

    #[test]
    fn parse_applies_field_defaults() {
        let contents = r#"
            version = 1

            [[tanks]]
            color = "Green"
        "#;

        let config = parse(contents).expect("minimal config parses");

        assert_eq!(config.columns, 20);
        assert_eq!(config.rows, 14);
        assert_eq!(config.seed, None);
        assert!(config.blocking.is_empty());
        assert_eq!(config.tanks[0].brain, BrainChoice::Wander);
        assert!(config.tanks[0].script.is_empty());
    }

    #[test]
    fn parse_rejects_unsupported_versions() {
        let contents = r#"
            version = 9

            [[tanks]]
            color = "Red"
        "#;

        let error = parse(contents).expect_err("future versions must be rejected");
        assert!(error.to_string().contains("unsupported battle config version"));
    }

    #[test]
    fn parse_rejects_empty_rosters() {
        let contents = "version = 1";

        let error = parse(contents).expect_err("a battle needs tanks");
        assert!(error.to_string().contains("lists no tanks"));
    }

    #[test]
    fn skirmish_deploys_two_wanderers() {
        let config = BattleConfig::skirmish();

        assert_eq!(config.tanks.len(), 2);
        assert!(config
            .tanks
            .iter()
            .all(|tank| tank.brain == BrainChoice::Wander));
        assert_eq!(config.tanks[0].color, TankColor::Red);
        assert_eq!(config.tanks[1].color, TankColor::Blue);
    }
}
