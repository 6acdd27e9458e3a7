#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless battle runner for Tank Clash.
//!
//! Builds a battlefield from a TOML config (or a stock skirmish), deploys the
//! configured tanks with their policies, then applies tick directives until
//! the battle is decided or the tick budget runs out. Every directive can be
//! recorded as a single-line trace and replayed later; all random streams are
//! derived from one battle seed, so a seed plus a trace reproduces a battle
//! exactly.

mod ascii;
mod config;
mod report;
mod trace;

use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{bail, Context, Result};
use clap::Parser;
use sha2::{Digest, Sha256};
use tank_clash_brain_scripted::Scripted;
use tank_clash_brain_wander::{Config as WanderConfig, Wander};
use tank_clash_core::{
    Directive, Event, Facing, Policy, TankColor, TankId, TankSeed, TankState, TileCoord,
    TileExtent,
};
use tank_clash_rendering::{Scene, ScenePresenter};
use tank_clash_world::{apply, query, World};

use crate::ascii::AsciiPresenter;
use crate::config::{BattleConfig, BrainChoice, TankSpec};
use crate::report::Reporter;
use crate::trace::{BattleTrace, BrainSpec};

/// Size of one battlefield tile in field units.
const TILE_EXTENT: TileExtent = TileExtent::new(32.0, 32.0);
/// Label of the terrain seed stream.
const SEED_STREAM_TERRAIN: &str = "terrain";
/// Label prefix of the per-tank policy seed streams.
const SEED_STREAM_POLICY: &str = "policy";

/// Deterministic grid tank battles in the terminal.
#[derive(Debug, Parser)]
#[command(name = "tank-clash", version, about = "Deterministic grid tank battles")]
struct Args {
    /// Maximum number of ticks to simulate.
    #[arg(long, default_value_t = 600)]
    ticks: u32,

    /// Simulated milliseconds per tick.
    #[arg(long, default_value_t = 100)]
    tick_ms: u64,

    /// Battle seed every random stream derives from.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// TOML battle description; a stock two-tank skirmish runs when absent.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the field as a glyph grid every N ticks (0 disables).
    #[arg(long, default_value_t = 0, value_name = "N")]
    show_field: u32,

    /// Write the battle trace to this file after the session.
    #[arg(long, value_name = "FILE")]
    record: Option<PathBuf>,

    /// Replay a previously recorded trace instead of running a config.
    #[arg(long, value_name = "FILE", conflicts_with = "config")]
    replay: Option<PathBuf>,

    /// Suppress per-event reporting; the closing summary still prints.
    #[arg(long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    match args.replay.clone() {
        Some(path) => replay_battle(&args, &path),
        None => run_battle(&args),
    }
}

/// Runs a fresh battle from a config, optionally recording its trace.
fn run_battle(args: &Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => config::load(path)?,
        None => BattleConfig::skirmish(),
    };
    let battle_seed = config.seed.unwrap_or(args.seed);

    let mut session = Session::new(args.quiet);
    session.configure(&config, battle_seed);
    session.deploy(&config, battle_seed)?;
    session.run(args)?;

    if let Some(path) = &args.record {
        let trace = session.into_trace(&config, battle_seed);
        fs::write(path, trace.encode())
            .with_context(|| format!("failed to write trace to {}", path.display()))?;
        println!("trace recorded to {}", path.display());
    }
    Ok(())
}

/// Replays a recorded trace, reinstalling the recorded policies.
///
/// Policies never travel inside directives; the trace carries their seeds and
/// scripts instead, and since every policy is deterministic for a given seed
/// the replayed battle matches the recorded one event for event.
fn replay_battle(args: &Args, path: &Path) -> Result<()> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read trace from {}", path.display()))?;
    let trace = BattleTrace::decode(&contents)
        .with_context(|| format!("failed to decode trace from {}", path.display()))?;

    let mut world = World::new();
    let mut reporter = Reporter::new(args.quiet);
    let mut events = Vec::new();
    let mut brains = trace.brains.iter();

    for directive in trace.directives {
        events.clear();
        let is_tick = matches!(directive, Directive::Tick { .. });
        apply(&mut world, directive, &mut events);
        for event in &events {
            if let Event::TankSpawned { tank, .. } = event {
                let spec = brains
                    .next()
                    .context("trace lists fewer brains than spawned tanks")?;
                install_brain(&mut world, *tank, spec)?;
            }
        }
        reporter.report(&events);
        if is_tick {
            show_field(&world, args, reporter.tick())?;
        }
    }

    summarize(&world, reporter.tick());
    Ok(())
}

/// One recorded battle in progress: the world plus the applied directives.
struct Session {
    world: World,
    reporter: Reporter,
    directives: Vec<Directive>,
    brains: Vec<BrainSpec>,
    events: Vec<Event>,
}

impl Session {
    fn new(quiet: bool) -> Self {
        Self {
            world: World::new(),
            reporter: Reporter::new(quiet),
            directives: Vec::new(),
            brains: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Applies one directive, recording it and reporting its events.
    fn apply(&mut self, directive: Directive) {
        self.events.clear();
        self.directives.push(directive.clone());
        apply(&mut self.world, directive, &mut self.events);
        self.reporter.report(&self.events);
    }

    /// Builds the battlefield: generated terrain, then paint, then scenery.
    fn configure(&mut self, config: &BattleConfig, battle_seed: u64) {
        self.apply(Directive::ConfigureBattlefield {
            columns: config.columns,
            rows: config.rows,
            tile_extent: TILE_EXTENT,
            terrain_seed: derive_stream_seed(battle_seed, SEED_STREAM_TERRAIN),
            blocking_tiles: config.blocking.clone(),
        });
        for paint in &config.paint {
            self.apply(Directive::PaintTile {
                cell: paint.cell,
                tile: paint.tile,
            });
        }
        for scenery in &config.scenery {
            self.apply(Directive::PlaceItem {
                cell: scenery.cell,
                item: scenery.item,
            });
        }
    }

    /// Deploys the configured tanks and installs their policies.
    fn deploy(&mut self, config: &BattleConfig, battle_seed: u64) -> Result<()> {
        for (index, spec) in config.tanks.iter().enumerate() {
            let cell = match spec.cell {
                Some(cell) => cell,
                None => self
                    .deployment_cell(config, index)
                    .with_context(|| format!("no free cell to deploy tank {index}"))?,
            };
            let facing = spec
                .facing
                .unwrap_or_else(|| facing_toward_center(cell, config.columns, config.rows));

            self.apply(Directive::SpawnTank {
                seed: TankSeed {
                    cell,
                    facing,
                    color: spec.color,
                },
            });
            let spawned = self.events.iter().find_map(|event| match event {
                Event::TankSpawned { tank, .. } => Some(*tank),
                _ => None,
            });
            let Some(tank) = spawned else {
                bail!("tank {index} ({}) could not be deployed", spec.color.name());
            };

            let brain = brain_spec(spec, battle_seed, index);
            install_brain(&mut self.world, tank, &brain)?;
            self.brains.push(brain);
        }
        Ok(())
    }

    /// Picks a deployment cell for a tank the config left unplaced.
    ///
    /// Tanks anchor to the four edge midpoints in turn and take the free
    /// drivable cell nearest their anchor, so an unplaced roster spreads
    /// across the field instead of piling up in a corner.
    fn deployment_cell(&self, config: &BattleConfig, index: usize) -> Option<TileCoord> {
        let (columns, rows) = (config.columns as i32, config.rows as i32);
        let anchors = [
            TileCoord::new(1, rows / 2),
            TileCoord::new(columns - 2, rows / 2),
            TileCoord::new(columns / 2, 1),
            TileCoord::new(columns / 2, rows - 2),
        ];
        let anchor = anchors[index % anchors.len()];

        let field = query::field_view(&self.world);
        let mut best: Option<(u32, i32, i32)> = None;
        for row in 0..rows {
            for column in 0..columns {
                let cell = TileCoord::new(column, row);
                let (tile, item) = field.radar(cell);
                let hostile = item.is_some()
                    || tile.map_or(true, |tile| {
                        tile.is_hazard() || config.blocking.contains(&tile)
                    });
                if hostile {
                    continue;
                }
                let key = (anchor.manhattan_distance(cell), row, column);
                if best.map_or(true, |current| key < current) {
                    best = Some(key);
                }
            }
        }
        best.map(|(_, row, column)| TileCoord::new(column, row))
    }

    /// Ticks the battle until it is decided or the budget runs out.
    fn run(&mut self, args: &Args) -> Result<()> {
        let dt = Duration::from_millis(args.tick_ms);
        for _ in 0..args.ticks {
            self.apply(Directive::Tick { dt });
            show_field(&self.world, args, self.reporter.tick())?;
            if battle_decided(&self.world) {
                break;
            }
        }
        summarize(&self.world, self.reporter.tick());
        Ok(())
    }

    fn into_trace(self, config: &BattleConfig, battle_seed: u64) -> BattleTrace {
        BattleTrace {
            columns: config.columns,
            rows: config.rows,
            battle_seed,
            brains: self.brains,
            directives: self.directives,
        }
    }
}

/// Serializable policy description for one roster entry.
fn brain_spec(spec: &TankSpec, battle_seed: u64, index: usize) -> BrainSpec {
    match spec.brain {
        BrainChoice::Inert => BrainSpec::Inert,
        BrainChoice::Wander => BrainSpec::Wander {
            seed: spec
                .seed
                .unwrap_or_else(|| derive_policy_seed(battle_seed, index)),
        },
        BrainChoice::Scripted => BrainSpec::Scripted {
            script: spec.script.clone(),
        },
    }
}

/// Builds and installs the policy a brain spec describes.
fn install_brain(world: &mut World, tank: TankId, spec: &BrainSpec) -> Result<()> {
    let policy: Box<dyn Policy> = match spec {
        BrainSpec::Inert => return Ok(()),
        BrainSpec::Wander { seed } => Box::new(Wander::new(WanderConfig { seed: *seed })),
        BrainSpec::Scripted { script } => Box::new(Scripted::new(script.clone())),
    };
    if !world.install_policy(tank, policy) {
        bail!("tank #{} refused its policy", tank.get());
    }
    Ok(())
}

/// Prints the glyph grid when the tick matches the `--show-field` cadence.
fn show_field(world: &World, args: &Args, tick: u64) -> Result<()> {
    if args.show_field == 0 || tick % u64::from(args.show_field) != 0 {
        return Ok(());
    }
    let scene = Scene::compose(
        query::field_view(world),
        query::tile_extent(world),
        &query::tank_view(world),
        &query::bullet_view(world),
    )
    .context("failed to compose the field scene")?;
    println!("after tick {tick}:");
    AsciiPresenter::new(io::stdout().lock()).present(&scene)
}

/// A battle is decided once at most one tank lives and no bullet flies.
fn battle_decided(world: &World) -> bool {
    query::live_tank_count(world) <= 1 && query::bullet_view(world).iter().next().is_none()
}

fn summarize(world: &World, ticks: u64) {
    let survivors: Vec<(TankId, TankColor, u32)> = query::tank_view(world)
        .iter()
        .filter(|tank| tank.state != TankState::Dead)
        .map(|tank| (tank.id, tank.color, tank.shots))
        .collect();
    match survivors.as_slice() {
        [] => println!("battle over after {ticks} ticks: no survivors"),
        [(id, color, shots)] => println!(
            "battle over after {ticks} ticks: {} tank #{} wins with {shots} shots fired",
            color.name(),
            id.get()
        ),
        _ => {
            println!("battle undecided after {ticks} ticks; surviving tanks:");
            for (id, color, shots) in survivors {
                println!("  {} tank #{} ({shots} shots fired)", color.name(), id.get());
            }
        }
    }
}

/// Spawn facing aimed at the field center along the larger positional delta.
fn facing_toward_center(cell: TileCoord, columns: u32, rows: u32) -> Facing {
    let dx = columns as i32 / 2 - cell.column();
    let dy = rows as i32 / 2 - cell.row();
    if dx.abs() >= dy.abs() {
        if dx >= 0 {
            Facing::Right
        } else {
            Facing::Left
        }
    } else if dy >= 0 {
        Facing::Down
    } else {
        Facing::Up
    }
}

/// Derives a labeled seed stream from the battle seed.
fn derive_stream_seed(battle_seed: u64, label: &str) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(battle_seed.to_le_bytes());
    hasher.update(label.as_bytes());
    finalize_seed(hasher)
}

/// Derives the policy seed stream for the tank at a roster index.
fn derive_policy_seed(battle_seed: u64, index: usize) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(battle_seed.to_le_bytes());
    hasher.update(SEED_STREAM_POLICY.as_bytes());
    hasher.update((index as u64).to_le_bytes());
    finalize_seed(hasher)
}

fn finalize_seed(hasher: Sha256) -> u64 {
    let digest = hasher.finalize();
    let bytes: [u8; 8] = digest[0..8].try_into().expect("sha256 digest slice length");
    u64::from_le_bytes(bytes)
}
