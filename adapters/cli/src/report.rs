//! Human-readable battle reporting on standard output.

use tank_clash_core::{
    BlockReason, Command, DestructionCause, DiscardReason, Event, Facing, PlacementError,
    SpawnError, TileCoord,
};

/// Prints one line per world event, prefixed with the tick it happened in.
///
/// [`Event::TimeAdvanced`] never prints; it only moves the tick prefix
/// forward, since six hundred "time advanced" lines would drown the battle.
#[derive(Debug)]
pub(crate) struct Reporter {
    quiet: bool,
    tick: u64,
}

impl Reporter {
    pub(crate) const fn new(quiet: bool) -> Self {
        Self { quiet, tick: 0 }
    }

    /// Tick index the reporter believes the battle has reached.
    pub(crate) const fn tick(&self) -> u64 {
        self.tick
    }

    /// Consumes a batch of events, printing each reportable one.
    pub(crate) fn report(&mut self, events: &[Event]) {
        for event in events {
            if matches!(event, Event::TimeAdvanced { .. }) {
                self.tick += 1;
                continue;
            }
            if !self.quiet {
                println!("[t{:>4}] {}", self.tick, describe(event));
            }
        }
    }
}

/// Renders one event as a single report line.
pub(crate) fn describe(event: &Event) -> String {
    match event {
        Event::TimeAdvanced { dt } => format!("time advanced by {}ms", dt.as_millis()),
        Event::BattlefieldConfigured {
            columns,
            rows,
            tile_extent,
        } => format!(
            "battlefield configured: {columns}x{rows} cells of {}x{} units",
            tile_extent.width(),
            tile_extent.height()
        ),
        Event::TilePainted { cell, tile } => {
            format!("painted {tile:?} at {}", cell_text(*cell))
        }
        Event::TilePaintRejected { cell, tile, reason } => format!(
            "refused to paint {tile:?} at {}: {}",
            cell_text(*cell),
            placement_text(*reason)
        ),
        Event::ItemPlaced { cell, item } => {
            format!("placed {item:?} at {}", cell_text(*cell))
        }
        Event::ItemPlacementRejected { cell, item, reason } => format!(
            "refused to place {item:?} at {}: {}",
            cell_text(*cell),
            placement_text(*reason)
        ),
        Event::TankSpawned {
            tank,
            cell,
            facing,
            color,
        } => format!(
            "{} tank #{} deployed at {} facing {}",
            color.name(),
            tank.get(),
            cell_text(*cell),
            facing_text(*facing)
        ),
        Event::TankSpawnRejected { seed, reason } => format!(
            "refused to deploy {} tank at {}: {}",
            seed.color.name(),
            cell_text(seed.cell),
            spawn_text(*reason)
        ),
        Event::CommandQueued { tank, command } => {
            format!("tank #{} queued {}", tank.get(), command_text(*command))
        }
        Event::CommandDiscarded {
            tank,
            command,
            reason,
        } => format!(
            "tank #{} dropped {}: {}",
            tank.get(),
            command_text(*command),
            discard_text(*reason)
        ),
        Event::TankMoved { tank, from, to } => format!(
            "tank #{} drove {} -> {}",
            tank.get(),
            cell_text(*from),
            cell_text(*to)
        ),
        Event::MoveAborted {
            tank,
            from,
            toward,
            reason,
        } => format!(
            "tank #{} stopped at {}; {} is {}",
            tank.get(),
            cell_text(*from),
            cell_text(*toward),
            block_text(*reason)
        ),
        Event::TankTurned { tank, facing } => {
            format!("tank #{} now faces {}", tank.get(), facing_text(*facing))
        }
        Event::BulletFired {
            tank,
            bullet,
            position,
            facing,
        } => format!(
            "tank #{} fired bullet #{} {} from ({:.1}, {:.1})",
            tank.get(),
            bullet.get(),
            facing_text(*facing),
            position.x(),
            position.y()
        ),
        Event::BulletExpired { bullet } => {
            format!("bullet #{} flew off the field", bullet.get())
        }
        Event::ItemDestroyed { cell, item } => {
            format!("{item:?} at {} was shot to pieces", cell_text(*cell))
        }
        Event::TankDestroyed { tank, cause } => match cause {
            DestructionCause::Shelled { by } => format!(
                "tank #{} was destroyed by tank #{}",
                tank.get(),
                by.get()
            ),
            DestructionCause::Drowned => format!("tank #{} drove into water", tank.get()),
            DestructionCause::Scuttled => format!("tank #{} was scuttled", tank.get()),
        },
        Event::BrainFaulted { tank } => format!(
            "tank #{}'s brain faulted and was disabled",
            tank.get()
        ),
    }
}

fn cell_text(cell: TileCoord) -> String {
    format!("({}, {})", cell.column(), cell.row())
}

fn facing_text(facing: Facing) -> &'static str {
    match facing {
        Facing::Up => "up",
        Facing::Down => "down",
        Facing::Left => "left",
        Facing::Right => "right",
    }
}

fn command_text(command: Command) -> String {
    match command {
        Command::Forward => "forward".to_owned(),
        Command::Backward => "backward".to_owned(),
        Command::Shoot => "shoot".to_owned(),
        Command::Face(facing) => format!("face {}", facing_text(facing)),
    }
}

fn block_text(reason: BlockReason) -> &'static str {
    match reason {
        BlockReason::Obstructed => "obstructed",
        BlockReason::OffField => "off the field",
        BlockReason::Occupied => "occupied by another tank",
    }
}

fn discard_text(reason: DiscardReason) -> &'static str {
    match reason {
        DiscardReason::BulletAlreadyLive => "a bullet is still flying",
        DiscardReason::BrainDetached => "the brain is detached",
        DiscardReason::QueueSaturated => "the queue is full",
        DiscardReason::UnknownTank => "no such tank",
    }
}

fn placement_text(reason: PlacementError) -> &'static str {
    match reason {
        PlacementError::OutOfBounds => "the cell is off the field",
        PlacementError::Occupied => "the cell is occupied",
        PlacementError::ReservedKind => "the item kind is reserved",
    }
}

fn spawn_text(reason: SpawnError) -> &'static str {
    match reason {
        SpawnError::OutOfBounds => "the cell is off the field",
        SpawnError::Occupied => "the cell is occupied",
        SpawnError::HostileTerrain => "the terrain is hostile",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tank_clash_core::{BulletId, FieldPoint, TankColor, TankId};

    #[test]
    fn events_render_as_single_lines() {
        let lines = [
            describe(&Event::TankSpawned {
                tank: TankId::new(0),
                cell: TileCoord::new(5, 5),
                facing: Facing::Right,
                color: TankColor::Red,
            }),
            describe(&Event::TankMoved {
                tank: TankId::new(0),
                from: TileCoord::new(5, 5),
                to: TileCoord::new(6, 5),
            }),
            describe(&Event::MoveAborted {
                tank: TankId::new(0),
                from: TileCoord::new(6, 5),
                toward: TileCoord::new(7, 5),
                reason: BlockReason::Obstructed,
            }),
            describe(&Event::BulletFired {
                tank: TankId::new(0),
                bullet: BulletId::new(3),
                position: FieldPoint::new(224.0, 176.0),
                facing: Facing::Right,
            }),
            describe(&Event::TankDestroyed {
                tank: TankId::new(1),
                cause: DestructionCause::Shelled { by: TankId::new(0) },
            }),
        ];

        assert_eq!(lines[0], "red tank #0 deployed at (5, 5) facing right");
        assert_eq!(lines[1], "tank #0 drove (5, 5) -> (6, 5)");
        assert_eq!(lines[2], "tank #0 stopped at (6, 5); (7, 5) is obstructed");
        assert_eq!(
            lines[3],
            "tank #0 fired bullet #3 right from (224.0, 176.0)"
        );
        assert_eq!(lines[4], "tank #1 was destroyed by tank #0");
        assert!(lines.iter().all(|line| !line.contains('\n')));
    }

    #[test]
    fn the_reporter_tracks_ticks_without_printing_them() {
        let mut reporter = Reporter::new(true);

        reporter.report(&[
            Event::TimeAdvanced {
                dt: Duration::from_millis(100),
            },
            Event::TimeAdvanced {
                dt: Duration::from_millis(100),
            },
        ]);

        assert_eq!(reporter.tick(), 2);
    }
}
