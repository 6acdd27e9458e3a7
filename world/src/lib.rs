#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative battle state for Tank Clash.
//!
//! The world owns the battlefield layers, every tank and every bullet. All
//! mutation flows through [`apply`], which executes one [`Directive`] and
//! appends the resulting [`Event`]s to the caller's buffer; read access flows
//! through the free functions in [`query`]. A tick advances tanks in
//! registration order and bullets afterwards, so the outcome of a battle is a
//! pure function of the directive sequence.

use tank_clash_core::{
    BlockReason, BulletId, Command, DestructionCause, Directive, DiscardReason, Event, Facing,
    FieldPoint, FieldRect, FieldVec, FieldView, Item, Observation, PlacementError, Policy,
    SpawnError, TankColor, TankId, TankSeed, TankSnapshot, TankState, Tile, TileCoord, TileExtent,
    TurnArc,
};

mod animation;
mod battlefield;
mod brain;

use animation::Animation;
use battlefield::{Battlefield, SplitMix64};
use brain::{Brain, ThinkOutcome};

/// Ground speed of a driving tank, in field units per second.
const DRIVE_SPEED: f32 = 100.0;
/// Ground speed while crossing soft terrain.
const REDUCED_DRIVE_SPEED: f32 = 50.0;
/// Flight speed of a bullet, in field units per second.
const BULLET_SPEED: f32 = 200.0;
/// Seconds a half rotation takes; a quarter rotation takes half of this.
const FULL_TURN_SECONDS: f32 = 1.0;
/// Side length of a bullet's collision volume, in field units.
const BULLET_EXTENT: f32 = 8.0;
/// Salt mixed into the terrain seed to derive the hull jitter stream.
const JITTER_STREAM_SALT: u64 = 0x6a09_e667_f3bc_c908;

const DEFAULT_COLUMNS: u32 = 20;
const DEFAULT_ROWS: u32 = 14;
const DEFAULT_TILE_EXTENT: TileExtent = TileExtent::new(32.0, 32.0);

/// Complete simulation state of one battle.
#[derive(Debug)]
pub struct World {
    battlefield: Battlefield,
    tanks: Vec<Tank>,
    bullets: Vec<Bullet>,
    next_tank_id: u32,
    next_bullet_id: u32,
    jitter: SplitMix64,
    tick_index: u64,
}

impl World {
    /// Creates a world with the default flat battlefield and no tanks.
    #[must_use]
    pub fn new() -> Self {
        Self {
            battlefield: Battlefield::generate(
                DEFAULT_COLUMNS,
                DEFAULT_ROWS,
                DEFAULT_TILE_EXTENT,
                0,
                Vec::new(),
            ),
            tanks: Vec::new(),
            bullets: Vec::new(),
            next_tank_id: 0,
            next_bullet_id: 0,
            jitter: SplitMix64::new(JITTER_STREAM_SALT),
            tick_index: 0,
        }
    }

    /// Attaches a decision policy to a tank's brain.
    ///
    /// Returns `false` when no such tank exists or its brain was already
    /// detached. Policies are deliberately not part of the directive stream:
    /// a recorded battle replays their queued commands instead.
    pub fn install_policy(&mut self, tank: TankId, policy: Box<dyn Policy>) -> bool {
        match self.tank_index(tank) {
            Some(index) => self.tanks[index].brain.install_policy(policy),
            None => false,
        }
    }

    fn tank_index(&self, tank: TankId) -> Option<usize> {
        self.tanks.iter().position(|candidate| candidate.id == tank)
    }

    fn spawn_tank(&mut self, seed: TankSeed, out_events: &mut Vec<Event>) {
        let rejection = if !self.battlefield.in_bounds(seed.cell) {
            Some(SpawnError::OutOfBounds)
        } else if self.battlefield.item(seed.cell).is_some() {
            Some(SpawnError::Occupied)
        } else if self.battlefield.tile(seed.cell).map_or(true, |tile| {
            tile.is_hazard() || self.battlefield.tile_blocks(tile)
        }) {
            Some(SpawnError::HostileTerrain)
        } else {
            None
        };
        if let Some(reason) = rejection {
            out_events.push(Event::TankSpawnRejected { seed, reason });
            return;
        }
        let id = TankId::new(self.next_tank_id);
        self.next_tank_id = self.next_tank_id.wrapping_add(1);
        self.tanks.push(Tank::from_seed(id, seed));
        self.battlefield.occupy(id, seed.cell);
        out_events.push(Event::TankSpawned {
            tank: id,
            cell: seed.cell,
            facing: seed.facing,
            color: seed.color,
        });
    }

    fn queue_command(&mut self, tank: TankId, command: Command, out_events: &mut Vec<Event>) {
        let Some(index) = self.tank_index(tank) else {
            out_events.push(Event::CommandDiscarded {
                tank,
                command,
                reason: DiscardReason::UnknownTank,
            });
            return;
        };
        if self.tanks[index].brain.is_detached() {
            out_events.push(Event::CommandDiscarded {
                tank,
                command,
                reason: DiscardReason::BrainDetached,
            });
            return;
        }
        if self.tanks[index].brain.push(command) {
            out_events.push(Event::CommandQueued { tank, command });
        } else {
            out_events.push(Event::CommandDiscarded {
                tank,
                command,
                reason: DiscardReason::QueueSaturated,
            });
        }
    }

    fn advance(&mut self, dt: f32, out_events: &mut Vec<Event>) {
        for index in 0..self.tanks.len() {
            if self.tanks[index].state != TankState::Dead {
                self.advance_tank(index, dt, out_events);
            }
        }
        self.advance_bullets(dt, out_events);
    }

    /// Runs one tank's slot of the tick.
    ///
    /// The state blocks below run in a fixed order so that a command read
    /// while idle takes effect within the same tick: a zero-length turn
    /// completes immediately and a shot both fires and returns the tank to
    /// idle before the tick ends.
    fn advance_tank(&mut self, index: usize, dt: f32, out_events: &mut Vec<Event>) {
        if let Some(animation) = self.tanks[index].animation.as_mut() {
            animation.update(dt);
        }

        if self.tanks[index].state == TankState::Idle {
            self.run_brain(index, out_events);
        }

        if self.tanks[index].state == TankState::Turning {
            self.finish_turn(index, out_events);
            return;
        }

        if self.tanks[index].state == TankState::Shooting {
            self.fire_bullet(index, out_events);
            return;
        }

        if self.tanks[index].state == TankState::Moving {
            self.advance_drive(index, out_events);
        }
    }

    fn run_brain(&mut self, index: usize, out_events: &mut Vec<Event>) {
        if self.think_slot(index) == ThinkOutcome::Faulted {
            out_events.push(Event::BrainFaulted {
                tank: self.tanks[index].id,
            });
        }
        let Some(command) = self.tanks[index].brain.pop() else {
            return;
        };
        self.begin_command(index, command, out_events);
    }

    fn think_slot(&mut self, index: usize) -> ThinkOutcome {
        let opponents: Vec<TankSnapshot> = self
            .tanks
            .iter()
            .enumerate()
            .filter(|(other, _)| *other != index)
            .map(|(_, tank)| tank.snapshot())
            .collect();
        let (id, color, cell, facing, shots) = {
            let tank = &self.tanks[index];
            (tank.id, tank.color, tank.cell, tank.facing, tank.shots)
        };
        let field = FieldView::new(
            self.battlefield.tiles(),
            self.battlefield.items(),
            self.battlefield.columns(),
            self.battlefield.rows(),
        );
        let observation = Observation::new(id, color, cell, facing, shots, &opponents, field);
        self.tanks[index].brain.think(&observation)
    }

    fn begin_command(&mut self, index: usize, command: Command, out_events: &mut Vec<Event>) {
        match command {
            Command::Forward | Command::Backward => {
                let sign = if command == Command::Forward { 1 } else { -1 };
                let span = self
                    .battlefield
                    .tile_extent()
                    .along(self.tanks[index].facing.axis());
                let tank = &mut self.tanks[index];
                tank.drive_sign = sign;
                tank.animation = Some(Animation::new(span, DRIVE_SPEED));
                tank.state = TankState::Moving;
            }
            Command::Face(target) => {
                let tank = &mut self.tanks[index];
                let seconds = match tank.facing.turn_toward(target) {
                    TurnArc::None => 0.0,
                    TurnArc::Quarter => FULL_TURN_SECONDS * 0.5,
                    TurnArc::About => FULL_TURN_SECONDS,
                };
                tank.pending_facing = Some(target);
                tank.animation = Some(Animation::new(seconds, 1.0));
                tank.state = TankState::Turning;
            }
            Command::Shoot => {
                if self.tanks[index].live_bullet.is_some() {
                    out_events.push(Event::CommandDiscarded {
                        tank: self.tanks[index].id,
                        command,
                        reason: DiscardReason::BulletAlreadyLive,
                    });
                    return;
                }
                self.tanks[index].state = TankState::Shooting;
            }
        }
    }

    fn finish_turn(&mut self, index: usize, out_events: &mut Vec<Event>) {
        let done = self.tanks[index]
            .animation
            .map_or(true, |animation| animation.done());
        if !done {
            return;
        }
        let tank = &mut self.tanks[index];
        if let Some(target) = tank.pending_facing.take() {
            tank.facing = target;
        }
        tank.animation = None;
        tank.state = TankState::Idle;
        out_events.push(Event::TankTurned {
            tank: tank.id,
            facing: tank.facing,
        });
    }

    fn fire_bullet(&mut self, index: usize, out_events: &mut Vec<Event>) {
        let (id, cell, facing) = {
            let tank = &self.tanks[index];
            (tank.id, tank.cell, tank.facing)
        };
        let muzzle = self.muzzle_point(cell, facing);
        let bullet = BulletId::new(self.next_bullet_id);
        self.next_bullet_id = self.next_bullet_id.wrapping_add(1);
        self.bullets.push(Bullet {
            id: bullet,
            owner: id,
            facing,
            position: muzzle,
        });
        let tank = &mut self.tanks[index];
        tank.shots = tank.shots.saturating_add(1);
        tank.live_bullet = Some(bullet);
        tank.state = TankState::Idle;
        out_events.push(Event::BulletFired {
            tank: id,
            bullet,
            position: muzzle,
            facing,
        });
    }

    /// Point on the hull edge a bullet spawns at, at the middle of the side
    /// the tank is facing.
    fn muzzle_point(&self, cell: TileCoord, facing: Facing) -> FieldPoint {
        let extent = self.battlefield.tile_extent();
        let origin = self.battlefield.cell_origin(cell);
        let vector = facing.vector();
        FieldPoint::new(
            origin.x() + (1.0 + vector.dx() as f32) * extent.width() * 0.5,
            origin.y() + (1.0 + vector.dy() as f32) * extent.height() * 0.5,
        )
    }

    /// Drives one in-flight move forward by a tick.
    ///
    /// The candidate cell is re-validated on every tick of the drive, the
    /// completion tick included, so obstacles that appeared after the drive
    /// started still abort it. An abort discards the animation outright: the
    /// grid position never changed, so there is nothing to roll back.
    fn advance_drive(&mut self, index: usize, out_events: &mut Vec<Event>) {
        let (id, from, facing, sign) = {
            let tank = &self.tanks[index];
            (tank.id, tank.cell, tank.facing, tank.drive_sign)
        };
        let candidate = from.offset(facing.vector().scaled(sign));

        if let Some(reason) = self.drive_block(candidate, id) {
            self.tanks[index].halt();
            out_events.push(Event::MoveAborted {
                tank: id,
                from,
                toward: candidate,
                reason,
            });
            return;
        }

        let done = self.tanks[index]
            .animation
            .map_or(false, |animation| animation.done());
        if done {
            self.commit_warp(index, from, candidate, out_events);
            return;
        }

        let progress = self.tanks[index]
            .animation
            .map_or(0.0, |animation| animation.unit());
        let ground = if progress < 0.5 { from } else { candidate };
        let soft = self.battlefield.tile(ground).map_or(false, Tile::is_soft);
        let (speed, shake) = if soft {
            let dx = (self.jitter.next_u64() % 3) as f32 - 1.0;
            let dy = (self.jitter.next_u64() % 3) as f32;
            (REDUCED_DRIVE_SPEED, FieldVec::new(dx, dy))
        } else {
            (DRIVE_SPEED, FieldVec::ZERO)
        };
        let vector = facing.vector();
        let tank = &mut self.tanks[index];
        if let Some(animation) = tank.animation.as_mut() {
            animation.set_speed(speed);
            let travelled = animation.value() * sign as f32;
            tank.draw_offset = FieldVec::new(
                vector.dx() as f32 * travelled,
                vector.dy() as f32 * travelled,
            )
            .plus(shake);
        }
    }

    /// First collision reason blocking entry into the candidate cell, if any.
    /// Checks run in a fixed order: blocking terrain or scenery, then the
    /// field edge, then occupancy by another tank.
    fn drive_block(&self, candidate: TileCoord, mover: TankId) -> Option<BlockReason> {
        let tile = self.battlefield.tile(candidate);
        let item = self.battlefield.item(candidate);
        let obstructed = tile.map_or(false, |tile| self.battlefield.tile_blocks(tile))
            || item.map_or(false, Item::blocks_movement);
        if obstructed {
            return Some(BlockReason::Obstructed);
        }
        if tile.is_none() {
            return Some(BlockReason::OffField);
        }
        match item.and_then(Item::tank) {
            Some(occupant) if occupant != mover => Some(BlockReason::Occupied),
            _ => None,
        }
    }

    fn commit_warp(
        &mut self,
        index: usize,
        from: TileCoord,
        to: TileCoord,
        out_events: &mut Vec<Event>,
    ) {
        let id = self.tanks[index].id;
        self.tanks[index].cell = to;
        self.tanks[index].halt();
        self.battlefield.vacate(from);
        self.battlefield.occupy(id, to);
        out_events.push(Event::TankMoved { tank: id, from, to });

        if self.battlefield.tile(to).map_or(false, Tile::is_hazard) {
            self.destroy_tank(index, DestructionCause::Drowned, out_events);
        }
    }

    fn destroy_tank(
        &mut self,
        index: usize,
        cause: DestructionCause,
        out_events: &mut Vec<Event>,
    ) {
        if self.tanks[index].state == TankState::Dead {
            return;
        }
        let (id, cell) = (self.tanks[index].id, self.tanks[index].cell);
        {
            let tank = &mut self.tanks[index];
            tank.state = TankState::Dead;
            tank.animation = None;
            tank.pending_facing = None;
            tank.draw_offset = FieldVec::ZERO;
            tank.brain.detach();
        }
        self.battlefield.vacate(cell);
        out_events.push(Event::TankDestroyed { tank: id, cause });
    }

    /// Flies every bullet forward and resolves what it hit, in the order the
    /// bullets were fired. A bullet checks the field bounds first, then live
    /// tanks other than its owner, then blocking scenery.
    fn advance_bullets(&mut self, dt: f32, out_events: &mut Vec<Event>) {
        let bounds = self.battlefield.bounds();
        let mut cursor = 0;
        while cursor < self.bullets.len() {
            let (bullet_id, owner, position) = {
                let bullet = &mut self.bullets[cursor];
                bullet.advance(dt);
                (bullet.id, bullet.owner, bullet.position)
            };

            if !bounds.contains(position) {
                out_events.push(Event::BulletExpired { bullet: bullet_id });
                self.remove_bullet(cursor);
                continue;
            }

            if let Some(victim) = self.bullet_victim(cursor) {
                self.destroy_tank(victim, DestructionCause::Shelled { by: owner }, out_events);
                self.remove_bullet(cursor);
                continue;
            }

            if let Some(cell) = self.battlefield.cell_at_point(position) {
                if self
                    .battlefield
                    .item(cell)
                    .map_or(false, Item::blocks_movement)
                {
                    if let Some(item) = self.battlefield.take_item(cell) {
                        out_events.push(Event::ItemDestroyed { cell, item });
                    }
                    self.remove_bullet(cursor);
                    continue;
                }
            }

            cursor += 1;
        }
    }

    fn bullet_victim(&self, cursor: usize) -> Option<usize> {
        let bullet = &self.bullets[cursor];
        let extent = self.battlefield.tile_extent();
        let volume = FieldRect::centered_at(bullet.position, BULLET_EXTENT, BULLET_EXTENT);
        self.tanks.iter().position(|tank| {
            if tank.id == bullet.owner || tank.state == TankState::Dead {
                return false;
            }
            let origin = self
                .battlefield
                .cell_origin(tank.cell)
                .translated(tank.draw_offset);
            let hull = FieldRect::new(origin, extent.width(), extent.height());
            hull.intersects(&volume)
        })
    }

    fn remove_bullet(&mut self, cursor: usize) {
        let bullet = self.bullets.remove(cursor);
        if let Some(tank) = self.tanks.iter_mut().find(|tank| tank.id == bullet.owner) {
            if tank.live_bullet == Some(bullet.id) {
                tank.live_bullet = None;
            }
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Executes a directive against the world, appending resulting events.
pub fn apply(world: &mut World, directive: Directive, out_events: &mut Vec<Event>) {
    match directive {
        Directive::ConfigureBattlefield {
            columns,
            rows,
            tile_extent,
            terrain_seed,
            blocking_tiles,
        } => {
            world.battlefield =
                Battlefield::generate(columns, rows, tile_extent, terrain_seed, blocking_tiles);
            world.tanks.clear();
            world.bullets.clear();
            world.next_tank_id = 0;
            world.next_bullet_id = 0;
            world.jitter = SplitMix64::new(terrain_seed ^ JITTER_STREAM_SALT);
            world.tick_index = 0;
            out_events.push(Event::BattlefieldConfigured {
                columns,
                rows,
                tile_extent,
            });
        }
        Directive::PaintTile { cell, tile } => {
            if world.battlefield.set_tile(cell, tile) {
                out_events.push(Event::TilePainted { cell, tile });
            } else {
                out_events.push(Event::TilePaintRejected {
                    cell,
                    tile,
                    reason: PlacementError::OutOfBounds,
                });
            }
        }
        Directive::PlaceItem { cell, item } => match world.battlefield.try_place_item(cell, item) {
            Ok(()) => out_events.push(Event::ItemPlaced { cell, item }),
            Err(reason) => out_events.push(Event::ItemPlacementRejected { cell, item, reason }),
        },
        Directive::SpawnTank { seed } => world.spawn_tank(seed, out_events),
        Directive::QueueCommand { tank, command } => {
            world.queue_command(tank, command, out_events);
        }
        Directive::DestroyTank { tank } => {
            if let Some(index) = world.tank_index(tank) {
                world.destroy_tank(index, DestructionCause::Scuttled, out_events);
            }
        }
        Directive::Tick { dt } => {
            world.tick_index = world.tick_index.saturating_add(1);
            out_events.push(Event::TimeAdvanced { dt });
            world.advance(dt.as_secs_f32(), out_events);
        }
    }
}

/// Read-only queries over the world.
pub mod query {
    use super::{Tank, World};
    use tank_clash_core::{
        BulletSnapshot, BulletView, Command, FieldView, TankId, TankState, TankView, TileExtent,
    };

    /// Captures a snapshot of every tank, ordered by identifier.
    #[must_use]
    pub fn tank_view(world: &World) -> TankView {
        TankView::from_snapshots(world.tanks.iter().map(Tank::snapshot).collect())
    }

    /// Captures a snapshot of every bullet in flight, ordered by identifier.
    #[must_use]
    pub fn bullet_view(world: &World) -> BulletView {
        BulletView::from_snapshots(
            world
                .bullets
                .iter()
                .map(|bullet| BulletSnapshot {
                    id: bullet.id,
                    owner: bullet.owner,
                    facing: bullet.facing,
                    position: bullet.position,
                })
                .collect(),
        )
    }

    /// Read-only view over the tile and item layers.
    #[must_use]
    pub fn field_view(world: &World) -> FieldView<'_> {
        FieldView::new(
            world.battlefield.tiles(),
            world.battlefield.items(),
            world.battlefield.columns(),
            world.battlefield.rows(),
        )
    }

    /// Size of one tile in field units.
    #[must_use]
    pub fn tile_extent(world: &World) -> TileExtent {
        world.battlefield.tile_extent()
    }

    /// Column and row counts of the battlefield.
    #[must_use]
    pub fn dimensions(world: &World) -> (u32, u32) {
        (world.battlefield.columns(), world.battlefield.rows())
    }

    /// Number of ticks executed since the battlefield was configured.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Pending commands of the tank's brain, oldest first.
    #[must_use]
    pub fn brain_memory(world: &World, tank: TankId) -> Option<Vec<Command>> {
        world
            .tanks
            .iter()
            .find(|candidate| candidate.id == tank)
            .map(|candidate| candidate.brain.queue().memory().collect())
    }

    /// Number of tanks that are still alive.
    #[must_use]
    pub fn live_tank_count(world: &World) -> usize {
        world
            .tanks
            .iter()
            .filter(|tank| tank.state != TankState::Dead)
            .count()
    }
}

#[derive(Debug)]
struct Tank {
    id: TankId,
    cell: TileCoord,
    facing: Facing,
    color: TankColor,
    state: TankState,
    animation: Option<Animation>,
    drive_sign: i32,
    pending_facing: Option<Facing>,
    draw_offset: FieldVec,
    shots: u32,
    live_bullet: Option<BulletId>,
    brain: Brain,
}

impl Tank {
    fn from_seed(id: TankId, seed: TankSeed) -> Self {
        Self {
            id,
            cell: seed.cell,
            facing: seed.facing,
            color: seed.color,
            state: TankState::Idle,
            animation: None,
            drive_sign: 1,
            pending_facing: None,
            draw_offset: FieldVec::ZERO,
            shots: 0,
            live_bullet: None,
            brain: Brain::new(),
        }
    }

    fn snapshot(&self) -> TankSnapshot {
        TankSnapshot {
            id: self.id,
            cell: self.cell,
            facing: self.facing,
            state: self.state,
            color: self.color,
            shots: self.shots,
            draw_offset: self.draw_offset,
            bullet_live: self.live_bullet.is_some(),
        }
    }

    fn halt(&mut self) {
        self.animation = None;
        self.draw_offset = FieldVec::ZERO;
        self.state = TankState::Idle;
    }
}

#[derive(Clone, Copy, Debug)]
struct Bullet {
    id: BulletId,
    owner: TankId,
    facing: Facing,
    position: FieldPoint,
}

impl Bullet {
    fn advance(&mut self, dt: f32) {
        let vector = self.facing.vector();
        self.position = self.position.translated(FieldVec::new(
            vector.dx() as f32 * BULLET_SPEED * dt,
            vector.dy() as f32 * BULLET_SPEED * dt,
        ));
    }
}
