#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Tank Clash engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pluggable tank policies. Adapters submit
//! [`Directive`] values describing desired mutations, the world executes those
//! directives via its `apply` entry point, and then broadcasts [`Event`] values
//! for adapters and tests to react to deterministically. Policies implement
//! [`Policy`], observe the battle through [`Observation`], and respond
//! exclusively by appending [`Command`] values to their own [`CommandQueue`].

use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Maximum number of commands a brain queue holds; later pushes are dropped.
pub const COMMAND_QUEUE_CAPACITY: usize = 16;

/// A single queued tank instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    /// Drive one cell ahead along the current facing.
    Forward,
    /// Drive one cell against the current facing.
    Backward,
    /// Fire a bullet, provided no earlier bullet from this tank still flies.
    Shoot,
    /// Rotate in place until the tank points at the provided facing.
    Face(Facing),
}

/// Directives that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Directive {
    /// Rebuilds the battlefield with freshly generated terrain.
    ConfigureBattlefield {
        /// Number of tile columns laid out on the field.
        columns: u32,
        /// Number of tile rows laid out on the field.
        rows: u32,
        /// Size of a single tile measured in field units.
        tile_extent: TileExtent,
        /// Seed driving the deterministic terrain scatter.
        terrain_seed: u64,
        /// Terrain kinds that stop a driving tank on this field.
        blocking_tiles: Vec<Tile>,
    },
    /// Overwrites the terrain kind of a single cell.
    PaintTile {
        /// Cell whose terrain changes.
        cell: TileCoord,
        /// Terrain kind to install.
        tile: Tile,
    },
    /// Places a scenery item into an empty cell.
    PlaceItem {
        /// Cell that should hold the item.
        cell: TileCoord,
        /// Item to install; tank markers are reserved for the world.
        item: Item,
    },
    /// Requests that a new tank enter the battle.
    SpawnTank {
        /// Spawn parameters for the tank.
        seed: TankSeed,
    },
    /// Appends a command to a tank's brain queue.
    QueueCommand {
        /// Tank whose queue receives the command.
        tank: TankId,
        /// Command to append.
        command: Command,
    },
    /// Destroys a tank outright.
    DestroyTank {
        /// Tank to destroy.
        tank: TankId,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
}

/// Events broadcast by the world after processing directives.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that the battlefield was rebuilt.
    BattlefieldConfigured {
        /// Number of tile columns on the new field.
        columns: u32,
        /// Number of tile rows on the new field.
        rows: u32,
        /// Size of a single tile measured in field units.
        tile_extent: TileExtent,
    },
    /// Confirms that a cell's terrain changed.
    TilePainted {
        /// Cell whose terrain changed.
        cell: TileCoord,
        /// Terrain kind now occupying the cell.
        tile: Tile,
    },
    /// Reports that a terrain change request was rejected.
    TilePaintRejected {
        /// Cell named by the rejected request.
        cell: TileCoord,
        /// Terrain kind that was requested.
        tile: Tile,
        /// Specific reason the request failed.
        reason: PlacementError,
    },
    /// Confirms that a scenery item was placed.
    ItemPlaced {
        /// Cell now holding the item.
        cell: TileCoord,
        /// Item that was installed.
        item: Item,
    },
    /// Reports that an item placement request was rejected.
    ItemPlacementRejected {
        /// Cell named by the rejected request.
        cell: TileCoord,
        /// Item that was requested.
        item: Item,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Confirms that a tank entered the battle.
    TankSpawned {
        /// Identifier assigned to the tank by the world.
        tank: TankId,
        /// Cell the tank occupies after spawning.
        cell: TileCoord,
        /// Facing the tank spawned with.
        facing: Facing,
        /// Identity tag applied to the tank.
        color: TankColor,
    },
    /// Reports that a spawn request was rejected.
    TankSpawnRejected {
        /// Spawn parameters of the rejected request.
        seed: TankSeed,
        /// Specific reason the spawn failed.
        reason: SpawnError,
    },
    /// Confirms that a command entered a tank's brain queue.
    CommandQueued {
        /// Tank whose queue grew.
        tank: TankId,
        /// Command that was appended.
        command: Command,
    },
    /// Reports that a command was consumed without taking effect.
    CommandDiscarded {
        /// Tank the command was aimed at.
        tank: TankId,
        /// Command that was dropped.
        command: Command,
        /// Specific reason the command was dropped.
        reason: DiscardReason,
    },
    /// Confirms that a tank committed a move to a neighbouring cell.
    TankMoved {
        /// Tank that moved.
        tank: TankId,
        /// Cell the tank occupied before the move.
        from: TileCoord,
        /// Cell the tank occupies after the move.
        to: TileCoord,
    },
    /// Reports that a drive was aborted before any position change.
    MoveAborted {
        /// Tank whose drive stopped.
        tank: TankId,
        /// Cell the tank still occupies.
        from: TileCoord,
        /// Candidate cell that failed validation.
        toward: TileCoord,
        /// First collision reason that matched.
        reason: BlockReason,
    },
    /// Confirms that a tank finished rotating.
    TankTurned {
        /// Tank that rotated.
        tank: TankId,
        /// Facing the tank now points at.
        facing: Facing,
    },
    /// Confirms that a tank fired a bullet.
    BulletFired {
        /// Tank that fired.
        tank: TankId,
        /// Identifier assigned to the bullet by the world.
        bullet: BulletId,
        /// Muzzle point the bullet spawned at, in field units.
        position: FieldPoint,
        /// Flight direction of the bullet.
        facing: Facing,
    },
    /// Reports that a bullet left the battlefield without hitting anything.
    BulletExpired {
        /// Bullet that flew out of bounds.
        bullet: BulletId,
    },
    /// Confirms that a bullet destroyed a scenery item.
    ItemDestroyed {
        /// Cell the item occupied.
        cell: TileCoord,
        /// Item that was destroyed.
        item: Item,
    },
    /// Confirms that a tank was destroyed.
    TankDestroyed {
        /// Tank that died.
        tank: TankId,
        /// What destroyed it.
        cause: DestructionCause,
    },
    /// Reports that a tank's policy panicked and was permanently disabled.
    BrainFaulted {
        /// Tank whose policy faulted.
        tank: TankId,
    },
}

/// Collision reasons for an aborted drive, in validation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlockReason {
    /// The candidate cell holds a blocking tile or a blocking item.
    Obstructed,
    /// The candidate cell lies outside the battlefield.
    OffField,
    /// The candidate cell holds another tank.
    Occupied,
}

/// What ended a tank's life.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DestructionCause {
    /// A bullet fired by another tank connected.
    Shelled {
        /// Tank that fired the fatal bullet.
        by: TankId,
    },
    /// The tank drove onto a hazard tile.
    Drowned,
    /// The tank was destroyed by an explicit directive.
    Scuttled,
}

/// Reasons a queued or injected command was dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DiscardReason {
    /// A bullet fired by this tank is still flying.
    BulletAlreadyLive,
    /// The tank's brain was detached, so it accepts no commands.
    BrainDetached,
    /// The brain queue already holds its maximum number of commands.
    QueueSaturated,
    /// No tank with the provided identifier exists.
    UnknownTank,
}

/// Reasons a tile paint or item placement request may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlacementError {
    /// The named cell lies outside the battlefield.
    OutOfBounds,
    /// The named cell already holds an item.
    Occupied,
    /// The requested item kind is maintained by the world, not callers.
    ReservedKind,
}

/// Reasons a tank spawn request may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpawnError {
    /// The named cell lies outside the battlefield.
    OutOfBounds,
    /// The named cell already holds an item or another tank.
    Occupied,
    /// The named cell's terrain would block or destroy the tank.
    HostileTerrain,
}

/// Identity tag painted on a tank's hull.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TankColor {
    /// Red hull.
    Red,
    /// Blue hull.
    Blue,
    /// Green hull.
    Green,
    /// Yellow hull.
    Yellow,
}

impl TankColor {
    /// Lower-case human name used by reports.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Blue => "blue",
            Self::Green => "green",
            Self::Yellow => "yellow",
        }
    }
}

/// Discrete lifecycle states of a tank.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TankState {
    /// Waiting for the next command.
    Idle,
    /// Driving toward a neighbouring cell.
    Moving,
    /// Rotating toward a new facing.
    Turning,
    /// Spawning a bullet this very tick.
    Shooting,
    /// Destroyed. Dead tanks never act again.
    Dead,
}

/// The four cardinal facings a tank can point at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Facing {
    /// Toward decreasing row indices.
    Up,
    /// Toward increasing row indices.
    Down,
    /// Toward decreasing column indices.
    Left,
    /// Toward increasing column indices.
    Right,
}

impl Facing {
    /// Unit grid displacement covered by one drive along this facing.
    #[must_use]
    pub const fn vector(self) -> TileVector {
        match self {
            Self::Up => TileVector::new(0, -1),
            Self::Down => TileVector::new(0, 1),
            Self::Left => TileVector::new(-1, 0),
            Self::Right => TileVector::new(1, 0),
        }
    }

    /// Axis this facing travels along.
    #[must_use]
    pub const fn axis(self) -> Axis {
        match self {
            Self::Up | Self::Down => Axis::Vertical,
            Self::Left | Self::Right => Axis::Horizontal,
        }
    }

    /// Facing pointing the opposite way.
    #[must_use]
    pub const fn opposite(self) -> Facing {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// Classifies the rotation required to reach `to`.
    #[must_use]
    pub fn turn_toward(self, to: Facing) -> TurnArc {
        if self == to {
            TurnArc::None
        } else if self.opposite() == to {
            TurnArc::About
        } else {
            TurnArc::Quarter
        }
    }
}

/// Grid axes a facing can travel along.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Left/right travel across columns.
    Horizontal,
    /// Up/down travel across rows.
    Vertical,
}

/// Rotation magnitude between two facings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TurnArc {
    /// The facings already coincide.
    None,
    /// The facings sit on perpendicular axes.
    Quarter,
    /// The facings point opposite ways along one axis.
    About,
}

/// Terrain kinds a battlefield cell can carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tile {
    /// Ordinary drivable ground.
    Grass,
    /// Soft ground that slows driving and shakes the hull.
    Dirt,
    /// Packed ground, drivable at full speed.
    Plain,
    /// Hazard. A tank that drives onto water is destroyed.
    Water,
}

impl Tile {
    /// Whether driving across this terrain is slowed.
    #[must_use]
    pub const fn is_soft(self) -> bool {
        matches!(self, Self::Dirt)
    }

    /// Whether entering this terrain destroys a tank.
    #[must_use]
    pub const fn is_hazard(self) -> bool {
        matches!(self, Self::Water)
    }
}

/// Items occupying battlefield cells on top of the terrain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Item {
    /// Blocking scenery; destroyed by a bullet hit.
    Rock,
    /// Blocking scenery; destroyed by a bullet hit.
    Tree,
    /// Occupancy marker for the tank currently holding the cell.
    Tank(TankId),
}

impl Item {
    /// Whether this item stops a driving tank.
    #[must_use]
    pub const fn blocks_movement(self) -> bool {
        matches!(self, Self::Rock | Self::Tree)
    }

    /// Returns the marked tank when this item is an occupancy marker.
    #[must_use]
    pub const fn tank(self) -> Option<TankId> {
        match self {
            Self::Tank(tank) => Some(tank),
            Self::Rock | Self::Tree => None,
        }
    }
}

/// Unique identifier assigned to a tank.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TankId(u32);

impl TankId {
    /// Creates a new tank identifier with the provided numeric value.
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

/// Unique identifier assigned to a bullet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BulletId(u32);

impl BulletId {
    /// Creates a new bullet identifier with the provided numeric value.
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

/// Location of a single grid cell expressed as column and row coordinates.
///
/// Coordinates are signed so that candidate cells one step past an edge stay
/// representable; the battlefield itself occupies non-negative indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    column: i32,
    row: i32,
}

impl TileCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: i32, row: i32) -> Self {
        Self { column, row }
    }

    /// Column index of the cell.
    #[must_use]
    pub const fn column(&self) -> i32 {
        self.column
    }

    /// Row index of the cell.
    #[must_use]
    pub const fn row(&self) -> i32 {
        self.row
    }

    /// Cell reached by applying the provided displacement.
    #[must_use]
    pub const fn offset(self, vector: TileVector) -> TileCoord {
        Self {
            column: self.column + vector.dx,
            row: self.row + vector.dy,
        }
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: TileCoord) -> u32 {
        self.column.abs_diff(other.column) + self.row.abs_diff(other.row)
    }
}

/// Whole-cell displacement across the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileVector {
    dx: i32,
    dy: i32,
}

impl TileVector {
    /// Creates a new displacement from per-axis deltas.
    #[must_use]
    pub const fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }

    /// Column delta of the displacement.
    #[must_use]
    pub const fn dx(&self) -> i32 {
        self.dx
    }

    /// Row delta of the displacement.
    #[must_use]
    pub const fn dy(&self) -> i32 {
        self.dy
    }

    /// Displacement stretched by the provided factor.
    #[must_use]
    pub const fn scaled(self, factor: i32) -> TileVector {
        Self {
            dx: self.dx * factor,
            dy: self.dy * factor,
        }
    }
}

/// Size of a single battlefield tile measured in field units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TileExtent {
    width: f32,
    height: f32,
}

impl TileExtent {
    /// Creates a new tile extent from explicit dimensions.
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Horizontal size of a tile.
    #[must_use]
    pub const fn width(&self) -> f32 {
        self.width
    }

    /// Vertical size of a tile.
    #[must_use]
    pub const fn height(&self) -> f32 {
        self.height
    }

    /// Tile size along the provided axis.
    #[must_use]
    pub const fn along(&self, axis: Axis) -> f32 {
        match axis {
            Axis::Horizontal => self.width,
            Axis::Vertical => self.height,
        }
    }
}

/// Point in continuous battlefield space, measured in field units, y down.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldPoint {
    x: f32,
    y: f32,
}

impl FieldPoint {
    /// Creates a new field-space point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Horizontal component of the point.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// Vertical component of the point.
    #[must_use]
    pub const fn y(&self) -> f32 {
        self.y
    }

    /// Point reached by applying the provided displacement.
    #[must_use]
    pub fn translated(self, offset: FieldVec) -> FieldPoint {
        Self {
            x: self.x + offset.dx,
            y: self.y + offset.dy,
        }
    }
}

/// Displacement in continuous battlefield space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FieldVec {
    dx: f32,
    dy: f32,
}

impl FieldVec {
    /// Zero displacement.
    pub const ZERO: FieldVec = FieldVec::new(0.0, 0.0);

    /// Creates a new displacement from per-axis deltas.
    #[must_use]
    pub const fn new(dx: f32, dy: f32) -> Self {
        Self { dx, dy }
    }

    /// Horizontal component of the displacement.
    #[must_use]
    pub const fn dx(&self) -> f32 {
        self.dx
    }

    /// Vertical component of the displacement.
    #[must_use]
    pub const fn dy(&self) -> f32 {
        self.dy
    }

    /// Sum of two displacements.
    #[must_use]
    pub fn plus(self, other: FieldVec) -> FieldVec {
        Self {
            dx: self.dx + other.dx,
            dy: self.dy + other.dy,
        }
    }
}

/// Axis-aligned rectangle in continuous battlefield space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldRect {
    origin: FieldPoint,
    width: f32,
    height: f32,
}

impl FieldRect {
    /// Constructs a rectangle from its upper-left corner and size.
    #[must_use]
    pub const fn new(origin: FieldPoint, width: f32, height: f32) -> Self {
        Self {
            origin,
            width,
            height,
        }
    }

    /// Constructs a rectangle of the provided size centered on a point.
    #[must_use]
    pub fn centered_at(center: FieldPoint, width: f32, height: f32) -> Self {
        Self {
            origin: FieldPoint::new(center.x() - width * 0.5, center.y() - height * 0.5),
            width,
            height,
        }
    }

    /// Upper-left corner of the rectangle.
    #[must_use]
    pub const fn origin(&self) -> FieldPoint {
        self.origin
    }

    /// Horizontal size of the rectangle.
    #[must_use]
    pub const fn width(&self) -> f32 {
        self.width
    }

    /// Vertical size of the rectangle.
    #[must_use]
    pub const fn height(&self) -> f32 {
        self.height
    }

    /// Whether the provided point lies inside the rectangle.
    #[must_use]
    pub fn contains(&self, point: FieldPoint) -> bool {
        point.x() >= self.origin.x()
            && point.x() < self.origin.x() + self.width
            && point.y() >= self.origin.y()
            && point.y() < self.origin.y() + self.height
    }

    /// Whether two rectangles overlap.
    #[must_use]
    pub fn intersects(&self, other: &FieldRect) -> bool {
        self.origin.x() < other.origin.x() + other.width
            && other.origin.x() < self.origin.x() + self.width
            && self.origin.y() < other.origin.y() + other.height
            && other.origin.y() < self.origin.y() + self.height
    }
}

/// Spawn parameters for a new tank.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TankSeed {
    /// Cell the tank should occupy.
    pub cell: TileCoord,
    /// Facing the tank should spawn with.
    pub facing: Facing,
    /// Identity tag for the tank.
    pub color: TankColor,
}

/// Immutable representation of a single tank's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TankSnapshot {
    /// Unique identifier assigned to the tank.
    pub id: TankId,
    /// Grid cell currently committed for the tank.
    pub cell: TileCoord,
    /// Facing the tank currently points at.
    pub facing: Facing,
    /// Lifecycle state of the tank.
    pub state: TankState,
    /// Identity tag painted on the hull.
    pub color: TankColor,
    /// Number of bullets fired so far.
    pub shots: u32,
    /// Continuous offset of the hull from its cell origin, in field units.
    pub draw_offset: FieldVec,
    /// Whether a bullet fired by this tank is still flying.
    pub bullet_live: bool,
}

/// Read-only snapshot describing all tanks on the battlefield.
#[derive(Clone, Debug, Default)]
pub struct TankView {
    snapshots: Vec<TankSnapshot>,
}

impl TankView {
    /// Creates a new tank view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TankSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured tank snapshots in deterministic order.
    #[must_use]
    pub fn iter(&self) -> impl Iterator<Item = &TankSnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<TankSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single bullet's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BulletSnapshot {
    /// Unique identifier assigned to the bullet.
    pub id: BulletId,
    /// Tank that fired the bullet.
    pub owner: TankId,
    /// Flight direction of the bullet.
    pub facing: Facing,
    /// Current center of the bullet in field units.
    pub position: FieldPoint,
}

/// Read-only snapshot describing all bullets in flight.
#[derive(Clone, Debug, Default)]
pub struct BulletView {
    snapshots: Vec<BulletSnapshot>,
}

impl BulletView {
    /// Creates a new bullet view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<BulletSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured bullet snapshots in deterministic order.
    #[must_use]
    pub fn iter(&self) -> impl Iterator<Item = &BulletSnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<BulletSnapshot> {
        self.snapshots
    }
}

/// Read-only view into the battlefield's tile and item layers.
#[derive(Clone, Copy, Debug)]
pub struct FieldView<'a> {
    tiles: &'a [Tile],
    items: &'a [Option<Item>],
    columns: u32,
    rows: u32,
}

impl<'a> FieldView<'a> {
    /// Captures a new field view backed by the provided layer slices.
    #[must_use]
    pub fn new(tiles: &'a [Tile], items: &'a [Option<Item>], columns: u32, rows: u32) -> Self {
        Self {
            tiles,
            items,
            columns,
            rows,
        }
    }

    /// Probes a cell, returning its terrain and item.
    ///
    /// Off-field probes answer `(None, None)` rather than failing, so callers
    /// may sweep candidate cells without bounds checks of their own.
    #[must_use]
    pub fn radar(&self, cell: TileCoord) -> (Option<Tile>, Option<Item>) {
        (self.tile(cell), self.item(cell))
    }

    /// Terrain kind of the provided cell, when it lies on the field.
    #[must_use]
    pub fn tile(&self, cell: TileCoord) -> Option<Tile> {
        self.index(cell)
            .and_then(|index| self.tiles.get(index).copied())
    }

    /// Item occupying the provided cell, when it lies on the field.
    #[must_use]
    pub fn item(&self, cell: TileCoord) -> Option<Item> {
        self.index(cell)
            .and_then(|index| self.items.get(index).copied().flatten())
    }

    /// Whether the provided cell lies on the field.
    #[must_use]
    pub fn in_bounds(&self, cell: TileCoord) -> bool {
        self.index(cell).is_some()
    }

    /// Provides the dimensions of the underlying grid.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    fn index(&self, cell: TileCoord) -> Option<usize> {
        let column = u32::try_from(cell.column()).ok()?;
        let row = u32::try_from(cell.row()).ok()?;
        if column < self.columns && row < self.rows {
            let row = usize::try_from(row).ok()?;
            let column = usize::try_from(column).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}

/// Read-only picture of the battle handed to a policy while it thinks.
#[derive(Clone, Copy, Debug)]
pub struct Observation<'a> {
    tank: TankId,
    color: TankColor,
    cell: TileCoord,
    facing: Facing,
    shots: u32,
    opponents: &'a [TankSnapshot],
    field: FieldView<'a>,
}

impl<'a> Observation<'a> {
    /// Assembles an observation for one tank.
    #[must_use]
    pub fn new(
        tank: TankId,
        color: TankColor,
        cell: TileCoord,
        facing: Facing,
        shots: u32,
        opponents: &'a [TankSnapshot],
        field: FieldView<'a>,
    ) -> Self {
        Self {
            tank,
            color,
            cell,
            facing,
            shots,
            opponents,
            field,
        }
    }

    /// Identifier of the observing tank.
    #[must_use]
    pub const fn tank(&self) -> TankId {
        self.tank
    }

    /// Identity tag of the observing tank.
    #[must_use]
    pub const fn color(&self) -> TankColor {
        self.color
    }

    /// Cell the observing tank currently occupies.
    #[must_use]
    pub const fn cell(&self) -> TileCoord {
        self.cell
    }

    /// Facing the observing tank currently points at.
    #[must_use]
    pub const fn facing(&self) -> Facing {
        self.facing
    }

    /// Number of bullets the observing tank fired so far.
    #[must_use]
    pub const fn shots(&self) -> u32 {
        self.shots
    }

    /// Snapshots of every other tank, dead ones included.
    #[must_use]
    pub const fn opponents(&self) -> &'a [TankSnapshot] {
        self.opponents
    }

    /// View into the battlefield layers.
    #[must_use]
    pub const fn field(&self) -> FieldView<'a> {
        self.field
    }

    /// Probes a cell through the battlefield radar.
    #[must_use]
    pub fn radar(&self, cell: TileCoord) -> (Option<Tile>, Option<Item>) {
        self.field.radar(cell)
    }

    /// Cell directly ahead of the observing tank.
    #[must_use]
    pub fn cell_ahead(&self) -> TileCoord {
        self.cell.offset(self.facing.vector())
    }
}

/// Bounded FIFO of pending tank commands.
///
/// The queue holds at most [`COMMAND_QUEUE_CAPACITY`] commands; appenders
/// silently drop commands beyond that, keeping per-tick work bounded no matter
/// how eager a policy is.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CommandQueue {
    commands: VecDeque<Command>,
}

impl CommandQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            commands: VecDeque::new(),
        }
    }

    /// Appends a command, reporting whether it was accepted.
    pub fn push(&mut self, command: Command) -> bool {
        if self.commands.len() >= COMMAND_QUEUE_CAPACITY {
            return false;
        }
        self.commands.push_back(command);
        true
    }

    /// Removes and returns the oldest pending command.
    pub fn pop(&mut self) -> Option<Command> {
        self.commands.pop_front()
    }

    /// Iterator over pending commands, oldest first.
    #[must_use]
    pub fn memory(&self) -> impl Iterator<Item = Command> + '_ {
        self.commands.iter().copied()
    }

    /// Whether the provided command is already pending.
    #[must_use]
    pub fn contains(&self, command: Command) -> bool {
        self.commands.contains(&command)
    }

    /// Number of pending commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether no commands are pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Drops every pending command.
    pub fn forget(&mut self) {
        self.commands.clear();
    }

    /// Appends a drive ahead.
    pub fn forward(&mut self) {
        let _accepted = self.push(Command::Forward);
    }

    /// Appends a drive astern.
    pub fn backward(&mut self) {
        let _accepted = self.push(Command::Backward);
    }

    /// Appends a shot.
    pub fn shoot(&mut self) {
        let _accepted = self.push(Command::Shoot);
    }

    /// Appends a rotation toward the provided facing.
    pub fn face(&mut self, facing: Facing) {
        let _accepted = self.push(Command::Face(facing));
    }
}

/// A pluggable tank decision policy.
///
/// The world runs `think` at most once per tick, only while the owning tank is
/// idle and its brain is attached. A policy owns whatever state it needs
/// (counters, seeded random sources) and communicates exclusively by mutating
/// the provided queue; the observation is a read-only snapshot.
pub trait Policy: fmt::Debug {
    /// Reads the battle and queues any commands the tank should run next.
    fn think(&mut self, observation: &Observation<'_>, queue: &mut CommandQueue);
}

#[cfg(test)]
mod tests {
    use super::{
        Command, CommandQueue, Directive, Facing, FieldPoint, FieldRect, FieldView, Item,
        TankColor, TankId, TankSeed, Tile, TileCoord, TileExtent, TileVector, TurnArc,
        COMMAND_QUEUE_CAPACITY,
    };
    use serde::{de::DeserializeOwned, Serialize};
    use std::time::Duration;

    #[test]
    fn manhattan_distance_matches_expectation() {
        let origin = TileCoord::new(1, 1);
        let destination = TileCoord::new(4, 3);
        assert_eq!(origin.manhattan_distance(destination), 5);
        assert_eq!(destination.manhattan_distance(origin), 5);
        assert_eq!(TileCoord::new(-2, 0).manhattan_distance(origin), 4);
    }

    #[test]
    fn facing_vectors_step_one_cell() {
        for facing in [Facing::Up, Facing::Down, Facing::Left, Facing::Right] {
            let vector = facing.vector();
            assert_eq!(vector.dx().abs() + vector.dy().abs(), 1);
        }
        assert_eq!(Facing::Up.vector(), TileVector::new(0, -1));
        assert_eq!(Facing::Right.vector(), TileVector::new(1, 0));
    }

    #[test]
    fn turn_arc_classifies_rotations() {
        assert_eq!(Facing::Up.turn_toward(Facing::Up), TurnArc::None);
        assert_eq!(Facing::Up.turn_toward(Facing::Down), TurnArc::About);
        assert_eq!(Facing::Up.turn_toward(Facing::Left), TurnArc::Quarter);
        assert_eq!(Facing::Left.turn_toward(Facing::Right), TurnArc::About);
        assert_eq!(Facing::Right.turn_toward(Facing::Down), TurnArc::Quarter);
    }

    #[test]
    fn blocking_items_exclude_tank_markers() {
        assert!(Item::Rock.blocks_movement());
        assert!(Item::Tree.blocks_movement());
        assert!(!Item::Tank(TankId::new(1)).blocks_movement());
        assert_eq!(Item::Tank(TankId::new(1)).tank(), Some(TankId::new(1)));
    }

    #[test]
    fn command_queue_preserves_fifo_order() {
        let mut queue = CommandQueue::new();
        queue.face(Facing::Left);
        queue.forward();
        queue.shoot();
        assert_eq!(queue.pop(), Some(Command::Face(Facing::Left)));
        assert_eq!(queue.pop(), Some(Command::Forward));
        assert_eq!(queue.pop(), Some(Command::Shoot));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn command_queue_forget_empties_memory() {
        let mut queue = CommandQueue::new();
        queue.forward();
        queue.backward();
        assert_eq!(queue.len(), 2);
        assert!(queue.contains(Command::Backward));
        queue.forget();
        assert!(queue.is_empty());
        assert_eq!(queue.memory().count(), 0);
    }

    #[test]
    fn command_queue_drops_pushes_beyond_capacity() {
        let mut queue = CommandQueue::new();
        for _ in 0..COMMAND_QUEUE_CAPACITY {
            assert!(queue.push(Command::Forward));
        }
        assert!(!queue.push(Command::Shoot));
        queue.shoot();
        assert_eq!(queue.len(), COMMAND_QUEUE_CAPACITY);
        assert!(!queue.contains(Command::Shoot));
    }

    #[test]
    fn field_view_radar_answers_none_off_field() {
        let tiles = vec![Tile::Grass, Tile::Dirt, Tile::Water, Tile::Plain];
        let items = vec![None, Some(Item::Rock), None, None];
        let view = FieldView::new(&tiles, &items, 2, 2);
        assert_eq!(
            view.radar(TileCoord::new(1, 0)),
            (Some(Tile::Dirt), Some(Item::Rock))
        );
        assert_eq!(view.radar(TileCoord::new(0, 1)), (Some(Tile::Water), None));
        assert_eq!(view.radar(TileCoord::new(-1, 0)), (None, None));
        assert_eq!(view.radar(TileCoord::new(0, 2)), (None, None));
        assert!(!view.in_bounds(TileCoord::new(2, 0)));
    }

    #[test]
    fn field_rects_detect_overlap() {
        let left = FieldRect::new(FieldPoint::new(0.0, 0.0), 32.0, 32.0);
        let touching = FieldRect::new(FieldPoint::new(32.0, 0.0), 32.0, 32.0);
        let overlapping = FieldRect::new(FieldPoint::new(16.0, 16.0), 32.0, 32.0);
        assert!(!left.intersects(&touching));
        assert!(left.intersects(&overlapping));
        let centered = FieldRect::centered_at(FieldPoint::new(16.0, 16.0), 8.0, 8.0);
        assert!(centered.contains(FieldPoint::new(16.0, 16.0)));
        assert!(!centered.contains(FieldPoint::new(20.5, 16.0)));
    }

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn command_round_trips_through_bincode() {
        assert_round_trip(&Command::Face(Facing::Down));
        assert_round_trip(&Command::Shoot);
    }

    #[test]
    fn directives_round_trip_through_bincode() {
        assert_round_trip(&Directive::Tick {
            dt: Duration::from_millis(100),
        });
        assert_round_trip(&Directive::SpawnTank {
            seed: TankSeed {
                cell: TileCoord::new(5, 5),
                facing: Facing::Right,
                color: TankColor::Red,
            },
        });
        assert_round_trip(&Directive::PlaceItem {
            cell: TileCoord::new(3, 1),
            item: Item::Tree,
        });
        assert_round_trip(&Directive::ConfigureBattlefield {
            columns: 20,
            rows: 14,
            tile_extent: TileExtent::new(32.0, 32.0),
            terrain_seed: 7,
            blocking_tiles: vec![Tile::Water],
        });
    }

    #[test]
    fn tank_id_round_trips_through_bincode() {
        assert_round_trip(&TankId::new(42));
    }
}
