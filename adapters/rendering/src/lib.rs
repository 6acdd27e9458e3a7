#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Tank Clash adapters.
//!
//! The world is queried for read-only views, [`Scene::compose`] folds those
//! views into layered sprite lists, and a [`ScenePresenter`] turns each scene
//! into pixels, glyphs, or recorded frames. Composition is deterministic:
//! sprites appear in draw order (terrain below scenery below tanks below
//! bullets) and each layer is sorted by cell or identifier, so two identical
//! battles always produce byte-identical scenes.

use anyhow::Result as AnyResult;
use glam::Vec2;
use tank_clash_core::{
    BulletId, BulletView, Facing, FieldView, Item, TankColor, TankId, TankState, TankView, Tile,
    TileCoord, TileExtent,
};
use std::{error::Error, fmt};

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Returns a new color lightened towards white by the provided amount.
    #[must_use]
    pub fn lighten(self, amount: f32) -> Self {
        let amount = amount.clamp(0.0, 1.0);

        Self {
            red: lighten_channel(self.red, amount),
            green: lighten_channel(self.green, amount),
            blue: lighten_channel(self.blue, amount),
            alpha: self.alpha,
        }
    }
}

fn lighten_channel(channel: f32, amount: f32) -> f32 {
    channel + (1.0 - channel) * amount
}

/// Describes the battlefield grid that frames every other scene layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldPresentation {
    /// Number of tile columns laid out on the field.
    pub columns: u32,
    /// Number of tile rows laid out on the field.
    pub rows: u32,
    /// Size of a single tile expressed in field units.
    pub tile_extent: TileExtent,
    /// Color used when drawing grid lines between tiles.
    pub line_color: Color,
}

impl FieldPresentation {
    /// Creates a new field descriptor.
    ///
    /// Returns an error when either tile dimension is not positive.
    pub fn new(
        columns: u32,
        rows: u32,
        tile_extent: TileExtent,
        line_color: Color,
    ) -> std::result::Result<Self, RenderingError> {
        if tile_extent.width() <= 0.0 || tile_extent.height() <= 0.0 {
            return Err(RenderingError::InvalidTileExtent {
                width: tile_extent.width(),
                height: tile_extent.height(),
            });
        }

        Ok(Self {
            columns,
            rows,
            tile_extent,
            line_color,
        })
    }

    /// Calculates the total width of the field in field units.
    #[must_use]
    pub const fn width(&self) -> f32 {
        self.columns as f32 * self.tile_extent.width()
    }

    /// Calculates the total height of the field in field units.
    #[must_use]
    pub const fn height(&self) -> f32 {
        self.rows as f32 * self.tile_extent.height()
    }

    /// Upper-left corner of the provided cell in field units.
    #[must_use]
    pub fn cell_origin(&self, cell: TileCoord) -> Vec2 {
        Vec2::new(
            cell.column() as f32 * self.tile_extent.width(),
            cell.row() as f32 * self.tile_extent.height(),
        )
    }

    /// Center point of the provided cell in field units.
    #[must_use]
    pub fn cell_center(&self, cell: TileCoord) -> Vec2 {
        self.cell_origin(cell)
            + Vec2::new(
                self.tile_extent.width() * 0.5,
                self.tile_extent.height() * 0.5,
            )
    }

    /// Maps a field-space position back to the cell that contains it.
    ///
    /// Returns `None` when the position lies outside the field.
    #[must_use]
    pub fn cell_at(&self, position: Vec2) -> Option<TileCoord> {
        if position.x < 0.0 || position.y < 0.0 {
            return None;
        }

        let column = (position.x / self.tile_extent.width()).floor();
        let row = (position.y / self.tile_extent.height()).floor();
        if column >= self.columns as f32 || row >= self.rows as f32 {
            return None;
        }

        Some(TileCoord::new(column as i32, row as i32))
    }
}

/// Single terrain cell rendered at the bottom of the scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TerrainSprite {
    /// Cell the terrain occupies.
    pub cell: TileCoord,
    /// Terrain kind painted onto the cell.
    pub tile: Tile,
}

impl TerrainSprite {
    /// Creates a new terrain sprite descriptor.
    #[must_use]
    pub const fn new(cell: TileCoord, tile: Tile) -> Self {
        Self { cell, tile }
    }
}

/// Scenery kinds that appear in composed scenes.
///
/// Tank occupancy markers never surface here; tanks are presented through
/// their own layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SceneryKind {
    /// A boulder blocking the cell.
    Rock,
    /// A tree blocking the cell.
    Tree,
}

impl SceneryKind {
    /// Translates a battlefield item into its scenery kind, if it has one.
    #[must_use]
    pub const fn from_item(item: Item) -> Option<Self> {
        match item {
            Item::Rock => Some(Self::Rock),
            Item::Tree => Some(Self::Tree),
            Item::Tank(_) => None,
        }
    }
}

/// Single scenery item rendered above the terrain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ScenerySprite {
    /// Cell the scenery occupies.
    pub cell: TileCoord,
    /// Kind of scenery standing in the cell.
    pub kind: SceneryKind,
}

impl ScenerySprite {
    /// Creates a new scenery sprite descriptor.
    #[must_use]
    pub const fn new(cell: TileCoord, kind: SceneryKind) -> Self {
        Self { cell, kind }
    }
}

/// Single tank rendered above the scenery.
///
/// The position carries the hull's continuous draw offset, so a driving tank
/// appears between its committed cell and the one it is entering.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TankSprite {
    /// Identifier allocated to the tank by the world.
    pub id: TankId,
    /// Cell currently committed for the tank.
    pub cell: TileCoord,
    /// Upper-left corner of the hull in field units, draw offset included.
    pub position: Vec2,
    /// Facing the hull points at.
    pub facing: Facing,
    /// Identity tag painted on the hull.
    pub color: TankColor,
    /// Whether the tank is destroyed and should be drawn as a wreck.
    pub wreck: bool,
}

impl TankSprite {
    /// Creates a new tank sprite descriptor.
    #[must_use]
    pub const fn new(
        id: TankId,
        cell: TileCoord,
        position: Vec2,
        facing: Facing,
        color: TankColor,
        wreck: bool,
    ) -> Self {
        Self {
            id,
            cell,
            position,
            facing,
            color,
            wreck,
        }
    }
}

/// Single bullet rendered above every other layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BulletSprite {
    /// Identifier allocated to the bullet by the world.
    pub id: BulletId,
    /// Tank that fired the bullet.
    pub owner: TankId,
    /// Center of the bullet in field units.
    pub position: Vec2,
    /// Flight direction of the bullet.
    pub facing: Facing,
}

impl BulletSprite {
    /// Creates a new bullet sprite descriptor.
    #[must_use]
    pub const fn new(id: BulletId, owner: TankId, position: Vec2, facing: Facing) -> Self {
        Self {
            id,
            owner,
            position,
            facing,
        }
    }
}

/// Scene description combining the battlefield grid and its inhabitants.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Grid that frames the battle.
    pub field: FieldPresentation,
    /// Terrain cells in row-major order.
    pub terrain: Vec<TerrainSprite>,
    /// Scenery items in row-major order.
    pub scenery: Vec<ScenerySprite>,
    /// Tanks in ascending identifier order, wrecks included.
    pub tanks: Vec<TankSprite>,
    /// Bullets in ascending identifier order.
    pub bullets: Vec<BulletSprite>,
}

impl Scene {
    /// Folds world views into a layered scene.
    ///
    /// Returns an error when the tile extent cannot frame a drawable grid.
    pub fn compose(
        field: FieldView<'_>,
        tile_extent: TileExtent,
        tanks: &TankView,
        bullets: &BulletView,
    ) -> std::result::Result<Self, RenderingError> {
        let (columns, rows) = field.dimensions();
        let presentation = FieldPresentation::new(columns, rows, tile_extent, palette::GRID_LINE)?;

        let mut terrain = Vec::with_capacity(columns as usize * rows as usize);
        let mut scenery = Vec::new();
        for row in 0..rows {
            for column in 0..columns {
                let cell = TileCoord::new(column as i32, row as i32);
                if let Some(tile) = field.tile(cell) {
                    terrain.push(TerrainSprite::new(cell, tile));
                }
                if let Some(kind) = field.item(cell).and_then(SceneryKind::from_item) {
                    scenery.push(ScenerySprite::new(cell, kind));
                }
            }
        }

        let tanks = tanks
            .iter()
            .map(|snapshot| {
                let offset = Vec2::new(snapshot.draw_offset.dx(), snapshot.draw_offset.dy());
                TankSprite::new(
                    snapshot.id,
                    snapshot.cell,
                    presentation.cell_origin(snapshot.cell) + offset,
                    snapshot.facing,
                    snapshot.color,
                    snapshot.state == TankState::Dead,
                )
            })
            .collect();

        let bullets = bullets
            .iter()
            .map(|snapshot| {
                BulletSprite::new(
                    snapshot.id,
                    snapshot.owner,
                    Vec2::new(snapshot.position.x(), snapshot.position.y()),
                    snapshot.facing,
                )
            })
            .collect();

        Ok(Self {
            field: presentation,
            terrain,
            scenery,
            tanks,
            bullets,
        })
    }
}

/// Sink that turns composed scenes into output.
///
/// Implementations may draw into a window, print glyph grids to a console, or
/// record frames for assertions. Presenting is fallible so backends can
/// surface I/O failures to their callers.
pub trait ScenePresenter {
    /// Presents a single composed scene.
    fn present(&mut self, scene: &Scene) -> AnyResult<()>;
}

/// Colors shared by Tank Clash presentation backends.
pub mod palette {
    use super::{Color, SceneryKind};
    use tank_clash_core::{TankColor, Tile};

    /// Solid color used to clear each frame outside the battlefield.
    pub const CLEAR: Color = Color::from_rgb_u8(24, 24, 28);

    /// Color used when drawing grid lines between tiles.
    pub const GRID_LINE: Color = Color::from_rgb_u8(52, 56, 60);

    /// Hull color shared by every wreck.
    pub const WRECK_HULL: Color = Color::from_rgb_u8(90, 86, 82);

    /// Fill color for a terrain kind.
    #[must_use]
    pub const fn tile_color(tile: Tile) -> Color {
        match tile {
            Tile::Grass => Color::from_rgb_u8(88, 129, 87),
            Tile::Dirt => Color::from_rgb_u8(146, 116, 91),
            Tile::Plain => Color::from_rgb_u8(167, 169, 140),
            Tile::Water => Color::from_rgb_u8(58, 94, 148),
        }
    }

    /// Fill color for a scenery kind.
    #[must_use]
    pub const fn scenery_color(kind: SceneryKind) -> Color {
        match kind {
            SceneryKind::Rock => Color::from_rgb_u8(120, 120, 124),
            SceneryKind::Tree => Color::from_rgb_u8(48, 90, 48),
        }
    }

    /// Hull fill for a live tank of the provided identity.
    #[must_use]
    pub const fn hull_color(color: TankColor) -> Color {
        match color {
            TankColor::Red => Color::from_rgb_u8(188, 63, 60),
            TankColor::Blue => Color::from_rgb_u8(64, 106, 190),
            TankColor::Green => Color::from_rgb_u8(72, 146, 80),
            TankColor::Yellow => Color::from_rgb_u8(196, 168, 62),
        }
    }

    /// Barrel fill for a live tank, lifted above the hull tone.
    #[must_use]
    pub fn barrel_color(color: TankColor) -> Color {
        hull_color(color).lighten(0.35)
    }
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Debug, PartialEq)]
pub enum RenderingError {
    /// Tile dimensions must be positive to frame a drawable grid.
    InvalidTileExtent {
        /// Horizontal tile size that failed validation.
        width: f32,
        /// Vertical tile size that failed validation.
        height: f32,
    },
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTileExtent { width, height } => {
                write!(
                    f,
                    "tile extents must be positive (received {width}x{height})"
                )
            }
        }
    }
}

impl Error for RenderingError {}

#[cfg(test)]
mod tests {
    use super::*;
    use tank_clash_core::{BulletSnapshot, FieldPoint, FieldVec, TankSnapshot};

    fn extent() -> TileExtent {
        TileExtent::new(32.0, 32.0)
    }

    fn presentation(columns: u32, rows: u32) -> FieldPresentation {
        FieldPresentation::new(columns, rows, extent(), palette::GRID_LINE)
            .expect("positive tile extents should succeed")
    }

    #[test]
    fn field_presentation_accepts_positive_tile_extents() {
        let field = presentation(20, 14);

        assert_eq!(field.width(), 640.0);
        assert_eq!(field.height(), 448.0);
    }

    #[test]
    fn field_presentation_rejects_degenerate_tile_extents() {
        let error = FieldPresentation::new(20, 14, TileExtent::new(0.0, 32.0), palette::GRID_LINE)
            .expect_err("zero tile width must be rejected");

        assert!(matches!(
            error,
            RenderingError::InvalidTileExtent { width, .. } if width == 0.0
        ));
    }

    #[test]
    fn cell_origins_and_centers_scale_with_the_tile_extent() {
        let field = presentation(6, 4);

        assert_eq!(
            field.cell_origin(TileCoord::new(2, 3)),
            Vec2::new(64.0, 96.0)
        );
        assert_eq!(
            field.cell_center(TileCoord::new(0, 0)),
            Vec2::new(16.0, 16.0)
        );
    }

    #[test]
    fn positions_map_back_to_their_cells() {
        let field = presentation(6, 4);

        assert_eq!(
            field.cell_at(Vec2::new(33.0, 10.0)),
            Some(TileCoord::new(1, 0))
        );
        assert_eq!(field.cell_at(Vec2::new(-1.0, 10.0)), None);
        assert_eq!(field.cell_at(Vec2::new(10.0, 400.0)), None);
    }

    #[test]
    fn compose_layers_terrain_scenery_tanks_and_bullets() {
        let tiles = vec![Tile::Grass, Tile::Dirt, Tile::Water, Tile::Plain];
        let items = vec![
            None,
            Some(Item::Rock),
            Some(Item::Tank(TankId::new(7))),
            None,
        ];
        let field = FieldView::new(&tiles, &items, 2, 2);
        let tanks = TankView::from_snapshots(vec![
            TankSnapshot {
                id: TankId::new(9),
                cell: TileCoord::new(1, 1),
                facing: Facing::Left,
                state: TankState::Moving,
                color: TankColor::Blue,
                shots: 0,
                draw_offset: FieldVec::new(-12.0, 0.0),
                bullet_live: false,
            },
            TankSnapshot {
                id: TankId::new(7),
                cell: TileCoord::new(0, 1),
                facing: Facing::Up,
                state: TankState::Dead,
                color: TankColor::Red,
                shots: 3,
                draw_offset: FieldVec::ZERO,
                bullet_live: false,
            },
        ]);
        let bullets = BulletView::from_snapshots(vec![BulletSnapshot {
            id: BulletId::new(2),
            owner: TankId::new(9),
            facing: Facing::Up,
            position: FieldPoint::new(48.0, 12.0),
        }]);

        let scene = Scene::compose(field, extent(), &tanks, &bullets).expect("valid tile extents");

        assert_eq!(
            scene.terrain,
            vec![
                TerrainSprite::new(TileCoord::new(0, 0), Tile::Grass),
                TerrainSprite::new(TileCoord::new(1, 0), Tile::Dirt),
                TerrainSprite::new(TileCoord::new(0, 1), Tile::Water),
                TerrainSprite::new(TileCoord::new(1, 1), Tile::Plain),
            ]
        );
        assert_eq!(
            scene.scenery,
            vec![ScenerySprite::new(TileCoord::new(1, 0), SceneryKind::Rock)]
        );
        let ids: Vec<_> = scene.tanks.iter().map(|tank| tank.id).collect();
        assert_eq!(ids, vec![TankId::new(7), TankId::new(9)]);
        assert!(scene.tanks[0].wreck);
        assert!(!scene.tanks[1].wreck);
        assert_eq!(scene.tanks[1].position, Vec2::new(20.0, 32.0));
        assert_eq!(scene.bullets.len(), 1);
        assert_eq!(scene.bullets[0].position, Vec2::new(48.0, 12.0));
        assert_eq!(
            scene.field.cell_at(scene.bullets[0].position),
            Some(TileCoord::new(1, 0))
        );
    }

    #[test]
    fn compose_rejects_degenerate_tile_extents() {
        let tiles = vec![Tile::Grass];
        let items = vec![None];
        let field = FieldView::new(&tiles, &items, 1, 1);

        let error = Scene::compose(
            field,
            TileExtent::new(32.0, -1.0),
            &TankView::default(),
            &BulletView::default(),
        )
        .expect_err("negative tile height must be rejected");

        assert!(matches!(error, RenderingError::InvalidTileExtent { .. }));
    }

    #[test]
    fn barrels_render_lighter_than_hulls() {
        for color in [
            TankColor::Red,
            TankColor::Blue,
            TankColor::Green,
            TankColor::Yellow,
        ] {
            let hull = palette::hull_color(color);
            let barrel = palette::barrel_color(color);
            assert!(barrel.red >= hull.red);
            assert!(barrel.green >= hull.green);
            assert!(barrel.blue >= hull.blue);
            assert_ne!(barrel, hull);
            assert_eq!(barrel.alpha, hull.alpha);
        }
    }

    #[test]
    fn scenery_kinds_translate_only_real_scenery() {
        assert_eq!(SceneryKind::from_item(Item::Rock), Some(SceneryKind::Rock));
        assert_eq!(SceneryKind::from_item(Item::Tree), Some(SceneryKind::Tree));
        assert_eq!(SceneryKind::from_item(Item::Tank(TankId::new(1))), None);
    }

    #[test]
    fn presenters_receive_each_composed_scene() {
        struct Recorder {
            frames: Vec<Scene>,
        }

        impl ScenePresenter for Recorder {
            fn present(&mut self, scene: &Scene) -> AnyResult<()> {
                self.frames.push(scene.clone());
                Ok(())
            }
        }

        let tiles = vec![Tile::Grass];
        let items = vec![None];
        let field = FieldView::new(&tiles, &items, 1, 1);
        let scene = Scene::compose(field, extent(), &TankView::default(), &BulletView::default())
            .expect("valid tile extents");

        let mut recorder = Recorder { frames: Vec::new() };
        recorder.present(&scene).expect("recording never fails");
        recorder.present(&scene).expect("recording never fails");

        assert_eq!(recorder.frames.len(), 2);
        assert_eq!(recorder.frames[0], scene);
    }
}
