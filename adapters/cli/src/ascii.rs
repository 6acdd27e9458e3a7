//! Glyph-grid presenter for terminal battles.

use std::io::Write;

use anyhow::{Context, Result};
use glam::Vec2;
use tank_clash_core::{TankColor, Tile};
use tank_clash_rendering::{Scene, ScenePresenter, SceneryKind, TankSprite};

/// Presents each scene as one glyph per cell, layered the way the scene is:
/// terrain below scenery below tanks below bullets.
///
/// Tanks render as their color initial, lower-case for wrecks; bullets render
/// as `*`. Sprites whose continuous position strays into a neighbouring cell
/// render there, so a driving hull visibly crosses the border.
#[derive(Debug)]
pub(crate) struct AsciiPresenter<W> {
    out: W,
}

impl<W: Write> AsciiPresenter<W> {
    pub(crate) const fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> ScenePresenter for AsciiPresenter<W> {
    fn present(&mut self, scene: &Scene) -> Result<()> {
        let columns = scene.field.columns as usize;
        let rows = scene.field.rows as usize;
        let mut glyphs = vec![b' '; columns * rows];

        for sprite in &scene.terrain {
            if let Some(slot) = slot_index(columns, rows, sprite.cell.column(), sprite.cell.row())
            {
                glyphs[slot] = tile_glyph(sprite.tile);
            }
        }
        for sprite in &scene.scenery {
            if let Some(slot) = slot_index(columns, rows, sprite.cell.column(), sprite.cell.row())
            {
                glyphs[slot] = scenery_glyph(sprite.kind);
            }
        }
        for sprite in &scene.tanks {
            let cell = scene
                .field
                .cell_at(hull_center(scene, sprite))
                .unwrap_or(sprite.cell);
            if let Some(slot) = slot_index(columns, rows, cell.column(), cell.row()) {
                glyphs[slot] = tank_glyph(sprite.color, sprite.wreck);
            }
        }
        for sprite in &scene.bullets {
            if let Some(cell) = scene.field.cell_at(sprite.position) {
                if let Some(slot) = slot_index(columns, rows, cell.column(), cell.row()) {
                    glyphs[slot] = b'*';
                }
            }
        }

        let border = format!("+{}+", "-".repeat(columns));
        writeln!(self.out, "{border}").context("failed to write field border")?;
        for row in 0..rows {
            let line = &glyphs[row * columns..(row + 1) * columns];
            let text = std::str::from_utf8(line).context("glyph row is not ascii")?;
            writeln!(self.out, "|{text}|").context("failed to write field row")?;
        }
        writeln!(self.out, "{border}").context("failed to write field border")?;
        Ok(())
    }
}

/// Center of a tank hull in field units, draw offset included.
fn hull_center(scene: &Scene, sprite: &TankSprite) -> Vec2 {
    sprite.position
        + Vec2::new(
            scene.field.tile_extent.width() * 0.5,
            scene.field.tile_extent.height() * 0.5,
        )
}

fn slot_index(columns: usize, rows: usize, column: i32, row: i32) -> Option<usize> {
    if column < 0 || row < 0 {
        return None;
    }
    let (column, row) = (column as usize, row as usize);
    if column >= columns || row >= rows {
        return None;
    }
    Some(row * columns + column)
}

const fn tile_glyph(tile: Tile) -> u8 {
    match tile {
        Tile::Grass => b'.',
        Tile::Dirt => b':',
        Tile::Plain => b',',
        Tile::Water => b'~',
    }
}

const fn scenery_glyph(kind: SceneryKind) -> u8 {
    match kind {
        SceneryKind::Rock => b'o',
        SceneryKind::Tree => b'T',
    }
}

const fn tank_glyph(color: TankColor, wreck: bool) -> u8 {
    let glyph = match color {
        TankColor::Red => b'R',
        TankColor::Blue => b'B',
        TankColor::Green => b'G',
        TankColor::Yellow => b'Y',
    };
    if wreck {
        glyph.to_ascii_lowercase()
    } else {
        glyph
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tank_clash_core::{
        BulletId, BulletSnapshot, BulletView, Facing, FieldPoint, FieldVec, FieldView, Item,
        TankId, TankSnapshot, TankState, TankView, TileCoord, TileExtent,
    };
    use tank_clash_rendering::Scene;

    #[test]
    fn scenes_render_as_bordered_glyph_grids() {
        let tiles = vec![
            Tile::Grass,
            Tile::Dirt,
            Tile::Water,
            Tile::Grass,
            Tile::Plain,
            Tile::Grass,
        ];
        let items = vec![None, None, None, Some(Item::Rock), None, None];
        let field = FieldView::new(&tiles, &items, 3, 2);
        let tanks = TankView::from_snapshots(vec![
            TankSnapshot {
                id: TankId::new(0),
                cell: TileCoord::new(1, 1),
                facing: Facing::Right,
                state: TankState::Idle,
                color: TankColor::Red,
                shots: 0,
                draw_offset: FieldVec::ZERO,
                bullet_live: false,
            },
            TankSnapshot {
                id: TankId::new(1),
                cell: TileCoord::new(2, 1),
                facing: Facing::Left,
                state: TankState::Dead,
                color: TankColor::Blue,
                shots: 2,
                draw_offset: FieldVec::ZERO,
                bullet_live: false,
            },
        ]);
        let bullets = BulletView::from_snapshots(vec![BulletSnapshot {
            id: BulletId::new(0),
            owner: TankId::new(1),
            facing: Facing::Up,
            position: FieldPoint::new(80.0, 16.0),
        }]);
        let scene = Scene::compose(field, TileExtent::new(32.0, 32.0), &tanks, &bullets)
            .expect("valid tile extents");

        let mut buffer = Vec::new();
        AsciiPresenter::new(&mut buffer)
            .present(&scene)
            .expect("writing into a vec never fails");

        let text = String::from_utf8(buffer).expect("ascii output");
        assert_eq!(text, "+---+\n|.:*|\n|oRb|\n+---+\n");
    }

    #[test]
    fn a_driving_hull_renders_in_the_cell_it_mostly_covers() {
        let tiles = vec![Tile::Grass, Tile::Grass];
        let items = vec![None, None];
        let field = FieldView::new(&tiles, &items, 2, 1);
        let tanks = TankView::from_snapshots(vec![TankSnapshot {
            id: TankId::new(0),
            cell: TileCoord::new(0, 0),
            facing: Facing::Right,
            state: TankState::Moving,
            color: TankColor::Green,
            shots: 0,
            draw_offset: FieldVec::new(20.0, 0.0),
            bullet_live: false,
        }]);
        let scene = Scene::compose(
            field,
            TileExtent::new(32.0, 32.0),
            &tanks,
            &BulletView::default(),
        )
        .expect("valid tile extents");

        let mut buffer = Vec::new();
        AsciiPresenter::new(&mut buffer)
            .present(&scene)
            .expect("writing into a vec never fails");

        let text = String::from_utf8(buffer).expect("ascii output");
        assert_eq!(text, "+--+\n|.G|\n+--+\n");
    }
}
