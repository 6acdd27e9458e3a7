//! Terrain and item layers backing the battle grid.
//!
//! The battlefield stores one terrain tile and at most one item per cell.
//! Items cover both placed scenery (rocks, trees) and the occupancy markers
//! tanks leave on the cell they hold, so a single membership probe answers
//! every collision question the tick loop asks.

use tank_clash_core::{
    FieldPoint, FieldRect, Item, PlacementError, TankId, Tile, TileCoord, TileExtent,
};

/// Share of cells scattered as soft dirt, in percent.
const DIRT_CELLS_PERCENT: u64 = 8;
/// Share of cells scattered as water, in percent.
const WATER_CELLS_PERCENT: u64 = 4;
/// Share of cells scattered as packed plain, in percent.
const PLAIN_CELLS_PERCENT: u64 = 10;
/// Share of dry cells carrying a rock, in percent.
const ROCK_CELLS_PERCENT: u64 = 3;
/// Share of dry cells carrying a tree, in percent.
const TREE_CELLS_PERCENT: u64 = 3;

/// Grid of terrain tiles plus the item layer stacked on top of it.
#[derive(Clone, Debug)]
pub(crate) struct Battlefield {
    columns: u32,
    rows: u32,
    tile_extent: TileExtent,
    tiles: Vec<Tile>,
    items: Vec<Option<Item>>,
    blocking_tiles: Vec<Tile>,
}

impl Battlefield {
    /// Builds a battlefield with deterministically scattered terrain.
    ///
    /// A zero seed produces a flat grass field with no scenery; any other
    /// seed scatters dirt, water, plains, rocks and trees from its own
    /// generator stream, so equal seeds always yield equal fields.
    pub(crate) fn generate(
        columns: u32,
        rows: u32,
        tile_extent: TileExtent,
        terrain_seed: u64,
        blocking_tiles: Vec<Tile>,
    ) -> Self {
        let capacity = usize::try_from(u64::from(columns) * u64::from(rows)).unwrap_or(0);
        let mut tiles = vec![Tile::Grass; capacity];
        let mut items: Vec<Option<Item>> = vec![None; capacity];
        if terrain_seed != 0 {
            let mut rng = SplitMix64::new(terrain_seed);
            for tile in tiles.iter_mut() {
                *tile = scatter_tile(&mut rng);
            }
            for (slot, tile) in items.iter_mut().zip(tiles.iter()) {
                if !tile.is_hazard() {
                    *slot = scatter_item(&mut rng);
                }
            }
        }
        Self {
            columns,
            rows,
            tile_extent,
            tiles,
            items,
            blocking_tiles,
        }
    }

    pub(crate) const fn columns(&self) -> u32 {
        self.columns
    }

    pub(crate) const fn rows(&self) -> u32 {
        self.rows
    }

    pub(crate) const fn tile_extent(&self) -> TileExtent {
        self.tile_extent
    }

    pub(crate) fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub(crate) fn items(&self) -> &[Option<Item>] {
        &self.items
    }

    pub(crate) fn in_bounds(&self, cell: TileCoord) -> bool {
        self.index(cell).is_some()
    }

    /// Terrain at the cell, when the cell lies on the field.
    pub(crate) fn tile(&self, cell: TileCoord) -> Option<Tile> {
        self.index(cell)
            .and_then(|index| self.tiles.get(index).copied())
    }

    /// Item at the cell, when the cell lies on the field and carries one.
    pub(crate) fn item(&self, cell: TileCoord) -> Option<Item> {
        self.index(cell)
            .and_then(|index| self.items.get(index).copied().flatten())
    }

    /// Whether the terrain kind stops a driving tank on this field.
    pub(crate) fn tile_blocks(&self, tile: Tile) -> bool {
        self.blocking_tiles.contains(&tile)
    }

    /// Repaints the terrain of an on-field cell.
    pub(crate) fn set_tile(&mut self, cell: TileCoord, tile: Tile) -> bool {
        let Some(index) = self.index(cell) else {
            return false;
        };
        match self.tiles.get_mut(index) {
            Some(slot) => {
                *slot = tile;
                true
            }
            None => false,
        }
    }

    /// Installs scenery on an empty on-field cell.
    ///
    /// Occupancy markers are reserved for the world itself and are refused
    /// here.
    pub(crate) fn try_place_item(
        &mut self,
        cell: TileCoord,
        item: Item,
    ) -> Result<(), PlacementError> {
        if item.tank().is_some() {
            return Err(PlacementError::ReservedKind);
        }
        let Some(index) = self.index(cell) else {
            return Err(PlacementError::OutOfBounds);
        };
        let Some(slot) = self.items.get_mut(index) else {
            return Err(PlacementError::OutOfBounds);
        };
        if slot.is_some() {
            return Err(PlacementError::Occupied);
        }
        *slot = Some(item);
        Ok(())
    }

    /// Removes and returns the item at the cell, if any.
    pub(crate) fn take_item(&mut self, cell: TileCoord) -> Option<Item> {
        let index = self.index(cell)?;
        self.items.get_mut(index).and_then(Option::take)
    }

    /// Marks the cell as held by the tank.
    pub(crate) fn occupy(&mut self, tank: TankId, cell: TileCoord) {
        if let Some(index) = self.index(cell) {
            if let Some(slot) = self.items.get_mut(index) {
                *slot = Some(Item::Tank(tank));
            }
        }
    }

    /// Clears the item slot of the cell.
    pub(crate) fn vacate(&mut self, cell: TileCoord) {
        if let Some(index) = self.index(cell) {
            if let Some(slot) = self.items.get_mut(index) {
                *slot = None;
            }
        }
    }

    /// Upper-left corner of the cell in continuous field coordinates.
    pub(crate) fn cell_origin(&self, cell: TileCoord) -> FieldPoint {
        FieldPoint::new(
            cell.column() as f32 * self.tile_extent.width(),
            cell.row() as f32 * self.tile_extent.height(),
        )
    }

    /// Cell containing the continuous point, when it lies on the field.
    pub(crate) fn cell_at_point(&self, point: FieldPoint) -> Option<TileCoord> {
        if point.x() < 0.0 || point.y() < 0.0 {
            return None;
        }
        let cell = TileCoord::new(
            (point.x() / self.tile_extent.width()).floor() as i32,
            (point.y() / self.tile_extent.height()).floor() as i32,
        );
        if self.in_bounds(cell) {
            Some(cell)
        } else {
            None
        }
    }

    /// Continuous rectangle covering the whole field.
    pub(crate) fn bounds(&self) -> FieldRect {
        FieldRect::new(
            FieldPoint::new(0.0, 0.0),
            self.columns as f32 * self.tile_extent.width(),
            self.rows as f32 * self.tile_extent.height(),
        )
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

fn scatter_tile(rng: &mut SplitMix64) -> Tile {
    let roll = rng.next_u64() % 100;
    if roll < DIRT_CELLS_PERCENT {
        Tile::Dirt
    } else if roll < DIRT_CELLS_PERCENT + WATER_CELLS_PERCENT {
        Tile::Water
    } else if roll < DIRT_CELLS_PERCENT + WATER_CELLS_PERCENT + PLAIN_CELLS_PERCENT {
        Tile::Plain
    } else {
        Tile::Grass
    }
}

fn scatter_item(rng: &mut SplitMix64) -> Option<Item> {
    let roll = rng.next_u64() % 100;
    if roll < ROCK_CELLS_PERCENT {
        Some(Item::Rock)
    } else if roll < ROCK_CELLS_PERCENT + TREE_CELLS_PERCENT {
        Some(Item::Tree)
    } else {
        None
    }
}

/// Minimal SplitMix64 generator backing terrain scatter and hull jitter.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    pub(crate) fn new(seed: u64) -> Self {
        let state = if seed == 0 {
            0x9e37_79b9_7f4a_7c15
        } else {
            seed
        };
        Self { state }
    }

    pub(crate) fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9e37_79b9_7f4a_7c15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^ (z >> 31)
    }
}

#[cfg(test)]
mod tests {
    use super::{Battlefield, SplitMix64};
    use tank_clash_core::{
        FieldPoint, Item, PlacementError, TankId, Tile, TileCoord, TileExtent,
    };

    fn extent() -> TileExtent {
        TileExtent::new(32.0, 32.0)
    }

    #[test]
    fn splitmix_streams_with_equal_seeds_match() {
        let mut left = SplitMix64::new(99);
        let mut right = SplitMix64::new(99);

        for _ in 0..16 {
            assert_eq!(left.next_u64(), right.next_u64());
        }
    }

    #[test]
    fn splitmix_zero_seed_is_remapped() {
        let mut zero = SplitMix64::new(0);
        let mut mapped = SplitMix64::new(0x9e37_79b9_7f4a_7c15);

        assert_eq!(zero.next_u64(), mapped.next_u64());
    }

    #[test]
    fn zero_terrain_seed_yields_flat_grass() {
        let field = Battlefield::generate(6, 4, extent(), 0, Vec::new());

        assert!(field.tiles().iter().all(|tile| *tile == Tile::Grass));
        assert!(field.items().iter().all(Option::is_none));
    }

    #[test]
    fn terrain_scatter_is_deterministic_for_equal_seeds() {
        let left = Battlefield::generate(20, 14, extent(), 1234, Vec::new());
        let right = Battlefield::generate(20, 14, extent(), 1234, Vec::new());

        assert_eq!(left.tiles(), right.tiles());
        assert_eq!(left.items(), right.items());
    }

    #[test]
    fn scatter_never_drops_items_on_water() {
        let field = Battlefield::generate(30, 30, extent(), 77, Vec::new());

        for (tile, item) in field.tiles().iter().zip(field.items().iter()) {
            if tile.is_hazard() {
                assert!(item.is_none());
            }
        }
    }

    #[test]
    fn item_placement_validates_the_cell() {
        let mut field = Battlefield::generate(4, 4, extent(), 0, Vec::new());

        assert_eq!(
            field.try_place_item(TileCoord::new(9, 0), Item::Rock),
            Err(PlacementError::OutOfBounds)
        );
        assert_eq!(
            field.try_place_item(TileCoord::new(1, 1), Item::Tank(TankId::new(0))),
            Err(PlacementError::ReservedKind)
        );
        assert_eq!(field.try_place_item(TileCoord::new(1, 1), Item::Rock), Ok(()));
        assert_eq!(
            field.try_place_item(TileCoord::new(1, 1), Item::Tree),
            Err(PlacementError::Occupied)
        );
    }

    #[test]
    fn occupancy_markers_come_and_go() {
        let mut field = Battlefield::generate(4, 4, extent(), 0, Vec::new());
        let cell = TileCoord::new(2, 3);

        field.occupy(TankId::new(5), cell);
        assert_eq!(field.item(cell), Some(Item::Tank(TankId::new(5))));

        field.vacate(cell);
        assert_eq!(field.item(cell), None);
    }

    #[test]
    fn blocking_terrain_follows_the_configured_set() {
        let field = Battlefield::generate(4, 4, extent(), 0, vec![Tile::Water]);

        assert!(field.tile_blocks(Tile::Water));
        assert!(!field.tile_blocks(Tile::Grass));
    }

    #[test]
    fn points_map_back_to_their_cells() {
        let field = Battlefield::generate(4, 4, extent(), 0, Vec::new());

        assert_eq!(
            field.cell_at_point(FieldPoint::new(33.0, 0.5)),
            Some(TileCoord::new(1, 0))
        );
        assert_eq!(field.cell_at_point(FieldPoint::new(-0.1, 10.0)), None);
        assert_eq!(field.cell_at_point(FieldPoint::new(4.0 * 32.0, 10.0)), None);
    }
}
