pub mod audio;
pub mod carrot;
pub mod codec;
pub mod geom;
pub mod input;
pub mod map;
pub mod tile;

/// Logical canvas width in pixels.
pub const CANVAS_WIDTH: i32 = 640;
/// Logical canvas height in pixels.
pub const CANVAS_HEIGHT: i32 = 360;
/// Side of a square tile cell in pixels.
pub const TILE_SIZE: i32 = 20;
/// Columns that fit on the canvas.
pub const MAP_COLUMNS: u8 = 32;
/// Rows that fit on the canvas.
pub const MAP_ROWS: u8 = 18;
/// Upper bound of tiles a single layer can hold.
pub const MAX_TILES_PER_LAYER: usize = MAP_COLUMNS as usize * MAP_ROWS as usize;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use crate::map::TileMap;
    use crate::tile::{Layer, Orientation, Tile, ids};

    /// Build a tile with no variation and the default orientation.
    pub fn tile(type_id: u8, row: u8, column: u8) -> Tile {
        Tile::new(type_id, row, column)
    }

    /// Create an empty map with id 1 and the spawn at the given cell.
    pub fn empty_map(start_row: u8, start_col: u8) -> TileMap {
        let mut map = TileMap::new(1);
        map.set_spawn(start_row, start_col);
        map
    }

    /// Fill `row` of the main layer with grass tops over `columns`.
    pub fn grass_floor(map: &mut TileMap, row: u8, columns: std::ops::Range<u8>) {
        for column in columns {
            map.set_tile(Layer::Main, tile(ids::MAIN_GRASS_SIDE, row, column));
        }
    }

    /// A map with a full-width grass floor on `floor_row` and the spawn on
    /// top of it at `start_col`.
    pub fn flat_map(floor_row: u8, start_col: u8) -> TileMap {
        let mut map = empty_map(floor_row, start_col);
        grass_floor(&mut map, floor_row, 0..crate::MAP_COLUMNS);
        map
    }

    /// Place a vertical column of back-layer ground tiles.
    pub fn back_wall(map: &mut TileMap, column: u8, rows: std::ops::Range<u8>) {
        for row in rows {
            map.set_tile(Layer::Back, tile(ids::BACK_GROUND, row, column));
        }
    }

    /// Place a tile with an explicit orientation.
    pub fn oriented(type_id: u8, row: u8, column: u8, orientation: Orientation) -> Tile {
        Tile {
            orientation,
            ..Tile::new(type_id, row, column)
        }
    }
}
