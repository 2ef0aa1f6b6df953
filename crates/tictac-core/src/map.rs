use serde::{Deserialize, Serialize};

use crate::TILE_SIZE;
use crate::carrot::CarrotInventory;
use crate::geom::Rect;
use crate::tile::{Layer, Tile, TransferSlot};

/// Tile map: seven layers of tiles sorted by `(row, column)` plus the
/// metadata needed to play it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileMap {
    layers: [Vec<Tile>; Layer::COUNT],
    id: u8,
    transfer_ids: [u8; 3],
    start_row: u8,
    start_col: u8,
}

fn cell_index(v: i32) -> u8 {
    (v / TILE_SIZE).clamp(0, 255) as u8
}

impl TileMap {
    /// Create an empty map. Panics on id 0, which is reserved.
    pub fn new(id: u8) -> Self {
        assert!(id != 0, "map id can't be zero");
        Self {
            layers: Default::default(),
            id,
            transfer_ids: [0; 3],
            start_row: 0,
            start_col: 0,
        }
    }

    pub fn id(&self) -> u8 {
        self.id
    }

    pub fn transfer_ids(&self) -> [u8; 3] {
        self.transfer_ids
    }

    /// Target map id for a transfer slot, `None` when undefined.
    pub fn transfer_target(&self, slot: TransferSlot) -> Option<u8> {
        match self.transfer_ids[slot.index()] {
            0 => None,
            id => Some(id),
        }
    }

    pub fn set_transfer_id(&mut self, slot: TransferSlot, target: u8) {
        self.transfer_ids[slot.index()] = target;
    }

    pub fn start(&self) -> (u8, u8) {
        (self.start_row, self.start_col)
    }

    pub fn set_spawn(&mut self, row: u8, col: u8) {
        self.start_row = row;
        self.start_col = col;
    }

    pub fn tiles(&self, layer: Layer) -> &[Tile] {
        &self.layers[layer.index()]
    }

    pub fn is_empty(&self) -> bool {
        self.layers.iter().all(Vec::is_empty)
    }

    /// Insert the tile, replacing any tile already at its cell.
    pub fn set_tile(&mut self, layer: Layer, tile: Tile) {
        let tiles = &mut self.layers[layer.index()];
        match tiles.binary_search_by(|t| t.cmp_position(&tile)) {
            Ok(pos) => tiles[pos] = tile,
            Err(pos) => tiles.insert(pos, tile),
        }
    }

    /// Remove the tile at the cell, if any.
    pub fn delete_tile(&mut self, layer: Layer, row: u8, col: u8) {
        let tiles = &mut self.layers[layer.index()];
        if let Ok(pos) = tiles.binary_search_by(|t| t.key().cmp(&(row, col))) {
            tiles.remove(pos);
        }
    }

    pub fn tile_id_at(&self, layer: Layer, row: u8, col: u8) -> Option<u8> {
        let tiles = &self.layers[layer.index()];
        tiles
            .binary_search_by(|t| t.key().cmp(&(row, col)))
            .ok()
            .map(|pos| tiles[pos].type_id)
    }

    /// Tiles whose `(row, column)` lies in `[min_key, max_key]` in
    /// ascending order. Columns are not filtered yet.
    fn candidates(&self, layer: Layer, min_key: (u8, u8), max_key: (u8, u8)) -> &[Tile] {
        let tiles = &self.layers[layer.index()];
        let lo = tiles.partition_point(|t| t.key() < min_key);
        let hi = lo + tiles[lo..].partition_point(|t| t.key() <= max_key);
        &tiles[lo..hi]
    }

    /// First tile in `(row, column)` order whose collision shape overlaps
    /// `rect`.
    pub fn first_collision(
        &self,
        layer: Layer,
        rect: &Rect,
        carrots: &CarrotInventory,
    ) -> Option<Tile> {
        let (min_col, min_row) = (cell_index(rect.min_x), cell_index(rect.min_y));
        let (max_col, max_row) = (cell_index(rect.max_x), cell_index(rect.max_y));
        self.candidates(layer, (min_row, min_col), (max_row, max_col))
            .iter()
            .filter(|t| t.column >= min_col && t.column <= max_col)
            .find(|t| t.collides(carrots, rect))
            .copied()
    }

    pub fn collides(&self, layer: Layer, rect: &Rect, carrots: &CarrotInventory) -> bool {
        self.first_collision(layer, rect, carrots).is_some()
    }

    /// Whether any tile in the row containing `y` offers a walkable top at
    /// exactly `y` that touches `[ox, fx]`.
    pub fn has_landing_at(
        &self,
        layer: Layer,
        ox: i32,
        fx: i32,
        y: i32,
        carrots: &CarrotInventory,
    ) -> bool {
        let row = cell_index(y);
        let (min_col, max_col) = (cell_index(ox), cell_index(fx));
        self.candidates(layer, (row, min_col), (row, max_col))
            .iter()
            .filter(|t| t.column >= min_col && t.column <= max_col)
            .any(|t| t.is_landing_for(carrots, ox, fx, y))
    }

    /// Raw access for the codec. Callers must keep every layer sorted.
    pub(crate) fn layer_mut(&mut self, layer: Layer) -> &mut Vec<Tile> {
        &mut self.layers[layer.index()]
    }

    pub(crate) fn set_transfer_ids(&mut self, ids: [u8; 3]) {
        self.transfer_ids = ids;
    }
}
