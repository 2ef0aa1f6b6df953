use crate::geom::Rect;
use crate::tile::Orientation;
use crate::tile::ids::*;

/// Collision shape variants. Every kind except `None` and `Full20x20` is a
/// fixed sub-rectangle of the cell, oriented by the tile before use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    None,
    Full20x20,
    BL20x19,
    TR19x19,
    BL20x9,
    BR19x9,
    /// Single platforms.
    MT18x17,
    BR19x20,
    /// Left carrot platforms.
    BR18x16,
    /// Right carrot platforms.
    BL17x16,
    /// Single carrot platforms.
    BL1_17x16,
    /// Small centered trigger for carrots, goals and transfers. Ignores
    /// orientation.
    MM4x4,
}

impl GeometryKind {
    /// Local rectangle in tile coordinates, before orientation.
    pub const fn local_rect(self) -> Option<Rect> {
        match self {
            GeometryKind::None => None,
            GeometryKind::Full20x20 => Some(Rect::new(0, 0, 20, 20)),
            GeometryKind::BL20x19 => Some(Rect::new(0, 1, 20, 20)),
            GeometryKind::TR19x19 => Some(Rect::new(1, 0, 20, 19)),
            GeometryKind::BL20x9 => Some(Rect::new(0, 11, 20, 20)),
            GeometryKind::BR19x9 => Some(Rect::new(1, 11, 20, 20)),
            GeometryKind::MT18x17 => Some(Rect::new(1, 0, 19, 17)),
            GeometryKind::BR19x20 => Some(Rect::new(1, 0, 20, 20)),
            GeometryKind::BR18x16 => Some(Rect::new(2, 4, 20, 20)),
            GeometryKind::BL17x16 => Some(Rect::new(0, 4, 17, 20)),
            GeometryKind::BL1_17x16 => Some(Rect::new(1, 4, 18, 20)),
            GeometryKind::MM4x4 => Some(Rect::new(8, 8, 12, 12)),
        }
    }

    /// Whether the shape exposes a walkable top to landing queries. Solid
    /// blocks, sides and corners are deliberately excluded.
    pub const fn is_landing_capable(self) -> bool {
        matches!(
            self,
            GeometryKind::BL20x9
                | GeometryKind::BR19x9
                | GeometryKind::MT18x17
                | GeometryKind::BR18x16
                | GeometryKind::BL17x16
                | GeometryKind::BL1_17x16
        )
    }

    /// Shape rectangle in canvas coordinates for a tile at `(ox, oy)`.
    pub const fn placed_rect(self, orientation: Orientation, ox: i32, oy: i32) -> Option<Rect> {
        let Some(local) = self.local_rect() else {
            return None;
        };
        let rect = match self {
            GeometryKind::Full20x20 | GeometryKind::MM4x4 => local,
            _ => orientation.apply_to_rect(local),
        };
        Some(rect.translate(ox, oy))
    }

    pub const fn collides(self, orientation: Orientation, ox: i32, oy: i32, target: &Rect) -> bool {
        match self.placed_rect(orientation, ox, oy) {
            Some(rect) => target.overlaps(&rect),
            None => false,
        }
    }

    /// Landing test: the oriented top edge sits exactly at `y` and the
    /// horizontal span touches `[ox, fx]`.
    pub const fn is_landing(
        self,
        orientation: Orientation,
        tile_x: i32,
        tile_y: i32,
        ox: i32,
        fx: i32,
        y: i32,
    ) -> bool {
        if !self.is_landing_capable() {
            return false;
        }
        match self.placed_rect(orientation, tile_x, tile_y) {
            Some(r) => r.min_y == y && r.min_x <= fx && r.max_x >= ox,
            None => false,
        }
    }
}

/// Shape of each tile type, indexed by type id.
pub const GEOMETRY_TABLE: [GeometryKind; TILE_TYPE_COUNT as usize] = build_geometry_table();

const fn build_geometry_table() -> [GeometryKind; TILE_TYPE_COUNT as usize] {
    let mut table = [GeometryKind::None; TILE_TYPE_COUNT as usize];

    table[MAIN_GROUND as usize] = GeometryKind::Full20x20;
    table[MAIN_GROUND_SIDE as usize] = GeometryKind::BL20x19;
    table[MAIN_GROUND_CORNER as usize] = GeometryKind::TR19x19;
    table[MAIN_SINGLE_PLATFORM as usize] = GeometryKind::MT18x17;
    table[MAIN_GRASS_SIDE as usize] = GeometryKind::BL20x9;
    table[MAIN_GRASS_SIDE_FULL as usize] = GeometryKind::BL20x9;
    table[MAIN_GRASS_CORNER as usize] = GeometryKind::BR19x9;
    table[MAIN_GRASS_CORNER_FULL as usize] = GeometryKind::BR19x9;

    table[FRONT_GROUND as usize] = GeometryKind::Full20x20;
    table[FRONT_GROUND_SIDE as usize] = GeometryKind::BL20x19;
    table[FRONT_GROUND_CORNER as usize] = GeometryKind::TR19x19;
    table[FRONT_SINGLE_PLATFORM as usize] = GeometryKind::MT18x17;
    table[FRONT_GRASS_SIDE as usize] = GeometryKind::BL20x9;
    table[FRONT_GRASS_SIDE_FULL as usize] = GeometryKind::BL20x9;
    table[FRONT_GRASS_CORNER as usize] = GeometryKind::BR19x9;
    table[FRONT_GRASS_CORNER_FULL as usize] = GeometryKind::BR19x9;

    table[BACK_GROUND as usize] = GeometryKind::Full20x20;
    table[BACK_GROUND_SIDE as usize] = GeometryKind::BL20x19;
    table[BACK_GROUND_CORNER as usize] = GeometryKind::TR19x19;

    table[RACE_GOAL as usize] = GeometryKind::MM4x4;
    table[CARROT_ORANGE as usize] = GeometryKind::MM4x4;
    table[CARROT_YELLOW as usize] = GeometryKind::MM4x4;
    table[CARROT_PURPLE as usize] = GeometryKind::MM4x4;
    let mut id = TRANSFER_UP as usize;
    while id < TILE_TYPE_COUNT as usize {
        table[id] = GeometryKind::MM4x4;
        id += 1;
    }

    // carrot platforms: six ids per color, the fill ids keep no shape
    let mut base = ORANGE_PLAT_SINGLE as usize;
    while base <= PURPLE_PLAT_SINGLE as usize {
        table[base] = GeometryKind::BL1_17x16;
        table[base + 2] = GeometryKind::BR18x16;
        table[base + 4] = GeometryKind::BL17x16;
        base += 6;
    }

    table
}

/// Geometry for a type id. Unknown ids have no shape.
pub const fn geometry_of(type_id: u8) -> GeometryKind {
    if type_id >= TILE_TYPE_COUNT {
        return GeometryKind::None;
    }
    GEOMETRY_TABLE[type_id as usize]
}
