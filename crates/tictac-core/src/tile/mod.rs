pub mod geometry;
pub mod orientation;

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::TILE_SIZE;
use crate::carrot::{CarrotInventory, Variety};
use crate::geom::Rect;

pub use geometry::{GEOMETRY_TABLE, GeometryKind, geometry_of};
pub use orientation::Orientation;

/// Tile type ids. The numeric values are part of the map byte format.
pub mod ids {
    pub const MAIN_GROUND: u8 = 1;
    pub const MAIN_GROUND_RAISER: u8 = 2;
    pub const MAIN_GROUND_SIDE: u8 = 3;
    pub const MAIN_GROUND_CORNER: u8 = 4;
    pub const MAIN_GROUND_MARK: u8 = 5;
    pub const MAIN_GROUND_MARK_CORNER: u8 = 6;
    pub const MAIN_SINGLE_PLATFORM: u8 = 7;
    pub const MAIN_GRASS_SIDE: u8 = 8;
    pub const MAIN_GRASS_SIDE_FULL: u8 = 9;
    pub const MAIN_GRASS_CORNER: u8 = 10;
    pub const MAIN_GRASS_CORNER_FULL: u8 = 11;

    pub const BACK_GROUND: u8 = 12;
    pub const BACK_GROUND_SIDE: u8 = 13;
    pub const BACK_GROUND_CORNER: u8 = 14;
    pub const BACK_GROUND_MARK: u8 = 15;
    pub const BACK_GROUND_MARK_CORNER: u8 = 16;

    pub const FRONT_GROUND: u8 = 17;
    pub const FRONT_GROUND_RAISER: u8 = 18;
    pub const FRONT_GROUND_SIDE: u8 = 19;
    pub const FRONT_GROUND_CORNER: u8 = 20;
    pub const FRONT_GROUND_MARK: u8 = 21;
    pub const FRONT_GROUND_MARK_CORNER: u8 = 22;
    pub const FRONT_SINGLE_PLATFORM: u8 = 23;
    pub const FRONT_GRASS_SIDE: u8 = 24;
    pub const FRONT_GRASS_SIDE_FULL: u8 = 25;
    pub const FRONT_GRASS_CORNER: u8 = 26;
    pub const FRONT_GRASS_CORNER_FULL: u8 = 27;

    /// Editor marker, never placed as a real tile.
    pub const START_POINT: u8 = 28;
    pub const RACE_GOAL: u8 = 29;

    pub const CARROT_ORANGE: u8 = 30;
    pub const CARROT_YELLOW: u8 = 31;
    pub const CARROT_PURPLE: u8 = 32;
    pub const CARROT_MISSING: u8 = 33;

    pub const ORANGE_PLAT_SINGLE: u8 = 34;
    pub const ORANGE_PLAT_SINGLE_FILL: u8 = 35;
    pub const ORANGE_PLAT_LEFT: u8 = 36;
    pub const ORANGE_PLAT_LEFT_FILL: u8 = 37;
    pub const ORANGE_PLAT_RIGHT: u8 = 38;
    pub const ORANGE_PLAT_RIGHT_FILL: u8 = 39;
    pub const YELLOW_PLAT_SINGLE: u8 = 40;
    pub const YELLOW_PLAT_SINGLE_FILL: u8 = 41;
    pub const YELLOW_PLAT_LEFT: u8 = 42;
    pub const YELLOW_PLAT_LEFT_FILL: u8 = 43;
    pub const YELLOW_PLAT_RIGHT: u8 = 44;
    pub const YELLOW_PLAT_RIGHT_FILL: u8 = 45;
    pub const PURPLE_PLAT_SINGLE: u8 = 46;
    pub const PURPLE_PLAT_SINGLE_FILL: u8 = 47;
    pub const PURPLE_PLAT_LEFT: u8 = 48;
    pub const PURPLE_PLAT_LEFT_FILL: u8 = 49;
    pub const PURPLE_PLAT_RIGHT: u8 = 50;
    pub const PURPLE_PLAT_RIGHT_FILL: u8 = 51;

    pub const TRANSFER_UP: u8 = 52;
    pub const TRANSFER_UP_A: u8 = 53;
    pub const TRANSFER_UP_B: u8 = 54;
    pub const TRANSFER_UP_C: u8 = 55;
    pub const TRANSFER_LEFT: u8 = 56;
    pub const TRANSFER_LEFT_A: u8 = 57;
    pub const TRANSFER_LEFT_B: u8 = 58;
    pub const TRANSFER_LEFT_C: u8 = 59;
    pub const TRANSFER_RIGHT: u8 = 60;
    pub const TRANSFER_RIGHT_A: u8 = 61;
    pub const TRANSFER_RIGHT_B: u8 = 62;
    pub const TRANSFER_RIGHT_C: u8 = 63;
    pub const TRANSFER_DOWN: u8 = 64;
    pub const TRANSFER_DOWN_A: u8 = 65;
    pub const TRANSFER_DOWN_B: u8 = 66;
    pub const TRANSFER_DOWN_C: u8 = 67;

    /// Number of known tile types. Ids at or above it are invalid.
    pub const TILE_TYPE_COUNT: u8 = 68;
}

/// Transfer link slot carried by lettered transfer tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransferSlot {
    A,
    B,
    C,
}

impl TransferSlot {
    /// Index into `TileMap::transfer_ids`.
    pub const fn index(self) -> usize {
        match self {
            TransferSlot::A => 0,
            TransferSlot::B => 1,
            TransferSlot::C => 2,
        }
    }
}

/// Gameplay role of a tile type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileClass {
    Terrain,
    StartPoint,
    Goal,
    Carrot(Variety),
    CarrotPlatform(Variety),
    /// Plain arrows carry no slot and do not transfer.
    Transfer(Option<TransferSlot>),
}

pub const CLASS_TABLE: [TileClass; ids::TILE_TYPE_COUNT as usize] = build_class_table();

const fn build_class_table() -> [TileClass; ids::TILE_TYPE_COUNT as usize] {
    let mut table = [TileClass::Terrain; ids::TILE_TYPE_COUNT as usize];
    table[ids::START_POINT as usize] = TileClass::StartPoint;
    table[ids::RACE_GOAL as usize] = TileClass::Goal;
    table[ids::CARROT_ORANGE as usize] = TileClass::Carrot(Variety::Orange);
    table[ids::CARROT_YELLOW as usize] = TileClass::Carrot(Variety::Yellow);
    table[ids::CARROT_PURPLE as usize] = TileClass::Carrot(Variety::Purple);

    let varieties = [Variety::Orange, Variety::Yellow, Variety::Purple];
    let mut v = 0;
    while v < varieties.len() {
        let base = ids::ORANGE_PLAT_SINGLE as usize + v * 6;
        let mut i = 0;
        while i < 6 {
            table[base + i] = TileClass::CarrotPlatform(varieties[v]);
            i += 1;
        }
        v += 1;
    }

    let mut id = ids::TRANSFER_UP;
    while id < ids::TILE_TYPE_COUNT {
        let slot = match (id - ids::TRANSFER_UP) & 0b11 {
            1 => Some(TransferSlot::A),
            2 => Some(TransferSlot::B),
            3 => Some(TransferSlot::C),
            _ => None,
        };
        table[id as usize] = TileClass::Transfer(slot);
        id += 1;
    }
    table
}

/// Class of a type id, or `None` for unknown ids.
pub const fn class_of(type_id: u8) -> Option<TileClass> {
    if type_id >= ids::TILE_TYPE_COUNT {
        return None;
    }
    Some(CLASS_TABLE[type_id as usize])
}

pub const fn is_known_type(type_id: u8) -> bool {
    type_id != 0 && type_id < ids::TILE_TYPE_COUNT
}

/// Map layers in storage and draw order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Layer {
    Back = 0,
    BackDecor = 1,
    Main = 2,
    MainDecor = 3,
    Front = 4,
    FrontDecor = 5,
    Special = 6,
}

impl Layer {
    pub const COUNT: usize = 7;

    pub const ALL: [Layer; Layer::COUNT] = [
        Layer::Back,
        Layer::BackDecor,
        Layer::Main,
        Layer::MainDecor,
        Layer::Front,
        Layer::FrontDecor,
        Layer::Special,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn from_index(index: u8) -> Option<Layer> {
        if (index as usize) < Layer::COUNT {
            Some(Layer::ALL[index as usize])
        } else {
            None
        }
    }
}

/// A placed map cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tile {
    pub type_id: u8,
    /// Visual variation, five bits on the wire.
    pub variation: u8,
    pub orientation: Orientation,
    pub row: u8,
    pub column: u8,
}

impl Tile {
    pub const fn new(type_id: u8, row: u8, column: u8) -> Self {
        Self {
            type_id,
            variation: 0,
            orientation: Orientation::IDENTITY,
            row,
            column,
        }
    }

    /// Sort key inside a layer.
    pub const fn key(&self) -> (u8, u8) {
        (self.row, self.column)
    }

    pub fn cmp_position(&self, other: &Tile) -> Ordering {
        self.key().cmp(&other.key())
    }

    pub const fn class(&self) -> Option<TileClass> {
        class_of(self.type_id)
    }

    pub const fn geometry(&self) -> GeometryKind {
        geometry_of(self.type_id)
    }

    /// Canvas-space cell covered by the tile.
    pub const fn raw_rect(&self) -> Rect {
        let x = self.column as i32 * TILE_SIZE;
        let y = self.row as i32 * TILE_SIZE;
        Rect::new(x, y, x + TILE_SIZE, y + TILE_SIZE)
    }

    fn carrot_gate(&self, carrots: &CarrotInventory) -> bool {
        match self.class() {
            Some(TileClass::CarrotPlatform(variety)) => carrots.fill_opacity(variety) != 0.0,
            _ => true,
        }
    }

    /// Geometry overlap test, gated by carrot fill for carrot platforms.
    pub fn collides(&self, carrots: &CarrotInventory, rect: &Rect) -> bool {
        let origin = self.raw_rect();
        self.geometry()
            .collides(self.orientation, origin.min_x, origin.min_y, rect)
            && self.carrot_gate(carrots)
    }

    /// Whether the tile offers a walkable top at height `y` spanning
    /// `[ox, fx]`.
    pub fn is_landing_for(&self, carrots: &CarrotInventory, ox: i32, fx: i32, y: i32) -> bool {
        let origin = self.raw_rect();
        self.geometry()
            .is_landing(self.orientation, origin.min_x, origin.min_y, ox, fx, y)
            && self.carrot_gate(carrots)
    }
}

impl std::fmt::Display for Tile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "(T{}/V{}, {}, [{}])",
            self.type_id,
            self.variation,
            self.orientation,
            self.raw_rect()
        )
    }
}
