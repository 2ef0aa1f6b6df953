use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use tictac_core::carrot::Variety;
use tictac_core::map::TileMap;
use tictac_core::tile::{Layer, Tile, ids};
use tictac_core::{MAP_COLUMNS, MAP_ROWS};

/// Row holding the grass surface of generated maps.
pub const FLOOR_ROW: u8 = 15;
/// Column of the spawn cell.
pub const START_COL: u8 = 1;
/// Column of the race goal.
pub const GOAL_COL: u8 = MAP_COLUMNS - 2;

/// Chunk width in columns (each procedural section is this wide).
const CHUNK_WIDTH: u8 = 4;
/// First column handed to the chunk generator; the start area is left flat.
const FIRST_CHUNK_COL: u8 = 4;

/// Generate a deterministic single-screen race map from a seed. Panics if
/// `id` is zero.
pub fn generate_map(seed: u64, id: u8) -> TileMap {
    let mut map = TileMap::new(id);
    map.set_spawn(FLOOR_ROW, START_COL);

    let mut rng = StdRng::seed_from_u64(seed);

    // Ground: grass top with solid fill below
    for col in 0..MAP_COLUMNS {
        map.set_tile(Layer::Main, Tile::new(ids::MAIN_GRASS_SIDE, FLOOR_ROW, col));
        for row in FLOOR_ROW + 1..MAP_ROWS {
            map.set_tile(Layer::Main, Tile::new(ids::MAIN_GROUND, row, col));
        }
    }

    let mut base = FIRST_CHUNK_COL;
    while base + CHUNK_WIDTH < GOAL_COL {
        generate_chunk(&mut map, &mut rng, base);
        base += CHUNK_WIDTH;
    }

    map.set_tile(
        Layer::Special,
        Tile::new(ids::RACE_GOAL, FLOOR_ROW - 1, GOAL_COL),
    );
    tracing::debug!(seed, id, "Generated map");
    map
}

fn random_variety(rng: &mut StdRng) -> Variety {
    match rng.random_range(0u8..3) {
        0 => Variety::Orange,
        1 => Variety::Yellow,
        _ => Variety::Purple,
    }
}

fn carrot_id(variety: Variety) -> u8 {
    match variety {
        Variety::Orange => ids::CARROT_ORANGE,
        Variety::Yellow => ids::CARROT_YELLOW,
        Variety::Purple => ids::CARROT_PURPLE,
    }
}

fn platform_id(variety: Variety) -> u8 {
    match variety {
        Variety::Orange => ids::ORANGE_PLAT_SINGLE,
        Variety::Yellow => ids::YELLOW_PLAT_SINGLE,
        Variety::Purple => ids::PURPLE_PLAT_SINGLE,
    }
}

fn dig_pit(map: &mut TileMap, columns: std::ops::Range<u8>) {
    for col in columns {
        for row in FLOOR_ROW..MAP_ROWS {
            map.delete_tile(Layer::Main, row, col);
        }
    }
}

fn generate_chunk(map: &mut TileMap, rng: &mut StdRng, base: u8) {
    let pattern = rng.random_range(0u8..5);

    match pattern {
        0 => {
            // Pit narrow enough to jump
            let start = base + rng.random_range(1..3);
            let width = rng.random_range(1..3);
            dig_pit(map, start..start + width);
        },
        1 => {
            // Raised ledge or floating platforms with a carrot on top
            let row = rng.random_range(11u8..14);
            let start = base + rng.random_range(0..2);
            let ledge = if rng.random_bool(0.5) {
                ids::MAIN_GRASS_SIDE
            } else {
                ids::MAIN_SINGLE_PLATFORM
            };
            for col in start..start + 3 {
                map.set_tile(Layer::Main, Tile::new(ledge, row, col));
            }
            let variety = random_variety(rng);
            map.set_tile(
                Layer::Special,
                Tile::new(carrot_id(variety), row - 1, start + 1),
            );
        },
        2 => {
            // Back wall for tic-tacs
            let col = base + rng.random_range(1..3);
            let top = rng.random_range(7u8..11);
            for row in top..=FLOOR_ROW {
                map.set_tile(Layer::Back, Tile::new(ids::BACK_GROUND, row, col));
            }
        },
        3 => {
            // Carrot-powered bridge over a pit, carrot right before it
            let variety = random_variety(rng);
            map.set_tile(
                Layer::Special,
                Tile::new(carrot_id(variety), FLOOR_ROW - 1, base),
            );
            dig_pit(map, base + 1..base + 3);
            for col in base + 1..base + 3 {
                map.set_tile(Layer::Main, Tile::new(platform_id(variety), FLOOR_ROW, col));
            }
        },
        _ => {
            // Front-layer step the player can walk behind
            let col = base + rng.random_range(1..3);
            map.set_tile(
                Layer::Front,
                Tile::new(ids::FRONT_GRASS_SIDE, FLOOR_ROW - 2, col),
            );
            map.set_tile(
                Layer::Front,
                Tile::new(ids::FRONT_GRASS_SIDE, FLOOR_ROW - 2, col + 1),
            );
        },
    }
}
