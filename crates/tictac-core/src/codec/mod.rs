//! Map byte layout, gzip framing and text transport.
//!
//! Byte layout: `[id][transfer A][transfer B][transfer C][start row]
//! [start col]` followed by one block per non-empty layer in ascending
//! layer order: `[layer][count: u16 BE][count × (type id,
//! variation << 3 | orientation, row, col)]`. The bytes are gzipped and
//! then written as ch426 text. A map pack joins several encoded maps with
//! `'.'`.

pub mod ch426;

use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;

use crate::MAX_TILES_PER_LAYER;
use crate::map::TileMap;
use crate::tile::{Layer, Orientation, Tile, is_known_type};

/// Header bytes before the first layer block.
pub const HEADER_LEN: usize = 6;
/// Bytes per tile record.
pub const TILE_RECORD_LEN: usize = 4;
/// Largest decompressed map: a header plus every layer full.
pub const MAX_MAP_BYTES: usize =
    HEADER_LEN + Layer::COUNT * (3 + MAX_TILES_PER_LAYER * TILE_RECORD_LEN);
/// Separator between maps in a pack.
pub const PACK_SEPARATOR: char = '.';

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapCodecError {
    InvalidCharacter(char),
    Compression(String),
    TooLarge(usize),
    TooShort(usize),
    InvalidMapId,
    LayerOutOfRange(u8),
    LayerOrder { previous: u8, found: u8 },
    EmptyLayer(u8),
    LayerTooLarge { layer: u8, count: usize },
    TruncatedLayer(u8),
    TrailingBytes(usize),
    UnknownTileType(u8),
    VariationOutOfRange(u8),
    UnorderedTiles(u8),
    EmptyPack,
}

impl std::fmt::Display for MapCodecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidCharacter(c) => write!(f, "character {c:?} is not valid ch426"),
            Self::Compression(e) => write!(f, "gzip error: {e}"),
            Self::TooLarge(size) => {
                write!(f, "map data too large: {size} bytes (max {MAX_MAP_BYTES})")
            },
            Self::TooShort(size) => {
                write!(f, "map data too short: {size} bytes (need {HEADER_LEN})")
            },
            Self::InvalidMapId => write!(f, "map id can't be zero"),
            Self::LayerOutOfRange(l) => write!(f, "layer index {l} out of range"),
            Self::LayerOrder { previous, found } => {
                write!(f, "invalid layer ordering: {found} after {previous}")
            },
            Self::EmptyLayer(l) => write!(f, "layer {l} declares zero tiles"),
            Self::LayerTooLarge { layer, count } => write!(
                f,
                "layer {layer} declares {count} tiles (max {MAX_TILES_PER_LAYER})"
            ),
            Self::TruncatedLayer(l) => write!(f, "not enough data for layer {l}"),
            Self::TrailingBytes(n) => write!(f, "{n} trailing bytes after last layer"),
            Self::UnknownTileType(id) => write!(f, "unknown tile type {id}"),
            Self::VariationOutOfRange(v) => {
                write!(f, "tile variation {v} does not fit (max {MAX_VARIATION})")
            },
            Self::UnorderedTiles(l) => write!(f, "tiles of layer {l} are not sorted"),
            Self::EmptyPack => write!(f, "map pack contains no maps"),
        }
    }
}

impl std::error::Error for MapCodecError {}

/// Largest variation the five-bit wire field holds.
pub const MAX_VARIATION: u8 = 31;

fn encode_tile(buf: &mut Vec<u8>, tile: &Tile) -> Result<(), MapCodecError> {
    if !is_known_type(tile.type_id) {
        return Err(MapCodecError::UnknownTileType(tile.type_id));
    }
    if tile.variation > MAX_VARIATION {
        return Err(MapCodecError::VariationOutOfRange(tile.variation));
    }
    buf.extend_from_slice(&[
        tile.type_id,
        (tile.variation << 3) | tile.orientation.bits(),
        tile.row,
        tile.column,
    ]);
    Ok(())
}

fn decode_tile(record: &[u8]) -> Result<Tile, MapCodecError> {
    let type_id = record[0];
    if !is_known_type(type_id) {
        return Err(MapCodecError::UnknownTileType(type_id));
    }
    Ok(Tile {
        type_id,
        variation: record[1] >> 3,
        orientation: Orientation::from_bits_truncate(record[1]),
        row: record[2],
        column: record[3],
    })
}

/// Serialize a map to its uncompressed byte layout. Fails on anything
/// [`decode_bytes`] would refuse to read back.
pub fn encode_bytes(map: &TileMap) -> Result<Vec<u8>, MapCodecError> {
    let (start_row, start_col) = map.start();
    let t = map.transfer_ids();
    let mut buf = Vec::with_capacity(1024);
    buf.extend_from_slice(&[map.id(), t[0], t[1], t[2], start_row, start_col]);
    for layer in Layer::ALL {
        let tiles = map.tiles(layer);
        if tiles.is_empty() {
            continue;
        }
        let index = layer.index() as u8;
        if tiles.len() > MAX_TILES_PER_LAYER {
            return Err(MapCodecError::LayerTooLarge {
                layer: index,
                count: tiles.len(),
            });
        }
        buf.push(index);
        buf.extend_from_slice(&(tiles.len() as u16).to_be_bytes());
        for tile in tiles {
            encode_tile(&mut buf, tile)?;
        }
    }
    Ok(buf)
}

/// Parse the uncompressed byte layout. The whole stream is validated
/// before a map is returned.
pub fn decode_bytes(bytes: &[u8]) -> Result<TileMap, MapCodecError> {
    if bytes.len() > MAX_MAP_BYTES {
        return Err(MapCodecError::TooLarge(bytes.len()));
    }
    if bytes.len() < HEADER_LEN {
        return Err(MapCodecError::TooShort(bytes.len()));
    }
    if bytes[0] == 0 {
        return Err(MapCodecError::InvalidMapId);
    }
    let mut map = TileMap::new(bytes[0]);
    map.set_transfer_ids([bytes[1], bytes[2], bytes[3]]);
    map.set_spawn(bytes[4], bytes[5]);

    let mut previous: Option<u8> = None;
    let mut rest = &bytes[HEADER_LEN..];
    while rest.len() > 3 {
        let index = rest[0];
        let layer = Layer::from_index(index).ok_or(MapCodecError::LayerOutOfRange(index))?;
        if let Some(prev) = previous.filter(|&p| p >= index) {
            return Err(MapCodecError::LayerOrder {
                previous: prev,
                found: index,
            });
        }
        previous = Some(index);

        let count = u16::from_be_bytes([rest[1], rest[2]]) as usize;
        if count == 0 {
            return Err(MapCodecError::EmptyLayer(index));
        }
        if count > MAX_TILES_PER_LAYER {
            return Err(MapCodecError::LayerTooLarge {
                layer: index,
                count,
            });
        }
        let end = 3 + count * TILE_RECORD_LEN;
        if rest.len() < end {
            return Err(MapCodecError::TruncatedLayer(index));
        }

        let tiles = map.layer_mut(layer);
        tiles.reserve_exact(count);
        for record in rest[3..end].chunks_exact(TILE_RECORD_LEN) {
            let tile = decode_tile(record)?;
            if tiles.last().is_some_and(|last| last.key() >= tile.key()) {
                return Err(MapCodecError::UnorderedTiles(index));
            }
            tiles.push(tile);
        }
        rest = &rest[end..];
    }

    if !rest.is_empty() {
        return Err(MapCodecError::TrailingBytes(rest.len()));
    }
    Ok(map)
}

/// Encode a map as gzipped ch426 text.
pub fn export_to_string(map: &TileMap) -> Result<String, MapCodecError> {
    let bytes = encode_bytes(map)?;
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(&bytes)
        .map_err(|e| MapCodecError::Compression(e.to_string()))?;
    let gzipped = encoder
        .finish()
        .map_err(|e| MapCodecError::Compression(e.to_string()))?;
    Ok(ch426::encode(&gzipped))
}

/// Decode a map from gzipped ch426 text.
pub fn load_map_from_string(text: &str) -> Result<TileMap, MapCodecError> {
    let gzipped = ch426::decode(text)?;
    let mut bytes = Vec::new();
    MultiGzDecoder::new(gzipped.as_slice())
        .take(MAX_MAP_BYTES as u64 + 1)
        .read_to_end(&mut bytes)
        .map_err(|e| MapCodecError::Compression(e.to_string()))?;
    decode_bytes(&bytes).inspect_err(|e| {
        tracing::debug!(error = %e, "Rejected map data");
    })
}

/// Encode several maps as one pack.
pub fn encode_pack(maps: &[TileMap]) -> Result<String, MapCodecError> {
    let parts = maps
        .iter()
        .map(export_to_string)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(parts.join(&PACK_SEPARATOR.to_string()))
}

/// Decode a pack of maps. Surrounding whitespace is ignored.
pub fn decode_pack(text: &str) -> Result<Vec<TileMap>, MapCodecError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(MapCodecError::EmptyPack);
    }
    text.split(PACK_SEPARATOR)
        .map(|part| load_map_from_string(part.trim()))
        .collect()
}
