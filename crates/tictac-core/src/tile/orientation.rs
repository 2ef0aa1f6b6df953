use serde::{Deserialize, Serialize};

use crate::TILE_SIZE;
use crate::geom::Rect;

const ROTATION_MASK: u8 = 0b011;
const MIRROR_BIT: u8 = 0b100;

/// Rotation (bits 0-1, quarter turns clockwise) combined with a horizontal
/// mirror (bit 2). Only the lowest three bits are ever set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Orientation(u8);

impl Orientation {
    pub const IDENTITY: Orientation = Orientation(0);

    /// All eight orientations in bit order.
    pub const ALL: [Orientation; 8] = [
        Orientation(0),
        Orientation(1),
        Orientation(2),
        Orientation(3),
        Orientation(4),
        Orientation(5),
        Orientation(6),
        Orientation(7),
    ];

    /// Returns `None` for values that use bits above the lowest three.
    pub const fn from_bits(bits: u8) -> Option<Orientation> {
        if bits > 0b111 {
            None
        } else {
            Some(Orientation(bits))
        }
    }

    /// Keep only the lowest three bits.
    pub const fn from_bits_truncate(bits: u8) -> Orientation {
        Orientation(bits & 0b111)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn rotated_right(self) -> Orientation {
        Orientation((self.0 & MIRROR_BIT) | ((self.0 + 1) & ROTATION_MASK))
    }

    pub const fn rotated_left(self) -> Orientation {
        Orientation((self.0 & MIRROR_BIT) | ((self.0 + 3) & ROTATION_MASK))
    }

    pub const fn mirrored(self) -> Orientation {
        Orientation(self.0 ^ MIRROR_BIT)
    }

    pub const fn is_mirrored(self) -> bool {
        self.0 & MIRROR_BIT != 0
    }

    pub const fn has_rotation(self) -> bool {
        self.0 & ROTATION_MASK != 0
    }

    pub const fn rotation_degrees(self) -> u16 {
        (self.0 & ROTATION_MASK) as u16 * 90
    }

    /// Remap a tile-local rectangle inside the 20×20 cell. Rotation is
    /// applied first, then the mirror.
    pub const fn apply_to_rect(self, rect: Rect) -> Rect {
        let s = TILE_SIZE;
        let r = match self.0 & ROTATION_MASK {
            0 => rect,
            1 => Rect::new(s - rect.max_y, rect.min_x, s - rect.min_y, rect.max_x),
            2 => Rect::new(
                s - rect.max_x,
                s - rect.max_y,
                s - rect.min_x,
                s - rect.min_y,
            ),
            _ => Rect::new(rect.min_y, s - rect.max_x, rect.max_y, s - rect.min_x),
        };
        if !self.is_mirrored() {
            return r;
        }
        Rect::new(s - r.max_x, r.min_y, s - r.min_x, r.max_y)
    }
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} deg.", self.rotation_degrees())?;
        if self.is_mirrored() {
            write!(f, " mirrored")?;
        }
        Ok(())
    }
}
