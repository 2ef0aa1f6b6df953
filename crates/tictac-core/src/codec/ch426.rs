//! Text-safe binary encoding packing 7 bits into each character of a fixed
//! 128-symbol alphabet. Every symbol is a Latin-1 code point, so a symbol's
//! low byte identifies it.

use super::MapCodecError;

/// Symbols in value order.
pub const ALPHABET: [char; 128] = [
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R', 'S',
    'T', 'U', 'V', 'W', 'X', 'Y', 'Z', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l',
    'm', 'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z', '0', '1', '2', '3', '4',
    '5', '6', '7', '8', '9', '{', '}', '~', '#', '@', '+', '-', '_', '*', '[', ']', '(', ')', '<',
    '>', '\\', '|', '/', ':', ';', '!', '?', '=', '&', '%', '$', 'à', 'è', 'ì', 'ò', 'ù', 'á', 'é',
    'í', 'ó', 'ú', 'â', 'ê', 'î', 'ô', 'û', 'ä', 'ë', 'ï', 'ö', 'ü', 'À', 'È', 'Ì', 'Ò', 'Ù', 'Á',
    'É', 'Í', 'Ó', 'Ú', 'Â', 'Ê', 'Î', 'Ô', 'Û', 'Ä', 'Ë', 'Ï', 'Ö', 'Ü',
];

const INVALID: u8 = 0xFF;

const LOOKUP: [u8; 256] = build_lookup();

const fn build_lookup() -> [u8; 256] {
    let mut table = [INVALID; 256];
    let mut i = 0;
    while i < ALPHABET.len() {
        let code = ALPHABET[i] as u32;
        assert!(code < 256, "symbols must be Latin-1");
        assert!(table[code as usize] == INVALID, "duplicate symbol");
        table[code as usize] = i as u8;
        i += 1;
    }
    table
}

/// Encode bytes, padding the final character with zero bits.
pub fn encode(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 8 / 7 + 2);
    let mut room: u32 = 7;
    let mut value: u8 = 0;
    for &byte in data {
        value |= byte >> (8 - room);
        out.push(ALPHABET[value as usize]);
        room -= 1;
        value = (byte << room) & 0x7F;
        if room == 0 {
            out.push(ALPHABET[value as usize]);
            room = 7;
            value = 0;
        }
    }
    if room != 7 {
        out.push(ALPHABET[value as usize]);
    }
    out
}

/// Decode text produced by [`encode`]. Leftover padding bits that do not
/// complete a byte are dropped.
pub fn decode(text: &str) -> Result<Vec<u8>, MapCodecError> {
    let mut out = Vec::with_capacity(text.len() * 7 / 8 + 1);
    let mut used: u32 = 0;
    let mut next: u8 = 0;
    for ch in text.chars() {
        let code = ch as u32;
        let bits = if code < 256 { LOOKUP[code as usize] } else { INVALID };
        if bits == INVALID {
            return Err(MapCodecError::InvalidCharacter(ch));
        }
        next |= (bits << 1) >> used;
        if used >= 1 {
            out.push(next);
            next = ((bits as u32) << (9 - used)) as u8;
            used -= 1;
        } else {
            used += 7;
        }
    }
    Ok(out)
}
