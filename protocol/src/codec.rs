use crate::{BYTE_ARRAY_LENGTH, STRING_LENGTH};

/// Right-pads `data` with spaces to exactly [`STRING_LENGTH`] bytes.
/// Longer input is truncated at the byte level.
pub fn encode_string(data: &str) -> [u8; STRING_LENGTH] {
    let mut bytes = [0x20u8; STRING_LENGTH];

    let raw = data.as_bytes();
    let length = raw.len().min(STRING_LENGTH);
    bytes[..length].copy_from_slice(&raw[..length]);

    bytes
}

/// Decodes the 64-byte string field starting at `index`, stripping the
/// trailing space padding. Bytes missing from a short buffer count as
/// padding.
pub fn decode_string(data: &[u8], index: usize) -> String {
    let end = data.len().min(index.saturating_add(STRING_LENGTH));
    let field = data.get(index..end).unwrap_or(&[]);

    String::from_utf8_lossy(field)
        .trim_end_matches(' ')
        .to_string()
}

pub fn encode_short(value: i16) -> [u8; 2] {
    value.to_be_bytes()
}

/// Big-endian 16-bit decode. The bytes are widened *before* the shift so
/// values with the top bit set in the high byte survive the decode.
pub fn decode_short(data: &[u8], index: usize) -> i16 {
    let hi = data.get(index).copied().unwrap_or(0);
    let lo = data.get(index + 1).copied().unwrap_or(0);

    i16::from_be_bytes([hi, lo])
}

pub fn encode_int(value: i32) -> [u8; 4] {
    value.to_be_bytes()
}

/// Right-pads `data` with zeroes to exactly [`BYTE_ARRAY_LENGTH`] bytes.
pub fn encode_byte_array(data: &[u8]) -> [u8; BYTE_ARRAY_LENGTH] {
    let mut bytes = [0u8; BYTE_ARRAY_LENGTH];

    let length = data.len().min(BYTE_ARRAY_LENGTH);
    bytes[..length].copy_from_slice(&data[..length]);

    bytes
}
