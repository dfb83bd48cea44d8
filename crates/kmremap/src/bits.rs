//! Conversion between the `d1` string array and raw payload bytes
//!
//! Class files can only carry strings in annotations, so the protobuf payload
//! is smuggled through `d1` one byte per char. Two layouts exist:
//!
//! - UTF-8 mode: the first string starts with `\u0000`, every following char
//!   is a byte value in `0..=255`.
//! - 8-to-7 mode (legacy): bytes are re-packed into 7-bit groups shifted by
//!   one, optionally preceded by a `\u{ffff}` marker.
//!
//! Encoding always produces UTF-8 mode.

use crate::wire::DecodeError;

/// Marker char opening a UTF-8 mode payload
pub const UTF8_MODE_MARKER: char = '\u{0}';

/// Marker char opening an 8-to-7 mode payload
pub const EIGHT_TO_SEVEN_MODE_MARKER: char = '\u{ffff}';

/// Size limit of a single constant pool string in modified UTF-8
const MAX_UTF8_INFO_LENGTH: usize = 65535;

/// Split payload bytes into `d1` strings
pub fn encode_bytes(data: &[u8]) -> Vec<String> {
    let mut result = Vec::with_capacity(1);
    let mut buffer = String::new();

    buffer.push(UTF8_MODE_MARKER);
    // A NUL char costs two bytes in modified UTF-8
    let mut bytes_in_buffer = 2;

    for &byte in data {
        buffer.push(char::from(byte));
        bytes_in_buffer += if (1..=127).contains(&byte) { 1 } else { 2 };

        if bytes_in_buffer >= MAX_UTF8_INFO_LENGTH - 1 {
            result.push(std::mem::take(&mut buffer));
            bytes_in_buffer = 0;
        }
    }

    if !buffer.is_empty() {
        result.push(buffer);
    }

    result
}

/// Join `d1` strings back into payload bytes
pub fn decode_bytes(data: &[String]) -> Result<Vec<u8>, DecodeError> {
    let first = data.first().and_then(|s| s.chars().next());

    match first {
        Some(UTF8_MODE_MARKER) => {
            let mut bytes = Vec::with_capacity(data.iter().map(String::len).sum());
            for c in chars_after_marker(data) {
                let code = u32::from(c);
                let byte = u8::try_from(code).map_err(|_| DecodeError::InvalidPayloadChar(code))?;
                bytes.push(byte);
            }
            Ok(bytes)
        }
        Some(EIGHT_TO_SEVEN_MODE_MARKER) => Ok(decode_7to8(chars_after_marker(data))),
        _ => Ok(decode_7to8(data.iter().flat_map(|s| s.chars()))),
    }
}

fn chars_after_marker(data: &[String]) -> impl Iterator<Item = char> + '_ {
    data.iter().flat_map(|s| s.chars()).skip(1)
}

fn decode_7to8(chars: impl Iterator<Item = char>) -> Vec<u8> {
    // Each char is truncated to a byte and shifted back by one, modulo 0x80
    let data: Vec<u8> = chars
        .map(|c| ((u32::from(c) as u8).wrapping_add(0x7F)) & 0x7F)
        .collect();

    let result_length = 7 * data.len() / 8;
    let mut result = Vec::with_capacity(result_length);
    let mut byte_index = 0;
    let mut bit = 0u32;

    for _ in 0..result_length {
        let first_part = u32::from(data[byte_index]) >> bit;
        byte_index += 1;
        let second_part = (u32::from(data[byte_index]) & ((1 << (bit + 1)) - 1)) << (7 - bit);
        result.push((first_part + second_part) as u8);

        if bit == 6 {
            byte_index += 1;
            bit = 0;
        } else {
            bit += 1;
        }
    }

    result
}
