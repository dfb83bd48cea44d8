//! Protobuf wire encoding and decoding utilities
//!
//! The metadata payload is a protobuf stream. This module provides the
//! low-level reader and writer the message types are built on. Fields that a
//! message does not recognise are captured as [`RawField`]s and written back
//! untouched.

use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while decoding a metadata payload
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Unexpected end of the payload
    #[error("Unexpected end of payload at offset {0}")]
    UnexpectedEnd(usize),

    /// A varint ran past ten bytes
    #[error("Malformed varint at offset {0}")]
    MalformedVarint(usize),

    /// Groups and reserved wire types are not part of the metadata schema
    #[error("Unsupported wire type {0} at offset {1}")]
    UnsupportedWireType(u8, usize),

    /// Field number zero is never valid
    #[error("Invalid field number 0 at offset {0}")]
    InvalidFieldNumber(usize),

    /// A required message field was absent
    #[error("Missing required field {0}")]
    MissingField(&'static str),

    /// Invalid UTF-8 string
    #[error("Invalid UTF-8 string at offset {0}")]
    InvalidUtf8(usize),

    /// A string table index did not resolve
    #[error("String table index {0} is out of range")]
    StringIndexOutOfRange(i32),

    /// A string table record asked for an impossible substring
    #[error("Invalid substring {begin}..{end} for string table entry {index}")]
    InvalidSubstring {
        /// String table index
        index: i32,
        /// Substring start
        begin: i32,
        /// Substring end
        end: i32,
    },

    /// A `d1` string held a char that does not fit in a byte
    #[error("Invalid payload character U+{0:04X}")]
    InvalidPayloadChar(u32),

    /// Messages were nested deeper than [`MAX_NESTING_DEPTH`]
    #[error("Messages nested deeper than {0} levels at offset {1}")]
    RecursionLimit(usize, usize),
}

/// Deepest message nesting a payload may use
pub const MAX_NESTING_DEPTH: usize = 100;

/// Protobuf wire types used by the metadata schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WireType {
    /// Variable-length integer
    Varint,
    /// Eight little-endian bytes
    Fixed64,
    /// Length-delimited bytes
    Len,
    /// Four little-endian bytes
    Fixed32,
}

impl WireType {
    fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Varint),
            1 => Some(Self::Fixed64),
            2 => Some(Self::Len),
            5 => Some(Self::Fixed32),
            _ => None,
        }
    }

    fn to_u8(self) -> u8 {
        match self {
            Self::Varint => 0,
            Self::Fixed64 => 1,
            Self::Len => 2,
            Self::Fixed32 => 5,
        }
    }
}

/// A field the decoder did not recognise, kept byte-for-byte
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawField {
    /// Field number
    pub number: u32,
    /// Wire type
    pub wire_type: WireType,
    /// Value bytes (without the tag, and without the length prefix for `Len`)
    pub data: Vec<u8>,
}

/// Unrecognised fields of one message, in the order they were read
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct UnknownFields(Vec<RawField>);

impl UnknownFields {
    /// Whether no unknown fields were seen
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of retained fields
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Retain a field
    pub fn push(&mut self, field: RawField) {
        self.0.push(field);
    }

    /// Iterate over the retained fields
    pub fn iter(&self) -> impl Iterator<Item = &RawField> {
        self.0.iter()
    }
}

/// Append a base-128 varint
pub fn write_varint(buffer: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        buffer.push((value as u8) | 0x80);
        value >>= 7;
    }
    buffer.push(value as u8);
}

fn write_tag(buffer: &mut Vec<u8>, number: u32, wire_type: WireType) {
    write_varint(buffer, (u64::from(number) << 3) | u64::from(wire_type.to_u8()));
}

/// Collects the encoded fields of one message
///
/// Fields may be pushed in any order; [`FieldSink::finish`] emits them sorted
/// by field number, keeping the push order of repeated fields. This is what
/// lets unknown fields slot back between the known ones.
#[derive(Debug, Default)]
pub struct FieldSink {
    entries: Vec<(u32, Vec<u8>)>,
}

impl FieldSink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, number: u32, wire_type: WireType, write: impl FnOnce(&mut Vec<u8>)) {
        let mut bytes = Vec::new();
        write_tag(&mut bytes, number, wire_type);
        write(&mut bytes);
        self.entries.push((number, bytes));
    }

    /// Emit an `int32`/`enum` field; negative values take ten bytes like protobuf-java
    pub fn int32(&mut self, number: u32, value: i32) {
        self.push(number, WireType::Varint, |b| write_varint(b, value as i64 as u64));
    }

    /// Emit an optional `int32`
    pub fn opt_int32(&mut self, number: u32, value: Option<i32>) {
        if let Some(value) = value {
            self.int32(number, value);
        }
    }

    /// Emit an optional `bool`
    pub fn opt_bool(&mut self, number: u32, value: Option<bool>) {
        if let Some(value) = value {
            self.push(number, WireType::Varint, |b| b.push(u8::from(value)));
        }
    }

    /// Emit an optional zigzag-encoded `sint64`
    pub fn opt_sint64(&mut self, number: u32, value: Option<i64>) {
        if let Some(value) = value {
            let zigzag = ((value << 1) ^ (value >> 63)) as u64;
            self.push(number, WireType::Varint, |b| write_varint(b, zigzag));
        }
    }

    /// Emit an optional `float`
    pub fn opt_float(&mut self, number: u32, value: Option<f32>) {
        if let Some(value) = value {
            self.push(number, WireType::Fixed32, |b| {
                b.extend_from_slice(&value.to_bits().to_le_bytes())
            });
        }
    }

    /// Emit an optional `double`
    pub fn opt_double(&mut self, number: u32, value: Option<f64>) {
        if let Some(value) = value {
            self.push(number, WireType::Fixed64, |b| {
                b.extend_from_slice(&value.to_bits().to_le_bytes())
            });
        }
    }

    /// Emit a length-delimited field (bytes, string or nested message)
    pub fn bytes(&mut self, number: u32, data: &[u8]) {
        self.push(number, WireType::Len, |b| {
            write_varint(b, data.len() as u64);
            b.extend_from_slice(data);
        });
    }

    /// Emit a nested message
    pub fn message(&mut self, number: u32, encoded: Vec<u8>) {
        self.bytes(number, &encoded);
    }

    /// Emit a packed repeated `int32`; nothing is written for an empty list
    pub fn packed_int32(&mut self, number: u32, values: &[i32]) {
        if values.is_empty() {
            return;
        }
        let mut packed = Vec::new();
        for &value in values {
            write_varint(&mut packed, value as i64 as u64);
        }
        self.bytes(number, &packed);
    }

    /// Emit an unpacked repeated `int32`
    pub fn repeated_int32(&mut self, number: u32, values: &[i32]) {
        for &value in values {
            self.int32(number, value);
        }
    }

    /// Re-emit fields that were not recognised on decode
    pub fn unknown(&mut self, fields: &UnknownFields) {
        for field in fields.iter() {
            self.push(field.number, field.wire_type, |b| {
                if field.wire_type == WireType::Len {
                    write_varint(b, field.data.len() as u64);
                }
                b.extend_from_slice(&field.data);
            });
        }
    }

    /// Concatenate everything in field-number order
    pub fn finish(mut self) -> Vec<u8> {
        self.entries.sort_by_key(|(number, _)| *number);
        let mut out = Vec::with_capacity(self.entries.iter().map(|(_, b)| b.len()).sum());
        for (_, bytes) in self.entries {
            out.extend_from_slice(&bytes);
        }
        out
    }
}

/// Protobuf reader over a borrowed buffer
pub struct ProtoReader<'a> {
    buffer: &'a [u8],
    position: usize,
    depth: usize,
}

impl<'a> ProtoReader<'a> {
    /// Create a new reader
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            position: 0,
            depth: 0,
        }
    }

    /// Read a length-delimited nested message and return a reader over it
    ///
    /// Fails once nesting passes [`MAX_NESTING_DEPTH`].
    pub fn nested(&mut self) -> Result<ProtoReader<'a>, DecodeError> {
        let offset = self.position;
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(DecodeError::RecursionLimit(MAX_NESTING_DEPTH, offset));
        }
        let buffer = self.read_len_slice()?;
        Ok(ProtoReader {
            buffer,
            position: 0,
            depth: self.depth + 1,
        })
    }

    /// Get the current position in the buffer
    pub fn position(&self) -> usize {
        self.position
    }

    /// Get the remaining bytes in the buffer
    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.position)
    }

    /// Check if there are more bytes to read
    pub fn has_more(&self) -> bool {
        self.position < self.buffer.len()
    }

    /// Everything from the current position onwards
    pub fn rest(&self) -> &'a [u8] {
        &self.buffer[self.position.min(self.buffer.len())..]
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8], DecodeError> {
        if count > self.remaining() {
            return Err(DecodeError::UnexpectedEnd(self.position));
        }
        let bytes = &self.buffer[self.position..self.position + count];
        self.position += count;
        Ok(bytes)
    }

    /// Read a base-128 varint
    pub fn read_varint(&mut self) -> Result<u64, DecodeError> {
        let start = self.position;
        let mut value = 0u64;
        for shift in (0..70).step_by(7) {
            let Some(&byte) = self.buffer.get(self.position) else {
                return Err(DecodeError::UnexpectedEnd(self.position));
            };
            self.position += 1;
            value |= u64::from(byte & 0x7F) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(DecodeError::MalformedVarint(start))
    }

    /// Read a field tag
    pub fn read_tag(&mut self) -> Result<(u32, WireType), DecodeError> {
        let offset = self.position;
        let key = self.read_varint()?;
        let number = (key >> 3) as u32;
        if number == 0 {
            return Err(DecodeError::InvalidFieldNumber(offset));
        }
        let raw = (key & 0x7) as u8;
        let wire_type =
            WireType::from_u8(raw).ok_or(DecodeError::UnsupportedWireType(raw, offset))?;
        Ok((number, wire_type))
    }

    /// Read an `int32`/`enum` value
    pub fn read_int32(&mut self) -> Result<i32, DecodeError> {
        Ok(self.read_varint()? as i32)
    }

    /// Read a `bool` value
    pub fn read_bool(&mut self) -> Result<bool, DecodeError> {
        Ok(self.read_varint()? != 0)
    }

    /// Read a zigzag-encoded `sint64` value
    pub fn read_sint64(&mut self) -> Result<i64, DecodeError> {
        let raw = self.read_varint()?;
        Ok(((raw >> 1) as i64) ^ -((raw & 1) as i64))
    }

    /// Read a `float` value
    pub fn read_float(&mut self) -> Result<f32, DecodeError> {
        let bytes = self.take(4)?;
        Ok(f32::from_bits(u32::from_le_bytes([
            bytes[0], bytes[1], bytes[2], bytes[3],
        ])))
    }

    /// Read a `double` value
    pub fn read_double(&mut self) -> Result<f64, DecodeError> {
        let bytes = self.take(8)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(bytes);
        Ok(f64::from_bits(u64::from_le_bytes(raw)))
    }

    /// Read a length-delimited slice
    pub fn read_len_slice(&mut self) -> Result<&'a [u8], DecodeError> {
        let len = self.read_varint()? as usize;
        self.take(len)
    }

    /// Read a protobuf `string`
    pub fn read_string(&mut self) -> Result<String, DecodeError> {
        let offset = self.position;
        let bytes = self.read_len_slice()?;
        String::from_utf8(bytes.to_vec()).map_err(|_| DecodeError::InvalidUtf8(offset))
    }

    /// Read a repeated `int32`, accepting both packed and unpacked encodings
    pub fn read_packed_int32(&mut self, wire_type: WireType) -> Result<Vec<i32>, DecodeError> {
        if wire_type != WireType::Len {
            return Ok(vec![self.read_int32()?]);
        }
        let mut packed = ProtoReader::new(self.read_len_slice()?);
        let mut values = Vec::new();
        while packed.has_more() {
            values.push(packed.read_int32()?);
        }
        Ok(values)
    }

    /// Capture a field's value bytes without interpreting them
    pub fn skip_field(&mut self, number: u32, wire_type: WireType) -> Result<RawField, DecodeError> {
        let data = match wire_type {
            WireType::Varint => {
                let start = self.position;
                self.read_varint()?;
                self.buffer[start..self.position].to_vec()
            }
            WireType::Fixed64 => self.take(8)?.to_vec(),
            WireType::Fixed32 => self.take(4)?.to_vec(),
            WireType::Len => self.read_len_slice()?.to_vec(),
        };
        Ok(RawField {
            number,
            wire_type,
            data,
        })
    }
}
