//! The JVM metadata string table
//!
//! Names inside the payload are indices. Index `i` resolves through record
//! `i` of the `StringTableTypes` message (records carry a range, so one record
//! may cover many indices) and, unless the record says otherwise, the `d2`
//! string at `i`. Class names whose index is listed in `local_name` are local
//! classes and are surfaced with a leading [`LOCAL_CLASS_MARKER`].

use crate::wire::{DecodeError, FieldSink, ProtoReader, UnknownFields, WireType};
use rustc_hash::{FxHashMap, FxHashSet};

/// Prefix marking a local (function-scoped) class name
pub const LOCAL_CLASS_MARKER: char = '.';

/// Strings every reader knows without them being written to `d2`
pub const PREDEFINED_STRINGS: [&str; 44] = [
    "kotlin/Any",
    "kotlin/Nothing",
    "kotlin/Unit",
    "kotlin/Throwable",
    "kotlin/Number",
    "kotlin/Byte",
    "kotlin/Double",
    "kotlin/Float",
    "kotlin/Int",
    "kotlin/Long",
    "kotlin/Short",
    "kotlin/Boolean",
    "kotlin/Char",
    "kotlin/CharSequence",
    "kotlin/String",
    "kotlin/Comparable",
    "kotlin/Enum",
    "kotlin/Array",
    "kotlin/ByteArray",
    "kotlin/DoubleArray",
    "kotlin/FloatArray",
    "kotlin/IntArray",
    "kotlin/LongArray",
    "kotlin/ShortArray",
    "kotlin/BooleanArray",
    "kotlin/CharArray",
    "kotlin/Cloneable",
    "kotlin/Annotation",
    "kotlin/collections/Iterable",
    "kotlin/collections/MutableIterable",
    "kotlin/collections/Collection",
    "kotlin/collections/MutableCollection",
    "kotlin/collections/List",
    "kotlin/collections/MutableList",
    "kotlin/collections/Set",
    "kotlin/collections/MutableSet",
    "kotlin/collections/Map",
    "kotlin/collections/MutableMap",
    "kotlin/collections/Map.Entry",
    "kotlin/collections/MutableMap.MutableEntry",
    "kotlin/collections/Iterator",
    "kotlin/collections/MutableIterator",
    "kotlin/collections/ListIterator",
    "kotlin/collections/MutableListIterator",
];

fn predefined_index(name: &str) -> Option<i32> {
    PREDEFINED_STRINGS
        .iter()
        .position(|s| *s == name)
        .map(|i| i as i32)
}

/// Post-processing a record applies to its string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Use the string as is
    None,
    /// `a/b/C$D` becomes `a/b/C.D`
    InternalToClassId,
    /// `La/b/C$D;` becomes `a/b/C.D`
    DescToClassId,
}

impl Operation {
    fn from_i32(value: i32) -> Self {
        match value {
            1 => Self::InternalToClassId,
            2 => Self::DescToClassId,
            _ => Self::None,
        }
    }

    fn to_i32(self) -> i32 {
        match self {
            Self::None => 0,
            Self::InternalToClassId => 1,
            Self::DescToClassId => 2,
        }
    }
}

/// One `StringTableTypes.Record`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    /// How many consecutive indices this record covers (absent means one)
    pub range: Option<i32>,
    /// Index into [`PREDEFINED_STRINGS`]
    pub predefined_index: Option<i32>,
    /// Inline string overriding `d2`
    pub string: Option<String>,
    /// Operation applied last
    pub operation: Option<Operation>,
    /// `[begin, end]` substring applied first
    pub substring_index: Vec<i32>,
    /// `[from, to]` char replacement applied second
    pub replace_char: Vec<i32>,
    /// Unrecognised fields
    pub unknown: UnknownFields,
}

impl Record {
    /// Whether `other` resolves the same way, ignoring `range`
    fn same_shape(&self, other: &Record) -> bool {
        self.predefined_index == other.predefined_index
            && self.string == other.string
            && self.operation == other.operation
            && self.substring_index == other.substring_index
            && self.replace_char == other.replace_char
            && self.unknown == other.unknown
    }

    fn decode(reader: &mut ProtoReader<'_>) -> Result<Self, DecodeError> {
        let mut record = Self::default();
        while reader.has_more() {
            let (field, wire_type) = reader.read_tag()?;
            match (field, wire_type) {
                (1, WireType::Varint) => record.range = Some(reader.read_int32()?),
                (2, WireType::Varint) => record.predefined_index = Some(reader.read_int32()?),
                (3, WireType::Varint) => {
                    record.operation = Some(Operation::from_i32(reader.read_int32()?))
                }
                (4, WireType::Varint | WireType::Len) => record
                    .substring_index
                    .extend(reader.read_packed_int32(wire_type)?),
                (5, WireType::Varint | WireType::Len) => record
                    .replace_char
                    .extend(reader.read_packed_int32(wire_type)?),
                (6, WireType::Len) => record.string = Some(reader.read_string()?),
                _ => record.unknown.push(reader.skip_field(field, wire_type)?),
            }
        }
        Ok(record)
    }

    fn encode(&self) -> Vec<u8> {
        let mut out = FieldSink::new();
        out.opt_int32(1, self.range);
        out.opt_int32(2, self.predefined_index);
        out.opt_int32(3, self.operation.map(Operation::to_i32));
        out.packed_int32(4, &self.substring_index);
        out.packed_int32(5, &self.replace_char);
        if let Some(string) = &self.string {
            out.bytes(6, string.as_bytes());
        }
        out.unknown(&self.unknown);
        out.finish()
    }
}

/// The `StringTableTypes` message heading every `d1` payload
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StringTableTypes {
    /// Records, each covering `range` indices
    pub records: Vec<Record>,
    /// Indices of class names that are local classes
    pub local_names: Vec<i32>,
    /// Unrecognised fields
    pub unknown: UnknownFields,
}

impl StringTableTypes {
    /// Decode the message body
    pub fn decode(reader: &mut ProtoReader<'_>) -> Result<Self, DecodeError> {
        let mut table = Self::default();
        while reader.has_more() {
            let (field, wire_type) = reader.read_tag()?;
            match (field, wire_type) {
                (1, WireType::Len) => {
                    let mut nested = ProtoReader::new(reader.read_len_slice()?);
                    table.records.push(Record::decode(&mut nested)?);
                }
                (5, WireType::Varint | WireType::Len) => table
                    .local_names
                    .extend(reader.read_packed_int32(wire_type)?),
                _ => table.unknown.push(reader.skip_field(field, wire_type)?),
            }
        }
        Ok(table)
    }

    /// Encode the message body
    pub fn encode(&self) -> Vec<u8> {
        let mut out = FieldSink::new();
        for record in &self.records {
            out.message(1, record.encode());
        }
        out.packed_int32(5, &self.local_names);
        out.unknown(&self.unknown);
        out.finish()
    }
}

/// Resolves payload indices to names
#[derive(Debug)]
pub struct NameResolver<'a> {
    strings: &'a [String],
    records: Vec<&'a Record>,
    local_names: FxHashSet<i32>,
}

impl<'a> NameResolver<'a> {
    /// Build a resolver over a decoded table and the `d2` strings
    pub fn new(types: &'a StringTableTypes, strings: &'a [String]) -> Self {
        // Indices past `d2` never resolve, so ranges are clamped to it
        let mut records = Vec::with_capacity(strings.len());
        for record in &types.records {
            let remaining = strings.len() - records.len();
            if remaining == 0 {
                break;
            }
            let range = usize::try_from(record.range.unwrap_or(1)).unwrap_or(0);
            records.extend(std::iter::repeat(record).take(range.min(remaining)));
        }
        Self {
            strings,
            records,
            local_names: types.local_names.iter().copied().collect(),
        }
    }

    /// Resolve a plain string
    pub fn string(&self, index: i32) -> Result<String, DecodeError> {
        let slot = usize::try_from(index).map_err(|_| DecodeError::StringIndexOutOfRange(index))?;
        let record = self.records.get(slot).copied();
        let d2 = self.strings.get(slot);

        let mut string = match record {
            Some(Record {
                string: Some(inline),
                ..
            }) => inline.clone(),
            Some(Record {
                predefined_index: Some(predefined),
                ..
            }) if (0..PREDEFINED_STRINGS.len() as i32).contains(predefined) => {
                PREDEFINED_STRINGS[*predefined as usize].to_string()
            }
            _ => d2
                .cloned()
                .ok_or(DecodeError::StringIndexOutOfRange(index))?,
        };

        let Some(record) = record else {
            return Ok(string);
        };

        if let [begin, end, ..] = record.substring_index[..] {
            let chars: Vec<char> = string.chars().collect();
            if begin < 0 || end < begin || end as usize > chars.len() {
                return Err(DecodeError::InvalidSubstring { index, begin, end });
            }
            string = chars[begin as usize..end as usize].iter().collect();
        }

        if let [from, to, ..] = record.replace_char[..] {
            if let (Some(from), Some(to)) = (char::from_u32(from as u32), char::from_u32(to as u32)) {
                string = string.replace(from, &to.to_string());
            }
        }

        match record.operation.unwrap_or(Operation::None) {
            Operation::None => {}
            Operation::InternalToClassId => string = string.replace('$', "."),
            Operation::DescToClassId => {
                let chars: Vec<char> = string.chars().collect();
                if chars.len() >= 2 {
                    string = chars[1..chars.len() - 1].iter().collect();
                }
                string = string.replace('$', ".");
            }
        }

        Ok(string)
    }

    /// Resolve a class name, prefixing local classes with [`LOCAL_CLASS_MARKER`]
    pub fn class_name(&self, index: i32) -> Result<String, DecodeError> {
        let name = self.string(index)?;
        if self.local_names.contains(&index) {
            Ok(format!("{LOCAL_CLASS_MARKER}{name}"))
        } else {
            Ok(name)
        }
    }
}

/// Interns names while a payload is written
#[derive(Debug, Default)]
pub struct StringTableBuilder {
    strings: Vec<String>,
    records: Vec<Record>,
    local_names: Vec<i32>,
    plain: FxHashMap<String, i32>,
    classes: FxHashMap<String, i32>,
}

impl StringTableBuilder {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a `d2` entry resolved by `record`
    ///
    /// A record shaped like the previous one widens its range instead.
    fn push(&mut self, string: String, record: Record) -> i32 {
        let index = self.strings.len() as i32;
        self.strings.push(string);
        match self.records.last_mut() {
            Some(last) if last.same_shape(&record) => {
                last.range = Some(last.range.unwrap_or(1) + 1)
            }
            _ => self.records.push(record),
        }
        index
    }

    /// Index of a plain string
    pub fn string(&mut self, string: &str) -> i32 {
        if let Some(&index) = self.plain.get(string) {
            return index;
        }
        let index = self.push(string.to_string(), Record::default());
        self.plain.insert(string.to_string(), index);
        index
    }

    /// Index of a class name; a leading [`LOCAL_CLASS_MARKER`] marks it local
    pub fn class_name(&mut self, name: &str) -> i32 {
        if let Some(&index) = self.classes.get(name) {
            return index;
        }

        let (local, bare) = match name.strip_prefix(LOCAL_CLASS_MARKER) {
            Some(bare) => (true, bare),
            None => (false, name),
        };

        let index = match predefined_index(bare) {
            Some(predefined) if !local => self.push(
                String::new(),
                Record {
                    predefined_index: Some(predefined),
                    ..Record::default()
                },
            ),
            // `$` would not survive the class id conversion
            _ if bare.contains('$') => self.push(bare.to_string(), Record::default()),
            _ => self.push(
                format!("L{};", bare.replace('.', "$")),
                Record {
                    operation: Some(Operation::DescToClassId),
                    ..Record::default()
                },
            ),
        };

        if local {
            self.local_names.push(index);
        }
        self.classes.insert(name.to_string(), index);
        index
    }

    /// Finish the table, returning the types message and the `d2` strings
    pub fn finish(self) -> (StringTableTypes, Vec<String>) {
        let types = StringTableTypes {
            records: self.records,
            local_names: self.local_names,
            unknown: UnknownFields::default(),
        };
        (types, self.strings)
    }
}
