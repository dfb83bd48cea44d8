//! Typed tree model of the Kotlin JVM metadata protobuf schema
//!
//! Each struct mirrors one protobuf message. Names are resolved through the
//! string table while decoding and re-interned while encoding, so the tree
//! only ever holds plain strings. JVM extension fields sit next to the
//! platform-neutral ones. Fields a message does not recognise are kept in its
//! `unknown` list and written back in place.

mod callable;
mod class;
mod jvm;
mod types;

pub use callable::{
    KmConstructor, KmContract, KmEffect, KmEffectExpression, KmFunction, KmLambda, KmProperty,
    KmTypeAlias, KmValueParameter,
};
pub use class::{KmClass, KmEnumEntry, KmPackage};
pub use jvm::{JvmFieldSignature, JvmMethodSignature, JvmPropertySignature};
pub use types::{
    KmAnnotation, KmAnnotationArgument, KmAnnotationValue, KmType, KmTypeParameter,
    KmTypeProjection, KmTypeTable, KmVersionRequirement, KmVersionRequirementTable,
};

use crate::strings::{NameResolver, StringTableBuilder};
use crate::wire::{DecodeError, FieldSink, ProtoReader, WireType};

/// `Type.Argument.Projection` values
pub mod projection {
    /// `in T`
    pub const IN: i32 = 0;
    /// `out T`
    pub const OUT: i32 = 1;
    /// `T`
    pub const INV: i32 = 2;
    /// `*`
    pub const STAR: i32 = 3;
}

/// `TypeParameter.Variance` values
pub mod variance {
    /// `in T`
    pub const IN: i32 = 0;
    /// `out T`
    pub const OUT: i32 = 1;
    /// `T`
    pub const INV: i32 = 2;
}

/// A protobuf message of the metadata schema
pub trait Message: Sized {
    /// Decode the message body; names resolve through `names`
    fn decode(reader: &mut ProtoReader<'_>, names: &NameResolver<'_>) -> Result<Self, DecodeError>;

    /// Encode the message body; names are interned into `strings`
    fn encode(&self, strings: &mut StringTableBuilder) -> Vec<u8>;
}

/// Decode a length-delimited nested message
pub(crate) fn read_message<T: Message>(
    reader: &mut ProtoReader<'_>,
    names: &NameResolver<'_>,
) -> Result<T, DecodeError> {
    let mut nested = reader.nested()?;
    T::decode(&mut nested, names)
}

/// Decode a repeated string index field
pub(crate) fn read_strings(
    reader: &mut ProtoReader<'_>,
    wire_type: WireType,
    names: &NameResolver<'_>,
) -> Result<Vec<String>, DecodeError> {
    reader
        .read_packed_int32(wire_type)?
        .into_iter()
        .map(|index| names.string(index))
        .collect()
}

/// Decode a repeated class name index field
pub(crate) fn read_class_names(
    reader: &mut ProtoReader<'_>,
    wire_type: WireType,
    names: &NameResolver<'_>,
) -> Result<Vec<String>, DecodeError> {
    reader
        .read_packed_int32(wire_type)?
        .into_iter()
        .map(|index| names.class_name(index))
        .collect()
}

pub(crate) fn write_message<T: Message>(
    out: &mut FieldSink,
    number: u32,
    message: Option<&T>,
    strings: &mut StringTableBuilder,
) {
    if let Some(message) = message {
        out.message(number, message.encode(strings));
    }
}

pub(crate) fn write_messages<T: Message>(
    out: &mut FieldSink,
    number: u32,
    messages: &[T],
    strings: &mut StringTableBuilder,
) {
    for message in messages {
        out.message(number, message.encode(strings));
    }
}

pub(crate) fn write_string(
    out: &mut FieldSink,
    number: u32,
    value: Option<&str>,
    strings: &mut StringTableBuilder,
) {
    if let Some(value) = value {
        out.int32(number, strings.string(value));
    }
}

pub(crate) fn write_class_name(
    out: &mut FieldSink,
    number: u32,
    value: Option<&str>,
    strings: &mut StringTableBuilder,
) {
    if let Some(value) = value {
        out.int32(number, strings.class_name(value));
    }
}

/// Decode a root message from a full `d1` payload
pub(crate) fn decode_root<T: Message>(
    bytes: &[u8],
    strings: &[String],
) -> Result<T, DecodeError> {
    use crate::strings::StringTableTypes;

    let mut reader = ProtoReader::new(bytes);
    let mut table_reader = ProtoReader::new(reader.read_len_slice()?);
    let types = StringTableTypes::decode(&mut table_reader)?;
    let names = NameResolver::new(&types, strings);
    let mut body = ProtoReader::new(reader.rest());
    T::decode(&mut body, &names)
}

/// Encode a root message into `d1` payload bytes and `d2` strings
pub(crate) fn encode_root<T: Message>(message: &T) -> (Vec<u8>, Vec<String>) {
    let mut strings = StringTableBuilder::new();
    let body = message.encode(&mut strings);
    let (types, d2) = strings.finish();

    let table = types.encode();
    let mut bytes = Vec::with_capacity(table.len() + body.len() + 5);
    crate::wire::write_varint(&mut bytes, table.len() as u64);
    bytes.extend_from_slice(&table);
    bytes.extend_from_slice(&body);
    (bytes, d2)
}
