//! JVM signature extension messages

use super::{read_message, write_message, write_string, Message};
use crate::strings::{NameResolver, StringTableBuilder};
use crate::wire::{DecodeError, FieldSink, ProtoReader, UnknownFields, WireType};
use serde::Serialize;

/// JVM name and method descriptor of a function or constructor
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct JvmMethodSignature {
    /// Method name; absent when it equals the declaration name
    pub name: Option<String>,
    /// Method descriptor, e.g. `(La/b/C;)V`
    pub desc: Option<String>,
    /// Unrecognised fields
    pub unknown: UnknownFields,
}

impl JvmMethodSignature {
    /// Create a signature with both parts set
    pub fn new(name: impl Into<String>, desc: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            desc: Some(desc.into()),
            unknown: UnknownFields::default(),
        }
    }
}

impl Message for JvmMethodSignature {
    fn decode(reader: &mut ProtoReader<'_>, names: &NameResolver<'_>) -> Result<Self, DecodeError> {
        let mut signature = Self::default();
        while reader.has_more() {
            let (field, wire_type) = reader.read_tag()?;
            match (field, wire_type) {
                (1, WireType::Varint) => signature.name = Some(names.string(reader.read_int32()?)?),
                (2, WireType::Varint) => signature.desc = Some(names.string(reader.read_int32()?)?),
                _ => signature.unknown.push(reader.skip_field(field, wire_type)?),
            }
        }
        Ok(signature)
    }

    fn encode(&self, strings: &mut StringTableBuilder) -> Vec<u8> {
        let mut out = FieldSink::new();
        write_string(&mut out, 1, self.name.as_deref(), strings);
        write_string(&mut out, 2, self.desc.as_deref(), strings);
        out.unknown(&self.unknown);
        out.finish()
    }
}

/// JVM name and field descriptor of a property's backing field
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct JvmFieldSignature {
    /// Field name; absent when it equals the property name
    pub name: Option<String>,
    /// Field descriptor, e.g. `La/b/C;`
    pub desc: Option<String>,
    /// Unrecognised fields
    pub unknown: UnknownFields,
}

impl JvmFieldSignature {
    /// Create a signature with both parts set
    pub fn new(name: impl Into<String>, desc: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            desc: Some(desc.into()),
            unknown: UnknownFields::default(),
        }
    }
}

impl Message for JvmFieldSignature {
    fn decode(reader: &mut ProtoReader<'_>, names: &NameResolver<'_>) -> Result<Self, DecodeError> {
        let mut signature = Self::default();
        while reader.has_more() {
            let (field, wire_type) = reader.read_tag()?;
            match (field, wire_type) {
                (1, WireType::Varint) => signature.name = Some(names.string(reader.read_int32()?)?),
                (2, WireType::Varint) => signature.desc = Some(names.string(reader.read_int32()?)?),
                _ => signature.unknown.push(reader.skip_field(field, wire_type)?),
            }
        }
        Ok(signature)
    }

    fn encode(&self, strings: &mut StringTableBuilder) -> Vec<u8> {
        let mut out = FieldSink::new();
        write_string(&mut out, 1, self.name.as_deref(), strings);
        write_string(&mut out, 2, self.desc.as_deref(), strings);
        out.unknown(&self.unknown);
        out.finish()
    }
}

/// Everything the JVM backend emitted for a property
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct JvmPropertySignature {
    /// Backing field
    pub field: Option<JvmFieldSignature>,
    /// Synthetic method holding the property's annotations
    pub synthetic_method: Option<JvmMethodSignature>,
    /// Getter
    pub getter: Option<JvmMethodSignature>,
    /// Setter
    pub setter: Option<JvmMethodSignature>,
    /// `getDelegate` method of a delegated property
    pub delegate_method: Option<JvmMethodSignature>,
    /// Unrecognised fields
    pub unknown: UnknownFields,
}

impl Message for JvmPropertySignature {
    fn decode(reader: &mut ProtoReader<'_>, names: &NameResolver<'_>) -> Result<Self, DecodeError> {
        let mut signature = Self::default();
        while reader.has_more() {
            let (field, wire_type) = reader.read_tag()?;
            match (field, wire_type) {
                (1, WireType::Len) => signature.field = Some(read_message(reader, names)?),
                (2, WireType::Len) => {
                    signature.synthetic_method = Some(read_message(reader, names)?)
                }
                (3, WireType::Len) => signature.getter = Some(read_message(reader, names)?),
                (4, WireType::Len) => signature.setter = Some(read_message(reader, names)?),
                (5, WireType::Len) => signature.delegate_method = Some(read_message(reader, names)?),
                _ => signature.unknown.push(reader.skip_field(field, wire_type)?),
            }
        }
        Ok(signature)
    }

    fn encode(&self, strings: &mut StringTableBuilder) -> Vec<u8> {
        let mut out = FieldSink::new();
        write_message(&mut out, 1, self.field.as_ref(), strings);
        write_message(&mut out, 2, self.synthetic_method.as_ref(), strings);
        write_message(&mut out, 3, self.getter.as_ref(), strings);
        write_message(&mut out, 4, self.setter.as_ref(), strings);
        write_message(&mut out, 5, self.delegate_method.as_ref(), strings);
        out.unknown(&self.unknown);
        out.finish()
    }
}
