//! Class and package roots

use super::{
    read_class_names, read_message, read_strings, write_message, write_messages, write_string,
    KmConstructor, KmFunction, KmProperty, KmType, KmTypeAlias, KmTypeParameter, KmTypeTable,
    KmVersionRequirementTable, Message,
};
use crate::strings::{NameResolver, StringTableBuilder};
use crate::wire::{DecodeError, FieldSink, ProtoReader, UnknownFields, WireType};
use serde::Serialize;

/// A class, interface, object or enum
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KmClass {
    /// Flags
    pub flags: Option<i32>,
    /// Class name, `.` between nested segments
    pub name: String,
    /// Simple name of the companion object
    pub companion_object_name: Option<String>,
    /// Type parameters
    pub type_parameters: Vec<KmTypeParameter>,
    /// Supertypes
    pub supertypes: Vec<KmType>,
    /// Supertypes, by type table index
    pub supertype_ids: Vec<i32>,
    /// Simple names of nested classes
    pub nested_class_names: Vec<String>,
    /// Context receivers
    pub context_receiver_types: Vec<KmType>,
    /// Context receivers, by type table index
    pub context_receiver_type_ids: Vec<i32>,
    /// Constructors
    pub constructors: Vec<KmConstructor>,
    /// Functions
    pub functions: Vec<KmFunction>,
    /// Properties
    pub properties: Vec<KmProperty>,
    /// Type aliases
    pub type_aliases: Vec<KmTypeAlias>,
    /// Enum entries
    pub enum_entries: Vec<KmEnumEntry>,
    /// Direct subclasses of a sealed class
    pub sealed_subclasses: Vec<String>,
    /// Property backing an inline class
    pub inline_class_underlying_property_name: Option<String>,
    /// Type backing an inline class
    pub inline_class_underlying_type: Option<KmType>,
    /// Type backing an inline class, by type table index
    pub inline_class_underlying_type_id: Option<i32>,
    /// Property names of a multi-field value class
    pub multi_field_value_class_underlying_names: Vec<String>,
    /// Property types of a multi-field value class
    pub multi_field_value_class_underlying_types: Vec<KmType>,
    /// Property types of a multi-field value class, by type table index
    pub multi_field_value_class_underlying_type_ids: Vec<i32>,
    /// Type table
    pub type_table: Option<KmTypeTable>,
    /// Version requirement indices
    pub version_requirements: Vec<i32>,
    /// Version requirement table
    pub version_requirement_table: Option<KmVersionRequirementTable>,
    /// Module name (JVM)
    pub module_name: Option<String>,
    /// Local delegated properties (JVM)
    pub local_delegated_properties: Vec<KmProperty>,
    /// Class an anonymous object type was copied from (JVM)
    pub anonymous_object_origin_name: Option<String>,
    /// JVM-specific flags
    pub jvm_flags: Option<i32>,
    /// Unrecognised fields
    pub unknown: UnknownFields,
}

impl KmClass {
    /// Create a class with only a name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

impl Message for KmClass {
    fn decode(reader: &mut ProtoReader<'_>, names: &NameResolver<'_>) -> Result<Self, DecodeError> {
        let mut class = Self::default();
        let mut name = None;
        while reader.has_more() {
            let (field, wire_type) = reader.read_tag()?;
            match (field, wire_type) {
                (1, WireType::Varint) => class.flags = Some(reader.read_int32()?),
                (2, WireType::Varint | WireType::Len) => class
                    .supertype_ids
                    .extend(reader.read_packed_int32(wire_type)?),
                (3, WireType::Varint) => name = Some(names.class_name(reader.read_int32()?)?),
                (4, WireType::Varint) => {
                    class.companion_object_name = Some(names.string(reader.read_int32()?)?)
                }
                (5, WireType::Len) => class.type_parameters.push(read_message(reader, names)?),
                (6, WireType::Len) => class.supertypes.push(read_message(reader, names)?),
                (7, WireType::Varint | WireType::Len) => class
                    .nested_class_names
                    .extend(read_strings(reader, wire_type, names)?),
                (8, WireType::Len) => class.constructors.push(read_message(reader, names)?),
                (9, WireType::Len) => class.functions.push(read_message(reader, names)?),
                (10, WireType::Len) => class.properties.push(read_message(reader, names)?),
                (11, WireType::Len) => class.type_aliases.push(read_message(reader, names)?),
                (13, WireType::Len) => class.enum_entries.push(read_message(reader, names)?),
                (16, WireType::Varint | WireType::Len) => class
                    .sealed_subclasses
                    .extend(read_class_names(reader, wire_type, names)?),
                (17, WireType::Varint) => {
                    class.inline_class_underlying_property_name =
                        Some(names.string(reader.read_int32()?)?)
                }
                (18, WireType::Len) => {
                    class.inline_class_underlying_type = Some(read_message(reader, names)?)
                }
                (19, WireType::Varint) => {
                    class.inline_class_underlying_type_id = Some(reader.read_int32()?)
                }
                (20, WireType::Len) => class.context_receiver_types.push(read_message(reader, names)?),
                (21, WireType::Varint | WireType::Len) => class
                    .context_receiver_type_ids
                    .extend(reader.read_packed_int32(wire_type)?),
                (22, WireType::Varint | WireType::Len) => class
                    .multi_field_value_class_underlying_names
                    .extend(read_strings(reader, wire_type, names)?),
                (23, WireType::Len) => class
                    .multi_field_value_class_underlying_types
                    .push(read_message(reader, names)?),
                (24, WireType::Varint | WireType::Len) => class
                    .multi_field_value_class_underlying_type_ids
                    .extend(reader.read_packed_int32(wire_type)?),
                (30, WireType::Len) => class.type_table = Some(read_message(reader, names)?),
                (31, WireType::Varint | WireType::Len) => class
                    .version_requirements
                    .extend(reader.read_packed_int32(wire_type)?),
                (32, WireType::Len) => {
                    class.version_requirement_table = Some(read_message(reader, names)?)
                }
                (101, WireType::Varint) => {
                    class.module_name = Some(names.string(reader.read_int32()?)?)
                }
                (102, WireType::Len) => class
                    .local_delegated_properties
                    .push(read_message(reader, names)?),
                (103, WireType::Varint) => {
                    class.anonymous_object_origin_name = Some(names.string(reader.read_int32()?)?)
                }
                (104, WireType::Varint) => class.jvm_flags = Some(reader.read_int32()?),
                _ => class.unknown.push(reader.skip_field(field, wire_type)?),
            }
        }
        class.name = name.ok_or(DecodeError::MissingField("Class.fq_name"))?;
        Ok(class)
    }

    fn encode(&self, strings: &mut StringTableBuilder) -> Vec<u8> {
        let mut out = FieldSink::new();
        out.opt_int32(1, self.flags);
        out.packed_int32(2, &self.supertype_ids);
        out.int32(3, strings.class_name(&self.name));
        write_string(&mut out, 4, self.companion_object_name.as_deref(), strings);
        write_messages(&mut out, 5, &self.type_parameters, strings);
        write_messages(&mut out, 6, &self.supertypes, strings);
        let nested: Vec<i32> = self
            .nested_class_names
            .iter()
            .map(|name| strings.string(name))
            .collect();
        out.packed_int32(7, &nested);
        write_messages(&mut out, 8, &self.constructors, strings);
        write_messages(&mut out, 9, &self.functions, strings);
        write_messages(&mut out, 10, &self.properties, strings);
        write_messages(&mut out, 11, &self.type_aliases, strings);
        write_messages(&mut out, 13, &self.enum_entries, strings);
        let sealed: Vec<i32> = self
            .sealed_subclasses
            .iter()
            .map(|name| strings.class_name(name))
            .collect();
        out.packed_int32(16, &sealed);
        write_string(
            &mut out,
            17,
            self.inline_class_underlying_property_name.as_deref(),
            strings,
        );
        write_message(&mut out, 18, self.inline_class_underlying_type.as_ref(), strings);
        out.opt_int32(19, self.inline_class_underlying_type_id);
        write_messages(&mut out, 20, &self.context_receiver_types, strings);
        out.packed_int32(21, &self.context_receiver_type_ids);
        let multi_field: Vec<i32> = self
            .multi_field_value_class_underlying_names
            .iter()
            .map(|name| strings.string(name))
            .collect();
        out.packed_int32(22, &multi_field);
        write_messages(&mut out, 23, &self.multi_field_value_class_underlying_types, strings);
        out.packed_int32(24, &self.multi_field_value_class_underlying_type_ids);
        write_message(&mut out, 30, self.type_table.as_ref(), strings);
        out.repeated_int32(31, &self.version_requirements);
        write_message(&mut out, 32, self.version_requirement_table.as_ref(), strings);
        write_string(&mut out, 101, self.module_name.as_deref(), strings);
        write_messages(&mut out, 102, &self.local_delegated_properties, strings);
        write_string(&mut out, 103, self.anonymous_object_origin_name.as_deref(), strings);
        out.opt_int32(104, self.jvm_flags);
        out.unknown(&self.unknown);
        out.finish()
    }
}

/// Top-level declarations of a file facade or multi-file class part
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KmPackage {
    /// Functions
    pub functions: Vec<KmFunction>,
    /// Properties
    pub properties: Vec<KmProperty>,
    /// Type aliases
    pub type_aliases: Vec<KmTypeAlias>,
    /// Type table
    pub type_table: Option<KmTypeTable>,
    /// Version requirement table
    pub version_requirement_table: Option<KmVersionRequirementTable>,
    /// Module name (JVM)
    pub module_name: Option<String>,
    /// Local delegated properties (JVM)
    pub local_delegated_properties: Vec<KmProperty>,
    /// Unrecognised fields
    pub unknown: UnknownFields,
}

impl Message for KmPackage {
    fn decode(reader: &mut ProtoReader<'_>, names: &NameResolver<'_>) -> Result<Self, DecodeError> {
        let mut package = Self::default();
        while reader.has_more() {
            let (field, wire_type) = reader.read_tag()?;
            match (field, wire_type) {
                (3, WireType::Len) => package.functions.push(read_message(reader, names)?),
                (4, WireType::Len) => package.properties.push(read_message(reader, names)?),
                (5, WireType::Len) => package.type_aliases.push(read_message(reader, names)?),
                (30, WireType::Len) => package.type_table = Some(read_message(reader, names)?),
                (32, WireType::Len) => {
                    package.version_requirement_table = Some(read_message(reader, names)?)
                }
                (101, WireType::Varint) => {
                    package.module_name = Some(names.string(reader.read_int32()?)?)
                }
                (102, WireType::Len) => package
                    .local_delegated_properties
                    .push(read_message(reader, names)?),
                _ => package.unknown.push(reader.skip_field(field, wire_type)?),
            }
        }
        Ok(package)
    }

    fn encode(&self, strings: &mut StringTableBuilder) -> Vec<u8> {
        let mut out = FieldSink::new();
        write_messages(&mut out, 3, &self.functions, strings);
        write_messages(&mut out, 4, &self.properties, strings);
        write_messages(&mut out, 5, &self.type_aliases, strings);
        write_message(&mut out, 30, self.type_table.as_ref(), strings);
        write_message(&mut out, 32, self.version_requirement_table.as_ref(), strings);
        write_string(&mut out, 101, self.module_name.as_deref(), strings);
        write_messages(&mut out, 102, &self.local_delegated_properties, strings);
        out.unknown(&self.unknown);
        out.finish()
    }
}

/// An enum entry
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KmEnumEntry {
    /// Entry name
    pub name: Option<String>,
    /// Unrecognised fields
    pub unknown: UnknownFields,
}

impl Message for KmEnumEntry {
    fn decode(reader: &mut ProtoReader<'_>, names: &NameResolver<'_>) -> Result<Self, DecodeError> {
        let mut entry = Self::default();
        while reader.has_more() {
            let (field, wire_type) = reader.read_tag()?;
            match (field, wire_type) {
                (1, WireType::Varint) => entry.name = Some(names.string(reader.read_int32()?)?),
                _ => entry.unknown.push(reader.skip_field(field, wire_type)?),
            }
        }
        Ok(entry)
    }

    fn encode(&self, strings: &mut StringTableBuilder) -> Vec<u8> {
        let mut out = FieldSink::new();
        write_string(&mut out, 1, self.name.as_deref(), strings);
        out.unknown(&self.unknown);
        out.finish()
    }
}
