//! Types, type parameters, annotations and the tables they live in

use super::{
    read_message, write_class_name, write_message, write_messages, write_string, Message,
};
use crate::strings::{NameResolver, StringTableBuilder};
use crate::wire::{DecodeError, FieldSink, ProtoReader, UnknownFields, WireType};
use serde::Serialize;

/// A type reference
///
/// Exactly one classifier is normally set: `class_name`, `type_parameter`
/// (by id), `type_parameter_name` or `type_alias_name`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KmType {
    /// Type flags
    pub flags: Option<i32>,
    /// Type arguments
    pub arguments: Vec<KmTypeProjection>,
    /// Legacy nullability flag
    pub nullable: Option<bool>,
    /// Flexible type capabilities id
    pub flexible_type_capabilities_id: Option<String>,
    /// Upper bound of a flexible (platform) type
    pub flexible_upper_bound: Option<Box<KmType>>,
    /// Upper bound of a flexible type, by type table index
    pub flexible_upper_bound_id: Option<i32>,
    /// Classifier: a class
    pub class_name: Option<String>,
    /// Classifier: a type parameter id
    pub type_parameter: Option<i32>,
    /// Classifier: a type parameter name
    pub type_parameter_name: Option<String>,
    /// Classifier: a type alias
    pub type_alias_name: Option<String>,
    /// Outer type of an inner class type
    pub outer_type: Option<Box<KmType>>,
    /// Outer type, by type table index
    pub outer_type_id: Option<i32>,
    /// Type alias this type was expanded from
    pub abbreviated_type: Option<Box<KmType>>,
    /// Abbreviated type, by type table index
    pub abbreviated_type_id: Option<i32>,
    /// Annotations on the type (JVM)
    pub annotations: Vec<KmAnnotation>,
    /// Raw Java type (JVM)
    pub is_raw: Option<bool>,
    /// Unrecognised fields
    pub unknown: UnknownFields,
}

impl KmType {
    /// A type whose classifier is `class_name`
    pub fn class(class_name: impl Into<String>) -> Self {
        Self {
            class_name: Some(class_name.into()),
            ..Self::default()
        }
    }

    /// A type whose classifier is the type parameter `id`
    pub fn type_parameter(id: i32) -> Self {
        Self {
            type_parameter: Some(id),
            ..Self::default()
        }
    }

    /// Add an invariant type argument
    pub fn with_argument(mut self, argument: KmType) -> Self {
        self.arguments.push(KmTypeProjection {
            projection: None,
            type_: Some(argument),
            type_id: None,
            unknown: UnknownFields::default(),
        });
        self
    }
}

impl Message for KmType {
    fn decode(reader: &mut ProtoReader<'_>, names: &NameResolver<'_>) -> Result<Self, DecodeError> {
        let mut ty = Self::default();
        while reader.has_more() {
            let (field, wire_type) = reader.read_tag()?;
            match (field, wire_type) {
                (1, WireType::Varint) => ty.flags = Some(reader.read_int32()?),
                (2, WireType::Len) => ty.arguments.push(read_message(reader, names)?),
                (3, WireType::Varint) => ty.nullable = Some(reader.read_bool()?),
                (4, WireType::Varint) => {
                    ty.flexible_type_capabilities_id = Some(names.string(reader.read_int32()?)?)
                }
                (5, WireType::Len) => {
                    ty.flexible_upper_bound = Some(Box::new(read_message(reader, names)?))
                }
                (6, WireType::Varint) => {
                    ty.class_name = Some(names.class_name(reader.read_int32()?)?)
                }
                (7, WireType::Varint) => ty.type_parameter = Some(reader.read_int32()?),
                (8, WireType::Varint) => ty.flexible_upper_bound_id = Some(reader.read_int32()?),
                (9, WireType::Varint) => {
                    ty.type_parameter_name = Some(names.string(reader.read_int32()?)?)
                }
                (10, WireType::Len) => ty.outer_type = Some(Box::new(read_message(reader, names)?)),
                (11, WireType::Varint) => ty.outer_type_id = Some(reader.read_int32()?),
                (12, WireType::Varint) => {
                    ty.type_alias_name = Some(names.class_name(reader.read_int32()?)?)
                }
                (13, WireType::Len) => {
                    ty.abbreviated_type = Some(Box::new(read_message(reader, names)?))
                }
                (14, WireType::Varint) => ty.abbreviated_type_id = Some(reader.read_int32()?),
                (100, WireType::Len) => ty.annotations.push(read_message(reader, names)?),
                (101, WireType::Varint) => ty.is_raw = Some(reader.read_bool()?),
                _ => ty.unknown.push(reader.skip_field(field, wire_type)?),
            }
        }
        Ok(ty)
    }

    fn encode(&self, strings: &mut StringTableBuilder) -> Vec<u8> {
        let mut out = FieldSink::new();
        out.opt_int32(1, self.flags);
        write_messages(&mut out, 2, &self.arguments, strings);
        out.opt_bool(3, self.nullable);
        write_string(&mut out, 4, self.flexible_type_capabilities_id.as_deref(), strings);
        write_message(&mut out, 5, self.flexible_upper_bound.as_deref(), strings);
        write_class_name(&mut out, 6, self.class_name.as_deref(), strings);
        out.opt_int32(7, self.type_parameter);
        out.opt_int32(8, self.flexible_upper_bound_id);
        write_string(&mut out, 9, self.type_parameter_name.as_deref(), strings);
        write_message(&mut out, 10, self.outer_type.as_deref(), strings);
        out.opt_int32(11, self.outer_type_id);
        write_class_name(&mut out, 12, self.type_alias_name.as_deref(), strings);
        write_message(&mut out, 13, self.abbreviated_type.as_deref(), strings);
        out.opt_int32(14, self.abbreviated_type_id);
        write_messages(&mut out, 100, &self.annotations, strings);
        out.opt_bool(101, self.is_raw);
        out.unknown(&self.unknown);
        out.finish()
    }
}

/// A type argument; a star projection carries no type
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KmTypeProjection {
    /// One of [`super::projection`]
    pub projection: Option<i32>,
    /// Argument type
    #[serde(rename = "type")]
    pub type_: Option<KmType>,
    /// Argument type, by type table index
    pub type_id: Option<i32>,
    /// Unrecognised fields
    pub unknown: UnknownFields,
}

impl Message for KmTypeProjection {
    fn decode(reader: &mut ProtoReader<'_>, names: &NameResolver<'_>) -> Result<Self, DecodeError> {
        let mut argument = Self::default();
        while reader.has_more() {
            let (field, wire_type) = reader.read_tag()?;
            match (field, wire_type) {
                (1, WireType::Varint) => argument.projection = Some(reader.read_int32()?),
                (2, WireType::Len) => argument.type_ = Some(read_message(reader, names)?),
                (3, WireType::Varint) => argument.type_id = Some(reader.read_int32()?),
                _ => argument.unknown.push(reader.skip_field(field, wire_type)?),
            }
        }
        Ok(argument)
    }

    fn encode(&self, strings: &mut StringTableBuilder) -> Vec<u8> {
        let mut out = FieldSink::new();
        out.opt_int32(1, self.projection);
        write_message(&mut out, 2, self.type_.as_ref(), strings);
        out.opt_int32(3, self.type_id);
        out.unknown(&self.unknown);
        out.finish()
    }
}

/// A declared type parameter
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KmTypeParameter {
    /// Id referenced by [`KmType::type_parameter`]
    pub id: i32,
    /// Name
    pub name: String,
    /// Whether the parameter is `reified`
    pub reified: Option<bool>,
    /// One of [`super::variance`]
    pub variance: Option<i32>,
    /// Upper bounds
    pub upper_bounds: Vec<KmType>,
    /// Upper bounds, by type table index
    pub upper_bound_ids: Vec<i32>,
    /// Annotations on the parameter (JVM)
    pub annotations: Vec<KmAnnotation>,
    /// Unrecognised fields
    pub unknown: UnknownFields,
}

impl KmTypeParameter {
    /// Create a type parameter
    pub fn new(id: i32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ..Self::default()
        }
    }
}

impl Message for KmTypeParameter {
    fn decode(reader: &mut ProtoReader<'_>, names: &NameResolver<'_>) -> Result<Self, DecodeError> {
        let mut parameter = Self::default();
        let mut id = None;
        let mut name = None;
        while reader.has_more() {
            let (field, wire_type) = reader.read_tag()?;
            match (field, wire_type) {
                (1, WireType::Varint) => id = Some(reader.read_int32()?),
                (2, WireType::Varint) => name = Some(names.string(reader.read_int32()?)?),
                (3, WireType::Varint) => parameter.reified = Some(reader.read_bool()?),
                (4, WireType::Varint) => parameter.variance = Some(reader.read_int32()?),
                (5, WireType::Len) => parameter.upper_bounds.push(read_message(reader, names)?),
                (6, WireType::Varint | WireType::Len) => parameter
                    .upper_bound_ids
                    .extend(reader.read_packed_int32(wire_type)?),
                (100, WireType::Len) => parameter.annotations.push(read_message(reader, names)?),
                _ => parameter.unknown.push(reader.skip_field(field, wire_type)?),
            }
        }
        parameter.id = id.ok_or(DecodeError::MissingField("TypeParameter.id"))?;
        parameter.name = name.ok_or(DecodeError::MissingField("TypeParameter.name"))?;
        Ok(parameter)
    }

    fn encode(&self, strings: &mut StringTableBuilder) -> Vec<u8> {
        let mut out = FieldSink::new();
        out.int32(1, self.id);
        out.int32(2, strings.string(&self.name));
        out.opt_bool(3, self.reified);
        out.opt_int32(4, self.variance);
        write_messages(&mut out, 5, &self.upper_bounds, strings);
        out.packed_int32(6, &self.upper_bound_ids);
        write_messages(&mut out, 100, &self.annotations, strings);
        out.unknown(&self.unknown);
        out.finish()
    }
}

/// Shared type table referenced by the `*_id` fields
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KmTypeTable {
    /// Types
    pub types: Vec<KmType>,
    /// Index from which types are nullable
    pub first_nullable: Option<i32>,
    /// Unrecognised fields
    pub unknown: UnknownFields,
}

impl Message for KmTypeTable {
    fn decode(reader: &mut ProtoReader<'_>, names: &NameResolver<'_>) -> Result<Self, DecodeError> {
        let mut table = Self::default();
        while reader.has_more() {
            let (field, wire_type) = reader.read_tag()?;
            match (field, wire_type) {
                (1, WireType::Len) => table.types.push(read_message(reader, names)?),
                (2, WireType::Varint) => table.first_nullable = Some(reader.read_int32()?),
                _ => table.unknown.push(reader.skip_field(field, wire_type)?),
            }
        }
        Ok(table)
    }

    fn encode(&self, strings: &mut StringTableBuilder) -> Vec<u8> {
        let mut out = FieldSink::new();
        write_messages(&mut out, 1, &self.types, strings);
        out.opt_int32(2, self.first_nullable);
        out.unknown(&self.unknown);
        out.finish()
    }
}

/// An annotation use
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KmAnnotation {
    /// Annotation class
    pub class_name: String,
    /// Arguments, never rewritten
    pub arguments: Vec<KmAnnotationArgument>,
    /// Unrecognised fields
    pub unknown: UnknownFields,
}

impl KmAnnotation {
    /// An annotation without arguments
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            ..Self::default()
        }
    }
}

impl Message for KmAnnotation {
    fn decode(reader: &mut ProtoReader<'_>, names: &NameResolver<'_>) -> Result<Self, DecodeError> {
        let mut annotation = Self::default();
        let mut class_name = None;
        while reader.has_more() {
            let (field, wire_type) = reader.read_tag()?;
            match (field, wire_type) {
                (1, WireType::Varint) => class_name = Some(names.class_name(reader.read_int32()?)?),
                (2, WireType::Len) => annotation.arguments.push(read_message(reader, names)?),
                _ => annotation.unknown.push(reader.skip_field(field, wire_type)?),
            }
        }
        annotation.class_name = class_name.ok_or(DecodeError::MissingField("Annotation.id"))?;
        Ok(annotation)
    }

    fn encode(&self, strings: &mut StringTableBuilder) -> Vec<u8> {
        let mut out = FieldSink::new();
        out.int32(1, strings.class_name(&self.class_name));
        write_messages(&mut out, 2, &self.arguments, strings);
        out.unknown(&self.unknown);
        out.finish()
    }
}

/// A named annotation argument
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KmAnnotationArgument {
    /// Parameter name
    pub name: String,
    /// Value
    pub value: KmAnnotationValue,
    /// Unrecognised fields
    pub unknown: UnknownFields,
}

impl Message for KmAnnotationArgument {
    fn decode(reader: &mut ProtoReader<'_>, names: &NameResolver<'_>) -> Result<Self, DecodeError> {
        let mut argument = Self::default();
        let mut name = None;
        let mut value = None;
        while reader.has_more() {
            let (field, wire_type) = reader.read_tag()?;
            match (field, wire_type) {
                (1, WireType::Varint) => name = Some(names.string(reader.read_int32()?)?),
                (2, WireType::Len) => value = Some(read_message(reader, names)?),
                _ => argument.unknown.push(reader.skip_field(field, wire_type)?),
            }
        }
        argument.name = name.ok_or(DecodeError::MissingField("Annotation.Argument.name_id"))?;
        argument.value = value.ok_or(DecodeError::MissingField("Annotation.Argument.value"))?;
        Ok(argument)
    }

    fn encode(&self, strings: &mut StringTableBuilder) -> Vec<u8> {
        let mut out = FieldSink::new();
        out.int32(1, strings.string(&self.name));
        out.message(2, self.value.encode(strings));
        out.unknown(&self.unknown);
        out.finish()
    }
}

/// A constant annotation argument value
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KmAnnotationValue {
    /// Value type tag
    #[serde(rename = "type")]
    pub kind: Option<i32>,
    /// Integral and char values
    pub int_value: Option<i64>,
    /// Float value
    pub float_value: Option<f32>,
    /// Double value
    pub double_value: Option<f64>,
    /// String value
    pub string_value: Option<String>,
    /// Class literal or enum class
    pub class_name: Option<String>,
    /// Enum entry name
    pub enum_value_name: Option<String>,
    /// Nested annotation
    pub annotation: Option<Box<KmAnnotation>>,
    /// Array elements
    pub array_elements: Vec<KmAnnotationValue>,
    /// Value flags
    pub flags: Option<i32>,
    /// Array dimensions of a class literal
    pub array_dimension_count: Option<i32>,
    /// Unrecognised fields
    pub unknown: UnknownFields,
}

impl Message for KmAnnotationValue {
    fn decode(reader: &mut ProtoReader<'_>, names: &NameResolver<'_>) -> Result<Self, DecodeError> {
        let mut value = Self::default();
        while reader.has_more() {
            let (field, wire_type) = reader.read_tag()?;
            match (field, wire_type) {
                (1, WireType::Varint) => value.kind = Some(reader.read_int32()?),
                (2, WireType::Varint) => value.int_value = Some(reader.read_sint64()?),
                (3, WireType::Fixed32) => value.float_value = Some(reader.read_float()?),
                (4, WireType::Fixed64) => value.double_value = Some(reader.read_double()?),
                (5, WireType::Varint) => {
                    value.string_value = Some(names.string(reader.read_int32()?)?)
                }
                (6, WireType::Varint) => {
                    value.class_name = Some(names.class_name(reader.read_int32()?)?)
                }
                (7, WireType::Varint) => {
                    value.enum_value_name = Some(names.string(reader.read_int32()?)?)
                }
                (8, WireType::Len) => {
                    value.annotation = Some(Box::new(read_message(reader, names)?))
                }
                (9, WireType::Len) => value.array_elements.push(read_message(reader, names)?),
                (10, WireType::Varint) => value.flags = Some(reader.read_int32()?),
                (11, WireType::Varint) => value.array_dimension_count = Some(reader.read_int32()?),
                _ => value.unknown.push(reader.skip_field(field, wire_type)?),
            }
        }
        Ok(value)
    }

    fn encode(&self, strings: &mut StringTableBuilder) -> Vec<u8> {
        let mut out = FieldSink::new();
        out.opt_int32(1, self.kind);
        out.opt_sint64(2, self.int_value);
        out.opt_float(3, self.float_value);
        out.opt_double(4, self.double_value);
        write_string(&mut out, 5, self.string_value.as_deref(), strings);
        write_class_name(&mut out, 6, self.class_name.as_deref(), strings);
        write_string(&mut out, 7, self.enum_value_name.as_deref(), strings);
        write_message(&mut out, 8, self.annotation.as_deref(), strings);
        write_messages(&mut out, 9, &self.array_elements, strings);
        out.opt_int32(10, self.flags);
        out.opt_int32(11, self.array_dimension_count);
        out.unknown(&self.unknown);
        out.finish()
    }
}

/// Table of version requirements referenced by index
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KmVersionRequirementTable {
    /// Requirements
    pub requirements: Vec<KmVersionRequirement>,
    /// Unrecognised fields
    pub unknown: UnknownFields,
}

impl Message for KmVersionRequirementTable {
    fn decode(reader: &mut ProtoReader<'_>, names: &NameResolver<'_>) -> Result<Self, DecodeError> {
        let mut table = Self::default();
        while reader.has_more() {
            let (field, wire_type) = reader.read_tag()?;
            match (field, wire_type) {
                (1, WireType::Len) => table.requirements.push(read_message(reader, names)?),
                _ => table.unknown.push(reader.skip_field(field, wire_type)?),
            }
        }
        Ok(table)
    }

    fn encode(&self, strings: &mut StringTableBuilder) -> Vec<u8> {
        let mut out = FieldSink::new();
        write_messages(&mut out, 1, &self.requirements, strings);
        out.unknown(&self.unknown);
        out.finish()
    }
}

/// A `@RequireKotlin`-style version requirement
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KmVersionRequirement {
    /// Packed major/minor/patch
    pub version: Option<i32>,
    /// Full version when it does not fit the packed form
    pub version_full: Option<i32>,
    /// Severity level
    pub level: Option<i32>,
    /// Error code
    pub error_code: Option<i32>,
    /// Message
    pub message: Option<String>,
    /// Which version the requirement applies to
    pub version_kind: Option<i32>,
    /// Unrecognised fields
    pub unknown: UnknownFields,
}

impl Message for KmVersionRequirement {
    fn decode(reader: &mut ProtoReader<'_>, names: &NameResolver<'_>) -> Result<Self, DecodeError> {
        let mut requirement = Self::default();
        while reader.has_more() {
            let (field, wire_type) = reader.read_tag()?;
            match (field, wire_type) {
                (1, WireType::Varint) => requirement.version = Some(reader.read_int32()?),
                (2, WireType::Varint) => requirement.version_full = Some(reader.read_int32()?),
                (3, WireType::Varint) => requirement.level = Some(reader.read_int32()?),
                (4, WireType::Varint) => requirement.error_code = Some(reader.read_int32()?),
                (5, WireType::Varint) => {
                    requirement.message = Some(names.string(reader.read_int32()?)?)
                }
                (6, WireType::Varint) => requirement.version_kind = Some(reader.read_int32()?),
                _ => requirement.unknown.push(reader.skip_field(field, wire_type)?),
            }
        }
        Ok(requirement)
    }

    fn encode(&self, strings: &mut StringTableBuilder) -> Vec<u8> {
        let mut out = FieldSink::new();
        out.opt_int32(1, self.version);
        out.opt_int32(2, self.version_full);
        out.opt_int32(3, self.level);
        out.opt_int32(4, self.error_code);
        write_string(&mut out, 5, self.message.as_deref(), strings);
        out.opt_int32(6, self.version_kind);
        out.unknown(&self.unknown);
        out.finish()
    }
}
