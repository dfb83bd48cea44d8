//! Functions, properties, constructors, type aliases and contracts

use super::{
    read_message, write_message, write_messages, write_string, JvmMethodSignature,
    JvmPropertySignature, KmAnnotation, KmType, KmTypeParameter, KmTypeTable, Message,
};
use crate::strings::{NameResolver, StringTableBuilder};
use crate::wire::{DecodeError, FieldSink, ProtoReader, UnknownFields, WireType};
use serde::Serialize;

/// A function declaration
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KmFunction {
    /// Flags
    pub flags: Option<i32>,
    /// Flags in the pre-1.1 layout
    pub old_flags: Option<i32>,
    /// Name
    pub name: String,
    /// Return type
    pub return_type: Option<KmType>,
    /// Return type, by type table index
    pub return_type_id: Option<i32>,
    /// Type parameters
    pub type_parameters: Vec<KmTypeParameter>,
    /// Extension receiver
    pub receiver_type: Option<KmType>,
    /// Extension receiver, by type table index
    pub receiver_type_id: Option<i32>,
    /// Context receivers
    pub context_receiver_types: Vec<KmType>,
    /// Context receivers, by type table index
    pub context_receiver_type_ids: Vec<i32>,
    /// Value parameters
    pub value_parameters: Vec<KmValueParameter>,
    /// Local type table
    pub type_table: Option<KmTypeTable>,
    /// Version requirement indices
    pub version_requirements: Vec<i32>,
    /// Contract
    pub contract: Option<KmContract>,
    /// JVM method signature
    pub signature: Option<JvmMethodSignature>,
    /// Internal name of the class a lambda was generated into
    pub lambda_class_origin_name: Option<String>,
    /// Unrecognised fields
    pub unknown: UnknownFields,
}

impl KmFunction {
    /// Create a function with only a name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

impl Message for KmFunction {
    fn decode(reader: &mut ProtoReader<'_>, names: &NameResolver<'_>) -> Result<Self, DecodeError> {
        let mut function = Self::default();
        let mut name = None;
        while reader.has_more() {
            let (field, wire_type) = reader.read_tag()?;
            match (field, wire_type) {
                (1, WireType::Varint) => function.old_flags = Some(reader.read_int32()?),
                (2, WireType::Varint) => name = Some(names.string(reader.read_int32()?)?),
                (3, WireType::Len) => function.return_type = Some(read_message(reader, names)?),
                (4, WireType::Len) => function.type_parameters.push(read_message(reader, names)?),
                (5, WireType::Len) => function.receiver_type = Some(read_message(reader, names)?),
                (6, WireType::Len) => function.value_parameters.push(read_message(reader, names)?),
                (7, WireType::Varint) => function.return_type_id = Some(reader.read_int32()?),
                (8, WireType::Varint) => function.receiver_type_id = Some(reader.read_int32()?),
                (9, WireType::Varint) => function.flags = Some(reader.read_int32()?),
                (10, WireType::Len) => function
                    .context_receiver_types
                    .push(read_message(reader, names)?),
                (11, WireType::Varint | WireType::Len) => function
                    .context_receiver_type_ids
                    .extend(reader.read_packed_int32(wire_type)?),
                (30, WireType::Len) => function.type_table = Some(read_message(reader, names)?),
                (31, WireType::Varint | WireType::Len) => function
                    .version_requirements
                    .extend(reader.read_packed_int32(wire_type)?),
                (32, WireType::Len) => function.contract = Some(read_message(reader, names)?),
                (100, WireType::Len) => function.signature = Some(read_message(reader, names)?),
                (101, WireType::Varint) => {
                    function.lambda_class_origin_name = Some(names.string(reader.read_int32()?)?)
                }
                _ => function.unknown.push(reader.skip_field(field, wire_type)?),
            }
        }
        function.name = name.ok_or(DecodeError::MissingField("Function.name"))?;
        Ok(function)
    }

    fn encode(&self, strings: &mut StringTableBuilder) -> Vec<u8> {
        let mut out = FieldSink::new();
        out.opt_int32(1, self.old_flags);
        out.int32(2, strings.string(&self.name));
        write_message(&mut out, 3, self.return_type.as_ref(), strings);
        write_messages(&mut out, 4, &self.type_parameters, strings);
        write_message(&mut out, 5, self.receiver_type.as_ref(), strings);
        write_messages(&mut out, 6, &self.value_parameters, strings);
        out.opt_int32(7, self.return_type_id);
        out.opt_int32(8, self.receiver_type_id);
        out.opt_int32(9, self.flags);
        write_messages(&mut out, 10, &self.context_receiver_types, strings);
        out.packed_int32(11, &self.context_receiver_type_ids);
        write_message(&mut out, 30, self.type_table.as_ref(), strings);
        out.repeated_int32(31, &self.version_requirements);
        write_message(&mut out, 32, self.contract.as_ref(), strings);
        write_message(&mut out, 100, self.signature.as_ref(), strings);
        write_string(&mut out, 101, self.lambda_class_origin_name.as_deref(), strings);
        out.unknown(&self.unknown);
        out.finish()
    }
}

/// A property declaration
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KmProperty {
    /// Flags
    pub flags: Option<i32>,
    /// Flags in the pre-1.1 layout
    pub old_flags: Option<i32>,
    /// Name
    pub name: String,
    /// Property type
    pub return_type: Option<KmType>,
    /// Property type, by type table index
    pub return_type_id: Option<i32>,
    /// Type parameters
    pub type_parameters: Vec<KmTypeParameter>,
    /// Extension receiver
    pub receiver_type: Option<KmType>,
    /// Extension receiver, by type table index
    pub receiver_type_id: Option<i32>,
    /// Context receivers
    pub context_receiver_types: Vec<KmType>,
    /// Context receivers, by type table index
    pub context_receiver_type_ids: Vec<i32>,
    /// Setter parameter
    pub setter_value_parameter: Option<KmValueParameter>,
    /// Getter flags
    pub getter_flags: Option<i32>,
    /// Setter flags
    pub setter_flags: Option<i32>,
    /// Version requirement indices
    pub version_requirements: Vec<i32>,
    /// JVM field and accessor signatures
    pub signature: Option<JvmPropertySignature>,
    /// JVM-specific flags
    pub jvm_flags: Option<i32>,
    /// Unrecognised fields
    pub unknown: UnknownFields,
}

impl KmProperty {
    /// Create a property with only a name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

impl Message for KmProperty {
    fn decode(reader: &mut ProtoReader<'_>, names: &NameResolver<'_>) -> Result<Self, DecodeError> {
        let mut property = Self::default();
        let mut name = None;
        while reader.has_more() {
            let (field, wire_type) = reader.read_tag()?;
            match (field, wire_type) {
                (1, WireType::Varint) => property.old_flags = Some(reader.read_int32()?),
                (2, WireType::Varint) => name = Some(names.string(reader.read_int32()?)?),
                (3, WireType::Len) => property.return_type = Some(read_message(reader, names)?),
                (4, WireType::Len) => property.type_parameters.push(read_message(reader, names)?),
                (5, WireType::Len) => property.receiver_type = Some(read_message(reader, names)?),
                (6, WireType::Len) => {
                    property.setter_value_parameter = Some(read_message(reader, names)?)
                }
                (7, WireType::Varint) => property.getter_flags = Some(reader.read_int32()?),
                (8, WireType::Varint) => property.setter_flags = Some(reader.read_int32()?),
                (9, WireType::Varint) => property.return_type_id = Some(reader.read_int32()?),
                (10, WireType::Varint) => property.receiver_type_id = Some(reader.read_int32()?),
                (11, WireType::Varint) => property.flags = Some(reader.read_int32()?),
                (12, WireType::Len) => property
                    .context_receiver_types
                    .push(read_message(reader, names)?),
                (13, WireType::Varint | WireType::Len) => property
                    .context_receiver_type_ids
                    .extend(reader.read_packed_int32(wire_type)?),
                (31, WireType::Varint | WireType::Len) => property
                    .version_requirements
                    .extend(reader.read_packed_int32(wire_type)?),
                (100, WireType::Len) => property.signature = Some(read_message(reader, names)?),
                (101, WireType::Varint) => property.jvm_flags = Some(reader.read_int32()?),
                _ => property.unknown.push(reader.skip_field(field, wire_type)?),
            }
        }
        property.name = name.ok_or(DecodeError::MissingField("Property.name"))?;
        Ok(property)
    }

    fn encode(&self, strings: &mut StringTableBuilder) -> Vec<u8> {
        let mut out = FieldSink::new();
        out.opt_int32(1, self.old_flags);
        out.int32(2, strings.string(&self.name));
        write_message(&mut out, 3, self.return_type.as_ref(), strings);
        write_messages(&mut out, 4, &self.type_parameters, strings);
        write_message(&mut out, 5, self.receiver_type.as_ref(), strings);
        write_message(&mut out, 6, self.setter_value_parameter.as_ref(), strings);
        out.opt_int32(7, self.getter_flags);
        out.opt_int32(8, self.setter_flags);
        out.opt_int32(9, self.return_type_id);
        out.opt_int32(10, self.receiver_type_id);
        out.opt_int32(11, self.flags);
        write_messages(&mut out, 12, &self.context_receiver_types, strings);
        out.packed_int32(13, &self.context_receiver_type_ids);
        out.repeated_int32(31, &self.version_requirements);
        write_message(&mut out, 100, self.signature.as_ref(), strings);
        out.opt_int32(101, self.jvm_flags);
        out.unknown(&self.unknown);
        out.finish()
    }
}

/// A constructor declaration
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KmConstructor {
    /// Flags
    pub flags: Option<i32>,
    /// Value parameters
    pub value_parameters: Vec<KmValueParameter>,
    /// Version requirement indices
    pub version_requirements: Vec<i32>,
    /// JVM method signature
    pub signature: Option<JvmMethodSignature>,
    /// Unrecognised fields
    pub unknown: UnknownFields,
}

impl Message for KmConstructor {
    fn decode(reader: &mut ProtoReader<'_>, names: &NameResolver<'_>) -> Result<Self, DecodeError> {
        let mut constructor = Self::default();
        while reader.has_more() {
            let (field, wire_type) = reader.read_tag()?;
            match (field, wire_type) {
                (1, WireType::Varint) => constructor.flags = Some(reader.read_int32()?),
                (2, WireType::Len) => constructor
                    .value_parameters
                    .push(read_message(reader, names)?),
                (31, WireType::Varint | WireType::Len) => constructor
                    .version_requirements
                    .extend(reader.read_packed_int32(wire_type)?),
                (100, WireType::Len) => constructor.signature = Some(read_message(reader, names)?),
                _ => constructor.unknown.push(reader.skip_field(field, wire_type)?),
            }
        }
        Ok(constructor)
    }

    fn encode(&self, strings: &mut StringTableBuilder) -> Vec<u8> {
        let mut out = FieldSink::new();
        out.opt_int32(1, self.flags);
        write_messages(&mut out, 2, &self.value_parameters, strings);
        out.repeated_int32(31, &self.version_requirements);
        write_message(&mut out, 100, self.signature.as_ref(), strings);
        out.unknown(&self.unknown);
        out.finish()
    }
}

/// A value parameter of a function, constructor or setter
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KmValueParameter {
    /// Flags
    pub flags: Option<i32>,
    /// Name
    pub name: String,
    /// Parameter type
    #[serde(rename = "type")]
    pub type_: Option<KmType>,
    /// Parameter type, by type table index
    pub type_id: Option<i32>,
    /// Element type of a `vararg` parameter
    pub vararg_element_type: Option<KmType>,
    /// Element type of a `vararg` parameter, by type table index
    pub vararg_element_type_id: Option<i32>,
    /// Unrecognised fields
    pub unknown: UnknownFields,
}

impl KmValueParameter {
    /// Create a parameter of the given type
    pub fn new(name: impl Into<String>, type_: KmType) -> Self {
        Self {
            name: name.into(),
            type_: Some(type_),
            ..Self::default()
        }
    }
}

impl Message for KmValueParameter {
    fn decode(reader: &mut ProtoReader<'_>, names: &NameResolver<'_>) -> Result<Self, DecodeError> {
        let mut parameter = Self::default();
        let mut name = None;
        while reader.has_more() {
            let (field, wire_type) = reader.read_tag()?;
            match (field, wire_type) {
                (1, WireType::Varint) => parameter.flags = Some(reader.read_int32()?),
                (2, WireType::Varint) => name = Some(names.string(reader.read_int32()?)?),
                (3, WireType::Len) => parameter.type_ = Some(read_message(reader, names)?),
                (4, WireType::Len) => {
                    parameter.vararg_element_type = Some(read_message(reader, names)?)
                }
                (5, WireType::Varint) => parameter.type_id = Some(reader.read_int32()?),
                (6, WireType::Varint) => parameter.vararg_element_type_id = Some(reader.read_int32()?),
                _ => parameter.unknown.push(reader.skip_field(field, wire_type)?),
            }
        }
        parameter.name = name.ok_or(DecodeError::MissingField("ValueParameter.name"))?;
        Ok(parameter)
    }

    fn encode(&self, strings: &mut StringTableBuilder) -> Vec<u8> {
        let mut out = FieldSink::new();
        out.opt_int32(1, self.flags);
        out.int32(2, strings.string(&self.name));
        write_message(&mut out, 3, self.type_.as_ref(), strings);
        write_message(&mut out, 4, self.vararg_element_type.as_ref(), strings);
        out.opt_int32(5, self.type_id);
        out.opt_int32(6, self.vararg_element_type_id);
        out.unknown(&self.unknown);
        out.finish()
    }
}

/// A type alias declaration
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KmTypeAlias {
    /// Flags
    pub flags: Option<i32>,
    /// Name
    pub name: String,
    /// Type parameters
    pub type_parameters: Vec<KmTypeParameter>,
    /// Right-hand side as written
    pub underlying_type: Option<KmType>,
    /// Right-hand side, by type table index
    pub underlying_type_id: Option<i32>,
    /// Right-hand side with all aliases expanded
    pub expanded_type: Option<KmType>,
    /// Expanded type, by type table index
    pub expanded_type_id: Option<i32>,
    /// Annotations on the alias
    pub annotations: Vec<KmAnnotation>,
    /// Version requirement indices
    pub version_requirements: Vec<i32>,
    /// Unrecognised fields
    pub unknown: UnknownFields,
}

impl KmTypeAlias {
    /// Create a type alias with only a name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

impl Message for KmTypeAlias {
    fn decode(reader: &mut ProtoReader<'_>, names: &NameResolver<'_>) -> Result<Self, DecodeError> {
        let mut alias = Self::default();
        let mut name = None;
        while reader.has_more() {
            let (field, wire_type) = reader.read_tag()?;
            match (field, wire_type) {
                (1, WireType::Varint) => alias.flags = Some(reader.read_int32()?),
                (2, WireType::Varint) => name = Some(names.string(reader.read_int32()?)?),
                (3, WireType::Len) => alias.type_parameters.push(read_message(reader, names)?),
                (4, WireType::Len) => alias.underlying_type = Some(read_message(reader, names)?),
                (5, WireType::Varint) => alias.underlying_type_id = Some(reader.read_int32()?),
                (6, WireType::Len) => alias.expanded_type = Some(read_message(reader, names)?),
                (7, WireType::Varint) => alias.expanded_type_id = Some(reader.read_int32()?),
                (8, WireType::Len) => alias.annotations.push(read_message(reader, names)?),
                (31, WireType::Varint | WireType::Len) => alias
                    .version_requirements
                    .extend(reader.read_packed_int32(wire_type)?),
                _ => alias.unknown.push(reader.skip_field(field, wire_type)?),
            }
        }
        alias.name = name.ok_or(DecodeError::MissingField("TypeAlias.name"))?;
        Ok(alias)
    }

    fn encode(&self, strings: &mut StringTableBuilder) -> Vec<u8> {
        let mut out = FieldSink::new();
        out.opt_int32(1, self.flags);
        out.int32(2, strings.string(&self.name));
        write_messages(&mut out, 3, &self.type_parameters, strings);
        write_message(&mut out, 4, self.underlying_type.as_ref(), strings);
        out.opt_int32(5, self.underlying_type_id);
        write_message(&mut out, 6, self.expanded_type.as_ref(), strings);
        out.opt_int32(7, self.expanded_type_id);
        write_messages(&mut out, 8, &self.annotations, strings);
        out.repeated_int32(31, &self.version_requirements);
        out.unknown(&self.unknown);
        out.finish()
    }
}

/// A function contract
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KmContract {
    /// Effects
    pub effects: Vec<KmEffect>,
    /// Unrecognised fields
    pub unknown: UnknownFields,
}

impl Message for KmContract {
    fn decode(reader: &mut ProtoReader<'_>, names: &NameResolver<'_>) -> Result<Self, DecodeError> {
        let mut contract = Self::default();
        while reader.has_more() {
            let (field, wire_type) = reader.read_tag()?;
            match (field, wire_type) {
                (1, WireType::Len) => contract.effects.push(read_message(reader, names)?),
                _ => contract.unknown.push(reader.skip_field(field, wire_type)?),
            }
        }
        Ok(contract)
    }

    fn encode(&self, strings: &mut StringTableBuilder) -> Vec<u8> {
        let mut out = FieldSink::new();
        write_messages(&mut out, 1, &self.effects, strings);
        out.unknown(&self.unknown);
        out.finish()
    }
}

/// One effect of a contract
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KmEffect {
    /// Effect type
    pub effect_type: Option<i32>,
    /// Arguments of the effect constructor
    pub constructor_arguments: Vec<KmEffectExpression>,
    /// Condition of a conditional effect
    pub conclusion: Option<KmEffectExpression>,
    /// Invocation kind
    pub kind: Option<i32>,
    /// Unrecognised fields
    pub unknown: UnknownFields,
}

impl Message for KmEffect {
    fn decode(reader: &mut ProtoReader<'_>, names: &NameResolver<'_>) -> Result<Self, DecodeError> {
        let mut effect = Self::default();
        while reader.has_more() {
            let (field, wire_type) = reader.read_tag()?;
            match (field, wire_type) {
                (1, WireType::Varint) => effect.effect_type = Some(reader.read_int32()?),
                (2, WireType::Len) => effect
                    .constructor_arguments
                    .push(read_message(reader, names)?),
                (3, WireType::Len) => effect.conclusion = Some(read_message(reader, names)?),
                (4, WireType::Varint) => effect.kind = Some(reader.read_int32()?),
                _ => effect.unknown.push(reader.skip_field(field, wire_type)?),
            }
        }
        Ok(effect)
    }

    fn encode(&self, strings: &mut StringTableBuilder) -> Vec<u8> {
        let mut out = FieldSink::new();
        out.opt_int32(1, self.effect_type);
        write_messages(&mut out, 2, &self.constructor_arguments, strings);
        write_message(&mut out, 3, self.conclusion.as_ref(), strings);
        out.opt_int32(4, self.kind);
        out.unknown(&self.unknown);
        out.finish()
    }
}

/// A boolean expression inside a contract effect
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KmEffectExpression {
    /// Flags
    pub flags: Option<i32>,
    /// 1-based value parameter index; 0 is the receiver
    pub value_parameter_reference: Option<i32>,
    /// Constant value
    pub constant_value: Option<i32>,
    /// Type of an `is` check
    pub is_instance_type: Option<KmType>,
    /// Type of an `is` check, by type table index
    pub is_instance_type_id: Option<i32>,
    /// Conjunction operands
    pub and_arguments: Vec<KmEffectExpression>,
    /// Disjunction operands
    pub or_arguments: Vec<KmEffectExpression>,
    /// Unrecognised fields
    pub unknown: UnknownFields,
}

impl Message for KmEffectExpression {
    fn decode(reader: &mut ProtoReader<'_>, names: &NameResolver<'_>) -> Result<Self, DecodeError> {
        let mut expression = Self::default();
        while reader.has_more() {
            let (field, wire_type) = reader.read_tag()?;
            match (field, wire_type) {
                (1, WireType::Varint) => expression.flags = Some(reader.read_int32()?),
                (2, WireType::Varint) => {
                    expression.value_parameter_reference = Some(reader.read_int32()?)
                }
                (3, WireType::Varint) => expression.constant_value = Some(reader.read_int32()?),
                (4, WireType::Len) => {
                    expression.is_instance_type = Some(read_message(reader, names)?)
                }
                (5, WireType::Varint) => expression.is_instance_type_id = Some(reader.read_int32()?),
                (6, WireType::Len) => expression.and_arguments.push(read_message(reader, names)?),
                (7, WireType::Len) => expression.or_arguments.push(read_message(reader, names)?),
                _ => expression.unknown.push(reader.skip_field(field, wire_type)?),
            }
        }
        Ok(expression)
    }

    fn encode(&self, strings: &mut StringTableBuilder) -> Vec<u8> {
        let mut out = FieldSink::new();
        out.opt_int32(1, self.flags);
        out.opt_int32(2, self.value_parameter_reference);
        out.opt_int32(3, self.constant_value);
        write_message(&mut out, 4, self.is_instance_type.as_ref(), strings);
        out.opt_int32(5, self.is_instance_type_id);
        write_messages(&mut out, 6, &self.and_arguments, strings);
        write_messages(&mut out, 7, &self.or_arguments, strings);
        out.unknown(&self.unknown);
        out.finish()
    }
}

/// A lambda compiled into a synthetic class
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KmLambda {
    /// The lambda's signature as a function
    pub function: KmFunction,
}

impl Message for KmLambda {
    fn decode(reader: &mut ProtoReader<'_>, names: &NameResolver<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            function: KmFunction::decode(reader, names)?,
        })
    }

    fn encode(&self, strings: &mut StringTableBuilder) -> Vec<u8> {
        self.function.encode(strings)
    }
}

