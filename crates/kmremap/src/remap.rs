//! Rewrites every class name and JVM descriptor in a metadata tree
//!
//! The walk is structural: each node lists its name-bearing fields, which are
//! passed through the [`NameMapper`], and its child nodes, which are walked.
//! Flags, ids, variances and other plain data are left alone. Member names
//! inside JVM signatures are kept; only their descriptors are mapped.

use crate::mapper::NameMapper;
use crate::metadata::KotlinClassMetadata;
use crate::model::{
    JvmFieldSignature, JvmMethodSignature, JvmPropertySignature, KmAnnotation, KmClass,
    KmConstructor, KmContract, KmEffectExpression, KmFunction, KmLambda, KmPackage, KmProperty,
    KmType, KmTypeAlias, KmTypeParameter, KmTypeTable, KmValueParameter,
};
use crate::strings::LOCAL_CLASS_MARKER;

/// Applies a [`NameMapper`] to metadata trees
pub struct KotlinClassRemapper<'a, M: NameMapper + ?Sized> {
    mapper: &'a M,
}

impl<'a, M: NameMapper + ?Sized> KotlinClassRemapper<'a, M> {
    /// Create a remapper over `mapper`
    pub fn new(mapper: &'a M) -> Self {
        Self { mapper }
    }

    /// Remap whatever tree `metadata` holds; opaque kinds come back as is
    pub fn remap_metadata(&self, metadata: KotlinClassMetadata) -> KotlinClassMetadata {
        match metadata {
            KotlinClassMetadata::Class { class } => KotlinClassMetadata::Class {
                class: self.remap_class(class),
            },
            KotlinClassMetadata::FileFacade { package } => KotlinClassMetadata::FileFacade {
                package: self.remap_package(package),
            },
            KotlinClassMetadata::SyntheticClass { lambda } => KotlinClassMetadata::SyntheticClass {
                lambda: lambda.map(|lambda| self.remap_lambda(lambda)),
            },
            KotlinClassMetadata::MultiFileClassPart {
                package,
                facade_class_name,
            } => KotlinClassMetadata::MultiFileClassPart {
                package: self.remap_package(package),
                facade_class_name: self.mapper.map_class_name(&facade_class_name),
            },
            opaque @ (KotlinClassMetadata::MultiFileClassFacade { .. }
            | KotlinClassMetadata::Unknown { .. }) => opaque,
        }
    }

    /// Remap a class
    pub fn remap_class(&self, mut class: KmClass) -> KmClass {
        // Nested names resolve against the name the class had before mapping
        let outer = class.name.clone();
        for nested in &mut class.nested_class_names {
            *nested = self.remap_nested_name(&outer, nested);
        }
        if let Some(companion) = &mut class.companion_object_name {
            *companion = self.remap_nested_name(&outer, companion);
        }

        class.name = self.remap_class_name(&class.name);
        self.type_parameters(&mut class.type_parameters);
        self.types(&mut class.supertypes);
        self.types(&mut class.context_receiver_types);
        for constructor in &mut class.constructors {
            self.constructor(constructor);
        }
        for function in &mut class.functions {
            self.function(function);
        }
        for property in &mut class.properties {
            self.property(property);
        }
        for alias in &mut class.type_aliases {
            self.type_alias(alias);
        }
        for sealed in &mut class.sealed_subclasses {
            *sealed = self.remap_class_name(sealed);
        }
        if let Some(ty) = &mut class.inline_class_underlying_type {
            self.type_(ty);
        }
        self.types(&mut class.multi_field_value_class_underlying_types);
        if let Some(table) = &mut class.type_table {
            self.type_table(table);
        }
        for property in &mut class.local_delegated_properties {
            self.property(property);
        }
        if let Some(origin) = &mut class.anonymous_object_origin_name {
            *origin = self.mapper.map_class_name(origin);
        }
        class
    }

    /// Remap the declarations of a file facade or multi-file class part
    pub fn remap_package(&self, mut package: KmPackage) -> KmPackage {
        for function in &mut package.functions {
            self.function(function);
        }
        for property in &mut package.properties {
            self.property(property);
        }
        for alias in &mut package.type_aliases {
            self.type_alias(alias);
        }
        if let Some(table) = &mut package.type_table {
            self.type_table(table);
        }
        for property in &mut package.local_delegated_properties {
            self.property(property);
        }
        package
    }

    /// Remap a lambda
    pub fn remap_lambda(&self, mut lambda: KmLambda) -> KmLambda {
        self.function(&mut lambda.function);
        lambda
    }

    /// Map a class name as it appears in the tree
    ///
    /// Nested segments are joined with `.` in the tree but with `$` in
    /// internal names. A leading local class marker is kept out of the lookup
    /// and put back afterwards. Names the mapper does not change come back
    /// exactly as given.
    pub fn remap_class_name(&self, name: &str) -> String {
        let (local, bare) = match name.strip_prefix(LOCAL_CLASS_MARKER) {
            Some(bare) => (true, bare),
            None => (false, name),
        };

        let internal = bare.replace('.', "$");
        let mapped = self.mapper.map_class_name(&internal);
        let remapped = if mapped == internal {
            bare.to_string()
        } else if bare.contains('$') {
            let nested = simple_part(bare).matches('.').count();
            restore_nested_separators(&mapped, nested)
        } else {
            mapped.replace('$', ".")
        };

        if local {
            format!("{LOCAL_CLASS_MARKER}{remapped}")
        } else {
            remapped
        }
    }

    /// Map the simple name of a class nested in `outer`
    fn remap_nested_name(&self, outer: &str, simple_name: &str) -> String {
        let outer = outer
            .strip_prefix(LOCAL_CLASS_MARKER)
            .unwrap_or(outer)
            .replace('.', "$");
        let qualified = format!("{outer}${simple_name}");
        let mapped = self.mapper.map_class_name(&qualified);
        if mapped == qualified {
            return simple_name.to_string();
        }

        let mapped_outer = self.mapper.map_class_name(&outer);
        if let Some(simple) = mapped
            .strip_prefix(mapped_outer.as_str())
            .and_then(|rest| rest.strip_prefix('$'))
        {
            return simple.to_string();
        }
        mapped
            .rsplit(|c| c == '$' || c == '/')
            .next()
            .unwrap_or(mapped.as_str())
            .to_string()
    }

    fn types(&self, types: &mut [KmType]) {
        for ty in types {
            self.type_(ty);
        }
    }

    fn type_(&self, ty: &mut KmType) {
        if let Some(class_name) = &mut ty.class_name {
            *class_name = self.remap_class_name(class_name);
        }
        if let Some(alias) = &mut ty.type_alias_name {
            *alias = self.remap_class_name(alias);
        }
        for argument in &mut ty.arguments {
            if let Some(argument) = &mut argument.type_ {
                self.type_(argument);
            }
        }
        if let Some(upper) = ty.flexible_upper_bound.as_deref_mut() {
            self.type_(upper);
        }
        if let Some(outer) = ty.outer_type.as_deref_mut() {
            self.type_(outer);
        }
        if let Some(abbreviated) = ty.abbreviated_type.as_deref_mut() {
            self.type_(abbreviated);
        }
        self.annotations(&mut ty.annotations);
    }

    fn type_table(&self, table: &mut KmTypeTable) {
        self.types(&mut table.types);
    }

    fn type_parameters(&self, parameters: &mut [KmTypeParameter]) {
        for parameter in parameters {
            self.types(&mut parameter.upper_bounds);
            self.annotations(&mut parameter.annotations);
        }
    }

    fn annotations(&self, annotations: &mut [KmAnnotation]) {
        for annotation in annotations {
            annotation.class_name = self.remap_class_name(&annotation.class_name);
        }
    }

    fn value_parameter(&self, parameter: &mut KmValueParameter) {
        if let Some(ty) = &mut parameter.type_ {
            self.type_(ty);
        }
        if let Some(ty) = &mut parameter.vararg_element_type {
            self.type_(ty);
        }
    }

    fn function(&self, function: &mut KmFunction) {
        self.type_parameters(&mut function.type_parameters);
        if let Some(receiver) = &mut function.receiver_type {
            self.type_(receiver);
        }
        self.types(&mut function.context_receiver_types);
        for parameter in &mut function.value_parameters {
            self.value_parameter(parameter);
        }
        if let Some(ty) = &mut function.return_type {
            self.type_(ty);
        }
        if let Some(table) = &mut function.type_table {
            self.type_table(table);
        }
        if let Some(contract) = &mut function.contract {
            self.contract(contract);
        }
        if let Some(signature) = &mut function.signature {
            self.method_signature(signature);
        }
        if let Some(origin) = &mut function.lambda_class_origin_name {
            *origin = self.mapper.map_class_name(origin);
        }
    }

    fn contract(&self, contract: &mut KmContract) {
        for effect in &mut contract.effects {
            for argument in &mut effect.constructor_arguments {
                self.effect_expression(argument);
            }
            if let Some(conclusion) = &mut effect.conclusion {
                self.effect_expression(conclusion);
            }
        }
    }

    fn effect_expression(&self, expression: &mut KmEffectExpression) {
        if let Some(ty) = &mut expression.is_instance_type {
            self.type_(ty);
        }
        for argument in &mut expression.and_arguments {
            self.effect_expression(argument);
        }
        for argument in &mut expression.or_arguments {
            self.effect_expression(argument);
        }
    }

    fn property(&self, property: &mut KmProperty) {
        self.type_parameters(&mut property.type_parameters);
        if let Some(receiver) = &mut property.receiver_type {
            self.type_(receiver);
        }
        self.types(&mut property.context_receiver_types);
        if let Some(setter) = &mut property.setter_value_parameter {
            self.value_parameter(setter);
        }
        if let Some(ty) = &mut property.return_type {
            self.type_(ty);
        }
        if let Some(signature) = &mut property.signature {
            self.property_signature(signature);
        }
    }

    fn property_signature(&self, signature: &mut JvmPropertySignature) {
        if let Some(field) = &mut signature.field {
            self.field_signature(field);
        }
        for method in [
            &mut signature.synthetic_method,
            &mut signature.getter,
            &mut signature.setter,
            &mut signature.delegate_method,
        ]
        .into_iter()
        .flatten()
        {
            self.method_signature(method);
        }
    }

    fn type_alias(&self, alias: &mut KmTypeAlias) {
        self.type_parameters(&mut alias.type_parameters);
        if let Some(ty) = &mut alias.underlying_type {
            self.type_(ty);
        }
        if let Some(ty) = &mut alias.expanded_type {
            self.type_(ty);
        }
        self.annotations(&mut alias.annotations);
    }

    fn constructor(&self, constructor: &mut KmConstructor) {
        for parameter in &mut constructor.value_parameters {
            self.value_parameter(parameter);
        }
        if let Some(signature) = &mut constructor.signature {
            self.method_signature(signature);
        }
    }

    fn method_signature(&self, signature: &mut JvmMethodSignature) {
        if let Some(desc) = &mut signature.desc {
            *desc = self.mapper.map_method_descriptor(desc);
        }
    }

    fn field_signature(&self, signature: &mut JvmFieldSignature) {
        if let Some(desc) = &mut signature.desc {
            *desc = self.mapper.map_field_descriptor(desc);
        }
    }
}

/// Part of a class name after its package
fn simple_part(name: &str) -> &str {
    name.rsplit_once('/').map_or(name, |(_, simple)| simple)
}

/// Turn the first `count` `$` of the simple part of `internal` back into `.`
///
/// Names like `Outer.Inner$1` join their nested classes with `.` but keep the
/// `$` of the local or anonymous part.
fn restore_nested_separators(internal: &str, count: usize) -> String {
    let simple = simple_part(internal);
    let package = &internal[..internal.len() - simple.len()];
    let restored: String = simple
        .split('$')
        .enumerate()
        .fold(String::new(), |mut acc, (i, segment)| {
            if i > 0 {
                acc.push(if i <= count { '.' } else { '$' });
            }
            acc.push_str(segment);
            acc
        });
    format!("{package}{restored}")
}
