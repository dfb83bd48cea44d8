//! Integration tests for metadata annotation remapping

use kmremap::model::{
    variance, JvmFieldSignature, JvmMethodSignature, JvmPropertySignature, KmAnnotation, KmClass,
    KmConstructor, KmFunction, KmLambda, KmPackage, KmProperty, KmType, KmTypeAlias,
    KmTypeParameter, KmValueParameter,
};
use kmremap::bits::encode_bytes;
use kmremap::wire::{write_varint, RawField, WireType, MAX_NESTING_DEPTH};
use kmremap::{
    AnnotationNode, AnnotationValue, ClassNode, ClassVisitor, DecodeError, Diagnostic, Header,
    IdentityMapper, KotlinClassMetadata, KotlinClassRemapper, KotlinMetadataRemappingClassVisitor,
    MetadataError, MetadataRemapper, MetadataVersion, PassthroughReason, RemapConfig,
    RemapOutcome, SimpleNameMapper,
};

fn mapper() -> SimpleNameMapper {
    SimpleNameMapper::new()
        .with_class("a/b/C", "x/y/Z")
        .with_class("a/b/C$Inner", "x/y/Z$Inner")
        .with_class("a/b/Helper", "x/y/Assistant")
        .with_class("a/b/Base", "x/y/Root")
        .with_class("a/b/Marker", "x/y/Tag")
        .with_class("a/b/FooKt", "x/y/BarKt")
}

fn inverse_mapper() -> SimpleNameMapper {
    SimpleNameMapper::new()
        .with_class("x/y/Z", "a/b/C")
        .with_class("x/y/Z$Inner", "a/b/C$Inner")
        .with_class("x/y/Assistant", "a/b/Helper")
        .with_class("x/y/Root", "a/b/Base")
        .with_class("x/y/Tag", "a/b/Marker")
        .with_class("x/y/BarKt", "a/b/FooKt")
}

fn helper_signature() -> JvmPropertySignature {
    JvmPropertySignature {
        field: Some(JvmFieldSignature::new("helper", "La/b/Helper;")),
        getter: Some(JvmMethodSignature::new("getHelper", "()La/b/Helper;")),
        setter: Some(JvmMethodSignature::new("setHelper", "(La/b/Helper;)V")),
        ..JvmPropertySignature::default()
    }
}

fn rich_class() -> KmClass {
    let mut class = KmClass::new("a/b/C");
    class.flags = Some(0x30);
    class.module_name = Some("main".to_string());

    let mut type_parameter = KmTypeParameter::new(0, "T");
    type_parameter.variance = Some(variance::OUT);
    type_parameter.upper_bounds.push(KmType::class("a/b/Base"));
    class.type_parameters.push(type_parameter);

    class
        .supertypes
        .push(KmType::class("a/b/Base").with_argument(KmType::type_parameter(0)));
    class.nested_class_names.push("Inner".to_string());
    class.sealed_subclasses.push("a/b/C.Inner".to_string());
    class.companion_object_name = Some("Companion".to_string());

    let mut constructor = KmConstructor {
        flags: Some(6),
        ..KmConstructor::default()
    };
    constructor
        .value_parameters
        .push(KmValueParameter::new("helper", KmType::class("a/b/Helper")));
    constructor.signature = Some(JvmMethodSignature::new("<init>", "(La/b/Helper;)V"));
    class.constructors.push(constructor);

    let mut function = KmFunction::new("transform");
    function.flags = Some(0x26);
    let mut bound = KmTypeParameter::new(1, "R");
    bound.variance = Some(variance::INV);
    bound.upper_bounds.push(KmType::class("a/b/C"));
    function.type_parameters.push(bound);
    function.receiver_type = Some(KmType::class("a/b/Helper"));
    function
        .value_parameters
        .push(KmValueParameter::new("input", KmType::class("a/b/C.Inner")));
    function.return_type = Some(KmType::type_parameter(1));
    function.signature = Some(JvmMethodSignature::new(
        "transform",
        "(La/b/Helper;La/b/C$Inner;)Ljava/lang/Object;",
    ));
    class.functions.push(function);

    let mut property = KmProperty::new("helper");
    property.flags = Some(0x506);
    property.getter_flags = Some(0x106);
    property.return_type = Some(KmType::class("a/b/Helper"));
    property.setter_value_parameter = Some(KmValueParameter::new(
        "value",
        KmType::class("a/b/Helper"),
    ));
    property.signature = Some(helper_signature());
    class.properties.push(property);

    let mut alias = KmTypeAlias::new("HelperAlias");
    alias.underlying_type = Some(KmType::class("a/b/Helper"));
    let mut expanded = KmType::class("a/b/Helper");
    expanded.annotations.push(KmAnnotation::new("a/b/Marker"));
    alias.expanded_type = Some(expanded);
    class.type_aliases.push(alias);

    let mut delegated = KmProperty::new("cached");
    delegated.return_type = Some(KmType::class("a/b/C"));
    delegated.signature = Some(JvmPropertySignature {
        delegate_method: Some(JvmMethodSignature::new("getCached", "()La/b/C;")),
        ..JvmPropertySignature::default()
    });
    class.local_delegated_properties.push(delegated);

    class
}

fn top_level_package() -> KmPackage {
    let mut function = KmFunction::new("make");
    function.return_type = Some(KmType::class("a/b/C"));
    function.signature = Some(JvmMethodSignature::new("make", "()La/b/C;"));

    let mut property = KmProperty::new("helper");
    property.return_type = Some(KmType::class("a/b/Helper"));
    property.signature = Some(helper_signature());

    KmPackage {
        functions: vec![function],
        properties: vec![property],
        module_name: Some("main".to_string()),
        ..KmPackage::default()
    }
}

fn lambda() -> KmLambda {
    let mut function = KmFunction::new("<anonymous>");
    function
        .value_parameters
        .push(KmValueParameter::new("it", KmType::class("a/b/C")));
    function.return_type = Some(KmType::class("kotlin/Unit"));
    function.lambda_class_origin_name = Some("a/b/C$transform$1".to_string());
    KmLambda { function }
}

fn annotation_for(metadata: &KotlinClassMetadata, kind: i32, mv: &[i32]) -> AnnotationNode {
    let template = Header {
        kind,
        metadata_version: mv.to_vec(),
        extra_int: Some(48),
        ..Header::default()
    };
    metadata.write(&template).to_annotation()
}

fn read(annotation: &AnnotationNode) -> KotlinClassMetadata {
    let header = Header::from_annotation_values(annotation.values.as_deref())
        .unwrap()
        .unwrap();
    KotlinClassMetadata::read(&header).unwrap()
}

fn read_class(annotation: &AnnotationNode) -> KmClass {
    match read(annotation) {
        KotlinClassMetadata::Class { class } => class,
        other => panic!("expected a class, got {other:?}"),
    }
}

fn all_kinds() -> Vec<(&'static str, AnnotationNode)> {
    vec![
        (
            "a/b/C",
            annotation_for(
                &KotlinClassMetadata::Class {
                    class: rich_class(),
                },
                1,
                &[2, 1, 0],
            ),
        ),
        (
            "a/b/FooKt",
            annotation_for(
                &KotlinClassMetadata::FileFacade {
                    package: top_level_package(),
                },
                2,
                &[2, 1, 0],
            ),
        ),
        (
            "a/b/C$transform$1",
            annotation_for(
                &KotlinClassMetadata::SyntheticClass {
                    lambda: Some(lambda()),
                },
                3,
                &[2, 1, 0],
            ),
        ),
        (
            "a/b/Foo__PartKt",
            annotation_for(
                &KotlinClassMetadata::MultiFileClassPart {
                    package: top_level_package(),
                    facade_class_name: "a/b/FooKt".to_string(),
                },
                5,
                &[2, 1, 0],
            ),
        ),
    ]
}

#[test]
fn test_identity_round_trip_for_every_kind() {
    let remapper = MetadataRemapper::new(&IdentityMapper);
    for (class_name, annotation) in all_kinds() {
        let result = remapper.remap_annotation(class_name, &annotation).unwrap();
        assert_eq!(result.outcome, RemapOutcome::Rewritten, "{class_name}");
        assert_eq!(result.annotation, annotation, "{class_name}");
        assert!(result.diagnostics.is_empty(), "{class_name}");
    }
}

#[test]
fn test_remapping_is_idempotent() {
    let mapper = mapper();
    let remapper = MetadataRemapper::new(&mapper);
    for (class_name, annotation) in all_kinds() {
        let once = remapper.remap_annotation(class_name, &annotation).unwrap();
        let twice = remapper
            .remap_annotation(class_name, &once.annotation)
            .unwrap();
        assert_eq!(twice.annotation, once.annotation, "{class_name}");
        assert_ne!(once.annotation, annotation, "{class_name}");
    }
}

#[test]
fn test_every_reference_is_rewritten() {
    let mapper = mapper();
    let annotation = annotation_for(
        &KotlinClassMetadata::Class {
            class: rich_class(),
        },
        1,
        &[2, 1, 0],
    );
    let result = MetadataRemapper::new(&mapper)
        .remap_annotation("a/b/C", &annotation)
        .unwrap();
    let class = read_class(&result.annotation);

    assert_eq!(class.name, "x/y/Z");
    assert_eq!(class.flags, Some(0x30));
    assert_eq!(class.module_name.as_deref(), Some("main"));

    let type_parameter = &class.type_parameters[0];
    assert_eq!((type_parameter.id, type_parameter.name.as_str()), (0, "T"));
    assert_eq!(type_parameter.variance, Some(variance::OUT));
    assert_eq!(
        type_parameter.upper_bounds[0].class_name.as_deref(),
        Some("x/y/Root")
    );

    let supertype = &class.supertypes[0];
    assert_eq!(supertype.class_name.as_deref(), Some("x/y/Root"));
    assert_eq!(
        supertype.arguments[0].type_.as_ref().unwrap().type_parameter,
        Some(0)
    );

    assert_eq!(class.nested_class_names, vec!["Inner"]);
    assert_eq!(class.sealed_subclasses, vec!["x/y/Z.Inner"]);
    assert_eq!(class.companion_object_name.as_deref(), Some("Companion"));

    let constructor = &class.constructors[0];
    assert_eq!(constructor.flags, Some(6));
    assert_eq!(
        constructor.signature.as_ref().unwrap().desc.as_deref(),
        Some("(Lx/y/Assistant;)V")
    );

    let function = &class.functions[0];
    assert_eq!(function.name, "transform");
    assert_eq!(function.flags, Some(0x26));
    assert_eq!(function.type_parameters[0].variance, Some(variance::INV));
    assert_eq!(
        function.type_parameters[0].upper_bounds[0].class_name.as_deref(),
        Some("x/y/Z")
    );
    assert_eq!(
        function.receiver_type.as_ref().unwrap().class_name.as_deref(),
        Some("x/y/Assistant")
    );
    assert_eq!(
        function.value_parameters[0]
            .type_
            .as_ref()
            .unwrap()
            .class_name
            .as_deref(),
        Some("x/y/Z.Inner")
    );
    assert_eq!(
        function.return_type.as_ref().unwrap().type_parameter,
        Some(1)
    );
    let signature = function.signature.as_ref().unwrap();
    assert_eq!(signature.name.as_deref(), Some("transform"));
    assert_eq!(
        signature.desc.as_deref(),
        Some("(Lx/y/Assistant;Lx/y/Z$Inner;)Ljava/lang/Object;")
    );

    let property = &class.properties[0];
    assert_eq!(property.name, "helper");
    assert_eq!(property.flags, Some(0x506));
    assert_eq!(property.getter_flags, Some(0x106));
    let signature = property.signature.as_ref().unwrap();
    let field = signature.field.as_ref().unwrap();
    assert_eq!(field.name.as_deref(), Some("helper"));
    assert_eq!(field.desc.as_deref(), Some("Lx/y/Assistant;"));
    assert_eq!(
        signature.getter.as_ref().unwrap().desc.as_deref(),
        Some("()Lx/y/Assistant;")
    );
    assert_eq!(
        signature.setter.as_ref().unwrap().desc.as_deref(),
        Some("(Lx/y/Assistant;)V")
    );
    assert_eq!(
        property
            .setter_value_parameter
            .as_ref()
            .unwrap()
            .type_
            .as_ref()
            .unwrap()
            .class_name
            .as_deref(),
        Some("x/y/Assistant")
    );

    let alias = &class.type_aliases[0];
    assert_eq!(alias.name, "HelperAlias");
    let expanded = alias.expanded_type.as_ref().unwrap();
    assert_eq!(expanded.class_name.as_deref(), Some("x/y/Assistant"));
    assert_eq!(expanded.annotations[0].class_name, "x/y/Tag");
    assert_eq!(
        alias.underlying_type.as_ref().unwrap().class_name.as_deref(),
        Some("x/y/Assistant")
    );

    let delegated = &class.local_delegated_properties[0];
    assert_eq!(
        delegated.return_type.as_ref().unwrap().class_name.as_deref(),
        Some("x/y/Z")
    );
    assert_eq!(
        delegated
            .signature
            .as_ref()
            .unwrap()
            .delegate_method
            .as_ref()
            .unwrap()
            .desc
            .as_deref(),
        Some("()Lx/y/Z;")
    );
}

#[test]
fn test_only_names_change() {
    let mapper = mapper();
    let inverse = inverse_mapper();
    let original = rich_class();

    let there = KotlinClassRemapper::new(&mapper).remap_class(original.clone());
    assert_ne!(there, original);
    let back = KotlinClassRemapper::new(&inverse).remap_class(there);
    assert_eq!(back, original);
}

#[test]
fn test_local_class_marker_is_preserved() {
    let mapper = mapper();
    let mut class = KmClass::new(".a/b/C");
    class.supertypes.push(KmType::class(".a/b/Helper"));

    let annotation = annotation_for(&KotlinClassMetadata::Class { class }, 1, &[2, 1, 0]);
    let result = MetadataRemapper::new(&mapper)
        .remap_annotation("a/b/C", &annotation)
        .unwrap();
    let class = read_class(&result.annotation);

    assert_eq!(class.name, ".x/y/Z");
    assert_eq!(class.supertypes[0].class_name.as_deref(), Some(".x/y/Assistant"));
}

#[test]
fn test_lambda_and_facade_names() {
    let mapper = mapper()
        .with_class("a/b/C$transform$1", "x/y/Z$transform$1");
    let remapper = MetadataRemapper::new(&mapper);

    let kinds = all_kinds();
    let lambda = remapper.remap_annotation(kinds[2].0, &kinds[2].1).unwrap();
    match read(&lambda.annotation) {
        KotlinClassMetadata::SyntheticClass {
            lambda: Some(lambda),
        } => {
            assert_eq!(
                lambda.function.lambda_class_origin_name.as_deref(),
                Some("x/y/Z$transform$1")
            );
            assert_eq!(
                lambda.function.value_parameters[0]
                    .type_
                    .as_ref()
                    .unwrap()
                    .class_name
                    .as_deref(),
                Some("x/y/Z")
            );
        }
        other => panic!("expected a lambda, got {other:?}"),
    }

    let part = remapper.remap_annotation(kinds[3].0, &kinds[3].1).unwrap();
    assert_eq!(
        part.annotation.get("xs"),
        Some(&AnnotationValue::String("x/y/BarKt".to_string()))
    );
    match read(&part.annotation) {
        KotlinClassMetadata::MultiFileClassPart { package, .. } => {
            let signature = package.functions[0].signature.as_ref().unwrap();
            assert_eq!(signature.desc.as_deref(), Some("()Lx/y/Z;"));
        }
        other => panic!("expected a multi-file class part, got {other:?}"),
    }
}

#[test]
fn test_facade_and_unknown_pass_through() {
    let mapper = mapper();
    let remapper = MetadataRemapper::new(&mapper);

    let facade = Header {
        kind: 4,
        metadata_version: vec![2, 1, 0],
        data1: vec!["a/b/FooKt__AKt".to_string(), "a/b/C".to_string()],
        extra_int: Some(0),
        ..Header::default()
    }
    .to_annotation();
    let result = remapper.remap_annotation("a/b/FooKt", &facade).unwrap();
    assert_eq!(
        result.outcome,
        RemapOutcome::PassedThrough(PassthroughReason::Opaque)
    );
    assert_eq!(result.annotation, facade);

    let unknown = Header {
        kind: 42,
        metadata_version: vec![2, 1, 0],
        data1: vec!["not a payload".to_string()],
        data2: vec!["a/b/C".to_string()],
        ..Header::default()
    }
    .to_annotation();
    let result = remapper.remap_annotation("a/b/C", &unknown).unwrap();
    assert_eq!(
        result.outcome,
        RemapOutcome::PassedThrough(PassthroughReason::Opaque)
    );
    assert_eq!(result.annotation, unknown);

    let synthetic = Header {
        kind: 3,
        metadata_version: vec![2, 1, 0],
        ..Header::default()
    }
    .to_annotation();
    let result = remapper.remap_annotation("a/b/C$1", &synthetic).unwrap();
    assert_eq!(
        result.outcome,
        RemapOutcome::PassedThrough(PassthroughReason::NotALambda)
    );
    assert_eq!(result.annotation, synthetic);
}

#[test]
fn test_version_mismatch_is_reported_once() {
    let mapper = mapper();
    let annotation = annotation_for(
        &KotlinClassMetadata::Class {
            class: rich_class(),
        },
        1,
        &[1, 9, 0],
    );

    let result = MetadataRemapper::new(&mapper)
        .remap_annotation("a/b/C", &annotation)
        .unwrap();
    assert_eq!(result.outcome, RemapOutcome::Rewritten);
    assert_eq!(
        result.diagnostics,
        vec![Diagnostic::VersionMismatch {
            class_name: "a/b/C".to_string(),
            found: vec![1, 9, 0],
            current: MetadataVersion::CURRENT,
        }]
    );
    assert_eq!(read_class(&result.annotation).name, "x/y/Z");
    assert_eq!(
        result.annotation.get("mv"),
        Some(&AnnotationValue::int_array(&[1, 9, 0]))
    );
}

#[test]
fn test_concrete_scenario() {
    let mut class = KmClass::new("a/b/C");
    let mut function = KmFunction::new("foo");
    function
        .value_parameters
        .push(KmValueParameter::new("c", KmType::class("a/b/C")));
    function.return_type = Some(KmType::class("kotlin/Unit"));
    function.signature = Some(JvmMethodSignature::new("foo", "(La/b/C;)V"));
    class.functions.push(function);

    let mapper = SimpleNameMapper::new().with_class("a/b/C", "x/y/Z");
    let annotation = annotation_for(&KotlinClassMetadata::Class { class }, 1, &[2, 1, 0]);
    let result = MetadataRemapper::new(&mapper)
        .remap_annotation("a/b/C", &annotation)
        .unwrap();
    let class = read_class(&result.annotation);

    assert_eq!(class.name, "x/y/Z");
    let function = &class.functions[0];
    assert_eq!(function.name, "foo");
    let signature = function.signature.as_ref().unwrap();
    assert_eq!(signature.name.as_deref(), Some("foo"));
    assert_eq!(signature.desc.as_deref(), Some("(Lx/y/Z;)V"));
    assert_eq!(
        function.return_type.as_ref().unwrap().class_name.as_deref(),
        Some("kotlin/Unit")
    );
}

#[test]
fn test_unrecognised_elements_keep_their_place() {
    let header = KotlinClassMetadata::Class {
        class: KmClass::new("a/b/C"),
    }
    .write(&Header {
        metadata_version: vec![2, 1, 0],
        ..Header::default()
    });

    let annotation = AnnotationNode::new("Lkotlin/Metadata;")
        .with_value("mv", AnnotationValue::int_array(&header.metadata_version))
        .with_value("bv", AnnotationValue::int_array(&[1, 0, 3]))
        .with_value("k", AnnotationValue::Int(1))
        .with_value("d1", AnnotationValue::string_array(&header.data1))
        .with_value("d2", AnnotationValue::string_array(&header.data2))
        .with_value("xi", AnnotationValue::Int(50))
        .with_value("zz", AnnotationValue::String("future".to_string()));

    let mapper = mapper();
    let result = MetadataRemapper::new(&mapper)
        .remap_annotation("a/b/C", &annotation)
        .unwrap();
    let values = result.annotation.values.as_ref().unwrap();
    let keys: Vec<&str> = values.iter().map(|(key, _)| key.as_str()).collect();
    assert_eq!(keys, vec!["mv", "bv", "k", "d1", "d2", "xi", "zz"]);
    assert_eq!(values[1], ("bv".to_string(), AnnotationValue::int_array(&[1, 0, 3])));
    assert_eq!(values[5], ("xi".to_string(), AnnotationValue::Int(50)));
    assert_eq!(
        values[6],
        ("zz".to_string(), AnnotationValue::String("future".to_string()))
    );
    assert_eq!(read_class(&result.annotation).name, "x/y/Z");
}

#[test]
fn test_unknown_payload_fields_survive_remapping() {
    let mut class = rich_class();
    class.unknown.push(RawField {
        number: 500,
        wire_type: WireType::Varint,
        data: vec![0x2A],
    });
    class.functions[0].unknown.push(RawField {
        number: 300,
        wire_type: WireType::Len,
        data: b"opaque".to_vec(),
    });

    let mapper = mapper();
    let annotation = annotation_for(&KotlinClassMetadata::Class { class }, 1, &[2, 1, 0]);
    let result = MetadataRemapper::new(&mapper)
        .remap_annotation("a/b/C", &annotation)
        .unwrap();
    let class = read_class(&result.annotation);

    let unknown: Vec<&RawField> = class.unknown.iter().collect();
    assert_eq!(unknown.len(), 1);
    assert_eq!(unknown[0].number, 500);
    assert_eq!(unknown[0].data, vec![0x2A]);
    let function_unknown: Vec<&RawField> = class.functions[0].unknown.iter().collect();
    assert_eq!(function_unknown[0].data, b"opaque".to_vec());
}

#[test]
fn test_payload_drift_is_reported() {
    let mut header = KotlinClassMetadata::Class {
        class: rich_class(),
    }
    .write(&Header {
        metadata_version: vec![2, 1, 0],
        ..Header::default()
    });
    let strings = header.data2.len();
    header.data2.push("orphan".to_string());
    let annotation = header.to_annotation();

    let result = MetadataRemapper::new(&IdentityMapper)
        .remap_annotation("a/b/C", &annotation)
        .unwrap();
    assert_eq!(
        result.diagnostics,
        vec![Diagnostic::PayloadSizeDrift {
            class_name: "a/b/C".to_string(),
            original: strings + 1,
            remapped: strings,
        }]
    );

    let quiet = RemapConfig {
        report_size_drift: false,
        ..RemapConfig::default()
    };
    let result = MetadataRemapper::with_config(&IdentityMapper, quiet)
        .remap_annotation("a/b/C", &annotation)
        .unwrap();
    assert!(result.diagnostics.is_empty());
}

#[test]
fn test_malformed_payload_fails_with_class_name() {
    let annotation = Header {
        kind: 1,
        metadata_version: vec![2, 1, 0],
        data1: vec!["\u{0}\u{2}\u{8}".to_string()],
        data2: vec![],
        ..Header::default()
    }
    .to_annotation();

    let error = MetadataRemapper::new(&IdentityMapper)
        .remap_annotation("a/b/Broken", &annotation)
        .unwrap_err();
    assert_eq!(error.class_name, "a/b/Broken");
}

/// Class annotation whose `d1` is `table` followed by `body`, both raw
fn raw_class_annotation(table: &[u8], body: &[u8], strings: &[&str]) -> AnnotationNode {
    let mut payload = Vec::new();
    write_varint(&mut payload, table.len() as u64);
    payload.extend_from_slice(table);
    payload.extend_from_slice(body);
    Header {
        kind: 1,
        metadata_version: vec![2, 1, 0],
        data1: encode_bytes(&payload),
        data2: strings.iter().map(|s| s.to_string()).collect(),
        ..Header::default()
    }
    .to_annotation()
}

#[test]
fn test_compiler_shaped_table_is_byte_identical() {
    // One DESC_TO_CLASS_ID record covering both names
    let table = [0x0A, 0x04, 0x08, 0x02, 0x18, 0x02];
    // fq_name = 0, supertype { class_name = 1 }
    let body = [0x18, 0x00, 0x32, 0x02, 0x30, 0x01];
    let annotation = raw_class_annotation(&table, &body, &["La/b/C;", "La/b/D;"]);

    let identity = MetadataRemapper::new(&IdentityMapper)
        .remap_annotation("a/b/C", &annotation)
        .unwrap();
    assert_eq!(identity.outcome, RemapOutcome::Rewritten);
    assert_eq!(identity.annotation, annotation);

    let mapper = SimpleNameMapper::new().with_class("a/b/C", "x/y/Z");
    let remapped = MetadataRemapper::new(&mapper)
        .remap_annotation("a/b/C", &annotation)
        .unwrap();
    let header = |annotation: &AnnotationNode| {
        Header::from_annotation_values(annotation.values.as_deref())
            .unwrap()
            .unwrap()
    };
    let (before, after) = (header(&annotation), header(&remapped.annotation));
    assert_eq!(after.data2, vec!["Lx/y/Z;", "La/b/D;"]);
    assert_eq!(after.data1, before.data1);
}

#[test]
fn test_oversized_record_range_is_tolerated() {
    // range = i32::MAX, operation = DESC_TO_CLASS_ID
    let table = [0x0A, 0x08, 0x08, 0xFF, 0xFF, 0xFF, 0xFF, 0x07, 0x18, 0x02];
    let body = [0x18, 0x00, 0x32, 0x02, 0x30, 0x01];
    let annotation = raw_class_annotation(&table, &body, &["La/b/C;", "La/b/D;"]);

    let mapper = SimpleNameMapper::new().with_class("a/b/C", "x/y/Z");
    let result = MetadataRemapper::new(&mapper)
        .remap_annotation("a/b/C", &annotation)
        .unwrap();
    assert_eq!(result.outcome, RemapOutcome::Rewritten);
    let class = read_class(&result.annotation);
    assert_eq!(class.name, "x/y/Z");
    assert_eq!(class.supertypes[0].class_name.as_deref(), Some("a/b/D"));
}

#[test]
fn test_deeply_nested_types_are_rejected() {
    // Type { class_name = 0 } wrapped in 200 Type.outer_type levels
    let mut type_bytes = vec![0x30, 0x00];
    for _ in 0..200 {
        let mut outer = vec![0x52];
        write_varint(&mut outer, type_bytes.len() as u64);
        outer.extend_from_slice(&type_bytes);
        type_bytes = outer;
    }
    let mut body = vec![0x18, 0x00, 0x32];
    write_varint(&mut body, type_bytes.len() as u64);
    body.extend_from_slice(&type_bytes);

    let table = [0x0A, 0x02, 0x18, 0x02];
    let annotation = raw_class_annotation(&table, &body, &["La/b/C;"]);

    let error = MetadataRemapper::new(&IdentityMapper)
        .remap_annotation("a/b/Deep", &annotation)
        .unwrap_err();
    assert_eq!(error.class_name, "a/b/Deep");
    assert!(matches!(
        error.source,
        MetadataError::Decode(DecodeError::RecursionLimit(MAX_NESTING_DEPTH, _))
    ));
}

#[test]
fn test_empty_element_list_passes_through() {
    let mut annotation = AnnotationNode::new("Lkotlin/Metadata;");
    annotation.values = Some(Vec::new());

    let result = MetadataRemapper::new(&mapper())
        .remap_annotation("a/b/C", &annotation)
        .unwrap();
    assert_eq!(
        result.outcome,
        RemapOutcome::PassedThrough(PassthroughReason::Empty)
    );
    assert_eq!(result.annotation, annotation);
}

#[test]
fn test_class_visitor_chain() {
    let mapper = mapper();
    let mut node = ClassNode::new();
    let diagnostics = {
        let mut visitor = KotlinMetadataRemappingClassVisitor::new(&mapper, &mut node);
        visitor.visit("a/b/C");
        visitor
            .visit_annotation(
                annotation_for(
                    &KotlinClassMetadata::Class {
                        class: rich_class(),
                    },
                    1,
                    &[1, 8, 0],
                ),
                true,
            )
            .unwrap();
        visitor.visit_end();
        visitor.diagnostics().to_vec()
    };

    assert_eq!(node.name.as_deref(), Some("a/b/C"));
    assert!(node.ended);
    assert_eq!(read_class(&node.visible_annotations[0]).name, "x/y/Z");
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].class_name(), "a/b/C");
}

#[test]
fn test_replaying_a_recorded_class() {
    let mut recorded = ClassNode::new();
    recorded.visit("a/b/C");
    recorded
        .visit_annotation(all_kinds().remove(0).1, true)
        .unwrap();
    recorded.visit_end();

    let mapper = mapper();
    let mut visitor = KotlinMetadataRemappingClassVisitor::new(&mapper, ClassNode::new());
    recorded.accept(&mut visitor).unwrap();
    let (remapped, diagnostics) = visitor.into_parts();

    assert!(diagnostics.is_empty());
    assert_eq!(read_class(&remapped.visible_annotations[0]).name, "x/y/Z");
}

#[test]
fn test_shared_mapper_across_threads() {
    let mapper = mapper();
    let remapper = MetadataRemapper::new(&mapper);
    let inputs: Vec<(String, AnnotationNode)> = (0..8)
        .map(|i| {
            let mut class = rich_class();
            class.name = format!("a/b/C{i}");
            let annotation =
                annotation_for(&KotlinClassMetadata::Class { class }, 1, &[2, 1, 0]);
            (format!("a/b/C{i}"), annotation)
        })
        .collect();

    let outputs: Vec<KmClass> = std::thread::scope(|scope| {
        let handles: Vec<_> = inputs
            .iter()
            .map(|(name, annotation)| {
                let remapper = &remapper;
                scope.spawn(move || {
                    let result = remapper.remap_annotation(name, annotation).unwrap();
                    read_class(&result.annotation)
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect()
    });

    for (i, class) in outputs.iter().enumerate() {
        assert_eq!(class.name, format!("a/b/C{i}"));
        assert_eq!(
            class.supertypes[0].class_name.as_deref(),
            Some("x/y/Root")
        );
    }
}

#[test]
fn test_config_file_controls_version_check() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kmremap.toml");
    std::fs::write(
        &path,
        "report-size-drift = false\n\n[metadata-version]\nmajor = 1\nminor = 9\n",
    )
    .unwrap();
    let config = RemapConfig::from_file(&path).unwrap();

    let annotation = annotation_for(
        &KotlinClassMetadata::Class {
            class: rich_class(),
        },
        1,
        &[1, 9, 1],
    );
    let result = MetadataRemapper::with_config(&IdentityMapper, config)
        .remap_annotation("a/b/C", &annotation)
        .unwrap();
    assert!(result.diagnostics.is_empty());
    assert_eq!(result.annotation, annotation);
}

#[test]
fn test_tiny_file_drives_remapping() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mappings.tiny");
    std::fs::write(
        &path,
        "tiny\t2\t0\tintermediary\tnamed\n\
         c\ta/b/C\tx/y/Z\n\
         \tm\t(La/b/C;)V\tfoo\tfoo\n\
         c\ta/b/Helper\tx/y/Assistant\n",
    )
    .unwrap();
    let mapper = kmremap::read_tiny_file(&path, "intermediary", "named").unwrap();
    assert_eq!(mapper.len(), 2);

    let annotation = annotation_for(
        &KotlinClassMetadata::FileFacade {
            package: top_level_package(),
        },
        2,
        &[2, 1, 0],
    );
    let result = MetadataRemapper::new(&mapper)
        .remap_annotation("a/b/FooKt", &annotation)
        .unwrap();
    match read(&result.annotation) {
        KotlinClassMetadata::FileFacade { package } => {
            assert_eq!(
                package.functions[0].return_type.as_ref().unwrap().class_name.as_deref(),
                Some("x/y/Z")
            );
            let signature = package.properties[0].signature.as_ref().unwrap();
            assert_eq!(
                signature.getter.as_ref().unwrap().desc.as_deref(),
                Some("()Lx/y/Assistant;")
            );
        }
        other => panic!("expected a file facade, got {other:?}"),
    }
}
