//! Integration tests for custom attribute materialization.

mod common;

use common::{constructor, core_ref, core_unit, field_sig, method_sig, property_sig, ser_string};
use symgraph::prelude::*;

/// Tokens of the attribute class and the class the attributes are applied to
struct Lib {
    builder: MetadataBuilder,
    mark: Token,
    by_array: Token,
    by_enum: Token,
    by_type: Token,
    by_int: Token,
    list: Token,
    target: Token,
}

/// `Acme.Color` (an `int` enum), `Acme.MarkAttribute` with constructors taking `int[]`,
/// `Acme.Color`, `System.Type` and `int` plus a settable `Count` and an `int[]` field `IA`,
/// the generic `Acme.List<T>` and `Acme.Target`
fn lib() -> Result<Lib> {
    let mut lib = MetadataBuilder::new("Lib");
    let object = core_ref(&mut lib, "System", "Object");
    let attribute = core_ref(&mut lib, "System", "Attribute");
    let system_enum = core_ref(&mut lib, "System", "Enum");
    let system_type = core_ref(&mut lib, "System", "Type");

    let color = lib.type_def(
        "Acme",
        "Color",
        TypeAttributes::PUBLIC | TypeAttributes::SEALED,
        Some(system_enum),
    );
    lib.field(
        color,
        "value__",
        FieldAttributes::PUBLIC | FieldAttributes::SPECIAL_NAME | FieldAttributes::RT_SPECIAL_NAME,
        &field_sig(TypeSignature::I4),
    )?;
    lib.field(
        color,
        "Red",
        FieldAttributes::PUBLIC | FieldAttributes::STATIC | FieldAttributes::LITERAL,
        &field_sig(TypeSignature::ValueType(color)),
    )?;

    let mark = lib.type_def("Acme", "MarkAttribute", TypeAttributes::PUBLIC, Some(attribute));
    let by_array = constructor(
        &mut lib,
        mark,
        vec![TypeSignature::SzArray(TypeSignature::I4.element())],
    )?;
    let by_enum = constructor(&mut lib, mark, vec![TypeSignature::ValueType(color)])?;
    let by_type = constructor(&mut lib, mark, vec![TypeSignature::Class(system_type)])?;
    let by_int = constructor(&mut lib, mark, vec![TypeSignature::I4])?;
    let set_count = lib.method(
        mark,
        "set_Count",
        MethodAttributes::PUBLIC | MethodAttributes::SPECIAL_NAME,
        &method_sig(true, TypeSignature::Void, vec![TypeSignature::I4]),
    )?;
    lib.property(
        mark,
        "Count",
        &property_sig(TypeSignature::I4, vec![]),
        None,
        Some(set_count),
    )?;
    lib.field(
        mark,
        "IA",
        FieldAttributes::PUBLIC,
        &field_sig(TypeSignature::SzArray(TypeSignature::I4.element())),
    )?;

    let list = lib.type_def("Acme", "List`1", TypeAttributes::PUBLIC, Some(object));
    lib.generic_param(list, "T");

    let target = lib.type_def("Acme", "Target", TypeAttributes::PUBLIC, Some(object));

    Ok(Lib {
        builder: lib,
        mark,
        by_array,
        by_enum,
        by_type,
        by_int,
        list,
        target,
    })
}

fn context(lib: MetadataBuilder) -> Result<ResolutionContext> {
    ResolutionContext::builder()
        .unit(lib.build())
        .unit(core_unit())
        .build()
}

/// Blob of a single `int[]` argument, `None` for a null array
fn int_array_blob(values: Option<&[i32]>) -> Vec<u8> {
    let mut blob = vec![0x01, 0x00];
    match values {
        Some(values) => {
            blob.extend_from_slice(&(values.len() as u32).to_le_bytes());
            for value in values {
                blob.extend_from_slice(&value.to_le_bytes());
            }
        }
        None => blob.extend_from_slice(&[0xFF, 0xFF, 0xFF, 0xFF]),
    }
    blob.extend_from_slice(&[0x00, 0x00]);
    blob
}

fn int_values(constant: &TypedConstant) -> Option<Vec<i32>> {
    match constant {
        TypedConstant::Array {
            values: Some(values),
            ..
        } => values
            .iter()
            .map(|value| match value {
                TypedConstant::Primitive {
                    value: ConstantValue::I4(v),
                    ..
                } => Some(*v),
                _ => None,
            })
            .collect(),
        _ => None,
    }
}

/// An `int[]` argument, an empty array and a null array are three different things.
#[test]
fn test_array_arguments() -> Result<()> {
    let mut lib = lib()?;
    lib.builder
        .custom_attribute(lib.target, lib.by_array, int_array_blob(Some(&[1, 2])))
        .custom_attribute(lib.target, lib.by_array, int_array_blob(Some(&[])))
        .custom_attribute(lib.target, lib.by_array, int_array_blob(None));
    let ctx = context(lib.builder)?;

    let attributes = ctx.attributes("Lib", lib.target)?;
    assert_eq!(attributes.len(), 3);
    assert!(attributes.iter().all(|attribute| !attribute.has_errors));
    assert!(attributes.iter().all(|attribute| attribute.is("Acme.MarkAttribute")));

    assert_eq!(int_values(&attributes[0].positional[0]), Some(vec![1, 2]));
    assert_eq!(int_values(&attributes[1].positional[0]), Some(vec![]));
    assert!(!attributes[1].positional[0].is_null());
    assert!(attributes[2].positional[0].is_null());
    assert!(matches!(attributes[2].positional[0].ty(), Symbol::Array(_)));

    assert_eq!(attributes[0].constructor.as_ref().unwrap().token, lib.by_array);
    Ok(())
}

/// Enum arguments are read as their underlying type and typed as the enum.
#[test]
fn test_enum_argument() -> Result<()> {
    let mut lib = lib()?;
    lib.builder.custom_attribute(
        lib.target,
        lib.by_enum,
        vec![0x01, 0x00, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00],
    );
    let ctx = context(lib.builder)?;

    let attributes = ctx.attributes("Lib", lib.target)?;
    let attribute = &attributes[0];
    assert!(!attribute.has_errors);
    assert_eq!(attribute.constructor.as_ref().unwrap().token, lib.by_enum);
    match &attribute.positional[0] {
        TypedConstant::Enum { ty, value } => {
            assert_eq!(ty.full_name().as_deref(), Some("Acme.Color"));
            assert_eq!(value, &ConstantValue::I4(2));
        }
        other => panic!("expected an enum constant, got {other:?}"),
    }
    Ok(())
}

/// `System.Type` arguments resolve the serialized name; a null name is a null type.
#[test]
fn test_type_argument() -> Result<()> {
    let mut lib = lib()?;
    let mut named = vec![0x01, 0x00];
    named.extend(ser_string("Acme.Color"));
    named.extend_from_slice(&[0x00, 0x00]);
    lib.builder
        .custom_attribute(lib.target, lib.by_type, named)
        .custom_attribute(lib.target, lib.by_type, vec![0x01, 0x00, 0xFF, 0x00, 0x00]);
    let ctx = context(lib.builder)?;

    let attributes = ctx.attributes("Lib", lib.target)?;
    match &attributes[0].positional[0] {
        TypedConstant::Type {
            ty,
            value: Some(value),
        } => {
            assert_eq!(ty.full_name().as_deref(), Some("System.Type"));
            assert_eq!(value.full_name().as_deref(), Some("Acme.Color"));
            assert_eq!(value.as_named().unwrap().unit_name, "Lib");
        }
        other => panic!("expected a type constant, got {other:?}"),
    }
    assert!(attributes[1].positional[0].is_null());
    Ok(())
}

/// Blob of a single `System.Type` argument naming `type_name`
fn type_blob(type_name: &str) -> Vec<u8> {
    let mut blob = vec![0x01, 0x00];
    blob.extend(ser_string(type_name));
    blob.extend_from_slice(&[0x00, 0x00]);
    blob
}

/// Open generic names resolve to the definition, closed ones to the shared constructed type.
#[test]
fn test_generic_type_arguments() -> Result<()> {
    let mut lib = lib()?;
    lib.builder
        .custom_attribute(lib.target, lib.by_type, type_blob("Acme.List`1"))
        .custom_attribute(
            lib.target,
            lib.by_type,
            type_blob("Acme.List`1[[System.Int32]]"),
        );
    let ctx = context(lib.builder)?;

    let attributes = ctx.attributes("Lib", lib.target)?;
    assert!(attributes.iter().all(|attribute| !attribute.has_errors));

    let definition = ctx.type_def("Lib", lib.list)?;
    match &attributes[0].positional[0] {
        TypedConstant::Type {
            value: Some(value), ..
        } => assert_eq!(value, &definition),
        other => panic!("expected a type constant, got {other:?}"),
    }

    let int = ctx.primitive(PrimitiveKind::I4).plain();
    let expected = ctx.construct(definition.as_named().unwrap(), vec![int]);
    assert!(matches!(expected, Symbol::Constructed(_)));
    match &attributes[1].positional[0] {
        TypedConstant::Type {
            value: Some(value), ..
        } => {
            assert_eq!(value, &expected);
            assert_eq!(value.to_string(), "Acme.List<System.Int32>");
        }
        other => panic!("expected a type constant, got {other:?}"),
    }
    Ok(())
}

/// Named `int[]` arguments carry their elements, or no elements at all when null.
#[test]
fn test_named_array_argument() -> Result<()> {
    let named_array = |values: Option<&[i32]>| {
        let mut blob = vec![0x01, 0x00, 0x07, 0x00, 0x00, 0x00, 0x01, 0x00, 0x53, 0x1D, 0x08];
        blob.extend(ser_string("IA"));
        match values {
            Some(values) => {
                blob.extend_from_slice(&(values.len() as u32).to_le_bytes());
                for value in values {
                    blob.extend_from_slice(&value.to_le_bytes());
                }
            }
            None => blob.extend_from_slice(&[0xFF, 0xFF, 0xFF, 0xFF]),
        }
        blob
    };

    let mut lib = lib()?;
    lib.builder
        .custom_attribute(lib.target, lib.by_int, named_array(Some(&[1, 2])))
        .custom_attribute(lib.target, lib.by_int, named_array(None));
    let ctx = context(lib.builder)?;

    let attributes = ctx.attributes("Lib", lib.target)?;
    assert_eq!(attributes.len(), 2);
    assert!(attributes.iter().all(|attribute| !attribute.has_errors));

    let values = attributes[0].named_argument("IA").unwrap();
    assert_eq!(values.kind, NamedArgumentKind::Field);
    assert_eq!(int_values(&values.value), Some(vec![1, 2]));
    match &values.value {
        TypedConstant::Array { ty, .. } => assert_eq!(ty.to_string(), "System.Int32[]"),
        other => panic!("expected an array constant, got {other:?}"),
    }

    let null = attributes[1].named_argument("IA").unwrap();
    assert!(matches!(
        null.value,
        TypedConstant::Array { values: None, .. }
    ));
    assert!(null.value.is_null());
    Ok(())
}

/// Named property arguments follow the positional ones.
#[test]
fn test_named_property_argument() -> Result<()> {
    let mut lib = lib()?;
    let mut blob = vec![0x01, 0x00, 0x07, 0x00, 0x00, 0x00, 0x01, 0x00, 0x54, 0x08];
    blob.extend(ser_string("Count"));
    blob.extend_from_slice(&42i32.to_le_bytes());
    lib.builder.custom_attribute(lib.target, lib.by_int, blob);
    let ctx = context(lib.builder)?;

    let attributes = ctx.attributes("Lib", lib.target)?;
    let attribute = &attributes[0];
    assert!(!attribute.has_errors);
    assert_eq!(attribute.constructor.as_ref().unwrap().token, lib.by_int);
    assert!(matches!(
        attribute.positional[0],
        TypedConstant::Primitive {
            value: ConstantValue::I4(7),
            ..
        }
    ));

    let count = attribute.named_argument("Count").unwrap();
    assert_eq!(count.kind, NamedArgumentKind::Property);
    assert!(matches!(
        count.value,
        TypedConstant::Primitive {
            value: ConstantValue::I4(42),
            ..
        }
    ));
    Ok(())
}

/// A bad prolog keeps the application, marked as erroneous and without arguments.
#[test]
fn test_malformed_blob_has_errors() -> Result<()> {
    let mut lib = lib()?;
    lib.builder
        .custom_attribute(
            lib.target,
            lib.by_int,
            vec![0x02, 0x00, 0x07, 0x00, 0x00, 0x00, 0x00, 0x00],
        )
        .custom_attribute(lib.target, lib.by_int, vec![0x01, 0x00, 0x07]);
    let ctx = context(lib.builder)?;

    let attributes = ctx.attributes("Lib", lib.target)?;
    assert_eq!(attributes.len(), 2);
    for attribute in attributes.iter() {
        assert!(attribute.has_errors);
        assert!(attribute.positional.is_empty());
        assert_eq!(attribute.attribute_type, ctx.type_def("Lib", lib.mark)?);
    }
    Ok(())
}

/// A reference to a constructor the class does not declare cannot be bound.
#[test]
fn test_unbound_constructor() -> Result<()> {
    let mut lib = lib()?;
    let missing = lib.builder.member_ref(
        lib.mark,
        ".ctor",
        &method_sig(true, TypeSignature::Void, vec![TypeSignature::I4, TypeSignature::I4]),
    )?;
    let mut blob = vec![0x01, 0x00];
    blob.extend_from_slice(&1i32.to_le_bytes());
    blob.extend_from_slice(&2i32.to_le_bytes());
    blob.extend_from_slice(&[0x00, 0x00]);
    lib.builder.custom_attribute(lib.target, missing, blob);
    let ctx = context(lib.builder)?;

    let attributes = ctx.attributes("Lib", lib.target)?;
    let attribute = &attributes[0];
    assert!(attribute.has_errors);
    assert!(attribute.constructor.is_none());
    assert!(attribute.positional.is_empty());
    assert!(attribute.is("Acme.MarkAttribute"));
    Ok(())
}

/// Attribute lists are computed once per target.
#[test]
fn test_attribute_list_is_shared() -> Result<()> {
    let mut lib = lib()?;
    lib.builder.custom_attribute(
        lib.target,
        lib.by_int,
        vec![0x01, 0x00, 0x07, 0x00, 0x00, 0x00, 0x00, 0x00],
    );
    let ctx = context(lib.builder)?;

    let first = ctx.attributes("Lib", lib.target)?;
    let second = ctx.attributes("Lib", lib.target)?;
    assert!(std::sync::Arc::ptr_eq(&first, &second));
    assert!(ctx.attributes("Lib", lib.mark)?.is_empty());
    Ok(())
}
