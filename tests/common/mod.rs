//! Unit builders shared by the integration tests.
#![allow(dead_code)]

use symgraph::prelude::*;

/// Name of the unit defining the built-in types
pub const CORE: &str = "mscorlib";

/// A method signature without generic parameters
pub fn method_sig(
    has_this: bool,
    return_type: TypeSignature,
    params: Vec<TypeSignature>,
) -> SignatureMethod {
    SignatureMethod {
        has_this,
        explicit_this: false,
        vararg: false,
        generic_param_count: 0,
        return_type: SignatureParameter::plain(return_type),
        params: params.into_iter().map(SignatureParameter::plain).collect(),
        varargs: Vec::new(),
    }
}

/// A field signature without modifiers
pub fn field_sig(ty: TypeSignature) -> SignatureField {
    SignatureField {
        field_type: SignatureParameter::plain(ty),
    }
}

/// An instance property signature
pub fn property_sig(ty: TypeSignature, params: Vec<TypeSignature>) -> SignatureProperty {
    SignatureProperty {
        has_this: true,
        property_type: SignatureParameter::plain(ty),
        params: params.into_iter().map(SignatureParameter::plain).collect(),
    }
}

/// A core unit defining `System.Object`, `System.ValueType`, `System.Enum`, `System.Attribute`,
/// `System.Type`, `System.String` and `System.Int32`
pub fn core_unit() -> InMemoryMetadata {
    let mut core = MetadataBuilder::new(CORE);
    let object = core.type_def("System", "Object", TypeAttributes::PUBLIC, None);
    let value_type = core.type_def("System", "ValueType", TypeAttributes::PUBLIC, Some(object));
    core.type_def("System", "Enum", TypeAttributes::PUBLIC, Some(value_type));
    core.type_def("System", "Attribute", TypeAttributes::PUBLIC, Some(object));
    core.type_def("System", "Type", TypeAttributes::PUBLIC, Some(object));
    core.type_def("System", "String", TypeAttributes::PUBLIC, Some(object));
    core.type_def("System", "Int32", TypeAttributes::PUBLIC, Some(value_type));
    core.build()
}

/// A `TypeRef` into the core unit
pub fn core_ref(builder: &mut MetadataBuilder, namespace: &str, name: &str) -> Token {
    builder.type_ref(ResolutionScope::Unit(CORE.to_string()), namespace, name)
}

/// Adds a public instance constructor to `class`
pub fn constructor(
    builder: &mut MetadataBuilder,
    class: Token,
    params: Vec<TypeSignature>,
) -> Result<Token> {
    builder.method(
        class,
        ".ctor",
        MethodAttributes::PUBLIC
            | MethodAttributes::SPECIAL_NAME
            | MethodAttributes::RT_SPECIAL_NAME,
        &method_sig(true, TypeSignature::Void, params),
    )
}

/// A unit that defines nothing and forwards `namespace.name` to `target`
pub fn forwarding_unit(unit: &str, namespace: &str, name: &str, target: &str) -> InMemoryMetadata {
    let mut builder = MetadataBuilder::new(unit);
    builder.forward(namespace, name, target);
    builder.build()
}

/// Encodes a `SerString`
pub fn ser_string(value: &str) -> Vec<u8> {
    assert!(value.len() < 0x80);
    let mut bytes = vec![value.len() as u8];
    bytes.extend_from_slice(value.as_bytes());
    bytes
}

/// Blob of an attribute whose constructor takes strings, without named arguments
pub fn string_blob(values: &[&str]) -> Vec<u8> {
    let mut blob = vec![0x01, 0x00];
    for value in values {
        blob.extend(ser_string(value));
    }
    blob.extend_from_slice(&[0x00, 0x00]);
    blob
}
