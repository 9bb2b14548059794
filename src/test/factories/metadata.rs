//! Units and rows built with [`MetadataBuilder`].

use crate::metadata::{
    flags::MethodAttributes,
    reader::{InMemoryMetadata, MetadataBuilder, ResolutionScope},
    signatures::{SignatureMethod, SignatureParameter, TypeSignature},
    token::Token,
};

/// A method signature without generic parameters or varargs
pub fn signature(
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

/// A unit that defines nothing and forwards `namespace.name` to `target`
pub fn forwarding_unit(unit: &str, namespace: &str, name: &str, target: &str) -> InMemoryMetadata {
    let mut builder = MetadataBuilder::new(unit);
    builder.forward(namespace, name, target);
    builder.build()
}

/// A `MemberRef` to the constructor of `attribute` in `unit` taking `strings` string arguments
pub fn string_ctor_ref(
    builder: &mut MetadataBuilder,
    unit: &str,
    attribute: &str,
    strings: usize,
) -> Token {
    let (namespace, name) = attribute.rsplit_once('.').unwrap_or(("", attribute));
    let parent = builder.type_ref(ResolutionScope::Unit(unit.to_string()), namespace, name);
    builder
        .member_ref(
            parent,
            ".ctor",
            &signature(
                true,
                TypeSignature::Void,
                vec![TypeSignature::String; strings],
            ),
        )
        .unwrap()
}

/// Blob of an attribute with one string argument and no named arguments
pub fn guid_attribute(guid: &str) -> Vec<u8> {
    string_blob(&[guid])
}

/// Blob of an attribute with string arguments and no named arguments
pub fn string_blob(values: &[&str]) -> Vec<u8> {
    let mut blob = vec![0x01, 0x00];
    for value in values {
        assert!(value.len() < 0x80);
        blob.push(value.len() as u8);
        blob.extend_from_slice(value.as_bytes());
    }
    blob.extend_from_slice(&[0x00, 0x00]);
    blob
}

/// An instance method returning `void` without parameters
pub fn void_method(
    builder: &mut MetadataBuilder,
    class: Token,
    name: &str,
    flags: MethodAttributes,
) -> Token {
    builder
        .method(class, name, flags, &signature(true, TypeSignature::Void, vec![]))
        .unwrap()
}

/// An instance method returning `int` without parameters
pub fn int_getter(
    builder: &mut MetadataBuilder,
    class: Token,
    name: &str,
    flags: MethodAttributes,
) -> Token {
    builder
        .method(class, name, flags, &signature(true, TypeSignature::I4, vec![]))
        .unwrap()
}
