//! Signature encoders producing the blob formats read by [`super::SignatureParser`].
//!
//! The in-memory metadata builder uses these to store signatures exactly as a compiler would
//! emit them, so every row handed to the symbol engine goes through the real blob decoder.
//!
//! # Available Encoders
//!
//! - [`encode_method_signature`] - `MethodDefSig` / `MethodRefSig`
//! - [`encode_field_signature`] - `FieldSig`
//! - [`encode_property_signature`] - `PropertySig`
//! - [`encode_typespec_signature`] - `TypeSpec` blobs

use crate::{
    file::io::{write_compressed_int, write_compressed_uint},
    metadata::{
        signatures::{
            CustomModifier, SignatureElement, SignatureField, SignatureMethod, SignatureParameter,
            SignatureProperty, TypeSignature, CALLING_CONVENTION, ELEMENT_TYPE,
        },
        token::{TableId, Token},
    },
    Result,
};

/// Encodes a token as a `TypeDefOrRefOrSpecEncoded` coded index (ECMA-335 II.23.2.8).
fn encode_type_def_or_ref(token: Token, buffer: &mut Vec<u8>) -> Result<()> {
    let rid = token.row();
    let coded = match token.table() {
        TableId::TYPE_DEF => rid << 2,
        TableId::TYPE_REF => (rid << 2) | 1,
        TableId::TYPE_SPEC => (rid << 2) | 2,
        other => {
            return Err(malformed_error!(
                "Invalid token table 0x{:02X} for TypeDefOrRef coded index - {}",
                other,
                token
            ))
        }
    };

    write_compressed_uint(coded, buffer);
    Ok(())
}

fn encode_custom_mods(modifiers: &[CustomModifier], buffer: &mut Vec<u8>) -> Result<()> {
    for modifier in modifiers {
        buffer.push(if modifier.is_required {
            ELEMENT_TYPE::CMOD_REQD
        } else {
            ELEMENT_TYPE::CMOD_OPT
        });
        encode_type_def_or_ref(modifier.modifier_type, buffer)?;
    }
    Ok(())
}

fn encode_element(element: &SignatureElement, buffer: &mut Vec<u8>) -> Result<()> {
    encode_custom_mods(&element.modifiers, buffer)?;
    encode_type(&element.base, buffer)
}

fn encode_param(param: &SignatureParameter, buffer: &mut Vec<u8>) -> Result<()> {
    if param.by_ref {
        encode_custom_mods(&param.ref_modifiers, buffer)?;
        buffer.push(ELEMENT_TYPE::BYREF);
    }
    encode_custom_mods(&param.modifiers, buffer)?;
    encode_type(&param.base, buffer)
}

#[allow(clippy::cast_possible_truncation)]
fn encode_type(signature: &TypeSignature, buffer: &mut Vec<u8>) -> Result<()> {
    match signature {
        TypeSignature::Void => buffer.push(ELEMENT_TYPE::VOID),
        TypeSignature::Boolean => buffer.push(ELEMENT_TYPE::BOOLEAN),
        TypeSignature::Char => buffer.push(ELEMENT_TYPE::CHAR),
        TypeSignature::I1 => buffer.push(ELEMENT_TYPE::I1),
        TypeSignature::U1 => buffer.push(ELEMENT_TYPE::U1),
        TypeSignature::I2 => buffer.push(ELEMENT_TYPE::I2),
        TypeSignature::U2 => buffer.push(ELEMENT_TYPE::U2),
        TypeSignature::I4 => buffer.push(ELEMENT_TYPE::I4),
        TypeSignature::U4 => buffer.push(ELEMENT_TYPE::U4),
        TypeSignature::I8 => buffer.push(ELEMENT_TYPE::I8),
        TypeSignature::U8 => buffer.push(ELEMENT_TYPE::U8),
        TypeSignature::R4 => buffer.push(ELEMENT_TYPE::R4),
        TypeSignature::R8 => buffer.push(ELEMENT_TYPE::R8),
        TypeSignature::String => buffer.push(ELEMENT_TYPE::STRING),
        TypeSignature::Object => buffer.push(ELEMENT_TYPE::OBJECT),
        TypeSignature::I => buffer.push(ELEMENT_TYPE::I),
        TypeSignature::U => buffer.push(ELEMENT_TYPE::U),
        TypeSignature::TypedByRef => buffer.push(ELEMENT_TYPE::TYPEDBYREF),
        TypeSignature::ValueType(token) => {
            buffer.push(ELEMENT_TYPE::VALUETYPE);
            encode_type_def_or_ref(*token, buffer)?;
        }
        TypeSignature::Class(token) => {
            buffer.push(ELEMENT_TYPE::CLASS);
            encode_type_def_or_ref(*token, buffer)?;
        }
        TypeSignature::GenericParamType(index) => {
            buffer.push(ELEMENT_TYPE::VAR);
            write_compressed_uint(*index, buffer);
        }
        TypeSignature::GenericParamMethod(index) => {
            buffer.push(ELEMENT_TYPE::MVAR);
            write_compressed_uint(*index, buffer);
        }
        TypeSignature::Ptr(element) => {
            buffer.push(ELEMENT_TYPE::PTR);
            encode_element(element, buffer)?;
        }
        TypeSignature::SzArray(element) => {
            buffer.push(ELEMENT_TYPE::SZARRAY);
            encode_element(element, buffer)?;
        }
        TypeSignature::Array(array) => {
            buffer.push(ELEMENT_TYPE::ARRAY);
            encode_element(&array.element, buffer)?;
            write_compressed_uint(array.rank, buffer);
            write_compressed_uint(array.sizes.len() as u32, buffer);
            for size in &array.sizes {
                write_compressed_uint(*size, buffer);
            }
            write_compressed_uint(array.lower_bounds.len() as u32, buffer);
            for bound in &array.lower_bounds {
                write_compressed_int(*bound, buffer);
            }
        }
        TypeSignature::GenericInst(definition, args) => {
            buffer.push(ELEMENT_TYPE::GENERICINST);
            encode_type(definition, buffer)?;
            write_compressed_uint(args.len() as u32, buffer);
            for arg in args {
                encode_element(arg, buffer)?;
            }
        }
        TypeSignature::ByRef(inner) => {
            buffer.push(ELEMENT_TYPE::BYREF);
            encode_type(inner, buffer)?;
        }
        TypeSignature::FnPtr(method) => {
            buffer.push(ELEMENT_TYPE::FNPTR);
            buffer.extend(encode_method_signature(method)?);
        }
    }
    Ok(())
}

/// Encodes a method signature.
///
/// # Errors
/// Returns [`crate::Error::Malformed`] if a type token does not address a TypeDef, TypeRef or
/// TypeSpec row.
#[allow(clippy::cast_possible_truncation)]
pub fn encode_method_signature(signature: &SignatureMethod) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();

    let mut convention = if signature.vararg {
        CALLING_CONVENTION::VARARG
    } else {
        CALLING_CONVENTION::DEFAULT
    };
    if signature.has_this {
        convention |= CALLING_CONVENTION::HAS_THIS;
    }
    if signature.explicit_this {
        convention |= CALLING_CONVENTION::EXPLICIT_THIS;
    }
    if signature.generic_param_count > 0 {
        convention |= CALLING_CONVENTION::GENERIC;
    }
    buffer.push(convention);

    if signature.generic_param_count > 0 {
        write_compressed_uint(signature.generic_param_count, &mut buffer);
    }
    write_compressed_uint(
        (signature.params.len() + signature.varargs.len()) as u32,
        &mut buffer,
    );
    encode_param(&signature.return_type, &mut buffer)?;

    for param in &signature.params {
        encode_param(param, &mut buffer)?;
    }
    if !signature.varargs.is_empty() {
        buffer.push(ELEMENT_TYPE::SENTINEL);
        for param in &signature.varargs {
            encode_param(param, &mut buffer)?;
        }
    }

    Ok(buffer)
}

/// Encodes a field signature.
///
/// # Errors
/// Returns [`crate::Error::Malformed`] for an invalid type token.
pub fn encode_field_signature(signature: &SignatureField) -> Result<Vec<u8>> {
    let mut buffer = vec![CALLING_CONVENTION::FIELD];
    encode_param(&signature.field_type, &mut buffer)?;
    Ok(buffer)
}

/// Encodes a property signature.
///
/// # Errors
/// Returns [`crate::Error::Malformed`] for an invalid type token.
#[allow(clippy::cast_possible_truncation)]
pub fn encode_property_signature(signature: &SignatureProperty) -> Result<Vec<u8>> {
    let mut buffer = vec![if signature.has_this {
        CALLING_CONVENTION::PROPERTY | CALLING_CONVENTION::HAS_THIS
    } else {
        CALLING_CONVENTION::PROPERTY
    }];

    write_compressed_uint(signature.params.len() as u32, &mut buffer);
    encode_param(&signature.property_type, &mut buffer)?;
    for param in &signature.params {
        encode_param(param, &mut buffer)?;
    }
    Ok(buffer)
}

/// Encodes a `TypeSpec` blob.
///
/// # Errors
/// Returns [`crate::Error::Malformed`] for an invalid type token.
pub fn encode_typespec_signature(signature: &SignatureElement) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    encode_element(signature, &mut buffer)?;
    Ok(buffer)
}
