//! Free-standing member symbols, for logic that does not need a resolution context.

use std::sync::OnceLock;

use crate::metadata::{
    flags::MethodAttributes,
    members::{Method, Parameter, RefKind, Virtualness},
    token::Token,
    typesystem::{PrimitiveKind, Symbol, TypeWithModifiers},
};

/// A by-value parameter
pub fn parameter(name: &str, ordinal: u32, ty: TypeWithModifiers) -> Parameter {
    Parameter {
        name: name.to_string(),
        ordinal,
        ref_kind: RefKind::None,
        ref_modifiers: Vec::new(),
        ty,
    }
}

/// A non-virtual method declared on `object`
pub fn method(
    name: &str,
    flags: MethodAttributes,
    return_type: TypeWithModifiers,
    parameters: Vec<Parameter>,
) -> Method {
    Method {
        token: Token::new(0x0600_0001),
        name: name.to_string(),
        declaring_type: Symbol::Primitive(PrimitiveKind::Object),
        flags,
        type_parameters: Vec::new(),
        return_ref_kind: RefKind::None,
        return_ref_modifiers: Vec::new(),
        return_type,
        parameters,
        virtualness: Virtualness::NonVirtual,
        explicit_overrides: Vec::new(),
        is_init_only: false,
        kind: OnceLock::new(),
        use_site: OnceLock::new(),
    }
}
