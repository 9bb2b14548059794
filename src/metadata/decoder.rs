//! Maps parsed signatures to symbols.
//!
//! A [`SignatureDecoder`] is created per member (or per base type, per attribute constructor)
//! with the generic context the signature is interpreted in. `!n` refers to slot `n` of the
//! declaring type's flattened context, `!!n` to the method's own type parameters.
//!
//! Two rules are applied while decoding:
//!
//! - a type definition of the decoding unit that is an embedded interop stub is replaced by its
//!   canonical definition,
//! - a generic instantiation whose definition lives in another unit but whose arguments refer
//!   to such a local stub cannot be formed.

use std::sync::Arc;

use tracing::trace;

use crate::metadata::{
    context::ResolutionContext,
    signatures::{
        CustomModifier, SignatureElement, SignatureParameter, SignatureParser, TypeSignature,
    },
    token::{TableId, Token},
    typesystem::{
        ArrayType, ErrorKind, GenericContext, Modifier, PointerType, PrimitiveKind, Symbol,
        TypeParameterRef, TypeWithModifiers,
    },
    unit::CompiledUnit,
};

/// A decoded parameter, return or field position
#[derive(Debug, Clone)]
pub(crate) struct DecodedParameter {
    pub by_ref: bool,
    pub ref_modifiers: Vec<Modifier>,
    pub ty: TypeWithModifiers,
}

pub(crate) struct SignatureDecoder<'a> {
    ctx: &'a ResolutionContext,
    unit: &'a CompiledUnit,
    type_context: &'a GenericContext,
    method_parameters: &'a [TypeParameterRef],
    depth: usize,
    local_stub: Option<Symbol>,
}

fn unsupported(message: String) -> Symbol {
    Symbol::error(ErrorKind::UnsupportedMetadata(message))
}

impl<'a> SignatureDecoder<'a> {
    pub(crate) fn new(
        ctx: &'a ResolutionContext,
        unit: &'a CompiledUnit,
        type_context: &'a GenericContext,
        method_parameters: &'a [TypeParameterRef],
    ) -> Self {
        SignatureDecoder {
            ctx,
            unit,
            type_context,
            method_parameters,
            depth: 0,
            local_stub: None,
        }
    }

    pub(crate) fn decode_parameter(&mut self, parameter: &SignatureParameter) -> DecodedParameter {
        let ref_modifiers = self.decode_modifiers(&parameter.ref_modifiers);
        let modifiers = self.decode_modifiers(&parameter.modifiers);
        let symbol = self.decode_type(&parameter.base);
        DecodedParameter {
            by_ref: parameter.by_ref,
            ref_modifiers,
            ty: TypeWithModifiers::new(symbol, modifiers),
        }
    }

    pub(crate) fn decode_element(&mut self, element: &SignatureElement) -> TypeWithModifiers {
        let modifiers = self.decode_modifiers(&element.modifiers);
        let symbol = self.decode_type(&element.base);
        TypeWithModifiers::new(symbol, modifiers)
    }

    fn decode_modifiers(&mut self, modifiers: &[CustomModifier]) -> Vec<Modifier> {
        modifiers
            .iter()
            .map(|modifier| Modifier {
                is_optional: !modifier.is_required,
                modifier_type: self.resolve_token(modifier.modifier_type),
            })
            .collect()
    }

    pub(crate) fn decode_type(&mut self, signature: &TypeSignature) -> Symbol {
        match signature {
            TypeSignature::Class(token) | TypeSignature::ValueType(token) => {
                self.resolve_token(*token)
            }
            TypeSignature::GenericParamType(position) => self
                .type_context
                .get(*position)
                .cloned()
                .map_or_else(
                    || unsupported(format!("type parameter !{} is out of range", position)),
                    Symbol::TypeParameter,
                ),
            TypeSignature::GenericParamMethod(position) => self
                .method_parameters
                .get(*position as usize)
                .cloned()
                .map_or_else(
                    || unsupported(format!("method type parameter !!{} is out of range", position)),
                    Symbol::TypeParameter,
                ),
            TypeSignature::Ptr(element) => Symbol::Pointer(Arc::new(PointerType {
                pointed_at: self.decode_element(element),
            })),
            TypeSignature::SzArray(element) => {
                Symbol::Array(Arc::new(ArrayType::sz(self.decode_element(element))))
            }
            TypeSignature::Array(array) => Symbol::Array(Arc::new(ArrayType {
                element: self.decode_element(&array.element),
                rank: array.rank,
                is_sz: false,
                sizes: array.sizes.clone(),
                lower_bounds: array.lower_bounds.clone(),
            })),
            TypeSignature::GenericInst(definition, args) => {
                self.decode_instantiation(definition, args)
            }
            TypeSignature::ByRef(_) => unsupported("by-ref type in a value position".to_string()),
            TypeSignature::FnPtr(_) => unsupported("function pointer types".to_string()),
            other => match PrimitiveKind::from_signature(other) {
                Some(kind) => self.ctx.primitive(kind),
                None => unsupported(format!("signature element {:?}", other)),
            },
        }
    }

    fn decode_instantiation(
        &mut self,
        definition: &TypeSignature,
        args: &[SignatureElement],
    ) -> Symbol {
        let definition = match definition {
            TypeSignature::Class(token) | TypeSignature::ValueType(token) => {
                self.resolve_token(*token)
            }
            other => return unsupported(format!("generic instantiation of {:?}", other)),
        };

        let outer_stub = self.local_stub.take();
        let args: Vec<TypeWithModifiers> =
            args.iter().map(|arg| self.decode_element(arg)).collect();
        let stub_in_args = self.local_stub.take();
        self.local_stub = outer_stub.or_else(|| stub_in_args.clone());

        match definition {
            Symbol::Named(named) => {
                if let Some(stub) = stub_in_args {
                    if named.unit != self.unit.index {
                        trace!(
                            unit = self.unit.name(),
                            definition = %named,
                            "instantiation over a local embedded type"
                        );
                        return Symbol::error(ErrorKind::IllegalGenericInstantiation {
                            cause: stub,
                        });
                    }
                }
                self.ctx.construct(&named, args)
            }
            error @ Symbol::Error(_) => error,
            other => unsupported(format!("generic instantiation of '{}'", other)),
        }
    }

    /// Resolves a `TypeDef`, `TypeRef` or `TypeSpec` token in the decoder's context
    pub(crate) fn resolve_token(&mut self, token: Token) -> Symbol {
        let symbol = match token.table() {
            TableId::TYPE_DEF => self.ctx.type_def_symbol(self.unit, token),
            TableId::TYPE_REF => self.ctx.type_ref_symbol(self.unit, token),
            TableId::TYPE_SPEC => return self.resolve_type_spec(token),
            _ => return unsupported(format!("{} is not a type token", token)),
        };

        match &symbol {
            Symbol::Named(named) if named.is_embedded() && named.unit == self.unit.index => {
                self.local_stub = Some(symbol.clone());
                self.ctx.canonical_for(self.unit, named)
            }
            _ => symbol,
        }
    }

    fn resolve_type_spec(&mut self, token: Token) -> Symbol {
        let max_depth = self.ctx.options.max_signature_depth;
        if self.depth >= max_depth {
            return unsupported(format!("type specification {} nests too deeply", token));
        }

        let Some(blob) = self.unit.reader().type_spec(token) else {
            return unsupported(format!("{} is not a type specification", token));
        };

        match SignatureParser::new(blob)
            .with_max_depth(max_depth)
            .parse_type_spec_signature()
        {
            Ok(element) => {
                self.depth += 1;
                let symbol = self.decode_type(&element.base);
                self.depth -= 1;
                symbol
            }
            Err(error) => unsupported(format!("type specification {}: {}", token, error)),
        }
    }
}
