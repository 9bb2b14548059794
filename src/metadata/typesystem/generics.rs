//! Generic construction and type substitution.
//!
//! A constructed type always carries one argument per slot of its definition's flattened
//! generic context, outermost container first. Substituting through a constructed type maps
//! every `!n` to the argument at position `n`; method type parameters are left alone.

use std::sync::Arc;

use crate::metadata::{
    context::ResolutionContext,
    typesystem::{
        ArrayType, ConstructedType, ErrorKind, NamedTypeRc, PointerType, Symbol, SymbolId,
        TypeParameterKind, TypeWithModifiers,
    },
};

/// Maps type parameter slots of a generic definition to arguments
pub struct TypeMap<'a> {
    type_args: &'a [TypeWithModifiers],
}

impl<'a> TypeMap<'a> {
    /// A map for the flattened argument list of a constructed type
    #[must_use]
    pub fn new(type_args: &'a [TypeWithModifiers]) -> Self {
        TypeMap { type_args }
    }

    /// Substitutes every type parameter in `ty`.
    ///
    /// When a parameter carrying modifiers is replaced by an argument that carries modifiers
    /// itself, the result holds the parameter's modifiers followed by the argument's.
    #[must_use]
    pub fn substitute(&self, ctx: &ResolutionContext, ty: &TypeWithModifiers) -> TypeWithModifiers {
        let mut result = self.substitute_symbol(ctx, &ty.symbol);
        if !ty.modifiers.is_empty() {
            let mut merged = ty.modifiers.clone();
            merged.append(&mut result.modifiers);
            result.modifiers = merged;
        }
        result
    }

    fn substitute_symbol(&self, ctx: &ResolutionContext, symbol: &Symbol) -> TypeWithModifiers {
        match symbol {
            Symbol::TypeParameter(parameter) if parameter.kind == TypeParameterKind::Type => {
                match self.type_args.get(parameter.position as usize) {
                    Some(arg) => arg.clone(),
                    None => symbol.clone().plain(),
                }
            }
            Symbol::Constructed(constructed) => {
                let args: Vec<TypeWithModifiers> = constructed
                    .args
                    .iter()
                    .map(|arg| self.substitute(ctx, arg))
                    .collect();
                if args == constructed.args {
                    symbol.clone().plain()
                } else {
                    ctx.construct(&constructed.definition, args).plain()
                }
            }
            Symbol::Array(array) => Symbol::Array(Arc::new(ArrayType {
                element: self.substitute(ctx, &array.element),
                ..(**array).clone()
            }))
            .plain(),
            Symbol::Pointer(pointer) => Symbol::Pointer(Arc::new(PointerType {
                pointed_at: self.substitute(ctx, &pointer.pointed_at),
            }))
            .plain(),
            _ => symbol.clone().plain(),
        }
    }
}

impl ResolutionContext {
    /// Applies a generic definition to its flattened argument list.
    ///
    /// Returns the definition itself when it has no type parameters in scope, and an error
    /// symbol when the argument count does not match or an argument contains an error. Equal
    /// requests return the same instance.
    #[must_use]
    pub fn construct(&self, definition: &NamedTypeRc, args: Vec<TypeWithModifiers>) -> Symbol {
        let expected = definition.generic_context().len();
        if args.len() != expected {
            return Symbol::error(ErrorKind::UnsupportedMetadata(format!(
                "'{}' expects {} type arguments, got {}",
                definition.full_name(),
                expected,
                args.len()
            )));
        }

        if expected == 0 {
            return Symbol::Named(definition.clone());
        }

        if let Some(cause) = args.iter().find_map(|arg| arg.symbol.find_error()) {
            return Symbol::error(ErrorKind::IllegalGenericInstantiation { cause });
        }

        let Some(unit) = self.unit_at(definition.unit) else {
            return Symbol::error(ErrorKind::Missing {
                name: definition.full_name(),
                unit: definition.unit_name.clone(),
            });
        };

        unit.constructed
            .get_or_compute((definition.id, args.clone()), || {
                Symbol::Constructed(Arc::new(ConstructedType {
                    id: SymbolId::next(),
                    definition: definition.clone(),
                    args,
                }))
            })
    }
}
