//! Binding of `CustomAttribute` rows to symbols.

use std::sync::Arc;

use tracing::warn;

use crate::{
    metadata::{
        context::ResolutionContext,
        customattributes::{
            parser::{AttributeBlobParser, AttributeTypes, DecodedArguments},
            types::{AttributeApplication, AttributeList},
        },
        decoder::SignatureDecoder,
        members::MethodRc,
        reader::CustomAttributeRow,
        signatures::SignatureParser,
        token::{TableId, Token},
        typesystem::{
            ArrayType, ErrorKind, GenericContext, PointerType, PrimitiveKind, Symbol, TypeMap,
            TypeName, TypeNameSuffix, TypeWithModifiers,
        },
        unit::CompiledUnit,
    },
    Result,
};

const SYSTEM_ENUM: &str = "System.Enum";
const SYSTEM_TYPE: &str = "System.Type";

/// Resolves the types an attribute blob mentions, relative to the unit the blob belongs to
struct UnitAttributeTypes<'a> {
    ctx: &'a ResolutionContext,
    unit: &'a CompiledUnit,
}

impl UnitAttributeTypes<'_> {
    fn resolve(&self, name: &TypeName) -> Symbol {
        let top = name.top_level_full_name();
        let mut symbol = match &name.assembly {
            Some(assembly) => match self.ctx.unit_by_name(assembly) {
                Some(target) => self.ctx.resolve_top_level(target, &top),
                None => Symbol::error(ErrorKind::Missing {
                    name: top.clone(),
                    unit: assembly.clone(),
                }),
            },
            None => self.resolve_unqualified(&top),
        };

        for nested in name.names.iter().skip(1) {
            symbol = match symbol {
                Symbol::Named(outer) => {
                    let full_name = format!("{}+{}", outer.full_name(), nested);
                    match self.ctx.unit_at(outer.unit).and_then(|owner| {
                        owner
                            .lookup(&full_name)
                            .map(|token| self.ctx.type_def_symbol(owner, token))
                    }) {
                        Some(inner) => inner,
                        None => Symbol::error(ErrorKind::Missing {
                            name: full_name,
                            unit: outer.unit_name.clone(),
                        }),
                    }
                }
                other => return other,
            };
        }

        if !name.generic_args.is_empty() {
            symbol = match symbol {
                Symbol::Named(definition) => {
                    let args: Vec<TypeWithModifiers> = name
                        .generic_args
                        .iter()
                        .map(|arg| self.resolve(arg).plain())
                        .collect();
                    self.ctx.construct(&definition, args)
                }
                other => other,
            };
        }

        for suffix in &name.suffixes {
            symbol = match suffix {
                TypeNameSuffix::SzArray => Symbol::Array(Arc::new(ArrayType::sz(symbol.plain()))),
                TypeNameSuffix::Array(rank) => Symbol::Array(Arc::new(ArrayType {
                    rank: *rank,
                    is_sz: false,
                    ..ArrayType::sz(symbol.plain())
                })),
                TypeNameSuffix::Pointer => Symbol::Pointer(Arc::new(PointerType {
                    pointed_at: symbol.plain(),
                })),
                TypeNameSuffix::ByRef => {
                    return Symbol::error(ErrorKind::UnsupportedMetadata(format!(
                        "by-ref type '{}' in an attribute argument",
                        name.nested_full_name()
                    )))
                }
            };
        }

        symbol
    }

    /// Current unit first, then the core unit, then the built-in fallback
    fn resolve_unqualified(&self, full_name: &str) -> Symbol {
        let local = self.ctx.resolve_top_level(self.unit, full_name);
        if !is_missing(&local) {
            return local;
        }

        if let Some(core) = self.ctx.core_unit() {
            let symbol = self.ctx.resolve_top_level(core, full_name);
            if !is_missing(&symbol) {
                return symbol;
            }
        }

        match PrimitiveKind::from_full_name(full_name) {
            Some(kind) => Symbol::Primitive(kind),
            None => local,
        }
    }
}

fn is_missing(symbol: &Symbol) -> bool {
    matches!(symbol.as_error(), Some(ErrorKind::Missing { .. }))
}

impl AttributeTypes for UnitAttributeTypes<'_> {
    fn primitive(&self, kind: PrimitiveKind) -> Symbol {
        self.ctx.primitive(kind)
    }

    fn system_type(&self) -> Symbol {
        self.resolve_unqualified(SYSTEM_TYPE)
    }

    fn named(&self, serialized: &str) -> Symbol {
        match TypeName::parse(serialized) {
            Ok(name) => self.resolve(&name),
            Err(error) => Symbol::error(ErrorKind::UnsupportedMetadata(format!(
                "type name '{}': {}",
                serialized, error
            ))),
        }
    }

    fn enum_underlying(&self, ty: &Symbol) -> Option<PrimitiveKind> {
        if !matches!(ty, Symbol::Named(_)) {
            return None;
        }

        let base = self.ctx.base_type(ty)?;
        let base_name = match base.as_error() {
            Some(ErrorKind::Missing { name, .. }) => Some(name.clone()),
            _ => base.full_name(),
        };
        if base_name.as_deref() != Some(SYSTEM_ENUM) {
            return None;
        }

        self.ctx
            .members(ty)
            .fields()
            .find(|field| !field.is_static())
            .and_then(|field| field.ty.symbol.full_name())
            .and_then(|name| PrimitiveKind::from_full_name(&name))
            .filter(|kind| kind.is_integral())
    }
}

impl ResolutionContext {
    /// The custom attributes applied to `target` in `unit`, in declaration order.
    ///
    /// Attributes whose constructor cannot be bound or whose blob cannot be decoded are part of
    /// the list with [`AttributeApplication::has_errors`] set.
    ///
    /// # Errors
    /// Returns [`crate::Error::UnitNotFound`] for unknown units.
    pub fn attributes(&self, unit: &str, target: Token) -> Result<AttributeList> {
        let unit = self.unit(unit)?;
        Ok(self.attributes_in(unit, target))
    }

    pub(crate) fn attributes_in(&self, unit: &CompiledUnit, target: Token) -> AttributeList {
        unit.attributes.get_or_compute(target, || {
            Arc::new(
                unit.reader()
                    .custom_attributes(target)
                    .iter()
                    .map(|row| self.materialize_attribute(unit, row))
                    .collect(),
            )
        })
    }

    fn materialize_attribute(
        &self,
        unit: &CompiledUnit,
        row: &CustomAttributeRow,
    ) -> AttributeApplication {
        let failed = |attribute_type: Symbol| AttributeApplication {
            target: row.parent,
            attribute_type,
            constructor: None,
            positional: Vec::new(),
            named: Vec::new(),
            has_errors: true,
        };

        let attribute_type = match row.constructor.table() {
            TableId::METHOD_DEF => match unit.declaring_type(row.constructor) {
                Some(owner) => self.type_def_symbol(unit, owner),
                None => Symbol::error(ErrorKind::UnsupportedMetadata(format!(
                    "attribute constructor {} has no declaring type",
                    row.constructor
                ))),
            },
            TableId::MEMBER_REF => match unit.reader().member_ref(row.constructor) {
                Some(member_ref) => SignatureDecoder::new(self, unit, &GenericContext::empty(), &[])
                    .resolve_token(member_ref.parent),
                None => Symbol::error(ErrorKind::UnsupportedMetadata(format!(
                    "attribute constructor {} does not exist",
                    row.constructor
                ))),
            },
            _ => Symbol::error(ErrorKind::UnsupportedMetadata(format!(
                "{} is not a constructor token",
                row.constructor
            ))),
        };

        let Some(definition) = attribute_type.definition().cloned() else {
            return failed(attribute_type);
        };

        let Some(parameters) = self.constructor_parameters(unit, row.constructor, &attribute_type)
        else {
            warn!(
                unit = unit.name(),
                target = %row.parent,
                attribute = %definition,
                "undecodable attribute constructor"
            );
            return failed(attribute_type);
        };

        let Some(constructor) = self.bind_constructor(&attribute_type, &parameters) else {
            warn!(
                unit = unit.name(),
                target = %row.parent,
                attribute = %definition,
                "no matching attribute constructor"
            );
            return failed(attribute_type);
        };
        let types = UnitAttributeTypes { ctx: self, unit };
        let parameter_types: Vec<Symbol> =
            parameters.iter().map(|parameter| parameter.symbol.clone()).collect();

        match AttributeBlobParser::new(&row.value, &types, self.options.max_signature_depth)
            .parse(&parameter_types)
        {
            Ok(DecodedArguments { positional, named }) => AttributeApplication {
                target: row.parent,
                attribute_type,
                constructor: Some(constructor),
                positional,
                named,
                has_errors: false,
            },
            Err(error) => {
                warn!(
                    unit = unit.name(),
                    target = %row.parent,
                    attribute = %definition,
                    %error,
                    "malformed attribute blob"
                );
                AttributeApplication {
                    constructor: Some(constructor),
                    ..failed(attribute_type)
                }
            }
        }
    }

    /// Parameter types of an attribute constructor, substituted for generic attributes.
    ///
    /// `None` if the signature is unreadable or takes a parameter by reference.
    fn constructor_parameters(
        &self,
        unit: &CompiledUnit,
        constructor: Token,
        attribute_type: &Symbol,
    ) -> Option<Vec<TypeWithModifiers>> {
        let definition = attribute_type.definition()?;
        let signature = SignatureParser::new(unit.constructor_signature(constructor)?)
            .with_max_depth(self.options.max_signature_depth)
            .parse_method_signature()
            .ok()?;

        let mut decoder = SignatureDecoder::new(self, unit, definition.generic_context(), &[]);
        let mut parameters = Vec::with_capacity(signature.params.len());
        for param in &signature.params {
            let decoded = decoder.decode_parameter(param);
            if decoded.by_ref || decoded.ty.symbol.find_error().is_some() {
                return None;
            }
            parameters.push(decoded.ty);
        }

        if let Symbol::Constructed(constructed) = attribute_type {
            let map = TypeMap::new(&constructed.args);
            parameters = parameters
                .iter()
                .map(|parameter| map.substitute(self, parameter))
                .collect();
        }
        Some(parameters)
    }

    /// The imported instance constructor with matching parameters.
    ///
    /// Constructors with the same number of parameters whose types match exactly win over
    /// those that merely agree in count.
    fn bind_constructor(
        &self,
        attribute_type: &Symbol,
        parameters: &[TypeWithModifiers],
    ) -> Option<MethodRc> {
        let members = self.members(attribute_type);
        let candidates: Vec<&MethodRc> = members
            .constructors()
            .filter(|ctor| ctor.parameters.len() == parameters.len())
            .collect();

        candidates
            .iter()
            .find(|ctor| {
                ctor.parameters
                    .iter()
                    .zip(parameters)
                    .all(|(declared, used)| declared.ty.symbol == used.symbol)
            })
            .or_else(|| candidates.first())
            .map(|ctor| Arc::clone(ctor))
    }
}
