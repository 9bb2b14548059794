//! The resolution context: a set of compiled units that reference each other.
//!
//! Every symbol is materialized relative to one [`ResolutionContext`]. Identity guarantees hold
//! inside a context: asking twice for the same definition, constructed shape, member list or
//! attribute list returns the same instance. Two contexts built over the same readers never
//! share instances, but produce structurally equivalent graphs.
//!
//! # Examples
//!
//! ```rust
//! use symgraph::metadata::{
//!     context::ResolutionContext, flags::TypeAttributes, reader::MetadataBuilder,
//! };
//!
//! let mut lib = MetadataBuilder::new("Lib");
//! let widget = lib.type_def("Acme", "Widget", TypeAttributes::PUBLIC, None);
//!
//! let ctx = ResolutionContext::builder().unit(lib.build()).build()?;
//! let symbol = ctx.type_def("Lib", widget)?;
//! assert_eq!(symbol, ctx.resolve_forwarded("Lib", "Acme.Widget")?);
//! # Ok::<(), symgraph::Error>(())
//! ```

use std::{collections::HashMap, sync::Arc};

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::{
    metadata::{
        config::ImportOptions,
        decoder::SignatureDecoder,
        reader::{MetadataReader, ResolutionScope},
        token::{TableId, Token},
        typesystem::{
            strip_arity_suffix, EmbeddedTypeInfo, ErrorKind, GenericContext, NamedType,
            PrimitiveKind, Symbol, SymbolId, TypeMap,
        },
        unit::{CompiledUnit, GUID_ATTRIBUTE, TYPE_IDENTIFIER_ATTRIBUTE},
    },
    Error, Result,
};

const MAX_NESTING: usize = 64;

/// Collects the units of a [`ResolutionContext`]
#[derive(Default)]
pub struct ResolutionContextBuilder {
    readers: Vec<Box<dyn MetadataReader>>,
    core: Option<String>,
    options: ImportOptions,
}

impl ResolutionContextBuilder {
    /// Adds a unit. The order of calls is the supply order used to break ties.
    #[must_use]
    pub fn unit<R: MetadataReader + 'static>(mut self, reader: R) -> Self {
        self.readers.push(Box::new(reader));
        self
    }

    /// Adds an already boxed unit
    #[must_use]
    pub fn boxed_unit(mut self, reader: Box<dyn MetadataReader>) -> Self {
        self.readers.push(reader);
        self
    }

    /// Names the unit that defines `System.Object`, `System.Int32` and the other built-in
    /// types. Without it, the first unit defining `System.Object` is used.
    #[must_use]
    pub fn core_unit(mut self, name: &str) -> Self {
        self.core = Some(name.to_string());
        self
    }

    /// Replaces the import options
    #[must_use]
    pub fn options(mut self, options: ImportOptions) -> Self {
        self.options = options;
        self
    }

    /// Builds the context
    ///
    /// # Errors
    /// Returns [`Error::DuplicateUnit`] if two units share a name and [`Error::UnitNotFound`]
    /// if the configured core unit is not among them.
    pub fn build(self) -> Result<ResolutionContext> {
        let mut units = Vec::with_capacity(self.readers.len());
        let mut by_name = HashMap::new();

        for (index, reader) in self.readers.into_iter().enumerate() {
            let name = reader.unit_name().to_string();
            if by_name.insert(name.clone(), index).is_some() {
                return Err(Error::DuplicateUnit(name));
            }

            let unit = CompiledUnit::new(index, reader);
            debug!(
                unit = unit.name(),
                index,
                types = unit.reader().type_defs().len(),
                "registered compiled unit"
            );
            units.push(unit);
        }

        let core = match self.core {
            Some(name) => Some(*by_name.get(&name).ok_or(Error::UnitNotFound(name))?),
            None => units
                .iter()
                .find(|unit| unit.lookup("System.Object").is_some())
                .map(CompiledUnit::index),
        };

        Ok(ResolutionContext {
            units,
            by_name,
            core,
            options: self.options,
        })
    }
}

/// A set of compiled units and the symbol graph materialized from them
pub struct ResolutionContext {
    units: Vec<CompiledUnit>,
    by_name: HashMap<String, usize>,
    core: Option<usize>,
    pub(crate) options: ImportOptions,
}

impl ResolutionContext {
    /// Starts collecting units
    #[must_use]
    pub fn builder() -> ResolutionContextBuilder {
        ResolutionContextBuilder::default()
    }

    /// The import options
    #[must_use]
    pub fn options(&self) -> &ImportOptions {
        &self.options
    }

    /// All units in supply order
    pub fn units(&self) -> impl Iterator<Item = &CompiledUnit> {
        self.units.iter()
    }

    /// The unit called `name`
    ///
    /// # Errors
    /// Returns [`Error::UnitNotFound`] if no such unit was registered.
    pub fn unit(&self, name: &str) -> Result<&CompiledUnit> {
        self.by_name
            .get(name)
            .and_then(|index| self.units.get(*index))
            .ok_or_else(|| Error::UnitNotFound(name.to_string()))
    }

    /// The unit defining the built-in types, if any
    #[must_use]
    pub fn core_unit(&self) -> Option<&CompiledUnit> {
        self.core.and_then(|index| self.units.get(index))
    }

    pub(crate) fn unit_at(&self, index: usize) -> Option<&CompiledUnit> {
        self.units.get(index)
    }

    pub(crate) fn unit_by_name(&self, name: &str) -> Option<&CompiledUnit> {
        self.by_name.get(name).and_then(|index| self.units.get(*index))
    }

    /// The symbol of the type definition `token` in `unit`
    ///
    /// # Errors
    /// Returns [`Error::UnitNotFound`] for unknown units and [`Error::TypeNotFound`] if `token`
    /// does not address a `TypeDef` row.
    pub fn type_def(&self, unit: &str, token: Token) -> Result<Symbol> {
        let unit = self.unit(unit)?;
        if unit.reader().type_def(token).is_none() {
            return Err(Error::TypeNotFound(token));
        }
        Ok(self.type_def_symbol(unit, token))
    }

    /// The symbol of the type reference `token` in `unit`
    ///
    /// # Errors
    /// Returns [`Error::UnitNotFound`] for unknown units and [`Error::TypeNotFound`] if `token`
    /// does not address a `TypeRef` row.
    pub fn type_ref(&self, unit: &str, token: Token) -> Result<Symbol> {
        let unit = self.unit(unit)?;
        if unit.reader().type_ref(token).is_none() {
            return Err(Error::TypeNotFound(token));
        }
        Ok(self.type_ref_symbol(unit, token))
    }

    /// The built-in type `kind`: the core unit's definition, or [`Symbol::Primitive`]
    #[must_use]
    pub fn primitive(&self, kind: PrimitiveKind) -> Symbol {
        self.core_unit()
            .and_then(|core| {
                core.lookup(&kind.full_name())
                    .map(|token| self.type_def_symbol(core, token))
            })
            .unwrap_or(Symbol::Primitive(kind))
    }

    pub(crate) fn type_def_symbol(&self, unit: &CompiledUnit, token: Token) -> Symbol {
        unit.types
            .get_or_compute(token, || self.create_named_type(unit, token))
    }

    fn create_named_type(&self, unit: &CompiledUnit, token: Token) -> Symbol {
        let Some(row) = unit.reader().type_def(token) else {
            return Symbol::error(ErrorKind::UnsupportedMetadata(format!(
                "{} is not a type definition in '{}'",
                token,
                unit.name()
            )));
        };

        let mut enclosing = row.enclosing;
        for _ in 0..MAX_NESTING {
            match enclosing {
                Some(outer) if outer == token => break,
                Some(outer) => enclosing = unit.reader().type_def(outer).and_then(|r| r.enclosing),
                None => break,
            }
        }
        if enclosing.is_some() {
            warn!(unit = unit.name(), %token, "cyclic type nesting");
            return Symbol::error(ErrorKind::UnsupportedMetadata(format!(
                "type nesting of {} in '{}' is cyclic",
                token,
                unit.name()
            )));
        }

        let containing = match row.enclosing {
            Some(outer) => match self.type_def_symbol(unit, outer) {
                Symbol::Named(named) => Some(named),
                other => return other,
            },
            None => None,
        };

        let id = SymbolId::next();
        let (generic_context, arity, use_site_error) = GenericContext::flatten(
            containing.as_ref().map(|outer| outer.generic_context()),
            unit.reader().generic_params(token),
            id,
        );
        if let Some(error) = &use_site_error {
            warn!(unit = unit.name(), %token, %error, "unsupported generic arity");
        }

        let embedded = unit
            .attribute_strings(token, TYPE_IDENTIFIER_ATTRIBUTE)
            .map(|args| match args.as_slice() {
                [scope, identifier] => EmbeddedTypeInfo {
                    scope: scope.clone(),
                    identifier: identifier.clone(),
                },
                _ => EmbeddedTypeInfo {
                    scope: None,
                    identifier: None,
                },
            })
            .or_else(|| {
                unit.has_type_identifier(token).then_some(EmbeddedTypeInfo {
                    scope: None,
                    identifier: None,
                })
            });

        let guid = unit
            .attribute_strings(token, GUID_ATTRIBUTE)
            .and_then(|args| args.into_iter().next().flatten());

        debug!(unit = unit.name(), %token, name = %row.name, "materialized type definition");

        Symbol::Named(Arc::new(NamedType {
            id,
            unit: unit.index,
            unit_name: unit.name().to_string(),
            token,
            namespace: row.namespace.clone(),
            name: strip_arity_suffix(&row.name, arity).to_string(),
            metadata_name: row.name.clone(),
            flags: row.flags,
            containing,
            embedded,
            guid,
            arity,
            generic_context,
            use_site_error,
        }))
    }

    pub(crate) fn type_ref_symbol(&self, unit: &CompiledUnit, token: Token) -> Symbol {
        unit.type_refs
            .get_or_compute(token, || self.resolve_type_ref(unit, token, 0))
    }

    fn resolve_type_ref(&self, unit: &CompiledUnit, token: Token, depth: usize) -> Symbol {
        let Some(row) = unit.reader().type_ref(token) else {
            return Symbol::error(ErrorKind::UnsupportedMetadata(format!(
                "{} is not a type reference in '{}'",
                token,
                unit.name()
            )));
        };
        let full_name = if row.namespace.is_empty() {
            row.name.clone()
        } else {
            format!("{}.{}", row.namespace, row.name)
        };

        match &row.scope {
            ResolutionScope::Local => self.resolve_top_level(unit, &full_name),
            ResolutionScope::Unit(target) => match self.unit_by_name(target) {
                Some(target) => self.resolve_top_level(target, &full_name),
                None => Symbol::error(ErrorKind::Missing {
                    name: full_name,
                    unit: target.clone(),
                }),
            },
            ResolutionScope::Nested(parent) => {
                if depth > MAX_NESTING || !parent.is_table(TableId::TYPE_REF) {
                    return Symbol::error(ErrorKind::UnsupportedMetadata(format!(
                        "invalid nesting scope for type reference '{}'",
                        row.name
                    )));
                }

                match self.resolve_type_ref(unit, *parent, depth + 1) {
                    Symbol::Named(outer) => {
                        let nested = format!("{}+{}", outer.full_name(), row.name);
                        match self.unit_at(outer.unit).and_then(|owner| {
                            owner
                                .lookup(&nested)
                                .map(|token| self.type_def_symbol(owner, token))
                        }) {
                            Some(symbol) => symbol,
                            None => Symbol::error(ErrorKind::Missing {
                                name: nested,
                                unit: outer.unit_name.clone(),
                            }),
                        }
                    }
                    error => error,
                }
            }
        }
    }

    /// The base type of a named or constructed type, decoded in the definition's generic
    /// context and substituted for constructed types
    #[must_use]
    pub fn base_type(&self, symbol: &Symbol) -> Option<Symbol> {
        match symbol {
            Symbol::Named(named) => {
                let unit = self.unit_at(named.unit)?;
                unit.base_types.get_or_compute(named.id, || {
                    let extends = unit.reader().type_def(named.token)?.extends?;
                    let mut decoder =
                        SignatureDecoder::new(self, unit, named.generic_context(), &[]);
                    Some(decoder.resolve_token(extends))
                })
            }
            Symbol::Constructed(constructed) => {
                let unit = self.unit_at(constructed.definition.unit)?;
                unit.base_types.get_or_compute(constructed.id, || {
                    let base = self.base_type(&Symbol::Named(constructed.definition.clone()))?;
                    let map = TypeMap::new(&constructed.args);
                    Some(map.substitute(self, &base.plain()).symbol)
                })
            }
            _ => None,
        }
    }

    /// Materializes every type definition of `unit` together with its member list and
    /// attributes. Uses `rayon` when [`ImportOptions::parallel`] is set.
    ///
    /// # Errors
    /// Returns [`Error::UnitNotFound`] for unknown units.
    pub fn materialize_all(&self, unit: &str) -> Result<Vec<Symbol>> {
        let unit = self.unit(unit)?;
        let tokens: Vec<Token> = unit.reader().type_defs().iter().map(|row| row.token).collect();

        let materialize = |token: &Token| {
            let symbol = self.type_def_symbol(unit, *token);
            let _ = self.members(&symbol);
            let _ = self.attributes_in(unit, *token);
            let _ = self.base_type(&symbol);
            symbol
        };

        let symbols = if self.options.parallel {
            tokens.par_iter().map(materialize).collect()
        } else {
            tokens.iter().map(materialize).collect()
        };

        debug!(unit = unit.name(), count = tokens.len(), "materialized unit");
        Ok(symbols)
    }
}

impl std::fmt::Debug for ResolutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionContext")
            .field("units", &self.units)
            .field("options", &self.options)
            .finish()
    }
}
