//! Canonical identity of embedded interop types.
//!
//! A unit compiled with embedded interop types carries local copies ("stubs") of the types it
//! uses, marked with `TypeIdentifierAttribute`. Every such stub is identified by a
//! [`CanonicalKey`] and replaced by the one definition with the same key among the units the
//! embedding unit (transitively) references.
//!
//! Candidate units are visited in supply order. Units that embed interop types themselves are
//! not candidates, although their references are still followed. A candidate is looked up by
//! name, following its type forwarders; candidates that are stubs themselves never match. The
//! first two matches are reported when the key is ambiguous.

use std::collections::{HashSet, VecDeque};

use tracing::{debug, warn};
use uguid::Guid;

use crate::{
    metadata::{
        context::ResolutionContext,
        token::Token,
        typesystem::{ErrorKind, NamedType, NamedTypeRc, Symbol},
        unit::CompiledUnit,
    },
    Error, Result,
};

/// The identity an embedded stub and its canonical definition share
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalKey {
    /// Interface GUID, type library scope or unit GUID, depending on the kind of type
    pub scope: Option<Guid>,
    /// `Namespace.Name` the canonical definition is looked up by
    pub name: String,
}

fn parse_guid(text: Option<&str>) -> Option<Guid> {
    text.and_then(|text| Guid::try_parse(text.trim()).ok())
}

impl CanonicalKey {
    /// The key of an embedded stub
    #[must_use]
    pub fn of_stub(stub: &NamedType) -> Self {
        if let Some(info) = &stub.embedded {
            if let (Some(scope), Some(identifier)) = (&info.scope, &info.identifier) {
                return CanonicalKey {
                    scope: parse_guid(Some(scope)),
                    name: identifier.clone(),
                };
            }
        }

        CanonicalKey {
            scope: if stub.is_interface() {
                parse_guid(stub.guid.as_deref())
            } else {
                None
            },
            name: stub.full_name(),
        }
    }

    fn of_candidate(candidate: &NamedType, unit: &CompiledUnit) -> Self {
        let scope = if candidate.is_interface() {
            parse_guid(candidate.guid.as_deref())
        } else {
            parse_guid(unit.guid())
        };
        CanonicalKey {
            scope,
            name: candidate.full_name(),
        }
    }
}

impl ResolutionContext {
    /// The canonical definition for the type definition `token` in `unit`.
    ///
    /// Definitions that are not embedded stubs are returned unchanged.
    ///
    /// # Errors
    /// Returns [`Error::UnitNotFound`] for unknown units and [`Error::TypeNotFound`] if `token`
    /// does not address a `TypeDef` row.
    pub fn canonical_type(&self, unit: &str, token: Token) -> Result<Symbol> {
        let symbol = self.type_def(unit, token)?;
        let unit = self.unit(unit)?;
        match &symbol {
            Symbol::Named(named) if named.is_embedded() => Ok(self.canonical_for(unit, named)),
            Symbol::Named(_) => Ok(symbol),
            _ => Err(Error::TypeNotFound(token)),
        }
    }

    pub(crate) fn canonical_for(&self, unit: &CompiledUnit, stub: &NamedTypeRc) -> Symbol {
        unit.canonical
            .get_or_compute(stub.token, || self.find_canonical(unit, stub))
    }

    /// Units reachable through unit references, in supply order, without `unit` itself and
    /// without other units that embed interop types
    fn candidate_units(&self, unit: &CompiledUnit) -> Vec<&CompiledUnit> {
        let mut seen = HashSet::from([unit.index]);
        let mut queue = VecDeque::from([unit]);
        let mut reachable = Vec::new();

        while let Some(current) = queue.pop_front() {
            for reference in current.reader().assembly_refs() {
                if let Some(next) = self.unit_by_name(reference) {
                    if seen.insert(next.index) {
                        if !next.embeds_interop_types() {
                            reachable.push(next);
                        }
                        queue.push_back(next);
                    }
                }
            }
        }

        reachable.sort_by_key(|candidate| candidate.index);
        reachable
    }

    fn find_canonical(&self, unit: &CompiledUnit, stub: &NamedTypeRc) -> Symbol {
        let key = CanonicalKey::of_stub(stub);
        let mut matches: Vec<NamedTypeRc> = Vec::new();

        for candidate_unit in self.candidate_units(unit) {
            let Symbol::Named(candidate) = self.resolve_top_level(candidate_unit, &key.name)
            else {
                continue;
            };
            if candidate.is_embedded() || matches.iter().any(|m| m.id == candidate.id) {
                continue;
            }

            let Some(defining_unit) = self.unit_at(candidate.unit) else {
                continue;
            };
            if CanonicalKey::of_candidate(&candidate, defining_unit) == key {
                matches.push(candidate);
            }
        }

        match matches.as_slice() {
            [] => {
                warn!(unit = unit.name(), stub = %stub.full_name(), "no canonical definition");
                let info = stub.embedded.clone().unwrap_or_default();
                Symbol::error(ErrorKind::MissingCanonical {
                    scope: info.scope,
                    identifier: info.identifier,
                    full_name: stub.full_name(),
                })
            }
            [single] => {
                debug!(
                    unit = unit.name(),
                    stub = %stub.full_name(),
                    canonical = %single.unit_name,
                    "unified embedded type"
                );
                Symbol::Named(single.clone())
            }
            [first, second, ..] => {
                warn!(
                    unit = unit.name(),
                    stub = %stub.full_name(),
                    first = %first.unit_name,
                    second = %second.unit_name,
                    "ambiguous canonical definition"
                );
                Symbol::error(ErrorKind::AmbiguousCanonical {
                    first: Symbol::Named(first.clone()),
                    second: Symbol::Named(second.clone()),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{
        flags::TypeAttributes,
        typesystem::{EmbeddedTypeInfo, GenericContext, SymbolId},
    };

    fn named(
        flags: TypeAttributes,
        guid: Option<&str>,
        embedded: Option<EmbeddedTypeInfo>,
    ) -> NamedType {
        NamedType {
            id: SymbolId::next(),
            unit: 0,
            unit_name: "App".into(),
            token: Token::new(0x0200_0001),
            namespace: "Interop".into(),
            name: "IWidget".into(),
            metadata_name: "IWidget".into(),
            flags,
            containing: None,
            embedded,
            guid: guid.map(str::to_string),
            arity: 0,
            generic_context: GenericContext::empty(),
            use_site_error: None,
        }
    }

    #[test]
    fn stub_keys() {
        let guid = "27f1b1f6-6e4b-4a8b-9d3a-0e5f5a0c1b2d";
        let interface = named(
            TypeAttributes::INTERFACE,
            Some(guid),
            Some(EmbeddedTypeInfo::default()),
        );
        let key = CanonicalKey::of_stub(&interface);
        assert_eq!(key.name, "Interop.IWidget");
        assert_eq!(key.scope, Guid::try_parse(guid).ok());

        let structure = named(
            TypeAttributes::empty(),
            Some(guid),
            Some(EmbeddedTypeInfo::default()),
        );
        assert_eq!(CanonicalKey::of_stub(&structure).scope, None);

        let identified = named(
            TypeAttributes::empty(),
            None,
            Some(EmbeddedTypeInfo {
                scope: Some(guid.to_string()),
                identifier: Some("Real.Name".into()),
            }),
        );
        let key = CanonicalKey::of_stub(&identified);
        assert_eq!(key.name, "Real.Name");
        assert!(key.scope.is_some());
    }

    #[test]
    fn unparsable_guid_is_absent() {
        assert_eq!(parse_guid(Some("not a guid")), None);
        assert_eq!(parse_guid(None), None);
    }
}
