//! A compiled unit registered in a resolution context.
//!
//! [`CompiledUnit`] wraps a [`MetadataReader`] with the indexes the engine needs for name
//! lookups (type definitions by full name, forwarders by full name, member to declaring type)
//! and owns every cache of symbols materialized from the unit. All caches of a unit share one
//! claim domain, see [`crate::metadata::cache`].

use std::collections::{HashMap, HashSet};

use crossbeam_skiplist::SkipMap;

use crate::metadata::{
    cache::SymbolCache,
    customattributes::{decode_string_arguments, AttributeList},
    members::{TypeMembersRc, UseSiteDiagnostic},
    reader::{MemberRow, MetadataReader, ResolutionScope},
    signatures::{SignatureParser, TypeSignature},
    token::{TableId, Token},
    typesystem::{Symbol, SymbolId, TypeWithModifiers},
};

/// `System.Runtime.InteropServices.TypeIdentifierAttribute`
pub(crate) const TYPE_IDENTIFIER_ATTRIBUTE: &str =
    "System.Runtime.InteropServices.TypeIdentifierAttribute";
/// `System.Runtime.InteropServices.GuidAttribute`
pub(crate) const GUID_ATTRIBUTE: &str = "System.Runtime.InteropServices.GuidAttribute";

const MAX_NAME_NESTING: usize = 64;

/// A compiled unit and the symbols materialized from it
pub struct CompiledUnit {
    pub(crate) index: usize,
    name: String,
    reader: Box<dyn MetadataReader>,
    type_index: SkipMap<String, Token>,
    forwarders: HashMap<String, String>,
    member_owners: HashMap<Token, Token>,
    guid: Option<String>,
    embeds_interop_types: bool,
    diagnostics: boxcar::Vec<UseSiteDiagnostic>,
    pub(crate) types: SymbolCache<Token, Symbol>,
    pub(crate) type_refs: SymbolCache<Token, Symbol>,
    pub(crate) constructed: SymbolCache<(SymbolId, Vec<TypeWithModifiers>), Symbol>,
    pub(crate) members: SymbolCache<Token, TypeMembersRc>,
    pub(crate) constructed_members: SymbolCache<SymbolId, TypeMembersRc>,
    pub(crate) base_types: SymbolCache<SymbolId, Option<Symbol>>,
    pub(crate) attributes: SymbolCache<Token, AttributeList>,
    pub(crate) forwards: SymbolCache<String, Symbol>,
    pub(crate) canonical: SymbolCache<Token, Symbol>,
}

impl CompiledUnit {
    pub(crate) fn new(index: usize, reader: Box<dyn MetadataReader>) -> Self {
        let owner = SymbolCache::<Token, Symbol>::next_owner();

        let mut member_owners = HashMap::new();
        for row in reader.type_defs() {
            for member in &row.members {
                member_owners.insert(*member, row.token);
            }
        }

        let mut forwarders = HashMap::new();
        for row in reader.exported_types() {
            let name = qualified(&row.namespace, &row.name);
            forwarders
                .entry(name)
                .or_insert_with(|| row.forwarded_to.clone());
        }

        let mut unit = CompiledUnit {
            index,
            name: reader.unit_name().to_string(),
            reader,
            type_index: SkipMap::new(),
            forwarders,
            member_owners,
            guid: None,
            embeds_interop_types: false,
            diagnostics: boxcar::Vec::new(),
            types: SymbolCache::with_owner(owner),
            type_refs: SymbolCache::with_owner(owner),
            constructed: SymbolCache::with_owner(owner),
            members: SymbolCache::with_owner(owner),
            constructed_members: SymbolCache::with_owner(owner),
            base_types: SymbolCache::with_owner(owner),
            attributes: SymbolCache::with_owner(owner),
            forwards: SymbolCache::with_owner(owner),
            canonical: SymbolCache::with_owner(owner),
        };

        for row in unit.reader.type_defs() {
            if let Some(full_name) = unit.type_name_of(row.token) {
                if !unit.type_index.contains_key(&full_name) {
                    unit.type_index.insert(full_name, row.token);
                }
            }
        }

        unit.guid = unit
            .attribute_strings(Token::ASSEMBLY, GUID_ATTRIBUTE)
            .and_then(|args| args.into_iter().next().flatten());

        unit.embeds_interop_types = unit
            .reader
            .type_defs()
            .iter()
            .any(|row| unit.has_type_identifier(row.token));

        unit
    }

    /// Name of the unit
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Position in the resolution context, which is also the supply order
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// The row reader the unit was registered with
    #[must_use]
    pub fn reader(&self) -> &dyn MetadataReader {
        self.reader.as_ref()
    }

    /// Argument of the unit's assembly-level `GuidAttribute`
    #[must_use]
    pub fn guid(&self) -> Option<&str> {
        self.guid.as_deref()
    }

    /// Returns `true` if any type definition of the unit is an embedded interop stub
    #[must_use]
    pub fn embeds_interop_types(&self) -> bool {
        self.embeds_interop_types
    }

    /// The `TypeDef` defining `full_name` (`Namespace.Name`, nested types as `Outer+Inner`)
    #[must_use]
    pub fn lookup(&self, full_name: &str) -> Option<Token> {
        self.type_index.get(full_name).map(|entry| *entry.value())
    }

    /// Full names of all type definitions, sorted
    pub fn type_names(&self) -> impl Iterator<Item = String> + '_ {
        self.type_index.iter().map(|entry| entry.key().clone())
    }

    /// Target unit of the forwarder for `full_name`
    #[must_use]
    pub fn forwarder(&self, full_name: &str) -> Option<&str> {
        self.forwarders.get(full_name).map(String::as_str)
    }

    /// The `TypeDef` declaring a member row
    #[must_use]
    pub fn declaring_type(&self, member: Token) -> Option<Token> {
        self.member_owners.get(&member).copied()
    }

    /// Use-site diagnostics recorded while materializing members of this unit
    #[must_use]
    pub fn diagnostics(&self) -> Vec<UseSiteDiagnostic> {
        let mut seen = HashSet::new();
        self.diagnostics
            .iter()
            .map(|(_, diagnostic)| diagnostic)
            .filter(|diagnostic| seen.insert((*diagnostic).clone()))
            .cloned()
            .collect()
    }

    pub(crate) fn report(&self, diagnostic: UseSiteDiagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Full metadata name of a `TypeDef` or `TypeRef` row
    #[must_use]
    pub fn type_name_of(&self, token: Token) -> Option<String> {
        self.type_name_at_depth(token, 0)
    }

    fn type_name_at_depth(&self, token: Token, depth: usize) -> Option<String> {
        if depth > MAX_NAME_NESTING {
            return None;
        }

        match token.table() {
            TableId::TYPE_DEF => {
                let row = self.reader.type_def(token)?;
                match row.enclosing {
                    Some(enclosing) => Some(format!(
                        "{}+{}",
                        self.type_name_at_depth(enclosing, depth + 1)?,
                        row.name
                    )),
                    None => Some(qualified(&row.namespace, &row.name)),
                }
            }
            TableId::TYPE_REF => {
                let row = self.reader.type_ref(token)?;
                match &row.scope {
                    ResolutionScope::Nested(parent) => Some(format!(
                        "{}+{}",
                        self.type_name_at_depth(*parent, depth + 1)?,
                        row.name
                    )),
                    _ => Some(qualified(&row.namespace, &row.name)),
                }
            }
            _ => None,
        }
    }

    /// Full name of the type declaring an attribute constructor
    pub(crate) fn constructor_type_name(&self, constructor: Token) -> Option<String> {
        match constructor.table() {
            TableId::METHOD_DEF => self.type_name_of(self.declaring_type(constructor)?),
            TableId::MEMBER_REF => self.type_name_of(self.reader.member_ref(constructor)?.parent),
            _ => None,
        }
    }

    /// Returns `true` if `TypeIdentifierAttribute` is applied to `token`, whatever its arguments
    pub(crate) fn has_type_identifier(&self, token: Token) -> bool {
        self.reader.custom_attributes(token).iter().any(|attribute| {
            self.constructor_type_name(attribute.constructor).as_deref()
                == Some(TYPE_IDENTIFIER_ATTRIBUTE)
        })
    }

    pub(crate) fn constructor_signature(&self, constructor: Token) -> Option<&[u8]> {
        match constructor.table() {
            TableId::METHOD_DEF => match self.reader.member(constructor)? {
                MemberRow::Method(row) => Some(&row.signature),
                _ => None,
            },
            TableId::MEMBER_REF => Some(&self.reader.member_ref(constructor)?.signature),
            _ => None,
        }
    }

    /// String arguments of the first `attribute` applied to `target`.
    ///
    /// Works directly on rows so that it can run before any symbol of the unit exists. Returns
    /// `None` if no such attribute is applied, its constructor takes anything but strings, or
    /// the blob is malformed.
    pub(crate) fn attribute_strings(
        &self,
        target: Token,
        attribute: &str,
    ) -> Option<Vec<Option<String>>> {
        let row = self
            .reader
            .custom_attributes(target)
            .iter()
            .find(|row| self.constructor_type_name(row.constructor).as_deref() == Some(attribute))?;

        let signature = SignatureParser::new(self.constructor_signature(row.constructor)?)
            .parse_method_signature()
            .ok()?;
        if signature
            .params
            .iter()
            .any(|param| param.by_ref || param.base != TypeSignature::String)
        {
            return None;
        }

        decode_string_arguments(&row.value, signature.params.len()).ok()
    }
}

impl std::fmt::Debug for CompiledUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CompiledUnit({}, #{})", self.name, self.index)
    }
}

fn qualified(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", namespace, name)
    }
}
