use std::{fmt, sync::Arc};

use crate::metadata::{
    flags::TypeAttributes,
    reader::GenericParamRow,
    token::Token,
    typesystem::{ErrorKind, SymbolId, TypeParameterKind, TypeParameterRef},
};

/// Reference to a `NamedType`
pub type NamedTypeRc = Arc<NamedType>;

/// The flattened list of type parameters visible inside a definition, outermost container first.
///
/// For `Outer<T>.Inner<U>` the context of `Inner` is `[T, U]` and a `!1` in one of its
/// signatures refers to `U`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenericContext {
    slots: Vec<TypeParameterRef>,
}

impl GenericContext {
    /// A context without type parameters
    #[must_use]
    pub fn empty() -> Self {
        GenericContext::default()
    }

    /// Extends `container` with the definition's own parameter rows.
    ///
    /// Metadata repeats every outer parameter in a nested type's rows, so only rows past the
    /// container's length introduce new slots. A nested type with fewer rows than its
    /// container is unsupported; the container's context is kept and the local arity is 0.
    #[must_use]
    pub fn flatten(
        container: Option<&GenericContext>,
        rows: &[GenericParamRow],
        owner: SymbolId,
    ) -> (GenericContext, u32, Option<ErrorKind>) {
        let outer = container.map_or(&[][..], |context| context.slots.as_slice());
        if rows.len() < outer.len() {
            return (
                GenericContext {
                    slots: outer.to_vec(),
                },
                0,
                Some(ErrorKind::UnsupportedMetadata(format!(
                    "nested type declares {} type parameters, its container {}",
                    rows.len(),
                    outer.len()
                ))),
            );
        }

        let mut slots = outer.to_vec();
        slots.extend(rows.iter().enumerate().skip(outer.len()).map(
            |(position, row)| TypeParameterRef {
                kind: TypeParameterKind::Type,
                owner,
                position: position as u32,
                name: row.name.clone(),
            },
        ));

        let local = (rows.len() - outer.len()) as u32;
        (GenericContext { slots }, local, None)
    }

    /// Number of slots
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if no type parameter is in scope
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The slot at `position`
    #[must_use]
    pub fn get(&self, position: u32) -> Option<&TypeParameterRef> {
        self.slots.get(position as usize)
    }

    /// All slots, outermost first
    #[must_use]
    pub fn slots(&self) -> &[TypeParameterRef] {
        &self.slots
    }
}

/// Type identifier carried by an embedded interop type
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmbeddedTypeInfo {
    /// Scope argument (a GUID string), present only for the two-argument form
    pub scope: Option<String>,
    /// Identifier argument, present only for the two-argument form
    pub identifier: Option<String>,
}

/// A type definition materialized from a `TypeDef` row
pub struct NamedType {
    /// Identity
    pub id: SymbolId,
    /// Position of the declaring unit in its resolution context
    pub(crate) unit: usize,
    /// Name of the declaring unit
    pub unit_name: String,
    /// `TypeDef` token
    pub token: Token,
    /// Namespace, empty for nested types
    pub namespace: String,
    /// Name with a matching arity suffix removed
    pub name: String,
    /// Name as stored in metadata
    pub metadata_name: String,
    /// Type attributes
    pub flags: TypeAttributes,
    /// Enclosing type of nested types
    pub containing: Option<NamedTypeRc>,
    /// Present when the definition is an embedded interop stub
    pub embedded: Option<EmbeddedTypeInfo>,
    /// Argument of the type's `GuidAttribute`
    pub guid: Option<String>,
    pub(crate) arity: u32,
    pub(crate) generic_context: GenericContext,
    pub(crate) use_site_error: Option<ErrorKind>,
}

impl NamedType {
    /// Number of type parameters the definition declares itself
    #[must_use]
    pub fn arity(&self) -> u32 {
        self.arity
    }

    /// All type parameters in scope, including those of enclosing types
    #[must_use]
    pub fn generic_context(&self) -> &GenericContext {
        &self.generic_context
    }

    /// The type parameters introduced by this definition
    #[must_use]
    pub fn type_parameters(&self) -> &[TypeParameterRef] {
        let slots = self.generic_context.slots();
        &slots[slots.len() - self.arity as usize..]
    }

    /// A problem with the definition itself that consumers report at the use site
    #[must_use]
    pub fn use_site_error(&self) -> Option<&ErrorKind> {
        self.use_site_error.as_ref()
    }

    /// Returns `true` for interface definitions
    #[must_use]
    pub fn is_interface(&self) -> bool {
        self.flags.is_interface()
    }

    /// Returns `true` for embedded interop stubs
    #[must_use]
    pub fn is_embedded(&self) -> bool {
        self.embedded.is_some()
    }

    /// Metadata full name: `Namespace.Name`, nested types as `Outer+Inner`
    #[must_use]
    pub fn full_name(&self) -> String {
        match &self.containing {
            Some(containing) => format!("{}+{}", containing.full_name(), self.metadata_name),
            None if self.namespace.is_empty() => self.metadata_name.clone(),
            None => format!("{}.{}", self.namespace, self.metadata_name),
        }
    }

    pub(crate) fn display_name_without_arity(&self) -> String {
        match &self.containing {
            Some(containing) => {
                format!("{}.{}", containing.display_name_without_arity(), self.name)
            }
            None if self.namespace.is_empty() => self.name.clone(),
            None => format!("{}.{}", self.namespace, self.name),
        }
    }
}

impl fmt::Display for NamedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name_without_arity())?;
        let own = self.type_parameters();
        if !own.is_empty() {
            let names: Vec<&str> = own.iter().map(|p| p.name.as_str()).collect();
            write!(f, "<{}>", names.join(", "))?;
        }
        Ok(())
    }
}

impl fmt::Debug for NamedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NamedType({} in {}, {})", self.full_name(), self.unit_name, self.token)
    }
}

/// Removes a `` `N`` suffix from `name` if `N` equals `arity`
#[must_use]
pub fn strip_arity_suffix(name: &str, arity: u32) -> &str {
    if arity == 0 {
        return name;
    }

    match name.rsplit_once('`') {
        Some((stem, suffix)) if suffix.parse::<u32>().ok() == Some(arity) => stem,
        _ => name,
    }
}
