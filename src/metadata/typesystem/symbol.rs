use std::{
    fmt,
    hash::{Hash, Hasher},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use thiserror::Error;

use crate::metadata::typesystem::{NamedType, NamedTypeRc, PrimitiveKind};

static NEXT_SYMBOL_ID: AtomicU64 = AtomicU64::new(1);

/// Process-wide unique identity of a materialized symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(u64);

impl SymbolId {
    /// Allocates a fresh id
    #[must_use]
    pub fn next() -> Self {
        SymbolId(NEXT_SYMBOL_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw value
    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Reference to a `ConstructedType`
pub type ConstructedTypeRc = Arc<ConstructedType>;

/// A type in the symbol graph.
///
/// Named and constructed types compare by identity: two requests for the same definition or the
/// same constructed shape inside one resolution context return the same instance. All other
/// variants compare structurally.
#[derive(Clone)]
pub enum Symbol {
    /// A type definition, possibly generic
    Named(NamedTypeRc),
    /// A generic definition applied to its flattened argument list
    Constructed(ConstructedTypeRc),
    /// A single- or multi-dimensional array
    Array(Arc<ArrayType>),
    /// An unmanaged pointer
    Pointer(Arc<PointerType>),
    /// A type or method type parameter
    TypeParameter(TypeParameterRef),
    /// A built-in type with no defining unit in the context
    Primitive(PrimitiveKind),
    /// A metadata problem materialized as a type
    Error(Arc<ErrorType>),
}

impl Symbol {
    /// Wraps an [`ErrorKind`]
    #[must_use]
    pub fn error(kind: ErrorKind) -> Self {
        Symbol::Error(Arc::new(ErrorType { kind }))
    }

    /// Wraps the symbol with no modifiers
    #[must_use]
    pub fn plain(self) -> TypeWithModifiers {
        TypeWithModifiers {
            symbol: self,
            modifiers: Vec::new(),
        }
    }

    /// Returns `true` for [`Symbol::Error`]
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Symbol::Error(_))
    }

    /// The error kind, if this is an error symbol
    #[must_use]
    pub fn as_error(&self) -> Option<&ErrorKind> {
        match self {
            Symbol::Error(error) => Some(&error.kind),
            _ => None,
        }
    }

    /// The definition, if this is a named type
    #[must_use]
    pub fn as_named(&self) -> Option<&NamedTypeRc> {
        match self {
            Symbol::Named(named) => Some(named),
            _ => None,
        }
    }

    /// The definition behind a named or constructed type
    #[must_use]
    pub fn definition(&self) -> Option<&NamedTypeRc> {
        match self {
            Symbol::Named(named) => Some(named),
            Symbol::Constructed(constructed) => Some(&constructed.definition),
            _ => None,
        }
    }

    /// The first error symbol found in this type or, through arrays, pointers and constructed
    /// arguments, in any of its components
    #[must_use]
    pub fn find_error(&self) -> Option<Symbol> {
        match self {
            Symbol::Error(_) => Some(self.clone()),
            Symbol::Array(array) => array.element.symbol.find_error(),
            Symbol::Pointer(pointer) => pointer.pointed_at.symbol.find_error(),
            Symbol::Constructed(constructed) => constructed
                .args
                .iter()
                .find_map(|arg| arg.symbol.find_error()),
            Symbol::Named(_) | Symbol::TypeParameter(_) | Symbol::Primitive(_) => None,
        }
    }

    /// `Namespace.Name` of named and constructed types, the primitive's `System.Name`
    #[must_use]
    pub fn full_name(&self) -> Option<String> {
        match self {
            Symbol::Named(named) => Some(named.full_name()),
            Symbol::Constructed(constructed) => Some(constructed.definition.full_name()),
            Symbol::Primitive(kind) => Some(kind.full_name()),
            _ => None,
        }
    }

    /// Compares two symbols that may come from different resolution contexts.
    ///
    /// Named types match on declaring unit name, full name and arity; everything else is
    /// compared component-wise. Type parameters compare by kind and position only since their
    /// owners are context-specific.
    #[must_use]
    pub fn is_structurally_equivalent(&self, other: &Symbol) -> bool {
        match (self, other) {
            (Symbol::Named(a), Symbol::Named(b)) => named_equivalent(a, b),
            (Symbol::Constructed(a), Symbol::Constructed(b)) => {
                named_equivalent(&a.definition, &b.definition)
                    && a.args.len() == b.args.len()
                    && a.args
                        .iter()
                        .zip(&b.args)
                        .all(|(x, y)| x.is_structurally_equivalent(y))
            }
            (Symbol::Array(a), Symbol::Array(b)) => {
                a.rank == b.rank
                    && a.is_sz == b.is_sz
                    && a.sizes == b.sizes
                    && a.lower_bounds == b.lower_bounds
                    && a.element.is_structurally_equivalent(&b.element)
            }
            (Symbol::Pointer(a), Symbol::Pointer(b)) => {
                a.pointed_at.is_structurally_equivalent(&b.pointed_at)
            }
            (Symbol::TypeParameter(a), Symbol::TypeParameter(b)) => {
                a.kind == b.kind && a.position == b.position
            }
            (Symbol::Primitive(a), Symbol::Primitive(b)) => a == b,
            (Symbol::Error(a), Symbol::Error(b)) => a.kind.to_string() == b.kind.to_string(),
            _ => false,
        }
    }
}

fn named_equivalent(a: &NamedType, b: &NamedType) -> bool {
    a.unit_name == b.unit_name
        && a.metadata_name == b.metadata_name
        && a.namespace == b.namespace
        && a.arity() == b.arity()
        && match (&a.containing, &b.containing) {
            (Some(x), Some(y)) => named_equivalent(x, y),
            (None, None) => true,
            _ => false,
        }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Symbol::Named(a), Symbol::Named(b)) => a.id == b.id,
            (Symbol::Constructed(a), Symbol::Constructed(b)) => a.id == b.id,
            (Symbol::Array(a), Symbol::Array(b)) => a == b,
            (Symbol::Pointer(a), Symbol::Pointer(b)) => a == b,
            (Symbol::TypeParameter(a), Symbol::TypeParameter(b)) => a == b,
            (Symbol::Primitive(a), Symbol::Primitive(b)) => a == b,
            (Symbol::Error(a), Symbol::Error(b)) => Arc::ptr_eq(a, b) || a.kind == b.kind,
            _ => false,
        }
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Symbol::Named(named) => named.id.hash(state),
            Symbol::Constructed(constructed) => constructed.id.hash(state),
            Symbol::Array(array) => array.hash(state),
            Symbol::Pointer(pointer) => pointer.hash(state),
            Symbol::TypeParameter(parameter) => parameter.hash(state),
            Symbol::Primitive(kind) => kind.hash(state),
            Symbol::Error(_) => {}
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Named(named) => write!(f, "{}", named),
            Symbol::Constructed(constructed) => {
                write!(f, "{}<", constructed.definition.display_name_without_arity())?;
                for (i, arg) in constructed.args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(">")
            }
            Symbol::Array(array) => {
                write!(f, "{}[", array.element)?;
                for _ in 1..array.rank {
                    f.write_str(",")?;
                }
                f.write_str("]")
            }
            Symbol::Pointer(pointer) => write!(f, "{}*", pointer.pointed_at),
            Symbol::TypeParameter(parameter) => f.write_str(&parameter.name),
            Symbol::Primitive(kind) => write!(f, "{}", kind),
            Symbol::Error(error) => write!(f, "<error: {}>", error.kind),
        }
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self)
    }
}

/// A single custom modifier attached to a type position
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Modifier {
    /// `true` for `modopt`, `false` for `modreq`
    pub is_optional: bool,
    /// The modifier type
    pub modifier_type: Symbol,
}

/// A type together with the ordered custom modifiers of its position.
///
/// The derived equality is the signature equivalence used throughout the engine: underlying
/// types equal and modifier lists equal in count, order, optionality and modifier type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeWithModifiers {
    /// The type
    pub symbol: Symbol,
    /// Modifiers in metadata order, duplicates preserved
    pub modifiers: Vec<Modifier>,
}

impl TypeWithModifiers {
    /// Pairs `symbol` with `modifiers`
    #[must_use]
    pub fn new(symbol: Symbol, modifiers: Vec<Modifier>) -> Self {
        TypeWithModifiers { symbol, modifiers }
    }

    /// Same type and the same modifiers in the same order. Equivalent to `==`.
    #[must_use]
    pub fn signature_equivalent(&self, other: &TypeWithModifiers) -> bool {
        self == other
    }

    /// Compares against a type from another resolution context
    #[must_use]
    pub fn is_structurally_equivalent(&self, other: &TypeWithModifiers) -> bool {
        self.symbol.is_structurally_equivalent(&other.symbol)
            && self.modifiers.len() == other.modifiers.len()
            && self
                .modifiers
                .iter()
                .zip(&other.modifiers)
                .all(|(a, b)| {
                    a.is_optional == b.is_optional
                        && a.modifier_type.is_structurally_equivalent(&b.modifier_type)
                })
    }
}

impl fmt::Display for TypeWithModifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol)?;
        for modifier in &self.modifiers {
            let keyword = if modifier.is_optional { "modopt" } else { "modreq" };
            write!(f, " {}({})", keyword, modifier.modifier_type)?;
        }
        Ok(())
    }
}

/// A generic definition applied to its flattened argument list
pub struct ConstructedType {
    /// Identity
    pub id: SymbolId,
    /// The generic definition
    pub definition: NamedTypeRc,
    /// Arguments for every slot of the definition's generic context, outermost first
    pub args: Vec<TypeWithModifiers>,
}

/// An array type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArrayType {
    /// Element type
    pub element: TypeWithModifiers,
    /// Number of dimensions
    pub rank: u32,
    /// `true` for single-dimensional zero-based arrays (`T[]`)
    pub is_sz: bool,
    /// Declared sizes of leading dimensions
    pub sizes: Vec<u32>,
    /// Declared lower bounds of leading dimensions
    pub lower_bounds: Vec<i32>,
}

impl ArrayType {
    /// A `T[]` array
    #[must_use]
    pub fn sz(element: TypeWithModifiers) -> Self {
        ArrayType {
            element,
            rank: 1,
            is_sz: true,
            sizes: Vec::new(),
            lower_bounds: Vec::new(),
        }
    }
}

/// An unmanaged pointer type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PointerType {
    /// Pointed-at type
    pub pointed_at: TypeWithModifiers,
}

/// Whether a type parameter belongs to a type or to a method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeParameterKind {
    /// Declared by a type, indexed in the flattened generic context
    Type,
    /// Declared by a method
    Method,
}

/// A reference to a type parameter slot
#[derive(Debug, Clone)]
pub struct TypeParameterRef {
    /// Type or method parameter
    pub kind: TypeParameterKind,
    /// The declaring type or method
    pub owner: SymbolId,
    /// Position in the flattened generic context (types) or in the method's own list
    pub position: u32,
    /// Declared name
    pub name: String,
}

impl PartialEq for TypeParameterRef {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.owner == other.owner && self.position == other.position
    }
}

impl Eq for TypeParameterRef {}

impl Hash for TypeParameterRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.owner.hash(state);
        self.position.hash(state);
    }
}

/// A metadata problem materialized as a type
#[derive(Debug, Clone)]
pub struct ErrorType {
    /// What went wrong
    pub kind: ErrorKind,
}

/// The kinds of [`ErrorType`]
#[derive(Error, Debug, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A shape the importer does not support, or a blob that could not be decoded
    #[error("unsupported metadata: {0}")]
    UnsupportedMetadata(String),

    /// No canonical definition exists for an embedded interop type
    #[error("no canonical definition for embedded type '{full_name}'")]
    MissingCanonical {
        /// Scope argument of the type identifier, if present
        scope: Option<String>,
        /// Identifier argument of the type identifier, if present
        identifier: Option<String>,
        /// Full name of the embedded stub
        full_name: String,
    },

    /// More than one referenced unit defines a matching canonical type
    #[error(
        "embedded type resolves to both '{first}' in '{}' and '{second}' in '{}'",
        defining_unit(.first),
        defining_unit(.second)
    )]
    AmbiguousCanonical {
        /// First candidate in supply order
        first: Symbol,
        /// Second candidate in supply order
        second: Symbol,
    },

    /// A generic instantiation that cannot be formed
    #[error("illegal generic instantiation over '{cause}'")]
    IllegalGenericInstantiation {
        /// The offending argument
        cause: Symbol,
    },

    /// A chain of type forwarders that loops
    #[error("cyclic forwarder for '{name}' in '{unit}'")]
    CyclicForward {
        /// Unit whose forwarder closes the cycle
        unit: String,
        /// Forwarded type name
        name: String,
    },

    /// A chain of type forwarders longer than the configured hop limit
    #[error("forwarding hop limit of {hops} reached for '{name}' in '{unit}'")]
    ForwardingLimit {
        /// Unit whose forwarder would exceed the limit
        unit: String,
        /// Forwarded type name
        name: String,
        /// The configured limit
        hops: usize,
    },

    /// A referenced type or unit that is not present
    #[error("'{name}' could not be found in '{unit}'")]
    Missing {
        /// Full name of the referenced type
        name: String,
        /// Unit the type was expected in
        unit: String,
    },
}

fn defining_unit(symbol: &Symbol) -> &str {
    symbol
        .as_named()
        .map_or("<unknown>", |named| named.unit_name.as_str())
}
