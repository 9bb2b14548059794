//! Members of materialized types.
//!
//! A type's member list is built once, on first request, from the declaring unit's member rows:
//! methods and fields first, then properties and events which associate themselves with the
//! already created accessor methods. The list preserves metadata declaration order and only
//! contains rows admitted by the context's [`crate::metadata::config::ImportScope`].
//!
//! A member whose signature could not be interpreted (an unknown required modifier, an error
//! type, an undecodable blob) is still part of the list. It carries a [`UseSiteDiagnostic`]
//! that consumers report when the member is used.
//!
//! # Examples
//!
//! ```rust
//! use symgraph::metadata::members::{classify_virtualness, Virtualness};
//!
//! // virtual + newslot + final without an explicit override
//! assert_eq!(
//!     classify_virtualness(true, true, false, true, false),
//!     Virtualness::SealedOverride
//! );
//! ```

mod accessors;
mod loader;
mod modifiers;
mod virtualness;

pub use virtualness::{classify_virtualness, Virtualness};

pub(crate) use modifiers::{IN_ATTRIBUTE, IS_EXTERNAL_INIT, IS_VOLATILE};

use std::sync::{Arc, OnceLock};

use thiserror::Error;

use crate::metadata::{
    flags::{FieldAttributes, MethodAttributes},
    token::Token,
    typesystem::{ErrorKind, Modifier, Symbol, TypeParameterRef, TypeWithModifiers},
};

/// Reference to a `Method`
pub type MethodRc = Arc<Method>;
/// Reference to a `Field`
pub type FieldRc = Arc<Field>;
/// Reference to a `Property`
pub type PropertyRc = Arc<Property>;
/// Reference to an `Event`
pub type EventRc = Arc<Event>;
/// Reference to a `TypeMembers` list
pub type TypeMembersRc = Arc<TypeMembers>;

/// Reports that a member cannot be used
#[derive(Error, Debug, Clone, PartialEq, Eq, Hash)]
#[error("'{member}' from '{unit}' is not supported: {error}")]
pub struct UseSiteDiagnostic {
    /// `Namespace.Type.Member`
    pub member: String,
    /// Declaring unit
    pub unit: String,
    /// What is wrong with the member
    pub error: ErrorKind,
}

/// How a by-ref position may be used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RefKind {
    /// Passed or returned by value
    #[default]
    None,
    /// `ref`
    Ref,
    /// `in` parameters and `ref readonly` returns
    In,
    /// `out`
    Out,
}

/// The role a method plays in its declaring type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MethodKind {
    /// Not claimed by a property or event
    #[default]
    Ordinary,
    /// Instance constructor
    Constructor,
    /// Type initializer
    StaticConstructor,
    /// Getter of a property that associated it
    PropertyGet,
    /// Setter of a property that associated it
    PropertySet,
    /// `add_` accessor of an event that associated it
    EventAdd,
    /// `remove_` accessor of an event that associated it
    EventRemove,
}

/// A method parameter or indexer parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// Declared name, or a synthesized one for unnamed indexer positions
    pub name: String,
    /// Zero-based position
    pub ordinal: u32,
    /// By-ref flavor
    pub ref_kind: RefKind,
    /// Modifiers that preceded the by-ref marker
    pub ref_modifiers: Vec<Modifier>,
    /// Parameter type and its modifiers
    pub ty: TypeWithModifiers,
}

impl Parameter {
    /// Returns `true` for `ref`, `in` and `out` parameters
    #[must_use]
    pub fn is_by_ref(&self) -> bool {
        self.ref_kind != RefKind::None
    }

    /// `ref_modifiers ++ ty.modifiers`
    #[must_use]
    pub fn all_modifiers(&self) -> Vec<Modifier> {
        self.ref_modifiers
            .iter()
            .chain(&self.ty.modifiers)
            .cloned()
            .collect()
    }
}

/// A method definition
pub struct Method {
    /// `MethodDef` token
    pub token: Token,
    /// Method name
    pub name: String,
    /// Declaring named or constructed type
    pub declaring_type: Symbol,
    /// Method attributes
    pub flags: MethodAttributes,
    /// The method's own type parameters
    pub type_parameters: Vec<TypeParameterRef>,
    /// By-ref flavor of the return
    pub return_ref_kind: RefKind,
    /// Modifiers that preceded the by-ref marker of the return
    pub return_ref_modifiers: Vec<Modifier>,
    /// Return type and its modifiers
    pub return_type: TypeWithModifiers,
    /// Parameters in signature order
    pub parameters: Vec<Parameter>,
    /// Membership state derived from the method flags
    pub virtualness: Virtualness,
    /// Declarations this method explicitly implements (`MethodDef` or `MemberRef` tokens)
    pub explicit_overrides: Vec<Token>,
    pub(crate) is_init_only: bool,
    pub(crate) kind: OnceLock<MethodKind>,
    pub(crate) use_site: OnceLock<UseSiteDiagnostic>,
}

impl Method {
    /// The method's role, `Ordinary` unless a constructor or claimed by a property or event
    #[must_use]
    pub fn kind(&self) -> MethodKind {
        self.kind.get().copied().unwrap_or_default()
    }

    /// Returns `true` for static methods
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.flags.contains(MethodAttributes::STATIC)
    }

    /// Returns `true` if the return type carries `modreq(IsExternalInit)`
    #[must_use]
    pub fn is_init_only(&self) -> bool {
        self.is_init_only
    }

    /// The reason the method cannot be used, if any
    #[must_use]
    pub fn use_site(&self) -> Option<&UseSiteDiagnostic> {
        self.use_site.get()
    }

    /// Associates the method with a property or event. The first claim wins.
    pub(crate) fn claim(&self, kind: MethodKind) -> bool {
        self.kind.set(kind).is_ok()
    }
}

impl std::fmt::Debug for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Method({}.{}, {})", self.declaring_type, self.name, self.token)
    }
}

/// A field definition
#[derive(Debug)]
pub struct Field {
    /// `Field` token
    pub token: Token,
    /// Field name
    pub name: String,
    /// Declaring named or constructed type
    pub declaring_type: Symbol,
    /// Field attributes
    pub flags: FieldAttributes,
    /// By-ref flavor of ref fields
    pub ref_kind: RefKind,
    /// Modifiers that preceded the by-ref marker
    pub ref_modifiers: Vec<Modifier>,
    /// Field type and its modifiers
    pub ty: TypeWithModifiers,
    /// `modreq(IsVolatile)` was present
    pub is_volatile: bool,
    /// The reason the field cannot be used, if any
    pub use_site: Option<UseSiteDiagnostic>,
}

impl Field {
    /// Returns `true` for static fields
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.flags.contains(FieldAttributes::STATIC)
    }
}

/// A property or indexer
#[derive(Debug)]
pub struct Property {
    /// `Property` token
    pub token: Token,
    /// Property name
    pub name: String,
    /// Declaring named or constructed type
    pub declaring_type: Symbol,
    /// The property signature has no `this`
    pub is_static: bool,
    /// By-ref flavor of the value
    pub ref_kind: RefKind,
    /// Modifiers that preceded the by-ref marker of the value
    pub ref_modifiers: Vec<Modifier>,
    /// Value type and its modifiers
    pub ty: TypeWithModifiers,
    /// Indexer parameters, as many as the property signature declares
    pub parameters: Vec<Parameter>,
    /// Getter, when imported
    pub getter: Option<MethodRc>,
    /// Setter, when imported
    pub setter: Option<MethodRc>,
    /// The accessors do not agree with the property and must be called as methods
    pub must_call_methods_directly: bool,
    /// Virtualness of the first present accessor
    pub virtualness: Virtualness,
    /// The reason the property cannot be used, if any
    pub use_site: Option<UseSiteDiagnostic>,
}

/// An event
#[derive(Debug)]
pub struct Event {
    /// `Event` token
    pub token: Token,
    /// Event name
    pub name: String,
    /// Declaring named or constructed type
    pub declaring_type: Symbol,
    /// Delegate type
    pub event_type: Symbol,
    /// `add_` accessor, when imported
    pub adder: Option<MethodRc>,
    /// `remove_` accessor, when imported
    pub remover: Option<MethodRc>,
    /// `raise_` accessor, when imported
    pub raiser: Option<MethodRc>,
    /// The accessors do not have the shape of event accessors
    pub must_call_methods_directly: bool,
    /// Virtualness of the first present accessor
    pub virtualness: Virtualness,
    /// The reason the event cannot be used, if any
    pub use_site: Option<UseSiteDiagnostic>,
}

/// A member of a type
#[derive(Debug, Clone)]
pub enum Member {
    /// A method
    Method(MethodRc),
    /// A field
    Field(FieldRc),
    /// A property or indexer
    Property(PropertyRc),
    /// An event
    Event(EventRc),
}

impl Member {
    /// Metadata token of the member row
    #[must_use]
    pub fn token(&self) -> Token {
        match self {
            Member::Method(method) => method.token,
            Member::Field(field) => field.token,
            Member::Property(property) => property.token,
            Member::Event(event) => event.token,
        }
    }

    /// Member name
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Member::Method(method) => &method.name,
            Member::Field(field) => &field.name,
            Member::Property(property) => &property.name,
            Member::Event(event) => &event.name,
        }
    }

    /// The reason the member cannot be used, if any
    #[must_use]
    pub fn use_site(&self) -> Option<&UseSiteDiagnostic> {
        match self {
            Member::Method(method) => method.use_site(),
            Member::Field(field) => field.use_site.as_ref(),
            Member::Property(property) => property.use_site.as_ref(),
            Member::Event(event) => event.use_site.as_ref(),
        }
    }
}

/// The imported members of one type in declaration order
#[derive(Debug, Default)]
pub struct TypeMembers {
    members: Vec<Member>,
}

impl TypeMembers {
    pub(crate) fn new(members: Vec<Member>) -> Self {
        TypeMembers { members }
    }

    /// All members
    pub fn iter(&self) -> impl Iterator<Item = &Member> {
        self.members.iter()
    }

    /// Number of members
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns `true` if no member was imported
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// The member with `token`
    #[must_use]
    pub fn get(&self, token: Token) -> Option<&Member> {
        self.members.iter().find(|member| member.token() == token)
    }

    /// Members called `name`
    pub fn named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Member> + 'a {
        self.members.iter().filter(move |member| member.name() == name)
    }

    /// All methods
    pub fn methods(&self) -> impl Iterator<Item = &MethodRc> {
        self.members.iter().filter_map(|member| match member {
            Member::Method(method) => Some(method),
            _ => None,
        })
    }

    /// All fields
    pub fn fields(&self) -> impl Iterator<Item = &FieldRc> {
        self.members.iter().filter_map(|member| match member {
            Member::Field(field) => Some(field),
            _ => None,
        })
    }

    /// All properties
    pub fn properties(&self) -> impl Iterator<Item = &PropertyRc> {
        self.members.iter().filter_map(|member| match member {
            Member::Property(property) => Some(property),
            _ => None,
        })
    }

    /// All events
    pub fn events(&self) -> impl Iterator<Item = &EventRc> {
        self.members.iter().filter_map(|member| match member {
            Member::Event(event) => Some(event),
            _ => None,
        })
    }

    /// The first method called `name`
    #[must_use]
    pub fn method(&self, name: &str) -> Option<&MethodRc> {
        self.methods().find(|method| method.name == name)
    }

    /// The first field called `name`
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldRc> {
        self.fields().find(|field| field.name == name)
    }

    /// The first property called `name`
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&PropertyRc> {
        self.properties().find(|property| property.name == name)
    }

    /// The first event called `name`
    #[must_use]
    pub fn event(&self, name: &str) -> Option<&EventRc> {
        self.events().find(|event| event.name == name)
    }

    /// Instance constructors in declaration order
    pub fn constructors(&self) -> impl Iterator<Item = &MethodRc> {
        self.methods()
            .filter(|method| method.kind() == MethodKind::Constructor)
    }
}
