//! The row-level boundary the symbol engine is driven through.
//!
//! A [`MetadataReader`] answers token-to-row queries for one compiled unit. It does not
//! interpret anything: signatures and attribute values are handed over as raw blobs, names
//! as raw metadata strings (including the `` `N`` arity suffix of generic types). Members are
//! exposed as the closed [`MemberRow`] union so that the importer can match exhaustively on
//! methods, fields, properties and events.
//!
//! [`InMemoryMetadata`] together with [`MetadataBuilder`] is a complete implementation that
//! stores rows in memory. Readers backed by memory-mapped PE files implement the same trait.
//!
//! # Examples
//!
//! ```rust
//! use symgraph::metadata::reader::{MetadataBuilder, MetadataReader};
//! use symgraph::metadata::flags::TypeAttributes;
//!
//! let mut builder = MetadataBuilder::new("Lib");
//! let widget = builder.type_def("Acme", "Widget", TypeAttributes::from_bits_retain(0x1), None);
//! let metadata = builder.build();
//!
//! assert_eq!(metadata.unit_name(), "Lib");
//! assert_eq!(metadata.type_def(widget).map(|row| row.name.as_str()), Some("Widget"));
//! ```

mod builder;

pub use builder::{InMemoryMetadata, MetadataBuilder};

use crate::metadata::{
    flags::{FieldAttributes, MethodAttributes, ParamAttributes, TypeAttributes},
    token::Token,
};

/// Where a type reference is resolved
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResolutionScope {
    /// The referencing unit itself
    Local,
    /// A referenced unit, by name
    Unit(String),
    /// Nested inside another type reference
    Nested(Token),
}

/// A `TypeDef` row
#[derive(Debug, Clone)]
pub struct TypeDefRow {
    /// `TypeDef` token
    pub token: Token,
    /// Type attributes
    pub flags: TypeAttributes,
    /// Namespace, empty for nested types
    pub namespace: String,
    /// Metadata name, possibly carrying the `` `N`` arity suffix
    pub name: String,
    /// Base type (`TypeDef`, `TypeRef` or `TypeSpec` token)
    pub extends: Option<Token>,
    /// Enclosing type for nested types
    pub enclosing: Option<Token>,
    /// Member tokens in declaration order
    pub members: Vec<Token>,
}

/// A `TypeRef` row
#[derive(Debug, Clone)]
pub struct TypeRefRow {
    /// `TypeRef` token
    pub token: Token,
    /// Where the referenced type lives
    pub scope: ResolutionScope,
    /// Namespace of the referenced type
    pub namespace: String,
    /// Metadata name of the referenced type
    pub name: String,
}

/// A `Param` row
#[derive(Debug, Clone)]
pub struct ParamRow {
    /// 0 for the return slot, 1-based for parameters
    pub sequence: u32,
    /// Parameter name
    pub name: String,
    /// Parameter attributes
    pub flags: ParamAttributes,
}

/// A `MethodDef` row
#[derive(Debug, Clone)]
pub struct MethodRow {
    /// `MethodDef` token
    pub token: Token,
    /// Method name
    pub name: String,
    /// Method attributes
    pub flags: MethodAttributes,
    /// `MethodDefSig` blob
    pub signature: Vec<u8>,
    /// Parameter rows, not necessarily one per signature position
    pub params: Vec<ParamRow>,
}

/// A `Field` row
#[derive(Debug, Clone)]
pub struct FieldRow {
    /// `Field` token
    pub token: Token,
    /// Field name
    pub name: String,
    /// Field attributes
    pub flags: FieldAttributes,
    /// `FieldSig` blob
    pub signature: Vec<u8>,
}

/// A `Property` row with its `MethodSemantics` accessors
#[derive(Debug, Clone)]
pub struct PropertyRow {
    /// `Property` token
    pub token: Token,
    /// Property name
    pub name: String,
    /// `PropertySig` blob
    pub signature: Vec<u8>,
    /// Getter method
    pub getter: Option<Token>,
    /// Setter method
    pub setter: Option<Token>,
}

/// An `Event` row with its `MethodSemantics` accessors
#[derive(Debug, Clone)]
pub struct EventRow {
    /// `Event` token
    pub token: Token,
    /// Event name
    pub name: String,
    /// Delegate type (`TypeDef`, `TypeRef` or `TypeSpec` token)
    pub event_type: Token,
    /// `add_` accessor
    pub adder: Option<Token>,
    /// `remove_` accessor
    pub remover: Option<Token>,
    /// `raise_` accessor
    pub raiser: Option<Token>,
}

/// A member row of a type definition
#[derive(Debug, Clone)]
pub enum MemberRow {
    /// A method definition
    Method(MethodRow),
    /// A field definition
    Field(FieldRow),
    /// A property definition
    Property(PropertyRow),
    /// An event definition
    Event(EventRow),
}

impl MemberRow {
    /// Token of the row
    #[must_use]
    pub fn token(&self) -> Token {
        match self {
            MemberRow::Method(row) => row.token,
            MemberRow::Field(row) => row.token,
            MemberRow::Property(row) => row.token,
            MemberRow::Event(row) => row.token,
        }
    }

    /// Name of the row
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            MemberRow::Method(row) => &row.name,
            MemberRow::Field(row) => &row.name,
            MemberRow::Property(row) => &row.name,
            MemberRow::Event(row) => &row.name,
        }
    }
}

/// A `GenericParam` row
#[derive(Debug, Clone)]
pub struct GenericParamRow {
    /// Position in the owner's parameter list
    pub number: u32,
    /// Parameter name
    pub name: String,
}

/// A `MemberRef` row
#[derive(Debug, Clone)]
pub struct MemberRefRow {
    /// `MemberRef` token
    pub token: Token,
    /// Declaring type (`TypeDef`, `TypeRef` or `TypeSpec` token)
    pub parent: Token,
    /// Member name
    pub name: String,
    /// Method or field signature blob
    pub signature: Vec<u8>,
}

/// A `CustomAttribute` row
#[derive(Debug, Clone)]
pub struct CustomAttributeRow {
    /// Attribute target
    pub parent: Token,
    /// Constructor (`MethodDef` or `MemberRef` token)
    pub constructor: Token,
    /// Value blob
    pub value: Vec<u8>,
}

/// An `ExportedType` row forwarding a type to another unit
#[derive(Debug, Clone)]
pub struct ExportedTypeRow {
    /// Namespace of the forwarded type
    pub namespace: String,
    /// Metadata name of the forwarded type
    pub name: String,
    /// Unit the type is forwarded to
    pub forwarded_to: String,
}

/// A `MethodImpl` row
#[derive(Debug, Clone)]
pub struct MethodImplRow {
    /// Type owning the implementation
    pub class: Token,
    /// Implementing method
    pub body: Token,
    /// Implemented method (`MethodDef` or `MemberRef` token)
    pub declaration: Token,
}

/// Token-to-row access for a single compiled unit.
///
/// All queries are cheap borrows; the engine caches everything it derives from them. Queries
/// for tokens that do not address a row return `None` or an empty slice.
pub trait MetadataReader: Send + Sync {
    /// Name of the unit, as other units reference it
    fn unit_name(&self) -> &str;

    /// Names of the referenced units, in `AssemblyRef` order
    fn assembly_refs(&self) -> &[String];

    /// All type definitions in table order
    fn type_defs(&self) -> &[TypeDefRow];

    /// A single type definition
    fn type_def(&self, token: Token) -> Option<&TypeDefRow>;

    /// A single type reference
    fn type_ref(&self, token: Token) -> Option<&TypeRefRow>;

    /// The signature blob of a type specification
    fn type_spec(&self, token: Token) -> Option<&[u8]>;

    /// A member definition
    fn member(&self, token: Token) -> Option<&MemberRow>;

    /// Generic parameters owned by a type or method definition, ordered by number
    fn generic_params(&self, owner: Token) -> &[GenericParamRow];

    /// A member reference
    fn member_ref(&self, token: Token) -> Option<&MemberRefRow>;

    /// Custom attributes applied to `parent` in declaration order
    fn custom_attributes(&self, parent: Token) -> &[CustomAttributeRow];

    /// Type forwarders of this unit
    fn exported_types(&self) -> &[ExportedTypeRow];

    /// Method implementations declared by `class`
    fn method_impls(&self, class: Token) -> &[MethodImplRow];
}
