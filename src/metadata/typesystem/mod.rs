//! The symbol graph: types materialized from metadata rows.
//!
//! Every type that appears in a signature, a base-type slot or an attribute argument becomes a
//! [`Symbol`]. Definitions are [`NamedType`]s, generic instantiations are [`ConstructedType`]s
//! and everything that went wrong while resolving a type becomes an [`ErrorType`] carrying an
//! [`ErrorKind`]. Error symbols are values: they are cached, compared and substituted like any
//! other type, so a consumer can always walk the graph and enumerate its problems.
//!
//! # Key Components
//!
//! - [`Symbol`]: the closed union of type shapes
//! - [`NamedType`] and [`GenericContext`]: type definitions and their flattened type parameters
//! - [`TypeWithModifiers`]: a type together with the custom modifiers of its position
//! - [`TypeMap`]: substitution of type parameters through constructed types
//! - [`PrimitiveKind`]: built-in types for contexts without a core unit
//! - [`TypeName`]: serialized type names as stored in attribute blobs
//!
//! # Examples
//!
//! ```rust
//! use symgraph::metadata::typesystem::{PrimitiveKind, Symbol};
//!
//! let int = Symbol::Primitive(PrimitiveKind::I4);
//! assert_eq!(int.to_string(), "int");
//! assert_eq!(int.full_name().as_deref(), Some("System.Int32"));
//! ```

mod generics;
mod named;
mod primitives;
mod symbol;
mod typename;

pub use generics::TypeMap;
pub use named::{strip_arity_suffix, EmbeddedTypeInfo, GenericContext, NamedType, NamedTypeRc};
pub use primitives::PrimitiveKind;
pub use symbol::{
    ArrayType, ConstructedType, ConstructedTypeRc, ErrorKind, ErrorType, Modifier, PointerType,
    Symbol, SymbolId, TypeParameterKind, TypeParameterRef, TypeWithModifiers,
};
pub use typename::{TypeName, TypeNameSuffix};
