//! # symgraph Prelude
//!
//! This module provides a convenient prelude for the most commonly used types from the
//! symgraph library. Import this module to get quick access to the essential types for
//! materializing symbols from .NET metadata.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all symgraph operations
pub use crate::Error;

/// The result type used throughout symgraph
pub use crate::Result;

/// Low-level blob parsing
pub use crate::Parser;

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// The resolution context and its builder
pub use crate::metadata::context::{ResolutionContext, ResolutionContextBuilder};

/// Import configuration
pub use crate::metadata::config::{ImportOptions, ImportScope};

/// Compiled units
pub use crate::metadata::unit::CompiledUnit;

// ================================================================================================
// Metadata Rows
// ================================================================================================

/// Metadata token type for referencing table entries
pub use crate::metadata::token::{TableId, Token};

/// Row flags
pub use crate::metadata::flags::{
    Accessibility, FieldAttributes, MethodAttributes, ParamAttributes, TypeAttributes,
};

/// Row-level access and the in-memory unit builder
pub use crate::metadata::reader::{
    InMemoryMetadata, MetadataBuilder, MetadataReader, ResolutionScope,
};

/// Signature blobs
pub use crate::metadata::signatures::{
    CustomModifier, SignatureElement, SignatureField, SignatureMethod, SignatureParameter,
    SignatureProperty, TypeSignature,
};

// ================================================================================================
// Symbol Graph
// ================================================================================================

/// Types
pub use crate::metadata::typesystem::{
    ErrorKind, GenericContext, Modifier, NamedType, NamedTypeRc, PrimitiveKind, Symbol, SymbolId,
    TypeMap, TypeWithModifiers,
};

/// Members
pub use crate::metadata::members::{
    Event, Field, Member, Method, MethodKind, Parameter, Property, RefKind, TypeMembers,
    UseSiteDiagnostic, Virtualness,
};

/// Custom attributes
pub use crate::metadata::customattributes::{
    AttributeApplication, ConstantValue, NamedArgument, NamedArgumentKind, TypedConstant,
};

/// Embedded interop types
pub use crate::metadata::canonical::CanonicalKey;
