//! Materialization of .NET metadata into an identity-stable symbol graph.
//!
//! A [`context::ResolutionContext`] owns a set of compiled units, each backed by a
//! [`reader::MetadataReader`]. Symbols are created lazily, on first request, and cached per unit
//! so that every later request observes the same instance.
//!
//! # Key Components
//!
//! - [`context`] - The resolution context, unit registration and type lookup
//! - [`unit`] - A compiled unit: row reader, name index and per-unit caches
//! - [`reader`] - The row-level interface symbols are materialized from
//! - [`signatures`] - Parsing and encoding of signature blobs
//! - [`typesystem`] - Types, type parameters and generic substitution
//! - [`members`] - Methods, fields, properties and events of materialized types
//! - [`customattributes`] - Attribute applications and their constant arguments
//! - [`canonical`] - Unification of embedded interop types
//! - [`cache`] - The claim/publish cache all symbol tables are built on
//!
//! # Examples
//!
//! ```rust
//! use symgraph::metadata::{
//!     context::ResolutionContext, flags::TypeAttributes, reader::MetadataBuilder,
//! };
//!
//! let mut lib = MetadataBuilder::new("Lib");
//! lib.type_def("Acme", "Widget", TypeAttributes::PUBLIC, None);
//! let mut app = MetadataBuilder::new("App");
//! app.forward("Acme", "Widget", "Lib");
//!
//! let ctx = ResolutionContext::builder()
//!     .unit(app.build())
//!     .unit(lib.build())
//!     .build()?;
//! let widget = ctx.resolve_forwarded("App", "Acme.Widget")?;
//! assert_eq!(widget.full_name().as_deref(), Some("Acme.Widget"));
//! # Ok::<(), symgraph::Error>(())
//! ```

/// Per-unit symbol caches
pub mod cache;
/// Unification of embedded interop types
pub mod canonical;
/// Options controlling what is imported
pub mod config;
/// The resolution context
pub mod context;
/// Custom attribute applications
pub mod customattributes;
/// Signature decoding into symbols
pub(crate) mod decoder;
/// Metadata row flags
pub mod flags;
/// Type forwarder resolution
mod forwarding;
/// Members of materialized types
pub mod members;
/// Row-level metadata access
pub mod reader;
/// Signature blobs
pub mod signatures;
/// Metadata tokens
pub mod token;
/// The symbol graph
pub mod typesystem;
/// Compiled units
pub mod unit;
