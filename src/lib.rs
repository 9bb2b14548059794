// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]

//! # symgraph
//!
//! Identity-stable symbol graphs materialized from .NET metadata.
//!
//! `symgraph` turns the rows of one or more compiled units (assemblies) into the symbols a
//! compiler front end works with: named and constructed types, type parameters, arrays and
//! pointers, methods with their custom modifiers, properties and events bound to their
//! accessors, and decoded custom attribute arguments. Symbols are materialized lazily and
//! cached, so asking twice for the same thing yields the same instance, also when many threads
//! ask at once.
//!
//! ## Features
//!
//! - **🔗 Stable identity** - One instance per definition, per constructed shape and per member list
//! - **🧬 Generic substitution** - Members of constructed types carry substituted signatures
//! - **🏷️ Custom modifiers** - `modreq`/`modopt` are preserved and interpreted (`in`, `init`, `volatile`)
//! - **📦 Attribute constants** - Typed constructor and named arguments, including enums, types and arrays
//! - **➡️ Type forwarding** - Forwarder chains with cycle detection
//! - **🧩 Embedded interop types** - Local stubs unified with their canonical definitions
//! - **⚠️ Error types as values** - Unresolvable references become error symbols, never panics
//!
//! ## Quick Start
//!
//! ```rust
//! use symgraph::prelude::*;
//!
//! let mut core = MetadataBuilder::new("mscorlib");
//! let object = core.type_def("System", "Object", TypeAttributes::PUBLIC, None);
//! let list = core.type_def("System.Collections.Generic", "List`1", TypeAttributes::PUBLIC, Some(object));
//! core.generic_param(list, "T");
//!
//! let ctx = ResolutionContext::builder().unit(core.build()).build()?;
//! let definition = ctx.type_def("mscorlib", list)?;
//! let generic = definition.as_named().unwrap();
//! let int = ctx.primitive(PrimitiveKind::I4).plain();
//!
//! let first = ctx.construct(generic, vec![int.clone()]);
//! let second = ctx.construct(generic, vec![int]);
//! assert_eq!(first, second);
//! assert_eq!(first.to_string(), "System.Collections.Generic.List<int>");
//! # Ok::<(), symgraph::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`prelude`] - Convenient re-exports of commonly used types
//! - [`metadata`] - Units, the resolution context and the symbol graph
//! - [`file`] - Low-level byte parsing used by the blob decoders
//! - [`Error`] and [`Result`] - Error handling
//!
//! Problems inside metadata (an unknown type, a cyclic forwarder, an unsupported signature) are
//! not errors in the [`Result`] sense: they surface as [`metadata::typesystem::ErrorKind`] values
//! on the symbols, and as [`metadata::members::UseSiteDiagnostic`]s on members. [`Error`] is
//! reserved for misuse of the API and for blobs that cannot be decoded at all.

#[macro_use]
pub(crate) mod error;

/// Byte-level parsing primitives
pub mod file;

#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types.
///
/// # Usage Examples
///
/// ```rust
/// use symgraph::prelude::*;
///
/// let ctx = ResolutionContext::builder().build()?;
/// assert_eq!(ctx.units().count(), 0);
/// # Ok::<(), symgraph::Error>(())
/// ```
pub mod prelude;

/// Metadata materialization and the symbol graph.
///
/// The [`metadata::context::ResolutionContext`] is the main entry point: register units with
/// its builder and request symbols from it.
pub mod metadata;

/// `symgraph` Result type.
///
/// A type alias for `std::result::Result<T, Error>` where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `symgraph` Error type.
///
/// See [`error::Error`] for all variants.
pub use error::Error;

/// Cursor over a byte slice, used by every blob decoder.
pub use file::parser::Parser;
