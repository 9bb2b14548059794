//! Custom attribute decoding and binding.
//!
//! Every `CustomAttribute` row becomes an [`AttributeApplication`]: the attribute class, the
//! imported constructor the row refers to, and the decoded constructor and named arguments.
//! Attribute lists are materialized per target on first request and shared afterwards.
//!
//! # Attribute Format
//!
//! Custom attributes use a binary encoding with the following structure:
//! - **Prolog** - Standard 0x0001 marker indicating valid custom attribute blob
//! - **Fixed Arguments** - Constructor parameter values in declaration order
//! - **Named Arguments** - Field and property values with name/value pairs
//!
//! Values whose static type is `object` are tagged with their serialization type. Enum values
//! are stored as their underlying integer and `System.Type` values as serialized type names,
//! both of which are resolved against the resolution context.
//!
//! A blob that cannot be decoded does not fail the request: the application is kept with
//! [`AttributeApplication::has_errors`] set and no arguments.
//!
//! # Examples
//!
//! ```rust
//! use symgraph::metadata::customattributes::decode_string_arguments;
//!
//! // [Guid("0a1b")] style blob: prolog, one SerString, no named arguments
//! let blob = [0x01, 0x00, 0x04, b'0', b'a', b'1', b'b', 0x00, 0x00];
//! assert_eq!(
//!     decode_string_arguments(&blob, 1)?,
//!     vec![Some("0a1b".to_string())]
//! );
//! # Ok::<(), symgraph::Error>(())
//! ```
//!
//! # References
//!
//! - ECMA-335 6th Edition, Partition II, Section 23.3 - Custom Attributes

mod materializer;
mod parser;
mod types;

pub use parser::decode_string_arguments;
pub use types::*;
