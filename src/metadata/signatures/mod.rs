//! Method, field, property and type specification signatures (ECMA-335 II.23.2).
//!
//! Signatures are the compact binary encoding of everything type-shaped in metadata: parameter
//! and return types, field types, property types and generic instantiations. The symbol engine
//! decodes them in two stages. This module covers the first stage, blob to
//! [`TypeSignature`] trees that still speak in tokens. The second stage,
//! [`crate::metadata::decoder`], turns tokens into symbols.
//!
//! # Custom modifiers
//!
//! `modopt` / `modreq` entries are preserved with their kind and order. For parameters and
//! returns, modifiers in front of the `BYREF` marker are kept apart from the ones after it
//! ([`SignatureParameter::ref_modifiers`] vs [`SignatureParameter::modifiers`]).
//!
//! # Examples
//!
//! ```rust
//! use symgraph::metadata::signatures::{parse_method_signature, TypeSignature};
//!
//! // instance void M(int32)
//! let method = parse_method_signature(&[0x20, 0x01, 0x01, 0x08])?;
//! assert_eq!(method.params[0].base, TypeSignature::I4);
//! # Ok::<(), symgraph::Error>(())
//! ```

mod encoder;
mod parser;
mod types;

pub use encoder::*;
pub use parser::*;
pub use types::*;

use crate::Result;

/// Parse a `MethodSignature` from a byte slice
///
/// # Errors
/// Returns an error if the signature data is malformed or parsing fails
pub fn parse_method_signature(data: &[u8]) -> Result<SignatureMethod> {
    let mut parser = SignatureParser::new(data);
    parser.parse_method_signature()
}
