//! Byte-level access to metadata blobs.
//!
//! The engine never touches a PE image directly; the metadata reader hands it blob bytes for
//! signatures, type specifications and custom attributes. This module holds the cursor that
//! decodes those bytes.
//!
//! # Key Components
//!
//! - [`crate::file::parser::Parser`] - Bounds-checked cursor with ECMA-335 compressed encodings
//! - [`crate::file::io`] - Little-endian primitive decoding shared by the parser

pub mod io;
pub mod parser;

pub use parser::Parser;
