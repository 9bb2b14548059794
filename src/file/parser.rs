//! Low-level byte stream parser for signature and custom-attribute blobs.
//!
//! This module provides the [`crate::file::parser::Parser`] type, a cursor-based binary data
//! parser for the blob encodings defined by ECMA-335 II.23.2 (signatures) and II.23.3 (custom
//! attributes). Every read is bounds-checked; truncated or corrupted blobs surface as
//! [`crate::Error::OutOfBounds`] or [`crate::Error::Malformed`], never as a panic.
//!
//! # Key Components
//!
//! ## Navigation Methods
//! - [`crate::file::parser::Parser::pos`] - Get current position
//! - [`crate::file::parser::Parser::advance`] - Move forward by one byte
//! - [`crate::file::parser::Parser::remaining`] - Bytes left after the cursor
//!
//! ## Data Access Methods
//! - [`crate::file::parser::Parser::read_le`] - Read primitive types (little-endian)
//! - [`crate::file::parser::Parser::peek_byte`] - Peek at current byte without advancing
//! - [`crate::file::parser::Parser::read_bytes`] - Borrow a raw chunk
//!
//! ## Metadata Reading Methods
//! - [`crate::file::parser::Parser::read_compressed_uint`] - Read compressed unsigned integers
//! - [`crate::file::parser::Parser::read_compressed_int`] - Read compressed signed integers
//! - [`crate::file::parser::Parser::read_compressed_token`] - Read TypeDefOrRefOrSpec tokens
//! - [`crate::file::parser::Parser::read_ser_string`] - Read nullable `SerString` values
//!
//! # Usage Examples
//!
//! ```rust
//! use symgraph::Parser;
//!
//! // A field signature: FIELD, I4
//! let blob = [0x06, 0x08];
//! let mut parser = Parser::new(&blob);
//! assert_eq!(parser.read_le::<u8>()?, 0x06);
//! assert_eq!(parser.peek_byte()?, 0x08);
//! # Ok::<(), symgraph::Error>(())
//! ```

use crate::{
    file::io::{read_le_at, CilIO},
    metadata::token::{TableId, Token},
    Result,
};

/// A cursor over a signature or custom-attribute blob.
///
/// `Parser` maintains an internal position and validates data availability for every read,
/// so malformed input produces errors instead of buffer overruns.
///
/// # Examples
///
/// ```rust
/// use symgraph::Parser;
///
/// let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
/// let mut parser = Parser::new(&data);
///
/// let first = parser.read_le::<u32>()?;
/// assert_eq!(first, 0x04030201);
/// assert_eq!(parser.remaining(), 4);
/// # Ok::<(), symgraph::Error>(())
/// ```
pub struct Parser<'a> {
    /// The binary data being parsed
    data: &'a [u8],
    /// Current position within the data buffer
    position: usize,
}

impl<'a> Parser<'a> {
    /// Create a new [`crate::file::parser::Parser`] from a byte slice.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Parser { data, position: 0 }
    }

    /// Returns the length of the underlying data buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the parser has no data.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns `true` if there is more data available to parse.
    #[must_use]
    pub fn has_more_data(&self) -> bool {
        self.position < self.data.len()
    }

    /// Returns the current position.
    #[must_use]
    pub fn pos(&self) -> usize {
        self.position
    }

    /// Returns the number of bytes remaining from the current position.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Move the position forward by one byte.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if advancing would exceed the data length.
    pub fn advance(&mut self) -> Result<()> {
        if self.position >= self.data.len() {
            return Err(out_of_bounds_error!());
        }
        self.position += 1;
        Ok(())
    }

    /// Peek at the current byte without advancing the position.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the parser is at the end of the data.
    pub fn peek_byte(&self) -> Result<u8> {
        if self.position >= self.data.len() {
            return Err(out_of_bounds_error!());
        }
        Ok(self.data[self.position])
    }

    /// Read a value of type `T` in little-endian format and advance past it.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if reading `T` would exceed the data length.
    pub fn read_le<T: CilIO>(&mut self) -> Result<T> {
        read_le_at::<T>(self.data, &mut self.position)
    }

    /// Reads a slice of bytes of the specified length from the current position.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if reading `length` bytes would exceed the data.
    pub fn read_bytes(&mut self, length: usize) -> Result<&'a [u8]> {
        let end = self
            .position
            .checked_add(length)
            .ok_or_else(|| out_of_bounds_error!())?;
        if end > self.data.len() {
            return Err(out_of_bounds_error!());
        }

        let bytes = &self.data[self.position..end];
        self.position = end;
        Ok(bytes)
    }

    /// Read a compressed unsigned integer as defined in ECMA-335 II.23.2.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if reading would exceed the data length or
    /// [`crate::Error::Malformed`] for an invalid lead byte.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use symgraph::Parser;
    ///
    /// let mut parser = Parser::new(&[0x7F, 0x80, 0x80]);
    /// assert_eq!(parser.read_compressed_uint()?, 127);
    /// assert_eq!(parser.read_compressed_uint()?, 128);
    /// # Ok::<(), symgraph::Error>(())
    /// ```
    pub fn read_compressed_uint(&mut self) -> Result<u32> {
        let first_byte = self.read_le::<u8>()?;

        // 1-byte encoding: 0xxxxxxx
        if (first_byte & 0x80) == 0 {
            return Ok(u32::from(first_byte));
        }

        // 2-byte encoding: 10xxxxxx xxxxxxxx
        if (first_byte & 0xC0) == 0x80 {
            let second_byte = self.read_le::<u8>()?;
            return Ok(((u32::from(first_byte) & 0x3F) << 8) | u32::from(second_byte));
        }

        // 4-byte encoding: 110xxxxx xxxxxxxx xxxxxxxx xxxxxxxx
        if (first_byte & 0xE0) == 0xC0 {
            let b1 = u32::from(self.read_le::<u8>()?);
            let b2 = u32::from(self.read_le::<u8>()?);
            let b3 = u32::from(self.read_le::<u8>()?);
            return Ok(((u32::from(first_byte) & 0x1F) << 24) | (b1 << 16) | (b2 << 8) | b3);
        }

        Err(malformed_error!("Invalid compressed uint - {}", first_byte))
    }

    /// Read a compressed signed integer as defined in ECMA-335 II.23.2.
    ///
    /// The value is rotated left by one with the sign in the least significant bit, so the
    /// width of the encoding decides how the magnitude is sign-extended.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if reading would exceed the data length or
    /// [`crate::Error::Malformed`] for invalid encoding.
    pub fn read_compressed_int(&mut self) -> Result<i32> {
        let first_byte = self.peek_byte()?;
        let value_bits = if (first_byte & 0x80) == 0 {
            6
        } else if (first_byte & 0xC0) == 0x80 {
            13
        } else {
            28
        };

        let unsigned = self.read_compressed_uint()?;

        #[allow(clippy::cast_possible_wrap)]
        let magnitude = (unsigned >> 1) as i32;
        if (unsigned & 1) == 0 {
            Ok(magnitude)
        } else {
            Ok(magnitude - (1 << value_bits))
        }
    }

    /// Read a compressed `TypeDefOrRefOrSpecEncoded` token (ECMA-335 II.23.2.8).
    ///
    /// | Tag | Table |
    /// |-----|-------|
    /// | 0x0 | TypeDef |
    /// | 0x1 | TypeRef |
    /// | 0x2 | TypeSpec |
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for the reserved tag `0x3`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use symgraph::Parser;
    ///
    /// // TypeRef row 1 encoded as (1 << 2) | 0x1
    /// let mut parser = Parser::new(&[0x05]);
    /// assert_eq!(parser.read_compressed_token()?.value(), 0x01000001);
    /// # Ok::<(), symgraph::Error>(())
    /// ```
    pub fn read_compressed_token(&mut self) -> Result<Token> {
        let compressed_token = self.read_compressed_uint()?;

        let table = match compressed_token & 0x3 {
            0x0 => TableId::TYPE_DEF,
            0x1 => TableId::TYPE_REF,
            0x2 => TableId::TYPE_SPEC,
            _ => {
                return Err(malformed_error!(
                    "Invalid compressed token - {}",
                    compressed_token
                ))
            }
        };

        Ok(Token::from_parts(table, compressed_token >> 2))
    }

    /// Read a `SerString` as used by custom attribute blobs (ECMA-335 II.23.3).
    ///
    /// The length is a compressed integer; the single byte `0xFF` encodes a null string,
    /// which is returned as `None` and is distinct from the empty string.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] on truncation or [`crate::Error::Malformed`] for
    /// invalid UTF-8.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use symgraph::Parser;
    ///
    /// let mut parser = Parser::new(&[0xFF, 0x00, 0x02, b'h', b'i']);
    /// assert_eq!(parser.read_ser_string()?, None);
    /// assert_eq!(parser.read_ser_string()?, Some(String::new()));
    /// assert_eq!(parser.read_ser_string()?.as_deref(), Some("hi"));
    /// # Ok::<(), symgraph::Error>(())
    /// ```
    pub fn read_ser_string(&mut self) -> Result<Option<String>> {
        if self.peek_byte()? == 0xFF {
            self.position += 1;
            return Ok(None);
        }

        let length = self.read_compressed_uint()? as usize;
        let start = self.position;
        let bytes = self.read_bytes(length)?;

        match std::str::from_utf8(bytes) {
            Ok(value) => Ok(Some(value.to_string())),
            Err(e) => Err(malformed_error!(
                "Invalid UTF-8 string at offset {}-{}: {}",
                start,
                self.position,
                e
            )),
        }
    }
}
