//! Metadata tokens addressing rows of the metadata tables.
//!
//! A token is a 32-bit value where the high byte selects the table and the low 24 bits select
//! the (1-based) row. The engine never interprets a token beyond its table byte; row content is
//! always fetched through [`crate::metadata::reader::MetadataReader`].

use std::fmt;
use std::hash::{Hash, Hasher};

/// Table identifiers occupying the high byte of a [`Token`].
#[allow(non_snake_case)]
pub mod TableId {
    /// Module table (resolution scope of the unit itself)
    pub const MODULE: u8 = 0x00;
    /// TypeRef table
    pub const TYPE_REF: u8 = 0x01;
    /// TypeDef table
    pub const TYPE_DEF: u8 = 0x02;
    /// Field table
    pub const FIELD: u8 = 0x04;
    /// MethodDef table
    pub const METHOD_DEF: u8 = 0x06;
    /// Param table
    pub const PARAM: u8 = 0x08;
    /// MemberRef table
    pub const MEMBER_REF: u8 = 0x0A;
    /// CustomAttribute table
    pub const CUSTOM_ATTRIBUTE: u8 = 0x0C;
    /// Event table
    pub const EVENT: u8 = 0x14;
    /// Property table
    pub const PROPERTY: u8 = 0x17;
    /// MethodImpl table
    pub const METHOD_IMPL: u8 = 0x19;
    /// TypeSpec table
    pub const TYPE_SPEC: u8 = 0x1B;
    /// Assembly table
    pub const ASSEMBLY: u8 = 0x20;
    /// AssemblyRef table
    pub const ASSEMBLY_REF: u8 = 0x23;
    /// ExportedType table
    pub const EXPORTED_TYPE: u8 = 0x27;
    /// GenericParam table
    pub const GENERIC_PARAM: u8 = 0x2A;
}

/// A metadata token representing a reference to a metadata table entry.
///
/// Tokens in .NET metadata consist of a 32-bit value where:
/// - The high byte (bits 24-31) indicates the table type
/// - The low 24 bits (bits 0-23) indicate the row index within that table
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Token(pub u32);

impl Token {
    /// Token addressing the assembly row of a unit, used as attribute target for unit-level
    /// attributes such as the interop `GuidAttribute`.
    pub const ASSEMBLY: Token = Token(0x2000_0001);

    /// Creates a new token from a raw 32-bit value
    #[must_use]
    pub fn new(value: u32) -> Self {
        Token(value)
    }

    /// Creates a token from a table identifier and a 1-based row
    #[must_use]
    pub fn from_parts(table: u8, row: u32) -> Self {
        Token((u32::from(table) << 24) | (row & 0x00FF_FFFF))
    }

    /// Returns the raw token value
    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }

    /// Extracts the table type from the token (high byte)
    #[must_use]
    pub fn table(&self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// Extracts the row index from the token (low 24 bits)
    #[must_use]
    pub fn row(&self) -> u32 {
        self.0 & 0x00FF_FFFF
    }

    /// Returns true if this is a null token (value 0)
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0 == 0
    }

    /// Returns true if the token addresses a row of `table`
    #[must_use]
    pub fn is_table(&self, table: u8) -> bool {
        self.table() == table && self.row() != 0
    }
}

impl From<u32> for Token {
    fn from(value: u32) -> Self {
        Token(value)
    }
}

impl From<Token> for u32 {
    fn from(token: Token) -> Self {
        token.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Token(0x{:08x}, table: 0x{:02x}, row: {})",
            self.0,
            self.table(),
            self.row()
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_token_parts() {
        let token = Token::new(0x06000001);
        assert_eq!(token.table(), TableId::METHOD_DEF);
        assert_eq!(token.row(), 1);

        let token = Token(0x06FFFFFF);
        assert_eq!(token.row(), 0x00FFFFFF);
    }

    #[test]
    fn test_token_from_parts() {
        let token = Token::from_parts(TableId::TYPE_DEF, 5);
        assert_eq!(token.value(), 0x02000005);
        assert!(token.is_table(TableId::TYPE_DEF));
        assert!(!token.is_table(TableId::TYPE_REF));

        // Row bits never leak into the table byte
        let token = Token::from_parts(TableId::FIELD, 0x0100_0002);
        assert_eq!(token.table(), TableId::FIELD);
        assert_eq!(token.row(), 2);
    }

    #[test]
    fn test_token_null() {
        assert!(Token(0).is_null());
        assert!(!Token::from_parts(TableId::TYPE_DEF, 0).is_table(TableId::TYPE_DEF));
        assert!(!Token(0x06000001).is_null());
    }

    #[test]
    fn test_token_from_conversion() {
        let value = 0x06000001u32;
        let token: Token = value.into();
        assert_eq!(token.value(), value);

        let back_to_u32: u32 = token.into();
        assert_eq!(back_to_u32, value);
    }

    #[test]
    fn test_token_formatting() {
        let token = Token(0x02000010);
        assert_eq!(format!("{}", token), "0x02000010");
        assert_eq!(
            format!("{:?}", token),
            "Token(0x02000010, table: 0x02, row: 16)"
        );
    }

    #[test]
    fn test_token_hash() {
        let mut map = HashMap::new();
        map.insert(Token(0x06000001), "method");
        map.insert(Token(0x02000001), "type");

        assert_eq!(map.get(&Token(0x06000001)), Some(&"method"));
        assert_eq!(map.get(&Token(0x02000001)), Some(&"type"));
        assert_eq!(map.get(&Token(0x04000001)), None);
    }
}
