use std::fmt;

use strum::{EnumIter, IntoEnumIterator};

use crate::metadata::signatures::{TypeSignature, ELEMENT_TYPE};

/// Built-in types that signatures encode with a dedicated element type.
///
/// When the resolution context has a core unit defining `System.Int32` and friends, decoded
/// signatures refer to those definitions. Otherwise the decoder falls back to
/// [`crate::metadata::typesystem::Symbol::Primitive`] with one of these kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter)]
pub enum PrimitiveKind {
    /// System.Void - represents no value
    Void,
    /// System.Boolean - true/false value
    Boolean,
    /// System.Char - Unicode 16-bit character
    Char,
    /// System.SByte - signed 8-bit integer
    I1,
    /// System.Byte - unsigned 8-bit integer
    U1,
    /// System.Int16 - signed 16-bit integer
    I2,
    /// System.UInt16 - unsigned 16-bit integer
    U2,
    /// System.Int32 - signed 32-bit integer
    I4,
    /// System.UInt32 - unsigned 32-bit integer
    U4,
    /// System.Int64 - signed 64-bit integer
    I8,
    /// System.UInt64 - unsigned 64-bit integer
    U8,
    /// System.Single - 32-bit floating point
    R4,
    /// System.Double - 64-bit floating point
    R8,
    /// System.IntPtr - native sized signed integer
    I,
    /// System.UIntPtr - native sized unsigned integer
    U,
    /// System.Object - base class for all reference types
    Object,
    /// System.String - immutable string of Unicode characters
    String,
    /// System.TypedReference - type-safe pointer (used by compiler)
    TypedReference,
}

impl PrimitiveKind {
    /// Get the namespace of this type
    #[must_use]
    pub fn namespace(self) -> &'static str {
        "System"
    }

    /// Get the short name (without namespace)
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Void => "Void",
            PrimitiveKind::Boolean => "Boolean",
            PrimitiveKind::Char => "Char",
            PrimitiveKind::I1 => "SByte",
            PrimitiveKind::U1 => "Byte",
            PrimitiveKind::I2 => "Int16",
            PrimitiveKind::U2 => "UInt16",
            PrimitiveKind::I4 => "Int32",
            PrimitiveKind::U4 => "UInt32",
            PrimitiveKind::I8 => "Int64",
            PrimitiveKind::U8 => "UInt64",
            PrimitiveKind::R4 => "Single",
            PrimitiveKind::R8 => "Double",
            PrimitiveKind::I => "IntPtr",
            PrimitiveKind::U => "UIntPtr",
            PrimitiveKind::Object => "Object",
            PrimitiveKind::String => "String",
            PrimitiveKind::TypedReference => "TypedReference",
        }
    }

    /// `System.Name`
    #[must_use]
    pub fn full_name(self) -> String {
        format!("{}.{}", self.namespace(), self.name())
    }

    /// Looks up a primitive by its namespace-qualified name
    #[must_use]
    pub fn from_full_name(full_name: &str) -> Option<Self> {
        let name = full_name.strip_prefix("System.")?;
        PrimitiveKind::iter().find(|kind| kind.name() == name)
    }

    /// Maps a primitive signature node to its kind
    #[must_use]
    pub fn from_signature(signature: &TypeSignature) -> Option<Self> {
        Some(match signature {
            TypeSignature::Void => PrimitiveKind::Void,
            TypeSignature::Boolean => PrimitiveKind::Boolean,
            TypeSignature::Char => PrimitiveKind::Char,
            TypeSignature::I1 => PrimitiveKind::I1,
            TypeSignature::U1 => PrimitiveKind::U1,
            TypeSignature::I2 => PrimitiveKind::I2,
            TypeSignature::U2 => PrimitiveKind::U2,
            TypeSignature::I4 => PrimitiveKind::I4,
            TypeSignature::U4 => PrimitiveKind::U4,
            TypeSignature::I8 => PrimitiveKind::I8,
            TypeSignature::U8 => PrimitiveKind::U8,
            TypeSignature::R4 => PrimitiveKind::R4,
            TypeSignature::R8 => PrimitiveKind::R8,
            TypeSignature::I => PrimitiveKind::I,
            TypeSignature::U => PrimitiveKind::U,
            TypeSignature::Object => PrimitiveKind::Object,
            TypeSignature::String => PrimitiveKind::String,
            TypeSignature::TypedByRef => PrimitiveKind::TypedReference,
            _ => return None,
        })
    }

    /// Maps a serialization type code of an attribute blob to its kind
    #[must_use]
    pub fn from_element_type(code: u8) -> Option<Self> {
        Some(match code {
            ELEMENT_TYPE::BOOLEAN => PrimitiveKind::Boolean,
            ELEMENT_TYPE::CHAR => PrimitiveKind::Char,
            ELEMENT_TYPE::I1 => PrimitiveKind::I1,
            ELEMENT_TYPE::U1 => PrimitiveKind::U1,
            ELEMENT_TYPE::I2 => PrimitiveKind::I2,
            ELEMENT_TYPE::U2 => PrimitiveKind::U2,
            ELEMENT_TYPE::I4 => PrimitiveKind::I4,
            ELEMENT_TYPE::U4 => PrimitiveKind::U4,
            ELEMENT_TYPE::I8 => PrimitiveKind::I8,
            ELEMENT_TYPE::U8 => PrimitiveKind::U8,
            ELEMENT_TYPE::R4 => PrimitiveKind::R4,
            ELEMENT_TYPE::R8 => PrimitiveKind::R8,
            ELEMENT_TYPE::STRING => PrimitiveKind::String,
            _ => return None,
        })
    }

    /// Whether the kind can be the underlying type of an enum
    #[must_use]
    pub fn is_integral(self) -> bool {
        matches!(
            self,
            PrimitiveKind::Boolean
                | PrimitiveKind::Char
                | PrimitiveKind::I1
                | PrimitiveKind::U1
                | PrimitiveKind::I2
                | PrimitiveKind::U2
                | PrimitiveKind::I4
                | PrimitiveKind::U4
                | PrimitiveKind::I8
                | PrimitiveKind::U8
                | PrimitiveKind::I
                | PrimitiveKind::U
        )
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keyword = match self {
            PrimitiveKind::Void => "void",
            PrimitiveKind::Boolean => "bool",
            PrimitiveKind::Char => "char",
            PrimitiveKind::I1 => "sbyte",
            PrimitiveKind::U1 => "byte",
            PrimitiveKind::I2 => "short",
            PrimitiveKind::U2 => "ushort",
            PrimitiveKind::I4 => "int",
            PrimitiveKind::U4 => "uint",
            PrimitiveKind::I8 => "long",
            PrimitiveKind::U8 => "ulong",
            PrimitiveKind::R4 => "float",
            PrimitiveKind::R8 => "double",
            PrimitiveKind::I => "nint",
            PrimitiveKind::U => "nuint",
            PrimitiveKind::Object => "object",
            PrimitiveKind::String => "string",
            PrimitiveKind::TypedReference => "System.TypedReference",
        };
        f.write_str(keyword)
    }
}
