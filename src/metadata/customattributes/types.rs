//! Attribute-specific types and data structures.
//!
//! Arguments are represented as [`TypedConstant`]s: every value carries the symbol of its
//! type, so an `int` passed to an `object` parameter is distinguishable from an `int` passed to
//! an `int` parameter only by the parameter, never by the constant.

use std::sync::Arc;

use crate::metadata::{members::MethodRc, token::Token, typesystem::Symbol};

/// The attributes applied to one target, in declaration order
pub type AttributeList = Arc<Vec<AttributeApplication>>;

/// A primitive value stored in an attribute blob
#[derive(Debug, Clone, PartialEq)]
pub enum ConstantValue {
    /// `bool`
    Boolean(bool),
    /// `char`, as the UTF-16 code unit stored in the blob
    Char(u16),
    /// `sbyte`
    I1(i8),
    /// `byte`
    U1(u8),
    /// `short`
    I2(i16),
    /// `ushort`
    U2(u16),
    /// `int`
    I4(i32),
    /// `uint`
    U4(u32),
    /// `long`
    I8(i64),
    /// `ulong`
    U8(u64),
    /// `float`
    R4(f32),
    /// `double`
    R8(f64),
    /// `string`, `None` for a null reference
    String(Option<String>),
}

/// A decoded attribute argument together with its type
#[derive(Debug, Clone, PartialEq)]
pub enum TypedConstant {
    /// A primitive or string value
    Primitive {
        /// Type of the value
        ty: Symbol,
        /// The value
        value: ConstantValue,
    },
    /// An enum value stored as its underlying primitive
    Enum {
        /// The enum type
        ty: Symbol,
        /// Value of the underlying type
        value: ConstantValue,
    },
    /// A `System.Type` argument
    Type {
        /// `System.Type`
        ty: Symbol,
        /// The referenced type, `None` for a null reference
        value: Option<Symbol>,
    },
    /// A single-dimensional array
    Array {
        /// The array type
        ty: Symbol,
        /// Elements, `None` for a null array
        values: Option<Vec<TypedConstant>>,
    },
}

impl TypedConstant {
    /// The type of the constant
    #[must_use]
    pub fn ty(&self) -> &Symbol {
        match self {
            TypedConstant::Primitive { ty, .. }
            | TypedConstant::Enum { ty, .. }
            | TypedConstant::Type { ty, .. }
            | TypedConstant::Array { ty, .. } => ty,
        }
    }

    /// Returns `true` for null strings, null types and null arrays
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(
            self,
            TypedConstant::Primitive {
                value: ConstantValue::String(None),
                ..
            } | TypedConstant::Type { value: None, .. }
                | TypedConstant::Array { values: None, .. }
        )
    }
}

/// Whether a named argument sets a field or a property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedArgumentKind {
    /// `0x53`
    Field,
    /// `0x54`
    Property,
}

/// A field or property assignment of an attribute application
#[derive(Debug, Clone, PartialEq)]
pub struct NamedArgument {
    /// Field or property name
    pub name: String,
    /// Field or property
    pub kind: NamedArgumentKind,
    /// Assigned value
    pub value: TypedConstant,
}

/// One custom attribute applied to a target
#[derive(Debug, Clone)]
pub struct AttributeApplication {
    /// Token of the attributed row
    pub target: Token,
    /// The attribute class, constructed for generic attributes
    pub attribute_type: Symbol,
    /// The bound constructor, when it is imported and matches the blob's signature
    pub constructor: Option<MethodRc>,
    /// Constructor arguments in order
    pub positional: Vec<TypedConstant>,
    /// Named arguments in blob order
    pub named: Vec<NamedArgument>,
    /// The constructor could not be bound or the blob could not be decoded
    pub has_errors: bool,
}

impl AttributeApplication {
    /// Returns `true` if the attribute class is `full_name`
    #[must_use]
    pub fn is(&self, full_name: &str) -> bool {
        self.attribute_type.full_name().as_deref() == Some(full_name)
    }

    /// The named argument called `name`
    #[must_use]
    pub fn named_argument(&self, name: &str) -> Option<&NamedArgument> {
        self.named.iter().find(|argument| argument.name == name)
    }
}

/// .NET `CorSerializationType` constants as defined in corhdr.h
#[allow(non_snake_case, missing_docs)]
pub mod SERIALIZATION_TYPE {
    pub const BOOLEAN: u8 = 0x02;
    pub const CHAR: u8 = 0x03;
    pub const I1: u8 = 0x04;
    pub const U1: u8 = 0x05;
    pub const I2: u8 = 0x06;
    pub const U2: u8 = 0x07;
    pub const I4: u8 = 0x08;
    pub const U4: u8 = 0x09;
    pub const I8: u8 = 0x0A;
    pub const U8: u8 = 0x0B;
    pub const R4: u8 = 0x0C;
    pub const R8: u8 = 0x0D;
    pub const STRING: u8 = 0x0E;
    pub const SZARRAY: u8 = 0x1D;
    pub const TYPE: u8 = 0x50;
    pub const TAGGED_OBJECT: u8 = 0x51;
    pub const FIELD: u8 = 0x53;
    pub const PROPERTY: u8 = 0x54;
    pub const ENUM: u8 = 0x55;
}
