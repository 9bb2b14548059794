use crate::metadata::token::Token;

#[allow(non_snake_case)]
#[allow(missing_docs)]
/// All the possible element types from ECMA-335 II.23.1.16
pub mod ELEMENT_TYPE {
    //Marks end of a list
    pub const END: u8 = 0x00;
    pub const VOID: u8 = 0x01;
    pub const BOOLEAN: u8 = 0x02;
    pub const CHAR: u8 = 0x03;
    pub const I1: u8 = 0x04;
    pub const U1: u8 = 0x05;
    pub const I2: u8 = 0x06;
    pub const U2: u8 = 0x07;
    pub const I4: u8 = 0x08;
    pub const U4: u8 = 0x09;
    pub const I8: u8 = 0x0a;
    pub const U8: u8 = 0x0b;
    pub const R4: u8 = 0x0c;
    pub const R8: u8 = 0x0d;
    pub const STRING: u8 = 0x0e;
    // Followed by type
    pub const PTR: u8 = 0x0f;
    // Followed by type
    pub const BYREF: u8 = 0x10;
    // Followed by TypeDef or TypeRef token
    pub const VALUETYPE: u8 = 0x11;
    // Followed by TypeDef or TypeRef token
    pub const CLASS: u8 = 0x12;
    // Generic parameter in a generic type definition, represented as number
    pub const VAR: u8 = 0x13;
    // type rank boundsCount bound1 … loCount lo1 …
    pub const ARRAY: u8 = 0x14;
    // Generic type instantiation. Followed by type type-arg-count type-1 ... type-n
    pub const GENERICINST: u8 = 0x15;
    pub const TYPEDBYREF: u8 = 0x16;
    // System.IntPtr
    pub const I: u8 = 0x18;
    // System.UIntPtr
    pub const U: u8 = 0x19;
    // Followed by full method signature
    pub const FNPTR: u8 = 0x1b;
    // System.Object
    pub const OBJECT: u8 = 0x1c;
    // Single-dim array with 0 lower bound
    pub const SZARRAY: u8 = 0x1d;
    // Generic parameter in a generic method definition, represented as number
    pub const MVAR: u8 = 0x1e;
    // Required modifier : followed by a TypeDef or TypeRef token
    pub const CMOD_REQD: u8 = 0x1f;
    // Optional modifier : followed by a TypeDef or TypeRef token
    pub const CMOD_OPT: u8 = 0x20;
    // Sentinel for vararg method signature
    pub const SENTINEL: u8 = 0x41;
    // Denotes a local variable that points at a pinned object
    pub const PINNED: u8 = 0x45;
}

#[allow(non_snake_case)]
#[allow(missing_docs)]
/// Calling convention bits of the first byte of method and property signatures
pub mod CALLING_CONVENTION {
    pub const DEFAULT: u8 = 0x00;
    pub const VARARG: u8 = 0x05;
    pub const FIELD: u8 = 0x06;
    pub const PROPERTY: u8 = 0x08;
    pub const KIND_MASK: u8 = 0x0F;
    pub const GENERIC: u8 = 0x10;
    pub const HAS_THIS: u8 = 0x20;
    pub const EXPLICIT_THIS: u8 = 0x40;
}

/// A single `CMOD_OPT` / `CMOD_REQD` entry as it appears in the blob
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CustomModifier {
    /// `true` for `modreq`, `false` for `modopt`
    pub is_required: bool,
    /// TypeDef, TypeRef or TypeSpec token of the modifier type
    pub modifier_type: Token,
}

impl CustomModifier {
    /// Creates an optional modifier
    #[must_use]
    pub fn optional(modifier_type: Token) -> Self {
        CustomModifier {
            is_required: false,
            modifier_type,
        }
    }

    /// Creates a required modifier
    #[must_use]
    pub fn required(modifier_type: Token) -> Self {
        CustomModifier {
            is_required: true,
            modifier_type,
        }
    }
}

#[allow(missing_docs)]
/// The encoded form of a type inside a signature blob
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeSignature {
    Void,
    Boolean,
    Char,
    I1,
    U1,
    I2,
    U2,
    I4,
    U4,
    I8,
    U8,
    R4,
    R8,
    String,
    Object,
    /// System.IntPtr
    I,
    /// System.UIntPtr
    U,
    TypedByRef,
    /// A value type by TypeDef or TypeRef token
    ValueType(Token),
    /// A reference type by TypeDef or TypeRef token
    Class(Token),
    /// `!n`, position in the flattened type parameter list of the enclosing type
    GenericParamType(u32),
    /// `!!n`, position in the method's own type parameter list
    GenericParamMethod(u32),
    Ptr(SignatureElement),
    SzArray(SignatureElement),
    Array(SignatureArray),
    /// Generic definition (`Class` / `ValueType`) and its flattened arguments
    GenericInst(Box<TypeSignature>, Vec<SignatureElement>),
    /// A by-ref marker in a position where only parameters and returns may carry one
    ByRef(Box<TypeSignature>),
    FnPtr(Box<SignatureMethod>),
}

impl TypeSignature {
    /// Wraps the type with no modifiers
    #[must_use]
    pub fn element(self) -> SignatureElement {
        SignatureElement {
            modifiers: Vec::new(),
            base: Box::new(self),
        }
    }
}

/// A type position that may carry its own custom modifiers: array and pointer elements and
/// generic arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SignatureElement {
    /// Modifiers in blob order
    pub modifiers: Vec<CustomModifier>,
    /// The modified type
    pub base: Box<TypeSignature>,
}

/// A general (possibly multi-dimensional) array
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SignatureArray {
    /// Element type
    pub element: SignatureElement,
    /// Number of dimensions
    pub rank: u32,
    /// Declared sizes, one per leading dimension
    pub sizes: Vec<u32>,
    /// Declared lower bounds, one per leading dimension
    pub lower_bounds: Vec<i32>,
}

/// A parameter or return slot.
///
/// Modifiers that precede the `BYREF` marker belong to the reference itself and are kept in
/// `ref_modifiers`; modifiers after it (or all modifiers of a non-ref slot) belong to the type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SignatureParameter {
    /// Modifiers preceding `BYREF`
    pub ref_modifiers: Vec<CustomModifier>,
    /// Whether the slot is passed by reference
    pub by_ref: bool,
    /// Modifiers of the parameter type
    pub modifiers: Vec<CustomModifier>,
    /// The parameter type
    pub base: TypeSignature,
}

impl SignatureParameter {
    /// A by-value parameter without modifiers
    #[must_use]
    pub fn plain(base: TypeSignature) -> Self {
        SignatureParameter {
            ref_modifiers: Vec::new(),
            by_ref: false,
            modifiers: Vec::new(),
            base,
        }
    }
}

/// `MethodDefSig` / `MethodRefSig`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SignatureMethod {
    /// Instance method
    pub has_this: bool,
    /// `this` is passed explicitly as the first parameter
    pub explicit_this: bool,
    /// `VARARG` calling convention
    pub vararg: bool,
    /// Number of method type parameters
    pub generic_param_count: u32,
    /// Return slot
    pub return_type: SignatureParameter,
    /// Fixed parameters
    pub params: Vec<SignatureParameter>,
    /// Parameters following the `SENTINEL` marker
    pub varargs: Vec<SignatureParameter>,
}

/// `FieldSig`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SignatureField {
    /// The field type; `by_ref` is set for ref fields
    pub field_type: SignatureParameter,
}

/// `PropertySig`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SignatureProperty {
    /// Instance property
    pub has_this: bool,
    /// Property value type
    pub property_type: SignatureParameter,
    /// Indexer parameters
    pub params: Vec<SignatureParameter>,
}
