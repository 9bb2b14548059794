//! Attribute bit sets of type, method, field and parameter rows (ECMA-335 II.23.1).
//!
//! Only the bits the symbol engine interprets are named. Access bits are not single flags but a
//! 3-bit field; they are exposed through [`Accessibility`] instead.

use bitflags::bitflags;
use strum::{Display, EnumIter};

/// Mask for the 3-bit member access field of method and field attributes
pub const MEMBER_ACCESS_MASK: u32 = 0x0007;
/// Mask for the 3-bit visibility field of type attributes
pub const TYPE_VISIBILITY_MASK: u32 = 0x0007;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    /// Type definition attributes
    pub struct TypeAttributes: u32 {
        /// Top-level type visible outside its unit
        const PUBLIC = 0x0001;
        /// Nested type with public visibility
        const NESTED_PUBLIC = 0x0002;
        /// Type is an interface
        const INTERFACE = 0x0020;
        /// Type is abstract
        const ABSTRACT = 0x0080;
        /// Type cannot be derived from
        const SEALED = 0x0100;
        /// Type name is special
        const SPECIAL_NAME = 0x0400;
        /// Type is imported from a COM type library
        const IMPORT = 0x1000;
        /// Type can be serialized
        const SERIALIZABLE = 0x2000;
        /// Calling static members does not force type initialization
        const BEFORE_FIELD_INIT = 0x0010_0000;
        /// Runtime should check name encoding
        const RT_SPECIAL_NAME = 0x0800;
        /// Type has security information associated with it
        const HAS_SECURITY = 0x0004_0000;
        /// Raw bits outside the named flags are kept
        const _ = !0;
    }
}

impl TypeAttributes {
    /// Returns `true` for interface definitions
    #[must_use]
    pub fn is_interface(self) -> bool {
        self.contains(Self::INTERFACE)
    }

    /// Accessibility derived from the visibility field.
    ///
    /// Top-level `NotPublic` maps to [`Accessibility::Internal`], nested visibilities map to
    /// their member-access counterparts.
    #[must_use]
    pub fn accessibility(self) -> Accessibility {
        match self.bits() & TYPE_VISIBILITY_MASK {
            0x1 | 0x2 => Accessibility::Public,
            0x3 => Accessibility::Private,
            0x4 => Accessibility::Protected,
            0x6 => Accessibility::ProtectedAndInternal,
            0x7 => Accessibility::ProtectedOrInternal,
            _ => Accessibility::Internal,
        }
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    /// Method definition attributes
    pub struct MethodAttributes: u32 {
        /// Member access `private`
        const PRIVATE = 0x0001;
        /// Member access `internal`
        const ASSEMBLY = 0x0003;
        /// Member access `protected`
        const FAMILY = 0x0004;
        /// Member access `public`
        const PUBLIC = 0x0006;
        /// Defined on type, else per instance
        const STATIC = 0x0010;
        /// Method cannot be overridden
        const FINAL = 0x0020;
        /// Method is virtual
        const VIRTUAL = 0x0040;
        /// Method hides by name+sig, else just by name
        const HIDE_BY_SIG = 0x0080;
        /// Method always gets a new slot in the vtable
        const NEW_SLOT = 0x0100;
        /// Overridable only if also accessible
        const STRICT = 0x0200;
        /// Method does not provide an implementation
        const ABSTRACT = 0x0400;
        /// Method is special
        const SPECIAL_NAME = 0x0800;
        /// Implementation is forwarded through PInvoke
        const PINVOKE_IMPL = 0x2000;
        /// CLI provides 'special' behavior, depending upon the name of the method
        const RT_SPECIAL_NAME = 0x1000;
        /// Raw bits outside the named flags are kept
        const _ = !0;
    }
}

impl MethodAttributes {
    /// Accessibility from the member access field
    #[must_use]
    pub fn accessibility(self) -> Accessibility {
        Accessibility::from_member_access(self.bits())
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    /// Field definition attributes
    pub struct FieldAttributes: u32 {
        /// Member access `private`
        const PRIVATE = 0x0001;
        /// Member access `internal`
        const ASSEMBLY = 0x0003;
        /// Member access `protected`
        const FAMILY = 0x0004;
        /// Member access `public`
        const PUBLIC = 0x0006;
        /// Defined on type, else per instance
        const STATIC = 0x0010;
        /// Field can only be initialized, not written to after init
        const INIT_ONLY = 0x0020;
        /// Value is compile time constant
        const LITERAL = 0x0040;
        /// Field is special
        const SPECIAL_NAME = 0x0200;
        /// CLI provides 'special' behavior, depending upon the name of the field
        const RT_SPECIAL_NAME = 0x0400;
        /// Raw bits outside the named flags are kept
        const _ = !0;
    }
}

impl FieldAttributes {
    /// Accessibility from the member access field
    #[must_use]
    pub fn accessibility(self) -> Accessibility {
        Accessibility::from_member_access(self.bits())
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    /// Parameter row attributes
    pub struct ParamAttributes: u32 {
        /// Param is \[In\]
        const IN = 0x0001;
        /// Param is \[Out\]
        const OUT = 0x0002;
        /// Param is optional
        const OPTIONAL = 0x0010;
        /// Param has default value
        const HAS_DEFAULT = 0x1000;
        /// Raw bits outside the named flags are kept
        const _ = !0;
    }
}

/// Logical accessibility of a type or member.
///
/// Ordered from least to most accessible where the order is total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter)]
pub enum Accessibility {
    /// `private` / compiler controlled
    Private,
    /// `private protected` (FamANDAssem)
    ProtectedAndInternal,
    /// `internal` (Assem)
    Internal,
    /// `protected` (Family)
    Protected,
    /// `protected internal` (FamORAssem)
    ProtectedOrInternal,
    /// `public`
    Public,
}

impl Accessibility {
    /// Decodes the 3-bit member access field shared by methods and fields
    #[must_use]
    pub fn from_member_access(bits: u32) -> Self {
        match bits & MEMBER_ACCESS_MASK {
            0x2 => Accessibility::ProtectedAndInternal,
            0x3 => Accessibility::Internal,
            0x4 => Accessibility::Protected,
            0x5 => Accessibility::ProtectedOrInternal,
            0x6 => Accessibility::Public,
            _ => Accessibility::Private,
        }
    }
}
