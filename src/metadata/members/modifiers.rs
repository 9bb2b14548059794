//! Interpretation of required custom modifiers.
//!
//! Optional modifiers never affect whether a member can be used. A required modifier is
//! accepted only in the positions listed below; anything else makes the owning member
//! unusable.
//!
//! | Modifier        | Accepted on                                   |
//! |-----------------|-----------------------------------------------|
//! | `IsVolatile`    | field types                                   |
//! | `InAttribute`   | ref modifiers of by-ref parameters and returns |
//! | `IsExternalInit`| return types of property setters               |

use crate::metadata::typesystem::{ErrorKind, Modifier, Symbol};

pub(crate) const IS_VOLATILE: &str = "System.Runtime.CompilerServices.IsVolatile";
pub(crate) const IN_ATTRIBUTE: &str = "System.Runtime.InteropServices.InAttribute";
pub(crate) const IS_EXTERNAL_INIT: &str = "System.Runtime.CompilerServices.IsExternalInit";

/// Name of a modifier type, also for modifier types that failed to resolve
pub(crate) fn modifier_type_name(symbol: &Symbol) -> Option<String> {
    match symbol {
        Symbol::Error(error) => match &error.kind {
            ErrorKind::Missing { name, .. }
            | ErrorKind::CyclicForward { name, .. }
            | ErrorKind::ForwardingLimit { name, .. } => {
                Some(name.clone())
            }
            _ => None,
        },
        other => other.full_name(),
    }
}

/// Returns `true` if `modifiers` hold a required `name`
pub(crate) fn has_required(modifiers: &[Modifier], name: &str) -> bool {
    modifiers.iter().any(|modifier| {
        !modifier.is_optional
            && modifier_type_name(&modifier.modifier_type).as_deref() == Some(name)
    })
}

/// The first required modifier whose type is not in `accepted`
pub(crate) fn unsupported_required<'a>(
    modifiers: &'a [Modifier],
    accepted: &[&str],
) -> Option<&'a Modifier> {
    modifiers.iter().find(|modifier| {
        !modifier.is_optional
            && !modifier_type_name(&modifier.modifier_type)
                .is_some_and(|name| accepted.contains(&name.as_str()))
    })
}

/// The error recorded for an unsupported required modifier
pub(crate) fn unsupported_modifier_error(modifier: &Modifier) -> ErrorKind {
    ErrorKind::UnsupportedMetadata(format!(
        "required modifier '{}' is not supported here",
        modifier.modifier_type
    ))
}
