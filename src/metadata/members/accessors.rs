//! Reconciliation of properties and events with their accessor methods.

use crate::metadata::{
    members::{Method, Parameter, RefKind},
    typesystem::{Modifier, PrimitiveKind, Symbol, TypeWithModifiers},
};

/// The parts of a property signature compared against its accessors
pub(crate) struct PropertyShape<'a> {
    pub is_static: bool,
    pub ref_kind: RefKind,
    pub ref_modifiers: &'a [Modifier],
    pub ty: &'a TypeWithModifiers,
    pub parameters: &'a [Parameter],
}

fn is_void(symbol: &Symbol) -> bool {
    match symbol {
        Symbol::Primitive(kind) => *kind == PrimitiveKind::Void,
        Symbol::Named(named) => named.full_name() == "System.Void",
        _ => false,
    }
}

fn combined(ref_modifiers: &[Modifier], ty: &TypeWithModifiers) -> Vec<Modifier> {
    ref_modifiers.iter().chain(&ty.modifiers).cloned().collect()
}

/// Same underlying type and the same modifiers, wherever the modifiers were placed
fn same_position(
    left_by_ref: bool,
    left_ref_modifiers: &[Modifier],
    left: &TypeWithModifiers,
    right_by_ref: bool,
    right_ref_modifiers: &[Modifier],
    right: &TypeWithModifiers,
) -> bool {
    left_by_ref == right_by_ref
        && left.symbol == right.symbol
        && combined(left_ref_modifiers, left) == combined(right_ref_modifiers, right)
}

fn same_parameter(property: &Parameter, accessor: &Parameter) -> bool {
    same_position(
        property.is_by_ref(),
        &property.ref_modifiers,
        &property.ty,
        accessor.is_by_ref(),
        &accessor.ref_modifiers,
        &accessor.ty,
    )
}

fn getter_matches(shape: &PropertyShape<'_>, getter: &Method) -> bool {
    getter.parameters.len() == shape.parameters.len()
        && same_position(
            shape.ref_kind != RefKind::None,
            shape.ref_modifiers,
            shape.ty,
            getter.return_ref_kind != RefKind::None,
            &getter.return_ref_modifiers,
            &getter.return_type,
        )
        && shape
            .parameters
            .iter()
            .zip(&getter.parameters)
            .all(|(p, a)| same_parameter(p, a))
}

fn setter_matches(shape: &PropertyShape<'_>, setter: &Method) -> bool {
    let Some((value, indices)) = setter.parameters.split_last() else {
        return false;
    };

    indices.len() == shape.parameters.len()
        && setter.return_ref_kind == RefKind::None
        && is_void(&setter.return_type.symbol)
        && same_position(
            shape.ref_kind != RefKind::None,
            shape.ref_modifiers,
            shape.ty,
            value.is_by_ref(),
            &value.ref_modifiers,
            &value.ty,
        )
        && shape
            .parameters
            .iter()
            .zip(indices)
            .all(|(p, a)| same_parameter(p, a))
}

/// Returns `true` if the accessors cannot be used through the property
pub(crate) fn property_requires_direct_calls(
    shape: &PropertyShape<'_>,
    getter: Option<&Method>,
    setter: Option<&Method>,
) -> bool {
    if let (Some(getter), Some(setter)) = (getter, setter) {
        if getter.is_static() != setter.is_static() {
            return true;
        }
    }

    if let Some(getter) = getter {
        if getter.is_static() != shape.is_static || !getter_matches(shape, getter) {
            return true;
        }
    }

    if let Some(setter) = setter {
        if setter.is_static() != shape.is_static || !setter_matches(shape, setter) {
            return true;
        }
    }

    false
}

/// Names for `count` indexer parameters.
///
/// Setter names win over getter names. Positions neither accessor names get `value` for the
/// first such position and `param{n}` (1-based) for later ones.
pub(crate) fn property_parameter_names(
    count: usize,
    getter: Option<&Method>,
    setter: Option<&Method>,
) -> Vec<String> {
    let name_at = |method: Option<&Method>, index: usize| {
        method
            .and_then(|m| m.parameters.get(index))
            .map(|p| p.name.clone())
            .filter(|name| !name.is_empty())
    };

    let mut filler_used = false;
    (0..count)
        .map(|index| {
            name_at(setter, index)
                .or_else(|| name_at(getter, index))
                .unwrap_or_else(|| {
                    if filler_used {
                        format!("param{}", index + 1)
                    } else {
                        filler_used = true;
                        "value".to_string()
                    }
                })
        })
        .collect()
}

fn event_accessor_matches(event_type: &Symbol, accessor: &Method) -> bool {
    accessor.parameters.len() == 1
        && !accessor.parameters[0].is_by_ref()
        && accessor.parameters[0].ty.symbol == *event_type
        && accessor.return_ref_kind == RefKind::None
        && is_void(&accessor.return_type.symbol)
}

/// Returns `true` if an adder or remover does not have the shape of an event accessor
pub(crate) fn event_requires_direct_calls(
    event_type: &Symbol,
    adder: Option<&Method>,
    remover: Option<&Method>,
) -> bool {
    [adder, remover]
        .into_iter()
        .flatten()
        .any(|accessor| !event_accessor_matches(event_type, accessor))
}
