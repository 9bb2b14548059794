use strum::{Display, EnumIter};

/// The logical membership state of a method, property or event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum Virtualness {
    /// Not virtual
    NonVirtual,
    /// Introduces a new virtual slot
    Virtual,
    /// Overrides an inherited slot
    Override,
    /// Overrides an inherited slot and seals it
    SealedOverride,
    /// Introduces a new abstract slot
    Abstract,
    /// Overrides an inherited slot and makes it abstract again
    AbstractOverride,
}

/// Maps method flags to a [`Virtualness`].
///
/// `explicit_override` is set when a `MethodImpl` row names the method as its body. It only
/// matters for new-slot virtual methods: without `newslot` a virtual method always overrides.
#[must_use]
pub fn classify_virtualness(
    new_slot: bool,
    is_virtual: bool,
    is_abstract: bool,
    is_final: bool,
    explicit_override: bool,
) -> Virtualness {
    if !is_virtual {
        return if is_abstract {
            Virtualness::Abstract
        } else {
            Virtualness::NonVirtual
        };
    }

    if new_slot {
        if is_abstract {
            if explicit_override {
                Virtualness::AbstractOverride
            } else {
                Virtualness::Abstract
            }
        } else if is_final {
            Virtualness::SealedOverride
        } else if explicit_override {
            Virtualness::Override
        } else {
            Virtualness::Virtual
        }
    } else if is_abstract {
        Virtualness::AbstractOverride
    } else if is_final {
        Virtualness::SealedOverride
    } else {
        Virtualness::Override
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_virtual_ignores_other_flags() {
        for new_slot in [false, true] {
            for is_final in [false, true] {
                for token in [false, true] {
                    assert_eq!(
                        classify_virtualness(new_slot, false, false, is_final, token),
                        Virtualness::NonVirtual
                    );
                    assert_eq!(
                        classify_virtualness(new_slot, false, true, is_final, token),
                        Virtualness::Abstract
                    );
                }
            }
        }
    }

    #[test]
    fn new_slot_abstract_with_token_ignores_final() {
        assert_eq!(
            classify_virtualness(true, true, true, true, true),
            Virtualness::AbstractOverride
        );
        assert_eq!(
            classify_virtualness(true, true, true, true, false),
            Virtualness::Abstract
        );
    }

    #[test]
    fn display_names() {
        assert_eq!(Virtualness::SealedOverride.to_string(), "SealedOverride");
    }
}
