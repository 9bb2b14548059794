//! Resolution of top-level type names across type forwarders.
//!
//! A lookup starts in one unit. If the unit defines the name, that definition is the result.
//! Otherwise the unit's forwarder for the name, if any, points to the next unit, and so on. The
//! walk keeps the set of visited units; a forwarder pointing back into the set is a cycle and
//! is reported as [`ErrorKind::CyclicForward`] naming the unit whose forwarder closes it. An
//! acyclic chain that visits more units than `max_forwarding_hops` allows is cut off with
//! [`ErrorKind::ForwardingLimit`].
//!
//! Results are memoized per (origin unit, name). A cycle is only ever discovered by a lookup
//! that runs into it; unrelated names never touch it.

use tracing::{trace, warn};

use crate::{
    metadata::{
        context::ResolutionContext,
        typesystem::{ErrorKind, Symbol},
        unit::CompiledUnit,
    },
    Result,
};

impl ResolutionContext {
    /// Resolves `full_name` (`Namespace.Name`) starting in `unit`, following type forwarders
    ///
    /// # Errors
    /// Returns [`crate::Error::UnitNotFound`] for unknown units. Unresolvable names are
    /// returned as error symbols.
    pub fn resolve_forwarded(&self, unit: &str, full_name: &str) -> Result<Symbol> {
        let unit = self.unit(unit)?;
        Ok(self.resolve_top_level(unit, full_name))
    }

    pub(crate) fn resolve_top_level(&self, origin: &CompiledUnit, full_name: &str) -> Symbol {
        origin
            .forwards
            .get_or_compute(full_name.to_string(), || self.walk_forwarders(origin, full_name))
    }

    fn walk_forwarders(&self, origin: &CompiledUnit, full_name: &str) -> Symbol {
        let mut visited = vec![origin.index];
        let mut current = origin;

        loop {
            if let Some(token) = current.lookup(full_name) {
                return self.type_def_symbol(current, token);
            }

            let Some(target_name) = current.forwarder(full_name) else {
                return Symbol::error(ErrorKind::Missing {
                    name: full_name.to_string(),
                    unit: current.name().to_string(),
                });
            };

            let Some(target) = self.unit_by_name(target_name) else {
                return Symbol::error(ErrorKind::Missing {
                    name: full_name.to_string(),
                    unit: target_name.to_string(),
                });
            };

            if visited.contains(&target.index) {
                warn!(
                    origin = origin.name(),
                    unit = current.name(),
                    name = full_name,
                    "cyclic type forwarder"
                );
                return Symbol::error(ErrorKind::CyclicForward {
                    unit: current.name().to_string(),
                    name: full_name.to_string(),
                });
            }

            if visited.len() > self.options.max_forwarding_hops {
                warn!(
                    origin = origin.name(),
                    unit = current.name(),
                    name = full_name,
                    hops = self.options.max_forwarding_hops,
                    "forwarding hop limit reached"
                );
                return Symbol::error(ErrorKind::ForwardingLimit {
                    unit: current.name().to_string(),
                    name: full_name.to_string(),
                    hops: self.options.max_forwarding_hops,
                });
            }

            trace!(
                from = current.name(),
                to = target.name(),
                name = full_name,
                "following forwarder"
            );
            visited.push(target.index);
            current = target;
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        metadata::{
            context::ResolutionContext,
            flags::TypeAttributes,
            reader::MetadataBuilder,
            typesystem::{ErrorKind, Symbol},
        },
        test::factories::metadata::forwarding_unit,
    };

    #[test]
    fn follows_chain_to_definition() {
        let mut target = MetadataBuilder::new("pe3");
        let token = target.type_def("N", "C", TypeAttributes::PUBLIC, None);

        let ctx = ResolutionContext::builder()
            .unit(forwarding_unit("pe1", "N", "C", "pe2"))
            .unit(forwarding_unit("pe2", "N", "C", "pe3"))
            .unit(target.build())
            .build()
            .unwrap();

        let resolved = ctx.resolve_forwarded("pe1", "N.C").unwrap();
        assert_eq!(resolved, ctx.type_def("pe3", token).unwrap());
        assert_eq!(resolved, ctx.resolve_forwarded("pe2", "N.C").unwrap());
    }

    #[test]
    fn three_unit_cycle_names_closing_unit() {
        let ctx = ResolutionContext::builder()
            .unit(forwarding_unit("pe1", "N", "C", "pe2"))
            .unit(forwarding_unit("pe2", "N", "C", "pe3"))
            .unit(forwarding_unit("pe3", "N", "C", "pe1"))
            .build()
            .unwrap();

        let resolved = ctx.resolve_forwarded("pe1", "N.C").unwrap();
        assert_eq!(
            resolved.as_error(),
            Some(&ErrorKind::CyclicForward {
                unit: "pe3".into(),
                name: "N.C".into()
            })
        );
    }

    #[test]
    fn missing_target_unit() {
        let ctx = ResolutionContext::builder()
            .unit(forwarding_unit("pe1", "N", "C", "gone"))
            .build()
            .unwrap();

        let resolved = ctx.resolve_forwarded("pe1", "N.C").unwrap();
        assert!(matches!(
            resolved,
            Symbol::Error(ref error) if error.kind == ErrorKind::Missing {
                name: "N.C".into(),
                unit: "gone".into()
            }
        ));

        let absent = ctx.resolve_forwarded("pe1", "N.Other").unwrap();
        assert_eq!(
            absent.as_error(),
            Some(&ErrorKind::Missing {
                name: "N.Other".into(),
                unit: "pe1".into()
            })
        );
        assert!(ctx.resolve_forwarded("nowhere", "N.C").is_err());
    }
}
