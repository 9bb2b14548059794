//! Import configuration for symbol materialization
//!
//! This module provides the options a [`crate::metadata::context::ResolutionContext`] is built
//! with. The most important knob is the [`ImportScope`]: members outside the configured
//! visibility are never created, they are not merely hidden from enumeration.

use strum::{Display, EnumIter, EnumString};

use crate::metadata::flags::Accessibility;

/// Which member rows are materialized into the symbol graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum ImportScope {
    /// `public`, `protected` and `protected internal` members
    PublicOnly,
    /// Additionally `internal` and `private protected` members
    PublicAndInternal,
    /// Every member including `private` ones
    All,
}

impl ImportScope {
    /// Returns `true` if a member with `access` is materialized under this scope
    #[must_use]
    pub fn includes(self, access: Accessibility) -> bool {
        match self {
            ImportScope::All => true,
            ImportScope::PublicAndInternal => access != Accessibility::Private,
            ImportScope::PublicOnly => matches!(
                access,
                Accessibility::Public
                    | Accessibility::Protected
                    | Accessibility::ProtectedOrInternal
            ),
        }
    }
}

/// Configuration for symbol materialization
///
/// The defaults import everything, allow 64 levels of nesting in signature blobs, follow up to
/// 32 forwarding hops and materialize member lists in parallel when a whole unit is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportOptions {
    /// Visibility filter applied to member rows
    pub scope: ImportScope,

    /// Maximum nesting depth accepted while decoding a signature or attribute blob
    pub max_signature_depth: usize,

    /// Maximum number of forwarders a single forwarding walk may follow. Longer acyclic chains
    /// are reported as [`crate::metadata::typesystem::ErrorKind::ForwardingLimit`].
    pub max_forwarding_hops: usize,

    /// Materialize member lists with `rayon` in
    /// [`crate::metadata::context::ResolutionContext::materialize_all`]
    pub parallel: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            scope: ImportScope::All,
            max_signature_depth: 64,
            max_forwarding_hops: 32,
            parallel: true,
        }
    }
}

impl ImportOptions {
    /// Creates a configuration that only imports the externally visible surface
    #[must_use]
    pub fn public_only() -> Self {
        Self {
            scope: ImportScope::PublicOnly,
            ..Self::default()
        }
    }

    /// Creates a configuration that imports everything visible to friend units
    #[must_use]
    pub fn public_and_internal() -> Self {
        Self {
            scope: ImportScope::PublicAndInternal,
            ..Self::default()
        }
    }

    /// Creates a configuration that imports every member row
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Replaces the import scope
    #[must_use]
    pub fn with_scope(mut self, scope: ImportScope) -> Self {
        self.scope = scope;
        self
    }

    /// Replaces the signature nesting limit
    #[must_use]
    pub fn with_max_signature_depth(mut self, depth: usize) -> Self {
        self.max_signature_depth = depth;
        self
    }

    /// Replaces the forwarding hop limit
    #[must_use]
    pub fn with_max_forwarding_hops(mut self, hops: usize) -> Self {
        self.max_forwarding_hops = hops;
        self
    }

    /// Enables or disables parallel materialization
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}
