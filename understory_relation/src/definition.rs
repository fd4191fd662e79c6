// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Relation definitions.
//!
//! This module provides [`RelationDefinition`], one declared relation slot on
//! a component type, and [`RelationDefinitionBuilder`] for attaching listeners.

use alloc::boxed::Box;
use alloc::string::String;
use core::fmt;

use crate::capability::CapabilityId;
use crate::events::ListenerResult;
use crate::kind::RelationKind;

/// Listener invoked with `(receiver, other)` when a link forms, refreshes or breaks.
///
/// `receiver` is the component the definition belongs to; `other` is the
/// component on the far side of the link.
pub type RelationListener<K> = Box<dyn Fn(K, K) -> ListenerResult>;

/// Listener invoked with the owner when an attach pass finds no match.
pub type LinkFailedListener<K> = Box<dyn Fn(K) -> ListenerResult>;

/// What the other side of a relation must satisfy.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum RelationTarget {
    /// A capability token, used as is.
    Capability(CapabilityId),
    /// A capability name, resolved at link time through
    /// [`CapabilitySource::resolve`](crate::CapabilitySource::resolve).
    Named {
        /// The capability name.
        name: String,
        /// The domain the name lives in.
        domain: Option<String>,
    },
}

impl RelationTarget {
    /// Creates a target naming a capability outside any domain.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named {
            name: name.into(),
            domain: None,
        }
    }

    /// Creates a target naming a capability inside `domain`.
    #[must_use]
    pub fn named_in(name: impl Into<String>, domain: impl Into<String>) -> Self {
        Self::Named {
            name: name.into(),
            domain: Some(domain.into()),
        }
    }
}

impl From<CapabilityId> for RelationTarget {
    fn from(capability: CapabilityId) -> Self {
        Self::Capability(capability)
    }
}

/// One declared relation slot.
///
/// Definitions are immutable once built and are compared by identity: two
/// links refer to "the same definition" only when they share one allocation.
///
/// ```rust
/// use understory_relation::{RelationDefinition, RelationKind, RelationTarget};
///
/// let def = RelationDefinition::<u32>::builder(
///     RelationKind::ParentComponent,
///     RelationTarget::named("list"),
/// )
/// .linked(|_item, _list| Ok(()))
/// .build();
///
/// assert_eq!(def.kind(), RelationKind::ParentComponent);
/// assert!(def.has_linked());
/// assert!(!def.has_link_failed());
/// ```
pub struct RelationDefinition<K> {
    kind: RelationKind,
    target: RelationTarget,
    linked: Option<RelationListener<K>>,
    link_changed: Option<RelationListener<K>>,
    unlinked: Option<RelationListener<K>>,
    link_failed: Option<LinkFailedListener<K>>,
}

impl<K> RelationDefinition<K> {
    /// Creates a definition without listeners.
    #[must_use]
    pub fn new(kind: RelationKind, target: impl Into<RelationTarget>) -> Self {
        Self::builder(kind, target).build()
    }

    /// Starts building a definition.
    #[must_use]
    pub fn builder(
        kind: RelationKind,
        target: impl Into<RelationTarget>,
    ) -> RelationDefinitionBuilder<K> {
        RelationDefinitionBuilder {
            def: Self {
                kind,
                target: target.into(),
                linked: None,
                link_changed: None,
                unlinked: None,
                link_failed: None,
            },
        }
    }

    /// Returns the relation kind.
    #[must_use]
    #[inline]
    pub fn kind(&self) -> RelationKind {
        self.kind
    }

    /// Returns the target specifier.
    #[must_use]
    #[inline]
    pub fn target(&self) -> &RelationTarget {
        &self.target
    }

    /// Returns the domain qualifier of a named target.
    #[must_use]
    pub fn domain(&self) -> Option<&str> {
        match &self.target {
            RelationTarget::Named { domain, .. } => domain.as_deref(),
            RelationTarget::Capability(_) => None,
        }
    }

    /// Returns the `linked` listener.
    #[must_use]
    #[inline]
    pub fn linked(&self) -> Option<&RelationListener<K>> {
        self.linked.as_ref()
    }

    /// Returns the `link_changed` listener.
    #[must_use]
    #[inline]
    pub fn link_changed(&self) -> Option<&RelationListener<K>> {
        self.link_changed.as_ref()
    }

    /// Returns the `unlinked` listener.
    #[must_use]
    #[inline]
    pub fn unlinked(&self) -> Option<&RelationListener<K>> {
        self.unlinked.as_ref()
    }

    /// Returns the `link_failed` listener.
    #[must_use]
    #[inline]
    pub fn link_failed(&self) -> Option<&LinkFailedListener<K>> {
        self.link_failed.as_ref()
    }

    /// Returns whether a `linked` listener is set.
    #[must_use]
    #[inline]
    pub fn has_linked(&self) -> bool {
        self.linked.is_some()
    }

    /// Returns whether a `link_failed` listener is set.
    #[must_use]
    #[inline]
    pub fn has_link_failed(&self) -> bool {
        self.link_failed.is_some()
    }
}

// Manual Debug impl since listeners aren't Debug
impl<K> fmt::Debug for RelationDefinition<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelationDefinition")
            .field("kind", &self.kind)
            .field("target", &self.target)
            .field("has_linked", &self.linked.is_some())
            .field("has_link_changed", &self.link_changed.is_some())
            .field("has_unlinked", &self.unlinked.is_some())
            .field("has_link_failed", &self.link_failed.is_some())
            .finish()
    }
}

/// Builder for [`RelationDefinition`].
pub struct RelationDefinitionBuilder<K> {
    def: RelationDefinition<K>,
}

impl<K> RelationDefinitionBuilder<K> {
    /// Sets the listener fired when a new link forms.
    #[must_use]
    pub fn linked(mut self, listener: impl Fn(K, K) -> ListenerResult + 'static) -> Self {
        self.def.linked = Some(Box::new(listener));
        self
    }

    /// Sets the listener fired when a relink pass confirms an unchanged link.
    #[must_use]
    pub fn link_changed(mut self, listener: impl Fn(K, K) -> ListenerResult + 'static) -> Self {
        self.def.link_changed = Some(Box::new(listener));
        self
    }

    /// Sets the listener fired when an existing link breaks or is replaced.
    #[must_use]
    pub fn unlinked(mut self, listener: impl Fn(K, K) -> ListenerResult + 'static) -> Self {
        self.def.unlinked = Some(Box::new(listener));
        self
    }

    /// Sets the listener fired when an attach pass finds nothing to link to.
    ///
    /// Only meaningful on parent-role definitions; child-role definitions are
    /// never resolved and so never fail.
    #[must_use]
    pub fn link_failed(mut self, listener: impl Fn(K) -> ListenerResult + 'static) -> Self {
        self.def.link_failed = Some(Box::new(listener));
        self
    }

    /// Finishes the definition.
    #[must_use]
    pub fn build(self) -> RelationDefinition<K> {
        self.def
    }
}

impl<K> fmt::Debug for RelationDefinitionBuilder<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RelationDefinitionBuilder")
            .field(&self.def)
            .finish()
    }
}
