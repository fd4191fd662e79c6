// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Capability tokens and name resolution.
//!
//! A capability stands for "this component satisfies behavior X". The relation
//! algorithm only ever compares tokens and asks the host whether a component
//! satisfies one; what a capability *means* is up to the host.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use hashbrown::HashMap;

/// An opaque, identity-comparable capability token.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CapabilityId(u32);

impl CapabilityId {
    /// Creates a capability ID from a raw index.
    ///
    /// This is typically called by [`CapabilityRegistry::register`] rather
    /// than directly.
    #[must_use]
    #[inline]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw index of this capability.
    #[must_use]
    #[inline]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for CapabilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CapabilityId").field(&self.0).finish()
    }
}

/// Capability lookups the relation algorithm needs from its host.
pub trait CapabilitySource<K> {
    /// Resolves a capability by name within `domain`.
    ///
    /// `context` is the component whose definition names the capability; hosts
    /// with per-owner namespaces resolve relative to it. `None` is a miss, not
    /// an error.
    fn resolve(&self, context: K, name: &str, domain: Option<&str>) -> Option<CapabilityId>;

    /// Returns whether `component` satisfies `capability`.
    fn satisfies(&self, component: K, capability: CapabilityId) -> bool;
}

/// A name table for capabilities, keyed by `(domain, name)`.
///
/// Hosts can embed one of these to implement [`CapabilitySource::resolve`].
///
/// ```rust
/// use understory_relation::CapabilityRegistry;
///
/// let mut registry = CapabilityRegistry::new();
/// let list = registry.register("list", None);
/// let item = registry.register("item", Some("widgets"));
///
/// assert_eq!(registry.resolve("list", None), Some(list));
/// assert_eq!(registry.resolve("item", Some("widgets")), Some(item));
/// assert_eq!(registry.resolve("item", None), None);
/// ```
#[derive(Default)]
pub struct CapabilityRegistry {
    names: Vec<(Option<String>, String)>,
    by_name: HashMap<(Option<String>, String), CapabilityId>,
}

impl CapabilityRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a capability, returning its token.
    ///
    /// Registering the same `(name, domain)` twice returns the existing token.
    ///
    /// # Panics
    ///
    /// Panics if more than `u32::MAX` capabilities are registered.
    pub fn register(&mut self, name: &str, domain: Option<&str>) -> CapabilityId {
        let key = (domain.map(String::from), String::from(name));
        if let Some(&id) = self.by_name.get(&key) {
            return id;
        }
        assert!(
            self.names.len() < u32::MAX as usize,
            "Too many capabilities registered (max {})",
            u32::MAX
        );

        #[expect(clippy::cast_possible_truncation, reason = "checked above")]
        let id = CapabilityId::new(self.names.len() as u32);
        self.names.push(key.clone());
        self.by_name.insert(key, id);
        id
    }

    /// Looks up a capability by name within `domain`.
    #[must_use]
    pub fn resolve(&self, name: &str, domain: Option<&str>) -> Option<CapabilityId> {
        self.by_name
            .get(&(domain.map(String::from), String::from(name)))
            .copied()
    }

    /// Returns the name a capability was registered under.
    #[must_use]
    pub fn name(&self, id: CapabilityId) -> Option<&str> {
        self.names
            .get(id.index() as usize)
            .map(|(_, name)| name.as_str())
    }

    /// Returns the number of registered capabilities.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityRegistry")
            .field("count", &self.names.len())
            .field("names", &self.names)
            .finish()
    }
}
