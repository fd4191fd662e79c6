// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Relation definition groups.
//!
//! A [`RelationGroup`] is the per-type table of declared relations. It is
//! normally built once per component type with [`RelationGroup::build`] and
//! shared by every instance through an `Rc`. Instances that add relations of
//! their own privatize the group first (see [`Relation::add`](crate::Relation::add)).

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};
use hashbrown::HashMap;

use crate::definition::RelationDefinition;
use crate::kind::{KIND_COUNT, RelationKind};

/// A key naming one relation slot.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum RelationKey {
    /// A key declared by name when the group was built.
    Named(String),
    /// A key handed out by [`Relation::add`](crate::Relation::add).
    Anonymous(AnonymousKey),
}

/// An opaque key for a relation added to a single instance.
///
/// Every key is distinct from every other key handed out in the process, so a
/// key taken from one instance never names a slot of another, even when both
/// started from the same group.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct AnonymousKey(u64);

impl AnonymousKey {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for AnonymousKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<anonymous #{}>", self.0)
    }
}

impl From<&str> for RelationKey {
    fn from(name: &str) -> Self {
        Self::Named(String::from(name))
    }
}

impl From<String> for RelationKey {
    fn from(name: String) -> Self {
        Self::Named(name)
    }
}

impl fmt::Display for RelationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::Anonymous(key) => fmt::Display::fmt(key, f),
        }
    }
}

/// The position of a definition: its kind and index within that kind.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Slot {
    /// The relation kind.
    pub kind: RelationKind,
    /// The index within the kind's definition list.
    pub index: usize,
}

/// Per-kind definition lists plus a key map.
///
/// ```rust
/// use understory_relation::{
///     RelationDefinition, RelationGroup, RelationKind, RelationTarget, Slot,
/// };
///
/// let group = RelationGroup::<u32>::build([
///     ("parent", RelationDefinition::new(RelationKind::ParentComponent, RelationTarget::named("list"))),
///     ("outer", RelationDefinition::new(RelationKind::Ancestor, RelationTarget::named("form"))),
///     ("owner", RelationDefinition::new(RelationKind::ParentComponent, RelationTarget::named("menu"))),
/// ])
/// .unwrap();
///
/// assert_eq!(
///     group.slot(&"owner".into()),
///     Some(Slot { kind: RelationKind::ParentComponent, index: 1 })
/// );
/// assert_eq!(group.definitions(RelationKind::ParentComponent).len(), 2);
/// ```
pub struct RelationGroup<K> {
    definitions: [Vec<Rc<RelationDefinition<K>>>; KIND_COUNT],
    keys: HashMap<RelationKey, Slot>,
}

impl<K> Default for RelationGroup<K> {
    fn default() -> Self {
        Self {
            definitions: core::array::from_fn(|_| Vec::new()),
            keys: HashMap::new(),
        }
    }
}

// Definitions are shared, not copied: only the lists and the key map are new.
impl<K> Clone for RelationGroup<K> {
    fn clone(&self) -> Self {
        Self {
            definitions: self.definitions.clone(),
            keys: self.keys.clone(),
        }
    }
}

impl<K> RelationGroup<K> {
    /// Builds a shared group from declared `(key, definition)` pairs.
    ///
    /// Slots are assigned in iteration order. An empty declaration yields
    /// `None`, meaning "no relations".
    ///
    /// # Panics
    ///
    /// Panics if a key is declared twice.
    pub fn build<S, I>(declared: I) -> Option<Rc<Self>>
    where
        S: Into<String>,
        I: IntoIterator<Item = (S, RelationDefinition<K>)>,
    {
        let mut group = Self::default();
        for (key, def) in declared {
            let key = RelationKey::Named(key.into());
            assert!(
                !group.keys.contains_key(&key),
                "Relation '{key}' is declared twice"
            );
            group.push(key, Rc::new(def));
        }
        (!group.keys.is_empty()).then(|| Rc::new(group))
    }

    /// Appends a definition under a fresh anonymous key and returns the key.
    pub(crate) fn push_anonymous(&mut self, def: Rc<RelationDefinition<K>>) -> (RelationKey, Slot) {
        let key = RelationKey::Anonymous(AnonymousKey::next());
        let slot = self.push(key.clone(), def);
        (key, slot)
    }

    fn push(&mut self, key: RelationKey, def: Rc<RelationDefinition<K>>) -> Slot {
        let kind = def.kind();
        let list = &mut self.definitions[kind.index()];
        let slot = Slot {
            kind,
            index: list.len(),
        };
        list.push(def);
        self.keys.insert(key, slot);
        slot
    }

    /// Returns the slot a key refers to.
    #[must_use]
    pub fn slot(&self, key: &RelationKey) -> Option<Slot> {
        self.keys.get(key).copied()
    }

    /// Returns the definitions of one kind, in slot order.
    #[must_use]
    #[inline]
    pub fn definitions(&self, kind: RelationKind) -> &[Rc<RelationDefinition<K>>] {
        &self.definitions[kind.index()]
    }

    /// Returns the definition in `slot`.
    #[must_use]
    pub fn definition(&self, slot: Slot) -> Option<&Rc<RelationDefinition<K>>> {
        self.definitions[slot.kind.index()].get(slot.index)
    }

    /// Returns the number of declared relations across all kinds.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns `true` if nothing is declared.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Iterates over all keys and their slots, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = (&RelationKey, Slot)> + '_ {
        self.keys.iter().map(|(key, slot)| (key, *slot))
    }
}

impl<K> fmt::Debug for RelationGroup<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts = self.definitions.each_ref().map(Vec::len);
        f.debug_struct("RelationGroup")
            .field("counts", &counts)
            .field("keys", &self.keys)
            .finish()
    }
}
