// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-component relation state.
//!
//! A [`Relation`] pairs a (usually shared) [`RelationGroup`] with a link table
//! owned by one component instance. The table has one entry per declared slot;
//! only parent-role entries are ever filled, by [`relink`](crate::relink).

use alloc::rc::Rc;
use core::fmt;
use smallvec::SmallVec;

use crate::definition::RelationDefinition;
use crate::group::{RelationGroup, RelationKey, Slot};
use crate::kind::{KIND_COUNT, RelationKind};

/// Most components declare at most one relation of a given kind.
const INLINE_LINKS: usize = 1;

pub(crate) type LinkList<K> = SmallVec<[Option<Link<K>>; INLINE_LINKS]>;

/// A resolved link: the target component and the target's matching definition.
///
/// `target` is a key into the host tree, not an owning reference; the link is
/// cleared by a detach pass before the target can go away.
pub struct Link<K> {
    target: K,
    definition: Rc<RelationDefinition<K>>,
}

impl<K: Copy + Eq> Link<K> {
    pub(crate) fn new(target: K, definition: Rc<RelationDefinition<K>>) -> Self {
        Self { target, definition }
    }

    /// Returns the linked component.
    #[must_use]
    #[inline]
    pub fn target(&self) -> K {
        self.target
    }

    /// Returns the reciprocal definition on the target that matched.
    #[must_use]
    #[inline]
    pub fn definition(&self) -> &Rc<RelationDefinition<K>> {
        &self.definition
    }

    /// Returns `true` if this link points at `target` through `definition`.
    ///
    /// Definitions compare by identity.
    #[must_use]
    pub fn points_to(&self, target: K, definition: &Rc<RelationDefinition<K>>) -> bool {
        self.target == target && Rc::ptr_eq(&self.definition, definition)
    }

    /// Returns `true` if both links have the same target and definition.
    #[must_use]
    #[inline]
    pub fn same_as(&self, other: &Self) -> bool {
        self.points_to(other.target, &other.definition)
    }
}

impl<K: Copy> Clone for Link<K> {
    fn clone(&self) -> Self {
        Self {
            target: self.target,
            definition: Rc::clone(&self.definition),
        }
    }
}

impl<K: fmt::Debug> fmt::Debug for Link<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Link")
            .field("target", &self.target)
            .field("definition", &self.definition)
            .finish()
    }
}

/// The relation state of one component.
///
/// ```rust
/// use understory_relation::{
///     Relation, RelationDefinition, RelationGroup, RelationKind, RelationTarget,
/// };
///
/// let group = RelationGroup::<u32>::build([(
///     "items",
///     RelationDefinition::new(RelationKind::ChildComponent, RelationTarget::named("item")),
/// )]);
///
/// let mut a = Relation::new(1, group.clone());
/// let b = Relation::new(2, group);
/// assert!(a.shares_group_with(&b));
///
/// // Adding to one instance privatizes its group; the other is untouched.
/// let key = a.add(RelationDefinition::new(
///     RelationKind::ParentComponent,
///     RelationTarget::named("list"),
/// ));
/// assert!(!a.shares_group_with(&b));
/// assert!(a.slot(&key).is_some());
/// assert!(b.slot(&key).is_none());
/// assert_eq!((a.slot_count(), b.slot_count()), (2, 1));
/// ```
pub struct Relation<K> {
    owner: K,
    group: Option<Rc<RelationGroup<K>>>,
    links: [LinkList<K>; KIND_COUNT],
}

impl<K: Copy + Eq> Relation<K> {
    /// Creates the relation state for `owner`, with every link empty.
    ///
    /// `group` is typically shared by all instances of a component type.
    #[must_use]
    pub fn new(owner: K, group: Option<Rc<RelationGroup<K>>>) -> Self {
        let links: [LinkList<K>; KIND_COUNT] = core::array::from_fn(|i| {
            let count = group
                .as_ref()
                .map_or(0, |g| g.definitions(RelationKind::ALL[i]).len());
            core::iter::repeat_with(|| None).take(count).collect()
        });
        Self {
            owner,
            group,
            links,
        }
    }

    /// Declares one more relation on this instance and returns its key.
    ///
    /// A group still shared with other instances is copied first, so they
    /// never observe the new slot. The slot starts empty and is resolved by
    /// the next attach pass. The returned key names that slot on this
    /// instance only.
    pub fn add(&mut self, definition: RelationDefinition<K>) -> RelationKey {
        let group = self.group.get_or_insert_with(Rc::default);
        let (key, slot) = Rc::make_mut(group).push_anonymous(Rc::new(definition));
        self.links[slot.kind.index()].push(None);
        key
    }

    /// Returns the component this state belongs to.
    #[must_use]
    #[inline]
    pub fn owner(&self) -> K {
        self.owner
    }

    /// Returns the definition group, if any relation is declared.
    #[must_use]
    #[inline]
    pub fn group(&self) -> Option<&Rc<RelationGroup<K>>> {
        self.group.as_ref()
    }

    /// Returns `true` if both relations currently alias the same group.
    #[must_use]
    pub fn shares_group_with(&self, other: &Self) -> bool {
        match (&self.group, &other.group) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Returns the slot a key refers to.
    #[must_use]
    pub fn slot(&self, key: &RelationKey) -> Option<Slot> {
        self.group.as_ref()?.slot(key)
    }

    /// Returns the definitions of one kind, in slot order.
    #[must_use]
    pub fn definitions(&self, kind: RelationKind) -> &[Rc<RelationDefinition<K>>] {
        self.group.as_ref().map_or(&[], |g| g.definitions(kind))
    }

    /// Returns the link table entries of one kind, in slot order.
    #[must_use]
    #[inline]
    pub fn links(&self, kind: RelationKind) -> &[Option<Link<K>>] {
        &self.links[kind.index()]
    }

    /// Returns the current link in `slot`.
    #[must_use]
    pub fn link(&self, slot: Slot) -> Option<&Link<K>> {
        self.links[slot.kind.index()].get(slot.index)?.as_ref()
    }

    /// Returns the total number of slots across all kinds.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.links.iter().map(|list| list.len()).sum()
    }

    /// Returns `true` if any parent-role slot of `kind` links to `target`
    /// through `definition`.
    #[must_use]
    pub fn links_back(
        &self,
        kind: RelationKind,
        target: K,
        definition: &Rc<RelationDefinition<K>>,
    ) -> bool {
        self.links(kind)
            .iter()
            .flatten()
            .any(|link| link.points_to(target, definition))
    }

    pub(crate) fn links_mut(&mut self, kind: RelationKind) -> &mut LinkList<K> {
        &mut self.links[kind.index()]
    }
}

impl<K: fmt::Debug> fmt::Debug for Relation<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Relation")
            .field("owner", &self.owner)
            .field("group", &self.group)
            .field("links", &self.links)
            .finish()
    }
}
