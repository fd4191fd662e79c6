// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Linked-target queries.
//!
//! Parent-role slots are read straight from the link table. Child-role slots
//! are never stored: they are recomputed on every query by asking each
//! candidate below the owner whether its own parent-role link points back.

use alloc::vec::Vec;
use core::fmt;

use crate::group::RelationKey;
use crate::kind::RelationKind;
use crate::relation::{Link, Relation};
use crate::tree::{NodeKind, RelationTree, walk_descendants};

/// Returned when a relation key is not declared on the queried component.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownRelationKey(pub RelationKey);

impl fmt::Display for UnknownRelationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no relation \"{}\" found", self.0)
    }
}

impl core::error::Error for UnknownRelationKey {}

impl<K: Copy + Eq + fmt::Debug> Relation<K> {
    /// Returns the components currently linked through `key`.
    ///
    /// An unknown key is a configuration mistake, not a fatal one: it is
    /// logged as a warning and yields an empty list. Use
    /// [`try_linked_targets`](Self::try_linked_targets) to handle it yourself.
    pub fn linked_targets<T>(&self, tree: &T, key: &RelationKey) -> Vec<K>
    where
        T: RelationTree<Key = K> + ?Sized,
    {
        self.try_linked_targets(tree, key).unwrap_or_else(|err| {
            log::warn!("{err}");
            Vec::new()
        })
    }

    /// Returns the components currently linked through `key`.
    ///
    /// - Parent-role keys yield the single linked target, if any.
    /// - Child-role keys yield, in document order, every component below the
    ///   owner whose mirrored parent-role slot links back to this owner
    ///   through this exact definition. Passthrough nodes are always searched
    ///   through; other nodes are searched through except for
    ///   [`RelationKind::ChildNonVirtualNode`]; components are searched
    ///   through only for [`RelationKind::Descendant`].
    ///
    /// # Errors
    ///
    /// Returns [`UnknownRelationKey`] if `key` is not declared.
    pub fn try_linked_targets<T>(
        &self,
        tree: &T,
        key: &RelationKey,
    ) -> Result<Vec<K>, UnknownRelationKey>
    where
        T: RelationTree<Key = K> + ?Sized,
    {
        let slot = self
            .slot(key)
            .ok_or_else(|| UnknownRelationKey(key.clone()))?;
        if slot.kind.is_parent_role() {
            return Ok(self.link(slot).map(Link::target).into_iter().collect());
        }
        let Some(definition) = self.group().and_then(|g| g.definition(slot)) else {
            return Ok(Vec::new());
        };

        let owner = self.owner();
        let mirror = slot.kind.dual();
        let into_components = slot.kind == RelationKind::Descendant;
        let into_other = slot.kind != RelationKind::ChildNonVirtualNode;
        let mut found = Vec::new();
        walk_descendants(tree, owner, &mut |node, node_kind| match node_kind {
            NodeKind::Passthrough => true,
            NodeKind::Component => {
                if tree
                    .relation(node)
                    .is_some_and(|r| r.links_back(mirror, owner, definition))
                {
                    found.push(node);
                }
                into_components
            }
            NodeKind::Other => into_other,
        });
        Ok(found)
    }
}
