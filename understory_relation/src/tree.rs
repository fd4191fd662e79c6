// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host tree access and walk helpers.
//!
//! The relation algorithm never owns the tree. It reads shape and relation
//! state through [`RelationTree`], which hosts implement over their own node
//! storage (an arena, an ECS, a slot map, ...).

use core::fmt;

use crate::relation::Relation;

/// How a node takes part in relation search.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Shapes the tree but is transparent to search: skipped going up,
    /// always descended into going down.
    Passthrough,
    /// A component; may declare relations and satisfy capabilities.
    Component,
    /// Any other node, such as a native element.
    Other,
}

/// Read access to the host tree, plus storage for per-component relations.
pub trait RelationTree {
    /// Node identifier.
    type Key: Copy + Eq + fmt::Debug;

    /// Returns the parent of `node`, or `None` at a root or a detached node.
    fn parent(&self, node: Self::Key) -> Option<Self::Key>;

    /// Returns the children of `node` in document order.
    fn children(&self, node: Self::Key) -> impl Iterator<Item = Self::Key> + '_;

    /// Classifies `node`.
    fn node_kind(&self, node: Self::Key) -> NodeKind;

    /// Returns the relation state of a component, if it has any.
    fn relation(&self, node: Self::Key) -> Option<&Relation<Self::Key>>;

    /// Returns the relation state of a component for update.
    fn relation_mut(&mut self, node: Self::Key) -> Option<&mut Relation<Self::Key>>;
}

/// Iterator over the non-passthrough ancestors of a node, nearest first.
///
/// Created by [`ancestors`].
pub struct Ancestors<'a, T: RelationTree + ?Sized> {
    tree: &'a T,
    current: Option<T::Key>,
}

impl<T: RelationTree + ?Sized> Iterator for Ancestors<'_, T> {
    type Item = (T::Key, NodeKind);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let node = self.tree.parent(self.current?);
            self.current = node;
            let node = node?;
            match self.tree.node_kind(node) {
                NodeKind::Passthrough => continue,
                kind => return Some((node, kind)),
            }
        }
    }
}

impl<T: RelationTree + ?Sized> fmt::Debug for Ancestors<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ancestors")
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}

/// Walks up from `node` (exclusive), skipping passthrough nodes.
pub fn ancestors<T: RelationTree + ?Sized>(tree: &T, node: T::Key) -> Ancestors<'_, T> {
    Ancestors {
        tree,
        current: Some(node),
    }
}

/// Depth-first, pre-order walk over the descendants of `root` (exclusive).
///
/// `visit` sees each node with its kind and returns whether to descend into it.
pub fn walk_descendants<T, F>(tree: &T, root: T::Key, visit: &mut F)
where
    T: RelationTree + ?Sized,
    F: FnMut(T::Key, NodeKind) -> bool,
{
    for child in tree.children(root) {
        if visit(child, tree.node_kind(child)) {
            walk_descendants(tree, child, visit);
        }
    }
}
