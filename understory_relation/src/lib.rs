// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_relation --heading-base-level=0

//! Understory Relation: typed, capability-gated relations between components.
//!
//! Components in a UI tree often need to find each other: a list item wants
//! its list, a form field wants the form it lives in, a tab bar wants every
//! tab below it. This crate keeps those links up to date as components are
//! attached to and detached from the tree, and tells both sides when a link
//! appears, changes or goes away.
//!
//! ## Concepts
//!
//! - A [`RelationDefinition`] declares one relation: a [`RelationKind`], a
//!   [`RelationTarget`] naming the capability the other side must satisfy,
//!   and optional listeners.
//! - A [`RelationGroup`] is the keyed table of definitions of one component
//!   type. It is built once and shared by every instance through an `Rc`.
//! - A [`Relation`] is the state of one instance: the group plus a link table
//!   with one entry per declared slot.
//!
//! Kinds come in dual pairs. The parent-seeking side
//! ([`RelationKind::ParentComponent`], [`RelationKind::ParentNonVirtualNode`],
//! [`RelationKind::Ancestor`]) is resolved by a search up the tree and stored.
//! The child side is never stored: [`Relation::linked_targets`] recomputes it
//! by asking each candidate below the owner whether it links back.
//!
//! A link forms only when both sides agree: the ancestor satisfies the
//! capability the child asks for, and the ancestor declares the dual kind for
//! a capability the child satisfies.
//!
//! ## Host integration
//!
//! The crate does not own the tree. Hosts implement [`RelationTree`] (shape
//! and relation storage) and [`CapabilitySource`] (capability resolution),
//! then call [`attach`]/[`detach`] (or [`relink`] for a single kind) after
//! each structural change. These return a [`LinkEvents`] batch; the host
//! releases its borrows and dispatches it. Hosts whose listeners mutate the
//! tree keep it in a `RefCell` and use [`LinkEvents::dispatch_shared`].
//! Events a listener has made stale are skipped, so listeners always agree
//! with the link table.
//!
//! ## Quick Start
//!
//! ```rust
//! use understory_relation::{
//!     CapabilityId, CapabilitySource, NodeKind, Relation, RelationDefinition,
//!     RelationGroup, RelationKind, RelationTree, attach_subtree,
//! };
//!
//! const LIST: CapabilityId = CapabilityId::new(0);
//! const ITEM: CapabilityId = CapabilityId::new(1);
//!
//! struct Node {
//!     parent: Option<usize>,
//!     children: Vec<usize>,
//!     capability: CapabilityId,
//!     relation: Relation<usize>,
//! }
//!
//! struct Tree(Vec<Node>);
//!
//! impl RelationTree for Tree {
//!     type Key = usize;
//!     fn parent(&self, node: usize) -> Option<usize> { self.0[node].parent }
//!     fn children(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
//!         self.0[node].children.iter().copied()
//!     }
//!     fn node_kind(&self, _: usize) -> NodeKind { NodeKind::Component }
//!     fn relation(&self, node: usize) -> Option<&Relation<usize>> {
//!         Some(&self.0[node].relation)
//!     }
//!     fn relation_mut(&mut self, node: usize) -> Option<&mut Relation<usize>> {
//!         Some(&mut self.0[node].relation)
//!     }
//! }
//!
//! impl CapabilitySource<usize> for Tree {
//!     fn resolve(&self, _: usize, _: &str, _: Option<&str>) -> Option<CapabilityId> { None }
//!     fn satisfies(&self, node: usize, capability: CapabilityId) -> bool {
//!         self.0[node].capability == capability
//!     }
//! }
//!
//! let list_group = RelationGroup::build([(
//!     "items",
//!     RelationDefinition::new(RelationKind::ChildComponent, ITEM),
//! )]);
//! let item_group = RelationGroup::build([(
//!     "list",
//!     RelationDefinition::builder(RelationKind::ParentComponent, LIST)
//!         .linked(|item, list| {
//!             assert_eq!((item, list), (1, 0));
//!             Ok(())
//!         })
//!         .build(),
//! )]);
//!
//! let mut tree = Tree(vec![
//!     Node { parent: None, children: vec![1], capability: LIST, relation: Relation::new(0, list_group) },
//!     Node { parent: Some(0), children: vec![], capability: ITEM, relation: Relation::new(1, item_group) },
//! ]);
//!
//! let events = attach_subtree(&mut tree, 0);
//! assert_eq!(events.len(), 1);
//! assert_eq!(events.dispatch(&tree), 0);
//!
//! assert_eq!(tree.0[0].relation.linked_targets(&tree, &"items".into()), [1]);
//! assert_eq!(tree.0[1].relation.linked_targets(&tree, &"list".into()), [0]);
//! ```
//!
//! ## Logging
//!
//! Diagnostics go through the [`log`](https://docs.rs/log) facade: failing
//! listeners at `error`, queries for unknown keys at `warn`, link transitions
//! at `trace`. The crate never installs a logger.
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`. The default `std` feature only
//! adds panic isolation around listeners.

#![no_std]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

mod capability;
mod definition;
mod events;
mod group;
mod kind;
mod link;
mod query;
mod relation;
mod tree;

pub use capability::{CapabilityId, CapabilityRegistry, CapabilitySource};
pub use definition::{
    LinkFailedListener, RelationDefinition, RelationDefinitionBuilder, RelationListener,
    RelationTarget,
};
pub use events::{
    CallbackLabel, LinkEvent, LinkEvents, ListenerError, ListenerResult, invoke_listener,
};
pub use group::{AnonymousKey, RelationGroup, RelationKey, Slot};
pub use kind::{KIND_COUNT, ParentKind, ParseRelationKindError, RelationKind};
pub use link::{LinkPhase, attach, attach_subtree, detach, detach_subtree, relink};
pub use query::UnknownRelationKey;
pub use relation::{Link, Relation};
pub use tree::{Ancestors, NodeKind, RelationTree, ancestors, walk_descendants};
