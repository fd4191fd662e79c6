// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The relink pass.
//!
//! Each time a component is attached to or detached from the tree, the host
//! runs [`relink`] once per [`ParentKind`] (or [`attach`]/[`detach`] for all
//! three). A pass resolves every slot of that kind, writes the result into the
//! owner's link table and reports the listener invocations the change implies.
//!
//! ## Matching
//!
//! A candidate ancestor links only if both sides agree:
//!
//! 1. the candidate satisfies the capability the owner's definition targets,
//!    and
//! 2. one of the candidate's reciprocal child-role definitions targets a
//!    capability the owner satisfies. The first such definition, in slot
//!    order, becomes the link's definition.
//!
//! How far up the search goes depends on the kind:
//!
//! - [`ParentKind::ParentComponent`] stops at the nearest component, whether
//!   or not it matches. Other non-passthrough nodes in between are skipped.
//! - [`ParentKind::ParentNonVirtualNode`] stops at the nearest
//!   non-passthrough node. It can only link if that node is a component.
//! - [`ParentKind::Ancestor`] walks all the way to the root. Every match
//!   replaces the previous one, so the outermost matching ancestor wins.
//!
//! A detach pass never searches: every slot of the kind becomes empty.

use alloc::rc::Rc;
use alloc::vec::Vec;
use smallvec::SmallVec;

use crate::capability::{CapabilityId, CapabilitySource};
use crate::definition::{RelationDefinition, RelationTarget};
use crate::events::{CallbackLabel, LinkEvent, LinkEvents, SlotChange};
use crate::group::Slot;
use crate::kind::{ParentKind, RelationKind};
use crate::relation::Link;
use crate::tree::{NodeKind, RelationTree, ancestors, walk_descendants};

/// Whether a pass follows an attach or a detach.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum LinkPhase {
    /// The owner was just attached; search for targets.
    Attach,
    /// The owner was just detached; clear every link.
    Detach,
}

/// Re-resolves every `kind` slot of `owner` and returns the resulting events.
///
/// The link table is updated before this returns; the listeners run only when
/// the returned batch is dispatched. Components without relation state, or
/// without definitions of `kind`, yield an empty batch.
pub fn relink<H>(
    host: &mut H,
    owner: H::Key,
    kind: ParentKind,
    phase: LinkPhase,
) -> LinkEvents<H::Key>
where
    H: RelationTree + CapabilitySource<H::Key> + ?Sized,
{
    let mut events = LinkEvents::new();
    let Some(group) = host.relation(owner).and_then(|r| r.group()).map(Rc::clone) else {
        return events;
    };
    let definitions = group.definitions(kind.kind());
    if definitions.is_empty() {
        return events;
    }

    let found: SmallVec<[Option<Link<H::Key>>; 1]> = definitions
        .iter()
        .map(|def| match phase {
            LinkPhase::Attach => find_link(&*host, owner, kind, def),
            LinkPhase::Detach => None,
        })
        .collect();

    let Some(relation) = host.relation_mut(owner) else {
        return events;
    };
    let entries = relation.links_mut(kind.kind());
    let slots = definitions.iter().zip(found).zip(entries.iter_mut());
    for (index, ((def, new_link), entry)) in slots.enumerate() {
        let old_link = core::mem::replace(entry, new_link);
        let slot = Slot {
            kind: kind.kind(),
            index,
        };
        record_transition(&mut events, owner, slot, def, old_link, entry.as_ref(), phase);
    }
    events
}

/// Runs an attach pass for every parent-seeking kind of `owner`.
pub fn attach<H>(host: &mut H, owner: H::Key) -> LinkEvents<H::Key>
where
    H: RelationTree + CapabilitySource<H::Key> + ?Sized,
{
    relink_all(host, owner, LinkPhase::Attach)
}

/// Runs a detach pass for every parent-seeking kind of `owner`.
pub fn detach<H>(host: &mut H, owner: H::Key) -> LinkEvents<H::Key>
where
    H: RelationTree + CapabilitySource<H::Key> + ?Sized,
{
    relink_all(host, owner, LinkPhase::Detach)
}

/// Runs [`attach`] for `root` and every component below it, in document order.
///
/// Call this after inserting a subtree.
pub fn attach_subtree<H>(host: &mut H, root: H::Key) -> LinkEvents<H::Key>
where
    H: RelationTree + CapabilitySource<H::Key> + ?Sized,
{
    relink_subtree(host, root, LinkPhase::Attach)
}

/// Runs [`detach`] for `root` and every component below it, in document order.
///
/// Call this after removing a subtree. Links inside the subtree are cleared
/// too; they are found again when the subtree is attached somewhere.
pub fn detach_subtree<H>(host: &mut H, root: H::Key) -> LinkEvents<H::Key>
where
    H: RelationTree + CapabilitySource<H::Key> + ?Sized,
{
    relink_subtree(host, root, LinkPhase::Detach)
}

fn relink_all<H>(host: &mut H, owner: H::Key, phase: LinkPhase) -> LinkEvents<H::Key>
where
    H: RelationTree + CapabilitySource<H::Key> + ?Sized,
{
    let mut events = LinkEvents::new();
    for kind in ParentKind::ALL {
        events.append(relink(host, owner, kind, phase));
    }
    events
}

fn relink_subtree<H>(host: &mut H, root: H::Key, phase: LinkPhase) -> LinkEvents<H::Key>
where
    H: RelationTree + CapabilitySource<H::Key> + ?Sized,
{
    let tree = &*host;
    let has_relation = |node: H::Key| {
        tree.node_kind(node) == NodeKind::Component && tree.relation(node).is_some()
    };
    let mut owners = Vec::new();
    if has_relation(root) {
        owners.push(root);
    }
    walk_descendants(tree, root, &mut |node, _| {
        if has_relation(node) {
            owners.push(node);
        }
        true
    });

    let mut events = LinkEvents::new();
    for owner in owners {
        events.append(relink_all(host, owner, phase));
    }
    events
}

/// Resolves a target specifier, naming `context` as the resolving component.
pub(crate) fn resolve_target<H, K>(
    host: &H,
    context: K,
    target: &RelationTarget,
) -> Option<CapabilityId>
where
    H: CapabilitySource<K> + ?Sized,
{
    match target {
        RelationTarget::Capability(id) => Some(*id),
        RelationTarget::Named { name, domain } => host.resolve(context, name, domain.as_deref()),
    }
}

fn find_link<H>(
    host: &H,
    owner: H::Key,
    kind: ParentKind,
    def: &RelationDefinition<H::Key>,
) -> Option<Link<H::Key>>
where
    H: RelationTree + CapabilitySource<H::Key> + ?Sized,
{
    let required = resolve_target(host, owner, def.target())?;
    let mut found = None;
    for (node, node_kind) in ancestors(host, owner) {
        if node_kind == NodeKind::Component {
            if host.satisfies(node, required)
                && let Some(reciprocal) = reciprocal_definition(host, node, owner, kind.child())
            {
                found = Some(Link::new(node, reciprocal));
            }
            if kind == ParentKind::ParentComponent {
                break;
            }
        }
        if kind == ParentKind::ParentNonVirtualNode {
            break;
        }
    }
    found
}

fn reciprocal_definition<H>(
    host: &H,
    candidate: H::Key,
    owner: H::Key,
    child_kind: RelationKind,
) -> Option<Rc<RelationDefinition<H::Key>>>
where
    H: RelationTree + CapabilitySource<H::Key> + ?Sized,
{
    host.relation(candidate)?
        .definitions(child_kind)
        .iter()
        .find(|def| {
            resolve_target(host, candidate, def.target())
                .is_some_and(|required| host.satisfies(owner, required))
        })
        .cloned()
}

fn record_transition<K>(
    events: &mut LinkEvents<K>,
    owner: K,
    slot: Slot,
    def: &Rc<RelationDefinition<K>>,
    old_link: Option<Link<K>>,
    new_link: Option<&Link<K>>,
    phase: LinkPhase,
) where
    K: Copy + Eq + core::fmt::Debug,
{
    let changed = match (&old_link, new_link) {
        (Some(old), Some(new)) => !old.same_as(new),
        (None, None) => false,
        _ => true,
    };
    if changed {
        log::trace!(
            "{} relation of {owner:?}: {:?} -> {:?}",
            def.kind(),
            old_link.as_ref().map(Link::target),
            new_link.map(Link::target),
        );
    }

    let change = |link: Option<&Link<K>>| SlotChange {
        owner,
        slot,
        link: link.cloned(),
    };
    let mut both = |label: CallbackLabel,
                    present: fn(&RelationDefinition<K>) -> bool,
                    link: &Link<K>| {
        if present(link.definition()) {
            events.push(LinkEvent::new(
                label,
                link.target(),
                Some(owner),
                Rc::clone(link.definition()),
                change(Some(link)),
            ));
        }
        if present(def) {
            events.push(LinkEvent::new(
                label,
                owner,
                Some(link.target()),
                Rc::clone(def),
                change(Some(link)),
            ));
        }
    };

    if let Some(old) = &old_link {
        if changed {
            both(CallbackLabel::Unlinked, |d| d.unlinked().is_some(), old);
        } else {
            both(CallbackLabel::LinkChanged, |d| d.link_changed().is_some(), old);
        }
    }
    if let Some(new) = new_link
        && changed
    {
        both(CallbackLabel::Linked, |d| d.linked().is_some(), new);
    }
    if phase == LinkPhase::Attach && new_link.is_none() && def.has_link_failed() {
        events.push(LinkEvent::new(
            CallbackLabel::LinkFailed,
            owner,
            None,
            Rc::clone(def),
            change(None),
        ));
    }
}
