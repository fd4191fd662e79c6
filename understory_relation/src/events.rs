// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Listener events and isolated dispatch.
//!
//! A relink pass does not call listeners itself. It records what should fire
//! into a [`LinkEvents`] batch, in firing order, and hands the batch back. The
//! host drops whatever borrow it used to run the pass and then dispatches the
//! batch; listeners are therefore free to mutate the tree and trigger further
//! passes.
//!
//! Each event remembers the slot transition it reports. Before an event fires,
//! dispatch checks it against the host's current link table and skips it once
//! a listener earlier in the batch has made it stale. A component detached by
//! such a listener never hears `linked` after its `unlinked`.
//!
//! - [`LinkEvents::dispatch`] checks against a tree the caller lends for the
//!   whole batch.
//! - [`LinkEvents::dispatch_shared`] borrows a `RefCell`-held tree only for
//!   each check, so listeners may borrow it mutably.
//! - [`LinkEvents::dispatch_if`] takes the check as a closure.
//!
//! Every listener runs through [`invoke_listener`]:
//!
//! - An `Err` result is logged with the event's [`CallbackLabel`].
//! - With the `std` feature, a panic is caught and reported the same way.
//! - Either way the failure is contained; the next event still runs.

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use crate::definition::RelationDefinition;
use crate::group::Slot;
use crate::relation::Link;
use crate::tree::RelationTree;

/// The result type listeners return.
pub type ListenerResult = Result<(), ListenerError>;

/// A failure reported by a listener.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListenerError {
    message: String,
}

impl ListenerError {
    /// Creates an error carrying `message`.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the error message.
    #[must_use]
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ListenerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl core::error::Error for ListenerError {}

impl From<&str> for ListenerError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for ListenerError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

/// Which listener an event invokes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CallbackLabel {
    /// A new link formed.
    Linked,
    /// An existing link was confirmed by a relink pass.
    LinkChanged,
    /// An existing link broke or was replaced.
    Unlinked,
    /// An attach pass found nothing to link to.
    LinkFailed,
}

impl CallbackLabel {
    /// Returns the label used when reporting a failure of this listener.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Linked => "Relation Linked Callback",
            Self::LinkChanged => "Relation Link Changed Callback",
            Self::Unlinked => "Relation Unlinked Callback",
            Self::LinkFailed => "Relation Link Failed Callback",
        }
    }
}

impl fmt::Display for CallbackLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runs `listener`, reporting and containing any failure.
///
/// The returned result is informational: callers are expected to carry on
/// regardless of it.
pub fn invoke_listener(
    label: CallbackLabel,
    listener: impl FnOnce() -> ListenerResult,
) -> ListenerResult {
    let result = call_isolated(listener);
    if let Err(err) = &result {
        log::error!("{label} failed: {err}");
    }
    result
}

#[cfg(feature = "std")]
fn call_isolated(listener: impl FnOnce() -> ListenerResult) -> ListenerResult {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    match catch_unwind(AssertUnwindSafe(listener)) {
        Ok(result) => result,
        Err(payload) => {
            let message = if let Some(s) = payload.downcast_ref::<&str>() {
                String::from(*s)
            } else if let Some(s) = payload.downcast_ref::<String>() {
                s.clone()
            } else {
                String::from("listener panicked")
            };
            Err(ListenerError::new(message))
        }
    }
}

#[cfg(not(feature = "std"))]
fn call_isolated(listener: impl FnOnce() -> ListenerResult) -> ListenerResult {
    listener()
}

/// The parent-role slot an event reports on, and the link involved.
///
/// For `Unlinked` and `LinkChanged` this is the old link, for `Linked` the new
/// one. `LinkFailed` carries none.
pub(crate) struct SlotChange<K> {
    pub(crate) owner: K,
    pub(crate) slot: Slot,
    pub(crate) link: Option<Link<K>>,
}

/// One pending listener invocation.
pub struct LinkEvent<K> {
    label: CallbackLabel,
    receiver: K,
    other: Option<K>,
    definition: Rc<RelationDefinition<K>>,
    change: SlotChange<K>,
}

impl<K: Copy> LinkEvent<K> {
    pub(crate) fn new(
        label: CallbackLabel,
        receiver: K,
        other: Option<K>,
        definition: Rc<RelationDefinition<K>>,
        change: SlotChange<K>,
    ) -> Self {
        Self {
            label,
            receiver,
            other,
            definition,
            change,
        }
    }

    /// Returns which listener this event invokes.
    #[must_use]
    #[inline]
    pub fn label(&self) -> CallbackLabel {
        self.label
    }

    /// Returns the component the listener runs for.
    #[must_use]
    #[inline]
    pub fn receiver(&self) -> K {
        self.receiver
    }

    /// Returns the component on the far side of the link.
    ///
    /// `None` for [`CallbackLabel::LinkFailed`].
    #[must_use]
    #[inline]
    pub fn other(&self) -> Option<K> {
        self.other
    }

    /// Returns the definition whose listener runs.
    #[must_use]
    #[inline]
    pub fn definition(&self) -> &Rc<RelationDefinition<K>> {
        &self.definition
    }

    /// Invokes the listener through [`invoke_listener`].
    pub fn fire(&self) -> ListenerResult {
        let def = &self.definition;
        let listener = match self.label {
            CallbackLabel::Linked => def.linked(),
            CallbackLabel::LinkChanged => def.link_changed(),
            CallbackLabel::Unlinked => def.unlinked(),
            CallbackLabel::LinkFailed => {
                return match def.link_failed() {
                    Some(f) => invoke_listener(self.label, || f(self.receiver)),
                    None => Ok(()),
                };
            }
        };
        match (listener, self.other) {
            (Some(f), Some(other)) => invoke_listener(self.label, || f(self.receiver, other)),
            _ => Ok(()),
        }
    }
}

impl<K: Copy + Eq + fmt::Debug> LinkEvent<K> {
    /// Returns the component whose parent-role slot this event reports on.
    #[must_use]
    #[inline]
    pub fn owner(&self) -> K {
        self.change.owner
    }

    /// Returns the slot this event reports on.
    #[must_use]
    #[inline]
    pub fn slot(&self) -> Slot {
        self.change.slot
    }

    /// Returns `true` if `tree`'s link table still agrees with this event.
    ///
    /// - `Linked` and `LinkChanged` need the slot to still hold the link.
    /// - `Unlinked` needs the slot to no longer hold the old link.
    /// - `LinkFailed` needs the slot to still be empty.
    ///
    /// An owner without relation state counts as having an empty slot.
    #[must_use]
    pub fn is_current<T>(&self, tree: &T) -> bool
    where
        T: RelationTree<Key = K> + ?Sized,
    {
        let current = tree
            .relation(self.change.owner)
            .and_then(|relation| relation.link(self.change.slot));
        match (self.label, &self.change.link) {
            (CallbackLabel::Linked | CallbackLabel::LinkChanged, Some(link)) => {
                current.is_some_and(|current| current.same_as(link))
            }
            (CallbackLabel::Unlinked, Some(link)) => {
                !current.is_some_and(|current| current.same_as(link))
            }
            _ => current.is_none(),
        }
    }
}

impl<K: fmt::Debug> fmt::Debug for LinkEvent<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkEvent")
            .field("label", &self.label)
            .field("receiver", &self.receiver)
            .field("other", &self.other)
            .field("kind", &self.definition.kind())
            .finish()
    }
}

/// An ordered batch of pending listener invocations.
#[must_use = "listeners only run when the events are dispatched"]
pub struct LinkEvents<K> {
    events: Vec<LinkEvent<K>>,
}

impl<K> Default for LinkEvents<K> {
    fn default() -> Self {
        Self { events: Vec::new() }
    }
}

impl<K: Copy> LinkEvents<K> {
    /// Creates an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, event: LinkEvent<K>) {
        self.events.push(event);
    }

    /// Appends another batch, keeping order.
    pub fn append(&mut self, mut other: Self) {
        self.events.append(&mut other.events);
    }

    /// Returns the number of pending events.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns `true` if nothing is pending.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Iterates over the pending events in firing order.
    pub fn iter(&self) -> core::slice::Iter<'_, LinkEvent<K>> {
        self.events.iter()
    }

    /// Fires, in order, every event for which `is_current` returns `true`,
    /// and returns how many listeners failed.
    ///
    /// `is_current` runs right before its event would fire, after every
    /// earlier listener has returned. A failing listener never stops the ones
    /// after it.
    pub fn dispatch_if(self, mut is_current: impl FnMut(&LinkEvent<K>) -> bool) -> usize {
        let mut failures = 0;
        for event in &self.events {
            if !is_current(event) {
                log::trace!("skipping stale {} for slot {:?}", event.label, event.change.slot);
                continue;
            }
            if event.fire().is_err() {
                failures += 1;
            }
        }
        failures
    }
}

impl<K: Copy + Eq + fmt::Debug> LinkEvents<K> {
    /// Fires every event that is still current in `tree` and returns how many
    /// listeners failed.
    ///
    /// `tree` stays borrowed for the whole batch, so listeners cannot reach
    /// it. Hosts whose listeners mutate the tree use
    /// [`dispatch_shared`](Self::dispatch_shared).
    pub fn dispatch<T>(self, tree: &T) -> usize
    where
        T: RelationTree<Key = K> + ?Sized,
    {
        self.dispatch_if(|event| event.is_current(tree))
    }

    /// Like [`dispatch`](Self::dispatch), borrowing `tree` only while each
    /// event is checked.
    ///
    /// # Panics
    ///
    /// Panics if `tree` is mutably borrowed when an event is checked, such as
    /// when the caller still holds the borrow it ran the pass with.
    pub fn dispatch_shared<T>(self, tree: &RefCell<T>) -> usize
    where
        T: RelationTree<Key = K> + ?Sized,
    {
        self.dispatch_if(|event| event.is_current(&*tree.borrow()))
    }
}

impl<K: fmt::Debug> fmt::Debug for LinkEvents<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.events).finish()
    }
}

impl<'a, K> IntoIterator for &'a LinkEvents<K> {
    type Item = &'a LinkEvent<K>;
    type IntoIter = core::slice::Iter<'a, LinkEvent<K>>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}
