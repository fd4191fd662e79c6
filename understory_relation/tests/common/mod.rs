// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A small arena tree host shared by the integration tests.

#![allow(dead_code, reason = "not every test binary uses every helper")]

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use understory_relation::{
    CapabilityId, CapabilityRegistry, CapabilitySource, ListenerResult, NodeKind, Relation,
    RelationDefinition, RelationGroup, RelationTree,
};

/// Node handle into [`Host`].
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(pub(crate) usize);

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
    capabilities: Vec<CapabilityId>,
    relation: Option<Relation<NodeId>>,
}

/// Arena tree with named capabilities.
#[derive(Default)]
pub(crate) struct Host {
    nodes: Vec<Node>,
    pub(crate) registry: CapabilityRegistry,
}

impl Host {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Registers (or looks up) a capability in the default domain.
    pub(crate) fn capability(&mut self, name: &str) -> CapabilityId {
        self.registry.register(name, None)
    }

    fn push(&mut self, parent: Option<NodeId>, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: None,
            children: Vec::new(),
            kind,
            capabilities: Vec::new(),
            relation: None,
        });
        if let Some(parent) = parent {
            self.insert(parent, id);
        }
        id
    }

    /// Adds a component providing the named capabilities and declaring `defs`.
    ///
    /// The node is linked into the tree but no relink pass runs.
    pub(crate) fn component(
        &mut self,
        parent: Option<NodeId>,
        provides: &[&str],
        defs: Vec<(&str, RelationDefinition<NodeId>)>,
    ) -> NodeId {
        self.shared_component(parent, provides, RelationGroup::build(defs))
    }

    /// Like [`Host::component`], with an existing (possibly shared) group.
    pub(crate) fn shared_component(
        &mut self,
        parent: Option<NodeId>,
        provides: &[&str],
        group: Option<Rc<RelationGroup<NodeId>>>,
    ) -> NodeId {
        let id = self.push(parent, NodeKind::Component);
        let capabilities: Vec<_> = provides.iter().map(|name| self.capability(name)).collect();
        let node = &mut self.nodes[id.0];
        node.capabilities = capabilities;
        node.relation = Some(Relation::new(id, group));
        id
    }

    /// Makes `node` provide `capability` as well.
    pub(crate) fn provide(&mut self, node: NodeId, capability: CapabilityId) {
        self.nodes[node.0].capabilities.push(capability);
    }

    /// Adds a structural passthrough node.
    pub(crate) fn passthrough(&mut self, parent: Option<NodeId>) -> NodeId {
        self.push(parent, NodeKind::Passthrough)
    }

    /// Adds a plain element.
    pub(crate) fn element(&mut self, parent: Option<NodeId>) -> NodeId {
        self.push(parent, NodeKind::Other)
    }

    /// Appends `child` to `parent`'s children.
    pub(crate) fn insert(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Unlinks `child` from its parent.
    pub(crate) fn remove(&mut self, child: NodeId) {
        if let Some(parent) = self.nodes[child.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != child);
        }
    }

    pub(crate) fn state(&self, node: NodeId) -> &Relation<NodeId> {
        self.nodes[node.0].relation.as_ref().expect("node is a component")
    }

    pub(crate) fn state_mut(&mut self, node: NodeId) -> &mut Relation<NodeId> {
        self.nodes[node.0].relation.as_mut().expect("node is a component")
    }

    /// Shorthand for [`Relation::linked_targets`] with a named key.
    pub(crate) fn targets(&self, node: NodeId, key: &str) -> Vec<NodeId> {
        self.state(node).linked_targets(self, &key.into())
    }
}

impl RelationTree for Host {
    type Key = NodeId;

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    fn children(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes[node.0].children.iter().copied()
    }

    fn node_kind(&self, node: NodeId) -> NodeKind {
        self.nodes[node.0].kind
    }

    fn relation(&self, node: NodeId) -> Option<&Relation<NodeId>> {
        self.nodes[node.0].relation.as_ref()
    }

    fn relation_mut(&mut self, node: NodeId) -> Option<&mut Relation<NodeId>> {
        self.nodes[node.0].relation.as_mut()
    }
}

impl CapabilitySource<NodeId> for Host {
    fn resolve(&self, _context: NodeId, name: &str, domain: Option<&str>) -> Option<CapabilityId> {
        self.registry.resolve(name, domain)
    }

    fn satisfies(&self, component: NodeId, capability: CapabilityId) -> bool {
        self.nodes[component.0].capabilities.contains(&capability)
    }
}

/// Shared call log for listeners.
pub(crate) type Calls = Rc<RefCell<Vec<String>>>;

/// Returns a two-argument listener appending `"{tag} {receiver:?} {other:?}"`.
pub(crate) fn record(
    calls: &Calls,
    tag: &'static str,
) -> impl Fn(NodeId, NodeId) -> ListenerResult + use<> {
    let calls = Rc::clone(calls);
    move |receiver, other| {
        calls.borrow_mut().push(format!("{tag} {receiver:?} {other:?}"));
        Ok(())
    }
}

/// Returns a link-failed listener appending `"{tag} {receiver:?}"`.
pub(crate) fn record_failed(
    calls: &Calls,
    tag: &'static str,
) -> impl Fn(NodeId) -> ListenerResult + use<> {
    let calls = Rc::clone(calls);
    move |receiver| {
        calls.borrow_mut().push(format!("{tag} {receiver:?}"));
        Ok(())
    }
}

/// Drains the call log.
pub(crate) fn take(calls: &Calls) -> Vec<String> {
    std::mem::take(&mut *calls.borrow_mut())
}
