// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Benchmarks for `understory_relation`.

use criterion::{BatchSize, BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use std::rc::Rc;
use std::vec::Vec;

use understory_relation::{
    CapabilityId, CapabilitySource, NodeKind, Relation, RelationDefinition, RelationGroup,
    RelationKey, RelationKind, RelationTree, attach_subtree, detach_subtree,
};

const LIST: CapabilityId = CapabilityId::new(0);
const ITEM: CapabilityId = CapabilityId::new(1);

struct Node {
    parent: Option<u32>,
    children: Vec<u32>,
    kind: NodeKind,
    capability: Option<CapabilityId>,
    relation: Option<Relation<u32>>,
}

#[derive(Default)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn push(&mut self, parent: Option<u32>, kind: NodeKind) -> u32 {
        let id = self.nodes.len() as u32;
        self.nodes.push(Node {
            parent,
            children: Vec::new(),
            kind,
            capability: None,
            relation: None,
        });
        if let Some(parent) = parent {
            self.nodes[parent as usize].children.push(id);
        }
        id
    }

    fn push_component(
        &mut self,
        parent: Option<u32>,
        capability: CapabilityId,
        group: &Option<Rc<RelationGroup<u32>>>,
    ) -> u32 {
        let id = self.push(parent, NodeKind::Component);
        let node = &mut self.nodes[id as usize];
        node.capability = Some(capability);
        node.relation = Some(Relation::new(id, group.clone()));
        id
    }
}

impl RelationTree for Tree {
    type Key = u32;

    fn parent(&self, node: u32) -> Option<u32> {
        self.nodes[node as usize].parent
    }

    fn children(&self, node: u32) -> impl Iterator<Item = u32> + '_ {
        self.nodes[node as usize].children.iter().copied()
    }

    fn node_kind(&self, node: u32) -> NodeKind {
        self.nodes[node as usize].kind
    }

    fn relation(&self, node: u32) -> Option<&Relation<u32>> {
        self.nodes[node as usize].relation.as_ref()
    }

    fn relation_mut(&mut self, node: u32) -> Option<&mut Relation<u32>> {
        self.nodes[node as usize].relation.as_mut()
    }
}

impl CapabilitySource<u32> for Tree {
    fn resolve(&self, _context: u32, _name: &str, _domain: Option<&str>) -> Option<CapabilityId> {
        None
    }

    fn satisfies(&self, component: u32, capability: CapabilityId) -> bool {
        self.nodes[component as usize].capability == Some(capability)
    }
}

/// A list with `items` children, each wrapped in a passthrough node and an
/// element, every item declaring both a parent and an ancestor relation.
fn build_list(items: u32) -> Tree {
    let list_group = RelationGroup::build([
        ("items", RelationDefinition::new(RelationKind::ChildComponent, ITEM)),
        ("all", RelationDefinition::new(RelationKind::Descendant, ITEM)),
    ]);
    let item_group = RelationGroup::build([
        ("list", RelationDefinition::new(RelationKind::ParentComponent, LIST)),
        ("root", RelationDefinition::new(RelationKind::Ancestor, LIST)),
    ]);

    let mut tree = Tree::default();
    let list = tree.push_component(None, LIST, &list_group);
    for _ in 0..items {
        let slot = tree.push(Some(list), NodeKind::Passthrough);
        let cell = tree.push(Some(slot), NodeKind::Other);
        tree.push_component(Some(cell), ITEM, &item_group);
    }
    tree
}

fn bench_relation(c: &mut Criterion) {
    let mut group = c.benchmark_group("relation");

    for &items in &[16_u32, 256, 4096] {
        group.bench_with_input(BenchmarkId::new("attach_subtree", items), &items, |b, &n| {
            b.iter_batched(
                || build_list(n),
                |mut tree| {
                    let events = attach_subtree(&mut tree, 0);
                    black_box(events.len());
                    black_box(tree);
                },
                BatchSize::LargeInput,
            )
        });

        let mut attached = build_list(items);
        let events = attach_subtree(&mut attached, 0);
        events.dispatch(&attached);
        let items_key = RelationKey::from("items");
        let all_key = RelationKey::from("all");
        let list = attached.nodes[0].relation.as_ref().expect("list has relations");
        group.bench_with_input(BenchmarkId::new("linked_children", items), &items, |b, _| {
            b.iter(|| black_box(list.linked_targets(&attached, &items_key)));
        });
        group.bench_with_input(BenchmarkId::new("linked_descendants", items), &items, |b, _| {
            b.iter(|| black_box(list.linked_targets(&attached, &all_key)));
        });

        group.bench_with_input(BenchmarkId::new("detach_subtree", items), &items, |b, &n| {
            b.iter_batched(
                || {
                    let mut tree = build_list(n);
                    let events = attach_subtree(&mut tree, 0);
                    events.dispatch(&tree);
                    tree
                },
                |mut tree| {
                    let events = detach_subtree(&mut tree, 0);
                    black_box(events.len());
                    black_box(tree);
                },
                BatchSize::LargeInput,
            )
        });
    }

    group.finish();
}

criterion_group!(benches, bench_relation);
criterion_main!(benches);
