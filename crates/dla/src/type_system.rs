//! The layout type system: a directed multigraph over abstract layout
//! types, with interned edge labels.
use std::collections::{BTreeMap, BTreeSet};

use cranelift_entity::PrimaryMap;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use decant_ir::{FuncRef, InstId, Module};

use crate::{
    key::{IrSlot, LayoutKey},
    link::{LinkFilter, LinkTag},
    OffsetExpression,
};

/// An opaque reference to a [`LayoutNode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LayoutNodeId(pub u32);
cranelift_entity::entity_impl!(LayoutNodeId);

/// An opaque reference to an interned [`LinkTag`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TagId(pub u32);
cranelift_entity::entity_impl!(TagId);

/// An IR operand slot that observed a layout: the concrete evidence a leaf
/// node must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UseSite {
    pub func: FuncRef,
    pub inst: InstId,
    pub operand: u32,
}

/// One abstract layout type.
///
/// Neighbor sets are ordered by `(neighbor, tag)` so iteration is
/// deterministic; both sides of every edge are kept mirrored by the single
/// insertion primitive in [`TypeSystem`].
#[derive(Debug, Clone, Default)]
pub struct LayoutNode {
    /// The IR use-sites that observed this layout.
    pub accesses: BTreeSet<UseSite>,
    /// Inferred byte width; 0 when unknown.
    pub size: u64,
    pub(crate) successors: BTreeSet<(LayoutNodeId, TagId)>,
    pub(crate) predecessors: BTreeSet<(LayoutNodeId, TagId)>,
}

impl LayoutNode {
    pub fn successors(&self) -> impl Iterator<Item = (LayoutNodeId, TagId)> + '_ {
        self.successors.iter().copied()
    }

    pub fn predecessors(&self) -> impl Iterator<Item = (LayoutNodeId, TagId)> + '_ {
        self.predecessors.iter().copied()
    }

    pub fn is_leaf(&self) -> bool {
        self.successors.is_empty()
    }

    pub fn is_root(&self) -> bool {
        self.predecessors.is_empty()
    }
}

/// The type-system graph. One instance exists per analyzed binary; the DLA
/// pass populates and normalizes it, downstream passes read it.
#[derive(Debug, Default)]
pub struct TypeSystem {
    /// Node arena. Removed nodes leave a dead slot behind so ids stay
    /// stable and iteration order stays creation order.
    pub(crate) nodes: PrimaryMap<LayoutNodeId, Option<LayoutNode>>,

    /// Interned edge labels. Tags are never freed.
    tags: PrimaryMap<TagId, LinkTag>,
    tag_ids: BTreeMap<LinkTag, TagId>,

    pub(crate) key_to_node: BTreeMap<LayoutKey, LayoutNodeId>,
    pub(crate) node_keys: FxHashMap<LayoutNodeId, BTreeSet<LayoutKey>>,
}

impl TypeSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the unique node for `key`, creating it when absent. The
    /// second element is `true` when the node was created by this call.
    pub fn get_or_create(&mut self, key: LayoutKey) -> (LayoutNodeId, bool) {
        if let Some(&node) = self.key_to_node.get(&key) {
            return (node, false);
        }

        let node = self.nodes.push(Some(LayoutNode::default()));
        self.key_to_node.insert(key, node);
        self.node_keys.entry(node).or_default().insert(key);
        (node, true)
    }

    /// Lookup without creation.
    pub fn get(&self, key: LayoutKey) -> Option<LayoutNodeId> {
        self.key_to_node.get(&key).copied()
    }

    /// All nodes keyed by `slot`, expanded across tuple-field indices when
    /// the slot is a function returning an aggregate.
    pub fn types_of(&self, module: &Module, slot: IrSlot) -> SmallVec<[LayoutNodeId; 2]> {
        self.expand_keys(module, slot)
            .into_iter()
            .filter_map(|key| self.get(key))
            .collect()
    }

    /// Like [`Self::types_of`], creating the missing nodes.
    pub fn get_or_create_types(
        &mut self,
        module: &Module,
        slot: IrSlot,
    ) -> SmallVec<[(LayoutNodeId, bool); 2]> {
        self.expand_keys(module, slot)
            .into_iter()
            .map(|key| self.get_or_create(key))
            .collect()
    }

    fn expand_keys(&self, module: &Module, slot: IrSlot) -> SmallVec<[LayoutKey; 2]> {
        match slot {
            IrSlot::Func(func) => {
                let ret_ty = module.funcs[func].sig.ret_ty();
                match module.ctx.type_store.struct_fields(ret_ty) {
                    Some(fields) => (0..fields.len() as u32)
                        .map(|idx| LayoutKey::func_field(module, func, idx))
                        .collect(),
                    None => SmallVec::from_iter([LayoutKey::func(module, func)]),
                }
            }
            IrSlot::Value(func, value) => {
                SmallVec::from_iter([LayoutKey::value(module, func, value)])
            }
        }
    }

    /// Adds an equality link in both directions.
    pub fn add_equality(&mut self, a: LayoutNodeId, b: LayoutNodeId) -> (Option<TagId>, bool) {
        let forward = self.add_link(a, b, LinkTag::Equality);
        let backward = self.add_link(b, a, LinkTag::Equality);
        debug_assert_eq!(forward, backward);
        forward
    }

    pub fn add_inheritance(
        &mut self,
        src: LayoutNodeId,
        tgt: LayoutNodeId,
    ) -> (Option<TagId>, bool) {
        self.add_link(src, tgt, LinkTag::Inheritance)
    }

    pub fn add_instance(
        &mut self,
        src: LayoutNodeId,
        tgt: LayoutNodeId,
        oe: OffsetExpression,
    ) -> (Option<TagId>, bool) {
        self.add_link(src, tgt, LinkTag::instance(oe))
    }

    /// The single edge-insertion primitive: interns the tag and keeps the
    /// successor/predecessor sets mirrored. Self-loops and dead endpoints
    /// are silently dropped.
    fn add_link(
        &mut self,
        src: LayoutNodeId,
        tgt: LayoutNodeId,
        tag: LinkTag,
    ) -> (Option<TagId>, bool) {
        if src == tgt || !self.is_live(src) || !self.is_live(tgt) {
            return (None, false);
        }

        let tag_id = self.intern_tag(tag);
        let new_succ = self.node_mut(src).successors.insert((tgt, tag_id));
        let new_pred = self.node_mut(tgt).predecessors.insert((src, tag_id));
        debug_assert_eq!(new_succ, new_pred);
        (Some(tag_id), new_succ)
    }

    /// Interns `tag`, returning the canonical handle. Duplicate inserts are
    /// no-ops.
    pub fn intern_tag(&mut self, tag: LinkTag) -> TagId {
        if let Some(&tag_id) = self.tag_ids.get(&tag) {
            return tag_id;
        }

        let tag_id = self.tags.push(tag.clone());
        self.tag_ids.insert(tag, tag_id);
        tag_id
    }

    pub fn tag(&self, tag_id: TagId) -> &LinkTag {
        &self.tags[tag_id]
    }

    pub fn is_live(&self, node: LayoutNodeId) -> bool {
        self.nodes
            .get(node)
            .map(|slot| slot.is_some())
            .unwrap_or(false)
    }

    pub fn node(&self, node: LayoutNodeId) -> &LayoutNode {
        self.nodes[node].as_ref().expect("removed layout node")
    }

    fn node_mut(&mut self, node: LayoutNodeId) -> &mut LayoutNode {
        self.nodes[node].as_mut().expect("removed layout node")
    }

    /// Live nodes in creation order.
    pub fn iter_nodes(&self) -> impl Iterator<Item = (LayoutNodeId, &LayoutNode)> {
        self.nodes
            .iter()
            .filter_map(|(id, slot)| slot.as_ref().map(|node| (id, node)))
    }

    pub fn num_nodes(&self) -> usize {
        self.iter_nodes().count()
    }

    /// Successor edges admitted by `filter`, in `(neighbor, tag)` order.
    pub fn succs_filtered(
        &self,
        node: LayoutNodeId,
        filter: LinkFilter,
    ) -> impl Iterator<Item = (LayoutNodeId, TagId)> + '_ {
        self.node(node)
            .successors()
            .filter(move |(_, tag_id)| filter.admits(self.tag(*tag_id).kind()))
    }

    /// Predecessor edges admitted by `filter`, in `(neighbor, tag)` order.
    pub fn preds_filtered(
        &self,
        node: LayoutNodeId,
        filter: LinkFilter,
    ) -> impl Iterator<Item = (LayoutNodeId, TagId)> + '_ {
        self.node(node)
            .predecessors()
            .filter(move |(_, tag_id)| filter.admits(self.tag(*tag_id).kind()))
    }

    pub fn is_leaf_for(&self, node: LayoutNodeId, filter: LinkFilter) -> bool {
        self.succs_filtered(node, filter).next().is_none()
    }

    pub fn is_root_for(&self, node: LayoutNodeId, filter: LinkFilter) -> bool {
        self.preds_filtered(node, filter).next().is_none()
    }

    pub fn keys_of(&self, node: LayoutNodeId) -> Option<&BTreeSet<LayoutKey>> {
        self.node_keys.get(&node)
    }

    pub fn has_keys(&self, node: LayoutNodeId) -> bool {
        self.node_keys
            .get(&node)
            .map(|keys| !keys.is_empty())
            .unwrap_or(false)
    }

    /// Records a use-site observation and grows the known size of `node`.
    pub fn record_access(&mut self, node: LayoutNodeId, site: UseSite, size: u64) {
        let node = self.node_mut(node);
        node.accesses.insert(site);
        node.size = node.size.max(size);
    }

    /// Collapses `from` into `into`: reassigns keys, transplants edges
    /// (dropping self-loops and duplicates, preserving tag identity),
    /// unions accesses, keeps the larger size and removes `from`.
    pub fn merge(&mut self, from: LayoutNodeId, into: LayoutNodeId) {
        if from == into || !self.is_live(from) || !self.is_live(into) {
            return;
        }

        if let Some(keys) = self.node_keys.remove(&from) {
            for key in &keys {
                self.key_to_node.insert(*key, into);
            }
            self.node_keys.entry(into).or_default().extend(keys);
        }

        let from_node = self.nodes[from].take().expect("removed layout node");

        {
            let into_node = self.node_mut(into);
            into_node.accesses.extend(from_node.accesses.iter().copied());
            into_node.size = into_node.size.max(from_node.size);
        }

        for (tgt, tag_id) in from_node.successors {
            self.node_mut(tgt).predecessors.remove(&(from, tag_id));
            if tgt == into {
                continue;
            }
            self.node_mut(into).successors.insert((tgt, tag_id));
            self.node_mut(tgt).predecessors.insert((into, tag_id));
        }

        for (src, tag_id) in from_node.predecessors {
            self.node_mut(src).successors.remove(&(from, tag_id));
            if src == into {
                continue;
            }
            self.node_mut(into).predecessors.insert((src, tag_id));
            self.node_mut(src).successors.insert((into, tag_id));
        }
    }

    /// Merges every node in `nodes` into a deterministically chosen
    /// representative (the smallest id) and returns it.
    pub fn merge_all(&mut self, nodes: &[LayoutNodeId]) -> LayoutNodeId {
        let rep = nodes
            .iter()
            .copied()
            .filter(|&node| self.is_live(node))
            .min()
            .expect("merge_all over no live nodes");

        for &node in nodes {
            self.merge(node, rep);
        }
        rep
    }

    /// Removes `node` and all incident edges; its keys are dropped.
    pub fn remove(&mut self, node: LayoutNodeId) {
        let Some(slot) = self.nodes.get_mut(node) else {
            return;
        };
        let Some(data) = slot.take() else {
            return;
        };

        for (tgt, tag_id) in data.successors {
            self.node_mut(tgt).predecessors.remove(&(node, tag_id));
        }
        for (src, tag_id) in data.predecessors {
            self.node_mut(src).successors.remove(&(node, tag_id));
        }

        if let Some(keys) = self.node_keys.remove(&node) {
            for key in keys {
                self.key_to_node.remove(&key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standalone(ts: &mut TypeSystem) -> LayoutNodeId {
        // Push a keyless node straight into the arena; link-level tests do
        // not need IR-backed keys.
        ts.nodes.push(Some(LayoutNode::default()))
    }

    #[test]
    fn instance_links_are_deduplicated() {
        let mut ts = TypeSystem::new();
        let a = standalone(&mut ts);
        let b = standalone(&mut ts);

        let (tag, was_new) = ts.add_instance(a, b, OffsetExpression::new(0));
        assert!(was_new);
        let first_tag = tag.unwrap();

        let (tag, was_new) = ts.add_instance(a, b, OffsetExpression::new(0));
        assert!(!was_new);
        assert_eq!(tag, Some(first_tag));

        assert_eq!(ts.node(a).successors().count(), 1);
    }

    #[test]
    fn self_links_are_dropped() {
        let mut ts = TypeSystem::new();
        let a = standalone(&mut ts);

        assert_eq!(ts.add_equality(a, a), (None, false));
        assert_eq!(ts.add_inheritance(a, a), (None, false));
        assert!(ts.node(a).is_leaf() && ts.node(a).is_root());
    }

    #[test]
    fn equality_links_go_both_ways() {
        let mut ts = TypeSystem::new();
        let a = standalone(&mut ts);
        let b = standalone(&mut ts);

        ts.add_equality(a, b);
        assert_eq!(ts.node(a).successors().count(), 1);
        assert_eq!(ts.node(a).predecessors().count(), 1);
        assert_eq!(ts.node(b).successors().count(), 1);
        assert_eq!(ts.node(b).predecessors().count(), 1);

        // The reversed insertion changes nothing.
        let before: Vec<_> = ts.node(a).successors().collect();
        ts.add_equality(b, a);
        let after: Vec<_> = ts.node(a).successors().collect();
        assert_eq!(before, after);
    }

    #[test]
    fn merge_transplants_edges_and_drops_self_loops() {
        let mut ts = TypeSystem::new();
        let a = standalone(&mut ts);
        let b = standalone(&mut ts);
        let c = standalone(&mut ts);

        ts.add_instance(a, b, OffsetExpression::new(8));
        ts.add_inheritance(b, c);

        ts.merge(b, a);

        assert!(!ts.is_live(b));
        // a→b became a self loop and was dropped; b→c moved to a→c.
        let succs: Vec<_> = ts.node(a).successors().collect();
        assert_eq!(succs.len(), 1);
        assert_eq!(succs[0].0, c);
        assert_eq!(ts.node(c).predecessors().count(), 1);
    }

    #[test]
    fn merge_is_idempotent() {
        let mut ts = TypeSystem::new();
        let a = standalone(&mut ts);
        let b = standalone(&mut ts);
        let c = standalone(&mut ts);
        ts.add_instance(b, c, OffsetExpression::new(0));

        ts.merge(b, a);
        let succs: Vec<_> = ts.node(a).successors().collect();

        ts.merge(b, a);
        assert_eq!(ts.node(a).successors().collect::<Vec<_>>(), succs);
    }

    #[test]
    fn remove_clears_incident_edges() {
        let mut ts = TypeSystem::new();
        let a = standalone(&mut ts);
        let b = standalone(&mut ts);
        let c = standalone(&mut ts);
        ts.add_instance(a, b, OffsetExpression::new(0));
        ts.add_instance(b, c, OffsetExpression::new(4));

        ts.remove(b);

        assert!(!ts.is_live(b));
        assert!(ts.node(a).is_leaf());
        assert!(ts.node(c).is_root());
    }
}
