//! Structural checks over the type system.
//!
//! Each check walks the graph and answers with a boolean; they serve both
//! as debug asserts inside the DLA pass and as oracles in tests.
use cranelift_entity::SecondaryMap;

use crate::{
    link::{LinkFilter, LinkKind},
    type_system::{LayoutNodeId, TypeSystem},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Color {
    #[default]
    White,
    Gray,
    Black,
}

impl TypeSystem {
    /// Mirrored neighbor sets, no self-loops, and agreeing key maps.
    pub fn verify_consistency(&self) -> bool {
        for (id, node) in self.iter_nodes() {
            for (tgt, tag_id) in node.successors() {
                if tgt == id || !self.is_live(tgt) {
                    return false;
                }
                if !self.node(tgt).predecessors().any(|edge| edge == (id, tag_id)) {
                    return false;
                }
            }
            for (src, tag_id) in node.predecessors() {
                if src == id || !self.is_live(src) {
                    return false;
                }
                if !self.node(src).successors().any(|edge| edge == (id, tag_id)) {
                    return false;
                }
            }
        }

        for (key, &node) in &self.key_to_node {
            if !self.is_live(node) {
                return false;
            }
            let Some(keys) = self.node_keys.get(&node) else {
                return false;
            };
            if !keys.contains(key) {
                return false;
            }
        }

        for (&node, keys) in &self.node_keys {
            if !self.is_live(node) || keys.is_empty() {
                return false;
            }
            if keys.iter().any(|key| self.get(*key) != Some(node)) {
                return false;
            }
        }

        true
    }

    /// Acyclicity of the subgraph admitted by `filter`, by iterative DFS
    /// with gray/black coloring.
    pub fn verify_dag_for(&self, filter: LinkFilter) -> bool {
        let mut colors: SecondaryMap<LayoutNodeId, Color> = SecondaryMap::new();

        for (root, _) in self.iter_nodes() {
            if colors[root] != Color::White {
                continue;
            }

            // Stack frames carry the node and whether its children were
            // already expanded.
            let mut stack = vec![(root, false)];
            while let Some((node, expanded)) = stack.pop() {
                if expanded {
                    colors[node] = Color::Black;
                    continue;
                }
                if colors[node] == Color::Black {
                    continue;
                }

                colors[node] = Color::Gray;
                stack.push((node, true));
                for (succ, _) in self.succs_filtered(node, filter) {
                    match colors[succ] {
                        Color::Gray => return false,
                        Color::White => stack.push((succ, false)),
                        Color::Black => {}
                    }
                }
            }
        }

        true
    }

    pub fn verify_dag(&self) -> bool {
        self.verify_consistency() && self.verify_dag_for(LinkFilter::All)
    }

    pub fn verify_inheritance_dag(&self) -> bool {
        self.verify_consistency() && self.verify_dag_for(LinkFilter::Inheritance)
    }

    pub fn verify_instance_dag(&self) -> bool {
        self.verify_consistency() && self.verify_dag_for(LinkFilter::Instance)
    }

    /// The inheritance subgraph is a forest: no node inherits from two
    /// parents.
    pub fn verify_inheritance_tree(&self) -> bool {
        self.iter_nodes().all(|(id, _)| {
            self.preds_filtered(id, LinkFilter::Inheritance).count() <= 1
        })
    }

    /// Every sink carries concrete layout evidence.
    pub fn verify_leafs_have_layout(&self) -> bool {
        self.iter_nodes()
            .all(|(_, node)| !node.is_leaf() || !node.accesses.is_empty())
    }

    /// No equality edges survive normalization.
    pub fn verify_no_equality(&self) -> bool {
        self.iter_nodes().all(|(_, node)| {
            node.successors()
                .all(|(_, tag_id)| self.tag(tag_id).kind() != LinkKind::Equality)
        })
    }
}
