//! Normalization passes run after the graph is populated.
use tracing::debug;

use crate::{
    link::LinkFilter,
    type_system::{LayoutNodeId, TypeSystem},
};

impl TypeSystem {
    /// Collapses every equality-connected component into a single node.
    /// Afterwards no equality edge remains.
    pub fn collapse_equality_classes(&mut self) {
        let mut visited = std::collections::BTreeSet::new();
        let mut components: Vec<Vec<LayoutNodeId>> = Vec::new();

        for (root, _) in self.iter_nodes() {
            if !visited.insert(root) {
                continue;
            }

            let mut component = vec![root];
            let mut stack = vec![root];
            while let Some(node) = stack.pop() {
                // Equality edges are symmetric, so successors suffice.
                for (next, _) in self.succs_filtered(node, LinkFilter::Equality) {
                    if visited.insert(next) {
                        component.push(next);
                        stack.push(next);
                    }
                }
            }

            if component.len() > 1 {
                components.push(component);
            }
        }

        for component in components {
            debug!(
                target: "dla",
                size = component.len(),
                "collapsing equality class"
            );
            self.merge_all(&component);
        }

        debug_assert!(self.verify_no_equality());
        debug_assert!(self.verify_consistency());
    }

    /// Merges multiple inheritance parents until every node has at most one,
    /// turning the inheritance subgraph into a forest.
    pub fn enforce_inheritance_tree(&mut self) {
        loop {
            let mut parents: Option<Vec<LayoutNodeId>> = None;
            for (node, _) in self.iter_nodes() {
                let mut preds: Vec<_> = self
                    .preds_filtered(node, LinkFilter::Inheritance)
                    .map(|(pred, _)| pred)
                    .collect();
                preds.dedup();
                if preds.len() > 1 {
                    parents = Some(preds);
                    break;
                }
            }

            let Some(parents) = parents else {
                break;
            };

            debug!(
                target: "dla",
                count = parents.len(),
                "merging inheritance parents"
            );
            self.merge_all(&parents);
        }

        debug_assert!(self.verify_inheritance_tree());
        debug_assert!(self.verify_consistency());
    }

    /// Runs the full normalization pipeline.
    pub fn normalize(&mut self) {
        self.collapse_equality_classes();
        self.enforce_inheritance_tree();
    }
}
