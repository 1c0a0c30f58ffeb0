//! Graphviz rendering of the type system, for debugging.
use std::{fs::File, io, path::Path};

use dot2::{label::Text, GraphWalk, Id, Labeller};

use crate::type_system::{LayoutNodeId, TagId, TypeSystem};

pub fn render_to<W: io::Write>(ts: &TypeSystem, output: &mut W) -> io::Result<()> {
    let graph = TypeSystemGraph { ts };
    dot2::render(&graph, output).map_err(|err| match err {
        dot2::Error::Io(err) => err,
        _ => panic!("invalid graphviz id"),
    })
}

impl TypeSystem {
    /// Writes the graph in dot format to `path`.
    pub fn dump_dot(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let mut file = File::create(path)?;
        render_to(self, &mut file)
    }
}

struct TypeSystemGraph<'a> {
    ts: &'a TypeSystem,
}

type EdgeTriple = (LayoutNodeId, LayoutNodeId, TagId);

impl<'a> Labeller<'a> for TypeSystemGraph<'a> {
    type Node = LayoutNodeId;
    type Edge = EdgeTriple;
    type Subgraph = ();

    fn graph_id(&self) -> dot2::Result<Id<'a>> {
        Id::new("layout_type_system")
    }

    fn node_id(&self, n: &Self::Node) -> dot2::Result<Id<'a>> {
        Id::new(format!("node{}", n.0))
    }

    fn node_label(&'a self, n: &Self::Node) -> dot2::Result<Text<'a>> {
        let node = self.ts.node(*n);
        let keys = self
            .ts
            .keys_of(*n)
            .map(|keys| keys.len())
            .unwrap_or_default();
        Ok(Text::LabelStr(
            format!(
                "#{} size:{} keys:{} accesses:{}",
                n.0,
                node.size,
                keys,
                node.accesses.len()
            )
            .into(),
        ))
    }

    fn edge_label(&self, e: &Self::Edge) -> Text<'a> {
        Text::LabelStr(format!("{}", self.ts.tag(e.2)).into())
    }
}

impl<'a> GraphWalk<'a> for TypeSystemGraph<'a> {
    type Node = LayoutNodeId;
    type Edge = EdgeTriple;
    type Subgraph = ();

    fn nodes(&self) -> dot2::Nodes<'a, Self::Node> {
        self.ts
            .iter_nodes()
            .map(|(id, _)| id)
            .collect::<Vec<_>>()
            .into()
    }

    fn edges(&'a self) -> dot2::Edges<'a, Self::Edge> {
        let mut edges = Vec::new();
        for (id, node) in self.ts.iter_nodes() {
            for (tgt, tag_id) in node.successors() {
                edges.push((id, tgt, tag_id));
            }
        }
        edges.into()
    }

    fn source(&self, edge: &Self::Edge) -> Self::Node {
        edge.0
    }

    fn target(&self, edge: &Self::Edge) -> Self::Node {
        edge.1
    }
}
