//! The syntax graph: every declared entity, path-addressable

use crate::arena::Arena;
use crate::{GraphError, Scratch};
use serde::{Deserialize, Serialize};
use typeloom_syntax::{
    Alias, EnumDecl, GraphDecl, InstanceDecl, NodeId, NodeKind, StructDecl, Traits, VariantDecl,
};

/// One declared entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub kind: NodeKind,
    pub traits: Traits,
    /// Concept paths this node is asserted to satisfy
    pub constraints: Vec<String>,
    /// Base type paths; each base must carry the interface trait
    pub inherits: Vec<String>,
    /// Absolute path into the module graph, empty for builtins
    pub module: String,
    /// Alternate external name for script backends
    pub projection: Option<String>,
    pub comment: String,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            traits: Traits::default(),
            constraints: Vec::new(),
            inherits: Vec::new(),
            module: String::new(),
            projection: None,
            comment: String::new(),
        }
    }

    pub fn with_traits(kind: NodeKind, traits: Traits) -> Self {
        Self {
            traits,
            ..Self::new(kind)
        }
    }
}

/// The hierarchical, path-addressable type graph
///
/// Nodes are created once and never renamed or re-parented; paths are
/// globally unique and bijective with node identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyntaxGraph {
    pub(crate) arena: Arena<Node>,
}

impl SyntaxGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        self.arena.ids().map(NodeId)
    }

    /// Insert a node under `parent` (`None` for the root scope)
    pub fn add_node(
        &mut self,
        parent: Option<NodeId>,
        name: &str,
        node: Node,
    ) -> Result<NodeId, GraphError> {
        match self.arena.add(parent.map(|p| p.0), name, node) {
            Some(id) => Ok(NodeId(id)),
            None => Err(GraphError::DuplicateName {
                scope: parent.map(|p| self.path_of(p)).unwrap_or_default(),
                name: name.to_string(),
            }),
        }
    }

    /// Remove a leaf node, shifting every higher id down by one
    pub fn remove_node(&mut self, id: NodeId) -> Result<(), GraphError> {
        if !self.arena.remove(id.0) {
            return Err(GraphError::HasChildren {
                path: self.path_of(id),
            });
        }
        Ok(())
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.arena.get(id.0).value
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.arena.get_mut(id.0).value
    }

    pub fn name(&self, id: NodeId) -> &str {
        &self.arena.get(id.0).name
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.arena.get(id.0).parent.map(NodeId)
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.arena.get(id.0).children.iter().copied().map(NodeId)
    }

    pub fn path_of(&self, id: NodeId) -> String {
        self.arena.path_of(id.0)
    }

    pub fn path_of_into(&self, id: NodeId, out: &mut String) {
        self.arena.path_of_into(id.0, out);
    }

    /// Exact-match path lookup
    pub fn locate(&self, path: &str) -> Option<NodeId> {
        self.arena.locate(path).map(NodeId)
    }

    /// Locate `name` (possibly multi-segment) under `parent`
    pub fn locate_in(
        &self,
        parent: Option<NodeId>,
        name: &str,
        scratch: &mut Scratch,
    ) -> Option<NodeId> {
        let mut buf = scratch.take();
        let found = self.arena.locate_in(parent.map(|p| p.0), name, &mut buf);
        scratch.put(buf);
        found.map(NodeId)
    }

    /// Whether a path names the root scope or a namespace node
    pub fn is_namespace(&self, path: &str) -> bool {
        if path.is_empty() {
            return true;
        }
        match self.locate(path) {
            Some(id) => matches!(self.node(id).kind, NodeKind::Namespace),
            None => false,
        }
    }

    fn kind_mismatch(&self, id: NodeId, expected: &'static str) -> GraphError {
        GraphError::KindMismatch {
            path: self.path_of(id),
            expected,
            found: self.node(id).kind.kind_name(),
        }
    }

    // Kind-dispatched accessors. Using the wrong kind is a programming
    // error in the declaration sequence and always fatal.

    pub fn struct_decl(&self, id: NodeId) -> Result<&StructDecl, GraphError> {
        match &self.node(id).kind {
            NodeKind::Struct(s) => Ok(s),
            _ => Err(self.kind_mismatch(id, "Struct")),
        }
    }

    pub fn struct_decl_mut(&mut self, id: NodeId) -> Result<&mut StructDecl, GraphError> {
        match &self.node(id).kind {
            NodeKind::Struct(_) => {}
            _ => return Err(self.kind_mismatch(id, "Struct")),
        }
        match &mut self.node_mut(id).kind {
            NodeKind::Struct(s) => Ok(s),
            _ => unreachable!(),
        }
    }

    pub fn graph_decl(&self, id: NodeId) -> Result<&GraphDecl, GraphError> {
        match &self.node(id).kind {
            NodeKind::Graph(g) => Ok(g),
            _ => Err(self.kind_mismatch(id, "Graph")),
        }
    }

    pub fn graph_decl_mut(&mut self, id: NodeId) -> Result<&mut GraphDecl, GraphError> {
        match &self.node(id).kind {
            NodeKind::Graph(_) => {}
            _ => return Err(self.kind_mismatch(id, "Graph")),
        }
        match &mut self.node_mut(id).kind {
            NodeKind::Graph(g) => Ok(g),
            _ => unreachable!(),
        }
    }

    pub fn enum_decl(&self, id: NodeId) -> Result<&EnumDecl, GraphError> {
        match &self.node(id).kind {
            NodeKind::Enum(e) => Ok(e),
            _ => Err(self.kind_mismatch(id, "Enum")),
        }
    }

    pub fn enum_decl_mut(&mut self, id: NodeId) -> Result<&mut EnumDecl, GraphError> {
        match &self.node(id).kind {
            NodeKind::Enum(_) => {}
            _ => return Err(self.kind_mismatch(id, "Enum")),
        }
        match &mut self.node_mut(id).kind {
            NodeKind::Enum(e) => Ok(e),
            _ => unreachable!(),
        }
    }

    pub fn variant_decl(&self, id: NodeId) -> Result<&VariantDecl, GraphError> {
        match &self.node(id).kind {
            NodeKind::Variant(v) => Ok(v),
            _ => Err(self.kind_mismatch(id, "Variant")),
        }
    }

    pub fn variant_decl_mut(&mut self, id: NodeId) -> Result<&mut VariantDecl, GraphError> {
        match &self.node(id).kind {
            NodeKind::Variant(_) => {}
            _ => return Err(self.kind_mismatch(id, "Variant")),
        }
        match &mut self.node_mut(id).kind {
            NodeKind::Variant(v) => Ok(v),
            _ => unreachable!(),
        }
    }

    pub fn alias_decl(&self, id: NodeId) -> Result<&Alias, GraphError> {
        match &self.node(id).kind {
            NodeKind::Alias(a) => Ok(a),
            _ => Err(self.kind_mismatch(id, "Alias")),
        }
    }

    pub fn instance_decl(&self, id: NodeId) -> Result<&InstanceDecl, GraphError> {
        match &self.node(id).kind {
            NodeKind::Instance(i) => Ok(i),
            _ => Err(self.kind_mismatch(id, "Instance")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn namespace() -> Node {
        Node::new(NodeKind::Namespace)
    }

    #[test]
    fn path_bijectivity() {
        let mut g = SyntaxGraph::new();
        let a = g.add_node(None, "a", namespace()).unwrap();
        let b = g.add_node(Some(a), "b", namespace()).unwrap();
        let foo = g
            .add_node(Some(b), "Foo", Node::new(NodeKind::Struct(StructDecl::default())))
            .unwrap();

        assert_eq!(g.path_of(foo), "/a/b/Foo");
        assert_eq!(g.locate("/a/b/Foo"), Some(foo));

        let mut seen = std::collections::HashSet::new();
        for id in g.ids() {
            assert!(seen.insert(g.path_of(id)));
        }
    }

    #[test]
    fn duplicate_sibling_is_an_error() {
        let mut g = SyntaxGraph::new();
        let a = g.add_node(None, "a", namespace()).unwrap();
        g.add_node(Some(a), "Foo", Node::new(NodeKind::Value)).unwrap();
        let err = g
            .add_node(Some(a), "Foo", Node::new(NodeKind::Value))
            .unwrap_err();
        assert_eq!(
            err,
            GraphError::DuplicateName {
                scope: "/a".into(),
                name: "Foo".into()
            }
        );
    }

    #[test]
    fn removal_reindexes_paths() {
        let mut g = SyntaxGraph::new();
        let a = g.add_node(None, "a", namespace()).unwrap();
        let foo = g.add_node(Some(a), "Foo", Node::new(NodeKind::Value)).unwrap();
        let bar = g.add_node(Some(a), "Bar", Node::new(NodeKind::Value)).unwrap();

        g.remove_node(foo).unwrap();
        assert_eq!(g.locate("/a/Foo"), None);
        // Bar shifted down into Foo's slot
        assert_eq!(g.locate("/a/Bar"), Some(foo));
        assert_ne!(g.locate("/a/Bar"), Some(bar));
        assert_eq!(g.path_of(g.locate("/a/Bar").unwrap()), "/a/Bar");
    }

    #[test]
    fn removal_requires_leaf() {
        let mut g = SyntaxGraph::new();
        let a = g.add_node(None, "a", namespace()).unwrap();
        g.add_node(Some(a), "Foo", Node::new(NodeKind::Value)).unwrap();
        assert_eq!(
            g.remove_node(a),
            Err(GraphError::HasChildren { path: "/a".into() })
        );
    }

    #[test]
    fn kind_dispatch_fails_fast() {
        let mut g = SyntaxGraph::new();
        let e = g
            .add_node(None, "Mode", Node::new(NodeKind::Enum(EnumDecl::default())))
            .unwrap();
        assert!(g.enum_decl(e).is_ok());
        let err = g.struct_decl(e).unwrap_err();
        assert_eq!(
            err,
            GraphError::KindMismatch {
                path: "/Mode".into(),
                expected: "Struct",
                found: "Enum"
            }
        );
    }

    #[test]
    fn namespace_query() {
        let mut g = SyntaxGraph::new();
        let a = g.add_node(None, "a", namespace()).unwrap();
        g.add_node(Some(a), "Foo", Node::new(NodeKind::Struct(StructDecl::default())))
            .unwrap();
        assert!(g.is_namespace(""));
        assert!(g.is_namespace("/a"));
        assert!(!g.is_namespace("/a/Foo"));
        assert!(!g.is_namespace("/missing"));
    }
}
