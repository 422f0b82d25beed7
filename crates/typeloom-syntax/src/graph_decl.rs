//! Abstract graph declarations
//!
//! A graph node is declared through configuration flags (storage kind,
//! directedness, components, polymorphic concepts, vertex maps) and lowered
//! into a concrete member layout during `compile()`.

use crate::{Constructor, Member, Method};
use serde::{Deserialize, Serialize};

/// How vertices are stored
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VertexListKind {
    /// Array-based storage; vertex ids are dense indices and per-vertex data
    /// lives in parallel arrays
    #[default]
    Vector,
    /// Node-based storage; per-vertex data embeds into the vertex record
    List,
}

/// Which incidence directions the graph maintains
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Directedness {
    #[default]
    Directed,
    /// Out- and in-edge lists are both maintained
    Bidirectional,
    Undirected,
}

/// A parallel per-vertex payload, keyed by vertex id
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Component {
    pub name: String,
    /// Canonical path of the payload type
    pub value_path: String,
    pub member_name: String,
}

/// One tag/payload pair of a polymorphic graph
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolymorphicPair {
    pub tag_path: String,
    pub value_path: String,
    pub member_name: String,
}

/// A dictionary from a component-derived key to the owning vertex
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VertexMap {
    /// Name of the component supplying the key type
    pub component: String,
    pub member_name: String,
}

/// The abstract description of a graph type, plus its concrete member
/// layout once elaborated
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphDecl {
    pub members: Vec<Member>,
    pub constructors: Vec<Constructor>,
    pub methods: Vec<Method>,
    /// Per-vertex payload type path, empty for none
    pub vertex_property: String,
    /// Per-edge payload type path, empty for none
    pub edge_property: String,
    pub components: Vec<Component>,
    pub polymorphic: Vec<PolymorphicPair>,
    pub vertex_maps: Vec<VertexMap>,
    pub directedness: Directedness,
    pub vertex_list: VertexListKind,
    /// Vertices carry a display name component
    pub named: bool,
    /// Vertices are addressable by name through a synthesized index
    pub addressable: bool,
    /// The graph owns its vertices (ownership edges are tracked separately)
    pub reference: bool,
    /// Ownership edges double as the incidence lists
    pub aliased: bool,
    pub mutable_reference: bool,
}

impl Default for GraphDecl {
    fn default() -> Self {
        Self {
            members: Vec::new(),
            constructors: Vec::new(),
            methods: Vec::new(),
            vertex_property: String::new(),
            edge_property: String::new(),
            components: Vec::new(),
            polymorphic: Vec::new(),
            vertex_maps: Vec::new(),
            directedness: Directedness::Directed,
            vertex_list: VertexListKind::Vector,
            named: false,
            addressable: false,
            reference: false,
            aliased: false,
            mutable_reference: true,
        }
    }
}

impl GraphDecl {
    pub fn is_vector(&self) -> bool {
        self.vertex_list == VertexListKind::Vector
    }

    pub fn is_bidirectional(&self) -> bool {
        self.directedness == Directedness::Bidirectional
    }

    pub fn is_undirected(&self) -> bool {
        self.directedness == Directedness::Undirected
    }

    pub fn has_vertex_property(&self) -> bool {
        !self.vertex_property.is_empty()
    }

    pub fn has_edge_property(&self) -> bool {
        !self.edge_property.is_empty()
    }

    pub fn is_polymorphic(&self) -> bool {
        !self.polymorphic.is_empty()
    }

    /// Whether edges need their own store: undirected graphs always, and
    /// bidirectional graphs carrying edge properties
    pub fn needs_edge_list(&self) -> bool {
        self.is_undirected() || (self.is_bidirectional() && self.has_edge_property())
    }

    /// Components embed into the vertex record when storage is node-based
    pub fn components_in_vertex(&self) -> bool {
        !self.components.is_empty() && !self.is_vector()
    }

    pub fn component(&self, name: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_list_rules() {
        let mut g = GraphDecl::default();
        assert!(!g.needs_edge_list());

        g.directedness = Directedness::Undirected;
        assert!(g.needs_edge_list());

        g.directedness = Directedness::Bidirectional;
        assert!(!g.needs_edge_list());
        g.edge_property = "/ns/Weight".into();
        assert!(g.needs_edge_list());
    }

    #[test]
    fn component_placement() {
        let mut g = GraphDecl::default();
        g.components.push(Component {
            name: "Name".into(),
            value_path: "/std/string".into(),
            member_name: "names".into(),
        });
        assert!(!g.components_in_vertex());
        g.vertex_list = VertexListKind::List;
        assert!(g.components_in_vertex());
        assert!(g.component("Name").is_some());
        assert!(g.component("Uuid").is_none());
    }
}
