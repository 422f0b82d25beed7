//! Node identities, kinds, and kind payloads

use crate::name::TypeModifiers;
use crate::{GenFlags, GraphDecl};
use serde::{Deserialize, Serialize};

/// Index of a node in the type graph
///
/// Ids are dense; removing a node shifts every higher id down by one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index of a module descriptor in the module graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleId(pub u32);

impl ModuleId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// What a node is, together with its kind-specific payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum NodeKind {
    Namespace,
    /// Forward declaration of a type defined elsewhere
    Define,
    /// A named capability types can be constrained to satisfy
    Concept,
    Alias(Alias),
    /// A primitive value type (`bool`, `int32`, ...)
    Value,
    Enum(EnumDecl),
    Tag(TagDecl),
    Struct(StructDecl),
    Graph(Box<GraphDecl>),
    Variant(VariantDecl),
    /// A sequence template awaiting instantiation
    Container,
    /// A dictionary template awaiting instantiation
    Map,
    Instance(InstanceDecl),
}

impl NodeKind {
    /// Kind name for diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            NodeKind::Namespace => "Namespace",
            NodeKind::Define => "Define",
            NodeKind::Concept => "Concept",
            NodeKind::Alias(_) => "Alias",
            NodeKind::Value => "Value",
            NodeKind::Enum(_) => "Enum",
            NodeKind::Tag(_) => "Tag",
            NodeKind::Struct(_) => "Struct",
            NodeKind::Graph(_) => "Graph",
            NodeKind::Variant(_) => "Variant",
            NodeKind::Container => "Container",
            NodeKind::Map => "Map",
            NodeKind::Instance(_) => "Instance",
        }
    }

    /// Whether the node can stand in a member type position
    pub fn is_type(&self) -> bool {
        !matches!(self, NodeKind::Namespace | NodeKind::Concept)
    }

    /// Whether the node owns member lists (structs and graphs)
    pub fn members(&self) -> Option<&[Member]> {
        match self {
            NodeKind::Struct(s) => Some(&s.members),
            NodeKind::Graph(g) => Some(&g.members),
            _ => None,
        }
    }

    pub fn members_mut(&mut self) -> Option<&mut Vec<Member>> {
        match self {
            NodeKind::Struct(s) => Some(&mut s.members),
            NodeKind::Graph(g) => Some(&mut g.members),
            _ => None,
        }
    }

    pub fn constructors_mut(&mut self) -> Option<&mut Vec<Constructor>> {
        match self {
            NodeKind::Struct(s) => Some(&mut s.constructors),
            NodeKind::Graph(g) => Some(&mut g.constructors),
            _ => None,
        }
    }

    pub fn methods_mut(&mut self) -> Option<&mut Vec<Method>> {
        match self {
            NodeKind::Struct(s) => Some(&mut s.methods),
            NodeKind::Graph(g) => Some(&mut g.methods),
            _ => None,
        }
    }
}

/// Alias payload: the aliased type path
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Alias {
    pub target: String,
}

/// One enumerator of an enum
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnumValue {
    pub name: String,
    /// Explicit value text, empty for sequential numbering
    pub value: String,
    /// Alternate spelling exposed to reflection, empty to reuse `name`
    pub reflection_name: String,
}

/// Enum payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumDecl {
    pub is_flags: bool,
    pub enum_operator: bool,
    /// Underlying storage type path, empty for the backend default
    pub underlying_type: String,
    pub values: Vec<EnumValue>,
}

impl Default for EnumDecl {
    fn default() -> Self {
        Self {
            is_flags: false,
            enum_operator: true,
            underlying_type: String::new(),
            values: Vec::new(),
        }
    }
}

/// Tag payload: an empty marker type
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TagDecl {
    /// The tag names an entity with identity, not just a discriminator
    pub entity: bool,
}

/// A data member of a struct or graph
///
/// `type_path` starts as the driver's spelling; after `compile()` it is
/// always a canonical absolute path.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Member {
    pub type_path: String,
    pub name: String,
    /// Default value text, empty for the type's own default
    pub default_value: String,
    pub modifiers: TypeModifiers,
    pub public: bool,
    pub flags: GenFlags,
}

impl Member {
    /// Whether the type reference has been resolved to a canonical path
    pub fn is_resolved(&self) -> bool {
        self.type_path.starts_with('/')
    }
}

/// A synthesized constructor, as indices into the member list
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Constructor {
    pub indices: Vec<u32>,
    /// Also keep a default constructor alongside this one
    pub has_default: bool,
}

/// A formal parameter of a method
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Parameter {
    pub type_path: String,
    pub name: String,
    pub modifiers: TypeModifiers,
}

/// A method signature carried through to the backends
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Method {
    pub name: String,
    pub parameters: Vec<Parameter>,
    /// Return type path, empty for none
    pub return_type: String,
    pub return_modifiers: TypeModifiers,
    pub const_qualified: bool,
    pub flags: GenFlags,
}

/// Struct payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StructDecl {
    pub members: Vec<Member>,
    pub constructors: Vec<Constructor>,
    pub methods: Vec<Method>,
}

impl StructDecl {
    pub fn member_index(&self, name: &str) -> Option<usize> {
        self.members.iter().position(|m| m.name == name)
    }
}

/// Variant payload: ordered alternative type paths
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantDecl {
    pub alternatives: Vec<String>,
    /// Discriminate by index rather than by type
    pub use_index: bool,
}

impl Default for VariantDecl {
    fn default() -> Self {
        Self {
            alternatives: Vec::new(),
            use_index: true,
        }
    }
}

/// Instance payload: one concrete instantiation of a template
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstanceDecl {
    /// Canonical path of the template
    pub template: String,
    /// Canonical paths of the parameters, in order
    pub parameters: Vec<String>,
}
