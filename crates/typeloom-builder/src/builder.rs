//! The declaration cursor: scope-checked write API over both graphs

use crate::elaborate;
use crate::handle::{truncate_suffix, ModuleGuard, ScopeGuard};
use crate::BuildError;
use typeloom_graph::{GraphError, ModuleGraph, Node, Scratch, SyntaxGraph};
use typeloom_syntax::{
    name, Alias, Component, Constructor, Directedness, EnumDecl, GenFlags, GraphDecl, Member,
    Method, ModuleInfo, NodeId, NodeKind, Parameter, PolymorphicPair, StructDecl, TagDecl, Traits,
    VariantDecl, VertexListKind, VertexMap,
};

/// Where the session is in its lifecycle
///
/// There is no way back: once `compile()` has run, the graphs are read-only
/// from the builder's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Empty,
    Declaring,
    Compiling,
    Finalized,
}

/// The builder cursor threaded through a declaration session
///
/// Holds the syntax graph, the module graph, and the two live cursor paths
/// (`current_scope` into the type graph, `current_module` into the module
/// graph). Opening a namespace, struct, graph, or module appends to the
/// matching cursor and returns a guard; guards must be closed in LIFO order
/// through [`close`]/[`close_module`].
///
/// All type references in write calls are resolved relative to
/// `current_scope`. References that do not resolve yet are kept as written
/// and re-resolved during [`compile`]; that is how forward references work.
///
/// [`close`]: ModuleBuilder::close
/// [`close_module`]: ModuleBuilder::close_module
/// [`compile`]: ModuleBuilder::compile
#[derive(Debug)]
pub struct ModuleBuilder {
    graph: SyntaxGraph,
    modules: ModuleGraph,
    current_scope: String,
    current_module: String,
    scratch: Scratch,
    state: SessionState,
}

impl Default for ModuleBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleBuilder {
    pub fn new() -> Self {
        Self {
            graph: SyntaxGraph::new(),
            modules: ModuleGraph::new(),
            current_scope: String::new(),
            current_module: String::new(),
            scratch: Scratch::new(),
            state: SessionState::Empty,
        }
    }

    /// The type graph; stable for reads once [`compile`] has succeeded
    ///
    /// [`compile`]: ModuleBuilder::compile
    pub fn graph(&self) -> &SyntaxGraph {
        &self.graph
    }

    pub fn modules(&self) -> &ModuleGraph {
        &self.modules
    }

    pub fn current_scope(&self) -> &str {
        &self.current_scope
    }

    pub fn current_module(&self) -> &str {
        &self.current_module
    }

    pub fn is_finalized(&self) -> bool {
        self.state == SessionState::Finalized
    }

    fn writable(&mut self) -> Result<(), BuildError> {
        match self.state {
            SessionState::Empty => {
                self.state = SessionState::Declaring;
                Ok(())
            }
            SessionState::Declaring => Ok(()),
            SessionState::Compiling | SessionState::Finalized => Err(BuildError::Finalized),
        }
    }

    fn parent_of_scope(&self) -> Result<Option<NodeId>, BuildError> {
        if self.current_scope.is_empty() {
            return Ok(None);
        }
        match self.graph.locate(&self.current_scope) {
            Some(id) => Ok(Some(id)),
            None => Err(BuildError::InvalidScope {
                scope: self.current_scope.clone(),
                kind: "type",
            }),
        }
    }

    fn require_namespace_scope(&self, kind: &'static str) -> Result<(), BuildError> {
        if self.graph.is_namespace(&self.current_scope) {
            return Ok(());
        }
        Err(BuildError::InvalidScope {
            scope: self.current_scope.clone(),
            kind,
        })
    }

    fn new_node(&self, kind: NodeKind) -> Node {
        let mut node = Node::new(kind);
        node.module = self.current_module.clone();
        node
    }

    fn new_node_with(&self, kind: NodeKind, traits: Traits) -> Node {
        let mut node = Node::with_traits(kind, traits);
        node.module = self.current_module.clone();
        node
    }

    /// Resolve a type expression now if its constituents exist, otherwise
    /// keep the normalized spelling for the `compile()` closure pass
    fn resolve_or_defer(&mut self, expr: &str) -> Result<(String, name::TypeModifiers), BuildError> {
        let normalized = name::normalize(expr);
        let (bare, modifiers) = name::strip_modifiers(&normalized);
        if bare.is_empty() {
            return Ok((String::new(), modifiers));
        }
        if !name::is_valid(bare) {
            return Err(BuildError::Graph(GraphError::MalformedTypename {
                name: bare.to_string(),
            }));
        }

        if name::is_instance(bare) {
            match self.graph.instantiate(&self.current_scope, bare, &mut self.scratch) {
                Ok(id) => Ok((self.graph.path_of(id), modifiers)),
                Err(GraphError::IdentifierNotFound { .. })
                | Err(GraphError::TemplateNotFound { .. }) => Ok((bare.to_string(), modifiers)),
                Err(e) => Err(e.into()),
            }
        } else {
            match self.graph.lookup_type(&self.current_scope, bare, &mut self.scratch) {
                Some(id) => Ok((self.graph.path_of(id), modifiers)),
                None => Ok((bare.to_string(), modifiers)),
            }
        }
    }

    /// Resolve a type expression that must already be declared
    fn resolve_now(&mut self, expr: &str) -> Result<String, BuildError> {
        let normalized = name::normalize(expr);
        let (bare, _) = name::strip_modifiers(&normalized);
        let path =
            elaborate::resolve_type(&mut self.graph, &self.current_scope, bare, &mut self.scratch)?;
        Ok(path)
    }

    // Scope management

    /// Open (or re-enter) a namespace under the current scope
    ///
    /// Multi-segment names (`render/scene`) open one nested namespace per
    /// segment; missing namespaces are created, existing ones are reused.
    pub fn open_namespace(&mut self, namespace: &str) -> Result<ScopeGuard, BuildError> {
        self.writable()?;
        let suffix = name::normalize(namespace);
        if suffix.is_empty() {
            return Err(BuildError::Graph(GraphError::MalformedTypename {
                name: namespace.to_string(),
            }));
        }
        let mut parent = self.parent_of_scope()?;
        if parent.is_some() {
            self.require_namespace_scope("namespace")?;
        }

        let mut node = None;
        for segment in suffix.split('/') {
            let existing = self.graph.locate_in(parent, segment, &mut self.scratch);
            let id = match existing {
                Some(id) => {
                    if !matches!(self.graph.node(id).kind, NodeKind::Namespace) {
                        return Err(BuildError::InvalidScope {
                            scope: self.graph.path_of(id),
                            kind: "namespace",
                        });
                    }
                    id
                }
                // namespaces carry no module path; they are shared between
                // every module that declares into them
                None => self
                    .graph
                    .add_node(parent, segment, Node::new(NodeKind::Namespace))?,
            };
            parent = Some(id);
            node = Some(id);
        }

        let id = node.ok_or_else(|| BuildError::InvalidScope {
            scope: self.current_scope.clone(),
            kind: "namespace",
        })?;
        self.current_scope.push('/');
        self.current_scope.push_str(&suffix);
        Ok(ScopeGuard::new(suffix, id))
    }

    /// Close a type scope opened by `open_namespace`/`add_struct`/`add_graph`
    ///
    /// The guard's suffix must still be the trailing segment of the live
    /// scope; closing out of LIFO order is a hard error.
    pub fn close(&mut self, mut guard: ScopeGuard) -> Result<(), BuildError> {
        guard.closed = true;
        if !truncate_suffix(&mut self.current_scope, &guard.suffix) {
            return Err(BuildError::ScopeMismatch {
                suffix: guard.suffix.clone(),
                current: self.current_scope.clone(),
            });
        }
        Ok(())
    }

    /// Open (or re-enter) a module under the current module path
    ///
    /// `info.requires` entries are resolved to dependency edges immediately;
    /// every required module must already exist.
    pub fn open_module(&mut self, module: &str, info: ModuleInfo) -> Result<ModuleGuard, BuildError> {
        self.writable()?;
        let suffix = name::normalize(module);
        if suffix.is_empty() {
            return Err(BuildError::Graph(GraphError::MalformedTypename {
                name: module.to_string(),
            }));
        }
        let mut parent = match self.current_module.is_empty() {
            true => None,
            false => match self.modules.locate(&self.current_module) {
                Some(id) => Some(id),
                None => {
                    return Err(BuildError::InvalidScope {
                        scope: self.current_module.clone(),
                        kind: "module",
                    })
                }
            },
        };

        let requires = info.requires.clone();
        let mut segments = suffix.split('/').peekable();
        let mut module_id = None;
        while let Some(segment) = segments.next() {
            let last = segments.peek().is_none();
            let path = match parent {
                Some(p) => format!("{}/{}", self.modules.path_of(p), segment),
                None => format!("/{segment}"),
            };
            let id = match self.modules.locate(&path) {
                Some(id) => id,
                None => {
                    let payload = if last { info.clone() } else { ModuleInfo::default() };
                    self.modules.add_module(parent, segment, payload)?
                }
            };
            parent = Some(id);
            if last {
                module_id = Some(id);
            }
        }

        let id = module_id.ok_or_else(|| BuildError::InvalidScope {
            scope: self.current_module.clone(),
            kind: "module",
        })?;
        for required in &requires {
            let target =
                self.modules
                    .locate(required)
                    .ok_or_else(|| GraphError::ModuleNotFound {
                        path: required.clone(),
                    })?;
            self.modules.add_require(id, target);
        }

        self.current_module.push('/');
        self.current_module.push_str(&suffix);
        Ok(ModuleGuard::new(suffix, id))
    }

    pub fn close_module(&mut self, mut guard: ModuleGuard) -> Result<(), BuildError> {
        guard.closed = true;
        if !truncate_suffix(&mut self.current_module, &guard.suffix) {
            return Err(BuildError::ScopeMismatch {
                suffix: guard.suffix.clone(),
                current: self.current_module.clone(),
            });
        }
        Ok(())
    }

    /// Declare that the current module depends on `target`
    ///
    /// Cross-module constraints are only legal along edges declared here;
    /// dependencies are never inferred.
    pub fn require_module(&mut self, target: &str) -> Result<(), BuildError> {
        self.writable()?;
        let from = self
            .modules
            .locate(&self.current_module)
            .ok_or_else(|| BuildError::InvalidScope {
                scope: self.current_module.clone(),
                kind: "module",
            })?;
        let to = self
            .modules
            .locate(target)
            .ok_or_else(|| GraphError::ModuleNotFound {
                path: target.to_string(),
            })?;
        self.modules.add_require(from, to);
        Ok(())
    }

    // Leaf declarations

    pub fn add_value(&mut self, value: &str) -> Result<NodeId, BuildError> {
        self.writable()?;
        let parent = self.parent_of_scope()?;
        let node = self.new_node(NodeKind::Value);
        Ok(self.graph.add_node(parent, value, node)?)
    }

    /// Forward-declare a type defined outside the generated code
    pub fn add_define(&mut self, define: &str, traits: Traits) -> Result<NodeId, BuildError> {
        self.writable()?;
        let parent = self.parent_of_scope()?;
        let node = self.new_node_with(NodeKind::Define, traits);
        Ok(self.graph.add_node(parent, define, node)?)
    }

    pub fn add_concept(&mut self, concept: &str) -> Result<NodeId, BuildError> {
        self.writable()?;
        let parent = self.parent_of_scope()?;
        let node = self.new_node(NodeKind::Concept);
        Ok(self.graph.add_node(parent, concept, node)?)
    }

    pub fn add_container(&mut self, container: &str, traits: Traits) -> Result<NodeId, BuildError> {
        self.writable()?;
        let parent = self.parent_of_scope()?;
        let node = self.new_node_with(NodeKind::Container, traits);
        Ok(self.graph.add_node(parent, container, node)?)
    }

    pub fn add_map(&mut self, map: &str, traits: Traits) -> Result<NodeId, BuildError> {
        self.writable()?;
        let parent = self.parent_of_scope()?;
        let node = self.new_node_with(NodeKind::Map, traits);
        Ok(self.graph.add_node(parent, map, node)?)
    }

    /// Declare an alias for a type that must already exist
    pub fn add_alias(&mut self, alias: &str, target: &str) -> Result<NodeId, BuildError> {
        self.writable()?;
        let target = self.resolve_now(target)?;
        let parent = self.parent_of_scope()?;
        let node = self.new_node(NodeKind::Alias(Alias { target }));
        Ok(self.graph.add_node(parent, alias, node)?)
    }

    pub fn add_enum(&mut self, name: &str, traits: Traits) -> Result<NodeId, BuildError> {
        self.writable()?;
        let parent = self.parent_of_scope()?;
        let node = self.new_node_with(NodeKind::Enum(EnumDecl::default()), traits);
        Ok(self.graph.add_node(parent, name, node)?)
    }

    /// Declare a flag enum; enumerators combine as a bitset
    pub fn add_flags(&mut self, name: &str, traits: Traits) -> Result<NodeId, BuildError> {
        self.writable()?;
        let parent = self.parent_of_scope()?;
        let decl = EnumDecl {
            is_flags: true,
            ..EnumDecl::default()
        };
        let node = self.new_node_with(NodeKind::Enum(decl), traits);
        Ok(self.graph.add_node(parent, name, node)?)
    }

    /// Append an enumerator; empty `value` means sequential numbering
    pub fn add_enum_value(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), BuildError> {
        self.writable()?;
        let decl = self.graph.enum_decl_mut(id)?;
        decl.values.push(typeloom_syntax::EnumValue {
            name: name.trim().to_string(),
            value: value.to_string(),
            reflection_name: String::new(),
        });
        Ok(())
    }

    pub fn set_enum_underlying(&mut self, id: NodeId, underlying: &str) -> Result<(), BuildError> {
        self.writable()?;
        let path = self.resolve_now(underlying)?;
        self.graph.enum_decl_mut(id)?.underlying_type = path;
        Ok(())
    }

    pub fn add_tag(
        &mut self,
        tag: &str,
        entity: bool,
        concepts: &[&str],
    ) -> Result<NodeId, BuildError> {
        self.writable()?;
        let parent = self.parent_of_scope()?;
        let node = self.new_node(NodeKind::Tag(TagDecl { entity }));
        let id = self.graph.add_node(parent, tag, node)?;
        for concept in concepts {
            self.add_constraints(id, concept)?;
        }
        Ok(id)
    }

    pub fn add_variant(&mut self, variant: &str, flags: GenFlags) -> Result<NodeId, BuildError> {
        self.writable()?;
        self.require_namespace_scope("variant")?;
        let parent = self.parent_of_scope()?;
        let mut node = self.new_node(NodeKind::Variant(VariantDecl::default()));
        node.traits.flags = flags;
        Ok(self.graph.add_node(parent, variant, node)?)
    }

    /// Append an alternative; the type must already be declared
    pub fn add_variant_alternative(&mut self, id: NodeId, ty: &str) -> Result<(), BuildError> {
        self.writable()?;
        let path = self.resolve_now(ty)?;
        self.graph.variant_decl_mut(id)?.alternatives.push(path);
        Ok(())
    }

    /// Discriminate the variant by alternative index instead of by type
    pub fn variant_use_index(&mut self, id: NodeId, use_index: bool) -> Result<(), BuildError> {
        self.writable()?;
        self.graph.variant_decl_mut(id)?.use_index = use_index;
        Ok(())
    }

    // Compositions

    /// Declare a struct and open its scope for nested declarations
    pub fn add_struct(&mut self, name: &str, traits: Traits) -> Result<ScopeGuard, BuildError> {
        self.writable()?;
        let parent = self.parent_of_scope()?;
        if let Some(p) = parent {
            // structs nest under namespaces and other compositions only
            if !matches!(
                self.graph.node(p).kind,
                NodeKind::Namespace | NodeKind::Struct(_) | NodeKind::Graph(_)
            ) {
                return Err(BuildError::InvalidScope {
                    scope: self.current_scope.clone(),
                    kind: "struct",
                });
            }
        }
        let suffix = name::normalize(name);
        let node = self.new_node_with(NodeKind::Struct(StructDecl::default()), traits);
        let id = self.graph.add_node(parent, &suffix, node)?;
        self.current_scope.push('/');
        self.current_scope.push_str(&suffix);
        Ok(ScopeGuard::new(suffix, id))
    }

    /// Declare a property graph and open its scope
    ///
    /// `vertex`/`edge` name the payload carried per vertex/edge; pass the
    /// empty string for none. Both may be forward references.
    pub fn add_graph(
        &mut self,
        name: &str,
        vertex: &str,
        edge: &str,
        traits: Traits,
    ) -> Result<ScopeGuard, BuildError> {
        self.writable()?;
        self.require_namespace_scope("graph")?;
        let parent = self.parent_of_scope()?;

        let (vertex_property, _) = self.resolve_or_defer(vertex)?;
        let (edge_property, _) = self.resolve_or_defer(edge)?;

        let suffix = name::normalize(name);
        let decl = GraphDecl {
            vertex_property,
            edge_property,
            ..GraphDecl::default()
        };
        let node = self.new_node_with(NodeKind::Graph(Box::new(decl)), traits);
        let id = self.graph.add_node(parent, &suffix, node)?;
        self.current_scope.push('/');
        self.current_scope.push_str(&suffix);
        Ok(ScopeGuard::new(suffix, id))
    }

    fn members_mut(&mut self, id: NodeId) -> Result<&mut Vec<Member>, BuildError> {
        let path = self.graph.path_of(id);
        let found = self.graph.node(id).kind.kind_name();
        match self.graph.node_mut(id).kind.members_mut() {
            Some(members) => Ok(members),
            None => Err(BuildError::Graph(GraphError::KindMismatch {
                path,
                expected: "Struct",
                found,
            })),
        }
    }

    /// Append a data member to a struct or graph
    ///
    /// The type may carry `const`, trailing `*`/`&`, and a `[[optional]]`
    /// marker; those strip into side flags. An empty `default_value` means
    /// the type's own default.
    pub fn add_member(
        &mut self,
        id: NodeId,
        public: bool,
        ty: &str,
        member_name: &str,
        default_value: &str,
        flags: GenFlags,
    ) -> Result<(), BuildError> {
        self.writable()?;
        let (type_path, modifiers) = self.resolve_or_defer(ty)?;
        let member = Member {
            type_path,
            name: member_name.trim().to_string(),
            default_value: default_value.to_string(),
            modifiers,
            public,
            flags,
        };
        self.members_mut(id)?.push(member);
        Ok(())
    }

    /// Record a constructor taking the named members, by member index
    pub fn add_constructor(
        &mut self,
        id: NodeId,
        members: &[&str],
        has_default: bool,
    ) -> Result<(), BuildError> {
        self.writable()?;
        let owner = self.graph.path_of(id);
        let list = self.members_mut(id)?;
        let mut indices = Vec::with_capacity(members.len());
        for member in members {
            let index = list.iter().position(|m| m.name == *member).ok_or_else(|| {
                BuildError::ConstructorMemberNotFound {
                    owner: owner.clone(),
                    member: member.to_string(),
                }
            })?;
            indices.push(index as u32);
        }
        let ctor = Constructor {
            indices,
            has_default,
        };
        match self.graph.node_mut(id).kind.constructors_mut() {
            Some(ctors) => ctors.push(ctor),
            None => unreachable!("members_mut already checked the kind"),
        }
        Ok(())
    }

    /// Append a method signature carried through to the backends
    pub fn add_method(
        &mut self,
        id: NodeId,
        method_name: &str,
        parameters: &[(&str, &str)],
        return_type: &str,
        const_qualified: bool,
        flags: GenFlags,
    ) -> Result<(), BuildError> {
        self.writable()?;
        let mut params = Vec::with_capacity(parameters.len());
        for (ty, param_name) in parameters {
            let (type_path, modifiers) = self.resolve_or_defer(ty)?;
            params.push(Parameter {
                type_path,
                name: param_name.trim().to_string(),
                modifiers,
            });
        }
        let (return_path, return_modifiers) = self.resolve_or_defer(return_type)?;
        let method = Method {
            name: method_name.trim().to_string(),
            parameters: params,
            return_type: return_path,
            return_modifiers,
            const_qualified,
            flags,
        };
        let path = self.graph.path_of(id);
        let found = self.graph.node(id).kind.kind_name();
        match self.graph.node_mut(id).kind.methods_mut() {
            Some(methods) => methods.push(method),
            None => {
                return Err(BuildError::Graph(GraphError::KindMismatch {
                    path,
                    expected: "Struct",
                    found,
                }))
            }
        }
        Ok(())
    }

    /// Declare inheritance; the base must carry the interface trait
    pub fn add_inherits(&mut self, id: NodeId, base: &str) -> Result<(), BuildError> {
        self.writable()?;
        let base_path = self.resolve_now(base)?;
        let base_id = self
            .graph
            .locate(&base_path)
            .ok_or_else(|| GraphError::IdentifierNotFound {
                scope: self.current_scope.clone(),
                name: base_path.clone(),
            })?;
        if !self.graph.node(base_id).traits.interface {
            return Err(BuildError::IllegalInheritance {
                derived: self.graph.path_of(id),
                base: base_path,
            });
        }
        self.graph.node_mut(id).inherits.push(base_path);
        Ok(())
    }

    /// Assert that a type satisfies a concept
    ///
    /// When the type and the concept live in different modules, the type's
    /// module must have declared a direct `requires` edge on the concept's
    /// module beforehand. Concepts without a module (builtins) are exempt.
    pub fn add_constraints(&mut self, id: NodeId, concept: &str) -> Result<(), BuildError> {
        self.writable()?;
        let normalized = name::normalize(concept);
        let concept_id = self
            .graph
            .lookup_identifier(&self.current_scope, &normalized, &mut self.scratch)
            .ok_or_else(|| GraphError::IdentifierNotFound {
                scope: self.current_scope.clone(),
                name: normalized.clone(),
            })?;
        if !matches!(self.graph.node(concept_id).kind, NodeKind::Concept) {
            return Err(BuildError::Graph(GraphError::KindMismatch {
                path: self.graph.path_of(concept_id),
                expected: "Concept",
                found: self.graph.node(concept_id).kind.kind_name(),
            }));
        }

        let type_module = self.graph.node(id).module.clone();
        let concept_module = self.graph.node(concept_id).module.clone();
        if !concept_module.is_empty() && concept_module != type_module {
            let from = self
                .modules
                .locate(&type_module)
                .ok_or_else(|| GraphError::ModuleNotFound {
                    path: type_module.clone(),
                })?;
            let to = self
                .modules
                .locate(&concept_module)
                .ok_or_else(|| GraphError::ModuleNotFound {
                    path: concept_module.clone(),
                })?;
            if !self.modules.has_require(from, to) {
                return Err(BuildError::MissingModuleDependency {
                    from: type_module,
                    to: concept_module,
                    concept: self.graph.path_of(concept_id),
                });
            }
        }

        let concept_path = self.graph.path_of(concept_id);
        self.graph.node_mut(id).constraints.push(concept_path);
        Ok(())
    }

    /// Record an alternate external name for the script backends
    pub fn set_projection(&mut self, id: NodeId, projected: &str) -> Result<(), BuildError> {
        self.writable()?;
        self.graph.node_mut(id).projection = Some(projected.to_string());
        Ok(())
    }

    pub fn set_comment(&mut self, id: NodeId, comment: &str) -> Result<(), BuildError> {
        self.writable()?;
        self.graph.node_mut(id).comment = comment.to_string();
        Ok(())
    }

    /// Remove a leaf node; an authoring-time fixup, never used by backends
    pub fn remove_type(&mut self, id: NodeId) -> Result<(), BuildError> {
        self.writable()?;
        Ok(self.graph.remove_node(id)?)
    }

    // Graph configurators

    pub fn graph_vertex_list(&mut self, id: NodeId, kind: VertexListKind) -> Result<(), BuildError> {
        self.writable()?;
        self.graph.graph_decl_mut(id)?.vertex_list = kind;
        Ok(())
    }

    pub fn graph_directedness(&mut self, id: NodeId, d: Directedness) -> Result<(), BuildError> {
        self.writable()?;
        self.graph.graph_decl_mut(id)?.directedness = d;
        Ok(())
    }

    /// Attach a per-vertex payload keyed by vertex id
    pub fn graph_component(
        &mut self,
        id: NodeId,
        component: &str,
        ty: &str,
        member_name: &str,
    ) -> Result<(), BuildError> {
        self.writable()?;
        let (value_path, _) = self.resolve_or_defer(ty)?;
        self.graph.graph_decl_mut(id)?.components.push(Component {
            name: component.to_string(),
            value_path,
            member_name: member_name.to_string(),
        });
        Ok(())
    }

    /// Attach a tag/payload pair of a polymorphic graph
    pub fn graph_polymorphic(
        &mut self,
        id: NodeId,
        tag: &str,
        ty: &str,
        member_name: &str,
    ) -> Result<(), BuildError> {
        self.writable()?;
        let (tag_path, _) = self.resolve_or_defer(tag)?;
        let (value_path, _) = self.resolve_or_defer(ty)?;
        self.graph
            .graph_decl_mut(id)?
            .polymorphic
            .push(PolymorphicPair {
                tag_path,
                value_path,
                member_name: member_name.to_string(),
            });
        Ok(())
    }

    /// Attach a dictionary from a component-derived key to vertex id
    ///
    /// The component is looked up at `compile()` time, so maps may be
    /// declared before their component.
    pub fn graph_vertex_map(
        &mut self,
        id: NodeId,
        component: &str,
        member_name: &str,
    ) -> Result<(), BuildError> {
        self.writable()?;
        self.graph.graph_decl_mut(id)?.vertex_maps.push(VertexMap {
            component: component.to_string(),
            member_name: member_name.to_string(),
        });
        Ok(())
    }

    pub fn graph_named(&mut self, id: NodeId, named: bool) -> Result<(), BuildError> {
        self.writable()?;
        self.graph.graph_decl_mut(id)?.named = named;
        Ok(())
    }

    pub fn graph_addressable(&mut self, id: NodeId, addressable: bool) -> Result<(), BuildError> {
        self.writable()?;
        self.graph.graph_decl_mut(id)?.addressable = addressable;
        Ok(())
    }

    /// The graph owns its vertices; ownership edges are tracked separately
    pub fn graph_reference(&mut self, id: NodeId) -> Result<(), BuildError> {
        self.writable()?;
        self.graph.graph_decl_mut(id)?.reference = true;
        Ok(())
    }

    /// Ownership edges double as the incidence lists
    pub fn graph_alias(&mut self, id: NodeId) -> Result<(), BuildError> {
        self.writable()?;
        let decl = self.graph.graph_decl_mut(id)?;
        decl.reference = true;
        decl.aliased = true;
        Ok(())
    }

    pub fn graph_mutable_reference(&mut self, id: NodeId, mutable: bool) -> Result<(), BuildError> {
        self.writable()?;
        self.graph.graph_decl_mut(id)?.mutable_reference = mutable;
        Ok(())
    }

    // Finalization

    /// Run the finalization pass: member-type closure, then graph lowering
    ///
    /// Must be called exactly once, with every scope and module closed. On
    /// success the session is finalized and the write API refuses further
    /// calls; every member type is then canonical and every graph has its
    /// concrete layout.
    pub fn compile(&mut self) -> Result<(), BuildError> {
        match self.state {
            SessionState::Compiling | SessionState::Finalized => {
                return Err(BuildError::AlreadyCompiled)
            }
            SessionState::Empty | SessionState::Declaring => {}
        }
        if !self.current_scope.is_empty() {
            return Err(BuildError::UnclosedScope {
                current: self.current_scope.clone(),
            });
        }
        if !self.current_module.is_empty() {
            return Err(BuildError::UnclosedScope {
                current: self.current_module.clone(),
            });
        }

        self.state = SessionState::Compiling;
        elaborate::resolve_member_types(&mut self.graph, &mut self.scratch)?;
        elaborate::lower_graphs(&mut self.graph, &mut self.scratch)?;
        self.state = SessionState::Finalized;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_stack_balances() {
        let mut b = ModuleBuilder::new();
        let outer = b.open_namespace("outer").unwrap();
        let inner = b.open_namespace("inner").unwrap();
        assert_eq!(b.current_scope(), "/outer/inner");

        b.close(inner).unwrap();
        assert_eq!(b.current_scope(), "/outer");
        b.close(outer).unwrap();
        assert_eq!(b.current_scope(), "");
    }

    #[test]
    fn out_of_order_close_fails() {
        let mut b = ModuleBuilder::new();
        let outer = b.open_namespace("outer").unwrap();
        let inner = b.open_namespace("inner").unwrap();

        let err = b.close(outer).unwrap_err();
        assert!(matches!(err, BuildError::ScopeMismatch { .. }));
        // the failed close spent its guard; the inner scope still pops but
        // the outer segment stays behind and the session cannot finalize
        b.close(inner).unwrap();
        assert_eq!(b.current_scope(), "/outer");
        assert!(matches!(
            b.compile().unwrap_err(),
            BuildError::UnclosedScope { .. }
        ));
    }

    #[test]
    fn namespaces_reopen() {
        let mut b = ModuleBuilder::new();
        let ns = b.open_namespace("render").unwrap();
        b.add_value("Pass").unwrap();
        b.close(ns).unwrap();

        let ns = b.open_namespace("render").unwrap();
        b.add_value("Phase").unwrap();
        b.close(ns).unwrap();

        assert!(b.graph().locate("/render/Pass").is_some());
        assert!(b.graph().locate("/render/Phase").is_some());
    }

    #[test]
    fn multi_segment_namespace() {
        let mut b = ModuleBuilder::new();
        let ns = b.open_namespace("render/scene").unwrap();
        assert_eq!(b.current_scope(), "/render/scene");
        b.add_value("Light").unwrap();
        b.close(ns).unwrap();
        assert_eq!(b.current_scope(), "");
        assert!(b.graph().locate("/render/scene/Light").is_some());
    }

    #[test]
    fn duplicate_sibling_rejected() {
        let mut b = ModuleBuilder::new();
        let ns = b.open_namespace("ns").unwrap();
        b.add_value("Foo").unwrap();
        let err = b.add_value("Foo").unwrap_err();
        assert!(matches!(
            err,
            BuildError::Graph(GraphError::DuplicateName { .. })
        ));
        b.close(ns).unwrap();
    }

    #[test]
    fn struct_members_resolve_or_defer() {
        let mut b = ModuleBuilder::new();
        let ns = b.open_namespace("ns").unwrap();
        b.add_value("int32").unwrap();
        let s = b.add_struct("Foo", Traits::default()).unwrap();
        b.add_member(s.node(), true, "int32", "x", "", GenFlags::NONE)
            .unwrap();
        b.add_member(s.node(), true, "Later", "y", "", GenFlags::NONE)
            .unwrap();
        let foo = s.node();
        b.close(s).unwrap();
        b.close(ns).unwrap();

        let decl = b.graph().struct_decl(foo).unwrap();
        assert_eq!(decl.members[0].type_path, "/ns/int32");
        // not declared yet, kept as written for the compile() closure
        assert_eq!(decl.members[1].type_path, "Later");
    }

    #[test]
    fn member_modifiers_strip() {
        let mut b = ModuleBuilder::new();
        let ns = b.open_namespace("ns").unwrap();
        b.add_value("Blob").unwrap();
        let s = b.add_struct("Holder", Traits::default()).unwrap();
        b.add_member(s.node(), true, "const Blob*", "blob", "", GenFlags::NONE)
            .unwrap();
        let holder = s.node();
        b.close(s).unwrap();
        b.close(ns).unwrap();

        let m = &b.graph().struct_decl(holder).unwrap().members[0];
        assert_eq!(m.type_path, "/ns/Blob");
        assert!(m.modifiers.is_const && m.modifiers.is_pointer);
    }

    #[test]
    fn inheritance_requires_interface_base() {
        let mut b = ModuleBuilder::new();
        let ns = b.open_namespace("ns").unwrap();

        let base = b.add_struct("Base", Traits::interface()).unwrap();
        b.close(base).unwrap();
        let plain = b.add_struct("Plain", Traits::default()).unwrap();
        b.close(plain).unwrap();

        let derived = b.add_struct("Derived", Traits::default()).unwrap();
        b.add_inherits(derived.node(), "Base").unwrap();
        let err = b.add_inherits(derived.node(), "Plain").unwrap_err();
        assert_eq!(
            err,
            BuildError::IllegalInheritance {
                derived: "/ns/Derived".into(),
                base: "/ns/Plain".into(),
            }
        );
        let derived_id = derived.node();
        b.close(derived).unwrap();
        b.close(ns).unwrap();

        assert_eq!(
            b.graph().node(derived_id).inherits,
            vec!["/ns/Base".to_string()]
        );
    }

    #[test]
    fn constructor_indices() {
        let mut b = ModuleBuilder::new();
        let ns = b.open_namespace("ns").unwrap();
        b.add_value("int32").unwrap();
        let s = b.add_struct("Pair", Traits::default()).unwrap();
        b.add_member(s.node(), true, "int32", "first", "", GenFlags::NONE)
            .unwrap();
        b.add_member(s.node(), true, "int32", "second", "", GenFlags::NONE)
            .unwrap();
        b.add_constructor(s.node(), &["second", "first"], true).unwrap();

        let err = b
            .add_constructor(s.node(), &["missing"], false)
            .unwrap_err();
        assert!(matches!(err, BuildError::ConstructorMemberNotFound { .. }));

        let pair = s.node();
        b.close(s).unwrap();
        b.close(ns).unwrap();

        let ctor = &b.graph().struct_decl(pair).unwrap().constructors[0];
        assert_eq!(ctor.indices, vec![1, 0]);
        assert!(ctor.has_default);
    }

    #[test]
    fn cross_module_constraint_gate() {
        let mut b = ModuleBuilder::new();

        let m2 = b.open_module("base", ModuleInfo::default()).unwrap();
        let ns = b.open_namespace("base").unwrap();
        b.add_concept("Serializable").unwrap();
        b.close(ns).unwrap();
        b.close_module(m2).unwrap();

        let m1 = b.open_module("render", ModuleInfo::default()).unwrap();
        let ns = b.open_namespace("render").unwrap();
        let s = b.add_struct("Mesh", Traits::default()).unwrap();
        let mesh = s.node();

        let err = b.add_constraints(mesh, "base/Serializable").unwrap_err();
        assert_eq!(
            err,
            BuildError::MissingModuleDependency {
                from: "/render".into(),
                to: "/base".into(),
                concept: "/base/Serializable".into(),
            }
        );

        b.require_module("/base").unwrap();
        b.add_constraints(mesh, "base/Serializable").unwrap();

        b.close(s).unwrap();
        b.close(ns).unwrap();
        b.close_module(m1).unwrap();

        assert_eq!(
            b.graph().node(mesh).constraints,
            vec!["/base/Serializable".to_string()]
        );
    }

    #[test]
    fn transitive_requires_does_not_satisfy_gate() {
        let mut b = ModuleBuilder::new();

        let m = b.open_module("a", ModuleInfo::default()).unwrap();
        let ns = b.open_namespace("a").unwrap();
        b.add_concept("Core").unwrap();
        b.close(ns).unwrap();
        b.close_module(m).unwrap();

        let m = b.open_module("b", ModuleInfo::default()).unwrap();
        b.require_module("/a").unwrap();
        b.close_module(m).unwrap();

        // c requires b, and b requires a; the gate still wants c -> a
        let m = b.open_module("c", ModuleInfo::default()).unwrap();
        b.require_module("/b").unwrap();
        let ns = b.open_namespace("c").unwrap();
        let s = b.add_struct("Thing", Traits::default()).unwrap();
        let err = b.add_constraints(s.node(), "/a/Core").unwrap_err();
        assert!(matches!(err, BuildError::MissingModuleDependency { .. }));
        b.close(s).unwrap();
        b.close(ns).unwrap();
        b.close_module(m).unwrap();
    }

    #[test]
    fn open_module_resolves_requires_list() {
        let mut b = ModuleBuilder::new();
        let m = b.open_module("base", ModuleInfo::default()).unwrap();
        b.close_module(m).unwrap();

        let info = ModuleInfo {
            requires: vec!["/base".to_string()],
            ..ModuleInfo::default()
        };
        let m = b.open_module("render", info).unwrap();
        let render = m.module();
        b.close_module(m).unwrap();

        let base = b.modules().locate("/base").unwrap();
        assert!(b.modules().has_require(render, base));
    }

    #[test]
    fn missing_required_module_is_an_error() {
        let mut b = ModuleBuilder::new();
        let info = ModuleInfo {
            requires: vec!["/nowhere".to_string()],
            ..ModuleInfo::default()
        };
        let err = b.open_module("render", info).unwrap_err();
        assert!(matches!(
            err,
            BuildError::Graph(GraphError::ModuleNotFound { .. })
        ));
    }

    #[test]
    fn compile_rejects_open_scopes() {
        let mut b = ModuleBuilder::new();
        let ns = b.open_namespace("ns").unwrap();
        let err = b.compile().unwrap_err();
        assert_eq!(
            err,
            BuildError::UnclosedScope {
                current: "/ns".into()
            }
        );
        b.close(ns).unwrap();
        b.compile().unwrap();
    }

    #[test]
    fn compile_is_once_and_freezes_writes() {
        let mut b = ModuleBuilder::new();
        let ns = b.open_namespace("ns").unwrap();
        b.add_value("int32").unwrap();
        b.close(ns).unwrap();

        b.compile().unwrap();
        assert!(b.is_finalized());
        assert_eq!(b.compile().unwrap_err(), BuildError::AlreadyCompiled);
        assert_eq!(
            b.open_namespace("more").unwrap_err(),
            BuildError::Finalized
        );
    }

    #[test]
    fn variant_alternatives_resolve_eagerly() {
        let mut b = ModuleBuilder::new();
        let ns = b.open_namespace("ns").unwrap();
        b.add_value("int32").unwrap();
        let v = b.add_variant("Value", GenFlags::NONE).unwrap();
        b.add_variant_alternative(v, "int32").unwrap();
        let err = b.add_variant_alternative(v, "Missing").unwrap_err();
        assert!(matches!(
            err,
            BuildError::Graph(GraphError::IdentifierNotFound { .. })
        ));
        b.close(ns).unwrap();

        assert_eq!(
            b.graph().variant_decl(v).unwrap().alternatives,
            vec!["/ns/int32".to_string()]
        );
    }
}
