//! The finalization pass: member-type closure and graph lowering

use crate::BuildError;
use typeloom_graph::{GraphError, Node, Scratch, SyntaxGraph};
use typeloom_syntax::{name, GraphDecl, Member, NodeId, NodeKind, StructDecl, Traits};

/// Resolve a (normalized, modifier-free) type expression in `scope`,
/// materializing instantiations on demand
pub(crate) fn resolve_type(
    g: &mut SyntaxGraph,
    scope: &str,
    expr: &str,
    scratch: &mut Scratch,
) -> Result<String, GraphError> {
    if name::is_instance(expr) {
        let id = g.instantiate(scope, expr, scratch)?;
        return Ok(g.path_of(id));
    }
    match g.lookup_type(scope, expr, scratch) {
        Some(id) => Ok(g.path_of(id)),
        None => Err(GraphError::IdentifierNotFound {
            scope: scope.to_string(),
            name: expr.to_string(),
        }),
    }
}

/// A type reference is settled once it names an existing node
///
/// Bare names, forward absolute paths, and signatures whose parameters were
/// not declared yet all fail this test and go through the closure.
fn is_settled(g: &SyntaxGraph, path: &str) -> bool {
    path.is_empty() || g.locate(path).is_some()
}

fn close_one(
    g: &mut SyntaxGraph,
    owner: NodeId,
    member: &str,
    expr: &str,
    scratch: &mut Scratch,
) -> Result<String, BuildError> {
    let scope = g.path_of(owner);
    resolve_type(g, &scope, expr, scratch).map_err(|_| BuildError::UnresolvedMemberType {
        owner: scope,
        member: member.to_string(),
        expr: expr.to_string(),
    })
}

/// Re-resolve every type reference still left as written
///
/// Members, method signatures, and graph payload/component/polymorphic
/// paths are resolved in the owning node's own scope. Anything that still
/// fails here is a forward reference that never got defined, which is
/// fatal.
pub(crate) fn resolve_member_types(
    g: &mut SyntaxGraph,
    scratch: &mut Scratch,
) -> Result<(), BuildError> {
    let ids: Vec<NodeId> = g.ids().collect();
    for id in ids {
        let member_count = g.node(id).kind.members().map(|m| m.len()).unwrap_or(0);
        for index in 0..member_count {
            let member = match g.node(id).kind.members() {
                Some(members) => &members[index],
                None => continue,
            };
            if is_settled(g, &member.type_path) {
                continue;
            }
            let (member_name, expr) = (member.name.clone(), member.type_path.clone());
            let path = close_one(g, id, &member_name, &expr, scratch)?;
            if let Some(members) = g.node_mut(id).kind.members_mut() {
                members[index].type_path = path;
            }
        }

        resolve_methods(g, id, scratch)?;
        resolve_graph_paths(g, id, scratch)?;
    }
    Ok(())
}

fn resolve_methods(
    g: &mut SyntaxGraph,
    id: NodeId,
    scratch: &mut Scratch,
) -> Result<(), BuildError> {
    let method_count = match &g.node(id).kind {
        NodeKind::Struct(s) => s.methods.len(),
        NodeKind::Graph(gd) => gd.methods.len(),
        _ => return Ok(()),
    };
    for index in 0..method_count {
        let method = match &g.node(id).kind {
            NodeKind::Struct(s) => &s.methods[index],
            NodeKind::Graph(gd) => &gd.methods[index],
            _ => unreachable!(),
        };
        let method_name = method.name.clone();

        let mut pending: Vec<(Option<usize>, String)> = Vec::new();
        if !is_settled(g, &method.return_type) {
            pending.push((None, method.return_type.clone()));
        }
        for (pi, param) in method.parameters.iter().enumerate() {
            if !is_settled(g, &param.type_path) {
                pending.push((Some(pi), param.type_path.clone()));
            }
        }
        // re-borrow for each write; close_one needs the graph mutably
        for (slot, expr) in pending {
            let path = close_one(g, id, &method_name, &expr, scratch)?;
            if let Some(methods) = g.node_mut(id).kind.methods_mut() {
                match slot {
                    None => methods[index].return_type = path,
                    Some(pi) => methods[index].parameters[pi].type_path = path,
                }
            }
        }
    }
    Ok(())
}

fn resolve_graph_paths(
    g: &mut SyntaxGraph,
    id: NodeId,
    scratch: &mut Scratch,
) -> Result<(), BuildError> {
    let decl = match &g.node(id).kind {
        NodeKind::Graph(d) => d,
        _ => return Ok(()),
    };

    enum Slot {
        VertexProperty,
        EdgeProperty,
        Component(usize),
        PolymorphicTag(usize),
        PolymorphicValue(usize),
    }

    let mut pending: Vec<(Slot, String, String)> = Vec::new();
    if !is_settled(g, &decl.vertex_property) {
        pending.push((Slot::VertexProperty, "vertex".into(), decl.vertex_property.clone()));
    }
    if !is_settled(g, &decl.edge_property) {
        pending.push((Slot::EdgeProperty, "edge".into(), decl.edge_property.clone()));
    }
    for (i, c) in decl.components.iter().enumerate() {
        if !is_settled(g, &c.value_path) {
            pending.push((Slot::Component(i), c.member_name.clone(), c.value_path.clone()));
        }
    }
    for (i, p) in decl.polymorphic.iter().enumerate() {
        if !is_settled(g, &p.tag_path) {
            pending.push((Slot::PolymorphicTag(i), p.member_name.clone(), p.tag_path.clone()));
        }
        if !is_settled(g, &p.value_path) {
            pending.push((Slot::PolymorphicValue(i), p.member_name.clone(), p.value_path.clone()));
        }
    }

    for (slot, label, expr) in pending {
        let path = close_one(g, id, &label, &expr, scratch)?;
        let decl = match &mut g.node_mut(id).kind {
            NodeKind::Graph(d) => d,
            _ => unreachable!(),
        };
        match slot {
            Slot::VertexProperty => decl.vertex_property = path,
            Slot::EdgeProperty => decl.edge_property = path,
            Slot::Component(i) => decl.components[i].value_path = path,
            Slot::PolymorphicTag(i) => decl.polymorphic[i].tag_path = path,
            Slot::PolymorphicValue(i) => decl.polymorphic[i].value_path = path,
        }
    }
    Ok(())
}

// Well-known template paths registered by the prelude. Array-based storage
// picks the vector family, node-based the list family; the pmr variants
// thread a polymorphic allocator.
const VECTOR: &str = "/std/vector";
const PMR_VECTOR: &str = "/std/pmr/vector";
const LIST: &str = "/std/list";
const PMR_LIST: &str = "/std/pmr/list";
const MAP: &str = "/std/map";
const PMR_MAP: &str = "/std/pmr/map";
const UNORDERED_MAP: &str = "/std/unordered_map";
const PMR_UNORDERED_MAP: &str = "/std/pmr/unordered_map";
const STRING: &str = "/std/string";
const PMR_STRING: &str = "/std/pmr/string";
const VERTEX_ID: &str = "/uint32";

/// Whether the type at `path` threads a polymorphic allocator
fn is_pmr(g: &SyntaxGraph, path: &str) -> bool {
    match g.locate(path) {
        Some(id) => g.node(id).traits.allocator_aware,
        None => false,
    }
}

struct Lowering<'a> {
    g: &'a mut SyntaxGraph,
    scratch: &'a mut Scratch,
    graph_path: String,
    /// allocator-awareness of the graph itself
    pmr: bool,
    vector_storage: bool,
}

impl Lowering<'_> {
    fn sequence_of(&mut self, element: &str, pmr: bool) -> Result<String, BuildError> {
        let template = match (self.vector_storage, pmr) {
            (true, true) => PMR_VECTOR,
            (true, false) => VECTOR,
            (false, true) => PMR_LIST,
            (false, false) => LIST,
        };
        self.instance(template, &[element])
    }

    fn instance(&mut self, template: &str, params: &[&str]) -> Result<String, BuildError> {
        let mut expr = String::from(template);
        expr.push('<');
        for (i, p) in params.iter().enumerate() {
            if i > 0 {
                expr.push(',');
            }
            expr.push_str(p);
        }
        expr.push('>');
        let id = self.g.instantiate("", &expr, self.scratch)?;
        Ok(self.g.path_of(id))
    }

    fn string_type(&self) -> &'static str {
        if self.pmr {
            PMR_STRING
        } else {
            STRING
        }
    }

    /// Insert a synthesized record type as a child of the graph node
    fn add_record(
        &mut self,
        graph_id: NodeId,
        record: &str,
        members: Vec<Member>,
    ) -> Result<String, BuildError> {
        let decl = StructDecl {
            members,
            ..StructDecl::default()
        };
        let traits = Traits {
            allocator_aware: self.pmr,
            ..Traits::default()
        };
        let mut node = Node::with_traits(NodeKind::Struct(decl), traits);
        node.module = self.g.node(graph_id).module.clone();
        let id = self.g.add_node(Some(graph_id), record, node)?;
        Ok(self.g.path_of(id))
    }
}

fn synthesized(type_path: String, member_name: &str) -> Member {
    Member {
        type_path,
        name: member_name.to_string(),
        public: true,
        ..Member::default()
    }
}

/// Lower every abstract graph declaration into its concrete member layout
///
/// Runs after the member-type closure, so every payload and component path
/// already names an existing node. Synthesized record types (`Vertex`,
/// `OutEdge`, `Edge`, `Object`) become children of the graph node;
/// synthesized members append after any driver-declared members.
pub(crate) fn lower_graphs(g: &mut SyntaxGraph, scratch: &mut Scratch) -> Result<(), BuildError> {
    let graphs: Vec<NodeId> = g
        .ids()
        .filter(|&id| matches!(g.node(id).kind, NodeKind::Graph(_)))
        .collect();

    for id in graphs {
        lower_graph(g, id, scratch)?;
    }
    Ok(())
}

fn lower_graph(g: &mut SyntaxGraph, id: NodeId, scratch: &mut Scratch) -> Result<(), BuildError> {
    let decl: GraphDecl = (*g.graph_decl(id)?).clone();
    let graph_path = g.path_of(id);
    let pmr = g.node(id).traits.allocator_aware;

    let mut lowering = Lowering {
        g: &mut *g,
        scratch: &mut *scratch,
        graph_path,
        pmr,
        vector_storage: decl.is_vector(),
    };

    let mut members: Vec<Member> = Vec::new();

    // vertex record; components embed here when storage is node-based
    let mut vertex_members = Vec::new();
    if decl.components_in_vertex() {
        for c in &decl.components {
            vertex_members.push(synthesized(c.value_path.clone(), &c.member_name));
        }
    }
    let vertex_path = lowering.add_record(id, "Vertex", vertex_members)?;
    let vertices = lowering.sequence_of(&vertex_path, pmr)?;
    members.push(synthesized(vertices, "vertices"));

    // incidence lists: an edge record per out edge, one list per vertex
    let mut out_edge_members = vec![synthesized(VERTEX_ID.to_string(), "target")];
    if decl.has_edge_property() && !decl.needs_edge_list() {
        out_edge_members.push(synthesized(decl.edge_property.clone(), "property"));
    }
    let out_edge_path = lowering.add_record(id, "OutEdge", out_edge_members)?;
    let edge_list = lowering.sequence_of(&out_edge_path, pmr)?;
    let incidence = lowering.sequence_of(&edge_list, pmr)?;
    members.push(synthesized(incidence.clone(), "outEdges"));
    if decl.is_bidirectional() {
        members.push(synthesized(incidence, "inEdges"));
    }

    if decl.has_vertex_property() {
        let container_pmr = pmr || is_pmr(lowering.g, &decl.vertex_property);
        let store = lowering.sequence_of(&decl.vertex_property, container_pmr)?;
        members.push(synthesized(store, "vertexProperties"));
    }

    if !decl.components_in_vertex() {
        for c in &decl.components {
            let container_pmr = pmr || is_pmr(lowering.g, &c.value_path);
            let store = lowering.sequence_of(&c.value_path, container_pmr)?;
            members.push(synthesized(store, &c.member_name));
        }
    }

    // one container per tag of a polymorphic graph; payloads stay
    // non-intrusive
    for p in &decl.polymorphic {
        let container_pmr = pmr || is_pmr(lowering.g, &p.value_path);
        let store = lowering.sequence_of(&p.value_path, container_pmr)?;
        members.push(synthesized(store, &p.member_name));
    }

    if decl.needs_edge_list() {
        let mut edge_members = vec![
            synthesized(VERTEX_ID.to_string(), "source"),
            synthesized(VERTEX_ID.to_string(), "target"),
        ];
        if decl.has_edge_property() {
            edge_members.push(synthesized(decl.edge_property.clone(), "property"));
        }
        let edge_path = lowering.add_record(id, "Edge", edge_members)?;
        let edges = lowering.sequence_of(&edge_path, pmr)?;
        members.push(synthesized(edges, "edges"));
    }

    for vm in &decl.vertex_maps {
        let component = decl.component(&vm.component).ok_or_else(|| {
            BuildError::UnknownComponent {
                graph: lowering.graph_path.clone(),
                component: vm.component.clone(),
            }
        })?;
        let key_pmr = pmr || is_pmr(lowering.g, &component.value_path);
        let template = if key_pmr { PMR_UNORDERED_MAP } else { UNORDERED_MAP };
        let map = lowering.instance(template, &[component.value_path.as_str(), VERTEX_ID])?;
        members.push(synthesized(map, &vm.member_name));
    }

    if decl.named {
        let names = lowering.sequence_of(lowering.string_type(), pmr)?;
        members.push(synthesized(names, "names"));
    }

    if decl.addressable {
        let template = if pmr { PMR_MAP } else { MAP };
        let index = lowering.instance(template, &[lowering.string_type(), VERTEX_ID])?;
        members.push(synthesized(index, "nameIndex"));
    }

    // ownership store of a reference graph; alias graphs reuse the
    // incidence lists instead
    if decl.reference && !decl.aliased {
        let id_list = lowering.sequence_of(VERTEX_ID, pmr)?;
        let object_members = vec![
            synthesized(id_list.clone(), "children"),
            synthesized(id_list, "parents"),
        ];
        let object_path = lowering.add_record(id, "Object", object_members)?;
        let objects = lowering.sequence_of(&object_path, pmr)?;
        members.push(synthesized(objects, "objects"));
    }

    let decl_mut = g.graph_decl_mut(id)?;
    decl_mut.members.extend(members);
    Ok(())
}
