//! Inspecting the synthesized layout of a lowered scene graph

mod common;

use typeloom::syntax::{Member, NodeKind};

#[test]
fn scene_graph_lowers_to_a_complete_layout() {
    let (mut b, graph_id) = common::declare_render_session();
    b.compile().unwrap();

    let g = b.graph();
    let decl = g.graph_decl(graph_id).unwrap();
    let layout: Vec<(&str, &str)> = decl
        .members
        .iter()
        .map(|m| (m.name.as_str(), m.type_path.as_str()))
        .collect();

    assert_eq!(
        layout,
        vec![
            ("vertices", "/std/vector</render/SceneGraph/Vertex>"),
            (
                "outEdges",
                "/std/vector</std/vector</render/SceneGraph/OutEdge>>"
            ),
            (
                "inEdges",
                "/std/vector</std/vector</render/SceneGraph/OutEdge>>"
            ),
            ("names", "/std/vector</std/string>"),
            ("meshes", "/std/vector</render/Mesh>"),
            ("lights", "/std/vector</render/Light>"),
        ]
    );
}

#[test]
fn synthesized_records_are_children_of_the_graph() {
    let (mut b, graph_id) = common::declare_render_session();
    b.compile().unwrap();

    let g = b.graph();
    let children: Vec<String> = g.children(graph_id).map(|c| g.path_of(c)).collect();
    assert_eq!(
        children,
        vec![
            "/render/SceneGraph/Vertex".to_string(),
            "/render/SceneGraph/OutEdge".to_string(),
        ]
    );

    for child in g.children(graph_id) {
        assert!(matches!(g.node(child).kind, NodeKind::Struct(_)));
        assert_eq!(g.node(child).module, "/render");
    }
}

#[test]
fn every_member_type_is_canonical_after_compile() {
    let (mut b, _) = common::declare_render_session();
    b.compile().unwrap();

    let g = b.graph();
    let check = |owner: &str, m: &Member| {
        assert!(
            m.type_path.is_empty() || m.is_resolved(),
            "{owner}::{} kept the raw spelling `{}`",
            m.name,
            m.type_path
        );
        if !m.type_path.is_empty() {
            assert!(
                g.locate(&m.type_path).is_some(),
                "{owner}::{} points at missing `{}`",
                m.name,
                m.type_path
            );
        }
    };

    for id in g.ids() {
        if let Some(members) = g.node(id).kind.members() {
            let owner = g.path_of(id);
            for m in members {
                check(&owner, m);
            }
        }
    }
}
