//! Shared fixtures for the integration tests

use typeloom::builder::prelude::install_defaults;
use typeloom::builder::ModuleBuilder;
use typeloom::syntax::{Directedness, GenFlags, ModuleInfo, NodeId, Traits};

/// Declare a small two-module render project: a `base` module owning the
/// shared concepts and a `render` module owning the scene types and a
/// bidirectional scene graph. Left uncompiled so tests can exercise both
/// phases.
pub fn declare_render_session() -> (ModuleBuilder, NodeId) {
    let mut b = ModuleBuilder::new();
    install_defaults(&mut b).expect("defaults install into an empty session");

    let base = b
        .open_module(
            "base",
            ModuleInfo {
                folder: "base".into(),
                file_prefix: "Base".into(),
                ..ModuleInfo::default()
            },
        )
        .unwrap();
    let ns = b.open_namespace("base").unwrap();
    b.add_concept("Serializable").unwrap();
    b.close(ns).unwrap();
    b.close_module(base).unwrap();

    let render = b
        .open_module(
            "render",
            ModuleInfo {
                folder: "render".into(),
                file_prefix: "Render".into(),
                requires: vec!["/base".to_string()],
                ..ModuleInfo::default()
            },
        )
        .unwrap();
    let ns = b.open_namespace("render").unwrap();

    let mode = b.add_enum("BlendMode", Traits::default()).unwrap();
    b.add_enum_value(mode, "Opaque", "").unwrap();
    b.add_enum_value(mode, "Additive", "").unwrap();

    let mesh = b.add_struct("Mesh", Traits::default()).unwrap();
    b.add_member(mesh.node(), true, "std/vector<float32>", "positions", "", GenFlags::NONE)
        .unwrap();
    b.add_member(mesh.node(), true, "BlendMode", "mode", "", GenFlags::NONE)
        .unwrap();
    let mesh_id = mesh.node();
    b.close(mesh).unwrap();
    b.add_constraints(mesh_id, "base/Serializable").unwrap();

    let light = b.add_struct("Light", Traits::default()).unwrap();
    b.add_member(light.node(), true, "float32", "intensity", "1.0", GenFlags::NONE)
        .unwrap();
    b.close(light).unwrap();

    b.add_tag("MeshTag", true, &[]).unwrap();
    b.add_tag("LightTag", true, &[]).unwrap();

    let graph = b
        .add_graph("SceneGraph", "", "", Traits::default())
        .unwrap();
    let graph_id = graph.node();
    b.graph_directedness(graph_id, Directedness::Bidirectional)
        .unwrap();
    b.graph_component(graph_id, "Name", "std/string", "names")
        .unwrap();
    b.graph_polymorphic(graph_id, "MeshTag", "Mesh", "meshes")
        .unwrap();
    b.graph_polymorphic(graph_id, "LightTag", "Light", "lights")
        .unwrap();
    b.close(graph).unwrap();

    b.close(ns).unwrap();
    b.close_module(render).unwrap();

    (b, graph_id)
}
