//! On-demand materialization of generic instantiations

use crate::{GraphError, Node, Scratch, SyntaxGraph};
use typeloom_syntax::{name, InstanceDecl, NodeId, NodeKind};

impl SyntaxGraph {
    /// Materialize the instantiation written as `expr` from `scope`
    ///
    /// Parameters that are themselves instantiations materialize first, so
    /// `Map<K,Vector<V>>` creates `Vector<V>` before the map. The node's
    /// path is the canonical signature; instantiating the same template
    /// with the same resolved parameters returns the existing node.
    pub fn instantiate(
        &mut self,
        scope: &str,
        expr: &str,
        scratch: &mut Scratch,
    ) -> Result<NodeId, GraphError> {
        let (_, params) =
            name::split_template(expr).ok_or_else(|| GraphError::MalformedTypename {
                name: expr.to_string(),
            })?;

        let nested: Vec<String> = params
            .iter()
            .filter(|p| name::is_instance(p))
            .map(|p| p.to_string())
            .collect();
        for param in &nested {
            self.instantiate(scope, param, scratch)?;
        }

        let canonical = self.get_type_path(scope, expr, scratch)?;
        if let Some(id) = self.locate(&canonical) {
            return Ok(id);
        }

        let (owner, local_name) = self.instance_owner(&canonical);
        let owner_id = self.locate(owner);

        let (template, parameters) =
            name::split_template(&canonical).ok_or_else(|| GraphError::MalformedTypename {
                name: canonical.clone(),
            })?;
        let decl = InstanceDecl {
            template: template.to_string(),
            parameters: parameters.iter().map(|p| p.to_string()).collect(),
        };
        self.add_node(owner_id, local_name, Node::new(NodeKind::Instance(decl)))
    }

    /// Split a canonical signature into the template's owning namespace
    /// path and the remaining local name
    ///
    /// The instance node lives under the deepest namespace on the
    /// template's path, so `/std/vector</a/B>` becomes an entry named
    /// `vector</a/B>` under `/std`.
    fn instance_owner<'a>(&self, canonical: &'a str) -> (&'a str, &'a str) {
        let template = name::template_name(canonical);
        let mut owner_end = 0usize;
        let mut pos = 1usize;
        while pos <= template.len() {
            let end = template[pos..]
                .find('/')
                .map(|i| pos + i)
                .unwrap_or(template.len());
            match self.locate(&template[..end]) {
                Some(id) if matches!(self.node(id).kind, NodeKind::Namespace) => {
                    owner_end = end;
                    pos = end + 1;
                }
                _ => break,
            }
        }
        (&canonical[..owner_end], &canonical[owner_end + 1..])
    }
}

#[cfg(test)]
mod tests {
    use crate::{Node, Scratch, SyntaxGraph};
    use typeloom_syntax::{NodeKind, StructDecl};

    fn build() -> SyntaxGraph {
        let mut g = SyntaxGraph::new();
        let std_ns = g.add_node(None, "std", Node::new(NodeKind::Namespace)).unwrap();
        g.add_node(Some(std_ns), "vector", Node::new(NodeKind::Container)).unwrap();
        g.add_node(Some(std_ns), "map", Node::new(NodeKind::Map)).unwrap();
        let ns = g.add_node(None, "a", Node::new(NodeKind::Namespace)).unwrap();
        g.add_node(Some(ns), "K", Node::new(NodeKind::Value)).unwrap();
        g.add_node(Some(ns), "V", Node::new(NodeKind::Struct(StructDecl::default())))
            .unwrap();
        g
    }

    #[test]
    fn instantiation_is_idempotent() {
        let mut g = build();
        let mut scratch = Scratch::new();
        let first = g.instantiate("/a", "std/vector<V>", &mut scratch).unwrap();
        let second = g.instantiate("/a", "std/vector<V>", &mut scratch).unwrap();
        assert_eq!(first, second);
        assert_eq!(g.path_of(first), "/std/vector</a/V>");
    }

    #[test]
    fn whitespace_normalizes_to_one_signature() {
        let mut g = build();
        let mut scratch = Scratch::new();
        let canonical = typeloom_syntax::name::normalize("std::map< K , V >");
        let spaced = g.instantiate("/a", &canonical, &mut scratch).unwrap();
        let tight = g.instantiate("/a", "std/map<K,V>", &mut scratch).unwrap();
        assert_eq!(spaced, tight);
    }

    #[test]
    fn nested_parameters_materialize_first() {
        let mut g = build();
        let mut scratch = Scratch::new();
        let id = g
            .instantiate("/a", "std/map<K,std/vector<V>>", &mut scratch)
            .unwrap();
        assert_eq!(g.path_of(id), "/std/map</a/K,/std/vector</a/V>>");

        let inner = g.locate("/std/vector</a/V>").unwrap();
        let decl = g.instance_decl(inner).unwrap();
        assert_eq!(decl.template, "/std/vector");
        assert_eq!(decl.parameters, vec!["/a/V".to_string()]);

        let outer = g.instance_decl(id).unwrap();
        assert_eq!(outer.template, "/std/map");
        assert_eq!(
            outer.parameters,
            vec!["/a/K".to_string(), "/std/vector</a/V>".to_string()]
        );
    }

    #[test]
    fn unknown_template_is_an_error() {
        let mut g = build();
        let mut scratch = Scratch::new();
        let err = g.instantiate("/a", "Missing<V>", &mut scratch).unwrap_err();
        assert!(matches!(err, crate::GraphError::TemplateNotFound { .. }));
    }

    #[test]
    fn instances_parent_under_template_namespace() {
        let mut g = build();
        let mut scratch = Scratch::new();
        let id = g.instantiate("/a", "std/vector<V>", &mut scratch).unwrap();
        let parent = g.parent(id).unwrap();
        assert_eq!(g.path_of(parent), "/std");
    }
}
