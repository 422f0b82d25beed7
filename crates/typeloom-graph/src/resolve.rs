//! Symbol resolution: scope walks, canonical paths, display names

use crate::{GraphError, Scratch, SyntaxGraph};
use typeloom_syntax::{name, NodeId};

impl SyntaxGraph {
    /// Resolve `ident` as written from `scope`, innermost scope first
    ///
    /// Absolute names short-circuit to an exact lookup. Otherwise every
    /// enclosing scope is tried outward to the root; the first match wins
    /// (standard lexical scoping).
    pub fn lookup_identifier(
        &self,
        scope: &str,
        ident: &str,
        scratch: &mut Scratch,
    ) -> Option<NodeId> {
        debug_assert!(!ident.is_empty());
        if ident.starts_with('/') {
            return self.locate(ident);
        }
        debug_assert!(name::is_type_path(scope));

        let mut buf = scratch.take();
        let mut local = scope;
        let found = loop {
            buf.clear();
            buf.push_str(local);
            buf.push('/');
            buf.push_str(ident);
            if let Some(id) = self.locate(&buf) {
                break Some(id);
            }
            if local.is_empty() {
                break None;
            }
            local = name::parent_path(local);
        };
        scratch.put(buf);
        found
    }

    /// The same walk as [`lookup_identifier`], restricted to nodes that can
    /// stand in a type position
    ///
    /// Non-type matches (namespaces, concepts) do not shadow; the walk
    /// continues outward past them. Instance expressions resolve to their
    /// canonical signature without materializing a node.
    ///
    /// [`lookup_identifier`]: SyntaxGraph::lookup_identifier
    pub fn lookup_type(&self, scope: &str, expr: &str, scratch: &mut Scratch) -> Option<NodeId> {
        if name::is_instance(expr) {
            return match self.get_type_path(scope, expr, scratch) {
                Ok(path) => self.locate(&path),
                Err(_) => None,
            };
        }
        if expr.starts_with('/') {
            return self
                .locate(expr)
                .filter(|&id| self.node(id).kind.is_type());
        }
        debug_assert!(name::is_type_path(scope));

        let mut buf = scratch.take();
        let mut local = scope;
        let found = loop {
            buf.clear();
            buf.push_str(local);
            buf.push('/');
            buf.push_str(expr);
            match self.locate(&buf) {
                Some(id) if self.node(id).kind.is_type() => break Some(id),
                _ => {}
            }
            if local.is_empty() {
                break None;
            }
            local = name::parent_path(local);
        };
        scratch.put(buf);
        found
    }

    /// Canonicalize a (normalized) type expression into an absolute path
    ///
    /// Plain names resolve through the scope walk; `Name<...>` forms
    /// resolve the template and every parameter recursively and compose the
    /// canonical signature string. The signature is purely syntactic, so
    /// repeated calls are idempotent regardless of call order.
    pub fn get_type_path(
        &self,
        scope: &str,
        expr: &str,
        scratch: &mut Scratch,
    ) -> Result<String, GraphError> {
        if expr.is_empty() {
            return Ok(String::new());
        }
        if !name::is_instance(expr) {
            let id = self
                .lookup_identifier(scope, expr, scratch)
                .ok_or_else(|| GraphError::IdentifierNotFound {
                    scope: scope.to_string(),
                    name: expr.to_string(),
                })?;
            return Ok(self.path_of(id));
        }

        let (template, params) =
            name::split_template(expr).ok_or_else(|| GraphError::MalformedTypename {
                name: expr.to_string(),
            })?;
        let template_id = self
            .lookup_identifier(scope, template, scratch)
            .ok_or_else(|| GraphError::TemplateNotFound {
                scope: scope.to_string(),
                name: template.to_string(),
            })?;

        let mut result = self.path_of(template_id);
        result.push('<');
        for (i, param) in params.iter().enumerate() {
            if i > 0 {
                result.push(',');
            }
            let path = self.get_type_path(scope, param, scratch)?;
            result.push_str(&path);
        }
        result.push('>');
        Ok(result)
    }

    /// The minimally qualified spelling of a node as seen from `scope`
    ///
    /// Only the suffix below the longest common ancestor is kept, so
    /// generated references carry no redundant qualification. Instance
    /// signatures are rebuilt with each constituent minimized.
    pub fn dependent_name(&self, scope: &str, id: NodeId, scratch: &mut Scratch) -> String {
        let mut path = scratch.take();
        self.path_of_into(id, &mut path);
        let result = self.dependent_of_path(scope, &path);
        scratch.put(path);
        result
    }

    fn dependent_of_path(&self, scope: &str, path: &str) -> String {
        match name::split_template(path) {
            Some((template, params)) => {
                let mut out = self.dependent_of_path(scope, template);
                out.push('<');
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    out.push_str(&self.dependent_of_path(scope, param));
                }
                out.push('>');
                out
            }
            None => name::dependent_path(scope, path).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{Node, Scratch, SyntaxGraph};
    use typeloom_syntax::{NodeKind, StructDecl};

    fn build() -> SyntaxGraph {
        let mut g = SyntaxGraph::new();
        let a = g.add_node(None, "A", Node::new(NodeKind::Namespace)).unwrap();
        let b = g.add_node(Some(a), "B", Node::new(NodeKind::Namespace)).unwrap();
        g.add_node(Some(a), "X", Node::new(NodeKind::Value)).unwrap();
        g.add_node(Some(b), "X", Node::new(NodeKind::Value)).unwrap();
        g.add_node(Some(a), "Only", Node::new(NodeKind::Value)).unwrap();
        g
    }

    #[test]
    fn innermost_scope_wins() {
        let g = build();
        let mut scratch = Scratch::new();
        let id = g.lookup_identifier("/A/B", "X", &mut scratch).unwrap();
        assert_eq!(g.path_of(id), "/A/B/X");

        let outer = g.lookup_identifier("/A", "X", &mut scratch).unwrap();
        assert_eq!(g.path_of(outer), "/A/X");
    }

    #[test]
    fn walk_reaches_enclosing_scopes() {
        let g = build();
        let mut scratch = Scratch::new();
        let id = g.lookup_identifier("/A/B", "Only", &mut scratch).unwrap();
        assert_eq!(g.path_of(id), "/A/Only");
        assert!(g.lookup_identifier("/A/B", "Missing", &mut scratch).is_none());
    }

    #[test]
    fn absolute_names_short_circuit() {
        let g = build();
        let mut scratch = Scratch::new();
        let id = g.lookup_identifier("/A/B", "/A/X", &mut scratch).unwrap();
        assert_eq!(g.path_of(id), "/A/X");
    }

    #[test]
    fn type_lookup_skips_non_types() {
        let mut g = SyntaxGraph::new();
        let ns = g.add_node(None, "ns", Node::new(NodeKind::Namespace)).unwrap();
        let inner = g.add_node(Some(ns), "inner", Node::new(NodeKind::Namespace)).unwrap();
        // a namespace shadowing a struct of the same name one level up
        g.add_node(Some(inner), "Foo", Node::new(NodeKind::Namespace)).unwrap();
        g.add_node(Some(ns), "Foo", Node::new(NodeKind::Struct(StructDecl::default())))
            .unwrap();

        let mut scratch = Scratch::new();
        let id = g.lookup_type("/ns/inner", "Foo", &mut scratch).unwrap();
        assert_eq!(g.path_of(id), "/ns/Foo");
        // the identifier walk stops at the namespace instead
        let ident = g.lookup_identifier("/ns/inner", "Foo", &mut scratch).unwrap();
        assert_eq!(g.path_of(ident), "/ns/inner/Foo");
    }

    #[test]
    fn multi_segment_relative_names() {
        let g = build();
        let mut scratch = Scratch::new();
        let id = g.lookup_identifier("/A", "B/X", &mut scratch).unwrap();
        assert_eq!(g.path_of(id), "/A/B/X");
    }

    #[test]
    fn dependent_names_are_minimal() {
        let g = build();
        let mut scratch = Scratch::new();
        let bx = g.locate("/A/B/X").unwrap();
        let ax = g.locate("/A/X").unwrap();
        assert_eq!(g.dependent_name("/A/B", bx, &mut scratch), "X");
        assert_eq!(g.dependent_name("/A/B", ax, &mut scratch), "X");
        assert_eq!(g.dependent_name("/A", bx, &mut scratch), "B/X");
        assert_eq!(g.dependent_name("", bx, &mut scratch), "A/B/X");
    }
}
