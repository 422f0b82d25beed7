//! Typename and path utilities
//!
//! Every function here is a pure transformation over `&str`. Type paths are
//! `/`-joined ancestor chains (`/render/Mesh`); instance signatures embed
//! their resolved parameter paths in angle brackets
//! (`/std/vector</render/Mesh>`).

use serde::{Deserialize, Serialize};

/// Separators that never carry adjacent whitespace in a normalized name
const SEPARATORS: &[&str] = &[",", "<", ">", "/", "=", "&", "*", "[[", "]]"];

/// Normalize a typename written by a driver into canonical spelling
///
/// Scope operators become `/`, whitespace collapses, and spaces around
/// separators are removed so that `Map< K , V >` and `Map<K,V>` spell the
/// same signature. Outer parentheses are stripped.
pub fn normalize(name: &str) -> String {
    let mut s: String = name.replace("::", "/").replace(['\t', '\n'], " ");
    s = s.trim().to_string();

    while s.len() >= 2 && s.starts_with('(') && s.ends_with(')') {
        s = s[1..s.len() - 1].trim().to_string();
    }

    for sep in SEPARATORS {
        let spaced_before = format!(" {sep}");
        let spaced_after = format!("{sep} ");
        while s.contains(&spaced_before) {
            s = s.replace(&spaced_before, sep);
        }
        while s.contains(&spaced_after) {
            s = s.replace(&spaced_after, sep);
        }
    }

    while s.contains("  ") {
        s = s.replace("  ", " ");
    }

    s.trim().to_string()
}

/// Whether a normalized name is well formed: no scope operators left, no
/// stray braces, balanced parentheses and angle brackets
pub fn is_valid(name: &str) -> bool {
    if name.contains("::") {
        return false;
    }
    if name.contains(['\t', '\n', '\r', '{', '}']) {
        return false;
    }

    let mut parens = 0i32;
    let mut angles = 0i32;
    for c in name.chars() {
        match c {
            '(' => parens += 1,
            ')' => parens -= 1,
            '<' => angles += 1,
            '>' => angles -= 1,
            _ => {}
        }
    }
    parens == 0 && angles == 0
}

/// A type path is absolute (or the root scope, spelled as the empty string)
pub fn is_type_path(path: &str) -> bool {
    path.is_empty() || path.starts_with('/')
}

/// An instance signature: `Name<...>`
pub fn is_instance(name: &str) -> bool {
    name.ends_with('>')
}

/// The enclosing scope of a path: `/a/b/C` -> `/a/b`, `/C` -> ``
pub fn parent_path(path: &str) -> &str {
    match path.rfind('/') {
        Some(pos) => &path[..pos],
        None => "",
    }
}

/// The final segment of a path: `/a/b/C` -> `C`
pub fn extract_name(path: &str) -> &str {
    match path.rfind('/') {
        Some(pos) => &path[pos + 1..],
        None => path,
    }
}

/// The suffix of `type_path` below its longest common ancestor with `scope`
///
/// This is the minimally qualified spelling of a type as seen from a usage
/// scope, analogous to a relative filesystem path. Referencing the scope
/// itself (or an ancestor of it) yields the empty string.
pub fn dependent_path<'a>(scope: &str, type_path: &'a str) -> &'a str {
    if scope.is_empty() {
        return type_path.strip_prefix('/').unwrap_or(type_path);
    }
    debug_assert!(scope.starts_with('/'));
    debug_assert!(type_path.starts_with('/'));

    let mut pos = 1usize;
    loop {
        let end0 = scope[pos..].find('/').map(|i| pos + i);
        let end1 = type_path[pos..].find('/').map(|i| pos + i);
        let seg0 = &scope[pos..end0.unwrap_or(scope.len())];
        let seg1 = &type_path[pos..end1.unwrap_or(type_path.len())];

        if seg0 != seg1 {
            return &type_path[pos..];
        }
        match (end0, end1) {
            // scope == type_path
            (None, None) => return "",
            // scope exhausted, type path continues below it
            (None, Some(e1)) => return &type_path[e1 + 1..],
            // type path is an ancestor of the scope
            (Some(_), None) => return "",
            (Some(e0), Some(_)) => pos = e0 + 1,
        }
    }
}

/// Template part of an instance signature: `Map<K,V>` -> `Map`
pub fn template_name(expr: &str) -> &str {
    match expr.find('<') {
        Some(pos) => &expr[..pos],
        None => expr,
    }
}

/// Split an instance signature into its template name and top-level
/// parameters, respecting nested angle brackets
///
/// Returns `None` when the signature is malformed (missing or unbalanced
/// brackets, empty template name).
pub fn split_template(expr: &str) -> Option<(&str, Vec<&str>)> {
    if !expr.ends_with('>') {
        return None;
    }
    let lt = expr.find('<')?;
    let template = &expr[..lt];
    if template.is_empty() {
        return None;
    }

    let body = &expr[lt + 1..expr.len() - 1];
    let mut params = Vec::new();
    let mut depth = 0i32;
    let mut start = 0usize;
    for (i, c) in body.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => {
                depth -= 1;
                if depth < 0 {
                    return None;
                }
            }
            ',' if depth == 0 => {
                let param = body[start..i].trim();
                if !param.is_empty() {
                    params.push(param);
                }
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return None;
    }
    let last = body[start..].trim();
    if !last.is_empty() {
        params.push(last);
    }
    Some((template, params))
}

/// Qualifier flags stripped off a member type expression
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeModifiers {
    pub is_const: bool,
    pub is_pointer: bool,
    pub is_reference: bool,
    pub is_optional: bool,
}

/// Strip qualification markers off a normalized type expression
///
/// Handles a leading `[[optional]]` marker, trailing `&`/`*`, and a `const`
/// prefix or infix, returning the bare name and the extracted flags.
pub fn strip_modifiers(expr: &str) -> (&str, TypeModifiers) {
    let mut s = expr.trim();
    let mut m = TypeModifiers::default();

    if let Some(rest) = s.strip_prefix("[[optional]]") {
        m.is_optional = true;
        s = rest.trim_start();
    }
    if let Some(rest) = s.strip_suffix('&') {
        m.is_reference = true;
        s = rest.trim_end();
    }
    if let Some(rest) = s.strip_suffix('*') {
        m.is_pointer = true;
        s = rest.trim_end();
    }
    if let Some(rest) = s.strip_prefix("const ") {
        m.is_const = true;
        s = rest.trim_start();
    } else if let Some(rest) = s.strip_suffix(" const") {
        m.is_const = true;
        s = rest.trim_end();
    }

    (s, m)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_scope_operator() {
        assert_eq!(normalize("std::vector"), "std/vector");
        assert_eq!(normalize("  Foo  "), "Foo");
        assert_eq!(normalize("(Foo)"), "Foo");
    }

    #[test]
    fn normalize_template_whitespace() {
        assert_eq!(normalize("Map< K , V >"), "Map<K,V>");
        assert_eq!(normalize("Map<K, Vector< V >>"), "Map<K,Vector<V>>");
        assert_eq!(normalize("const Foo *"), "const Foo*");
    }

    #[test]
    fn validation() {
        assert!(is_valid("Map<K,V>"));
        assert!(!is_valid("std::vector"));
        assert!(!is_valid("Map<K"));
        assert!(!is_valid("Foo{}"));
    }

    #[test]
    fn path_parts() {
        assert_eq!(parent_path("/a/b/C"), "/a/b");
        assert_eq!(parent_path("/C"), "");
        assert_eq!(parent_path(""), "");
        assert_eq!(extract_name("/a/b/C"), "C");
        assert_eq!(extract_name("C"), "C");
    }

    #[test]
    fn dependent_path_suffixes() {
        assert_eq!(dependent_path("/a/b", "/a/b/C"), "C");
        assert_eq!(dependent_path("/a/b", "/a/x/Y"), "x/Y");
        assert_eq!(dependent_path("/a", "/b/C"), "b/C");
        assert_eq!(dependent_path("", "/a/C"), "a/C");
        assert_eq!(dependent_path("/a/b", "/a/b"), "");
        assert_eq!(dependent_path("/a/b/c", "/a/b"), "");
    }

    #[test]
    fn template_splitting() {
        let (name, params) = split_template("Map<K,V>").unwrap();
        assert_eq!(name, "Map");
        assert_eq!(params, vec!["K", "V"]);

        let (name, params) = split_template("Map<K,Vector<V>>").unwrap();
        assert_eq!(name, "Map");
        assert_eq!(params, vec!["K", "Vector<V>"]);

        let (name, params) = split_template("/std/map</a/K,/std/vector</a/V>>").unwrap();
        assert_eq!(name, "/std/map");
        assert_eq!(params, vec!["/a/K", "/std/vector</a/V>"]);
    }

    #[test]
    fn template_splitting_rejects_malformed() {
        assert!(split_template("Plain").is_none());
        assert!(split_template("Map<K").is_none());
        assert!(split_template("<K>").is_none());
        assert!(split_template("Map<K>>").is_none());
    }

    #[test]
    fn modifier_stripping() {
        let (bare, m) = strip_modifiers("const Foo*");
        assert_eq!(bare, "Foo");
        assert!(m.is_const && m.is_pointer);
        assert!(!m.is_reference && !m.is_optional);

        let (bare, m) = strip_modifiers("[[optional]]Bar");
        assert_eq!(bare, "Bar");
        assert!(m.is_optional);

        let (bare, m) = strip_modifiers("Baz&");
        assert_eq!(bare, "Baz");
        assert!(m.is_reference);

        let (bare, m) = strip_modifiers("Plain");
        assert_eq!(bare, "Plain");
        assert_eq!(m, TypeModifiers::default());
    }
}
