//! Error types for graph storage and resolution

use thiserror::Error;

/// Errors raised by the graph store and the resolution engine
///
/// Every variant is fatal to the construction session; the driver is
/// expected to stop on the first error rather than attempt partial
/// generation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// A sibling with the same name already exists under the scope
    #[error("duplicate name `{name}` under `{scope}`")]
    DuplicateName { scope: String, name: String },

    /// Removal requires the node to be a leaf
    #[error("cannot remove `{path}`: node still has children")]
    HasChildren { path: String },

    /// A kind-dispatched accessor was used on the wrong kind
    #[error("`{path}` is a {found}, expected {expected}")]
    KindMismatch {
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    /// Lexical lookup exhausted every enclosing scope
    #[error("identifier `{name}` not found from scope `{scope}`")]
    IdentifierNotFound { scope: String, name: String },

    /// The template part of an instantiation did not resolve
    #[error("template `{name}` not found from scope `{scope}`")]
    TemplateNotFound { scope: String, name: String },

    /// Unbalanced brackets or an otherwise unusable type expression
    #[error("malformed typename `{name}`")]
    MalformedTypename { name: String },

    /// A referenced module path does not exist in the module graph
    #[error("module `{path}` not found")]
    ModuleNotFound { path: String },
}
