//! Error types for the builder and the finalization pass

use thiserror::Error;
use typeloom_graph::GraphError;

/// Errors raised while declaring or compiling a session
///
/// All of these are fatal: a correct declaration sequence never triggers
/// them, and the driver is expected to stop the generation run on the
/// first one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// A scope handle was closed out of LIFO order
    #[error("scope `{suffix}` is not the innermost open scope (current `{current}`)")]
    ScopeMismatch { suffix: String, current: String },

    /// `compile()` was called while scopes or modules were still open
    #[error("cannot compile with an open scope (current `{current}`)")]
    UnclosedScope { current: String },

    /// A declaration was issued in a scope that cannot contain it
    #[error("scope `{scope}` cannot contain a {kind} declaration")]
    InvalidScope { scope: String, kind: &'static str },

    /// Inheritance is only legal from bases carrying the interface trait
    #[error("`{derived}` cannot inherit from non-interface base `{base}`")]
    IllegalInheritance { derived: String, base: String },

    /// A constraint crossed modules without a declared dependency edge
    #[error("constraint on `{concept}` crosses from module `{from}` to `{to}` without a requires edge")]
    MissingModuleDependency {
        from: String,
        to: String,
        concept: String,
    },

    /// A forward reference never got defined
    #[error("member type `{expr}` of `{owner}::{member}` did not resolve")]
    UnresolvedMemberType {
        owner: String,
        member: String,
        expr: String,
    },

    /// A vertex map names a component the graph does not declare
    #[error("graph `{graph}` has no component named `{component}`")]
    UnknownComponent { graph: String, component: String },

    /// A constructor listed a member name the type does not have
    #[error("constructor of `{owner}` references unknown member `{member}`")]
    ConstructorMemberNotFound { owner: String, member: String },

    /// The write API was used after the session was finalized
    #[error("declaration session is already finalized")]
    Finalized,

    /// `compile()` must be called exactly once
    #[error("compile() may only be called once")]
    AlreadyCompiled,
}
