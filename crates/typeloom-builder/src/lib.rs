//! typeloom-builder: Scope-checked construction and graph elaboration
//!
//! This crate is the write side of a declaration session. A
//! [`ModuleBuilder`] cursor tracks the open type scope and module path,
//! hands out LIFO-checked guards for nested scopes, resolves type
//! references as they are written (deferring forward references), and
//! finally runs `compile()`: the member-type closure followed by the
//! lowering of every abstract graph declaration into its concrete member
//! layout.

mod builder;
mod elaborate;
mod error;
mod handle;
pub mod prelude;

pub use builder::ModuleBuilder;
pub use error::BuildError;
pub use handle::{ModuleGuard, ScopeGuard};
