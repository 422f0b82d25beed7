//! typeloom - a symbolic type graph for offline code generation
//!
//! This is the root workspace crate that provides integration tests.
//! The actual implementation is in the workspace member crates.

// Re-export main crates for convenience
pub use typeloom_builder as builder;
pub use typeloom_graph as graph;
pub use typeloom_syntax as syntax;
