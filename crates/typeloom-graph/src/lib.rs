//! typeloom-graph: Arena graph store and symbol resolution
//!
//! This crate owns the two addressable graphs of a construction session:
//! the syntax graph (every declared type, in a dense, path-indexed
//! ownership tree) and the module graph (build-unit descriptors with
//! explicit `requires` edges). On top of the store it implements lexical
//! symbol resolution, minimal-qualification display names, and on-demand
//! generic instantiation with canonical-signature deduplication.

mod arena;
mod error;
mod graph;
mod instantiate;
mod modules;
mod resolve;
mod scratch;

pub use error::GraphError;
pub use graph::{Node, SyntaxGraph};
pub use modules::ModuleGraph;
pub use scratch::Scratch;
