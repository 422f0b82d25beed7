//! The module graph: build-unit descriptors and their dependencies

use crate::arena::Arena;
use crate::GraphError;
use serde::{Deserialize, Serialize};
use typeloom_syntax::{ModuleId, ModuleInfo};

/// Structurally identical to the syntax graph, addressing module
/// descriptors instead of types
///
/// The generic directed relation carries `requires` edges. Dependency
/// queries are deliberately direct-edge-only: cross-module coupling must be
/// declared, not inferred through transitivity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModuleGraph {
    arena: Arena<ModuleInfo>,
}

impl ModuleGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = ModuleId> {
        self.arena.ids().map(ModuleId)
    }

    pub fn add_module(
        &mut self,
        parent: Option<ModuleId>,
        name: &str,
        info: ModuleInfo,
    ) -> Result<ModuleId, GraphError> {
        match self.arena.add(parent.map(|p| p.0), name, info) {
            Some(id) => Ok(ModuleId(id)),
            None => Err(GraphError::DuplicateName {
                scope: parent.map(|p| self.path_of(p)).unwrap_or_default(),
                name: name.to_string(),
            }),
        }
    }

    pub fn remove_module(&mut self, id: ModuleId) -> Result<(), GraphError> {
        if !self.arena.remove(id.0) {
            return Err(GraphError::HasChildren {
                path: self.path_of(id),
            });
        }
        Ok(())
    }

    pub fn info(&self, id: ModuleId) -> &ModuleInfo {
        &self.arena.get(id.0).value
    }

    pub fn info_mut(&mut self, id: ModuleId) -> &mut ModuleInfo {
        &mut self.arena.get_mut(id.0).value
    }

    pub fn name(&self, id: ModuleId) -> &str {
        &self.arena.get(id.0).name
    }

    pub fn parent(&self, id: ModuleId) -> Option<ModuleId> {
        self.arena.get(id.0).parent.map(ModuleId)
    }

    pub fn children(&self, id: ModuleId) -> impl Iterator<Item = ModuleId> + '_ {
        self.arena.get(id.0).children.iter().copied().map(ModuleId)
    }

    pub fn path_of(&self, id: ModuleId) -> String {
        self.arena.path_of(id.0)
    }

    pub fn locate(&self, path: &str) -> Option<ModuleId> {
        self.arena.locate(path).map(ModuleId)
    }

    /// Declare that `from` requires `to`; duplicates are ignored
    pub fn add_require(&mut self, from: ModuleId, to: ModuleId) {
        self.arena.add_edge(from.0, to.0);
    }

    /// Whether `from` declared a dependency on `to` (direct edges only)
    pub fn has_require(&self, from: ModuleId, to: ModuleId) -> bool {
        self.arena.has_edge(from.0, to.0)
    }

    pub fn requires(&self, id: ModuleId) -> impl Iterator<Item = ModuleId> + '_ {
        self.arena.edges(id.0).iter().copied().map(ModuleId)
    }
}
