//! Build-unit descriptors

use serde::{Deserialize, Serialize};
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign};

/// Which artifacts the backends emit for a module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ArtifactFlags(pub u32);

impl ArtifactFlags {
    pub const NONE: ArtifactFlags = ArtifactFlags(0);
    /// Forward-declaration header
    pub const FWD: ArtifactFlags = ArtifactFlags(1 << 0);
    /// Type definition header
    pub const TYPES: ArtifactFlags = ArtifactFlags(1 << 1);
    pub const SERIALIZATION: ArtifactFlags = ArtifactFlags(1 << 2);
    /// Name tables for diagnostics
    pub const NAMES: ArtifactFlags = ArtifactFlags(1 << 3);
    pub const REFLECTION: ArtifactFlags = ArtifactFlags(1 << 4);
    /// Graph access functions
    pub const GRAPHS: ArtifactFlags = ArtifactFlags(1 << 5);
    /// Script-binding glue
    pub const BINDINGS: ArtifactFlags = ArtifactFlags(1 << 6);

    pub fn contains(self, other: ArtifactFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for ArtifactFlags {
    type Output = ArtifactFlags;
    fn bitor(self, rhs: ArtifactFlags) -> ArtifactFlags {
        ArtifactFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for ArtifactFlags {
    fn bitor_assign(&mut self, rhs: ArtifactFlags) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for ArtifactFlags {
    type Output = ArtifactFlags;
    fn bitand(self, rhs: ArtifactFlags) -> ArtifactFlags {
        ArtifactFlags(self.0 & rhs.0)
    }
}

impl BitAndAssign for ArtifactFlags {
    fn bitand_assign(&mut self, rhs: ArtifactFlags) {
        self.0 &= rhs.0;
    }
}

/// A build-unit descriptor
///
/// Modules own type nodes (each node records its module path) and declare
/// explicit dependencies on other modules; cross-module constraints are
/// only legal along a declared dependency edge.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModuleInfo {
    /// Output folder, relative to the generation root
    pub folder: String,
    /// File name prefix for every emitted artifact
    pub file_prefix: String,
    /// Export/import macro name for shared-library builds, empty for none
    pub api: String,
    /// External module name exposed to script backends, empty for none
    pub export_as: String,
    /// Part of the project's public surface
    pub export: bool,
    pub features: ArtifactFlags,
    /// Module paths this module depends on, resolved to edges when opened
    pub requires: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_flags_combine() {
        let f = ArtifactFlags::FWD | ArtifactFlags::TYPES | ArtifactFlags::GRAPHS;
        assert!(f.contains(ArtifactFlags::FWD));
        assert!(f.contains(ArtifactFlags::TYPES | ArtifactFlags::GRAPHS));
        assert!(!f.contains(ArtifactFlags::BINDINGS));
        assert!(ArtifactFlags::NONE.is_empty());
    }
}
