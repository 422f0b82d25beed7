//! Generation traits attached to every node

use serde::{Deserialize, Serialize};
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign};

/// Fine-grained codegen toggles, combined as a bitset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GenFlags(pub u32);

impl GenFlags {
    pub const NONE: GenFlags = GenFlags(0);
    /// The type provides its own constructor; do not synthesize one
    pub const CUSTOM_CTOR: GenFlags = GenFlags(1 << 0);
    /// The type provides its own destructor
    pub const CUSTOM_DTOR: GenFlags = GenFlags(1 << 1);
    pub const MOVE: GenFlags = GenFlags(1 << 2);
    pub const NO_MOVE: GenFlags = GenFlags(1 << 3);
    pub const EQUAL: GenFlags = GenFlags(1 << 4);
    pub const NO_EQUAL: GenFlags = GenFlags(1 << 5);
    pub const LESS: GenFlags = GenFlags(1 << 6);
    pub const NO_LESS: GenFlags = GenFlags(1 << 7);
    pub const HASH: GenFlags = GenFlags(1 << 8);
    pub const NO_HASH: GenFlags = GenFlags(1 << 9);
    pub const REFLECTION: GenFlags = GenFlags(1 << 10);
    pub const NO_SERIALIZATION: GenFlags = GenFlags(1 << 11);
    /// Emit bitwise operators for flag enums
    pub const ENUM_OPERATOR: GenFlags = GenFlags(1 << 12);
    /// Default-construct with the ambient allocator
    pub const ALLOCATOR_DEFAULT: GenFlags = GenFlags(1 << 13);

    pub fn contains(self, other: GenFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for GenFlags {
    type Output = GenFlags;
    fn bitor(self, rhs: GenFlags) -> GenFlags {
        GenFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for GenFlags {
    fn bitor_assign(&mut self, rhs: GenFlags) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for GenFlags {
    type Output = GenFlags;
    fn bitand(self, rhs: GenFlags) -> GenFlags {
        GenFlags(self.0 & rhs.0)
    }
}

impl BitAndAssign for GenFlags {
    fn bitand_assign(&mut self, rhs: GenFlags) {
        self.0 &= rhs.0;
    }
}

/// Generation flags carried by every node in the type graph
///
/// `interface` gates inheritance: a type may only inherit from bases whose
/// traits mark them as interfaces. `allocator_aware` propagates into the
/// container choices the graph elaborator makes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Traits {
    /// The type is an abstract interface; inheritance bases must set this
    pub interface: bool,
    /// Emit as a class (reference semantics) rather than a plain record
    pub class_like: bool,
    /// The type threads a polymorphic allocator through its containers
    pub allocator_aware: bool,
    /// All synthesized operations may be marked noexcept
    pub noexcept_safe: bool,
    /// Trivially copyable; serialization may memcpy
    pub trivial: bool,
    /// Declared elsewhere; referenced but never emitted
    pub imported: bool,
    /// Part of the owning module's public surface
    pub exported: bool,
    /// Over-alignment in bytes, 0 for natural alignment
    pub alignment: u32,
    pub flags: GenFlags,
}

impl Traits {
    /// Traits for an imported, externally defined type
    pub fn imported() -> Self {
        Self {
            imported: true,
            ..Self::default()
        }
    }

    /// Traits for an allocator-aware type
    pub fn allocator_aware() -> Self {
        Self {
            allocator_aware: true,
            ..Self::default()
        }
    }

    /// Traits for an abstract interface
    pub fn interface() -> Self {
        Self {
            interface: true,
            class_like: true,
            ..Self::default()
        }
    }
}
