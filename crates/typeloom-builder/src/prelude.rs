//! Builtin value and container registration
//!
//! Every session that resolves member types or lowers graphs needs the
//! primitive value types and the well-known container templates. Drivers
//! call [`install_defaults`] once, before opening their first module.

use crate::{BuildError, ModuleBuilder};
use typeloom_syntax::Traits;

const ROOT_VALUES: &[&str] = &[
    "void", "bool", "char", "int8", "int16", "int32", "int64", "uint8", "uint16", "uint32",
    "uint64", "float32", "float64",
];

const SEQUENCES: &[&str] = &[
    "vector",
    "list",
    "deque",
    "set",
    "unordered_set",
    "optional",
    "unique_ptr",
    "shared_ptr",
];

const MAPS: &[&str] = &["map", "unordered_map"];

/// Sequence templates with an allocator-aware counterpart under `/std/pmr`
const PMR_SEQUENCES: &[&str] = &["vector", "list", "deque", "set", "unordered_set"];

fn imported_class() -> Traits {
    Traits {
        class_like: true,
        ..Traits::imported()
    }
}

/// Register the primitive values, `/std` strings, and container templates
///
/// The graph elaborator's container choices reference these paths, so a
/// session that declares graphs must install them.
pub fn install_defaults(builder: &mut ModuleBuilder) -> Result<(), BuildError> {
    for value in ROOT_VALUES {
        builder.add_value(value)?;
    }

    let std_ns = builder.open_namespace("std")?;

    builder.add_define("string_view", imported_class())?;
    builder.add_define("string", imported_class())?;

    for sequence in SEQUENCES {
        builder.add_container(sequence, imported_class())?;
    }
    for map in MAPS {
        builder.add_map(map, imported_class())?;
    }

    let pmr_ns = builder.open_namespace("pmr")?;
    let pmr = Traits {
        allocator_aware: true,
        ..imported_class()
    };
    builder.add_define("string", pmr.clone())?;
    for sequence in PMR_SEQUENCES {
        builder.add_container(sequence, pmr.clone())?;
    }
    for map in MAPS {
        builder.add_map(map, pmr.clone())?;
    }
    builder.close(pmr_ns)?;
    builder.close(std_ns)?;

    Ok(())
}
